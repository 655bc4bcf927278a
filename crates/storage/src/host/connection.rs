use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::api::{HostApi, HostError, SUCCESS, codes};
use super::window::{WindowId, WindowTree};

/// Upper bound on windows visited per chain while looking for the host API.
///
/// Stops the walk on self-referencing or cyclic hierarchies.
pub const MAX_DISCOVERY_HOPS: usize = 500;

//
// ─── STATE ─────────────────────────────────────────────────────────────────────
//

/// Lifecycle of a connection to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    NotSearched,
    Found,
    NotFound,
    Initialized,
    Terminated,
}

/// Whether a host API object is available at all.
#[derive(Clone, Default)]
pub enum HostHandle {
    Connected(Arc<dyn HostApi>),
    #[default]
    Disconnected,
}

impl HostHandle {
    #[must_use]
    pub fn is_connected(&self) -> bool {
        matches!(self, HostHandle::Connected(_))
    }

    fn api(&self) -> Option<&dyn HostApi> {
        match self {
            HostHandle::Connected(api) => Some(api.as_ref()),
            HostHandle::Disconnected => None,
        }
    }
}

impl fmt::Debug for HostHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostHandle::Connected(_) => f.write_str("Connected"),
            HostHandle::Disconnected => f.write_str("Disconnected"),
        }
    }
}

//
// ─── CONNECTION ────────────────────────────────────────────────────────────────
//

/// Mediates every call to the host and enforces
/// discover → initialize → read/write → terminate.
///
/// No method fails loudly: without a usable host, reads return `""`, writes
/// return `false`, and error accessors return `0`/`""`.
#[derive(Debug)]
pub struct HostConnection {
    handle: HostHandle,
    state: ConnectionState,
}

impl Default for HostConnection {
    fn default() -> Self {
        Self::new()
    }
}

impl HostConnection {
    /// A connection that has not looked for a host yet.
    #[must_use]
    pub fn new() -> Self {
        Self {
            handle: HostHandle::Disconnected,
            state: ConnectionState::NotSearched,
        }
    }

    /// A connection that already knows there is no host.
    #[must_use]
    pub fn standalone() -> Self {
        Self {
            handle: HostHandle::Disconnected,
            state: ConnectionState::NotFound,
        }
    }

    /// A connection around an API handle located by other means.
    #[must_use]
    pub fn with_api(api: Arc<dyn HostApi>) -> Self {
        Self {
            handle: HostHandle::Connected(api),
            state: ConnectionState::Found,
        }
    }

    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    #[must_use]
    pub fn handle(&self) -> &HostHandle {
        &self.handle
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.state == ConnectionState::Initialized
    }

    /// Locate the host API starting at `start`.
    ///
    /// Walks `start` and its ancestors, then the chain of `start`'s opener,
    /// visiting at most [`MAX_DISCOVERY_HOPS`] parents per chain. Only the
    /// first call searches; later calls report the recorded result.
    pub fn discover(&mut self, tree: &dyn WindowTree, start: WindowId) -> bool {
        if self.state != ConnectionState::NotSearched {
            return self.handle.is_connected();
        }

        let found = search_chain(tree, start).or_else(|| {
            tree.opener(start)
                .and_then(|opener| search_chain(tree, opener))
        });

        match found {
            Some(api) => {
                info!(window = %start, "host API found");
                self.handle = HostHandle::Connected(api);
                self.state = ConnectionState::Found;
                true
            }
            None => {
                info!(window = %start, "host API not found, running standalone");
                self.state = ConnectionState::NotFound;
                false
            }
        }
    }

    /// Open the host session.
    ///
    /// Returns `true` if already initialized. A host that refuses leaves the
    /// connection in `Found`, and the caller carries on standalone.
    pub fn initialize(&mut self) -> bool {
        match self.state {
            ConnectionState::Initialized => return true,
            ConnectionState::Found => {}
            _ => return false,
        }
        let Some(api) = self.handle.api() else {
            return false;
        };
        if api.initialize("") == SUCCESS {
            debug!("host session initialized");
            self.state = ConnectionState::Initialized;
            true
        } else {
            warn!(error = %self.failure("initialize"), "host refused initialization");
            false
        }
    }

    /// Read a data model element; `""` when the host is unavailable.
    #[must_use]
    pub fn get_field(&self, name: &str) -> String {
        match self.ready_api() {
            Some(api) => api.get_value(name),
            None => String::new(),
        }
    }

    /// Read a data model element, treating a non-zero host error after the
    /// read as "no value".
    #[must_use]
    pub fn get_field_checked(&self, name: &str) -> Option<String> {
        let api = self.ready_api()?;
        let value = api.get_value(name);
        let code = api.last_error();
        if code == codes::NO_ERROR {
            Some(value)
        } else {
            debug!(field = name, code, "host reported an error on read");
            None
        }
    }

    /// Write a data model element.
    pub fn set_field(&self, name: &str, value: &str) -> bool {
        let Some(api) = self.ready_api() else {
            return false;
        };
        if api.set_value(name, value) == SUCCESS {
            true
        } else {
            warn!(field = name, error = %self.failure("set_value"), "host rejected write");
            false
        }
    }

    /// Ask the host to persist pending writes.
    pub fn commit(&self) -> bool {
        let Some(api) = self.ready_api() else {
            return false;
        };
        if api.commit("") == SUCCESS {
            true
        } else {
            warn!(error = %self.failure("commit"), "host commit failed");
            false
        }
    }

    /// Close the host session. After success the connection is inert.
    pub fn terminate(&mut self) -> bool {
        let Some(api) = self.ready_api() else {
            return false;
        };
        if api.finish("") == SUCCESS {
            debug!("host session terminated");
            self.state = ConnectionState::Terminated;
            true
        } else {
            warn!(error = %self.failure("terminate"), "host refused termination");
            false
        }
    }

    #[must_use]
    pub fn last_error(&self) -> u16 {
        self.handle
            .api()
            .map_or(codes::NO_ERROR, |api| api.last_error())
    }

    #[must_use]
    pub fn error_string(&self, code: u16) -> String {
        self.handle
            .api()
            .map(|api| api.error_string(code))
            .unwrap_or_default()
    }

    #[must_use]
    pub fn diagnostic(&self, code: u16) -> String {
        self.handle
            .api()
            .map(|api| api.diagnostic(code))
            .unwrap_or_default()
    }

    /// Snapshot the host's view of the most recent failure.
    #[must_use]
    pub fn failure(&self, operation: &'static str) -> HostError {
        let code = self.last_error();
        HostError {
            operation,
            code,
            message: self.error_string(code),
            diagnostic: self.diagnostic(code),
        }
    }

    fn ready_api(&self) -> Option<&dyn HostApi> {
        if self.state == ConnectionState::Initialized {
            self.handle.api()
        } else {
            None
        }
    }
}

fn search_chain(tree: &dyn WindowTree, start: WindowId) -> Option<Arc<dyn HostApi>> {
    let mut window = start;
    let mut hops = 0;
    loop {
        if let Some(api) = tree.api(window) {
            return Some(api);
        }
        let parent = tree.parent(window)?;
        if parent == window || hops >= MAX_DISCOVERY_HOPS {
            return None;
        }
        hops += 1;
        window = parent;
    }
}
