use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::api::HostApi;

/// Handle to a browsing context in a window hierarchy.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowId(u64);

impl WindowId {
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Debug for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WindowId({})", self.0)
    }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Read-only view of the windows a content package runs inside.
pub trait WindowTree {
    /// The host API object published on `window`, if any.
    fn api(&self, window: WindowId) -> Option<Arc<dyn HostApi>>;
    /// Enclosing window. A top-level window reports `None` or itself.
    fn parent(&self, window: WindowId) -> Option<WindowId>;
    /// Window that opened `window` as a popup.
    fn opener(&self, window: WindowId) -> Option<WindowId>;
}

#[derive(Clone, Default)]
struct WindowNode {
    parent: Option<WindowId>,
    opener: Option<WindowId>,
    api: Option<Arc<dyn HostApi>>,
}

/// Explicit window hierarchy, built up frame by frame.
///
/// Links are unchecked, so malformed graphs (self-parenting, cycles) can be
/// described as well as well-formed ones.
#[derive(Clone, Default)]
pub struct WindowGraph {
    nodes: HashMap<WindowId, WindowNode>,
    next_id: u64,
}

impl WindowGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a top-level window.
    pub fn add_window(&mut self) -> WindowId {
        self.insert(WindowNode::default())
    }

    /// Adds a frame nested inside `parent`.
    pub fn add_frame(&mut self, parent: WindowId) -> WindowId {
        self.insert(WindowNode {
            parent: Some(parent),
            ..WindowNode::default()
        })
    }

    /// Adds a top-level popup opened by `opener`.
    pub fn add_popup(&mut self, opener: WindowId) -> WindowId {
        self.insert(WindowNode {
            opener: Some(opener),
            ..WindowNode::default()
        })
    }

    /// Re-points `window` at a new parent. Unknown windows are ignored.
    pub fn set_parent(&mut self, window: WindowId, parent: WindowId) {
        if let Some(node) = self.nodes.get_mut(&window) {
            node.parent = Some(parent);
        }
    }

    /// Publishes a host API on `window`. Unknown windows are ignored.
    pub fn attach_api(&mut self, window: WindowId, api: Arc<dyn HostApi>) {
        if let Some(node) = self.nodes.get_mut(&window) {
            node.api = Some(api);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn insert(&mut self, node: WindowNode) -> WindowId {
        let id = WindowId::new(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, node);
        id
    }
}

impl WindowTree for WindowGraph {
    fn api(&self, window: WindowId) -> Option<Arc<dyn HostApi>> {
        self.nodes.get(&window).and_then(|n| n.api.clone())
    }

    fn parent(&self, window: WindowId) -> Option<WindowId> {
        self.nodes.get(&window).and_then(|n| n.parent)
    }

    fn opener(&self, window: WindowId) -> Option<WindowId> {
        self.nodes.get(&window).and_then(|n| n.opener)
    }
}

impl fmt::Debug for WindowGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WindowGraph")
            .field("windows", &self.nodes.len())
            .finish_non_exhaustive()
    }
}
