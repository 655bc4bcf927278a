//! In-process stand-in for a SCORM 1.2 runtime.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use quiz_core::model::LessonStatus;

use crate::host::{HostApi, SUCCESS, codes, fields};

const FAILURE: &str = "false";

/// Runtime calls that can be told to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostOp {
    Initialize,
    GetValue,
    SetValue,
    Commit,
    Finish,
}

/// Durable part of the host's data model, as it survives between launches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostRecord {
    pub fields: BTreeMap<String, String>,
    pub saved_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
struct HostState {
    initialized: bool,
    finished: bool,
    values: BTreeMap<String, String>,
    committed: BTreeMap<String, String>,
    writes: Vec<(String, String)>,
    commits: usize,
    last_error: u16,
    last_element: Option<String>,
    failing: HashSet<HostOp>,
}

impl HostState {
    fn fail(&mut self, code: u16) -> String {
        self.last_error = code;
        FAILURE.to_string()
    }

    fn ok(&mut self) -> String {
        self.last_error = codes::NO_ERROR;
        SUCCESS.to_string()
    }

    fn injected(&mut self, op: HostOp) -> bool {
        if self.failing.contains(&op) {
            self.last_error = codes::GENERAL_EXCEPTION;
            true
        } else {
            false
        }
    }
}

/// Shared, cloneable in-memory host.
///
/// Clones observe the same state, so a test can hand one clone to the code
/// under test and inspect another.
#[derive(Debug, Clone, Default)]
pub struct InMemoryHost {
    state: Arc<Mutex<HostState>>,
}

impl InMemoryHost {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A host relaunched with previously committed data.
    #[must_use]
    pub fn from_record(record: HostRecord) -> Self {
        let host = Self::new();
        {
            let mut state = host.lock();
            state.values.clone_from(&record.fields);
            state.committed = record.fields;
        }
        host
    }

    /// Committed data, ready to be persisted between launches.
    #[must_use]
    pub fn record(&self, saved_at: DateTime<Utc>) -> HostRecord {
        HostRecord {
            fields: self.lock().committed.clone(),
            saved_at: Some(saved_at),
        }
    }

    /// Make every subsequent `op` fail with a general exception.
    pub fn fail(&self, op: HostOp) {
        self.lock().failing.insert(op);
    }

    /// Stop injecting failures.
    pub fn heal(&self) {
        self.lock().failing.clear();
    }

    /// Current (possibly uncommitted) value of an element.
    #[must_use]
    pub fn value(&self, element: &str) -> Option<String> {
        self.lock().values.get(element).cloned()
    }

    /// Last committed value of an element.
    #[must_use]
    pub fn committed(&self, element: &str) -> Option<String> {
        self.lock().committed.get(element).cloned()
    }

    /// Every accepted write, in order.
    #[must_use]
    pub fn writes(&self) -> Vec<(String, String)> {
        self.lock().writes.clone()
    }

    /// Accepted writes to a single element, in order.
    #[must_use]
    pub fn writes_to(&self, element: &str) -> Vec<String> {
        self.lock()
            .writes
            .iter()
            .filter(|(name, _)| name == element)
            .map(|(_, value)| value.clone())
            .collect()
    }

    #[must_use]
    pub fn commit_count(&self) -> usize {
        self.lock().commits
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.lock().initialized
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.lock().finished
    }

    fn lock(&self) -> MutexGuard<'_, HostState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl HostApi for InMemoryHost {
    fn initialize(&self, arg: &str) -> String {
        let mut state = self.lock();
        if state.injected(HostOp::Initialize) {
            return FAILURE.to_string();
        }
        if !arg.is_empty() {
            return state.fail(codes::INVALID_ARGUMENT);
        }
        if state.initialized || state.finished {
            return state.fail(codes::GENERAL_EXCEPTION);
        }
        state.initialized = true;
        state.ok()
    }

    fn get_value(&self, element: &str) -> String {
        let mut state = self.lock();
        state.last_element = Some(element.to_string());
        if state.injected(HostOp::GetValue) {
            return String::new();
        }
        if !state.initialized {
            state.fail(codes::NOT_INITIALIZED);
            return String::new();
        }
        match Element::parse(element) {
            None => {
                state.fail(codes::NOT_IMPLEMENTED);
                String::new()
            }
            Some(Element::SessionTime) => {
                state.fail(codes::WRITE_ONLY);
                String::new()
            }
            Some(_) => {
                state.ok();
                state.values.get(element).cloned().unwrap_or_default()
            }
        }
    }

    fn set_value(&self, element: &str, value: &str) -> String {
        let mut state = self.lock();
        state.last_element = Some(element.to_string());
        if state.injected(HostOp::SetValue) {
            return FAILURE.to_string();
        }
        if !state.initialized {
            return state.fail(codes::NOT_INITIALIZED);
        }
        let Some(kind) = Element::parse(element) else {
            return state.fail(codes::NOT_IMPLEMENTED);
        };
        if !kind.accepts(value) {
            return state.fail(codes::INCORRECT_DATA_TYPE);
        }
        state.values.insert(element.to_string(), value.to_string());
        state.writes.push((element.to_string(), value.to_string()));
        state.ok()
    }

    fn commit(&self, arg: &str) -> String {
        let mut state = self.lock();
        if state.injected(HostOp::Commit) {
            return FAILURE.to_string();
        }
        if !arg.is_empty() {
            return state.fail(codes::INVALID_ARGUMENT);
        }
        if !state.initialized {
            return state.fail(codes::NOT_INITIALIZED);
        }
        state.committed = state.values.clone();
        state.commits += 1;
        state.ok()
    }

    fn finish(&self, arg: &str) -> String {
        let mut state = self.lock();
        if state.injected(HostOp::Finish) {
            return FAILURE.to_string();
        }
        if !arg.is_empty() {
            return state.fail(codes::INVALID_ARGUMENT);
        }
        if !state.initialized {
            return state.fail(codes::NOT_INITIALIZED);
        }
        // finishing implies a commit
        state.committed = state.values.clone();
        state.initialized = false;
        state.finished = true;
        state.ok()
    }

    fn last_error(&self) -> u16 {
        self.lock().last_error
    }

    fn error_string(&self, code: u16) -> String {
        let text = match code {
            codes::NO_ERROR => "No error",
            codes::GENERAL_EXCEPTION => "General exception",
            codes::INVALID_ARGUMENT => "Invalid argument error",
            codes::NOT_INITIALIZED => "Not initialized",
            codes::NOT_IMPLEMENTED => "Not implemented error",
            codes::WRITE_ONLY => "Element is write only",
            codes::INCORRECT_DATA_TYPE => "Incorrect data type",
            _ => "Unknown error",
        };
        text.to_string()
    }

    fn diagnostic(&self, code: u16) -> String {
        let state = self.lock();
        match (&state.last_element, code) {
            (_, codes::NO_ERROR) => String::new(),
            (Some(element), _) => format!("error {code} on {element}"),
            (None, _) => format!("error {code}"),
        }
    }
}

//
// ─── DATA MODEL ────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Element {
    Score,
    LessonStatus,
    SuspendData,
    SessionTime,
}

impl Element {
    fn parse(name: &str) -> Option<Self> {
        match name {
            fields::SCORE_RAW | fields::SCORE_MIN | fields::SCORE_MAX => Some(Self::Score),
            fields::LESSON_STATUS => Some(Self::LessonStatus),
            fields::SUSPEND_DATA => Some(Self::SuspendData),
            fields::SESSION_TIME => Some(Self::SessionTime),
            _ => None,
        }
    }

    fn accepts(self, value: &str) -> bool {
        match self {
            Element::Score => {
                value.is_empty()
                    || value
                        .parse::<f64>()
                        .is_ok_and(|v| (0.0..=100.0).contains(&v))
            }
            Element::LessonStatus => value.parse::<LessonStatus>().is_ok(),
            Element::SessionTime => is_timespan(value),
            Element::SuspendData => true,
        }
    }
}

/// `HHHH:MM:SS.SS` with 2–4 hour digits and optional 1–2 fractional digits.
fn is_timespan(value: &str) -> bool {
    let mut parts = value.split(':');
    let (Some(hours), Some(minutes), Some(seconds), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return false;
    };
    let digits = |s: &str, min: usize, max: usize| {
        (min..=max).contains(&s.len()) && s.bytes().all(|b| b.is_ascii_digit())
    };
    let (whole, fraction) = match seconds.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (seconds, None),
    };
    digits(hours, 2, 4)
        && digits(minutes, 2, 2)
        && digits(whole, 2, 2)
        && fraction.is_none_or(|f| digits(f, 1, 2))
        && minutes.parse::<u8>().is_ok_and(|m| m < 60)
        && whole.parse::<u8>().is_ok_and(|s| s < 60)
}
