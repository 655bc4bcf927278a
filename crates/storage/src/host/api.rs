use thiserror::Error;

/// Return value the host uses to signal success on every mutating call.
pub const SUCCESS: &str = "true";

/// Numeric error codes of the SCORM 1.2 runtime.
pub mod codes {
    pub const NO_ERROR: u16 = 0;
    pub const GENERAL_EXCEPTION: u16 = 101;
    pub const INVALID_ARGUMENT: u16 = 201;
    pub const NOT_INITIALIZED: u16 = 301;
    pub const NOT_IMPLEMENTED: u16 = 401;
    pub const WRITE_ONLY: u16 = 404;
    pub const INCORRECT_DATA_TYPE: u16 = 405;
}

/// Data model elements this crate reads and writes.
pub mod fields {
    pub const SCORE_RAW: &str = "cmi.core.score.raw";
    pub const SCORE_MIN: &str = "cmi.core.score.min";
    pub const SCORE_MAX: &str = "cmi.core.score.max";
    pub const LESSON_STATUS: &str = "cmi.core.lesson_status";
    pub const SUSPEND_DATA: &str = "cmi.suspend_data";
    pub const SESSION_TIME: &str = "cmi.core.session_time";
}

/// Runtime API exposed by a learning management host.
///
/// Calls are synchronous. Mutating calls answer with the string `"true"` on
/// success and anything else on failure, after which `last_error` explains
/// what went wrong.
pub trait HostApi: Send + Sync {
    fn initialize(&self, arg: &str) -> String;
    fn get_value(&self, element: &str) -> String;
    fn set_value(&self, element: &str, value: &str) -> String;
    fn commit(&self, arg: &str) -> String;
    fn finish(&self, arg: &str) -> String;
    fn last_error(&self) -> u16;
    fn error_string(&self, code: u16) -> String;
    fn diagnostic(&self, code: u16) -> String;
}

/// Typed description of a host call that did not succeed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{operation} failed with host error {code}: {message}")]
pub struct HostError {
    pub operation: &'static str,
    pub code: u16,
    pub message: String,
    pub diagnostic: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_error_display_names_operation_and_code() {
        let err = HostError {
            operation: "commit",
            code: codes::NOT_INITIALIZED,
            message: "Not initialized".into(),
            diagnostic: String::new(),
        };
        assert_eq!(err.to_string(), "commit failed with host error 301: Not initialized");
    }
}
