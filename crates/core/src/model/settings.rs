use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("passing percentage must be between 1 and 100, got {0}")]
    InvalidPassingPercentage(u8),

    #[error("feedback delay must be > 0")]
    InvalidFeedbackDelay,

    #[error("feedback delay must be at most {max_ms} ms")]
    FeedbackDelayTooLong { max_ms: u128 },

    #[error("suspend data limit must be > 0")]
    InvalidSuspendDataLimit,
}

/// Tunables for a quiz attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizSettings {
    passing_percentage: u8,
    feedback_delay: Duration,
    suspend_data_limit: usize,
}

impl QuizSettings {
    pub const DEFAULT_PASSING_PERCENTAGE: u8 = 80;
    pub const DEFAULT_FEEDBACK_DELAY: Duration = Duration::from_millis(1500);
    pub const MAX_FEEDBACK_DELAY: Duration = Duration::from_secs(10 * 60);
    /// SCORM 1.2 advertises 4096 characters for `cmi.suspend_data`.
    pub const DEFAULT_SUSPEND_DATA_LIMIT: usize = 4096;

    /// Creates custom settings.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if the threshold is outside `1..=100`, the delay
    /// is zero or longer than [`Self::MAX_FEEDBACK_DELAY`], or the limit is zero.
    pub fn new(
        passing_percentage: u8,
        feedback_delay: Duration,
        suspend_data_limit: usize,
    ) -> Result<Self, SettingsError> {
        if passing_percentage == 0 || passing_percentage > 100 {
            return Err(SettingsError::InvalidPassingPercentage(passing_percentage));
        }
        if feedback_delay.is_zero() {
            return Err(SettingsError::InvalidFeedbackDelay);
        }
        if feedback_delay > Self::MAX_FEEDBACK_DELAY {
            return Err(SettingsError::FeedbackDelayTooLong {
                max_ms: Self::MAX_FEEDBACK_DELAY.as_millis(),
            });
        }
        if suspend_data_limit == 0 {
            return Err(SettingsError::InvalidSuspendDataLimit);
        }
        Ok(Self {
            passing_percentage,
            feedback_delay,
            suspend_data_limit,
        })
    }

    #[must_use]
    pub fn passing_percentage(&self) -> u8 {
        self.passing_percentage
    }

    #[must_use]
    pub fn feedback_delay(&self) -> Duration {
        self.feedback_delay
    }

    #[must_use]
    pub fn suspend_data_limit(&self) -> usize {
        self.suspend_data_limit
    }
}

impl Default for QuizSettings {
    fn default() -> Self {
        Self {
            passing_percentage: Self::DEFAULT_PASSING_PERCENTAGE,
            feedback_delay: Self::DEFAULT_FEEDBACK_DELAY,
            suspend_data_limit: Self::DEFAULT_SUSPEND_DATA_LIMIT,
        }
    }
}
