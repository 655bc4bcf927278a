use thiserror::Error;
use tracing::{debug, warn};

use quiz_core::model::{ProgressSnapshot, QuizSettings};

use crate::host::{HostConnection, fields};

/// Largest hour count a SCORM 1.2 timespan can carry.
const MAX_TIMESPAN_HOURS: u64 = 9999;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressError {
    #[error("snapshot could not be encoded: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("snapshot could not be decoded: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Checkpoints quiz progress into the host's suspend data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressStore {
    limit: usize,
}

impl Default for ProgressStore {
    fn default() -> Self {
        Self::new(QuizSettings::DEFAULT_SUSPEND_DATA_LIMIT)
    }
}

impl ProgressStore {
    /// `limit` is the advisory size of the suspend data field, in characters.
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self { limit }
    }

    #[must_use]
    pub fn from_settings(settings: &QuizSettings) -> Self {
        Self::new(settings.suspend_data_limit())
    }

    #[must_use]
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Encode a snapshot as compact JSON.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Encode` if serialization fails.
    pub fn encode(snapshot: &ProgressSnapshot) -> Result<String, ProgressError> {
        serde_json::to_string(snapshot).map_err(ProgressError::Encode)
    }

    /// Decode suspend data. Blank input means there is no snapshot.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Decode` for data that is not a snapshot.
    pub fn decode(raw: &str) -> Result<Option<ProgressSnapshot>, ProgressError> {
        if raw.trim().is_empty() {
            return Ok(None);
        }
        serde_json::from_str(raw)
            .map(Some)
            .map_err(ProgressError::Decode)
    }

    /// Write a checkpoint and commit it. Oversized data is written anyway.
    pub fn save(&self, host: &HostConnection, snapshot: &ProgressSnapshot) -> bool {
        let encoded = match Self::encode(snapshot) {
            Ok(encoded) => encoded,
            Err(err) => {
                warn!(error = %err, "progress not saved");
                return false;
            }
        };
        self.write(host, &encoded)
    }

    /// Read the last checkpoint.
    ///
    /// Missing data yields `None`. Unreadable data also yields `None` and is
    /// cleared so the next launch starts clean.
    #[must_use]
    pub fn load(&self, host: &HostConnection) -> Option<ProgressSnapshot> {
        let raw = host.get_field(fields::SUSPEND_DATA);
        match Self::decode(&raw) {
            Ok(snapshot) => {
                debug!(?snapshot, "progress loaded");
                snapshot
            }
            Err(err) => {
                warn!(error = %err, "discarding unreadable progress");
                self.clear(host);
                None
            }
        }
    }

    /// Erase the checkpoint.
    pub fn clear(&self, host: &HostConnection) -> bool {
        self.write(host, "")
    }

    /// Write raw suspend data and commit.
    pub fn write(&self, host: &HostConnection, data: &str) -> bool {
        let len = data.chars().count();
        if len > self.limit {
            warn!(len, limit = self.limit, "suspend data exceeds the host's advertised limit");
        }
        let written = host.set_field(fields::SUSPEND_DATA, data);
        let committed = host.commit();
        written && committed
    }
}

/// Formats elapsed seconds as a SCORM 1.2 timespan, `HH:MM:SS`.
///
/// Hours are not wrapped at a day; they grow to four digits and saturate.
#[must_use]
pub fn format_session_time(elapsed_seconds: u64) -> String {
    let hours = (elapsed_seconds / 3600).min(MAX_TIMESPAN_HOURS);
    let (minutes, seconds) = if hours == MAX_TIMESPAN_HOURS && elapsed_seconds / 3600 > hours {
        (59, 59)
    } else {
        ((elapsed_seconds % 3600) / 60, elapsed_seconds % 60)
    };
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

/// Formats a percentage for `cmi.core.score.raw`.
#[must_use]
pub fn format_score(percentage: u8) -> String {
    percentage.min(100).to_string()
}
