use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SnapshotError {
    #[error("snapshot index {index} is past the end of a {total}-question bank")]
    IndexBeyondBank { index: usize, total: usize },

    #[error("snapshot score {score} exceeds answered questions ({index})")]
    ScoreAheadOfIndex { score: usize, index: usize },
}

//
// ─── SNAPSHOT ──────────────────────────────────────────────────────────────────
//

/// Persisted checkpoint of a quiz session.
///
/// Option order is deliberately absent: it is re-randomized on every
/// presentation, including after a resume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    pub current_question_index: usize,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub score: usize,
}

/// Older checkpoints may carry `"score": null`; treat it like a missing score.
fn null_as_zero<'de, D>(deserializer: D) -> Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<usize>::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl ProgressSnapshot {
    #[must_use]
    pub fn new(current_question_index: usize, score: usize) -> Self {
        Self {
            current_question_index,
            score,
        }
    }
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// Mutable progress through a question bank.
///
/// Between an answer and the following `advance` the score may already count
/// the pending answer; once advanced, `score <= current_index <= total` holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizSession {
    current_index: usize,
    score: usize,
    total: usize,
}

impl QuizSession {
    #[must_use]
    pub fn new(total: usize) -> Self {
        Self {
            current_index: 0,
            score: 0,
            total,
        }
    }

    /// Rehydrate a session from a checkpoint.
    ///
    /// # Errors
    ///
    /// Returns `SnapshotError` when the checkpoint cannot belong to a bank of
    /// `total` questions.
    pub fn from_snapshot(snapshot: ProgressSnapshot, total: usize) -> Result<Self, SnapshotError> {
        let ProgressSnapshot {
            current_question_index: index,
            score,
        } = snapshot;
        if index > total {
            return Err(SnapshotError::IndexBeyondBank { index, total });
        }
        if score > index {
            return Err(SnapshotError::ScoreAheadOfIndex { score, index });
        }
        Ok(Self {
            current_index: index,
            score,
            total,
        })
    }

    #[must_use]
    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot::new(self.current_index, self.score)
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    #[must_use]
    pub fn score(&self) -> usize {
        self.score
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.total
    }

    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.current_index >= self.total
    }

    /// Fraction of the bank already behind the learner, in `0.0..=1.0`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn progress_fraction(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.current_index.min(self.total) as f64 / self.total as f64
    }

    /// Count the current answer as correct.
    pub fn record_correct(&mut self) {
        self.score = self.score.saturating_add(1);
    }

    /// Move to the next question. Never wraps.
    pub fn advance(&mut self) {
        self.current_index = self.current_index.saturating_add(1);
    }

    pub fn reset(&mut self) {
        self.current_index = 0;
        self.score = 0;
    }

    /// Whether `0 <= score <= current_index <= total` holds right now.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.score <= self.current_index && self.current_index <= self.total
    }
}
