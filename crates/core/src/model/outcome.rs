use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

//
// ─── LESSON STATUS ─────────────────────────────────────────────────────────────
//

/// Status vocabulary of the host's `lesson_status` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LessonStatus {
    Passed,
    Completed,
    Failed,
    Incomplete,
    Browsed,
    NotAttempted,
}

impl LessonStatus {
    pub const ALL: [LessonStatus; 6] = [
        LessonStatus::Passed,
        LessonStatus::Completed,
        LessonStatus::Failed,
        LessonStatus::Incomplete,
        LessonStatus::Browsed,
        LessonStatus::NotAttempted,
    ];

    /// Wire value written to the host.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            LessonStatus::Passed => "passed",
            LessonStatus::Completed => "completed",
            LessonStatus::Failed => "failed",
            LessonStatus::Incomplete => "incomplete",
            LessonStatus::Browsed => "browsed",
            LessonStatus::NotAttempted => "not attempted",
        }
    }
}

impl fmt::Display for LessonStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown lesson status: {0:?}")]
pub struct UnknownLessonStatus(pub String);

impl FromStr for LessonStatus {
    type Err = UnknownLessonStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LessonStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownLessonStatus(s.to_string()))
    }
}

//
// ─── OUTCOME ───────────────────────────────────────────────────────────────────
//

/// How the results screen should frame the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultTier {
    /// At or above the passing threshold.
    Excellent,
    /// At least half right.
    Fair,
    KeepPracticing,
}

/// Percentage below which the result is framed as needing more practice.
pub const FAIR_TIER_PERCENT: u8 = 50;

/// Final result of an attempt, fixed once computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOutcome {
    score: usize,
    total: usize,
    percentage: u8,
    passed: bool,
    elapsed_seconds: u64,
}

impl SessionOutcome {
    /// Derive the outcome of an attempt.
    ///
    /// `percentage` is `round(100 * score / total)`, rounding halves up.
    #[must_use]
    pub fn compute(score: usize, total: usize, passing_percentage: u8, elapsed_seconds: u64) -> Self {
        let percentage = percentage_of(score, total);
        Self {
            score,
            total,
            percentage,
            passed: percentage >= passing_percentage,
            elapsed_seconds,
        }
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
    pub fn percentage(&self) -> u8 {
        self.percentage
    }

    #[must_use]
    pub fn passed(&self) -> bool {
        self.passed
    }

    #[must_use]
    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed_seconds
    }

    /// Status reported before the unconditional `completed` write.
    #[must_use]
    pub fn verdict(&self) -> LessonStatus {
        if self.passed {
            LessonStatus::Passed
        } else {
            LessonStatus::Failed
        }
    }

    #[must_use]
    pub fn tier(&self) -> ResultTier {
        if self.passed {
            ResultTier::Excellent
        } else if self.percentage >= FAIR_TIER_PERCENT {
            ResultTier::Fair
        } else {
            ResultTier::KeepPracticing
        }
    }
}

fn percentage_of(score: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let score = score.min(total) as u128;
    let total = total as u128;
    let rounded = (200 * score + total) / (2 * total);
    u8::try_from(rounded).unwrap_or(100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_of_four_is_a_fail_at_eighty() {
        let outcome = SessionOutcome::compute(3, 4, 80, 0);
        assert_eq!(outcome.percentage(), 75);
        assert!(!outcome.passed());
        assert_eq!(outcome.verdict(), LessonStatus::Failed);
        assert_eq!(outcome.tier(), ResultTier::Fair);
    }

    #[test]
    fn percentage_rounds_halves_up() {
        assert_eq!(SessionOutcome::compute(1, 8, 80, 0).percentage(), 13);
        assert_eq!(SessionOutcome::compute(2, 3, 80, 0).percentage(), 67);
        assert_eq!(SessionOutcome::compute(1, 3, 80, 0).percentage(), 33);
    }

    #[test]
    fn threshold_is_inclusive() {
        let outcome = SessionOutcome::compute(4, 5, 80, 12);
        assert!(outcome.passed());
        assert_eq!(outcome.tier(), ResultTier::Excellent);
        assert_eq!(outcome.elapsed_seconds(), 12);
    }

    #[test]
    fn low_scores_keep_practicing() {
        let outcome = SessionOutcome::compute(1, 4, 80, 0);
        assert_eq!(outcome.tier(), ResultTier::KeepPracticing);
    }

    #[test]
    fn lesson_status_round_trips_wire_values() {
        for status in LessonStatus::ALL {
            assert_eq!(status.as_str().parse::<LessonStatus>().unwrap(), status);
        }
        assert!("done".parse::<LessonStatus>().is_err());
        assert_eq!(LessonStatus::NotAttempted.to_string(), "not attempted");
    }
}
