use tracing::{info, warn};

use quiz_core::model::{LessonStatus, SessionOutcome};
use storage::host::{HostConnection, fields};
use storage::{ProgressStore, format_score, format_session_time};

/// Lowest and highest score written alongside the raw score.
const SCORE_RANGE: (u8, u8) = (0, 100);

/// Push a finished attempt to the host.
///
/// Each group of writes is committed on its own. The lesson status is written
/// twice: first the verdict (`passed`/`failed`), then `completed`, which is
/// what the host ends up keeping. Returns whether every call succeeded.
pub fn report_completion(
    host: &HostConnection,
    store: &ProgressStore,
    outcome: &SessionOutcome,
) -> bool {
    let (min, max) = SCORE_RANGE;
    // `&` rather than `&&`: every write is attempted even after a failure
    let score_ok = host.set_field(fields::SCORE_RAW, &format_score(outcome.percentage()))
        & host.set_field(fields::SCORE_MIN, &min.to_string())
        & host.set_field(fields::SCORE_MAX, &max.to_string())
        & host.commit();

    let verdict_ok = set_status(host, outcome.verdict());
    let completed_ok = set_status(host, LessonStatus::Completed);

    let time = format_session_time(outcome.elapsed_seconds());
    let time_ok = host.set_field(fields::SESSION_TIME, &time) & host.commit();

    let cleared = store.clear(host);

    let all_ok = score_ok && verdict_ok && completed_ok && time_ok && cleared;
    if host.is_initialized() && !all_ok {
        warn!("completion report was only partially accepted by the host");
    }
    info!(
        percentage = outcome.percentage(),
        passed = outcome.passed(),
        session_time = %time,
        "completion reported"
    );
    all_ok
}

/// Prepare the host for a fresh attempt.
///
/// Marks the lesson in progress, drops the checkpoint, then settles on
/// `not attempted`.
pub fn reset_for_retry(host: &HostConnection, store: &ProgressStore) -> bool {
    let incomplete = set_status(host, LessonStatus::Incomplete);
    let cleared = store.clear(host);
    let not_attempted = set_status(host, LessonStatus::NotAttempted);
    incomplete && cleared && not_attempted
}

fn set_status(host: &HostConnection, status: LessonStatus) -> bool {
    host.set_field(fields::LESSON_STATUS, status.as_str()) & host.commit()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use storage::{HostOp, InMemoryHost};

    fn connected() -> (InMemoryHost, HostConnection) {
        let host = InMemoryHost::new();
        let mut conn = HostConnection::with_api(Arc::new(host.clone()));
        assert!(conn.initialize());
        (host, conn)
    }

    #[test]
    fn writes_score_status_time_and_clears_progress() {
        let (host, conn) = connected();
        let store = ProgressStore::default();
        store.write(&conn, r#"{"currentQuestionIndex":3,"score":2}"#);

        let outcome = SessionOutcome::compute(3, 4, 80, 95);
        assert!(report_completion(&conn, &store, &outcome));

        assert_eq!(host.committed(fields::SCORE_RAW).as_deref(), Some("75"));
        assert_eq!(host.committed(fields::SCORE_MIN).as_deref(), Some("0"));
        assert_eq!(host.committed(fields::SCORE_MAX).as_deref(), Some("100"));
        assert_eq!(host.committed(fields::SESSION_TIME).as_deref(), Some("00:01:35"));
        assert_eq!(host.committed(fields::SUSPEND_DATA).as_deref(), Some(""));
    }

    #[test]
    fn verdict_is_overwritten_by_completed() {
        let (host, conn) = connected();
        let outcome = SessionOutcome::compute(4, 4, 80, 1);
        report_completion(&conn, &ProgressStore::default(), &outcome);

        assert_eq!(host.writes_to(fields::LESSON_STATUS), vec!["passed", "completed"]);
        assert_eq!(host.committed(fields::LESSON_STATUS).as_deref(), Some("completed"));
    }

    #[test]
    fn partial_failure_keeps_going() {
        let (host, conn) = connected();
        host.fail(HostOp::Commit);
        let outcome = SessionOutcome::compute(1, 4, 80, 1);
        assert!(!report_completion(&conn, &ProgressStore::default(), &outcome));
        assert_eq!(host.writes_to(fields::LESSON_STATUS), vec!["failed", "completed"]);
        assert_eq!(host.value(fields::SESSION_TIME).as_deref(), Some("00:00:01"));
    }

    #[test]
    fn retry_sequence_ends_not_attempted() {
        let (host, conn) = connected();
        assert!(reset_for_retry(&conn, &ProgressStore::default()));
        assert_eq!(
            host.writes_to(fields::LESSON_STATUS),
            vec!["incomplete", "not attempted"]
        );
        assert_eq!(host.committed(fields::LESSON_STATUS).as_deref(), Some("not attempted"));
        assert_eq!(host.committed(fields::SUSPEND_DATA).as_deref(), Some(""));
    }

    #[test]
    fn standalone_report_is_harmless() {
        let conn = HostConnection::standalone();
        let outcome = SessionOutcome::compute(2, 4, 80, 10);
        assert!(!report_completion(&conn, &ProgressStore::default(), &outcome));
        assert!(!reset_for_retry(&conn, &ProgressStore::default()));
    }
}
