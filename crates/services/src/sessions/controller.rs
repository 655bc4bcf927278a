use std::fmt;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};

use quiz_core::Clock;
use quiz_core::model::{QuizSettings, SessionOutcome};
use quiz_core::time::elapsed_seconds;
use storage::{HostConnection, ProgressStore};

use crate::engine::{AnswerFeedback, Presentation, QuizEngine};
use crate::error::SessionError;

use super::report;
use super::view::{DisplayState, Phase};

/// A transition waiting for its time to come.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transition {
    /// Leave answer feedback and move to the next question.
    AdvanceAfterFeedback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Scheduled {
    due_at: DateTime<Utc>,
    transition: Transition,
}

//
// ─── CONTROLLER ────────────────────────────────────────────────────────────────
//

/// Drives one learner through LOADING → START → QUIZZING → RESULTS.
///
/// Owns the engine and the host connection. Input arrives as discrete events
/// (`on_begin`, `on_select_option`, `on_retry`); the delayed step after an
/// answer is queued and fired by `poll`, so time only moves when the caller
/// says so.
pub struct SessionController {
    phase: Phase,
    engine: QuizEngine,
    host: HostConnection,
    store: ProgressStore,
    settings: QuizSettings,
    clock: Clock,
    started_at: DateTime<Utc>,
    scheduled: Option<Scheduled>,
    outcome: Option<SessionOutcome>,
}

impl SessionController {
    /// `host` should already have been through discovery.
    #[must_use]
    pub fn new(engine: QuizEngine, host: HostConnection, settings: QuizSettings, clock: Clock) -> Self {
        Self {
            phase: Phase::Loading,
            engine,
            host,
            store: ProgressStore::from_settings(&settings),
            settings,
            started_at: clock.now(),
            clock,
            scheduled: None,
            outcome: None,
        }
    }

    /// Leave LOADING: open the host session and resume a checkpoint if any.
    ///
    /// Calling it again after loading has no effect.
    pub fn start(&mut self) -> Phase {
        if self.phase != Phase::Loading {
            return self.phase;
        }
        self.started_at = self.clock.now();

        if !self.host.initialize() {
            info!("no host session, progress will not be kept");
        }

        match self.store.load(&self.host) {
            Some(snapshot) => match self.engine.restore(snapshot) {
                Ok(()) => {
                    info!(
                        index = snapshot.current_question_index,
                        score = snapshot.score,
                        "resuming saved progress"
                    );
                    self.enter_quizzing();
                }
                Err(err) => {
                    warn!(error = %err, "saved progress does not fit this quiz, starting over");
                    self.store.clear(&self.host);
                    self.set_phase(Phase::Start);
                }
            },
            None => self.set_phase(Phase::Start),
        }
        self.phase
    }

    /// The learner asked to begin. Only honored on the start screen.
    pub fn on_begin(&mut self) -> bool {
        if self.phase != Phase::Start {
            return false;
        }
        self.enter_quizzing();
        true
    }

    /// The learner picked the option at `index` (presentation order).
    ///
    /// Returns `Ok(None)` when the pick is ignored: outside QUIZZING, or while
    /// feedback for the previous pick is still showing.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidOption` for an index past the options.
    pub fn on_select_option(&mut self, index: usize) -> Result<Option<AnswerFeedback>, SessionError> {
        if self.phase != Phase::Quizzing || self.scheduled.is_some() {
            return Ok(None);
        }
        let Some(feedback) = self.engine.submit_answer(index)? else {
            return Ok(None);
        };
        debug!(
            question = self.engine.current_index(),
            correct = feedback.correct,
            "answer recorded"
        );
        self.scheduled = Some(Scheduled {
            due_at: self
                .clock
                .now()
                .checked_add_signed(feedback_delay(&self.settings))
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
            transition: Transition::AdvanceAfterFeedback,
        });
        Ok(Some(feedback))
    }

    /// The learner asked to try again. Only honored on the results screen.
    ///
    /// Restarts the session timer, so the next report covers only the new attempt.
    pub fn on_retry(&mut self) -> bool {
        if self.phase != Phase::Results {
            return false;
        }
        self.engine.reset();
        self.scheduled = None;
        self.outcome = None;
        report::reset_for_retry(&self.host, &self.store);
        self.started_at = self.clock.now();
        self.set_phase(Phase::Start);
        true
    }

    /// Fire a queued transition if it is due according to the clock.
    pub fn poll(&mut self) -> bool {
        let now = self.clock.now();
        self.poll_at(now)
    }

    /// Fire a queued transition if it is due at `now`.
    pub fn poll_at(&mut self, now: DateTime<Utc>) -> bool {
        let Some(scheduled) = self.scheduled else {
            return false;
        };
        if scheduled.due_at > now {
            return false;
        }
        self.scheduled = None;
        match scheduled.transition {
            Transition::AdvanceAfterFeedback => self.advance_after_feedback(),
        }
        true
    }

    /// When the queued transition will be due, if one is waiting.
    #[must_use]
    pub fn next_due(&self) -> Option<DateTime<Utc>> {
        self.scheduled.map(|s| s.due_at)
    }

    /// Close the host session, e.g. when the content is unloaded.
    pub fn shutdown(&mut self) -> bool {
        self.host.terminate()
    }

    #[must_use]
    pub fn display_state(&self) -> DisplayState {
        DisplayState::build(self.phase, &self.engine, self.outcome.as_ref())
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn outcome(&self) -> Option<&SessionOutcome> {
        self.outcome.as_ref()
    }

    #[must_use]
    pub fn engine(&self) -> &QuizEngine {
        &self.engine
    }

    #[must_use]
    pub fn host(&self) -> &HostConnection {
        &self.host
    }

    #[must_use]
    pub fn settings(&self) -> &QuizSettings {
        &self.settings
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Mutable access to the clock, for stepping a fixed clock.
    pub fn clock_mut(&mut self) -> &mut Clock {
        &mut self.clock
    }

    fn advance_after_feedback(&mut self) {
        if self.phase != Phase::Quizzing {
            return;
        }
        self.engine.advance();
        if self.present_or_complete() {
            self.store.save(&self.host, &self.engine.snapshot());
        }
    }

    fn enter_quizzing(&mut self) {
        self.set_phase(Phase::Quizzing);
        self.present_or_complete();
    }

    /// Present the current question, or finish the attempt when none is left.
    /// Returns whether a question is on screen.
    fn present_or_complete(&mut self) -> bool {
        match self.engine.present_current() {
            Presentation::Question(_) => true,
            Presentation::Exhausted => {
                self.complete();
                false
            }
        }
    }

    fn complete(&mut self) {
        if self.outcome.is_some() {
            return;
        }
        let elapsed = elapsed_seconds(self.started_at, self.clock.now());
        let outcome = SessionOutcome::compute(
            self.engine.score(),
            self.engine.total_questions(),
            self.settings.passing_percentage(),
            elapsed,
        );
        self.set_phase(Phase::Results);
        report::report_completion(&self.host, &self.store, &outcome);
        self.outcome = Some(outcome);
    }

    fn set_phase(&mut self, phase: Phase) {
        if self.phase != phase {
            debug!(from = ?self.phase, to = ?phase, "phase change");
            self.phase = phase;
        }
    }
}

fn feedback_delay(settings: &QuizSettings) -> Duration {
    Duration::from_std(settings.feedback_delay()).unwrap_or(Duration::MAX)
}

impl fmt::Debug for SessionController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionController")
            .field("phase", &self.phase)
            .field("engine", &self.engine)
            .field("host", &self.host.state())
            .field("started_at", &self.started_at)
            .field("scheduled", &self.scheduled)
            .field("outcome", &self.outcome)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use quiz_core::model::{AnswerOption, ProgressSnapshot, Question, QuestionId};
    use quiz_core::time::{fixed_clock, fixed_now};
    use storage::host::fields;
    use storage::{HostApi, InMemoryHost};

    fn bank(n: u64) -> Vec<Question> {
        (0..n)
            .map(|i| {
                Question::new(
                    QuestionId::new(i),
                    format!("Q{i}"),
                    [
                        AnswerOption::text("a"),
                        AnswerOption::text("b"),
                        AnswerOption::text("c"),
                        AnswerOption::text("d"),
                    ],
                    0,
                )
                .unwrap()
            })
            .collect()
    }

    fn controller(host: HostConnection, n: u64) -> SessionController {
        let engine = QuizEngine::with_seed(bank(n), 5).unwrap();
        SessionController::new(engine, host, QuizSettings::default(), fixed_clock())
    }

    fn hosted(n: u64) -> (InMemoryHost, SessionController) {
        let host = InMemoryHost::new();
        let conn = HostConnection::with_api(Arc::new(host.clone()));
        (host, controller(conn, n))
    }

    fn correct_position(ctl: &SessionController) -> usize {
        ctl.engine().presented().unwrap().correct_position()
    }

    fn answer(ctl: &mut SessionController, correct: bool) {
        let pos = correct_position(ctl);
        let pick = if correct { pos } else { (pos + 1) % 4 };
        ctl.on_select_option(pick).unwrap().unwrap();
        ctl.clock_mut().advance_std(QuizSettings::DEFAULT_FEEDBACK_DELAY);
        assert!(ctl.poll());
    }

    #[test]
    fn fresh_start_waits_for_begin() {
        let (_host, mut ctl) = hosted(2);
        assert_eq!(ctl.phase(), Phase::Loading);
        assert_eq!(ctl.start(), Phase::Start);
        assert!(ctl.engine().presented().is_none());
        assert!(ctl.on_begin());
        assert_eq!(ctl.phase(), Phase::Quizzing);
        assert!(!ctl.on_begin());
    }

    #[test]
    fn advance_waits_for_the_feedback_delay() {
        let (_host, mut ctl) = hosted(2);
        ctl.start();
        ctl.on_begin();
        let pos = correct_position(&ctl);
        ctl.on_select_option(pos).unwrap().unwrap();

        assert_eq!(ctl.next_due(), Some(fixed_now() + Duration::milliseconds(1500)));
        assert!(!ctl.poll_at(fixed_now() + Duration::milliseconds(1499)));
        assert_eq!(ctl.engine().current_index(), 0);
        assert!(ctl.display_state().feedback.is_some());

        assert!(ctl.poll_at(fixed_now() + Duration::milliseconds(1500)));
        assert_eq!(ctl.engine().current_index(), 1);
        assert!(ctl.display_state().feedback.is_none());
        assert!(!ctl.poll_at(fixed_now() + Duration::seconds(10)));
    }

    #[test]
    fn picks_during_feedback_are_ignored() {
        let (_host, mut ctl) = hosted(2);
        ctl.start();
        ctl.on_begin();
        let pos = correct_position(&ctl);
        assert!(ctl.on_select_option(pos).unwrap().is_some());
        assert!(ctl.on_select_option(pos).unwrap().is_none());
        assert_eq!(ctl.engine().score(), 1);
    }

    #[test]
    fn picks_outside_quizzing_are_ignored() {
        let (_host, mut ctl) = hosted(1);
        ctl.start();
        assert!(ctl.on_select_option(0).unwrap().is_none());
    }

    #[test]
    fn checkpoint_after_each_advance() {
        let (host, mut ctl) = hosted(3);
        ctl.start();
        ctl.on_begin();
        answer(&mut ctl, true);
        assert_eq!(
            host.committed(fields::SUSPEND_DATA).as_deref(),
            Some(r#"{"currentQuestionIndex":1,"score":1}"#)
        );
        answer(&mut ctl, false);
        assert_eq!(
            host.committed(fields::SUSPEND_DATA).as_deref(),
            Some(r#"{"currentQuestionIndex":2,"score":1}"#)
        );
    }

    #[test]
    fn last_answer_reports_and_shows_results() {
        let (host, mut ctl) = hosted(2);
        ctl.start();
        ctl.on_begin();
        answer(&mut ctl, true);
        answer(&mut ctl, true);

        assert_eq!(ctl.phase(), Phase::Results);
        let outcome = ctl.outcome().unwrap();
        assert_eq!(outcome.percentage(), 100);
        assert!(outcome.passed());
        assert_eq!(outcome.elapsed_seconds(), 3);
        assert_eq!(host.committed(fields::SUSPEND_DATA).as_deref(), Some(""));
        assert_eq!(host.committed(fields::SESSION_TIME).as_deref(), Some("00:00:03"));
        assert!(ctl.display_state().question_text.is_none());
    }

    #[test]
    fn resume_at_end_of_bank_completes_immediately() {
        let host = InMemoryHost::new();
        host.initialize("");
        host.set_value(fields::SUSPEND_DATA, r#"{"currentQuestionIndex":2,"score":1}"#);
        host.commit("");
        let relaunched = InMemoryHost::from_record(host.record(fixed_now()));
        let mut ctl = controller(HostConnection::with_api(Arc::new(relaunched.clone())), 2);

        assert_eq!(ctl.start(), Phase::Results);
        assert_eq!(ctl.outcome().unwrap().percentage(), 50);
        assert_eq!(relaunched.committed(fields::LESSON_STATUS).as_deref(), Some("completed"));
    }

    #[test]
    fn snapshot_that_does_not_fit_is_discarded() {
        let host = InMemoryHost::new();
        host.initialize("");
        host.set_value(fields::SUSPEND_DATA, r#"{"currentQuestionIndex":7,"score":1}"#);
        host.commit("");
        let relaunched = InMemoryHost::from_record(host.record(fixed_now()));
        let mut ctl = controller(HostConnection::with_api(Arc::new(relaunched.clone())), 3);

        assert_eq!(ctl.start(), Phase::Start);
        assert_eq!(ctl.engine().snapshot(), ProgressSnapshot::new(0, 0));
        assert_eq!(relaunched.committed(fields::SUSPEND_DATA).as_deref(), Some(""));
    }

    #[test]
    fn retry_restarts_the_clock() {
        let (_host, mut ctl) = hosted(1);
        ctl.start();
        ctl.on_begin();
        answer(&mut ctl, false);
        assert_eq!(ctl.phase(), Phase::Results);

        ctl.clock_mut().advance(Duration::seconds(60));
        assert!(ctl.on_retry());
        assert_eq!(ctl.started_at(), fixed_now() + Duration::milliseconds(61_500));
        assert!(ctl.outcome().is_none());
        assert!(!ctl.on_retry());
    }

    #[test]
    fn due_time_saturates_near_the_end_of_time() {
        let host = HostConnection::with_api(Arc::new(InMemoryHost::new()));
        let engine = QuizEngine::with_seed(bank(2), 5).unwrap();
        let settings =
            QuizSettings::new(80, QuizSettings::MAX_FEEDBACK_DELAY, 4096).unwrap();
        let clock = Clock::fixed(DateTime::<Utc>::MAX_UTC - Duration::seconds(1));
        let mut ctl = SessionController::new(engine, host, settings, clock);
        ctl.start();
        ctl.on_begin();

        let pos = correct_position(&ctl);
        assert!(ctl.on_select_option(pos).unwrap().is_some());
        assert_eq!(ctl.next_due(), Some(DateTime::<Utc>::MAX_UTC));
        assert!(ctl.poll_at(DateTime::<Utc>::MAX_UTC));
        assert_eq!(ctl.engine().current_index(), 1);
    }

    #[test]
    fn shutdown_terminates_host() {
        let (host, mut ctl) = hosted(1);
        ctl.start();
        assert!(ctl.shutdown());
        assert!(host.is_finished());
        assert!(!ctl.shutdown());
    }
}
