use std::fmt;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use quiz_core::model::{
    OPTION_COUNT, ProgressSnapshot, Question, QuestionId, QuizSession, ShuffledOption,
};

use crate::error::SessionError;
use crate::sessions::SessionProgress;

//
// ─── PRESENTATION ──────────────────────────────────────────────────────────────
//

/// A question as currently shown, with its options in presentation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresentedQuestion {
    pub index: usize,
    pub id: QuestionId,
    pub prompt: String,
    pub options: [ShuffledOption; OPTION_COUNT],
}

impl PresentedQuestion {
    /// Position of the correct option in presentation order.
    #[must_use]
    pub fn correct_position(&self) -> usize {
        self.options
            .iter()
            .position(|o| o.is_correct)
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Presentation {
    Question(PresentedQuestion),
    /// Every question has been answered.
    Exhausted,
}

/// Result of answering the presented question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerFeedback {
    pub selected: usize,
    pub correct: bool,
    /// Where the correct option sits in presentation order.
    pub correct_position: usize,
}

//
// ─── ENGINE ────────────────────────────────────────────────────────────────────
//

/// Steps through a question bank, shuffling options and keeping score.
///
/// Answering is guarded by a feedback flag: once a question has been answered,
/// further answers are ignored until `advance`.
pub struct QuizEngine {
    bank: Vec<Question>,
    session: QuizSession,
    presented: Option<PresentedQuestion>,
    feedback: Option<AnswerFeedback>,
    rng: StdRng,
}

impl QuizEngine {
    /// Create an engine over `bank` with OS-seeded shuffling.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::EmptyBank` if no questions are provided.
    pub fn new(bank: Vec<Question>) -> Result<Self, SessionError> {
        Self::with_rng(bank, StdRng::from_os_rng())
    }

    /// Create an engine with reproducible shuffling.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::EmptyBank` if no questions are provided.
    pub fn with_seed(bank: Vec<Question>, seed: u64) -> Result<Self, SessionError> {
        Self::with_rng(bank, StdRng::seed_from_u64(seed))
    }

    fn with_rng(bank: Vec<Question>, rng: StdRng) -> Result<Self, SessionError> {
        let mut engine = Self {
            bank: Vec::new(),
            session: QuizSession::new(0),
            presented: None,
            feedback: None,
            rng,
        };
        engine.load_bank(bank)?;
        Ok(engine)
    }

    /// Replace the question bank and start over.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::EmptyBank` if `bank` is empty; the previous bank
    /// is kept in that case.
    pub fn load_bank(&mut self, bank: Vec<Question>) -> Result<(), SessionError> {
        if bank.is_empty() {
            return Err(SessionError::EmptyBank);
        }
        self.session = QuizSession::new(bank.len());
        self.bank = bank;
        self.presented = None;
        self.feedback = None;
        Ok(())
    }

    #[must_use]
    pub fn bank(&self) -> &[Question] {
        &self.bank
    }

    #[must_use]
    pub fn session(&self) -> &QuizSession {
        &self.session
    }

    #[must_use]
    pub fn total_questions(&self) -> usize {
        self.bank.len()
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.session.current_index()
    }

    #[must_use]
    pub fn score(&self) -> usize {
        self.session.score()
    }

    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.session.is_exhausted()
    }

    #[must_use]
    pub fn presented(&self) -> Option<&PresentedQuestion> {
        self.presented.as_ref()
    }

    #[must_use]
    pub fn feedback(&self) -> Option<&AnswerFeedback> {
        self.feedback.as_ref()
    }

    #[must_use]
    pub fn is_feedback_pending(&self) -> bool {
        self.feedback.is_some()
    }

    #[must_use]
    pub fn snapshot(&self) -> ProgressSnapshot {
        self.session.snapshot()
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        let total = self.total_questions();
        let answered = self.current_index().min(total);
        SessionProgress {
            total,
            answered,
            remaining: total - answered,
            is_complete: self.is_exhausted(),
        }
    }

    /// Show the question at `index` with a fresh random option order.
    pub fn present_question(&mut self, index: usize) -> Presentation {
        let Some(question) = self.bank.get(index) else {
            self.presented = None;
            return Presentation::Exhausted;
        };

        let mut options = question.tagged_options();
        options.shuffle(&mut self.rng);

        let presented = PresentedQuestion {
            index,
            id: question.id(),
            prompt: question.prompt().to_string(),
            options,
        };
        self.presented = Some(presented.clone());
        self.feedback = None;
        Presentation::Question(presented)
    }

    /// Show the question the session is currently on.
    pub fn present_current(&mut self) -> Presentation {
        self.present_question(self.current_index())
    }

    /// Answer the presented question with the option at `selected`.
    ///
    /// Returns `Ok(None)` without side effects while feedback for an earlier
    /// answer is still pending.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NothingPresented` if no question is shown and
    /// `SessionError::InvalidOption` if `selected` is out of range.
    pub fn submit_answer(&mut self, selected: usize) -> Result<Option<AnswerFeedback>, SessionError> {
        if self.feedback.is_some() {
            return Ok(None);
        }
        let presented = self
            .presented
            .as_ref()
            .ok_or(SessionError::NothingPresented)?;
        let option = presented
            .options
            .get(selected)
            .ok_or(SessionError::InvalidOption { index: selected })?;

        let feedback = AnswerFeedback {
            selected,
            correct: option.is_correct,
            correct_position: presented.correct_position(),
        };
        if feedback.correct {
            self.session.record_correct();
        }
        self.feedback = Some(feedback);
        Ok(Some(feedback))
    }

    /// Move past the current question. Returns the new index.
    ///
    /// Stops at the end of the bank.
    pub fn advance(&mut self) -> usize {
        self.feedback = None;
        self.presented = None;
        if !self.session.is_exhausted() {
            self.session.advance();
        }
        self.session.current_index()
    }

    pub fn reset(&mut self) {
        self.session.reset();
        self.feedback = None;
        self.presented = None;
    }

    /// Continue from a checkpoint.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Snapshot` if the checkpoint does not fit this bank.
    pub fn restore(&mut self, snapshot: ProgressSnapshot) -> Result<(), SessionError> {
        self.session = QuizSession::from_snapshot(snapshot, self.bank.len())?;
        self.feedback = None;
        self.presented = None;
        Ok(())
    }
}

impl fmt::Debug for QuizEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizEngine")
            .field("bank_len", &self.bank.len())
            .field("session", &self.session)
            .field("presented", &self.presented.as_ref().map(|p| p.index))
            .field("feedback", &self.feedback)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{AnswerOption, SnapshotError};

    fn question(id: u64, correct: usize) -> Question {
        Question::new(
            QuestionId::new(id),
            format!("Q{id}"),
            [
                AnswerOption::text("a"),
                AnswerOption::text("b"),
                AnswerOption::text("c"),
                AnswerOption::text("d"),
            ],
            correct,
        )
        .unwrap()
    }

    fn bank(n: u64) -> Vec<Question> {
        (0..n).map(|i| question(i, (i % 4) as usize)).collect()
    }

    fn presented(engine: &mut QuizEngine) -> PresentedQuestion {
        match engine.present_current() {
            Presentation::Question(q) => q,
            Presentation::Exhausted => panic!("expected a question"),
        }
    }

    #[test]
    fn empty_bank_is_rejected() {
        assert!(matches!(QuizEngine::new(Vec::new()), Err(SessionError::EmptyBank)));
    }

    #[test]
    fn load_bank_keeps_previous_bank_on_error() {
        let mut engine = QuizEngine::with_seed(bank(2), 1).unwrap();
        assert!(engine.load_bank(Vec::new()).is_err());
        assert_eq!(engine.total_questions(), 2);
    }

    #[test]
    fn shuffle_is_a_permutation_preserving_correctness() {
        let mut engine = QuizEngine::with_seed(bank(4), 7).unwrap();
        for _ in 0..50 {
            for index in 0..4 {
                let Presentation::Question(q) = engine.present_question(index) else {
                    panic!("index {index} should be presentable");
                };
                let mut slots: Vec<usize> = q.options.iter().map(|o| o.slot).collect();
                slots.sort_unstable();
                assert_eq!(slots, vec![0, 1, 2, 3]);

                let correct: Vec<_> = q.options.iter().filter(|o| o.is_correct).collect();
                assert_eq!(correct.len(), 1);
                assert_eq!(correct[0].slot, engine.bank()[index].correct_index());
            }
        }
    }

    #[test]
    fn shuffle_eventually_changes_order() {
        let mut engine = QuizEngine::with_seed(bank(1), 3).unwrap();
        let first = presented(&mut engine).options;
        let reordered = (0..50).any(|_| presented(&mut engine).options != first);
        assert!(reordered);
    }

    #[test]
    fn past_the_end_is_exhausted() {
        let mut engine = QuizEngine::with_seed(bank(2), 1).unwrap();
        assert_eq!(engine.present_question(2), Presentation::Exhausted);
        assert!(engine.presented().is_none());
    }

    #[test]
    fn correct_answer_scores_and_reports_position() {
        let mut engine = QuizEngine::with_seed(bank(2), 1).unwrap();
        let q = presented(&mut engine);
        let pos = q.correct_position();

        let feedback = engine.submit_answer(pos).unwrap().unwrap();
        assert!(feedback.correct);
        assert_eq!(feedback.correct_position, pos);
        assert_eq!(engine.score(), 1);
    }

    #[test]
    fn wrong_answer_reveals_correct_position() {
        let mut engine = QuizEngine::with_seed(bank(2), 1).unwrap();
        let q = presented(&mut engine);
        let pos = q.correct_position();
        let wrong = (pos + 1) % OPTION_COUNT;

        let feedback = engine.submit_answer(wrong).unwrap().unwrap();
        assert!(!feedback.correct);
        assert_eq!(feedback.correct_position, pos);
        assert_eq!(engine.score(), 0);
    }

    #[test]
    fn second_submit_before_advance_is_ignored() {
        let mut engine = QuizEngine::with_seed(bank(2), 1).unwrap();
        let pos = presented(&mut engine).correct_position();

        assert!(engine.submit_answer(pos).unwrap().is_some());
        assert_eq!(engine.submit_answer(pos).unwrap(), None);
        assert_eq!(engine.submit_answer(99).unwrap(), None);
        assert_eq!(engine.score(), 1);
        assert!(engine.is_feedback_pending());
    }

    #[test]
    fn invalid_option_does_not_consume_question() {
        let mut engine = QuizEngine::with_seed(bank(1), 1).unwrap();
        let pos = presented(&mut engine).correct_position();
        assert!(matches!(
            engine.submit_answer(OPTION_COUNT),
            Err(SessionError::InvalidOption { index: 4 })
        ));
        assert!(engine.submit_answer(pos).unwrap().is_some());
    }

    #[test]
    fn submit_without_presentation_fails() {
        let mut engine = QuizEngine::with_seed(bank(1), 1).unwrap();
        assert!(matches!(engine.submit_answer(0), Err(SessionError::NothingPresented)));
    }

    #[test]
    fn invariant_holds_across_answer_and_advance() {
        let mut engine = QuizEngine::with_seed(bank(6), 11).unwrap();
        let mut pick = 0;
        while let Presentation::Question(q) = engine.present_current() {
            let choice = if pick % 2 == 0 { q.correct_position() } else { (q.correct_position() + 1) % 4 };
            pick += 1;
            let before = engine.current_index();
            engine.submit_answer(choice).unwrap();
            assert_eq!(engine.advance(), before + 1);
            assert!(engine.session().is_consistent());
        }
        assert_eq!(engine.score(), 3);
        assert_eq!(engine.advance(), 6);
        assert!(engine.progress().is_complete);
    }

    #[test]
    fn reset_returns_to_start() {
        let mut engine = QuizEngine::with_seed(bank(3), 1).unwrap();
        let pos = presented(&mut engine).correct_position();
        engine.submit_answer(pos).unwrap();
        engine.advance();
        engine.reset();
        assert_eq!(engine.snapshot(), ProgressSnapshot::new(0, 0));
        assert!(!engine.is_feedback_pending());
    }

    #[test]
    fn restore_validates_against_bank() {
        let mut engine = QuizEngine::with_seed(bank(4), 1).unwrap();
        engine.restore(ProgressSnapshot::new(2, 2)).unwrap();
        assert_eq!(engine.current_index(), 2);
        assert_eq!(engine.progress().remaining, 2);

        let err = engine.restore(ProgressSnapshot::new(9, 0)).unwrap_err();
        assert!(matches!(
            err,
            SessionError::Snapshot(SnapshotError::IndexBeyondBank { index: 9, total: 4 })
        ));
    }
}
