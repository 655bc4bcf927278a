use serde::Serialize;

use quiz_core::model::{ResultTier, SessionOutcome};

use crate::engine::{AnswerFeedback, PresentedQuestion, QuizEngine};

use super::progress::SessionProgress;

/// Top-level phase of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Loading,
    Start,
    Quizzing,
    Results,
}

/// How an option should be marked while feedback is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Highlight {
    Correct,
    Incorrect,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionView {
    pub label: String,
    pub image: Option<String>,
    pub highlight: Option<Highlight>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FeedbackView {
    pub correct: bool,
    pub selected: usize,
    pub correct_position: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OutcomeView {
    pub score: usize,
    pub total: usize,
    pub percentage: u8,
    pub passed: bool,
    pub elapsed_seconds: u64,
    pub tier: ResultTier,
}

impl From<&SessionOutcome> for OutcomeView {
    fn from(outcome: &SessionOutcome) -> Self {
        Self {
            score: outcome.score(),
            total: outcome.total(),
            percentage: outcome.percentage(),
            passed: outcome.passed(),
            elapsed_seconds: outcome.elapsed_seconds(),
            tier: outcome.tier(),
        }
    }
}

/// Everything a renderer needs for one frame.
///
/// Presentation-agnostic: no pre-formatted strings beyond the authored
/// question text, no layout. Renderers read it; they never mutate the session
/// through it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayState {
    pub phase: Phase,
    pub question_text: Option<String>,
    pub options: Option<Vec<OptionView>>,
    pub score: usize,
    pub progress_fraction: f64,
    pub feedback: Option<FeedbackView>,
    /// 1-based number of the question on screen, clamped to the bank size.
    pub question_number: usize,
    pub total_questions: usize,
    pub progress: SessionProgress,
    pub outcome: Option<OutcomeView>,
}

impl DisplayState {
    pub(crate) fn build(
        phase: Phase,
        engine: &QuizEngine,
        outcome: Option<&SessionOutcome>,
    ) -> Self {
        let total = engine.total_questions();
        let presented = match phase {
            Phase::Quizzing => engine.presented(),
            _ => None,
        };
        let feedback = presented.and(engine.feedback());

        Self {
            phase,
            question_text: presented.map(|q| q.prompt.clone()),
            options: presented.map(|q| option_views(q, feedback)),
            score: engine.score(),
            progress_fraction: engine.session().progress_fraction(),
            feedback: feedback.map(|f| FeedbackView {
                correct: f.correct,
                selected: f.selected,
                correct_position: f.correct_position,
            }),
            question_number: (engine.current_index() + 1).min(total),
            total_questions: total,
            progress: engine.progress(),
            outcome: outcome.map(OutcomeView::from),
        }
    }
}

fn option_views(question: &PresentedQuestion, feedback: Option<&AnswerFeedback>) -> Vec<OptionView> {
    question
        .options
        .iter()
        .enumerate()
        .map(|(position, option)| OptionView {
            label: option.label.clone(),
            image: option.image.clone(),
            highlight: feedback.and_then(|f| highlight_for(position, f)),
        })
        .collect()
}

fn highlight_for(position: usize, feedback: &AnswerFeedback) -> Option<Highlight> {
    if position == feedback.correct_position {
        Some(Highlight::Correct)
    } else if position == feedback.selected {
        Some(Highlight::Incorrect)
    } else {
        None
    }
}
