use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::QuestionId;

/// Every question offers exactly this many options.
pub const OPTION_COUNT: usize = 4;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question prompt cannot be empty")]
    EmptyPrompt,

    #[error("option {slot} has neither a label nor an image")]
    EmptyOption { slot: usize },

    #[error("correct option index {index} is out of range (expected 0..{OPTION_COUNT})")]
    CorrectIndexOutOfRange { index: usize },
}

//
// ─── OPTIONS ───────────────────────────────────────────────────────────────────
//

/// One answer option as authored in the bank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOption {
    pub label: String,
    pub image: Option<String>,
}

impl AnswerOption {
    #[must_use]
    pub fn text(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            image: None,
        }
    }

    #[must_use]
    pub fn with_image(label: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            image: Some(image.into()),
        }
    }

    fn is_blank(&self) -> bool {
        self.label.trim().is_empty() && self.image.as_deref().is_none_or(|i| i.trim().is_empty())
    }
}

/// An option as shown for one presentation of a question.
///
/// `slot` is the option's position in the authored question, so the view can
/// be traced back to the bank regardless of the shuffle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShuffledOption {
    pub label: String,
    pub image: Option<String>,
    pub is_correct: bool,
    pub slot: usize,
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// Immutable multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    prompt: String,
    options: [AnswerOption; OPTION_COUNT],
    correct: usize,
}

impl Question {
    /// Builds a validated question.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` when the prompt or an option is blank, or when
    /// `correct` does not address one of the options.
    pub fn new(
        id: QuestionId,
        prompt: impl Into<String>,
        options: [AnswerOption; OPTION_COUNT],
        correct: usize,
    ) -> Result<Self, QuestionError> {
        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(QuestionError::EmptyPrompt);
        }
        if let Some(slot) = options.iter().position(AnswerOption::is_blank) {
            return Err(QuestionError::EmptyOption { slot });
        }
        if correct >= OPTION_COUNT {
            return Err(QuestionError::CorrectIndexOutOfRange { index: correct });
        }

        Ok(Self {
            id,
            prompt,
            options,
            correct,
        })
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn options(&self) -> &[AnswerOption; OPTION_COUNT] {
        &self.options
    }

    #[must_use]
    pub fn correct_index(&self) -> usize {
        self.correct
    }

    /// Options tagged with correctness, in authored order.
    #[must_use]
    pub fn tagged_options(&self) -> [ShuffledOption; OPTION_COUNT] {
        std::array::from_fn(|slot| {
            let option = &self.options[slot];
            ShuffledOption {
                label: option.label.clone(),
                image: option.image.clone(),
                is_correct: slot == self.correct,
                slot,
            }
        })
    }
}
