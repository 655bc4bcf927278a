#![forbid(unsafe_code)]

pub mod engine;
pub mod error;
pub mod sessions;

pub use quiz_core::Clock;
pub use sessions as session;

pub use engine::{AnswerFeedback, Presentation, PresentedQuestion, QuizEngine};
pub use error::SessionError;

pub use sessions::{
    DisplayState, FeedbackView, Highlight, OptionView, OutcomeView, Phase, SessionController,
    SessionProgress, report_completion, reset_for_retry,
};
