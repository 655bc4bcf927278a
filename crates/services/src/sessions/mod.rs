mod controller;
mod progress;
mod report;
mod view;

// Public API of the session subsystem.
pub use controller::SessionController;
pub use progress::SessionProgress;
pub use report::{report_completion, reset_for_retry};
pub use view::{DisplayState, FeedbackView, Highlight, OptionView, OutcomeView, Phase};
