mod ids;
mod outcome;
mod question;
mod session;
mod settings;

pub use ids::{ParseIdError, QuestionId};
pub use outcome::{FAIR_TIER_PERCENT, LessonStatus, ResultTier, SessionOutcome, UnknownLessonStatus};
pub use question::{AnswerOption, OPTION_COUNT, Question, QuestionError, ShuffledOption};
pub use session::{ProgressSnapshot, QuizSession, SnapshotError};
pub use settings::{QuizSettings, SettingsError};
