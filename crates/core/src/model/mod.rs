mod answers;
mod countdown;
mod ids;
mod navigator;
mod question;
mod quiz;
pub mod raw;
mod result;
mod session;

pub use ids::{ParseIdError, QuestionId, QuizId, SessionId};

pub use answers::AnswerStore;
pub use countdown::{Countdown, CountdownState, TickOutcome};
pub use navigator::Navigator;
pub use question::{MIN_OPTIONS, Question};
pub use quiz::{DEFAULT_DURATION_SECS, QuizDefinition, QuizError, QuizHeader};
pub use result::{QuizResult, ResultError, Score, SubmitTrigger};
pub use session::SessionStatus;
