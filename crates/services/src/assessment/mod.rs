mod coordinator;
mod driver;
mod engine;
mod loader;
mod session;
mod ticker;
mod view;

pub use coordinator::{SubmissionCoordinator, SubmitReceipt};
pub use driver::{SessionCommand, SessionDriver, SessionOutcome};
pub use engine::AssessmentEngine;
pub use loader::SessionLoader;
pub use session::{AssessmentSession, Finalization, SessionTick};
pub use ticker::Ticker;
pub use view::SessionSnapshot;
