#![forbid(unsafe_code)]

pub mod app_services;
pub mod assessment;
pub mod config;
pub mod entitlement;
pub mod error;
pub mod history;
pub mod quiz_api;

pub use quiz_core::Clock;

pub use app_services::AppServices;
pub use assessment::{
    AssessmentEngine, AssessmentSession, Finalization, SessionCommand, SessionDriver,
    SessionOutcome, SessionSnapshot, SubmissionCoordinator, SubmitReceipt,
};
pub use config::EngineConfig;
pub use entitlement::{EntitlementProvider, StaticEntitlement};
pub use error::{AppServicesError, SessionError};
pub use history::{ResultHistoryService, ResultId, ResultListItem};
pub use quiz_api::{HttpQuizSource, QuizApiConfig};
