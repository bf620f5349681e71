pub mod cli;
pub mod config;
pub mod error;
pub mod notifier;
pub mod ui;
pub mod upload;
pub mod validate;

pub use config::NotifierConfig;
pub use error::NotifierError;
pub use notifier::{
    NotificationState, ProgressStep, RandomRunConfig, RunHandle, RunOptions,
    StagedProgressNotifier, StepKind, Threshold,
};
pub use upload::{DropOutcome, UploadController};
pub use validate::{FileCandidate, RejectReason, ValidationOutcome, ValidationPolicy};
