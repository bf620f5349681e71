use thiserror::Error;

/// Errors surfaced by the staged notifier and its configuration
#[derive(Debug, Error)]
pub enum NotifierError {
    /// A run needs at least one step to publish
    #[error("a staged run requires at least one step")]
    EmptySteps,

    /// Random-increment bounds must satisfy 1 <= min <= max
    #[error("invalid increment range: min {min}, max {max}")]
    InvalidIncrementRange { min: u8, max: u8 },

    /// Random-increment runs need a non-zero tick interval
    #[error("random-increment interval must be non-zero")]
    ZeroInterval,

    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse configuration: {0}")]
    Config(#[from] toml::de::Error),
}
