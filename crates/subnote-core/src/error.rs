use thiserror::Error;

/// Top-level error type for the submission notifier.
#[derive(Error, Debug)]
pub enum SubnoteError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to load configuration: {0}")]
    ConfigSource(#[from] config::ConfigError),

    #[error("Invalid graph template: {0}")]
    GraphTemplate(String),
}
