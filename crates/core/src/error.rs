#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Missing configuration: {0} must be set")]
    MissingConfig(&'static str),

    #[error("Internal error: {0}")]
    Internal(String),
}
