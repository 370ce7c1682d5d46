/// Errors from prompt rendering and the completion provider.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// A required setting was not configured.
    #[error("LLM configuration missing: {0} must be set")]
    MissingConfig(&'static str),

    /// The template text could not be parsed.
    #[error("Invalid prompt template: {0}")]
    InvalidTemplate(String),

    /// A placeholder had no value at render time.
    #[error("Missing prompt variable: {0}")]
    MissingVariable(String),

    /// The HTTP request itself failed (network, DNS, TLS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The provider returned a non-2xx status code.
    #[error("LLM provider error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The provider answered 2xx but without usable message text.
    #[error("Malformed LLM response: {0}")]
    MalformedResponse(String),
}

impl LlmError {
    /// Whether the provider refused the call for quota or rate reasons.
    pub fn is_quota_exceeded(&self) -> bool {
        match self {
            Self::Api { status: 429, .. } => true,
            Self::Api { body, .. } => body.contains("insufficient_quota"),
            _ => false,
        }
    }
}
