use thiserror::Error;

/// Error taxonomy for the CVAT REST client.
///
/// `Auth` and `Transport` carry the server's HTTP status and response body.
/// `Configuration` marks a precondition violation on the caller's side and is
/// always raised before any network call. There is no retry policy: the
/// first error aborts the entire run.
#[derive(Debug, Error)]
pub enum CvatError {
    #[error("Login rejected (HTTP {status}): {body}")]
    Auth { status: u16, body: String },

    #[error("Server returned HTTP {status} for {url}: {body}")]
    Transport {
        status: u16,
        url: String,
        body: String,
    },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl CvatError {
    /// True for precondition violations the caller must avoid, as opposed to
    /// environmental failures it can only report.
    #[allow(dead_code)] // classification helper, exercised by tests
    pub fn is_configuration(&self) -> bool {
        matches!(self, CvatError::Configuration(_))
    }
}
