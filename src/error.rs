/// Error type returned by this crate.
///
/// Every failure mode collapses into this one kind: DNS resolution,
/// connection refusal, TLS handshake failures, per-attempt timeouts and
/// non-200 status codes are all reported as a network failure carrying the
/// transport's last error description. The description is empty when the
/// final attempt completed with a non-200 status but no transport-level
/// error.
#[derive(Debug, thiserror::Error)]
#[error("network failure: {message}")]
pub struct NetworkError {
    message: String,
}

impl NetworkError {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        Self::new(err.to_string())
    }

    /// Transport error description carried by this failure; may be empty.
    pub fn message(&self) -> &str {
        &self.message
    }
}
