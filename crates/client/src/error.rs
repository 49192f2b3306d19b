/// Error type for warehouse operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport failure (DNS, connect, TLS, timeout)
    #[error("network error: {0}")]
    Network(String),
    /// Server answered with an unexpected status
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },
    /// Response body did not have the expected shape
    #[error("parse error: {0}")]
    Parse(String),
    /// User signing key could not be decoded
    #[error("invalid user key: {0}")]
    Key(String),
    /// Configured auth scheme cannot be signed locally
    #[error("unsupported auth scheme {0:?}: only ed25519 is supported")]
    Scheme(String),
    /// Capability token could not be built or verified
    #[error("capability token error: {0}")]
    Capability(String),
    /// Query result was not a readable Arrow IPC stream
    #[error("cannot decode Arrow stream: {0}")]
    Decode(String),
}

impl ClientError {
    /// HTTP status code, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}
