use thiserror::Error;

/// Top-level error type for the `arc-api` crate.
///
/// These never cross [`RpcClient::ask`](crate::RpcClient::ask): the client
/// folds them into an error envelope whose message is this type's
/// `Display` output. [`RpcClient::try_ask`](crate::RpcClient::try_ask)
/// exposes them for callers that want the structured form.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The call did not settle before the client timeout.
    #[error("Server is not responding")]
    Timeout { timeout_ms: u64 },

    /// Non-success HTTP status from the script endpoint.
    #[error("HTTP {status}: {preview}")]
    Http { status: u16, preview: String },

    /// Building the underlying HTTP client failed.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(String),

    // ── Data ────────────────────────────────────────────────────────
    /// The response body is not a `{error, val, message}` envelope.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    /// Request arguments could not be encoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Returns `true` if this is a transient error worth retrying by hand.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Timeout { .. } => true,
            Self::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Returns `true` if the call timed out (either the client race or reqwest).
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Timeout { .. } => true,
            Self::Transport(e) => e.is_timeout(),
            _ => false,
        }
    }
}

/// Truncate a response body for inclusion in error messages.
pub(crate) fn preview(body: &str) -> String {
    body.chars().take(200).collect()
}
