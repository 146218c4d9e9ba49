// RPC client: one bounded round trip per call.
//
// The backend future is raced against a timer with `tokio::time::timeout`.
// When the timer wins, the backend future is dropped, so a late answer can
// never be observed by the caller.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};

use crate::backend::{Backend, describe};
use crate::envelope::ServerResponse;
use crate::error::Error;

/// Timeout applied when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

/// Message carried by the error envelope of a timed-out call.
pub const NOT_RESPONDING: &str = "Server is not responding";

/// Cheaply cloneable handle to a backend plus the call timeout.
#[derive(Clone)]
pub struct RpcClient {
    backend: Arc<dyn Backend>,
    timeout: Duration,
}

impl RpcClient {
    pub fn new(backend: impl Backend + 'static) -> Self {
        Self::from_arc(Arc::new(backend))
    }

    pub fn from_arc(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Label of the active backend (`script` / `mock`).
    pub fn backend_kind(&self) -> &'static str {
        self.backend.kind()
    }

    /// Perform one call, surfacing transport failures as `Err`.
    pub async fn try_ask(&self, args: Vec<Value>) -> Result<ServerResponse, Error> {
        match tokio::time::timeout(self.timeout, self.backend.call(&args)).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout {
                timeout_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            }),
        }
    }

    /// Perform one call; every failure becomes an error envelope.
    pub async fn ask(&self, args: Vec<Value>) -> ServerResponse {
        let op = describe(&args);
        debug!(op = %op, backend = self.backend.kind(), "rpc call");

        match self.try_ask(args).await {
            Ok(resp) => {
                if resp.error {
                    debug!(op = %op, message = ?resp.message, "rpc returned error envelope");
                }
                resp
            }
            Err(e) => {
                warn!(op = %op, error = %e, "rpc failed");
                ServerResponse::failure(e.to_string())
            }
        }
    }
}

impl std::fmt::Debug for RpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcClient")
            .field("backend", &self.backend.kind())
            .field("timeout", &self.timeout)
            .finish()
    }
}
