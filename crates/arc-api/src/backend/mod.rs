// ── RPC backends ──
//
// One round trip per call. Backends may fail with `Error`; `RpcClient`
// owns the timeout and the conversion into error envelopes.

mod mock;
mod script;

use futures_util::future::BoxFuture;
use serde_json::Value;

use crate::envelope::ServerResponse;
use crate::error::Error;

pub use mock::MockBackend;
pub use script::ScriptBackend;

/// A single-call transport to the remote script.
pub trait Backend: Send + Sync {
    /// Perform one call with the ordered argument list `[opName, ...args]`.
    fn call<'a>(&'a self, args: &'a [Value]) -> BoxFuture<'a, Result<ServerResponse, Error>>;

    /// Short label used in logs.
    fn kind(&self) -> &'static str;
}

/// Render the routing prefix of an argument list for logging
/// (`tutors.create`, `debug`, ...).
pub(crate) fn describe(args: &[Value]) -> String {
    let mut parts = args.iter().take(2).filter_map(Value::as_str);
    match (parts.next(), parts.next()) {
        (Some(head), Some(op)) => format!("{head}.{op}"),
        (Some(head), None) => head.to_owned(),
        _ => "<invalid>".to_owned(),
    }
}
