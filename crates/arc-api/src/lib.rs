//! Async RPC transport for the ARC App script endpoint.
//!
//! Every remote operation is one ordered argument list
//! (`[opName, ...args]`) answered by a [`ServerResponse`] envelope.
//!
//! - **[`RpcClient`]** races each call against a timeout and folds every
//!   failure (network, HTTP status, malformed body, timeout) into an error
//!   envelope. [`RpcClient::ask`] never returns `Err`.
//! - **[`Backend`]**: the pluggable round trip. [`ScriptBackend`] posts to
//!   the deployed script web app over HTTP; [`MockBackend`] keeps an
//!   in-memory per-resource store with simulated latency.

pub mod backend;
pub mod commands;
pub mod envelope;
pub mod error;
pub mod rpc;
pub mod transport;

pub use backend::{Backend, MockBackend, ScriptBackend};
pub use envelope::ServerResponse;
pub use error::Error;
pub use rpc::RpcClient;
pub use transport::TransportConfig;
