// ── Resource endpoint ──
//
// Typed wrapper over the five per-resource server operations. Every call is
// one `[resource, op, ...args]` request through the RPC client.

use serde_json::Value;
use strum::{AsRefStr, Display, EnumString};
use tracing::debug;

use arc_api::{RpcClient, ServerResponse};

use crate::ask::AskFinished;
use crate::model::{Record, RecordCollection, ResourceName};

/// Per-resource server operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "camelCase")]
pub enum ResourceOp {
    RetrieveAll,
    Create,
    Update,
    Delete,
    Debug,
}

#[derive(Debug, Clone)]
pub struct ResourceEndpoint {
    name: ResourceName,
    rpc: RpcClient,
}

impl ResourceEndpoint {
    pub fn new(name: ResourceName, rpc: RpcClient) -> Self {
        Self { name, rpc }
    }

    pub fn name(&self) -> ResourceName {
        self.name
    }

    pub fn rpc(&self) -> &RpcClient {
        &self.rpc
    }

    async fn call(&self, op: ResourceOp, arg: Option<Value>) -> ServerResponse {
        debug!(resource = %self.name, op = %op, "endpoint call");
        let mut args = vec![Value::from(self.name.as_ref()), Value::from(op.as_ref())];
        args.extend(arg);
        self.rpc.ask(args).await
    }

    fn encode(record: &Record) -> Result<Value, String> {
        serde_json::to_value(record).map_err(|e| format!("failed to encode record: {e}"))
    }

    /// Fetch the whole collection.
    pub async fn retrieve_all(&self) -> AskFinished<RecordCollection> {
        AskFinished::from_response(self.call(ResourceOp::RetrieveAll, None).await)
    }

    /// Create a record; the server answers with the stored record.
    pub async fn create(&self, record: &Record) -> AskFinished<Record> {
        match Self::encode(record) {
            Ok(payload) => {
                AskFinished::from_response(self.call(ResourceOp::Create, Some(payload)).await)
            }
            Err(message) => AskFinished::error(message),
        }
    }

    /// Replace a record. Any success payload is ignored.
    pub async fn update(&self, record: &Record) -> AskFinished<()> {
        match Self::encode(record) {
            Ok(payload) => AskFinished::<Value>::from_response(
                self.call(ResourceOp::Update, Some(payload)).await,
            )
            .map(|_| ()),
            Err(message) => AskFinished::error(message),
        }
    }

    pub async fn delete(&self, id: i64) -> AskFinished<()> {
        AskFinished::<Value>::from_response(
            self.call(ResourceOp::Delete, Some(Value::from(id))).await,
        )
        .map(|_| ())
    }

    /// Server-side diagnostic dump for this resource.
    pub async fn debug(&self) -> AskFinished<Value> {
        AskFinished::from_response(self.call(ResourceOp::Debug, None).await)
    }
}
