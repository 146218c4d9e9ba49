// In-memory mock of the script endpoint
//
// Keeps one table per resource name and answers the same CRUD and command
// protocol as the deployed script, after an optional simulated latency.
// A call dropped during the latency sleep never touches the tables.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use chrono::Utc;
use futures_util::future::BoxFuture;
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tracing::debug;

use super::Backend;
use crate::envelope::ServerResponse;
use crate::error::Error;

/// Ids handed out by the mock start above this value.
const FIRST_ASSIGNED_ID: i64 = 1000;

/// Sentinel for "let the server decide" on both `id` and `date`.
const SENTINEL: i64 = -1;

type Table = BTreeMap<i64, Map<String, Value>>;

/// In-memory per-resource key-value store speaking the script protocol.
pub struct MockBackend {
    tables: Mutex<HashMap<String, Table>>,
    latency: Duration,
}

impl MockBackend {
    /// Create a mock with one empty table per resource name.
    pub fn new<I, S>(resources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tables = resources
            .into_iter()
            .map(|name| (name.into(), Table::new()))
            .collect();
        Self {
            tables: Mutex::new(tables),
            latency: Duration::ZERO,
        }
    }

    /// Delay every call by `latency` before touching the tables.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Seed `resource` with records. Entries without an integer `id` are skipped.
    pub fn with_records(mut self, resource: &str, records: impl IntoIterator<Item = Value>) -> Self {
        {
            let tables = self.tables.get_mut();
            let table = tables.entry(resource.to_owned()).or_default();
            for record in records {
                if let Value::Object(map) = record {
                    if let Some(id) = map.get("id").and_then(Value::as_i64) {
                        table.insert(id, map);
                    }
                }
            }
        }
        self
    }

    /// Current contents of one table, keyed by stringified id.
    pub async fn records(&self, resource: &str) -> Option<Map<String, Value>> {
        let tables = self.tables.lock().await;
        tables.get(resource).map(table_to_collection)
    }

    async fn handle(&self, args: &[Value]) -> ServerResponse {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let Some(head) = args.first().and_then(Value::as_str) else {
            return ServerResponse::failure("missing operation name");
        };

        match head {
            "refreshRequestSubmissionsWithForm" => ServerResponse::ok(Value::Null),
            "debug" => {
                let tables = self.tables.lock().await;
                let dump: Map<String, Value> = tables
                    .iter()
                    .map(|(name, table)| (name.clone(), Value::Object(table_to_collection(table))))
                    .collect();
                ServerResponse::ok(Value::Object(dump))
            }
            "command" => match args.get(1).and_then(Value::as_str) {
                Some("ping") => ServerResponse::ok(Value::String("pong".into())),
                Some(other) => ServerResponse::failure(format!("unknown command: {other}")),
                None => ServerResponse::failure("missing command name"),
            },
            resource => self.resource_op(resource, &args[1..]).await,
        }
    }

    async fn resource_op(&self, resource: &str, rest: &[Value]) -> ServerResponse {
        let mut tables = self.tables.lock().await;
        let Some(table) = tables.get_mut(resource) else {
            return ServerResponse::failure(format!("unknown resource or command: {resource}"));
        };

        match rest.first().and_then(Value::as_str) {
            Some("retrieveAll") => ServerResponse::ok(Value::Object(table_to_collection(table))),
            Some("create") => create(resource, table, rest.get(1)),
            Some("update") => update(resource, table, rest.get(1)),
            Some("delete") => {
                let Some(id) = rest.get(1).and_then(Value::as_i64) else {
                    return ServerResponse::failure("delete expects an integer id");
                };
                if table.remove(&id).is_none() {
                    return not_found(resource, id);
                }
                debug!(resource, id, "mock: deleted record");
                ServerResponse::ok(Value::Null)
            }
            Some("debug") => ServerResponse::ok(Value::Object(table_to_collection(table))),
            Some(other) => ServerResponse::failure(format!("unknown operation: {resource}.{other}")),
            None => ServerResponse::failure(format!("missing operation for {resource}")),
        }
    }
}

fn create(resource: &str, table: &mut Table, record: Option<&Value>) -> ServerResponse {
    let Some(Value::Object(record)) = record else {
        return ServerResponse::failure("create expects a record object");
    };
    let mut record = record.clone();

    let requested = record.get("id").and_then(Value::as_i64).unwrap_or(SENTINEL);
    let id = if requested == SENTINEL {
        table
            .keys()
            .next_back()
            .map_or(FIRST_ASSIGNED_ID, |max| (*max).max(FIRST_ASSIGNED_ID - 1) + 1)
    } else if table.contains_key(&requested) {
        return ServerResponse::failure(format!("record already exists: {resource}/#{requested}"));
    } else {
        requested
    };
    record.insert("id".into(), Value::from(id));

    if record.get("date").and_then(Value::as_i64).unwrap_or(SENTINEL) == SENTINEL {
        record.insert("date".into(), Value::from(Utc::now().timestamp_millis()));
    }

    table.insert(id, record.clone());
    debug!(resource, id, "mock: created record");
    ServerResponse::ok(Value::Object(record))
}

fn update(resource: &str, table: &mut Table, record: Option<&Value>) -> ServerResponse {
    let Some(Value::Object(record)) = record else {
        return ServerResponse::failure("update expects a record object");
    };
    let Some(id) = record.get("id").and_then(Value::as_i64) else {
        return ServerResponse::failure("update expects a record with an integer id");
    };
    let Some(slot) = table.get_mut(&id) else {
        return not_found(resource, id);
    };
    *slot = record.clone();
    debug!(resource, id, "mock: updated record");
    ServerResponse::ok(Value::Null)
}

fn not_found(resource: &str, id: i64) -> ServerResponse {
    ServerResponse::failure(format!("record not found: {resource}/#{id}"))
}

fn table_to_collection(table: &Table) -> Map<String, Value> {
    table
        .iter()
        .map(|(id, record)| (id.to_string(), Value::Object(record.clone())))
        .collect()
}

impl Backend for MockBackend {
    fn call<'a>(&'a self, args: &'a [Value]) -> BoxFuture<'a, Result<ServerResponse, Error>> {
        Box::pin(async move { Ok(self.handle(args).await) })
    }

    fn kind(&self) -> &'static str {
        "mock"
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn mock() -> MockBackend {
        MockBackend::new(["tutors", "learners"])
    }

    async fn call(backend: &MockBackend, args: Value) -> ServerResponse {
        let args = args.as_array().unwrap().clone();
        backend.call(&args).await.unwrap()
    }

    #[tokio::test]
    async fn create_assigns_id_and_date_for_sentinels() {
        let backend = mock();
        let resp = call(
            &backend,
            json!(["tutors", "create", {"id": -1, "date": -1, "firstName": "A"}]),
        )
        .await;

        assert!(!resp.error);
        assert_eq!(resp.val["id"], json!(1000));
        assert!(resp.val["date"].as_i64().unwrap() > 0);
        assert_eq!(resp.val["firstName"], json!("A"));

        let second = call(&backend, json!(["tutors", "create", {"id": -1, "date": 5}])).await;
        assert_eq!(second.val["id"], json!(1001));
        assert_eq!(second.val["date"], json!(5));
    }

    #[tokio::test]
    async fn create_keeps_explicit_ids_above_existing() {
        let backend = mock().with_records("tutors", [json!({"id": 2000, "date": 1})]);
        let resp = call(&backend, json!(["tutors", "create", {"id": -1, "date": 1}])).await;
        assert_eq!(resp.val["id"], json!(2001));

        let dup = call(&backend, json!(["tutors", "create", {"id": 2000, "date": 1}])).await;
        assert!(dup.error);
    }

    #[tokio::test]
    async fn update_and_delete_fail_for_unknown_ids() {
        let backend = mock();
        let update = call(&backend, json!(["tutors", "update", {"id": 7, "date": 1}])).await;
        assert_eq!(update.message.as_deref(), Some("record not found: tutors/#7"));

        let delete = call(&backend, json!(["tutors", "delete", 7])).await;
        assert!(delete.error);
    }

    #[tokio::test]
    async fn retrieve_all_is_keyed_by_stringified_id() {
        let backend = mock().with_records("learners", [json!({"id": 3, "date": 1, "grade": 9})]);
        let resp = call(&backend, json!(["learners", "retrieveAll"])).await;
        assert_eq!(resp.val, json!({"3": {"id": 3, "date": 1, "grade": 9}}));
    }

    #[tokio::test]
    async fn unknown_routes_fail() {
        let backend = mock();
        assert!(call(&backend, json!(["nope", "retrieveAll"])).await.error);
        assert!(call(&backend, json!(["tutors", "explode"])).await.error);
        assert!(call(&backend, json!([])).await.error);
        assert!(call(&backend, json!(["command", "selfDestruct"])).await.error);
    }

    #[tokio::test]
    async fn reserved_commands_succeed() {
        let backend = mock();
        let refresh = call(&backend, json!(["refreshRequestSubmissionsWithForm"])).await;
        assert!(!refresh.error);

        let ping = call(&backend, json!(["command", "ping"])).await;
        assert_eq!(ping.val, json!("pong"));

        let debug = call(&backend, json!(["debug"])).await;
        assert_eq!(debug.val["tutors"], json!({}));
    }
}
