// ── Resource facade ──
//
// Bundles a resource's name, field metadata and observable cache, and adds
// the presentation helpers (labels and markers) on top.

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::warn;

use arc_api::RpcClient;

use crate::ask::AskFinished;
use crate::endpoint::ResourceEndpoint;
use crate::error::CoreError;
use crate::model::{Record, ResourceInfo, ResourceName};
use crate::store::ResourceObservable;

/// A lightweight reference to one record, for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Marker {
    pub resource: ResourceName,
    pub id: i64,
    pub label: String,
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

#[derive(Debug)]
pub struct Resource {
    name: ResourceName,
    info: ResourceInfo,
    state: ResourceObservable,
}

impl Resource {
    pub fn new(name: ResourceName, info: ResourceInfo, rpc: RpcClient) -> Self {
        Self {
            name,
            info,
            state: ResourceObservable::new(ResourceEndpoint::new(name, rpc)),
        }
    }

    pub fn name(&self) -> ResourceName {
        self.name
    }

    pub fn info(&self) -> &ResourceInfo {
        &self.info
    }

    pub fn state(&self) -> &ResourceObservable {
        &self.state
    }

    pub fn endpoint(&self) -> &ResourceEndpoint {
        self.state.endpoint()
    }

    pub fn get_record_or_fail(&self, id: i64) -> Result<Record, CoreError> {
        self.state.get_record_or_fail(id)
    }

    // ── Labels & markers ─────────────────────────────────────────────

    /// Placeholder label for records that cannot be rendered.
    pub fn unknown_label(id: i64) -> String {
        format!("(??? UNKNOWN #{id} ???)")
    }

    /// Render a label for `id`. Never fails: any lookup or formatting error
    /// yields the unknown placeholder.
    pub fn create_label(&self, id: i64, formatter: impl FnOnce(&Record) -> String) -> String {
        self.try_create_label(id, |record| Ok(formatter(record)))
    }

    /// [`Resource::create_label`] with a formatter that may itself fail, e.g.
    /// when it looks up records in other resources.
    pub fn try_create_label(
        &self,
        id: i64,
        formatter: impl FnOnce(&Record) -> Result<String, CoreError>,
    ) -> String {
        match self.get_record_or_fail(id).and_then(|record| formatter(&record)) {
            Ok(label) => label,
            Err(e) => {
                warn!(resource = %self.name, id, error = %e, "label unavailable");
                Self::unknown_label(id)
            }
        }
    }

    pub fn create_marker(&self, id: i64, formatter: impl FnOnce(&Record) -> String) -> Marker {
        Marker {
            resource: self.name,
            id,
            label: self.create_label(id, formatter),
        }
    }

    // ── Writes ───────────────────────────────────────────────────────

    /// A new record with server-assigned `id` and `date`.
    pub fn draft_record(&self, fields: Map<String, Value>) -> Record {
        Record::draft(fields)
    }

    pub fn validate(&self, record: &Record) -> Result<(), CoreError> {
        self.info.validate_record(record)
    }

    /// Validate, then create through the cache.
    pub async fn create_record(&self, record: Record) -> AskFinished<Record> {
        if let Err(e) = self.validate(&record) {
            return AskFinished::error(e.to_string());
        }
        self.state.create_record(record).await
    }

    /// Validate, then update through the cache.
    pub async fn update_record(&self, record: Record) -> AskFinished<()> {
        if let Err(e) = self.validate(&record) {
            return AskFinished::error(e.to_string());
        }
        self.state.update_record(record).await
    }

    pub async fn delete_record(&self, id: i64) -> AskFinished<()> {
        self.state.delete_record(id).await
    }
}
