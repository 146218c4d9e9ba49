// ── Records and record collections ──

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::CoreError;

/// `id` sentinel asking the server to assign a fresh id.
pub const UNASSIGNED_ID: i64 = -1;
/// `date` sentinel asking the server to stamp the creation time.
pub const SERVER_DATE: i64 = -1;

/// One row of a resource: two reserved fields plus open resource fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: i64,
    /// Creation time in milliseconds since the epoch.
    pub date: i64,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Record {
    pub fn new(id: i64, date: i64) -> Self {
        Self {
            id,
            date,
            fields: Map::new(),
        }
    }

    /// A record that lets the server assign `id` and `date`.
    pub fn draft(fields: Map<String, Value>) -> Self {
        let mut record = Self::new(UNASSIGNED_ID, SERVER_DATE);
        for (name, value) in fields {
            record.set(name, value);
        }
        record
    }

    /// Builder-style [`Record::set`].
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name.into(), value.into());
        self
    }

    /// Set a field. Integer values for `id`/`date` update the reserved fields.
    pub fn set(&mut self, name: String, value: Value) {
        match (name.as_str(), value.as_i64()) {
            ("id", Some(id)) => self.id = id,
            ("date", Some(date)) => self.date = date,
            _ => {
                self.fields.insert(name, value);
            }
        }
    }

    /// Look up any field by name, reserved fields included.
    pub fn field(&self, name: &str) -> Option<Value> {
        match name {
            "id" => Some(Value::from(self.id)),
            "date" => Some(Value::from(self.date)),
            _ => self.fields.get(name).cloned(),
        }
    }

    /// Plain-text rendering of a field for labels; empty when absent.
    pub fn text(&self, name: &str) -> String {
        match self.field(name) {
            Some(Value::String(s)) => s,
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        }
    }

    pub fn is_unassigned(&self) -> bool {
        self.id == UNASSIGNED_ID
    }

    /// Collection key for this record (the decimal id).
    pub fn key(&self) -> String {
        self.id.to_string()
    }
}

impl TryFrom<Value> for Record {
    type Error = CoreError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        serde_json::from_value(value).map_err(|e| CoreError::InvalidRecord {
            message: e.to_string(),
        })
    }
}

/// Records keyed by the decimal string of their id.
///
/// Deserialization rejects maps whose keys disagree with the record ids.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, Record>",
    into = "BTreeMap<String, Record>"
)]
pub struct RecordCollection {
    records: BTreeMap<i64, Record>,
}

impl RecordCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: i64) -> Option<&Record> {
        self.records.get(&id)
    }

    pub fn contains(&self, id: i64) -> bool {
        self.records.contains_key(&id)
    }

    /// Insert or replace by `record.id`, returning the previous record.
    pub fn insert(&mut self, record: Record) -> Option<Record> {
        self.records.insert(record.id, record)
    }

    pub fn remove(&mut self, id: i64) -> Option<Record> {
        self.records.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.records.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = i64> + '_ {
        self.records.keys().copied()
    }
}

impl FromIterator<Record> for RecordCollection {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().map(|r| (r.id, r)).collect(),
        }
    }
}

impl TryFrom<BTreeMap<String, Record>> for RecordCollection {
    type Error = CoreError;

    fn try_from(map: BTreeMap<String, Record>) -> Result<Self, Self::Error> {
        let mut records = BTreeMap::new();
        for (key, record) in map {
            if key != record.key() {
                return Err(CoreError::InvalidRecord {
                    message: format!("key {key} does not match record id {}", record.id),
                });
            }
            records.insert(record.id, record);
        }
        Ok(Self { records })
    }
}

impl From<RecordCollection> for BTreeMap<String, Record> {
    fn from(collection: RecordCollection) -> Self {
        collection
            .records
            .into_values()
            .map(|r| (r.key(), r))
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn record_flattens_resource_fields() {
        let record: Record =
            serde_json::from_value(json!({"id": 7, "date": 100, "firstName": "Ada"})).unwrap();
        assert_eq!(record.id, 7);
        assert_eq!(record.text("firstName"), "Ada");
        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            json!({"id": 7, "date": 100, "firstName": "Ada"})
        );
    }

    #[test]
    fn record_requires_reserved_fields() {
        assert!(Record::try_from(json!({"date": 1})).is_err());
        assert!(Record::try_from(json!({"id": "x", "date": 1})).is_err());
    }

    #[test]
    fn draft_uses_sentinels_and_routes_reserved_names() {
        let mut fields = Map::new();
        fields.insert("firstName".into(), json!("Ada"));
        let draft = Record::draft(fields);
        assert!(draft.is_unassigned());
        assert_eq!(draft.date, SERVER_DATE);

        let record = draft.with_field("id", 42).with_field("grade", 9);
        assert_eq!(record.id, 42);
        assert!(!record.fields.contains_key("id"));
        assert_eq!(record.field("grade"), Some(json!(9)));
    }

    #[test]
    fn collection_rejects_mismatched_keys() {
        let bad = json!({"1": {"id": 2, "date": 0}});
        let err = serde_json::from_value::<RecordCollection>(bad).unwrap_err();
        assert!(err.to_string().contains("does not match record id"));
    }

    #[test]
    fn collection_serializes_with_string_keys() {
        let collection: RecordCollection =
            [Record::new(1, 0), Record::new(12, 0)].into_iter().collect();
        let json = serde_json::to_value(&collection).unwrap();
        assert_eq!(
            json,
            json!({"1": {"id": 1, "date": 0}, "12": {"id": 12, "date": 0}})
        );
        assert_eq!(serde_json::from_value::<RecordCollection>(json).unwrap(), collection);
    }
}
