// ── Data checker ──
//
// Walks every loaded record of every resource, validates each declared
// field, and confirms that id references point at existing records.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use strum::IntoEnumIterator;

use crate::error::CoreError;
use crate::model::{FieldCheck, RecordCollection, ResourceName, json_type_name};
use crate::registry::ResourceRegistry;

/// Where a problem was found. Serialized without a variant tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ProblemTag {
    Record {
        resource: ResourceName,
        id: i64,
    },
    Field {
        resource: ResourceName,
        field: String,
    },
    Value {
        resource: ResourceName,
        value: String,
        #[serde(rename = "type")]
        value_type: String,
    },
    IdResource {
        resource: ResourceName,
        #[serde(rename = "idResource")]
        id_resource: ResourceName,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataProblem {
    pub text: String,
    pub tags: Vec<ProblemTag>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataCheckReport {
    pub valid_fields: usize,
    pub problems: Vec<DataProblem>,
}

fn value_tag(resource: ResourceName, value: Option<&Value>) -> ProblemTag {
    let text = match value {
        None => "undefined".to_owned(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    };
    ProblemTag::Value {
        resource,
        value: text,
        value_type: json_type_name(value).to_owned(),
    }
}

/// Check every record of every resource.
///
/// Fails if any resource is not loaded.
pub fn run_data_checker(registry: &ResourceRegistry) -> Result<DataCheckReport, CoreError> {
    let collections: Vec<(ResourceName, Arc<RecordCollection>)> = ResourceName::iter()
        .map(|name| {
            let collection = registry.get(name).state().get_record_collection_or_fail()?;
            Ok::<_, CoreError>((name, collection))
        })
        .collect::<Result<_, _>>()?;
    let lookup = |name: ResourceName| {
        collections
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, c)| Arc::clone(c))
    };

    let mut report = DataCheckReport::default();
    for (name, records) in &collections {
        let name = *name;
        let info = registry.get(name).info();
        for record in records.iter() {
            for field in info.fields() {
                let value = record.field(&field.name);
                let tags = || {
                    vec![
                        ProblemTag::Record {
                            resource: name,
                            id: record.id,
                        },
                        ProblemTag::Field {
                            resource: name,
                            field: field.name.clone(),
                        },
                    ]
                };
                match field.kind.validate(value.as_ref()) {
                    FieldCheck::Valid => report.valid_fields += 1,
                    FieldCheck::Invalid(text) => {
                        let mut tags = tags();
                        tags.push(value_tag(name, value.as_ref()));
                        report.problems.push(DataProblem { text, tags });
                    }
                    FieldCheck::CheckId(target) => {
                        let exists = value
                            .as_ref()
                            .and_then(Value::as_i64)
                            .zip(lookup(target))
                            .is_some_and(|(id, target)| target.contains(id));
                        if exists {
                            report.valid_fields += 1;
                        } else {
                            let mut tags = tags();
                            tags.push(ProblemTag::IdResource {
                                resource: name,
                                id_resource: target,
                            });
                            tags.push(value_tag(name, value.as_ref()));
                            report.problems.push(DataProblem {
                                text: "invalid ID".into(),
                                tags,
                            });
                        }
                    }
                }
            }
        }
    }
    Ok(report)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{FieldInfo, FieldKind, ResourceInfo};
    use arc_api::{MockBackend, RpcClient};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    async fn registry(mock: MockBackend) -> ResourceRegistry {
        let bookings = ResourceInfo::for_resource(ResourceName::Bookings)
            .with_field(FieldInfo::new("learner", "Learner", FieldKind::Id(ResourceName::Learners)))
            .with_field(FieldInfo::new("status", "Status", FieldKind::String));
        let reg = ResourceRegistry::builder(RpcClient::new(mock))
            .with_info(ResourceName::Bookings, bookings)
            .build();
        reg.initialize_resources().await;
        reg
    }

    fn mock() -> MockBackend {
        MockBackend::new(ResourceName::iter().map(|n| n.to_string()))
            .with_records("learners", [json!({"id": 1, "date": 0})])
    }

    #[tokio::test]
    async fn clean_data_has_no_problems() {
        let reg = registry(
            mock().with_records("bookings", [json!({"id": 5, "date": 0, "learner": 1, "status": "ok"})]),
        )
        .await;
        let report = run_data_checker(&reg).unwrap();
        assert!(report.problems.is_empty());
        // learner: id + date; booking: learner + status + id + date
        assert_eq!(report.valid_fields, 6);
    }

    #[tokio::test]
    async fn dangling_id_is_reported() {
        let reg = registry(
            mock().with_records("bookings", [json!({"id": 5, "date": 0, "learner": 9, "status": "ok"})]),
        )
        .await;
        let report = run_data_checker(&reg).unwrap();
        assert_eq!(report.problems.len(), 1);

        let problem = &report.problems[0];
        assert_eq!(problem.text, "invalid ID");
        assert_eq!(
            serde_json::to_value(&problem.tags).unwrap(),
            json!([
                {"resource": "bookings", "id": 5},
                {"resource": "bookings", "field": "learner"},
                {"resource": "bookings", "idResource": "learners"},
                {"resource": "bookings", "value": "9", "type": "number"}
            ])
        );
    }

    #[tokio::test]
    async fn bad_value_is_reported_with_type() {
        let reg = registry(mock().with_records("bookings", [json!({"id": 5, "date": 0, "learner": 1})])).await;
        let report = run_data_checker(&reg).unwrap();
        assert_eq!(report.problems.len(), 1);
        assert_eq!(report.problems[0].text, "missing value");
        assert_eq!(
            report.problems[0].tags[2],
            ProblemTag::Value {
                resource: ResourceName::Bookings,
                value: "undefined".into(),
                value_type: "undefined".into(),
            }
        );
    }

    #[tokio::test]
    async fn unloaded_resource_fails_the_run() {
        let mock = MockBackend::new(["tutors"]);
        let reg = ResourceRegistry::new(RpcClient::new(mock));
        reg.initialize_resources().await;
        let err = run_data_checker(&reg).unwrap_err();
        assert_eq!(err.to_string(), "unknown resource or command: learners");
    }
}
