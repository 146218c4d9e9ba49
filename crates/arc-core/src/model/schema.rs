// ── Per-resource field metadata ──
//
// Every resource carries a `ResourceInfo`: its titles and a list of typed
// fields. The reserved `id` and `date` fields are always present.

use serde::Serialize;
use serde_json::Value;

use super::record::Record;
use super::resource_name::ResourceName;
use crate::error::CoreError;

/// The value shape a field accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "of", rename_all = "camelCase")]
pub enum FieldKind {
    String,
    Number,
    /// Milliseconds since the epoch.
    Datetime,
    NumberArray,
    /// One of a fixed set of strings.
    Select(Vec<String>),
    /// The id of a record in another resource.
    Id(ResourceName),
    /// Any JSON value.
    Json,
}

/// Result of checking one field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldCheck {
    Valid,
    Invalid(String),
    /// Well-formed id; the caller must confirm it exists in the named resource.
    CheckId(ResourceName),
}

impl FieldKind {
    pub fn validate(&self, value: Option<&Value>) -> FieldCheck {
        let Some(value) = value else {
            return FieldCheck::Invalid("missing value".into());
        };
        match self {
            Self::String if value.is_string() => FieldCheck::Valid,
            Self::String => FieldCheck::Invalid("expected a string".into()),
            Self::Number if value.is_number() => FieldCheck::Valid,
            Self::Number => FieldCheck::Invalid("expected a number".into()),
            Self::Datetime if value.is_i64() => FieldCheck::Valid,
            Self::Datetime => FieldCheck::Invalid("expected a timestamp".into()),
            Self::NumberArray => match value.as_array() {
                Some(items) if items.iter().all(Value::is_number) => FieldCheck::Valid,
                _ => FieldCheck::Invalid("expected a list of numbers".into()),
            },
            Self::Select(options) => match value.as_str() {
                Some(s) if options.iter().any(|o| o == s) => FieldCheck::Valid,
                _ => FieldCheck::Invalid(format!("expected one of: {}", options.join(", "))),
            },
            Self::Id(resource) if value.is_i64() => FieldCheck::CheckId(*resource),
            Self::Id(_) => FieldCheck::Invalid("expected an id".into()),
            Self::Json => FieldCheck::Valid,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldInfo {
    pub name: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
    pub kind: FieldKind,
}

impl FieldInfo {
    pub fn new(name: impl Into<String>, title: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            title: title.into(),
            help: None,
            kind,
        }
    }

    #[must_use]
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn is_reserved(&self) -> bool {
        self.name == "id" || self.name == "date"
    }
}

fn reserved_fields() -> [FieldInfo; 2] {
    [
        FieldInfo::new("id", "ID", FieldKind::Number)
            .with_help("Do not modify unless you really know what you're doing!"),
        FieldInfo::new("date", "Date", FieldKind::Datetime)
            .with_help("Date of creation -- do not change"),
    ]
}

/// Titles and fields of one resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceInfo {
    pub title: String,
    pub plural_title: String,
    fields: Vec<FieldInfo>,
}

impl ResourceInfo {
    /// Info with only the reserved `id` and `date` fields.
    pub fn new(title: impl Into<String>, plural_title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            plural_title: plural_title.into(),
            fields: reserved_fields().into(),
        }
    }

    pub fn for_resource(name: ResourceName) -> Self {
        Self::new(name.title(), name.plural_title())
    }

    /// Add a resource field. Redeclaring `id` or `date` replaces the reserved one.
    #[must_use]
    pub fn with_field(mut self, field: FieldInfo) -> Self {
        if let Some(existing) = self.fields.iter_mut().find(|f| f.name == field.name) {
            *existing = field;
        } else {
            let at = self.fields.len().saturating_sub(2);
            self.fields.insert(at, field);
        }
        self
    }

    /// Resource fields first, reserved fields last.
    pub fn fields(&self) -> &[FieldInfo] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldInfo> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Check every declared field of an outbound record.
    ///
    /// Id references are only checked for shape here.
    pub fn validate_record(&self, record: &Record) -> Result<(), CoreError> {
        for field in &self.fields {
            if let FieldCheck::Invalid(reason) = field.kind.validate(record.field(&field.name).as_ref())
            {
                return Err(CoreError::ValidationFailed {
                    message: format!("{} {}: {reason}", self.title, field.name),
                });
            }
        }
        Ok(())
    }
}

/// JSON type name used in problem reports (`"undefined"` for a missing value).
pub fn json_type_name(value: Option<&Value>) -> &'static str {
    match value {
        None => "undefined",
        Some(Value::Null) => "null",
        Some(Value::Bool(_)) => "boolean",
        Some(Value::Number(_)) => "number",
        Some(Value::String(_)) => "string",
        Some(Value::Array(_)) => "array",
        Some(Value::Object(_)) => "object",
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tutor_info() -> ResourceInfo {
        ResourceInfo::for_resource(ResourceName::Tutors)
            .with_field(FieldInfo::new("firstName", "First name", FieldKind::String))
            .with_field(FieldInfo::new(
                "status",
                "Status",
                FieldKind::Select(vec!["active".into(), "inactive".into()]),
            ))
    }

    #[test]
    fn reserved_fields_come_last() {
        let info = tutor_info();
        let names: Vec<&str> = info.fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["firstName", "status", "id", "date"]);
    }

    #[test]
    fn kinds_validate_values() {
        assert_eq!(FieldKind::Number.validate(Some(&json!(1.5))), FieldCheck::Valid);
        assert_eq!(
            FieldKind::NumberArray.validate(Some(&json!([1, "2"]))),
            FieldCheck::Invalid("expected a list of numbers".into())
        );
        assert_eq!(
            FieldKind::Id(ResourceName::Learners).validate(Some(&json!(4))),
            FieldCheck::CheckId(ResourceName::Learners)
        );
        assert_eq!(
            FieldKind::Json.validate(None),
            FieldCheck::Invalid("missing value".into())
        );
    }

    #[test]
    fn validate_record_reports_first_bad_field() {
        let info = tutor_info();
        let ok = Record::new(1, 0)
            .with_field("firstName", "Ada")
            .with_field("status", "active");
        assert!(info.validate_record(&ok).is_ok());

        let bad = ok.clone().with_field("status", "retired");
        let err = info.validate_record(&bad).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Validation failed: tutor status: expected one of: active, inactive"
        );
    }

    #[test]
    fn default_info_accepts_any_record() {
        let info = ResourceInfo::for_resource(ResourceName::Bookings);
        assert!(info.validate_record(&Record::new(-1, -1)).is_ok());
    }
}
