// ── Server push notifications ──
//
// The server announces changes made by other clients as
// `[operation, resourceName, record | id]`. The push channel itself lives
// outside this crate; this module parses messages and applies them to the
// matching resource cache.

use serde_json::Value;
use strum::{AsRefStr, Display, EnumString};
use tracing::debug;

use crate::error::CoreError;
use crate::model::{Record, ResourceName};
use crate::registry::ResourceRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum NotificationOp {
    Create,
    Update,
    Delete,
}

/// A parsed change notification.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    Create { resource: ResourceName, record: Record },
    Update { resource: ResourceName, record: Record },
    Delete { resource: ResourceName, id: i64 },
}

fn invalid(reason: impl Into<String>) -> CoreError {
    CoreError::InvalidNotification {
        reason: reason.into(),
    }
}

impl Notification {
    pub fn op(&self) -> NotificationOp {
        match self {
            Self::Create { .. } => NotificationOp::Create,
            Self::Update { .. } => NotificationOp::Update,
            Self::Delete { .. } => NotificationOp::Delete,
        }
    }

    pub fn resource(&self) -> ResourceName {
        match self {
            Self::Create { resource, .. }
            | Self::Update { resource, .. }
            | Self::Delete { resource, .. } => *resource,
        }
    }

    /// Parse the `[operation, resourceName, payload]` wire form.
    pub fn from_value(value: &Value) -> Result<Self, CoreError> {
        let parts = value.as_array().map(Vec::as_slice).unwrap_or_default();
        let [op, resource, payload] = parts else {
            return Err(invalid("expected [operation, resource, payload]"));
        };

        let op: NotificationOp = op
            .as_str()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| invalid(format!("unknown operation: {op}")))?;
        let resource: ResourceName = resource
            .as_str()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| invalid(format!("unknown resource: {resource}")))?;

        let notification = match op {
            NotificationOp::Create | NotificationOp::Update => {
                let record = Record::try_from(payload.clone())
                    .map_err(|e| invalid(format!("bad record: {e}")))?;
                if op == NotificationOp::Create {
                    Self::Create { resource, record }
                } else {
                    Self::Update { resource, record }
                }
            }
            NotificationOp::Delete => {
                let id = payload
                    .as_i64()
                    .ok_or_else(|| invalid(format!("expected an integer id, got {payload}")))?;
                Self::Delete { resource, id }
            }
        };
        Ok(notification)
    }

    /// Parse the JSON text of a notification.
    pub fn parse(text: &str) -> Result<Self, CoreError> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| invalid(format!("not JSON: {e}")))?;
        Self::from_value(&value)
    }
}

impl ResourceRegistry {
    /// Apply a notification to its resource cache. Returns whether the cache changed.
    pub fn relay(&self, notification: Notification) -> bool {
        let resource = self.get(notification.resource());
        let op = notification.op();
        let changed = match notification {
            Notification::Create { record, .. } => {
                resource.state().on_server_notification_create(record)
            }
            Notification::Update { record, .. } => {
                resource.state().on_server_notification_update(record)
            }
            Notification::Delete { id, .. } => resource.state().on_server_notification_delete(id),
        };
        debug!(resource = %resource.name(), op = %op, changed, "notification relayed");
        changed
    }

    /// Parse and apply a raw notification.
    pub fn relay_value(&self, value: &Value) -> Result<bool, CoreError> {
        Ok(self.relay(Notification::from_value(value)?))
    }
}
