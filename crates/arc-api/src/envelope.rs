// Wire envelope shared by every RPC.
//
// The script endpoint answers `{ error, val, message }`, either as a JSON
// object or as a JSON string holding that object (the script runtime
// stringifies return values on some deployment paths).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, preview};

/// Outcome of one remote call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerResponse {
    pub error: bool,
    #[serde(default)]
    pub val: Value,
    #[serde(default)]
    pub message: Option<String>,
}

impl ServerResponse {
    /// A successful envelope carrying `val`.
    pub fn ok(val: Value) -> Self {
        Self {
            error: false,
            val,
            message: None,
        }
    }

    /// A failed envelope carrying `message`.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            error: true,
            val: Value::Null,
            message: Some(message.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error
    }

    /// Parse a raw response body.
    ///
    /// Accepts the envelope as an object or as a string that itself
    /// contains the JSON object. Anything else is a deserialization error.
    pub fn parse(body: &str) -> Result<Self, Error> {
        let value: Value = serde_json::from_str(body).map_err(|e| Error::Deserialization {
            message: format!("{e} (body preview: {:?})", preview(body)),
            body: body.to_owned(),
        })?;

        match value {
            Value::String(inner) => {
                let unwrapped: Value =
                    serde_json::from_str(&inner).map_err(|e| Error::Deserialization {
                        message: format!("string-encoded response is not JSON: {e}"),
                        body: body.to_owned(),
                    })?;
                Self::from_value(unwrapped, body)
            }
            other => Self::from_value(other, body),
        }
    }

    fn from_value(value: Value, body: &str) -> Result<Self, Error> {
        if !value.is_object() {
            return Err(Error::Deserialization {
                message: format!("response is not an object (body preview: {:?})", preview(body)),
                body: body.to_owned(),
            });
        }
        serde_json::from_value(value).map_err(|e| Error::Deserialization {
            message: format!("malformed envelope: {e}"),
            body: body.to_owned(),
        })
    }

    /// Split into the payload or the error message.
    ///
    /// An error envelope without a usable message yields `"unknown error"`
    /// so callers never see an empty message.
    pub fn into_result(self) -> Result<Value, String> {
        if self.error {
            Err(self
                .message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| "unknown error".to_owned()))
        } else {
            Ok(self.val)
        }
    }
}
