// ── Ask / AskFinished result envelopes ──
//
// `Ask<T>` is the three-state view of a remote operation; `AskFinished<T>`
// is the terminal outcome of a single RPC. Both keep "still loading",
// "failed" and "succeeded" distinguishable without unwinding.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use arc_api::ServerResponse;

use crate::error::CoreError;

/// Fallback for error envelopes that carry no usable message.
const UNKNOWN_ERROR: &str = "unknown error";

/// Tag of an [`Ask`], for summaries and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum AskStatus {
    Loading,
    Loaded,
    Error,
}

/// A pending, successful, or failed remote operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Ask<T> {
    Loading,
    Loaded(T),
    Error(String),
}

/// The settled outcome of one remote operation.
#[derive(Debug, Clone, PartialEq)]
pub enum AskFinished<T> {
    Loaded(T),
    Error(String),
}

fn non_empty(message: String) -> String {
    if message.trim().is_empty() {
        UNKNOWN_ERROR.to_owned()
    } else {
        message
    }
}

impl<T> AskFinished<T> {
    /// An `Error` outcome. Empty messages are replaced with `"unknown error"`.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error(non_empty(message.into()))
    }

    /// Parse a server envelope, decoding `val` into `T`.
    ///
    /// A payload that does not decode is reported as an `Error` outcome.
    pub fn from_response(resp: ServerResponse) -> Self
    where
        T: DeserializeOwned,
    {
        match resp.into_result() {
            Ok(val) => match serde_json::from_value(val) {
                Ok(decoded) => Self::Loaded(decoded),
                Err(e) => Self::error(format!("unexpected response payload: {e}")),
            },
            Err(message) => Self::error(message),
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// The error message, if this outcome failed.
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Error(message) => Some(message),
            Self::Loaded(_) => None,
        }
    }

    pub fn as_ref(&self) -> AskFinished<&T> {
        match self {
            Self::Loaded(val) => AskFinished::Loaded(val),
            Self::Error(message) => AskFinished::Error(message.clone()),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> AskFinished<U> {
        match self {
            Self::Loaded(val) => AskFinished::Loaded(f(val)),
            Self::Error(message) => AskFinished::Error(message),
        }
    }

    /// The payload, or `CoreError::Failed` carrying the message.
    pub fn unwrap_or_fail(self) -> Result<T, CoreError> {
        match self {
            Self::Loaded(val) => Ok(val),
            Self::Error(message) => Err(CoreError::Failed { message }),
        }
    }
}

impl<T> Ask<T> {
    pub fn status(&self) -> AskStatus {
        match self {
            Self::Loading => AskStatus::Loading,
            Self::Loaded(_) => AskStatus::Loaded,
            Self::Error(_) => AskStatus::Error,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Error(message) => Some(message),
            _ => None,
        }
    }

    pub fn as_ref(&self) -> Ask<&T> {
        match self {
            Self::Loading => Ask::Loading,
            Self::Loaded(val) => Ask::Loaded(val),
            Self::Error(message) => Ask::Error(message.clone()),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Ask<U> {
        match self {
            Self::Loading => Ask::Loading,
            Self::Loaded(val) => Ask::Loaded(f(val)),
            Self::Error(message) => Ask::Error(message),
        }
    }

    /// The payload if loaded; otherwise an error (`StillLoading` or `Failed`).
    pub fn unwrap_or_fail(self) -> Result<T, CoreError> {
        match self {
            Self::Loaded(val) => Ok(val),
            Self::Loading => Err(CoreError::StillLoading),
            Self::Error(message) => Err(CoreError::Failed { message }),
        }
    }
}

impl<T> From<AskFinished<T>> for Ask<T> {
    fn from(finished: AskFinished<T>) -> Self {
        match finished {
            AskFinished::Loaded(val) => Self::Loaded(val),
            AskFinished::Error(message) => Self::Error(message),
        }
    }
}

/// Return the payload of a loaded ask, or raise with its message.
pub fn unwrap_or_fail<T>(ask: impl Into<Ask<T>>) -> Result<T, CoreError> {
    ask.into().unwrap_or_fail()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    #[test]
    fn from_response_decodes_payload() {
        let ask: AskFinished<Vec<i64>> = AskFinished::from_response(ServerResponse::ok(json!([1, 2])));
        assert_eq!(ask, AskFinished::Loaded(vec![1, 2]));
    }

    #[test]
    fn from_response_reports_bad_payload_as_error() {
        let ask: AskFinished<Vec<i64>> =
            AskFinished::from_response(ServerResponse::ok(json!("nope")));
        assert!(ask.message().unwrap().starts_with("unexpected response payload"));
    }

    #[test]
    fn from_response_keeps_server_message() {
        let ask: AskFinished<Value> = AskFinished::from_response(ServerResponse::failure("boom"));
        assert_eq!(ask, AskFinished::Error("boom".into()));
    }

    #[test]
    fn error_messages_are_never_empty() {
        let ask: AskFinished<()> = AskFinished::error("");
        assert_eq!(ask.message(), Some("unknown error"));
    }

    #[test]
    fn unwrap_or_fail_distinguishes_loading_from_error() {
        assert_eq!(unwrap_or_fail(Ask::Loaded(3)).unwrap(), 3);
        assert!(matches!(
            unwrap_or_fail(Ask::<i32>::Loading),
            Err(CoreError::StillLoading)
        ));

        let err = unwrap_or_fail(AskFinished::<i32>::error("boom")).unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn status_renders_uppercase() {
        assert_eq!(Ask::<()>::Loading.status().to_string(), "LOADING");
        assert_eq!(Ask::Loaded(()).status().to_string(), "LOADED");
        assert_eq!(Ask::<()>::Error("x".into()).status().to_string(), "ERROR");
    }
}
