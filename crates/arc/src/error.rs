//! CLI error types with miette diagnostics.
//!
//! Maps core, config and transport errors into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use arc_config::ConfigError;
use arc_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const DATA_PROBLEMS: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Server ───────────────────────────────────────────────────────
    #[error("{resource} could not be loaded: {message}")]
    #[diagnostic(
        code(arc::resource_unavailable),
        help(
            "The last load of this resource failed.\n\
             Try: arc refresh {resource}"
        )
    )]
    ResourceUnavailable { resource: String, message: String },

    #[error("Server error: {message}")]
    #[diagnostic(code(arc::server))]
    Server { message: String },

    #[error("Server did not answer within {timeout_ms}ms")]
    #[diagnostic(
        code(arc::timeout),
        help("Increase the limit with --timeout-ms or check the script deployment.")
    )]
    Timeout { timeout_ms: u64 },

    #[error("Could not reach the server: {message}")]
    #[diagnostic(code(arc::connection_failed), help("Check the endpoint URL and your network."))]
    Connection { message: String },

    // ── Records ──────────────────────────────────────────────────────
    #[error("record not available: {resource}/#{id}")]
    #[diagnostic(
        code(arc::not_found),
        help("Run: arc list {resource} to see available records")
    )]
    NotFound { resource: String, id: i64 },

    #[error("Unknown resource: {name}")]
    #[diagnostic(
        code(arc::unknown_resource),
        help("Valid resources: {valid}")
    )]
    UnknownResource { name: String, valid: String },

    #[error("Notification rejected: {reason}")]
    #[diagnostic(
        code(arc::notification),
        help("Expected [\"create\"|\"update\"|\"delete\", resource, record | id]")
    )]
    InvalidNotification { reason: String },

    #[error("Data check found {count} problem(s)")]
    #[diagnostic(code(arc::check_failed))]
    CheckFailed { count: usize },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(arc::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(arc::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: arc config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No server configured")]
    #[diagnostic(
        code(arc::no_config),
        help(
            "Create a profile with: arc config init\n\
             Or pass --url <script-url> (ARC_URL), or --mock for an in-memory server.\n\
             Expected config at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(arc::config))]
    Config(ConfigError),

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(arc::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON payload: {0}")]
    #[diagnostic(code(arc::json), help("Check the JSON contents and try again."))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Connection { .. } | Self::ResourceUnavailable { .. } => exit_code::CONNECTION,
            Self::UnknownResource { .. }
            | Self::Validation { .. }
            | Self::InvalidNotification { .. }
            | Self::NonInteractiveRequiresYes { .. }
            | Self::Json(_) => exit_code::USAGE,
            Self::CheckFailed { .. } => exit_code::DATA_PROBLEMS,
            _ => exit_code::GENERAL,
        }
    }

    /// Classify the message of a failed server round trip.
    pub fn from_server_message(message: String, timeout_ms: u64) -> Self {
        if message == arc_api::rpc::NOT_RESPONDING {
            Self::Timeout { timeout_ms }
        } else {
            Self::Server { message }
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

fn resource_list() -> String {
    use strum::IntoEnumIterator;
    arc_core::ResourceName::iter()
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::RecordNotAvailable { resource, id } => Self::NotFound {
                resource: resource.to_string(),
                id,
            },
            CoreError::ResourceFailed { resource, message } => Self::ResourceUnavailable {
                resource: resource.to_string(),
                message,
            },
            CoreError::NotLoaded { resource } => Self::ResourceUnavailable {
                resource: resource.to_string(),
                message: "not loaded".into(),
            },
            CoreError::UnknownResource { name } => Self::UnknownResource {
                name,
                valid: resource_list(),
            },
            CoreError::InvalidNotification { reason } => Self::InvalidNotification { reason },
            CoreError::ValidationFailed { message } | CoreError::InvalidRecord { message } => {
                Self::Validation {
                    field: "record".into(),
                    reason: message,
                }
            }
            CoreError::Api(e) => e.into(),
            CoreError::Failed { message } => Self::Server { message },
            CoreError::StillLoading => Self::Server {
                message: "operation is still loading".into(),
            },
        }
    }
}

impl From<arc_api::Error> for CliError {
    fn from(err: arc_api::Error) -> Self {
        match err {
            arc_api::Error::Timeout { timeout_ms } => Self::Timeout { timeout_ms },
            arc_api::Error::Transport(e) => Self::Connection {
                message: e.to_string(),
            },
            arc_api::Error::InvalidUrl(e) => Self::Validation {
                field: "url".into(),
                reason: e.to_string(),
            },
            other => Self::Server {
                message: other.to_string(),
            },
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            other => Self::Config(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arc_core::ResourceName;

    #[test]
    fn not_found_keeps_core_message_and_exit_code() {
        let err = CliError::from(CoreError::RecordNotAvailable {
            resource: ResourceName::Tutors,
            id: 7,
        });
        assert_eq!(err.to_string(), "record not available: tutors/#7");
        assert_eq!(err.exit_code(), exit_code::NOT_FOUND);
    }

    #[test]
    fn timeout_message_is_classified() {
        let err = CliError::from_server_message(arc_api::rpc::NOT_RESPONDING.into(), 5000);
        assert_eq!(err.exit_code(), exit_code::TIMEOUT);

        let err = CliError::from_server_message("sheet locked".into(), 5000);
        assert_eq!(err.to_string(), "Server error: sheet locked");
        assert_eq!(err.exit_code(), exit_code::GENERAL);
    }

    #[test]
    fn unknown_resource_lists_valid_names() {
        let err = CliError::from(CoreError::UnknownResource {
            name: "widgets".into(),
        });
        assert_eq!(err.exit_code(), exit_code::USAGE);
        match err {
            CliError::UnknownResource { valid, .. } => {
                assert!(valid.starts_with("tutors, learners"));
                assert!(valid.ends_with("requestSubmissions"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
