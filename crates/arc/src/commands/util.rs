//! Shared helpers for command handlers.

use std::io::IsTerminal;
use std::path::Path;
use std::sync::Arc;

use serde_json::{Map, Value};

use arc_api::RpcClient;
use arc_core::{AskFinished, RecordCollection, Resource, ResourceRegistry};

use crate::cli::PayloadArgs;
use crate::error::CliError;

/// Resolve a resource by its wire name (`tutors`, `requestSubmissions`, ...).
pub fn resource<'a>(registry: &'a ResourceRegistry, name: &str) -> Result<&'a Resource, CliError> {
    Ok(registry.by_name(name)?)
}

/// Load `resource` if needed and return its collection.
pub async fn load(resource: &Resource) -> Result<Arc<RecordCollection>, CliError> {
    resource.state().initialize().await;
    Ok(resource.state().get_record_collection_or_fail()?)
}

/// Timeout of `rpc` in whole milliseconds, for error reports.
pub fn timeout_ms(rpc: &RpcClient) -> u64 {
    u64::try_from(rpc.timeout().as_millis()).unwrap_or(u64::MAX)
}

/// Turn a settled server outcome into a CLI result.
pub fn finish<T>(outcome: AskFinished<T>, rpc: &RpcClient) -> Result<T, CliError> {
    match outcome {
        AskFinished::Loaded(value) => Ok(value),
        AskFinished::Error(message) => Err(CliError::from_server_message(message, timeout_ms(rpc))),
    }
}

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: message.into(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}

/// Read and parse a JSON file for `--from-file` flags.
pub fn read_json_file(path: &Path) -> Result<Value, CliError> {
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents).map_err(|e| CliError::Validation {
        field: "from-file".into(),
        reason: format!("invalid JSON: {e}"),
    })
}

/// The JSON object of record fields given by `--data` or `--from-file`.
pub fn parse_payload(args: &PayloadArgs) -> Result<Map<String, Value>, CliError> {
    let value = match (&args.data, &args.from_file) {
        (Some(text), _) => serde_json::from_str(text).map_err(|e| CliError::Validation {
            field: "data".into(),
            reason: format!("invalid JSON: {e}"),
        })?,
        (None, Some(path)) => read_json_file(path)?,
        (None, None) => Value::Object(Map::new()),
    };
    match value {
        Value::Object(map) => Ok(map),
        other => Err(CliError::Validation {
            field: "data".into(),
            reason: format!("expected a JSON object of fields, got {other}"),
        }),
    }
}
