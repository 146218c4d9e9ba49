//! Reserved server command handlers.

use serde_json::Value;

use arc_core::{AskFinished, ResourceRegistry};

use crate::cli::{GlobalOpts, ServerArgs, ServerCommand};
use crate::error::CliError;
use crate::output;

use super::util;

fn detail(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    }
}

fn print_value(value: &Value, global: &GlobalOpts) {
    let out = output::render_single(&global.output, value, detail, detail);
    output::print_output(&out, global.quiet);
}

pub async fn handle(
    registry: &ResourceRegistry,
    args: ServerArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let rpc = registry.rpc();
    match args.command {
        ServerCommand::RefreshSubmissions => {
            let resp = rpc.refresh_request_submissions_with_form().await;
            util::finish(AskFinished::<Value>::from_response(resp), rpc)?;

            // The import rewrites the sheet; reload what this client sees.
            let submissions = registry.request_submissions();
            submissions.state().force_refresh().await;
            let count = submissions.state().get_record_collection_or_fail()?.len();
            if !global.quiet {
                eprintln!("Request submissions refreshed ({count} records)");
            }
            Ok(())
        }

        ServerCommand::Debug => {
            let value = util::finish(AskFinished::<Value>::from_response(rpc.debug().await), rpc)?;
            print_value(&value, global);
            Ok(())
        }

        ServerCommand::Command { name } => {
            let resp = rpc.command(&name).await;
            let value = util::finish(AskFinished::<Value>::from_response(resp), rpc)?;
            print_value(&value, global);
            Ok(())
        }
    }
}
