//! Apply a server change notification to the local cache.

use serde::Serialize;

use arc_core::{Notification, NotificationOp, ResourceName, ResourceRegistry};

use crate::cli::{GlobalOpts, NotifyArgs};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Debug, Serialize)]
struct NotifyOutcome {
    resource: ResourceName,
    op: String,
    changed: bool,
    records: usize,
}

fn detail(outcome: &NotifyOutcome) -> String {
    let verdict = if outcome.changed { "applied" } else { "no change" };
    format!(
        "{}: {} {verdict} ({} records)",
        outcome.resource, outcome.op, outcome.records
    )
}

pub async fn handle(
    registry: &ResourceRegistry,
    args: NotifyArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let notification = Notification::parse(&args.message)?;
    let op: NotificationOp = notification.op();
    let resource = registry.get(notification.resource());
    util::load(resource).await?;

    let changed = registry.relay(notification);
    let outcome = NotifyOutcome {
        resource: resource.name(),
        op: op.to_string(),
        changed,
        records: resource.state().get_record_collection_or_fail()?.len(),
    };

    let out = output::render_single(&global.output, &outcome, detail, |o| o.changed.to_string());
    output::print_output(&out, global.quiet);
    Ok(())
}
