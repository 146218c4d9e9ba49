//! Registry-wide handlers: refresh, debug, check.

use std::collections::BTreeMap;

use tabled::Tabled;

use arc_core::{
    DataCheckReport, DataProblem, ProblemTag, ResourceName, ResourceRegistry, ResourceSummary,
    run_data_checker,
};

use crate::cli::{GlobalOpts, OutputFormat, RefreshArgs};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct SummaryRow {
    #[tabled(rename = "Resource")]
    resource: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Records")]
    records: String,
    #[tabled(rename = "Version")]
    version: u64,
    #[tabled(rename = "Message")]
    message: String,
}

fn summary_row(entry: &(ResourceName, ResourceSummary), color: bool) -> SummaryRow {
    let (name, summary) = entry;
    SummaryRow {
        resource: name.to_string(),
        status: output::status_colored(summary.status, color),
        records: summary.records.map(|n| n.to_string()).unwrap_or_default(),
        version: summary.version,
        message: summary.message.clone().unwrap_or_default(),
    }
}

#[derive(Tabled)]
struct ProblemRow {
    #[tabled(rename = "Resource")]
    resource: String,
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Field")]
    field: String,
    #[tabled(rename = "Problem")]
    problem: String,
    #[tabled(rename = "Value")]
    value: String,
}

fn problem_row(problem: &DataProblem, color: bool) -> ProblemRow {
    let mut row = ProblemRow {
        resource: String::new(),
        id: String::new(),
        field: String::new(),
        problem: output::problem_colored(&problem.text, color),
        value: String::new(),
    };
    for tag in &problem.tags {
        match tag {
            ProblemTag::Record { resource, id } => {
                row.resource = resource.to_string();
                row.id = id.to_string();
            }
            ProblemTag::Field { field, .. } => row.field.clone_from(field),
            ProblemTag::Value {
                value, value_type, ..
            } => row.value = format!("{value} ({value_type})"),
            ProblemTag::IdResource { id_resource, .. } => {
                row.problem = output::problem_colored(
                    &format!("{} (in {id_resource})", problem.text),
                    color,
                );
            }
        }
    }
    row
}

fn print_summaries(
    snapshot: &BTreeMap<ResourceName, ResourceSummary>,
    global: &GlobalOpts,
) {
    let color = output::should_color(&global.color);
    let items: Vec<_> = snapshot.iter().map(|(n, s)| (*n, s.clone())).collect();
    let out = output::render_list(
        &global.output,
        snapshot,
        &items,
        |entry| summary_row(entry, color),
        |(name, _)| name.to_string(),
    );
    output::print_output(&out, global.quiet);
}

// ── Handlers ────────────────────────────────────────────────────────

pub async fn refresh(
    registry: &ResourceRegistry,
    args: RefreshArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let snapshot = match args.resource {
        Some(ref name) => {
            let resource = util::resource(registry, name)?;
            resource.state().force_refresh().await;
            resource.state().get_record_collection_or_fail()?;
            let mut all = registry.debug_snapshot();
            all.retain(|n, _| *n == resource.name());
            all
        }
        None => {
            registry.force_refresh_all_resources().await;
            registry.debug_snapshot()
        }
    };
    print_summaries(&snapshot, global);
    Ok(())
}

pub async fn debug(registry: &ResourceRegistry, global: &GlobalOpts) -> Result<(), CliError> {
    registry.initialize_resources().await;
    print_summaries(&registry.debug_snapshot(), global);
    Ok(())
}

pub async fn check(registry: &ResourceRegistry, global: &GlobalOpts) -> Result<(), CliError> {
    registry.initialize_resources().await;
    let report: DataCheckReport = run_data_checker(registry)?;

    let color = output::should_color(&global.color);
    let out = output::render_list(
        &global.output,
        &report,
        &report.problems,
        |p| problem_row(p, color),
        |p| p.text.clone(),
    );
    // Structured formats always carry the report; tables only when non-empty.
    let structured = !matches!(global.output, OutputFormat::Table | OutputFormat::Plain);
    if structured || !report.problems.is_empty() {
        output::print_output(&out, global.quiet);
    }
    if !global.quiet {
        eprintln!(
            "{} valid field(s), {} problem(s)",
            report.valid_fields,
            report.problems.len()
        );
    }

    if report.problems.is_empty() {
        Ok(())
    } else {
        Err(CliError::CheckFailed {
            count: report.problems.len(),
        })
    }
}
