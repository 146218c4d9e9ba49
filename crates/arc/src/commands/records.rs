//! Record command handlers: list, get, create, update, delete, label.

use chrono::DateTime;
use tabled::Tabled;

use arc_core::{Marker, Record, ResourceRegistry};

use crate::cli::{CreateArgs, GlobalOpts, LabelArgs, RecordArgs, ResourceArgs, UpdateArgs};
use crate::error::CliError;
use crate::output;

use super::util;

/// Longest field summary shown in the list table.
const SUMMARY_WIDTH: usize = 60;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct RecordRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Created")]
    created: String,
    #[tabled(rename = "Fields")]
    fields: String,
}

fn record_row(record: &Record) -> RecordRow {
    let mut fields = record
        .fields
        .keys()
        .map(|name| format!("{name}={}", record.text(name)))
        .collect::<Vec<_>>()
        .join(", ");
    if fields.chars().count() > SUMMARY_WIDTH {
        fields = fields.chars().take(SUMMARY_WIDTH - 1).collect();
        fields.push('…');
    }
    RecordRow {
        id: record.id,
        created: format_date(record.date),
        fields,
    }
}

#[derive(Tabled)]
struct MarkerRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Label")]
    label: String,
}

fn format_date(millis: i64) -> String {
    DateTime::from_timestamp_millis(millis)
        .map_or_else(|| millis.to_string(), |d| d.format("%Y-%m-%d %H:%M").to_string())
}

fn detail(record: &Record) -> String {
    let width = record
        .fields
        .keys()
        .map(String::len)
        .max()
        .unwrap_or(0)
        .max("date".len());
    let mut lines = vec![
        format!("{:<width$}  {}", "id", record.id),
        format!("{:<width$}  {}", "date", format_date(record.date)),
    ];
    lines.extend(
        record
            .fields
            .keys()
            .map(|name| format!("{name:<width$}  {}", record.text(name))),
    );
    lines.join("\n")
}

fn print_record(record: &Record, global: &GlobalOpts) {
    let out = output::render_single(&global.output, record, detail, |r| r.id.to_string());
    output::print_output(&out, global.quiet);
}

// ── Handlers ────────────────────────────────────────────────────────

pub async fn list(
    registry: &ResourceRegistry,
    args: ResourceArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let resource = util::resource(registry, &args.resource)?;
    let records = util::load(resource).await?;
    let items: Vec<Record> = records.iter().cloned().collect();

    let out = output::render_list(&global.output, &*records, &items, record_row, |r| {
        r.id.to_string()
    });
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn get(
    registry: &ResourceRegistry,
    args: RecordArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let resource = util::resource(registry, &args.resource)?;
    util::load(resource).await?;
    let record = resource.get_record_or_fail(args.id)?;
    print_record(&record, global);
    Ok(())
}

pub async fn create(
    registry: &ResourceRegistry,
    args: CreateArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let resource = util::resource(registry, &args.resource)?;
    let fields = util::parse_payload(&args.payload)?;
    util::load(resource).await?;

    let draft = resource.draft_record(fields);
    resource.validate(&draft)?;
    let created = util::finish(resource.create_record(draft).await, registry.rpc())?;

    if !global.quiet {
        eprintln!("Created {} #{}", resource.info().title, created.id);
    }
    print_record(&created, global);
    Ok(())
}

pub async fn update(
    registry: &ResourceRegistry,
    args: UpdateArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let resource = util::resource(registry, &args.resource)?;
    let fields = util::parse_payload(&args.payload)?;
    util::load(resource).await?;

    let mut record = resource.get_record_or_fail(args.id)?;
    for (name, value) in fields {
        record.set(name, value);
    }
    if record.id != args.id {
        return Err(CliError::Validation {
            field: "id".into(),
            reason: format!("cannot change the id of #{} to #{}", args.id, record.id),
        });
    }
    resource.validate(&record)?;
    util::finish(resource.update_record(record).await, registry.rpc())?;

    if !global.quiet {
        eprintln!("Updated {} #{}", resource.info().title, args.id);
    }
    print_record(&resource.get_record_or_fail(args.id)?, global);
    Ok(())
}

pub async fn delete(
    registry: &ResourceRegistry,
    args: RecordArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let resource = util::resource(registry, &args.resource)?;
    util::load(resource).await?;
    resource.get_record_or_fail(args.id)?;

    let prompt = format!("Delete {} #{}?", resource.info().title, args.id);
    if !util::confirm(&prompt, global.yes)? {
        eprintln!("Aborted");
        return Ok(());
    }
    util::finish(resource.delete_record(args.id).await, registry.rpc())?;

    if !global.quiet {
        eprintln!("Deleted {} #{}", resource.info().title, args.id);
    }
    Ok(())
}

pub async fn label(
    registry: &ResourceRegistry,
    args: LabelArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let resource = util::resource(registry, &args.resource)?;
    util::load(resource).await?;

    let title = resource.info().title.clone();
    let markers: Vec<Marker> = args
        .ids
        .iter()
        .map(|&id| {
            resource.create_marker(id, |record| {
                if args.fields.is_empty() {
                    format!("{title} #{}", record.id)
                } else {
                    args.fields
                        .iter()
                        .map(|f| record.text(f))
                        .collect::<Vec<_>>()
                        .join(" ")
                }
            })
        })
        .collect();

    let out = output::render_list(
        &global.output,
        &markers,
        &markers,
        |m| MarkerRow {
            id: m.id,
            label: m.label.clone(),
        },
        |m| m.label.clone(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
