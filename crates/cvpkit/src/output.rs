//! Output formatting: table, JSON, YAML.
//!
//! Renders operation reports in the format selected by `--output`. Table uses
//! `tabled`, structured formats serialize the report itself.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use serde::Serialize;
use tabled::{Table, Tabled, settings::Style};

use cvpkit_core::{DeviceAddReport, EntityRef, ResetReport, RestoreReport};

use crate::cli::{ColorMode, OutputFormat};
use crate::error::CliError;

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

/// Outcome label, colored by severity when enabled.
fn paint(label: &str, color: bool) -> String {
    if !color {
        return label.to_owned();
    }
    match label {
        "created" | "connected" => label.green().to_string(),
        "updated" | "unauthorized" => label.yellow().to_string(),
        "skipped" | "unreachable" | "deleted" => label.red().to_string(),
        _ => label.dimmed().to_string(),
    }
}

// ── Rows ─────────────────────────────────────────────────────────────

#[derive(Tabled)]
struct EntityRow {
    #[tabled(rename = "Result")]
    result: String,
    #[tabled(rename = "Type")]
    entity_type: String,
    #[tabled(rename = "Name")]
    name: String,
}

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "Device")]
    ip: String,
    #[tabled(rename = "FQDN")]
    fqdn: String,
    #[tabled(rename = "Outcome")]
    outcome: String,
}

#[derive(Tabled)]
struct CountRow {
    #[tabled(rename = "Type")]
    entity_type: String,
    #[tabled(rename = "Captured")]
    count: usize,
}

/// What a backup wrote.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupSummary {
    pub archive: String,
    /// RFC 3339 capture time.
    pub captured_at: String,
    pub format_version: String,
    pub counts: Vec<(String, usize)>,
    pub warnings: Vec<String>,
}

// ── Render dispatchers ───────────────────────────────────────────────

pub fn render_backup(format: OutputFormat, summary: &BackupSummary) -> Result<String, CliError> {
    match format {
        OutputFormat::Table => {
            let rows: Vec<CountRow> = summary
                .counts
                .iter()
                .map(|(entity_type, count)| CountRow {
                    entity_type: entity_type.clone(),
                    count: *count,
                })
                .collect();
            Ok(format!(
                "{}\nWrote {} (format {}, captured {})",
                render_table(&rows),
                summary.archive,
                summary.format_version,
                summary.captured_at
            ))
        }
        other => render_structured(other, summary),
    }
}

pub fn render_restore(
    format: OutputFormat,
    report: &RestoreReport,
    color: bool,
) -> Result<String, CliError> {
    match format {
        OutputFormat::Table => {
            let mut rows = Vec::new();
            push_entities(&mut rows, "created", &report.created, color);
            push_entities(&mut rows, "updated", &report.updated, color);
            push_entities(&mut rows, "unchanged", &report.unchanged, color);
            push_entities(&mut rows, "skipped", &report.skipped, color);

            let mut out = if rows.is_empty() {
                "Nothing restored".to_owned()
            } else {
                render_table(&rows)
            };
            let devices = device_rows(&report.devices, color);
            if !devices.is_empty() {
                out.push('\n');
                out.push_str(&render_table(&devices));
            }
            if !report.tasks.is_empty() {
                let ids: Vec<String> = report.tasks.iter().map(ToString::to_string).collect();
                out.push_str(&format!("\nExecuted tasks: {}", ids.join(", ")));
            }
            if !report.warnings.is_empty() {
                out.push_str(&format!("\n{} warning(s)", report.warnings.len()));
            }
            Ok(out)
        }
        other => render_structured(other, report),
    }
}

pub fn render_reset(
    format: OutputFormat,
    report: &ResetReport,
    color: bool,
) -> Result<String, CliError> {
    match format {
        OutputFormat::Table => {
            let mut rows = Vec::new();
            push_entities(&mut rows, "deleted", &report.deleted, color);
            let mut out = if rows.is_empty() {
                "Nothing deleted".to_owned()
            } else {
                render_table(&rows)
            };
            if let Some(old) = &report.renamed_root {
                out.push_str(&format!("\nRoot container {old} renamed to Tenant"));
            }
            Ok(out)
        }
        other => render_structured(other, report),
    }
}

/// Print the rendered output to stdout.
pub fn print_output(output: &str) {
    if output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Helpers ──────────────────────────────────────────────────────────

fn push_entities(rows: &mut Vec<EntityRow>, result: &str, entities: &[EntityRef], color: bool) {
    let label = paint(result, color);
    rows.extend(entities.iter().map(|e| EntityRow {
        result: label.clone(),
        entity_type: e.entity_type.to_string(),
        name: e.name.clone(),
    }));
}

fn device_rows(report: &DeviceAddReport, color: bool) -> Vec<DeviceRow> {
    let groups = [
        ("connected", &report.connected),
        ("unauthorized", &report.unauthorized),
        ("unreachable", &report.unreachable),
    ];
    groups
        .into_iter()
        .flat_map(|(outcome, devices)| {
            let label = paint(outcome, color);
            devices.iter().map(move |d| DeviceRow {
                ip: d.ip_address.clone(),
                fqdn: d.fqdn.clone(),
                outcome: label.clone(),
            })
        })
        .collect()
}

fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

fn render_structured<T: Serialize + ?Sized>(
    format: OutputFormat,
    data: &T,
) -> Result<String, CliError> {
    let rendered = match format {
        OutputFormat::Yaml => serde_yaml::to_string(data).map_err(|e| e.to_string()),
        _ => serde_json::to_string_pretty(data).map_err(|e| e.to_string()),
    };
    rendered.map_err(|message| CliError::Operation { message })
}
