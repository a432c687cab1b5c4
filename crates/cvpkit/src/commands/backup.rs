//! `--action backup`: capture the controller into a tar archive.

use tracing::info;

use cvpkit_core::archive::write_archive;
use cvpkit_core::{CaptureOptions, CvpController, EntityType, capture_snapshot};

use crate::cli::OutputFormat;
use crate::commands::Plan;
use crate::error::CliError;
use crate::output::{self, BackupSummary};

pub async fn handle(
    plan: &Plan,
    controller: &CvpController,
    host: &str,
    format: OutputFormat,
) -> Result<String, CliError> {
    let tar_file = plan.tar_file()?;
    info!(objects = %plan.object_list(), "backing up");

    let options = CaptureOptions {
        types: plan.types.clone(),
        name_filter: plan.name_filter.clone(),
        skip_version_check: plan.skip_version_check,
    };
    let capture = capture_snapshot(controller, &options, controller.staging_dir()).await?;
    write_archive(tar_file, &capture.document, host, controller.staging_dir())?;

    let counts = EntityType::inventory()
        .into_iter()
        .filter_map(|t| Some((t.to_string(), capture.document.names_of(t)?.len())))
        .collect();
    let summary = BackupSummary {
        archive: tar_file.display().to_string(),
        captured_at: chrono::Utc::now().to_rfc3339(),
        format_version: capture.document.version.clone(),
        counts,
        warnings: capture.warnings,
    };
    output::render_backup(format, &summary)
}
