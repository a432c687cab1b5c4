//! `--action restore`: replay an archive onto the controller.

use tracing::info;

use cvpkit_core::archive::read_archive;
use cvpkit_core::{CvpController, RestoreOptions, TranslateOptions, normalize, restore};

use crate::cli::OutputFormat;
use crate::commands::Plan;
use crate::error::CliError;
use crate::output;

pub async fn handle(
    plan: &Plan,
    controller: &CvpController,
    format: OutputFormat,
    color: bool,
) -> Result<String, CliError> {
    let tar_file = plan.tar_file()?;
    info!(objects = %plan.object_list(), archive = %tar_file.display(), "restoring");

    let raw = read_archive(tar_file, controller.staging_dir())?;
    let document = normalize(
        raw,
        TranslateOptions {
            skip_version_check: plan.skip_version_check,
        },
    )?;

    let options = RestoreOptions {
        types: plan.types.clone(),
        name_filter: plan.name_filter.clone(),
        skip_version_check: plan.skip_version_check,
        task_policy: controller.task_policy(),
    };
    let report = restore(controller, &document, &options).await?;
    output::render_restore(format, &report, color)
}
