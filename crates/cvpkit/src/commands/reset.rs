//! `--action reset`: delete objects from the controller.

use std::io::IsTerminal;

use tracing::info;

use cvpkit_core::{CvpController, ResetOptions, reset};

use crate::cli::OutputFormat;
use crate::commands::Plan;
use crate::error::CliError;
use crate::output;

/// Ask before wiping anything; `--yes` is mandatory without a terminal.
pub fn confirm(plan: &Plan, host: &str, yes_flag: bool) -> Result<(), CliError> {
    if yes_flag {
        return Ok(());
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: "reset".into(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(format!("Delete all {} from {host}?", plan.object_list()))
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    if confirmed {
        Ok(())
    } else {
        Err(CliError::Aborted)
    }
}

pub async fn handle(
    plan: &Plan,
    controller: &CvpController,
    format: OutputFormat,
    color: bool,
) -> Result<String, CliError> {
    info!(objects = %plan.object_list(), "removing objects");
    let options = ResetOptions {
        types: plan.types.clone(),
        skip_version_check: plan.skip_version_check,
    };
    let report = reset(controller, &options).await?;
    output::render_reset(format, &report, color)
}
