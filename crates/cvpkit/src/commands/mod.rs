//! Action handlers.
//!
//! Arguments are validated into a [`Plan`] before any connection is made, so
//! usage mistakes fail fast with exit code 2.

pub mod backup;
pub mod reset;
pub mod restore;

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use cvpkit_core::{CvpController, EntityType};

use crate::cli::{Action, ActionArgs, GlobalOpts, ObjectType};
use crate::error::CliError;
use crate::output;

/// A validated action request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub action: Action,
    pub types: Vec<EntityType>,
    /// Lowercased configlet names.
    pub name_filter: Option<Vec<String>>,
    pub tar_file: Option<PathBuf>,
    pub skip_version_check: bool,
}

impl Plan {
    pub fn tar_file(&self) -> Result<&Path, CliError> {
        self.tar_file
            .as_deref()
            .ok_or_else(|| CliError::usage("tarFile", "required for backup and restore"))
    }

    pub fn object_list(&self) -> String {
        self.types
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn entity_type(object: ObjectType) -> EntityType {
    match object {
        ObjectType::Configlets => EntityType::Configlets,
        ObjectType::Containers => EntityType::Containers,
        ObjectType::Devices => EntityType::Devices,
        ObjectType::Images => EntityType::Images,
        ObjectType::Imagebundles => EntityType::ImageBundles,
        ObjectType::Roles => EntityType::Roles,
    }
}

/// Check the argument combination and settle the object list.
pub fn plan(args: &ActionArgs) -> Result<Plan, CliError> {
    let mut types: Vec<EntityType> = if args.objects.is_empty() {
        EntityType::inventory()
    } else {
        let mut types = Vec::new();
        for t in args.objects.iter().copied().map(entity_type) {
            if !types.contains(&t) {
                types.push(t);
            }
        }
        types
    };

    if matches!(args.action, Action::Backup | Action::Restore) && args.tar_file.is_none() {
        return Err(CliError::usage(
            "tarFile",
            format!("--tarFile is required for {}", action_name(args.action)),
        ));
    }

    let name_filter = if args.obj_names.is_empty() {
        None
    } else {
        if types != [EntityType::Configlets] {
            return Err(CliError::usage(
                "objNames",
                "only configlets can be specified along with --objNames",
            ));
        }
        Some(args.obj_names.iter().map(|n| n.to_lowercase()).collect())
    };

    if args.tasks == Some(true) {
        if args.action != Action::Restore {
            return Err(CliError::usage("tasks", "--tasks only applies to restore"));
        }
        types.push(EntityType::Tasks);
    }

    Ok(Plan {
        action: args.action,
        types,
        name_filter,
        tar_file: args.tar_file.clone(),
        skip_version_check: args.skip_version_check,
    })
}

fn action_name(action: Action) -> &'static str {
    match action {
        Action::Backup => "backup",
        Action::Restore => "restore",
        Action::Reset => "reset",
    }
}

/// Run a validated plan against a connected controller.
pub async fn dispatch(
    plan: &Plan,
    controller: &CvpController,
    host: &str,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let spinner = spinner(plan, host, global.verbose);
    let rendered = match plan.action {
        Action::Backup => backup::handle(plan, controller, host, global.output).await,
        Action::Restore => {
            let color = output::should_color(global.color);
            restore::handle(plan, controller, global.output, color).await
        }
        Action::Reset => {
            let color = output::should_color(global.color);
            reset::handle(plan, controller, global.output, color).await
        }
    };
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    output::print_output(&rendered?);
    Ok(())
}

/// Progress spinner on an interactive stderr; log lines take over with `-v`.
fn spinner(plan: &Plan, host: &str, verbose: u8) -> Option<ProgressBar> {
    if verbose > 0 || !std::io::stderr().is_terminal() {
        return None;
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::with_template("{spinner} {msg} [{elapsed}]").ok()?);
    pb.set_message(format!("{} {host}: {}", action_name(plan.action), plan.object_list()));
    pb.enable_steady_tick(Duration::from_millis(120));
    Some(pb)
}
