mod cli;
mod commands;
mod config;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cvpkit_core::CvpController;

use crate::cli::{Action, Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    if let Some(Command::Completions(args)) = cli.command {
        use clap::CommandFactory;
        use clap_complete::generate;

        let mut cmd = Cli::command();
        generate(args.shell, &mut cmd, "cvptool", &mut std::io::stdout());
        return Ok(());
    }

    // Usage errors surface before any prompt or connection.
    let plan = commands::plan(&cli.action)?;
    let cfg = config::load_config_or_default();
    let resolved = config::resolve(&cli.global, &cfg)?;
    if plan.action == Action::Reset {
        commands::reset::confirm(&plan, &resolved.host, cli.global.yes)?;
    }

    let staging = tempfile::Builder::new().prefix("cvptool-").tempdir()?;
    let controller = CvpController::connect(&resolved.controller, staging.path()).await?;
    tracing::debug!(host = %resolved.host, action = ?plan.action, "connected");

    let result = commands::dispatch(&plan, &controller, &resolved.host, &cli.global).await;
    if let Err(e) = controller.logout().await {
        tracing::debug!(error = %e, "logout failed");
    }
    result
}
