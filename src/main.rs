//! jira-session - JIRA from the command line.

use std::process::ExitCode;

use clap::Parser;

use jira_session::{cli, logging};

#[tokio::main]
async fn main() -> ExitCode {
    let args = cli::Cli::parse();

    if let Err(e) = logging::init(args.verbose) {
        eprintln!("warning: logging disabled: {}", e);
    }

    let result = cli::run(args).await;
    logging::shutdown();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            eprintln!("error: {}", e.user_message());
            if let Some(action) = e.suggested_action() {
                eprintln!("hint: {}", action);
            }
            if let Some(dir) = logging::log_directory() {
                eprintln!("logs: {}", dir.display());
            }
            ExitCode::FAILURE
        }
    }
}
