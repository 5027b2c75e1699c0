use std::process::ExitCode;

use clap::Parser;
use loan_risk_agent_lib::cli::{exit_code_for, Cli};
use loan_risk_agent_lib::logging::init_tracing;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    match loan_risk_agent_lib::run(cli) {
        Ok(value) => {
            println!(
                "{}",
                serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string())
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::debug!(code = %err.code, "command failed");
            eprintln!(
                "{}",
                serde_json::to_string_pretty(&err).unwrap_or_else(|_| err.to_string())
            );
            ExitCode::from(exit_code_for(&err))
        }
    }
}
