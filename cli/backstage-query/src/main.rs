use std::process::ExitCode;

use anyhow::Result;
use bpaf::Args;
use commands::{QueryArgs, QueryCli};
use tracing::debug;

mod commands;
mod config;
mod logger;
mod message;

async fn run(args: QueryArgs) -> Result<()> {
    let config = config::Config::parse()?;
    debug!(page_limit = ?config.page_limit, has_token = config.token.is_some(), "read config");
    args.handle(config).await
}

fn main() -> ExitCode {
    // Pass through Stdout failure; This represents `--help`
    let args = match commands::query_cli().run_inner(Args::current_args()) {
        Ok(QueryCli(args)) => args,
        Err(bpaf::ParseFailure::Stdout(m, _)) => {
            print!("{m:80}");
            return ExitCode::SUCCESS;
        },
        Err(bpaf::ParseFailure::Completion(c)) => {
            print!("{c}");
            return ExitCode::SUCCESS;
        },
        Err(bpaf::ParseFailure::Stderr(m)) => {
            message::error(format!("{m:80}"));
            return ExitCode::FAILURE;
        },
    };

    logger::init_logger(args.verbosity);

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            message::error(format!("Could not start async runtime: {e}"));
            return ExitCode::FAILURE;
        },
    };

    // Print errors and exit with status 1 on failure
    match runtime.block_on(run(args)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            debug!("{e:#}");
            let err_str = e
                .chain()
                .skip(1)
                .fold(e.to_string(), |acc, cause| format!("{acc}: {cause}"));
            message::error(err_str);
            ExitCode::FAILURE
        },
    }
}
