#![deny(clippy::print_stderr)]
#![deny(clippy::print_stdout)]
#![deny(clippy::unused_async)]

#[macro_use]
mod environment;

use environment::RealEnvironment;
use environment::RealEnvironmentOptions;
use run_cli::AppError;
use run_cli::RunCliContext;
use srcfmt_basic_formatter::BasicFormatter;
use srcfmt_core::formatter::FormattingEngine;
use std::sync::Arc;
use utils::LogLevel;
use vcs::GitVcsClient;

mod arg_parser;
mod change_detector;
mod commands;
mod configuration;
mod format;
mod policy;
mod run_cli;
mod scanner;
mod utils;
mod vcs;

#[cfg(test)]
mod test_helpers;

fn main() {
  let rt = match tokio::runtime::Builder::new_current_thread().enable_time().build() {
    Ok(rt) => rt,
    Err(err) => exit_with_error(AppError::from(anyhow::Error::from(err)), LogLevel::Info),
  };
  let result = rt.block_on(run());
  // formatter calls that timed out may still be running on blocking threads
  rt.shutdown_background();
  if let Err((err, log_level)) = result {
    exit_with_error(err, log_level);
  }
}

fn exit_with_error(err: AppError, log_level: LogLevel) -> ! {
  if log_level != LogLevel::Silent {
    let result = format!("{:#}", err.inner);
    #[allow(clippy::print_stderr)]
    if !result.is_empty() {
      eprintln!("{}", result);
    }
  }
  std::process::exit(err.exit_code);
}

async fn run() -> Result<(), (AppError, LogLevel)> {
  let args = arg_parser::parse_args(std::env::args().collect()).map_err(|err| (err.into(), LogLevel::Info))?;

  let environment = RealEnvironment::new(RealEnvironmentOptions {
    log_level: args.log_level,
    is_stdout_machine_readable: args.is_stdout_machine_readable(),
  })
  .map_err(|err| (err.into(), args.log_level))?;
  let context = RunCliContext {
    engine: FormattingEngine::new(Arc::new(BasicFormatter)),
    vcs_client: Arc::new(GitVcsClient),
  };

  run_cli::run_cli(&args, &environment, &context).await.map_err(|err| (err, args.log_level))
}
