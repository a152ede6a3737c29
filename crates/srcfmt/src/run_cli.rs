use anyhow::Result;
use srcfmt_core::formatter::FormattingEngine;
use std::sync::Arc;
use thiserror::Error;

use crate::arg_parser::CliArgs;
use crate::arg_parser::ParseArgsError;
use crate::arg_parser::SubCommand;
use crate::commands;
use crate::commands::CheckFailure;
use crate::configuration::ConfigurationError;
use crate::environment::Environment;
use crate::scanner::ScanFailure;
use crate::vcs::VcsClient;

#[derive(Debug, Error)]
#[error("{inner}")]
pub struct AppError {
  pub inner: anyhow::Error,
  pub exit_code: i32,
}

impl From<ParseArgsError> for AppError {
  fn from(inner: ParseArgsError) -> Self {
    AppError {
      inner: inner.into(),
      exit_code: 10,
    }
  }
}

impl From<anyhow::Error> for AppError {
  fn from(inner: anyhow::Error) -> Self {
    let exit_code = if inner.downcast_ref::<ConfigurationError>().is_some() {
      11
    } else if inner.downcast_ref::<ScanFailure>().is_some() {
      12
    } else if inner.downcast_ref::<CheckFailure>().is_some() {
      20
    } else {
      1
    };
    AppError { inner, exit_code }
  }
}

/// The formatter and source control client used for a run.
pub struct RunCliContext {
  pub engine: FormattingEngine,
  pub vcs_client: Arc<dyn VcsClient>,
}

pub async fn run_cli<TEnvironment: Environment>(args: &CliArgs, environment: &TEnvironment, context: &RunCliContext) -> Result<(), AppError> {
  match &args.sub_command {
    SubCommand::Help(help_text) => commands::output_help(environment, help_text)?,
    SubCommand::Version => commands::output_version(environment)?,
    SubCommand::Init => commands::init_config_file(environment, &args.config)?,
    SubCommand::OutputResolvedConfig => commands::output_resolved_config(args, environment)?,
    SubCommand::OutputFilePaths => commands::output_file_paths(args, environment, context.vcs_client.as_ref())?,
    SubCommand::Fmt(cmd) => commands::format(cmd, args, environment, &context.engine, context.vcs_client.as_ref()).await?,
    SubCommand::Check(cmd) => commands::check(cmd, args, environment, &context.engine, context.vcs_client.as_ref()).await?,
  }
  Ok(())
}
