use std::cell::RefCell;
use std::sync::Arc;

use crossterm::style::Stylize;
use srcfmt_basic_formatter::BasicFormatter;
use srcfmt_core::formatter::FormattingEngine;
use thiserror::Error;

use crate::arg_parser::parse_args;
use crate::environment::TestEnvironment;
use crate::run_cli::run_cli;
use crate::run_cli::AppError;
use crate::run_cli::RunCliContext;
use crate::vcs::test_vcs::TestVcsClient;
use crate::vcs::VcsClient;

#[derive(Debug, Error)]
#[error("{inner}")]
pub struct TestAppError {
  asserted_exit_code: RefCell<bool>,
  inner: AppError,
}

impl TestAppError {
  #[track_caller]
  pub fn assert_exit_code(&self, exit_code: i32) {
    self.asserted_exit_code.replace(true);
    assert_eq!(self.inner.exit_code, exit_code);
  }
}

impl From<AppError> for TestAppError {
  fn from(inner: AppError) -> Self {
    Self {
      asserted_exit_code: Default::default(),
      inner,
    }
  }
}

impl Drop for TestAppError {
  fn drop(&mut self) {
    if std::thread::panicking() || self.inner.exit_code <= 1 {
      return;
    }
    if !*self.asserted_exit_code.borrow() {
      panic!("Exit code must be asserted. Was: {}", self.inner.exit_code);
    }
  }
}

pub fn run_test_cli(args: Vec<&str>, environment: &TestEnvironment) -> Result<(), TestAppError> {
  run_test_cli_with_vcs(args, environment, Arc::new(TestVcsClient::default()))
}

pub fn run_test_cli_with_vcs(args: Vec<&str>, environment: &TestEnvironment, vcs_client: Arc<dyn VcsClient>) -> Result<(), TestAppError> {
  let mut args: Vec<String> = args.into_iter().map(String::from).collect();
  args.insert(0, String::from(""));
  let args = parse_args(args).map_err(AppError::from)?;
  environment.set_log_level(args.log_level);
  environment.set_stdout_machine_readable(args.is_stdout_machine_readable());
  let context = RunCliContext {
    engine: FormattingEngine::new(Arc::new(BasicFormatter)),
    vcs_client,
  };

  environment.run_in_runtime({
    let environment = environment.clone();
    async move { Ok(run_cli(&args, &environment, &context).await?) }
  })
}

pub fn get_formatted_text(count: usize) -> String {
  let suffix = if count == 1 { "file" } else { "files" };
  format!("Formatted {} {}.", count.to_string().bold(), suffix)
}

pub fn get_found_text(count: usize, dir_path: &str) -> String {
  let suffix = if count == 1 { "file" } else { "files" };
  format!("Found {} uncompiled/modified {} in {} to reformat.", count, suffix, dir_path)
}

pub fn get_check_failure_text(count: usize) -> String {
  let suffix = if count == 1 { "file" } else { "files" };
  format!("Found {} not formatted {}. Run `srcfmt fmt` to reformat.", count.to_string().bold(), suffix)
}

pub fn get_expected_help_text() -> String {
  let mut cli_parser = crate::arg_parser::create_cli_parser(crate::arg_parser::CliArgParserKind::ForOutputtingMainHelp);
  format!("{}", cli_parser.render_help())
}
