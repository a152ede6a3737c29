use anyhow::Result;
use crossterm::style::Stylize;
use srcfmt_core::formatter::FormattingEngine;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::arg_parser::CheckSubCommand;
use crate::arg_parser::CliArgs;
use crate::arg_parser::FmtSubCommand;
use crate::configuration::resolve_config_from_args;
use crate::configuration::ResolvedConfig;
use crate::environment::Environment;
use crate::format::run_parallelized;
use crate::format::FormatRunOptions;
use crate::policy::ResultPolicy;
use crate::scanner::scan_source_root;
use crate::vcs::ensure_supported_provider;
use crate::vcs::filter_modified;
use crate::vcs::select_scm_connection;
use crate::vcs::ChangedFileSet;
use crate::vcs::VcsClient;

/// Files were found that aren't formatted while checking.
#[derive(Debug, Error)]
pub struct CheckFailure {
  pub not_formatted_count: usize,
}

impl std::fmt::Display for CheckFailure {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let count = self.not_formatted_count;
    write!(
      f,
      "Found {} not formatted {}. Run `srcfmt fmt` to reformat.",
      count.to_string().bold(),
      if count == 1 { "file" } else { "files" }
    )
  }
}

pub async fn format<TEnvironment: Environment>(
  cmd: &FmtSubCommand,
  args: &CliArgs,
  environment: &TEnvironment,
  engine: &FormattingEngine,
  vcs_client: &dyn VcsClient,
) -> Result<()> {
  let config = resolve_config_from_args(args, environment)?;
  let Some(file_paths) = get_file_paths_to_format(&config, environment, vcs_client)? else {
    return Ok(());
  };

  let options = get_run_options(&config, environment, ResultPolicy::Overwrite, cmd.diff);
  let summary = run_parallelized(file_paths, environment, engine, Arc::new(config.format_options.clone()), &options).await?;

  let formatted_files_count = summary.rewritten.len();
  if formatted_files_count > 0 {
    let suffix = if formatted_files_count == 1 { "file" } else { "files" };
    environment.log(&format!("Formatted {} {}.", formatted_files_count.to_string().bold(), suffix));
  }
  Ok(())
}

pub async fn check<TEnvironment: Environment>(
  cmd: &CheckSubCommand,
  args: &CliArgs,
  environment: &TEnvironment,
  engine: &FormattingEngine,
  vcs_client: &dyn VcsClient,
) -> Result<()> {
  let config = resolve_config_from_args(args, environment)?;
  let Some(file_paths) = get_file_paths_to_format(&config, environment, vcs_client)? else {
    return Ok(());
  };

  let options = get_run_options(&config, environment, ResultPolicy::ValidateOnly, cmd.diff);
  let summary = run_parallelized(file_paths, environment, engine, Arc::new(config.format_options.clone()), &options).await?;

  if summary.not_formatted.is_empty() {
    Ok(())
  } else {
    Err(
      CheckFailure {
        not_formatted_count: summary.not_formatted.len(),
      }
      .into(),
    )
  }
}

pub fn output_file_paths<TEnvironment: Environment>(args: &CliArgs, environment: &TEnvironment, vcs_client: &dyn VcsClient) -> Result<()> {
  let config = resolve_config_from_args(args, environment)?;
  if let Some(file_paths) = get_file_paths_to_format(&config, environment, vcs_client)? {
    for file_path in file_paths {
      environment.log_machine_readable(&file_path.display().to_string());
    }
  }
  Ok(())
}

fn get_run_options<TEnvironment: Environment>(config: &ResolvedConfig, environment: &TEnvironment, policy: ResultPolicy, output_diff: bool) -> FormatRunOptions {
  FormatRunOptions {
    policy,
    timeout: Duration::from_secs(config.format_timeout_secs),
    fail_fast: config.fail_fast,
    max_threads: config.max_threads.unwrap_or_else(|| environment.max_threads()),
    output_diff,
  }
}

/// Gets the files to format, or `None` when the configuration says to skip the run.
pub fn get_file_paths_to_format<TEnvironment: Environment>(
  config: &ResolvedConfig,
  environment: &TEnvironment,
  vcs_client: &dyn VcsClient,
) -> Result<Option<Vec<PathBuf>>> {
  if config.skip {
    environment.log("Skipping source reformatting due to plugin configuration.");
    return Ok(None);
  }
  if config.is_pom_packaging() {
    environment.log("Project packaging is POM, skipping...");
    return Ok(None);
  }

  // resolve the connection before doing any work so a bad configuration fails fast
  let scm_connection = if config.filter_modified {
    let connection = select_scm_connection(&config.scm)?;
    ensure_supported_provider(vcs_client, &connection)?;
    Some(connection)
  } else {
    None
  };

  let scan_options = config.scan_options();
  let mut file_paths = Vec::new();
  for root in config.source_roots() {
    file_paths.extend(scan_source_root(environment, &root, &scan_options)?);
  }
  // main and test directories may overlap
  file_paths.sort();
  file_paths.dedup();

  let Some(scm_connection) = scm_connection else {
    return Ok(Some(file_paths));
  };
  let repository = vcs_client.resolve_repository(&scm_connection, &config.base_path)?;
  let working_tree_root = environment.canonicalize(&repository.root)?;
  let changed_paths = vcs_client.status(&repository, working_tree_root.as_path())?;
  let changed_files = ChangedFileSet::new(working_tree_root.as_path(), changed_paths);
  log_debug!(
    environment,
    "Source control reported {} changed path{} in {}.",
    changed_files.len(),
    if changed_files.len() == 1 { "" } else { "s" },
    working_tree_root.display()
  );
  let candidate_count = file_paths.len();
  let file_paths = filter_modified(environment, file_paths, &changed_files);
  log_debug!(environment, "Kept {} of {} candidate files after filtering by modification.", file_paths.len(), candidate_count);
  Ok(Some(file_paths))
}
