use anyhow::bail;
use anyhow::Result;
use crossterm::style::Stylize;
use parking_lot::Mutex;
use srcfmt_core::formatter::FormatDiagnostic;
use srcfmt_core::formatter::FormattingEngine;
use srcfmt_core::formatter::TransformResult;
use srcfmt_core::options::FormatOptions;
use std::any::Any;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use crate::change_detector::is_unchanged;
use crate::environment::Environment;
use crate::policy::PolicyOutcome;
use crate::policy::ResultPolicy;
use crate::utils::get_difference;
use crate::utils::ErrorCountLogger;

#[derive(Debug, Clone)]
pub struct FormatRunOptions {
  pub policy: ResultPolicy,
  /// Maximum time a single file may spend in the formatter.
  pub timeout: Duration,
  pub fail_fast: bool,
  pub max_threads: usize,
  pub output_diff: bool,
}

/// Files acted on by the policy, each sorted by path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormatRunSummary {
  pub rewritten: Vec<PathBuf>,
  pub not_formatted: Vec<PathBuf>,
}

#[derive(Debug, Error)]
#[error("{}", .0.iter().map(|d| d.to_string()).collect::<Vec<_>>().join("\n"))]
struct FormatFailure(Vec<FormatDiagnostic>);

/// Formats the files on a bounded number of blocking threads and applies the
/// policy to every file whose content changed.
///
/// Errors for individual files are logged as they occur and don't stop the
/// other files unless fail fast is enabled. The run errors when any file did.
pub async fn run_parallelized<TEnvironment: Environment>(
  file_paths: Vec<PathBuf>,
  environment: &TEnvironment,
  engine: &FormattingEngine,
  format_options: Arc<FormatOptions>,
  options: &FormatRunOptions,
) -> Result<FormatRunSummary> {
  let number_threads = std::cmp::max(1, options.max_threads);
  log_debug!(
    environment,
    "Formatter: {}\nThread count: {}\nFile count: {}",
    engine.formatter_name(),
    number_threads,
    file_paths.len()
  );

  let error_logger = ErrorCountLogger::from_environment(environment);
  let semaphore = Arc::new(Semaphore::new(number_threads));
  let summary = Arc::new(Mutex::new(FormatRunSummary::default()));
  let options = Arc::new(options.clone());

  let mut handles = Vec::with_capacity(file_paths.len());
  for file_path in file_paths {
    let permit = match semaphore.clone().acquire_owned().await {
      Ok(permit) => permit,
      Err(_) => break, // closed on fail fast
    };
    let semaphore = semaphore.clone();
    let environment = environment.clone();
    let engine = engine.clone();
    let format_options = format_options.clone();
    let options = options.clone();
    let summary = summary.clone();
    let error_logger = error_logger.clone();
    handles.push(tokio::spawn(async move {
      let long_format_token = CancellationToken::new();
      tokio::spawn({
        let long_format_token = long_format_token.clone();
        let environment = environment.clone();
        let file_path = file_path.clone();
        async move {
          tokio::select! {
            _ = long_format_token.cancelled() => {
              // exit
            }
            _ = tokio::time::sleep(Duration::from_secs(10)) => {
              log_warn!(environment, "WARNING: Formatting is slow for {}", file_path.display());
            }
          }
        }
      });
      let result = run_for_file_path(environment, engine, format_options, options.clone(), summary, file_path.clone()).await;
      long_format_token.cancel();
      if let Err(err) = result {
        match err.downcast::<FormatFailure>() {
          Ok(failure) => {
            for diagnostic in failure.0 {
              error_logger.log_error(&diagnostic.to_string());
            }
          }
          Err(err) => error_logger.log_error(&format!("Error formatting {}. Message: {:#}", file_path.display(), err)),
        }
        if options.fail_fast {
          semaphore.close();
        }
      }
      drop(permit);
    }));
  }

  for handle in handles {
    if let Err(err) = handle.await {
      error_logger.log_error(&format!("Error formatting. Message: {}", err));
    }
  }

  let error_count = error_logger.get_error_count();
  if error_count > 0 {
    bail!("Had {} error{} formatting.", error_count, if error_count == 1 { "" } else { "s" });
  }

  let mut summary = std::mem::take(&mut *summary.lock());
  summary.rewritten.sort();
  summary.not_formatted.sort();
  Ok(summary)
}

async fn run_for_file_path<TEnvironment: Environment>(
  environment: TEnvironment,
  engine: FormattingEngine,
  format_options: Arc<FormatOptions>,
  options: Arc<FormatRunOptions>,
  summary: Arc<Mutex<FormatRunSummary>>,
  file_path: PathBuf,
) -> Result<()> {
  // the content is read here rather than at scan time so it's current
  let format_task = tokio::task::spawn_blocking({
    let environment = environment.clone();
    let file_path = file_path.clone();
    move || {
      let file_text = environment.read_file(&file_path)?;
      let start_instant = Instant::now();
      let result = engine.format(&file_path, &file_text, &format_options, format_options.fix_imports);
      log_debug!(
        environment,
        "Formatted file: {} in {}ms",
        file_path.display(),
        start_instant.elapsed().as_millis()
      );
      Ok::<_, anyhow::Error>((file_text, result))
    }
  });

  let (file_text, result) = match tokio::time::timeout(options.timeout, format_task).await {
    Ok(Ok(result)) => result?,
    Ok(Err(err)) if err.is_panic() => {
      let message = format!("The formatter panicked. {}", get_panic_message(err.into_panic()));
      return Err(FormatFailure(vec![FormatDiagnostic::new(message).with_file_path(&file_path)]).into());
    }
    Ok(Err(err)) => return Err(err.into()),
    Err(_) => {
      let message = format!("Formatting timed out after {:?}.", options.timeout);
      return Err(FormatFailure(vec![FormatDiagnostic::new(message).with_file_path(&file_path)]).into());
    }
  };

  let formatted_text = match result {
    TransformResult::Unchanged => {
      log_debug!(environment, "No change: {}", file_path.display());
      return Ok(());
    }
    TransformResult::Failed(diagnostics) => return Err(FormatFailure(diagnostics).into()),
    TransformResult::Changed(formatted_text) => formatted_text,
  };
  if is_unchanged(file_text.as_bytes(), formatted_text.as_bytes()) {
    log_debug!(environment, "No change: {}", file_path.display());
    return Ok(());
  }

  let policy = options.policy;
  let output_diff = options.output_diff;
  let (file_path, outcome) = tokio::task::spawn_blocking(move || {
    let outcome = policy.apply(&environment, &file_path, &formatted_text)?;
    if output_diff {
      let difference_text = get_difference(&file_text, &formatted_text);
      environment.log(&format!("{} {}:\n{}\n--", "from".bold().red(), file_path.display(), difference_text));
    }
    Ok::<_, anyhow::Error>((file_path, outcome))
  })
  .await??;

  let mut summary = summary.lock();
  match outcome {
    PolicyOutcome::Rewritten => summary.rewritten.push(file_path),
    PolicyOutcome::NotFormatted => summary.not_formatted.push(file_path),
  }
  Ok(())
}

fn get_panic_message(payload: Box<dyn Any + Send>) -> String {
  if let Some(text) = payload.downcast_ref::<&str>() {
    text.to_string()
  } else if let Some(text) = payload.downcast_ref::<String>() {
    text.clone()
  } else {
    "Unknown panic payload.".to_string()
  }
}
