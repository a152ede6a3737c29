use anyhow::Result;
use std::path::Path;

use crate::environment::Environment;

/// What to do with a file whose formatted content differs from what's on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultPolicy {
  /// Replace the file with its formatted content.
  Overwrite,
  /// Leave the file untouched and report it as not formatted.
  ValidateOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyOutcome {
  Rewritten,
  NotFormatted,
}

impl ResultPolicy {
  pub fn apply<TEnvironment: Environment>(&self, environment: &TEnvironment, file_path: &Path, formatted_text: &str) -> Result<PolicyOutcome> {
    match self {
      ResultPolicy::Overwrite => {
        environment.atomic_write_file_bytes(file_path, formatted_text.as_bytes())?;
        environment.log(&format!("Reformatted {}", file_path.display()));
        Ok(PolicyOutcome::Rewritten)
      }
      ResultPolicy::ValidateOnly => {
        environment.log(&format!("Not formatted: {}", file_path.display()));
        Ok(PolicyOutcome::NotFormatted)
      }
    }
  }
}
