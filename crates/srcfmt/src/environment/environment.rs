use anyhow::Result;
use std::path::Path;
use std::path::PathBuf;
use std::time::SystemTime;

use super::CanonicalizedPathBuf;
use crate::utils::LogLevel;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirEntryKind {
  Directory,
  File,
  /// A symlink, which is not followed when listing a directory.
  Symlink,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
  pub kind: DirEntryKind,
  pub path: PathBuf,
}

pub trait Environment: Clone + std::marker::Send + std::marker::Sync + 'static {
  fn read_file(&self, file_path: impl AsRef<Path>) -> Result<String> {
    let bytes = self.read_file_bytes(file_path)?;
    Ok(String::from_utf8(bytes)?)
  }
  fn read_file_bytes(&self, file_path: impl AsRef<Path>) -> Result<Vec<u8>>;
  fn write_file(&self, file_path: impl AsRef<Path>, file_text: &str) -> Result<()> {
    self.write_file_bytes(file_path, file_text.as_bytes())
  }
  fn write_file_bytes(&self, file_path: impl AsRef<Path>, bytes: &[u8]) -> Result<()>;
  /// Writes the file such that a reader never observes a partially written file.
  fn atomic_write_file_bytes(&self, file_path: impl AsRef<Path>, bytes: &[u8]) -> Result<()>;
  fn path_exists(&self, file_path: impl AsRef<Path>) -> bool;
  /// Gets if the path is a directory, following symlinks.
  fn is_dir(&self, path: impl AsRef<Path>) -> bool;
  fn dir_info(&self, dir_path: impl AsRef<Path>) -> Result<Vec<DirEntry>>;
  fn file_modified_time(&self, file_path: impl AsRef<Path>) -> Result<SystemTime>;
  fn canonicalize(&self, path: impl AsRef<Path>) -> Result<CanonicalizedPathBuf>;
  fn cwd(&self) -> CanonicalizedPathBuf;
  /// Logs informational text to stdout.
  fn log(&self, text: &str);
  /// Logs to stdout regardless of the log level.
  fn log_machine_readable(&self, text: &str);
  fn log_stderr(&self, text: &str);
  fn log_level(&self) -> LogLevel;
  fn max_threads(&self) -> usize;
}

// use a macro here so the expression provided is only evaluated when in debug mode
macro_rules! log_debug {
  ($environment:expr, $($arg:tt)*) => {
    if $environment.log_level() <= $crate::utils::LogLevel::Debug {
      let mut text = String::from("[DEBUG] ");
      text.push_str(&format!($($arg)*));
      $environment.log_stderr(&text);
    }
  }
}

macro_rules! log_warn {
  ($environment:expr, $($arg:tt)*) => {
    if $environment.log_level() <= $crate::utils::LogLevel::Warn {
      let text = format!($($arg)*);
      $environment.log_stderr(&text);
    }
  }
}

macro_rules! log_error {
  ($environment:expr, $($arg:tt)*) => {
    if $environment.log_level() <= $crate::utils::LogLevel::Error {
      let text = format!($($arg)*);
      $environment.log_stderr(&text);
    }
  }
}
