use anyhow::bail;
use anyhow::Context;
use anyhow::Result;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::io::Write;
use std::path::Path;
use std::time::SystemTime;
use tempfile::Builder;

use super::CanonicalizedPathBuf;
use super::DirEntry;
use super::DirEntryKind;
use super::Environment;
use crate::utils::LogLevel;
use crate::utils::Logger;
use crate::utils::LoggerOptions;

pub struct RealEnvironmentOptions {
  pub log_level: LogLevel,
  pub is_stdout_machine_readable: bool,
}

#[derive(Clone)]
pub struct RealEnvironment {
  logger: Logger,
  cwd: CanonicalizedPathBuf,
}

impl RealEnvironment {
  pub fn new(options: RealEnvironmentOptions) -> Result<RealEnvironment> {
    let cwd = std::env::current_dir().context("Could not get the current working directory.")?;
    let cwd = dunce::canonicalize(&cwd).with_context(|| format!("Could not canonicalize {}.", cwd.display()))?;
    Ok(RealEnvironment {
      logger: Logger::new(&LoggerOptions {
        log_level: options.log_level,
        is_stdout_machine_readable: options.is_stdout_machine_readable,
      }),
      cwd: CanonicalizedPathBuf::new(cwd),
    })
  }
}

impl Environment for RealEnvironment {
  fn read_file_bytes(&self, file_path: impl AsRef<Path>) -> Result<Vec<u8>> {
    let file_path = file_path.as_ref();
    log_debug!(self, "Reading file: {}", file_path.display());
    fs::read(file_path).with_context(|| format!("Error reading file {}", file_path.display()))
  }

  fn write_file_bytes(&self, file_path: impl AsRef<Path>, bytes: &[u8]) -> Result<()> {
    let file_path = file_path.as_ref();
    log_debug!(self, "Writing file: {}", file_path.display());
    fs::write(file_path, bytes).with_context(|| format!("Error writing file {}", file_path.display()))
  }

  /// Writes to a synced temporary file next to the target and renames it over the target.
  ///
  /// Links are followed so the file they point to is replaced, and the
  /// replaced file's permissions are kept.
  fn atomic_write_file_bytes(&self, file_path: impl AsRef<Path>, bytes: &[u8]) -> Result<()> {
    let file_path = file_path.as_ref();
    log_debug!(self, "Atomically writing file: {}", file_path.display());
    let target_path = match dunce::canonicalize(file_path) {
      Ok(target_path) => target_path,
      Err(err) if err.kind() == io::ErrorKind::NotFound => file_path.to_path_buf(),
      Err(err) => return Err(err).with_context(|| format!("Error writing file {}", file_path.display())),
    };
    let (Some(dir_path), Some(file_name)) = (target_path.parent(), target_path.file_name()) else {
      bail!("Cannot write to {} because it has no parent directory.", file_path.display());
    };
    let permissions = fs::metadata(&target_path).ok().map(|metadata| metadata.permissions());

    let write = || -> io::Result<()> {
      let mut prefix = OsString::from(".");
      prefix.push(file_name);
      prefix.push(".");
      // removed on drop if any step fails
      let mut temp_file = Builder::new().prefix(&prefix).tempfile_in(dir_path)?;
      temp_file.write_all(bytes)?;
      if let Some(permissions) = permissions {
        temp_file.as_file().set_permissions(permissions)?;
      }
      temp_file.as_file().sync_all()?;
      temp_file.persist(&target_path).map_err(|err| err.error)?;
      Ok(())
    };
    write().with_context(|| format!("Error writing file {}", file_path.display()))
  }

  fn path_exists(&self, file_path: impl AsRef<Path>) -> bool {
    file_path.as_ref().exists()
  }

  fn is_dir(&self, path: impl AsRef<Path>) -> bool {
    path.as_ref().is_dir()
  }

  fn dir_info(&self, dir_path: impl AsRef<Path>) -> Result<Vec<DirEntry>> {
    let dir_path = dir_path.as_ref();
    log_debug!(self, "Reading directory: {}", dir_path.display());
    let mut entries = Vec::new();
    let read_dir = fs::read_dir(dir_path).with_context(|| format!("Error reading directory {}", dir_path.display()))?;
    for entry in read_dir {
      let entry = entry.with_context(|| format!("Error reading entry in directory {}", dir_path.display()))?;
      let file_type = entry.file_type().with_context(|| format!("Error getting file type of {}", entry.path().display()))?;
      let kind = if file_type.is_symlink() {
        DirEntryKind::Symlink
      } else if file_type.is_dir() {
        DirEntryKind::Directory
      } else {
        DirEntryKind::File
      };
      entries.push(DirEntry { kind, path: entry.path() });
    }
    Ok(entries)
  }

  fn file_modified_time(&self, file_path: impl AsRef<Path>) -> Result<SystemTime> {
    let file_path = file_path.as_ref();
    fs::metadata(file_path)
      .and_then(|metadata| metadata.modified())
      .with_context(|| format!("Error getting modified time of {}", file_path.display()))
  }

  fn canonicalize(&self, path: impl AsRef<Path>) -> Result<CanonicalizedPathBuf> {
    let path = path.as_ref();
    // use dunce to avoid UNC paths on Windows
    let path = dunce::canonicalize(path).with_context(|| format!("Error canonicalizing path {}", path.display()))?;
    Ok(CanonicalizedPathBuf::new(path))
  }

  fn cwd(&self) -> CanonicalizedPathBuf {
    self.cwd.clone()
  }

  fn log(&self, text: &str) {
    self.logger.log(text);
  }

  fn log_machine_readable(&self, text: &str) {
    self.logger.log_machine_readable(text);
  }

  fn log_stderr(&self, text: &str) {
    self.logger.log_stderr(text);
  }

  fn log_level(&self) -> LogLevel {
    self.logger.log_level()
  }

  fn max_threads(&self) -> usize {
    resolve_max_threads(std::env::var("SRCFMT_MAX_THREADS").ok(), std::thread::available_parallelism().map(|p| p.get()).unwrap_or(4))
  }
}

fn resolve_max_threads(env_var: Option<String>, available_parallelism: usize) -> usize {
  match env_var.and_then(|value| value.parse::<usize>().ok()) {
    Some(value) if value > 0 && value <= available_parallelism => value,
    _ => available_parallelism,
  }
}
