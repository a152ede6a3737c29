use anyhow::bail;
use anyhow::Result;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::collections::HashSet;
use std::future::Future;
use std::path::Path;
use std::path::PathBuf;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use std::time::SystemTime;

use super::CanonicalizedPathBuf;
use super::DirEntry;
use super::DirEntryKind;
use super::Environment;
use crate::utils::normalize_path;
use crate::utils::LogLevel;

/// Gets a modification time the given number of seconds after the epoch.
pub fn time_at_secs(secs: u64) -> SystemTime {
  SystemTime::UNIX_EPOCH + Duration::from_secs(secs)
}

/// An operation that can be made to fail for a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TestFailure {
  Read,
  Write,
  ReadDir,
  ModifiedTime,
}

#[derive(Clone)]
struct TestFile {
  bytes: Vec<u8>,
  modified: SystemTime,
}

#[derive(Default)]
struct TestFileSystem {
  files: BTreeMap<PathBuf, TestFile>,
  directories: BTreeSet<PathBuf>,
  /// Link path to target path.
  symlinks: BTreeMap<PathBuf, PathBuf>,
  failures: HashSet<(PathBuf, TestFailure)>,
}

impl TestFileSystem {
  fn ensure_dir_all(&mut self, dir_path: &Path) {
    let mut current = Some(dir_path);
    while let Some(path) = current {
      self.directories.insert(path.to_path_buf());
      current = path.parent();
    }
  }

  /// Follows links in every component of the path.
  fn resolve_link(&self, path: &Path) -> PathBuf {
    let mut resolved = PathBuf::new();
    for component in path.components() {
      resolved.push(component);
      // bounded so that a link cycle can't hang
      for _ in 0..32 {
        match self.symlinks.get(&resolved) {
          Some(target) => resolved = target.clone(),
          None => break,
        }
      }
    }
    resolved
  }

  fn has_failure(&self, path: &Path, failure: TestFailure) -> bool {
    self.failures.contains(&(path.to_path_buf(), failure))
  }
}

#[derive(Clone)]
pub struct TestEnvironment {
  cwd: Arc<Mutex<PathBuf>>,
  file_system: Arc<Mutex<TestFileSystem>>,
  now: Arc<Mutex<SystemTime>>,
  read_count: Arc<AtomicUsize>,
  stdout_messages: Arc<Mutex<Vec<String>>>,
  stderr_messages: Arc<Mutex<Vec<String>>>,
  log_level: Arc<Mutex<LogLevel>>,
  is_stdout_machine_readable: Arc<Mutex<bool>>,
}

impl TestEnvironment {
  pub fn new() -> TestEnvironment {
    let mut file_system = TestFileSystem::default();
    file_system.ensure_dir_all(Path::new("/"));
    TestEnvironment {
      cwd: Arc::new(Mutex::new(PathBuf::from("/"))),
      file_system: Arc::new(Mutex::new(file_system)),
      now: Arc::new(Mutex::new(time_at_secs(1_000_000))),
      read_count: Default::default(),
      stdout_messages: Default::default(),
      stderr_messages: Default::default(),
      log_level: Arc::new(Mutex::new(LogLevel::Info)),
      is_stdout_machine_readable: Default::default(),
    }
  }

  pub fn take_stdout_messages(&self) -> Vec<String> {
    self.stdout_messages.lock().drain(..).collect()
  }

  pub fn take_stderr_messages(&self) -> Vec<String> {
    self.stderr_messages.lock().drain(..).collect()
  }

  pub fn clear_logs(&self) {
    self.stdout_messages.lock().clear();
    self.stderr_messages.lock().clear();
  }

  /// Number of file reads performed so far.
  pub fn read_count(&self) -> usize {
    self.read_count.load(Ordering::SeqCst)
  }

  pub fn set_log_level(&self, log_level: LogLevel) {
    *self.log_level.lock() = log_level;
  }

  pub fn set_stdout_machine_readable(&self, value: bool) {
    *self.is_stdout_machine_readable.lock() = value;
  }

  pub fn set_cwd(&self, new_path: impl AsRef<Path>) {
    let new_path = normalize_path(new_path);
    self.file_system.lock().ensure_dir_all(&new_path);
    *self.cwd.lock() = new_path;
  }

  pub fn set_modified_time(&self, file_path: impl AsRef<Path>, modified: SystemTime) {
    let file_path = self.resolve(file_path);
    let mut file_system = self.file_system.lock();
    match file_system.files.get_mut(&file_path) {
      Some(file) => file.modified = modified,
      None => panic!("Cannot set the modified time of missing file {}", file_path.display()),
    }
  }

  pub fn create_dir_all(&self, dir_path: impl AsRef<Path>) {
    let dir_path = self.resolve(dir_path);
    self.file_system.lock().ensure_dir_all(&dir_path);
  }

  pub fn add_symlink(&self, link_path: impl AsRef<Path>, target_path: impl AsRef<Path>) {
    let link_path = self.resolve(link_path);
    let target_path = self.resolve(target_path);
    let mut file_system = self.file_system.lock();
    if let Some(parent) = link_path.parent() {
      file_system.ensure_dir_all(parent);
    }
    file_system.symlinks.insert(link_path, target_path);
  }

  pub fn add_failure(&self, path: impl AsRef<Path>, failure: TestFailure) {
    let path = self.resolve(path);
    self.file_system.lock().failures.insert((path, failure));
  }

  pub fn run_in_runtime<T>(&self, future: impl Future<Output = T>) -> T {
    let rt = tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap();
    rt.block_on(future)
  }

  fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    if path.has_root() {
      normalize_path(path)
    } else {
      normalize_path(self.cwd.lock().join(path))
    }
  }
}

impl Default for TestEnvironment {
  fn default() -> Self {
    Self::new()
  }
}

impl Environment for TestEnvironment {
  fn read_file_bytes(&self, file_path: impl AsRef<Path>) -> Result<Vec<u8>> {
    let file_path = self.resolve(file_path);
    self.read_count.fetch_add(1, Ordering::SeqCst);
    let file_system = self.file_system.lock();
    let resolved_path = file_system.resolve_link(&file_path);
    if file_system.has_failure(&resolved_path, TestFailure::Read) {
      bail!("Error reading file {}: Permission denied", file_path.display());
    }
    match file_system.files.get(&resolved_path) {
      Some(file) => Ok(file.bytes.clone()),
      None => bail!("Error reading file {}: Could not find file", file_path.display()),
    }
  }

  fn write_file_bytes(&self, file_path: impl AsRef<Path>, bytes: &[u8]) -> Result<()> {
    let file_path = self.resolve(file_path);
    let modified = *self.now.lock();
    let mut file_system = self.file_system.lock();
    let resolved_path = file_system.resolve_link(&file_path);
    if file_system.has_failure(&resolved_path, TestFailure::Write) {
      bail!("Error writing file {}: Permission denied", file_path.display());
    }
    if let Some(parent) = resolved_path.parent() {
      file_system.ensure_dir_all(parent);
    }
    file_system.files.insert(
      resolved_path,
      TestFile {
        bytes: bytes.to_vec(),
        modified,
      },
    );
    Ok(())
  }

  fn atomic_write_file_bytes(&self, file_path: impl AsRef<Path>, bytes: &[u8]) -> Result<()> {
    self.write_file_bytes(file_path, bytes)
  }

  fn path_exists(&self, file_path: impl AsRef<Path>) -> bool {
    let file_path = self.resolve(file_path);
    let file_system = self.file_system.lock();
    let resolved_path = file_system.resolve_link(&file_path);
    file_system.files.contains_key(&resolved_path) || file_system.directories.contains(&resolved_path)
  }

  fn is_dir(&self, path: impl AsRef<Path>) -> bool {
    let path = self.resolve(path);
    let file_system = self.file_system.lock();
    file_system.directories.contains(&file_system.resolve_link(&path))
  }

  fn dir_info(&self, dir_path: impl AsRef<Path>) -> Result<Vec<DirEntry>> {
    let dir_path = self.resolve(dir_path);
    let file_system = self.file_system.lock();
    let resolved_dir_path = file_system.resolve_link(&dir_path);
    if file_system.has_failure(&resolved_dir_path, TestFailure::ReadDir) {
      bail!("Error reading directory {}: Permission denied", dir_path.display());
    }
    if !file_system.directories.contains(&resolved_dir_path) {
      bail!("Error reading directory {}: Could not find directory", dir_path.display());
    }
    let is_child = |path: &Path| path.parent() == Some(resolved_dir_path.as_path()) && path != resolved_dir_path;
    // entries are reported under the requested path like a real file system does
    let to_entry = |kind: DirEntryKind, path: &Path| DirEntry {
      kind,
      path: match path.file_name() {
        Some(file_name) => dir_path.join(file_name),
        None => path.to_path_buf(),
      },
    };
    let mut entries = Vec::new();
    for path in file_system.directories.iter().filter(|path| is_child(path)) {
      entries.push(to_entry(DirEntryKind::Directory, path));
    }
    for path in file_system.files.keys().filter(|path| is_child(path)) {
      entries.push(to_entry(DirEntryKind::File, path));
    }
    for path in file_system.symlinks.keys().filter(|path| is_child(path)) {
      entries.push(to_entry(DirEntryKind::Symlink, path));
    }
    Ok(entries)
  }

  fn file_modified_time(&self, file_path: impl AsRef<Path>) -> Result<SystemTime> {
    let file_path = self.resolve(file_path);
    let file_system = self.file_system.lock();
    let resolved_path = file_system.resolve_link(&file_path);
    if file_system.has_failure(&resolved_path, TestFailure::ModifiedTime) {
      bail!("Error getting modified time of {}: Permission denied", file_path.display());
    }
    match file_system.files.get(&resolved_path) {
      Some(file) => Ok(file.modified),
      None => bail!("Error getting modified time of {}: Could not find file", file_path.display()),
    }
  }

  fn canonicalize(&self, path: impl AsRef<Path>) -> Result<CanonicalizedPathBuf> {
    let path = self.resolve(path);
    if !self.path_exists(&path) {
      bail!("Error canonicalizing path {}: Could not find path", path.display());
    }
    let resolved_path = self.file_system.lock().resolve_link(&path);
    Ok(CanonicalizedPathBuf::new(resolved_path))
  }

  fn cwd(&self) -> CanonicalizedPathBuf {
    CanonicalizedPathBuf::new(self.cwd.lock().clone())
  }

  fn log(&self, text: &str) {
    if *self.log_level.lock() > LogLevel::Info || *self.is_stdout_machine_readable.lock() {
      return;
    }
    self.stdout_messages.lock().push(String::from(text));
  }

  fn log_machine_readable(&self, text: &str) {
    self.stdout_messages.lock().push(String::from(text));
  }

  fn log_stderr(&self, text: &str) {
    if *self.log_level.lock() == LogLevel::Silent {
      return;
    }
    self.stderr_messages.lock().push(String::from(text));
  }

  fn log_level(&self) -> LogLevel {
    *self.log_level.lock()
  }

  fn max_threads(&self) -> usize {
    4
  }
}
