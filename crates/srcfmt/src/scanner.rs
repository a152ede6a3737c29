use anyhow::anyhow;
use anyhow::Result;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::environment::DirEntryKind;
use crate::environment::Environment;

/// A source directory and the directory its derived artifacts are written to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRoot {
  pub source_dir: PathBuf,
  pub derived_dir: PathBuf,
}

/// Maps a source file suffix to the suffixes of the artifacts derived from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuffixMapping {
  pub source_suffix: String,
  pub derived_suffixes: Vec<String>,
}

impl SuffixMapping {
  fn matches(&self, file_path: &Path) -> bool {
    file_path
      .file_name()
      .and_then(|name| name.to_str())
      .map(|name| name.len() > self.source_suffix.len() && name.ends_with(&self.source_suffix))
      .unwrap_or(false)
  }

  /// Gets the paths of the artifacts derived from the source file at the relative path.
  fn derived_paths(&self, derived_dir: &Path, relative_path: &Path) -> Vec<PathBuf> {
    let Some(file_name) = relative_path.file_name().and_then(|name| name.to_str()) else {
      return Vec::new();
    };
    let Some(stem) = file_name.strip_suffix(&self.source_suffix) else {
      return Vec::new();
    };
    self
      .derived_suffixes
      .iter()
      .map(|derived_suffix| derived_dir.join(relative_path.with_file_name(format!("{}{}", stem, derived_suffix))))
      .collect()
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOptions {
  /// Include every matching file instead of only stale ones.
  pub include_stale: bool,
  /// A source file only counts as newer than an artifact when it is newer by more than this.
  pub stale_tolerance: Duration,
  pub mapping: SuffixMapping,
}

#[derive(Debug, Error)]
#[error("Error scanning source path {} for files to reformat. {:#}", .root.display(), .source)]
pub struct ScanFailure {
  pub root: PathBuf,
  #[source]
  pub source: anyhow::Error,
}

/// Gets the candidate source files in the root, sorted by path.
///
/// A missing source directory yields no candidates.
pub fn scan_source_root<TEnvironment: Environment>(
  environment: &TEnvironment,
  root: &SourceRoot,
  options: &ScanOptions,
) -> Result<Vec<PathBuf>, ScanFailure> {
  let to_failure = |source: anyhow::Error| ScanFailure {
    root: root.source_dir.clone(),
    source,
  };

  if !environment.path_exists(&root.source_dir) {
    environment.log(&format!("Directory {} does not exist, skipping file collection.", root.source_dir.display()));
    return Ok(Vec::new());
  }
  if !environment.is_dir(&root.source_dir) {
    return Err(to_failure(anyhow!("The path is not a directory.")));
  }

  let mut file_paths = Vec::new();
  let mut pending_dirs = vec![root.source_dir.clone()];
  while let Some(dir_path) = pending_dirs.pop() {
    for entry in environment.dir_info(&dir_path).map_err(to_failure)? {
      let is_file = match entry.kind {
        DirEntryKind::Directory => {
          pending_dirs.push(entry.path);
          continue;
        }
        DirEntryKind::File => true,
        // never descend into a linked directory so link cycles can't occur
        DirEntryKind::Symlink => environment.path_exists(&entry.path) && !environment.is_dir(&entry.path),
      };
      if !is_file || !options.mapping.matches(&entry.path) {
        continue;
      }
      if options.include_stale || is_stale(environment, root, options, &entry.path).map_err(to_failure)? {
        file_paths.push(entry.path);
      }
    }
  }

  file_paths.sort();
  environment.log(&format!(
    "Found {} uncompiled/modified file{} in {} to reformat.",
    file_paths.len(),
    if file_paths.len() == 1 { "" } else { "s" },
    root.source_dir.display()
  ));
  Ok(file_paths)
}

/// A source file is stale when no derived artifact exists for it or when it was
/// modified after an existing artifact by more than the tolerance.
fn is_stale<TEnvironment: Environment>(environment: &TEnvironment, root: &SourceRoot, options: &ScanOptions, file_path: &Path) -> Result<bool> {
  let relative_path = file_path.strip_prefix(&root.source_dir)?;
  let source_modified = environment.file_modified_time(file_path)?;
  let mut found_artifact = false;
  for derived_path in options.mapping.derived_paths(&root.derived_dir, relative_path) {
    if !environment.path_exists(&derived_path) || environment.is_dir(&derived_path) {
      continue;
    }
    found_artifact = true;
    let derived_modified = environment.file_modified_time(&derived_path)?;
    if source_modified > derived_modified + options.stale_tolerance {
      return Ok(true);
    }
  }
  Ok(!found_artifact)
}

#[cfg(test)]
mod test {
  use pretty_assertions::assert_eq;

  use super::*;
  use crate::environment::time_at_secs;
  use crate::environment::TestEnvironment;
  use crate::environment::TestEnvironmentBuilder;
  use crate::environment::TestFailure;

  fn main_root() -> SourceRoot {
    SourceRoot {
      source_dir: PathBuf::from("/src/main/java"),
      derived_dir: PathBuf::from("/target/classes"),
    }
  }

  fn options(include_stale: bool) -> ScanOptions {
    ScanOptions {
      include_stale,
      stale_tolerance: Duration::from_millis(1024),
      mapping: SuffixMapping {
        source_suffix: ".java".to_string(),
        derived_suffixes: vec![".java".to_string(), ".class".to_string()],
      },
    }
  }

  fn scan(environment: &TestEnvironment, include_stale: bool) -> Vec<PathBuf> {
    scan_source_root(environment, &main_root(), &options(include_stale)).unwrap()
  }

  #[test]
  fn should_include_all_matching_files_when_exhaustive() {
    let environment = TestEnvironmentBuilder::new()
      .write_file("/src/main/java/a/A.java", "")
      .write_file("/src/main/java/B.java", "")
      .write_file("/src/main/java/readme.txt", "")
      .write_file("/src/main/java/.java", "")
      .write_file_with_modified_time("/target/classes/B.class", "", time_at_secs(2_000_000))
      .build();
    assert_eq!(
      scan(&environment, true),
      vec![PathBuf::from("/src/main/java/B.java"), PathBuf::from("/src/main/java/a/A.java")]
    );
  }

  #[test]
  fn should_include_files_without_artifacts_when_stale_only() {
    let environment = TestEnvironmentBuilder::new()
      .write_file_with_modified_time("/src/main/java/A.java", "", time_at_secs(100))
      .write_file_with_modified_time("/src/main/java/B.java", "", time_at_secs(100))
      .write_file_with_modified_time("/target/classes/B.class", "", time_at_secs(200))
      .build();
    assert_eq!(scan(&environment, false), vec![PathBuf::from("/src/main/java/A.java")]);
    assert_eq!(
      environment.take_stdout_messages(),
      vec!["Found 1 uncompiled/modified file in /src/main/java to reformat.".to_string()]
    );
  }

  #[test]
  fn should_respect_stale_tolerance() {
    let environment = TestEnvironmentBuilder::new()
      .write_file_with_modified_time("/src/main/java/Within.java", "", time_at_secs(1000) + Duration::from_millis(500))
      .write_file_with_modified_time("/target/classes/Within.class", "", time_at_secs(1000))
      .write_file_with_modified_time("/src/main/java/Newer.java", "", time_at_secs(1002))
      .write_file_with_modified_time("/target/classes/Newer.class", "", time_at_secs(1000))
      .build();
    assert_eq!(scan(&environment, false), vec![PathBuf::from("/src/main/java/Newer.java")]);
  }

  #[test]
  fn should_be_stale_when_newer_than_any_artifact() {
    let environment = TestEnvironmentBuilder::new()
      .write_file_with_modified_time("/src/main/java/p/A.java", "", time_at_secs(1010))
      .write_file_with_modified_time("/target/classes/p/A.class", "", time_at_secs(2000))
      .write_file_with_modified_time("/target/classes/p/A.java", "", time_at_secs(1000))
      .build();
    assert_eq!(scan(&environment, false), vec![PathBuf::from("/src/main/java/p/A.java")]);
  }

  #[test]
  fn should_skip_missing_source_directory() {
    let environment = TestEnvironment::new();
    assert_eq!(scan(&environment, true), Vec::<PathBuf>::new());
    assert_eq!(
      environment.take_stdout_messages(),
      vec!["Directory /src/main/java does not exist, skipping file collection.".to_string()]
    );
  }

  #[test]
  fn should_not_follow_linked_directories() {
    let environment = TestEnvironmentBuilder::new()
      .write_file("/src/main/java/A.java", "")
      .write_file("/other/B.java", "")
      .add_symlink("/src/main/java/loop", "/src/main/java")
      .add_symlink("/src/main/java/Linked.java", "/other/B.java")
      .build();
    assert_eq!(
      scan(&environment, true),
      vec![PathBuf::from("/src/main/java/A.java"), PathBuf::from("/src/main/java/Linked.java")]
    );
  }

  #[test]
  fn should_fail_naming_the_root_when_a_directory_cannot_be_read() {
    let environment = TestEnvironmentBuilder::new()
      .write_file("/src/main/java/a/A.java", "")
      .add_failure("/src/main/java/a", TestFailure::ReadDir)
      .build();
    let err = scan_source_root(&environment, &main_root(), &options(true)).unwrap_err();
    assert_eq!(err.root, PathBuf::from("/src/main/java"));
    assert_eq!(
      err.to_string(),
      "Error scanning source path /src/main/java for files to reformat. Error reading directory /src/main/java/a: Permission denied"
    );
  }

  #[test]
  fn should_fail_when_a_modified_time_cannot_be_read() {
    let environment = TestEnvironmentBuilder::new()
      .write_file("/src/main/java/A.java", "")
      .add_failure("/src/main/java/A.java", TestFailure::ModifiedTime)
      .build();
    assert!(scan_source_root(&environment, &main_root(), &options(false)).is_err());
    // exhaustive scans don't look at modification times
    assert_eq!(scan(&environment, true), vec![PathBuf::from("/src/main/java/A.java")]);
  }
}
