mod git;

pub use git::*;

use anyhow::bail;
use anyhow::Result;
use std::collections::HashSet;
use std::path::Path;
use std::path::PathBuf;

use crate::configuration::ConfigurationError;
use crate::configuration::ScmConfig;
use crate::environment::Environment;
use crate::utils::normalize_path;

/// A Maven style source control identifier (ex. `scm:git:https://example.com/repo.git`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScmConnection {
  pub provider: String,
  pub url: String,
}

impl ScmConnection {
  pub fn parse(text: &str) -> Result<ScmConnection> {
    let Some(rest) = text.strip_prefix("scm:") else {
      bail!("The SCM connection '{}' must start with 'scm:'.", text);
    };
    // the delimiter after the provider may be a colon or a pipe
    let Some(delimiter_index) = rest.find([':', '|']) else {
      bail!("The SCM connection '{}' is missing a provider.", text);
    };
    let provider = &rest[..delimiter_index];
    let url = &rest[delimiter_index + 1..];
    if provider.is_empty() || url.is_empty() {
      bail!("The SCM connection '{}' must be in the format scm:<provider>:<url>.", text);
    }
    Ok(ScmConnection {
      provider: provider.to_string(),
      url: url.to_string(),
    })
  }
}

/// Selects the first of the connection and developer connection that is set.
pub fn select_scm_connection(scm: &ScmConfig) -> Result<ScmConnection, ConfigurationError> {
  let connection = [&scm.connection, &scm.developer_connection]
    .into_iter()
    .flatten()
    .find(|connection| !connection.trim().is_empty());
  let Some(connection) = connection else {
    return Err(
      anyhow::anyhow!(
        "You must supply at least one of scm.connection or scm.developerConnection in the configuration file when filterModified is enabled."
      )
      .into(),
    );
  };
  Ok(ScmConnection::parse(connection.trim())?)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryHandle {
  pub provider: String,
  /// Root of the working tree.
  pub root: PathBuf,
}

pub trait VcsClient: Send + Sync {
  fn supported_providers(&self) -> &[&str];
  fn resolve_repository(&self, connection: &ScmConnection, base_dir: &Path) -> Result<RepositoryHandle>;
  /// Gets the changed paths of the working tree relative to its root.
  fn status(&self, repository: &RepositoryHandle, working_tree_root: &Path) -> Result<Vec<PathBuf>>;
}

/// Ensures the client can handle the connection's provider.
pub fn ensure_supported_provider(vcs_client: &dyn VcsClient, connection: &ScmConnection) -> Result<(), ConfigurationError> {
  let providers = vcs_client.supported_providers();
  if providers.contains(&connection.provider.as_str()) {
    Ok(())
  } else {
    Err(
      anyhow::anyhow!(
        "Unsupported SCM provider '{}'. Supported providers: {}",
        connection.provider,
        providers.join(", ")
      )
      .into(),
    )
  }
}

/// The absolute paths the source control system reports as changed.
#[derive(Debug, Clone, Default)]
pub struct ChangedFileSet {
  paths: HashSet<PathBuf>,
}

impl ChangedFileSet {
  pub fn new(working_tree_root: &Path, relative_paths: impl IntoIterator<Item = PathBuf>) -> Self {
    ChangedFileSet {
      paths: relative_paths.into_iter().map(|path| normalize_path(working_tree_root.join(path))).collect(),
    }
  }

  pub fn len(&self) -> usize {
    self.paths.len()
  }

  pub fn contains(&self, file_path: &Path) -> bool {
    self.paths.contains(&normalize_path(file_path))
  }
}

/// Keeps the candidates that were changed, preserving their order.
///
/// Candidates are matched by the canonical path of their directory so that a
/// candidate found through a linked directory still matches.
pub fn filter_modified<TEnvironment: Environment>(environment: &TEnvironment, candidates: Vec<PathBuf>, changed_files: &ChangedFileSet) -> Vec<PathBuf> {
  candidates
    .into_iter()
    .filter(|file_path| changed_files.contains(&get_path_in_canonical_dir(environment, file_path)))
    .collect()
}

/// Canonicalizes the parent directory only. A linked file is tracked by the
/// source control system under its own path.
fn get_path_in_canonical_dir<TEnvironment: Environment>(environment: &TEnvironment, file_path: &Path) -> PathBuf {
  let (Some(parent), Some(file_name)) = (file_path.parent(), file_path.file_name()) else {
    return file_path.to_path_buf();
  };
  match environment.canonicalize(parent) {
    Ok(parent) => parent.join(file_name),
    Err(err) => {
      log_debug!(environment, "Could not canonicalize {}. {:#}", parent.display(), err);
      file_path.to_path_buf()
    }
  }
}
