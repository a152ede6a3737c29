use anyhow::bail;
use anyhow::Context;
use anyhow::Result;
use std::path::Path;
use std::path::PathBuf;
use std::process::Command;

use super::RepositoryHandle;
use super::ScmConnection;
use super::VcsClient;

/// Queries a git working tree with the `git` executable found on the path.
#[derive(Debug, Default, Clone, Copy)]
pub struct GitVcsClient;

impl VcsClient for GitVcsClient {
  fn supported_providers(&self) -> &[&str] {
    &["git"]
  }

  fn resolve_repository(&self, connection: &ScmConnection, base_dir: &Path) -> Result<RepositoryHandle> {
    let output = run_git(base_dir, &["rev-parse", "--show-toplevel"])?;
    let root = String::from_utf8(output).context("The git repository root was not valid UTF-8.")?;
    Ok(RepositoryHandle {
      provider: connection.provider.clone(),
      root: PathBuf::from(root.trim_end_matches(['\r', '\n'])),
    })
  }

  fn status(&self, _repository: &RepositoryHandle, working_tree_root: &Path) -> Result<Vec<PathBuf>> {
    let output = run_git(working_tree_root, &["status", "--porcelain=v1", "-z", "--untracked-files=all"])?;
    Ok(parse_porcelain_status(&output))
  }
}

fn run_git(dir: &Path, args: &[&str]) -> Result<Vec<u8>> {
  let git_path = which::which("git").context("Could not find the git executable on the path.")?;
  let output = Command::new(git_path)
    .args(args)
    .current_dir(dir)
    .output()
    .with_context(|| format!("Error running `git {}` in {}.", args.join(" "), dir.display()))?;
  if !output.status.success() {
    bail!(
      "`git {}` failed in {}. {}",
      args.join(" "),
      dir.display(),
      String::from_utf8_lossy(&output.stderr).trim()
    );
  }
  Ok(output.stdout)
}

/// Parses the output of `git status --porcelain=v1 -z`.
///
/// Renamed and copied entries only contribute their destination path.
pub fn parse_porcelain_status(output: &[u8]) -> Vec<PathBuf> {
  let text = String::from_utf8_lossy(output);
  let mut entries = text.split('\0').filter(|entry| !entry.is_empty());
  let mut paths = Vec::new();
  while let Some(entry) = entries.next() {
    // "XY path"
    if entry.len() < 4 || !entry.is_char_boundary(3) {
      continue;
    }
    let status = &entry[..2];
    let path = &entry[3..];
    if status.contains('R') || status.contains('C') {
      // the next entry is the source path
      entries.next();
    }
    if status == "!!" {
      continue;
    }
    paths.push(PathBuf::from(path));
  }
  paths
}

#[cfg(test)]
mod test {
  use pretty_assertions::assert_eq;

  use super::*;

  #[test]
  fn should_parse_status_entries() {
    let output = b" M src/main/java/A.java\0?? src/main/java/New.java\0R  src/main/java/To.java\0src/main/java/From.java\0D  src/main/java/Gone.java\0!! target/x.class\0";
    assert_eq!(
      parse_porcelain_status(output),
      vec![
        PathBuf::from("src/main/java/A.java"),
        PathBuf::from("src/main/java/New.java"),
        PathBuf::from("src/main/java/To.java"),
        PathBuf::from("src/main/java/Gone.java"),
      ]
    );
  }

  #[test]
  fn should_parse_empty_status() {
    assert_eq!(parse_porcelain_status(b""), Vec::<PathBuf>::new());
  }

  #[test]
  fn should_read_status_of_real_repository() {
    if which::which("git").is_err() {
      return;
    }
    let temp_dir = tempfile::tempdir().unwrap();
    let repo_dir = dunce::canonicalize(temp_dir.path()).unwrap();
    run_git(&repo_dir, &["init", "--quiet"]).unwrap();
    std::fs::create_dir_all(repo_dir.join("src")).unwrap();
    std::fs::write(repo_dir.join("src/A.java"), "class A {}\n").unwrap();

    let client = GitVcsClient;
    let connection = ScmConnection::parse("scm:git:https://example.com/repo.git").unwrap();
    let repository = client.resolve_repository(&connection, &repo_dir.join("src")).unwrap();
    assert_eq!(dunce::canonicalize(&repository.root).unwrap(), repo_dir);
    assert_eq!(client.status(&repository, &repository.root).unwrap(), vec![PathBuf::from("src/A.java")]);
  }
}
