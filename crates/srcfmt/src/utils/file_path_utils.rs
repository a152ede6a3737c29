use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

/// Resolves `.` and `..` components without touching the file system.
pub fn normalize_path(path: impl AsRef<Path>) -> PathBuf {
  let mut result = PathBuf::new();
  for component in path.as_ref().components() {
    match component {
      Component::CurDir => {}
      Component::ParentDir => {
        let can_pop = matches!(result.components().next_back(), Some(Component::Normal(_)));
        if can_pop {
          result.pop();
        } else if !result.has_root() {
          result.push("..");
        }
      }
      Component::Prefix(_) | Component::RootDir | Component::Normal(_) => result.push(component.as_os_str()),
    }
  }
  result
}

/// Resolves the path relative to the base when it isn't absolute.
pub fn resolve_path(base: &Path, path: impl AsRef<Path>) -> PathBuf {
  let path = path.as_ref();
  if path.is_absolute() {
    normalize_path(path)
  } else {
    normalize_path(base.join(path))
  }
}

#[cfg(test)]
mod test {
  use pretty_assertions::assert_eq;

  use super::*;

  #[test]
  fn should_normalize_paths() {
    assert_eq!(normalize_path("/a/./b/../c"), PathBuf::from("/a/c"));
    assert_eq!(normalize_path("/../a"), PathBuf::from("/a"));
    assert_eq!(normalize_path("a/../../b"), PathBuf::from("../b"));
    assert_eq!(normalize_path("/a/b/"), PathBuf::from("/a/b"));
  }

  #[test]
  fn should_resolve_paths() {
    assert_eq!(resolve_path(Path::new("/project"), "src/main/java"), PathBuf::from("/project/src/main/java"));
    assert_eq!(resolve_path(Path::new("/project"), "../other/src"), PathBuf::from("/other/src"));
    assert_eq!(resolve_path(Path::new("/project"), "/abs/src"), PathBuf::from("/abs/src"));
  }
}
