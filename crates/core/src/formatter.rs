use std::borrow::Cow;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;

use crate::options::FormatOptions;

/// A problem found while formatting a file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatDiagnostic {
  pub file_path: Option<PathBuf>,
  pub message: String,
  /// 1-based line number.
  pub line: Option<usize>,
  /// 1-based column number.
  pub column: Option<usize>,
}

impl FormatDiagnostic {
  pub fn new(message: impl Into<String>) -> Self {
    FormatDiagnostic {
      file_path: None,
      message: message.into(),
      line: None,
      column: None,
    }
  }

  pub fn at(line: usize, column: usize, message: impl Into<String>) -> Self {
    FormatDiagnostic {
      file_path: None,
      message: message.into(),
      line: Some(line),
      column: Some(column),
    }
  }

  pub fn with_file_path(mut self, file_path: &Path) -> Self {
    if self.file_path.is_none() {
      self.file_path = Some(file_path.to_path_buf());
    }
    self
  }
}

impl std::fmt::Display for FormatDiagnostic {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    if let Some(file_path) = &self.file_path {
      write!(f, "{}:", file_path.display())?;
    }
    if let Some(line) = self.line {
      write!(f, "{}:", line)?;
      if let Some(column) = self.column {
        write!(f, "{}:", column)?;
      }
    }
    if self.file_path.is_some() || self.line.is_some() {
      f.write_str(" ")?;
    }
    write!(f, "error: {}", self.message)
  }
}

/// `Ok(Some(text))` - The formatted text, which may equal the input.
/// `Ok(None)` - No changes.
/// `Err(diagnostics)` - The file could not be formatted.
pub type FormatResult = Result<Option<String>, Vec<FormatDiagnostic>>;

/// A formatting routine. Implementations must be deterministic and
/// must not depend on any state other than their inputs.
pub trait Formatter: Send + Sync {
  fn name(&self) -> &str;
  fn format_text(&self, file_path: &Path, file_text: &str, options: &FormatOptions) -> FormatResult;
}

/// The outcome of running a formatter over one file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransformResult {
  Unchanged,
  Changed(String),
  Failed(Vec<FormatDiagnostic>),
}

/// Wraps a [`Formatter`] and maps its output to a [`TransformResult`].
#[derive(Clone)]
pub struct FormattingEngine {
  formatter: Arc<dyn Formatter>,
}

impl FormattingEngine {
  pub fn new(formatter: Arc<dyn Formatter>) -> Self {
    FormattingEngine { formatter }
  }

  pub fn formatter_name(&self) -> &str {
    self.formatter.name()
  }

  pub fn format(&self, file_path: &Path, content: &str, options: &FormatOptions, fix_imports: bool) -> TransformResult {
    let options = if options.fix_imports == fix_imports {
      Cow::Borrowed(options)
    } else {
      Cow::Owned(options.with_fix_imports(fix_imports))
    };
    match self.formatter.format_text(file_path, content, &options) {
      Ok(None) => TransformResult::Unchanged,
      Ok(Some(text)) => TransformResult::Changed(text),
      Err(diagnostics) => {
        let mut diagnostics = diagnostics.into_iter().map(|d| d.with_file_path(file_path)).collect::<Vec<_>>();
        if diagnostics.is_empty() {
          diagnostics.push(FormatDiagnostic::new(format!("The {} formatter failed without a message.", self.formatter.name())).with_file_path(file_path));
        }
        TransformResult::Failed(diagnostics)
      }
    }
  }
}
