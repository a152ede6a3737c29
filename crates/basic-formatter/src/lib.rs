mod imports;
mod printer;
mod tokens;

use std::path::Path;

use srcfmt_core::formatter::FormatDiagnostic;
use srcfmt_core::formatter::FormatResult;
use srcfmt_core::formatter::Formatter;
use srcfmt_core::options::FormatOptions;

/// Formats brace-and-semicolon source files (ex. Java) by normalising
/// whitespace and indentation. Output is deterministic and idempotent.
#[derive(Debug, Default, Clone, Copy)]
pub struct BasicFormatter;

impl Formatter for BasicFormatter {
  fn name(&self) -> &str {
    "basic"
  }

  fn format_text(&self, _file_path: &Path, file_text: &str, options: &FormatOptions) -> FormatResult {
    format_text(file_text, options).map(Some)
  }
}

pub fn format_text(file_text: &str, options: &FormatOptions) -> Result<String, Vec<FormatDiagnostic>> {
  let file_text = file_text.replace("\r\n", "\n");
  let tokens = tokens::tokenize(&file_text).map_err(|d| vec![d])?;
  if options.fix_imports {
    if let Some(fixed_text) = imports::fix_imports(&file_text, &tokens, options.import_sort_mode).map_err(|d| vec![d])? {
      let tokens = tokens::tokenize(&fixed_text).map_err(|d| vec![d])?;
      return Ok(printer::print(&tokens, options));
    }
  }
  Ok(printer::print(&tokens, options))
}
