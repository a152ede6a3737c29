use serde::Deserialize;
use serde::Serialize;

use crate::configuration::get_unknown_property_diagnostics;
use crate::configuration::get_value;
use crate::configuration::ConfigKeyMap;
use crate::configuration::ConfigurationDiagnostic;
use crate::configuration::ResolveConfigurationResult;
use crate::generate_str_to_from;

/// The style profile to format with.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum Style {
  /// Two space indentation.
  #[serde(rename = "google")]
  Google,
  /// Four space indentation, as used by the Android Open Source Project.
  #[serde(rename = "aosp")]
  Aosp,
}

generate_str_to_from![Style, [Google, "google"], [Aosp, "aosp"]];

impl Style {
  pub fn indent_width(&self) -> usize {
    match self {
      Style::Google => 2,
      Style::Aosp => 4,
    }
  }
}

/// How imports are ordered when they are fixed.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum ImportSortMode {
  /// Static imports in their own block before all other imports.
  #[serde(rename = "staticFirst")]
  StaticFirst,
  /// Static imports in their own block after all other imports.
  #[serde(rename = "staticLast")]
  StaticLast,
  /// A single block sorted by the imported name.
  #[serde(rename = "lexicographic")]
  Lexicographic,
}

generate_str_to_from![
  ImportSortMode,
  [StaticFirst, "staticFirst"],
  [StaticLast, "staticLast"],
  [Lexicographic, "lexicographic"]
];

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum JavadocMode {
  /// Re-indents doc comment lines and gives each a leading asterisk.
  #[serde(rename = "format")]
  Format,
  /// Leaves doc comment text as written.
  #[serde(rename = "preserve")]
  Preserve,
}

generate_str_to_from![JavadocMode, [Format, "format"], [Preserve, "preserve"]];

pub const DEFAULT_MAX_LINE_LENGTH: u32 = 100;

/// Options understood by a formatter. Every field has a default.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatOptions {
  pub style: Style,
  pub max_line_length: u32,
  pub import_sort_mode: ImportSortMode,
  pub javadoc_mode: JavadocMode,
  pub fix_imports: bool,
}

impl Default for FormatOptions {
  fn default() -> Self {
    FormatOptions {
      style: Style::Google,
      max_line_length: DEFAULT_MAX_LINE_LENGTH,
      import_sort_mode: ImportSortMode::StaticFirst,
      javadoc_mode: JavadocMode::Format,
      fix_imports: false,
    }
  }
}

impl FormatOptions {
  /// Gets a copy of these options with a different import fixing setting.
  pub fn with_fix_imports(&self, fix_imports: bool) -> FormatOptions {
    FormatOptions { fix_imports, ..self.clone() }
  }
}

/// Takes the format option properties out of the provided configuration,
/// leaving any other properties for the caller to resolve.
pub fn take_format_options(config: &mut ConfigKeyMap, diagnostics: &mut Vec<ConfigurationDiagnostic>) -> FormatOptions {
  let defaults = FormatOptions::default();
  let max_line_length = get_value(config, "maxLineLength", defaults.max_line_length, diagnostics);
  let max_line_length = if max_line_length == 0 {
    diagnostics.push(ConfigurationDiagnostic {
      property_name: "maxLineLength".to_string(),
      message: "Expected 'maxLineLength' to be a positive number.".to_string(),
    });
    defaults.max_line_length
  } else {
    max_line_length
  };

  FormatOptions {
    style: get_value(config, "style", defaults.style, diagnostics),
    max_line_length,
    import_sort_mode: get_value(config, "importSortMode", defaults.import_sort_mode, diagnostics),
    javadoc_mode: get_value(config, "javadocMode", defaults.javadoc_mode, diagnostics),
    fix_imports: get_value(config, "fixImports", defaults.fix_imports, diagnostics),
  }
}

/// Resolves format options from a collection of key value pairs,
/// reporting any properties that are not format options.
pub fn resolve_format_options(config: ConfigKeyMap) -> ResolveConfigurationResult<FormatOptions> {
  let mut config = config;
  let mut diagnostics = Vec::new();
  let options = take_format_options(&mut config, &mut diagnostics);
  diagnostics.extend(get_unknown_property_diagnostics(config));

  ResolveConfigurationResult { config: options, diagnostics }
}
