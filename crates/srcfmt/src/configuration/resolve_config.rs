use anyhow::anyhow;
use serde::Serialize;
use srcfmt_core::configuration::get_nullable_value;
use srcfmt_core::configuration::get_object_value;
use srcfmt_core::configuration::get_string_array_value;
use srcfmt_core::configuration::get_unknown_property_diagnostics;
use srcfmt_core::configuration::get_value;
use srcfmt_core::configuration::ConfigKeyMap;
use srcfmt_core::configuration::ConfigKeyValue;
use srcfmt_core::configuration::ConfigurationDiagnostic;
use srcfmt_core::options::take_format_options;
use srcfmt_core::options::FormatOptions;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use super::deserialize_config;
use crate::arg_parser::CliArgs;
use crate::arg_parser::ConfigOverrides;
use crate::environment::Environment;
use crate::scanner::ScanOptions;
use crate::scanner::SourceRoot;
use crate::scanner::SuffixMapping;
use crate::utils::resolve_path;

pub const CONFIG_FILE_NAMES: [&str; 4] = ["srcfmt.json", "srcfmt.jsonc", ".srcfmt.json", ".srcfmt.jsonc"];

pub const DEFAULT_STALE_MILLIS: u64 = 1024;
pub const DEFAULT_FORMAT_TIMEOUT_SECS: u64 = 30;

/// A problem with the configuration file, a configuration value
/// or the source control settings.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct ConfigurationError(#[from] anyhow::Error);

impl ConfigurationError {
  pub fn from_diagnostics(diagnostics: &[ConfigurationDiagnostic]) -> Self {
    let mut text = format!(
      "Had {} configuration diagnostic{}:",
      diagnostics.len(),
      if diagnostics.len() == 1 { "" } else { "s" }
    );
    for diagnostic in diagnostics {
      text.push_str("\n  ");
      text.push_str(&diagnostic.to_string());
    }
    ConfigurationError(anyhow!(text))
  }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScmConfig {
  pub connection: Option<String>,
  pub developer_connection: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedConfig {
  /// Path of the configuration file, if one was found.
  pub config_file: Option<PathBuf>,
  pub base_path: PathBuf,
  pub source_directory: PathBuf,
  pub output_directory: PathBuf,
  pub test_source_directory: PathBuf,
  pub test_output_directory: PathBuf,
  pub source_suffix: String,
  pub derived_suffixes: Vec<String>,
  pub include_stale: bool,
  pub stale_millis: u64,
  pub skip: bool,
  pub format_main: bool,
  pub format_test: bool,
  pub filter_modified: bool,
  pub packaging: Option<String>,
  pub scm: ScmConfig,
  pub format_timeout_secs: u64,
  pub fail_fast: bool,
  pub max_threads: Option<usize>,
  #[serde(flatten)]
  pub format_options: FormatOptions,
}

impl ResolvedConfig {
  pub fn is_pom_packaging(&self) -> bool {
    self.packaging.as_deref() == Some("pom")
  }

  /// Gets the enabled source roots, main before test.
  pub fn source_roots(&self) -> Vec<SourceRoot> {
    let mut roots = Vec::with_capacity(2);
    if self.format_main {
      roots.push(SourceRoot {
        source_dir: self.source_directory.clone(),
        derived_dir: self.output_directory.clone(),
      });
    }
    if self.format_test {
      roots.push(SourceRoot {
        source_dir: self.test_source_directory.clone(),
        derived_dir: self.test_output_directory.clone(),
      });
    }
    roots
  }

  pub fn scan_options(&self) -> ScanOptions {
    ScanOptions {
      include_stale: self.include_stale,
      stale_tolerance: Duration::from_millis(self.stale_millis),
      mapping: SuffixMapping {
        source_suffix: self.source_suffix.clone(),
        derived_suffixes: self.derived_suffixes.clone(),
      },
    }
  }
}

pub fn resolve_config_from_args<TEnvironment: Environment>(args: &CliArgs, environment: &TEnvironment) -> Result<ResolvedConfig, ConfigurationError> {
  let cwd = environment.cwd();
  let config_file = resolve_config_path(args.config.as_deref(), cwd.as_path(), environment)?;
  let (config_map, base_path) = match &config_file {
    Some(config_file) => {
      log_debug!(environment, "Resolving configuration file: {}", config_file.display());
      let config_text = environment
        .read_file(config_file)
        .map_err(|err| anyhow!("Error reading configuration file {}. {:#}", config_file.display(), err))?;
      let config_map = deserialize_config(&config_text).map_err(|err| anyhow!("Error parsing configuration file {}. {:#}", config_file.display(), err))?;
      let base_path = config_file.parent().map(|p| p.to_path_buf()).unwrap_or_else(|| cwd.clone().into_path_buf());
      (config_map, base_path)
    }
    None => {
      log_debug!(environment, "No configuration file found in {}. Using defaults.", cwd.display());
      (ConfigKeyMap::new(), cwd.into_path_buf())
    }
  };

  let mut config = resolve_config(config_map, &args.overrides, &base_path)?;
  config.config_file = config_file;
  Ok(config)
}

fn resolve_config_path<TEnvironment: Environment>(
  config_arg: Option<&str>,
  cwd: &Path,
  environment: &TEnvironment,
) -> Result<Option<PathBuf>, ConfigurationError> {
  if let Some(config_arg) = config_arg {
    let config_path = resolve_path(cwd, config_arg);
    if !environment.path_exists(&config_path) {
      return Err(anyhow!("Could not find configuration file at {}.", config_path.display()).into());
    }
    return Ok(Some(config_path));
  }

  Ok(
    CONFIG_FILE_NAMES
      .iter()
      .map(|file_name| cwd.join(file_name))
      .find(|file_path| environment.path_exists(file_path) && !environment.is_dir(file_path)),
  )
}

/// Resolves the configuration map along with the command line overrides.
/// Relative directories are resolved against the base path.
pub fn resolve_config(mut config: ConfigKeyMap, overrides: &ConfigOverrides, base_path: &Path) -> Result<ResolvedConfig, ConfigurationError> {
  apply_overrides(&mut config, overrides);

  let mut diagnostics = Vec::new();
  let format_options = take_format_options(&mut config, &mut diagnostics);
  let get_dir = |config: &mut ConfigKeyMap, key: &'static str, default_value: &str, diagnostics: &mut Vec<ConfigurationDiagnostic>| {
    let dir: PathBuf = get_value(config, key, PathBuf::from(default_value), diagnostics);
    resolve_path(base_path, dir)
  };
  let source_directory = get_dir(&mut config, "sourceDirectory", "src/main/java", &mut diagnostics);
  let output_directory = get_dir(&mut config, "outputDirectory", "target/classes", &mut diagnostics);
  let test_source_directory = get_dir(&mut config, "testSourceDirectory", "src/test/java", &mut diagnostics);
  let test_output_directory = get_dir(&mut config, "testOutputDirectory", "target/test-classes", &mut diagnostics);

  let source_suffix: String = get_value(&mut config, "sourceSuffix", ".java".to_string(), &mut diagnostics);
  if source_suffix.is_empty() {
    diagnostics.push(ConfigurationDiagnostic {
      property_name: "sourceSuffix".to_string(),
      message: "Expected 'sourceSuffix' to not be empty.".to_string(),
    });
  }
  let derived_suffixes =
    get_string_array_value(&mut config, "derivedSuffixes", &mut diagnostics).unwrap_or_else(|| vec![".java".to_string(), ".class".to_string()]);
  if derived_suffixes.is_empty() || derived_suffixes.iter().any(|suffix| suffix.is_empty()) {
    diagnostics.push(ConfigurationDiagnostic {
      property_name: "derivedSuffixes".to_string(),
      message: "Expected 'derivedSuffixes' to contain at least one suffix and no empty suffixes.".to_string(),
    });
  }

  let include_stale = get_value(&mut config, "includeStale", false, &mut diagnostics);
  let stale_millis = get_value(&mut config, "staleMillis", DEFAULT_STALE_MILLIS, &mut diagnostics);
  let skip = get_value(&mut config, "skip", false, &mut diagnostics);
  let format_main = get_value(&mut config, "formatMain", true, &mut diagnostics);
  let format_test = get_value(&mut config, "formatTest", true, &mut diagnostics);
  let filter_modified = get_value(&mut config, "filterModified", false, &mut diagnostics);
  let packaging = get_nullable_value::<String>(&mut config, "packaging", &mut diagnostics);
  let scm = take_scm_config(&mut config, &mut diagnostics);
  let format_timeout_secs = get_value(&mut config, "formatTimeoutSecs", DEFAULT_FORMAT_TIMEOUT_SECS, &mut diagnostics);
  if format_timeout_secs == 0 {
    diagnostics.push(ConfigurationDiagnostic {
      property_name: "formatTimeoutSecs".to_string(),
      message: "Expected 'formatTimeoutSecs' to be greater than zero.".to_string(),
    });
  }
  let fail_fast = get_value(&mut config, "failFast", false, &mut diagnostics);
  let max_threads = get_nullable_value::<usize>(&mut config, "maxThreads", &mut diagnostics);
  if max_threads == Some(0) {
    diagnostics.push(ConfigurationDiagnostic {
      property_name: "maxThreads".to_string(),
      message: "Expected 'maxThreads' to be greater than zero.".to_string(),
    });
  }

  diagnostics.extend(get_unknown_property_diagnostics(config));
  if !diagnostics.is_empty() {
    return Err(ConfigurationError::from_diagnostics(&diagnostics));
  }

  Ok(ResolvedConfig {
    config_file: None,
    base_path: base_path.to_path_buf(),
    source_directory,
    output_directory,
    test_source_directory,
    test_output_directory,
    source_suffix,
    derived_suffixes,
    include_stale,
    stale_millis,
    skip,
    format_main,
    format_test,
    filter_modified,
    packaging,
    scm,
    format_timeout_secs,
    fail_fast,
    max_threads,
    format_options,
  })
}

fn take_scm_config(config: &mut ConfigKeyMap, diagnostics: &mut Vec<ConfigurationDiagnostic>) -> ScmConfig {
  let Some(mut scm_config) = get_object_value(config, "scm", diagnostics) else {
    return ScmConfig::default();
  };
  let connection = get_nullable_value(&mut scm_config, "connection", diagnostics);
  let developer_connection = get_nullable_value(&mut scm_config, "developerConnection", diagnostics);
  for mut diagnostic in get_unknown_property_diagnostics(scm_config) {
    diagnostic.property_name = format!("scm.{}", diagnostic.property_name);
    diagnostics.push(diagnostic);
  }
  ScmConfig {
    connection,
    developer_connection,
  }
}

fn apply_overrides(config: &mut ConfigKeyMap, overrides: &ConfigOverrides) {
  let mut set_flag = |key: &str, is_set: bool, value: bool| {
    if is_set {
      config.insert(key.to_string(), ConfigKeyValue::from_bool(value));
    }
  };
  set_flag("includeStale", overrides.include_stale, true);
  set_flag("skip", overrides.skip, true);
  set_flag("formatMain", overrides.no_main, false);
  set_flag("formatTest", overrides.no_test, false);
  set_flag("filterModified", overrides.filter_modified, true);
  set_flag("fixImports", overrides.fix_imports, true);
  set_flag("failFast", overrides.fail_fast, true);

  if let Some(style) = &overrides.style {
    config.insert("style".to_string(), ConfigKeyValue::from_str(style));
  }
  if let Some(max_line_length) = &overrides.max_line_length {
    config.insert("maxLineLength".to_string(), ConfigKeyValue::from_str(max_line_length));
  }
  if let Some(timeout_secs) = &overrides.timeout_secs {
    config.insert("formatTimeoutSecs".to_string(), ConfigKeyValue::from_str(timeout_secs));
  }
}
