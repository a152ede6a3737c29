use indexmap::IndexMap;
use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseConfigurationError(pub String);

impl std::fmt::Display for ParseConfigurationError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    format!("Found invalid value '{}'.", self.0).fmt(f)
  }
}

#[macro_export]
macro_rules! generate_str_to_from {
  ($enum_name:ident, $([$member_name:ident, $string_value:expr]),* ) => {
    impl std::str::FromStr for $enum_name {
      type Err = $crate::configuration::ParseConfigurationError;

      fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
          $($string_value => Ok($enum_name::$member_name)),*,
          _ => Err($crate::configuration::ParseConfigurationError(String::from(s))),
        }
      }
    }

    impl std::fmt::Display for $enum_name {
      fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
          $($enum_name::$member_name => $string_value),*,
        };
        f.write_str(text)
      }
    }
  };
}

/// A value found in a configuration file or provided on the command line.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigKeyValue {
  String(String),
  Number(i32),
  Bool(bool),
  Array(Vec<ConfigKeyValue>),
  Object(ConfigKeyMap),
  Null,
}

impl ConfigKeyValue {
  pub fn from_i32(value: i32) -> ConfigKeyValue {
    ConfigKeyValue::Number(value)
  }

  #[allow(clippy::should_implement_trait)]
  pub fn from_str(value: &str) -> ConfigKeyValue {
    ConfigKeyValue::String(value.to_string())
  }

  pub fn from_bool(value: bool) -> ConfigKeyValue {
    ConfigKeyValue::Bool(value)
  }

  /// Gets the text of a scalar value. Arrays, objects and null have no text.
  pub fn as_scalar_text(&self) -> Option<String> {
    match self {
      ConfigKeyValue::String(value) => Some(value.clone()),
      ConfigKeyValue::Number(value) => Some(value.to_string()),
      ConfigKeyValue::Bool(value) => Some(value.to_string()),
      ConfigKeyValue::Array(_) | ConfigKeyValue::Object(_) | ConfigKeyValue::Null => None,
    }
  }
}

pub type ConfigKeyMap = IndexMap<String, ConfigKeyValue>;

/// Represents a problem within the configuration.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationDiagnostic {
  /// The property name the problem occurred on.
  pub property_name: String,
  /// The diagnostic message that should be displayed to the user
  pub message: String,
}

impl std::fmt::Display for ConfigurationDiagnostic {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{} ({})", self.message, self.property_name)
  }
}

#[derive(Clone, Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ResolveConfigurationResult<T>
where
  T: Clone + Serialize,
{
  /// The configuration diagnostics.
  pub diagnostics: Vec<ConfigurationDiagnostic>,

  /// The configuration derived from the unresolved configuration
  /// that can be used to format a file.
  pub config: T,
}

/// If the provided key exists, takes its value from the provided config and returns it.
/// If the provided key does not exist, it returns the default value.
/// Adds a diagnostic if there is any problem deserializing the value.
pub fn get_value<T>(config: &mut ConfigKeyMap, key: &'static str, default_value: T, diagnostics: &mut Vec<ConfigurationDiagnostic>) -> T
where
  T: std::str::FromStr,
  <T as std::str::FromStr>::Err: std::fmt::Display,
{
  get_nullable_value(config, key, diagnostics).unwrap_or(default_value)
}

/// If the provided key exists, takes its value from the provided config and returns it.
/// Otherwise returns `None`.
pub fn get_nullable_value<T>(config: &mut ConfigKeyMap, key: &'static str, diagnostics: &mut Vec<ConfigurationDiagnostic>) -> Option<T>
where
  T: std::str::FromStr,
  <T as std::str::FromStr>::Err: std::fmt::Display,
{
  let raw_value = config.shift_remove(key)?;
  let text = match raw_value.as_scalar_text() {
    Some(text) => text,
    None if raw_value == ConfigKeyValue::Null => return None,
    None => {
      diagnostics.push(ConfigurationDiagnostic {
        property_name: key.to_string(),
        message: format!("Expected a string, number, or boolean value for '{}'.", key),
      });
      return None;
    }
  };
  if text.trim().is_empty() {
    return None;
  }
  match text.parse::<T>() {
    Ok(value) => Some(value),
    Err(message) => {
      diagnostics.push(ConfigurationDiagnostic {
        property_name: key.to_string(),
        message: format!("Error parsing configuration value for '{}'. Message: {}", key, message),
      });
      None
    }
  }
}

/// Takes an array of strings out of the configuration.
pub fn get_string_array_value(config: &mut ConfigKeyMap, key: &'static str, diagnostics: &mut Vec<ConfigurationDiagnostic>) -> Option<Vec<String>> {
  match config.shift_remove(key)? {
    ConfigKeyValue::Array(values) => {
      let mut result = Vec::with_capacity(values.len());
      for value in values {
        match value {
          ConfigKeyValue::String(text) => result.push(text),
          _ => {
            diagnostics.push(ConfigurationDiagnostic {
              property_name: key.to_string(),
              message: format!("Expected only strings in the '{}' array.", key),
            });
            return None;
          }
        }
      }
      Some(result)
    }
    ConfigKeyValue::Null => None,
    _ => {
      diagnostics.push(ConfigurationDiagnostic {
        property_name: key.to_string(),
        message: format!("Expected an array for '{}'.", key),
      });
      None
    }
  }
}

/// Takes a nested object out of the configuration.
pub fn get_object_value(config: &mut ConfigKeyMap, key: &'static str, diagnostics: &mut Vec<ConfigurationDiagnostic>) -> Option<ConfigKeyMap> {
  match config.shift_remove(key)? {
    ConfigKeyValue::Object(map) => Some(map),
    ConfigKeyValue::Null => None,
    _ => {
      diagnostics.push(ConfigurationDiagnostic {
        property_name: key.to_string(),
        message: format!("Expected an object for '{}'.", key),
      });
      None
    }
  }
}

/// Gets a diagnostic for each remaining key value pair in the hash map.
///
/// This should be done last, so it swallows the hashmap.
pub fn get_unknown_property_diagnostics(config: ConfigKeyMap) -> Vec<ConfigurationDiagnostic> {
  let mut diagnostics = Vec::new();
  for (key, _) in config.into_iter() {
    diagnostics.push(ConfigurationDiagnostic {
      message: format!("Unknown property in configuration: {}", key),
      property_name: key,
    });
  }
  diagnostics
}

#[cfg(test)]
mod test {
  use pretty_assertions::assert_eq;

  use super::*;

  #[test]
  fn get_value_should_take_value_and_parse() {
    let mut config = ConfigKeyMap::new();
    config.insert("lineWidth".to_string(), ConfigKeyValue::from_i32(40));
    config.insert("other".to_string(), ConfigKeyValue::from_bool(true));
    let mut diagnostics = Vec::new();
    let value: u32 = get_value(&mut config, "lineWidth", 100, &mut diagnostics);
    assert_eq!(value, 40);
    assert!(diagnostics.is_empty());
    assert_eq!(config.len(), 1);
    assert_eq!(get_unknown_property_diagnostics(config).len(), 1);
  }

  #[test]
  fn get_value_should_use_default_and_add_diagnostic_on_invalid_value() {
    let mut config = ConfigKeyMap::new();
    config.insert("lineWidth".to_string(), ConfigKeyValue::from_str("wide"));
    let mut diagnostics = Vec::new();
    let value: u32 = get_value(&mut config, "lineWidth", 100, &mut diagnostics);
    assert_eq!(value, 100);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].property_name, "lineWidth");
  }

  #[test]
  fn get_value_should_treat_null_as_missing() {
    let mut config = ConfigKeyMap::new();
    config.insert("skip".to_string(), ConfigKeyValue::Null);
    let mut diagnostics = Vec::new();
    assert!(get_value(&mut config, "skip", true, &mut diagnostics));
    assert!(diagnostics.is_empty());
  }

  #[test]
  fn get_string_array_value_should_reject_non_strings() {
    let mut config = ConfigKeyMap::new();
    config.insert(
      "suffixes".to_string(),
      ConfigKeyValue::Array(vec![ConfigKeyValue::from_str(".java"), ConfigKeyValue::from_i32(1)]),
    );
    let mut diagnostics = Vec::new();
    assert_eq!(get_string_array_value(&mut config, "suffixes", &mut diagnostics), None);
    assert_eq!(diagnostics.len(), 1);
  }
}
