use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
  Debug,
  Info,
  Warn,
  Error,
  Silent,
}

impl LogLevel {
  pub const VALUES: [&'static str; 5] = ["debug", "info", "warn", "error", "silent"];
}

impl FromStr for LogLevel {
  type Err = anyhow::Error;

  fn from_str(text: &str) -> Result<Self, Self::Err> {
    match text {
      "debug" => Ok(LogLevel::Debug),
      "info" => Ok(LogLevel::Info),
      "warn" => Ok(LogLevel::Warn),
      "error" => Ok(LogLevel::Error),
      "silent" => Ok(LogLevel::Silent),
      _ => anyhow::bail!("Unknown log level '{}'. Expected one of: {}", text, LogLevel::VALUES.join(", ")),
    }
  }
}

#[cfg(test)]
mod test {
  use pretty_assertions::assert_eq;

  use super::*;

  #[test]
  fn should_parse_log_levels_in_order() {
    let levels = LogLevel::VALUES.iter().map(|value| value.parse::<LogLevel>().unwrap()).collect::<Vec<_>>();
    let mut sorted = levels.clone();
    sorted.sort();
    assert_eq!(levels, sorted);
    assert_eq!(
      "verbose".parse::<LogLevel>().unwrap_err().to_string(),
      "Unknown log level 'verbose'. Expected one of: debug, info, warn, error, silent"
    );
  }
}
