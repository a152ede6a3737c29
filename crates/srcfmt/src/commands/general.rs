use anyhow::bail;
use anyhow::Result;

use crate::arg_parser::CliArgs;
use crate::configuration::resolve_config_from_args;
use crate::environment::Environment;
use crate::utils::resolve_path;

pub fn output_version<TEnvironment: Environment>(environment: &TEnvironment) -> Result<()> {
  environment.log(&format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")));

  Ok(())
}

pub fn output_help<TEnvironment: Environment>(environment: &TEnvironment, help_text: &str) -> Result<()> {
  environment.log(help_text);

  Ok(())
}

pub fn output_resolved_config<TEnvironment: Environment>(args: &CliArgs, environment: &TEnvironment) -> Result<()> {
  let config = resolve_config_from_args(args, environment)?;
  environment.log_machine_readable(&serde_json::to_string_pretty(&config)?);

  Ok(())
}

pub fn init_config_file<TEnvironment: Environment>(environment: &TEnvironment, config_arg: &Option<String>) -> Result<()> {
  let cwd = environment.cwd();
  let config_file_path = match config_arg {
    Some(config_arg) => resolve_path(cwd.as_path(), config_arg),
    None => cwd.join("srcfmt.json"),
  };
  if environment.path_exists(&config_file_path) {
    bail!("Configuration file '{}' already exists.", config_file_path.display());
  }
  environment.write_file(&config_file_path, get_init_config_file_text())?;
  environment.log_stderr(&format!("\nCreated {}", config_file_path.display()));
  Ok(())
}

pub fn get_init_config_file_text() -> &'static str {
  r#"{
  "sourceDirectory": "src/main/java",
  "testSourceDirectory": "src/test/java",
  "outputDirectory": "target/classes",
  "testOutputDirectory": "target/test-classes",
  "style": "google",
  "includeStale": false,
  "filterModified": false
}
"#
}

#[cfg(test)]
mod test {
  use pretty_assertions::assert_eq;

  use super::get_init_config_file_text;
  use crate::environment::Environment;
  use crate::environment::TestEnvironment;
  use crate::environment::TestEnvironmentBuilder;
  use crate::test_helpers::get_expected_help_text;
  use crate::test_helpers::run_test_cli;

  #[test]
  fn should_output_version() {
    for flag in ["-v", "--version", "version"] {
      let environment = TestEnvironment::new();
      run_test_cli(vec![flag], &environment).unwrap();
      assert_eq!(environment.take_stdout_messages(), vec![format!("srcfmt {}", env!("CARGO_PKG_VERSION"))]);
    }
  }

  #[test]
  fn should_output_help() {
    let environment = TestEnvironment::new();
    run_test_cli(vec!["--help"], &environment).unwrap();
    assert_eq!(environment.take_stdout_messages(), vec![get_expected_help_text()]);
  }

  #[test]
  fn should_output_help_no_sub_commands() {
    let environment = TestEnvironment::new();
    run_test_cli(vec![], &environment).unwrap();
    assert_eq!(environment.take_stdout_messages(), vec![get_expected_help_text()]);
  }

  #[test]
  fn should_initialize_config_file() {
    let environment = TestEnvironment::new();
    run_test_cli(vec!["init"], &environment).unwrap();
    assert_eq!(environment.take_stderr_messages(), vec!["\nCreated /srcfmt.json"]);
    assert_eq!(environment.read_file("/srcfmt.json").unwrap(), get_init_config_file_text());

    // the created file resolves without diagnostics
    run_test_cli(vec!["output-resolved-config"], &environment).unwrap();
  }

  #[test]
  fn should_error_when_config_file_exists() {
    let environment = TestEnvironmentBuilder::new().with_default_config(|_| {}).build();
    let err = run_test_cli(vec!["init"], &environment).unwrap_err();
    assert_eq!(err.to_string(), "Configuration file '/srcfmt.json' already exists.");
  }

  #[test]
  fn should_output_resolved_config() {
    let environment = TestEnvironmentBuilder::new()
      .with_default_config(|c| {
        c.set("style", r#""aosp""#).set_scm_connection("scm:git:https://example.com/repo.git");
      })
      .build();
    run_test_cli(vec!["output-resolved-config", "--max-line-length", "80"], &environment).unwrap();
    let messages = environment.take_stdout_messages();
    assert_eq!(messages.len(), 1);
    let value: serde_json::Value = serde_json::from_str(&messages[0]).unwrap();
    assert_eq!(value["configFile"], "/srcfmt.json");
    assert_eq!(value["sourceDirectory"], "/src/main/java");
    assert_eq!(value["style"], "aosp");
    assert_eq!(value["maxLineLength"], 80);
    assert_eq!(value["scm"]["connection"], "scm:git:https://example.com/repo.git");
    assert_eq!(value["scm"]["developerConnection"], serde_json::Value::Null);
  }
}
