use anyhow::bail;
use anyhow::Result;
use clap::ArgMatches;
use thiserror::Error;

use crate::utils::LogLevel;

pub struct CliArgs {
  pub sub_command: SubCommand,
  pub log_level: LogLevel,
  pub config: Option<String>,
  pub overrides: ConfigOverrides,
}

impl CliArgs {
  pub fn is_stdout_machine_readable(&self) -> bool {
    // these output text that's read from stdout
    matches!(self.sub_command, SubCommand::OutputFilePaths | SubCommand::OutputResolvedConfig)
  }

  fn new_with_sub_command(sub_command: SubCommand) -> CliArgs {
    CliArgs {
      sub_command,
      log_level: LogLevel::Info,
      config: None,
      overrides: Default::default(),
    }
  }
}

#[derive(Debug, PartialEq, Eq)]
pub enum SubCommand {
  Check(CheckSubCommand),
  Fmt(FmtSubCommand),
  Init,
  OutputFilePaths,
  OutputResolvedConfig,
  Version,
  Help(String),
}

#[derive(Debug, PartialEq, Eq)]
pub struct CheckSubCommand {
  pub diff: bool,
}

#[derive(Debug, PartialEq, Eq)]
pub struct FmtSubCommand {
  pub diff: bool,
}

/// Command line values that take precedence over the configuration file.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigOverrides {
  pub include_stale: bool,
  pub style: Option<String>,
  pub skip: bool,
  pub no_main: bool,
  pub no_test: bool,
  pub filter_modified: bool,
  pub fix_imports: bool,
  pub max_line_length: Option<String>,
  pub fail_fast: bool,
  pub timeout_secs: Option<String>,
}

#[derive(Debug, Error)]
#[error(transparent)]
pub struct ParseArgsError(#[from] anyhow::Error);

pub fn parse_args(args: Vec<String>) -> Result<CliArgs, ParseArgsError> {
  inner_parse_args(args).map_err(ParseArgsError)
}

fn inner_parse_args(args: Vec<String>) -> Result<CliArgs> {
  // clap's default help output isn't laid out the way this should be
  if args.len() == 1 || (args.len() == 2 && (args[1] == "help" || args[1] == "--help")) {
    let mut cli_parser = create_cli_parser(CliArgParserKind::ForOutputtingMainHelp);
    cli_parser.try_get_matches_from_mut(vec![""])?;
    let help_text = format!("{}", cli_parser.render_help());
    return Ok(CliArgs::new_with_sub_command(SubCommand::Help(help_text)));
  } else if args.len() == 2 && (args[1] == "-v" || args[1] == "-V" || args[1] == "--version") {
    return Ok(CliArgs::new_with_sub_command(SubCommand::Version));
  }

  let cli_parser = create_cli_parser(CliArgParserKind::Default);
  let matches = cli_parser.try_get_matches_from(&args)?;

  let Some((sub_command_name, sub_matches)) = matches.subcommand() else {
    bail!("A subcommand is required.");
  };
  let sub_command = match sub_command_name {
    "fmt" => SubCommand::Fmt(FmtSubCommand {
      diff: sub_matches.get_flag("diff"),
    }),
    "check" => SubCommand::Check(CheckSubCommand {
      diff: sub_matches.get_flag("diff"),
    }),
    "init" => SubCommand::Init,
    "output-file-paths" => SubCommand::OutputFilePaths,
    "output-resolved-config" => SubCommand::OutputResolvedConfig,
    "version" => SubCommand::Version,
    name => bail!("Unknown subcommand: {}", name),
  };

  let log_level = if matches.get_flag("verbose") {
    LogLevel::Debug
  } else {
    match matches.get_one::<String>("log-level") {
      Some(log_level) => log_level.parse()?,
      None => LogLevel::Info,
    }
  };

  Ok(CliArgs {
    sub_command,
    log_level,
    config: matches.get_one::<String>("config").map(String::from),
    overrides: parse_config_overrides(sub_matches),
  })
}

fn parse_config_overrides(matches: &ArgMatches) -> ConfigOverrides {
  let get_flag = |name: &str| matches.try_get_one::<bool>(name).ok().flatten().copied().unwrap_or(false);
  let get_string = |name: &str| matches.try_get_one::<String>(name).ok().flatten().map(String::from);
  ConfigOverrides {
    include_stale: get_flag("include-stale"),
    style: get_string("style"),
    skip: get_flag("skip"),
    no_main: get_flag("no-main"),
    no_test: get_flag("no-test"),
    filter_modified: get_flag("modified"),
    fix_imports: get_flag("fix-imports"),
    max_line_length: get_string("max-line-length"),
    fail_fast: get_flag("fail-fast"),
    timeout_secs: get_string("timeout"),
  }
}

#[derive(Default, PartialEq, Eq)]
pub enum CliArgParserKind {
  ForOutputtingMainHelp,
  #[default]
  Default,
}

pub fn create_cli_parser(kind: CliArgParserKind) -> clap::Command {
  use clap::Arg;
  use clap::Command;

  let mut app = Command::new("srcfmt");

  app = if kind == CliArgParserKind::ForOutputtingMainHelp {
    app.disable_help_subcommand(true).disable_version_flag(true).disable_help_flag(true)
  } else {
    app.subcommand_required(true)
  };

  app
    .bin_name("srcfmt")
    .version(env!("CARGO_PKG_VERSION"))
    .about("Reformats the source files of a build project, or checks that they are formatted.")
    .override_usage("srcfmt <SUBCOMMAND> [OPTIONS]")
    .help_template(r#"{bin} {version}

{about}

USAGE:
    {usage}

SUBCOMMANDS:
{subcommands}

More details at `srcfmt help <SUBCOMMAND>`

OPTIONS:
{options}

ENVIRONMENT VARIABLES:
  SRCFMT_MAX_THREADS  Limit the number of threads srcfmt uses for
                      formatting (ex. SRCFMT_MAX_THREADS=4).{after-help}"#)
    .after_help(
            r#"GETTING STARTED:
  1. Navigate to the root directory of a project.
  2. Run `srcfmt init` to create a srcfmt.json file in that directory.
  3. Modify configuration file if necessary.
  4. Run `srcfmt fmt` or `srcfmt check`.

EXAMPLES:
  Reformat the source files changed since the last build:

    srcfmt fmt

  Reformat every source file:

    srcfmt fmt --include-stale

  Check the files reported as modified by git:

    srcfmt check --include-stale --modified"#,
    )
    .subcommand(
      Command::new("init")
        .about("Initializes a configuration file in the current directory.")
    )
    .subcommand(
      Command::new("fmt")
        .about("Formats the source files and writes the result to the file system.")
        .add_config_override_args()
        .arg(
          Arg::new("diff")
            .long("diff")
            .help("Outputs a check-like diff of every formatted file.")
            .num_args(0)
            .required(false)
        )
    )
    .subcommand(
      Command::new("check")
        .about("Checks for any files that haven't been formatted.")
        .add_config_override_args()
        .arg(
          Arg::new("diff")
            .long("diff")
            .help("Outputs a diff of every file that isn't formatted.")
            .num_args(0)
            .required(false)
        )
    )
    .subcommand(
      Command::new("output-file-paths")
        .about("Prints the paths of the files that would be formatted based on the args and configuration.")
        .add_config_override_args()
    )
    .subcommand(
      Command::new("output-resolved-config")
        .about("Prints the resolved configuration based on the args and configuration file.")
        .add_config_override_args()
    )
    .subcommand(
      Command::new("version")
        .about("Outputs the version.")
    )
    .arg(
      Arg::new("config")
        .long("config")
        .short('c')
        .help("Path to JSON configuration file. Defaults to srcfmt.json(c) or .srcfmt.json(c) in the current directory when not provided.")
        .global(true)
        .num_args(1)
    )
    .arg(
      Arg::new("log-level")
        .long("log-level")
        .help("Set the log level.")
        .value_parser(LogLevel::VALUES)
        .global(true)
        .num_args(1)
    )
    .arg(
      Arg::new("verbose")
        .long("verbose")
        .help("Prints additional diagnostic information. Same as --log-level=debug.")
        .global(true)
        .num_args(0)
    )
}

trait ClapExtensions {
  fn add_config_override_args(self) -> Self;
}

impl ClapExtensions for clap::Command {
  fn add_config_override_args(self) -> Self {
    use clap::Arg;
    use clap::ArgAction;
    self
      .arg(
        Arg::new("include-stale")
          .long("include-stale")
          .help("Includes every source file rather than only the ones changed since the last build.")
          .action(ArgAction::SetTrue),
      )
      .arg(
        Arg::new("style")
          .long("style")
          .help("The style to format with.")
          .value_parser(["google", "aosp"])
          .num_args(1),
      )
      .arg(
        Arg::new("skip")
          .long("skip")
          .help("Skips reformatting entirely.")
          .action(ArgAction::SetTrue),
      )
      .arg(
        Arg::new("no-main")
          .long("no-main")
          .help("Excludes the main source directory.")
          .action(ArgAction::SetTrue),
      )
      .arg(
        Arg::new("no-test")
          .long("no-test")
          .help("Excludes the test source directory.")
          .action(ArgAction::SetTrue),
      )
      .arg(
        Arg::new("modified")
          .long("modified")
          .help("Only includes files the source control system reports as modified.")
          .action(ArgAction::SetTrue),
      )
      .arg(
        Arg::new("fix-imports")
          .long("fix-imports")
          .help("Removes unused imports and sorts the remaining ones.")
          .action(ArgAction::SetTrue),
      )
      .arg(
        Arg::new("max-line-length")
          .long("max-line-length")
          .value_name("number")
          .help("The line width at which the formatter will try to wrap.")
          .num_args(1),
      )
      .arg(
        Arg::new("fail-fast")
          .long("fail-fast")
          .help("Stops formatting further files after the first error.")
          .action(ArgAction::SetTrue),
      )
      .arg(
        Arg::new("timeout")
          .long("timeout")
          .value_name("seconds")
          .help("Maximum number of seconds to spend formatting a single file.")
          .num_args(1),
      )
  }
}

#[cfg(test)]
mod test {
  use pretty_assertions::assert_eq;

  use super::*;

  #[test]
  fn version_flag() {
    assert_version(vec!["-v"]);
    assert_version(vec!["-V"]);
    assert_version(vec!["--version"]);
    assert_version(vec!["version"]);
  }

  fn assert_version(args: Vec<&str>) {
    let args = test_args(args).unwrap();
    assert_eq!(args.sub_command, SubCommand::Version);
  }

  #[test]
  fn help_when_no_args() {
    let args = test_args(vec![]).unwrap();
    let SubCommand::Help(text) = args.sub_command else {
      panic!("Expected help.");
    };
    assert!(text.starts_with("srcfmt "));
    assert!(text.contains("GETTING STARTED:"));
  }

  #[test]
  fn fmt_and_check_diff() {
    assert_eq!(test_args(vec!["fmt"]).unwrap().sub_command, SubCommand::Fmt(FmtSubCommand { diff: false }));
    assert_eq!(test_args(vec!["fmt", "--diff"]).unwrap().sub_command, SubCommand::Fmt(FmtSubCommand { diff: true }));
    assert_eq!(
      test_args(vec!["check", "--diff"]).unwrap().sub_command,
      SubCommand::Check(CheckSubCommand { diff: true })
    );
  }

  #[test]
  fn config_overrides() {
    let args = test_args(vec![
      "check",
      "--include-stale",
      "--style",
      "aosp",
      "--no-test",
      "--modified",
      "--fix-imports",
      "--max-line-length",
      "120",
      "--fail-fast",
      "--timeout",
      "5",
    ])
    .unwrap();
    assert_eq!(
      args.overrides,
      ConfigOverrides {
        include_stale: true,
        style: Some("aosp".to_string()),
        skip: false,
        no_main: false,
        no_test: true,
        filter_modified: true,
        fix_imports: true,
        max_line_length: Some("120".to_string()),
        fail_fast: true,
        timeout_secs: Some("5".to_string()),
      }
    );
  }

  #[test]
  fn global_args() {
    let args = test_args(vec!["fmt", "--config", "other.json", "--verbose"]).unwrap();
    assert_eq!(args.config, Some("other.json".to_string()));
    assert_eq!(args.log_level, LogLevel::Debug);
    let args = test_args(vec!["--log-level", "silent", "output-file-paths"]).unwrap();
    assert_eq!(args.log_level, LogLevel::Silent);
    assert_eq!(args.sub_command, SubCommand::OutputFilePaths);
    assert!(args.is_stdout_machine_readable());
  }

  #[test]
  fn invalid_style() {
    assert!(test_args(vec!["fmt", "--style", "eclipse"]).is_err());
  }

  fn test_args(args: Vec<&str>) -> Result<CliArgs, ParseArgsError> {
    let mut args: Vec<String> = args.into_iter().map(String::from).collect();
    args.insert(0, "".to_string());
    parse_args(args)
  }
}
