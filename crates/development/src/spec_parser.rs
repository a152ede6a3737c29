use srcfmt_core::configuration::ConfigKeyMap;
use srcfmt_core::configuration::ConfigKeyValue;

#[derive(PartialEq, Debug)]
pub struct Spec {
  pub file_name: String,
  pub message: String,
  pub file_text: String,
  pub expected_text: String,
  pub is_only: bool,
  pub skip: bool,
  pub skip_format_twice: bool,
  pub config: ConfigKeyMap,
}

pub struct ParseSpecOptions {
  /// The default file name for a parsed spec.
  pub default_file_name: &'static str,
}

pub fn parse_specs(file_text: String, options: &ParseSpecOptions) -> Vec<Spec> {
  let file_text = file_text.replace("\r\n", "\n");
  let (file_path, file_text) = parse_file_path(file_text, options);
  let (config, file_text) = parse_config(file_text);
  let lines = file_text.split('\n').collect::<Vec<_>>();
  let spec_starts = get_spec_starts(&lines);
  let mut specs = Vec::new();

  for (i, start_index) in spec_starts.iter().enumerate() {
    let end_index = spec_starts.get(i + 1).copied().unwrap_or(lines.len());
    let message_line = lines[*start_index];
    let spec = parse_single_spec(&file_path, message_line, &lines[(start_index + 1)..end_index], &config);

    specs.push(spec);
  }

  return specs;

  fn parse_file_path(file_text: String, options: &ParseSpecOptions) -> (String, String) {
    if !file_text.starts_with("--") {
      return (options.default_file_name.into(), file_text);
    }
    let last_index = file_text.find("--\n").expect("Could not find final --");

    (file_text["--".len()..last_index].trim().into(), file_text[(last_index + "--\n".len())..].into())
  }

  fn parse_config(file_text: String) -> (ConfigKeyMap, String) {
    if !file_text.starts_with("~~") {
      return (ConfigKeyMap::new(), file_text);
    }
    let last_index = file_text.find("~~\n").expect("Could not find final ~~\\n");

    let config_text = file_text["~~".len()..last_index].replace('\n', "");
    let mut config = ConfigKeyMap::new();

    for item in config_text.split(',') {
      let first_colon = item.find(':').expect("Could not find colon in config option.");
      let key = item[0..first_colon].trim();
      let value = item[first_colon + ":".len()..].trim();

      config.insert(key.into(), ConfigKeyValue::from_str(value));
    }

    (config, file_text[(last_index + "~~\n".len())..].into())
  }

  fn get_spec_starts(lines: &[&str]) -> Vec<usize> {
    let first_line = lines.first().copied().unwrap_or_default();
    if !first_line.starts_with(MESSAGE_SEPARATOR) {
      panic!("All spec files should start with a message. (ex. {0} Message {0})", MESSAGE_SEPARATOR);
    }

    lines
      .iter()
      .enumerate()
      .filter(|(_, line)| line.starts_with(MESSAGE_SEPARATOR))
      .map(|(i, _)| i)
      .collect()
  }

  fn parse_single_spec(file_name: &str, message_line: &str, lines: &[&str], config: &ConfigKeyMap) -> Spec {
    let file_text = lines.join("\n");
    let parts = file_text.split("[expect]").collect::<Vec<&str>>();
    let start_text = parts[0][0..parts[0].len() - "\n".len()].into(); // remove last newline
    let expected_text = parts[1]["\n".len()..].into(); // remove first newline
    let lower_case_message_line = message_line.to_ascii_lowercase();

    Spec {
      file_name: String::from(file_name),
      message: message_line[MESSAGE_SEPARATOR.len()..message_line.len() - MESSAGE_SEPARATOR.len()].trim().into(),
      file_text: start_text,
      expected_text,
      is_only: lower_case_message_line.contains("(only)"),
      skip: lower_case_message_line.contains("(skip)"),
      skip_format_twice: lower_case_message_line.contains("(skip-format-twice)"),
      config: config.clone(),
    }
  }
}

const MESSAGE_SEPARATOR: &str = "==";
