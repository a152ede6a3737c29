use anyhow::bail;
use anyhow::Result;
use jsonc_parser::JsonArray;
use jsonc_parser::JsonObject;
use jsonc_parser::JsonValue;
use srcfmt_core::configuration::ConfigKeyMap;
use srcfmt_core::configuration::ConfigKeyValue;

pub fn deserialize_config(config_file_text: &str) -> Result<ConfigKeyMap> {
  let value = match jsonc_parser::parse_to_value(config_file_text, &Default::default()) {
    Ok(value) => value,
    Err(err) => bail!("{}", err),
  };

  match value {
    Some(JsonValue::Object(obj)) => json_obj_to_map(obj),
    None => Ok(ConfigKeyMap::new()),
    _ => bail!("Expected a root object in the configuration file."),
  }
}

fn json_obj_to_map(obj: JsonObject) -> Result<ConfigKeyMap> {
  let mut properties = ConfigKeyMap::new();
  for (key, value) in obj.into_iter() {
    let value = json_value_to_config_value(value)?;
    properties.insert(key, value);
  }
  Ok(properties)
}

fn json_array_to_vec(array: JsonArray) -> Result<Vec<ConfigKeyValue>> {
  let mut elements = Vec::new();
  for element in array.into_iter() {
    elements.push(json_value_to_config_value(element)?);
  }
  Ok(elements)
}

fn json_value_to_config_value(value: JsonValue) -> Result<ConfigKeyValue> {
  Ok(match value {
    JsonValue::Object(obj) => ConfigKeyValue::Object(json_obj_to_map(obj)?),
    JsonValue::Array(arr) => ConfigKeyValue::Array(json_array_to_vec(arr)?),
    JsonValue::Boolean(value) => ConfigKeyValue::Bool(value),
    JsonValue::String(value) => ConfigKeyValue::String(value.into_owned()),
    JsonValue::Number(value) => match value.parse::<i32>() {
      Ok(number) => ConfigKeyValue::Number(number),
      // left as text so the property reports a diagnostic when it's resolved
      Err(_) => ConfigKeyValue::String(value.to_string()),
    },
    JsonValue::Null => ConfigKeyValue::Null,
  })
}
