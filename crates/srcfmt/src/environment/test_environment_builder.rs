use indexmap::IndexMap;
use std::path::Path;
use std::time::SystemTime;

use super::Environment;
use super::TestEnvironment;
use super::TestFailure;

#[derive(Default)]
pub struct TestConfigFileBuilder {
  properties: IndexMap<String, String>,
}

impl TestConfigFileBuilder {
  pub fn to_string(&self) -> String {
    let parts = self.properties.iter().map(|(key, value)| format!("  \"{}\": {}", key, value)).collect::<Vec<_>>();
    format!("{{\n{}\n}}", parts.join(",\n"))
  }

  /// Sets a property to the provided JSON text.
  pub fn set(&mut self, name: &str, json_text: &str) -> &mut Self {
    self.properties.insert(name.to_string(), json_text.to_string());
    self
  }

  pub fn set_scm_connection(&mut self, connection: &str) -> &mut Self {
    self.set("scm", &format!("{{ \"connection\": \"{}\" }}", connection))
  }
}

pub struct TestEnvironmentBuilder {
  environment: TestEnvironment,
}

impl TestEnvironmentBuilder {
  pub fn new() -> Self {
    Self {
      environment: TestEnvironment::new(),
    }
  }

  pub fn build(&mut self) -> TestEnvironment {
    self.environment.clone()
  }

  pub fn with_default_config(&mut self, func: impl FnOnce(&mut TestConfigFileBuilder)) -> &mut Self {
    self.with_local_config("./srcfmt.json", func)
  }

  pub fn with_local_config(&mut self, file_path: impl AsRef<Path>, func: impl FnOnce(&mut TestConfigFileBuilder)) -> &mut Self {
    let mut config_file = TestConfigFileBuilder::default();
    func(&mut config_file);
    let text = config_file.to_string();
    self.write_file(file_path, &text)
  }

  pub fn write_file(&mut self, file_path: impl AsRef<Path>, text: &str) -> &mut Self {
    self.environment.write_file(file_path, text).unwrap();
    self
  }

  pub fn write_file_with_modified_time(&mut self, file_path: impl AsRef<Path>, text: &str, modified: SystemTime) -> &mut Self {
    self.environment.write_file(&file_path, text).unwrap();
    self.environment.set_modified_time(&file_path, modified);
    self
  }

  pub fn create_dir_all(&mut self, dir_path: impl AsRef<Path>) -> &mut Self {
    self.environment.create_dir_all(dir_path);
    self
  }

  pub fn add_symlink(&mut self, link_path: impl AsRef<Path>, target_path: impl AsRef<Path>) -> &mut Self {
    self.environment.add_symlink(link_path, target_path);
    self
  }

  pub fn add_failure(&mut self, path: impl AsRef<Path>, failure: TestFailure) -> &mut Self {
    self.environment.add_failure(path, failure);
    self
  }

  pub fn set_cwd(&mut self, dir_path: &str) -> &mut Self {
    self.environment.set_cwd(dir_path);
    self
  }
}
