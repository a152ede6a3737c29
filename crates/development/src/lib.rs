mod config_helpers;
mod file_system_helpers;
mod spec_helpers;
mod spec_parser;

pub use config_helpers::*;
pub use file_system_helpers::*;
pub use spec_helpers::*;
pub use spec_parser::*;
