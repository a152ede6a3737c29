mod error_count_logger;
mod file_path_utils;
mod get_difference;
mod logging;

pub use error_count_logger::*;
pub use file_path_utils::*;
pub use get_difference::*;
pub use logging::*;
