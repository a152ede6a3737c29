mod log_level;
mod logger;

pub use log_level::*;
pub use logger::*;
