mod deserialize_config;
mod resolve_config;

pub use deserialize_config::*;
pub use resolve_config::*;
