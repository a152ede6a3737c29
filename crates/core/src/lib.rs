pub mod configuration;
pub mod formatter;
pub mod options;
