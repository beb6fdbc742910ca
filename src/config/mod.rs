pub mod env;
mod loader;

pub use env::{AppConfig, DirectoryConfig, FetchConfig, MonitorConfig, OpenAiConfig};
pub use loader::load_config;
