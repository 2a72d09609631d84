pub mod config;

pub use config::{apply_overrides, load_config, CacheSettings, ServeConfig, ServeOverrides};
