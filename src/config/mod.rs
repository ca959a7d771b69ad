// Configuration management module
// TOML settings for data locations, embedding backends and retrieval defaults

pub mod display;
pub mod settings;

pub use display::{render_config, show_config};
pub use settings::{
    Config, ConfigError, DataConfig, EmbeddingConfig, EmbeddingProviderKind, OllamaConfig,
    RetrievalConfig,
};

/// Get the configuration directory path
#[inline]
pub fn get_config_dir() -> Result<std::path::PathBuf, ConfigError> {
    Config::config_dir()
}
