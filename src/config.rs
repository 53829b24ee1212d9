use serde::Deserialize;
use std::env;
use std::fs;
use std::path::PathBuf;
use tracing::warn;

pub const DEFAULT_BASE_URL: &str = "https://api.altan.ai/galaxia/hook/UGpHXJ";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Config {
            base_url: default_base_url(),
        }
    }
}

impl Config {
    // Config file first, then environment overrides. Missing or malformed
    // pieces fall back to defaults instead of failing startup.
    pub fn load() -> Config {
        dotenv::dotenv().ok();
        let file_text = config_path().and_then(|path| fs::read_to_string(path).ok());
        Config::from_sources(file_text.as_deref(), env::var("TASKBOARD_BASE_URL").ok())
    }

    fn from_sources(file_text: Option<&str>, env_base_url: Option<String>) -> Config {
        let mut config = match file_text {
            Some(text) => match toml::from_str(text) {
                Ok(config) => config,
                Err(err) => {
                    warn!(error = %err, "ignoring malformed config file");
                    Config::default()
                }
            },
            None => Config::default(),
        };
        if let Some(base_url) = env_base_url {
            config.base_url = base_url;
        }
        config.base_url = config.base_url.trim_end_matches('/').to_string();
        config
    }
}

fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("taskboard-sync").join("config.toml"))
}
