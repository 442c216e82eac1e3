use std::path::PathBuf;

use anyhow::anyhow;
use anyhow::Result;
use serde::Deserialize;

/// Page size used by stores when neither the caller nor the config sets one.
pub const DEFAULT_MAX_PAGE_SIZE: usize = 100;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Options understood by stores and persisters.
///
/// `path` is required by the JSON file persister, `max_page_size` is read by
/// the in-memory stores. Both are optional here so the same section can be
/// handed to either component.
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
pub struct StoreConfig {
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default)]
    pub max_page_size: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LoggingConfig {
    #[serde(default)]
    pub json: bool,
}

impl StoreConfig {
    pub fn with_path<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: Some(path.into()), max_page_size: None }
    }

    pub fn max_page_size_or_default(&self) -> usize {
        self.max_page_size.unwrap_or(DEFAULT_MAX_PAGE_SIZE)
    }

    pub fn normalize_from_env(&mut self) {
        // DATA_FILE fills in a path the TOML left out
        if self.path.is_none() {
            if let Ok(path) = std::env::var("DATA_FILE") {
                if !path.trim().is_empty() {
                    self.path = Some(PathBuf::from(path));
                }
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_page_size == Some(0) {
            return Err(anyhow!("store.max_page_size must be >= 1"));
        }
        if let Some(path) = &self.path {
            if path.as_os_str().is_empty() {
                return Err(anyhow!("store.path is empty"));
            }
        }
        Ok(())
    }
}

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    parse(&content)
}

pub fn parse(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = load_default()?;
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.store.normalize_from_env();
        self.store.validate()?;
        Ok(())
    }
}
