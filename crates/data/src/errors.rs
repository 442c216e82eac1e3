use std::path::PathBuf;

use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum DataError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("file error on {}: {source}", .path.display())]
    File {
        path: PathBuf,
        #[source]
        source: BoxError,
    },
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl DataError {
    pub fn missing_option(name: &str) -> Self { Self::Config(format!("missing required option `{}`", name)) }

    pub fn file<E>(path: impl Into<PathBuf>, source: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::File { path: path.into(), source: source.into() }
    }
}
