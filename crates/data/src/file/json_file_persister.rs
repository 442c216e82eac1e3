use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use tokio::fs;
use tracing::{trace, warn};

use configs::StoreConfig;

use crate::capabilities::{Loader, Saver};
use crate::errors::DataError;

/// Loads and saves a whole collection as one indented JSON array.
///
/// Every save rewrites the file in place; there is no temp file or rename.
pub struct JsonFilePersister<T> {
    path: Option<PathBuf>,
    _items: PhantomData<fn() -> T>,
}

impl<T> Default for JsonFilePersister<T> {
    fn default() -> Self {
        Self { path: None, _items: PhantomData }
    }
}

impl<T> JsonFilePersister<T> {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: Some(path.into()), _items: PhantomData }
    }

    /// Take `path` from the config. Fails before any I/O when it is missing.
    pub fn configure(&mut self, config: &StoreConfig) -> Result<(), DataError> {
        let path = config.path.clone().ok_or_else(|| DataError::missing_option("path"))?;
        self.path = Some(path);
        Ok(())
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn require_path(&self) -> Result<&Path, DataError> {
        self.path.as_deref().ok_or_else(|| DataError::missing_option("path"))
    }
}

impl<T> JsonFilePersister<T>
where
    T: DeserializeOwned,
{
    /// Read the file; a missing file yields an empty collection.
    pub async fn read(&self, correlation_id: Option<&str>) -> Result<Vec<T>, DataError> {
        let path = self.require_path()?;
        if !fs::try_exists(path).await.map_err(|e| DataError::file(path, e))? {
            warn!(correlation_id = ?correlation_id, path = %path.display(), "data file does not exist, starting empty");
            return Ok(Vec::new());
        }

        let text = fs::read_to_string(path).await.map_err(|e| DataError::file(path, e))?;
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        let items: Option<Vec<T>> = serde_json::from_str(&text).map_err(|e| DataError::file(path, e))?;
        let items = items.unwrap_or_default();
        trace!(correlation_id = ?correlation_id, path = %path.display(), count = items.len(), "read data file");
        Ok(items)
    }
}

impl<T> JsonFilePersister<T>
where
    T: Serialize,
{
    /// Serialize `items` and overwrite the file.
    pub async fn write(&self, correlation_id: Option<&str>, items: &[T]) -> Result<(), DataError> {
        let path = self.require_path()?;
        let json = serde_json::to_string_pretty(items).map_err(|e| DataError::file(path, e))?;
        fs::write(path, json).await.map_err(|e| DataError::file(path, e))?;
        trace!(correlation_id = ?correlation_id, path = %path.display(), count = items.len(), "wrote data file");
        Ok(())
    }
}

#[async_trait]
impl<T> Loader<T> for JsonFilePersister<T>
where
    T: DeserializeOwned + Send + 'static,
{
    async fn load(&self, correlation_id: Option<&str>) -> Result<Vec<T>, DataError> {
        self.read(correlation_id).await
    }
}

#[async_trait]
impl<T> Saver<T> for JsonFilePersister<T>
where
    T: Serialize + Sync + 'static,
{
    async fn save(&self, correlation_id: Option<&str>, items: &[T]) -> Result<(), DataError> {
        self.write(correlation_id, items).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::error::Error as _;
    use uuid::Uuid;

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    struct Row {
        id: String,
        value: i32,
    }

    fn temp_path(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("json_persister_{}_{}.json", tag, Uuid::new_v4()))
    }

    #[tokio::test]
    async fn save_then_load_round_trips() -> Result<(), anyhow::Error> {
        let path = temp_path("roundtrip");
        let persister = JsonFilePersister::<Row>::new(&path);
        let rows = vec![Row { id: "b".into(), value: 2 }, Row { id: "a".into(), value: 1 }];

        persister.save(Some("rt"), &rows).await?;
        let text = fs::read_to_string(&path).await?;
        assert!(text.starts_with('['));
        assert!(text.contains('\n'), "output is indented");

        let loaded = persister.load(Some("rt")).await?;
        assert_eq!(loaded, rows);

        let _ = fs::remove_file(&path).await;
        Ok(())
    }

    #[tokio::test]
    async fn missing_file_loads_empty() -> Result<(), anyhow::Error> {
        let persister = JsonFilePersister::<Row>::new(temp_path("missing"));
        assert!(persister.load(None).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn blank_and_null_files_load_empty() -> Result<(), anyhow::Error> {
        let path = temp_path("blank");
        let persister = JsonFilePersister::<Row>::new(&path);
        fs::write(&path, "  \n").await?;
        assert!(persister.load(None).await?.is_empty());
        fs::write(&path, "null").await?;
        assert!(persister.load(None).await?.is_empty());
        let _ = fs::remove_file(&path).await;
        Ok(())
    }

    #[tokio::test]
    async fn malformed_file_is_a_file_error() -> Result<(), anyhow::Error> {
        let path = temp_path("malformed");
        fs::write(&path, "{ not json").await?;
        let persister = JsonFilePersister::<Row>::new(&path);
        let err = persister.load(None).await.unwrap_err();
        assert!(matches!(err, DataError::File { .. }));
        assert!(err.source().is_some());
        let _ = fs::remove_file(&path).await;
        Ok(())
    }

    #[tokio::test]
    async fn save_into_missing_directory_fails() {
        let path = std::env::temp_dir().join(format!("no_such_dir_{}", Uuid::new_v4())).join("rows.json");
        let persister = JsonFilePersister::<Row>::new(&path);
        let err = persister.save(None, &[]).await.unwrap_err();
        assert!(matches!(err, DataError::File { path: ref p, .. } if *p == path));
    }

    #[test]
    fn configure_requires_path() {
        let mut persister = JsonFilePersister::<Row>::default();
        let err = persister.configure(&StoreConfig::default()).unwrap_err();
        assert!(matches!(err, DataError::Config(_)));
        assert!(persister.path().is_none());

        persister.configure(&StoreConfig::with_path("rows.json")).unwrap();
        assert_eq!(persister.path(), Some(Path::new("rows.json")));
    }

    #[tokio::test]
    async fn unconfigured_persister_refuses_io() {
        let persister = JsonFilePersister::<Row>::default();
        assert!(matches!(persister.load(None).await, Err(DataError::Config(_))));
        assert!(matches!(persister.save(None, &[]).await, Err(DataError::Config(_))));
    }
}
