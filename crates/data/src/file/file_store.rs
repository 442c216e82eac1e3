//! Stores whose collection lives in a JSON file.
//!
//! Both wrappers wire one [`JsonFilePersister`] as loader and saver of the
//! matching in-memory store: `open` reads the file, every mutation and `close`
//! rewrite it. Store operations are reached through `Deref`.

use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

use configs::StoreConfig;

use crate::capabilities::{Getter, Setter, Writer};
use crate::errors::DataError;
use crate::file::json_file_persister::JsonFilePersister;
use crate::identity::Identifiable;
use crate::storage::identifiable_memory_store::IdentifiableMemoryStore;
use crate::storage::memory_store::MemoryStore;

pub struct FileStore<T> {
    persister: Arc<JsonFilePersister<T>>,
    store: MemoryStore<T>,
}

impl<T> FileStore<T>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self::with_persister(JsonFilePersister::new(path))
    }

    /// Store without a path yet; call [`FileStore::configure`] before `open`.
    pub fn unconfigured() -> Self {
        Self::with_persister(JsonFilePersister::default())
    }

    fn with_persister(persister: JsonFilePersister<T>) -> Self {
        let persister = Arc::new(persister);
        let store = MemoryStore::with_loader_saver(persister.clone(), persister.clone());
        Self { persister, store }
    }

    /// Configure the persister (`path`, required) and the store (`max_page_size`).
    pub fn configure(&mut self, config: &StoreConfig) -> Result<(), DataError> {
        let mut persister = JsonFilePersister::default();
        persister.configure(config)?;
        self.store.configure(config)?;

        let persister = Arc::new(persister);
        self.store.set_loader(persister.clone());
        self.store.set_saver(persister.clone());
        self.persister = persister;
        Ok(())
    }

    pub fn path(&self) -> Option<&Path> {
        self.persister.path()
    }
}

impl<T> Deref for FileStore<T> {
    type Target = MemoryStore<T>;

    fn deref(&self) -> &Self::Target {
        &self.store
    }
}

pub struct IdentifiableFileStore<T> {
    persister: Arc<JsonFilePersister<T>>,
    store: IdentifiableMemoryStore<T>,
}

impl<T> IdentifiableFileStore<T>
where
    T: Identifiable + Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self::with_persister(JsonFilePersister::new(path))
    }

    /// Store without a path yet; call [`IdentifiableFileStore::configure`] before `open`.
    pub fn unconfigured() -> Self {
        Self::with_persister(JsonFilePersister::default())
    }

    /// Build from config in one step; fails when `path` is missing.
    pub fn from_config(config: &StoreConfig) -> Result<Self, DataError> {
        let mut store = Self::unconfigured();
        store.configure(config)?;
        Ok(store)
    }

    fn with_persister(persister: JsonFilePersister<T>) -> Self {
        let persister = Arc::new(persister);
        let store = IdentifiableMemoryStore::with_loader_saver(persister.clone(), persister.clone());
        Self { persister, store }
    }

    pub fn configure(&mut self, config: &StoreConfig) -> Result<(), DataError> {
        let mut persister = JsonFilePersister::default();
        persister.configure(config)?;
        self.store.configure(config)?;

        let persister = Arc::new(persister);
        self.store.set_loader(persister.clone());
        self.store.set_saver(persister.clone());
        self.persister = persister;
        Ok(())
    }

    pub fn path(&self) -> Option<&Path> {
        self.persister.path()
    }
}

impl<T> Deref for IdentifiableFileStore<T> {
    type Target = IdentifiableMemoryStore<T>;

    fn deref(&self) -> &Self::Target {
        &self.store
    }
}

#[async_trait]
impl<T> Getter<T, T::Key> for IdentifiableFileStore<T>
where
    T: Identifiable + Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    async fn get_one_by_id(&self, correlation_id: Option<&str>, id: &T::Key) -> Result<Option<T>, DataError> {
        self.store.get_one_by_id(correlation_id, id).await
    }
}

#[async_trait]
impl<T> Setter<T> for IdentifiableFileStore<T>
where
    T: Identifiable + Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    async fn set(&self, correlation_id: Option<&str>, item: T) -> Result<T, DataError> {
        self.store.set(correlation_id, item).await
    }
}

#[async_trait]
impl<T> Writer<T, T::Key> for IdentifiableFileStore<T>
where
    T: Identifiable + Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    async fn create(&self, correlation_id: Option<&str>, item: T) -> Result<T, DataError> {
        self.store.create(correlation_id, item).await
    }

    async fn update(&self, correlation_id: Option<&str>, item: T) -> Result<Option<T>, DataError> {
        self.store.update(correlation_id, item).await
    }

    async fn delete_by_id(&self, correlation_id: Option<&str>, id: &T::Key) -> Result<Option<T>, DataError> {
        self.store.delete_by_id(correlation_id, id).await
    }
}
