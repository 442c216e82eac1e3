use std::sync::Arc;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use tracing::trace;

use configs::StoreConfig;

use crate::capabilities::{Getter, Loader, Saver, Setter, Writer};
use crate::errors::DataError;
use crate::filter::{Filter, SortFn};
use crate::identity::{ensure_id, Identifiable};
use crate::page::DataPage;
use crate::params::PagingParams;
use crate::storage::memory_store::MemoryStore;

/// In-memory store addressing items by their id.
///
/// Ids are unique only as far as `set` keeps them so: `create` appends without
/// checking, lookups return the first match.
pub struct IdentifiableMemoryStore<T> {
    inner: MemoryStore<T>,
}

impl<T> Default for IdentifiableMemoryStore<T>
where
    T: Identifiable + Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

fn has_id<T: Identifiable>(item: &T, id: &T::Key) -> bool {
    item.id() == Some(id)
}

impl<T> IdentifiableMemoryStore<T>
where
    T: Identifiable + Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self { inner: MemoryStore::new() }
    }

    pub fn with_loader_saver(loader: Arc<dyn Loader<T>>, saver: Arc<dyn Saver<T>>) -> Self {
        Self { inner: MemoryStore::with_loader_saver(loader, saver) }
    }

    pub fn set_loader(&mut self, loader: Arc<dyn Loader<T>>) { self.inner.set_loader(loader) }
    pub fn set_saver(&mut self, saver: Arc<dyn Saver<T>>) { self.inner.set_saver(saver) }
    pub fn configure(&mut self, config: &StoreConfig) -> Result<(), DataError> { self.inner.configure(config) }
    pub fn max_page_size(&self) -> usize { self.inner.max_page_size() }
    pub fn is_open(&self) -> bool { self.inner.is_open() }
    pub async fn open(&self, correlation_id: Option<&str>) -> Result<(), DataError> { self.inner.open(correlation_id).await }
    pub async fn close(&self, correlation_id: Option<&str>) -> Result<(), DataError> { self.inner.close(correlation_id).await }
    pub async fn clear(&self, correlation_id: Option<&str>) -> Result<usize, DataError> { self.inner.clear(correlation_id).await }
    pub async fn len(&self) -> usize { self.inner.len().await }
    pub async fn is_empty(&self) -> bool { self.inner.is_empty().await }

    pub async fn get_page_by_filter(
        &self,
        correlation_id: Option<&str>,
        filter: &Filter<T>,
        paging: PagingParams,
        sort: Option<&SortFn<T>>,
    ) -> Result<DataPage<T>, DataError> {
        self.inner.get_page_by_filter(correlation_id, filter, paging, sort).await
    }

    pub async fn get_list_by_filter(
        &self,
        correlation_id: Option<&str>,
        filter: &Filter<T>,
        sort: Option<&SortFn<T>>,
    ) -> Result<Vec<T>, DataError> {
        self.inner.get_list_by_filter(correlation_id, filter, sort).await
    }

    pub async fn get_count_by_filter(&self, correlation_id: Option<&str>, filter: &Filter<T>) -> Result<usize, DataError> {
        self.inner.get_count_by_filter(correlation_id, filter).await
    }

    pub async fn get_one_random(&self, correlation_id: Option<&str>, filter: &Filter<T>) -> Result<Option<T>, DataError> {
        self.inner.get_one_random(correlation_id, filter).await
    }

    pub async fn delete_by_filter(&self, correlation_id: Option<&str>, filter: &Filter<T>) -> Result<usize, DataError> {
        self.inner.delete_by_filter(correlation_id, filter).await
    }

    /// First item with the given id.
    pub async fn get_one_by_id(&self, correlation_id: Option<&str>, id: &T::Key) -> Result<Option<T>, DataError> {
        let items = self.inner.items.read().await;
        let found = items.iter().find(|item| has_id(*item, id)).cloned();
        match &found {
            Some(_) => trace!(correlation_id = ?correlation_id, ?id, "retrieved item"),
            None => trace!(correlation_id = ?correlation_id, ?id, "cannot find item"),
        }
        Ok(found)
    }

    /// Items whose id is in `ids`, in collection order.
    pub async fn get_list_by_ids(&self, correlation_id: Option<&str>, ids: &[T::Key]) -> Result<Vec<T>, DataError> {
        let items = self.inner.items.read().await;
        let found: Vec<T> = items
            .iter()
            .filter(|item| item.id().is_some_and(|id| ids.contains(id)))
            .cloned()
            .collect();
        trace!(correlation_id = ?correlation_id, count = found.len(), "retrieved items by ids");
        Ok(found)
    }

    /// Append `item`, generating an id first when it has none.
    pub async fn create(&self, correlation_id: Option<&str>, mut item: T) -> Result<T, DataError> {
        ensure_id(&mut item);
        let mut items = self.inner.items.write().await;
        items.push(item.clone());
        trace!(correlation_id = ?correlation_id, id = ?item.id(), "created item");
        self.inner.persist(correlation_id, &items).await?;
        Ok(item)
    }

    /// Upsert: replace in place when the id exists, append otherwise.
    pub async fn set(&self, correlation_id: Option<&str>, mut item: T) -> Result<T, DataError> {
        ensure_id(&mut item);
        let mut items = self.inner.items.write().await;
        let index = item.id().and_then(|id| items.iter().position(|existing| has_id(existing, id)));
        match index {
            Some(index) => items[index] = item.clone(),
            None => items.push(item.clone()),
        }
        trace!(correlation_id = ?correlation_id, id = ?item.id(), replaced = index.is_some(), "set item");
        self.inner.persist(correlation_id, &items).await?;
        Ok(item)
    }

    /// Replace an existing item; `None` without touching the collection when the id is unknown.
    pub async fn update(&self, correlation_id: Option<&str>, item: T) -> Result<Option<T>, DataError> {
        let mut items = self.inner.items.write().await;
        let Some(index) = item.id().and_then(|id| items.iter().position(|existing| has_id(existing, id))) else {
            trace!(correlation_id = ?correlation_id, id = ?item.id(), "item to update not found");
            return Ok(None);
        };
        items[index] = item.clone();
        trace!(correlation_id = ?correlation_id, id = ?item.id(), "updated item");
        self.inner.persist(correlation_id, &items).await?;
        Ok(Some(item))
    }

    /// Merge top-level fields of `patch` into the stored item.
    ///
    /// The id is never changed: an `id` key in the patch is ignored.
    pub async fn update_partially(
        &self,
        correlation_id: Option<&str>,
        id: &T::Key,
        mut patch: Map<String, Value>,
    ) -> Result<Option<T>, DataError>
    where
        T: Serialize + DeserializeOwned,
    {
        let mut items = self.inner.items.write().await;
        let Some(index) = items.iter().position(|existing| has_id(existing, id)) else {
            trace!(correlation_id = ?correlation_id, ?id, "item to update not found");
            return Ok(None);
        };

        let mut fields = match serde_json::to_value(&items[index]) {
            Ok(Value::Object(fields)) => fields,
            Ok(_) => return Err(DataError::Serialization("item does not serialize to an object".into())),
            Err(e) => return Err(DataError::Serialization(e.to_string())),
        };
        patch.remove("id");
        fields.extend(patch);
        let mut updated: T = serde_json::from_value(Value::Object(fields))
            .map_err(|e| DataError::Serialization(e.to_string()))?;
        updated.set_id(id.clone());

        items[index] = updated.clone();
        trace!(correlation_id = ?correlation_id, ?id, "partially updated item");
        self.inner.persist(correlation_id, &items).await?;
        Ok(Some(updated))
    }

    /// Remove and return the first item with `id`; saves only when one was removed.
    pub async fn delete_by_id(&self, correlation_id: Option<&str>, id: &T::Key) -> Result<Option<T>, DataError> {
        let mut items = self.inner.items.write().await;
        let Some(index) = items.iter().position(|item| has_id(item, id)) else {
            trace!(correlation_id = ?correlation_id, ?id, "item to delete not found");
            return Ok(None);
        };
        let removed = items.remove(index);
        trace!(correlation_id = ?correlation_id, ?id, "deleted item");
        self.inner.persist(correlation_id, &items).await?;
        Ok(Some(removed))
    }

    /// Remove every item whose id is in `ids`; returns the number removed.
    pub async fn delete_by_ids(&self, correlation_id: Option<&str>, ids: &[T::Key]) -> Result<usize, DataError> {
        let mut items = self.inner.items.write().await;
        let before = items.len();
        items.retain(|item| !item.id().is_some_and(|id| ids.contains(id)));
        let deleted = before - items.len();
        trace!(correlation_id = ?correlation_id, deleted, "deleted items by ids");
        if deleted > 0 {
            self.inner.persist(correlation_id, &items).await?;
        }
        Ok(deleted)
    }
}

#[async_trait]
impl<T> Getter<T, T::Key> for IdentifiableMemoryStore<T>
where
    T: Identifiable + Clone + Send + Sync + 'static,
{
    async fn get_one_by_id(&self, correlation_id: Option<&str>, id: &T::Key) -> Result<Option<T>, DataError> {
        IdentifiableMemoryStore::get_one_by_id(self, correlation_id, id).await
    }
}

#[async_trait]
impl<T> Setter<T> for IdentifiableMemoryStore<T>
where
    T: Identifiable + Clone + Send + Sync + 'static,
{
    async fn set(&self, correlation_id: Option<&str>, item: T) -> Result<T, DataError> {
        IdentifiableMemoryStore::set(self, correlation_id, item).await
    }
}

#[async_trait]
impl<T> Writer<T, T::Key> for IdentifiableMemoryStore<T>
where
    T: Identifiable + Clone + Send + Sync + 'static,
{
    async fn create(&self, correlation_id: Option<&str>, item: T) -> Result<T, DataError> {
        IdentifiableMemoryStore::create(self, correlation_id, item).await
    }

    async fn update(&self, correlation_id: Option<&str>, item: T) -> Result<Option<T>, DataError> {
        IdentifiableMemoryStore::update(self, correlation_id, item).await
    }

    async fn delete_by_id(&self, correlation_id: Option<&str>, id: &T::Key) -> Result<Option<T>, DataError> {
        IdentifiableMemoryStore::delete_by_id(self, correlation_id, id).await
    }
}
