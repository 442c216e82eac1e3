//! Narrow CRUD contracts callers can depend on.
//!
//! Implementations can be in-memory, file-backed, or database-backed; calling
//! code written against these traits does not change when the backing store does.
//! Every method takes an optional correlation id used only for tracing.

use async_trait::async_trait;

use crate::errors::DataError;
use crate::page::DataPage;
use crate::params::{FilterParams, PagingParams, SortParams};

/// Lookup of a single item by id. `Ok(None)` means not found.
#[async_trait]
pub trait Getter<T, K>: Send + Sync {
    async fn get_one_by_id(&self, correlation_id: Option<&str>, id: &K) -> Result<Option<T>, DataError>;
}

/// Upsert by id.
#[async_trait]
pub trait Setter<T>: Send + Sync {
    async fn set(&self, correlation_id: Option<&str>, item: T) -> Result<T, DataError>;
}

#[async_trait]
pub trait Writer<T, K>: Send + Sync {
    async fn create(&self, correlation_id: Option<&str>, item: T) -> Result<T, DataError>;
    /// Replaces an existing item; `Ok(None)` when no item has the same id.
    async fn update(&self, correlation_id: Option<&str>, item: T) -> Result<Option<T>, DataError>;
    /// Removes and returns the item; `Ok(None)` when absent.
    async fn delete_by_id(&self, correlation_id: Option<&str>, id: &K) -> Result<Option<T>, DataError>;
}

#[async_trait]
pub trait FilteredReader<T>: Send + Sync {
    async fn get_list_by_filter(
        &self,
        correlation_id: Option<&str>,
        filter: FilterParams,
        sort: Option<SortParams>,
    ) -> Result<Vec<T>, DataError>;
}

#[async_trait]
pub trait FilteredPageReader<T>: Send + Sync {
    async fn get_page_by_filter(
        &self,
        correlation_id: Option<&str>,
        filter: FilterParams,
        paging: PagingParams,
        sort: Option<SortParams>,
    ) -> Result<DataPage<T>, DataError>;
}

/// Reader driven by a free-form query string.
#[async_trait]
pub trait QuerableReader<T>: Send + Sync {
    async fn get_list_by_query(
        &self,
        correlation_id: Option<&str>,
        query: Option<&str>,
        sort: Option<SortParams>,
    ) -> Result<Vec<T>, DataError>;
}

#[async_trait]
pub trait QuerablePageReader<T>: Send + Sync {
    async fn get_page_by_query(
        &self,
        correlation_id: Option<&str>,
        query: Option<&str>,
        paging: PagingParams,
        sort: Option<SortParams>,
    ) -> Result<DataPage<T>, DataError>;
}

/// Source of a whole collection.
#[async_trait]
pub trait Loader<T>: Send + Sync {
    async fn load(&self, correlation_id: Option<&str>) -> Result<Vec<T>, DataError>;
}

/// Sink for a whole collection.
#[async_trait]
pub trait Saver<T>: Send + Sync {
    async fn save(&self, correlation_id: Option<&str>, items: &[T]) -> Result<(), DataError>;
}
