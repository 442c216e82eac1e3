use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rand::Rng;
use tokio::sync::RwLock;
use tracing::trace;

use configs::{StoreConfig, DEFAULT_MAX_PAGE_SIZE};

use crate::capabilities::{Loader, Saver};
use crate::errors::DataError;
use crate::filter::{Filter, SortFn};
use crate::page::DataPage;
use crate::params::PagingParams;

/// Thread-safe ordered collection with filter, paging and bulk delete helpers.
///
/// Reads share the lock, mutations hold it exclusively for the whole
/// filter-and-mutate step. When a saver is wired in, every mutation is
/// followed by a full save performed while the write lock is still held, so
/// the file always reflects a state readers could have observed.
pub struct MemoryStore<T> {
    pub(crate) items: RwLock<Vec<T>>,
    opened: AtomicBool,
    max_page_size: usize,
    loader: Option<Arc<dyn Loader<T>>>,
    saver: Option<Arc<dyn Saver<T>>>,
}

impl<T> Default for MemoryStore<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> MemoryStore<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Empty store with no loader or saver; `open`/`close` only flip the state flag.
    pub fn new() -> Self {
        Self {
            items: RwLock::new(Vec::new()),
            opened: AtomicBool::new(false),
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
            loader: None,
            saver: None,
        }
    }

    pub fn with_loader_saver(loader: Arc<dyn Loader<T>>, saver: Arc<dyn Saver<T>>) -> Self {
        let mut store = Self::new();
        store.loader = Some(loader);
        store.saver = Some(saver);
        store
    }

    pub fn set_loader(&mut self, loader: Arc<dyn Loader<T>>) {
        self.loader = Some(loader);
    }

    pub fn set_saver(&mut self, saver: Arc<dyn Saver<T>>) {
        self.saver = Some(saver);
    }

    /// Apply `max_page_size` when present; other options are ignored here.
    pub fn configure(&mut self, config: &StoreConfig) -> Result<(), DataError> {
        if let Some(size) = config.max_page_size {
            if size == 0 {
                return Err(DataError::Config("max_page_size must be >= 1".into()));
            }
            self.max_page_size = size;
        }
        Ok(())
    }

    pub fn max_page_size(&self) -> usize {
        self.max_page_size
    }

    pub fn is_open(&self) -> bool {
        self.opened.load(Ordering::Acquire)
    }

    /// Replace the collection with the loader's result and mark the store opened.
    pub async fn open(&self, correlation_id: Option<&str>) -> Result<(), DataError> {
        if let Some(loader) = &self.loader {
            let mut items = self.items.write().await;
            *items = loader.load(correlation_id).await?;
            trace!(correlation_id = ?correlation_id, count = items.len(), "loaded items");
        }
        self.opened.store(true, Ordering::Release);
        Ok(())
    }

    /// Save the whole collection and mark the store closed.
    pub async fn close(&self, correlation_id: Option<&str>) -> Result<(), DataError> {
        if let Some(saver) = &self.saver {
            let items = self.items.read().await;
            saver.save(correlation_id, &items).await?;
            trace!(correlation_id = ?correlation_id, count = items.len(), "saved items on close");
        }
        self.opened.store(false, Ordering::Release);
        Ok(())
    }

    /// Save `items`, a view of the collection the caller holds a lock on.
    pub(crate) async fn persist(&self, correlation_id: Option<&str>, items: &[T]) -> Result<(), DataError> {
        if let Some(saver) = &self.saver {
            saver.save(correlation_id, items).await?;
            trace!(correlation_id = ?correlation_id, count = items.len(), "saved items");
        }
        Ok(())
    }

    /// Empty the collection and save; returns the number of items dropped.
    pub async fn clear(&self, correlation_id: Option<&str>) -> Result<usize, DataError> {
        let mut items = self.items.write().await;
        let cleared = std::mem::take(&mut *items).len();
        trace!(correlation_id = ?correlation_id, cleared, "cleared items");
        self.persist(correlation_id, &items).await?;
        Ok(cleared)
    }

    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }

    /// Filter, optionally sort, then apply skip/take.
    ///
    /// `total` is filled only when `paging.total` is set.
    pub async fn get_page_by_filter(
        &self,
        correlation_id: Option<&str>,
        filter: &Filter<T>,
        paging: PagingParams,
        sort: Option<&SortFn<T>>,
    ) -> Result<DataPage<T>, DataError> {
        let items = self.items.read().await;
        let mut matches: Vec<&T> = items.iter().filter(|item| filter.matches(item)).collect();
        if let Some(sort) = sort {
            matches.sort_by(|a, b| sort(*a, *b));
        }

        let skip = paging.skip_or(0);
        let take = paging.take_or(self.max_page_size);
        let total = paging.total.then_some(matches.len());
        let data: Vec<T> = matches.into_iter().skip(skip).take(take).cloned().collect();

        trace!(correlation_id = ?correlation_id, count = data.len(), skip, take, "retrieved page");
        Ok(DataPage::new(data, total))
    }

    pub async fn get_list_by_filter(
        &self,
        correlation_id: Option<&str>,
        filter: &Filter<T>,
        sort: Option<&SortFn<T>>,
    ) -> Result<Vec<T>, DataError> {
        let items = self.items.read().await;
        let mut data: Vec<T> = items.iter().filter(|item| filter.matches(item)).cloned().collect();
        if let Some(sort) = sort {
            data.sort_by(|a, b| sort(a, b));
        }
        trace!(correlation_id = ?correlation_id, count = data.len(), "retrieved list");
        Ok(data)
    }

    pub async fn get_count_by_filter(&self, correlation_id: Option<&str>, filter: &Filter<T>) -> Result<usize, DataError> {
        let items = self.items.read().await;
        let count = items.iter().filter(|item| filter.matches(item)).count();
        trace!(correlation_id = ?correlation_id, count, "counted items");
        Ok(count)
    }

    /// One match picked uniformly at random, `None` when nothing matches.
    pub async fn get_one_random(&self, correlation_id: Option<&str>, filter: &Filter<T>) -> Result<Option<T>, DataError> {
        let items = self.items.read().await;
        let matches: Vec<&T> = items.iter().filter(|item| filter.matches(item)).collect();
        if matches.is_empty() {
            trace!(correlation_id = ?correlation_id, "nothing found for filter");
            return Ok(None);
        }
        let index = rand::thread_rng().gen_range(0..matches.len());
        trace!(correlation_id = ?correlation_id, index, "retrieved a random item");
        Ok(Some(matches[index].clone()))
    }

    /// Remove every match; saves only when something was removed. Returns the number removed.
    pub async fn delete_by_filter(&self, correlation_id: Option<&str>, filter: &Filter<T>) -> Result<usize, DataError> {
        let mut items = self.items.write().await;
        let before = items.len();
        items.retain(|item| !filter.matches(item));
        let deleted = before - items.len();
        trace!(correlation_id = ?correlation_id, deleted, "deleted items by filter");
        if deleted > 0 {
            self.persist(correlation_id, &items).await?;
        }
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::{Loader, Saver};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Loader/saver double that records every save.
    #[derive(Default)]
    struct Recorder {
        seed: Vec<u32>,
        saves: Mutex<Vec<Vec<u32>>>,
    }

    #[async_trait]
    impl Loader<u32> for Recorder {
        async fn load(&self, _correlation_id: Option<&str>) -> Result<Vec<u32>, DataError> {
            Ok(self.seed.clone())
        }
    }

    #[async_trait]
    impl Saver<u32> for Recorder {
        async fn save(&self, _correlation_id: Option<&str>, items: &[u32]) -> Result<(), DataError> {
            self.saves.lock().unwrap().push(items.to_vec());
            Ok(())
        }
    }

    fn store_with(seed: Vec<u32>) -> (MemoryStore<u32>, Arc<Recorder>) {
        let rec = Arc::new(Recorder { seed, ..Default::default() });
        let store = MemoryStore::with_loader_saver(rec.clone(), rec.clone());
        (store, rec)
    }

    fn saves(rec: &Recorder) -> Vec<Vec<u32>> {
        rec.saves.lock().unwrap().clone()
    }

    #[tokio::test]
    async fn open_loads_and_close_saves() -> Result<(), anyhow::Error> {
        let (store, rec) = store_with(vec![1, 2, 3]);
        assert!(!store.is_open());
        store.open(Some("t1")).await?;
        assert!(store.is_open());
        assert_eq!(store.len().await, 3);

        store.close(Some("t1")).await?;
        assert!(!store.is_open());
        assert_eq!(saves(&rec), vec![vec![1, 2, 3]]);
        Ok(())
    }

    #[tokio::test]
    async fn open_without_loader_keeps_collection() -> Result<(), anyhow::Error> {
        let store = MemoryStore::<u32>::new();
        store.open(None).await?;
        assert!(store.is_open());
        assert!(store.is_empty().await);
        store.close(None).await?;
        assert!(!store.is_open());
        Ok(())
    }

    #[tokio::test]
    async fn page_applies_skip_take_after_filter() -> Result<(), anyhow::Error> {
        let (store, _) = store_with((1..=10).collect());
        store.open(None).await?;
        let even = Filter::all().and(|x: &u32| x % 2 == 0);

        let page = store.get_page_by_filter(None, &even, PagingParams::new(None, Some(3), false), None).await?;
        assert_eq!(page.data, vec![2, 4, 6]);
        assert_eq!(page.total, None);

        let page = store.get_page_by_filter(None, &even, PagingParams::new(Some(2), Some(10), true), None).await?;
        assert_eq!(page.data, vec![6, 8, 10]);
        assert_eq!(page.total, Some(5));

        let page = store.get_page_by_filter(None, &even, PagingParams::new(Some(9), None, true), None).await?;
        assert!(page.is_empty());
        assert_eq!(page.total, Some(5));
        Ok(())
    }

    #[tokio::test]
    async fn page_take_defaults_to_max_page_size() -> Result<(), anyhow::Error> {
        let (mut store, _) = store_with((0..50).collect());
        store.configure(&StoreConfig { path: None, max_page_size: Some(20) })?;
        store.open(None).await?;

        let page = store.get_page_by_filter(None, &Filter::all(), PagingParams::default(), None).await?;
        assert_eq!(page.len(), 20);
        assert_eq!(page.data[0], 0);

        let page = store.get_page_by_filter(None, &Filter::all(), PagingParams::new(None, Some(40), false), None).await?;
        assert_eq!(page.len(), 20);
        Ok(())
    }

    #[test]
    fn zero_max_page_size_is_a_config_error() {
        let mut store = MemoryStore::<u32>::new();
        let err = store.configure(&StoreConfig { path: None, max_page_size: Some(0) }).unwrap_err();
        assert!(matches!(err, DataError::Config(_)));
        assert_eq!(store.max_page_size(), DEFAULT_MAX_PAGE_SIZE);
    }

    #[tokio::test]
    async fn list_and_count_with_sort() -> Result<(), anyhow::Error> {
        let (store, _) = store_with(vec![5, 3, 9, 1, 7]);
        store.open(None).await?;
        let big = Filter::all().and(|x: &u32| *x > 2);

        let list = store.get_list_by_filter(None, &big, None).await?;
        assert_eq!(list, vec![5, 3, 9, 7]);

        let desc = |a: &u32, b: &u32| b.cmp(a);
        let sorted = store.get_list_by_filter(None, &big, Some(&desc)).await?;
        assert_eq!(sorted, vec![9, 7, 5, 3]);

        let page = store.get_page_by_filter(None, &big, PagingParams::new(Some(1), Some(2), false), Some(&desc)).await?;
        assert_eq!(page.data, vec![7, 5]);

        assert_eq!(store.get_count_by_filter(None, &big).await?, 4);
        Ok(())
    }

    #[tokio::test]
    async fn random_picks_a_match_or_none() -> Result<(), anyhow::Error> {
        let (store, _) = store_with(vec![1, 2, 3, 4]);
        store.open(None).await?;
        let odd = Filter::all().and(|x: &u32| x % 2 == 1);
        for _ in 0..20 {
            let picked = store.get_one_random(None, &odd).await?.expect("a match");
            assert!(picked == 1 || picked == 3);
        }
        let none = Filter::all().and(|x: &u32| *x > 100);
        assert_eq!(store.get_one_random(None, &none).await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn delete_by_filter_saves_only_on_change() -> Result<(), anyhow::Error> {
        let (store, rec) = store_with(vec![1, 2, 3, 4]);
        store.open(None).await?;

        let none = Filter::all().and(|x: &u32| *x > 100);
        assert_eq!(store.delete_by_filter(None, &none).await?, 0);
        assert!(saves(&rec).is_empty());

        let even = Filter::all().and(|x: &u32| x % 2 == 0);
        assert_eq!(store.delete_by_filter(None, &even).await?, 2);
        assert_eq!(saves(&rec), vec![vec![1, 3]]);
        Ok(())
    }

    #[tokio::test]
    async fn clear_empties_and_saves() -> Result<(), anyhow::Error> {
        let (store, rec) = store_with(vec![1, 2]);
        store.open(None).await?;
        assert_eq!(store.clear(Some("c")).await?, 2);
        assert!(store.is_empty().await);
        assert_eq!(saves(&rec), vec![Vec::<u32>::new()]);
        Ok(())
    }

    #[tokio::test]
    async fn concurrent_readers_see_whole_results() -> Result<(), anyhow::Error> {
        let (store, _) = store_with((0..100).collect());
        let store = Arc::new(store);
        store.open(None).await?;

        let writer = {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                let low = Filter::all().and(|x: &u32| *x < 50);
                store.delete_by_filter(None, &low).await
            })
        };
        let reader = {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.get_list_by_filter(None, &Filter::all(), None).await })
        };

        writer.await??;
        let seen = reader.await??;
        // either before or after the delete, never in between
        assert!(seen.len() == 100 || seen.len() == 50);
        assert_eq!(store.len().await, 50);
        Ok(())
    }
}
