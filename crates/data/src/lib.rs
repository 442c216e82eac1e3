//! Generic CRUD data-access layer.
//! - Capability traits (`Getter`, `Writer`, `FilteredPageReader`, ...) that calling code depends on.
//! - In-memory stores guarded by a single reader/writer lock.
//! - A JSON flat-file persister and stores that load from and save to it.
//!
//! Swapping a store for a database-backed implementation of the same traits
//! leaves calling code untouched.

pub mod errors;
pub mod params;
pub mod page;
pub mod filter;
pub mod identity;
pub mod capabilities;
pub mod storage;
pub mod file;

pub use capabilities::{
    FilteredPageReader, FilteredReader, Getter, Loader, QuerablePageReader, QuerableReader, Saver, Setter, Writer,
};
pub use errors::DataError;
pub use file::file_store::{FileStore, IdentifiableFileStore};
pub use file::json_file_persister::JsonFilePersister;
pub use filter::{Filter, Predicate, SortFn};
pub use identity::{IdKey, Identifiable};
pub use page::DataPage;
pub use params::{FilterParams, PagingParams, SortField, SortParams};
pub use storage::identifiable_memory_store::IdentifiableMemoryStore;
pub use storage::memory_store::MemoryStore;
