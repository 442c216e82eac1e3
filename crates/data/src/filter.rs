//! Predicate lists evaluated by the in-memory stores.

use std::cmp::Ordering;
use std::fmt;

pub type Predicate<T> = Box<dyn Fn(&T) -> bool + Send + Sync>;

/// Comparator applied to matches before paging.
pub type SortFn<T> = dyn Fn(&T, &T) -> Ordering + Send + Sync;

/// Ordered set of predicates; an item matches when every predicate accepts it.
pub struct Filter<T> {
    predicates: Vec<Predicate<T>>,
}

impl<T> Filter<T> {
    /// Filter that accepts every item.
    pub fn all() -> Self {
        Self { predicates: Vec::new() }
    }

    pub fn and<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.predicates.push(Box::new(predicate));
        self
    }

    pub fn push(&mut self, predicate: Predicate<T>) {
        self.predicates.push(predicate);
    }

    pub fn matches(&self, item: &T) -> bool {
        self.predicates.iter().all(|p| p(item))
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }
}

impl<T> Default for Filter<T> {
    fn default() -> Self {
        Self::all()
    }
}

impl<T> From<Vec<Predicate<T>>> for Filter<T> {
    fn from(predicates: Vec<Predicate<T>>) -> Self {
        Self { predicates }
    }
}

impl<T> fmt::Debug for Filter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Filter").field("predicates", &self.predicates.len()).finish()
    }
}
