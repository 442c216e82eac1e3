//! Request parameter types shared by the readers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Skip/take window over a filtered result.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagingParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub take: Option<usize>,
    /// Ask for the total number of matches alongside the page.
    #[serde(default)]
    pub total: bool,
}

impl PagingParams {
    pub fn new(skip: Option<usize>, take: Option<usize>, total: bool) -> Self {
        Self { skip, take, total }
    }

    pub fn skip_or(&self, default: usize) -> usize {
        self.skip.unwrap_or(default)
    }

    /// Requested take, defaulting to and capped by `max`.
    pub fn take_or(&self, max: usize) -> usize {
        match self.take {
            Some(take) => take.min(max),
            None => max,
        }
    }
}

/// Caller supplied filter values, translated into predicates by a domain persistence.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterParams(BTreeMap<String, String>);

impl FilterParams {
    pub fn new() -> Self { Self::default() }

    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortField {
    pub name: String,
    #[serde(default = "ascending_default")]
    pub ascending: bool,
}

fn ascending_default() -> bool { true }

impl SortField {
    pub fn asc(name: impl Into<String>) -> Self { Self { name: name.into(), ascending: true } }
    pub fn desc(name: impl Into<String>) -> Self { Self { name: name.into(), ascending: false } }
}

/// Ordered sort fields; the first field is the primary key.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortParams(pub Vec<SortField>);

impl SortParams {
    pub fn by(field: SortField) -> Self { Self(vec![field]) }

    pub fn fields(&self) -> &[SortField] { &self.0 }
}
