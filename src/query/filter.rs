//! Filter types produced by query translation
//!
//! A [`Filter`] carries the equality predicates, sort keys and pagination
//! extracted from one request. It is built once and read-only afterwards.

use crate::error::{Error, Result};
use mongodb::{
    bson::{Bson, Document},
    options::FindOptions,
};
use std::collections::BTreeMap;
use std::fmt;

/// Typed predicate value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    /// Raw query text
    Text(String),
    /// Signed integer (`int` coercion)
    Int(i64),
    /// Unsigned integer (`uint` coercion)
    UInt(u64),
    /// Boolean (`bool` coercion)
    Bool(bool),
}

impl FilterValue {
    /// Convert to a BSON value.
    ///
    /// BSON has no unsigned 64-bit type, so `UInt` values above `i64::MAX`
    /// cannot be stored and fail with an encode error.
    pub fn to_bson(&self) -> Result<Bson> {
        match self {
            FilterValue::Text(s) => Ok(Bson::String(s.clone())),
            FilterValue::Int(i) => Ok(Bson::Int64(*i)),
            FilterValue::UInt(u) => i64::try_from(*u).map(Bson::Int64).map_err(|_| {
                Error::Encode(format!("unsigned value {} exceeds the BSON int64 range", u))
            }),
            FilterValue::Bool(b) => Ok(Bson::Boolean(*b)),
        }
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterValue::Text(s) => write!(f, "{}", s),
            FilterValue::Int(i) => write!(f, "{}", i),
            FilterValue::UInt(u) => write!(f, "{}", u),
            FilterValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::Text(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::Text(value)
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        FilterValue::Int(value)
    }
}

impl From<u64> for FilterValue {
    fn from(value: u64) -> Self {
        FilterValue::UInt(value)
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        FilterValue::Bool(value)
    }
}

/// Sort direction of a single key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    /// MongoDB sort value (1 or -1)
    pub fn as_i32(self) -> i32 {
        match self {
            SortOrder::Ascending => 1,
            SortOrder::Descending => -1,
        }
    }
}

/// Limit and skip extracted from the query
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pagination {
    pub limit: Option<i64>,
    pub skip: Option<u64>,
}

/// Predicates, sort and pagination for a find operation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    predicates: BTreeMap<String, FilterValue>,
    sort: Vec<(String, SortOrder)>,
    pagination: Pagination,
}

impl Filter {
    /// Filter matching every document
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an equality predicate
    pub fn with_predicate(mut self, field: &str, value: impl Into<FilterValue>) -> Self {
        self.set_predicate(field, value.into());
        self
    }

    /// Add a sort key
    pub fn with_sort(mut self, field: &str, order: SortOrder) -> Self {
        self.push_sort(field, order);
        self
    }

    /// Set the page size
    pub fn with_limit(mut self, limit: i64) -> Self {
        self.pagination.limit = Some(limit);
        self
    }

    /// Set the number of documents to skip
    pub fn with_skip(mut self, skip: u64) -> Self {
        self.pagination.skip = Some(skip);
        self
    }

    pub fn predicates(&self) -> &BTreeMap<String, FilterValue> {
        &self.predicates
    }

    pub fn predicate(&self, field: &str) -> Option<&FilterValue> {
        self.predicates.get(field)
    }

    /// Sort keys in the order they were requested
    pub fn sort(&self) -> &[(String, SortOrder)] {
        &self.sort
    }

    /// Direction for one sort field
    pub fn sort_order(&self, field: &str) -> Option<SortOrder> {
        self.sort
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, order)| *order)
    }

    pub fn pagination(&self) -> Pagination {
        self.pagination
    }

    /// Predicates rendered as a BSON filter document
    pub fn to_document(&self) -> Result<Document> {
        let mut doc = Document::new();
        for (field, value) in &self.predicates {
            doc.insert(field.clone(), value.to_bson()?);
        }
        Ok(doc)
    }

    /// Sort keys rendered as a BSON sort document, if any were requested
    pub fn sort_document(&self) -> Option<Document> {
        if self.sort.is_empty() {
            return None;
        }
        let mut doc = Document::new();
        for (field, order) in &self.sort {
            doc.insert(field.clone(), order.as_i32());
        }
        Some(doc)
    }

    /// Driver find options carrying sort and pagination
    pub fn find_options(&self) -> FindOptions {
        let mut options = FindOptions::default();
        options.sort = self.sort_document();
        options.limit = self.pagination.limit;
        options.skip = self.pagination.skip;
        options
    }

    pub(crate) fn set_predicate(&mut self, field: &str, value: FilterValue) {
        self.predicates.insert(field.to_string(), value);
    }

    /// Replace the whole sort specification
    pub(crate) fn replace_sort(&mut self, sort: Vec<(String, SortOrder)>) {
        self.sort = sort;
    }

    /// Insert or overwrite one sort key, keeping its first position
    pub(crate) fn push_sort(&mut self, field: &str, order: SortOrder) {
        upsert_sort(&mut self.sort, field, order);
    }

    pub(crate) fn set_limit(&mut self, limit: i64) {
        self.pagination.limit = Some(limit);
    }

    pub(crate) fn set_skip(&mut self, skip: u64) {
        self.pagination.skip = Some(skip);
    }
}

pub(crate) fn upsert_sort(sort: &mut Vec<(String, SortOrder)>, field: &str, order: SortOrder) {
    match sort.iter_mut().find(|(name, _)| name == field) {
        Some(entry) => entry.1 = order,
        None => sort.push((field.to_string(), order)),
    }
}
