//! Query string translation
//!
//! Turns URL query parameters into a [`Filter`]. Reserved keys:
//!
//! - `sort`: comma separated field list, `-field` for descending
//! - `limit`: page size
//! - `offset` / `skip`: documents to skip
//! - `request-format`: JSON object mapping fields to coercion kinds
//!
//! Every other key becomes an equality predicate.

use super::filter::{upsert_sort, Filter, FilterValue, SortOrder};
use super::format::{CoercionKind, FormatMap};
use crate::error::{Error, Result};
use std::collections::BTreeMap;
use tracing::debug;
use url::Url;

pub const SORT_KEY: &str = "sort";
pub const LIMIT_KEY: &str = "limit";
pub const OFFSET_KEY: &str = "offset";
pub const SKIP_KEY: &str = "skip";
pub const REQUEST_FORMAT_KEY: &str = "request-format";

/// Translate decoded query pairs into a filter.
///
/// When `format` is `None` and a `request-format` parameter is present, its
/// payload is used as the format map. A repeated key keeps its last value.
pub fn translate_query<I, K, V>(params: I, format: Option<&FormatMap>) -> Result<Filter>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut values: BTreeMap<String, String> = BTreeMap::new();
    for (key, value) in params {
        values.insert(key.as_ref().to_string(), value.as_ref().to_string());
    }

    let embedded;
    let format = match (format, values.remove(REQUEST_FORMAT_KEY)) {
        (Some(explicit), _) => Some(explicit),
        (None, Some(payload)) => {
            embedded = FormatMap::from_json(&payload)?;
            Some(&embedded)
        }
        (None, None) => None,
    };

    let mut filter = Filter::new();
    for (key, value) in &values {
        match key.as_str() {
            SORT_KEY => filter.replace_sort(parse_sort(value)),
            LIMIT_KEY => filter.set_limit(parse_i64(key, value)?),
            OFFSET_KEY | SKIP_KEY => filter.set_skip(parse_skip(key, value)?),
            _ => {
                let kind = format
                    .and_then(|f| f.get(key))
                    .unwrap_or(CoercionKind::Text);
                filter.set_predicate(key, coerce(key, value, kind)?);
            }
        }
    }

    debug!(
        predicates = filter.predicates().len(),
        sort_keys = filter.sort().len(),
        limit = ?filter.pagination().limit,
        skip = ?filter.pagination().skip,
        "Translated query parameters"
    );

    Ok(filter)
}

/// Translate a raw query string such as `name=ana&sort=-age&limit=10`.
///
/// A leading `?` is ignored. Keys and values are form-decoded (`+` is a
/// space); a component that does not decode to UTF-8 is a parse error.
pub fn translate_query_str(query: &str, format: Option<&FormatMap>) -> Result<Filter> {
    let query = query.strip_prefix('?').unwrap_or(query);
    translate_query(decode_pairs(query)?, format)
}

/// Translate the query component of a URL
pub fn translate_url(url: &Url, format: Option<&FormatMap>) -> Result<Filter> {
    translate_query_str(url.query().unwrap_or_default(), format)
}

fn decode_pairs(query: &str) -> Result<Vec<(String, String)>> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let key = decode_component(key, key)?;
            let value = decode_component(&key, value)?;
            Ok((key, value))
        })
        .collect()
}

fn decode_component(field: &str, raw: &str) -> Result<String> {
    urlencoding::decode(&raw.replace('+', " "))
        .map(|decoded| decoded.into_owned())
        .map_err(|e| Error::parse(field, raw, e))
}

fn parse_sort(value: &str) -> Vec<(String, SortOrder)> {
    let mut sort = Vec::new();
    for token in value.split(',').map(str::trim) {
        let (field, order) = match token.strip_prefix('-') {
            Some(field) => (field, SortOrder::Descending),
            None => (token, SortOrder::Ascending),
        };
        if field.is_empty() {
            continue;
        }
        upsert_sort(&mut sort, field, order);
    }
    sort
}

fn parse_i64(key: &str, value: &str) -> Result<i64> {
    value.parse::<i64>().map_err(|e| Error::parse(key, value, e))
}

fn parse_skip(key: &str, value: &str) -> Result<u64> {
    let skip = parse_i64(key, value)?;
    u64::try_from(skip).map_err(|_| Error::parse(key, value, "skip must not be negative"))
}

fn coerce(key: &str, value: &str, kind: CoercionKind) -> Result<FilterValue> {
    match kind {
        CoercionKind::Int => parse_i64(key, value).map(FilterValue::Int),
        CoercionKind::UInt => value
            .parse::<u64>()
            .map(FilterValue::UInt)
            .map_err(|e| Error::parse(key, value, e)),
        CoercionKind::Bool => parse_bool(value)
            .map(FilterValue::Bool)
            .ok_or_else(|| Error::parse(key, value, "invalid boolean")),
        CoercionKind::Text => Ok(FilterValue::Text(value.to_string())),
    }
}

/// Accepts 1, t, T, TRUE, true, True, 0, f, F, FALSE, false, False
fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}
