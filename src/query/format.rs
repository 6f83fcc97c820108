//! Per-field coercion map
//!
//! The map tells the translator which query fields hold integers, unsigned
//! integers or booleans. Fields without an entry stay text.

use crate::error::{Error, Result};
use std::collections::HashMap;
use std::str::FromStr;

/// How a query value is coerced before it becomes a predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoercionKind {
    Int,
    UInt,
    Bool,
    Text,
}

impl CoercionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CoercionKind::Int => "int",
            CoercionKind::UInt => "uint",
            CoercionKind::Bool => "bool",
            CoercionKind::Text => "string",
        }
    }
}

impl FromStr for CoercionKind {
    type Err = std::convert::Infallible;

    /// Unknown kinds fall back to text
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s {
            "int" => CoercionKind::Int,
            "uint" => CoercionKind::UInt,
            "bool" => CoercionKind::Bool,
            _ => CoercionKind::Text,
        })
    }
}

/// Field name to coercion kind
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormatMap {
    kinds: HashMap<String, CoercionKind>,
}

impl FormatMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a kind for a field
    pub fn with(mut self, field: &str, kind: CoercionKind) -> Self {
        self.kinds.insert(field.to_string(), kind);
        self
    }

    pub fn insert(&mut self, field: &str, kind: CoercionKind) {
        self.kinds.insert(field.to_string(), kind);
    }

    pub fn get(&self, field: &str) -> Option<CoercionKind> {
        self.kinds.get(field).copied()
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    /// Parse the `request-format` payload: a flat JSON object of strings,
    /// e.g. `{"age":"int","active":"bool"}`.
    pub fn from_json(payload: &str) -> Result<Self> {
        let raw: HashMap<String, String> = serde_json::from_str(payload).map_err(|e| {
            Error::BadFormat(format!(
                "request-format must be a JSON object of strings: {}",
                e
            ))
        })?;

        Ok(raw.into_iter().collect())
    }
}

impl<K, V> FromIterator<(K, V)> for FormatMap
where
    K: Into<String>,
    V: AsRef<str>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let kinds = iter
            .into_iter()
            .map(|(field, kind)| {
                let kind = kind.as_ref().parse().unwrap_or(CoercionKind::Text);
                (field.into(), kind)
            })
            .collect();
        Self { kinds }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parsing() {
        assert_eq!("int".parse::<CoercionKind>(), Ok(CoercionKind::Int));
        assert_eq!("uint".parse::<CoercionKind>(), Ok(CoercionKind::UInt));
        assert_eq!("bool".parse::<CoercionKind>(), Ok(CoercionKind::Bool));
        assert_eq!("date".parse::<CoercionKind>(), Ok(CoercionKind::Text));
        assert_eq!("".parse::<CoercionKind>(), Ok(CoercionKind::Text));
    }

    #[test]
    fn test_from_json() {
        let map = FormatMap::from_json(r#"{"age":"int","active":"bool"}"#).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("age"), Some(CoercionKind::Int));
        assert_eq!(map.get("active"), Some(CoercionKind::Bool));
        assert_eq!(map.get("name"), None);
    }

    #[test]
    fn test_from_json_rejects_nested_values() {
        assert!(matches!(
            FormatMap::from_json(r#"{"age":{"type":"int"}}"#),
            Err(Error::BadFormat(_))
        ));
        assert!(matches!(
            FormatMap::from_json(r#"{"age":1}"#),
            Err(Error::BadFormat(_))
        ));
        assert!(matches!(
            FormatMap::from_json("age=int"),
            Err(Error::BadFormat(_))
        ));
    }

    #[test]
    fn test_collect_from_pairs() {
        let map: FormatMap = [("age", "int"), ("score", "uint")].into_iter().collect();
        assert_eq!(map.get("score"), Some(CoercionKind::UInt));
    }
}
