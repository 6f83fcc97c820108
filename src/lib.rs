//! # mgo-rs
//!
//! MongoDB client helper: a one-time configured shared client with
//! deadline-bound CRUD passthroughs, a merge update that reconciles a partial
//! update with the stored document, and a translator from URL query
//! parameters to filters with sort and pagination.

pub mod config;
pub mod error;
pub mod logging;
pub mod mongo;
pub mod query;

pub use config::{AppConfig, ConfigLoader, MongoConfig};
pub use error::{Error, Result};
pub use mongo::{Lookup, MongoClient, SharedClient};
pub use query::{translate_query, translate_query_str, CoercionKind, Filter, FilterValue, FormatMap};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_reexports() {
        let format: FormatMap = [("age", "int")].into_iter().collect();
        assert_eq!(format.get("age"), Some(CoercionKind::Int));
        let filter: Filter = translate_query_str("age=7&limit=1", Some(&format)).unwrap();
        assert_eq!(filter.predicate("age"), Some(&FilterValue::Int(7)));

        let shared = SharedClient::new();
        assert!(matches!(shared.get(), Err(Error::NotConfigured)));
        assert!(MongoConfig::new("localhost", 27017).validate().is_ok());
    }
}
