//! URL query parameters to MongoDB filters

pub mod filter;
pub mod format;
pub mod translate;

pub use filter::{Filter, FilterValue, Pagination, SortOrder};
pub use format::{CoercionKind, FormatMap};
pub use translate::{translate_query, translate_query_str, translate_url};
