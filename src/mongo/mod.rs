//! MongoDB connection and CRUD passthroughs
//!
//! [`SharedClient`] holds the one client the application uses; each
//! [`MongoClient`] operation is a single deadline-bound driver call.

pub mod client;
pub mod merge;
pub mod uri;

pub use client::{Lookup, MongoClient, SharedClient};
pub use merge::{merge_missing, split_update};
pub use uri::{build_uri, redacted_uri};
