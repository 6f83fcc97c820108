//! MongoDB client and shared handle
//!
//! Every operation runs under the configured deadline (10 seconds by default)
//! and targets the database/collection pair given by the caller. Driver errors
//! are returned as [`Error::Driver`] without reclassification.

use super::merge::{merge_missing, split_update};
use super::uri::{build_uri, redacted_uri};
use crate::config::MongoConfig;
use crate::error::{Error, Result};
use crate::query::Filter;
use futures::stream::TryStreamExt;
use mongodb::{
    bson::{self, doc, oid::ObjectId, Document},
    options::{ClientOptions, IndexOptions, ReadPreference, SelectionCriteria},
    Client, Collection, IndexModel,
};
use serde::{de::DeserializeOwned, Serialize};
use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

/// `$lookup` stage description for joined reads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lookup {
    /// Collection to join
    pub from: String,
    /// Field of the queried collection
    pub local_field: String,
    /// Field of the joined collection
    pub foreign_field: String,
    /// Output array field
    pub as_field: String,
}

impl Lookup {
    pub fn new(from: &str, local_field: &str, foreign_field: &str, as_field: &str) -> Self {
        Self {
            from: from.to_string(),
            local_field: local_field.to_string(),
            foreign_field: foreign_field.to_string(),
            as_field: as_field.to_string(),
        }
    }

    /// Aggregation stages for this lookup, with an optional `$unwind` that
    /// keeps documents without a match.
    pub fn stages(&self, unwind: bool) -> Vec<Document> {
        let mut stages = vec![doc! {
            "$lookup": {
                "from": self.from.as_str(),
                "localField": self.local_field.as_str(),
                "foreignField": self.foreign_field.as_str(),
                "as": self.as_field.as_str(),
            }
        }];
        if unwind {
            stages.push(doc! {
                "$unwind": {
                    "path": format!("${}", self.as_field),
                    "preserveNullAndEmptyArrays": true,
                }
            });
        }
        stages
    }
}

/// Connected MongoDB client
#[derive(Clone)]
pub struct MongoClient {
    client: Client,
    config: Arc<MongoConfig>,
}

impl MongoClient {
    /// Build a client from settings and verify the primary answers `ping`
    pub async fn connect(config: MongoConfig) -> Result<Self> {
        config.validate()?;

        let uri = build_uri(&config);
        info!(uri = %redacted_uri(&config), "Connecting to MongoDB");

        let mut client_options = ClientOptions::parse(&uri)
            .await
            .map_err(|e| Error::Connection(format!("Invalid connection string: {}", e)))?;

        if let Some(max) = config.max_pool_size {
            client_options.max_pool_size = Some(max);
        }
        if let Some(min) = config.min_pool_size {
            client_options.min_pool_size = Some(min);
        }
        if let Some(secs) = config.connect_timeout_secs {
            client_options.connect_timeout = Some(Duration::from_secs(secs));
        }
        if let Some(secs) = config.server_selection_timeout_secs {
            client_options.server_selection_timeout = Some(Duration::from_secs(secs));
        }
        if let Some(ref app_name) = config.app_name {
            client_options.app_name = Some(app_name.clone());
        }

        let client = Client::with_options(client_options)
            .map_err(|e| Error::Connection(format!("Failed to create client: {}", e)))?;

        let mongo = Self {
            client,
            config: Arc::new(config),
        };

        mongo
            .ping()
            .await
            .map_err(|e| Error::Connection(format!("Ping to primary failed: {}", e)))?;

        info!(host = %mongo.config.host, "MongoDB connection established");
        Ok(mongo)
    }

    /// Underlying driver client
    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn config(&self) -> &MongoConfig {
        &self.config
    }

    /// Deadline applied to each operation
    pub fn operation_timeout(&self) -> Duration {
        self.config.operation_timeout()
    }

    /// Liveness check against the primary
    pub async fn ping(&self) -> Result<()> {
        let admin = self.client.database("admin");
        let command = admin
            .run_command(doc! { "ping": 1 })
            .selection_criteria(SelectionCriteria::ReadPreference(ReadPreference::Primary));
        self.with_deadline("ping", command).await?;
        Ok(())
    }

    /// Insert a document and return its generated id
    pub async fn create<T>(&self, document: &T, collection: &str, database: &str) -> Result<ObjectId>
    where
        T: Serialize + Send + Sync,
    {
        debug!(database, collection, "create");
        let coll = self.collection::<T>(database, collection);
        let result = self.with_deadline("create", coll.insert_one(document)).await?;

        result.inserted_id.as_object_id().ok_or_else(|| {
            Error::Decode(format!(
                "inserted id is not an ObjectId: {}",
                result.inserted_id
            ))
        })
    }

    /// Apply `update` as a field-level `$set` on the first match
    pub async fn update<U>(
        &self,
        filter: Document,
        update: &U,
        collection: &str,
        database: &str,
    ) -> Result<()>
    where
        U: Serialize + ?Sized,
    {
        debug!(database, collection, "update");
        let set = bson::to_document(update).map_err(|e| Error::Encode(e.to_string()))?;
        let coll = self.collection::<Document>(database, collection);
        self.with_deadline("update", coll.update_one(filter, doc! { "$set": set }))
            .await?;
        Ok(())
    }

    /// Update the first match and reconcile `update` with its previous state.
    ///
    /// `$push` becomes `$addToSet`, `$inc` is kept and all other fields are
    /// `$set`. Afterwards `update` holds the previous document with the plain
    /// fields of the update applied on top; the two operators are dropped.
    pub async fn get_and_update<T>(
        &self,
        filter: Document,
        update: &mut T,
        collection: &str,
        database: &str,
    ) -> Result<()>
    where
        T: Serialize + DeserializeOwned,
    {
        debug!(database, collection, "get_and_update");
        let mut partial = bson::to_document(&*update).map_err(|e| Error::Encode(e.to_string()))?;
        let modifications = split_update(&mut partial);

        let coll = self.collection::<Document>(database, collection);
        let previous = self
            .with_deadline(
                "get_and_update",
                coll.find_one_and_update(filter, modifications),
            )
            .await?
            .ok_or_else(|| Error::NotFound {
                collection: collection.to_string(),
            })?;

        let merged = merge_missing(previous, &partial);
        *update = bson::from_document(merged).map_err(|e| Error::Decode(e.to_string()))?;
        Ok(())
    }

    /// Decode the first document matching `filter`
    pub async fn get_one<T>(&self, filter: Document, collection: &str, database: &str) -> Result<T>
    where
        T: DeserializeOwned + Send + Sync,
    {
        debug!(database, collection, "get_one");
        let coll = self.collection::<T>(database, collection);
        self.with_deadline("get_one", coll.find_one(filter))
            .await?
            .ok_or_else(|| Error::NotFound {
                collection: collection.to_string(),
            })
    }

    /// Decode every document matching a translated filter, honouring its sort
    /// and pagination
    pub async fn get_all<T>(&self, filter: &Filter, collection: &str, database: &str) -> Result<Vec<T>>
    where
        T: DeserializeOwned + Unpin + Send + Sync,
    {
        debug!(
            database,
            collection,
            predicates = filter.predicates().len(),
            "get_all"
        );
        let predicates = filter.to_document()?;
        let options = filter.find_options();
        let coll = self.collection::<T>(database, collection);

        let find = async {
            let cursor = coll.find(predicates).with_options(options).await?;
            cursor.try_collect::<Vec<T>>().await
        };
        self.with_deadline("get_all", find).await
    }

    /// Run `$match` + `$lookup` (+ `$unwind`) and decode the joined documents
    pub async fn get_joined<T>(
        &self,
        filter: Document,
        lookup: &Lookup,
        unwind: bool,
        collection: &str,
        database: &str,
    ) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
    {
        debug!(database, collection, from = %lookup.from, unwind, "get_joined");
        let mut pipeline = vec![doc! { "$match": filter }];
        pipeline.extend(lookup.stages(unwind));

        let coll = self.collection::<Document>(database, collection);
        let aggregate = async {
            let cursor = coll.aggregate(pipeline).await?;
            cursor.try_collect::<Vec<Document>>().await
        };
        let documents = self.with_deadline("get_joined", aggregate).await?;

        documents
            .into_iter()
            .map(|d| bson::from_document(d).map_err(|e| Error::Decode(e.to_string())))
            .collect()
    }

    /// Delete the first match, returning how many documents were removed
    pub async fn delete(&self, filter: Document, collection: &str, database: &str) -> Result<u64> {
        debug!(database, collection, "delete");
        let coll = self.collection::<Document>(database, collection);
        let result = self.with_deadline("delete", coll.delete_one(filter)).await?;
        Ok(result.deleted_count)
    }

    /// Count documents matching `filter`
    pub async fn count(&self, filter: Document, collection: &str, database: &str) -> Result<u64> {
        debug!(database, collection, "count");
        let coll = self.collection::<Document>(database, collection);
        self.with_deadline("count", coll.count_documents(filter)).await
    }

    /// Create an index over `keys`, returning its name
    pub async fn create_index(
        &self,
        keys: Document,
        unique: bool,
        collection: &str,
        database: &str,
    ) -> Result<String> {
        debug!(database, collection, unique, "create_index");
        let mut index_options = IndexOptions::default();
        index_options.unique = Some(unique);
        let model = IndexModel::builder()
            .keys(keys)
            .options(index_options)
            .build();

        let coll = self.collection::<Document>(database, collection);
        let result = self
            .with_deadline("create_index", coll.create_index(model))
            .await?;
        Ok(result.index_name)
    }

    fn collection<T: Send + Sync>(&self, database: &str, collection: &str) -> Collection<T> {
        self.client.database(database).collection::<T>(collection)
    }

    async fn with_deadline<T, F>(&self, operation: &'static str, op: F) -> Result<T>
    where
        F: IntoFuture<Output = mongodb::error::Result<T>>,
    {
        let timeout = self.operation_timeout();
        match tokio::time::timeout(timeout, op.into_future()).await {
            Ok(result) => result.map_err(Error::from),
            Err(_) => {
                warn!(operation, ?timeout, "MongoDB operation timed out");
                Err(Error::Timeout { operation, timeout })
            }
        }
    }
}

/// One-time initialized client shared by the application.
///
/// The first `configure` call connects; concurrent callers wait for it and
/// every later call returns the same client without reconnecting.
#[derive(Default)]
pub struct SharedClient {
    cell: OnceCell<MongoClient>,
}

impl SharedClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Connect with `config` unless a client already exists
    pub async fn configure(&self, config: MongoConfig) -> Result<&MongoClient> {
        let mut initialized = false;
        let client = self
            .cell
            .get_or_try_init(|| {
                initialized = true;
                MongoClient::connect(config)
            })
            .await?;

        if !initialized {
            warn!("MongoDB client already configured, ignoring new settings");
        }
        Ok(client)
    }

    /// Connect from individual settings
    pub async fn configure_with(
        &self,
        username: &str,
        password: &str,
        host: &str,
        port: u16,
        auth_database: &str,
        remote: bool,
    ) -> Result<&MongoClient> {
        let config = MongoConfig::new(host, port)
            .with_credentials(username, password)
            .with_auth_database(auth_database)
            .with_remote(remote);
        self.configure(config).await
    }

    /// The configured client
    pub fn get(&self) -> Result<&MongoClient> {
        self.cell.get().ok_or(Error::NotConfigured)
    }

    pub fn is_configured(&self) -> bool {
        self.cell.initialized()
    }
}
