//! In-memory [`Catalog`] for tests and local runs without a cluster
//!
//! Databases and collections keep insertion order, matching how a cluster
//! reports them. Queries are evaluated with [`QueryBuilder::apply`].

use async_trait::async_trait;
use bson::{doc, Document as BsonDocument, Timestamp};
use mongoscope_common::{MongoscopeError, Result};
use std::sync::{Arc, RwLock};

use crate::catalog::Catalog;
use crate::inspect::{OPLOG_COLLECTION, OPLOG_DATABASE};
use crate::query::QueryBuilder;

#[derive(Debug, Default)]
struct StoredDatabase {
    name: String,
    collections: Vec<(String, Vec<BsonDocument>)>,
}

/// Thread-safe in-memory cluster
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    databases: Arc<RwLock<Vec<StoredDatabase>>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty collection (and its database) if missing
    pub fn create_collection(&self, database: &str, collection: &str) -> Result<()> {
        self.with_collection(database, collection, |_| ())
    }

    /// Append a document to a collection, creating it if needed
    pub fn insert(&self, database: &str, collection: &str, document: BsonDocument) -> Result<()> {
        self.with_collection(database, collection, |docs| docs.push(document))
    }

    /// Append several documents to a collection, creating it if needed
    pub fn insert_many(
        &self,
        database: &str,
        collection: &str,
        documents: impl IntoIterator<Item = BsonDocument>,
    ) -> Result<()> {
        self.with_collection(database, collection, |docs| docs.extend(documents))
    }

    /// Record a write in `local.oplog.rs`
    pub fn record_oplog(&self, namespace: &str, op: &str, ts: Timestamp) -> Result<()> {
        self.insert(
            OPLOG_DATABASE,
            OPLOG_COLLECTION,
            doc! { "ts": ts, "op": op, "ns": namespace },
        )
    }

    fn with_collection<F>(&self, database: &str, collection: &str, f: F) -> Result<()>
    where
        F: FnOnce(&mut Vec<BsonDocument>),
    {
        let mut databases = self
            .databases
            .write()
            .map_err(|_| MongoscopeError::Internal("In-memory catalog lock poisoned".to_string()))?;

        let db_index = match databases.iter().position(|db| db.name == database) {
            Some(index) => index,
            None => {
                databases.push(StoredDatabase {
                    name: database.to_string(),
                    collections: Vec::new(),
                });
                databases.len() - 1
            }
        };
        let stored = &mut databases[db_index];

        let coll_index = match stored.collections.iter().position(|(name, _)| name == collection) {
            Some(index) => index,
            None => {
                stored.collections.push((collection.to_string(), Vec::new()));
                stored.collections.len() - 1
            }
        };

        f(&mut stored.collections[coll_index].1);
        Ok(())
    }

    fn read<T>(&self, f: impl FnOnce(&[StoredDatabase]) -> T) -> Result<T> {
        let databases = self
            .databases
            .read()
            .map_err(|_| MongoscopeError::Internal("In-memory catalog lock poisoned".to_string()))?;
        Ok(f(&databases))
    }
}

#[async_trait]
impl Catalog for InMemoryCatalog {
    async fn list_database_names(&self) -> Result<Vec<String>> {
        self.read(|dbs| dbs.iter().map(|db| db.name.clone()).collect())
    }

    async fn list_collection_names(&self, database: &str) -> Result<Vec<String>> {
        // Like MongoDB, an unknown database simply has no collections
        self.read(|dbs| {
            dbs.iter()
                .find(|db| db.name == database)
                .map(|db| db.collections.iter().map(|(name, _)| name.clone()).collect())
                .unwrap_or_default()
        })
    }

    async fn find(&self, database: &str, query: QueryBuilder) -> Result<Vec<BsonDocument>> {
        let documents = self.read(|dbs| {
            dbs.iter()
                .find(|db| db.name == database)
                .and_then(|db| {
                    db.collections
                        .iter()
                        .find(|(name, _)| name == query.collection_name())
                })
                .map(|(_, docs)| docs.clone())
                .unwrap_or_default()
        })?;
        query.apply(documents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_databases_keep_insertion_order() {
        let catalog = InMemoryCatalog::new();
        catalog.create_collection("zeta", "a").unwrap();
        catalog.create_collection("alpha", "b").unwrap();
        catalog.create_collection("zeta", "c").unwrap();

        assert_eq!(
            catalog.list_database_names().await.unwrap(),
            vec!["zeta", "alpha"]
        );
        assert_eq!(
            catalog.list_collection_names("zeta").await.unwrap(),
            vec!["a", "c"]
        );
    }

    #[tokio::test]
    async fn test_unknown_namespace_is_empty() {
        let catalog = InMemoryCatalog::new();
        assert!(catalog.list_collection_names("nope").await.unwrap().is_empty());
        assert!(catalog
            .find("nope", QueryBuilder::new("missing"))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_find_applies_query() {
        let catalog = InMemoryCatalog::new();
        catalog
            .insert_many(
                "metrics",
                "results",
                vec![doc! { "n": 1 }, doc! { "n": 3 }, doc! { "n": 2 }],
            )
            .unwrap();

        let docs = catalog
            .find(
                "metrics",
                QueryBuilder::new("results").sort(doc! { "n": -1 }).limit(2),
            )
            .await
            .unwrap();
        assert_eq!(docs, vec![doc! { "n": 3 }, doc! { "n": 2 }]);
    }

    #[tokio::test]
    async fn test_record_oplog_lands_in_local() {
        let catalog = InMemoryCatalog::new();
        catalog
            .record_oplog("metrics.results", "i", Timestamp { time: 1, increment: 1 })
            .unwrap();

        assert_eq!(catalog.list_database_names().await.unwrap(), vec!["local"]);
        let entries = catalog
            .find(OPLOG_DATABASE, QueryBuilder::new(OPLOG_COLLECTION))
            .await
            .unwrap();
        assert_eq!(entries[0].get_str("ns").unwrap(), "metrics.results");
    }
}
