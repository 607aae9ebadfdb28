//! Read-only access to a document database
//!
//! [`Catalog`] is the seam between the gateway and the driver. Every HTTP
//! request resolves to exactly one call on it.

use async_trait::async_trait;
use bson::{doc, Document as BsonDocument};
use futures::TryStreamExt;
use mongodb::Client;
use mongoscope_common::Result;

use crate::query::QueryBuilder;

/// Read-only view over a cluster
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Names of every database the cluster reports, in cluster order
    async fn list_database_names(&self) -> Result<Vec<String>>;

    /// Names of the collections in `database`
    async fn list_collection_names(&self, database: &str) -> Result<Vec<String>>;

    /// Run a find query against `database`, fully materializing the result
    async fn find(&self, database: &str, query: QueryBuilder) -> Result<Vec<BsonDocument>>;
}

/// [`Catalog`] backed by the MongoDB driver
#[derive(Clone)]
pub struct MongoCatalog {
    client: Client,
}

impl MongoCatalog {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Check that the cluster answers by pinging the admin database
    pub async fn ping(&self) -> Result<()> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await?;
        Ok(())
    }
}

#[async_trait]
impl Catalog for MongoCatalog {
    async fn list_database_names(&self) -> Result<Vec<String>> {
        let names = self.client.list_database_names().await?;
        Ok(names)
    }

    async fn list_collection_names(&self, database: &str) -> Result<Vec<String>> {
        let names = self.client.database(database).list_collection_names().await?;
        Ok(names)
    }

    async fn find(&self, database: &str, query: QueryBuilder) -> Result<Vec<BsonDocument>> {
        let collection = self
            .client
            .database(database)
            .collection::<BsonDocument>(query.collection_name());

        let cursor = collection
            .find(query.get_filter().clone())
            .with_options(query.find_options())
            .await?;

        let documents: Vec<BsonDocument> = cursor.try_collect().await?;
        Ok(documents)
    }
}
