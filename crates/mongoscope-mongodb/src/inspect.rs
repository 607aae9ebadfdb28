//! Introspection operations served by the gateway
//!
//! Each function issues exactly one query through a [`Catalog`]. The query
//! shapes live here so the driver-backed and in-memory catalogs run the same
//! queries.

use bson::{doc, DateTime, Document as BsonDocument};
use mongoscope_common::{MongoscopeError, Result};

use crate::catalog::Catalog;
use crate::query::QueryBuilder;
use crate::timestamp::HasEmbeddedTimestamp;

/// Databases hidden from listings (exact, case-sensitive match)
pub const SYSTEM_DATABASES: &[&str] = &["admin", "config", "local"];

/// Field collection data is ordered by, highest first
pub const SORT_FIELD: &str = "Percentile";

/// Database holding the replication log
pub const OPLOG_DATABASE: &str = "local";

/// Collection holding the replication log
pub const OPLOG_COLLECTION: &str = "oplog.rs";

/// Oplog operation kinds counted as writes: insert and update
pub const WRITE_OPS: &[&str] = &["i", "u"];

/// Every document, `Percentile` descending
pub fn collection_data_query(collection: &str) -> QueryBuilder {
    QueryBuilder::new(collection).sort(doc! { SORT_FIELD: -1 })
}

/// The document with the greatest `_id`
pub fn latest_document_query(collection: &str) -> QueryBuilder {
    QueryBuilder::new(collection).sort(doc! { "_id": -1 }).limit(1)
}

/// The newest insert or update recorded for `namespace`
pub fn oplog_query(namespace: &str) -> QueryBuilder {
    QueryBuilder::new(OPLOG_COLLECTION)
        .filter(doc! { "ns": namespace, "op": { "$in": WRITE_OPS } })
        .sort(doc! { "ts": -1 })
        .limit(1)
}

/// `<database>.<collection>`, the namespace format used by the oplog
pub fn namespace(database: &str, collection: &str) -> String {
    format!("{}.{}", database, collection)
}

/// Database names without the system databases, in cluster order
pub async fn list_user_databases(catalog: &dyn Catalog) -> Result<Vec<String>> {
    let names = catalog.list_database_names().await?;
    Ok(names
        .into_iter()
        .filter(|name| !SYSTEM_DATABASES.contains(&name.as_str()))
        .collect())
}

pub async fn list_collections(catalog: &dyn Catalog, database: &str) -> Result<Vec<String>> {
    catalog.list_collection_names(database).await
}

/// All documents of a collection, `Percentile` descending
pub async fn collection_data(
    catalog: &dyn Catalog,
    database: &str,
    collection: &str,
) -> Result<Vec<BsonDocument>> {
    catalog.find(database, collection_data_query(collection)).await
}

/// Creation time of the newest document, derived from its `_id`
///
/// Returns `Ok(None)` for an empty collection. A newest document whose `_id`
/// carries no timestamp (e.g. a caller-assigned integer) is a query error.
pub async fn last_update_by_id(
    catalog: &dyn Catalog,
    database: &str,
    collection: &str,
) -> Result<Option<DateTime>> {
    let latest = catalog
        .find(database, latest_document_query(collection))
        .await?;

    let Some(document) = latest.into_iter().next() else {
        return Ok(None);
    };

    let id = document.get("_id").ok_or_else(|| {
        MongoscopeError::Query(format!(
            "Latest document in {} has no _id",
            namespace(database, collection)
        ))
    })?;

    id.embedded_timestamp().map(Some).ok_or_else(|| {
        MongoscopeError::Query(format!(
            "_id of latest document in {} carries no timestamp: {}",
            namespace(database, collection),
            id
        ))
    })
}

/// Time of the newest insert or update recorded in the oplog
///
/// Returns `Ok(None)` when the oplog has no matching entry. Requires a
/// replica set (or single-node replica set) exposing `local.oplog.rs`.
pub async fn last_update_by_oplog(
    catalog: &dyn Catalog,
    database: &str,
    collection: &str,
) -> Result<Option<DateTime>> {
    let ns = namespace(database, collection);
    let entries = catalog.find(OPLOG_DATABASE, oplog_query(&ns)).await?;

    let Some(entry) = entries.into_iter().next() else {
        return Ok(None);
    };

    entry
        .get("ts")
        .and_then(|ts| ts.embedded_timestamp())
        .map(Some)
        .ok_or_else(|| MongoscopeError::Query(format!("Oplog entry for {} has no ts", ns)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryCatalog;
    use bson::{oid::ObjectId, Bson, Timestamp};

    fn oid_at(seconds: u32) -> ObjectId {
        let mut bytes = [0u8; 12];
        bytes[..4].copy_from_slice(&seconds.to_be_bytes());
        bytes[11] = 1;
        ObjectId::from_bytes(bytes)
    }

    #[test]
    fn test_query_shapes() {
        let data = collection_data_query("results");
        assert_eq!(data.get_sort(), Some(&doc! { "Percentile": -1 }));
        assert!(data.get_limit().is_none());

        let latest = latest_document_query("results");
        assert_eq!(latest.get_sort(), Some(&doc! { "_id": -1 }));
        assert_eq!(latest.get_limit(), Some(1));

        let oplog = oplog_query("metrics.results");
        assert_eq!(oplog.collection_name(), "oplog.rs");
        assert_eq!(
            oplog.get_filter(),
            &doc! { "ns": "metrics.results", "op": { "$in": ["i", "u"] } }
        );
        assert_eq!(oplog.get_sort(), Some(&doc! { "ts": -1 }));
        assert_eq!(oplog.get_limit(), Some(1));
    }

    #[tokio::test]
    async fn test_system_databases_are_hidden() {
        let catalog = InMemoryCatalog::new();
        for db in ["admin", "metrics", "config", "Admin", "local", "loadtest"] {
            catalog.create_collection(db, "c").unwrap();
        }
        let names = list_user_databases(&catalog).await.unwrap();
        assert_eq!(names, vec!["metrics", "Admin", "loadtest"]);
    }

    #[tokio::test]
    async fn test_empty_cluster_lists_nothing() {
        let catalog = InMemoryCatalog::new();
        catalog.create_collection("admin", "system.version").unwrap();
        assert!(list_user_databases(&catalog).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_collection_data_sorted_by_percentile() {
        let catalog = InMemoryCatalog::new();
        catalog
            .insert_many(
                "metrics",
                "results",
                vec![
                    doc! { "Percentile": 90 },
                    doc! { "Percentile": 50 },
                    doc! { "Percentile": 99 },
                ],
            )
            .unwrap();
        let docs = collection_data(&catalog, "metrics", "results").await.unwrap();
        let values: Vec<i32> = docs.iter().map(|d| d.get_i32("Percentile").unwrap()).collect();
        assert_eq!(values, vec![99, 90, 50]);
    }

    #[tokio::test]
    async fn test_last_update_by_id() {
        let catalog = InMemoryCatalog::new();
        catalog.create_collection("metrics", "results").unwrap();
        assert_eq!(last_update_by_id(&catalog, "metrics", "results").await.unwrap(), None);

        catalog
            .insert_many(
                "metrics",
                "results",
                vec![
                    doc! { "_id": oid_at(1_700_000_100) },
                    doc! { "_id": oid_at(1_700_000_300) },
                    doc! { "_id": oid_at(1_700_000_200) },
                ],
            )
            .unwrap();
        let ts = last_update_by_id(&catalog, "metrics", "results").await.unwrap();
        assert_eq!(ts, Some(DateTime::from_millis(1_700_000_300_000)));
    }

    #[tokio::test]
    async fn test_last_update_by_id_without_object_id_fails() {
        let catalog = InMemoryCatalog::new();
        catalog.insert("metrics", "results", doc! { "_id": 7 }).unwrap();
        let err = last_update_by_id(&catalog, "metrics", "results").await.unwrap_err();
        assert!(matches!(err, MongoscopeError::Query(_)));
    }

    #[tokio::test]
    async fn test_last_update_by_oplog_picks_newest_write() {
        let catalog = InMemoryCatalog::new();
        let ts = |time| Timestamp { time, increment: 1 };
        catalog.record_oplog("metrics.results", "i", ts(100)).unwrap();
        catalog.record_oplog("metrics.results", "u", ts(300)).unwrap();
        catalog.record_oplog("metrics.results", "d", ts(400)).unwrap();
        catalog.record_oplog("metrics.results", "n", ts(450)).unwrap();
        catalog.record_oplog("metrics.other", "u", ts(500)).unwrap();

        let latest = last_update_by_oplog(&catalog, "metrics", "results").await.unwrap();
        assert_eq!(latest, Some(DateTime::from_millis(300_000)));
    }

    #[tokio::test]
    async fn test_last_update_by_oplog_without_match() {
        let catalog = InMemoryCatalog::new();
        catalog.record_oplog("metrics.other", "i", Timestamp { time: 1, increment: 1 }).unwrap();
        let latest = last_update_by_oplog(&catalog, "metrics", "results").await.unwrap();
        assert!(latest.is_none());
    }

    #[tokio::test]
    async fn test_oplog_reflects_updates_after_last_insert() {
        let catalog = InMemoryCatalog::new();
        let inserted = oid_at(1_700_000_000);
        catalog.insert("metrics", "results", doc! { "_id": inserted }).unwrap();
        catalog
            .record_oplog("metrics.results", "i", Timestamp { time: 1_700_000_000, increment: 1 })
            .unwrap();
        catalog
            .record_oplog("metrics.results", "u", Timestamp { time: 1_700_000_900, increment: 1 })
            .unwrap();

        let by_id = last_update_by_id(&catalog, "metrics", "results").await.unwrap().unwrap();
        let by_oplog = last_update_by_oplog(&catalog, "metrics", "results").await.unwrap().unwrap();
        assert!(by_oplog >= by_id);
        assert_eq!(Bson::ObjectId(inserted).embedded_timestamp(), Some(by_id));
    }
}
