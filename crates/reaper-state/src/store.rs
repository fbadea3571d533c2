//! RegistryStore — redb-backed persistence for resource records.
//!
//! Provides the three registry operations the cleanup engine needs:
//! upsert one record, fetch every record of an instance, delete one
//! record. Values are JSON-serialized into redb's `&[u8]` value column.
//! The store supports both on-disk and in-memory backends (the latter for
//! testing), and the table name is supplied by the caller so deployments
//! can point several engines at one database file.

use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use tracing::debug;

use crate::error::{RegistryError, RegistryResult};
use crate::types::ResourceRecord;

/// Table name used when the deployment does not configure one.
pub const DEFAULT_TABLE: &str = "resources";

/// Convert any `Display` error into a `RegistryError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| RegistryError::$variant(e.to_string())
    };
}

/// Thread-safe resource registry backed by redb.
#[derive(Clone)]
pub struct RegistryStore {
    db: Arc<Database>,
    table: String,
}

impl RegistryStore {
    /// Open (or create) a persistent registry at the given path, using the
    /// given table within the database file.
    pub fn open(path: &Path, table: &str) -> RegistryResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let store = Self {
            db: Arc::new(db),
            table: table.to_string(),
        };
        store.ensure_table()?;
        debug!(?path, table, "registry opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory registry (for testing).
    pub fn open_in_memory() -> RegistryResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self {
            db: Arc::new(db),
            table: DEFAULT_TABLE.to_string(),
        };
        store.ensure_table()?;
        debug!("in-memory registry opened");
        Ok(store)
    }

    /// Name of the table this store reads and writes.
    pub fn table(&self) -> &str {
        &self.table
    }

    fn table_def(&self) -> TableDefinition<'_, &'static str, &'static [u8]> {
        TableDefinition::new(&self.table)
    }

    /// Create the table if it doesn't exist yet.
    fn ensure_table(&self) -> RegistryResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        // Opening a table in a write transaction creates it if absent.
        txn.open_table(self.table_def()).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    /// Insert or update a resource record, keyed by `(instance, name)`.
    ///
    /// Overwrites silently: re-registering a resource replaces its
    /// previous record.
    pub fn put_record(&self, record: &ResourceRecord) -> RegistryResult<()> {
        let key = record.table_key();
        let value = serde_json::to_vec(record).map_err(map_err!(Serialize))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(self.table_def()).map_err(map_err!(Table))?;
            table
                .insert(key.as_str(), value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%key, "resource record stored");
        Ok(())
    }

    /// Get a single record by its `(instance, name)` key.
    pub fn get_record(
        &self,
        instance: &str,
        name: &str,
    ) -> RegistryResult<Option<ResourceRecord>> {
        let key = format!("{instance}:{name}");
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(self.table_def()).map_err(map_err!(Table))?;
        match table.get(key.as_str()).map_err(map_err!(Read))? {
            Some(guard) => {
                let record: ResourceRecord =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    /// List every record tracked for the given instance.
    ///
    /// Ordering is an iteration detail of the store, not a contract; the
    /// cleanup engine imposes its own grouping order.
    pub fn records_for_instance(&self, instance: &str) -> RegistryResult<Vec<ResourceRecord>> {
        let prefix = format!("{instance}:");
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(self.table_def()).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (key, value) = entry.map_err(map_err!(Read))?;
            if key.value().starts_with(&prefix) {
                let record: ResourceRecord =
                    serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
                results.push(record);
            }
        }
        Ok(results)
    }

    /// Delete one record by key. Returns true if it existed.
    ///
    /// Deleting a key that is not present is a no-op, not an error.
    pub fn delete_record(&self, instance: &str, name: &str) -> RegistryResult<bool> {
        let key = format!("{instance}:{name}");
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let existed;
        {
            let mut table = txn.open_table(self.table_def()).map_err(map_err!(Table))?;
            existed = table.remove(key.as_str()).map_err(map_err!(Write))?.is_some();
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%key, existed, "resource record deleted");
        Ok(existed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ResourceProperties;
    use serde_json::{json, Map};

    fn test_record(instance: &str, name: &str, service: &str) -> ResourceRecord {
        let mut kwargs = Map::new();
        kwargs.insert("Id".to_string(), json!(name));
        ResourceRecord {
            instance: instance.to_string(),
            name: name.to_string(),
            properties: ResourceProperties {
                service: service.to_string(),
                resource: "network_interface".to_string(),
                kwargs,
            },
        }
    }

    // ── Record CRUD ────────────────────────────────────────────────

    #[test]
    fn record_put_and_get() {
        let store = RegistryStore::open_in_memory().unwrap();
        let record = test_record("i-1", "eni-1", "ec2");

        store.put_record(&record).unwrap();
        let retrieved = store.get_record("i-1", "eni-1").unwrap();

        assert_eq!(retrieved, Some(record));
    }

    #[test]
    fn get_nonexistent_returns_none() {
        let store = RegistryStore::open_in_memory().unwrap();
        assert!(store.get_record("i-404", "nothing").unwrap().is_none());
    }

    #[test]
    fn put_overwrites_same_key() {
        let store = RegistryStore::open_in_memory().unwrap();
        store.put_record(&test_record("i-1", "eni-1", "ec2")).unwrap();

        // Re-registration replaces the previous record.
        let mut updated = test_record("i-1", "eni-1", "ec2");
        updated.properties.resource = "volume".to_string();
        store.put_record(&updated).unwrap();

        let all = store.records_for_instance("i-1").unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].properties.resource, "volume");
    }

    #[test]
    fn records_for_instance_filters_by_owner() {
        let store = RegistryStore::open_in_memory().unwrap();
        store.put_record(&test_record("i-1", "eni-1", "ec2")).unwrap();
        store.put_record(&test_record("i-1", "eni-2", "ec2")).unwrap();
        store.put_record(&test_record("i-2", "eni-1", "ec2")).unwrap();

        assert_eq!(store.records_for_instance("i-1").unwrap().len(), 2);
        assert_eq!(store.records_for_instance("i-2").unwrap().len(), 1);
    }

    #[test]
    fn prefix_scan_does_not_leak_across_instances() {
        let store = RegistryStore::open_in_memory().unwrap();
        store.put_record(&test_record("i-1", "a", "ec2")).unwrap();
        store.put_record(&test_record("i-12", "b", "ec2")).unwrap();

        // The `:` terminator keeps "i-1" from matching "i-12:..." keys.
        let records = store.records_for_instance("i-1").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "a");
    }

    #[test]
    fn delete_record_returns_whether_it_existed() {
        let store = RegistryStore::open_in_memory().unwrap();
        store.put_record(&test_record("i-1", "eni-1", "ec2")).unwrap();

        assert!(store.delete_record("i-1", "eni-1").unwrap());
        assert!(!store.delete_record("i-1", "eni-1").unwrap());
        assert!(store.get_record("i-1", "eni-1").unwrap().is_none());
    }

    #[test]
    fn delete_nonexistent_is_noop() {
        let store = RegistryStore::open_in_memory().unwrap();
        assert!(!store.delete_record("i-1", "never-registered").unwrap());
    }

    // ── Persistence (on-disk) ──────────────────────────────────────

    #[test]
    fn persistence_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("registry.redb");

        {
            let store = RegistryStore::open(&db_path, "cleanup_targets").unwrap();
            store.put_record(&test_record("i-1", "eni-1", "ec2")).unwrap();
        }

        // Reopen the same database file and table.
        let store = RegistryStore::open(&db_path, "cleanup_targets").unwrap();
        let records = store.records_for_instance("i-1").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "eni-1");
    }

    #[test]
    fn tables_are_isolated_within_one_database() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("registry.redb");

        {
            let store = RegistryStore::open(&db_path, "staging").unwrap();
            store.put_record(&test_record("i-1", "eni-1", "ec2")).unwrap();
        }

        let other = RegistryStore::open(&db_path, "production").unwrap();
        assert!(other.records_for_instance("i-1").unwrap().is_empty());
        assert_eq!(other.table(), "production");
    }

    // ── Edge cases ─────────────────────────────────────────────────

    #[test]
    fn empty_store_operations() {
        let store = RegistryStore::open_in_memory().unwrap();

        assert!(store.records_for_instance("any").unwrap().is_empty());
        assert!(store.get_record("any", "thing").unwrap().is_none());
        assert!(!store.delete_record("any", "thing").unwrap());
    }
}
