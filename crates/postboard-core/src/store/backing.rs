//! Durable sled backing for the store.

use std::path::Path;

use sled::{Batch, Db, Tree};

use super::changes::{ChangeSet, Record, RecordKey};
use super::tables::Tables;
use crate::error::{Error, Result};

/// Tree holding every record, keyed `user/<id>`, `post/<id>`, `comment/<id>`.
const RECORDS_TREE: &str = "records";

/// Write-through persistence for committed change sets.
pub(crate) struct SledBacking {
    db: Db,
    records: Tree,
}

impl SledBacking {
    /// Open or create the backing database at `path`.
    pub(crate) fn open(path: &Path) -> Result<Self> {
        std::fs::create_dir_all(path)?;

        let db = sled::Config::new()
            .path(path)
            .use_compression(true)
            .open()?;
        let records = db.open_tree(RECORDS_TREE)?;

        if db.was_recovered() {
            tracing::debug!(path = %path.display(), "recovered existing data");
        }

        Ok(Self { db, records })
    }

    /// Rebuild the in-memory tables from disk.
    pub(crate) fn load(&self) -> Result<Tables> {
        let mut tables = Tables::new();

        for entry in self.records.iter() {
            let (key_bytes, value_bytes) = entry?;
            let key = RecordKey::decode(&key_bytes).ok_or_else(|| {
                Error::Serialization(format!(
                    "unrecognized record key {}",
                    String::from_utf8_lossy(&key_bytes)
                ))
            })?;
            tables.put(Record::from_bytes(&key, &value_bytes)?);
        }

        Ok(tables)
    }

    /// Persist a change set as one atomic batch.
    pub(crate) fn commit(&self, changes: &ChangeSet) -> Result<()> {
        let mut batch = Batch::default();
        for key in &changes.removes {
            batch.remove(key.encode());
        }
        for record in &changes.puts {
            batch.insert(record.key().encode(), record.to_bytes()?);
        }
        self.records.apply_batch(batch)?;
        Ok(())
    }

    /// Flush pending writes to disk.
    pub(crate) fn flush(&self) -> Result<()> {
        self.db.flush()?;
        Ok(())
    }
}
