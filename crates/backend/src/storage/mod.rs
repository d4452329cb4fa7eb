use mapmark_shared::models::MarkerSet;
use redb::{Database, ReadableDatabase, ReadableTableMetadata, TableDefinition};
use std::path::Path;
use std::sync::Arc;

const MARKER_SETS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("marker_sets");

pub struct Storage {
    db: Database,
}

impl Storage {
    pub fn open(path: &Path) -> Result<Arc<Self>, String> {
        let db = Database::create(path)
            .map_err(|e| format!("Failed to open database at {}: {}", path.display(), e))?;

        // Make sure the table exists so read transactions never miss it
        let write_txn = db.begin_write().map_err(|e| e.to_string())?;
        {
            write_txn
                .open_table(MARKER_SETS_TABLE)
                .map_err(|e| e.to_string())?;
        }
        write_txn.commit().map_err(|e| e.to_string())?;

        Ok(Arc::new(Storage { db }))
    }

    pub fn save_set(&self, set: &MarkerSet) -> Result<(), String> {
        let json = serde_json::to_vec(set).map_err(|e| e.to_string())?;
        let id_str = set.id.to_string();

        let write_txn = self.db.begin_write().map_err(|e| e.to_string())?;
        {
            let mut table = write_txn
                .open_table(MARKER_SETS_TABLE)
                .map_err(|e| e.to_string())?;
            table
                .insert(id_str.as_str(), json.as_slice())
                .map_err(|e| e.to_string())?;
        }
        write_txn.commit().map_err(|e| e.to_string())?;
        Ok(())
    }

    pub fn get_set(&self, id: &str) -> Result<Option<MarkerSet>, String> {
        let read_txn = self.db.begin_read().map_err(|e| e.to_string())?;
        let table = read_txn
            .open_table(MARKER_SETS_TABLE)
            .map_err(|e| e.to_string())?;

        match table.get(id).map_err(|e| e.to_string())? {
            Some(value) => {
                let set: MarkerSet =
                    serde_json::from_slice(value.value()).map_err(|e| e.to_string())?;
                Ok(Some(set))
            }
            None => Ok(None),
        }
    }

    pub fn count_sets(&self) -> Result<u64, String> {
        let read_txn = self.db.begin_read().map_err(|e| e.to_string())?;
        let table = read_txn
            .open_table(MARKER_SETS_TABLE)
            .map_err(|e| e.to_string())?;
        table.len().map_err(|e| e.to_string())
    }

    pub fn delete_set(&self, id: &str) -> Result<bool, String> {
        let write_txn = self.db.begin_write().map_err(|e| e.to_string())?;
        let removed = {
            let mut table = write_txn
                .open_table(MARKER_SETS_TABLE)
                .map_err(|e| e.to_string())?;
            let result = table.remove(id).map_err(|e| e.to_string())?;
            result.is_some()
        };
        write_txn.commit().map_err(|e| e.to_string())?;
        Ok(removed)
    }
}
