//! Sled-backed slots: one tree, one key per slot.

use super::SlotBackend;
use crate::error::{StoreError, StoreResult};
use sled::{Db, Tree};
use std::path::Path;

const TREE_NAME: &str = "slots";

/// Persistent slot store. Each write is flushed before it returns, so a
/// successful write survives a restart.
pub struct SledSlots {
    db: Db,
    tree: Tree,
}

impl SledSlots {
    /// Opens or creates the slot DB at the given path.
    pub fn open_path<P: AsRef<Path>>(path: P) -> Result<Self, sled::Error> {
        let db = sled::open(path)?;
        let tree = db.open_tree(TREE_NAME)?;
        Ok(Self { db, tree })
    }

    fn flush(&self, slot: &str) -> StoreResult<()> {
        self.db
            .flush()
            .map(|_| ())
            .map_err(|e| StoreError::storage(slot, e))
    }
}

impl SlotBackend for SledSlots {
    fn kind(&self) -> &'static str {
        "sled"
    }

    fn read(&self, slot: &str) -> StoreResult<Option<Vec<u8>>> {
        let v = self
            .tree
            .get(slot.as_bytes())
            .map_err(|e| StoreError::storage(slot, e))?;
        Ok(v.map(|iv| iv.to_vec()))
    }

    fn write(&self, slot: &str, value: &[u8]) -> StoreResult<()> {
        let prev = self
            .tree
            .insert(slot.as_bytes(), value)
            .map_err(|e| StoreError::storage(slot, e))?;
        self.flush(slot)?;

        let is_update = prev.is_some();
        tracing::info!(
            target: "skillforge::slots",
            slot = slot,
            bytes = value.len(),
            action = if is_update { "UPDATE" } else { "INSERT" },
            "slot '{}' {} ({} bytes)",
            slot,
            if is_update { "updated" } else { "inserted" },
            value.len()
        );
        Ok(())
    }

    fn compare_and_swap(&self, slot: &str, expected: Option<&[u8]>, value: &[u8]) -> StoreResult<bool> {
        let swapped = self
            .tree
            .compare_and_swap(slot.as_bytes(), expected, Some(value))
            .map_err(|e| StoreError::storage(slot, e))?;
        if swapped.is_err() {
            tracing::warn!(
                target: "skillforge::slots",
                slot = slot,
                "slot '{}' changed since last read; write rejected",
                slot
            );
            return Ok(false);
        }
        self.flush(slot)?;

        tracing::info!(
            target: "skillforge::slots",
            slot = slot,
            bytes = value.len(),
            action = if expected.is_some() { "UPDATE" } else { "INSERT" },
            "slot '{}' swapped ({} bytes)",
            slot,
            value.len()
        );
        Ok(true)
    }

    fn clear(&self, slot: &str) -> StoreResult<bool> {
        let prev = self
            .tree
            .remove(slot.as_bytes())
            .map_err(|e| StoreError::storage(slot, e))?;
        self.flush(slot)?;

        if prev.is_some() {
            tracing::info!(
                target: "skillforge::slots",
                slot = slot,
                action = "REMOVE",
                "slot '{}' cleared",
                slot
            );
        }
        Ok(prev.is_some())
    }

    fn slots(&self) -> StoreResult<Vec<String>> {
        let keys: Vec<String> = self
            .tree
            .iter()
            .keys()
            .filter_map(|k| k.ok())
            .filter_map(|k| String::from_utf8(k.to_vec()).ok())
            .collect();
        Ok(keys)
    }
}
