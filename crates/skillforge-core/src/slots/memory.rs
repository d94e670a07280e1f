//! In-memory slots for tests and throwaway sessions.

use super::SlotBackend;
use crate::error::{StoreError, StoreResult};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// Dashmap-backed slot store. An optional quota caps the size of any single
/// write, which is how tests provoke a storage failure.
#[derive(Debug, Default)]
pub struct MemorySlots {
    map: DashMap<String, Vec<u8>>,
    quota: Option<usize>,
}

impl MemorySlots {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects any write larger than `max_bytes`.
    pub fn with_quota(max_bytes: usize) -> Self {
        Self {
            map: DashMap::new(),
            quota: Some(max_bytes),
        }
    }

    fn check_quota(&self, slot: &str, len: usize) -> StoreResult<()> {
        match self.quota {
            Some(max) if len > max => Err(StoreError::storage(
                slot,
                format!("quota exceeded: {} bytes > {} byte limit", len, max),
            )),
            _ => Ok(()),
        }
    }
}

impl SlotBackend for MemorySlots {
    fn kind(&self) -> &'static str {
        "memory"
    }

    fn read(&self, slot: &str) -> StoreResult<Option<Vec<u8>>> {
        Ok(self.map.get(slot).map(|v| v.value().clone()))
    }

    fn write(&self, slot: &str, value: &[u8]) -> StoreResult<()> {
        self.check_quota(slot, value.len())?;
        self.map.insert(slot.to_string(), value.to_vec());
        tracing::debug!(target: "skillforge::slots", slot = slot, bytes = value.len(), "memory slot written");
        Ok(())
    }

    fn compare_and_swap(&self, slot: &str, expected: Option<&[u8]>, value: &[u8]) -> StoreResult<bool> {
        self.check_quota(slot, value.len())?;
        match self.map.entry(slot.to_string()) {
            Entry::Occupied(mut e) => {
                if expected != Some(e.get().as_slice()) {
                    return Ok(false);
                }
                e.insert(value.to_vec());
            }
            Entry::Vacant(e) => {
                if expected.is_some() {
                    return Ok(false);
                }
                e.insert(value.to_vec());
            }
        }
        Ok(true)
    }

    fn clear(&self, slot: &str) -> StoreResult<bool> {
        Ok(self.map.remove(slot).is_some())
    }

    fn slots(&self) -> StoreResult<Vec<String>> {
        let mut names: Vec<String> = self.map.iter().map(|e| e.key().clone()).collect();
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quota_rejects_large_writes_and_keeps_old_value() {
        let slots = MemorySlots::with_quota(4);
        slots.write("s", b"abc").unwrap();

        let err = slots.write("s", b"abcdef").unwrap_err();
        assert!(matches!(err, StoreError::Storage { .. }));
        assert_eq!(slots.read("s").unwrap().as_deref(), Some(&b"abc"[..]));
    }

    #[test]
    fn compare_and_swap_on_vacant_and_occupied() {
        let slots = MemorySlots::new();
        assert!(!slots.compare_and_swap("s", Some(&b"x"[..]), b"y").unwrap());
        assert!(slots.compare_and_swap("s", None, b"x").unwrap());
        assert!(!slots.compare_and_swap("s", Some(&b"z"[..]), b"y").unwrap());
        assert!(slots.compare_and_swap("s", Some(&b"x"[..]), b"y").unwrap());
        assert_eq!(slots.read("s").unwrap().as_deref(), Some(&b"y"[..]));
    }
}
