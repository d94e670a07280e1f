//! Generic load/save/mutate engine over one named slot.

use super::notify::{ChangeNotifier, NotifyFailure, SubscriberError, SubscriptionHandle};
use super::seed::SeedProvider;
use super::{Entity, Privilege};
use crate::error::{StoreError, StoreResult};
use crate::slots::SlotBackend;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

/// What `load` does when the slot holds a blob that does not parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorruptPolicy {
    /// Log at error level, discard the blob and reseed.
    #[default]
    Reseed,
    /// Return [`StoreError::CorruptState`] and leave the slot untouched.
    Fail,
}

/// The canonical in-memory collection for one entity kind, bound to one slot.
///
/// Every mutation builds a candidate collection, writes it to the slot, and
/// commits it in memory only once the write succeeded. A failed write leaves
/// both sides exactly as they were; if the backend reports an error after the
/// bytes landed, memory is resynced to the slot instead.
///
/// Writes are compare-and-swap against the blob this store last read or
/// wrote, so a second writer on the same slot yields [`StoreError::Conflict`]
/// instead of a lost update.
pub struct EntityStore<T: Entity> {
    backend: Arc<dyn SlotBackend>,
    slot: String,
    seed: Box<dyn SeedProvider<T>>,
    policy: CorruptPolicy,
    items: Vec<T>,
    last_blob: Option<Vec<u8>>,
    loaded: bool,
    notifier: ChangeNotifier<T>,
}

impl<T: Entity> EntityStore<T> {
    pub fn new<S>(backend: Arc<dyn SlotBackend>, slot: impl Into<String>, seed: S) -> Self
    where
        S: SeedProvider<T> + 'static,
    {
        Self {
            backend,
            slot: slot.into(),
            seed: Box::new(seed),
            policy: CorruptPolicy::default(),
            items: Vec::new(),
            last_blob: None,
            loaded: false,
            notifier: ChangeNotifier::new(),
        }
    }

    pub fn with_corrupt_policy(mut self, policy: CorruptPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn slot(&self) -> &str {
        &self.slot
    }

    /// Reads the slot and replaces the in-memory collection with it.
    ///
    /// An empty slot is seeded and the seed persisted before returning. A
    /// corrupt slot is handled per [`CorruptPolicy`].
    pub fn load(&mut self) -> StoreResult<Vec<T>> {
        match self.backend.read(&self.slot)? {
            None => {
                tracing::info!(
                    target: "skillforge::store",
                    slot = %self.slot,
                    kind = T::KIND,
                    "slot empty; seeding defaults"
                );
                self.reseed(None)?;
            }
            Some(bytes) => match decode::<T>(&bytes) {
                Ok(items) => {
                    self.items = items;
                    self.last_blob = Some(bytes);
                    self.loaded = true;
                }
                Err(reason) => match self.policy {
                    CorruptPolicy::Fail => return Err(StoreError::corrupt(&self.slot, reason)),
                    CorruptPolicy::Reseed => {
                        tracing::error!(
                            target: "skillforge::store",
                            slot = %self.slot,
                            kind = T::KIND,
                            bytes = bytes.len(),
                            reason = %reason,
                            "corrupt slot discarded; collection reset to defaults"
                        );
                        self.reseed(Some(bytes))?;
                    }
                },
            },
        }
        Ok(self.items.clone())
    }

    /// Replaces the whole collection.
    pub fn save(&mut self, collection: Vec<T>) -> StoreResult<()> {
        for record in &collection {
            record.validate()?;
        }
        let expected = if self.loaded {
            self.last_blob.clone()
        } else {
            self.backend.read(&self.slot)?
        };
        self.commit(expected, collection)
    }

    /// Appends `record`; its id must already be assigned and unused.
    pub fn add(&mut self, record: T) -> StoreResult<()> {
        self.ensure_loaded()?;
        record.validate()?;
        if self.position(record.id()).is_some() {
            return Err(StoreError::DuplicateId {
                kind: T::KIND,
                id: record.id().to_string(),
            });
        }
        let mut candidate = self.items.clone();
        candidate.push(record);
        self.commit_current(candidate)
    }

    /// Replaces the record with `id` by `patch(record)`, keeping its position.
    pub fn update<F>(&mut self, id: &T::Id, patch: F) -> StoreResult<T>
    where
        F: FnOnce(T) -> T,
    {
        self.update_as(Privilege::Member, id, patch)
    }

    pub fn update_as<F>(&mut self, privilege: Privilege, id: &T::Id, patch: F) -> StoreResult<T>
    where
        F: FnOnce(T) -> T,
    {
        self.try_update_as(privilege, id, |record| Ok(patch(record)))
    }

    /// Like [`update`](Self::update) for patches that can reject the change.
    pub fn try_update<F>(&mut self, id: &T::Id, patch: F) -> StoreResult<T>
    where
        F: FnOnce(T) -> StoreResult<T>,
    {
        self.try_update_as(Privilege::Member, id, patch)
    }

    pub fn try_update_as<F>(&mut self, privilege: Privilege, id: &T::Id, patch: F) -> StoreResult<T>
    where
        F: FnOnce(T) -> StoreResult<T>,
    {
        self.modify(privilege, id, |record| {
            *record = patch(record.clone())?;
            Ok(())
        })
    }

    /// Flips the boolean `field` of the record with `id` and returns the new value.
    pub fn toggle(&mut self, id: &T::Id, field: &str) -> StoreResult<bool> {
        let mut value = false;
        self.modify(Privilege::Member, id, |record| {
            let flag = record
                .flag_mut(field)
                .ok_or_else(|| StoreError::validation(T::KIND, format!("no boolean field '{}'", field)))?;
            *flag = !*flag;
            value = *flag;
            Ok(())
        })?;
        Ok(value)
    }

    /// Removes the record with `id`. Returns `Ok(false)` and writes nothing if absent.
    pub fn remove(&mut self, id: &T::Id) -> StoreResult<bool> {
        self.remove_as(Privilege::Member, id)
    }

    pub fn remove_as(&mut self, privilege: Privilege, id: &T::Id) -> StoreResult<bool> {
        self.ensure_loaded()?;
        let Some(pos) = self.position(id) else {
            tracing::debug!(target: "skillforge::store", slot = %self.slot, id = %id, "remove: id absent");
            return Ok(false);
        };
        self.check_unlocked(privilege, &self.items[pos])?;
        let mut candidate = self.items.clone();
        candidate.remove(pos);
        self.commit_current(candidate)?;
        Ok(true)
    }

    /// Like [`remove`](Self::remove) but surfaces [`StoreError::NotFound`] for an absent id.
    pub fn remove_strict(&mut self, id: &T::Id) -> StoreResult<()> {
        if self.remove(id)? {
            Ok(())
        } else {
            Err(self.not_found(id))
        }
    }

    /// In-memory lookup; call [`load`](Self::load) first to read the slot.
    pub fn get(&self, id: &T::Id) -> Option<&T> {
        self.items.iter().find(|r| r.id() == id)
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionHandle
    where
        F: FnMut(&[T]) -> Result<(), SubscriberError> + 'static,
    {
        self.notifier.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, handle: SubscriptionHandle) -> bool {
        self.notifier.unsubscribe(handle)
    }

    /// Drains subscriber failures collected since the last call.
    pub fn take_notify_errors(&mut self) -> Vec<NotifyFailure> {
        self.notifier.take_failures()
    }

    fn modify<F>(&mut self, privilege: Privilege, id: &T::Id, f: F) -> StoreResult<T>
    where
        F: FnOnce(&mut T) -> StoreResult<()>,
    {
        self.ensure_loaded()?;
        let pos = self.position(id).ok_or_else(|| self.not_found(id))?;
        self.check_unlocked(privilege, &self.items[pos])?;

        let mut updated = self.items[pos].clone();
        f(&mut updated)?;
        if updated.id() != id {
            return Err(StoreError::validation(T::KIND, "id cannot be reassigned"));
        }
        self.check_unlocked(privilege, &updated)?;
        updated.validate()?;

        let mut candidate = self.items.clone();
        candidate[pos] = updated.clone();
        self.commit_current(candidate)?;
        Ok(updated)
    }

    fn ensure_loaded(&mut self) -> StoreResult<()> {
        if !self.loaded {
            self.load()?;
        }
        Ok(())
    }

    fn position(&self, id: &T::Id) -> Option<usize> {
        self.items.iter().position(|r| r.id() == id)
    }

    fn not_found(&self, id: &T::Id) -> StoreError {
        StoreError::NotFound {
            kind: T::KIND,
            id: id.to_string(),
        }
    }

    fn check_unlocked(&self, privilege: Privilege, record: &T) -> StoreResult<()> {
        if record.is_locked() && privilege != Privilege::Override {
            tracing::warn!(
                target: "skillforge::store",
                slot = %self.slot,
                id = %record.id(),
                "rejected change to locked {}",
                T::KIND
            );
            return Err(StoreError::Locked {
                kind: T::KIND,
                id: record.id().to_string(),
            });
        }
        Ok(())
    }

    fn reseed(&mut self, expected: Option<Vec<u8>>) -> StoreResult<()> {
        let seeded = self.seed.seed();
        self.commit(expected, seeded)
    }

    fn commit_current(&mut self, candidate: Vec<T>) -> StoreResult<()> {
        let expected = self.last_blob.clone();
        self.commit(expected, candidate)
    }

    /// Persists `candidate` if the slot still holds `expected`, then commits it in memory.
    fn commit(&mut self, expected: Option<Vec<u8>>, candidate: Vec<T>) -> StoreResult<()> {
        if let Some(dup) = first_duplicate(&candidate) {
            return Err(StoreError::DuplicateId {
                kind: T::KIND,
                id: dup,
            });
        }
        let blob = serde_json::to_vec(&candidate).map_err(|e| StoreError::storage(&self.slot, e))?;
        let swapped = match self.backend.compare_and_swap(&self.slot, expected.as_deref(), &blob) {
            Ok(swapped) => swapped,
            Err(e) => {
                self.resync_after_failed_write(expected.as_deref(), candidate, blob);
                return Err(e);
            }
        };
        if !swapped {
            return Err(StoreError::Conflict {
                slot: self.slot.clone(),
            });
        }

        self.items = candidate;
        self.last_blob = Some(blob);
        self.loaded = true;
        tracing::debug!(
            target: "skillforge::store",
            slot = %self.slot,
            kind = T::KIND,
            count = self.items.len(),
            "collection saved"
        );
        self.notifier.notify(&self.items);
        Ok(())
    }

    /// A backend can report a failed write after the bytes already landed
    /// (sled applies the swap, then the flush fails). Memory must follow
    /// whatever the slot actually holds.
    fn resync_after_failed_write(&mut self, expected: Option<&[u8]>, candidate: Vec<T>, blob: Vec<u8>) {
        match self.backend.read(&self.slot) {
            Ok(persisted) if persisted.as_deref() == expected => {}
            Ok(Some(persisted)) if persisted == blob => {
                tracing::warn!(
                    target: "skillforge::store",
                    slot = %self.slot,
                    kind = T::KIND,
                    "write reported failure but landed; adopting persisted collection"
                );
                self.items = candidate;
                self.last_blob = Some(blob);
                self.loaded = true;
                self.notifier.notify(&self.items);
            }
            _ => {
                tracing::warn!(
                    target: "skillforge::store",
                    slot = %self.slot,
                    kind = T::KIND,
                    "slot state unknown after failed write; next access reloads"
                );
                self.loaded = false;
            }
        }
    }
}

fn decode<T: Entity>(bytes: &[u8]) -> Result<Vec<T>, String> {
    let items: Vec<T> = serde_json::from_slice(bytes).map_err(|e| e.to_string())?;
    if let Some(dup) = first_duplicate(&items) {
        return Err(format!("duplicate id '{}'", dup));
    }
    Ok(items)
}

fn first_duplicate<T: Entity>(items: &[T]) -> Option<String> {
    let mut seen = HashSet::with_capacity(items.len());
    items
        .iter()
        .find(|r| !seen.insert(r.id().clone()))
        .map(|r| r.id().to_string())
}
