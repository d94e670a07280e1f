//! Named persistence slots.
//!
//! A slot is a string key that holds one serialized blob: a whole entity
//! collection, or a single record for the session identity. Slots are
//! independent; there is no cross-slot transaction.
//!
//! | Backend       | Storage                         | Use                        |
//! |---------------|---------------------------------|----------------------------|
//! | `SledSlots`   | sled tree, one key per slot     | default, survives restarts |
//! | `MemorySlots` | dashmap, optional byte quota    | tests and ephemeral runs   |

mod memory;
mod sled_slots;

pub use memory::MemorySlots;
pub use sled_slots::SledSlots;

use crate::error::StoreResult;
use serde::{Deserialize, Serialize};

/// Slot for the configured agents.
pub const AGENTS_SLOT: &str = "skillforge_system_agents";
/// Slot for learning goals.
pub const GOALS_SLOT: &str = "skillforge_learning_goals";
/// Slot for the user roster.
pub const USERS_SLOT: &str = "skillforge_users";
/// Slot for approved courses.
pub const COURSES_SLOT: &str = "skillforge_courses";
/// Slot for the current session identity (a single record, not a collection).
pub const SESSION_SLOT: &str = "skillforge_user";

/// String-keyed blob storage. Every call is a blocking round-trip.
pub trait SlotBackend: Send + Sync {
    /// Short backend name for logs and status output.
    fn kind(&self) -> &'static str;

    /// Returns the blob in `slot`, or `None` if the slot is empty.
    fn read(&self, slot: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Overwrites `slot` with `value`. Either the whole value lands or nothing does.
    fn write(&self, slot: &str, value: &[u8]) -> StoreResult<()>;

    /// Writes `value` only if the slot still holds `expected` (`None` = empty).
    /// Returns `Ok(false)` when the current contents differ.
    fn compare_and_swap(&self, slot: &str, expected: Option<&[u8]>, value: &[u8]) -> StoreResult<bool>;

    /// Erases `slot`. Returns true if it held a value.
    fn clear(&self, slot: &str) -> StoreResult<bool>;

    /// Names of all non-empty slots.
    fn slots(&self) -> StoreResult<Vec<String>>;
}

/// Presence and size of a single slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotStatus {
    pub slot: String,
    pub present: bool,
    pub bytes: usize,
    pub error: Option<String>,
}

impl SlotStatus {
    /// Probes `slot` on `backend`. Read failures are reported in `error` rather than returned.
    pub fn probe(backend: &dyn SlotBackend, slot: &str) -> Self {
        match backend.read(slot) {
            Ok(Some(bytes)) => Self {
                slot: slot.to_string(),
                present: true,
                bytes: bytes.len(),
                error: None,
            },
            Ok(None) => Self {
                slot: slot.to_string(),
                present: false,
                bytes: 0,
                error: None,
            },
            Err(e) => Self {
                slot: slot.to_string(),
                present: false,
                bytes: 0,
                error: Some(e.to_string()),
            },
        }
    }
}
