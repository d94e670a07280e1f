//! Error taxonomy for slot-backed entity stores.

use thiserror::Error;

/// Errors surfaced synchronously by stores, backends and sessions.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The persisted blob in `slot` could not be parsed.
    #[error("slot '{slot}' holds corrupt state: {reason}")]
    CorruptState { slot: String, reason: String },

    /// An operation referenced an id that is not in the collection.
    #[error("{kind} with id '{id}' not found")]
    NotFound { kind: &'static str, id: String },

    /// The backend failed to read or write a slot.
    #[error("storage error on slot '{slot}': {reason}")]
    Storage { slot: String, reason: String },

    /// A caller-supplied record failed its field checks.
    #[error("invalid {kind}: {reason}")]
    Validation { kind: &'static str, reason: String },

    /// The record is owned by the organization and the caller has no override privilege.
    #[error("{kind} '{id}' is managed by the organization and cannot be modified")]
    Locked { kind: &'static str, id: String },

    /// `add` was called with an id that already exists.
    #[error("{kind} with id '{id}' already exists")]
    DuplicateId { kind: &'static str, id: String },

    /// The slot was rewritten by another writer since this store last read it.
    #[error("slot '{slot}' was modified concurrently; reload and retry")]
    Conflict { slot: String },
}

impl StoreError {
    pub fn storage(slot: impl Into<String>, reason: impl ToString) -> Self {
        Self::Storage {
            slot: slot.into(),
            reason: reason.to_string(),
        }
    }

    pub fn validation(kind: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            kind,
            reason: reason.into(),
        }
    }

    pub fn corrupt(slot: impl Into<String>, reason: impl ToString) -> Self {
        Self::CorruptState {
            slot: slot.into(),
            reason: reason.to_string(),
        }
    }

    /// True for the variants that leave the collection unchanged and can be shown as a
    /// non-blocking notice (validation, not-found, locked, duplicate).
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. }
                | Self::Validation { .. }
                | Self::Locked { .. }
                | Self::DuplicateId { .. }
        )
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
