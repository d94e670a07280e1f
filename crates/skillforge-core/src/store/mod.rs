//! Slot-backed entity collections.
//!
//! An [`EntityStore`] owns one ordered collection and keeps it in step with a
//! single slot: load-or-seed, mutate a candidate copy, persist the whole
//! collection, and only then commit and notify subscribers.

mod entity_store;
mod notify;
mod seed;

pub use entity_store::{CorruptPolicy, EntityStore};
pub use notify::{ChangeNotifier, NotifyFailure, SubscriberError, SubscriptionHandle};
pub use seed::{static_seed, SeedProvider};

use crate::error::StoreResult;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::{Debug, Display};
use std::hash::Hash;

/// A uniquely identified record that can live in an [`EntityStore`].
pub trait Entity: Clone + Debug + Serialize + DeserializeOwned + 'static {
    type Id: Clone + Eq + Hash + Display + Debug;

    /// Singular noun used in errors and logs ("agent", "goal").
    const KIND: &'static str;

    fn id(&self) -> &Self::Id;

    /// Required-field checks, run before any mutation is persisted.
    fn validate(&self) -> StoreResult<()> {
        Ok(())
    }

    /// Locked records can only be updated or removed with [`Privilege::Override`].
    fn is_locked(&self) -> bool {
        false
    }

    /// Mutable access to a named boolean field, for [`EntityStore::toggle`].
    fn flag_mut(&mut self, _field: &str) -> Option<&mut bool> {
        None
    }
}

/// Caller capability for touching locked records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Privilege {
    /// End user: locked records are read-only.
    #[default]
    Member,
    /// Administrator acting for the organization.
    Override,
}
