//! Demo login: the signed-in identity lives in its own slot.
//!
//! Logging out clears only that slot. Domain collections outlive a session.

use crate::error::{StoreError, StoreResult};
use crate::slots::SlotBackend;
use crate::store::Privilege;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

const KIND: &str = "session";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    Admin,
    Learner,
}

impl FromStr for UserType {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "learner" => Ok(Self::Learner),
            other => Err(StoreError::validation(KIND, format!("unknown user type '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AdminRole {
    ContentCreator,
    CourseManager,
    ProgressTracker,
    LearnerManager,
}

impl AdminRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ContentCreator => "content-creator",
            Self::CourseManager => "course-manager",
            Self::ProgressTracker => "progress-tracker",
            Self::LearnerManager => "learner-manager",
        }
    }

    /// Title-cased label for headers ("Course Manager").
    pub fn label(&self) -> &'static str {
        match self {
            Self::ContentCreator => "Content Creator",
            Self::CourseManager => "Course Manager",
            Self::ProgressTracker => "Progress Tracker",
            Self::LearnerManager => "Learner Manager",
        }
    }
}

impl FromStr for AdminRole {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(' ', "-").as_str() {
            "content-creator" => Ok(Self::ContentCreator),
            "course-manager" => Ok(Self::CourseManager),
            "progress-tracker" => Ok(Self::ProgressTracker),
            "learner-manager" => Ok(Self::LearnerManager),
            other => Err(StoreError::validation(KIND, format!("unknown admin role '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionIdentity {
    pub email: String,
    pub user_type: UserType,
    pub admin_role: Option<AdminRole>,
    /// Local part of the email.
    pub name: String,
    pub session_id: Uuid,
}

impl SessionIdentity {
    pub fn is_admin(&self) -> bool {
        self.user_type == UserType::Admin
    }

    /// Admins act for the organization; learners cannot touch organization goals.
    pub fn privilege(&self) -> Privilege {
        if self.is_admin() {
            Privilege::Override
        } else {
            Privilege::Member
        }
    }
}

/// Login form contents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    pub user_type: Option<UserType>,
    pub admin_role: Option<AdminRole>,
}

impl LoginForm {
    fn into_identity(self) -> StoreResult<SessionIdentity> {
        let email = self.email.trim().to_string();
        let Some((local, domain)) = email.split_once('@') else {
            return Err(StoreError::validation(KIND, "a valid email is required"));
        };
        if local.is_empty() || domain.is_empty() {
            return Err(StoreError::validation(KIND, "a valid email is required"));
        }
        if self.password.is_empty() {
            return Err(StoreError::validation(KIND, "password is required"));
        }
        let user_type = self
            .user_type
            .ok_or_else(|| StoreError::validation(KIND, "select a user type"))?;
        let admin_role = match user_type {
            UserType::Admin => Some(
                self.admin_role
                    .ok_or_else(|| StoreError::validation(KIND, "select an admin role"))?,
            ),
            UserType::Learner => None,
        };
        Ok(SessionIdentity {
            name: local.to_string(),
            email,
            user_type,
            admin_role,
            session_id: Uuid::new_v4(),
        })
    }
}

/// Reads and writes the session slot.
pub struct SessionStore {
    backend: Arc<dyn SlotBackend>,
    slot: String,
}

impl SessionStore {
    pub fn new(backend: Arc<dyn SlotBackend>, slot: impl Into<String>) -> Self {
        Self {
            backend,
            slot: slot.into(),
        }
    }

    /// Records the identity from `form`. No credential check happens here.
    pub fn login(&self, form: LoginForm) -> StoreResult<SessionIdentity> {
        let identity = form.into_identity()?;
        let blob = serde_json::to_vec(&identity).map_err(|e| StoreError::storage(&self.slot, e))?;
        self.backend.write(&self.slot, &blob)?;
        tracing::info!(
            target: "skillforge::session",
            user = %identity.name,
            user_type = ?identity.user_type,
            "signed in"
        );
        Ok(identity)
    }

    /// The signed-in identity. An unreadable session blob counts as signed out and is cleared.
    pub fn current(&self) -> StoreResult<Option<SessionIdentity>> {
        let Some(bytes) = self.backend.read(&self.slot)? else {
            return Ok(None);
        };
        match serde_json::from_slice(&bytes) {
            Ok(identity) => Ok(Some(identity)),
            Err(e) => {
                tracing::warn!(
                    target: "skillforge::session",
                    slot = %self.slot,
                    error = %e,
                    "discarding unreadable session"
                );
                self.backend.clear(&self.slot)?;
                Ok(None)
            }
        }
    }

    /// Clears the session slot only. Returns false if nobody was signed in.
    pub fn logout(&self) -> StoreResult<bool> {
        let cleared = self.backend.clear(&self.slot)?;
        if cleared {
            tracing::info!(target: "skillforge::session", "signed out");
        }
        Ok(cleared)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slots::{MemorySlots, SESSION_SLOT};

    fn sessions() -> (Arc<MemorySlots>, SessionStore) {
        let backend = Arc::new(MemorySlots::new());
        let dyn_backend: Arc<dyn SlotBackend> = backend.clone();
        (backend, SessionStore::new(dyn_backend, SESSION_SLOT))
    }

    fn admin_form() -> LoginForm {
        LoginForm {
            email: "jo.smith@corp.io".into(),
            password: "pw".into(),
            user_type: Some(UserType::Admin),
            admin_role: Some(AdminRole::CourseManager),
        }
    }

    #[test]
    fn login_derives_name_and_keeps_admin_role() {
        let (_, store) = sessions();
        let who = store.login(admin_form()).unwrap();
        assert_eq!(who.name, "jo.smith");
        assert_eq!(who.admin_role, Some(AdminRole::CourseManager));
        assert_eq!(who.privilege(), Privilege::Override);
        assert_eq!(store.current().unwrap(), Some(who));
    }

    #[test]
    fn learner_login_drops_admin_role() {
        let (_, store) = sessions();
        let form = LoginForm {
            user_type: Some(UserType::Learner),
            ..admin_form()
        };
        let who = store.login(form).unwrap();
        assert_eq!(who.admin_role, None);
        assert_eq!(who.privilege(), Privilege::Member);
    }

    #[test]
    fn login_validation() {
        let (backend, store) = sessions();
        let bad_email = LoginForm { email: "nobody".into(), ..admin_form() };
        assert!(store.login(bad_email).is_err());
        let no_role = LoginForm { admin_role: None, ..admin_form() };
        assert!(store.login(no_role).is_err());
        let no_type = LoginForm { user_type: None, ..admin_form() };
        assert!(store.login(no_type).is_err());
        assert!(backend.read(SESSION_SLOT).unwrap().is_none());
    }

    #[test]
    fn logout_clears_only_session_slot() {
        let (backend, store) = sessions();
        backend.write("skillforge_learning_goals", b"[]").unwrap();
        store.login(admin_form()).unwrap();

        assert!(store.logout().unwrap());
        assert!(!store.logout().unwrap());
        assert_eq!(store.current().unwrap(), None);
        assert!(backend.read("skillforge_learning_goals").unwrap().is_some());
    }

    #[test]
    fn unreadable_session_counts_as_signed_out() {
        let (backend, store) = sessions();
        backend.write(SESSION_SLOT, b"garbage").unwrap();
        assert_eq!(store.current().unwrap(), None);
        assert!(backend.read(SESSION_SLOT).unwrap().is_none());
    }

    #[test]
    fn admin_role_parses_labels() {
        assert_eq!("Course Manager".parse::<AdminRole>().unwrap(), AdminRole::CourseManager);
        assert_eq!(AdminRole::LearnerManager.label(), "Learner Manager");
    }
}
