//! User roster managed from the admin dashboard.

use crate::error::{StoreError, StoreResult};
use crate::query::Query;
use crate::store::Entity;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Role {
    #[default]
    Learner,
    Admin,
    Instructor,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Learner => "Learner",
            Self::Admin => "Admin",
            Self::Instructor => "Instructor",
        }
    }
}

impl FromStr for Role {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "learner" => Ok(Self::Learner),
            "admin" => Ok(Self::Admin),
            "instructor" => Ok(Self::Instructor),
            other => Err(StoreError::validation(User::KIND, format!("unknown role '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum UserStatus {
    #[default]
    Active,
    Inactive,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Inactive => "Inactive",
        }
    }
}

impl FromStr for UserStatus {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            other => Err(StoreError::validation(User::KIND, format!("unknown status '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub status: UserStatus,
    /// ISO date (`YYYY-MM-DD`) of the last login.
    pub last_login: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dept: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_dept: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl Entity for User {
    type Id = u64;
    const KIND: &'static str = "user";

    fn id(&self) -> &u64 {
        &self.id
    }

    fn validate(&self) -> StoreResult<()> {
        if self.name.trim().is_empty() {
            return Err(StoreError::validation(Self::KIND, "name is required"));
        }
        if self.email.trim().is_empty() {
            return Err(StoreError::validation(Self::KIND, "email is required"));
        }
        Ok(())
    }
}

/// Form contents for creating or editing a user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserDraft {
    pub name: String,
    pub email: String,
    pub username: String,
    /// Checked on creation, never stored.
    pub password: String,
    pub role: Role,
    pub status: UserStatus,
    pub dept: String,
    pub sub_dept: String,
}

fn non_blank(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

impl UserDraft {
    fn check_required(&self) -> StoreResult<()> {
        if self.name.trim().is_empty() || self.email.trim().is_empty() || self.username.trim().is_empty() {
            return Err(StoreError::validation(
                User::KIND,
                "name, email and username are required",
            ));
        }
        Ok(())
    }

    /// Builds a new user. A password must be supplied; it is not kept.
    pub fn create(self, id: u64) -> StoreResult<User> {
        self.check_required()?;
        if self.password.is_empty() {
            return Err(StoreError::validation(User::KIND, "password is required for new users"));
        }
        Ok(User {
            id,
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            role: self.role,
            status: self.status,
            last_login: Utc::now().format("%Y-%m-%d").to_string(),
            dept: non_blank(&self.dept),
            sub_dept: non_blank(&self.sub_dept),
            username: non_blank(&self.username),
        })
    }

    /// Applies the form to an existing user, keeping its id and last login.
    pub fn apply_to(self, existing: User) -> StoreResult<User> {
        self.check_required()?;
        Ok(User {
            id: existing.id,
            last_login: existing.last_login,
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            role: self.role,
            status: self.status,
            dept: non_blank(&self.dept),
            sub_dept: non_blank(&self.sub_dept),
            username: non_blank(&self.username),
        })
    }

    /// Prefills the form from an existing user (password left blank).
    pub fn from_user(user: &User) -> Self {
        Self {
            name: user.name.clone(),
            email: user.email.clone(),
            username: user.username.clone().unwrap_or_default(),
            password: String::new(),
            role: user.role,
            status: user.status,
            dept: user.dept.clone().unwrap_or_default(),
            sub_dept: user.sub_dept.clone().unwrap_or_default(),
        }
    }
}

fn seed_user(id: u64, name: &str, email: &str, role: Role, status: UserStatus, last_login: &str, dept: &str) -> User {
    User {
        id,
        name: name.into(),
        email: email.into(),
        role,
        status,
        last_login: last_login.into(),
        dept: Some(dept.into()),
        sub_dept: None,
        username: email.split('@').next().map(str::to_string),
    }
}

/// Seed for the users slot.
pub fn default_users() -> Vec<User> {
    vec![
        seed_user(1, "John Doe", "john.doe@example.com", Role::Learner, UserStatus::Active, "2024-06-10", "Engineering"),
        seed_user(2, "Jane Smith", "jane.smith@example.com", Role::Learner, UserStatus::Active, "2024-06-09", "Design"),
        seed_user(3, "Mike Johnson", "mike.johnson@example.com", Role::Learner, UserStatus::Inactive, "2024-05-28", "Sales"),
        seed_user(4, "Sarah Wilson", "sarah.wilson@example.com", Role::Instructor, UserStatus::Active, "2024-06-11", "Engineering"),
        seed_user(5, "John Smith", "john.smith@example.com", Role::Admin, UserStatus::Active, "2024-06-12", "Learning & Development"),
    ]
}

fn name(u: &User) -> Option<&str> {
    Some(&u.name)
}

fn email(u: &User) -> Option<&str> {
    Some(&u.email)
}

fn dept(u: &User) -> Option<&str> {
    u.dept.as_deref()
}

fn status(u: &User) -> Option<&str> {
    Some(u.status.as_str())
}

fn role(u: &User) -> Option<&str> {
    Some(u.role.as_str())
}

/// User-management filter: text over name, email and department, AND
/// status, AND role. Blank or `None` values leave a dimension open.
pub fn user_query(search: &str, status_filter: Option<&str>, role_filter: Option<&str>) -> Query<User> {
    Query::new()
        .text(search, &[name, email, dept])
        .equals_opt(status, status_filter)
        .equals_opt(role, role_filter)
}

/// Learner search used when assigning courses: learners only, by name or email.
pub fn learner_search(search: &str) -> Query<User> {
    Query::new()
        .equals(role, Role::Learner.as_str())
        .text(search, &[name, email])
}
