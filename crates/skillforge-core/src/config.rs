//! Workspace configuration. Load from TOML or env.

use crate::slots::{AGENTS_SLOT, COURSES_SLOT, GOALS_SLOT, SESSION_SLOT, USERS_SLOT};
use crate::store::CorruptPolicy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Which slot backend to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Sled DB under `storage_path`.
    #[default]
    Sled,
    /// Process-local; nothing survives exit.
    Memory,
}

/// The persistence slots, one per entity kind plus the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotKind {
    Agents,
    Goals,
    Users,
    Courses,
    Session,
}

impl SlotKind {
    pub fn all() -> [Self; 5] {
        [Self::Agents, Self::Goals, Self::Users, Self::Courses, Self::Session]
    }

    /// Key used in the `slot_names` config table.
    pub fn config_key(&self) -> &'static str {
        match self {
            Self::Agents => "agents",
            Self::Goals => "goals",
            Self::Users => "users",
            Self::Courses => "courses",
            Self::Session => "session",
        }
    }

    pub fn default_slot(&self) -> &'static str {
        match self {
            Self::Agents => AGENTS_SLOT,
            Self::Goals => GOALS_SLOT,
            Self::Users => USERS_SLOT,
            Self::Courses => COURSES_SLOT,
            Self::Session => SESSION_SLOT,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Application identity shown by the admin tool.
    pub app_name: String,
    /// Base directory for the sled slot DB.
    pub storage_path: String,
    #[serde(default)]
    pub backend: BackendKind,
    /// Behaviour when a slot holds unparseable data.
    #[serde(default)]
    pub corrupt_policy: CorruptPolicy,
    /// Per-kind slot name overrides. Keys: agents, goals, users, courses, session.
    #[serde(default)]
    pub slot_names: HashMap<String, String>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            app_name: "SkillForge".to_string(),
            storage_path: "./data".to_string(),
            backend: BackendKind::Sled,
            corrupt_policy: CorruptPolicy::Reseed,
            slot_names: HashMap::new(),
        }
    }
}

impl CoreConfig {
    /// Slot name for `kind`, honouring non-blank overrides.
    pub fn slot_name(&self, kind: SlotKind) -> String {
        self.slot_names
            .get(kind.config_key())
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .unwrap_or(kind.default_slot())
            .to_string()
    }

    /// Directory of the sled slot DB.
    pub fn slot_db_path(&self) -> PathBuf {
        Path::new(&self.storage_path).join("skillforge_slots")
    }

    /// Load config from file and environment. Precedence: env `SKILLFORGE__*` >
    /// file at `SKILLFORGE_CONFIG` (or `config/skillforge`) > defaults.
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path = std::env::var("SKILLFORGE_CONFIG").unwrap_or_else(|_| "config/skillforge".to_string());
        let builder = config::Config::builder()
            .set_default("app_name", "SkillForge")?
            .set_default("storage_path", "./data")?
            .set_default("backend", "sled")?
            .set_default("corrupt_policy", "reseed")?;

        let path = Path::new(&config_path);
        let builder = if path.exists() {
            builder.add_source(config::File::from(path))
        } else {
            builder.add_source(config::File::with_name(&config_path).required(false))
        };

        let built = builder
            .add_source(config::Environment::with_prefix("SKILLFORGE").separator("__"))
            .build()?;

        built.try_deserialize()
    }
}
