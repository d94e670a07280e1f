//! skillforge-core: persistent entity stores for the SkillForge learning platform.
//!
//! Agents, goals, users and courses each live in one named slot as a JSON array.
//! The presentation layer talks to [`Workspace`] and never touches a slot directly.

mod config;
mod domain;
mod error;
mod ids;
mod query;
mod slots;
mod store;
mod workspace;

// Configuration
pub use config::{BackendKind, CoreConfig, SlotKind};

// Errors
pub use error::{StoreError, StoreResult};

// Slot backends
pub use slots::{
    MemorySlots, SledSlots, SlotBackend, SlotStatus, AGENTS_SLOT, COURSES_SLOT, GOALS_SLOT, SESSION_SLOT, USERS_SLOT,
};

// Generic store
pub use store::{
    static_seed, ChangeNotifier, CorruptPolicy, Entity, EntityStore, NotifyFailure, Privilege, SeedProvider,
    SubscriberError, SubscriptionHandle,
};

// Queries and ids
pub use ids::IdGenerator;
pub use query::{filter, FieldFn, Query};

// Domain
pub use domain::{
    active_agents, agent_catalog, available_agents, catalog_agent, default_agents, default_goals, default_users,
    goals_for_learner, learner_search, organization_goals, personal_goals, user_query, AdminRole, Agent, Course,
    CourseDraft, CourseModule, Difficulty, Goal, GoalOrigin, GoalStatus, LoginForm, ModuleType, NewGoal,
    ProgressBand, Role, SessionIdentity, SessionStore, Timeframe, User, UserDraft, UserStatus, UserType,
    ASSESSMENT_AGENT_ID,
};

pub use workspace::Workspace;
