//! SkillForge entities and their seed data.

mod agent;
mod course;
mod goal;
mod session;
mod user;

pub use agent::{active_agents, agent_catalog, available_agents, catalog_agent, default_agents, Agent, ASSESSMENT_AGENT_ID};
pub use course::{Course, CourseDraft, CourseModule, Difficulty, ModuleType};
pub use goal::{
    default_goals, goals_for_learner, organization_goals, personal_goals, Goal, GoalOrigin, GoalStatus, NewGoal,
    ProgressBand, Timeframe,
};
pub use session::{AdminRole, LoginForm, SessionIdentity, SessionStore, UserType};
pub use user::{default_users, learner_search, user_query, Role, User, UserDraft, UserStatus};
