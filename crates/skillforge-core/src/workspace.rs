//! One handle over every SkillForge collection, built from a single backend.

use crate::config::{BackendKind, CoreConfig, SlotKind};
use crate::domain::{
    agent_catalog, available_agents, catalog_agent, default_agents, default_goals, default_users, Agent, Course,
    CourseDraft, Goal, NewGoal, SessionStore, User, UserDraft,
};
use crate::error::{StoreError, StoreResult};
use crate::ids::IdGenerator;
use crate::slots::{MemorySlots, SledSlots, SlotBackend, SlotStatus};
use crate::store::{EntityStore, Entity, Privilege};
use std::sync::Arc;

/// The stores the presentation layer talks to. Construct once per process
/// and pass by reference.
pub struct Workspace {
    backend: Arc<dyn SlotBackend>,
    slot_names: Vec<String>,
    ids: IdGenerator,
    pub agents: EntityStore<Agent>,
    pub goals: EntityStore<Goal>,
    pub users: EntityStore<User>,
    pub courses: EntityStore<Course>,
    pub session: SessionStore,
}

impl Workspace {
    /// Opens the backend named in `config`.
    pub fn open(config: &CoreConfig) -> StoreResult<Self> {
        let backend: Arc<dyn SlotBackend> = match config.backend {
            BackendKind::Sled => {
                let path = config.slot_db_path();
                let slots = SledSlots::open_path(&path)
                    .map_err(|e| StoreError::storage(path.display().to_string(), e))?;
                Arc::new(slots)
            }
            BackendKind::Memory => Arc::new(MemorySlots::new()),
        };
        tracing::info!(
            target: "skillforge::store",
            backend = backend.kind(),
            app = %config.app_name,
            "workspace opened"
        );
        Ok(Self::with_backend(backend, config))
    }

    pub fn with_backend(backend: Arc<dyn SlotBackend>, config: &CoreConfig) -> Self {
        let policy = config.corrupt_policy;
        let slot = |kind| config.slot_name(kind);
        Self {
            agents: EntityStore::new(Arc::clone(&backend), slot(SlotKind::Agents), default_agents)
                .with_corrupt_policy(policy),
            goals: EntityStore::new(Arc::clone(&backend), slot(SlotKind::Goals), default_goals)
                .with_corrupt_policy(policy),
            users: EntityStore::new(Arc::clone(&backend), slot(SlotKind::Users), default_users)
                .with_corrupt_policy(policy),
            courses: EntityStore::new(Arc::clone(&backend), slot(SlotKind::Courses), Vec::<Course>::new)
                .with_corrupt_policy(policy),
            session: SessionStore::new(Arc::clone(&backend), slot(SlotKind::Session)),
            slot_names: SlotKind::all().into_iter().map(slot).collect(),
            ids: IdGenerator::new(),
            backend,
        }
    }

    pub fn backend_kind(&self) -> &'static str {
        self.backend.kind()
    }

    /// Presence and size of every configured slot.
    pub fn slot_status(&self) -> Vec<SlotStatus> {
        self.slot_names
            .iter()
            .map(|slot| SlotStatus::probe(self.backend.as_ref(), slot))
            .collect()
    }

    /// Loads every collection, seeding the empty ones.
    pub fn load_all(&mut self) -> StoreResult<()> {
        self.agents.load()?;
        self.goals.load()?;
        self.users.load()?;
        self.courses.load()?;
        Ok(())
    }

    /// Installs a catalog agent that is not yet in the system.
    pub fn install_agent(&mut self, id: &str) -> StoreResult<Agent> {
        let agent = catalog_agent(id)
            .ok_or_else(|| StoreError::NotFound {
                kind: Agent::KIND,
                id: id.to_string(),
            })?
            .installed();
        self.agents.add(agent.clone())?;
        Ok(agent)
    }

    /// Catalog agents that can still be installed.
    pub fn available_agents(&mut self) -> StoreResult<Vec<Agent>> {
        let installed = self.agents.load()?;
        Ok(available_agents(&agent_catalog(), &installed))
    }

    pub fn rename_agent(&mut self, id: &str, name: &str) -> StoreResult<Agent> {
        self.agents.try_update(&id.to_string(), |agent| agent.rename(name))
    }

    /// Adds a personal goal for the signed-in learner.
    pub fn create_personal_goal(&mut self, draft: NewGoal) -> StoreResult<Goal> {
        let goal = Goal::personal(self.ids.next_string(), draft)?;
        self.goals.add(goal.clone())?;
        Ok(goal)
    }

    /// Adds an organization goal, optionally for a single learner.
    pub fn assign_goal(&mut self, draft: NewGoal, assigned_by: &str, learner_id: Option<u64>) -> StoreResult<Goal> {
        if let Some(learner) = learner_id {
            self.users.load()?;
            if self.users.get(&learner).is_none() {
                return Err(StoreError::NotFound {
                    kind: User::KIND,
                    id: learner.to_string(),
                });
            }
        }
        let goal = Goal::organization(self.ids.next_string(), draft, assigned_by, learner_id)?;
        self.goals.add(goal.clone())?;
        Ok(goal)
    }

    pub fn log_goal_hours(&mut self, privilege: Privilege, id: &str, hours: f64) -> StoreResult<Goal> {
        self.goals
            .try_update_as(privilege, &id.to_string(), |goal| goal.log_hours(hours))
    }

    pub fn create_user(&mut self, draft: UserDraft) -> StoreResult<User> {
        let user = draft.create(self.ids.next_id())?;
        self.users.add(user.clone())?;
        Ok(user)
    }

    pub fn edit_user(&mut self, id: u64, draft: UserDraft) -> StoreResult<User> {
        self.users.try_update(&id, |existing| draft.apply_to(existing))
    }

    /// Generates a course from the builder draft and stores it as approved.
    pub fn approve_course(&mut self, draft: CourseDraft) -> StoreResult<Course> {
        let course = draft.generate(self.ids.next_string())?;
        self.courses.add(course.clone())?;
        Ok(course)
    }
}
