//! AI agents that can be installed into the learning system.

use crate::error::{StoreError, StoreResult};
use crate::query::Query;
use crate::store::Entity;
use serde::{Deserialize, Serialize};

/// An installed (or installable) agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub id: String,
    /// Display name; admins may rename it.
    pub name: String,
    /// Name from the catalog, kept so a rename can be undone.
    pub original_name: String,
    pub description: String,
    pub active: bool,
    #[serde(default)]
    pub is_added: bool,
    #[serde(default)]
    pub interactions: u32,
    /// Percentage, 0 to 100.
    #[serde(default)]
    pub efficiency: u8,
}

impl Agent {
    fn catalog_entry(
        id: &str,
        name: &str,
        description: &str,
        active: bool,
        interactions: u32,
        efficiency: u8,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            original_name: name.to_string(),
            description: description.to_string(),
            active,
            is_added: false,
            interactions,
            efficiency,
        }
    }

    /// Returns this agent marked as installed.
    pub fn installed(mut self) -> Self {
        self.is_added = true;
        self
    }

    /// Sets the display name. Blank names are rejected; surrounding whitespace is trimmed.
    pub fn rename(mut self, name: &str) -> StoreResult<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StoreError::validation(Self::KIND, "agent name cannot be empty"));
        }
        self.name = name.to_string();
        Ok(self)
    }

    pub fn reset_name(mut self) -> Self {
        self.name = self.original_name.clone();
        self
    }

    pub fn is_renamed(&self) -> bool {
        self.name != self.original_name
    }
}

impl Entity for Agent {
    type Id = String;
    const KIND: &'static str = "agent";

    fn id(&self) -> &String {
        &self.id
    }

    fn validate(&self) -> StoreResult<()> {
        if self.id.trim().is_empty() {
            return Err(StoreError::validation(Self::KIND, "id is required"));
        }
        if self.name.trim().is_empty() {
            return Err(StoreError::validation(Self::KIND, "agent name cannot be empty"));
        }
        if self.efficiency > 100 {
            return Err(StoreError::validation(
                Self::KIND,
                format!("efficiency {} is out of range 0-100", self.efficiency),
            ));
        }
        Ok(())
    }

    fn flag_mut(&mut self, field: &str) -> Option<&mut bool> {
        match field {
            "active" => Some(&mut self.active),
            _ => None,
        }
    }
}

/// Id of the agent that enables quizzes in generated courses.
pub const ASSESSMENT_AGENT_ID: &str = "assessment-agent";

/// Number of catalog agents installed on first use.
const DEFAULT_INSTALLED: usize = 6;

/// Every agent the system knows about, in catalog order.
pub fn agent_catalog() -> Vec<Agent> {
    vec![
        Agent::catalog_entry("tutor-agent", "Tutor Agent", "Provides personalized answers and training guidance", true, 234, 94),
        Agent::catalog_entry("content-curator", "Content Curator", "Converts internal docs to structured learning modules", true, 156, 89),
        Agent::catalog_entry(ASSESSMENT_AGENT_ID, "Assessment Agent", "Creates quizzes and role-specific evaluations", true, 89, 96),
        Agent::catalog_entry("roleplay-agent", "Roleplay Agent", "Simulates real-world interactions through text and voice", false, 45, 87),
        Agent::catalog_entry("skill-tracker", "Skill Tracker", "Maps completed training to skill gaps and learning paths", true, 178, 91),
        Agent::catalog_entry("memory-agent", "Memory Agent", "Stores user learning preferences and progress history", true, 312, 93),
        Agent::catalog_entry("analytics-agent", "Analytics Agent", "Analyzes learning patterns and provides insights", false, 67, 85),
        Agent::catalog_entry("notification-agent", "Notification Agent", "Manages learning reminders and progress notifications", false, 123, 92),
    ]
}

/// Seed for the agents slot: the first six catalog entries, installed.
pub fn default_agents() -> Vec<Agent> {
    agent_catalog()
        .into_iter()
        .take(DEFAULT_INSTALLED)
        .map(Agent::installed)
        .collect()
}

/// Catalog entries not yet installed, in catalog order.
pub fn available_agents(catalog: &[Agent], installed: &[Agent]) -> Vec<Agent> {
    catalog
        .iter()
        .filter(|c| !installed.iter().any(|a| a.id == c.id))
        .cloned()
        .collect()
}

/// Looks up a catalog entry by id.
pub fn catalog_agent(id: &str) -> Option<Agent> {
    agent_catalog().into_iter().find(|a| a.id == id)
}

/// Agents whose `active` flag is set.
pub fn active_agents() -> Query<Agent> {
    Query::new().when(|a: &Agent| a.active)
}
