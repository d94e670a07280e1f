//! Courses produced by the course builder and approved for assignment.

use super::agent::ASSESSMENT_AGENT_ID;
use crate::error::{StoreError, StoreResult};
use crate::store::Entity;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleType {
    Video,
    Interactive,
    Exercise,
    Quiz,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Difficulty {
    Beginner,
    #[default]
    Intermediate,
    Advanced,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseModule {
    pub id: String,
    pub title: String,
    pub duration: String,
    pub content: String,
    #[serde(rename = "type")]
    pub kind: ModuleType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub modules: Vec<CourseModule>,
    pub estimated_duration: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub has_quiz: bool,
}

impl Entity for Course {
    type Id = String;
    const KIND: &'static str = "course";

    fn id(&self) -> &String {
        &self.id
    }

    fn validate(&self) -> StoreResult<()> {
        if self.title.trim().is_empty() {
            return Err(StoreError::validation(Self::KIND, "title is required"));
        }
        if self.modules.is_empty() {
            return Err(StoreError::validation(Self::KIND, "a course needs at least one module"));
        }
        Ok(())
    }
}

/// Course builder input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CourseDraft {
    pub title: String,
    pub description: String,
    /// Ids of the agents that will generate and run the course.
    pub selected_agents: Vec<String>,
}

impl CourseDraft {
    pub fn validate(&self) -> StoreResult<()> {
        if self.title.trim().is_empty() {
            return Err(StoreError::validation(Course::KIND, "course title is required"));
        }
        if self.selected_agents.is_empty() {
            return Err(StoreError::validation(Course::KIND, "select at least one agent"));
        }
        Ok(())
    }

    pub fn includes_assessment(&self) -> bool {
        self.selected_agents.iter().any(|a| a == ASSESSMENT_AGENT_ID)
    }

    /// Lays out the standard three-module course; a quiz module is appended
    /// when the assessment agent is selected.
    pub fn generate(self, id: impl Into<String>) -> StoreResult<Course> {
        self.validate()?;
        let has_quiz = self.includes_assessment();
        let title = self.title.trim().to_string();

        let mut modules = vec![
            module("1", &format!("Introduction to {}", title), "45 mins", "Overview and fundamentals", ModuleType::Video),
            module("2", "Core Concepts", "60 mins", "Detailed exploration of key topics", ModuleType::Interactive),
            module("3", "Practical Applications", "90 mins", "Hands-on exercises and examples", ModuleType::Exercise),
        ];
        if has_quiz {
            modules.push(module("4", "Knowledge Check", "15 mins", "Assessment of course objectives", ModuleType::Quiz));
        }

        Ok(Course {
            id: id.into(),
            title,
            description: self.description,
            modules,
            estimated_duration: "3.5 hours".to_string(),
            difficulty: Difficulty::Intermediate,
            has_quiz,
        })
    }
}

fn module(id: &str, title: &str, duration: &str, content: &str, kind: ModuleType) -> CourseModule {
    CourseModule {
        id: id.to_string(),
        title: title.to_string(),
        duration: duration.to_string(),
        content: content.to_string(),
        kind,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(agents: &[&str]) -> CourseDraft {
        CourseDraft {
            title: "Rust Basics".into(),
            description: "Ownership and borrowing".into(),
            selected_agents: agents.iter().map(|a| a.to_string()).collect(),
        }
    }

    #[test]
    fn quiz_follows_assessment_agent() {
        let with = draft(&["content-curator", ASSESSMENT_AGENT_ID]).generate("c1").unwrap();
        assert!(with.has_quiz);
        assert_eq!(with.modules.last().map(|m| m.kind), Some(ModuleType::Quiz));

        let without = draft(&["content-curator"]).generate("c2").unwrap();
        assert!(!without.has_quiz);
        assert_eq!(without.modules.len(), 3);
        assert_eq!(without.modules[0].title, "Introduction to Rust Basics");
    }

    #[test]
    fn draft_needs_title_and_agent() {
        assert!(draft(&[]).generate("c").is_err());
        let untitled = CourseDraft { title: "  ".into(), ..draft(&["tutor-agent"]) };
        assert!(untitled.validate().is_err());
    }

    #[test]
    fn module_kind_serializes_as_type() {
        let course = draft(&["tutor-agent"]).generate("c").unwrap();
        let json = serde_json::to_value(&course).unwrap();
        assert_eq!(json["modules"][0]["type"], "video");
        assert_eq!(json["estimatedDuration"], "3.5 hours");
        assert_eq!(json["hasQuiz"], false);
    }
}
