//! Learning goals: organization-assigned targets and personal ones.

use crate::error::{StoreError, StoreResult};
use crate::query::Query;
use crate::store::Entity;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Timeframe {
    Daily,
    Weekly,
    Monthly,
    Quarterly,
    Yearly,
}

impl Timeframe {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
            Self::Yearly => "yearly",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "quarterly" => Ok(Self::Quarterly),
            "yearly" => Ok(Self::Yearly),
            other => Err(StoreError::validation(Goal::KIND, format!("unknown timeframe '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalStatus {
    #[default]
    Active,
    Completed,
    Overdue,
}

impl GoalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Overdue => "overdue",
        }
    }
}

/// Who set the goal. Persisted inline as `"type": "admin" | "personal"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GoalOrigin {
    /// Set by the organization; read-only for the learner.
    #[serde(rename = "admin", alias = "organization")]
    Organization {
        #[serde(rename = "assignedBy")]
        assigned_by: String,
        #[serde(rename = "learnerId", default, skip_serializing_if = "Option::is_none")]
        learner_id: Option<u64>,
    },
    /// Set by the learner for themselves.
    #[serde(rename = "personal")]
    Personal,
}

/// Display bucket for a progress bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressBand {
    Complete,
    OnTrack,
    Halfway,
    Behind,
}

impl ProgressBand {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Complete => "complete",
            Self::OnTrack => "on track",
            Self::Halfway => "halfway",
            Self::Behind => "behind",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub target_hours: f64,
    #[serde(alias = "currentHours")]
    pub completed_hours: f64,
    pub timeframe: Timeframe,
    /// Opaque period label such as `2024-W24` or `2024-Q2`.
    pub period: String,
    #[serde(flatten)]
    pub origin: GoalOrigin,
    #[serde(default)]
    pub status: GoalStatus,
}

/// Fields a user fills in to create a goal.
#[derive(Debug, Clone, PartialEq)]
pub struct NewGoal {
    pub title: String,
    pub description: String,
    pub target_hours: f64,
    pub timeframe: Timeframe,
    pub period: String,
}

impl NewGoal {
    /// Rejects blank titles and periods and non-positive targets.
    pub fn validate(&self) -> StoreResult<()> {
        if self.title.trim().is_empty() {
            return Err(StoreError::validation(Goal::KIND, "title is required"));
        }
        if self.period.trim().is_empty() {
            return Err(StoreError::validation(Goal::KIND, "period is required"));
        }
        check_target(self.target_hours)
    }
}

fn check_target(hours: f64) -> StoreResult<()> {
    if !hours.is_finite() || hours <= 0.0 {
        return Err(StoreError::validation(
            Goal::KIND,
            format!("target hours must be positive, got {}", hours),
        ));
    }
    Ok(())
}

impl Goal {
    /// A fresh personal goal with no hours logged.
    pub fn personal(id: impl Into<String>, draft: NewGoal) -> StoreResult<Self> {
        Self::from_draft(id.into(), draft, GoalOrigin::Personal)
    }

    /// A fresh organization goal, optionally aimed at one learner.
    pub fn organization(
        id: impl Into<String>,
        draft: NewGoal,
        assigned_by: impl Into<String>,
        learner_id: Option<u64>,
    ) -> StoreResult<Self> {
        let origin = GoalOrigin::Organization {
            assigned_by: assigned_by.into(),
            learner_id,
        };
        Self::from_draft(id.into(), draft, origin)
    }

    fn from_draft(id: String, draft: NewGoal, origin: GoalOrigin) -> StoreResult<Self> {
        draft.validate()?;
        Ok(Self {
            id,
            title: draft.title,
            description: draft.description,
            target_hours: draft.target_hours,
            completed_hours: 0.0,
            timeframe: draft.timeframe,
            period: draft.period,
            origin,
            status: GoalStatus::Active,
        })
    }

    pub fn is_organization(&self) -> bool {
        matches!(self.origin, GoalOrigin::Organization { .. })
    }

    pub fn assigned_by(&self) -> Option<&str> {
        match &self.origin {
            GoalOrigin::Organization { assigned_by, .. } => Some(assigned_by),
            GoalOrigin::Personal => None,
        }
    }

    /// Completion percentage, capped at 100.
    pub fn progress_percent(&self) -> f64 {
        (self.completed_hours / self.target_hours * 100.0).min(100.0)
    }

    pub fn progress_band(&self) -> ProgressBand {
        match self.progress_percent() {
            p if p >= 100.0 => ProgressBand::Complete,
            p if p >= 75.0 => ProgressBand::OnTrack,
            p if p >= 50.0 => ProgressBand::Halfway,
            _ => ProgressBand::Behind,
        }
    }

    /// Adds study time. Reaching the target completes the goal.
    pub fn log_hours(mut self, hours: f64) -> StoreResult<Self> {
        if !hours.is_finite() || hours < 0.0 {
            return Err(StoreError::validation(
                Self::KIND,
                format!("logged hours must be non-negative, got {}", hours),
            ));
        }
        self.completed_hours += hours;
        if self.completed_hours >= self.target_hours {
            self.status = GoalStatus::Completed;
        }
        Ok(self)
    }

    /// Flags an unfinished goal whose period has passed.
    pub fn mark_overdue(mut self) -> Self {
        if self.status == GoalStatus::Active {
            self.status = GoalStatus::Overdue;
        }
        self
    }
}

impl Entity for Goal {
    type Id = String;
    const KIND: &'static str = "goal";

    fn id(&self) -> &String {
        &self.id
    }

    fn validate(&self) -> StoreResult<()> {
        if self.title.trim().is_empty() {
            return Err(StoreError::validation(Self::KIND, "title is required"));
        }
        if self.period.trim().is_empty() {
            return Err(StoreError::validation(Self::KIND, "period is required"));
        }
        check_target(self.target_hours)?;
        if !self.completed_hours.is_finite() || self.completed_hours < 0.0 {
            return Err(StoreError::validation(Self::KIND, "completed hours must be non-negative"));
        }
        Ok(())
    }

    fn is_locked(&self) -> bool {
        self.is_organization()
    }
}

const DEFAULT_ASSIGNER: &str = "Course Manager - John Smith";

/// Seed for the goals slot: the organization goals every learner starts with.
pub fn default_goals() -> Vec<Goal> {
    vec![
        Goal {
            id: "1".into(),
            title: "React Fundamentals Completion".into(),
            description: "Complete the React Fundamentals course with 15 hours of study per week".into(),
            target_hours: 15.0,
            completed_hours: 8.0,
            timeframe: Timeframe::Weekly,
            period: "2024-W24".into(),
            origin: GoalOrigin::Organization {
                assigned_by: DEFAULT_ASSIGNER.into(),
                learner_id: None,
            },
            status: GoalStatus::Active,
        },
        Goal {
            id: "2".into(),
            title: "Monthly Learning Target".into(),
            description: "Achieve 60 hours of learning this month across all courses".into(),
            target_hours: 60.0,
            completed_hours: 32.0,
            timeframe: Timeframe::Monthly,
            period: "2024-06".into(),
            origin: GoalOrigin::Organization {
                assigned_by: DEFAULT_ASSIGNER.into(),
                learner_id: None,
            },
            status: GoalStatus::Active,
        },
    ]
}

pub fn organization_goals() -> Query<Goal> {
    Query::new().when(Goal::is_organization)
}

pub fn personal_goals() -> Query<Goal> {
    Query::new().when(|g: &Goal| !g.is_organization())
}

/// Goals aimed at `learner_id`, plus organization goals aimed at everyone.
pub fn goals_for_learner(learner_id: u64) -> Query<Goal> {
    Query::new().when(move |g: &Goal| match &g.origin {
        GoalOrigin::Organization { learner_id: Some(id), .. } => *id == learner_id,
        _ => true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(title: &str, hours: f64) -> NewGoal {
        NewGoal {
            title: title.into(),
            description: String::new(),
            target_hours: hours,
            timeframe: Timeframe::Weekly,
            period: "2024-W25".into(),
        }
    }

    #[test]
    fn draft_validation() {
        assert!(draft("X", 10.0).validate().is_ok());
        assert!(draft(" ", 10.0).validate().is_err());
        assert!(draft("X", 0.0).validate().is_err());
        assert!(draft("X", -3.0).validate().is_err());
        assert!(draft("X", f64::NAN).validate().is_err());
        let mut no_period = draft("X", 1.0);
        no_period.period = String::new();
        assert!(no_period.validate().is_err());
    }

    #[test]
    fn persisted_shape_matches_demo_format() {
        let json = serde_json::to_value(&default_goals()[0]).unwrap();
        assert_eq!(json["type"], "admin");
        assert_eq!(json["assignedBy"], DEFAULT_ASSIGNER);
        assert_eq!(json["targetHours"], 15.0);
        assert_eq!(json["completedHours"], 8.0);
        assert_eq!(json["status"], "active");
        assert!(json.get("learnerId").is_none());

        let personal = Goal::personal("9", draft("X", 10.0)).unwrap();
        let json = serde_json::to_value(&personal).unwrap();
        assert_eq!(json["type"], "personal");
        assert!(json.get("assignedBy").is_none());
    }

    #[test]
    fn reads_legacy_field_names() {
        let raw = r#"{"id":"5","title":"T","targetHours":4,"currentHours":1,
            "timeframe":"daily","period":"2024-06-01","type":"organization",
            "assignedBy":"Ops","learnerId":3,"status":"overdue"}"#;
        let goal: Goal = serde_json::from_str(raw).unwrap();
        assert_eq!(goal.completed_hours, 1.0);
        assert_eq!(goal.status, GoalStatus::Overdue);
        assert_eq!(
            goal.origin,
            GoalOrigin::Organization {
                assigned_by: "Ops".into(),
                learner_id: Some(3)
            }
        );
    }

    #[test]
    fn progress_and_completion() {
        let goal = Goal::personal("1", draft("X", 10.0)).unwrap();
        assert_eq!(goal.progress_band(), ProgressBand::Behind);
        let goal = goal.log_hours(7.5).unwrap();
        assert_eq!(goal.progress_percent(), 75.0);
        assert_eq!(goal.progress_band(), ProgressBand::OnTrack);
        assert_eq!(goal.progress_band().label(), "on track");
        assert_eq!(goal.status, GoalStatus::Active);
        let goal = goal.log_hours(5.0).unwrap();
        assert_eq!(goal.progress_percent(), 100.0);
        assert_eq!(goal.status, GoalStatus::Completed);
        assert_eq!(goal.clone().mark_overdue().status, GoalStatus::Completed);
        assert!(goal.log_hours(-1.0).is_err());
    }

    #[test]
    fn only_organization_goals_are_locked() {
        assert!(default_goals().iter().all(|g| g.is_locked()));
        assert!(!Goal::personal("1", draft("X", 1.0)).unwrap().is_locked());
    }

    #[test]
    fn learner_scoping() {
        let mut goals = default_goals();
        goals.push(Goal::organization("3", draft("Only Jane", 5.0), "Ops", Some(2)).unwrap());
        goals.push(Goal::personal("4", draft("Mine", 5.0)).unwrap());

        assert_eq!(goals_for_learner(1).apply(&goals).len(), 3);
        assert_eq!(goals_for_learner(2).apply(&goals).len(), 4);
        assert_eq!(organization_goals().apply(&goals).len(), 3);
        assert_eq!(personal_goals().apply(&goals).len(), 1);
    }

    #[test]
    fn timeframe_parses_case_insensitively() {
        assert_eq!("Quarterly".parse::<Timeframe>().unwrap(), Timeframe::Quarterly);
        assert!("fortnightly".parse::<Timeframe>().is_err());
    }
}
