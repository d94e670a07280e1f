//! Subcommands and their handlers. Handlers return the text to print so they
//! can be driven against an in-memory workspace.

use anyhow::Context;
use clap::{Args, Subcommand};
use skillforge_core::{
    active_agents, goals_for_learner, organization_goals, personal_goals, user_query, AdminRole, Agent, CourseDraft,
    Goal, LoginForm, NewGoal, Privilege, Query, StoreError, User, UserDraft, UserType, Workspace,
};
use std::fmt::Write as _;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show backend kind and per-slot presence
    Status {
        /// Emit the slot report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage installed agents
    #[command(subcommand)]
    Agents(AgentCommands),

    /// Manage learning goals
    #[command(subcommand)]
    Goals(GoalCommands),

    /// Manage the user roster
    #[command(subcommand)]
    Users(UserCommands),

    /// Manage approved courses
    #[command(subcommand)]
    Courses(CourseCommands),

    /// Sign in (demo: any password is accepted)
    Login {
        email: String,
        #[arg(short, long)]
        password: String,
        /// admin or learner
        #[arg(short = 't', long, default_value = "learner")]
        user_type: String,
        /// Required for admins, e.g. course-manager
        #[arg(short, long)]
        admin_role: Option<String>,
    },

    /// Sign out; stored collections are kept
    Logout,

    /// Show the signed-in identity
    Whoami,
}

#[derive(Debug, Subcommand)]
pub enum AgentCommands {
    /// List installed agents
    List {
        /// Only agents whose active flag is set
        #[arg(long)]
        active: bool,
    },
    /// List catalog agents that are not installed
    Available,
    /// Install a catalog agent
    Install { id: String },
    /// Change an agent's display name
    Rename { id: String, name: String },
    /// Restore the catalog name
    ResetName { id: String },
    /// Flip the active flag
    Toggle { id: String },
    /// Uninstall an agent
    Remove { id: String },
}

#[derive(Debug, Args)]
pub struct GoalArgs {
    title: String,
    /// Target study hours
    #[arg(long)]
    hours: f64,
    /// daily, weekly, monthly, quarterly or yearly
    #[arg(long, default_value = "weekly")]
    timeframe: String,
    /// Period label such as 2024-W24
    #[arg(long)]
    period: String,
    #[arg(long, default_value = "")]
    description: String,
}

impl GoalArgs {
    fn into_draft(self) -> anyhow::Result<NewGoal> {
        Ok(NewGoal {
            title: self.title,
            description: self.description,
            target_hours: self.hours,
            timeframe: self.timeframe.parse()?,
            period: self.period,
        })
    }
}

#[derive(Debug, Subcommand)]
pub enum GoalCommands {
    /// List goals
    List {
        /// Only goals visible to this learner id
        #[arg(long)]
        learner: Option<u64>,
        /// organization or personal
        #[arg(long)]
        origin: Option<String>,
    },
    /// Add a personal goal
    Add(GoalArgs),
    /// Assign an organization goal
    Assign {
        #[command(flatten)]
        goal: GoalArgs,
        /// Name shown as the assigner
        #[arg(long, default_value = "Course Manager")]
        by: String,
        /// Restrict to one learner id
        #[arg(long)]
        learner: Option<u64>,
    },
    /// Record study hours against a goal
    Log {
        id: String,
        hours: f64,
        /// Act with admin privilege regardless of the session
        #[arg(long = "override")]
        force: bool,
    },
    /// Delete a goal
    Remove {
        id: String,
        #[arg(long = "override")]
        force: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum UserCommands {
    /// List users, optionally filtered
    List {
        #[arg(short, long, default_value = "")]
        search: String,
        /// Active or Inactive
        #[arg(long)]
        status: Option<String>,
        /// Learner, Admin or Instructor
        #[arg(long)]
        role: Option<String>,
    },
    /// Create a user
    Add {
        name: String,
        email: String,
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
        #[arg(long, default_value = "learner")]
        role: String,
        #[arg(long, default_value = "")]
        dept: String,
    },
    /// Change a user's status
    SetStatus { id: u64, status: String },
    /// Delete a user
    Remove { id: u64 },
}

#[derive(Debug, Subcommand)]
pub enum CourseCommands {
    /// List approved courses
    List,
    /// Generate a course and store it as approved
    Approve {
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Agent id; repeat for several
        #[arg(long = "agent", required = true)]
        agents: Vec<String>,
    },
}

/// The message to show as a plain notice when `err` is a store error that
/// left every collection unchanged (validation, not found, locked, duplicate).
pub fn user_notice(err: &anyhow::Error) -> Option<String> {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<StoreError>())
        .filter(|store_err| store_err.is_user_error())
        .map(|_| format!("{:#}", err))
}

/// Runs one command against `ws` and returns what to print.
pub fn run(ws: &mut Workspace, command: Command) -> anyhow::Result<String> {
    match command {
        Command::Status { json: true } => Ok(serde_json::to_string_pretty(&ws.slot_status())?),
        Command::Status { json: false } => Ok(status(ws)),
        Command::Agents(cmd) => agents(ws, cmd),
        Command::Goals(cmd) => goals(ws, cmd),
        Command::Users(cmd) => users(ws, cmd),
        Command::Courses(cmd) => courses(ws, cmd),
        Command::Login {
            email,
            password,
            user_type,
            admin_role,
        } => {
            let form = LoginForm {
                email,
                password,
                user_type: Some(user_type.parse::<UserType>()?),
                admin_role: admin_role.map(|r| r.parse::<AdminRole>()).transpose()?,
            };
            let who = ws.session.login(form)?;
            Ok(format!("signed in as {} ({:?})", who.name, who.user_type))
        }
        Command::Logout => Ok(if ws.session.logout()? {
            "signed out".to_string()
        } else {
            "nobody was signed in".to_string()
        }),
        Command::Whoami => Ok(match ws.session.current()? {
            Some(who) => match who.admin_role {
                Some(role) => format!("{} <{}> admin: {}", who.name, who.email, role.label()),
                None => format!("{} <{}> learner", who.name, who.email),
            },
            None => "not signed in".to_string(),
        }),
    }
}

fn status(ws: &Workspace) -> String {
    let mut out = format!("backend: {}\n", ws.backend_kind());
    for s in ws.slot_status() {
        let state = match (&s.error, s.present) {
            (Some(e), _) => format!("error: {}", e),
            (None, true) => format!("{} bytes", s.bytes),
            (None, false) => "empty".to_string(),
        };
        let _ = writeln!(out, "  {:<28} {}", s.slot, state);
    }
    out.trim_end().to_string()
}

/// Explicit `--override`, else whatever the signed-in identity allows.
fn privilege(ws: &Workspace, force: bool) -> anyhow::Result<Privilege> {
    if force {
        return Ok(Privilege::Override);
    }
    Ok(ws
        .session
        .current()?
        .map(|who| who.privilege())
        .unwrap_or_default())
}

fn agent_line(a: &Agent) -> String {
    let renamed = if a.is_renamed() {
        format!(" (was {})", a.original_name)
    } else {
        String::new()
    };
    format!(
        "{:<20} {:<22} {:<8} {:>5} interactions {:>3}% efficiency{}",
        a.id,
        a.name,
        if a.active { "active" } else { "inactive" },
        a.interactions,
        a.efficiency,
        renamed
    )
}

fn agents(ws: &mut Workspace, cmd: AgentCommands) -> anyhow::Result<String> {
    match cmd {
        AgentCommands::List { active } => {
            let all = ws.agents.load()?;
            let shown: Vec<&Agent> = if active {
                active_agents().apply(&all)
            } else {
                all.iter().collect()
            };
            Ok(shown.into_iter().map(agent_line).collect::<Vec<_>>().join("\n"))
        }
        AgentCommands::Available => {
            let available = ws.available_agents()?;
            if available.is_empty() {
                return Ok("every catalog agent is installed".to_string());
            }
            Ok(available
                .iter()
                .map(|a| format!("{:<20} {}", a.id, a.description))
                .collect::<Vec<_>>()
                .join("\n"))
        }
        AgentCommands::Install { id } => Ok(format!("installed {}", agent_line(&ws.install_agent(&id)?))),
        AgentCommands::Rename { id, name } => Ok(agent_line(&ws.rename_agent(&id, &name)?)),
        AgentCommands::ResetName { id } => Ok(agent_line(&ws.agents.update(&id, Agent::reset_name)?)),
        AgentCommands::Toggle { id } => {
            let active = ws.agents.toggle(&id, "active")?;
            Ok(format!("{} is now {}", id, if active { "active" } else { "inactive" }))
        }
        AgentCommands::Remove { id } => Ok(if ws.agents.remove(&id)? {
            format!("removed {}", id)
        } else {
            format!("{} is not installed", id)
        }),
    }
}

fn goal_line(g: &Goal) -> String {
    let origin = match g.assigned_by() {
        Some(by) => format!("assigned by {}", by),
        None => "personal".to_string(),
    };
    format!(
        "{:<16} {:<36} {:>5.1}/{:<5.1}h {:>5.1}% {:<8} {:<9} {} {} [{}]",
        g.id,
        g.title,
        g.completed_hours,
        g.target_hours,
        g.progress_percent(),
        g.progress_band().label(),
        g.status.as_str(),
        g.timeframe,
        g.period,
        origin
    )
}

fn goals(ws: &mut Workspace, cmd: GoalCommands) -> anyhow::Result<String> {
    match cmd {
        GoalCommands::List { learner, origin } => {
            let all = ws.goals.load()?;
            let mut query = match origin.as_deref().map(str::to_ascii_lowercase).as_deref() {
                None => Query::new(),
                Some("organization") | Some("admin") => organization_goals(),
                Some("personal") => personal_goals(),
                Some(other) => anyhow::bail!("unknown goal origin '{}'", other),
            };
            if let Some(id) = learner {
                let visible = goals_for_learner(id);
                query = query.when(move |g: &Goal| visible.matches(g));
            }
            Ok(query.apply(&all).into_iter().map(goal_line).collect::<Vec<_>>().join("\n"))
        }
        GoalCommands::Add(args) => {
            let goal = ws.create_personal_goal(args.into_draft()?)?;
            Ok(format!("added {}", goal_line(&goal)))
        }
        GoalCommands::Assign { goal, by, learner } => {
            let goal = ws.assign_goal(goal.into_draft()?, &by, learner)?;
            Ok(format!("assigned {}", goal_line(&goal)))
        }
        GoalCommands::Log { id, hours, force } => {
            let privilege = privilege(ws, force)?;
            let goal = ws.log_goal_hours(privilege, &id, hours).map_err(locked_hint)?;
            Ok(goal_line(&goal))
        }
        GoalCommands::Remove { id, force } => {
            let privilege = privilege(ws, force)?;
            Ok(if ws.goals.remove_as(privilege, &id).map_err(locked_hint)? {
                format!("removed goal {}", id)
            } else {
                format!("no goal {}", id)
            })
        }
    }
}

fn locked_hint(e: StoreError) -> anyhow::Error {
    let hint = matches!(e, StoreError::Locked { .. });
    let err = anyhow::Error::new(e);
    if hint {
        err.context("organization goals need an admin session or --override")
    } else {
        err
    }
}

fn user_line(u: &User) -> String {
    format!(
        "{:<14} {:<16} {:<28} {:<10} {:<8} {:<24} last login {}",
        u.id,
        u.name,
        u.email,
        u.role.as_str(),
        u.status.as_str(),
        u.dept.as_deref().unwrap_or("-"),
        u.last_login
    )
}

fn users(ws: &mut Workspace, cmd: UserCommands) -> anyhow::Result<String> {
    match cmd {
        UserCommands::List { search, status, role } => {
            let all = ws.users.load()?;
            let query = user_query(&search, status.as_deref(), role.as_deref());
            let hits = query.apply(&all);
            let mut out = hits.iter().map(|u| user_line(u)).collect::<Vec<_>>().join("\n");
            let _ = write!(out, "\n{} of {} users", hits.len(), all.len());
            Ok(out.trim_start().to_string())
        }
        UserCommands::Add {
            name,
            email,
            username,
            password,
            role,
            dept,
        } => {
            let draft = UserDraft {
                name,
                email,
                username,
                password,
                role: role.parse()?,
                dept,
                ..UserDraft::default()
            };
            Ok(format!("created {}", user_line(&ws.create_user(draft)?)))
        }
        UserCommands::SetStatus { id, status } => {
            ws.users.load()?;
            let existing = ws
                .users
                .get(&id)
                .with_context(|| format!("no user with id {}", id))?;
            let draft = UserDraft {
                status: status.parse()?,
                ..UserDraft::from_user(existing)
            };
            Ok(user_line(&ws.edit_user(id, draft)?))
        }
        UserCommands::Remove { id } => Ok(if ws.users.remove(&id)? {
            format!("removed user {}", id)
        } else {
            format!("no user {}", id)
        }),
    }
}

fn courses(ws: &mut Workspace, cmd: CourseCommands) -> anyhow::Result<String> {
    match cmd {
        CourseCommands::List => {
            let all = ws.courses.load()?;
            if all.is_empty() {
                return Ok("no approved courses".to_string());
            }
            Ok(all
                .iter()
                .map(|c| {
                    format!(
                        "{:<16} {:<32} {} modules, {}{}",
                        c.id,
                        c.title,
                        c.modules.len(),
                        c.estimated_duration,
                        if c.has_quiz { ", quiz" } else { "" }
                    )
                })
                .collect::<Vec<_>>()
                .join("\n"))
        }
        CourseCommands::Approve {
            title,
            description,
            agents,
        } => {
            ws.agents.load()?;
            if let Some(missing) = agents.iter().find(|id| ws.agents.get(id).is_none()) {
                anyhow::bail!("agent {} is not installed", missing);
            }
            let course = ws.approve_course(CourseDraft {
                title,
                description,
                selected_agents: agents,
            })?;
            let modules = course
                .modules
                .iter()
                .map(|m| format!("  {}. {} ({})", m.id, m.title, m.duration))
                .collect::<Vec<_>>()
                .join("\n");
            Ok(format!("approved {} {}\n{}", course.id, course.title, modules))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use skillforge_core::{CoreConfig, MemorySlots};
    use std::sync::Arc;

    #[derive(Parser)]
    struct TestCli {
        #[command(subcommand)]
        command: Command,
    }

    fn workspace() -> Workspace {
        Workspace::with_backend(Arc::new(MemorySlots::new()), &CoreConfig::default())
    }

    fn exec(ws: &mut Workspace, args: &[&str]) -> anyhow::Result<String> {
        let argv = std::iter::once("skillforge-admin").chain(args.iter().copied());
        let cli = TestCli::try_parse_from(argv)?;
        run(ws, cli.command)
    }

    #[test]
    fn learner_cannot_remove_organization_goal() {
        let mut ws = workspace();
        exec(&mut ws, &["login", "amy@corp.io", "-p", "pw"]).unwrap();
        let err = exec(&mut ws, &["goals", "remove", "1"]).unwrap_err();
        assert!(err.to_string().contains("--override"));
        assert!(exec(&mut ws, &["goals", "remove", "1", "--override"]).unwrap().contains("removed"));
    }

    #[test]
    fn admin_session_can_log_hours() {
        let mut ws = workspace();
        exec(
            &mut ws,
            &["login", "jo@corp.io", "-p", "pw", "-t", "admin", "-a", "course-manager"],
        )
        .unwrap();
        assert!(exec(&mut ws, &["whoami"]).unwrap().contains("Course Manager"));
        let line = exec(&mut ws, &["goals", "log", "1", "2"]).unwrap();
        assert!(line.contains("10.0/15.0"));
        assert!(line.contains("halfway"));
    }

    #[test]
    fn agent_toggle_and_available() {
        let mut ws = workspace();
        assert_eq!(exec(&mut ws, &["agents", "toggle", "tutor-agent"]).unwrap(), "tutor-agent is now inactive");
        let active = exec(&mut ws, &["agents", "list", "--active"]).unwrap();
        assert!(!active.contains("tutor-agent"));
        let available = exec(&mut ws, &["agents", "available"]).unwrap();
        assert!(available.contains("analytics-agent"));
    }

    #[test]
    fn user_filters_and_status_change() {
        let mut ws = workspace();
        let listed = exec(&mut ws, &["users", "list", "--status", "Inactive"]).unwrap();
        assert!(listed.contains("Mike Johnson"));
        assert!(listed.ends_with("1 of 5 users"));
        exec(&mut ws, &["users", "set-status", "3", "active"]).unwrap();
        let listed = exec(&mut ws, &["users", "list", "--status", "Inactive"]).unwrap();
        assert!(listed.ends_with("0 of 5 users"));
    }

    #[test]
    fn store_rejections_become_notices() {
        let mut ws = workspace();
        let locked = exec(&mut ws, &["goals", "remove", "1"]).unwrap_err();
        let notice = user_notice(&locked).unwrap();
        assert!(notice.contains("--override"));
        assert!(notice.contains("managed by the organization"));

        let missing = exec(&mut ws, &["agents", "rename", "no-such-agent", "X"]).unwrap_err();
        assert!(user_notice(&missing).is_some());

        let conflict = anyhow::Error::new(StoreError::Conflict { slot: "s".into() });
        assert!(user_notice(&conflict).is_none());
    }

    #[test]
    fn status_reports_seeded_slots_as_json() {
        let mut ws = workspace();
        ws.load_all().unwrap();
        let report: serde_json::Value = serde_json::from_str(&exec(&mut ws, &["status", "--json"]).unwrap()).unwrap();
        let slots = report.as_array().unwrap();
        assert_eq!(slots.len(), 5);
        assert_eq!(slots.iter().filter(|s| s["present"] == true).count(), 4);
    }

    #[test]
    fn approve_requires_installed_agents() {
        let mut ws = workspace();
        assert!(exec(&mut ws, &["courses", "approve", "Rust", "--agent", "analytics-agent"]).is_err());
        let out = exec(&mut ws, &["courses", "approve", "Rust", "--agent", "assessment-agent"]).unwrap();
        assert!(out.contains("Knowledge Check"));
        assert!(exec(&mut ws, &["courses", "list"]).unwrap().contains("quiz"));
    }
}
