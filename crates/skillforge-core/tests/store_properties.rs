//! Persistence behaviour across store instances sharing one backend.

use skillforge_core::{
    default_agents, default_goals, default_users, user_query, Agent, CoreConfig, EntityStore, Goal, MemorySlots,
    NewGoal, Privilege, SledSlots, SlotBackend, StoreError, Timeframe, User, Workspace, AGENTS_SLOT, GOALS_SLOT,
    USERS_SLOT,
};
use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;

fn weekly_goal(title: &str, hours: f64) -> NewGoal {
    NewGoal {
        title: title.into(),
        description: String::new(),
        target_hours: hours,
        timeframe: Timeframe::Weekly,
        period: "2024-W25".into(),
    }
}

#[test]
fn restart_sees_last_saved_collection() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("slots");
    let expected = {
        let backend: Arc<dyn SlotBackend> = Arc::new(SledSlots::open_path(&path).unwrap());
        let mut goals = EntityStore::new(backend, GOALS_SLOT, default_goals);
        goals.load().unwrap();
        let a = Goal::personal("p-1", weekly_goal("Rust", 5.0)).unwrap();
        let b = Goal::personal("p-2", weekly_goal("Go", 3.0)).unwrap();
        goals.add(a).unwrap();
        goals.add(b).unwrap();
        goals.update(&"p-1".to_string(), |g| g.log_hours(2.0).unwrap()).unwrap();
        assert!(goals.remove(&"p-2".to_string()).unwrap());
        goals.items().to_vec()
    };

    let backend: Arc<dyn SlotBackend> = Arc::new(SledSlots::open_path(&path).unwrap());
    let mut reopened = EntityStore::new(backend, GOALS_SLOT, Vec::<Goal>::new);
    let loaded = reopened.load().unwrap();
    assert_eq!(loaded, expected);
    assert!(loaded.iter().all(|g| g.id != "p-2"));
    assert_eq!(loaded.iter().find(|g| g.id == "p-1").unwrap().completed_hours, 2.0);
}

#[test]
fn seeds_exactly_once() {
    let backend: Arc<dyn SlotBackend> = Arc::new(MemorySlots::new());
    let calls = Rc::new(Cell::new(0));
    let counter = Rc::clone(&calls);
    let seed = move || {
        counter.set(counter.get() + 1);
        default_users()
    };
    let mut users = EntityStore::new(Arc::clone(&backend), USERS_SLOT, seed);

    let first = users.load().unwrap();
    let second = users.load().unwrap();
    assert_eq!(first, default_users());
    assert_eq!(first, second);
    assert_eq!(calls.get(), 1);

    let mut other = EntityStore::new(backend, USERS_SLOT, || -> Vec<User> { panic!("slot is populated") });
    assert_eq!(other.load().unwrap(), first);
}

#[test]
fn added_personal_goal_keeps_its_fields() {
    let mut ws = Workspace::with_backend(Arc::new(MemorySlots::new()), &CoreConfig::default());
    let before = ws.goals.load().unwrap().len();

    let draft = NewGoal {
        title: "X".into(),
        description: String::new(),
        target_hours: 10.0,
        timeframe: Timeframe::Weekly,
        period: "2024-W25".into(),
    };
    let created = ws.create_personal_goal(draft).unwrap();
    let after = ws.goals.load().unwrap();

    assert_eq!(after.len(), before + 1);
    let stored = after.iter().find(|g| g.id == created.id).unwrap();
    assert_eq!(stored.title, "X");
    assert_eq!(stored.target_hours, 10.0);
    assert_eq!(stored.timeframe, Timeframe::Weekly);
    assert!(!stored.is_organization());
    assert_eq!(stored.completed_hours, 0.0);
}

#[test]
fn deactivating_an_agent_touches_only_that_flag() {
    let backend: Arc<dyn SlotBackend> = Arc::new(MemorySlots::new());
    let mut agents = EntityStore::new(Arc::clone(&backend), AGENTS_SLOT, default_agents);
    let id = "tutor-agent".to_string();
    let before = agents.load().unwrap().into_iter().find(|a| a.id == id).unwrap();
    assert!(before.active);

    agents
        .update(&id, |a| Agent { active: false, ..a })
        .unwrap();

    let mut reopened = EntityStore::new(backend, AGENTS_SLOT, Vec::<Agent>::new);
    let after = reopened.load().unwrap().into_iter().find(|a| a.id == id).unwrap();
    assert_eq!(after, Agent { active: false, ..before });
}

#[test]
fn status_filter_keeps_source_order() {
    let users = default_users();
    let active = user_query("", Some("Active"), None).apply(&users);
    let ids: Vec<u64> = active.iter().map(|u| u.id).collect();
    assert_eq!(ids, vec![1, 2, 4, 5]);
    assert!(active.iter().all(|u| u.status.as_str() == "Active"));
}

#[test]
fn locked_goals_leave_slot_bytes_untouched() {
    let backend: Arc<dyn SlotBackend> = Arc::new(MemorySlots::new());
    let mut goals = EntityStore::new(Arc::clone(&backend), GOALS_SLOT, default_goals);
    goals.load().unwrap();
    let before = backend.read(GOALS_SLOT).unwrap();
    let id = "1".to_string();

    assert!(matches!(goals.remove(&id), Err(StoreError::Locked { .. })));
    assert!(matches!(
        goals.update(&id, |g| g.mark_overdue()),
        Err(StoreError::Locked { .. })
    ));
    assert_eq!(backend.read(GOALS_SLOT).unwrap(), before);

    assert!(goals.remove_as(Privilege::Override, &id).unwrap());
    assert_ne!(backend.read(GOALS_SLOT).unwrap(), before);
}

#[test]
fn ids_stay_unique_across_adds() {
    let mut ws = Workspace::with_backend(Arc::new(MemorySlots::new()), &CoreConfig::default());
    for n in 0..5 {
        ws.create_personal_goal(weekly_goal(&format!("goal {}", n), 1.0)).unwrap();
    }
    let goals = ws.goals.load().unwrap();
    let mut ids: Vec<&str> = goals.iter().map(|g| g.id.as_str()).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), goals.len());

    let existing = goals[0].clone();
    assert!(matches!(ws.goals.add(existing), Err(StoreError::DuplicateId { .. })));
}

#[test]
fn second_writer_gets_a_conflict() {
    let backend: Arc<dyn SlotBackend> = Arc::new(MemorySlots::new());
    let mut first = EntityStore::new(Arc::clone(&backend), GOALS_SLOT, default_goals);
    let mut second = EntityStore::new(Arc::clone(&backend), GOALS_SLOT, default_goals);
    first.load().unwrap();
    second.load().unwrap();

    first.add(Goal::personal("a", weekly_goal("A", 1.0)).unwrap()).unwrap();
    let err = second.add(Goal::personal("b", weekly_goal("B", 1.0)).unwrap()).unwrap_err();
    assert!(matches!(err, StoreError::Conflict { .. }));

    second.load().unwrap();
    second.add(Goal::personal("b", weekly_goal("B", 1.0)).unwrap()).unwrap();
    assert_eq!(second.len(), default_goals().len() + 2);
}

#[test]
fn quota_failure_rolls_back() {
    let backend: Arc<dyn SlotBackend> = Arc::new(MemorySlots::with_quota(2_000));
    let mut goals = EntityStore::new(Arc::clone(&backend), GOALS_SLOT, Vec::<Goal>::new);
    goals.load().unwrap();
    goals.add(Goal::personal("small", weekly_goal("S", 1.0)).unwrap()).unwrap();
    let before_bytes = backend.read(GOALS_SLOT).unwrap();
    let before_items = goals.items().to_vec();

    let big = Goal::personal("big", weekly_goal(&"x".repeat(4_000), 1.0)).unwrap();
    assert!(matches!(goals.add(big), Err(StoreError::Storage { .. })));
    assert_eq!(goals.items(), before_items.as_slice());
    assert_eq!(backend.read(GOALS_SLOT).unwrap(), before_bytes);
}
