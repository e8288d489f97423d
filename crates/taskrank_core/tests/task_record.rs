use taskrank_core::db::open_db_in_memory;
use taskrank_core::{
    fields, DbConfig, Importance, RecordError, RecordState, RepoError, SqliteTaskStore,
    TaskColorClass, TaskRecord, TaskStore,
};

const NOW: i64 = 1_700_000_000_000;

#[test]
fn commit_inserts_and_assigns_identifier() {
    let db = open_db_in_memory(&DbConfig::default()).unwrap();
    let store = SqliteTaskStore::try_new(&db.conn, "tasks").unwrap();

    let mut record = TaskRecord::new();
    record.set(fields::NAME, "pay rent".to_string()).unwrap();
    record.set(fields::IMPORTANCE, Importance::Level1).unwrap();
    assert_eq!(record.state(), RecordState::Dirty);

    let id = record.commit_at(&store, NOW).unwrap();
    assert_eq!(record.id(), Some(id));
    assert_eq!(record.state(), RecordState::Committed);
    assert!(!record.is_dirty());
    assert_eq!(record.get(fields::NAME).unwrap(), "pay rent");
    assert_eq!(record.get(fields::CREATION_DATE).unwrap(), Some(NOW));

    let loaded = TaskRecord::from_row(store.load_row(id).unwrap());
    assert_eq!(loaded.get(fields::NAME).unwrap(), "pay rent");
    assert_eq!(loaded.get(fields::IMPORTANCE).unwrap(), Importance::Level1);
    assert_eq!(loaded.get(fields::CREATION_DATE).unwrap(), Some(NOW));
}

#[test]
fn commit_keeps_explicit_creation_date() {
    let db = open_db_in_memory(&DbConfig::default()).unwrap();
    let store = SqliteTaskStore::try_new(&db.conn, "tasks").unwrap();

    let mut record = TaskRecord::new();
    record.set(fields::CREATION_DATE, Some(42)).unwrap();
    let id = record.commit_at(&store, NOW).unwrap();

    let loaded = TaskRecord::from_row(store.load_row(id).unwrap());
    assert_eq!(loaded.get(fields::CREATION_DATE).unwrap(), Some(42));
}

#[test]
fn commit_update_flushes_pending_and_reload_refreshes() {
    let db = open_db_in_memory(&DbConfig::default()).unwrap();
    let store = SqliteTaskStore::try_new(&db.conn, "tasks").unwrap();

    let mut record = TaskRecord::new();
    record.set(fields::NAME, "draft".to_string()).unwrap();
    let id = record.commit_at(&store, NOW).unwrap();

    let mut other_handle = TaskRecord::from_row(store.load_row(id).unwrap());
    other_handle.set(fields::NOTES, "from elsewhere".to_string()).unwrap();
    other_handle.commit(&store).unwrap();

    record.set(fields::NAME, "final".to_string()).unwrap();
    record.commit(&store).unwrap();
    assert_eq!(record.get(fields::NOTES).unwrap(), "");

    record.reload(&store).unwrap();
    assert_eq!(record.state(), RecordState::Clean);
    assert_eq!(record.get(fields::NAME).unwrap(), "final");
    assert_eq!(record.get(fields::NOTES).unwrap(), "from elsewhere");
}

#[test]
fn reload_discards_pending_values() {
    let db = open_db_in_memory(&DbConfig::default()).unwrap();
    let store = SqliteTaskStore::try_new(&db.conn, "tasks").unwrap();

    let mut record = TaskRecord::new();
    record.set(fields::NAME, "saved".to_string()).unwrap();
    record.commit(&store).unwrap();

    record.set(fields::NAME, "unsaved".to_string()).unwrap();
    record.reload(&store).unwrap();
    assert_eq!(record.get(fields::NAME).unwrap(), "saved");
    assert!(!record.is_dirty());
}

#[test]
fn reload_requires_identifier_and_existing_row() {
    let db = open_db_in_memory(&DbConfig::default()).unwrap();
    let store = SqliteTaskStore::try_new(&db.conn, "tasks").unwrap();

    let mut fresh = TaskRecord::new();
    assert!(matches!(
        fresh.reload(&store),
        Err(RepoError::Record(RecordError::MissingIdentifier))
    ));

    let mut record = TaskRecord::new();
    let id = record.commit(&store).unwrap();
    store.delete_row(id).unwrap();
    assert!(matches!(record.reload(&store), Err(RepoError::NotFound(_))));
}

#[test]
fn commit_rejects_self_blocking_task() {
    let db = open_db_in_memory(&DbConfig::default()).unwrap();
    let store = SqliteTaskStore::try_new(&db.conn, "tasks").unwrap();

    let mut record = TaskRecord::new();
    let id = record.commit(&store).unwrap();
    record.set(fields::BLOCKING_ON, Some(id)).unwrap();

    let err = record.commit(&store).unwrap_err();
    assert!(matches!(err, RepoError::Record(RecordError::SelfBlocking(_))));
    assert!(record.is_dirty());
}

#[test]
fn blocking_on_other_task_round_trips() {
    let db = open_db_in_memory(&DbConfig::default()).unwrap();
    let store = SqliteTaskStore::try_new(&db.conn, "tasks").unwrap();

    let mut blocker = TaskRecord::new();
    let blocker_id = blocker.commit(&store).unwrap();

    let mut blocked = TaskRecord::new();
    blocked.set(fields::BLOCKING_ON, Some(blocker_id)).unwrap();
    let blocked_id = blocked.commit(&store).unwrap();

    let loaded = TaskRecord::from_row(store.load_row(blocked_id).unwrap());
    assert_eq!(loaded.get(fields::BLOCKING_ON).unwrap(), Some(blocker_id));
    assert_ne!(blocked_id, blocker_id);
}

#[test]
fn stored_corrupt_importance_surfaces_on_read() {
    let db = open_db_in_memory(&DbConfig::default()).unwrap();
    db.conn
        .execute(
            "INSERT INTO tasks (name, notes, progressPercentage, importance) VALUES ('bad', '', 0, 17);",
            [],
        )
        .unwrap();
    let store = SqliteTaskStore::try_new(&db.conn, "tasks").unwrap();

    let record = TaskRecord::from_row(store.list_rows().unwrap().remove(0));
    assert!(matches!(
        record.get(fields::IMPORTANCE),
        Err(RecordError::CorruptEnum { value: 17, .. })
    ));
    assert!(record.task_color_class_at(NOW).is_err());
}

#[test]
fn timer_stop_persists_elapsed_time() {
    let db = open_db_in_memory(&DbConfig::default()).unwrap();
    let store = SqliteTaskStore::try_new(&db.conn, "tasks").unwrap();

    let mut record = TaskRecord::new();
    record.start_timer_at(NOW).unwrap();
    let id = record.commit(&store).unwrap();

    let mut loaded = TaskRecord::from_row(store.load_row(id).unwrap());
    assert!(loaded.is_timer_running().unwrap());
    assert_eq!(loaded.stop_timer_at(NOW + 90_500).unwrap(), 90);
    loaded.commit(&store).unwrap();

    let reread = TaskRecord::from_row(store.load_row(id).unwrap());
    assert_eq!(reread.get(fields::ELAPSED_SECONDS).unwrap(), 90);
    assert_eq!(reread.get(fields::TIMER_START).unwrap(), None);
    assert_eq!(
        reread.clone().stop_timer_at(NOW).unwrap_err(),
        RecordError::TimerNotRunning
    );
}

#[test]
fn completion_and_color_survive_persistence() {
    let db = open_db_in_memory(&DbConfig::default()).unwrap();
    let store = SqliteTaskStore::try_new(&db.conn, "tasks").unwrap();

    let mut record = TaskRecord::new();
    record.set(fields::DEFINITE_DUE_DATE, Some(NOW - 1)).unwrap();
    record.set_at(fields::PROGRESS_PERCENTAGE, 100, NOW).unwrap();
    let id = record.commit(&store).unwrap();

    let loaded = TaskRecord::from_row(store.load_row(id).unwrap());
    assert!(loaded.is_task_completed().unwrap());
    assert_eq!(loaded.get(fields::COMPLETION_DATE).unwrap(), Some(NOW));
    assert_eq!(loaded.task_color_class_at(NOW).unwrap(), TaskColorClass::Overdue);
}

#[test]
fn every_field_reads_back_what_was_set_on_a_loaded_record() {
    let db = open_db_in_memory(&DbConfig::default()).unwrap();
    let store = SqliteTaskStore::try_new(&db.conn, "tasks").unwrap();

    let mut blocker = TaskRecord::new();
    let blocker_id = blocker.commit_at(&store, NOW).unwrap();

    let mut seed = TaskRecord::new();
    seed.set(fields::NAME, "seed".to_string()).unwrap();
    seed.set(fields::NOTES, "seed notes".to_string()).unwrap();
    seed.set(fields::PROGRESS_PERCENTAGE, 30).unwrap();
    seed.set(fields::IMPORTANCE, Importance::Level2).unwrap();
    seed.set(fields::ESTIMATED_SECONDS, Some(900)).unwrap();
    seed.set(fields::ELAPSED_SECONDS, 60).unwrap();
    seed.set(fields::TIMER_START, Some(NOW - 1)).unwrap();
    seed.set(fields::DEFINITE_DUE_DATE, Some(NOW + 2)).unwrap();
    seed.set(fields::PREFERRED_DUE_DATE, Some(NOW + 3)).unwrap();
    seed.set(fields::HIDDEN_UNTIL, Some(NOW + 4)).unwrap();
    seed.set(fields::BLOCKING_ON, Some(blocker_id)).unwrap();
    seed.set(fields::NOTIFICATIONS, 1).unwrap();
    seed.set(fields::CREATION_DATE, Some(NOW - 5)).unwrap();
    seed.set(fields::COMPLETION_DATE, Some(NOW - 6)).unwrap();
    let id = seed.commit_at(&store, NOW).unwrap();

    let mut record = TaskRecord::from_row(store.load_row(id).unwrap());
    assert_eq!(record.get(fields::ESTIMATED_SECONDS).unwrap(), Some(900));
    assert_eq!(record.get(fields::BLOCKING_ON).unwrap(), Some(blocker_id));

    record.set(fields::NAME, "renamed".to_string()).unwrap();
    record.set(fields::NOTES, String::new()).unwrap();
    record.set(fields::PROGRESS_PERCENTAGE, 55).unwrap();
    record.set(fields::IMPORTANCE, Importance::Level4).unwrap();
    record.set(fields::ESTIMATED_SECONDS, None).unwrap();
    record.set(fields::ELAPSED_SECONDS, 12).unwrap();
    record.set(fields::TIMER_START, None).unwrap();
    record.set(fields::DEFINITE_DUE_DATE, None).unwrap();
    record.set(fields::PREFERRED_DUE_DATE, None).unwrap();
    record.set(fields::HIDDEN_UNTIL, None).unwrap();
    record.set(fields::BLOCKING_ON, None).unwrap();
    record.set(fields::NOTIFICATIONS, 3).unwrap();
    record.set(fields::CREATION_DATE, None).unwrap();
    record.set(fields::COMPLETION_DATE, None).unwrap();

    let check = |record: &TaskRecord| {
        assert_eq!(record.get(fields::NAME).unwrap(), "renamed");
        assert_eq!(record.get(fields::NOTES).unwrap(), "");
        assert_eq!(record.get(fields::PROGRESS_PERCENTAGE).unwrap(), 55);
        assert_eq!(record.get(fields::IMPORTANCE).unwrap(), Importance::Level4);
        assert_eq!(record.get(fields::ESTIMATED_SECONDS).unwrap(), None);
        assert_eq!(record.get(fields::ELAPSED_SECONDS).unwrap(), 12);
        assert_eq!(record.get(fields::TIMER_START).unwrap(), None);
        assert_eq!(record.get(fields::DEFINITE_DUE_DATE).unwrap(), None);
        assert_eq!(record.get(fields::PREFERRED_DUE_DATE).unwrap(), None);
        assert_eq!(record.get(fields::HIDDEN_UNTIL).unwrap(), None);
        assert_eq!(record.get(fields::BLOCKING_ON).unwrap(), None);
        assert_eq!(record.get(fields::NOTIFICATIONS).unwrap(), 3);
        assert_eq!(record.get(fields::CREATION_DATE).unwrap(), None);
        assert_eq!(record.get(fields::COMPLETION_DATE).unwrap(), None);
    };

    check(&record);
    record.commit_at(&store, NOW).unwrap();
    check(&record);
    check(&TaskRecord::from_row(store.load_row(id).unwrap()));
}
