use rusqlite::{params, Connection};
use taskrank_core::db::schema::{current_user_version, ensure_schema, latest_version, upgrade_schema};
use taskrank_core::db::{open_db, open_db_in_memory, DbConfig, DbError, SchemaOutcome};
use taskrank_core::{FieldValue, SqliteTaskStore, TaskField, TaskStore, SCHEMA_VERSION};

#[test]
fn open_db_in_memory_creates_task_table() {
    let db = open_db_in_memory(&DbConfig::default()).unwrap();

    assert_eq!(db.schema, SchemaOutcome::Created { version: SCHEMA_VERSION });
    assert_eq!(schema_version(&db.conn), latest_version());
    assert_eq!(
        column_names(&db.conn, "tasks"),
        expected_columns(),
    );
}

#[test]
fn reopening_file_database_is_up_to_date_and_keeps_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tasks.db");
    let config = DbConfig::default();

    let first = open_db(&path, &config).unwrap();
    assert!(matches!(first.schema, SchemaOutcome::Created { .. }));
    first
        .conn
        .execute("INSERT INTO tasks (name, notes, progressPercentage, importance) VALUES ('keep', '', 0, 2);", [])
        .unwrap();
    drop(first);

    let second = open_db(&path, &config).unwrap();
    assert_eq!(second.schema, SchemaOutcome::UpToDate { version: SCHEMA_VERSION });
    assert_eq!(row_count(&second.conn, "tasks"), 1);
}

#[test]
fn configured_table_name_is_used() {
    let config = DbConfig {
        table: "inbox".to_string(),
        ..DbConfig::default()
    };
    let db = open_db_in_memory(&config).unwrap();
    assert_eq!(column_names(&db.conn, "inbox"), expected_columns());
}

#[test]
fn config_deserializes_with_defaults() {
    let config: DbConfig = serde_json::from_str(r#"{ "table": "work" }"#).unwrap();
    assert_eq!(config.table, "work");
    assert_eq!(config.busy_timeout_ms, DbConfig::default().busy_timeout_ms);
}

#[test]
fn invalid_table_name_is_a_schema_error() {
    let config = DbConfig {
        table: "tasks; DROP TABLE x".to_string(),
        ..DbConfig::default()
    };
    let err = open_db_in_memory(&config).unwrap_err();
    assert!(matches!(err, DbError::InvalidTableName(_)));
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path, &DbConfig::default()).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, SCHEMA_VERSION);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn unregistered_upgrade_recreates_empty_table_and_warns() {
    let mut conn = Connection::open_in_memory().unwrap();
    ensure_schema(&mut conn, "tasks", SCHEMA_VERSION).unwrap();
    conn.execute(
        "INSERT INTO tasks (name, notes, progressPercentage, importance) VALUES (?1, '', 0, 1);",
        params!["doomed"],
    )
    .unwrap();
    assert_eq!(row_count(&conn, "tasks"), 1);

    let next_version = SCHEMA_VERSION + 1;
    let outcome = ensure_schema(&mut conn, "tasks", next_version).unwrap();

    let warning = outcome.destructive_warning().expect("destructive warning expected");
    assert_eq!(warning.table, "tasks");
    assert_eq!(warning.old_version, SCHEMA_VERSION);
    assert_eq!(warning.new_version, next_version);
    assert_eq!(row_count(&conn, "tasks"), 0);
    assert_eq!(column_names(&conn, "tasks"), expected_columns());
    assert_eq!(current_user_version(&conn).unwrap(), next_version);
}

#[test]
fn upgrade_schema_from_unknown_version_replaces_legacy_table() {
    let mut conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE tasks (_id INTEGER PRIMARY KEY, title TEXT);
         INSERT INTO tasks (title) VALUES ('legacy');
         PRAGMA user_version = 1;",
    )
    .unwrap();

    let outcome = upgrade_schema(&mut conn, "tasks", 0, SCHEMA_VERSION).unwrap();
    assert!(matches!(outcome, SchemaOutcome::Recreated(_)));
    assert_eq!(column_names(&conn, "tasks"), expected_columns());

    let store = SqliteTaskStore::try_new(&conn, "tasks").unwrap();
    assert!(store.list_rows().unwrap().is_empty());
}

#[test]
fn recreated_table_accepts_default_rows() {
    let mut conn = Connection::open_in_memory().unwrap();
    upgrade_schema(&mut conn, "tasks", 0, SCHEMA_VERSION).unwrap();

    let store = SqliteTaskStore::try_new(&conn, "tasks").unwrap();
    let id = store.write_row(None, &Default::default()).unwrap();
    let row = store.load_row(id).unwrap();
    assert_eq!(row.fields[&TaskField::Name], FieldValue::Text(String::new()));
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn row_count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM \"{table}\";"), [], |row| row.get(0))
        .unwrap()
}

fn column_names(conn: &Connection, table: &str) -> Vec<String> {
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info(\"{table}\");"))
        .unwrap();
    stmt.query_map([], |row| row.get::<_, String>(1))
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap()
}

fn expected_columns() -> Vec<String> {
    std::iter::once("_id".to_string())
        .chain(TaskField::ALL.iter().map(|field| field.column().to_string()))
        .collect()
}
