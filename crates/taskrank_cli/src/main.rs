//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `taskrank_core` linkage.
//! - Exercise open → create → rank against an in-memory store.

use std::process::ExitCode;
use taskrank_core::db::open_db_in_memory;
use taskrank_core::{
    core_version, fields, DbConfig, Importance, RepoError, SqliteTaskStore, TaskService,
};

fn main() -> ExitCode {
    println!("taskrank_core version={}", core_version());
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("taskrank smoke failed: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), RepoError> {
    let config = DbConfig::default();
    let db = open_db_in_memory(&config)?;
    let service = TaskService::new(SqliteTaskStore::try_new(&db.conn, &config.table)?);

    service.create_task("water plants")?;
    let mut taxes = service.create_task("file taxes")?;
    taxes.set(fields::IMPORTANCE, Importance::Level1)?;
    service.save_task(&mut taxes)?;

    for record in service.list_ranked(true)? {
        println!(
            "task id={} name={} color={:?}",
            record.id().map_or(-1, |id| id.get()),
            record.get(fields::NAME)?,
            record.task_color_class()?
        );
    }
    Ok(())
}
