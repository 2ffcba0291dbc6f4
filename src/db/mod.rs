pub mod memory;
pub mod migrations;
pub mod queries;

use anyhow::Context;
use rusqlite::Connection;

use crate::errors::AppError;
use crate::models::{Meeting, User};

pub use memory::InMemoryRepository;
pub use queries::SqliteRepository;

/// Storage for users and confirmed meetings.
pub trait MeetingRepository: Send + Sync {
    fn save_meeting(&self, meeting: &Meeting) -> Result<(), AppError>;
    fn save_user(&self, user: &User) -> Result<(), AppError>;
    fn get_user(&self, email: &str) -> Result<Option<User>, AppError>;
}

pub fn init_db(path: &str) -> anyhow::Result<Connection> {
    let conn = Connection::open(path).context("failed to open database")?;

    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
        .context("failed to set database pragmas")?;

    migrations::run_migrations(&conn)?;

    Ok(conn)
}

pub fn from_url(database_url: Option<&str>) -> anyhow::Result<Box<dyn MeetingRepository>> {
    match database_url {
        Some(path) => {
            tracing::info!(path, "using sqlite repository");
            Ok(Box::new(SqliteRepository::new(init_db(path)?)))
        }
        None => {
            tracing::info!("DATABASE_URL not set, meetings are kept in memory");
            Ok(Box::new(InMemoryRepository::default()))
        }
    }
}
