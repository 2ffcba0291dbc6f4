use std::sync::Mutex;

use anyhow::Context;
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension};

use crate::errors::AppError;
use crate::models::{Meeting, User};

use super::MeetingRepository;

const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub struct SqliteRepository {
    conn: Mutex<Connection>,
}

impl SqliteRepository {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, AppError> {
        self.conn
            .lock()
            .map_err(|_| AppError::Internal(anyhow::anyhow!("database connection poisoned")))
    }

    pub fn get_meetings(&self, limit: i64) -> Result<Vec<Meeting>, AppError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, event_id, summary, start_at, end_at, timezone, created_at
             FROM meetings ORDER BY start_at ASC LIMIT ?1",
        )?;

        let rows = stmt.query_map(params![limit], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, String>(6)?,
            ))
        })?;

        let mut meetings = vec![];
        for row in rows {
            let (id, event_id, summary, start, end, timezone, created_at) = row?;
            meetings.push(Meeting {
                id,
                event_id,
                summary,
                start: chrono::DateTime::parse_from_rfc3339(&start)
                    .context("invalid meeting start")?,
                end: chrono::DateTime::parse_from_rfc3339(&end).context("invalid meeting end")?,
                timezone,
                created_at: parse_ts(&created_at)?,
            });
        }
        Ok(meetings)
    }
}

fn parse_ts(s: &str) -> Result<NaiveDateTime, AppError> {
    Ok(NaiveDateTime::parse_from_str(s, TS_FORMAT).context("invalid stored timestamp")?)
}

// ── Meetings ──

impl MeetingRepository for SqliteRepository {
    fn save_meeting(&self, meeting: &Meeting) -> Result<(), AppError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO meetings (id, event_id, summary, start_at, end_at, timezone, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                meeting.id,
                meeting.event_id,
                meeting.summary,
                meeting.start.to_rfc3339(),
                meeting.end.to_rfc3339(),
                meeting.timezone,
                meeting.created_at.format(TS_FORMAT).to_string(),
            ],
        )?;
        Ok(())
    }

    // ── Users ──

    fn save_user(&self, user: &User) -> Result<(), AppError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO users (email, display_name, created_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(email) DO UPDATE SET display_name = excluded.display_name",
            params![
                user.email,
                user.display_name,
                user.created_at.format(TS_FORMAT).to_string(),
            ],
        )?;
        Ok(())
    }

    fn get_user(&self, email: &str) -> Result<Option<User>, AppError> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                "SELECT email, display_name, created_at FROM users WHERE email = ?1",
                params![email],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, Option<String>>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()?;

        match row {
            Some((email, display_name, created_at)) => Ok(Some(User {
                email,
                display_name,
                created_at: parse_ts(&created_at)?,
            })),
            None => Ok(None),
        }
    }
}
