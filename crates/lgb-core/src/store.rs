use std::{
    path::Path,
    sync::{Mutex, MutexGuard},
};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use crate::{domain::UserId, Result};

/// Durable evidence that a member was removed for a policy violation.
///
/// At most one row per user id; a row's existence is definitionally "banned".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BanRecord {
    pub user_id: i64,
    pub reason: String,
    pub banned_at: DateTime<Utc>,
}

/// SQLite-backed ban list plus the opportunistic handle directory.
///
/// The connection sits behind a mutex; every operation is a single statement
/// and the guard is never held across an await point.
pub struct BanStore {
    conn: Mutex<Connection>,
}

impl BanStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS banned_users (
                user_id   INTEGER PRIMARY KEY,
                reason    TEXT NOT NULL,
                banned_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS member_handles (
                handle  TEXT PRIMARY KEY,
                user_id INTEGER NOT NULL
            );",
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("ban store lock poisoned")
    }

    /// Upsert: banning an already-banned member overwrites reason and
    /// timestamp, it never stacks records.
    pub fn ban(&self, user: UserId, reason: &str) -> Result<()> {
        self.conn().execute(
            "INSERT OR REPLACE INTO banned_users (user_id, reason, banned_at) VALUES (?1, ?2, ?3)",
            params![user.0, reason, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    /// Idempotent: unbanning a member with no record is a no-op.
    pub fn unban(&self, user: UserId) -> Result<()> {
        self.conn()
            .execute("DELETE FROM banned_users WHERE user_id = ?1", [user.0])?;
        Ok(())
    }

    pub fn is_banned(&self, user: UserId) -> Result<bool> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT 1 FROM banned_users WHERE user_id = ?1")?;
        Ok(stmt.exists([user.0])?)
    }

    pub fn get(&self, user: UserId) -> Result<Option<BanRecord>> {
        let conn = self.conn();
        let record = conn
            .query_row(
                "SELECT user_id, reason, banned_at FROM banned_users WHERE user_id = ?1",
                [user.0],
                |row| {
                    let banned_at: String = row.get(2)?;
                    Ok(BanRecord {
                        user_id: row.get(0)?,
                        reason: row.get(1)?,
                        // Written by `ban()`, RFC3339 by construction.
                        banned_at: DateTime::parse_from_rfc3339(&banned_at)
                            .map(|t| t.with_timezone(&Utc))
                            .unwrap_or_else(|_| Utc::now()),
                    })
                },
            )
            .optional()?;
        Ok(record)
    }

    /// Record a handle -> user id mapping, refreshed whenever that user
    /// interacts with the bot. Handles are stored lowercase without `@`.
    pub fn remember_handle(&self, handle: &str, user: UserId) -> Result<()> {
        let handle = canonical_handle(handle);
        if handle.is_empty() {
            return Ok(());
        }
        self.conn().execute(
            "INSERT OR REPLACE INTO member_handles (handle, user_id) VALUES (?1, ?2)",
            params![handle, user.0],
        )?;
        Ok(())
    }

    pub fn lookup_handle(&self, handle: &str) -> Result<Option<UserId>> {
        let handle = canonical_handle(handle);
        let conn = self.conn();
        let id: Option<i64> = conn
            .query_row(
                "SELECT user_id FROM member_handles WHERE handle = ?1",
                [handle],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id.map(UserId))
    }
}

fn canonical_handle(handle: &str) -> String {
    handle.trim().trim_start_matches('@').to_lowercase()
}
