use std::path::Path;
use std::sync::Mutex;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::models::user::User;

/// SQLite-backed store of local user records.
pub struct UserStore {
    conn: Mutex<Connection>,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("IO error: {0}")]
    IoError(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::DatabaseError(e.to_string())
    }
}

/// Field values to write onto a user record.
///
/// `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserUpdate {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl UserUpdate {
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.first_name.is_none() && self.last_name.is_none()
    }
}

const USER_COLUMNS: &str =
    "id, username, email, first_name, last_name, password_hash, is_active, date_joined, last_login";

fn parse_timestamp(value: &str) -> DateTime<Utc> {
    match DateTime::parse_from_rfc3339(value) {
        Ok(dt) => dt.with_timezone(&Utc),
        Err(e) => {
            tracing::warn!("Unparsable stored timestamp {:?}: {}", value, e);
            Utc::now()
        }
    }
}

fn row_to_user(row: &Row<'_>) -> rusqlite::Result<User> {
    let date_joined: String = row.get(7)?;
    let last_login: Option<String> = row.get(8)?;

    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        first_name: row.get(3)?,
        last_name: row.get(4)?,
        password_hash: row.get(5)?,
        is_active: row.get::<_, i32>(6)? != 0,
        date_joined: parse_timestamp(&date_joined),
        last_login: last_login.as_deref().map(parse_timestamp),
    })
}

fn select_by_username(conn: &Connection, username: &str) -> rusqlite::Result<Option<User>> {
    conn.query_row(
        &format!("SELECT {} FROM users WHERE username = ?1", USER_COLUMNS),
        params![username],
        row_to_user,
    )
    .optional()
}

impl UserStore {
    pub fn new(database_url: &str) -> Result<Self, StoreError> {
        // Parse sqlite: prefix if present
        let path = database_url.strip_prefix("sqlite:").unwrap_or(database_url);

        let conn = if path == ":memory:" {
            Connection::open_in_memory()?
        } else {
            if let Some(parent) = Path::new(path).parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| StoreError::IoError(e.to_string()))?;
            }
            Connection::open(path)?
        };

        conn.execute(
            "CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE,
                email TEXT,
                first_name TEXT,
                last_name TEXT,
                password_hash TEXT,
                is_active INTEGER NOT NULL DEFAULT 1,
                date_joined TEXT NOT NULL,
                last_login TEXT
            )",
            [],
        )?;

        tracing::info!("User store initialized with database: {}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock()
            .map_err(|e| StoreError::DatabaseError(e.to_string()))
    }

    pub fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let conn = self.lock()?;
        Ok(select_by_username(&conn, username)?)
    }

    pub fn get(&self, id: i64) -> Result<Option<User>, StoreError> {
        let conn = self.lock()?;
        let user = conn
            .query_row(
                &format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS),
                params![id],
                row_to_user,
            )
            .optional()?;
        Ok(user)
    }

    /// Number of stored users.
    pub fn count(&self) -> Result<i64, StoreError> {
        let conn = self.lock()?;
        Ok(conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?)
    }

    /// Insert a new user with only a username and optional email.
    pub fn create_user(&self, username: &str, email: Option<&str>) -> Result<User, StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO users (username, email, date_joined) VALUES (?1, ?2, ?3)",
            params![username, email, Utc::now().to_rfc3339()],
        )?;

        select_by_username(&conn, username)?
            .ok_or_else(|| StoreError::DatabaseError(format!("user {} vanished after insert", username)))
    }

    /// Bring the record for `username` in line with the identity provider.
    ///
    /// Creates the record first when it is missing and `create` is set; with
    /// `create` unset a missing record yields `Ok(None)` and nothing is
    /// written. Fields present in `update` overwrite the stored ones. Runs in
    /// one transaction.
    pub fn sync_remote_user(
        &self,
        username: &str,
        update: &UserUpdate,
        create: bool,
    ) -> Result<Option<User>, StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        if create {
            let inserted = tx.execute(
                "INSERT INTO users (username, date_joined) VALUES (?1, ?2)
                 ON CONFLICT(username) DO NOTHING",
                params![username, Utc::now().to_rfc3339()],
            )?;
            if inserted > 0 {
                tracing::info!("Created new user: {}", username);
            }
        }

        let updated = tx.execute(
            "UPDATE users SET
                email = COALESCE(?1, email),
                first_name = COALESCE(?2, first_name),
                last_name = COALESCE(?3, last_name)
             WHERE username = ?4",
            params![update.email, update.first_name, update.last_name, username],
        )?;

        if updated == 0 {
            tracing::debug!("No local user for {} and creation disabled", username);
            return Ok(None);
        }

        let user = select_by_username(&tx, username)?;
        tx.commit()?;

        Ok(user)
    }

    /// Store a password hash for the local backend.
    pub fn set_password(&self, username: &str, password_hash: &str) -> Result<bool, StoreError> {
        let conn = self.lock()?;
        let updated = conn.execute(
            "UPDATE users SET password_hash = ?1 WHERE username = ?2",
            params![password_hash, username],
        )?;
        Ok(updated > 0)
    }

    pub fn set_active(&self, username: &str, is_active: bool) -> Result<bool, StoreError> {
        let conn = self.lock()?;
        let updated = conn.execute(
            "UPDATE users SET is_active = ?1 WHERE username = ?2",
            params![is_active as i32, username],
        )?;
        Ok(updated > 0)
    }

    /// Record a login for user `id`.
    pub fn touch_last_login(&self, id: i64) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "UPDATE users SET last_login = ?1 WHERE id = ?2",
            params![Utc::now().to_rfc3339(), id],
        )?;
        Ok(())
    }
}
