use chrono::{DateTime, Utc};
use rusqlite::{params, ErrorCode, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::db;
use crate::state::DbPool;
use crate::store::{Patch, StoreError};

/// An account. Users are not tenant-scoped; `couple_code` links one to a couple.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub display_name: Option<String>,
    pub profile_pic: Option<String>,
    pub couple_code: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub display_name: Option<String>,
    pub couple_code: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProfilePatch {
    pub display_name: Patch<String>,
    pub profile_pic: Patch<String>,
    pub couple_code: Patch<String>,
}

impl User {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            email: row.get("email")?,
            password_hash: row.get("password_hash")?,
            display_name: row.get("display_name")?,
            profile_pic: row.get("profile_pic")?,
            couple_code: row.get("couple_code")?,
            created_at: db::read_time(row, "created_at")?,
        })
    }

    fn apply(&mut self, patch: ProfilePatch) {
        patch.display_name.apply(&mut self.display_name);
        patch.profile_pic.apply(&mut self.profile_pic);
        patch.couple_code.apply(&mut self.couple_code);
    }
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
    )
}

/// Store a new account. The password must already be hashed.
pub fn create(
    pool: &DbPool,
    registration: &Registration,
    password_hash: String,
) -> Result<User, StoreError> {
    let conn = pool.get()?;
    let created_at = db::now();

    conn.execute(
        "INSERT INTO users (email, password_hash, display_name, couple_code, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            registration.email,
            password_hash,
            registration.display_name,
            registration.couple_code,
            db::timestamp(&created_at)
        ],
    )
    .map_err(|e| {
        if is_unique_violation(&e) {
            StoreError::Conflict("Email already registered")
        } else {
            StoreError::Sql(e)
        }
    })?;

    Ok(User {
        id: conn.last_insert_rowid(),
        email: registration.email.clone(),
        password_hash,
        display_name: registration.display_name.clone(),
        profile_pic: None,
        couple_code: registration.couple_code.clone(),
        created_at,
    })
}

pub fn find_by_email(pool: &DbPool, email: &str) -> Result<Option<User>, StoreError> {
    let conn = pool.get()?;
    let user = conn
        .query_row(
            "SELECT * FROM users WHERE email = ?1",
            params![email],
            User::from_row,
        )
        .optional()?;
    Ok(user)
}

fn find(conn: &rusqlite::Connection, id: i64) -> Result<Option<User>, StoreError> {
    let user = conn
        .query_row("SELECT * FROM users WHERE id = ?1", params![id], User::from_row)
        .optional()?;
    Ok(user)
}

pub fn get(pool: &DbPool, id: i64) -> Result<User, StoreError> {
    let conn = pool.get()?;
    find(&conn, id)?.ok_or(StoreError::NotFound("User"))
}

pub fn update_profile(pool: &DbPool, id: i64, patch: ProfilePatch) -> Result<User, StoreError> {
    let mut conn = pool.get()?;
    let tx = conn.transaction()?;

    let mut user = find(&tx, id)?.ok_or(StoreError::NotFound("User"))?;
    user.apply(patch);
    tx.execute(
        "UPDATE users SET display_name = ?1, profile_pic = ?2, couple_code = ?3 WHERE id = ?4",
        params![user.display_name, user.profile_pic, user.couple_code, id],
    )?;

    tx.commit()?;
    Ok(user)
}

pub fn set_profile_pic(pool: &DbPool, id: i64, path: &str) -> Result<User, StoreError> {
    update_profile(
        pool,
        id,
        ProfilePatch {
            profile_pic: Patch::Value(path.to_string()),
            ..Default::default()
        },
    )
}
