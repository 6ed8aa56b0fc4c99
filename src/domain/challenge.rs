// Challenges are a global catalog; progress against them is per couple.
use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{params, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::db;
use crate::state::DbPool;
use crate::store::{self, Entity, Patch, PatchError, StoreError};
use crate::tenant::TenantKey;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Challenge {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub points: i64,
    pub icon: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

fn default_points() -> i64 {
    10
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewChallenge {
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    #[serde(default = "default_points")]
    pub points: i64,
    pub icon: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ChallengePatch {
    pub title: Patch<String>,
    pub description: Patch<String>,
    pub category: Patch<String>,
    pub points: Patch<i64>,
    pub icon: Patch<String>,
    pub active: Patch<bool>,
}

/// A catalog entry as one couple sees it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChallengeWithProgress {
    #[serde(flatten)]
    pub challenge: Challenge,
    pub started: bool,
    pub completed: bool,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChallengeProgress {
    pub id: i64,
    pub challenge_id: i64,
    pub couple_code: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Opaque to the server.
    pub progress_data: Option<String>,
}

/// Body of a completion request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Completion {
    pub data: Option<String>,
}

impl Challenge {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            title: row.get("title")?,
            description: row.get("description")?,
            category: row.get("category")?,
            points: row.get("points")?,
            icon: row.get("icon")?,
            active: row.get("active")?,
            created_at: db::read_time(row, "created_at")?,
        })
    }

    fn apply(&mut self, patch: ChallengePatch) -> Result<(), PatchError> {
        patch.title.apply_required("title", &mut self.title)?;
        patch.description.apply(&mut self.description);
        patch.category.apply(&mut self.category);
        patch.points.apply_required("points", &mut self.points)?;
        patch.icon.apply(&mut self.icon);
        patch.active.apply_required("active", &mut self.active)?;
        Ok(())
    }
}

impl Entity for ChallengeProgress {
    const TABLE: &'static str = "challenge_progress";
    const LABEL: &'static str = "Challenge progress";
    const FIXED: &'static [&'static str] = &["challenge_id", "started_at"];
    const COLUMNS: &'static [&'static str] = &["completed_at", "progress_data"];

    /// The challenge being started.
    type New = i64;
    type Patch = Completion;

    fn build(challenge_id: i64, tenant: &TenantKey, now: DateTime<Utc>) -> Self {
        Self {
            id: 0,
            challenge_id,
            couple_code: tenant.to_string(),
            started_at: now,
            completed_at: None,
            progress_data: None,
        }
    }

    /// Completion always re-stamps `completed_at`; data is kept unless replaced.
    fn apply(&mut self, patch: Completion, now: DateTime<Utc>) -> Result<(), PatchError> {
        self.completed_at = Some(now);
        if let Some(data) = patch.data {
            self.progress_data = Some(data);
        }
        Ok(())
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            challenge_id: row.get("challenge_id")?,
            couple_code: row.get("couple_code")?,
            started_at: db::read_time(row, "started_at")?,
            completed_at: db::read_opt_time(row, "completed_at")?,
            progress_data: row.get("progress_data")?,
        })
    }

    fn fixed_values(&self) -> Vec<Value> {
        vec![self.challenge_id.into(), db::time_value(&self.started_at)]
    }

    fn values(&self) -> Vec<Value> {
        vec![
            db::opt_time_value(&self.completed_at),
            db::opt_text_value(&self.progress_data),
        ]
    }

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }
}

// --- Catalog ---

pub fn count(pool: &DbPool) -> Result<i64, StoreError> {
    let conn = pool.get()?;
    let n = conn.query_row("SELECT COUNT(*) FROM challenges", [], |row| row.get(0))?;
    Ok(n)
}

pub fn get(pool: &DbPool, id: i64) -> Result<Challenge, StoreError> {
    let conn = pool.get()?;
    find(&conn, id)?.ok_or(StoreError::NotFound("Challenge"))
}

fn find(conn: &rusqlite::Connection, id: i64) -> Result<Option<Challenge>, StoreError> {
    let challenge = conn
        .query_row(
            "SELECT * FROM challenges WHERE id = ?1",
            params![id],
            Challenge::from_row,
        )
        .optional()?;
    Ok(challenge)
}

pub fn insert(conn: &rusqlite::Connection, new: &NewChallenge) -> Result<Challenge, StoreError> {
    let created_at = db::now();
    conn.execute(
        "INSERT INTO challenges (title, description, category, points, icon, active, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            new.title,
            new.description,
            new.category,
            new.points,
            new.icon,
            new.active,
            db::timestamp(&created_at)
        ],
    )?;

    Ok(Challenge {
        id: conn.last_insert_rowid(),
        title: new.title.clone(),
        description: new.description.clone(),
        category: new.category.clone(),
        points: new.points,
        icon: new.icon.clone(),
        active: new.active,
        created_at,
    })
}

pub fn create(pool: &DbPool, new: &NewChallenge) -> Result<Challenge, StoreError> {
    let conn = pool.get()?;
    insert(&conn, new)
}

pub fn update(pool: &DbPool, id: i64, patch: ChallengePatch) -> Result<Challenge, StoreError> {
    let mut conn = pool.get()?;
    let tx = conn.transaction()?;

    let mut challenge = find(&tx, id)?.ok_or(StoreError::NotFound("Challenge"))?;
    challenge.apply(patch)?;
    tx.execute(
        "UPDATE challenges
         SET title = ?1, description = ?2, category = ?3, points = ?4, icon = ?5, active = ?6
         WHERE id = ?7",
        params![
            challenge.title,
            challenge.description,
            challenge.category,
            challenge.points,
            challenge.icon,
            challenge.active,
            id
        ],
    )?;

    tx.commit()?;
    Ok(challenge)
}

/// Every active challenge, annotated with `tenant`'s progress on it.
pub fn list_for_tenant(
    pool: &DbPool,
    tenant: &TenantKey,
) -> Result<Vec<ChallengeWithProgress>, StoreError> {
    let conn = pool.get()?;
    let mut stmt = conn.prepare(
        "SELECT c.*, p.id AS progress_id,
                p.started_at AS progress_started_at,
                p.completed_at AS progress_completed_at
         FROM challenges c
         LEFT JOIN challenge_progress p
           ON p.challenge_id = c.id AND p.couple_code = ?1
         WHERE c.active = 1
         ORDER BY c.id",
    )?;

    let rows = stmt
        .query_map(params![tenant.as_str()], |row| {
            let progress_id: Option<i64> = row.get("progress_id")?;
            let started_at = db::read_opt_time(row, "progress_started_at")?;
            let completed_at = db::read_opt_time(row, "progress_completed_at")?;
            Ok(ChallengeWithProgress {
                challenge: Challenge::from_row(row)?,
                started: progress_id.is_some(),
                completed: completed_at.is_some(),
                started_at,
                completed_at,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

// --- Progress ---

fn find_progress(
    conn: &rusqlite::Connection,
    tenant: &TenantKey,
    challenge_id: i64,
) -> Result<Option<ChallengeProgress>, StoreError> {
    let progress = conn
        .query_row(
            "SELECT * FROM challenge_progress WHERE challenge_id = ?1 AND couple_code = ?2",
            params![challenge_id, tenant.as_str()],
            ChallengeProgress::from_row,
        )
        .optional()?;
    Ok(progress)
}

/// Start a challenge. Starting it again returns the existing progress row.
pub fn start(
    pool: &DbPool,
    tenant: &TenantKey,
    challenge_id: i64,
) -> Result<ChallengeProgress, StoreError> {
    let mut conn = pool.get()?;
    let tx = conn.transaction()?;

    find(&tx, challenge_id)?.ok_or(StoreError::NotFound("Challenge"))?;

    let progress = match find_progress(&tx, tenant, challenge_id)? {
        Some(existing) => existing,
        None => {
            let mut progress = ChallengeProgress::build(challenge_id, tenant, db::now());
            let id = store::insert(&tx, tenant, &progress)?;
            progress.set_id(id);
            progress
        }
    };

    tx.commit()?;
    Ok(progress)
}

/// Mark a challenge completed, starting it first if needed.
pub fn complete(
    pool: &DbPool,
    tenant: &TenantKey,
    challenge_id: i64,
    completion: Completion,
) -> Result<ChallengeProgress, StoreError> {
    let mut conn = pool.get()?;
    let tx = conn.transaction()?;

    find(&tx, challenge_id)?.ok_or(StoreError::NotFound("Challenge"))?;

    let now = db::now();
    let mut progress = match find_progress(&tx, tenant, challenge_id)? {
        Some(existing) => existing,
        None => {
            let mut progress = ChallengeProgress::build(challenge_id, tenant, now);
            let id = store::insert(&tx, tenant, &progress)?;
            progress.set_id(id);
            progress
        }
    };
    progress.apply(completion, now)?;
    store::save(&tx, tenant, &progress)?;

    tx.commit()?;
    Ok(progress)
}
