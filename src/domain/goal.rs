use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use crate::db;
use crate::domain::timestamp;
use crate::store::{Deletable, Entity, Patch, PatchError};
use crate::tenant::TenantKey;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Goal {
    pub id: i64,
    pub couple_code: String,
    pub title: String,
    pub description: Option<String>,
    pub target_date: Option<DateTime<Utc>>,
    pub completed: bool,
    pub priority: Option<String>,
    pub category: Option<String>,
    pub created_by: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewGoal {
    pub title: String,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "timestamp::deserialize_opt")]
    pub target_date: Option<DateTime<Utc>>,
    pub priority: Option<String>,
    pub category: Option<String>,
    #[serde(skip)]
    pub created_by: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GoalPatch {
    pub title: Patch<String>,
    pub description: Patch<String>,
    #[serde(deserialize_with = "timestamp::deserialize_patch")]
    pub target_date: Patch<DateTime<Utc>>,
    pub completed: Patch<bool>,
    pub priority: Patch<String>,
    pub category: Patch<String>,
}

impl Entity for Goal {
    const TABLE: &'static str = "goals";
    const LABEL: &'static str = "Goal";
    const FIXED: &'static [&'static str] = &["created_at", "created_by"];
    const COLUMNS: &'static [&'static str] = &[
        "title",
        "description",
        "target_date",
        "completed",
        "priority",
        "category",
        "completed_at",
    ];

    type New = NewGoal;
    type Patch = GoalPatch;

    fn build(new: NewGoal, tenant: &TenantKey, now: DateTime<Utc>) -> Self {
        Self {
            id: 0,
            couple_code: tenant.to_string(),
            title: new.title,
            description: new.description,
            target_date: new.target_date,
            completed: false,
            priority: new.priority,
            category: new.category,
            created_by: new.created_by,
            completed_at: None,
            created_at: now,
        }
    }

    /// The first transition to completed stamps `completed_at`; later updates,
    /// including un-completing, leave the stamp alone.
    fn apply(&mut self, patch: GoalPatch, now: DateTime<Utc>) -> Result<(), PatchError> {
        let completing = patch.completed.value() == Some(&true);

        patch.title.apply_required("title", &mut self.title)?;
        patch.description.apply(&mut self.description);
        patch.target_date.apply(&mut self.target_date);
        patch
            .completed
            .apply_required("completed", &mut self.completed)?;
        patch.priority.apply(&mut self.priority);
        patch.category.apply(&mut self.category);

        if completing && self.completed_at.is_none() {
            self.completed_at = Some(now);
        }
        Ok(())
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            couple_code: row.get("couple_code")?,
            title: row.get("title")?,
            description: row.get("description")?,
            target_date: db::read_opt_time(row, "target_date")?,
            completed: row.get("completed")?,
            priority: row.get("priority")?,
            category: row.get("category")?,
            created_by: row.get("created_by")?,
            completed_at: db::read_opt_time(row, "completed_at")?,
            created_at: db::read_time(row, "created_at")?,
        })
    }

    fn fixed_values(&self) -> Vec<Value> {
        vec![
            db::time_value(&self.created_at),
            db::opt_text_value(&self.created_by),
        ]
    }

    fn values(&self) -> Vec<Value> {
        vec![
            db::text_value(&self.title),
            db::opt_text_value(&self.description),
            db::opt_time_value(&self.target_date),
            self.completed.into(),
            db::opt_text_value(&self.priority),
            db::opt_text_value(&self.category),
            db::opt_time_value(&self.completed_at),
        ]
    }

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }
}

impl Deletable for Goal {}
