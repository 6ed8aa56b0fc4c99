use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use crate::db;
use crate::store::{Entity, Patch, PatchError};
use crate::tenant::TenantKey;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlogEntry {
    pub id: i64,
    pub couple_code: String,
    pub title: String,
    pub content: String,
    pub mood: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewBlogEntry {
    pub title: String,
    pub content: String,
    pub mood: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BlogEntryPatch {
    pub title: Patch<String>,
    pub content: Patch<String>,
    pub mood: Patch<String>,
}

impl Entity for BlogEntry {
    const TABLE: &'static str = "blog_entries";
    const LABEL: &'static str = "Blog entry";
    const COLUMNS: &'static [&'static str] = &["title", "content", "mood"];

    type New = NewBlogEntry;
    type Patch = BlogEntryPatch;

    fn build(new: NewBlogEntry, tenant: &TenantKey, now: DateTime<Utc>) -> Self {
        Self {
            id: 0,
            couple_code: tenant.to_string(),
            title: new.title,
            content: new.content,
            mood: new.mood,
            created_at: now,
        }
    }

    fn apply(&mut self, patch: BlogEntryPatch, _now: DateTime<Utc>) -> Result<(), PatchError> {
        patch.title.apply_required("title", &mut self.title)?;
        patch.content.apply_required("content", &mut self.content)?;
        patch.mood.apply(&mut self.mood);
        Ok(())
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            couple_code: row.get("couple_code")?,
            title: row.get("title")?,
            content: row.get("content")?,
            mood: row.get("mood")?,
            created_at: db::read_time(row, "created_at")?,
        })
    }

    fn fixed_values(&self) -> Vec<Value> {
        vec![db::time_value(&self.created_at)]
    }

    fn values(&self) -> Vec<Value> {
        vec![
            db::text_value(&self.title),
            db::text_value(&self.content),
            db::opt_text_value(&self.mood),
        ]
    }

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }
}
