use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use crate::db;
use crate::store::patch::check_rating;
use crate::store::{Entity, Patch, PatchError};
use crate::tenant::TenantKey;

text_enum! {
    pub enum BookStatus {
        ToRead => "to_read",
        Reading => "reading",
        Completed => "completed",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Book {
    pub id: i64,
    pub couple_code: String,
    pub title: String,
    pub author: String,
    pub status: BookStatus,
    pub rating: Option<i64>,
    pub review: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub status: BookStatus,
    #[serde(default)]
    pub rating: Option<i64>,
    #[serde(default)]
    pub review: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BookPatch {
    pub title: Patch<String>,
    pub author: Patch<String>,
    pub status: Patch<BookStatus>,
    pub rating: Patch<i64>,
    pub review: Patch<String>,
}

impl Entity for Book {
    const TABLE: &'static str = "books";
    const LABEL: &'static str = "Book";
    const COLUMNS: &'static [&'static str] = &["title", "author", "status", "rating", "review"];

    type New = NewBook;
    type Patch = BookPatch;

    fn build(new: NewBook, tenant: &TenantKey, now: DateTime<Utc>) -> Self {
        Self {
            id: 0,
            couple_code: tenant.to_string(),
            title: new.title,
            author: new.author,
            status: new.status,
            rating: new.rating,
            review: new.review,
            created_at: now,
        }
    }

    fn apply(&mut self, patch: BookPatch, _now: DateTime<Utc>) -> Result<(), PatchError> {
        patch.title.apply_required("title", &mut self.title)?;
        patch.author.apply_required("author", &mut self.author)?;
        patch.status.apply_required("status", &mut self.status)?;
        patch.rating.apply(&mut self.rating);
        patch.review.apply(&mut self.review);
        Ok(())
    }

    fn validate(&self) -> Result<(), PatchError> {
        check_rating(self.rating)
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            couple_code: row.get("couple_code")?,
            title: row.get("title")?,
            author: row.get("author")?,
            status: db::read_enum(row, "status")?,
            rating: row.get("rating")?,
            review: row.get("review")?,
            created_at: db::read_time(row, "created_at")?,
        })
    }

    fn fixed_values(&self) -> Vec<Value> {
        vec![db::time_value(&self.created_at)]
    }

    fn values(&self) -> Vec<Value> {
        vec![
            db::text_value(&self.title),
            db::text_value(&self.author),
            self.status.into(),
            self.rating.into(),
            db::opt_text_value(&self.review),
        ]
    }

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book() -> Book {
        Book::build(
            NewBook {
                title: "Earthsea".into(),
                author: "Le Guin".into(),
                status: BookStatus::Reading,
                rating: None,
                review: Some("lovely".into()),
            },
            &TenantKey::new("A").unwrap(),
            db::now(),
        )
    }

    #[test]
    fn patch_from_json_changes_only_named_fields() {
        let mut b = book();
        let patch: BookPatch =
            serde_json::from_str(r#"{"status": "completed", "rating": 4}"#).unwrap();
        b.apply(patch, db::now()).unwrap();
        assert_eq!(b.status, BookStatus::Completed);
        assert_eq!(b.rating, Some(4));
        assert_eq!(b.review.as_deref(), Some("lovely"));
        assert_eq!(b.title, "Earthsea");
    }

    #[test]
    fn explicit_null_clears_review() {
        let mut b = book();
        let patch: BookPatch = serde_json::from_str(r#"{"review": null}"#).unwrap();
        b.apply(patch, db::now()).unwrap();
        assert_eq!(b.review, None);
    }

    #[test]
    fn null_status_is_rejected() {
        let mut b = book();
        let patch: BookPatch = serde_json::from_str(r#"{"status": null}"#).unwrap();
        assert_eq!(
            b.apply(patch, db::now()),
            Err(PatchError::NullField("status"))
        );
    }

    #[test]
    fn unknown_status_fails_to_parse() {
        let parsed = serde_json::from_str::<NewBook>(
            r#"{"title": "x", "author": "y", "status": "abandoned"}"#,
        );
        assert!(parsed.is_err());
    }
}
