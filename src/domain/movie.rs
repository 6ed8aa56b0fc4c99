use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use crate::db;
use crate::store::patch::check_rating;
use crate::store::{Entity, Patch, PatchError};
use crate::tenant::TenantKey;

text_enum! {
    pub enum MovieStatus {
        ToWatch => "to_watch",
        Watched => "watched",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Movie {
    pub id: i64,
    pub couple_code: String,
    pub title: String,
    pub genre: String,
    pub director: Option<String>,
    pub status: MovieStatus,
    pub rating: Option<i64>,
    pub review: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewMovie {
    pub title: String,
    pub genre: String,
    pub director: Option<String>,
    pub status: MovieStatus,
    pub rating: Option<i64>,
    pub review: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MoviePatch {
    pub title: Patch<String>,
    pub genre: Patch<String>,
    pub director: Patch<String>,
    pub status: Patch<MovieStatus>,
    pub rating: Patch<i64>,
    pub review: Patch<String>,
}

impl Entity for Movie {
    const TABLE: &'static str = "movies";
    const LABEL: &'static str = "Movie";
    const COLUMNS: &'static [&'static str] =
        &["title", "genre", "director", "status", "rating", "review"];

    type New = NewMovie;
    type Patch = MoviePatch;

    fn build(new: NewMovie, tenant: &TenantKey, now: DateTime<Utc>) -> Self {
        Self {
            id: 0,
            couple_code: tenant.to_string(),
            title: new.title,
            genre: new.genre,
            director: new.director,
            status: new.status,
            rating: new.rating,
            review: new.review,
            created_at: now,
        }
    }

    fn apply(&mut self, patch: MoviePatch, _now: DateTime<Utc>) -> Result<(), PatchError> {
        patch.title.apply_required("title", &mut self.title)?;
        patch.genre.apply_required("genre", &mut self.genre)?;
        patch.director.apply(&mut self.director);
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
            genre: row.get("genre")?,
            director: row.get("director")?,
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
            db::text_value(&self.genre),
            db::opt_text_value(&self.director),
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
