use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use crate::db;
use crate::store::{Entity, Filter, PatchError};
use crate::tenant::TenantKey;

/// An uploaded image. The bytes live under the uploads directory; the row keeps
/// the relative path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Photo {
    pub id: i64,
    pub couple_code: String,
    pub file_path: String,
    pub activity_id: Option<i64>,
    pub blog_entry_id: Option<i64>,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPhoto {
    pub file_path: String,
    pub activity_id: Option<i64>,
    pub blog_entry_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PhotoFilter {
    pub activity_id: Option<i64>,
    pub blog_entry_id: Option<i64>,
}

impl PhotoFilter {
    pub fn to_filters(&self) -> Vec<Filter> {
        let mut filters = Vec::new();
        if let Some(id) = self.activity_id {
            filters.push(Filter::eq("activity_id", id));
        }
        if let Some(id) = self.blog_entry_id {
            filters.push(Filter::eq("blog_entry_id", id));
        }
        filters
    }
}

impl Entity for Photo {
    const TABLE: &'static str = "photos";
    const LABEL: &'static str = "Photo";
    const FIXED: &'static [&'static str] = &["uploaded_at"];
    const COLUMNS: &'static [&'static str] = &["file_path", "activity_id", "blog_entry_id"];

    type New = NewPhoto;
    // Photos are replaced by uploading again, never edited in place.
    type Patch = ();

    fn build(new: NewPhoto, tenant: &TenantKey, now: DateTime<Utc>) -> Self {
        Self {
            id: 0,
            couple_code: tenant.to_string(),
            file_path: new.file_path,
            activity_id: new.activity_id,
            blog_entry_id: new.blog_entry_id,
            uploaded_at: now,
        }
    }

    fn apply(&mut self, _patch: (), _now: DateTime<Utc>) -> Result<(), PatchError> {
        Ok(())
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            couple_code: row.get("couple_code")?,
            file_path: row.get("file_path")?,
            activity_id: row.get("activity_id")?,
            blog_entry_id: row.get("blog_entry_id")?,
            uploaded_at: db::read_time(row, "uploaded_at")?,
        })
    }

    fn fixed_values(&self) -> Vec<Value> {
        vec![db::time_value(&self.uploaded_at)]
    }

    fn values(&self) -> Vec<Value> {
        vec![
            db::text_value(&self.file_path),
            self.activity_id.into(),
            self.blog_entry_id.into(),
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
    use crate::db::test_pool;
    use crate::store::Store;

    #[test]
    fn photos_filter_by_owner_record() {
        let store = Store::new(test_pool());
        let code = TenantKey::new("ABC123").unwrap();
        for (name, activity) in [("a.jpg", Some(1)), ("b.jpg", Some(2)), ("c.jpg", None)] {
            let _: Photo = store
                .create(
                    &code,
                    NewPhoto {
                        file_path: format!("uploads/{}", name),
                        activity_id: activity,
                        blog_entry_id: None,
                    },
                )
                .unwrap();
        }

        let all: Vec<Photo> = store.list(&code, &[]).unwrap();
        assert_eq!(all.len(), 3);

        let filter = PhotoFilter {
            activity_id: Some(2),
            blog_entry_id: None,
        };
        let some: Vec<Photo> = store.list(&code, &filter.to_filters()).unwrap();
        assert_eq!(some.len(), 1);
        assert_eq!(some[0].file_path, "uploads/b.jpg");
    }
}
