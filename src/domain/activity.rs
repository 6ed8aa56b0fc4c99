use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use crate::db;
use crate::store::patch::check_rating;
use crate::store::{Entity, Filter, Patch, PatchError};
use crate::tenant::TenantKey;

text_enum! {
    pub enum ActivityStatus {
        Planned => "planned",
        Completed => "completed",
    }
}

text_enum! {
    pub enum Category {
        Outdoor => "outdoor",
        Indoor => "indoor",
        Dining => "dining",
        Entertainment => "entertainment",
        Travel => "travel",
    }
}

text_enum! {
    pub enum Difficulty {
        Easy => "easy",
        Medium => "medium",
        Hard => "hard",
    }
}

text_enum! {
    pub enum Cost {
        Free => "free",
        Low => "low",
        Medium => "medium",
        High => "high",
    }
}

text_enum! {
    pub enum Season {
        Spring => "spring",
        Summer => "summer",
        Fall => "fall",
        Winter => "winter",
        Any => "any",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Activity {
    pub id: i64,
    pub couple_code: String,
    pub title: String,
    pub description: String,
    pub status: ActivityStatus,
    pub category: Category,
    pub difficulty: Difficulty,
    /// Minutes.
    pub duration: i64,
    pub cost: Cost,
    pub season: Option<Season>,
    pub mood: Option<String>,
    pub rating: Option<i64>,
    pub notes: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

fn default_status() -> ActivityStatus {
    ActivityStatus::Planned
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewActivity {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_status")]
    pub status: ActivityStatus,
    pub category: Category,
    pub difficulty: Difficulty,
    pub duration: i64,
    pub cost: Cost,
    pub season: Option<Season>,
    pub mood: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ActivityPatch {
    pub title: Patch<String>,
    pub description: Patch<String>,
    pub status: Patch<ActivityStatus>,
    pub category: Patch<Category>,
    pub difficulty: Patch<Difficulty>,
    pub duration: Patch<i64>,
    pub cost: Patch<Cost>,
    pub season: Patch<Season>,
    pub mood: Patch<String>,
    pub rating: Patch<i64>,
    pub notes: Patch<String>,
    pub completed_at: Patch<DateTime<Utc>>,
}

/// Optional equality filters for listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActivityFilter {
    pub category: Option<Category>,
    pub difficulty: Option<Difficulty>,
    pub cost: Option<Cost>,
    pub season: Option<Season>,
}

impl ActivityFilter {
    pub fn to_filters(&self) -> Vec<Filter> {
        let mut filters = Vec::new();
        if let Some(category) = self.category {
            filters.push(Filter::eq("category", category));
        }
        if let Some(difficulty) = self.difficulty {
            filters.push(Filter::eq("difficulty", difficulty));
        }
        if let Some(cost) = self.cost {
            filters.push(Filter::eq("cost", cost));
        }
        if let Some(season) = self.season {
            filters.push(Filter::eq("season", season));
        }
        filters
    }
}

impl Entity for Activity {
    const TABLE: &'static str = "activities";
    const LABEL: &'static str = "Activity";
    const COLUMNS: &'static [&'static str] = &[
        "title",
        "description",
        "status",
        "category",
        "difficulty",
        "duration",
        "cost",
        "season",
        "mood",
        "rating",
        "notes",
        "completed_at",
    ];

    type New = NewActivity;
    type Patch = ActivityPatch;

    fn build(new: NewActivity, tenant: &TenantKey, now: DateTime<Utc>) -> Self {
        Self {
            id: 0,
            couple_code: tenant.to_string(),
            title: new.title,
            description: new.description,
            status: new.status,
            category: new.category,
            difficulty: new.difficulty,
            duration: new.duration,
            cost: new.cost,
            season: new.season,
            mood: new.mood,
            rating: None,
            notes: None,
            completed_at: None,
            created_at: now,
        }
    }

    fn apply(&mut self, patch: ActivityPatch, _now: DateTime<Utc>) -> Result<(), PatchError> {
        patch.title.apply_required("title", &mut self.title)?;
        patch
            .description
            .apply_required("description", &mut self.description)?;
        patch.status.apply_required("status", &mut self.status)?;
        patch.category.apply_required("category", &mut self.category)?;
        patch
            .difficulty
            .apply_required("difficulty", &mut self.difficulty)?;
        patch.duration.apply_required("duration", &mut self.duration)?;
        patch.cost.apply_required("cost", &mut self.cost)?;
        patch.season.apply(&mut self.season);
        patch.mood.apply(&mut self.mood);
        patch.rating.apply(&mut self.rating);
        patch.notes.apply(&mut self.notes);
        patch.completed_at.apply(&mut self.completed_at);
        Ok(())
    }

    fn validate(&self) -> Result<(), PatchError> {
        if self.duration < 0 {
            return Err(PatchError::Invalid("duration cannot be negative".into()));
        }
        check_rating(self.rating)
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            couple_code: row.get("couple_code")?,
            title: row.get("title")?,
            description: row.get("description")?,
            status: db::read_enum(row, "status")?,
            category: db::read_enum(row, "category")?,
            difficulty: db::read_enum(row, "difficulty")?,
            duration: row.get("duration")?,
            cost: db::read_enum(row, "cost")?,
            season: db::read_opt_enum(row, "season")?,
            mood: row.get("mood")?,
            rating: row.get("rating")?,
            notes: row.get("notes")?,
            completed_at: db::read_opt_time(row, "completed_at")?,
            created_at: db::read_time(row, "created_at")?,
        })
    }

    fn fixed_values(&self) -> Vec<Value> {
        vec![db::time_value(&self.created_at)]
    }

    fn values(&self) -> Vec<Value> {
        vec![
            db::text_value(&self.title),
            db::text_value(&self.description),
            self.status.into(),
            self.category.into(),
            self.difficulty.into(),
            self.duration.into(),
            self.cost.into(),
            self.season.into(),
            db::opt_text_value(&self.mood),
            self.rating.into(),
            db::opt_text_value(&self.notes),
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use crate::store::Store;

    fn picnic() -> NewActivity {
        serde_json::from_value(serde_json::json!({
            "title": "Picnic",
            "description": "Sandwiches by the lake",
            "category": "outdoor",
            "difficulty": "easy",
            "cost": "free",
            "duration": 60
        }))
        .unwrap()
    }

    #[test]
    fn new_activity_defaults_to_planned() {
        let new = picnic();
        assert_eq!(new.status, ActivityStatus::Planned);
        assert_eq!(new.season, None);
    }

    #[test]
    fn picnic_is_visible_only_to_its_couple() {
        let store = Store::new(test_pool());
        let abc = TenantKey::new("ABC123").unwrap();
        let created: Activity = store.create(&abc, picnic()).unwrap();

        let listed: Vec<Activity> = store.list(&abc, &[]).unwrap();
        assert_eq!(listed, vec![created]);

        let other: Vec<Activity> = store.list(&TenantKey::new("XYZ789").unwrap(), &[]).unwrap();
        assert!(other.is_empty());
    }

    #[test]
    fn filters_by_category_and_season() {
        let store = Store::new(test_pool());
        let code = TenantKey::new("ABC123").unwrap();
        let _: Activity = store.create(&code, picnic()).unwrap();

        let mut museum = picnic();
        museum.title = "Museum".into();
        museum.category = Category::Indoor;
        museum.season = Some(Season::Winter);
        let _: Activity = store.create(&code, museum).unwrap();

        let indoor = ActivityFilter {
            category: Some(Category::Indoor),
            ..Default::default()
        };
        let found: Vec<Activity> = store.list(&code, &indoor.to_filters()).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "Museum");

        let summer = ActivityFilter {
            season: Some(Season::Summer),
            ..Default::default()
        };
        let found: Vec<Activity> = store.list(&code, &summer.to_filters()).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn completing_records_rating_and_notes() {
        let store = Store::new(test_pool());
        let code = TenantKey::new("ABC123").unwrap();
        let created: Activity = store.create(&code, picnic()).unwrap();

        let patch: ActivityPatch = serde_json::from_value(serde_json::json!({
            "status": "completed",
            "rating": 5,
            "notes": "Ducks stole a sandwich",
            "completed_at": "2025-06-01T18:00:00Z"
        }))
        .unwrap();
        let updated: Activity = store.update(&code, created.id, patch).unwrap();

        assert_eq!(updated.status, ActivityStatus::Completed);
        assert_eq!(updated.rating, Some(5));
        assert_eq!(updated.title, "Picnic");
        assert_eq!(updated.duration, 60);
        assert!(updated.completed_at.is_some());
    }

    #[test]
    fn rating_out_of_range_is_rejected() {
        let mut activity = Activity::build(
            picnic(),
            &TenantKey::new("A").unwrap(),
            db::now(),
        );
        let patch = ActivityPatch {
            rating: Patch::Value(7),
            ..Default::default()
        };
        activity.apply(patch, db::now()).unwrap();
        assert!(activity.validate().is_err());
    }
}
