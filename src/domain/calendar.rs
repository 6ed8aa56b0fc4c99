use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use crate::db;
use crate::domain::timestamp;
use crate::store::{Deletable, Entity, Filter, Patch, PatchError};
use crate::tenant::TenantKey;

text_enum! {
    pub enum EventType {
        Birthday => "birthday",
        Anniversary => "anniversary",
        Date => "date",
        Reminder => "reminder",
        Appointment => "appointment",
        Activity => "activity",
        Other => "other",
    }
}

text_enum! {
    pub enum Recurrence {
        None => "none",
        Daily => "daily",
        Weekly => "weekly",
        Monthly => "monthly",
        Yearly => "yearly",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarEvent {
    pub id: i64,
    pub couple_code: String,
    pub title: String,
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub all_day: bool,
    pub location: Option<String>,
    pub event_type: Option<EventType>,
    pub recurrence: Option<Recurrence>,
    pub color: Option<String>,
    /// Minutes before `start_time`.
    pub reminder: Option<i64>,
    pub created_by: Option<String>,
    pub shared: bool,
    pub activity_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

fn default_shared() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewCalendarEvent {
    pub title: String,
    pub description: Option<String>,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub start_time: DateTime<Utc>,
    #[serde(default, deserialize_with = "timestamp::deserialize_opt")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub all_day: bool,
    pub location: Option<String>,
    pub event_type: Option<EventType>,
    pub recurrence: Option<Recurrence>,
    pub color: Option<String>,
    pub reminder: Option<i64>,
    #[serde(default = "default_shared")]
    pub shared: bool,
    pub activity_id: Option<i64>,
    /// Set from the request, not the body.
    #[serde(skip)]
    pub created_by: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CalendarEventPatch {
    pub title: Patch<String>,
    pub description: Patch<String>,
    #[serde(deserialize_with = "timestamp::deserialize_patch")]
    pub start_time: Patch<DateTime<Utc>>,
    #[serde(deserialize_with = "timestamp::deserialize_patch")]
    pub end_time: Patch<DateTime<Utc>>,
    pub all_day: Patch<bool>,
    pub location: Patch<String>,
    pub event_type: Patch<EventType>,
    pub recurrence: Patch<Recurrence>,
    pub color: Patch<String>,
    pub reminder: Patch<i64>,
    pub shared: Patch<bool>,
    pub activity_id: Patch<i64>,
}

/// Inclusive bounds on `start_time`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CalendarRange {
    #[serde(default, deserialize_with = "timestamp::deserialize_opt")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "timestamp::deserialize_opt")]
    pub end_date: Option<DateTime<Utc>>,
}

impl CalendarRange {
    pub fn to_filters(&self) -> Vec<Filter> {
        let mut filters = Vec::new();
        if let Some(start) = &self.start_date {
            filters.push(Filter::gte("start_time", db::timestamp(start)));
        }
        if let Some(end) = &self.end_date {
            filters.push(Filter::lte("start_time", db::timestamp(end)));
        }
        filters
    }
}

impl Entity for CalendarEvent {
    const TABLE: &'static str = "calendar_events";
    const LABEL: &'static str = "Event";
    const FIXED: &'static [&'static str] = &["created_at", "created_by"];
    const COLUMNS: &'static [&'static str] = &[
        "title",
        "description",
        "start_time",
        "end_time",
        "all_day",
        "location",
        "event_type",
        "recurrence",
        "color",
        "reminder",
        "shared",
        "activity_id",
    ];
    const ORDER_BY: &'static str = "start_time";

    type New = NewCalendarEvent;
    type Patch = CalendarEventPatch;

    fn build(new: NewCalendarEvent, tenant: &TenantKey, now: DateTime<Utc>) -> Self {
        Self {
            id: 0,
            couple_code: tenant.to_string(),
            title: new.title,
            description: new.description,
            start_time: new.start_time,
            end_time: new.end_time,
            all_day: new.all_day,
            location: new.location,
            event_type: new.event_type,
            recurrence: new.recurrence,
            color: new.color,
            reminder: new.reminder,
            created_by: new.created_by,
            shared: new.shared,
            activity_id: new.activity_id,
            created_at: now,
        }
    }

    fn apply(&mut self, patch: CalendarEventPatch, _now: DateTime<Utc>) -> Result<(), PatchError> {
        patch.title.apply_required("title", &mut self.title)?;
        patch.description.apply(&mut self.description);
        patch
            .start_time
            .apply_required("start_time", &mut self.start_time)?;
        patch.end_time.apply(&mut self.end_time);
        patch.all_day.apply_required("all_day", &mut self.all_day)?;
        patch.location.apply(&mut self.location);
        patch.event_type.apply(&mut self.event_type);
        patch.recurrence.apply(&mut self.recurrence);
        patch.color.apply(&mut self.color);
        patch.reminder.apply(&mut self.reminder);
        patch.shared.apply_required("shared", &mut self.shared)?;
        patch.activity_id.apply(&mut self.activity_id);
        Ok(())
    }

    fn validate(&self) -> Result<(), PatchError> {
        if let Some(end) = self.end_time {
            if end < self.start_time {
                return Err(PatchError::Invalid(
                    "end_time cannot be before start_time".into(),
                ));
            }
        }
        if matches!(self.reminder, Some(m) if m < 0) {
            return Err(PatchError::Invalid("reminder cannot be negative".into()));
        }
        Ok(())
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            couple_code: row.get("couple_code")?,
            title: row.get("title")?,
            description: row.get("description")?,
            start_time: db::read_time(row, "start_time")?,
            end_time: db::read_opt_time(row, "end_time")?,
            all_day: row.get("all_day")?,
            location: row.get("location")?,
            event_type: db::read_opt_enum(row, "event_type")?,
            recurrence: db::read_opt_enum(row, "recurrence")?,
            color: row.get("color")?,
            reminder: row.get("reminder")?,
            created_by: row.get("created_by")?,
            shared: row.get("shared")?,
            activity_id: row.get("activity_id")?,
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
            db::time_value(&self.start_time),
            db::opt_time_value(&self.end_time),
            self.all_day.into(),
            db::opt_text_value(&self.location),
            self.event_type.into(),
            self.recurrence.into(),
            db::opt_text_value(&self.color),
            self.reminder.into(),
            self.shared.into(),
            self.activity_id.into(),
        ]
    }

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }
}

impl Deletable for CalendarEvent {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use crate::store::{Store, StoreError};
    use chrono::TimeZone;

    fn event(title: &str, day: u32) -> NewCalendarEvent {
        NewCalendarEvent {
            title: title.into(),
            description: None,
            start_time: Utc.with_ymd_and_hms(2025, 3, day, 19, 0, 0).unwrap(),
            end_time: None,
            all_day: false,
            location: None,
            event_type: Some(EventType::Date),
            recurrence: None,
            color: None,
            reminder: Some(30),
            shared: true,
            activity_id: None,
            created_by: Some("sam".into()),
        }
    }

    #[test]
    fn body_defaults_shared_and_all_day() {
        let new: NewCalendarEvent = serde_json::from_str(
            r#"{"title": "Dinner", "start_time": "2025-03-01T19:00:00Z", "created_by": "ignored"}"#,
        )
        .unwrap();
        assert!(new.shared);
        assert!(!new.all_day);
        assert_eq!(new.created_by, None);
    }

    #[test]
    fn naive_times_are_read_as_utc() {
        let new: NewCalendarEvent = serde_json::from_str(
            r#"{"title": "Brunch", "start_time": "2025-06-01T10:00:00", "end_time": "2025-06-01T11:30:00.5"}"#,
        )
        .unwrap();
        assert_eq!(new.start_time, Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap());
        assert_eq!(
            new.end_time.map(|t| t.timestamp_subsec_millis()),
            Some(500)
        );

        let patch: CalendarEventPatch =
            serde_json::from_str(r#"{"start_time": "2025-06-02T09:00:00", "end_time": null}"#)
                .unwrap();
        assert_eq!(
            patch.start_time,
            Patch::Value(Utc.with_ymd_and_hms(2025, 6, 2, 9, 0, 0).unwrap())
        );
        assert_eq!(patch.end_time, Patch::Null);
        assert!(!patch.all_day.is_present());

        let bad = serde_json::from_str::<NewCalendarEvent>(
            r#"{"title": "Brunch", "start_time": "soon"}"#,
        );
        assert!(bad.is_err());
    }

    #[test]
    fn range_filter_is_inclusive_and_sorted() {
        let store = Store::new(test_pool());
        let code = TenantKey::new("ABC123").unwrap();
        for (title, day) in [("late", 20), ("early", 5), ("middle", 10)] {
            let _: CalendarEvent = store.create(&code, event(title, day)).unwrap();
        }

        let range = CalendarRange {
            start_date: Some(Utc.with_ymd_and_hms(2025, 3, 5, 19, 0, 0).unwrap()),
            end_date: Some(Utc.with_ymd_and_hms(2025, 3, 15, 0, 0, 0).unwrap()),
        };
        let events: Vec<CalendarEvent> = store.list(&code, &range.to_filters()).unwrap();
        let titles: Vec<&str> = events.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["early", "middle"]);

        let all: Vec<CalendarEvent> = store.list(&code, &[]).unwrap();
        assert_eq!(all.first().map(|e| e.title.as_str()), Some("early"));
    }

    #[test]
    fn created_by_survives_updates() {
        let store = Store::new(test_pool());
        let code = TenantKey::new("ABC123").unwrap();
        let created: CalendarEvent = store.create(&code, event("Dinner", 1)).unwrap();

        let patch: CalendarEventPatch =
            serde_json::from_str(r#"{"location": "Luigi's", "reminder": null}"#).unwrap();
        let updated: CalendarEvent = store.update(&code, created.id, patch).unwrap();
        assert_eq!(updated.location.as_deref(), Some("Luigi's"));
        assert_eq!(updated.reminder, None);
        assert_eq!(updated.created_by.as_deref(), Some("sam"));
        assert_eq!(updated.start_time, created.start_time);
    }

    #[test]
    fn end_before_start_is_rejected() {
        let store = Store::new(test_pool());
        let code = TenantKey::new("ABC123").unwrap();
        let mut new = event("Backwards", 10);
        new.end_time = Some(Utc.with_ymd_and_hms(2025, 3, 9, 0, 0, 0).unwrap());
        let err = store.create::<CalendarEvent>(&code, new).unwrap_err();
        assert!(matches!(err, StoreError::Patch(PatchError::Invalid(_))));
    }

    #[test]
    fn delete_under_other_couple_is_not_found() {
        let store = Store::new(test_pool());
        let code = TenantKey::new("ABC123").unwrap();
        let created: CalendarEvent = store.create(&code, event("Dinner", 1)).unwrap();

        let other = TenantKey::new("XYZ789").unwrap();
        assert!(matches!(
            store.delete::<CalendarEvent>(&other, created.id),
            Err(StoreError::NotFound(_))
        ));
        store.delete::<CalendarEvent>(&code, created.id).unwrap();
        assert!(store.list::<CalendarEvent>(&code, &[]).unwrap().is_empty());
    }
}
