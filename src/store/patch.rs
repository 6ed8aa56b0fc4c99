use serde::{Deserialize, Deserializer};

/// One field of an update payload.
///
/// Update structs mark themselves `#[serde(default)]` so a field missing from the
/// JSON stays `Absent`. An explicit `null` becomes `Null`; anything else is `Value`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Patch<T> {
    #[default]
    Absent,
    Null,
    Value(T),
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PatchError {
    #[error("{0} cannot be null")]
    NullField(&'static str),

    #[error("{0}")]
    Invalid(String),
}

impl<T> Patch<T> {
    pub fn is_present(&self) -> bool {
        !matches!(self, Patch::Absent)
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Patch::Value(v) => Some(v),
            _ => None,
        }
    }

    /// Merge into a nullable field.
    pub fn apply(self, slot: &mut Option<T>) {
        match self {
            Patch::Absent => {}
            Patch::Null => *slot = None,
            Patch::Value(v) => *slot = Some(v),
        }
    }

    /// Merge into a field that has no null state.
    pub fn apply_required(self, field: &'static str, slot: &mut T) -> Result<(), PatchError> {
        match self {
            Patch::Absent => Ok(()),
            Patch::Null => Err(PatchError::NullField(field)),
            Patch::Value(v) => {
                *slot = v;
                Ok(())
            }
        }
    }
}

impl<T> From<Option<T>> for Patch<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Patch::Value(v),
            None => Patch::Null,
        }
    }
}

impl<'de, T> Deserialize<'de> for Patch<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Patch::from)
    }
}

/// Ratings are stars, 1 through 5.
pub fn check_rating(rating: Option<i64>) -> Result<(), PatchError> {
    match rating {
        Some(r) if !(1..=5).contains(&r) => Err(PatchError::Invalid(
            "rating must be between 1 and 5".into(),
        )),
        _ => Ok(()),
    }
}
