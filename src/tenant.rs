use std::fmt;

use serde::Serialize;

/// The couple code every shared record is partitioned by.
///
/// Matching is exact string equality. The key is never trimmed or case-folded,
/// so `"abc"` and `"ABC"` are different couples.
///
/// The code is a shared secret. `Debug` and [`TenantKey::redacted`] only show
/// its first two characters; use those when logging.
#[derive(Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TenantKey(String);

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Couple code is required")]
pub struct TenantKeyError;

impl TenantKey {
    pub fn new(code: impl Into<String>) -> Result<Self, TenantKeyError> {
        let code = code.into();
        if code.is_empty() {
            return Err(TenantKeyError);
        }
        Ok(Self(code))
    }

    /// Accepts an optional raw value, treating an empty string like a missing one.
    pub fn from_optional(code: Option<&str>) -> Option<Self> {
        code.and_then(|c| Self::new(c).ok())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn redacted(&self) -> String {
        let shown: String = self.0.chars().take(2).collect();
        format!("{}***", shown)
    }
}

impl fmt::Debug for TenantKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TenantKey").field(&self.redacted()).finish()
    }
}

impl fmt::Display for TenantKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TenantKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_code_is_rejected() {
        assert_eq!(TenantKey::new(""), Err(TenantKeyError));
    }

    #[test]
    fn code_is_kept_verbatim() {
        let key = TenantKey::new(" Abc123 ").unwrap();
        assert_eq!(key.as_str(), " Abc123 ");
        assert_ne!(key, TenantKey::new("abc123").unwrap());
    }

    #[test]
    fn redacted_forms_hide_the_code() {
        let key = TenantKey::new("ABC123").unwrap();
        assert_eq!(key.redacted(), "AB***");
        assert_eq!(format!("{:?}", key), "TenantKey(\"AB***\")");
        assert!(!format!("{:?}", Some(&key)).contains("ABC123"));
        assert_eq!(TenantKey::new("A").unwrap().redacted(), "A***");
    }

    #[test]
    fn from_optional_skips_missing_and_empty() {
        assert!(TenantKey::from_optional(None).is_none());
        assert!(TenantKey::from_optional(Some("")).is_none());
        assert_eq!(
            TenantKey::from_optional(Some("XYZ")).unwrap().as_str(),
            "XYZ"
        );
    }
}
