//! Job identifiers

use std::fmt;

/// Unique identifier for a pipeline job based on UUIDv7
///
/// UUIDv7 sorts chronologically, so job ids order by start time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JobId(u128);

impl JobId {
    /// Generate a new UUIDv7-based JobId
    ///
    /// # Examples
    ///
    /// ```
    /// use pcascan_domain::JobId;
    ///
    /// let id = JobId::new();
    /// assert!(id.value() > 0);
    /// ```
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7().as_u128())
    }

    /// Parse a JobId from a UUID string
    ///
    /// # Examples
    ///
    /// ```
    /// use pcascan_domain::JobId;
    ///
    /// let id = JobId::new();
    /// let parsed = JobId::from_string(&id.to_string()).unwrap();
    /// assert_eq!(id, parsed);
    /// ```
    pub fn from_string(s: &str) -> Result<Self, String> {
        uuid::Uuid::parse_str(s)
            .map(|u| Self(u.as_u128()))
            .map_err(|e| format!("Invalid job id: {}", e))
    }

    /// Get the raw u128 value
    pub fn value(&self) -> u128 {
        self.0
    }

    /// Milliseconds since the Unix epoch at which the id was generated
    pub fn timestamp(&self) -> u64 {
        // UUIDv7: top 48 bits are Unix millisecond timestamp
        (self.0 >> 80) as u64
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", uuid::Uuid::from_u128(self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_job_ids_are_unique() {
        let a = JobId::new();
        let b = JobId::new();
        assert_ne!(a, b);
        assert!(b.timestamp() >= a.timestamp());
    }

    #[test]
    fn test_from_string_rejects_garbage() {
        assert!(JobId::from_string("not-a-uuid").is_err());
    }

    proptest! {
        #[test]
        fn prop_display_roundtrip(value in any::<u128>()) {
            let id = JobId(value);
            let parsed = JobId::from_string(&id.to_string()).unwrap();
            prop_assert_eq!(parsed, id);
        }
    }
}
