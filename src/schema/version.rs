//! Schema version records
//!
//! Each create or update appends one immutable [`SchemaVersion`] to the
//! schema's history. Labels are free-form; semver is only consulted for an
//! advisory check on breaking updates.

use chrono::{DateTime, Utc};
use semver::Version;
use serde::{Deserialize, Serialize};

/// One entry of a schema's append-only version history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaVersion {
    /// Version label (e.g., "1.2.0")
    pub version: String,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub changes: Vec<String>,
    /// Set by the manager from breaking-change detection
    #[serde(default)]
    pub breaking_changes: bool,
    #[serde(default)]
    pub rollback_version: Option<String>,
    #[serde(default)]
    pub approved_by: Option<String>,
    #[serde(default)]
    pub deployment_date: Option<DateTime<Utc>>,
}

impl SchemaVersion {
    /// Create a version record stamped now
    pub fn new(
        version: impl Into<String>,
        created_by: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            version: version.into(),
            created_at: Utc::now(),
            created_by: created_by.into(),
            description: description.into(),
            changes: Vec::new(),
            breaking_changes: false,
            rollback_version: None,
            approved_by: None,
            deployment_date: None,
        }
    }

    pub fn with_changes(mut self, changes: Vec<String>) -> Self {
        self.changes = changes;
        self
    }

    /// Parse the label as semver, accepting a leading `v`
    pub fn semver(&self) -> Option<Version> {
        let label = self.version.strip_prefix('v').unwrap_or(&self.version);
        Version::parse(label).ok()
    }

    /// True when both labels are semver and this one does not raise the major
    pub fn lacks_major_bump_over(&self, previous: &SchemaVersion) -> bool {
        match (self.semver(), previous.semver()) {
            (Some(current), Some(prev)) => current.major <= prev.major,
            _ => false,
        }
    }
}

/// Sort a history newest first
pub fn sort_newest_first(versions: &mut [SchemaVersion]) {
    versions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_semver_parsing() {
        let v = SchemaVersion::new("v2.1.0", "alice", "");
        assert_eq!(v.semver(), Some(Version::new(2, 1, 0)));
        assert_eq!(SchemaVersion::new("2024-q1", "alice", "").semver(), None);
    }

    #[test]
    fn test_major_bump_check() {
        let prev = SchemaVersion::new("1.4.0", "a", "");
        assert!(SchemaVersion::new("1.5.0", "a", "").lacks_major_bump_over(&prev));
        assert!(!SchemaVersion::new("2.0.0", "a", "").lacks_major_bump_over(&prev));
        assert!(!SchemaVersion::new("next", "a", "").lacks_major_bump_over(&prev));
    }

    #[test]
    fn test_sort_newest_first() {
        let mut older = SchemaVersion::new("1.0.0", "a", "");
        older.created_at -= Duration::hours(1);
        let newer = SchemaVersion::new("1.1.0", "a", "");
        let mut history = vec![older, newer];
        sort_newest_first(&mut history);
        assert_eq!(history[0].version, "1.1.0");
    }
}
