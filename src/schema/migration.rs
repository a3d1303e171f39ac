//! Migration script generation from structured breaking changes

use serde::{Deserialize, Serialize};

use super::compatibility::{BreakingChange, ChangeKind};
use super::version::SchemaVersion;

/// A generated SQL-style migration artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationScript {
    pub schema_name: String,
    pub version: String,
    pub script: String,
}

impl MigrationScript {
    /// Build the script for `changes`.
    ///
    /// Output depends only on the inputs; the timestamp comes from the
    /// version record. Nullability and primary key changes are recorded as
    /// comments without a statement.
    pub fn generate(schema_name: &str, version: &SchemaVersion, changes: &[BreakingChange]) -> Self {
        let mut lines = vec![
            format!("-- Migration for {} to version {}", schema_name, version.version),
            format!("-- Generated at: {}", version.created_at.to_rfc3339()),
            format!("-- Description: {}", version.description),
            String::new(),
        ];

        for change in changes {
            lines.push(format!("-- {change}"));
            if let Some(statement) = statement_for(schema_name, change) {
                lines.push(statement);
            }
        }

        lines.push(String::new());
        lines.push("-- End of migration".to_string());

        Self {
            schema_name: schema_name.to_string(),
            version: version.version.clone(),
            script: lines.join("\n"),
        }
    }

    /// Document key under which the script is stored
    pub fn file_name(&self) -> String {
        format!("{}_{}_migration.sql", self.schema_name, self.version)
    }
}

fn statement_for(schema_name: &str, change: &BreakingChange) -> Option<String> {
    match change.kind {
        ChangeKind::FieldRemoved => Some(format!(
            "ALTER TABLE {} DROP COLUMN {};",
            schema_name, change.field
        )),
        ChangeKind::TypeChanged => change.new_value.as_ref().map(|new_type| {
            format!(
                "ALTER TABLE {} ALTER COLUMN {} TYPE {};",
                schema_name, change.field, new_type
            )
        }),
        ChangeKind::NullabilityTightened | ChangeKind::PrimaryKeyAdded => None,
    }
}
