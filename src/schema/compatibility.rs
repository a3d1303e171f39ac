//! Breaking-change detection between schema versions
//!
//! Removed fields, type changes, nullability tightening and primary key
//! promotion are breaking. Added fields and widening changes are not.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use similar::{ChangeTag, TextDiff};

use super::{Schema, SchemaField};
use crate::error::Result;

/// Kind of breaking change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    FieldRemoved,
    TypeChanged,
    NullabilityTightened,
    PrimaryKeyAdded,
}

/// A single breaking change on one field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakingChange {
    pub kind: ChangeKind,
    pub field: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
}

impl BreakingChange {
    fn removed(field: &SchemaField) -> Self {
        Self {
            kind: ChangeKind::FieldRemoved,
            field: field.name.clone(),
            old_value: Some(field.data_type.clone()),
            new_value: None,
        }
    }

    fn type_changed(old: &SchemaField, new: &SchemaField) -> Self {
        Self {
            kind: ChangeKind::TypeChanged,
            field: old.name.clone(),
            old_value: Some(old.data_type.clone()),
            new_value: Some(new.data_type.clone()),
        }
    }

    fn flag(kind: ChangeKind, field: &str, old: bool, new: bool) -> Self {
        Self {
            kind,
            field: field.to_string(),
            old_value: Some(old.to_string()),
            new_value: Some(new.to_string()),
        }
    }
}

impl fmt::Display for BreakingChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ChangeKind::FieldRemoved => write!(f, "Removed field: {}", self.field),
            ChangeKind::TypeChanged => write!(
                f,
                "Changed data type for field {}: {} -> {}",
                self.field,
                self.old_value.as_deref().unwrap_or_default(),
                self.new_value.as_deref().unwrap_or_default()
            ),
            ChangeKind::NullabilityTightened => {
                write!(f, "Field {} changed from nullable to non-nullable", self.field)
            }
            ChangeKind::PrimaryKeyAdded => write!(f, "Field {} changed to primary key", self.field),
        }
    }
}

/// Diff `old` against `new` and return the breaking changes.
///
/// Output order is deterministic: all removals in `old` field order first,
/// then per-field changes for fields present in both, again in `old` order.
pub fn detect_breaking_changes(old: &Schema, new: &Schema) -> Vec<BreakingChange> {
    let new_fields: HashMap<&str, &SchemaField> =
        new.fields.iter().map(|f| (f.name.as_str(), f)).collect();

    let mut changes: Vec<BreakingChange> = old
        .fields
        .iter()
        .filter(|f| !new_fields.contains_key(f.name.as_str()))
        .map(BreakingChange::removed)
        .collect();

    for old_field in &old.fields {
        let Some(new_field) = new_fields.get(old_field.name.as_str()) else {
            continue;
        };

        if old_field.data_type != new_field.data_type {
            changes.push(BreakingChange::type_changed(old_field, new_field));
        }
        if old_field.nullable && !new_field.nullable {
            changes.push(BreakingChange::flag(
                ChangeKind::NullabilityTightened,
                &old_field.name,
                true,
                false,
            ));
        }
        if !old_field.primary_key && new_field.primary_key {
            changes.push(BreakingChange::flag(
                ChangeKind::PrimaryKeyAdded,
                &old_field.name,
                false,
                true,
            ));
        }
    }

    changes
}

/// Unified-style line diff of two schema documents for human review
pub fn render_document_diff(old: &Schema, new: &Schema) -> Result<String> {
    let old_text = serde_json::to_string_pretty(old)?;
    let new_text = serde_json::to_string_pretty(new)?;
    let diff = TextDiff::from_lines(&old_text, &new_text);

    let mut out = String::new();
    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => "-",
            ChangeTag::Insert => "+",
            ChangeTag::Equal => " ",
        };
        out.push_str(sign);
        out.push_str(change.value());
        if change.missing_newline() {
            out.push('\n');
        }
    }
    Ok(out)
}
