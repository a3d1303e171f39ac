//! Structural and governance lint checks over a schema
//!
//! Every check runs; findings are collected rather than short-circuited.
//! Warnings are advisory and never make a schema invalid.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::{Schema, SchemaType};

/// Outcome of validating a schema
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    fn from_findings(errors: Vec<String>, warnings: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
            warnings,
        }
    }
}

/// Schema validator
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaValidator;

impl SchemaValidator {
    pub fn new() -> Self {
        Self
    }

    /// Validate a candidate schema
    pub fn validate(&self, schema: &Schema) -> ValidationReport {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        if schema.name.is_empty() {
            errors.push("Schema name is required".to_string());
        }
        if schema.fields.is_empty() {
            errors.push("Schema must have at least one field".to_string());
        }

        let mut field_names: HashSet<&str> = HashSet::new();
        let mut primary_keys: Vec<&str> = Vec::new();

        for field in &schema.fields {
            if field.name.is_empty() {
                errors.push("All fields must have a name".to_string());
                continue;
            }

            if !field_names.insert(field.name.as_str()) {
                errors.push(format!("Duplicate field name: {}", field.name));
            }

            if field.primary_key {
                primary_keys.push(field.name.as_str());
            }

            if !schema.schema_type.accepts(&field.data_type) {
                errors.push(format!(
                    "Invalid data type {} for field {}",
                    field.data_type, field.name
                ));
            }
        }

        if schema.schema_type == SchemaType::Relational && primary_keys.is_empty() {
            warnings.push("Relational schema should have a primary key".to_string());
        }
        if primary_keys.len() > 1 {
            warnings.push("Multiple primary keys detected, consider composite key design".to_string());
        }

        for index in &schema.indexes {
            for field_name in &index.fields {
                if !field_names.contains(field_name.as_str()) {
                    errors.push(format!(
                        "Index {} references non-existent field: {}",
                        index.name, field_name
                    ));
                }
            }
        }

        // Only the source side is checked; targets live in other schemas
        for relationship in &schema.relationships {
            if !field_names.contains(relationship.source_field.as_str()) {
                errors.push(format!(
                    "Relationship {} references non-existent source field: {}",
                    relationship.name, relationship.source_field
                ));
            }
        }

        if schema.sensitive_fields().next().is_some() && schema.retention_policy.is_none() {
            warnings.push("Schema contains sensitive data but no retention policy defined".to_string());
        }

        ValidationReport::from_findings(errors, warnings)
    }
}
