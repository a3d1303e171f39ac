//! Schema lifecycle manager
//!
//! Persists schema documents, their version history, governance records and
//! migration scripts in a [`DocumentStore`]:
//!
//! ```text
//! definitions/{name}.json
//! versions/{name}_versions.json
//! governance/{name}_governance.json
//! migrations/{name}_{version}_migration.sql
//! pending/{name}.json              (in-flight write set)
//! ```
//!
//! Every multi-document write goes through a pending journal entry first, so a
//! crash never leaves a schema document without its version record.
//! [`SchemaManager::open`] replays leftover entries.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::compatibility::{detect_breaking_changes, BreakingChange};
use super::migration::MigrationScript;
use super::validator::{SchemaValidator, ValidationReport};
use super::version::{sort_newest_first, SchemaVersion};
use super::{DataClassification, Schema, SchemaDocument};
use crate::error::{ArchError, Result};
use crate::store::{key, DocumentStore, JsonStoreExt};

const DEFINITIONS: &str = "definitions";
const VERSIONS: &str = "versions";
const GOVERNANCE: &str = "governance";
const MIGRATIONS: &str = "migrations";
const PENDING: &str = "pending";

/// Per-schema compliance and ownership record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaGovernanceRecord {
    pub schema_name: String,
    pub business_owner: Option<String>,
    pub technical_owner: Option<String>,
    pub classification: DataClassification,
    pub retention_policy: Option<String>,
    pub backup_policy: Option<String>,
    pub compliance_requirements: Vec<String>,
    #[serde(default)]
    pub access_controls: Vec<String>,
    #[serde(default)]
    pub audit_log: Vec<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub last_reviewed: Option<DateTime<Utc>>,
    #[serde(default)]
    pub next_review_date: Option<DateTime<Utc>>,
}

impl SchemaGovernanceRecord {
    /// Seed a record from the schema, deriving compliance requirements
    /// from field classifications
    pub fn for_schema(schema: &Schema) -> Self {
        let mut compliance_requirements = Vec::new();
        if schema.sensitive_fields().next().is_some() {
            compliance_requirements.push("GDPR".to_string());
            compliance_requirements.push("privacy_by_design".to_string());
            if schema
                .fields
                .iter()
                .any(|f| f.classification == DataClassification::Phi)
            {
                compliance_requirements.push("HIPAA".to_string());
            }
        }

        Self {
            schema_name: schema.name.clone(),
            business_owner: schema.business_owner.clone(),
            technical_owner: schema.technical_owner.clone(),
            classification: schema.classification,
            retention_policy: schema.retention_policy.clone(),
            backup_policy: schema.backup_policy.clone(),
            compliance_requirements,
            access_controls: Vec::new(),
            audit_log: Vec::new(),
            created_at: Utc::now(),
            last_reviewed: None,
            next_review_date: None,
        }
    }
}

/// Outcome of a successful update
#[derive(Debug, Clone)]
pub struct SchemaUpdate {
    /// The stored version record, with `breaking_changes` set
    pub version: SchemaVersion,
    pub breaking_changes: Vec<BreakingChange>,
    pub warnings: Vec<String>,
    /// Key of the generated migration script, if any
    pub migration: Option<String>,
}

/// Documents written together for one create or update
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PendingWrite {
    document: SchemaDocument,
    version: SchemaVersion,
    #[serde(default)]
    governance: Option<SchemaGovernanceRecord>,
    #[serde(default)]
    migration: Option<MigrationScript>,
}

/// Schema lifecycle manager over a document store
pub struct SchemaManager {
    store: Arc<dyn DocumentStore>,
    validator: SchemaValidator,
    strict_integrity: bool,
}

impl SchemaManager {
    /// Open a manager and replay any interrupted writes
    pub fn open(store: Arc<dyn DocumentStore>) -> Result<Self> {
        let manager = Self {
            store,
            validator: SchemaValidator::new(),
            strict_integrity: false,
        };
        manager.recover()?;
        Ok(manager)
    }

    /// Fail reads whose stored hash does not match the content
    pub fn with_strict_integrity(mut self, strict: bool) -> Self {
        self.strict_integrity = strict;
        self
    }

    /// Validate a candidate schema
    pub fn validate_schema(&self, schema: &Schema) -> ValidationReport {
        self.validator.validate(schema)
    }

    /// Create a new schema.
    ///
    /// Fails with [`ArchError::Validation`] when the schema has errors and
    /// with [`ArchError::AlreadyExists`] when the name is taken. Returns the
    /// validation report so callers can surface warnings.
    pub fn create_schema(&self, schema: &Schema) -> Result<ValidationReport> {
        let report = self.validate_schema(schema);
        if !report.valid {
            warn!(schema = %schema.name, errors = ?report.errors, "Schema validation failed");
            return Err(ArchError::Validation(report));
        }
        check_name(&schema.name)?;
        if self.schema_exists(&schema.name) {
            return Err(ArchError::already_exists("schema", &schema.name));
        }

        let mut document = SchemaDocument::new(schema.clone())?;
        document.created_at = Some(Utc::now());

        let version = SchemaVersion::new(
            schema.version.clone(),
            schema.technical_owner.clone().unwrap_or_else(|| "system".to_string()),
            format!("Initial schema creation: {}", schema.description),
        )
        .with_changes(vec!["Initial schema creation".to_string()]);

        self.commit(PendingWrite {
            document,
            version,
            governance: Some(SchemaGovernanceRecord::for_schema(schema)),
            migration: None,
        })?;

        info!(schema = %schema.name, version = %schema.version, "Schema created");
        Ok(report)
    }

    /// Replace a stored schema and append `version_info` to its history.
    ///
    /// Breaking changes never block the update; they set the version's
    /// `breaking_changes` flag and produce a migration script.
    pub fn update_schema(&self, schema: &Schema, version_info: SchemaVersion) -> Result<SchemaUpdate> {
        check_name(&schema.name)?;
        let current = self
            .get_schema(&schema.name)?
            .ok_or_else(|| ArchError::not_found("schema", &schema.name))?;

        let report = self.validate_schema(schema);
        if !report.valid {
            warn!(schema = %schema.name, errors = ?report.errors, "Schema validation failed");
            return Err(ArchError::Validation(report));
        }

        let breaking_changes = detect_breaking_changes(&current, schema);
        let mut version = version_info;
        version.breaking_changes = !breaking_changes.is_empty();

        if version.breaking_changes {
            let rendered: Vec<String> = breaking_changes.iter().map(|c| c.to_string()).collect();
            warn!(schema = %schema.name, changes = ?rendered, "Breaking changes detected");

            if let Some(previous) = self.get_schema_versions(&schema.name)?.first() {
                if version.lacks_major_bump_over(previous) {
                    warn!(
                        schema = %schema.name,
                        previous = %previous.version,
                        version = %version.version,
                        "Breaking change without a major version bump"
                    );
                }
            }
        }

        let created_at = self
            .read_document(&schema.name)?
            .and_then(|doc| doc.created_at);
        let mut document = SchemaDocument::new(schema.clone())?;
        document.created_at = created_at;
        document.updated_at = Some(Utc::now());

        let migration = version
            .breaking_changes
            .then(|| MigrationScript::generate(&schema.name, &version, &breaking_changes));
        let migration_key = migration.as_ref().map(|m| key(MIGRATIONS, &m.file_name()));

        self.commit(PendingWrite {
            document,
            version: version.clone(),
            governance: None,
            migration,
        })?;

        info!(schema = %schema.name, version = %schema.version, "Schema updated");
        Ok(SchemaUpdate {
            version,
            breaking_changes,
            warnings: report.warnings,
            migration: migration_key,
        })
    }

    /// Load a schema, `None` when absent
    pub fn get_schema(&self, name: &str) -> Result<Option<Schema>> {
        let Some(document) = self.read_document(name)? else {
            return Ok(None);
        };

        let actual = document.schema.content_hash()?;
        if actual != document.schema_hash {
            if self.strict_integrity {
                return Err(ArchError::ChecksumMismatch {
                    expected: document.schema_hash.to_string(),
                    actual: actual.to_string(),
                });
            }
            warn!(schema = %name, "Stored schema hash does not match its content");
        }

        Ok(Some(document.schema))
    }

    /// Stored document including hash and timestamps
    pub fn get_schema_document(&self, name: &str) -> Result<Option<SchemaDocument>> {
        self.read_document(name)
    }

    pub fn schema_exists(&self, name: &str) -> bool {
        self.store.exists(&definition_key(name))
    }

    /// Names of all stored schemas, sorted
    pub fn list_schemas(&self) -> Result<Vec<String>> {
        Ok(self
            .store
            .list(DEFINITIONS, ".json")?
            .iter()
            .filter_map(|k| {
                k.strip_prefix("definitions/")
                    .and_then(|n| n.strip_suffix(".json"))
                    .map(String::from)
            })
            .collect())
    }

    /// Version history, newest first
    pub fn get_schema_versions(&self, name: &str) -> Result<Vec<SchemaVersion>> {
        let mut versions = self.read_history(name)?;
        sort_newest_first(&mut versions);
        Ok(versions)
    }

    pub fn get_governance_record(&self, name: &str) -> Result<Option<SchemaGovernanceRecord>> {
        self.store.read_json(&governance_key(name))
    }

    /// Migration script generated for `version`, if any
    pub fn get_migration(&self, name: &str, version: &str) -> Result<Option<String>> {
        let key = key(MIGRATIONS, &format!("{name}_{version}_migration.sql"));
        match self.store.read(&key)? {
            Some(bytes) => Ok(Some(
                String::from_utf8(bytes).map_err(|e| ArchError::Internal(e.to_string()))?,
            )),
            None => Ok(None),
        }
    }

    /// Recompute the content hash of a stored schema and compare
    pub fn verify_schema(&self, name: &str) -> Result<bool> {
        let document = self
            .read_document(name)?
            .ok_or_else(|| ArchError::not_found("schema", name))?;
        document.verify()
    }

    /// Stored names closest to `query`, best first
    pub fn suggest_schema_names(&self, query: &str, limit: usize) -> Result<Vec<String>> {
        let matcher = SkimMatcherV2::default();
        let mut scored: Vec<(i64, String)> = self
            .list_schemas()?
            .into_iter()
            .filter_map(|name| matcher.fuzzy_match(&name, query).map(|score| (score, name)))
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
        Ok(scored.into_iter().take(limit).map(|(_, name)| name).collect())
    }

    /// Apply leftover pending writes; returns how many were replayed
    pub fn recover(&self) -> Result<usize> {
        let mut replayed = 0;
        for pending_key in self.store.list(PENDING, ".json")? {
            match self.store.read_json::<PendingWrite>(&pending_key)? {
                Some(pending) => {
                    warn!(schema = %pending.document.schema.name, "Replaying interrupted schema write");
                    self.apply(&pending)?;
                    self.store.remove(&pending_key)?;
                    replayed += 1;
                }
                None => continue,
            }
        }
        Ok(replayed)
    }

    fn commit(&self, pending: PendingWrite) -> Result<()> {
        let pending_key = key(PENDING, &format!("{}.json", pending.document.schema.name));
        self.store.write_json(&pending_key, &pending)?;
        self.apply(&pending)?;
        self.store.remove(&pending_key)?;
        Ok(())
    }

    /// Idempotent: a version already recorded is not appended again
    fn apply(&self, pending: &PendingWrite) -> Result<()> {
        let name = &pending.document.schema.name;
        self.store.write_json(&definition_key(name), &pending.document)?;

        let mut history = self.read_history(name)?;
        if !history.contains(&pending.version) {
            history.push(pending.version.clone());
            self.store.write_json(&history_key(name), &history)?;
        } else {
            debug!(schema = %name, version = %pending.version.version, "Version already recorded");
        }

        if let Some(governance) = &pending.governance {
            self.store.write_json(&governance_key(name), governance)?;
        }
        if let Some(migration) = &pending.migration {
            self.store.write(
                &key(MIGRATIONS, &migration.file_name()),
                migration.script.as_bytes(),
            )?;
        }
        Ok(())
    }

    fn read_document(&self, name: &str) -> Result<Option<SchemaDocument>> {
        self.store.read_json(&definition_key(name))
    }

    fn read_history(&self, name: &str) -> Result<Vec<SchemaVersion>> {
        Ok(self.store.read_json(&history_key(name))?.unwrap_or_default())
    }
}

fn check_name(name: &str) -> Result<()> {
    if name.contains('/') || name.contains('\\') {
        return Err(ArchError::InvalidInput(format!(
            "schema name must not contain path separators: {name}"
        )));
    }
    Ok(())
}

fn definition_key(name: &str) -> String {
    key(DEFINITIONS, &format!("{name}.json"))
}

fn history_key(name: &str) -> String {
    key(VERSIONS, &format!("{name}_versions.json"))
}

fn governance_key(name: &str) -> String {
    key(GOVERNANCE, &format!("{name}_governance.json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{SchemaField, SchemaType};
    use crate::store::MemoryStore;

    fn manager() -> (Arc<MemoryStore>, SchemaManager) {
        let store = Arc::new(MemoryStore::new());
        let manager = SchemaManager::open(store.clone()).unwrap();
        (store, manager)
    }

    fn orders() -> Schema {
        let mut schema = Schema::new(
            "orders",
            "1.0.0",
            SchemaType::Relational,
            vec![
                SchemaField::primary_key("id", "UUID"),
                SchemaField::new("amount", "DECIMAL"),
            ],
        );
        schema.description = "Customer orders".to_string();
        schema.technical_owner = Some("data-eng".to_string());
        schema
    }

    #[test]
    fn test_create_writes_all_documents() {
        let (store, manager) = manager();
        manager.create_schema(&orders()).unwrap();

        assert!(store.exists("definitions/orders.json"));
        assert!(store.exists("versions/orders_versions.json"));
        assert!(store.exists("governance/orders_governance.json"));
        assert!(store.list("pending", ".json").unwrap().is_empty());

        let versions = manager.get_schema_versions("orders").unwrap();
        assert_eq!(versions.len(), 1);
        assert_eq!(versions[0].created_by, "data-eng");
        assert_eq!(versions[0].changes, vec!["Initial schema creation"]);
        assert_eq!(versions[0].description, "Initial schema creation: Customer orders");
    }

    #[test]
    fn test_duplicate_create_fails_and_keeps_original() {
        let (_, manager) = manager();
        manager.create_schema(&orders()).unwrap();

        let mut other = orders();
        other.description = "Replacement".to_string();
        let err = manager.create_schema(&other).unwrap_err();
        assert!(matches!(err, ArchError::AlreadyExists { .. }));
        assert_eq!(manager.get_schema("orders").unwrap().unwrap().description, "Customer orders");
    }

    #[test]
    fn test_invalid_schema_is_not_written() {
        let (store, manager) = manager();
        let mut schema = orders();
        schema.fields.push(SchemaField::new("id", "INTEGER"));
        match manager.create_schema(&schema) {
            Err(ArchError::Validation(report)) => {
                assert!(report.errors.contains(&"Duplicate field name: id".to_string()))
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert!(!store.exists("definitions/orders.json"));
    }

    #[test]
    fn test_names_with_separators_are_rejected_on_every_write() {
        let (store, manager) = manager();
        let mut nested = orders();
        nested.name = "sales/orders".to_string();

        assert!(matches!(manager.create_schema(&nested), Err(ArchError::InvalidInput(_))));
        // Update must not report the nested key as a missing schema
        assert!(matches!(
            manager.update_schema(&nested, SchemaVersion::new("1.0.1", "dana", "")),
            Err(ArchError::InvalidInput(_))
        ));
        assert!(store.list("definitions", ".json").unwrap().is_empty());
    }

    #[test]
    fn test_governance_requirements_from_classification() {
        let (_, manager) = manager();
        let mut schema = orders();
        schema.retention_policy = Some("7_years".to_string());
        schema.fields.push(SchemaField::new("diagnosis", "TEXT").classified(DataClassification::Phi));
        manager.create_schema(&schema).unwrap();

        let record = manager.get_governance_record("orders").unwrap().unwrap();
        assert_eq!(record.compliance_requirements, vec!["GDPR", "privacy_by_design", "HIPAA"]);
    }

    #[test]
    fn test_update_with_breaking_change_writes_migration() {
        let (_, manager) = manager();
        manager.create_schema(&orders()).unwrap();

        let mut next = orders();
        next.version = "2.0.0".to_string();
        next.fields.retain(|f| f.name != "amount");
        let update = manager
            .update_schema(&next, SchemaVersion::new("2.0.0", "alice", "Drop amount"))
            .unwrap();

        assert!(update.version.breaking_changes);
        assert_eq!(update.breaking_changes.len(), 1);
        assert_eq!(update.migration.as_deref(), Some("migrations/orders_2.0.0_migration.sql"));

        let script = manager.get_migration("orders", "2.0.0").unwrap().unwrap();
        assert!(script.contains("ALTER TABLE orders DROP COLUMN amount;"));

        let versions = manager.get_schema_versions("orders").unwrap();
        assert_eq!(versions.len(), 2);
        assert!(versions[0].breaking_changes);
    }

    #[test]
    fn test_non_breaking_update_has_no_migration() {
        let (_, manager) = manager();
        manager.create_schema(&orders()).unwrap();

        let mut next = orders();
        next.version = "1.1.0".to_string();
        next.fields.push(SchemaField::new("note", "TEXT"));
        let update = manager
            .update_schema(&next, SchemaVersion::new("1.1.0", "alice", "Add note"))
            .unwrap();
        assert!(!update.version.breaking_changes);
        assert!(update.migration.is_none());
        assert!(manager.get_migration("orders", "1.1.0").unwrap().is_none());
    }

    #[test]
    fn test_update_missing_schema() {
        let (_, manager) = manager();
        let err = manager
            .update_schema(&orders(), SchemaVersion::new("1.0.1", "a", ""))
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_tampered_document_is_detected() {
        let (store, manager) = manager();
        manager.create_schema(&orders()).unwrap();

        let mut doc: serde_json::Value = store.read_json("definitions/orders.json").unwrap().unwrap();
        doc["description"] = serde_json::json!("edited by hand");
        store.write_json("definitions/orders.json", &doc).unwrap();

        assert!(!manager.verify_schema("orders").unwrap());
        assert!(manager.get_schema("orders").unwrap().is_some());

        let strict = SchemaManager::open(store).unwrap().with_strict_integrity(true);
        assert!(matches!(
            strict.get_schema("orders"),
            Err(ArchError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_recover_replays_pending_write_once() {
        let (store, manager) = manager();
        manager.create_schema(&orders()).unwrap();

        let mut next = orders();
        next.version = "1.1.0".to_string();
        let pending = PendingWrite {
            document: SchemaDocument::new(next).unwrap(),
            version: SchemaVersion::new("1.1.0", "alice", "interrupted"),
            governance: None,
            migration: None,
        };
        store.write_json("pending/orders.json", &pending).unwrap();

        let reopened = SchemaManager::open(store.clone()).unwrap();
        assert_eq!(reopened.get_schema("orders").unwrap().unwrap().version, "1.1.0");
        assert_eq!(reopened.get_schema_versions("orders").unwrap().len(), 2);
        assert!(!store.exists("pending/orders.json"));

        // Replaying the same entry again does not duplicate history
        store.write_json("pending/orders.json", &pending).unwrap();
        assert_eq!(reopened.recover().unwrap(), 1);
        assert_eq!(reopened.get_schema_versions("orders").unwrap().len(), 2);
    }

    #[test]
    fn test_listing_and_suggestions() {
        let (_, manager) = manager();
        manager.create_schema(&orders()).unwrap();
        let mut customers = orders();
        customers.name = "customers".to_string();
        manager.create_schema(&customers).unwrap();

        assert_eq!(manager.list_schemas().unwrap(), vec!["customers", "orders"]);
        assert_eq!(manager.suggest_schema_names("ordrs", 3).unwrap(), vec!["orders"]);
    }
}
