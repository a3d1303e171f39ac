//! Schema model
//!
//! A [`Schema`] is the named, versioned structural definition of a data entity:
//! ordered fields, indexes, relationships and governance attributes. Its
//! persisted form is a [`SchemaDocument`] carrying a content hash.

pub mod compatibility;
pub mod manager;
pub mod migration;
pub mod validator;
pub mod version;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::checksum::Checksum;
use crate::error::{ArchError, Result};

pub use compatibility::{detect_breaking_changes, BreakingChange, ChangeKind};
pub use manager::{SchemaGovernanceRecord, SchemaManager};
pub use migration::MigrationScript;
pub use validator::{SchemaValidator, ValidationReport};
pub use version::SchemaVersion;

/// Storage paradigm of a schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaType {
    Relational,
    Document,
    KeyValue,
    Graph,
    TimeSeries,
    Columnar,
}

impl SchemaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaType::Relational => "relational",
            SchemaType::Document => "document",
            SchemaType::KeyValue => "key_value",
            SchemaType::Graph => "graph",
            SchemaType::TimeSeries => "time_series",
            SchemaType::Columnar => "columnar",
        }
    }

    /// Data types accepted for fields of this schema type (upper case).
    ///
    /// Graph schemas have no whitelist, so every field type is rejected.
    pub fn valid_data_types(&self) -> &'static [&'static str] {
        match self {
            SchemaType::Relational => &[
                "INTEGER", "BIGINT", "SMALLINT", "DECIMAL", "NUMERIC", "REAL", "DOUBLE",
                "VARCHAR", "CHAR", "TEXT", "BOOLEAN", "DATE", "TIME", "TIMESTAMP",
                "UUID", "JSON", "JSONB", "ARRAY",
            ],
            SchemaType::Document => &["STRING", "NUMBER", "BOOLEAN", "DATE", "OBJECT", "ARRAY", "NULL"],
            SchemaType::KeyValue => &["STRING", "HASH", "LIST", "SET", "SORTED_SET", "BITMAP", "HYPERLOGLOG"],
            SchemaType::TimeSeries => &["TIMESTAMP", "DOUBLE", "INTEGER", "STRING", "BOOLEAN", "TAG"],
            SchemaType::Columnar => &["INT32", "INT64", "FLOAT", "DOUBLE", "STRING", "BOOLEAN", "DATE", "TIMESTAMP"],
            SchemaType::Graph => &[],
        }
    }

    /// Case-insensitive whitelist check
    pub fn accepts(&self, data_type: &str) -> bool {
        let upper = data_type.to_uppercase();
        self.valid_data_types().iter().any(|t| *t == upper)
    }
}

impl fmt::Display for SchemaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SchemaType {
    type Err = ArchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "relational" => Ok(SchemaType::Relational),
            "document" => Ok(SchemaType::Document),
            "key_value" => Ok(SchemaType::KeyValue),
            "graph" => Ok(SchemaType::Graph),
            "time_series" => Ok(SchemaType::TimeSeries),
            "columnar" => Ok(SchemaType::Columnar),
            other => Err(ArchError::InvalidInput(format!("unknown schema type: {other}"))),
        }
    }
}

/// Data classification levels for governance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataClassification {
    Public,
    #[default]
    Internal,
    Confidential,
    Restricted,
    Pii,
    Phi,
}

impl DataClassification {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataClassification::Public => "public",
            DataClassification::Internal => "internal",
            DataClassification::Confidential => "confidential",
            DataClassification::Restricted => "restricted",
            DataClassification::Pii => "pii",
            DataClassification::Phi => "phi",
        }
    }

    /// PII or PHI
    pub fn is_sensitive(&self) -> bool {
        matches!(self, DataClassification::Pii | DataClassification::Phi)
    }
}

impl fmt::Display for DataClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataClassification {
    type Err = ArchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "public" => Ok(DataClassification::Public),
            "internal" => Ok(DataClassification::Internal),
            "confidential" => Ok(DataClassification::Confidential),
            "restricted" => Ok(DataClassification::Restricted),
            "pii" => Ok(DataClassification::Pii),
            "phi" => Ok(DataClassification::Phi),
            other => Err(ArchError::InvalidInput(format!("unknown classification: {other}"))),
        }
    }
}

/// Individual field definition in a schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaField {
    pub name: String,
    pub data_type: String,
    #[serde(default = "default_true")]
    pub nullable: bool,
    #[serde(default)]
    pub primary_key: bool,
    /// Unvalidated `schema.field` reference
    #[serde(default)]
    pub foreign_key: Option<String>,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub indexed: bool,
    #[serde(default)]
    pub default_value: Option<serde_json::Value>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub classification: DataClassification,
    #[serde(default)]
    pub validation_rules: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl SchemaField {
    /// Nullable, non-key field of the given type
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            nullable: true,
            primary_key: false,
            foreign_key: None,
            unique: false,
            indexed: false,
            default_value: None,
            description: None,
            classification: DataClassification::Internal,
            validation_rules: BTreeMap::new(),
            tags: Vec::new(),
        }
    }

    /// Non-nullable primary key field
    pub fn primary_key(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            nullable: false,
            primary_key: true,
            ..Self::new(name, data_type)
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn classified(mut self, classification: DataClassification) -> Self {
        self.classification = classification;
        self
    }

    pub fn described(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

fn default_true() -> bool {
    true
}

/// Index access method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexType {
    #[default]
    Btree,
    Hash,
    Gin,
    Gist,
    Brin,
}

/// Index definition for schema optimization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaIndex {
    pub name: String,
    pub fields: Vec<String>,
    #[serde(default)]
    pub unique: bool,
    #[serde(rename = "type", default)]
    pub index_type: IndexType,
    #[serde(default)]
    pub partial_condition: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Cardinality of a relationship between schemas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipKind {
    OneToOne,
    OneToMany,
    ManyToMany,
}

/// Relationship definition between schemas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaRelationship {
    pub name: String,
    pub source_schema: String,
    pub target_schema: String,
    pub source_field: String,
    pub target_field: String,
    pub relationship_type: RelationshipKind,
    #[serde(default)]
    pub cascade_delete: bool,
    #[serde(default)]
    pub cascade_update: bool,
}

/// Complete schema definition with governance attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    pub name: String,
    /// Free-form label, never ordered by the system
    pub version: String,
    pub schema_type: SchemaType,
    #[serde(default)]
    pub description: String,
    pub fields: Vec<SchemaField>,
    #[serde(default)]
    pub indexes: Vec<SchemaIndex>,
    #[serde(default)]
    pub relationships: Vec<SchemaRelationship>,
    #[serde(default)]
    pub business_owner: Option<String>,
    #[serde(default)]
    pub technical_owner: Option<String>,
    #[serde(default)]
    pub classification: DataClassification,
    #[serde(default)]
    pub retention_policy: Option<String>,
    #[serde(default)]
    pub backup_policy: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Free-form, excluded from the content hash
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl Schema {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        schema_type: SchemaType,
        fields: Vec<SchemaField>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            schema_type,
            description: String::new(),
            fields,
            indexes: Vec::new(),
            relationships: Vec::new(),
            business_owner: None,
            technical_owner: None,
            classification: DataClassification::Internal,
            retention_policy: None,
            backup_policy: None,
            tags: Vec::new(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn field(&self, name: &str) -> Option<&SchemaField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Fields classified PII or PHI
    pub fn sensitive_fields(&self) -> impl Iterator<Item = &SchemaField> {
        self.fields.iter().filter(|f| f.classification.is_sensitive())
    }

    /// Integrity hash over everything except `metadata`
    pub fn content_hash(&self) -> Result<Checksum> {
        Ok(Checksum::of_document(self, &["metadata"])?)
    }
}

/// On-disk form of a schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaDocument {
    #[serde(flatten)]
    pub schema: Schema,
    pub schema_hash: Checksum,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl SchemaDocument {
    pub fn new(schema: Schema) -> Result<Self> {
        let schema_hash = schema.content_hash()?;
        Ok(Self {
            schema,
            schema_hash,
            created_at: None,
            updated_at: None,
        })
    }

    /// Recompute the hash and compare with the stored one
    pub fn verify(&self) -> Result<bool> {
        Ok(self.schema.content_hash()? == self.schema_hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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
        schema.indexes.push(SchemaIndex {
            name: "idx_amount".to_string(),
            fields: vec!["amount".to_string()],
            unique: false,
            index_type: IndexType::Btree,
            partial_condition: None,
            description: None,
        });
        schema
    }

    #[test]
    fn test_whitelist_is_case_insensitive() {
        assert!(SchemaType::Relational.accepts("varchar"));
        assert!(SchemaType::Document.accepts("Object"));
        assert!(!SchemaType::Document.accepts("VARCHAR"));
        assert!(!SchemaType::Graph.accepts("STRING"));
    }

    #[test]
    fn test_hash_ignores_metadata() {
        let a = orders();
        let mut b = orders();
        b.metadata.insert("note".to_string(), serde_json::json!("ignored"));
        assert_eq!(a.content_hash().unwrap(), b.content_hash().unwrap());

        b.fields[1].nullable = false;
        assert_ne!(a.content_hash().unwrap(), b.content_hash().unwrap());
    }

    #[test]
    fn test_enums_serialize_as_strings() {
        let json = serde_json::to_value(orders()).unwrap();
        assert_eq!(json["schema_type"], "relational");
        assert_eq!(json["classification"], "internal");
        assert_eq!(json["indexes"][0]["type"], "btree");
    }

    #[test]
    fn test_unknown_index_type_is_rejected() {
        let raw = r#"{"name":"i","fields":["a"],"type":"bitmapish"}"#;
        assert!(serde_json::from_str::<SchemaIndex>(raw).is_err());
    }

    #[test]
    fn test_document_flattens_schema() {
        let doc = SchemaDocument::new(orders()).unwrap();
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["name"], "orders");
        assert!(json["schema_hash"].is_string());

        let back: SchemaDocument = serde_json::from_value(json).unwrap();
        assert_eq!(back.schema, orders());
        assert!(back.verify().unwrap());
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("TIME_SERIES".parse::<SchemaType>().unwrap(), SchemaType::TimeSeries);
        assert_eq!("PHI".parse::<DataClassification>().unwrap(), DataClassification::Phi);
        assert!("tabular".parse::<SchemaType>().is_err());
    }
}
