//! Metadata catalog
//!
//! Catalog resources with typed metadata attributes, directed relationships
//! between resources, extraction rules applied at registration, and a
//! weighted text search over the catalog.

pub mod manager;
pub mod search;

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use manager::MetadataManager;
pub use search::{SearchFilters, SearchResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Table,
    View,
    Column,
    Index,
    Schema,
    Database,
    File,
    Api,
    Query,
    Report,
    Dashboard,
    Transformation,
}

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Table => "table",
            ResourceType::View => "view",
            ResourceType::Column => "column",
            ResourceType::Index => "index",
            ResourceType::Schema => "schema",
            ResourceType::Database => "database",
            ResourceType::File => "file",
            ResourceType::Api => "api",
            ResourceType::Query => "query",
            ResourceType::Report => "report",
            ResourceType::Dashboard => "dashboard",
            ResourceType::Transformation => "transformation",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipType {
    Contains,
    DependsOn,
    DerivesFrom,
    References,
    SimilarTo,
    RelatedTo,
    PartOf,
    Uses,
}

impl RelationshipType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationshipType::Contains => "contains",
            RelationshipType::DependsOn => "depends_on",
            RelationshipType::DerivesFrom => "derives_from",
            RelationshipType::References => "references",
            RelationshipType::SimilarTo => "similar_to",
            RelationshipType::RelatedTo => "related_to",
            RelationshipType::PartOf => "part_of",
            RelationshipType::Uses => "uses",
        }
    }
}

impl fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named metadata value with provenance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataAttribute {
    pub name: String,
    pub value: serde_json::Value,
    /// string, number, boolean, date, json...
    #[serde(rename = "type", default = "default_attribute_type")]
    pub value_type: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default = "default_confidence")]
    pub confidence: f64,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tags: Vec<String>,
}

fn default_attribute_type() -> String {
    "string".to_string()
}

fn default_confidence() -> f64 {
    1.0
}

impl MetadataAttribute {
    pub fn new(name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            value_type: default_attribute_type(),
            description: None,
            source: None,
            confidence: default_confidence(),
            last_updated: None,
            tags: Vec::new(),
        }
    }

    /// Value as plain text, without JSON quoting for strings
    pub fn value_text(&self) -> String {
        match &self.value {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// A cataloged data asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataResource {
    #[serde(default)]
    pub resource_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    pub system: String,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub steward: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub schema_version: Option<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, MetadataAttribute>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl DataResource {
    pub fn new(name: impl Into<String>, resource_type: ResourceType, system: impl Into<String>) -> Self {
        Self {
            resource_id: String::new(),
            name: name.into(),
            resource_type,
            system: system.into(),
            path: None,
            description: None,
            owner: None,
            steward: None,
            created_at: None,
            updated_at: None,
            schema_version: None,
            metadata: BTreeMap::new(),
            tags: Vec::new(),
        }
    }
}

/// Directed, typed edge between two resources
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceRelationship {
    #[serde(default)]
    pub relationship_id: String,
    pub source_resource_id: String,
    pub target_resource_id: String,
    #[serde(rename = "type")]
    pub relationship_type: RelationshipType,
    /// 0.0 to 1.0
    #[serde(default = "default_confidence")]
    pub strength: f64,
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_by: String,
}

impl ResourceRelationship {
    pub fn new(
        source_resource_id: impl Into<String>,
        target_resource_id: impl Into<String>,
        relationship_type: RelationshipType,
    ) -> Self {
        Self {
            relationship_id: String::new(),
            source_resource_id: source_resource_id.into(),
            target_resource_id: target_resource_id.into(),
            relationship_type,
            strength: default_confidence(),
            metadata: BTreeMap::new(),
            created_at: None,
            created_by: String::new(),
        }
    }
}

/// Which attributes a rule derives from a matching resource
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetadataExtraction {
    /// `auto_tags` from keywords in the resource name
    #[serde(default)]
    pub tags_from_name: bool,
    /// `classification` from well-known path segments
    #[serde(default)]
    pub classification_from_path: bool,
}

impl MetadataExtraction {
    pub fn extract(&self, resource: &DataResource) -> BTreeMap<String, serde_json::Value> {
        let mut extracted = BTreeMap::new();
        if self.tags_from_name {
            let tags = tags_from_name(&resource.name);
            if !tags.is_empty() {
                extracted.insert("auto_tags".to_string(), tags.into());
            }
        }
        if self.classification_from_path {
            let path = resource.path.as_deref().unwrap_or("");
            extracted.insert("classification".to_string(), classify_path(path).into());
        }
        extracted
    }
}

fn tags_from_name(name: &str) -> Vec<&'static str> {
    let name = name.to_lowercase();
    let mut tags = Vec::new();
    if name.contains("user") {
        tags.push("user-data");
    }
    if name.contains("order") {
        tags.push("transactional");
    }
    if name.contains("log") {
        tags.push("logging");
    }
    if name.contains("temp") || name.contains("tmp") {
        tags.push("temporary");
    }
    tags
}

fn classify_path(path: &str) -> &'static str {
    let path = path.to_lowercase();
    if path.contains("/pii/") || path.contains("/personal/") {
        "pii"
    } else if path.contains("/financial/") || path.contains("/payment/") {
        "financial"
    } else if path.contains("/public/") {
        "public"
    } else {
        "internal"
    }
}

/// Rule applied to resources at registration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataRule {
    #[serde(default)]
    pub rule_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Case-insensitive regex tested against name, path and description
    pub pattern: String,
    #[serde(default)]
    pub metadata_extraction: MetadataExtraction,
    #[serde(default)]
    pub validation_rules: Vec<String>,
    #[serde(default = "default_true")]
    pub active: bool,
    /// Higher runs first
    #[serde(default = "default_priority")]
    pub priority: i32,
    #[serde(default)]
    pub created_by: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

fn default_true() -> bool {
    true
}

fn default_priority() -> i32 {
    5
}

impl MetadataRule {
    pub fn new(name: impl Into<String>, pattern: impl Into<String>, extraction: MetadataExtraction) -> Self {
        Self {
            rule_id: String::new(),
            name: name.into(),
            description: String::new(),
            pattern: pattern.into(),
            metadata_extraction: extraction,
            validation_rules: Vec::new(),
            active: true,
            priority: default_priority(),
            created_by: String::new(),
            created_at: None,
        }
    }
}

/// A resource reached from another through relationships
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelatedResource {
    pub resource: DataResource,
    pub relationship: ResourceRelationship,
    pub depth: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelatedResources {
    pub resource_id: String,
    /// Relationships traversed, in discovery order
    pub relationships: Vec<ResourceRelationship>,
    pub related: Vec<RelatedResource>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentResource {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogSummary {
    pub total_resources: usize,
    pub resources_by_type: BTreeMap<String, usize>,
    pub resources_by_system: BTreeMap<String, usize>,
    pub total_relationships: usize,
    pub relationships_by_type: BTreeMap<String, usize>,
    /// Resources carrying at least one attribute, per type
    pub metadata_coverage: BTreeMap<String, usize>,
    /// Newest first by creation time
    pub recent_additions: Vec<RecentResource>,
}

/// Entry in the per-system catalog document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    pub path: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemCatalog {
    pub resources: Vec<CatalogEntry>,
}

/// Entry in the flat search index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    pub system: String,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub updated_at: DateTime<Utc>,
}

/// Discovers resources in an external system
pub trait ResourceDiscoverer: Send + Sync {
    fn discover(
        &self,
        system: &str,
        connection_config: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<Vec<DataResource>>;
}
