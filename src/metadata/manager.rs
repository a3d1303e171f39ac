//! Metadata manager
//!
//! Document layout:
//!
//! ```text
//! resources/{resource_id}.json
//! relationships/{relationship_id}.json
//! rules/{rule_id}.json
//! catalog/{system}.json           (unsafe characters escaped)
//! search_index/index.json
//! ```

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::Arc;

use chrono::Utc;
use petgraph::Direction;
use regex::{Regex, RegexBuilder};
use tracing::{debug, info, warn};

use super::search::{rank, SearchFilters, SearchResult};
use super::{
    CatalogEntry, CatalogSummary, DataResource, IndexEntry, MetadataAttribute, MetadataRule,
    RecentResource, RelatedResource, RelatedResources, RelationshipType, ResourceDiscoverer,
    ResourceRelationship, SystemCatalog,
};
use crate::checksum::Checksum;
use crate::error::{ArchError, Result};
use crate::graph::IdGraph;
use crate::store::{key, DocumentStore, JsonStoreExt};

const RESOURCES: &str = "resources";
const RELATIONSHIPS: &str = "relationships";
const RULES: &str = "rules";
const CATALOG: &str = "catalog";
const SEARCH_INDEX: &str = "search_index/index.json";

const RECENT_ADDITIONS: usize = 10;

/// Metadata catalog over a document store
pub struct MetadataManager {
    store: Arc<dyn DocumentStore>,
    discoverer: Option<Arc<dyn ResourceDiscoverer>>,
}

impl MetadataManager {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store, discoverer: None }
    }

    pub fn with_discoverer(mut self, discoverer: Arc<dyn ResourceDiscoverer>) -> Self {
        self.discoverer = Some(discoverer);
        self
    }

    // ---- resources ----

    /// Register a resource: apply active rules, store it, then refresh the
    /// search index and the system catalog
    pub fn register_resource(&self, mut resource: DataResource) -> Result<DataResource> {
        if resource.name.is_empty() {
            return Err(ArchError::InvalidInput("Resource name is required".to_string()));
        }
        if resource.system.is_empty() {
            return Err(ArchError::InvalidInput("Resource system is required".to_string()));
        }

        if resource.resource_id.is_empty() {
            resource.resource_id = new_id();
        }
        let now = Utc::now();
        resource.created_at.get_or_insert(now);
        resource.updated_at = Some(now);

        self.apply_metadata_rules(&mut resource)?;
        self.save_resource(&resource)?;
        self.update_catalog(&resource)?;

        info!(resource_id = %resource.resource_id, system = %resource.system, "Resource registered");
        Ok(resource)
    }

    pub fn get_resource(&self, resource_id: &str) -> Result<Option<DataResource>> {
        self.store.read_json(&resource_key(resource_id))
    }

    pub fn list_resources(&self) -> Result<Vec<DataResource>> {
        self.store.load_all(RESOURCES)
    }

    /// Merge attributes into a resource, stamping `last_updated`
    pub fn add_metadata(
        &self,
        resource_id: &str,
        attributes: BTreeMap<String, MetadataAttribute>,
    ) -> Result<DataResource> {
        let mut resource = self
            .get_resource(resource_id)?
            .ok_or_else(|| ArchError::not_found("resource", resource_id))?;

        let now = Utc::now();
        for (name, mut attribute) in attributes {
            attribute.last_updated.get_or_insert(now);
            resource.metadata.insert(name, attribute);
        }
        resource.updated_at = Some(now);

        self.save_resource(&resource)?;
        info!(resource_id = %resource_id, "Metadata added");
        Ok(resource)
    }

    fn save_resource(&self, resource: &DataResource) -> Result<()> {
        self.store.write_json(&resource_key(&resource.resource_id), resource)?;
        self.update_search_index(resource)
    }

    pub fn search_resources(
        &self,
        query: &str,
        filters: &SearchFilters,
        limit: usize,
    ) -> Result<Vec<SearchResult>> {
        let results = rank(self.list_resources()?, query, filters, limit);
        debug!(query = %query, hits = results.len(), "Catalog search");
        Ok(results)
    }

    // ---- relationships ----

    /// Store a relationship; both endpoints must already be registered
    pub fn add_relationship(&self, mut relationship: ResourceRelationship) -> Result<ResourceRelationship> {
        if relationship.source_resource_id.is_empty() || relationship.target_resource_id.is_empty() {
            return Err(ArchError::InvalidInput(
                "Source and target resource IDs are required".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&relationship.strength) {
            return Err(ArchError::InvalidInput(format!(
                "relationship strength must be between 0 and 1, got {}",
                relationship.strength
            )));
        }
        for endpoint in [&relationship.source_resource_id, &relationship.target_resource_id] {
            if !self.store.exists(&resource_key(endpoint)) {
                return Err(ArchError::not_found("resource", endpoint.as_str()));
            }
        }

        if relationship.relationship_id.is_empty() {
            relationship.relationship_id = new_id();
        }
        relationship.created_at.get_or_insert_with(Utc::now);

        self.store.write_json(
            &key(RELATIONSHIPS, &format!("{}.json", relationship.relationship_id)),
            &relationship,
        )?;
        info!(
            relationship_id = %relationship.relationship_id,
            relationship_type = %relationship.relationship_type,
            "Relationship added"
        );
        Ok(relationship)
    }

    pub fn list_relationships(&self) -> Result<Vec<ResourceRelationship>> {
        self.store.load_all(RELATIONSHIPS)
    }

    /// Resources within `depth` hops in either direction, optionally only
    /// through the given relationship types
    pub fn get_related_resources(
        &self,
        resource_id: &str,
        relationship_types: Option<&[RelationshipType]>,
        depth: usize,
    ) -> Result<RelatedResources> {
        if !self.store.exists(&resource_key(resource_id)) {
            return Err(ArchError::not_found("resource", resource_id));
        }
        let relationships = self.list_relationships()?;

        let mut graph: IdGraph<usize> = IdGraph::new();
        graph.add_node(resource_id);
        for rel in &relationships {
            graph.add_node(&rel.source_resource_id);
            graph.add_node(&rel.target_resource_id);
        }
        for (i, rel) in relationships.iter().enumerate() {
            graph.add_edge(&rel.source_resource_id, &rel.target_resource_id, i);
        }

        let follow = |&i: &usize| {
            relationship_types.map_or(true, |types| types.contains(&relationships[i].relationship_type))
        };

        let mut related = RelatedResources {
            resource_id: resource_id.to_string(),
            relationships: Vec::new(),
            related: Vec::new(),
        };
        for hop in graph.walk(
            resource_id,
            &[Direction::Outgoing, Direction::Incoming],
            Some(depth),
            follow,
        ) {
            let relationship = relationships[*hop.via].clone();
            related.relationships.push(relationship.clone());
            match self.get_resource(hop.id)? {
                Some(resource) => related.related.push(RelatedResource {
                    resource,
                    relationship,
                    depth: hop.depth,
                }),
                None => warn!(resource_id = %hop.id, "Relationship points at a missing resource"),
            }
        }
        Ok(related)
    }

    // ---- rules ----

    /// Store an extraction rule; the pattern must be a valid regex
    pub fn create_metadata_rule(&self, mut rule: MetadataRule) -> Result<MetadataRule> {
        if rule.name.is_empty() || rule.pattern.is_empty() {
            return Err(ArchError::InvalidInput("Rule name and pattern are required".to_string()));
        }
        Regex::new(&rule.pattern)?;

        if rule.rule_id.is_empty() {
            rule.rule_id = new_id();
        }
        rule.created_at.get_or_insert_with(Utc::now);
        self.store
            .write_json(&key(RULES, &format!("{}.json", rule.rule_id)), &rule)?;

        info!(rule_id = %rule.rule_id, "Metadata rule created");
        Ok(rule)
    }

    /// Create a rule with a fixed id unless it is already stored
    pub fn ensure_metadata_rule(&self, rule: MetadataRule) -> Result<bool> {
        if !rule.rule_id.is_empty() && self.store.exists(&key(RULES, &format!("{}.json", rule.rule_id))) {
            return Ok(false);
        }
        self.create_metadata_rule(rule)?;
        Ok(true)
    }

    /// Rules by descending priority
    pub fn list_metadata_rules(&self) -> Result<Vec<MetadataRule>> {
        let mut rules: Vec<MetadataRule> = self.store.load_all(RULES)?;
        rules.sort_by(|a, b| b.priority.cmp(&a.priority));
        Ok(rules)
    }

    /// Existing attributes are never overwritten by a rule
    fn apply_metadata_rules(&self, resource: &mut DataResource) -> Result<()> {
        for rule in self.list_metadata_rules()?.into_iter().filter(|r| r.active) {
            let pattern = match RegexBuilder::new(&rule.pattern).case_insensitive(true).build() {
                Ok(pattern) => pattern,
                Err(e) => {
                    warn!(rule_id = %rule.rule_id, error = %e, "Skipping rule with invalid pattern");
                    continue;
                }
            };
            let matches = pattern.is_match(&resource.name)
                || resource.path.as_deref().is_some_and(|p| pattern.is_match(p))
                || resource.description.as_deref().is_some_and(|d| pattern.is_match(d));
            if !matches {
                continue;
            }

            let extracted = rule.metadata_extraction.extract(resource);
            for (name, value) in extracted {
                resource.metadata.entry(name.clone()).or_insert_with(|| MetadataAttribute {
                    source: Some(format!("rule:{}", rule.rule_id)),
                    last_updated: Some(Utc::now()),
                    ..MetadataAttribute::new(name, value)
                });
            }
        }
        Ok(())
    }

    // ---- catalog ----

    fn update_search_index(&self, resource: &DataResource) -> Result<()> {
        let mut index: BTreeMap<String, IndexEntry> =
            self.store.read_json(SEARCH_INDEX)?.unwrap_or_default();
        index.insert(
            resource.resource_id.clone(),
            IndexEntry {
                name: resource.name.clone(),
                resource_type: resource.resource_type,
                system: resource.system.clone(),
                description: resource.description.clone(),
                tags: resource.tags.clone(),
                updated_at: Utc::now(),
            },
        );
        self.store.write_json(SEARCH_INDEX, &index)
    }

    /// The flat id-keyed search index
    pub fn search_index(&self) -> Result<BTreeMap<String, IndexEntry>> {
        Ok(self.store.read_json(SEARCH_INDEX)?.unwrap_or_default())
    }

    fn update_catalog(&self, resource: &DataResource) -> Result<()> {
        let catalog_key = catalog_key(&resource.system);
        let mut catalog: SystemCatalog = self.store.read_json(&catalog_key)?.unwrap_or_default();
        catalog.resources.retain(|entry| entry.id != resource.resource_id);
        catalog.resources.push(CatalogEntry {
            id: resource.resource_id.clone(),
            name: resource.name.clone(),
            resource_type: resource.resource_type,
            path: resource.path.clone(),
            updated_at: Utc::now(),
        });
        self.store.write_json(&catalog_key, &catalog)
    }

    pub fn get_system_catalog(&self, system: &str) -> Result<SystemCatalog> {
        Ok(self.store.read_json(&catalog_key(system))?.unwrap_or_default())
    }

    pub fn get_catalog_summary(&self) -> Result<CatalogSummary> {
        let mut resources = self.list_resources()?;
        let relationships = self.list_relationships()?;
        let mut summary = CatalogSummary {
            total_resources: resources.len(),
            total_relationships: relationships.len(),
            ..Default::default()
        };

        for resource in &resources {
            let type_name = resource.resource_type.as_str().to_string();
            *summary.resources_by_system.entry(resource.system.clone()).or_default() += 1;
            if !resource.metadata.is_empty() {
                *summary.metadata_coverage.entry(type_name.clone()).or_default() += 1;
            }
            *summary.resources_by_type.entry(type_name).or_default() += 1;
        }
        for rel in &relationships {
            *summary
                .relationships_by_type
                .entry(rel.relationship_type.as_str().to_string())
                .or_default() += 1;
        }

        resources.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        summary.recent_additions = resources
            .into_iter()
            .take(RECENT_ADDITIONS)
            .map(|r| RecentResource {
                id: r.resource_id,
                name: r.name,
                resource_type: r.resource_type,
                created_at: r.created_at,
            })
            .collect();

        Ok(summary)
    }

    /// Discover and register resources through the configured discoverer
    pub fn discover_resources(
        &self,
        system: &str,
        connection_config: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<Vec<DataResource>> {
        let discoverer = self
            .discoverer
            .as_ref()
            .ok_or_else(|| ArchError::CapabilityMissing("resource discoverer".to_string()))?;

        let discovered = discoverer
            .discover(system, connection_config)?
            .into_iter()
            .map(|resource| self.register_resource(resource))
            .collect::<Result<Vec<_>>>()?;

        info!(system = %system, discovered = discovered.len(), "Resources discovered");
        Ok(discovered)
    }

    /// Markdown page for one resource
    pub fn generate_documentation(&self, resource_id: &str) -> Result<String> {
        let resource = self
            .get_resource(resource_id)?
            .ok_or_else(|| ArchError::not_found("resource", resource_id))?;

        let related = self.get_related_resources(resource_id, None, 1)?;

        let mut doc = String::new();
        render_documentation(&resource, &related, &mut doc)
            .map_err(|e| ArchError::Internal(format!("rendering documentation: {e}")))?;
        Ok(doc)
    }
}

fn render_documentation(
    resource: &DataResource,
    related: &RelatedResources,
    doc: &mut String,
) -> std::fmt::Result {
    writeln!(doc, "# {}\n", resource.name)?;
    if let Some(description) = &resource.description {
        writeln!(doc, "**Description:** {description}\n")?;
    }
    writeln!(doc, "**Type:** {}", resource.resource_type)?;
    writeln!(doc, "**System:** {}", resource.system)?;
    if let Some(owner) = &resource.owner {
        writeln!(doc, "**Owner:** {owner}")?;
    }
    if let Some(steward) = &resource.steward {
        writeln!(doc, "**Steward:** {steward}")?;
    }
    doc.push('\n');

    if !resource.metadata.is_empty() {
        doc.push_str("## Metadata\n\n");
        for (name, attribute) in &resource.metadata {
            writeln!(doc, "**{name}:** {}", attribute.value_text())?;
            if let Some(description) = &attribute.description {
                writeln!(doc, "  - {description}")?;
            }
            doc.push('\n');
        }
    }

    if !related.related.is_empty() {
        doc.push_str("## Relationships\n\n");
        for r in &related.related {
            let arrow = if r.relationship.source_resource_id == resource.resource_id {
                "->"
            } else {
                "<-"
            };
            writeln!(
                doc,
                "- **{}** {arrow} {}",
                r.relationship.relationship_type, r.resource.name
            )?;
        }
        doc.push('\n');
    }

    if !resource.tags.is_empty() {
        writeln!(doc, "## Tags\n\n{}\n", resource.tags.join(", "))?;
    }

    doc.push_str("## Timestamps\n\n");
    if let Some(created_at) = resource.created_at {
        writeln!(doc, "**Created:** {}", created_at.to_rfc3339())?;
    }
    if let Some(updated_at) = resource.updated_at {
        writeln!(doc, "**Updated:** {}", updated_at.to_rfc3339())?;
    }
    Ok(())
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn resource_key(resource_id: &str) -> String {
    key(RESOURCES, &format!("{resource_id}.json"))
}

fn catalog_key(system: &str) -> String {
    key(CATALOG, &format!("{}.json", catalog_file_stem(system)))
}

/// Systems such as `s3://lake` are not valid key segments. Unsafe characters
/// become `_` and a hash of the full name keeps distinct systems apart.
fn catalog_file_stem(system: &str) -> String {
    let is_safe = |c: char| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-');
    if system.chars().all(is_safe) && !system.starts_with('.') {
        return system.to_string();
    }
    let readable: String = system.chars().map(|c| if is_safe(c) { c } else { '_' }).collect();
    format!("{readable}_{}", Checksum::of_label(system).prefix(12))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{MetadataExtraction, ResourceType};
    use crate::store::MemoryStore;
    use serde_json::json;

    fn manager() -> MetadataManager {
        MetadataManager::new(Arc::new(MemoryStore::new()))
    }

    fn register(m: &MetadataManager, name: &str, system: &str) -> DataResource {
        m.register_resource(DataResource::new(name, ResourceType::Table, system))
            .unwrap()
    }

    #[test]
    fn test_register_updates_index_and_catalog() {
        let m = manager();
        let orders = register(&m, "orders", "warehouse");
        assert!(!orders.resource_id.is_empty());
        assert!(orders.created_at.is_some());

        let index = m.search_index().unwrap();
        assert_eq!(index[&orders.resource_id].name, "orders");

        // Re-registering replaces the catalog entry
        m.register_resource(orders.clone()).unwrap();
        let catalog = m.get_system_catalog("warehouse").unwrap();
        assert_eq!(catalog.resources.len(), 1);

        assert!(m
            .register_resource(DataResource::new("x", ResourceType::Table, ""))
            .is_err());
    }

    #[test]
    fn test_url_like_system_gets_its_own_catalog() {
        let m = manager();
        let events = register(&m, "events", "s3://lake");
        let logs = register(&m, "logs", "s3:__lake");

        assert_eq!(m.list_resources().unwrap().len(), 2);
        let lake = m.get_system_catalog("s3://lake").unwrap();
        assert_eq!(lake.resources.len(), 1);
        assert_eq!(lake.resources[0].id, events.resource_id);
        assert_eq!(m.get_system_catalog("s3:__lake").unwrap().resources[0].id, logs.resource_id);

        assert_eq!(catalog_file_stem("warehouse"), "warehouse");
        assert_ne!(catalog_file_stem(".."), "..");
        assert_ne!(catalog_file_stem("s3://lake"), catalog_file_stem("s3:__lake"));
    }

    #[test]
    fn test_rules_apply_by_priority_without_overwriting() {
        let m = manager();
        let mut tags = MetadataRule::new(
            "tags",
            "^user",
            MetadataExtraction {
                tags_from_name: true,
                classification_from_path: false,
            },
        );
        tags.rule_id = "tags".to_string();
        m.create_metadata_rule(tags).unwrap();

        let mut inactive = MetadataRule::new(
            "paths",
            ".*",
            MetadataExtraction {
                tags_from_name: false,
                classification_from_path: true,
            },
        );
        inactive.active = false;
        m.create_metadata_rule(inactive).unwrap();

        let mut users = DataResource::new("USER_accounts", ResourceType::Table, "pg");
        users.metadata.insert(
            "classification".to_string(),
            MetadataAttribute::new("classification", "restricted"),
        );
        let users = m.register_resource(users).unwrap();
        assert_eq!(users.metadata["auto_tags"].value, json!(["user-data"]));
        assert_eq!(users.metadata["auto_tags"].source.as_deref(), Some("rule:tags"));
        assert_eq!(users.metadata["classification"].value, "restricted");

        let events = register(&m, "events", "pg");
        assert!(events.metadata.is_empty());

        assert!(m
            .create_metadata_rule(MetadataRule::new("bad", "(", MetadataExtraction::default()))
            .is_err());
    }

    #[test]
    fn test_ensure_rule_is_idempotent() {
        let m = manager();
        let mut rule = MetadataRule::new("seed", "tmp", MetadataExtraction::default());
        rule.rule_id = "seed".to_string();
        assert!(m.ensure_metadata_rule(rule.clone()).unwrap());
        assert!(!m.ensure_metadata_rule(rule).unwrap());
        assert_eq!(m.list_metadata_rules().unwrap().len(), 1);
    }

    #[test]
    fn test_relationships_and_related_resources() {
        let m = manager();
        let raw = register(&m, "orders_raw", "pg");
        let stg = register(&m, "orders_stg", "warehouse");
        let mart = register(&m, "orders_mart", "warehouse");

        m.add_relationship(ResourceRelationship::new(
            &stg.resource_id,
            &raw.resource_id,
            RelationshipType::DerivesFrom,
        ))
        .unwrap();
        m.add_relationship(ResourceRelationship::new(
            &mart.resource_id,
            &stg.resource_id,
            RelationshipType::DependsOn,
        ))
        .unwrap();

        let missing = ResourceRelationship::new(&raw.resource_id, "ghost", RelationshipType::Uses);
        assert!(m.add_relationship(missing).unwrap_err().is_not_found());

        let direct = m.get_related_resources(&raw.resource_id, None, 1).unwrap();
        assert_eq!(direct.related.len(), 1);
        assert_eq!(direct.related[0].resource.name, "orders_stg");

        let deep = m.get_related_resources(&raw.resource_id, None, 2).unwrap();
        assert_eq!(deep.related.len(), 2);
        assert_eq!(deep.related[1].depth, 2);

        let filtered = m
            .get_related_resources(&raw.resource_id, Some(&[RelationshipType::DependsOn]), 3)
            .unwrap();
        assert!(filtered.related.is_empty());
    }

    #[test]
    fn test_related_resources_terminate_on_cycles() {
        let m = manager();
        let a = register(&m, "a", "s");
        let b = register(&m, "b", "s");
        m.add_relationship(ResourceRelationship::new(&a.resource_id, &b.resource_id, RelationshipType::Uses))
            .unwrap();
        m.add_relationship(ResourceRelationship::new(&b.resource_id, &a.resource_id, RelationshipType::Uses))
            .unwrap();

        let related = m.get_related_resources(&a.resource_id, None, 10).unwrap();
        assert_eq!(related.related.len(), 1);
    }

    #[test]
    fn test_add_metadata_and_documentation() {
        let m = manager();
        let mut orders = DataResource::new("orders", ResourceType::Table, "warehouse");
        orders.description = Some("Customer orders".to_string());
        orders.tags = vec!["sales".to_string()];
        let orders = m.register_resource(orders).unwrap();

        let mut attrs = BTreeMap::new();
        attrs.insert("row_count".to_string(), MetadataAttribute::new("row_count", 42));
        let updated = m.add_metadata(&orders.resource_id, attrs).unwrap();
        assert!(updated.metadata["row_count"].last_updated.is_some());

        let doc = m.generate_documentation(&orders.resource_id).unwrap();
        assert!(doc.starts_with("# orders\n"));
        assert!(doc.contains("**Description:** Customer orders"));
        assert!(doc.contains("**row_count:** 42"));
        assert!(doc.contains("## Tags\n\nsales"));

        assert!(m.add_metadata("nope", BTreeMap::new()).unwrap_err().is_not_found());
    }

    #[test]
    fn test_search_through_manager() {
        let m = manager();
        let mut orders = DataResource::new("user_orders", ResourceType::Table, "warehouse");
        orders.description = Some("Customer order history".to_string());
        m.register_resource(orders).unwrap();
        let mut tagged = DataResource::new("shipments", ResourceType::Table, "warehouse");
        tagged.tags = vec!["order".to_string()];
        m.register_resource(tagged).unwrap();

        let results = m.search_resources("order", &SearchFilters::default(), 20).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].score, 15.0);
        assert_eq!(results[1].score, 3.0);
    }

    #[test]
    fn test_catalog_summary() {
        let m = manager();
        let a = register(&m, "a", "pg");
        let b = register(&m, "b", "s3");
        m.add_relationship(ResourceRelationship::new(&a.resource_id, &b.resource_id, RelationshipType::Contains))
            .unwrap();

        let summary = m.get_catalog_summary().unwrap();
        assert_eq!(summary.total_resources, 2);
        assert_eq!(summary.resources_by_type["table"], 2);
        assert_eq!(summary.resources_by_system["s3"], 1);
        assert_eq!(summary.relationships_by_type["contains"], 1);
        assert_eq!(summary.recent_additions.len(), 2);
    }

    struct FixedDiscoverer;

    impl ResourceDiscoverer for FixedDiscoverer {
        fn discover(
            &self,
            system: &str,
            _config: &serde_json::Map<String, serde_json::Value>,
        ) -> Result<Vec<DataResource>> {
            Ok(vec![DataResource::new("users", ResourceType::Table, system)])
        }
    }

    #[test]
    fn test_discovery_requires_discoverer() {
        let m = manager();
        let config = serde_json::Map::new();
        assert!(matches!(
            m.discover_resources("postgresql", &config),
            Err(ArchError::CapabilityMissing(_))
        ));

        let m = m.with_discoverer(Arc::new(FixedDiscoverer));
        let found = m.discover_resources("postgresql", &config).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(m.list_resources().unwrap().len(), 1);
    }
}
