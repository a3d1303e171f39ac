//! Metadata catalog over a filesystem store

use std::collections::BTreeMap;
use std::sync::Arc;

use data_architecture::metadata::{
    CatalogSummary, DataResource, MetadataAttribute, MetadataExtraction, MetadataRule,
    RelationshipType, ResourceRelationship, ResourceType, SearchFilters,
};
use data_architecture::{FsStore, MetadataManager};
use tempfile::tempdir;

fn resource(name: &str, system: &str, description: Option<&str>) -> DataResource {
    let mut r = DataResource::new(name, ResourceType::Table, system);
    r.description = description.map(str::to_string);
    r
}

#[test]
fn test_catalog_is_searchable_after_reopen() {
    let dir = tempdir().unwrap();
    {
        let catalog = MetadataManager::new(Arc::new(FsStore::open(dir.path()).unwrap()));
        catalog
            .register_resource(resource("customer_orders", "warehouse", Some("Orders placed by customers")))
            .unwrap();
        catalog
            .register_resource(resource("payments", "billing", Some("Settled order payments")))
            .unwrap();
        catalog.register_resource(resource("audit_log", "billing", None)).unwrap();
    }

    let catalog = MetadataManager::new(Arc::new(FsStore::open(dir.path()).unwrap()));
    let results = catalog.search_resources("order", &SearchFilters::default(), 10).unwrap();
    let names: Vec<&str> = results.iter().map(|r| r.resource.name.as_str()).collect();
    assert_eq!(names, vec!["customer_orders", "payments"]);
    assert_eq!(results[0].score, 15.0);
    assert_eq!(results[1].matching_fields, vec!["description"]);

    let billing = SearchFilters {
        system: Some("billing".to_string()),
        ..Default::default()
    };
    let results = catalog.search_resources("log", &billing, 10).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].snippet, "table in billing");

    assert_eq!(catalog.get_system_catalog("billing").unwrap().resources.len(), 2);
    assert_eq!(catalog.search_index().unwrap().len(), 3);
}

#[test]
fn test_rules_apply_at_registration() {
    let dir = tempdir().unwrap();
    let catalog = MetadataManager::new(Arc::new(FsStore::open(dir.path()).unwrap()));

    let mut rule = MetadataRule::new(
        "classify",
        "user",
        MetadataExtraction {
            tags_from_name: true,
            classification_from_path: true,
        },
    );
    rule.priority = 9;
    catalog.create_metadata_rule(rule).unwrap();

    let mut users = resource("user_profiles", "crm", None);
    users.path = Some("/data/pii/user_profiles".to_string());
    users.metadata.insert(
        "classification".to_string(),
        MetadataAttribute::new("classification", "restricted"),
    );
    let users = catalog.register_resource(users).unwrap();

    assert_eq!(users.metadata["auto_tags"].value, serde_json::json!(["user-data"]));
    // Caller-supplied attributes win over extracted ones
    assert_eq!(users.metadata["classification"].value, "restricted");

    let untouched = catalog.register_resource(resource("invoices", "crm", None)).unwrap();
    assert!(untouched.metadata.is_empty());
}

#[test]
fn test_relationships_and_documentation() {
    let dir = tempdir().unwrap();
    let catalog = MetadataManager::new(Arc::new(FsStore::open(dir.path()).unwrap()));

    let raw = catalog.register_resource(resource("raw_events", "lake", None)).unwrap();
    let clean = catalog.register_resource(resource("clean_events", "lake", None)).unwrap();
    let report = catalog.register_resource(resource("daily_report", "bi", None)).unwrap();

    catalog
        .add_relationship(ResourceRelationship::new(
            &clean.resource_id,
            &raw.resource_id,
            RelationshipType::DerivesFrom,
        ))
        .unwrap();
    catalog
        .add_relationship(ResourceRelationship::new(
            &report.resource_id,
            &clean.resource_id,
            RelationshipType::DependsOn,
        ))
        .unwrap();

    let near = catalog.get_related_resources(&raw.resource_id, None, 1).unwrap();
    assert_eq!(near.related.len(), 1);
    assert_eq!(near.related[0].resource.name, "clean_events");

    let far = catalog.get_related_resources(&raw.resource_id, None, 2).unwrap();
    assert_eq!(far.related.len(), 2);
    assert_eq!(far.related[1].depth, 2);

    let only_derived = catalog
        .get_related_resources(&raw.resource_id, Some(&[RelationshipType::DerivesFrom]), 5)
        .unwrap();
    assert_eq!(only_derived.related.len(), 1);

    catalog
        .add_metadata(
            &clean.resource_id,
            BTreeMap::from([("owner_team".to_string(), MetadataAttribute::new("owner_team", "platform"))]),
        )
        .unwrap();
    let doc = catalog.generate_documentation(&clean.resource_id).unwrap();
    assert!(doc.starts_with("# clean_events"));
    assert!(doc.contains("**owner_team:** platform"));
    assert!(doc.contains("- **derives_from** -> raw_events"));
    assert!(doc.contains("- **depends_on** <- daily_report"));

    let summary: CatalogSummary = catalog.get_catalog_summary().unwrap();
    assert_eq!(summary.total_resources, 3);
    assert_eq!(summary.total_relationships, 2);
    assert_eq!(summary.resources_by_system["lake"], 2);
    assert_eq!(summary.metadata_coverage["table"], 1);
}

#[test]
fn test_relationship_endpoints_must_exist() {
    let dir = tempdir().unwrap();
    let catalog = MetadataManager::new(Arc::new(FsStore::open(dir.path()).unwrap()));
    let raw = catalog.register_resource(resource("raw_events", "lake", None)).unwrap();

    let err = catalog
        .add_relationship(ResourceRelationship::new(&raw.resource_id, "ghost", RelationshipType::Uses))
        .unwrap_err();
    assert!(err.is_not_found());
    assert!(catalog.get_related_resources("ghost", None, 1).unwrap_err().is_not_found());
}

#[test]
fn test_url_systems_are_cataloged_on_disk() {
    let dir = tempdir().unwrap();
    let catalog = MetadataManager::new(Arc::new(FsStore::open(dir.path()).unwrap()));

    let events = catalog
        .register_resource(resource("events", "s3://lake/raw", Some("Raw click events")))
        .unwrap();
    let system_catalog = catalog.get_system_catalog("s3://lake/raw").unwrap();
    assert_eq!(system_catalog.resources.len(), 1);
    assert_eq!(system_catalog.resources[0].id, events.resource_id);

    let files: Vec<_> = std::fs::read_dir(dir.path().join("catalog")).unwrap().collect();
    assert_eq!(files.len(), 1);
    let results = catalog.search_resources("click", &SearchFilters::default(), 10).unwrap();
    assert_eq!(results[0].resource.system, "s3://lake/raw");
}
