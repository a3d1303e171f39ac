//! Orchestrator workflows across all managers

use std::sync::Arc;

use data_architecture::governance::{
    ComplianceCheckRunner, ComplianceFramework, ComplianceOutcome, ComplianceRule, QualityCheckRunner,
    QualityOutcome, QualityRule,
};
use data_architecture::integration::{DataConnector, DataSourceType, JobStatus, Record};
use data_architecture::metadata::{DataResource, ResourceDiscoverer, ResourceType};
use data_architecture::orchestrator::{ComplianceStatus, StepOutcome};
use data_architecture::{ArchError, ArchitectureConfig, DataArchitectureOrchestrator, DomainConfig, Result};
use serde_json::json;
use tempfile::tempdir;

struct Scored(f64);

impl QualityCheckRunner for Scored {
    fn run(&self, _rule: &QualityRule) -> Result<QualityOutcome> {
        Ok(QualityOutcome {
            passed: self.0 >= 0.8,
            score: self.0,
            records_checked: 100,
            records_failed: ((1.0 - self.0) * 100.0) as u64,
            details: json!({}),
            recommendations: Vec::new(),
        })
    }
}

/// Fails every GDPR rule
struct StrictGdpr;

impl ComplianceCheckRunner for StrictGdpr {
    fn check(&self, rule: &ComplianceRule) -> Result<ComplianceOutcome> {
        Ok(ComplianceOutcome {
            passed: rule.framework != ComplianceFramework::Gdpr,
            details: format!("checked {}", rule.name),
        })
    }
}

struct Rows;

impl DataConnector for Rows {
    fn connect(&mut self, _config: &serde_json::Map<String, serde_json::Value>) -> Result<()> {
        Ok(())
    }
    fn extract(&mut self, _query: Option<&str>) -> Result<Vec<Record>> {
        Ok(vec![json!({"id": "a1", "amount": 10}).as_object().cloned().unwrap()])
    }
    fn load(&mut self, records: &[Record]) -> Result<usize> {
        Ok(records.len())
    }
    fn disconnect(&mut self) {}
}

struct TwoTables;

impl ResourceDiscoverer for TwoTables {
    fn discover(
        &self,
        system: &str,
        _connection_config: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<Vec<DataResource>> {
        Ok(["orders", "user_accounts"]
            .into_iter()
            .map(|name| DataResource::new(name, ResourceType::Table, system))
            .collect())
    }
}

fn orders_domain() -> DomainConfig {
    serde_json::from_value(json!({
        "description": "Customer orders",
        "business_owner": "sales",
        "technical_owner": "data-eng",
        "tags": ["sales"],
        "schema": {
            "type": "relational",
            "fields": [
                { "name": "id", "data_type": "UUID", "nullable": false, "primary_key": true, "description": "Order id" },
                { "name": "amount", "data_type": "DECIMAL", "description": "Order total" }
            ],
            "indexes": [{ "name": "orders_pk", "fields": ["id"], "unique": true }]
        },
        "access": { "principals": ["analyst"], "levels": ["read", "write"] },
        "quality_rules": [
            { "name": "amount_present", "type": "not_null", "field": "amount", "severity": "high" }
        ],
        "metadata": { "cost_center": "cc-42" },
        "integration": {
            "pattern": "etl",
            "source": { "type": "relational_db" },
            "target": { "type": "data_warehouse" }
        }
    }))
    .unwrap()
}

fn orchestrator(dir: &std::path::Path) -> DataArchitectureOrchestrator {
    let mut config = ArchitectureConfig::at(dir);
    config.compliance_frameworks = vec!["GDPR".to_string(), "HIPAA".to_string()];
    let orchestrator = DataArchitectureOrchestrator::new(config)
        .unwrap()
        .with_quality_runner(Arc::new(Scored(0.9)));
    let integration = orchestrator.integration().unwrap();
    integration
        .register_connector(DataSourceType::RelationalDb, || Box::new(Rows))
        .unwrap();
    integration
        .register_connector(DataSourceType::DataWarehouse, || Box::new(Rows))
        .unwrap();
    orchestrator
}

#[test]
fn test_domain_from_json_config() {
    let dir = tempdir().unwrap();
    let orchestrator = orchestrator(dir.path());

    let report = orchestrator.create_data_domain("orders", &orders_domain()).unwrap();
    assert!(report.schema.valid);
    let StepOutcome::Completed { ids } = &report.governance else {
        panic!("governance step did not complete: {:?}", report.governance);
    };
    assert_eq!(ids.len(), 2);
    let StepOutcome::Completed { ids: job_ids } = &report.integration else {
        panic!("integration step did not complete: {:?}", report.integration);
    };

    let integration = orchestrator.integration().unwrap();
    let job = integration.get_job(&job_ids[0]).unwrap().unwrap();
    assert_eq!(job.name, "orders_integration");
    assert_eq!(job.source_configs[0].name, "orders_source");
    let result = integration.execute_integration_job(&job.job_id).unwrap();
    assert_eq!(result.status, JobStatus::Success);
    assert_eq!(result.records_inserted, 1);

    let governance = orchestrator.governance().unwrap();
    let results = governance.execute_quality_checks(Some("orders")).unwrap();
    assert_eq!(results.len(), 1);

    let assessment = orchestrator.run_quality_assessment("all").unwrap();
    let components = &assessment.components;
    assert!((components["schemas"].score.unwrap() - 1.0).abs() < 1e-9);
    assert!((components["governance"].score.unwrap() - 0.9).abs() < 1e-9);
    assert_eq!(components["integration"].score, Some(1.0));
    assert_eq!(components["metadata"].score, Some(1.0));
    assert!(assessment.recommendations.is_empty());
}

#[test]
fn test_unknown_rule_type_is_rejected() {
    let bad = json!({ "quality_rules": [{ "name": "x", "type": "vibes" }] });
    assert!(serde_json::from_value::<DomainConfig>(bad).is_err());
}

#[test]
fn test_compliance_audit_reports_violations() {
    let dir = tempdir().unwrap();
    let orchestrator = orchestrator(dir.path()).with_compliance_runner(Arc::new(StrictGdpr));
    orchestrator.create_data_domain("orders", &orders_domain()).unwrap();

    let audit = orchestrator.run_compliance_audit(None).unwrap();
    assert_eq!(audit.overall_status, ComplianceStatus::NonCompliant);
    assert_eq!(audit.violations.len(), 1);
    assert_eq!(audit.violations[0].rule_id, "default_gdpr_rule");
    assert_eq!(audit.framework_results["hipaa"].passed, 1);
    assert_eq!(audit.recommendations.len(), 3);

    // Rules just checked are not due again
    let again = orchestrator.run_compliance_audit(Some(&[ComplianceFramework::Gdpr])).unwrap();
    assert_eq!(again.overall_status, ComplianceStatus::Compliant);
    assert_eq!(again.framework_results["gdpr"].not_due, 1);
}

#[test]
fn test_register_system_discovers_resources() {
    let dir = tempdir().unwrap();
    let orchestrator = orchestrator(dir.path());

    assert!(matches!(
        orchestrator.register_system("shop_db", &serde_json::Map::new()),
        Err(ArchError::CapabilityMissing(_))
    ));

    let orchestrator = orchestrator.with_discoverer(Arc::new(TwoTables));
    let discovered = orchestrator.register_system("shop_db", &serde_json::Map::new()).unwrap();
    assert_eq!(discovered.len(), 2);

    let users = discovered.iter().find(|r| r.name == "user_accounts").unwrap();
    assert_eq!(users.metadata["auto_tags"].value, json!(["user-data"]));
    assert_eq!(users.metadata["classification"].value, "internal");

    let status = orchestrator.get_architecture_status().unwrap();
    assert_eq!(status.metadata_resources, 2);
    assert_eq!(status.schemas_count, 0);
}

#[test]
fn test_documentation_lists_domains() {
    let dir = tempdir().unwrap();
    let orchestrator = orchestrator(dir.path());
    orchestrator.create_data_domain("orders", &orders_domain()).unwrap();

    let doc = orchestrator.generate_architecture_documentation().unwrap();
    assert!(doc.starts_with("# Data Architecture Documentation"));
    assert!(doc.contains("### orders"));
    assert!(doc.contains("- **Integration Jobs:** 1"));
    assert!(doc.contains("- HIPAA"));
    assert_eq!(
        std::fs::read_to_string(dir.path().join("architecture_documentation.md")).unwrap(),
        doc
    );
}

#[test]
fn test_domain_on_url_system_is_cataloged() {
    let dir = tempdir().unwrap();
    let orchestrator = orchestrator(dir.path());
    let mut domain = orders_domain();
    domain.system = Some("s3://lake".to_string());

    let report = orchestrator.create_data_domain("orders", &domain).unwrap();
    assert!(matches!(report.metadata, StepOutcome::Completed { .. }), "{:?}", report.metadata);

    let metadata = orchestrator.metadata().unwrap();
    assert_eq!(metadata.get_system_catalog("s3://lake").unwrap().resources.len(), 1);
}
