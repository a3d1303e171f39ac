//! Data architecture orchestrator
//!
//! Owns one manager per concern, each on its own store under the configured
//! base path:
//!
//! ```text
//! {base_path}/
//! ├── schemas/
//! ├── governance/
//! ├── integration/
//! ├── metadata/
//! ├── reports/
//! └── architecture_documentation.md
//! ```

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::ArchitectureConfig;
use crate::error::{ArchError, Result};
use crate::governance::{
    AccessLevel, AccessPolicy, ComplianceCheck, ComplianceCheckRunner, ComplianceFramework,
    ComplianceRule, ComplianceRunReport, GovernanceCounts, GovernanceManager, QualityCheckRunner,
    QualityRule, QualityRuleType, Severity,
};
use crate::integration::{
    ConnectorRegistry, DataFormat, DataSource, DataSourceType, IntegrationCounts, IntegrationJob,
    IntegrationManager, IntegrationPattern, JobStatus, TransformationEngine,
};
use crate::metadata::{
    DataResource, MetadataAttribute, MetadataExtraction, MetadataManager, MetadataRule,
    ResourceDiscoverer, ResourceType, SearchFilters,
};
use crate::schema::{
    DataClassification, Schema, SchemaField, SchemaIndex, SchemaManager, SchemaType,
    ValidationReport,
};
use crate::store::{DocumentStore, FsStore, JsonStoreExt};

const REPORTS: &str = "reports";
const DOCUMENTATION: &str = "architecture_documentation.md";
const DOMAIN_SCHEMA_VERSION: &str = "1.0.0";
const SYSTEM_USER: &str = "system";

/// Applies a schema to a target system
pub trait SchemaDeployer: Send + Sync {
    /// Deploy and return a human-readable summary
    fn deploy(&self, schema: &Schema, system: &str) -> Result<String>;
}

// ---- domain configuration ----

/// Everything needed to stand up a data domain
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DomainConfig {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub business_owner: Option<String>,
    #[serde(default)]
    pub technical_owner: Option<String>,
    #[serde(default)]
    pub classification: DataClassification,
    /// Falls back to the configured default
    #[serde(default)]
    pub retention_policy: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// System the domain is cataloged under, `internal` when absent
    #[serde(default)]
    pub system: Option<String>,
    #[serde(default)]
    pub schema: DomainSchema,
    #[serde(default)]
    pub access: Option<DomainAccess>,
    #[serde(default)]
    pub quality_rules: Vec<DomainQualityRule>,
    /// Custom catalog attributes
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub integration: Option<DomainIntegration>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainSchema {
    #[serde(rename = "type", default = "default_schema_type")]
    pub schema_type: SchemaType,
    #[serde(default)]
    pub fields: Vec<SchemaField>,
    #[serde(default)]
    pub indexes: Vec<SchemaIndex>,
}

impl Default for DomainSchema {
    fn default() -> Self {
        Self {
            schema_type: default_schema_type(),
            fields: Vec::new(),
            indexes: Vec::new(),
        }
    }
}

fn default_schema_type() -> SchemaType {
    SchemaType::Relational
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainAccess {
    pub principals: Vec<String>,
    #[serde(default = "default_levels")]
    pub levels: Vec<AccessLevel>,
}

fn default_levels() -> Vec<AccessLevel> {
    vec![AccessLevel::Read]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainQualityRule {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub rule_type: QualityRuleType,
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub parameters: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub severity: Severity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainIntegration {
    #[serde(default = "default_pattern")]
    pub pattern: IntegrationPattern,
    #[serde(default)]
    pub source: DomainEndpoint,
    #[serde(default)]
    pub target: DomainEndpoint,
}

fn default_pattern() -> IntegrationPattern {
    IntegrationPattern::Etl
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainEndpoint {
    #[serde(rename = "type", default = "default_endpoint_type")]
    pub source_type: DataSourceType,
    #[serde(default)]
    pub connection: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub format: DataFormat,
}

impl Default for DomainEndpoint {
    fn default() -> Self {
        Self {
            source_type: default_endpoint_type(),
            connection: serde_json::Map::new(),
            format: DataFormat::Json,
        }
    }
}

fn default_endpoint_type() -> DataSourceType {
    DataSourceType::RelationalDb
}

/// Outcome of one optional domain step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepOutcome {
    /// The concern is turned off in configuration
    Disabled,
    /// Nothing was configured for this step
    Skipped,
    /// Ids of the created entities
    Completed { ids: Vec<String> },
    Failed { error: String },
}

impl StepOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, StepOutcome::Failed { .. })
    }
}

/// What `create_data_domain` did
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainReport {
    pub domain: String,
    pub schema: ValidationReport,
    pub governance: StepOutcome,
    pub metadata: StepOutcome,
    pub integration: StepOutcome,
}

// ---- reports ----

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentStatus {
    Success,
    CompletedWithWarnings,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemDeployment {
    pub success: bool,
    pub deployment_time: DateTime<Utc>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentReport {
    pub schema_name: String,
    pub version: String,
    pub target_systems: Vec<String>,
    pub status: DeploymentStatus,
    pub validation: ValidationReport,
    pub governance_warnings: Vec<String>,
    pub quality: SchemaQuality,
    pub deployments: BTreeMap<String, SystemDeployment>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Heuristic documentation and typing quality of one schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaQuality {
    pub score: f64,
    pub issues: Vec<String>,
}

impl SchemaQuality {
    pub fn assess(schema: &Schema) -> Self {
        let mut score: f64 = 1.0;
        let mut issues = Vec::new();

        let undocumented = schema.fields.iter().filter(|f| f.description.is_none()).count();
        if undocumented > 0 {
            score -= 0.2;
            issues.push(format!("{undocumented} fields lack descriptions"));
        }

        let generic = schema
            .fields
            .iter()
            .filter(|f| matches!(f.data_type.to_uppercase().as_str(), "TEXT" | "STRING" | "VARCHAR"))
            .count();
        if generic as f64 > schema.fields.len() as f64 * 0.5 {
            score -= 0.1;
            issues.push("Many fields use generic data types".to_string());
        }

        if schema.indexes.is_empty() {
            score -= 0.1;
            issues.push("No indexes defined".to_string());
        }

        Self {
            score: score.max(0.0),
            issues,
        }
    }
}

/// Score for one component; `None` when there is nothing to score yet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentAssessment {
    pub score: Option<f64>,
    pub count: usize,
    pub issues: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityAssessment {
    pub scope: String,
    pub timestamp: DateTime<Utc>,
    /// Mean of the scored components
    pub overall_score: f64,
    pub components: BTreeMap<String, ComponentAssessment>,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceStatus {
    Compliant,
    NonCompliant,
    Unknown,
}

impl ComplianceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComplianceStatus::Compliant => "compliant",
            ComplianceStatus::NonCompliant => "non_compliant",
            ComplianceStatus::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceAudit {
    pub frameworks: Vec<ComplianceFramework>,
    pub timestamp: DateTime<Utc>,
    pub overall_status: ComplianceStatus,
    pub framework_results: BTreeMap<String, ComplianceRunReport>,
    pub violations: Vec<ComplianceCheck>,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchitectureStatus {
    pub schemas_count: usize,
    pub governance: Option<GovernanceCounts>,
    pub integration: Option<IntegrationCounts>,
    pub metadata_resources: usize,
    pub quality_score: f64,
    pub compliance_status: ComplianceStatus,
    pub last_updated: DateTime<Utc>,
    pub issues: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Facade over the schema, governance, integration and metadata managers
pub struct DataArchitectureOrchestrator {
    config: ArchitectureConfig,
    base: Arc<FsStore>,
    schemas: SchemaManager,
    governance: Option<GovernanceManager>,
    integration: Option<IntegrationManager>,
    metadata: Option<MetadataManager>,
    deployer: Option<Arc<dyn SchemaDeployer>>,
}

impl DataArchitectureOrchestrator {
    /// Open every enabled manager under the base path and seed default rules
    pub fn new(config: ArchitectureConfig) -> Result<Self> {
        let root = config.base_path.clone();
        let base = Arc::new(FsStore::open(&root)?);

        let schemas = SchemaManager::open(Arc::new(FsStore::open(root.join("schemas"))?))?
            .with_strict_integrity(config.strict_integrity);
        let governance = if config.enable_governance {
            Some(GovernanceManager::new(Arc::new(FsStore::open(root.join("governance"))?)))
        } else {
            None
        };
        let integration = if config.enable_integration {
            Some(IntegrationManager::new(
                Arc::new(FsStore::open(root.join("integration"))?),
                ConnectorRegistry::new(),
            ))
        } else {
            None
        };
        let metadata = if config.enable_metadata {
            Some(MetadataManager::new(Arc::new(FsStore::open(root.join("metadata"))?)))
        } else {
            None
        };

        let orchestrator = Self {
            config,
            base,
            schemas,
            governance,
            integration,
            metadata,
            deployer: None,
        };
        orchestrator.seed_defaults()?;

        info!(base_path = %root.display(), "Data architecture orchestrator initialized");
        Ok(orchestrator)
    }

    pub fn with_quality_runner(mut self, runner: Arc<dyn QualityCheckRunner>) -> Self {
        self.governance = self.governance.map(|g| g.with_quality_runner(runner));
        self
    }

    pub fn with_compliance_runner(mut self, runner: Arc<dyn ComplianceCheckRunner>) -> Self {
        self.governance = self.governance.map(|g| g.with_compliance_runner(runner));
        self
    }

    pub fn with_transformation_engine(mut self, engine: Arc<dyn TransformationEngine>) -> Self {
        self.integration = self.integration.map(|i| i.with_transformation_engine(engine));
        self
    }

    pub fn with_discoverer(mut self, discoverer: Arc<dyn ResourceDiscoverer>) -> Self {
        self.metadata = self.metadata.map(|m| m.with_discoverer(discoverer));
        self
    }

    pub fn with_deployer(mut self, deployer: Arc<dyn SchemaDeployer>) -> Self {
        self.deployer = Some(deployer);
        self
    }

    pub fn config(&self) -> &ArchitectureConfig {
        &self.config
    }

    pub fn schemas(&self) -> &SchemaManager {
        &self.schemas
    }

    pub fn governance(&self) -> Option<&GovernanceManager> {
        self.governance.as_ref()
    }

    pub fn integration(&self) -> Option<&IntegrationManager> {
        self.integration.as_ref()
    }

    pub fn metadata(&self) -> Option<&MetadataManager> {
        self.metadata.as_ref()
    }

    /// Default rules carry fixed ids so re-opening does not duplicate them
    fn seed_defaults(&self) -> Result<()> {
        if let Some(governance) = &self.governance {
            let defaults = [
                ("no_null_primary_keys", "Primary key fields should not be null", QualityRuleType::NotNull, Severity::Critical),
                ("unique_primary_keys", "Primary key fields should be unique", QualityRuleType::Unique, Severity::Critical),
                ("data_completeness", "Data completeness check", QualityRuleType::Completeness, Severity::Medium),
            ];
            for (name, description, rule_type, severity) in defaults {
                let mut rule = QualityRule::new(name, rule_type, "*");
                rule.rule_id = format!("default_{name}");
                rule.description = description.to_string();
                rule.severity = severity;
                rule.created_by = SYSTEM_USER.to_string();
                governance.ensure_quality_rule(rule)?;
            }

            for framework in self.config.frameworks() {
                let mut rule = ComplianceRule::new(
                    format!("default_{framework}_rule"),
                    framework,
                    "Basic compliance check",
                );
                rule.rule_id = format!("default_{framework}_rule");
                rule.description = format!("Default compliance rule for {framework}");
                rule.applicable_schemas = vec!["*".to_string()];
                rule.owner = SYSTEM_USER.to_string();
                governance.ensure_compliance_rule(rule)?;
            }
        }

        if let Some(metadata) = &self.metadata {
            let mut tags = MetadataRule::new(
                "extract_tags_from_name",
                ".*",
                MetadataExtraction {
                    tags_from_name: true,
                    classification_from_path: false,
                },
            );
            tags.rule_id = "default_extract_tags_from_name".to_string();
            tags.description = "Extract tags from resource names".to_string();

            let mut pii = MetadataRule::new(
                "classify_pii_data",
                ".*(user|person|customer|email|phone).*",
                MetadataExtraction {
                    tags_from_name: false,
                    classification_from_path: true,
                },
            );
            pii.rule_id = "default_classify_pii_data".to_string();
            pii.description = "Classify PII data based on patterns".to_string();

            for mut rule in [tags, pii] {
                rule.created_by = SYSTEM_USER.to_string();
                metadata.ensure_metadata_rule(rule)?;
            }
        }
        Ok(())
    }

    // ---- domains and systems ----

    /// Create a domain schema, then its governance, catalog entry and
    /// integration template.
    ///
    /// Only the schema step is fatal. Later steps report their own outcome
    /// and are not rolled back when a sibling fails.
    pub fn create_data_domain(&self, name: &str, config: &DomainConfig) -> Result<DomainReport> {
        info!(domain = %name, "Creating data domain");

        let mut schema = Schema::new(
            name,
            DOMAIN_SCHEMA_VERSION,
            config.schema.schema_type,
            config.schema.fields.clone(),
        );
        schema.indexes = config.schema.indexes.clone();
        schema.description = config
            .description
            .clone()
            .unwrap_or_else(|| format!("Schema for {name} domain"));
        schema.business_owner = config.business_owner.clone();
        schema.technical_owner = config.technical_owner.clone();
        schema.classification = config.classification;
        schema.retention_policy = Some(
            config
                .retention_policy
                .clone()
                .unwrap_or_else(|| self.config.default_retention_policy.clone()),
        );
        schema.tags = config.tags.clone();

        let schema_report = self.schemas.create_schema(&schema)?;

        let governance = soft_step(name, "governance", self.governance.as_ref(), |g| {
            self.create_domain_governance(g, name, config)
        });
        let metadata = soft_step(name, "metadata", self.metadata.as_ref(), |m| {
            self.register_domain_metadata(m, name, config)
        });
        let integration = soft_step(name, "integration", self.integration.as_ref(), |i| {
            self.create_domain_integration(i, name, config)
        });

        info!(domain = %name, "Data domain created");
        Ok(DomainReport {
            domain: name.to_string(),
            schema: schema_report,
            governance,
            metadata,
            integration,
        })
    }

    fn create_domain_governance(
        &self,
        governance: &GovernanceManager,
        name: &str,
        config: &DomainConfig,
    ) -> Result<StepOutcome> {
        let created_by = config.technical_owner.clone().unwrap_or_else(|| SYSTEM_USER.to_string());
        let mut ids = Vec::new();

        if let Some(access) = &config.access {
            let mut policy = AccessPolicy::new(
                format!("{name}_access_policy"),
                format!("{name}.*"),
                access.principals.clone(),
                access.levels.clone(),
            );
            policy.description = format!("Access policy for {name} domain");
            policy.created_by = created_by.clone();
            ids.push(governance.create_access_policy(policy)?.policy_id);
        }

        for rule_config in &config.quality_rules {
            let mut rule = QualityRule::new(rule_config.name.clone(), rule_config.rule_type, name);
            rule.description = rule_config.description.clone();
            rule.target_field = rule_config.field.clone();
            rule.parameters = rule_config.parameters.clone();
            rule.severity = rule_config.severity;
            rule.created_by = created_by.clone();
            ids.push(governance.create_quality_rule(rule)?.rule_id);
        }

        Ok(completed_or_skipped(ids))
    }

    fn register_domain_metadata(
        &self,
        metadata: &MetadataManager,
        name: &str,
        config: &DomainConfig,
    ) -> Result<StepOutcome> {
        let mut resource = DataResource::new(
            name,
            ResourceType::Schema,
            config.system.clone().unwrap_or_else(|| "internal".to_string()),
        );
        resource.description = Some(
            config
                .description
                .clone()
                .unwrap_or_else(|| format!("Data domain: {name}")),
        );
        resource.owner = config.business_owner.clone();
        resource.steward = config.technical_owner.clone();
        resource.tags = config.tags.clone();
        resource.schema_version = Some(DOMAIN_SCHEMA_VERSION.to_string());
        let resource = metadata.register_resource(resource)?;

        if !config.metadata.is_empty() {
            let attributes = config
                .metadata
                .iter()
                .map(|(key, value)| {
                    let mut attribute = MetadataAttribute::new(key.clone(), value.clone());
                    attribute.source = Some("domain_config".to_string());
                    (key.clone(), attribute)
                })
                .collect();
            metadata.add_metadata(&resource.resource_id, attributes)?;
        }

        Ok(StepOutcome::Completed {
            ids: vec![resource.resource_id],
        })
    }

    fn create_domain_integration(
        &self,
        integration: &IntegrationManager,
        name: &str,
        config: &DomainConfig,
    ) -> Result<StepOutcome> {
        let Some(template) = &config.integration else {
            return Ok(StepOutcome::Skipped);
        };

        let endpoint = |suffix: &str, e: &DomainEndpoint| {
            let mut source = DataSource::new(format!("{name}_{suffix}"), e.source_type);
            source.connection_config = e.connection.clone();
            source.format = e.format;
            source
        };
        let mut job = IntegrationJob::new(
            format!("{name}_integration"),
            template.pattern,
            vec![endpoint("source", &template.source)],
            vec![endpoint("target", &template.target)],
        );
        job.description = format!("Integration job for {name} domain");
        job.created_by = config.technical_owner.clone().unwrap_or_else(|| SYSTEM_USER.to_string());

        let job = integration.create_integration_job(job)?;
        Ok(StepOutcome::Completed { ids: vec![job.job_id] })
    }

    /// Catalog a system, discovering its resources when auto-discovery is on
    pub fn register_system(
        &self,
        system: &str,
        connection: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<Vec<DataResource>> {
        info!(system = %system, "Registering system");
        match &self.metadata {
            Some(metadata) if self.config.auto_discovery => {
                let discovered = metadata.discover_resources(system, connection)?;
                info!(system = %system, count = discovered.len(), "Discovered resources");
                Ok(discovered)
            }
            _ => Ok(Vec::new()),
        }
    }

    // ---- deployment ----

    /// Validate a stored schema and deploy it to each target system
    pub fn deploy_schema(&self, name: &str, version: &str, targets: &[String]) -> Result<DeploymentReport> {
        let schema = self
            .schemas
            .get_schema(name)?
            .ok_or_else(|| ArchError::not_found("schema", name))?;
        let deployer = self
            .deployer
            .as_ref()
            .ok_or_else(|| ArchError::CapabilityMissing("schema deployer".to_string()))?;
        info!(schema = %name, version = %version, targets = ?targets, "Deploying schema");

        let validation = self.schemas.validate_schema(&schema);
        let mut report = DeploymentReport {
            schema_name: name.to_string(),
            version: version.to_string(),
            target_systems: targets.to_vec(),
            status: DeploymentStatus::Failed,
            governance_warnings: Vec::new(),
            quality: SchemaQuality::assess(&schema),
            deployments: BTreeMap::new(),
            errors: validation.errors.clone(),
            warnings: Vec::new(),
            validation,
        };
        if !report.validation.valid {
            return Ok(report);
        }

        if schema.version != version {
            report.warnings.push(format!(
                "Requested version {version} but stored schema is {}",
                schema.version
            ));
        }
        if self.governance.is_some() {
            report.governance_warnings = self.governance_warnings(&schema);
            report.warnings.extend(report.governance_warnings.iter().cloned());
        }

        for system in targets {
            let deployment = match deployer.deploy(&schema, system) {
                Ok(message) => SystemDeployment {
                    success: true,
                    deployment_time: Utc::now(),
                    message,
                },
                Err(e) => {
                    report.errors.push(format!("Deployment to {system} failed: {e}"));
                    SystemDeployment {
                        success: false,
                        deployment_time: Utc::now(),
                        message: e.to_string(),
                    }
                }
            };
            report.deployments.insert(system.clone(), deployment);
        }

        report.status = if !report.errors.is_empty() {
            DeploymentStatus::Failed
        } else if !report.warnings.is_empty() {
            DeploymentStatus::CompletedWithWarnings
        } else {
            DeploymentStatus::Success
        };

        if let Some(metadata) = &self.metadata {
            if let Err(e) = record_deployment(metadata, &schema, &report) {
                warn!(schema = %name, error = %e, "Could not record deployment metadata");
            }
        }
        Ok(report)
    }

    fn governance_warnings(&self, schema: &Schema) -> Vec<String> {
        let mut warnings = Vec::new();
        let sensitive = schema.sensitive_fields().next().is_some();
        if sensitive && schema.retention_policy.is_none() {
            warnings.push("Schema contains sensitive data but no retention policy defined".to_string());
        }
        if sensitive && !self.config.encryption_required {
            warnings.push("Schema contains sensitive data but encryption is not enforced".to_string());
        }
        if schema.business_owner.is_none() {
            warnings.push("No business owner defined".to_string());
        }
        if schema.technical_owner.is_none() {
            warnings.push("No technical owner defined".to_string());
        }
        warnings
    }

    // ---- assessments ----

    /// Score every enabled component and save the assessment under `reports/`
    pub fn run_quality_assessment(&self, scope: &str) -> Result<QualityAssessment> {
        let assessment = self.assess_quality(scope)?;
        self.base.write_json(
            &format!("{REPORTS}/quality_assessment_{}.json", assessment.timestamp.date_naive()),
            &assessment,
        )?;
        info!(scope = %scope, score = assessment.overall_score, "Quality assessment saved");
        Ok(assessment)
    }

    fn assess_quality(&self, scope: &str) -> Result<QualityAssessment> {
        let mut components = BTreeMap::new();
        components.insert("schemas".to_string(), self.assess_schemas()?);
        if let Some(governance) = &self.governance {
            components.insert("governance".to_string(), self.assess_governance(governance)?);
        }
        if let Some(integration) = &self.integration {
            components.insert("integration".to_string(), assess_integration(integration)?);
        }
        if let Some(metadata) = &self.metadata {
            components.insert("metadata".to_string(), assess_metadata(metadata)?);
        }

        let scores: Vec<f64> = components.values().filter_map(|c| c.score).collect();
        let overall_score = if scores.is_empty() {
            0.0
        } else {
            scores.iter().sum::<f64>() / scores.len() as f64
        };

        let mut recommendations = Vec::new();
        if overall_score < 0.6 {
            recommendations
                .push("Overall quality is low. Prioritize schema documentation and validation.".to_string());
        }
        if components["schemas"].score.unwrap_or(0.0) < 0.7 {
            recommendations.push("Improve schema documentation and add proper data types.".to_string());
        }
        if components
            .get("metadata")
            .is_some_and(|m| m.score.unwrap_or(0.0) < 0.5)
        {
            recommendations.push("Increase metadata coverage by documenting more resources.".to_string());
        }

        Ok(QualityAssessment {
            scope: scope.to_string(),
            timestamp: Utc::now(),
            overall_score,
            components,
            recommendations,
        })
    }

    fn assess_schemas(&self) -> Result<ComponentAssessment> {
        let names = self.schemas.list_schemas()?;
        if names.is_empty() {
            return Ok(ComponentAssessment {
                score: Some(0.0),
                count: 0,
                issues: vec!["No schemas defined".to_string()],
            });
        }

        let mut total = 0.0;
        let mut issues = Vec::new();
        for name in &names {
            if let Some(schema) = self.schemas.get_schema(name)? {
                let validation = self.schemas.validate_schema(&schema);
                issues.extend(validation.errors);
                total += SchemaQuality::assess(&schema).score;
            }
        }
        Ok(ComponentAssessment {
            score: Some(total / names.len() as f64),
            count: names.len(),
            issues,
        })
    }

    /// Average of recent quality-check scores across schemas
    fn assess_governance(&self, governance: &GovernanceManager) -> Result<ComponentAssessment> {
        let names = self.schemas.list_schemas()?;
        let mut scores = Vec::new();
        for name in &names {
            if let Some(score) = governance.get_quality_score(name)? {
                scores.push(score);
            }
        }
        let counts = governance.counts()?;
        let mut issues = Vec::new();
        if scores.is_empty() {
            issues.push("No recent quality check results".to_string());
        }
        Ok(ComponentAssessment {
            score: (!scores.is_empty()).then(|| scores.iter().sum::<f64>() / scores.len() as f64),
            count: counts.quality_rules,
            issues,
        })
    }

    /// Run the compliance checks for each framework and save the audit under `reports/`
    pub fn run_compliance_audit(&self, frameworks: Option<&[ComplianceFramework]>) -> Result<ComplianceAudit> {
        let governance = self
            .governance
            .as_ref()
            .ok_or_else(|| ArchError::InvalidState("governance is disabled".to_string()))?;
        let frameworks = frameworks.map_or_else(|| self.config.frameworks(), <[_]>::to_vec);
        info!(frameworks = ?frameworks, "Running compliance audit");

        let mut audit = ComplianceAudit {
            frameworks: frameworks.clone(),
            timestamp: Utc::now(),
            overall_status: ComplianceStatus::Compliant,
            framework_results: BTreeMap::new(),
            violations: Vec::new(),
            recommendations: Vec::new(),
        };

        for framework in frameworks {
            let report = governance.run_compliance_checks(Some(framework))?;
            if report.failed > 0 {
                audit.overall_status = ComplianceStatus::NonCompliant;
                audit
                    .violations
                    .extend(report.results.iter().filter(|c| !c.passed).cloned());
            }
            audit.framework_results.insert(framework.to_string(), report);
        }

        if audit.overall_status == ComplianceStatus::NonCompliant {
            audit.recommendations = vec![
                "Address compliance violations immediately.".to_string(),
                "Review access controls and data classification.".to_string(),
                "Implement data retention and deletion policies.".to_string(),
            ];
        }

        self.base.write_json(
            &format!("{REPORTS}/compliance_audit_{}.json", audit.timestamp.date_naive()),
            &audit,
        )?;
        Ok(audit)
    }

    /// Counts, quality and compliance across all enabled managers
    pub fn get_architecture_status(&self) -> Result<ArchitectureStatus> {
        let schemas_count = self.schemas.list_schemas()?.len();
        let governance = self.governance.as_ref().map(|g| g.counts()).transpose()?;
        let integration = self.integration.as_ref().map(|i| i.counts()).transpose()?;
        let metadata_resources = match &self.metadata {
            Some(m) => m.get_catalog_summary()?.total_resources,
            None => 0,
        };

        let quality_score = self.assess_quality("summary")?.overall_score;

        let mut issues = Vec::new();
        let mut recommendations = Vec::new();

        let compliance_status = if self.governance.is_some() {
            match self.run_compliance_audit(None) {
                Ok(audit) => audit.overall_status,
                Err(ArchError::CapabilityMissing(what)) => {
                    issues.push(format!("Compliance not evaluated: no {what} registered"));
                    ComplianceStatus::Unknown
                }
                Err(e) => return Err(e),
            }
        } else {
            ComplianceStatus::Unknown
        };

        if quality_score < self.config.quality_threshold {
            issues.push(format!(
                "Quality score ({quality_score:.2}) below threshold ({})",
                self.config.quality_threshold
            ));
            recommendations.push("Run detailed quality assessment and address identified issues".to_string());
        }
        if compliance_status == ComplianceStatus::NonCompliant {
            issues.push("Compliance violations detected".to_string());
            recommendations.push("Review compliance audit results and remediate violations".to_string());
        }
        if schemas_count == 0 {
            issues.push("No schemas defined".to_string());
            recommendations.push("Define data schemas for your data domains".to_string());
        }

        Ok(ArchitectureStatus {
            schemas_count,
            governance,
            integration,
            metadata_resources,
            quality_score,
            compliance_status,
            last_updated: Utc::now(),
            issues,
            recommendations,
        })
    }

    /// Render the architecture overview and save it next to the managers
    pub fn generate_architecture_documentation(&self) -> Result<String> {
        let status = self.get_architecture_status()?;
        let mut schemas = Vec::new();
        for name in self.schemas.list_schemas()? {
            schemas.extend(self.schemas.get_schema(&name)?);
        }

        let mut doc = String::new();
        self.render_documentation(&status, &schemas, &mut doc)
            .map_err(|e| ArchError::Internal(format!("rendering documentation: {e}")))?;
        self.base.write(DOCUMENTATION, doc.as_bytes())?;
        Ok(doc)
    }

    fn render_documentation(
        &self,
        status: &ArchitectureStatus,
        schemas: &[Schema],
        doc: &mut String,
    ) -> std::fmt::Result {
        writeln!(doc, "# Data Architecture Documentation\n")?;
        writeln!(doc, "Generated on: {}\n", status.last_updated.to_rfc3339())?;

        doc.push_str("## Executive Summary\n\n");
        writeln!(doc, "- **Schemas:** {}", status.schemas_count)?;
        if let Some(g) = &status.governance {
            writeln!(doc, "- **Governance Policies:** {}", g.access_policies)?;
            writeln!(doc, "- **Quality Rules:** {}", g.quality_rules)?;
            writeln!(doc, "- **Compliance Rules:** {}", g.compliance_rules)?;
        }
        if let Some(i) = &status.integration {
            writeln!(doc, "- **Integration Jobs:** {}", i.jobs)?;
        }
        writeln!(doc, "- **Metadata Resources:** {}", status.metadata_resources)?;
        writeln!(doc, "- **Quality Score:** {:.2}", status.quality_score)?;
        writeln!(doc, "- **Compliance Status:** {}\n", status.compliance_status.as_str())?;

        doc.push_str("## Architecture Overview\n\n");
        doc.push_str("The data architecture consists of the following components:\n\n");
        doc.push_str("- **Schema Management:** Centralized schema versioning and validation\n");
        if self.governance.is_some() {
            doc.push_str("- **Data Governance:** Access control, quality monitoring, and compliance\n");
        }
        if self.integration.is_some() {
            doc.push_str("- **Data Integration:** ETL/ELT pipelines and data transformation\n");
        }
        if self.metadata.is_some() {
            doc.push_str("- **Metadata Management:** Data catalog and resource discovery\n");
        }
        doc.push('\n');

        doc.push_str("## Schemas\n\n");
        if schemas.is_empty() {
            doc.push_str("No schemas defined.\n\n");
        }
        for schema in schemas {
            writeln!(doc, "### {}", schema.name)?;
            writeln!(doc, "- **Version:** {}", schema.version)?;
            writeln!(doc, "- **Type:** {}", schema.schema_type)?;
            writeln!(doc, "- **Description:** {}", schema.description)?;
            writeln!(doc, "- **Fields:** {}\n", schema.fields.len())?;
        }

        if self.governance.is_some() {
            doc.push_str("## Data Governance\n\n### Compliance Frameworks\n");
            for framework in &self.config.compliance_frameworks {
                writeln!(doc, "- {framework}")?;
            }
            doc.push_str("\n### Quality Monitoring\n");
            writeln!(doc, "- Quality threshold: {}", self.config.quality_threshold)?;
            writeln!(doc, "- Current quality score: {:.2}\n", status.quality_score)?;
        }

        for (title, items) in [("Issues", &status.issues), ("Recommendations", &status.recommendations)] {
            if !items.is_empty() {
                writeln!(doc, "## {title}\n")?;
                for item in items {
                    writeln!(doc, "- {item}")?;
                }
                doc.push('\n');
            }
        }

        doc.push_str("## Configuration\n\n");
        writeln!(doc, "- **Base Path:** {}", self.config.base_path.display())?;
        writeln!(doc, "- **Governance Enabled:** {}", self.config.enable_governance)?;
        writeln!(doc, "- **Integration Enabled:** {}", self.config.enable_integration)?;
        writeln!(doc, "- **Metadata Enabled:** {}", self.config.enable_metadata)?;
        writeln!(doc, "- **Auto Discovery:** {}", self.config.auto_discovery)?;
        writeln!(doc, "- **Encryption Required:** {}", self.config.encryption_required)?;

        Ok(())
    }
}

/// Run an optional step, turning its error into a `Failed` outcome
fn soft_step<M>(
    domain: &str,
    step: &str,
    manager: Option<&M>,
    run: impl FnOnce(&M) -> Result<StepOutcome>,
) -> StepOutcome {
    let Some(manager) = manager else {
        return StepOutcome::Disabled;
    };
    match run(manager) {
        Ok(outcome) => outcome,
        Err(e) => {
            warn!(domain = %domain, step = %step, error = %e, "Domain step failed");
            StepOutcome::Failed { error: e.to_string() }
        }
    }
}

fn completed_or_skipped(ids: Vec<String>) -> StepOutcome {
    if ids.is_empty() {
        StepOutcome::Skipped
    } else {
        StepOutcome::Completed { ids }
    }
}

/// Share of successful runs across all stored job results
fn assess_integration(integration: &IntegrationManager) -> Result<ComponentAssessment> {
    let jobs = integration.list_jobs()?;
    let mut total = 0usize;
    let mut succeeded = 0usize;
    for job in &jobs {
        for result in integration.get_integration_results(&job.job_id, usize::MAX)? {
            total += 1;
            if result.status == JobStatus::Success {
                succeeded += 1;
            }
        }
    }
    let mut issues = Vec::new();
    if total == 0 {
        issues.push("No integration runs recorded".to_string());
    }
    Ok(ComponentAssessment {
        score: (total > 0).then(|| succeeded as f64 / total as f64),
        count: jobs.len(),
        issues,
    })
}

/// Share of catalog resources carrying at least one attribute
fn assess_metadata(metadata: &MetadataManager) -> Result<ComponentAssessment> {
    let summary = metadata.get_catalog_summary()?;
    if summary.total_resources == 0 {
        return Ok(ComponentAssessment {
            score: Some(0.0),
            count: 0,
            issues: vec!["No resources in catalog".to_string()],
        });
    }
    let covered: usize = summary.metadata_coverage.values().sum();
    Ok(ComponentAssessment {
        score: Some(covered as f64 / summary.total_resources as f64),
        count: summary.total_resources,
        issues: Vec::new(),
    })
}

fn record_deployment(metadata: &MetadataManager, schema: &Schema, report: &DeploymentReport) -> Result<()> {
    let filters = SearchFilters {
        resource_type: Some(ResourceType::Schema),
        ..Default::default()
    };
    let Some(hit) = metadata
        .search_resources(&schema.name, &filters, 10)?
        .into_iter()
        .find(|r| r.resource.name == schema.name)
    else {
        return Ok(());
    };

    let attribute = |name: &str, value: serde_json::Value, value_type: &str| {
        let mut attribute = MetadataAttribute::new(name, value);
        attribute.value_type = value_type.to_string();
        attribute.source = Some("orchestrator".to_string());
        (name.to_string(), attribute)
    };
    let attributes = BTreeMap::from([
        attribute("last_deployment", Utc::now().to_rfc3339().into(), "datetime"),
        attribute("deployed_systems", report.target_systems.clone().into(), "list"),
        attribute("deployment_status", serde_json::to_value(report.status)?, "string"),
    ]);
    metadata.add_metadata(&hit.resource.resource_id, attributes)?;
    Ok(())
}
