//! Data governance
//!
//! Access policies with an audit trail, data quality rules, compliance rules,
//! data lineage and data owners. Rule execution is delegated to
//! [`QualityCheckRunner`] and [`ComplianceCheckRunner`] implementations.

pub mod lineage;
pub mod manager;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ArchError, Result};

pub use lineage::{DataLineage, LineageDirection, LineageEdge, LineageHop, LineageNode};
pub use manager::GovernanceManager;

/// Access levels granted by a policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    Read,
    Write,
    Delete,
    Admin,
}

impl AccessLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessLevel::Read => "read",
            AccessLevel::Write => "write",
            AccessLevel::Delete => "delete",
            AccessLevel::Admin => "admin",
        }
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Supported compliance frameworks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceFramework {
    Gdpr,
    Hipaa,
    PciDss,
    Sox,
    Ccpa,
    #[serde(rename = "iso_27001")]
    Iso27001,
}

impl ComplianceFramework {
    pub const ALL: [ComplianceFramework; 6] = [
        ComplianceFramework::Gdpr,
        ComplianceFramework::Hipaa,
        ComplianceFramework::PciDss,
        ComplianceFramework::Sox,
        ComplianceFramework::Ccpa,
        ComplianceFramework::Iso27001,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ComplianceFramework::Gdpr => "gdpr",
            ComplianceFramework::Hipaa => "hipaa",
            ComplianceFramework::PciDss => "pci_dss",
            ComplianceFramework::Sox => "sox",
            ComplianceFramework::Ccpa => "ccpa",
            ComplianceFramework::Iso27001 => "iso_27001",
        }
    }
}

impl fmt::Display for ComplianceFramework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComplianceFramework {
    type Err = ArchError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.to_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|f| f.as_str() == normalized)
            .ok_or_else(|| ArchError::InvalidInput(format!("unknown compliance framework: {s}")))
    }
}

/// Data quality rule types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityRuleType {
    NotNull,
    Unique,
    Range,
    Pattern,
    Custom,
    ReferentialIntegrity,
    Completeness,
    Consistency,
    Accuracy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

/// How often a compliance rule is due
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckFrequency {
    Daily,
    Weekly,
    #[default]
    Monthly,
    Quarterly,
}

impl CheckFrequency {
    pub fn interval(&self) -> Duration {
        match self {
            CheckFrequency::Daily => Duration::days(1),
            CheckFrequency::Weekly => Duration::weeks(1),
            CheckFrequency::Monthly => Duration::days(30),
            CheckFrequency::Quarterly => Duration::days(90),
        }
    }

    pub fn next_after(&self, from: DateTime<Utc>) -> DateTime<Utc> {
        from + self.interval()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutomationLevel {
    #[default]
    Manual,
    SemiAutomated,
    Automated,
}

/// Data owner definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataOwner {
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub role: String,
    pub department: String,
    #[serde(default)]
    pub responsibilities: Vec<String>,
    #[serde(default)]
    pub contact_info: BTreeMap<String, String>,
}

/// Optional time window restricting when a policy applies
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicyConditions {
    #[serde(default)]
    pub valid_from: Option<DateTime<Utc>>,
    #[serde(default)]
    pub valid_until: Option<DateTime<Utc>>,
}

impl PolicyConditions {
    pub fn hold_at(&self, now: DateTime<Utc>) -> bool {
        self.valid_from.map_or(true, |from| now >= from)
            && self.valid_until.map_or(true, |until| now <= until)
    }
}

/// Access control policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessPolicy {
    /// Generated when empty
    #[serde(default)]
    pub policy_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Prefix pattern; a trailing `*` is ignored
    pub resource_pattern: String,
    /// User or group ids; `all` matches everyone
    pub principals: Vec<String>,
    pub access_levels: Vec<AccessLevel>,
    #[serde(default)]
    pub conditions: Option<PolicyConditions>,
    #[serde(default)]
    pub expiry_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub approval_required: bool,
    #[serde(default)]
    pub created_by: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl AccessPolicy {
    pub fn new(
        name: impl Into<String>,
        resource_pattern: impl Into<String>,
        principals: Vec<String>,
        access_levels: Vec<AccessLevel>,
    ) -> Self {
        Self {
            policy_id: String::new(),
            name: name.into(),
            description: String::new(),
            resource_pattern: resource_pattern.into(),
            principals,
            access_levels,
            conditions: None,
            expiry_date: None,
            approval_required: false,
            created_by: String::new(),
            created_at: None,
        }
    }

    pub fn matches_resource(&self, resource: &str) -> bool {
        resource.starts_with(self.resource_pattern.trim_end_matches('*'))
    }

    pub fn applies_to(&self, user_id: &str) -> bool {
        self.principals.iter().any(|p| p == user_id || p == "all")
    }

    /// Conditions hold and the policy has not expired
    pub fn in_effect_at(&self, now: DateTime<Utc>) -> bool {
        let conditions_hold = self.conditions.as_ref().map_or(true, |c| c.hold_at(now));
        let expired = self.expiry_date.is_some_and(|expiry| now > expiry);
        conditions_hold && !expired
    }
}

/// Data quality rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityRule {
    #[serde(default)]
    pub rule_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub rule_type: QualityRuleType,
    pub target_schema: String,
    #[serde(default)]
    pub target_field: Option<String>,
    #[serde(default)]
    pub parameters: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub created_by: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl QualityRule {
    pub fn new(
        name: impl Into<String>,
        rule_type: QualityRuleType,
        target_schema: impl Into<String>,
    ) -> Self {
        Self {
            rule_id: String::new(),
            name: name.into(),
            description: String::new(),
            rule_type,
            target_schema: target_schema.into(),
            target_field: None,
            parameters: BTreeMap::new(),
            severity: Severity::Medium,
            active: true,
            created_by: String::new(),
            created_at: None,
        }
    }
}

fn default_true() -> bool {
    true
}

/// What a runner reports for one quality rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityOutcome {
    pub passed: bool,
    /// 0.0 to 1.0
    pub score: f64,
    pub records_checked: u64,
    pub records_failed: u64,
    #[serde(default)]
    pub details: serde_json::Value,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

/// Stored result of one quality rule execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityResult {
    pub result_id: String,
    pub rule_id: String,
    /// Copied from the rule so scores can be aggregated without a lookup
    #[serde(default)]
    pub target_schema: String,
    pub execution_time: DateTime<Utc>,
    #[serde(flatten)]
    pub outcome: QualityOutcome,
}

/// Snapshot written after a quality run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityReport {
    pub generated_at: DateTime<Utc>,
    pub total_checks: usize,
    pub passed: usize,
    pub failed: usize,
    pub average_score: Option<f64>,
    pub results: Vec<QualityResult>,
}

/// Executes quality rules against live data
pub trait QualityCheckRunner: Send + Sync {
    fn run(&self, rule: &QualityRule) -> Result<QualityOutcome>;
}

/// Compliance rule for a regulatory framework
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceRule {
    #[serde(default)]
    pub rule_id: String,
    pub name: String,
    pub framework: ComplianceFramework,
    #[serde(default)]
    pub description: String,
    pub requirement: String,
    #[serde(default)]
    pub applicable_schemas: Vec<String>,
    #[serde(default)]
    pub validation_query: Option<String>,
    #[serde(default)]
    pub automation_level: AutomationLevel,
    #[serde(default)]
    pub frequency: CheckFrequency,
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub last_check: Option<DateTime<Utc>>,
    #[serde(default)]
    pub next_check: Option<DateTime<Utc>>,
}

impl ComplianceRule {
    pub fn new(
        name: impl Into<String>,
        framework: ComplianceFramework,
        requirement: impl Into<String>,
    ) -> Self {
        Self {
            rule_id: String::new(),
            name: name.into(),
            framework,
            description: String::new(),
            requirement: requirement.into(),
            applicable_schemas: Vec::new(),
            validation_query: None,
            automation_level: AutomationLevel::Manual,
            frequency: CheckFrequency::Monthly,
            owner: String::new(),
            last_check: None,
            next_check: None,
        }
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_check.map_or(true, |next| now >= next)
    }
}

/// What a runner reports for one compliance rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceOutcome {
    pub passed: bool,
    #[serde(default)]
    pub details: String,
}

/// Result of checking one compliance rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceCheck {
    pub rule_id: String,
    pub framework: ComplianceFramework,
    pub passed: bool,
    pub execution_time: DateTime<Utc>,
    pub details: String,
}

/// Summary of a compliance run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceRunReport {
    pub generated_at: DateTime<Utc>,
    /// Framework name or `all`
    pub framework: String,
    pub total_rules: usize,
    pub passed: usize,
    pub failed: usize,
    /// Rules skipped because they were not yet due
    pub not_due: usize,
    pub results: Vec<ComplianceCheck>,
}

/// Executes compliance rules
pub trait ComplianceCheckRunner: Send + Sync {
    fn check(&self, rule: &ComplianceRule) -> Result<ComplianceOutcome>;
}

/// One line of the audit log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub event_id: String,
    pub event_type: String,
    pub timestamp: DateTime<Utc>,
    pub details: serde_json::Value,
}

/// Entity counts for status reporting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceCounts {
    pub access_policies: usize,
    pub quality_rules: usize,
    pub compliance_rules: usize,
    pub lineage_nodes: usize,
    pub lineage_edges: usize,
    pub data_owners: usize,
}
