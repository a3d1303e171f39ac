//! Governance manager
//!
//! Document layout:
//!
//! ```text
//! policies/{policy_id}.json
//! quality/rules/{rule_id}.json
//! quality/results/{result_id}.json
//! quality/quality_report_{date}.json
//! compliance/rules/{rule_id}.json
//! compliance/compliance_report_{framework}_{date}.json
//! lineage/nodes.json, lineage/edges.json
//! owners/{user_id}.json
//! audit/{date}.jsonl
//! ```

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde_json::json;
use tracing::{error, info, warn};

use super::lineage::{trace, DataLineage, LineageDirection, LineageEdge, LineageNode};
use super::{
    AccessLevel, AccessPolicy, AuditEvent, ComplianceCheck, ComplianceCheckRunner,
    ComplianceFramework, ComplianceRule, ComplianceRunReport, DataOwner, GovernanceCounts,
    QualityCheckRunner, QualityReport, QualityResult, QualityRule,
};
use crate::error::{ArchError, Result};
use crate::store::{key, DocumentStore, JsonStoreExt};

const POLICIES: &str = "policies";
const QUALITY_RULES: &str = "quality/rules";
const QUALITY_RESULTS: &str = "quality/results";
const COMPLIANCE_RULES: &str = "compliance/rules";
const OWNERS: &str = "owners";
const AUDIT: &str = "audit";
const LINEAGE_NODES: &str = "lineage/nodes.json";
const LINEAGE_EDGES: &str = "lineage/edges.json";

/// Window over which quality results are averaged
const QUALITY_SCORE_WINDOW_DAYS: i64 = 7;

/// Governance manager over a document store
pub struct GovernanceManager {
    store: Arc<dyn DocumentStore>,
    quality_runner: Option<Arc<dyn QualityCheckRunner>>,
    compliance_runner: Option<Arc<dyn ComplianceCheckRunner>>,
}

impl GovernanceManager {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            quality_runner: None,
            compliance_runner: None,
        }
    }

    pub fn with_quality_runner(mut self, runner: Arc<dyn QualityCheckRunner>) -> Self {
        self.quality_runner = Some(runner);
        self
    }

    pub fn with_compliance_runner(mut self, runner: Arc<dyn ComplianceCheckRunner>) -> Self {
        self.compliance_runner = Some(runner);
        self
    }

    // ---- access control ----

    /// Store a policy, generating its id and creation time when absent
    pub fn create_access_policy(&self, mut policy: AccessPolicy) -> Result<AccessPolicy> {
        if policy.name.is_empty() || policy.resource_pattern.is_empty() {
            return Err(ArchError::InvalidInput(
                "Policy name and resource pattern are required".to_string(),
            ));
        }
        if policy.principals.is_empty() {
            return Err(ArchError::InvalidInput(
                "Policy must have at least one principal".to_string(),
            ));
        }
        if policy.access_levels.is_empty() {
            return Err(ArchError::InvalidInput("Policy must define access levels".to_string()));
        }

        if policy.policy_id.is_empty() {
            policy.policy_id = new_id();
        }
        policy.created_at.get_or_insert_with(Utc::now);

        self.store
            .write_json(&key(POLICIES, &format!("{}.json", policy.policy_id)), &policy)?;
        self.log_audit_event(
            "access_policy_created",
            json!({
                "policy_id": policy.policy_id,
                "created_by": policy.created_by,
                "resource_pattern": policy.resource_pattern,
            }),
        )?;

        info!(policy_id = %policy.policy_id, "Access policy created");
        Ok(policy)
    }

    pub fn list_access_policies(&self) -> Result<Vec<AccessPolicy>> {
        self.store.load_all(POLICIES)
    }

    /// Decide access and record the decision in the audit log
    pub fn check_access(&self, user_id: &str, resource: &str, level: AccessLevel) -> Result<bool> {
        self.check_access_at(user_id, resource, level, Utc::now())
    }

    pub fn check_access_at(
        &self,
        user_id: &str,
        resource: &str,
        level: AccessLevel,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let granted_by = self.list_access_policies()?.into_iter().find(|policy| {
            policy.matches_resource(resource)
                && policy.applies_to(user_id)
                && policy.access_levels.contains(&level)
                && policy.in_effect_at(now)
        });

        match granted_by {
            Some(policy) => {
                self.log_audit_event(
                    "access_granted",
                    json!({
                        "user_id": user_id,
                        "resource": resource,
                        "access_level": level,
                        "policy_id": policy.policy_id,
                    }),
                )?;
                Ok(true)
            }
            None => {
                self.log_audit_event(
                    "access_denied",
                    json!({
                        "user_id": user_id,
                        "resource": resource,
                        "access_level": level,
                        "reason": "no_matching_policy",
                    }),
                )?;
                Ok(false)
            }
        }
    }

    /// Audit events recorded on `date`
    pub fn audit_events(&self, date: NaiveDate) -> Result<Vec<AuditEvent>> {
        let Some(bytes) = self.store.read(&audit_key(date))? else {
            return Ok(Vec::new());
        };
        let text = String::from_utf8_lossy(&bytes);
        let mut events = Vec::new();
        for line in text.lines().filter(|l| !l.trim().is_empty()) {
            match serde_json::from_str(line) {
                Ok(event) => events.push(event),
                Err(e) => warn!(error = %e, "Skipping malformed audit line"),
            }
        }
        Ok(events)
    }

    fn log_audit_event(&self, event_type: &str, details: serde_json::Value) -> Result<()> {
        let event = AuditEvent {
            event_id: new_id(),
            event_type: event_type.to_string(),
            timestamp: Utc::now(),
            details,
        };
        self.store
            .append_json_line(&audit_key(event.timestamp.date_naive()), &event)
    }

    // ---- data quality ----

    pub fn create_quality_rule(&self, mut rule: QualityRule) -> Result<QualityRule> {
        if rule.name.is_empty() || rule.target_schema.is_empty() {
            return Err(ArchError::InvalidInput(
                "Quality rule name and target schema are required".to_string(),
            ));
        }
        if rule.rule_id.is_empty() {
            rule.rule_id = new_id();
        }
        rule.created_at.get_or_insert_with(Utc::now);

        self.store
            .write_json(&key(QUALITY_RULES, &format!("{}.json", rule.rule_id)), &rule)?;
        info!(rule_id = %rule.rule_id, schema = %rule.target_schema, "Quality rule created");
        Ok(rule)
    }

    /// Store a rule only if its id is not taken; returns whether it was written
    pub fn ensure_quality_rule(&self, rule: QualityRule) -> Result<bool> {
        if !rule.rule_id.is_empty()
            && self.store.exists(&key(QUALITY_RULES, &format!("{}.json", rule.rule_id)))
        {
            return Ok(false);
        }
        self.create_quality_rule(rule)?;
        Ok(true)
    }

    pub fn list_quality_rules(&self) -> Result<Vec<QualityRule>> {
        self.store.load_all(QUALITY_RULES)
    }

    /// Run active quality rules, optionally for one schema.
    ///
    /// Results are stored individually and summarized in a dated report. A
    /// rule whose runner fails is logged and skipped.
    pub fn execute_quality_checks(&self, schema_name: Option<&str>) -> Result<Vec<QualityResult>> {
        let rules: Vec<QualityRule> = self
            .list_quality_rules()?
            .into_iter()
            .filter(|r| r.active)
            .filter(|r| schema_name.map_or(true, |s| r.target_schema == s))
            .collect();

        let mut results = Vec::new();
        if !rules.is_empty() {
            let runner = self
                .quality_runner
                .as_ref()
                .ok_or_else(|| ArchError::CapabilityMissing("quality check runner".to_string()))?;

            for rule in &rules {
                match runner.run(rule) {
                    Ok(outcome) => {
                        let result = QualityResult {
                            result_id: new_id(),
                            rule_id: rule.rule_id.clone(),
                            target_schema: rule.target_schema.clone(),
                            execution_time: Utc::now(),
                            outcome,
                        };
                        self.store.write_json(
                            &key(QUALITY_RESULTS, &format!("{}.json", result.result_id)),
                            &result,
                        )?;
                        results.push(result);
                    }
                    Err(e) => error!(rule_id = %rule.rule_id, error = %e, "Quality rule failed"),
                }
            }
        }

        let report = QualityReport {
            generated_at: Utc::now(),
            total_checks: results.len(),
            passed: results.iter().filter(|r| r.outcome.passed).count(),
            failed: results.iter().filter(|r| !r.outcome.passed).count(),
            average_score: average(results.iter().map(|r| r.outcome.score)),
            results: results.clone(),
        };
        self.store.write_json(
            &format!("quality/quality_report_{}.json", report.generated_at.date_naive()),
            &report,
        )?;

        info!(checks = report.total_checks, passed = report.passed, "Quality checks executed");
        Ok(results)
    }

    /// Average score of results for `schema_name` from the last seven days
    pub fn get_quality_score(&self, schema_name: &str) -> Result<Option<f64>> {
        let cutoff = Utc::now() - Duration::days(QUALITY_SCORE_WINDOW_DAYS);
        let results: Vec<QualityResult> = self.store.load_all(QUALITY_RESULTS)?;
        Ok(average(
            results
                .iter()
                .filter(|r| r.execution_time > cutoff && r.target_schema == schema_name)
                .map(|r| r.outcome.score),
        ))
    }

    /// Every stored quality result
    pub fn list_quality_results(&self) -> Result<Vec<QualityResult>> {
        self.store.load_all(QUALITY_RESULTS)
    }

    // ---- compliance ----

    pub fn create_compliance_rule(&self, mut rule: ComplianceRule) -> Result<ComplianceRule> {
        if rule.name.is_empty() || rule.requirement.is_empty() {
            return Err(ArchError::InvalidInput(
                "Compliance rule name and requirement are required".to_string(),
            ));
        }
        if rule.rule_id.is_empty() {
            rule.rule_id = new_id();
        }
        if rule.next_check.is_none() {
            rule.next_check = Some(rule.frequency.next_after(Utc::now()));
        }
        self.save_compliance_rule(&rule)?;
        info!(rule_id = %rule.rule_id, framework = %rule.framework, "Compliance rule created");
        Ok(rule)
    }

    /// Store a rule only if its id is not taken; returns whether it was written
    pub fn ensure_compliance_rule(&self, rule: ComplianceRule) -> Result<bool> {
        if !rule.rule_id.is_empty()
            && self.store.exists(&key(COMPLIANCE_RULES, &format!("{}.json", rule.rule_id)))
        {
            return Ok(false);
        }
        self.create_compliance_rule(rule)?;
        Ok(true)
    }

    pub fn list_compliance_rules(&self) -> Result<Vec<ComplianceRule>> {
        self.store.load_all(COMPLIANCE_RULES)
    }

    /// Check every due rule, optionally for one framework
    pub fn run_compliance_checks(
        &self,
        framework: Option<ComplianceFramework>,
    ) -> Result<ComplianceRunReport> {
        self.run_compliance_checks_at(framework, Utc::now())
    }

    pub fn run_compliance_checks_at(
        &self,
        framework: Option<ComplianceFramework>,
        now: DateTime<Utc>,
    ) -> Result<ComplianceRunReport> {
        let rules: Vec<ComplianceRule> = self
            .list_compliance_rules()?
            .into_iter()
            .filter(|r| framework.map_or(true, |f| r.framework == f))
            .collect();

        let framework_name = framework.map_or("all", |f| f.as_str()).to_string();
        let mut report = ComplianceRunReport {
            generated_at: now,
            framework: framework_name,
            total_rules: rules.len(),
            passed: 0,
            failed: 0,
            not_due: 0,
            results: Vec::new(),
        };

        for mut rule in rules {
            if !rule.is_due(now) {
                report.not_due += 1;
                continue;
            }
            let runner = self
                .compliance_runner
                .as_ref()
                .ok_or_else(|| ArchError::CapabilityMissing("compliance check runner".to_string()))?;

            let outcome = match runner.check(&rule) {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!(rule_id = %rule.rule_id, error = %e, "Compliance check failed");
                    continue;
                }
            };

            if outcome.passed {
                report.passed += 1;
            } else {
                report.failed += 1;
            }
            report.results.push(ComplianceCheck {
                rule_id: rule.rule_id.clone(),
                framework: rule.framework,
                passed: outcome.passed,
                execution_time: now,
                details: outcome.details,
            });

            rule.last_check = Some(now);
            rule.next_check = Some(rule.frequency.next_after(now));
            self.save_compliance_rule(&rule)?;
        }

        self.store.write_json(
            &format!(
                "compliance/compliance_report_{}_{}.json",
                report.framework,
                now.date_naive()
            ),
            &report,
        )?;
        info!(
            framework = %report.framework,
            passed = report.passed,
            failed = report.failed,
            "Compliance checks executed"
        );
        Ok(report)
    }

    fn save_compliance_rule(&self, rule: &ComplianceRule) -> Result<()> {
        self.store
            .write_json(&key(COMPLIANCE_RULES, &format!("{}.json", rule.rule_id)), rule)
    }

    // ---- lineage ----

    /// Insert or replace a node by id
    pub fn add_lineage_node(&self, node: LineageNode) -> Result<()> {
        let mut nodes = self.lineage_nodes()?;
        nodes.retain(|n| n.node_id != node.node_id);
        nodes.push(node);
        self.store.write_json(LINEAGE_NODES, &nodes)
    }

    /// Insert or replace an edge by id
    pub fn add_lineage_edge(&self, edge: LineageEdge) -> Result<()> {
        let mut edges = self.lineage_edges()?;
        edges.retain(|e| e.edge_id != edge.edge_id);
        edges.push(edge);
        self.store.write_json(LINEAGE_EDGES, &edges)
    }

    pub fn get_data_lineage(&self, node_id: &str, direction: LineageDirection) -> Result<DataLineage> {
        let nodes = self.lineage_nodes()?;
        let edges = self.lineage_edges()?;
        trace(&nodes, &edges, node_id, direction)
            .ok_or_else(|| ArchError::not_found("lineage node", node_id))
    }

    fn lineage_nodes(&self) -> Result<Vec<LineageNode>> {
        Ok(self.store.read_json(LINEAGE_NODES)?.unwrap_or_default())
    }

    fn lineage_edges(&self) -> Result<Vec<LineageEdge>> {
        Ok(self.store.read_json(LINEAGE_EDGES)?.unwrap_or_default())
    }

    // ---- owners ----

    pub fn register_data_owner(&self, owner: &DataOwner) -> Result<()> {
        if owner.user_id.is_empty() {
            return Err(ArchError::InvalidInput("Data owner user_id is required".to_string()));
        }
        self.store
            .write_json(&key(OWNERS, &format!("{}.json", owner.user_id)), owner)?;
        info!(user_id = %owner.user_id, "Data owner registered");
        Ok(())
    }

    pub fn get_data_owner(&self, user_id: &str) -> Result<Option<DataOwner>> {
        self.store.read_json(&key(OWNERS, &format!("{user_id}.json")))
    }

    /// Entity counts for status reports
    pub fn counts(&self) -> Result<GovernanceCounts> {
        Ok(GovernanceCounts {
            access_policies: self.store.list(POLICIES, ".json")?.len(),
            quality_rules: self.store.list(QUALITY_RULES, ".json")?.len(),
            compliance_rules: self.store.list(COMPLIANCE_RULES, ".json")?.len(),
            lineage_nodes: self.lineage_nodes()?.len(),
            lineage_edges: self.lineage_edges()?.len(),
            data_owners: self.store.list(OWNERS, ".json")?.len(),
        })
    }
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn audit_key(date: NaiveDate) -> String {
    key(AUDIT, &format!("{date}.jsonl"))
}

fn average(scores: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = scores.fold((0.0, 0usize), |(s, c), x| (s + x, c + 1));
    (count > 0).then(|| sum / count as f64)
}
