//! Integration manager
//!
//! Document layout:
//!
//! ```text
//! jobs/{job_id}.json
//! transformations/{transformation_id}.json
//! results/{job_id}_{result_id}.json
//! ```

use std::sync::{Arc, OnceLock, RwLock};
use std::time::Instant;

use chrono::Utc;
use regex::Regex;
use tracing::{error, info, warn};

use super::connector::{ConnectorRegistry, DataConnector, TransformationEngine};
use super::{
    ConflictResolution, DataConflict, DataSource, DataSourceType, DataTransformation,
    ErrorHandling, IntegrationCounts, IntegrationJob, IntegrationPattern, IntegrationResult,
    JobIssue, JobStatus, QualityIssue, QualityValidation, Record, RecordCheck,
};
use crate::error::{ArchError, Result};
use crate::store::{key, DocumentStore, JsonStoreExt};

const JOBS: &str = "jobs";
const TRANSFORMATIONS: &str = "transformations";
const RESULTS: &str = "results";

/// Integration manager over a document store
pub struct IntegrationManager {
    store: Arc<dyn DocumentStore>,
    connectors: RwLock<ConnectorRegistry>,
    engine: Option<Arc<dyn TransformationEngine>>,
}

impl IntegrationManager {
    pub fn new(store: Arc<dyn DocumentStore>, connectors: ConnectorRegistry) -> Self {
        Self {
            store,
            connectors: RwLock::new(connectors),
            engine: None,
        }
    }

    pub fn with_transformation_engine(mut self, engine: Arc<dyn TransformationEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Register or replace the connector for a source type
    pub fn register_connector<F>(&self, source_type: DataSourceType, factory: F) -> Result<()>
    where
        F: Fn() -> Box<dyn DataConnector> + Send + Sync + 'static,
    {
        self.connectors
            .write()
            .map_err(|_| ArchError::Internal("connector registry lock poisoned".to_string()))?
            .register(source_type, factory);
        info!(source_type = ?source_type, "Registered connector");
        Ok(())
    }

    fn registry(&self) -> Result<ConnectorRegistry> {
        self.connectors
            .read()
            .map(|r| r.clone())
            .map_err(|_| ArchError::Internal("connector registry lock poisoned".to_string()))
    }

    // ---- jobs ----

    /// Validate and store a job, generating its id and creation time
    pub fn create_integration_job(&self, mut job: IntegrationJob) -> Result<IntegrationJob> {
        if job.name.is_empty() {
            return Err(ArchError::InvalidInput("Job name is required".to_string()));
        }
        if job.source_configs.is_empty() {
            return Err(ArchError::InvalidInput(
                "At least one source configuration is required".to_string(),
            ));
        }
        if job.target_configs.is_empty() {
            return Err(ArchError::InvalidInput(
                "At least one target configuration is required".to_string(),
            ));
        }
        let registry = self.registry()?;
        if let Some(source) = job
            .source_configs
            .iter()
            .find(|s| !registry.supports(s.source_type))
        {
            return Err(ArchError::InvalidInput(format!(
                "Unsupported source type: {:?}",
                source.source_type
            )));
        }
        if let Some(schedule) = &job.schedule {
            check_cron(schedule)?;
        }

        if job.job_id.is_empty() {
            job.job_id = new_id();
        }
        job.created_at.get_or_insert_with(Utc::now);
        self.save_job(&job)?;

        info!(job_id = %job.job_id, pattern = ?job.pattern, "Integration job created");
        Ok(job)
    }

    pub fn get_job(&self, job_id: &str) -> Result<Option<IntegrationJob>> {
        self.store.read_json(&job_key(job_id))
    }

    pub fn list_jobs(&self) -> Result<Vec<IntegrationJob>> {
        self.store.load_all(JOBS)
    }

    /// Attach a cron schedule to a job
    pub fn schedule_integration_job(&self, job_id: &str, schedule: &str) -> Result<()> {
        check_cron(schedule)?;
        let mut job = self
            .get_job(job_id)?
            .ok_or_else(|| ArchError::not_found("integration job", job_id))?;
        job.schedule = Some(schedule.to_string());
        self.save_job(&job)?;
        info!(job_id = %job_id, schedule = %schedule, "Integration job scheduled");
        Ok(())
    }

    fn save_job(&self, job: &IntegrationJob) -> Result<()> {
        self.store.write_json(&job_key(&job.job_id), job)
    }

    // ---- execution ----

    /// Run a job and store its result.
    ///
    /// Connector and transformation failures are captured in the result with
    /// status `failure`; only missing or inactive jobs and unsupported
    /// patterns are returned as errors.
    pub fn execute_integration_job(&self, job_id: &str) -> Result<IntegrationResult> {
        let job = self
            .get_job(job_id)?
            .ok_or_else(|| ArchError::not_found("integration job", job_id))?;
        if !job.active {
            warn!(job_id = %job_id, "Integration job is inactive");
            return Err(ArchError::InvalidState(format!("integration job {job_id} is inactive")));
        }
        if matches!(job.pattern, IntegrationPattern::Streaming | IntegrationPattern::Cdc) {
            return Err(ArchError::Unsupported(format!(
                "{:?} jobs need a streaming runtime",
                job.pattern
            )));
        }

        let started = Instant::now();
        let mut result = IntegrationResult {
            result_id: new_id(),
            job_id: job.job_id.clone(),
            execution_time: Utc::now(),
            status: JobStatus::Running,
            records_processed: 0,
            records_inserted: 0,
            records_updated: 0,
            records_failed: 0,
            execution_duration: 0.0,
            errors: Vec::new(),
            warnings: Vec::new(),
            metrics: Default::default(),
        };

        let outcome = match job.pattern {
            IntegrationPattern::Elt => self.run_elt(&job, &mut result),
            // Batch-like patterns all run as extract, transform, load
            _ => self.run_etl(&job, &mut result),
        };

        result.status = match outcome {
            Ok(()) if result.records_failed > 0 => JobStatus::PartialSuccess,
            Ok(()) => JobStatus::Success,
            Err(e) => {
                error!(job_id = %job_id, error = %e, "Integration job failed");
                result.errors.push(JobIssue::new("execution_error", e.to_string()));
                JobStatus::Failure
            }
        };
        result.execution_duration = started.elapsed().as_secs_f64();

        self.store.write_json(
            &key(RESULTS, &format!("{}_{}.json", result.job_id, result.result_id)),
            &result,
        )?;
        info!(
            job_id = %job_id,
            status = ?result.status,
            processed = result.records_processed,
            "Integration job executed"
        );
        Ok(result)
    }

    /// Run a job on the blocking pool
    pub async fn execute_integration_job_async(
        self: Arc<Self>,
        job_id: String,
    ) -> Result<IntegrationResult> {
        tokio::task::spawn_blocking(move || self.execute_integration_job(&job_id))
            .await
            .map_err(|e| ArchError::Internal(format!("integration task failed: {e}")))?
    }

    fn run_etl(&self, job: &IntegrationJob, result: &mut IntegrationResult) -> Result<()> {
        let registry = self.registry()?;
        let extracted = extract_all(&registry, &job.source_configs)?;
        result.records_processed = extracted.len();

        let mut records = extracted;
        for transformation in &job.transformations {
            records = self.transform(records, transformation, result)?;
        }

        if !job.quality_checks.is_empty() {
            let validation = self.validate_data_quality(&records, &job.quality_checks);
            result.records_failed = validation.invalid_records;
            result.warnings.extend(validation.issues.into_iter().map(|issue| JobIssue {
                kind: "quality_violation".to_string(),
                message: format!("{:?}: {}", issue.rule, issue.violation),
                record: Some(issue.record),
            }));
        }

        result.records_inserted = load_all(&registry, &job.target_configs, &records)?;
        Ok(())
    }

    /// Raw records are loaded as extracted; transformations belong to the target
    fn run_elt(&self, job: &IntegrationJob, result: &mut IntegrationResult) -> Result<()> {
        let registry = self.registry()?;
        let extracted = extract_all(&registry, &job.source_configs)?;
        result.records_processed = extracted.len();
        result.records_inserted = load_all(&registry, &job.target_configs, &extracted)?;
        if !job.transformations.is_empty() {
            result.metrics.insert(
                "deferred_transformations".to_string(),
                job.transformations.len().into(),
            );
        }
        Ok(())
    }

    fn transform(
        &self,
        records: Vec<Record>,
        transformation: &DataTransformation,
        result: &mut IntegrationResult,
    ) -> Result<Vec<Record>> {
        let engine = self
            .engine
            .as_ref()
            .ok_or_else(|| ArchError::CapabilityMissing("transformation engine".to_string()))?;

        match engine.apply(transformation, records.clone()) {
            Ok(transformed) => Ok(transformed),
            Err(e) => match transformation.error_handling {
                ErrorHandling::Fail => Err(e),
                ErrorHandling::Skip => {
                    warn!(transformation = %transformation.name, error = %e, "Transformation skipped");
                    Ok(records)
                }
                ErrorHandling::Log => {
                    result.warnings.push(JobIssue::new(
                        "transformation_error",
                        format!("{}: {e}", transformation.name),
                    ));
                    Ok(records)
                }
            },
        }
    }

    /// Recent results for a job, newest first
    pub fn get_integration_results(&self, job_id: &str, limit: usize) -> Result<Vec<IntegrationResult>> {
        let prefix = format!("{RESULTS}/{job_id}_");
        let mut results: Vec<IntegrationResult> = Vec::new();
        for result_key in self.store.list(RESULTS, ".json")? {
            if !result_key.starts_with(&prefix) {
                continue;
            }
            // `a_` is also a prefix of job `a_b`
            match self.store.read_json::<IntegrationResult>(&result_key)? {
                Some(result) if result.job_id == job_id => results.push(result),
                _ => {}
            }
        }
        results.sort_by(|a, b| b.execution_time.cmp(&a.execution_time));
        results.truncate(limit);
        Ok(results)
    }

    // ---- transformations ----

    pub fn create_data_transformation(
        &self,
        mut transformation: DataTransformation,
    ) -> Result<DataTransformation> {
        if transformation.name.is_empty() {
            return Err(ArchError::InvalidInput("Transformation name is required".to_string()));
        }
        if transformation.transformation_id.is_empty() {
            transformation.transformation_id = new_id();
        }
        self.store.write_json(
            &key(TRANSFORMATIONS, &format!("{}.json", transformation.transformation_id)),
            &transformation,
        )?;
        info!(transformation_id = %transformation.transformation_id, "Data transformation created");
        Ok(transformation)
    }

    /// Apply a stored transformation through the engine
    pub fn apply_transformation(&self, records: Vec<Record>, transformation_id: &str) -> Result<Vec<Record>> {
        let transformation: DataTransformation = self
            .store
            .read_json(&key(TRANSFORMATIONS, &format!("{transformation_id}.json")))?
            .ok_or_else(|| ArchError::not_found("transformation", transformation_id))?;
        let engine = self
            .engine
            .as_ref()
            .ok_or_else(|| ArchError::CapabilityMissing("transformation engine".to_string()))?;
        engine.apply(&transformation, records)
    }

    // ---- data quality and reconciliation ----

    /// Check every record against every check
    pub fn validate_data_quality(&self, records: &[Record], checks: &[RecordCheck]) -> QualityValidation {
        let mut issues = Vec::new();
        let mut invalid_records = 0;

        for record in records {
            let mut valid = true;
            for check in checks {
                if !check.passes(record) {
                    valid = false;
                    issues.push(QualityIssue {
                        record: record.clone(),
                        rule: *check,
                        violation: "Quality rule violation".to_string(),
                    });
                }
            }
            if !valid {
                invalid_records += 1;
            }
        }

        QualityValidation {
            passed: invalid_records == 0,
            total_records: records.len(),
            valid_records: records.len() - invalid_records,
            invalid_records,
            issues,
        }
    }

    /// Pick one record per conflict
    pub fn resolve_conflicts(&self, conflicts: &[DataConflict], strategy: ConflictResolution) -> Vec<Record> {
        conflicts.iter().map(|c| resolve(c, strategy)).collect()
    }

    /// Entity counts for status reports
    pub fn counts(&self) -> Result<IntegrationCounts> {
        let jobs = self.list_jobs()?;
        Ok(IntegrationCounts {
            jobs: jobs.len(),
            active_jobs: jobs.iter().filter(|j| j.active).count(),
            transformations: self.store.list(TRANSFORMATIONS, ".json")?.len(),
            results: self.store.list(RESULTS, ".json")?.len(),
        })
    }
}

fn extract_all(registry: &ConnectorRegistry, sources: &[DataSource]) -> Result<Vec<Record>> {
    let mut records = Vec::new();
    for source in sources {
        let mut connector = registry.create(source.source_type)?;
        connector.connect(&source.connection_config)?;
        let extracted = connector.extract(source.extraction_query.as_deref());
        connector.disconnect();
        records.extend(extracted?);
    }
    Ok(records)
}

fn load_all(registry: &ConnectorRegistry, targets: &[DataSource], records: &[Record]) -> Result<usize> {
    let mut loaded = 0;
    for target in targets {
        let mut connector = registry.create(target.source_type)?;
        connector.connect(&target.connection_config)?;
        let written = connector.load(records);
        connector.disconnect();
        loaded = loaded.max(written?);
    }
    Ok(loaded)
}

fn resolve(conflict: &DataConflict, strategy: ConflictResolution) -> Record {
    let records = &conflict.records;
    let Some(first) = records.first() else {
        return Record::new();
    };

    match strategy {
        ConflictResolution::LatestWins => {
            let timestamp = |r: &Record| r.get("timestamp").and_then(|v| v.as_str()).unwrap_or("").to_string();
            // Earliest record wins ties
            records
                .iter()
                .skip(1)
                .fold(first, |best, r| if timestamp(r) > timestamp(best) { r } else { best })
                .clone()
        }
        ConflictResolution::SourcePriority => conflict
            .source_priority
            .iter()
            .find_map(|source| {
                records
                    .iter()
                    .find(|r| r.get("source").and_then(|v| v.as_str()) == Some(source.as_str()))
            })
            .unwrap_or(first)
            .clone(),
        ConflictResolution::Manual | ConflictResolution::CustomLogic => first.clone(),
        ConflictResolution::Versioned => {
            let mut versioned = first.clone();
            versioned.insert(
                "versions".to_string(),
                serde_json::Value::Array(records.iter().cloned().map(serde_json::Value::Object).collect()),
            );
            versioned.insert("current_version".to_string(), (records.len() - 1).into());
            versioned
        }
    }
}

fn cron_field() -> Result<&'static Regex> {
    static FIELD: OnceLock<std::result::Result<Regex, regex::Error>> = OnceLock::new();
    FIELD
        .get_or_init(|| Regex::new(r"^(\*|\d+(-\d+)?)(/\d+)?(,(\*|\d+(-\d+)?)(/\d+)?)*$"))
        .as_ref()
        .map_err(|e| ArchError::Regex(e.clone()))
}

fn check_cron(schedule: &str) -> Result<()> {
    let field = cron_field()?;
    let fields: Vec<&str> = schedule.split_whitespace().collect();
    if fields.len() != 5 || !fields.iter().all(|f| field.is_match(f)) {
        return Err(ArchError::InvalidInput(format!(
            "expected a five-field cron expression, got {schedule:?}"
        )));
    }
    Ok(())
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn job_key(job_id: &str) -> String {
    key(JOBS, &format!("{job_id}.json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;
    use std::sync::Mutex;

    fn record(value: serde_json::Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    struct FixedSource(Vec<Record>);

    impl DataConnector for FixedSource {
        fn connect(&mut self, _config: &serde_json::Map<String, serde_json::Value>) -> Result<()> {
            Ok(())
        }
        fn extract(&mut self, _query: Option<&str>) -> Result<Vec<Record>> {
            Ok(self.0.clone())
        }
        fn load(&mut self, _records: &[Record]) -> Result<usize> {
            Err(ArchError::Unsupported("read-only source".to_string()))
        }
        fn disconnect(&mut self) {}
    }

    struct Sink(Arc<Mutex<Vec<Record>>>);

    impl DataConnector for Sink {
        fn connect(&mut self, _config: &serde_json::Map<String, serde_json::Value>) -> Result<()> {
            Ok(())
        }
        fn extract(&mut self, _query: Option<&str>) -> Result<Vec<Record>> {
            Ok(Vec::new())
        }
        fn load(&mut self, records: &[Record]) -> Result<usize> {
            self.0.lock().unwrap().extend_from_slice(records);
            Ok(records.len())
        }
        fn disconnect(&mut self) {}
    }

    struct Uppercase;

    impl TransformationEngine for Uppercase {
        fn apply(&self, _t: &DataTransformation, records: Vec<Record>) -> Result<Vec<Record>> {
            Ok(records
                .into_iter()
                .map(|mut r| {
                    if let Some(serde_json::Value::String(name)) = r.get_mut("name") {
                        *name = name.to_uppercase();
                    }
                    r
                })
                .collect())
        }
    }

    fn setup() -> (IntegrationManager, Arc<Mutex<Vec<Record>>>) {
        let sink = Arc::new(Mutex::new(Vec::new()));
        let sink_handle = sink.clone();
        let rows = vec![
            record(json!({"id": 1, "name": "ada"})),
            record(json!({"id": 2, "name": ""})),
        ];
        let registry = ConnectorRegistry::new()
            .with(DataSourceType::RelationalDb, move || Box::new(FixedSource(rows.clone())))
            .with(DataSourceType::DataWarehouse, move || Box::new(Sink(sink_handle.clone())));
        let manager = IntegrationManager::new(Arc::new(MemoryStore::new()), registry)
            .with_transformation_engine(Arc::new(Uppercase));
        (manager, sink)
    }

    fn job(pattern: IntegrationPattern) -> IntegrationJob {
        IntegrationJob::new(
            "orders_sync",
            pattern,
            vec![DataSource::new("pg", DataSourceType::RelationalDb)],
            vec![DataSource::new("dw", DataSourceType::DataWarehouse)],
        )
    }

    fn transformation() -> DataTransformation {
        DataTransformation {
            transformation_id: "upper".to_string(),
            name: "upper".to_string(),
            description: String::new(),
            input_schema: "orders".to_string(),
            output_schema: "orders".to_string(),
            transformation_logic: json!({"op": "upper", "field": "name"}),
            validation_rules: Vec::new(),
            error_handling: ErrorHandling::Skip,
            dependencies: Vec::new(),
            metadata: Default::default(),
        }
    }

    #[test]
    fn test_job_validation() {
        let (manager, _) = setup();
        let mut unsupported = job(IntegrationPattern::Etl);
        unsupported.source_configs[0].source_type = DataSourceType::Stream;
        assert!(matches!(
            manager.create_integration_job(unsupported),
            Err(ArchError::InvalidInput(_))
        ));

        let mut bad_cron = job(IntegrationPattern::Etl);
        bad_cron.schedule = Some("every day".to_string());
        assert!(manager.create_integration_job(bad_cron).is_err());

        let mut no_targets = job(IntegrationPattern::Etl);
        no_targets.target_configs.clear();
        assert!(manager.create_integration_job(no_targets).is_err());
    }

    #[test]
    fn test_etl_with_transformation_and_quality() {
        let (manager, sink) = setup();
        let mut etl = job(IntegrationPattern::Etl);
        etl.transformations.push(transformation());
        etl.quality_checks = vec![RecordCheck::NoEmptyStrings];
        let etl = manager.create_integration_job(etl).unwrap();

        let result = manager.execute_integration_job(&etl.job_id).unwrap();
        assert_eq!(result.status, JobStatus::PartialSuccess);
        assert_eq!(result.records_processed, 2);
        assert_eq!(result.records_inserted, 2);
        assert_eq!(result.records_failed, 1);
        assert_eq!(result.warnings.len(), 1);

        let loaded = sink.lock().unwrap();
        assert_eq!(loaded[0]["name"], "ADA");
    }

    #[test]
    fn test_elt_loads_raw_records() {
        let (manager, sink) = setup();
        let mut elt = job(IntegrationPattern::Elt);
        elt.transformations.push(transformation());
        let elt = manager.create_integration_job(elt).unwrap();

        let result = manager.execute_integration_job(&elt.job_id).unwrap();
        assert_eq!(result.status, JobStatus::Success);
        assert_eq!(sink.lock().unwrap()[0]["name"], "ada");
    }

    #[test]
    fn test_connector_failure_is_recorded() {
        let (manager, _) = setup();
        let mut broken = job(IntegrationPattern::Batch);
        // Loading into the read-only source fails
        broken.target_configs = vec![DataSource::new("pg", DataSourceType::RelationalDb)];
        let broken = manager.create_integration_job(broken).unwrap();

        let result = manager.execute_integration_job(&broken.job_id).unwrap();
        assert_eq!(result.status, JobStatus::Failure);
        assert_eq!(result.errors[0].kind, "execution_error");
        assert_eq!(manager.get_integration_results(&broken.job_id, 10).unwrap().len(), 1);
    }

    #[test]
    fn test_streaming_inactive_and_missing_jobs() {
        let (manager, _) = setup();
        let streaming = manager.create_integration_job(job(IntegrationPattern::Streaming)).unwrap();
        assert!(matches!(
            manager.execute_integration_job(&streaming.job_id),
            Err(ArchError::Unsupported(_))
        ));

        let mut inactive = job(IntegrationPattern::Etl);
        inactive.active = false;
        let inactive = manager.create_integration_job(inactive).unwrap();
        assert!(matches!(
            manager.execute_integration_job(&inactive.job_id),
            Err(ArchError::InvalidState(_))
        ));

        assert!(manager.execute_integration_job("nope").unwrap_err().is_not_found());
    }

    #[test]
    fn test_results_newest_first() {
        let (manager, _) = setup();
        let etl = manager.create_integration_job(job(IntegrationPattern::Etl)).unwrap();
        let first = manager.execute_integration_job(&etl.job_id).unwrap();
        let second = manager.execute_integration_job(&etl.job_id).unwrap();

        let results = manager.get_integration_results(&etl.job_id, 10).unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[0].execution_time >= results[1].execution_time);
        assert_eq!(manager.get_integration_results(&etl.job_id, 1).unwrap().len(), 1);
        assert!([first.result_id, second.result_id].contains(&results[0].result_id));
    }

    #[test]
    fn test_results_are_not_shared_across_prefixed_job_ids() {
        let (manager, _) = setup();
        let mut short = job(IntegrationPattern::Etl);
        short.job_id = "nightly".to_string();
        let mut long = job(IntegrationPattern::Etl);
        long.job_id = "nightly_full".to_string();
        manager.create_integration_job(short).unwrap();
        manager.create_integration_job(long).unwrap();

        manager.execute_integration_job("nightly_full").unwrap();
        assert!(manager.get_integration_results("nightly", 10).unwrap().is_empty());
        assert_eq!(manager.get_integration_results("nightly_full", 10).unwrap().len(), 1);
    }

    #[test]
    fn test_cron_shapes() {
        assert!(check_cron("*/15 0-6 * * 1,3,5").is_ok());
        assert!(check_cron("0 0 * *").is_err());
        assert!(check_cron("0 0 * * mon").is_err());
        // The compiled pattern is reused
        assert!(std::ptr::eq(cron_field().unwrap(), cron_field().unwrap()));
    }

    #[test]
    fn test_async_execution() {
        let (manager, _) = setup();
        let etl = manager.create_integration_job(job(IntegrationPattern::Etl)).unwrap();
        let manager = Arc::new(manager);

        let runtime = tokio::runtime::Runtime::new().unwrap();
        let result = runtime
            .block_on(manager.clone().execute_integration_job_async(etl.job_id.clone()))
            .unwrap();
        assert_eq!(result.status, JobStatus::Success);
    }

    #[test]
    fn test_schedule_and_transformations() {
        let (manager, _) = setup();
        let etl = manager.create_integration_job(job(IntegrationPattern::Etl)).unwrap();
        manager.schedule_integration_job(&etl.job_id, "*/15 2-4 * * 1,3").unwrap();
        assert_eq!(
            manager.get_job(&etl.job_id).unwrap().unwrap().schedule.as_deref(),
            Some("*/15 2-4 * * 1,3")
        );
        assert!(manager.schedule_integration_job(&etl.job_id, "* * *").is_err());

        manager.create_data_transformation(transformation()).unwrap();
        let out = manager
            .apply_transformation(vec![record(json!({"name": "x"}))], "upper")
            .unwrap();
        assert_eq!(out[0]["name"], "X");
        assert!(manager.apply_transformation(vec![], "missing").unwrap_err().is_not_found());
    }

    #[test]
    fn test_conflict_resolution() {
        let (manager, _) = setup();
        let conflict = DataConflict {
            records: vec![
                record(json!({"id": 1, "source": "crm", "timestamp": "2024-01-01T00:00:00"})),
                record(json!({"id": 1, "source": "erp", "timestamp": "2024-03-01T00:00:00"})),
            ],
            source_priority: vec!["crm".to_string()],
        };
        let pick = |s| manager.resolve_conflicts(std::slice::from_ref(&conflict), s).remove(0);

        assert_eq!(pick(ConflictResolution::LatestWins)["source"], "erp");
        assert_eq!(pick(ConflictResolution::SourcePriority)["source"], "crm");
        assert_eq!(pick(ConflictResolution::Manual)["source"], "crm");

        let versioned = pick(ConflictResolution::Versioned);
        assert_eq!(versioned["current_version"], 1);
        assert_eq!(versioned["versions"].as_array().unwrap().len(), 2);

        let empty = manager.resolve_conflicts(&[DataConflict::default()], ConflictResolution::LatestWins);
        assert!(empty[0].is_empty());
    }
}
