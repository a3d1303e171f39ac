//! Data integration
//!
//! Jobs move records from source connectors to target connectors, optionally
//! through transformations and record-level quality checks.

pub mod connector;
pub mod manager;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use connector::{ConnectorFactory, ConnectorRegistry, DataConnector, TransformationEngine};
pub use manager::IntegrationManager;

/// A single data record
pub type Record = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSourceType {
    RelationalDb,
    NosqlDb,
    RestApi,
    GraphqlApi,
    FileSystem,
    Stream,
    MessageQueue,
    CloudStorage,
    DataWarehouse,
    DataLake,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrationPattern {
    Etl,
    Elt,
    Streaming,
    Cdc,
    Batch,
    MicroBatch,
    EventDriven,
    SyncReplication,
    AsyncReplication,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataFormat {
    #[default]
    Json,
    Xml,
    Csv,
    Parquet,
    Avro,
    Protobuf,
    Yaml,
    Binary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictResolution {
    #[default]
    LatestWins,
    SourcePriority,
    Manual,
    CustomLogic,
    Versioned,
}

/// What to do when a transformation fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorHandling {
    /// Keep the untransformed records
    #[default]
    Skip,
    /// Abort the job
    Fail,
    /// Keep the untransformed records and record a warning
    Log,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Running,
    Success,
    PartialSuccess,
    Failure,
}

/// Record-level quality checks applied during integration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordCheck {
    /// No value is null
    NotNull,
    /// No string value is empty
    NoEmptyStrings,
}

impl RecordCheck {
    pub fn passes(&self, record: &Record) -> bool {
        match self {
            RecordCheck::NotNull => record.values().all(|v| !v.is_null()),
            RecordCheck::NoEmptyStrings => record.values().all(|v| v.as_str() != Some("")),
        }
    }
}

/// Source or target endpoint of a job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSource {
    #[serde(default)]
    pub source_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub source_type: DataSourceType,
    #[serde(default)]
    pub connection_config: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub format: DataFormat,
    #[serde(default)]
    pub schema_mapping: BTreeMap<String, String>,
    #[serde(default)]
    pub extraction_query: Option<String>,
    #[serde(default)]
    pub incremental_field: Option<String>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

fn default_batch_size() -> usize {
    1000
}

impl DataSource {
    pub fn new(name: impl Into<String>, source_type: DataSourceType) -> Self {
        Self {
            source_id: String::new(),
            name: name.into(),
            source_type,
            connection_config: serde_json::Map::new(),
            format: DataFormat::Json,
            schema_mapping: BTreeMap::new(),
            extraction_query: None,
            incremental_field: None,
            batch_size: default_batch_size(),
            metadata: BTreeMap::new(),
        }
    }
}

/// Reusable transformation definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataTransformation {
    #[serde(default)]
    pub transformation_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub input_schema: String,
    pub output_schema: String,
    /// SQL text or a structured definition, interpreted by the engine
    pub transformation_logic: serde_json::Value,
    #[serde(default)]
    pub validation_rules: Vec<String>,
    #[serde(default)]
    pub error_handling: ErrorHandling,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

/// Integration job configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrationJob {
    #[serde(default)]
    pub job_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub pattern: IntegrationPattern,
    pub source_configs: Vec<DataSource>,
    pub target_configs: Vec<DataSource>,
    #[serde(default)]
    pub transformations: Vec<DataTransformation>,
    /// Five-field cron expression
    #[serde(default)]
    pub schedule: Option<String>,
    /// 1 (lowest) to 10
    #[serde(default = "default_priority")]
    pub priority: u8,
    #[serde(default)]
    pub conflict_resolution: ConflictResolution,
    #[serde(default)]
    pub quality_checks: Vec<RecordCheck>,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub created_by: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

fn default_priority() -> u8 {
    5
}

fn default_true() -> bool {
    true
}

impl IntegrationJob {
    pub fn new(
        name: impl Into<String>,
        pattern: IntegrationPattern,
        source_configs: Vec<DataSource>,
        target_configs: Vec<DataSource>,
    ) -> Self {
        Self {
            job_id: String::new(),
            name: name.into(),
            description: String::new(),
            pattern,
            source_configs,
            target_configs,
            transformations: Vec::new(),
            schedule: None,
            priority: default_priority(),
            conflict_resolution: ConflictResolution::LatestWins,
            quality_checks: Vec::new(),
            active: true,
            created_by: String::new(),
            created_at: None,
        }
    }
}

/// Error or warning attached to a job result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobIssue {
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    #[serde(default)]
    pub record: Option<Record>,
}

impl JobIssue {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            record: None,
        }
    }
}

/// Outcome of one job execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrationResult {
    pub result_id: String,
    pub job_id: String,
    pub execution_time: DateTime<Utc>,
    pub status: JobStatus,
    pub records_processed: usize,
    pub records_inserted: usize,
    pub records_updated: usize,
    pub records_failed: usize,
    /// Seconds
    pub execution_duration: f64,
    #[serde(default)]
    pub errors: Vec<JobIssue>,
    #[serde(default)]
    pub warnings: Vec<JobIssue>,
    #[serde(default)]
    pub metrics: BTreeMap<String, serde_json::Value>,
}

/// A record that failed a quality check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityIssue {
    pub record: Record,
    pub rule: RecordCheck,
    pub violation: String,
}

/// Result of checking a batch of records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityValidation {
    pub passed: bool,
    pub total_records: usize,
    pub valid_records: usize,
    pub invalid_records: usize,
    pub issues: Vec<QualityIssue>,
}

/// Competing versions of the same record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataConflict {
    pub records: Vec<Record>,
    /// Source names, highest priority first
    #[serde(default)]
    pub source_priority: Vec<String>,
}

/// Entity counts for status reporting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrationCounts {
    pub jobs: usize,
    pub active_jobs: usize,
    pub transformations: usize,
    pub results: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: serde_json::Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_record_checks() {
        let good = record(json!({"id": 1, "name": "a"}));
        let null = record(json!({"id": null, "name": "a"}));
        let empty = record(json!({"id": 2, "name": ""}));

        assert!(RecordCheck::NotNull.passes(&good));
        assert!(!RecordCheck::NotNull.passes(&null));
        assert!(RecordCheck::NotNull.passes(&empty));
        assert!(!RecordCheck::NoEmptyStrings.passes(&empty));
        assert!(RecordCheck::NoEmptyStrings.passes(&null));
    }

    #[test]
    fn test_unknown_names_are_rejected() {
        assert!(serde_json::from_value::<RecordCheck>(json!("not_null")).is_ok());
        assert!(serde_json::from_value::<RecordCheck>(json!("sometimes_null")).is_err());
        assert!(serde_json::from_value::<ErrorHandling>(json!("retry")).is_err());
        assert!(serde_json::from_value::<ConflictResolution>(json!("coin_flip")).is_err());
    }

    #[test]
    fn test_job_defaults() {
        let job: IntegrationJob = serde_json::from_value(json!({
            "name": "sync",
            "pattern": "etl",
            "source_configs": [{"name": "pg", "type": "relational_db"}],
            "target_configs": [{"name": "dw", "type": "data_warehouse"}]
        }))
        .unwrap();
        assert_eq!(job.priority, 5);
        assert!(job.active);
        assert_eq!(job.conflict_resolution, ConflictResolution::LatestWins);
        assert_eq!(job.source_configs[0].batch_size, 1000);
    }
}
