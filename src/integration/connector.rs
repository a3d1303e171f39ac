//! Connector and transformation capabilities

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::{DataSourceType, DataTransformation, Record};
use crate::error::{ArchError, Result};

/// Connection to a source or target system.
///
/// A fresh connector is created per endpoint per job run.
pub trait DataConnector: Send {
    fn connect(&mut self, config: &serde_json::Map<String, serde_json::Value>) -> Result<()>;

    fn extract(&mut self, query: Option<&str>) -> Result<Vec<Record>>;

    /// Load records, returning how many were written
    fn load(&mut self, records: &[Record]) -> Result<usize>;

    fn disconnect(&mut self);
}

/// Builds a connector for one endpoint
pub type ConnectorFactory = Arc<dyn Fn() -> Box<dyn DataConnector> + Send + Sync>;

/// Connector factories keyed by source type
#[derive(Clone, Default)]
pub struct ConnectorRegistry {
    factories: HashMap<DataSourceType, ConnectorFactory>,
}

impl ConnectorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, source_type: DataSourceType, factory: F)
    where
        F: Fn() -> Box<dyn DataConnector> + Send + Sync + 'static,
    {
        self.factories.insert(source_type, Arc::new(factory));
    }

    pub fn with<F>(mut self, source_type: DataSourceType, factory: F) -> Self
    where
        F: Fn() -> Box<dyn DataConnector> + Send + Sync + 'static,
    {
        self.register(source_type, factory);
        self
    }

    pub fn supports(&self, source_type: DataSourceType) -> bool {
        self.factories.contains_key(&source_type)
    }

    pub fn create(&self, source_type: DataSourceType) -> Result<Box<dyn DataConnector>> {
        self.factories
            .get(&source_type)
            .map(|factory| factory())
            .ok_or_else(|| ArchError::CapabilityMissing(format!("connector for {source_type:?}")))
    }
}

impl fmt::Debug for ConnectorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectorRegistry")
            .field("source_types", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Executes transformation logic over records
pub trait TransformationEngine: Send + Sync {
    fn apply(&self, transformation: &DataTransformation, records: Vec<Record>) -> Result<Vec<Record>>;
}
