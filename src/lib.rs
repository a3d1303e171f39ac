//! Data Architecture
//!
//! Schema lifecycle, data governance, data integration and metadata catalog
//! managers persisted as JSON documents, with an orchestrator that composes
//! them into cross-cutting workflows.
//!
//! ## Features
//!
//! - **Schema Versioning**: Content-hashed schema documents with version history,
//!   breaking-change detection and generated migration scripts
//! - **Governance**: Access policies with an audit trail, quality and compliance
//!   rules, data lineage and data owners
//! - **Integration**: ETL/ELT jobs over pluggable connectors and transformation engines
//! - **Metadata Catalog**: Resources, relationships, extraction rules and weighted search
//!
//! ## Layout
//!
//! ```text
//! {base_path}/
//! ├── schemas/
//! │   ├── definitions/{name}.json
//! │   ├── versions/{name}_versions.json
//! │   ├── governance/{name}_governance.json
//! │   └── migrations/{name}_{version}_migration.sql
//! ├── governance/
//! ├── integration/
//! ├── metadata/
//! ├── reports/
//! └── architecture_documentation.md
//! ```

pub mod checksum;
pub mod config;
pub mod error;
pub mod governance;
pub mod graph;
pub mod integration;
pub mod metadata;
pub mod orchestrator;
pub mod schema;
pub mod store;

pub use checksum::Checksum;
pub use config::ArchitectureConfig;
pub use error::{ArchError, Result};
pub use governance::GovernanceManager;
pub use integration::IntegrationManager;
pub use metadata::MetadataManager;
pub use orchestrator::{DataArchitectureOrchestrator, DomainConfig, SchemaDeployer};
pub use schema::{Schema, SchemaField, SchemaManager, SchemaType, SchemaVersion};
pub use store::{DocumentStore, FsStore, JsonStoreExt, MemoryStore};
