//! Data Architecture CLI
//!
//! Manage schemas, data domains and the metadata catalog from the command line.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use data_architecture::metadata::SearchFilters;
use data_architecture::orchestrator::StepOutcome;
use data_architecture::schema::compatibility::render_document_diff;
use data_architecture::{ArchitectureConfig, DataArchitectureOrchestrator, DomainConfig, Schema, SchemaVersion};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "datarch")]
#[command(about = "Schema lifecycle, governance and metadata catalog management")]
struct Cli {
    /// Explicit config file layered over the default locations
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured base path
    #[arg(short, long)]
    base_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the directory layout and seed default rules
    Init {
        /// Also write the effective configuration to this file
        #[arg(long)]
        write_config: Option<PathBuf>,
    },

    /// Schema lifecycle
    #[command(subcommand)]
    Schema(SchemaCommand),

    /// Data domains
    #[command(subcommand)]
    Domain(DomainCommand),

    /// Search the metadata catalog
    Search {
        query: String,
        /// Only resources of this system
        #[arg(long)]
        system: Option<String>,
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show architecture status
    Status,

    /// Generate architecture documentation
    Docs {
        /// Also copy the document here
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run a quality assessment
    Assess {
        #[arg(default_value = "all")]
        scope: String,
    },
}

#[derive(Subcommand)]
enum SchemaCommand {
    /// Create a schema from a JSON file
    Create { file: PathBuf },

    /// Replace a schema from a JSON file and record a new version
    Update {
        file: PathBuf,
        /// Who made the change
        #[arg(long, default_value = "cli")]
        author: String,
        #[arg(short, long, default_value = "")]
        description: String,
    },

    /// Print a stored schema as JSON
    Show { name: String },

    /// List the version history, newest first
    Versions { name: String },

    /// Validate a schema file without storing it
    Validate { file: PathBuf },

    /// Line diff between the stored schema and a file
    Diff { name: String, file: PathBuf },

    /// Recompute and compare the content hash
    Verify {
        /// Schema name (or "all")
        #[arg(default_value = "all")]
        name: String,
    },

    /// List stored schemas
    List,
}

#[derive(Subcommand)]
enum DomainCommand {
    /// Create a domain from a JSON config file
    Create {
        name: String,
        file: PathBuf,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let content = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = ArchitectureConfig::load_from(cli.config.as_deref()).context("loading configuration")?;
    if let Some(base_path) = cli.base_path {
        config.base_path = base_path;
    }
    config.base_path = config.resolved_base_path();

    let search_limit = config.search_limit;
    let orchestrator = DataArchitectureOrchestrator::new(config)?;

    match cli.command {
        Commands::Init { write_config } => {
            println!("✅ Initialized at {}", orchestrator.config().base_path.display());
            if let Some(path) = write_config {
                orchestrator.config().save(&path)?;
                println!("   config written to {}", path.display());
            }
        }

        Commands::Schema(command) => run_schema(&orchestrator, command)?,

        Commands::Domain(DomainCommand::Create { name, file }) => {
            let domain: DomainConfig = read_json(&file)?;
            let report = orchestrator.create_data_domain(&name, &domain)?;

            println!("✅ Domain {} created", report.domain);
            for warning in &report.schema.warnings {
                println!("   ⚠️  {warning}");
            }
            for (step, outcome) in [
                ("governance", &report.governance),
                ("metadata", &report.metadata),
                ("integration", &report.integration),
            ] {
                match outcome {
                    StepOutcome::Disabled => println!("   {step}: disabled"),
                    StepOutcome::Skipped => println!("   {step}: nothing configured"),
                    StepOutcome::Completed { ids } => println!("   {step}: {}", ids.join(", ")),
                    StepOutcome::Failed { error } => println!("   ❌ {step}: {error}"),
                }
            }
        }

        Commands::Search { query, system, limit } => {
            let Some(metadata) = orchestrator.metadata() else {
                bail!("metadata management is disabled");
            };
            let filters = SearchFilters {
                system,
                ..Default::default()
            };
            let results = metadata.search_resources(&query, &filters, limit.unwrap_or(search_limit))?;
            if results.is_empty() {
                println!("No resources match {query:?}");
            }
            for result in results {
                println!(
                    "{:>6.1}  {} ({} in {})",
                    result.score, result.resource.name, result.resource.resource_type, result.resource.system
                );
                println!("        {}", result.snippet);
            }
        }

        Commands::Status => {
            let status = orchestrator.get_architecture_status()?;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }

        Commands::Docs { output } => {
            let doc = orchestrator.generate_architecture_documentation()?;
            if let Some(path) = output {
                std::fs::write(&path, &doc)?;
                println!("✅ Documentation written to {}", path.display());
            } else {
                println!("{doc}");
            }
        }

        Commands::Assess { scope } => {
            let assessment = orchestrator.run_quality_assessment(&scope)?;
            println!("{}", serde_json::to_string_pretty(&assessment)?);
        }
    }

    Ok(())
}

fn run_schema(orchestrator: &DataArchitectureOrchestrator, command: SchemaCommand) -> anyhow::Result<()> {
    let schemas = orchestrator.schemas();

    let stored = |name: &str| -> anyhow::Result<Schema> {
        match schemas.get_schema(name)? {
            Some(schema) => Ok(schema),
            None => {
                let suggestions = schemas.suggest_schema_names(name, 3)?;
                if suggestions.is_empty() {
                    bail!("schema {name} not found");
                }
                bail!("schema {name} not found (did you mean: {})", suggestions.join(", "));
            }
        }
    };

    match command {
        SchemaCommand::Create { file } => {
            let schema: Schema = read_json(&file)?;
            let report = schemas.create_schema(&schema)?;
            println!("✅ Schema {} {} created", schema.name, schema.version);
            for warning in report.warnings {
                println!("   ⚠️  {warning}");
            }
        }

        SchemaCommand::Update { file, author, description } => {
            let schema: Schema = read_json(&file)?;
            let version = SchemaVersion::new(schema.version.clone(), author, description);
            let update = schemas.update_schema(&schema, version)?;
            if update.breaking_changes.is_empty() {
                println!("✅ Schema {} updated to {}", schema.name, schema.version);
            } else {
                println!("⚠️  Schema {} updated to {} with breaking changes:", schema.name, schema.version);
                for change in &update.breaking_changes {
                    println!("   └─ {change}");
                }
            }
            if let Some(migration) = update.migration {
                println!("   migration: {migration}");
            }
        }

        SchemaCommand::Show { name } => {
            println!("{}", serde_json::to_string_pretty(&stored(&name)?)?);
        }

        SchemaCommand::Versions { name } => {
            stored(&name)?;
            for version in schemas.get_schema_versions(&name)? {
                let marker = if version.breaking_changes { "❗" } else { "  " };
                println!(
                    "{marker} {}  {}  {}  {}",
                    version.version,
                    version.created_at.to_rfc3339(),
                    version.created_by,
                    version.description
                );
            }
        }

        SchemaCommand::Validate { file } => {
            let schema: Schema = read_json(&file)?;
            let report = schemas.validate_schema(&schema);
            for error in &report.errors {
                println!("❌ {error}");
            }
            for warning in &report.warnings {
                println!("⚠️  {warning}");
            }
            if !report.valid {
                std::process::exit(1);
            }
            println!("✅ {} is valid", schema.name);
        }

        SchemaCommand::Diff { name, file } => {
            let current = stored(&name)?;
            let proposed: Schema = read_json(&file)?;
            print!("{}", render_document_diff(&current, &proposed)?);
        }

        SchemaCommand::Verify { name } => {
            let names = if name == "all" {
                schemas.list_schemas()?
            } else {
                vec![name]
            };
            let mut all_valid = true;
            for name in names {
                if schemas.verify_schema(&name)? {
                    println!("  ✅ {name} - valid");
                } else {
                    println!("  ❌ {name} - INVALID");
                    all_valid = false;
                }
            }
            if !all_valid {
                std::process::exit(1);
            }
        }

        SchemaCommand::List => {
            for name in schemas.list_schemas()? {
                println!("{name}");
            }
        }
    }
    Ok(())
}
