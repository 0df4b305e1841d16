//! crudcraft CLI - generate models and CRUD controllers from entity descriptors

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process;

use chrono::Local;
use crudcraft::codegen::filter::{self, OutputNames};
use crudcraft::codegen::{self, log, ConfigOverrides, PhaseReport, ProjectConfig};
use crudcraft::CodegenError;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "crudcraft")]
#[command(version, about = "Generate models and CRUD controllers from entity descriptors", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate model and controller classes
    Generate(ProjectArgs),

    /// Load configuration and descriptors and list the generatable entities
    Validate(ProjectArgs),
}

#[derive(Args)]
struct ProjectArgs {
    /// Path to crudcraft.yaml
    #[arg(short, long, default_value = codegen::project_config::DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Descriptor file or directory (overrides config)
    #[arg(short, long)]
    source: Option<PathBuf>,

    /// Root namespace of the generated project (overrides config)
    #[arg(short, long)]
    namespace: Option<String>,

    /// Storage-context class name (overrides config)
    #[arg(short, long)]
    db_context: Option<String>,

    /// Output root directory (overrides config)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Maximum number of concurrent generation jobs per phase
    #[arg(short = 'j', long)]
    max_workers: Option<usize>,
}

impl ProjectArgs {
    fn load(self) -> Result<ProjectConfig, CodegenError> {
        let mut config = ProjectConfig::load_or_default(&self.config)?;
        config.apply_env()?;
        config.apply_overrides(ConfigOverrides {
            source: self.source,
            project_namespace: self.namespace,
            db_context: self.db_context,
            output_root: self.output,
            max_workers: self.max_workers,
        });
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let (result, log_dir) = match cli.command {
        Commands::Generate(args) => run(args, generate).await,
        Commands::Validate(args) => run(args, validate).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        let error_log = log_dir.join(log::log_file_name("ErrorLog", Local::now()));
        if let Err(log_err) = log::append_error(&error_log, &e) {
            eprintln!("Failed to write error log: {}", log_err);
        }
        process::exit(1);
    }
}

async fn run<F, Fut>(args: ProjectArgs, command: F) -> (Result<(), CodegenError>, PathBuf)
where
    F: FnOnce(ProjectConfig) -> Fut,
    Fut: std::future::Future<Output = Result<(), CodegenError>>,
{
    match args.load() {
        Ok(config) => {
            let log_dir = config.log_dir.clone();
            (command(config).await, log_dir)
        }
        Err(e) => (Err(e), PathBuf::from(".")),
    }
}

/// Generate models and controllers
async fn generate(config: ProjectConfig) -> Result<(), CodegenError> {
    println!("🔧 Creating models and controllers from {}...", config.source.display());

    let report = match codegen::generate_from_config(&config).await {
        Ok(report) => report,
        Err(CodegenError::ControllerPhase { cause, models }) => {
            print_models(&config, &models);
            print_log_path(&models.log_path);
            return Err(*cause);
        }
        Err(e) => return Err(e),
    };

    print_models(&config, &report.models);
    println!(
        "  ✓ Generated {} controllers in {}",
        report.controllers.lines.len(),
        config.controllers_dir().display()
    );
    print_log_path(&report.models.log_path);
    print_log_path(&report.controllers.log_path);

    println!("✨ Controllers creation completed!");
    Ok(())
}

/// Validate configuration and descriptors without writing files
async fn validate(config: ProjectConfig) -> Result<(), CodegenError> {
    println!("🔍 Validating {}...", config.source.display());

    let entities = codegen::load_descriptors(&config.source)?;
    let generatable: Vec<_> =
        filter::filter_entities(&entities, &config.context_base_type).collect();

    println!(
        "  ✓ {} entities loaded, {} generatable",
        entities.len(),
        generatable.len()
    );

    let names = OutputNames::from_entities(generatable.iter().copied());
    let mut first_error = None;
    for entity in &generatable {
        println!("    - {} ({} fields)", entity.name, entity.fields.len());

        let check = names.check(entity).and_then(|_| codegen::key_field(entity).map(|_| ()));
        if let Err(e) = check {
            println!("      ✗ {}", e);
            first_error.get_or_insert(e);
        }
    }

    if let Some(e) = first_error {
        return Err(e);
    }

    println!("✨ All configurations valid!");
    Ok(())
}

fn print_models(config: &ProjectConfig, models: &PhaseReport) {
    println!(
        "  ✓ Generated {} models in {}",
        models.lines.len(),
        config.models_dir().display()
    );
    for skipped in &models.skipped {
        println!("  ⚠ Skipped model for {}: {}", skipped.entity, skipped.cause);
    }
}

fn print_log_path(path: &Path) {
    println!("  ℹ Log written to {}", path.display());
}
