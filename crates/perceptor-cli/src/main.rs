//! perceptor CLI: the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "perceptor",
    version,
    about = "Audit how LLMs perceive your product"
)]
struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the data directory holding projects and reports
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a full audit: every golden question against every enabled model
    Audit(commands::audit::AuditArgs),

    /// Run the single-model quick audit and print the JSON summary
    Quick(commands::quick::QuickArgs),

    /// Manage stored projects
    Project {
        #[command(subcommand)]
        action: commands::project::ProjectAction,
    },

    /// Inspect stored reports
    Reports {
        #[command(subcommand)]
        action: commands::reports::ReportsAction,
    },

    /// Compare two reports
    Compare(commands::compare::CompareArgs),

    /// Validate prompt set TOML files
    Validate {
        /// Path to prompt set file or directory
        #[arg(long)]
        prompts: PathBuf,
    },

    /// List available models
    ListModels {
        /// Filter to specific provider
        #[arg(long)]
        provider: Option<String>,
    },

    /// Create starter config and example prompt set
    Init,
}

#[tokio::main]
async fn main() {
    let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(
        "perceptor=info"
            .parse()
            .unwrap_or_else(|_| tracing_subscriber::filter::LevelFilter::INFO.into()),
    );
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let ctx = commands::Context {
        config_path: cli.config,
        data_dir: cli.data_dir,
    };

    let result = match cli.command {
        Commands::Audit(args) => commands::audit::execute(&ctx, args).await,
        Commands::Quick(args) => commands::quick::execute(&ctx, args).await,
        Commands::Project { action } => commands::project::execute(&ctx, action),
        Commands::Reports { action } => commands::reports::execute(&ctx, action),
        Commands::Compare(args) => commands::compare::execute(&ctx, args),
        Commands::Validate { prompts } => commands::validate::execute(prompts),
        Commands::ListModels { provider } => commands::list_models::execute(&ctx, provider),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
