//! Bow CLI - declarative Kubernetes deployments without templates

use clap::{Parser, Subcommand};
use miette::Result;
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(name = "bow")]
#[command(author = "Bow Contributors")]
#[command(version)]
#[command(about = "Declarative Kubernetes deployments without templates", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a chart, stack, or workspace as YAML
    Template {
        /// Chart name (omit to render a stack or workspace)
        chart: Option<String>,

        /// Values or stack file(s) to merge
        #[arg(short = 'f', long = "values")]
        values: Vec<PathBuf>,

        /// Set values on the command line (key=value)
        #[arg(long = "set")]
        set: Vec<String>,

        /// Target namespace
        #[arg(short, long)]
        namespace: Option<String>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Stage overlay (values.<stage>.yaml)
        #[arg(long = "stage")]
        stages: Vec<String>,

        /// Workspace directory
        #[arg(short = 'C', long = "dir", default_value = ".")]
        dir: PathBuf,
    },

    /// Deploy a chart, stack, or workspace via kubectl
    Up {
        /// Chart name (omit to deploy a stack or workspace)
        chart: Option<String>,

        /// Values or stack file(s) to merge
        #[arg(short = 'f', long = "values")]
        values: Vec<PathBuf>,

        /// Set values on the command line (key=value)
        #[arg(long = "set")]
        set: Vec<String>,

        /// Target namespace
        #[arg(short, long)]
        namespace: Option<String>,

        /// Create the namespace if it does not exist
        #[arg(long)]
        create_namespace: bool,

        /// Pass --dry-run=client to kubectl apply
        #[arg(long)]
        dry_run: bool,

        /// Stage overlay (values.<stage>.yaml)
        #[arg(long = "stage")]
        stages: Vec<String>,

        /// Workspace directory
        #[arg(short = 'C', long = "dir", default_value = ".")]
        dir: PathBuf,
    },

    /// Create or update the workspace lock file
    Lock {
        /// Create a new lock file for the given chart
        #[arg(long, value_name = "CHART")]
        init: Option<String>,

        /// Create the lock in stack mode (with --init)
        #[arg(long)]
        stack: bool,

        /// Kubernetes namespace to record in the lock
        #[arg(short, long)]
        namespace: Option<String>,

        /// Record the create-namespace flag in the lock
        #[arg(long)]
        create_namespace: bool,

        /// Workspace directory
        #[arg(short = 'C', long = "dir", default_value = ".")]
        dir: PathBuf,
    },

    /// Show workspace status: lock target, files, drift
    Status {
        /// Stage overlay to show
        #[arg(long = "stage")]
        stages: Vec<String>,

        /// Workspace directory
        #[arg(short = 'C', long = "dir", default_value = ".")]
        dir: PathBuf,
    },

    /// List registered charts
    List,
}

fn main() -> Result<()> {
    // Setup miette for nice error display
    miette::set_panic_hook();

    let cli = Cli::parse();

    init_tracing(cli.debug);
    if cli.debug {
        std::env::set_var("RUST_BACKTRACE", "1");
    }

    match cli.command {
        Commands::Template {
            chart,
            values,
            set,
            namespace,
            output,
            stages,
            dir,
        } => commands::template::run(
            chart.as_deref(),
            &values,
            &set,
            namespace.as_deref(),
            output.as_deref(),
            &stages,
            &dir,
            cli.debug,
        ),

        Commands::Up {
            chart,
            values,
            set,
            namespace,
            create_namespace,
            dry_run,
            stages,
            dir,
        } => commands::up::run(
            chart.as_deref(),
            &values,
            &set,
            namespace.as_deref(),
            create_namespace,
            dry_run,
            &stages,
            &dir,
            cli.debug,
        ),

        Commands::Lock {
            init,
            stack,
            namespace,
            create_namespace,
            dir,
        } => commands::lock::run(
            init.as_deref(),
            stack,
            namespace.as_deref(),
            create_namespace,
            &dir,
        ),

        Commands::Status { stages, dir } => commands::status::run(&stages, &dir),

        Commands::List => commands::list::run(),
    }
}

fn init_tracing(debug: bool) {
    let default = if debug { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}
