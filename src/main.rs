//! Extension Tester CLI - run source-adapter scripts against a map selection

mod commands;

use clap::{Parser, Subcommand};
use extension_tester::config::{self, TesterConfig};
use extension_tester::output::OutputFormat;
use extension_tester::{ui, BoundingBox};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "extension-tester")]
#[command(version)]
#[command(about = "Tester harness for landmark source adapters")]
#[command(long_about = r#"
Extension Tester runs source-adapter scripts against a map selection:
  • Scripts see `boundingBox`, `boundingCircle` and `getVariableFromStorage(name)`
  • Allow-listed packages load with `require(name)` (default: "http")
  • Results must be an array of landmarks {lat, lng, name, description, types}

Example usage:
  extension-tester run --script places.rhai --bbox 51.505,-0.129,51.495,-0.119 --var apiKey=...
  extension-tester circle --bbox 51.505,-0.129,51.495,-0.119
  extension-tester serve --port 8787
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the config file (defaults to ./extension-tester.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a script and print the landmarks it returns
    Run {
        /// Script file, or - for stdin
        #[arg(short, long)]
        script: PathBuf,

        /// Adapter name (defaults to the configured or first adapter)
        #[arg(short, long)]
        adapter: Option<String>,

        /// Map selection as lat1,lng1,lat2,lng2 (two opposite corners)
        #[arg(short, long, allow_hyphen_values = true)]
        bbox: Option<BoundingBox>,

        /// Variable exposed to the script, as key=value (repeatable)
        #[arg(long = "var", value_parser = commands::parse_variable)]
        vars: Vec<(String, String)>,

        /// JSON object file with variables; --var entries override it
        #[arg(long)]
        vars_file: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },

    /// Show the bounding circle of a selection
    Circle {
        /// Map selection as lat1,lng1,lat2,lng2
        #[arg(short, long, allow_hyphen_values = true)]
        bbox: BoundingBox,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// List registered adapters
    Adapters,

    /// Serve the harness HTTP API
    Serve {
        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,

        /// Directory with the browser UI build (overrides config)
        #[arg(long)]
        static_dir: Option<PathBuf>,
    },

    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config_path = cli.config.clone().unwrap_or_else(config::default_config_path);
    let config = match config::load_config(Some(&config_path))? {
        Some(config) => {
            tracing::debug!("Loaded config from {}", config_path.display());
            config
        }
        None => TesterConfig::default(),
    };

    match cli.command {
        Commands::Run { script, adapter, bbox, vars, vars_file, format } => {
            let options = commands::RunOptions {
                script,
                adapter,
                bbox,
                variables: vars,
                variables_file: vars_file,
                format,
            };
            if !commands::run_script(&config, options).await? {
                std::process::exit(1);
            }
        }

        Commands::Circle { bbox, format } => commands::run_circle(bbox, format)?,

        Commands::Adapters => commands::run_adapters(&config)?,

        Commands::Serve { port, static_dir } => {
            let mut config = config;
            if let Some(port) = port {
                config.server.port = port;
            }
            if static_dir.is_some() {
                config.server.static_dir = static_dir;
            }
            ui::banner("Extension Tester", &format!("Adapters: {}", adapter_names(&config)?));
            extension_tester::server::start_server(&config).await?;
        }

        Commands::Init { force } => commands::run_init(&config_path, force)?,
    }

    Ok(())
}

fn adapter_names(config: &TesterConfig) -> anyhow::Result<String> {
    let registry = extension_tester::adapter::default_registry(config)?;
    Ok(registry
        .adapters()
        .iter()
        .map(|a| a.name.as_str())
        .collect::<Vec<_>>()
        .join(", "))
}
