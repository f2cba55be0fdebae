pub mod types;
pub mod config;
pub mod table;
pub mod data;
pub mod processing;
pub mod scene;
pub mod render;
pub mod server;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the PV heatmap and serve it on localhost
    Show {
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
    /// Build the PV heatmap and print the plotly figure as JSON
    Export {
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<config::AppConfig> {
    match path {
        Some(path) => config::AppConfig::load_from_file(path),
        None => config::AppConfig::load_or_default(&PathBuf::from("config.toml")),
    }
}

fn build_scene(app_config: &config::AppConfig) -> Result<scene::Scene> {
    // 1. Load
    let inputs = data::load_inputs(app_config)?;

    // 2. Filter
    let pv = processing::filter_pv(&inputs.connections, &app_config.filter);
    let substations = processing::select_substations(&inputs.substations, &app_config.substations);

    // 3. Compose
    Ok(scene::compose(&inputs.boundaries, &pv, &substations, app_config))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Show { config } => {
            let app_config = load_config(config.as_ref())?;
            let scene = build_scene(&app_config)?;
            server::start_server(&app_config, &scene).await?;
        }
        Commands::Export { config } => {
            let app_config = load_config(config.as_ref())?;
            let scene = build_scene(&app_config)?;
            let figure = render::to_figure(&scene)?;
            println!("{}", serde_json::to_string_pretty(&figure)?);
        }
    }

    Ok(())
}
