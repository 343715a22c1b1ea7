use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tract_gap_maps::{config, crs, export};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Census tract mortgage approval gap maps", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export one SVG map per configured metro and year
    Export {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
    /// Add WGS84 CRS metadata to tract GeoJSON files that lack it
    FixCrs {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Export { config } => {
            let app_config = config::AppConfig::load_or_default(config)?;
            let report = export::export_all(&app_config);
            if report.failed > 0 {
                tracing::warn!("{} maps failed to export", report.failed);
            }
        }
        Commands::FixCrs { config } => {
            let app_config = config::AppConfig::load_or_default(config)?;
            crs::fix_crs_in_dir(&app_config.input.dir)?;
        }
    }

    Ok(())
}
