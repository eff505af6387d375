//! ewave CLI - build the eWAVE CLDF dataset
//!
//! ```bash
//! ewave download               # Fetch and unpack the raw export into raw/
//! ewave makecldf               # Convert raw/ into cldf/ and validate it
//! ewave validate --extent      # Re-validate cldf/, checking 77 varieties and 235 features
//! ewave readme -o README.md    # Render the dataset README
//! ```
//!
//! Paths default to `raw/`, `cldf/` and `metadata.json`, or the `EWAVE_*`
//! environment variables.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use ewave::download::download_and_unpack;
use ewave::logging::init_logging;
use ewave::{check_extent, run, validate_dataset, Config, Dataset, DatasetMetadata, Extent};
use tracing::info;

#[derive(Parser)]
#[command(name = "ewave")]
#[command(about = "Build the eWAVE CLDF dataset", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Directory of the raw export
    #[arg(long, global = true)]
    raw_dir: Option<PathBuf>,

    /// Output directory of the CLDF dataset
    #[arg(long, global = true)]
    cldf_dir: Option<PathBuf>,

    /// Dataset metadata file
    #[arg(long, global = true)]
    metadata: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download and unpack the raw export
    Download {
        /// Archive URL (default: the published eWAVE export)
        #[arg(long)]
        url: Option<String>,
    },

    /// Convert the raw export to CLDF and validate the result
    Makecldf,

    /// Validate an existing CLDF dataset
    Validate {
        /// Also check the number of varieties and features
        #[arg(long)]
        extent: bool,
    },

    /// Render the dataset README
    Readme {
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.verbose) {
        eprintln!("Warning: logging not initialized: {}", e);
    }

    let config = Config::from_env()
        .with_raw_dir(cli.raw_dir)
        .with_cldf_dir(cli.cldf_dir)
        .with_metadata_path(cli.metadata);

    let result = match cli.command {
        Commands::Download { url } => cmd_download(&config, url.as_deref()).await,
        Commands::Makecldf => cmd_makecldf(&config),
        Commands::Validate { extent } => cmd_validate(&config, extent),
        Commands::Readme { output } => cmd_readme(&config, output.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

type CliResult = Result<(), Box<dyn std::error::Error>>;

async fn cmd_download(config: &Config, url: Option<&str>) -> CliResult {
    let url = url.unwrap_or(config.download_url.as_str());
    let files = download_and_unpack(url, &config.raw_dir).await?;
    eprintln!("Unpacked {} files into {}", files.len(), config.raw_dir.display());
    Ok(())
}

fn cmd_makecldf(config: &Config) -> CliResult {
    let summary = run(config)?;
    eprintln!(
        "Wrote {}: {} varieties, {} features, {} values, {} examples",
        config.cldf_dir.display(),
        summary.languages,
        summary.parameters,
        summary.values,
        summary.examples
    );
    Ok(())
}

fn cmd_validate(config: &Config, extent: bool) -> CliResult {
    let dataset = Dataset::read(&config.cldf_metadata())?;
    validate_dataset(&dataset)?;
    if extent {
        check_extent(&dataset, &Extent::default())?;
    }
    info!(dir = %config.cldf_dir.display(), "dataset is valid");
    eprintln!("{} is valid", config.cldf_dir.display());
    Ok(())
}

fn cmd_readme(config: &Config, output: Option<&Path>) -> CliResult {
    let metadata = DatasetMetadata::load_optional(&config.metadata_path)?.unwrap_or_default();
    let dataset = Dataset::read(&config.cldf_metadata())?;
    let markdown = metadata.markdown(&dataset.counts());

    match output {
        Some(path) => {
            fs::write(path, &markdown)?;
            eprintln!("README written to: {}", path.display());
        }
        None => println!("{}", markdown),
    }
    Ok(())
}
