use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Parser;
use ppclassify_lib::morningstar_api::Client;
use ppclassify_lib::{PortfolioFile, SecidCache, TaxonomyKind, CACHE_FILE};

/// Reads a portfolio document and auto-classifies the securities in it by
/// asset-type, stock-style, sector, holdings, region and country weights.
/// Each security needs an ISIN.
#[derive(Parser)]
#[command(name = "ppclassify")]
struct Cli {
    /// Morningstar domain from which to resolve secids (e.g. es, de, fr)
    #[arg(short, long, default_value = "de")]
    domain: String,

    /// Path to the unencrypted portfolio XML file
    input_file: PathBuf,

    /// Path for the auto-classified output file
    #[arg(default_value = "pp_classified.xml")]
    output_file: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("ppclassify_cli=info".parse()?)
                .add_directive("ppclassify_lib=info".parse()?)
                .add_directive("morningstar_api=info".parse()?),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let client = Client::new()?;
    let mut cache = SecidCache::load(Path::new(CACHE_FILE));
    let mut file = PortfolioFile::load(&cli.input_file, &cli.domain)?;

    for kind in TaxonomyKind::ALL {
        file.add_taxonomy(kind, &client, &mut cache).await?;
    }

    cache.save(Path::new(CACHE_FILE))?;
    file.write(&cli.output_file)?;
    tracing::info!("wrote {}", cli.output_file.display());

    Ok(())
}
