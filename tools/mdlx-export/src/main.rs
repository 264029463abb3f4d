//! mdlx-export - skinned model conversion tool
//!
//! Converts a skinned glTF/GLB mesh into a packetized MDLX container for the
//! target's graphics coprocessor, invoking an external microcode encoder
//! once per packet.

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};

use mdlx_export::config::ExportManifest;
use mdlx_export::encoder::CommandEncoder;
use mdlx_export::{assemble, import};

#[derive(Parser)]
#[command(name = "mdlx-export")]
#[command(about = "Packetizes skinned meshes into an MDLX coprocessor container")]
#[command(version)]
struct Cli {
    /// Input glTF/GLB model
    input: PathBuf,

    /// Output container (defaults to the input path with the mdlx extension)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Path to an mdlx.toml manifest (defaults to ./mdlx.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Coprocessor packet capacity in quadwords (overrides the manifest)
    #[arg(long)]
    capacity: Option<usize>,

    /// External packet encoder command (overrides the manifest)
    #[arg(long)]
    encoder: Option<String>,
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    let manifest = match &cli.config {
        Some(path) => ExportManifest::load(path)?,
        None => {
            let default_path = Path::new("mdlx.toml");
            if default_path.exists() {
                ExportManifest::load(default_path)?
            } else {
                ExportManifest::default()
            }
        }
    };

    let capacity = cli.capacity.unwrap_or(manifest.target.capacity_qwc);
    let Some(command) = cli.encoder.or(manifest.encoder.command) else {
        bail!("no packet encoder configured (pass --encoder or set encoder.command in mdlx.toml)");
    };

    let output = cli
        .output
        .unwrap_or_else(|| cli.input.with_extension("mdlx"));
    tracing::info!("Converting {:?} -> {:?}", cli.input, output);

    let meshes = import::load_gltf(&cli.input)?;
    let encoder = CommandEncoder::new(&command, &manifest.encoder.payload_extension);
    let container = assemble(&meshes, &encoder, capacity)?;

    std::fs::write(&output, &container)
        .with_context(|| format!("Failed to write output: {:?}", output))?;

    tracing::info!("Wrote {} bytes to {:?}", container.len(), output);
    Ok(())
}
