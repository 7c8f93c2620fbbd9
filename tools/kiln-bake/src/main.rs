//! kiln-bake - offline asset baker
//!
//! Converts images (PNG, JPEG) and glTF/GLB scenes under an input directory
//! into kiln containers (.tx, .mesh, .mat, .pfb) and writes one manifest per
//! asset type.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use kiln_bake::config::{BakeConfig, MissingAttributes, parse_vertex_format};
use kiln_bake::error::EXIT_USAGE;
use kiln_bake::{BakeOptions, ImportOptions};

#[derive(Parser)]
#[command(name = "kiln-bake")]
#[command(about = "Bake source assets into kiln containers")]
#[command(version)]
struct Cli {
    /// Asset source directory
    input_dir: PathBuf,

    /// Directory receiving textures.inl, meshes.inl, materials.inl, prefabs.inl
    manifest_dir: PathBuf,

    /// Baked output root (overrides config)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Config file (default: <INPUT_DIR>/kiln.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Vertex format for meshes: PNCV_F32 or P32N8C8V16 (overrides config)
    #[arg(long)]
    vertex_format: Option<String>,

    /// Substitute default normals and uvs instead of rejecting primitives without them
    #[arg(long)]
    default_missing_attributes: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(level.into())
                .from_env_lossy(),
        )
        .init();
}

/// Merge the config file with command-line overrides.
fn resolve_options(cli: &Cli) -> Result<BakeOptions> {
    let config = BakeConfig::discover(cli.config.as_deref(), &cli.input_dir)?;

    let vertex_format = match &cli.vertex_format {
        Some(name) => parse_vertex_format(name)?,
        None => config.vertex_format()?,
    };
    let missing_attributes = if cli.default_missing_attributes {
        MissingAttributes::Default
    } else {
        config.mesh.missing_attributes
    };
    let baked_dir = cli
        .output
        .clone()
        .unwrap_or_else(|| config.baked_dir(&cli.input_dir));

    Ok(BakeOptions {
        input_dir: cli.input_dir.clone(),
        manifest_dir: cli.manifest_dir.clone(),
        baked_dir,
        import: ImportOptions {
            vertex_format,
            missing_attributes,
        },
        manifest: config.manifest,
    })
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // --help and --version also land here and are not failures
            let code = if err.use_stderr() { EXIT_USAGE } else { 0 };
            let _ = err.print();
            std::process::exit(code);
        }
    };

    init_logging(cli.verbose);

    if !cli.input_dir.is_dir() {
        let err = kiln_bake::BakeError::InvalidInputDir(cli.input_dir.clone());
        tracing::error!("{}", err);
        std::process::exit(err.exit_code());
    }

    let options = match resolve_options(&cli) {
        Ok(options) => options,
        Err(err) => {
            tracing::error!("{:#}", err);
            std::process::exit(EXIT_USAGE);
        }
    };
    tracing::debug!("Baking into {}", options.baked_dir.display());

    if let Err(err) = kiln_bake::run(&options) {
        let code = err.exit_code();
        tracing::error!("{:#}", anyhow::Error::from(err));
        std::process::exit(code);
    }
}
