use std::ffi::OsString;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use pixel_convert::{convert, ConvertConfig};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "Usage: pixel-converter <image_filename>";

#[derive(Parser, Debug)]
#[command(name = "pixel-converter", version)]
#[command(about = "Image → NN downsize → palette quantize → pixel art PNG + 512×512 preview")]
struct Args {
    /// Image to convert (PNG, JPEG, BMP, GIF)
    #[arg(value_name = "IMAGE_FILENAME")]
    image: Option<PathBuf>,

    /// Anything after the image name is ignored
    #[arg(hide = true, trailing_var_arg = true, allow_hyphen_values = true)]
    ignored: Vec<OsString>,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let Some(input) = args.image else {
        println!("{}", USAGE);
        return Ok(());
    };

    let config = ConvertConfig::default();
    info!("Input: {:?}, output: {:?}", input, config.output_path());
    info!(
        "Dimensions: → {}×{}, {} colors, preview {}×{}",
        config.target_size.0,
        config.target_size.1,
        config.max_colors,
        config.preview_size.0,
        config.preview_size.1
    );

    if !args.ignored.is_empty() {
        debug!(count = args.ignored.len(), "Ignoring extra arguments");
    }

    let report = match convert(&input, &config) {
        Ok(report) => report,
        Err(err) if err.is_recoverable() => {
            println!("Error: Could not find {}", input.display());
            return Ok(());
        }
        Err(err) => {
            error!(code = err.code(), "Conversion failed");
            return Err(err).with_context(|| format!("Failed to convert {:?}", input));
        }
    };
    debug!(?report, "Conversion report");
    println!("Saved pixel art to: {}", report.output_path.display());

    Ok(())
}
