use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use voc_to_yolo::{config, start_app};

/// Convert Pascal VOC XML annotations to YOLO text annotations.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Directory containing Pascal VOC XML annotations
    input_dir: PathBuf,
    /// Directory where YOLO annotations will be saved
    output_dir: PathBuf,
    /// Directory holding base.yaml and the per-environment overrides
    #[arg(long, default_value = "configuration")]
    config_dir: PathBuf,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = config::get_configuration(&args.config_dir)?;
    let log_level = config.log_level.as_str();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with(tracing_subscriber::fmt::layer().json().with_level(true))
        .init();

    if let Err(e) = start_app(config, &args.input_dir, &args.output_dir) {
        tracing::error!("Conversion failed: {}", e);
        return Err(e.into());
    }

    Ok(())
}
