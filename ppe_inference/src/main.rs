use clap::Parser;
use ppe_inference::{config, start_app, RunPaths};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Detects people, then PPE items inside each person, and writes annotated images.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Directory of input images
    input_dir: PathBuf,
    /// Directory to save annotated images
    output_dir: PathBuf,
    /// Path to the person detection ONNX model
    person_model: PathBuf,
    /// Path to the PPE detection ONNX model
    ppe_model: PathBuf,
    /// Directory holding base.yaml and the per-environment overrides
    #[arg(long, default_value = "configuration")]
    config_dir: PathBuf,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = config::get_configuration(&args.config_dir)?;
    let log_level = &format!("{},ort=info", config.log_level.as_str());

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with(tracing_subscriber::fmt::layer().json().with_level(true))
        .init();

    let paths = RunPaths {
        input_dir: args.input_dir,
        output_dir: args.output_dir,
        person_model: args.person_model,
        ppe_model: args.ppe_model,
    };

    if let Err(e) = start_app(config, paths) {
        tracing::error!("PPE detection failed: {}", e);
        return Err(e);
    }

    Ok(())
}
