use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InferenceError {
    #[error("ONNX Runtime error: {0}")]
    Ort(#[from] ort::Error),
    #[error("Invalid tensor shape: {0}")]
    Shape(#[from] ndarray::ShapeError),
    #[error("Model output not found: {0}")]
    MissingOutput(String),
    #[error("Unexpected model output shape: {0:?}")]
    OutputShape(Vec<usize>),
    #[error("Failed to read image {path}: {source}")]
    Image {
        path: PathBuf,
        source: image::ImageError,
    },
    #[error("Failed to write image {path}: {source}")]
    Save {
        path: PathBuf,
        source: image::ImageError,
    },
    #[error("Failed to load labels: {0}")]
    Labels(std::io::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
