mod annotate;
mod error;
mod labels;
mod model_service;
mod ort_service;
mod pipeline;

pub mod app;
pub mod config;

pub use annotate::{AnnotateError, Annotator};
pub use app::{start_app, App, RunPaths, RunSummary};
pub use error::InferenceError;
pub use labels::{load_labels, ColorLabel, Labels};
pub use model_service::Detector;
pub use ort_service::OrtModelService;
pub use pipeline::{ImageDetections, LabeledDetection, TwoStagePipeline};
