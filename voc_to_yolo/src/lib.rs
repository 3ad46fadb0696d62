mod convert;
mod error;
mod voc;

pub mod app;
pub mod config;

pub use app::{convert_directory, start_app, ConversionSummary};
pub use convert::{convert_annotation, convert_document, render_lines};
pub use error::ConvertError;
pub use voc::{VocAnnotation, VocBndBox, VocObject, VocSize};
