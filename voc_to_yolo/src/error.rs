use ppe_core::CoreError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("Invalid Pascal VOC document: {0}")]
    Xml(#[from] quick_xml::DeError),
    #[error("Missing <{0}> element")]
    MissingField(&'static str),
    #[error("Invalid <{field}> coordinate {value:?}")]
    InvalidCoordinate { field: &'static str, value: String },
    #[error("Invalid image size: {0}")]
    InvalidImageSize(#[from] CoreError),
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{path}: {source}")]
    Document {
        path: PathBuf,
        source: Box<ConvertError>,
    },
}
