use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CoreError {
    #[error("Crop has no pixels: {width}x{height}")]
    EmptyCrop { width: u32, height: u32 },
    #[error("Image size must be positive, got {width}x{height}")]
    EmptyImage { width: u32, height: u32 },
}
