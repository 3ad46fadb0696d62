use crate::{error::InferenceError, labels::Labels};
use image::DynamicImage;
use ppe_core::Detection;

pub trait Detector {
    /// Boxes are in the coordinate space of `image`.
    fn detect(&mut self, image: &DynamicImage) -> Result<Vec<Detection>, InferenceError>;

    fn labels(&self) -> &Labels;
}
