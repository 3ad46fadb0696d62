mod annotation;
mod bounding_box;
mod detection;
mod error;
mod remap;
mod vocabulary;

pub use annotation::NormalizedAnnotation;
pub use bounding_box::BoundingBox;
pub use detection::Detection;
pub use error::CoreError;
pub use remap::{remap_to_full_image, CropRegion};
pub use vocabulary::ClassVocabulary;
