use crate::CoreError;
use std::fmt;

/// Box stored as fractions of the full image size, YOLO style.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedAnnotation {
    pub class_id: usize,
    pub x_center: f64,
    pub y_center: f64,
    pub width: f64,
    pub height: f64,
}

impl NormalizedAnnotation {
    pub fn from_pixel_box(
        class_id: usize,
        (xmin, ymin, xmax, ymax): (i64, i64, i64, i64),
        image_width: u32,
        image_height: u32,
    ) -> Result<Self, CoreError> {
        if image_width == 0 || image_height == 0 {
            return Err(CoreError::EmptyImage {
                width: image_width,
                height: image_height,
            });
        }

        let image_width = image_width as f64;
        let image_height = image_height as f64;

        Ok(Self {
            class_id,
            x_center: (xmin + xmax) as f64 / (2.0 * image_width),
            y_center: (ymin + ymax) as f64 / (2.0 * image_height),
            width: (xmax - xmin) as f64 / image_width,
            height: (ymax - ymin) as f64 / image_height,
        })
    }
}

impl fmt::Display for NormalizedAnnotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:.6} {:.6} {:.6} {:.6}",
            self.class_id, self.x_center, self.y_center, self.width, self.height
        )
    }
}
