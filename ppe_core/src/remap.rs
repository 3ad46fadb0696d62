use crate::{BoundingBox, CoreError};
use std::num::NonZeroU32;

/// A crop taken out of a full image: where it sits in the full image and the
/// pixel size of the sub-image it produced. The crop's own top-left corner is
/// (0, 0) in its local coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRegion {
    bbox: BoundingBox,
    width: NonZeroU32,
    height: NonZeroU32,
}

impl CropRegion {
    pub fn new(bbox: BoundingBox, width: u32, height: u32) -> Result<Self, CoreError> {
        match (NonZeroU32::new(width), NonZeroU32::new(height)) {
            (Some(width), Some(height)) => Ok(Self {
                bbox,
                width,
                height,
            }),
            _ => Err(CoreError::EmptyCrop { width, height }),
        }
    }

    pub fn bbox(&self) -> BoundingBox {
        self.bbox
    }

    pub fn width(&self) -> u32 {
        self.width.get()
    }

    pub fn height(&self) -> u32 {
        self.height.get()
    }

    /// Maps a box found inside this crop back to full-image coordinates.
    pub fn to_full_image(&self, local: &BoundingBox) -> BoundingBox {
        remap_to_full_image(local, &self.bbox, self.width, self.height)
    }
}

/// Linearly interpolates each local coordinate across the crop's full-image
/// box. Results are truncated toward zero, never rounded.
pub fn remap_to_full_image(
    local: &BoundingBox,
    crop_box: &BoundingBox,
    crop_width: NonZeroU32,
    crop_height: NonZeroU32,
) -> BoundingBox {
    let scale_x = |x: i32| interpolate(x, crop_width, crop_box.x1(), crop_box.x2());
    let scale_y = |y: i32| interpolate(y, crop_height, crop_box.y1(), crop_box.y2());

    BoundingBox::new(
        scale_x(local.x1()),
        scale_y(local.y1()),
        scale_x(local.x2()),
        scale_y(local.y2()),
    )
}

fn interpolate(value: i32, extent: NonZeroU32, start: i32, end: i32) -> i32 {
    let full = start as f64 + (value as f64 / extent.get() as f64) * (end as f64 - start as f64);
    full.trunc() as i32
}
