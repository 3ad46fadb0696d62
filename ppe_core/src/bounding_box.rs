/// Axis-aligned box in integer pixels of a single coordinate space.
///
/// The origin is the top-left corner and y grows downward. Corners are
/// always stored ordered, so `x1 <= x2` and `y1 <= y2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoundingBox {
    x1: i32,
    y1: i32,
    x2: i32,
    y2: i32,
}

impl BoundingBox {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self {
            x1: x1.min(x2),
            y1: y1.min(y2),
            x2: x1.max(x2),
            y2: y1.max(y2),
        }
    }

    /// Builds a box from detector output, truncating each coordinate toward zero.
    pub fn from_xyxy_f32(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self::new(x1 as i32, y1 as i32, x2 as i32, y2 as i32)
    }

    pub fn x1(&self) -> i32 {
        self.x1
    }

    pub fn y1(&self) -> i32 {
        self.y1
    }

    pub fn x2(&self) -> i32 {
        self.x2
    }

    pub fn y2(&self) -> i32 {
        self.y2
    }

    pub fn width(&self) -> u32 {
        self.x1.abs_diff(self.x2)
    }

    pub fn height(&self) -> u32 {
        self.y1.abs_diff(self.y2)
    }

    pub fn area(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    /// Intersection-over-union with `other`; 0 for disjoint or empty boxes.
    pub fn iou(&self, other: &BoundingBox) -> f64 {
        let overlap_width = (self.x2.min(other.x2) - self.x1.max(other.x1)).max(0);
        let overlap_height = (self.y2.min(other.y2) - self.y1.max(other.y1)).max(0);
        let intersection = overlap_width as u64 * overlap_height as u64;
        let union = self.area() + other.area() - intersection;
        if union == 0 {
            return 0.0;
        }
        intersection as f64 / union as f64
    }

    /// Clips the box to an image of `width` x `height` pixels.
    pub fn clamp_to(&self, width: u32, height: u32) -> Self {
        let max_x = i32::try_from(width).unwrap_or(i32::MAX);
        let max_y = i32::try_from(height).unwrap_or(i32::MAX);
        Self::new(
            self.x1.clamp(0, max_x),
            self.y1.clamp(0, max_y),
            self.x2.clamp(0, max_x),
            self.y2.clamp(0, max_y),
        )
    }
}
