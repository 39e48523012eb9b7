/// A 2D point in source-frame pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point2 {
    pub x: f32,
    pub y: f32,
}

impl Point2 {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle in source-frame pixel coordinates.
///
/// Detector outputs are sub-pixel, so coordinates stay `f32` until a
/// consumer needs integer pixels (cropping, drawing).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Builds a box from corner coordinates, normalizing flipped corners.
    pub fn from_corners(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        let (x1, x2) = if x1 <= x2 { (x1, x2) } else { (x2, x1) };
        let (y1, y2) = if y1 <= y2 { (y1, y2) } else { (y2, y1) };
        Self {
            x: x1,
            y: y1,
            width: x2 - x1,
            height: y2 - y1,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> Point2 {
        Point2::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn area(&self) -> f32 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    /// Intersects the box with a `frame_width` x `frame_height` frame.
    /// The result may be empty (zero width or height).
    pub fn clamped(&self, frame_width: u32, frame_height: u32) -> BoundingBox {
        let x1 = self.x.clamp(0.0, frame_width as f32);
        let y1 = self.y.clamp(0.0, frame_height as f32);
        let x2 = self.right().clamp(0.0, frame_width as f32);
        let y2 = self.bottom().clamp(0.0, frame_height as f32);
        BoundingBox::from_corners(x1, y1, x2, y2)
    }

    /// Rounds to an integer pixel rectangle as `(x, y, width, height)`.
    /// Origin rounds to nearest; size rounds up so the box is never shrunk
    /// below its sub-pixel extent.
    pub fn to_pixel_rect(&self) -> (i64, i64, u32, u32) {
        (
            self.x.round() as i64,
            self.y.round() as i64,
            self.width.ceil().max(0.0) as u32,
            self.height.ceil().max(0.0) as u32,
        )
    }

    /// Intersection over union with another box. Empty boxes yield 0.
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let x1 = self.x.max(other.x);
        let y1 = self.y.max(other.y);
        let x2 = self.right().min(other.right());
        let y2 = self.bottom().min(other.bottom());

        let inter = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
        if inter == 0.0 {
            return 0.0;
        }
        inter / (self.area() + other.area() - inter)
    }
}
