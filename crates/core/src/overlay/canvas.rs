use image::{Pixel, Rgba, RgbaImage};

use crate::shared::frame::Frame;

/// Transparent RGBA drawing surface composited over the video frame.
///
/// The analysis loop keeps one canvas alive across cycles, so the last
/// successfully rendered overlay stays visible between cycles and through
/// failed ones.
pub struct OverlayCanvas {
    image: RgbaImage,
}

impl OverlayCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width, height),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Synchronizes the canvas to the video dimensions. A size change
    /// allocates a fresh transparent surface; matching dimensions leave
    /// the current contents alone. Returns whether a resize happened.
    pub fn match_dimensions(&mut self, width: u32, height: u32) -> bool {
        if self.image.width() == width && self.image.height() == height {
            return false;
        }
        self.image = RgbaImage::new(width, height);
        true
    }

    /// Resets every pixel to fully transparent.
    pub fn clear(&mut self) {
        for px in self.image.pixels_mut() {
            *px = Rgba([0, 0, 0, 0]);
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn image_mut(&mut self) -> &mut RgbaImage {
        &mut self.image
    }

    /// Alpha-composites the canvas over an opaque copy of the frame.
    /// If dimensions disagree (transient, until the next cycle syncs them)
    /// only the overlapping region is composited.
    pub fn composite_over(&self, frame: &Frame) -> RgbaImage {
        let mut base = frame.to_rgba();
        let w = base.width().min(self.image.width());
        let h = base.height().min(self.image.height());
        for y in 0..h {
            for x in 0..w {
                let overlay = self.image.get_pixel(x, y);
                if overlay.0[3] > 0 {
                    base.get_pixel_mut(x, y).blend(overlay);
                }
            }
        }
        base
    }
}
