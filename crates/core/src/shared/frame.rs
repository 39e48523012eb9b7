use ndarray::ArrayView3;

/// A single camera/image frame: contiguous RGB bytes in row-major order.
///
/// Sources convert whatever they capture into this shape at the I/O
/// boundary; analyzers and renderers treat it as read-only pixel data.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    index: usize,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
            index,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    /// Extracts a rectangular sub-frame, clamping the requested rectangle to
    /// the frame bounds. Returns `None` when the clamped rectangle is empty.
    ///
    /// The crop inherits this frame's index so log lines stay correlated.
    pub fn crop(&self, x: i64, y: i64, w: u32, h: u32) -> Option<Frame> {
        let x0 = x.clamp(0, self.width as i64) as usize;
        let y0 = y.clamp(0, self.height as i64) as usize;
        let x1 = (x + w as i64).clamp(0, self.width as i64) as usize;
        let y1 = (y + h as i64).clamp(0, self.height as i64) as usize;
        if x1 <= x0 || y1 <= y0 {
            return None;
        }

        let cw = x1 - x0;
        let ch = y1 - y0;
        let c = self.channels as usize;
        let stride = self.width as usize * c;
        let mut data = Vec::with_capacity(cw * ch * c);
        for row in y0..y1 {
            let start = row * stride + x0 * c;
            data.extend_from_slice(&self.data[start..start + cw * c]);
        }
        Some(Frame::new(data, cw as u32, ch as u32, self.channels, self.index))
    }

    /// Copies the frame into an RGBA image for display or compositing.
    /// Only 3-channel frames are expected; alpha is set fully opaque.
    pub fn to_rgba(&self) -> image::RgbaImage {
        debug_assert_eq!(self.channels, 3, "to_rgba expects RGB frames");
        let mut out = image::RgbaImage::new(self.width, self.height);
        for (i, px) in out.pixels_mut().enumerate() {
            let base = i * 3;
            *px = image::Rgba([self.data[base], self.data[base + 1], self.data[base + 2], 255]);
        }
        out
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.channels as usize,
        )
    }
}
