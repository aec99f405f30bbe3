// THEORY:
// The `Canvas` module is the pixel store shared by every other layer. It is a flat,
// row-major RGBA byte buffer plus its dimensions, the same layout the decoders hand
// us, so loading and saving an image never reshuffles bytes.
//
// Key architectural principles:
// 1.  **Dumb Container**: Like `Pixel`, a `Canvas` only knows how to read and write
//     its own pixels. Comparing canvases is the scorer's job and editing them is the
//     mutation model's job.
// 2.  **Precondition Indexing**: `get`/`set` panic on out-of-range coordinates. Every
//     caller validates rectangles before touching pixels, so a bad index is a bug,
//     not an input error.
// 3.  **Congruence Checks**: `ensure_same_size` is the single place that produces
//     `SizeMismatch`, so all operations combining two canvases fail identically.

pub mod canvas {
    use crate::core_modules::pixel::pixel::{Byte, CHANNELS, Pixel};
    use crate::error::{ApproxError, Result};

    /// A fixed-size grid of RGBA pixels.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct Canvas {
        width: u32,
        height: u32,
        /// Row-major RGBA bytes, `width * height * 4` long.
        data: Vec<Byte>,
    }

    impl Canvas {
        /// A canvas of fully transparent black pixels.
        pub fn new(width: u32, height: u32) -> Self {
            Self {
                width,
                height,
                data: vec![0; Self::byte_len(width, height)],
            }
        }

        pub fn filled(width: u32, height: u32, color: Pixel) -> Self {
            let mut data = Vec::with_capacity(Self::byte_len(width, height));
            for _ in 0..(width as usize * height as usize) {
                data.extend_from_slice(&color.to_bytes());
            }
            Self { width, height, data }
        }

        /// Wraps an existing row-major RGBA buffer.
        pub fn from_rgba(width: u32, height: u32, data: Vec<Byte>) -> Result<Self> {
            if data.len() != Self::byte_len(width, height) {
                return Err(ApproxError::InvalidBuffer {
                    width,
                    height,
                    len: data.len(),
                });
            }
            Ok(Self { width, height, data })
        }

        pub fn width(&self) -> u32 {
            self.width
        }

        pub fn height(&self) -> u32 {
            self.height
        }

        pub fn dimensions(&self) -> (u32, u32) {
            (self.width, self.height)
        }

        pub fn is_empty(&self) -> bool {
            self.width == 0 || self.height == 0
        }

        pub fn as_bytes(&self) -> &[Byte] {
            &self.data
        }

        pub fn into_bytes(self) -> Vec<Byte> {
            self.data
        }

        #[inline]
        pub fn get(&self, x: u32, y: u32) -> Pixel {
            let offset = self.offset(x, y);
            Pixel::from(&self.data[offset..offset + CHANNELS])
        }

        #[inline]
        pub fn set(&mut self, x: u32, y: u32, color: Pixel) {
            let offset = self.offset(x, y);
            self.data[offset..offset + CHANNELS].copy_from_slice(&color.to_bytes());
        }

        /// Fails with `SizeMismatch` unless both canvases have the same dimensions.
        pub fn ensure_same_size(&self, other: &Canvas) -> Result<()> {
            if self.dimensions() != other.dimensions() {
                return Err(ApproxError::SizeMismatch {
                    left_width: self.width,
                    left_height: self.height,
                    right_width: other.width,
                    right_height: other.height,
                });
            }
            Ok(())
        }

        /// Iterates every pixel in row-major order.
        pub fn pixels(&self) -> impl Iterator<Item = Pixel> + '_ {
            self.data.chunks_exact(CHANNELS).map(Pixel::from)
        }

        #[inline]
        fn offset(&self, x: u32, y: u32) -> usize {
            assert!(
                x < self.width && y < self.height,
                "pixel ({x}, {y}) is outside a {}x{} canvas",
                self.width,
                self.height
            );
            (y as usize * self.width as usize + x as usize) * CHANNELS
        }

        fn byte_len(width: u32, height: u32) -> usize {
            width as usize * height as usize * CHANNELS
        }
    }

    impl From<image::RgbaImage> for Canvas {
        fn from(image: image::RgbaImage) -> Self {
            let (width, height) = image.dimensions();
            Self {
                width,
                height,
                data: image.into_raw(),
            }
        }
    }

    impl From<Canvas> for image::RgbaImage {
        fn from(canvas: Canvas) -> Self {
            image::RgbaImage::from_fn(canvas.width, canvas.height, |x, y| canvas.get(x, y).into())
        }
    }
}
