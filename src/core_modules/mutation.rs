// THEORY:
// A `Mutation` is one candidate edit: an axis-aligned rectangle painted with a single
// opaque color. It is an immutable value; the search produces thousands of them per
// round, scores them without touching the canvas, and applies exactly one.
//
// Key architectural principles:
// 1.  **Fit Before Write**: `apply` checks the whole rectangle against the canvas
//     before writing a single pixel, so a rejected mutation leaves the canvas as it was.
// 2.  **Empty Is Legal**: a zero width or height covers no pixels. It is the neutral
//     element of the search and is what a round applies when nothing improved.
// 3.  **Fits By Construction**: `random` draws the size first and then an origin that
//     keeps the rectangle inside the canvas, so sampled candidates never fail `fits`.

pub mod mutation {
    use crate::core_modules::canvas::canvas::Canvas;
    use crate::core_modules::palette::palette::Palette;
    use crate::core_modules::pixel::pixel::Pixel;
    use crate::error::{ApproxError, Result};
    use rand::Rng;

    /// A filled rectangle with top-left corner `(x, y)`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Mutation {
        pub x: u32,
        pub y: u32,
        pub w: u32,
        pub h: u32,
        /// Fill color. Always fully opaque.
        pub color: Pixel,
    }

    impl Mutation {
        pub fn new(x: u32, y: u32, w: u32, h: u32, color: Pixel) -> Self {
            Self {
                x,
                y,
                w,
                h,
                color: color.opaque(),
            }
        }

        /// A mutation that covers no pixels.
        pub fn noop() -> Self {
            Self::new(0, 0, 0, 0, Pixel::BLACK)
        }

        /// Covers an entire `width` x `height` canvas.
        pub fn full(width: u32, height: u32, color: Pixel) -> Self {
            Self::new(0, 0, width, height, color)
        }

        /// Samples a rectangle that fits a `width` x `height` canvas and a palette color.
        ///
        /// Width and height are drawn from `[0, width)` and `[0, height)`, then the origin
        /// from `[0, width - w)` and `[0, height - h)`. Both dimensions must be non-zero.
        pub fn random<R: Rng>(rng: &mut R, width: u32, height: u32, palette: &Palette) -> Self {
            let w = rng.random_range(0..width);
            let h = rng.random_range(0..height);
            let x = rng.random_range(0..width - w);
            let y = rng.random_range(0..height - h);
            Self::new(x, y, w, h, palette.sample(rng))
        }

        pub fn fits(&self, width: u32, height: u32) -> bool {
            // u64 so huge sizes can't wrap past the check.
            self.x as u64 + self.w as u64 <= width as u64 && self.y as u64 + self.h as u64 <= height as u64
        }

        /// Fails with `OutOfBounds` unless the rectangle lies inside `canvas`.
        pub fn ensure_fits(&self, canvas: &Canvas) -> Result<()> {
            if !self.fits(canvas.width(), canvas.height()) {
                return Err(ApproxError::OutOfBounds {
                    x: self.x,
                    y: self.y,
                    w: self.w,
                    h: self.h,
                    width: canvas.width(),
                    height: canvas.height(),
                });
            }
            Ok(())
        }

        pub fn area(&self) -> u64 {
            self.w as u64 * self.h as u64
        }

        pub fn is_noop(&self) -> bool {
            self.w == 0 || self.h == 0
        }

        /// Paints the rectangle onto `canvas`.
        pub fn apply(&self, canvas: &mut Canvas) -> Result<()> {
            self.ensure_fits(canvas)?;
            for j in self.y..self.y + self.h {
                for i in self.x..self.x + self.w {
                    canvas.set(i, j, self.color);
                }
            }
            Ok(())
        }
    }
}
