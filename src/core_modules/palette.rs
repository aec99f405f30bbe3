// THEORY:
// The palette is the pool of fill colors a mutation may use. It is built once per run
// by a single row-major scan of the target, recording each exact RGBA value the first
// time it appears. A set answers "seen before?" and a vector keeps discovery order so
// a color can be drawn by uniform random index.
//
// Only colors actually present in the target are ever stored. A palette built from a
// solid image holds exactly one entry.

pub mod palette {
    use crate::core_modules::canvas::canvas::Canvas;
    use crate::core_modules::pixel::pixel::Pixel;
    use crate::error::{ApproxError, Result};
    use rand::Rng;
    use std::collections::HashSet;

    /// The distinct colors of an image, in discovery order.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct Palette {
        colors: Vec<Pixel>,
    }

    impl Palette {
        /// Scans `target` once and collects every distinct color.
        pub fn extract(target: &Canvas) -> Result<Self> {
            if target.is_empty() {
                return Err(ApproxError::EmptyCanvas);
            }

            let mut seen = HashSet::new();
            let mut colors = Vec::new();
            for pixel in target.pixels() {
                if seen.insert(pixel) {
                    colors.push(pixel);
                }
            }

            log::debug!(
                "extracted {} distinct colors from a {}x{} target",
                colors.len(),
                target.width(),
                target.height()
            );
            Ok(Self { colors })
        }

        /// Draws one color uniformly at random.
        pub fn sample<R: Rng>(&self, rng: &mut R) -> Pixel {
            self.colors[rng.random_range(0..self.colors.len())]
        }

        pub fn colors(&self) -> &[Pixel] {
            &self.colors
        }

        pub fn len(&self) -> usize {
            self.colors.len()
        }

        /// Always false for a palette built by `extract`.
        pub fn is_empty(&self) -> bool {
            self.colors.is_empty()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::palette::*;
    use crate::core_modules::canvas::canvas::Canvas;
    use crate::core_modules::pixel::pixel::Pixel;
    use crate::error::ApproxError;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn solid_canvas_yields_single_color() {
        let teal = Pixel::new(0, 128, 128, 255);
        let palette = Palette::extract(&Canvas::filled(5, 4, teal)).unwrap();
        assert_eq!(palette.colors(), &[teal]);
    }

    #[test]
    fn colors_keep_discovery_order() {
        let a = Pixel::new(1, 1, 1, 255);
        let b = Pixel::new(2, 2, 2, 255);
        let c = Pixel::new(3, 3, 3, 255);
        let mut canvas = Canvas::filled(3, 2, a);
        canvas.set(1, 0, b);
        canvas.set(2, 0, a);
        canvas.set(0, 1, c);
        canvas.set(1, 1, b);

        let palette = Palette::extract(&canvas).unwrap();
        assert_eq!(palette.colors(), &[a, b, c]);
    }

    #[test]
    fn no_placeholder_colors() {
        let white = Pixel::WHITE;
        let palette = Palette::extract(&Canvas::filled(2, 2, white)).unwrap();
        let mut rng = Pcg32::seed_from_u64(7);
        for _ in 0..100 {
            assert_eq!(palette.sample(&mut rng), white);
        }
    }

    #[test]
    fn alpha_distinguishes_colors() {
        let mut canvas = Canvas::filled(2, 1, Pixel::new(9, 9, 9, 255));
        canvas.set(1, 0, Pixel::new(9, 9, 9, 0));
        assert_eq!(Palette::extract(&canvas).unwrap().len(), 2);
    }

    #[test]
    fn empty_canvas_is_rejected() {
        assert_eq!(Palette::extract(&Canvas::new(0, 3)), Err(ApproxError::EmptyCanvas));
    }
}
