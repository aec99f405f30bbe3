// THEORY:
// The scorer measures how far the approximation is from the target. The distance of
// one pixel pair is the sum of absolute R, G and B differences; alpha never counts.
// A canvas score is the sum over every position.
//
// Scoring a candidate is the hot path of the whole engine: every sampled mutation is
// scored exactly once. Rescanning the full image per candidate would make a round
// cost O(candidates * W * H). Instead `delta_for_candidate` starts from the cached
// score of the current approximation and only revisits the candidate's rectangle:
// for each visited position it removes what the pixel contributes today and adds
// what the fill color would contribute. With a stride above one, only every
// `stride`-th row and column of the rectangle is visited, so the result becomes an
// estimate that trades accuracy for a `stride^2` speedup.

pub mod scorer {
    use crate::core_modules::canvas::canvas::Canvas;
    use crate::core_modules::mutation::mutation::Mutation;
    use crate::core_modules::pixel::pixel::Pixel;
    use crate::error::Result;

    /// Signed so a sampled estimate can run below the true distance without losing
    /// the ordering between candidates. A full `total_distance` is never negative.
    pub type Score = i64;
    pub type ColorDistance = i64;

    /// `|R1-R2| + |G1-G2| + |B1-B2|`.
    #[inline]
    pub fn color_distance(a: Pixel, b: Pixel) -> ColorDistance {
        (a.red.abs_diff(b.red) as ColorDistance)
            + (a.green.abs_diff(b.green) as ColorDistance)
            + (a.blue.abs_diff(b.blue) as ColorDistance)
    }

    /// Pixel-wise distance between two same-size canvases.
    pub fn total_distance(a: &Canvas, b: &Canvas) -> Result<Score> {
        a.ensure_same_size(b)?;
        Ok(a.pixels().zip(b.pixels()).map(|(p, q)| color_distance(p, q)).sum())
    }

    /// Score `approx` would have against `target` once `mutation` is applied.
    ///
    /// `cached_score` must be the current score of `approx`. Positions are visited every
    /// `stride` pixels in both directions starting at the rectangle's origin; a stride of
    /// zero is treated as one. With a stride above one the result is an estimate and may
    /// drop below zero.
    pub fn delta_for_candidate(
        approx: &Canvas,
        target: &Canvas,
        cached_score: Score,
        mutation: &Mutation,
        stride: u32,
    ) -> Result<Score> {
        approx.ensure_same_size(target)?;
        mutation.ensure_fits(approx)?;

        let stride = stride.max(1) as usize;
        let mut score = cached_score;
        for j in (mutation.y..mutation.y + mutation.h).step_by(stride) {
            for i in (mutation.x..mutation.x + mutation.w).step_by(stride) {
                let wanted = target.get(i, j);
                score += color_distance(wanted, mutation.color) - color_distance(wanted, approx.get(i, j));
            }
        }
        Ok(score)
    }
}
