// THEORY:
// The `pipeline` module is the top-level API of the engine. It holds the run
// configuration, the result type, and a one-call entry point that wires a target
// canvas, a configuration and a progress sink into the parallel search.
//
// The configuration is read-only for the duration of a run. The only defaults the
// engine picks on its own are the worker count (available hardware parallelism) and
// an unseeded random source; everything else is supplied by the caller.

use crate::error::{ApproxError, Result};
use crate::parallel_pipeline::Approximator;

// Re-export key data structures for the public API.
pub use crate::core_modules::canvas::canvas::Canvas;
pub use crate::core_modules::mutation::mutation::Mutation;
pub use crate::core_modules::palette::palette::Palette;
pub use crate::core_modules::pixel::pixel::Pixel;
pub use crate::core_modules::scorer::scorer::Score;
pub use crate::progress::{ProgressEvent, ProgressSink};

/// Configuration for an approximation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApproxConfig {
    /// Number of rounds; each round applies exactly one mutation.
    pub tries: usize,
    /// Candidate mutations sampled per round, split evenly across workers.
    pub mutations: usize,
    /// Stride used when scoring a candidate. 1 scores every pixel.
    pub pixel_sampling: u32,
    pub workers: usize,
    /// Fixes every worker's random source so a run can be replayed.
    pub seed: Option<u64>,
}

impl ApproxConfig {
    pub fn new(tries: usize, mutations: usize, pixel_sampling: u32) -> Self {
        Self {
            tries,
            mutations,
            pixel_sampling,
            workers: num_cpus::get(),
            seed: None,
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.pixel_sampling == 0 {
            return Err(ApproxError::InvalidConfig("pixel sampling stride must be at least 1".into()));
        }
        if self.workers == 0 {
            return Err(ApproxError::InvalidConfig("worker count must be at least 1".into()));
        }
        if self.mutations < self.workers {
            log::warn!(
                "{} mutations over {} workers leaves every worker without trials; rounds will not improve",
                self.mutations,
                self.workers
            );
        }
        Ok(())
    }

    /// Trials each worker runs per round.
    pub fn trials_per_worker(&self) -> usize {
        self.mutations / self.workers.max(1)
    }
}

/// The outcome of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Approximation {
    pub canvas: Canvas,
    /// Full distance between `canvas` and the target.
    pub score: Score,
    /// Score after the blank white start, before any round.
    pub initial_score: Score,
    /// Cached score after each completed round. Exact for `pixel_sampling == 1`,
    /// otherwise a running estimate that may drift below zero.
    pub history: Vec<Score>,
}

impl Approximation {
    pub fn rounds(&self) -> usize {
        self.history.len()
    }
}

/// Runs a complete approximation of `target`.
pub async fn approximate(target: Canvas, config: ApproxConfig, sink: &dyn ProgressSink) -> Result<Approximation> {
    Approximator::new(config)?.run(target, sink).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_stride_is_rejected() {
        let config = ApproxConfig::new(1, 10, 0).with_workers(2);
        assert!(matches!(config.validate(), Err(ApproxError::InvalidConfig(_))));
    }

    #[test]
    fn zero_workers_is_rejected() {
        let config = ApproxConfig::new(1, 10, 1).with_workers(0);
        assert!(matches!(config.validate(), Err(ApproxError::InvalidConfig(_))));
    }

    #[test]
    fn default_workers_match_hardware() {
        assert_eq!(ApproxConfig::new(1, 1, 1).workers, num_cpus::get());
    }

    #[test]
    fn trials_split_evenly() {
        let config = ApproxConfig::new(1, 1000, 1).with_workers(3);
        assert!(config.validate().is_ok());
        assert_eq!(config.trials_per_worker(), 333);
    }

    #[tokio::test]
    async fn approximate_solid_target_converges() {
        let red = Pixel::new(200, 10, 10, 255);
        let target = Canvas::filled(6, 6, red);
        let config = ApproxConfig::new(20, 200, 1).with_workers(2).with_seed(1);

        let result = approximate(target, config, &()).await.unwrap();
        assert_eq!(result.initial_score, (55 + 245 + 245) * 36);
        assert!(result.score < result.initial_score);
        assert_eq!(result.rounds(), 20);
    }
}
