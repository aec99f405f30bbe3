// THEORY:
// The `Approximator` is the search coordinator. A run is a fixed sequence of rounds,
// and every round is a fan-out/fan-in over a pool of blocking worker tasks:
//
// 1.  **Snapshot**: the approximation, target and palette are shared with every worker
//     behind `Arc`s. Nobody writes to them while the round is in flight.
// 2.  **Search**: each worker samples its share of random mutations with its own
//     seeded RNG, scores each one incrementally against the round's cached score and
//     keeps the best. The running best starts as the empty mutation at the cached
//     score, so only strict improvements are ever reported.
// 3.  **Reduce**: the coordinator awaits every join handle in worker order and keeps
//     the lowest score with a strict `<`, so ties go to the lowest worker index.
// 4.  **Advance**: with all workers finished their `Arc` clones are gone and the
//     coordinator is the only owner of the approximation. It applies the winner,
//     adopts the winner's score and emits one progress event.
//
// With a sampling stride above one the cached score is an estimate that drifts away
// from the real distance, possibly below zero. Candidates are only ever compared
// against the same cached value, so the ranking stays meaningful. The real distance
// is measured once at the end.
//
// Cancellation is a `watch` flag looked at between rounds only, so a cancelled run
// always ends on a fully applied round.

use crate::core_modules::canvas::canvas::Canvas;
use crate::core_modules::mutation::mutation::Mutation;
use crate::core_modules::palette::palette::Palette;
use crate::core_modules::pixel::pixel::Pixel;
use crate::core_modules::scorer::scorer::{Score, delta_for_candidate, total_distance};
use crate::error::{ApproxError, Result};
use crate::pipeline::{ApproxConfig, Approximation};
use crate::progress::{ProgressEvent, ProgressSink};
use futures::future::join_all;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;

/// A scored mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub mutation: Mutation,
    pub score: Score,
}

/// Everything one worker needs for one round.
struct RoundTask {
    worker_index: usize,
    trials: usize,
    seed: u64,
    stride: u32,
    cached_score: Score,
    approx: Arc<Canvas>,
    target: Arc<Canvas>,
    palette: Arc<Palette>,
}

/// Lets another task stop a run between rounds.
#[derive(Clone)]
pub struct ControlHandle {
    cancel_tx: watch::Sender<bool>,
}

impl ControlHandle {
    pub fn channel() -> (Self, watch::Receiver<bool>) {
        let (cancel_tx, cancel_rx) = watch::channel(false);
        (Self { cancel_tx }, cancel_rx)
    }

    pub fn cancel(&self) {
        let _ = self.cancel_tx.send(true);
    }
}

pub struct Approximator {
    config: ApproxConfig,
}

impl Approximator {
    pub fn new(config: ApproxConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ApproxConfig {
        &self.config
    }

    pub async fn run(&self, target: Canvas, sink: &dyn ProgressSink) -> Result<Approximation> {
        self.run_inner(target, sink, None).await
    }

    /// Like `run`, but stops before the next round once `cancel` reads `true`.
    pub async fn run_until_cancelled(
        &self,
        target: Canvas,
        sink: &dyn ProgressSink,
        cancel: watch::Receiver<bool>,
    ) -> Result<Approximation> {
        self.run_inner(target, sink, Some(cancel)).await
    }

    async fn run_inner(
        &self,
        target: Canvas,
        sink: &dyn ProgressSink,
        cancel: Option<watch::Receiver<bool>>,
    ) -> Result<Approximation> {
        let started = Instant::now();
        let (width, height) = target.dimensions();
        let palette = Arc::new(Palette::extract(&target)?);
        let target = Arc::new(target);

        // Start from a blank white canvas.
        let mut approx = Canvas::new(width, height);
        Mutation::full(width, height, Pixel::WHITE).apply(&mut approx)?;
        let initial_score = total_distance(&target, &approx)?;
        let mut approx = Arc::new(approx);
        let mut score = initial_score;

        let run_seed = self.config.seed.unwrap_or_else(|| rand::rng().random());
        let trials = self.config.trials_per_worker();
        let tries = self.config.tries;
        let mut history = Vec::with_capacity(tries);

        log::info!(
            "approximating {width}x{height} target: {tries} rounds, {} workers x {trials} trials, stride {}, {} colors, seed {run_seed:#x}",
            self.config.workers,
            self.config.pixel_sampling,
            palette.len(),
        );

        for round in 0..tries {
            if cancel.as_ref().is_some_and(|rx| *rx.borrow()) {
                log::info!("run cancelled after {round} of {tries} rounds");
                break;
            }

            let handles: Vec<_> = (0..self.config.workers)
                .map(|worker_index| {
                    let task = RoundTask {
                        worker_index,
                        trials,
                        seed: worker_seed(run_seed, round, worker_index),
                        stride: self.config.pixel_sampling,
                        cached_score: score,
                        approx: Arc::clone(&approx),
                        target: Arc::clone(&target),
                        palette: Arc::clone(&palette),
                    };
                    tokio::task::spawn_blocking(move || find_mutation(task))
                })
                .collect();

            let candidates = join_all(handles)
                .await
                .into_iter()
                .map(|joined| joined.map_err(|e| ApproxError::Worker(e.to_string())).and_then(|found| found))
                .collect::<Result<Vec<_>>>()?;

            let winner = reduce(candidates).unwrap_or(Candidate {
                mutation: Mutation::noop(),
                score,
            });

            winner.mutation.apply(Arc::make_mut(&mut approx))?;
            score = winner.score;
            history.push(score);

            log::debug!("round {round}: applied {:?}, score {score}", winner.mutation);
            sink.notify(ProgressEvent::mutation(round, tries));
        }

        let canvas = Arc::try_unwrap(approx).unwrap_or_else(|shared| (*shared).clone());
        // Sampled scoring leaves an estimate in `score`; report the real distance.
        let final_score = total_distance(&target, &canvas)?;
        if final_score != score {
            log::debug!("cached estimate {score} differs from final distance {final_score}");
        }

        log::info!(
            "finished {} rounds in {:.2?}: score {initial_score} -> {final_score}",
            history.len(),
            started.elapsed()
        );

        Ok(Approximation {
            canvas,
            score: final_score,
            initial_score,
            history,
        })
    }
}

/// One worker's share of a round.
fn find_mutation(task: RoundTask) -> Result<Candidate> {
    let mut rng = Pcg32::seed_from_u64(task.seed);
    let (width, height) = task.target.dimensions();
    let mut best = Candidate {
        mutation: Mutation::noop(),
        score: task.cached_score,
    };

    for _ in 0..task.trials {
        let mutation = Mutation::random(&mut rng, width, height, &task.palette);
        let score = delta_for_candidate(&task.approx, &task.target, task.cached_score, &mutation, task.stride)?;
        if score < best.score {
            best = Candidate { mutation, score };
        }
    }

    log::trace!("worker {} best score {}", task.worker_index, best.score);
    Ok(best)
}

/// Lowest score wins; on a tie the earlier candidate is kept.
pub fn reduce(candidates: impl IntoIterator<Item = Candidate>) -> Option<Candidate> {
    candidates
        .into_iter()
        .reduce(|best, candidate| if candidate.score < best.score { candidate } else { best })
}

fn worker_seed(run_seed: u64, round: usize, worker_index: usize) -> u64 {
    run_seed
        ^ (round as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ (worker_index as u64).wrapping_add(1).wrapping_mul(0xC2B2_AE3D_27D4_EB4F)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    /// A small target with a few flat regions.
    fn quadrants(size: u32) -> Canvas {
        let half = size / 2;
        let mut canvas = Canvas::filled(size, size, Pixel::new(20, 40, 200, 255));
        Mutation::new(0, 0, half, half, Pixel::new(230, 30, 30, 255)).apply(&mut canvas).unwrap();
        Mutation::new(half, half, size - half, size - half, Pixel::new(10, 180, 60, 255))
            .apply(&mut canvas)
            .unwrap();
        canvas
    }

    fn candidate(score: Score, x: u32) -> Candidate {
        Candidate {
            mutation: Mutation::new(x, 0, 1, 1, Pixel::WHITE),
            score,
        }
    }

    #[test]
    fn reduce_prefers_lowest_then_earliest() {
        let winner = reduce([candidate(9, 0), candidate(4, 1), candidate(4, 2), candidate(7, 3)]).unwrap();
        assert_eq!(winner, candidate(4, 1));
        assert_eq!(reduce(Vec::new()), None);
    }

    #[test]
    fn worker_never_reports_a_worse_candidate() {
        let target = Arc::new(quadrants(8));
        let approx = Arc::new(Canvas::filled(8, 8, Pixel::WHITE));
        let cached = total_distance(&target, &approx).unwrap();
        let best = find_mutation(RoundTask {
            worker_index: 0,
            trials: 50,
            seed: 3,
            stride: 1,
            cached_score: cached,
            approx,
            target: Arc::clone(&target),
            palette: Arc::new(Palette::extract(&target).unwrap()),
        })
        .unwrap();
        assert!(best.score <= cached);
    }

    #[tokio::test]
    async fn seeded_runs_are_reproducible() {
        let config = ApproxConfig::new(25, 64, 1).with_workers(4).with_seed(0xC0FFEE);
        let first = Approximator::new(config.clone()).unwrap().run(quadrants(12), &()).await.unwrap();
        let second = Approximator::new(config).unwrap().run(quadrants(12), &()).await.unwrap();

        assert_eq!(first.history, second.history);
        assert_eq!(first.canvas, second.canvas);
    }

    #[tokio::test]
    async fn score_never_increases_and_matches_rescan() {
        let target = quadrants(10);
        let config = ApproxConfig::new(30, 80, 1).with_workers(2).with_seed(11);
        let result = Approximator::new(config).unwrap().run(target.clone(), &()).await.unwrap();

        let mut previous = result.initial_score;
        for &score in &result.history {
            assert!(score <= previous);
            previous = score;
        }
        assert_eq!(result.score, total_distance(&target, &result.canvas).unwrap());
        assert!(result.score < result.initial_score);
    }

    /// Deterministic per-pixel noise, so almost every pixel is its own color.
    fn noise(size: u32, seed: u64) -> Canvas {
        let mut rng = Pcg32::seed_from_u64(seed);
        let mut canvas = Canvas::new(size, size);
        for y in 0..size {
            for x in 0..size {
                canvas.set(x, y, Pixel::new(rng.random(), rng.random(), rng.random(), 255));
            }
        }
        canvas
    }

    #[tokio::test]
    async fn sampled_scoring_keeps_improving() {
        let target = noise(16, 21);
        let config = ApproxConfig::new(400, 200, 4).with_workers(2).with_seed(0);
        let result = Approximator::new(config).unwrap().run(target.clone(), &()).await.unwrap();

        assert_eq!(result.rounds(), 400);
        assert_eq!(result.score, total_distance(&target, &result.canvas).unwrap());
        assert!(result.score < result.initial_score);

        // Rounds in the last quarter still find rectangles the estimate prefers.
        assert!(result.history[399] < result.history[299]);
    }

    #[tokio::test]
    async fn emits_one_event_per_round() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let config = ApproxConfig::new(5, 10, 2).with_workers(2).with_seed(5);
        Approximator::new(config).unwrap().run(quadrants(6), &tx).await.unwrap();
        drop(tx);

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        let expected: Vec<_> = (0..5).map(|i| ProgressEvent::mutation(i, 5)).collect();
        assert_eq!(events, expected);
    }

    #[tokio::test]
    async fn too_few_mutations_apply_noops() {
        let target = quadrants(6);
        let config = ApproxConfig::new(3, 1, 1).with_workers(2).with_seed(9);
        let result = Approximator::new(config).unwrap().run(target, &()).await.unwrap();

        assert_eq!(result.history, vec![result.initial_score; 3]);
        assert_eq!(result.canvas, Canvas::filled(6, 6, Pixel::WHITE));
    }

    #[tokio::test]
    async fn white_target_starts_at_zero() {
        let config = ApproxConfig::new(2, 8, 1).with_workers(1).with_seed(2);
        let result = Approximator::new(config)
            .unwrap()
            .run(Canvas::filled(3, 3, Pixel::WHITE), &())
            .await
            .unwrap();
        assert_eq!(result.initial_score, 0);
        assert_eq!(result.score, 0);
    }

    #[tokio::test]
    async fn single_pixel_target_is_stable() {
        let config = ApproxConfig::new(4, 16, 1).with_workers(2).with_seed(8);
        let result = Approximator::new(config)
            .unwrap()
            .run(Canvas::filled(1, 1, Pixel::BLACK), &())
            .await
            .unwrap();
        // Every sampled rectangle on a 1x1 canvas is empty.
        assert_eq!(result.score, 765);
    }

    #[tokio::test]
    async fn empty_target_is_rejected() {
        let config = ApproxConfig::new(1, 1, 1).with_workers(1);
        let result = Approximator::new(config).unwrap().run(Canvas::new(0, 0), &()).await;
        assert_eq!(result, Err(ApproxError::EmptyCanvas));
    }

    struct CancelAfter {
        round: usize,
        control: ControlHandle,
    }

    impl ProgressSink for CancelAfter {
        fn notify(&self, event: ProgressEvent) {
            if event.progress == self.round {
                self.control.cancel();
            }
        }
    }

    #[tokio::test]
    async fn cancellation_stops_between_rounds() {
        let (control, cancel) = ControlHandle::channel();
        let sink = CancelAfter { round: 2, control };
        let config = ApproxConfig::new(50, 20, 1).with_workers(2).with_seed(4);

        let result = Approximator::new(config)
            .unwrap()
            .run_until_cancelled(quadrants(8), &sink, cancel)
            .await
            .unwrap();
        assert_eq!(result.rounds(), 3);
    }

    #[tokio::test]
    async fn cancelled_before_start_returns_blank() {
        let (control, cancel) = ControlHandle::channel();
        control.cancel();
        let config = ApproxConfig::new(10, 20, 1).with_workers(2);

        let result = Approximator::new(config)
            .unwrap()
            .run_until_cancelled(quadrants(4), &(), cancel)
            .await
            .unwrap();
        assert_eq!(result.rounds(), 0);
        assert_eq!(result.score, result.initial_score);
        assert_eq!(result.canvas, Canvas::filled(4, 4, Pixel::WHITE));
    }
}
