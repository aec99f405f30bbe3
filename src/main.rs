// Command-line runner: load a target image, approximate it with rectangles, save a PNG.
//
// Usage: approx_draw <input> <output> [--tries N] [--mutations N] [--pixel-sampling N]
// Every flag can also come from an `APPROX_*` environment variable.

use anyhow::Context;
use approx_draw::core_modules::utils::image_helper::image_helper;
use approx_draw::progress::ProgressEvent;
use approx_draw::{ApproxConfig, Approximator, ControlHandle};
use clap::Parser;
use std::path::PathBuf;
use tokio::sync::mpsc;

#[derive(Debug, Parser)]
#[command(name = "approx_draw", version, about = "Approximate an image with flat-color rectangles")]
struct Args {
    /// Target image (PNG, JPEG, GIF, ...)
    input: PathBuf,

    /// Where to write the approximation as PNG
    output: PathBuf,

    /// Rounds to run; each round paints one rectangle
    #[arg(long, env = "APPROX_TRIES", default_value_t = 500)]
    tries: usize,

    /// Candidate rectangles sampled per round, split across workers
    #[arg(long, env = "APPROX_MUTATIONS", default_value_t = 2000)]
    mutations: usize,

    /// Scoring stride inside a candidate rectangle (1 = every pixel)
    #[arg(long, env = "APPROX_PIXEL_SAMPLING", default_value_t = 1)]
    pixel_sampling: u32,

    /// Worker count [default: available parallelism]
    #[arg(long, env = "APPROX_WORKERS")]
    workers: Option<usize>,

    /// Seed for a reproducible run
    #[arg(long, env = "APPROX_SEED")]
    seed: Option<u64>,

    /// Largest accepted width or height of the target
    #[arg(long, env = "APPROX_MAX_DIMENSION", default_value_t = 1000)]
    max_dimension: u32,

    /// Print every progress event as a JSON line on stdout
    #[arg(long)]
    events: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let target = image_helper::load(&args.input, args.max_dimension)
        .with_context(|| format!("loading target {}", args.input.display()))?;

    let mut config = ApproxConfig::new(args.tries, args.mutations, args.pixel_sampling);
    if let Some(workers) = args.workers {
        config = config.with_workers(workers);
    }
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }
    let approximator = Approximator::new(config).context("invalid configuration")?;

    // Ctrl-C finishes the current round and keeps what has been painted so far.
    let (control, cancel) = ControlHandle::channel();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("interrupted, stopping after the current round");
            control.cancel();
        }
    });

    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let reporter = tokio::spawn(report_progress(events_rx, args.events));

    let result = approximator
        .run_until_cancelled(target, &events_tx, cancel)
        .await
        .context("approximation failed")?;
    drop(events_tx);
    reporter.await.context("progress reporter failed")?;

    image_helper::save(&args.output, &result.canvas)
        .with_context(|| format!("saving approximation to {}", args.output.display()))?;

    println!(
        "Processing complete. {} rounds, score {} -> {}. Output saved to {}",
        result.rounds(),
        result.initial_score,
        result.score,
        args.output.display()
    );
    Ok(())
}

async fn report_progress(mut events: mpsc::UnboundedReceiver<ProgressEvent>, as_json: bool) {
    while let Some(event) = events.recv().await {
        if as_json {
            match event.to_json() {
                Ok(line) => println!("{line}"),
                Err(e) => log::error!("couldn't serialize progress event: {e}"),
            }
            continue;
        }

        let step = (event.total / 10).max(1);
        if (event.progress + 1) % step == 0 || event.progress + 1 == event.total {
            log::info!("round {}/{}", event.progress + 1, event.total);
        }
    }
}
