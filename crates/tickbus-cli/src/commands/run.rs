//! Run command: a fixed-rate tick loop that feeds and drains the bus.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use anyhow::{Result, anyhow};
use serde::Serialize;
use tickbus_events::{DrainReport, EventBus, ListenerId, define_event};
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info};

use super::OutputFormat;
use crate::theme::Theme;

/// Payload broadcast every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FrameArgs {
    /// Frame number, starting at zero.
    pub(crate) frame: u64,
    /// Position within the frame's burst.
    pub(crate) seq: u32,
}

define_event!(pub(crate) FrameEvent => FrameArgs);

/// Loop parameters from the command line.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RunSettings {
    /// Number of frames to run.
    pub(crate) frames: u64,
    /// Frames per second.
    pub(crate) rate_hz: u32,
    /// Deferred broadcasts queued per frame.
    pub(crate) burst: u32,
    /// Listeners registered for the frame event.
    pub(crate) listeners: u32,
}

/// Aggregate statistics for a run.
#[derive(Debug, Default, Clone, Serialize)]
pub(crate) struct RunSummary {
    /// Frames executed.
    pub(crate) frames: u64,
    /// Per-tick drain budget.
    pub(crate) budget: Duration,
    /// Listener invocations across all ticks and the final flush.
    pub(crate) delivered: u64,
    /// Frames whose finish callback ran.
    pub(crate) completed_frames: u64,
    /// Largest queue length left behind by a tick.
    pub(crate) max_backlog: usize,
    /// Ticks that ran past their budget.
    pub(crate) overruns: u64,
    /// Time spent draining across all ticks.
    pub(crate) drain_time: Duration,
    /// Longest single tick.
    pub(crate) slowest_tick: Duration,
    /// Tasks left after the last frame and run by the final flush.
    pub(crate) flushed: usize,
}

impl RunSummary {
    fn record(&mut self, report: &DrainReport) {
        self.frames = self.frames.saturating_add(1);
        self.max_backlog = self.max_backlog.max(report.remaining);
        self.drain_time = self.drain_time.saturating_add(report.elapsed);
        self.slowest_tick = self.slowest_tick.max(report.elapsed);
        if report.elapsed > self.budget {
            self.overruns = self.overruns.saturating_add(1);
        }
    }
}

/// Drive `bus` for `settings.frames` frames and flush what is left.
///
/// # Errors
///
/// Returns an error if the rate is zero or the bus is not initialized.
pub(crate) async fn run_loop(bus: &EventBus, settings: RunSettings) -> Result<RunSummary> {
    let period = Duration::from_secs(1)
        .checked_div(settings.rate_hz)
        .ok_or_else(|| anyhow!("tick rate must be at least 1 Hz"))?;

    let delivered = Arc::new(AtomicU64::new(0));
    let completed = Arc::new(AtomicU64::new(0));

    let mut listeners = Vec::new();
    for _ in 0..settings.listeners {
        let id = ListenerId::generate();
        let delivered = Arc::clone(&delivered);
        bus.register::<FrameEvent>(id, move |_: &FrameArgs| {
            delivered.fetch_add(1, Ordering::Relaxed);
        })?;
        listeners.push(id);
    }
    info!(
        listeners = listeners.len(),
        frames = settings.frames,
        rate_hz = settings.rate_hz,
        "Starting tick loop"
    );

    let mut summary = RunSummary {
        budget: bus.options().drain_budget,
        ..RunSummary::default()
    };
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    for frame in 0..settings.frames {
        ticker.tick().await;
        queue_frame(bus, frame, settings.burst, &completed)?;

        let report = bus.tick()?;
        debug!(
            frame,
            executed = report.executed,
            remaining = report.remaining,
            "Frame drained"
        );
        summary.record(&report);
    }

    summary.flushed = bus.drain(Duration::MAX)?.executed;
    for id in listeners {
        bus.unregister::<FrameEvent>(id)?;
    }

    summary.delivered = delivered.load(Ordering::Relaxed);
    summary.completed_frames = completed.load(Ordering::Relaxed);
    info!(
        delivered = summary.delivered,
        overruns = summary.overruns,
        flushed = summary.flushed,
        "Tick loop finished"
    );
    Ok(summary)
}

/// Queue one frame's burst; the last broadcast carries the frame's finish callback.
fn queue_frame(bus: &EventBus, frame: u64, burst: u32, completed: &Arc<AtomicU64>) -> Result<()> {
    let Some(last) = burst.checked_sub(1) else {
        return Ok(());
    };
    for seq in 0..last {
        bus.broadcast_async::<FrameEvent>(FrameArgs { frame, seq })?;
    }

    let completed = Arc::clone(completed);
    bus.broadcast_async_with_callback::<FrameEvent>(FrameArgs { frame, seq: last }, move |args| {
        completed.fetch_add(1, Ordering::Relaxed);
        debug!(frame = args.frame, "Frame complete");
    })?;
    Ok(())
}

/// Run the tick loop and print its summary.
///
/// # Errors
///
/// Returns an error if the loop fails or the summary cannot be encoded.
pub(crate) async fn run_ticks(
    bus: &EventBus,
    settings: RunSettings,
    format: OutputFormat,
) -> Result<()> {
    let summary = run_loop(bus, settings).await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
        OutputFormat::Pretty => {
            println!("{}", Theme::title("tickbus run"));
            println!("{}", Theme::stat("frames", summary.frames));
            println!("{}", Theme::stat("budget", format!("{:?}", summary.budget)));
            println!("{}", Theme::stat("delivered", summary.delivered));
            println!("{}", Theme::stat("completed frames", summary.completed_frames));
            println!("{}", Theme::stat("max backlog", summary.max_backlog));
            println!("{}", Theme::stat("drain time", format!("{:?}", summary.drain_time)));
            println!(
                "{}",
                Theme::stat(
                    "slowest tick",
                    Theme::timing(summary.slowest_tick, summary.budget)
                )
            );
            println!("{}", Theme::rule());
            if summary.overruns > 0 {
                println!(
                    "{}",
                    Theme::caution(&format!("{} tick(s) overran the budget", summary.overruns))
                );
            }
            if summary.flushed > 0 {
                println!(
                    "{}",
                    Theme::note(&format!(
                        "{} task(s) were flushed after the last frame",
                        summary.flushed
                    ))
                );
            }
            println!("{}", Theme::ok("done"));
        },
    }
    Ok(())
}
