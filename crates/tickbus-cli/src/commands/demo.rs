//! Demo command: walks through every bus operation once.

use std::sync::mpsc::{self, Receiver, Sender};

use anyhow::Result;
use serde::Serialize;
use tickbus_events::{DrainReport, EventBus, ListenerId, define_event};
use tracing::info;

use super::OutputFormat;
use crate::theme::Theme;

/// Owned payload handed back to the finish callback after delivery.
#[derive(Debug)]
pub(crate) struct Resource {
    id: u32,
}

impl Resource {
    fn describe(&self) -> String {
        format!("resource #{}", self.id)
    }
}

define_event!(pub(crate) IntAndDouble => (i32, f64));
define_event!(pub(crate) Text => String);
define_event!(pub(crate) Signal => ());
define_event!(pub(crate) Owned => Resource);

/// Everything the demo observed.
#[derive(Debug, Serialize)]
pub(crate) struct DemoReport {
    /// Callback output in invocation order.
    pub(crate) transcript: Vec<String>,
    /// Result of the single tick that flushed the deferred deliveries.
    pub(crate) drain: DrainReport,
}

fn line(tx: &Sender<String>, text: String) {
    // The receiver lives until the demo returns.
    let _ = tx.send(text);
}

/// Replay the reference scenario against `bus`.
///
/// # Errors
///
/// Returns an error if the bus is not initialized.
pub(crate) fn run_scenario(bus: &EventBus) -> Result<DemoReport> {
    let (tx, rx): (Sender<String>, Receiver<String>) = mpsc::channel();
    let first = ListenerId::generate();
    let second = ListenerId::generate();

    let out = tx.clone();
    bus.register::<IntAndDouble>(first, move |(a, b): &(i32, f64)| {
        line(&out, format!("first listener got a = {a}, b = {b}"));
    })?;
    let out = tx.clone();
    bus.register::<IntAndDouble>(second, move |(a, b): &(i32, f64)| {
        line(&out, format!("second listener got a = {a}, b = {b}"));
    })?;
    let out = tx.clone();
    bus.register::<Text>(first, move |s: &String| {
        line(&out, format!("text listener got `{s}`"));
    })?;
    let out = tx.clone();
    bus.register::<Signal>(first, move |()| line(&out, "signal listener called".to_owned()))?;
    let out = tx.clone();
    bus.register::<Owned>(first, move |resource: &Resource| {
        line(&out, format!("resource listener got {}", resource.describe()));
    })?;

    bus.broadcast_sync::<IntAndDouble>((1, 2.2))?;

    bus.unregister::<IntAndDouble>(first)?;
    bus.broadcast_sync::<IntAndDouble>((2, 4.4))?;

    bus.broadcast_sync::<Text>("aaa".to_owned())?;
    bus.broadcast_async::<Text>("bbb".to_owned())?;
    bus.broadcast_sync::<Text>("ddd".to_owned())?;
    bus.broadcast_sync::<Signal>(())?;

    let out = tx.clone();
    bus.broadcast_async_with_callback::<Owned>(Resource { id: 1 }, move |resource| {
        line(&out, format!("finish callback released {}", resource.describe()));
    })?;

    let removed = bus.clear::<IntAndDouble>()?;
    info!(removed, "Cleared pair listeners");
    bus.broadcast_sync::<IntAndDouble>((4, 8.8))?;

    line(&tx, "-- tick --".to_owned());
    let drain = bus.tick()?;
    bus.reset();

    drop(tx);
    Ok(DemoReport {
        transcript: rx.try_iter().collect(),
        drain,
    })
}

/// Run the demo and print its report.
///
/// # Errors
///
/// Returns an error if the scenario fails or the report cannot be encoded.
pub(crate) fn run_demo(bus: &EventBus, format: OutputFormat) -> Result<()> {
    let report = run_scenario(bus)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Pretty => {
            println!("{}", Theme::title("tickbus demo"));
            let mut index: usize = 0;
            for entry in &report.transcript {
                if !entry.starts_with("--") {
                    index = index.saturating_add(1);
                }
                println!("{}", Theme::entry(index, entry));
            }
            println!("{}", Theme::rule());
            println!(
                "{}",
                Theme::ok(&format!(
                    "tick ran {} deferred task(s) in {:?}",
                    report.drain.executed, report.drain.elapsed
                ))
            );
            if !report.drain.is_complete() {
                println!(
                    "{}",
                    Theme::caution(&format!(
                        "{} task(s) were still queued when the bus was reset",
                        report.drain.remaining
                    ))
                );
            }
        },
    }
    Ok(())
}
