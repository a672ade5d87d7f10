//! Gestures reported by the host surface, one JSON object per line.

use std::{
    io::{self, BufRead, BufReader},
    thread::{Builder, JoinHandle},
};

use anyhow::{ensure, Context as _, Result};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::drag::{Point, Size};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum InputEvent {
    PointerDown(Point),
    PointerMove(Point),
    PointerUp,
    TouchStart { touches: Vec<Point> },
    TouchMove { touches: Vec<Point> },
    TouchEnd,
    /// Double activation on the widget toggles auto-skip
    DoubleClick(Point),
    /// The viewport changed size
    Resize(Size),
    /// The host measured the widget box
    WidgetSize(Size),
    Quit,
}

/// Read events from stdin into `sender` until stdin closes.
///
/// # Errors
///
/// Returns an error if the reader thread cannot be started.
pub fn spawn_stdin_reader(sender: mpsc::Sender<InputEvent>) -> Result<JoinHandle<Result<()>>> {
    spawn_reader(BufReader::new(io::stdin()), sender)
}

/// Read events on a thread of their own.
///
/// The runtime never waits on this thread, so a host that keeps the pipe open
/// cannot hold up shutdown.
///
/// # Errors
///
/// Returns an error if the thread cannot be started.
pub fn spawn_reader<R>(
    reader: R,
    sender: mpsc::Sender<InputEvent>,
) -> Result<JoinHandle<Result<()>>>
where
    R: BufRead + Send + 'static,
{
    Builder::new()
        .name("input".to_owned())
        .spawn(move || read_events(reader, &sender))
        .context("Failed to start input reader")
}

/// Parse one event per line. Malformed lines are logged and skipped.
///
/// Blocks; must not run on the runtime.
///
/// # Errors
///
/// Returns an error if reading fails or nobody is listening any more.
pub fn read_events<R: BufRead>(reader: R, sender: &mpsc::Sender<InputEvent>) -> Result<()> {
    for line in reader.lines() {
        let line = line.context("Failed to read input")?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let event = match serde_json::from_str::<InputEvent>(line) {
            Ok(e) => e,
            Err(e) => {
                warn!(%e, line, "Ignoring malformed input");
                continue;
            }
        };
        debug!(?event, "Input received");
        let result = sender.blocking_send(event);
        ensure!(result.is_ok(), "Input listener closed");
    }
    debug!("Input closed");
    Ok(())
}
