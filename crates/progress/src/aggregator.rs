//! Coalesces bursts of progress lines into UI-sized batches.
//!
//! The loop blocks for the first line, waits a quiescence window, then
//! drains whatever else is already buffered and publishes it as one
//! newline-joined batch. Order across batches follows emission order.

use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::channel::ProgressReceiver;

/// Default quiescence window.
pub const DEFAULT_WINDOW: Duration = Duration::from_millis(200);

/// Batches progress lines and appends them to a cumulative display text.
pub struct ProgressAggregator {
    rx: ProgressReceiver,
    window: Duration,
    display: watch::Sender<String>,
    batch_tx: Option<mpsc::UnboundedSender<String>>,
}

impl ProgressAggregator {
    /// Creates an aggregator reading from `rx`.
    ///
    /// If `window` is `None`, defaults to 200 ms.
    pub fn new(rx: ProgressReceiver, window: Option<Duration>) -> Self {
        let (display, _) = watch::channel(String::new());
        Self {
            rx,
            window: window.unwrap_or(DEFAULT_WINDOW),
            display,
            batch_tx: None,
        }
    }

    /// Subscribes to the cumulative display text.
    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.display.subscribe()
    }

    /// Returns a receiver that gets every batch as it is published.
    ///
    /// Replaces any previously registered listener.
    pub fn batches(&mut self) -> mpsc::UnboundedReceiver<String> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.batch_tx = Some(tx);
        rx
    }

    /// Runs until `cancel` fires or every sender is dropped.
    ///
    /// On cancellation any buffered lines are discarded.
    pub async fn run(mut self, cancel: CancellationToken) {
        loop {
            let first = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                msg = self.rx.recv() => match msg {
                    Some(m) => m,
                    None => return,
                },
            };

            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.window) => {}
            }

            let mut lines = vec![first];
            while let Some(next) = self.rx.try_recv() {
                lines.push(next);
            }
            self.publish(lines.join("\n"));
        }

        let discarded = self.rx.drain();
        debug!(discarded, "progress aggregator cancelled");
    }

    fn publish(&self, batch: String) {
        self.display.send_modify(|text| {
            if !text.is_empty() {
                text.push('\n');
            }
            text.push_str(&batch);
        });
        if let Some(tx) = &self.batch_tx {
            let _ = tx.send(batch);
        }
    }
}
