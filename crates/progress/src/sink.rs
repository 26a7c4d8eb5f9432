//! Destinations for progress lines.

use std::sync::Mutex;

use crate::channel::ProgressSender;

/// Callback invoked with each progress line.
pub type ProgressCallback = Box<dyn Fn(&str) + Send + Sync>;

/// Receives progress lines from an install, in emission order.
pub trait ProgressSink: Send + Sync {
    /// Records one progress line.
    fn emit(&self, message: &str);

    /// Drops lines that were emitted but not yet consumed.
    ///
    /// Called when an install is cancelled so a stale backlog does not leak
    /// into the next run. Sinks without a buffer ignore it.
    fn discard_pending(&self) {}
}

impl ProgressSink for ProgressSender {
    fn emit(&self, message: &str) {
        self.send(message);
    }

    fn discard_pending(&self) {
        let discarded = self.clear();
        if discarded > 0 {
            tracing::debug!(discarded, "dropped pending progress lines");
        }
    }
}

impl ProgressSink for ProgressCallback {
    fn emit(&self, message: &str) {
        (**self)(message);
    }
}

/// In-memory sink keeping every line.
#[derive(Debug, Default)]
pub struct ProgressLog {
    lines: Mutex<Vec<String>>,
}

impl ProgressLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded lines.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl ProgressSink for ProgressLog {
    fn emit(&self, message: &str) {
        self.lines
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::channel::progress_channel;

    #[test]
    fn callback_sink_forwards() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen2 = seen.clone();
        let cb: ProgressCallback = Box::new(move |m| seen2.lock().unwrap().push(m.to_string()));

        cb.emit("first");
        cb.emit("second");
        cb.discard_pending();

        assert_eq!(*seen.lock().unwrap(), vec!["first", "second"]);
    }

    #[test]
    fn sender_sink_discards_backlog() {
        let (tx, _rx) = progress_channel(4);
        let sink: &dyn ProgressSink = &tx;
        sink.emit("a");
        sink.emit("b");
        sink.discard_pending();
        assert_eq!(tx.pending(), 0);
    }

    #[test]
    fn log_keeps_everything() {
        let log = ProgressLog::new();
        log.emit("x");
        log.emit("y");
        assert_eq!(log.lines(), vec!["x", "y"]);
    }
}
