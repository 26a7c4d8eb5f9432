//! Install progress plumbing.
//!
//! Handlers announce each stage as a short line of text. Lines flow through a
//! bounded channel that drops the oldest pending line instead of blocking the
//! producer, and a [`ProgressAggregator`] coalesces bursts into batches for a
//! UI-facing state holder.

mod aggregator;
mod buffer;
mod channel;
mod sink;

pub use aggregator::{DEFAULT_WINDOW, ProgressAggregator};
pub use buffer::RingBuffer;
pub use channel::{DEFAULT_CAPACITY, ProgressReceiver, ProgressSender, progress_channel};
pub use sink::{ProgressCallback, ProgressLog, ProgressSink};
