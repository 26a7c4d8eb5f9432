//! Bounded progress channel with a drop-oldest overflow policy.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::Notify;

use crate::buffer::RingBuffer;

/// Pending lines kept before the oldest is dropped.
pub const DEFAULT_CAPACITY: usize = 20;

struct Shared {
    queue: Mutex<RingBuffer<String>>,
    notify: Notify,
    senders: AtomicUsize,
    dropped: AtomicU64,
}

impl Shared {
    fn queue(&self) -> std::sync::MutexGuard<'_, RingBuffer<String>> {
        // A panic while holding the lock cannot leave the ring buffer in a
        // torn state, so poisoning is ignored.
        self.queue.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Creates a progress channel holding at most `capacity` pending lines.
///
/// # Panics
///
/// Panics if `capacity` is zero.
pub fn progress_channel(capacity: usize) -> (ProgressSender, ProgressReceiver) {
    let shared = Arc::new(Shared {
        queue: Mutex::new(RingBuffer::new(capacity)),
        notify: Notify::new(),
        senders: AtomicUsize::new(1),
        dropped: AtomicU64::new(0),
    });
    (
        ProgressSender {
            shared: shared.clone(),
        },
        ProgressReceiver { shared },
    )
}

/// Producer half. Sending never blocks.
pub struct ProgressSender {
    shared: Arc<Shared>,
}

impl ProgressSender {
    /// Queues a line, evicting the oldest pending one when full.
    pub fn send(&self, message: impl Into<String>) {
        let evicted = self.shared.queue().push(message.into());
        if evicted.is_some() {
            self.shared.dropped.fetch_add(1, Ordering::Relaxed);
        }
        self.shared.notify.notify_one();
    }

    /// Discards every pending line. Returns how many were removed.
    pub fn clear(&self) -> usize {
        self.shared.queue().clear()
    }

    /// Number of lines waiting to be received.
    pub fn pending(&self) -> usize {
        self.shared.queue().len()
    }

    /// Total lines evicted by overflow since the channel was created.
    pub fn dropped(&self) -> u64 {
        self.shared.dropped.load(Ordering::Relaxed)
    }
}

impl Clone for ProgressSender {
    fn clone(&self) -> Self {
        self.shared.senders.fetch_add(1, Ordering::AcqRel);
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl Drop for ProgressSender {
    fn drop(&mut self) {
        if self.shared.senders.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.shared.notify.notify_one();
        }
    }
}

/// Consumer half.
pub struct ProgressReceiver {
    shared: Arc<Shared>,
}

impl ProgressReceiver {
    /// Waits for the next line.
    ///
    /// Returns `None` once every sender is dropped and the queue is empty.
    pub async fn recv(&mut self) -> Option<String> {
        let shared = &self.shared;
        loop {
            // Registered before the queue check so a send in between still
            // wakes this waiter.
            let notified = shared.notify.notified();
            if let Some(message) = shared.queue().pop() {
                return Some(message);
            }
            if shared.senders.load(Ordering::Acquire) == 0 {
                return None;
            }
            notified.await;
        }
    }

    /// Takes the next line without waiting.
    pub fn try_recv(&self) -> Option<String> {
        self.shared.queue().pop()
    }

    /// Discards every pending line. Returns how many were removed.
    pub fn drain(&self) -> usize {
        self.shared.queue().clear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn preserves_order() {
        let (tx, mut rx) = progress_channel(8);
        tx.send("one");
        tx.send("two");
        tx.send("three");

        assert_eq!(rx.recv().await.as_deref(), Some("one"));
        assert_eq!(rx.recv().await.as_deref(), Some("two"));
        assert_eq!(rx.recv().await.as_deref(), Some("three"));
    }

    #[tokio::test]
    async fn overflow_drops_oldest() {
        let (tx, rx) = progress_channel(3);
        for i in 1..=5 {
            tx.send(format!("m{i}"));
        }

        assert_eq!(tx.dropped(), 2);
        assert_eq!(tx.pending(), 3);
        assert_eq!(rx.try_recv().as_deref(), Some("m3"));
        assert_eq!(rx.try_recv().as_deref(), Some("m4"));
        assert_eq!(rx.try_recv().as_deref(), Some("m5"));
        assert_eq!(rx.try_recv(), None);
    }

    #[tokio::test]
    async fn recv_ends_when_senders_dropped() {
        let (tx, mut rx) = progress_channel(4);
        let tx2 = tx.clone();
        tx.send("last");
        drop(tx);
        drop(tx2);

        assert_eq!(rx.recv().await.as_deref(), Some("last"));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn recv_wakes_on_send_from_task() {
        let (tx, mut rx) = progress_channel(4);
        let handle = tokio::spawn(async move { rx.recv().await });
        tokio::task::yield_now().await;
        tx.send("wake");

        assert_eq!(handle.await.unwrap().as_deref(), Some("wake"));
    }

    #[tokio::test]
    async fn recv_after_try_recv_keeps_order() {
        let (tx, mut rx) = progress_channel(4);
        tx.send("a");
        tx.send("b");
        tx.send("c");

        assert_eq!(rx.try_recv().as_deref(), Some("a"));
        assert_eq!(rx.recv().await.as_deref(), Some("b"));
        assert_eq!(rx.drain(), 1);
        drop(tx);
        assert_eq!(rx.recv().await, None);
    }

    #[test]
    fn clear_empties_queue() {
        let (tx, rx) = progress_channel(4);
        tx.send("a");
        tx.send("b");

        assert_eq!(tx.clear(), 2);
        assert_eq!(tx.pending(), 0);
        assert_eq!(rx.try_recv(), None);
    }
}
