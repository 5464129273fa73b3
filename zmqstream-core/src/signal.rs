//! Coalescing readiness signal.
//!
//! The in-process analogue of the notification fd a ZeroMQ socket exposes: a
//! transport fires it whenever its readiness *may* have changed, and the
//! readiness monitor wakes up once no matter how many times it fired in
//! between. The signal carries no readable/writable bits; the monitor reads
//! those from the transport after waking.

use futures::task::AtomicWaker;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

/// Shared handle to a readiness signal.
pub type SignalHandle = Arc<ReadinessSignal>;

/// Edge notification from a transport to the monitor waiting on it.
///
/// Notifications that arrive before the monitor looks are coalesced into one.
#[derive(Debug, Default)]
pub struct ReadinessSignal {
    pending: AtomicBool,
    fired: AtomicU64,
    waker: AtomicWaker,
}

impl ReadinessSignal {
    /// Create an unfired signal.
    #[must_use]
    pub fn new() -> SignalHandle {
        Arc::new(Self::default())
    }

    /// Mark readiness as possibly changed and wake the waiting monitor.
    pub fn notify(&self) {
        self.fired.fetch_add(1, Ordering::Relaxed);
        self.pending.store(true, Ordering::Release);
        self.waker.wake();
    }

    /// Consume a pending notification without registering interest.
    pub fn take(&self) -> bool {
        self.pending.swap(false, Ordering::AcqRel)
    }

    /// True when a notification is waiting to be consumed.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Total number of `notify` calls, coalesced or not.
    #[must_use]
    pub fn fired(&self) -> u64 {
        self.fired.load(Ordering::Relaxed)
    }

    /// Wait for the next notification.
    ///
    /// Resolves once per batch of coalesced notifications. The waker is
    /// registered before the flag is re-checked so a `notify` racing with the
    /// poll is never lost.
    pub fn poll_notified(&self, cx: &mut Context<'_>) -> Poll<()> {
        if self.take() {
            return Poll::Ready(());
        }
        self.waker.register(cx.waker());
        if self.take() {
            Poll::Ready(())
        } else {
            Poll::Pending
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::task::noop_waker_ref;

    #[test]
    fn test_notifications_coalesce() {
        let signal = ReadinessSignal::new();
        signal.notify();
        signal.notify();
        signal.notify();

        let mut cx = Context::from_waker(noop_waker_ref());
        assert_eq!(signal.poll_notified(&mut cx), Poll::Ready(()));
        assert_eq!(signal.poll_notified(&mut cx), Poll::Pending);
        assert_eq!(signal.fired(), 3);
    }

    #[test]
    fn test_take_clears_pending() {
        let signal = ReadinessSignal::new();
        assert!(!signal.take());
        signal.notify();
        assert!(signal.is_pending());
        assert!(signal.take());
        assert!(!signal.is_pending());
    }

    #[test]
    fn test_wakes_across_threads() {
        let signal = ReadinessSignal::new();
        let remote = Arc::clone(&signal);

        let notifier = std::thread::spawn(move || remote.notify());
        futures::executor::block_on(futures::future::poll_fn(|cx| signal.poll_notified(cx)));
        notifier.join().unwrap();
    }
}
