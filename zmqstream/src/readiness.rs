//! Readiness monitor.
//!
//! Bridges a transport's coalescing [`ReadinessSignal`] and the host event
//! loop. The transport may fire its signal any number of times, from any
//! thread; the monitor turns that into one wake-up, after which the socket
//! samples the transport's level-triggered readiness and acts on it.
//!
//! The monitor never busy-polls: [`ReadinessMonitor::ready`] parks the task
//! on the signal's waker until the next notification.
//!
//! [`ReadinessSignal`]: zmqstream_core::signal::ReadinessSignal

use futures::future::poll_fn;
use tracing::trace;
use zmqstream_core::signal::SignalHandle;
use zmqstream_core::transport::Transport;

/// Level-triggered readiness snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Readiness {
    /// `try_send` would accept a message now.
    pub writable: bool,
    /// `try_recv` would return a message now.
    pub readable: bool,
}

/// Watches one transport's readiness signal.
///
/// Owned exclusively by one socket.
#[derive(Debug)]
pub struct ReadinessMonitor {
    signal: SignalHandle,
    wakeups: u64,
}

impl ReadinessMonitor {
    /// Watch `signal`, usually obtained from [`Transport::signal`].
    pub fn new(signal: SignalHandle) -> Self {
        Self { signal, wakeups: 0 }
    }

    /// Wait until the transport's readiness may have changed.
    ///
    /// Notifications that arrived since the last wake-up are coalesced, so
    /// this resolves at most once per batch of them. A wake-up may be
    /// spurious; callers sample the transport afterwards.
    ///
    /// Cancel-safe: dropping the future loses no notification.
    pub async fn ready(&mut self) {
        let signal = &self.signal;
        poll_fn(|cx| signal.poll_notified(cx)).await;
        self.wakeups += 1;
        trace!(wakeups = self.wakeups, "Readiness signal fired");
    }

    /// Consume a pending notification without waiting.
    pub fn try_ready(&mut self) -> bool {
        let fired = self.signal.take();
        if fired {
            self.wakeups += 1;
        }
        fired
    }

    /// Read the transport's current readiness.
    pub fn sample<T: Transport + ?Sized>(&self, transport: &T) -> Readiness {
        Readiness {
            writable: transport.is_writable(),
            readable: transport.is_readable(),
        }
    }

    /// Arrange for the next `ready()` to resolve immediately.
    ///
    /// Used when a drain turn stopped on its yield budget with work left, so
    /// the remaining work runs on a later turn of the host loop.
    pub fn reschedule(&self) {
        trace!("Rescheduling readiness check");
        self.signal.notify();
    }

    /// Number of wake-ups observed so far.
    pub fn wakeups(&self) -> u64 {
        self.wakeups
    }

    /// The watched signal.
    pub fn signal(&self) -> &SignalHandle {
        &self.signal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::task::noop_waker_ref;
    use std::future::Future;
    use std::pin::pin;
    use std::task::{Context, Poll};
    use zmqstream_core::signal::ReadinessSignal;

    #[test]
    fn test_ready_coalesces_notifications() {
        let signal = ReadinessSignal::new();
        let mut monitor = ReadinessMonitor::new(signal.clone());
        signal.notify();
        signal.notify();

        futures::executor::block_on(monitor.ready());
        assert_eq!(monitor.wakeups(), 1);
        assert!(!monitor.try_ready());
    }

    #[test]
    fn test_ready_waits_without_notification() {
        let signal = ReadinessSignal::new();
        let mut monitor = ReadinessMonitor::new(signal.clone());
        let mut cx = Context::from_waker(noop_waker_ref());

        {
            let mut fut = pin!(monitor.ready());
            assert_eq!(fut.as_mut().poll(&mut cx), Poll::Pending);
            signal.notify();
            assert_eq!(fut.as_mut().poll(&mut cx), Poll::Ready(()));
        }
        assert_eq!(monitor.wakeups(), 1);
    }

    #[test]
    fn test_reschedule_fires_own_signal() {
        let mut monitor = ReadinessMonitor::new(ReadinessSignal::new());
        assert!(!monitor.try_ready());
        monitor.reschedule();
        assert!(monitor.try_ready());
    }
}
