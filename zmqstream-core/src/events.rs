//! Stream notifications.
//!
//! A socket reports two transitions to the application: its outbound queue
//! drained, or inbound data became available. Observers receive them through
//! `flume` channels, so delivery always happens later, when the observer
//! polls its receiver, and never inside the readiness path that detected the
//! transition.

use std::fmt;
use tracing::trace;

/// Transitions reported by a stream socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamEvent {
    /// The outbound queue went from non-empty to empty.
    Drain,

    /// Inbound messages can be pulled with `read`.
    Readable,
}

impl StreamEvent {
    /// Lowercase event name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Drain => "drain",
            Self::Readable => "readable",
        }
    }
}

impl fmt::Display for StreamEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifier returned when registering an observer.
pub type ObserverId = u64;

/// Receiving half of an observer registration.
///
/// Dropping it is equivalent to unregistering; the socket prunes it on the
/// next emitted event.
#[derive(Debug)]
pub struct Observer {
    id: ObserverId,
    events: flume::Receiver<StreamEvent>,
}

impl Observer {
    /// Id to pass to `off` to unregister.
    #[must_use]
    pub fn id(&self) -> ObserverId {
        self.id
    }

    /// Next delivered event, if one is waiting.
    pub fn try_next(&self) -> Option<StreamEvent> {
        self.events.try_recv().ok()
    }

    /// Wait for the next event.
    ///
    /// Returns `None` once the observer has been removed and every delivered
    /// event consumed.
    pub async fn next(&self) -> Option<StreamEvent> {
        self.events.recv_async().await.ok()
    }

    /// Take every event delivered so far, in delivery order.
    pub fn drain(&self) -> Vec<StreamEvent> {
        self.events.drain().collect()
    }

    /// The underlying channel, for use with `flume`'s select and stream APIs.
    #[must_use]
    pub fn receiver(&self) -> &flume::Receiver<StreamEvent> {
        &self.events
    }
}

#[derive(Debug)]
struct Registration {
    id: ObserverId,
    /// `None` observes every event.
    filter: Option<StreamEvent>,
    tx: flume::Sender<StreamEvent>,
}

/// Observer registry owned by a socket.
#[derive(Debug, Default)]
pub struct Observers {
    next_id: ObserverId,
    registrations: Vec<Registration>,
}

impl Observers {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer for one event kind, or all kinds with `None`.
    pub fn subscribe(&mut self, filter: Option<StreamEvent>) -> Observer {
        let (tx, rx) = flume::unbounded();
        self.next_id += 1;
        let id = self.next_id;
        self.registrations.push(Registration { id, filter, tx });
        Observer { id, events: rx }
    }

    /// Remove an observer. Returns false if it was not registered.
    ///
    /// Events already delivered stay readable on the observer's receiver.
    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        let before = self.registrations.len();
        self.registrations.retain(|reg| reg.id != id);
        self.registrations.len() != before
    }

    /// Deliver `event` to every matching observer. Returns the number of
    /// observers it was delivered to.
    pub fn emit(&mut self, event: StreamEvent) -> usize {
        let mut delivered = 0;
        self.registrations.retain(|reg| {
            if reg.filter.is_some_and(|kind| kind != event) {
                return !reg.tx.is_disconnected();
            }
            match reg.tx.send(event) {
                Ok(()) => {
                    delivered += 1;
                    true
                }
                Err(_) => false,
            }
        });
        trace!(%event, delivered, "Event emitted");
        delivered
    }

    /// Registered observers, including dropped ones not yet pruned.
    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    /// True when no observer is registered.
    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// Drop every registration. Observers see the channel close.
    pub fn clear(&mut self) {
        self.registrations.clear();
    }
}
