//! In-process transport.
//!
//! A [`Transport`] implementation for sockets living in the same process,
//! addressed with the `inproc://` scheme. It has no wire format: messages move
//! between sockets as owned values through `flume` channels.
//!
//! # Model
//!
//! - Every transport owns one inbox. Binding registers the transport under an
//!   endpoint name in a process-wide registry; connecting links the two
//!   transports in both directions.
//! - Sending round-robins over linked peers, skipping peers whose inbox has
//!   reached the pipe capacity (the sender's send HWM plus the receiver's
//!   receive HWM, unlimited if either is zero, as in libzmq). If every peer is
//!   full, or there is no peer, the send would block.
//! - Each successful send fires the receiver's readiness signal; each
//!   successful receive fires the signals of the receiver's peers, since they
//!   may have become writable.
//!
//! Kind-specific routing is not modelled: every kind behaves as a
//! load-balanced pipe.
//!
//! # Usage
//!
//! ```rust
//! use zmqstream_core::inproc::InprocTransport;
//! use zmqstream_core::message::Message;
//! use zmqstream_core::options::SocketOptions;
//! use zmqstream_core::transport::{RecvOutcome, SendOutcome, Transport};
//!
//! # fn example() -> std::io::Result<()> {
//! let mut server = InprocTransport::new(&SocketOptions::default());
//! server.bind("inproc://doc-usage")?;
//!
//! let mut client = InprocTransport::new(&SocketOptions::default());
//! client.connect("inproc://doc-usage")?;
//!
//! assert_eq!(client.try_send(Message::from(["Hello"]))?, SendOutcome::Sent);
//! assert!(matches!(server.try_recv()?, RecvOutcome::Received(_)));
//! # server.close()?;
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

use crate::message::Message;
use crate::options::{OptionValue, SocketOption, SocketOptions};
use crate::signal::{ReadinessSignal, SignalHandle};
use crate::socket_type::SocketType;
use crate::transport::{RecvOutcome, SendOutcome, Transport};
use bytes::Bytes;
use dashmap::DashMap;
use flume::{Receiver, Sender, TryRecvError};
use parking_lot::Mutex;
use std::io;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, trace, warn};

/// Global registry of bound inproc endpoints
static INPROC_REGISTRY: once_cell::sync::Lazy<DashMap<String, Weak<InprocShared>>> =
    once_cell::sync::Lazy::new(DashMap::new);

static NEXT_LINK_ID: AtomicU64 = AtomicU64::new(1);

/// State reachable from peers.
#[derive(Debug)]
struct InprocShared {
    socket_type: SocketType,
    inbox: Sender<Message>,
    recv_hwm: AtomicUsize,
    signal: SignalHandle,
    links: Mutex<Vec<PeerLink>>,
}

/// One direction of a bind/connect pairing.
#[derive(Debug, Clone)]
struct PeerLink {
    id: u64,
    endpoint: String,
    /// True on the connecting side.
    outgoing: bool,
    remote: Weak<InprocShared>,
}

impl InprocShared {
    fn remove_link(&self, id: u64) {
        self.links.lock().retain(|link| link.id != id);
    }
}

/// Capacity of the pipe from a sender to a receiver. `None` means unlimited.
fn pipe_capacity(send_hwm: usize, recv_hwm: usize) -> Option<usize> {
    if send_hwm == 0 || recv_hwm == 0 {
        None
    } else {
        Some(send_hwm.saturating_add(recv_hwm))
    }
}

fn has_room(remote: &InprocShared, send_hwm: usize) -> bool {
    match pipe_capacity(send_hwm, remote.recv_hwm.load(Ordering::Relaxed)) {
        Some(capacity) => remote.inbox.len() < capacity,
        None => true,
    }
}

/// In-process transport.
#[derive(Debug)]
pub struct InprocTransport {
    shared: Arc<InprocShared>,
    inbox: Receiver<Message>,
    send_hwm: usize,
    identity: Option<Bytes>,
    /// ZMQ_LINGER in milliseconds. Delivery is immediate, so nothing lingers.
    linger_ms: i64,
    bound: Vec<String>,
    cursor: usize,
}

impl InprocTransport {
    /// Create an unbound, unconnected transport.
    pub fn new(options: &SocketOptions) -> Self {
        let (tx, rx) = flume::unbounded();
        Self {
            shared: Arc::new(InprocShared {
                socket_type: options.socket_type,
                inbox: tx,
                recv_hwm: AtomicUsize::new(options.recv_hwm),
                signal: ReadinessSignal::new(),
                links: Mutex::new(Vec::new()),
            }),
            inbox: rx,
            send_hwm: options.send_hwm,
            identity: options.identity.clone(),
            linger_ms: options.get(SocketOption::Linger).as_int().unwrap_or(-1),
            bound: Vec::new(),
            cursor: 0,
        }
    }

    /// Number of live peer links.
    pub fn peer_count(&self) -> usize {
        self.shared.links.lock().len()
    }

    /// Messages waiting in this transport's inbox.
    pub fn inbox_len(&self) -> usize {
        self.inbox.len()
    }

    /// Endpoints currently bound by this transport.
    pub fn bound_endpoints(&self) -> &[String] {
        &self.bound
    }

    /// Drop every link matching `pred`, on both sides.
    fn drop_links(&self, pred: impl Fn(&PeerLink) -> bool) -> usize {
        let removed: Vec<PeerLink> = {
            let mut links = self.shared.links.lock();
            let (gone, kept): (Vec<_>, Vec<_>) = links.drain(..).partition(|l| pred(l));
            *links = kept;
            gone
        };
        for link in &removed {
            if let Some(remote) = link.remote.upgrade() {
                remote.remove_link(link.id);
                remote.signal.notify();
            }
        }
        removed.len()
    }

    fn release(&mut self) {
        for endpoint in std::mem::take(&mut self.bound) {
            if let Ok(name) = validate_and_extract_name(&endpoint) {
                unregister(name, &self.shared);
            }
        }
        self.drop_links(|_| true);
        self.inbox.drain().for_each(drop);
    }
}

impl Transport for InprocTransport {
    fn socket_type(&self) -> SocketType {
        self.shared.socket_type
    }

    fn try_send(&mut self, mut msg: Message) -> io::Result<SendOutcome> {
        let links = self.shared.links.lock();
        let count = links.len();
        for step in 0..count {
            let index = (self.cursor + step) % count;
            let Some(remote) = links[index].remote.upgrade() else {
                continue;
            };
            if !has_room(&remote, self.send_hwm) {
                continue;
            }
            let frames = msg.len();
            match remote.inbox.send(msg) {
                Ok(()) => {
                    self.cursor = (index + 1) % count;
                    trace!(frames, peer = index, "[INPROC] Message delivered");
                    remote.signal.notify();
                    return Ok(SendOutcome::Sent);
                }
                Err(flume::SendError(returned)) => msg = returned,
            }
        }
        Ok(SendOutcome::WouldBlock(msg))
    }

    fn try_recv(&mut self) -> io::Result<RecvOutcome> {
        match self.inbox.try_recv() {
            Ok(msg) => {
                for link in self.shared.links.lock().iter() {
                    if let Some(remote) = link.remote.upgrade() {
                        remote.signal.notify();
                    }
                }
                Ok(RecvOutcome::Received(msg))
            }
            Err(TryRecvError::Empty) => Ok(RecvOutcome::WouldBlock),
            // Unreachable while `shared` holds the sender, kept for completeness.
            Err(TryRecvError::Disconnected) => Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "inproc inbox disconnected",
            )),
        }
    }

    fn is_writable(&self) -> bool {
        self.shared
            .links
            .lock()
            .iter()
            .filter_map(|link| link.remote.upgrade())
            .any(|remote| has_room(&remote, self.send_hwm))
    }

    fn is_readable(&self) -> bool {
        !self.inbox.is_empty()
    }

    fn bind(&mut self, endpoint: &str) -> io::Result<()> {
        let name = validate_and_extract_name(endpoint)?;

        match INPROC_REGISTRY.entry(name.to_string()) {
            dashmap::mapref::entry::Entry::Occupied(mut entry) => {
                if entry.get().upgrade().is_some() {
                    return Err(io::Error::new(
                        io::ErrorKind::AddrInUse,
                        format!("inproc endpoint '{}' is already bound", name),
                    ));
                }
                entry.insert(Arc::downgrade(&self.shared));
            }
            dashmap::mapref::entry::Entry::Vacant(entry) => {
                entry.insert(Arc::downgrade(&self.shared));
            }
        }

        self.bound.push(endpoint.to_string());
        debug!(endpoint, socket_type = %self.shared.socket_type, "[INPROC] Bound");
        Ok(())
    }

    fn connect(&mut self, endpoint: &str) -> io::Result<()> {
        let name = validate_and_extract_name(endpoint)?;

        let binder = INPROC_REGISTRY
            .get(name)
            .and_then(|entry| entry.value().upgrade())
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("inproc endpoint '{}' not found (must bind before connect)", name),
                )
            })?;

        if !self.shared.socket_type.is_compatible(binder.socket_type) {
            warn!(
                endpoint,
                local = %self.shared.socket_type,
                peer = %binder.socket_type,
                "[INPROC] Connecting incompatible socket types"
            );
        }

        let id = NEXT_LINK_ID.fetch_add(1, Ordering::Relaxed);
        self.shared.links.lock().push(PeerLink {
            id,
            endpoint: endpoint.to_string(),
            outgoing: true,
            remote: Arc::downgrade(&binder),
        });
        binder.links.lock().push(PeerLink {
            id,
            endpoint: endpoint.to_string(),
            outgoing: false,
            remote: Arc::downgrade(&self.shared),
        });

        binder.signal.notify();
        self.shared.signal.notify();
        debug!(endpoint, socket_type = %self.shared.socket_type, "[INPROC] Connected");
        Ok(())
    }

    fn unbind(&mut self, endpoint: &str) -> io::Result<()> {
        let name = validate_and_extract_name(endpoint)?;
        let Some(pos) = self.bound.iter().position(|e| e == endpoint) else {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("inproc endpoint '{}' is not bound by this socket", name),
            ));
        };
        self.bound.remove(pos);
        unregister(name, &self.shared);
        let dropped = self.drop_links(|link| !link.outgoing && link.endpoint == endpoint);
        debug!(endpoint, dropped, "[INPROC] Unbound");
        Ok(())
    }

    fn disconnect(&mut self, endpoint: &str) -> io::Result<()> {
        validate_and_extract_name(endpoint)?;
        let dropped = self.drop_links(|link| link.outgoing && link.endpoint == endpoint);
        if dropped == 0 {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("not connected to '{}'", endpoint),
            ));
        }
        self.cursor = 0;
        debug!(endpoint, dropped, "[INPROC] Disconnected");
        Ok(())
    }

    fn set_option(&mut self, option: SocketOption, value: &OptionValue) -> io::Result<()> {
        let invalid = || {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("unsupported value for {option}"),
            )
        };
        match option {
            SocketOption::Identity => {
                let id = value.as_bytes().ok_or_else(invalid)?;
                self.identity = (!id.is_empty()).then(|| id.clone());
            }
            SocketOption::SendHighWaterMark => {
                let hwm = value.as_int().and_then(|n| usize::try_from(n).ok()).ok_or_else(invalid)?;
                self.send_hwm = hwm;
                self.shared.signal.notify();
            }
            SocketOption::RecvHighWaterMark => {
                let hwm = value.as_int().and_then(|n| usize::try_from(n).ok()).ok_or_else(invalid)?;
                self.shared.recv_hwm.store(hwm, Ordering::Relaxed);
                for link in self.shared.links.lock().iter() {
                    if let Some(remote) = link.remote.upgrade() {
                        remote.signal.notify();
                    }
                }
            }
            SocketOption::Linger => {
                self.linger_ms = value.as_int().ok_or_else(invalid)?;
            }
            SocketOption::Type => return Err(invalid()),
        }
        Ok(())
    }

    fn get_option(&self, option: SocketOption) -> io::Result<OptionValue> {
        Ok(match option {
            SocketOption::Identity => OptionValue::Bytes(self.identity.clone().unwrap_or_default()),
            SocketOption::SendHighWaterMark => OptionValue::from(self.send_hwm),
            SocketOption::RecvHighWaterMark => {
                OptionValue::from(self.shared.recv_hwm.load(Ordering::Relaxed))
            }
            SocketOption::Linger => OptionValue::Int(self.linger_ms),
            SocketOption::Type => OptionValue::Int(i64::from(self.shared.socket_type.as_raw())),
        })
    }

    fn signal(&self) -> SignalHandle {
        Arc::clone(&self.shared.signal)
    }

    fn close(&mut self) -> io::Result<()> {
        debug!(
            socket_type = %self.shared.socket_type,
            discarded = self.inbox.len(),
            "[INPROC] Closing"
        );
        self.release();
        Ok(())
    }
}

impl Drop for InprocTransport {
    fn drop(&mut self) {
        self.release();
    }
}

/// Remove `name` from the registry if it still points at `owner`.
fn unregister(name: &str, owner: &Arc<InprocShared>) {
    INPROC_REGISTRY.remove_if(name, |_, weak| {
        weak.upgrade().map_or(true, |bound| Arc::ptr_eq(&bound, owner))
    });
}

/// List all currently bound inproc endpoints.
///
/// This is primarily useful for debugging and testing.
///
/// # Returns
///
/// Returns a vector of endpoint names (without the "inproc://" prefix).
pub fn list_inproc_endpoints() -> Vec<String> {
    INPROC_REGISTRY
        .iter()
        .filter(|entry| entry.value().upgrade().is_some())
        .map(|entry| entry.key().clone())
        .collect()
}

/// Validate endpoint format and extract the name.
///
/// # Errors
///
/// Returns an error if the endpoint doesn't start with "inproc://" or has an empty name.
fn validate_and_extract_name(endpoint: &str) -> io::Result<&str> {
    const PREFIX: &str = "inproc://";

    let Some(name) = endpoint.strip_prefix(PREFIX) else {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!(
                "inproc endpoint must start with '{}', got: '{}'",
                PREFIX, endpoint
            ),
        ));
    };

    if name.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "inproc endpoint name cannot be empty",
        ));
    }

    Ok(name)
}
