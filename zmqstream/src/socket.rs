//! Stream socket.
//!
//! [`Socket`] composes a transport, a [`StreamEngine`] and a
//! [`ReadinessMonitor`] into the public API: non-blocking `write`/`read`,
//! endpoint management, options, and drain/readable notifications delivered
//! to observers.

use crate::engine::{DrainOutcome, StreamEngine};
use crate::readiness::ReadinessMonitor;
use tracing::debug;
use zmqstream_core::error::{Result, StreamError};
use zmqstream_core::events::{Observer, ObserverId, Observers, StreamEvent};
use zmqstream_core::inproc::InprocTransport;
use zmqstream_core::message::Message;
use zmqstream_core::options::{OptionValue, SocketOption, SocketOptions};
use zmqstream_core::socket_type::SocketType;
use zmqstream_core::transport::Transport;

/// Endpoints a socket bound or connected to, in call order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Endpoints {
    /// Endpoints passed to a successful `bind` and not yet unbound.
    pub bound: Vec<String>,
    /// Endpoints passed to a successful `connect` and not yet disconnected.
    pub connected: Vec<String>,
}

/// A backpressure-aware stream socket.
///
/// Writes never block: a message either goes straight to the transport or
/// waits in an outbound queue until the transport has room, and `write`
/// tells the caller which happened. Reads never block either: `read` returns
/// whatever is available, up to a limit, or `None`.
///
/// Progress on queued messages and readable notifications happens in
/// [`Socket::dispatch`], which [`Socket::ready`] runs after every readiness
/// wake-up.
///
/// ## Example
///
/// ```rust
/// use zmqstream::prelude::*;
///
/// # fn example() -> zmqstream::Result<()> {
/// let mut server = Socket::new();
/// server.bind("inproc://socket-doc")?;
///
/// let mut client = Socket::new();
/// client.connect("inproc://socket-doc")?;
///
/// assert!(client.write(Message::from(["one", "two"]))?);
///
/// let batch = server.read(None)?.unwrap_or_default();
/// assert_eq!(batch.len(), 1);
/// assert_eq!(batch[0].len(), 2);
/// # Ok(())
/// # }
/// # example().unwrap();
/// ```
#[derive(Debug)]
pub struct Socket<T: Transport = InprocTransport> {
    engine: StreamEngine<T>,
    monitor: ReadinessMonitor,
    observers: Observers,
    options: SocketOptions,
    endpoints: Endpoints,
}

impl Socket {
    /// Create a PAIR socket with default options.
    pub fn new() -> Self {
        Self::with_options(SocketOptions::default())
    }

    /// Create a socket of the given kind with default options.
    pub fn with_type(socket_type: SocketType) -> Self {
        Self::with_options(SocketOptions::from(socket_type))
    }

    /// Create a socket over the in-process transport.
    pub fn with_options(options: SocketOptions) -> Self {
        let transport = InprocTransport::new(&options);
        Self::from_transport(transport, options)
    }
}

impl Default for Socket {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Transport> Socket<T> {
    /// Wrap an existing transport.
    ///
    /// The socket kind is taken from the transport; the rest of `options`
    /// configures the engine and seeds the option cache.
    pub fn from_transport(transport: T, mut options: SocketOptions) -> Self {
        options.socket_type = transport.socket_type();
        let monitor = ReadinessMonitor::new(transport.signal());
        debug!(socket_type = %options.socket_type, "Socket created");
        Self {
            engine: StreamEngine::new(transport, &options),
            monitor,
            observers: Observers::new(),
            options,
            endpoints: Endpoints::default(),
        }
    }

    /// Socket kind.
    pub fn socket_type(&self) -> SocketType {
        self.options.socket_type
    }

    /// True after `close`.
    pub fn is_closed(&self) -> bool {
        self.engine.is_closed()
    }

    /// Messages waiting in the outbound queue.
    pub fn queued(&self) -> usize {
        self.engine.queued()
    }

    /// Bound and connected endpoints.
    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Current option values.
    pub fn options(&self) -> &SocketOptions {
        &self.options
    }

    /// The underlying transport.
    pub fn transport(&self) -> &T {
        self.engine.transport()
    }

    fn check_endpoint(&self, endpoint: &str) -> Result<()> {
        self.engine.ensure_open()?;
        if endpoint.is_empty() {
            return Err(StreamError::no_endpoint());
        }
        Ok(())
    }

    /// Bind to `endpoint`.
    ///
    /// # Errors
    ///
    /// `Closed` if the socket is closed, `Endpoint` if `endpoint` is empty,
    /// `Transport` if the transport refuses it.
    pub fn bind(&mut self, endpoint: &str) -> Result<()> {
        self.check_endpoint(endpoint)?;
        self.engine.transport_mut().bind(endpoint)?;
        debug!(endpoint, socket_type = %self.socket_type(), "Bound");
        self.endpoints.bound.push(endpoint.to_string());
        Ok(())
    }

    /// Connect to `endpoint`.
    ///
    /// # Errors
    ///
    /// Same as [`Socket::bind`].
    pub fn connect(&mut self, endpoint: &str) -> Result<()> {
        self.check_endpoint(endpoint)?;
        self.engine.transport_mut().connect(endpoint)?;
        debug!(endpoint, socket_type = %self.socket_type(), "Connected");
        self.endpoints.connected.push(endpoint.to_string());
        Ok(())
    }

    /// Stop listening on a bound `endpoint`.
    ///
    /// # Errors
    ///
    /// Same as [`Socket::bind`].
    pub fn unbind(&mut self, endpoint: &str) -> Result<()> {
        self.check_endpoint(endpoint)?;
        self.engine.transport_mut().unbind(endpoint)?;
        debug!(endpoint, "Unbound");
        if let Some(pos) = self.endpoints.bound.iter().position(|e| e == endpoint) {
            self.endpoints.bound.remove(pos);
        }
        Ok(())
    }

    /// Drop the connection to `endpoint`.
    ///
    /// # Errors
    ///
    /// Same as [`Socket::bind`].
    pub fn disconnect(&mut self, endpoint: &str) -> Result<()> {
        self.check_endpoint(endpoint)?;
        self.engine.transport_mut().disconnect(endpoint)?;
        debug!(endpoint, "Disconnected");
        self.endpoints.connected.retain(|e| e != endpoint);
        Ok(())
    }

    /// Send a message, or queue it if the transport is full.
    ///
    /// Any number of frames is accepted, zero included. Returns `true` if
    /// the transport took the message directly, `false` if it was queued: the
    /// caller should stop producing until a [`StreamEvent::Drain`].
    ///
    /// # Errors
    ///
    /// `Closed` if the socket is closed, `Transport` on a transport fault.
    pub fn write(&mut self, msg: impl Into<Message>) -> Result<bool> {
        self.engine.enqueue(msg.into())
    }

    /// Read up to `limit` messages, or the configured batch size for `None`.
    ///
    /// Returns `Ok(None)` when nothing is available. After a readable
    /// notification, keep reading until `None` to be notified again.
    ///
    /// # Errors
    ///
    /// `Closed` if the socket is closed, `Transport` on a transport fault.
    pub fn read(&mut self, limit: Option<usize>) -> Result<Option<Vec<Message>>> {
        self.engine.pull(limit)
    }

    /// Close the socket, discarding queued messages.
    ///
    /// Closing twice is a no-op. Observers are dropped, so their receivers
    /// end after the events already delivered.
    ///
    /// # Errors
    ///
    /// `Transport` if the transport failed to release its resources. The
    /// socket is closed regardless.
    pub fn close(&mut self) -> Result<()> {
        if self.is_closed() {
            return Ok(());
        }
        self.observers.clear();
        let result = self.engine.close();
        debug!(socket_type = %self.socket_type(), "Socket closed");
        result
    }

    /// Validate and apply an option, forwarding it to the transport.
    ///
    /// # Errors
    ///
    /// `Closed` if the socket is closed, `InvalidOption` for a bad value or
    /// a read-only option, `Transport` if the transport rejects it.
    pub fn set_option(&mut self, option: SocketOption, value: impl Into<OptionValue>) -> Result<()> {
        self.engine.ensure_open()?;
        let value = value.into();
        let mut updated = self.options.clone();
        updated.set(option, &value)?;
        self.engine.transport_mut().set_option(option, &value)?;
        self.options = updated;
        debug!(%option, "Option set");
        Ok(())
    }

    /// Current value of an option.
    ///
    /// # Errors
    ///
    /// `Closed` if the socket is closed.
    pub fn get_option(&self, option: SocketOption) -> Result<OptionValue> {
        self.engine.ensure_open()?;
        Ok(self.options.get(option))
    }

    /// Observe one kind of notification.
    pub fn on(&mut self, event: StreamEvent) -> Observer {
        self.observers.subscribe(Some(event))
    }

    /// Observe every notification.
    pub fn observe(&mut self) -> Observer {
        self.observers.subscribe(None)
    }

    /// Remove an observer. Returns false if it was not registered.
    pub fn off(&mut self, id: ObserverId) -> bool {
        self.observers.unsubscribe(id)
    }

    /// Run one readiness check without waiting.
    ///
    /// Drains the outbound queue if the transport is writable and tells
    /// observers about a drain or about readable data. Returns the number of
    /// notifications raised. Finding nothing to do is not an error.
    ///
    /// # Errors
    ///
    /// `Closed` if the socket is closed, `Transport` if draining faulted.
    /// A drain fault is returned after the notifications of this check were
    /// raised, so a drain or readable edge is not lost with it.
    pub fn dispatch(&mut self) -> Result<usize> {
        self.engine.ensure_open()?;
        let mut raised = 0;
        let mut fault = None;

        let readiness = self.monitor.sample(self.engine.transport());
        if readiness.writable && self.engine.queued() > 0 {
            match self.engine.on_writable() {
                Ok(DrainOutcome::Drained) => {
                    self.observers.emit(StreamEvent::Drain);
                    raised += 1;
                }
                Ok(DrainOutcome::Yielded) => self.monitor.reschedule(),
                Ok(DrainOutcome::Blocked | DrainOutcome::Idle) => {}
                Err(e) => {
                    if self.engine.take_drain_interest() {
                        self.observers.emit(StreamEvent::Drain);
                        raised += 1;
                    } else if self.engine.queued() > 0 {
                        self.monitor.reschedule();
                    }
                    fault = Some(e);
                }
            }
        }

        if readiness.readable && self.engine.take_readable_interest() {
            self.observers.emit(StreamEvent::Readable);
            raised += 1;
        }

        match fault {
            Some(e) => Err(e),
            None => Ok(raised),
        }
    }

    /// Wait for the transport's readiness to change, then [`dispatch`].
    ///
    /// [`dispatch`]: Socket::dispatch
    ///
    /// # Errors
    ///
    /// Same as [`Socket::dispatch`].
    pub async fn ready(&mut self) -> Result<usize> {
        self.engine.ensure_open()?;
        self.monitor.ready().await;
        self.dispatch()
    }

    /// Readiness wake-ups observed so far.
    pub fn wakeups(&self) -> u64 {
        self.monitor.wakeups()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_pair() {
        assert_eq!(Socket::new().socket_type(), SocketType::Pair);
        assert_eq!(Socket::default().socket_type(), SocketType::Pair);
        assert_eq!(
            Socket::with_options(SocketOptions::default()).socket_type(),
            SocketType::Pair
        );
    }

    #[test]
    fn test_kind_comes_from_transport() {
        let transport = InprocTransport::new(&SocketOptions::from(SocketType::Dealer));
        let socket = Socket::from_transport(transport, SocketOptions::from(SocketType::Router));
        assert_eq!(socket.socket_type(), SocketType::Dealer);
    }

    #[test]
    fn test_empty_endpoint_rejected() {
        let mut socket = Socket::new();
        for result in [
            socket.bind(""),
            socket.connect(""),
            socket.unbind(""),
            socket.disconnect(""),
        ] {
            let err = result.unwrap_err();
            assert!(matches!(err, StreamError::Endpoint(_)));
            assert_eq!(err.to_string(), "No endpoint");
        }
    }

    #[test]
    fn test_endpoints_tracked() {
        let mut server = Socket::new();
        server.bind("inproc://socket-unit-endpoints").unwrap();
        let mut client = Socket::new();
        client.connect("inproc://socket-unit-endpoints").unwrap();

        assert_eq!(server.endpoints().bound, vec!["inproc://socket-unit-endpoints"]);
        assert_eq!(client.endpoints().connected, vec!["inproc://socket-unit-endpoints"]);

        client.disconnect("inproc://socket-unit-endpoints").unwrap();
        server.unbind("inproc://socket-unit-endpoints").unwrap();
        assert_eq!(server.endpoints(), &Endpoints::default());
        assert_eq!(client.endpoints(), &Endpoints::default());
    }

    #[test]
    fn test_failed_bind_not_tracked() {
        let mut first = Socket::new();
        first.bind("inproc://socket-unit-taken").unwrap();
        let mut second = Socket::new();
        let err = second.bind("inproc://socket-unit-taken").unwrap_err();
        assert!(matches!(err, StreamError::Transport(_)));
        assert!(second.endpoints().bound.is_empty());
        assert!(!second.is_closed());
    }

    #[test]
    fn test_identity_option() {
        let mut socket = Socket::with_options(SocketOptions::new().with_identity("before"));
        assert_eq!(
            socket.get_option(SocketOption::Identity).unwrap(),
            OptionValue::from("before")
        );

        socket.set_option(SocketOption::Identity, "after").unwrap();
        assert_eq!(
            socket.get_option(SocketOption::Identity).unwrap(),
            OptionValue::from("after")
        );
        assert_eq!(
            socket.transport().get_option(SocketOption::Identity).unwrap(),
            OptionValue::from("after")
        );

        assert!(matches!(
            socket.set_option(SocketOption::Type, 3i64),
            Err(StreamError::InvalidOption { .. })
        ));
        assert_eq!(socket.get_option(SocketOption::Type).unwrap().as_int(), Some(0));
    }

    #[test]
    fn test_dispatch_without_work_is_quiet() {
        let mut socket = Socket::new();
        let observer = socket.observe();
        assert_eq!(socket.dispatch().unwrap(), 0);
        assert_eq!(observer.try_next(), None);
    }
}
