//! Shared test harness.
//!
//! Hands out sockets and unique inproc endpoints for one test, closes every
//! socket it created on teardown, and checks that nothing was left open.

#![allow(dead_code)]

use std::cell::Cell;
use std::ops::{Deref, DerefMut};
use std::rc::Rc;
use std::time::Duration;
use zmqstream::prelude::*;

/// Upper bound for any single await in async tests.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);

pub struct Harness {
    name: &'static str,
    next_endpoint: Cell<usize>,
    open: Rc<Cell<usize>>,
}

impl Harness {
    pub fn new(name: &'static str) -> Self {
        zmqstream::dev_tracing::init_tracing();
        Self {
            name,
            next_endpoint: Cell::new(0),
            open: Rc::new(Cell::new(0)),
        }
    }

    /// A fresh `inproc://` endpoint unique to this test.
    pub fn endpoint(&self) -> String {
        let n = self.next_endpoint.get();
        self.next_endpoint.set(n + 1);
        format!("inproc://{}-{}", self.name, n)
    }

    pub fn socket(&self, socket_type: SocketType) -> TrackedSocket {
        self.socket_with(SocketOptions::from(socket_type))
    }

    pub fn socket_with(&self, options: SocketOptions) -> TrackedSocket {
        self.open.set(self.open.get() + 1);
        TrackedSocket {
            socket: Socket::with_options(options),
            open: Rc::clone(&self.open),
        }
    }

    /// A bound socket and a socket connected to it.
    pub fn pair_with(
        &self,
        server: SocketOptions,
        client: SocketOptions,
    ) -> (TrackedSocket, TrackedSocket) {
        let endpoint = self.endpoint();
        let mut bound = self.socket_with(server);
        bound.bind(&endpoint).expect("bind");
        let mut connected = self.socket_with(client);
        connected.connect(&endpoint).expect("connect");
        (bound, connected)
    }

    pub fn pair(&self) -> (TrackedSocket, TrackedSocket) {
        self.pair_with(SocketOptions::default(), SocketOptions::default())
    }

    /// Sockets created by this harness and not yet torn down.
    pub fn open_sockets(&self) -> usize {
        self.open.get()
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        if !std::thread::panicking() {
            assert_eq!(
                self.open.get(),
                0,
                "{}: sockets outlived the harness",
                self.name
            );
        }
    }
}

/// A socket closed automatically when dropped.
pub struct TrackedSocket {
    socket: Socket,
    open: Rc<Cell<usize>>,
}

impl Deref for TrackedSocket {
    type Target = Socket;

    fn deref(&self) -> &Socket {
        &self.socket
    }
}

impl DerefMut for TrackedSocket {
    fn deref_mut(&mut self) -> &mut Socket {
        &mut self.socket
    }
}

impl Drop for TrackedSocket {
    fn drop(&mut self) {
        self.socket.close().expect("close on teardown");
        self.open.set(self.open.get() - 1);
    }
}

/// Read until the socket reports nothing available.
pub fn read_all(socket: &mut Socket) -> Vec<Message> {
    let mut all = Vec::new();
    while let Some(batch) = socket.read(None).expect("read") {
        all.extend(batch);
    }
    all
}

/// A message with one frame holding `i` in decimal.
pub fn numbered(i: usize) -> Message {
    Message::new().push_str(&i.to_string())
}
