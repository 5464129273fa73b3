//! Transport port.
//!
//! The narrow, non-blocking interface the stream engine needs from an
//! underlying message transport. Everything else (wire protocol, handshakes,
//! subscription filtering, routing ids) stays behind this trait.
//!
//! Would-block is an outcome, not an error: `try_send` hands the message back
//! so the caller can requeue it without copying, and `try_recv` reports that
//! the inbox is empty. `Err` is reserved for real transport faults.

use crate::message::Message;
use crate::options::{OptionValue, SocketOption};
use crate::signal::SignalHandle;
use crate::socket_type::SocketType;
use std::io;

/// Result of a non-blocking send attempt.
#[derive(Debug, PartialEq, Eq)]
pub enum SendOutcome {
    /// The whole message was accepted by the transport.
    Sent,
    /// The transport is full; nothing was sent and ownership is returned.
    WouldBlock(Message),
}

/// Result of a non-blocking receive attempt.
#[derive(Debug, PartialEq, Eq)]
pub enum RecvOutcome {
    /// One complete message.
    Received(Message),
    /// No complete message is available right now.
    WouldBlock,
}

/// Non-blocking message transport consumed by the stream engine.
///
/// Implementations must never block. `close` is only called once; the socket
/// lifecycle guards against repeated calls.
pub trait Transport {
    /// Socket kind this transport was created for.
    fn socket_type(&self) -> SocketType;

    /// Attempt to hand one full message to the transport.
    fn try_send(&mut self, msg: Message) -> io::Result<SendOutcome>;

    /// Attempt to take one full message from the transport.
    fn try_recv(&mut self) -> io::Result<RecvOutcome>;

    /// Instantaneous snapshot: would `try_send` accept a message now?
    fn is_writable(&self) -> bool;

    /// Instantaneous snapshot: would `try_recv` return a message now?
    fn is_readable(&self) -> bool;

    fn bind(&mut self, endpoint: &str) -> io::Result<()>;

    fn connect(&mut self, endpoint: &str) -> io::Result<()>;

    fn unbind(&mut self, endpoint: &str) -> io::Result<()>;

    fn disconnect(&mut self, endpoint: &str) -> io::Result<()>;

    /// Apply an option. Values arrive already validated by the socket.
    fn set_option(&mut self, option: SocketOption, value: &OptionValue) -> io::Result<()>;

    fn get_option(&self, option: SocketOption) -> io::Result<OptionValue>;

    /// Signal fired whenever this transport's readiness may have changed.
    fn signal(&self) -> SignalHandle;

    /// Release transport resources.
    fn close(&mut self) -> io::Result<()>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn socket_type(&self) -> SocketType {
        (**self).socket_type()
    }

    fn try_send(&mut self, msg: Message) -> io::Result<SendOutcome> {
        (**self).try_send(msg)
    }

    fn try_recv(&mut self) -> io::Result<RecvOutcome> {
        (**self).try_recv()
    }

    fn is_writable(&self) -> bool {
        (**self).is_writable()
    }

    fn is_readable(&self) -> bool {
        (**self).is_readable()
    }

    fn bind(&mut self, endpoint: &str) -> io::Result<()> {
        (**self).bind(endpoint)
    }

    fn connect(&mut self, endpoint: &str) -> io::Result<()> {
        (**self).connect(endpoint)
    }

    fn unbind(&mut self, endpoint: &str) -> io::Result<()> {
        (**self).unbind(endpoint)
    }

    fn disconnect(&mut self, endpoint: &str) -> io::Result<()> {
        (**self).disconnect(endpoint)
    }

    fn set_option(&mut self, option: SocketOption, value: &OptionValue) -> io::Result<()> {
        (**self).set_option(option, value)
    }

    fn get_option(&self, option: SocketOption) -> io::Result<OptionValue> {
        (**self).get_option(option)
    }

    fn signal(&self) -> SignalHandle {
        (**self).signal()
    }

    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }
}
