//! # zmqstream
//!
//! Backpressure-aware streaming sockets over ZeroMQ-style message transports.
//!
//! ## Architecture
//!
//! zmqstream is split in two layers:
//!
//! - **`zmqstream-core`**: message model, socket kinds and options, the
//!   transport port, the readiness signal, and an in-process transport
//! - **`zmqstream`**: readiness monitor, stream engine and the public
//!   [`Socket`] (this crate)
//!
//! A [`Socket`] never blocks. `write` either hands a message to the
//! transport or queues it and returns `false`; `read` returns what is
//! available or `None`. Readiness changes reported by the transport are
//! turned into two notifications, [`StreamEvent::Drain`] and
//! [`StreamEvent::Readable`], delivered to observers.
//!
//! ## Quick Start
//!
//! ```rust
//! use zmqstream::prelude::*;
//!
//! # async fn example() -> zmqstream::Result<()> {
//! let mut sink = Socket::with_type(SocketType::Pull);
//! sink.bind("inproc://quick-start")?;
//! let readable = sink.on(StreamEvent::Readable);
//!
//! let mut vent = Socket::with_type(SocketType::Push);
//! vent.connect("inproc://quick-start")?;
//! vent.write(Message::from(["task", "42"]))?;
//!
//! // Wait for the transport to signal, then pull in batches.
//! sink.ready().await?;
//! if readable.try_next().is_some() {
//!     while let Some(batch) = sink.read(None)? {
//!         for msg in batch {
//!             println!("{} frames", msg.len());
//!         }
//!     }
//! }
//! # Ok(())
//! # }
//! # futures::executor::block_on(example()).unwrap();
//! ```
//!
//! ## Backpressure
//!
//! The outbound queue has no cap of its own. Producers stop when `write`
//! returns `false` and resume on the next [`StreamEvent::Drain`]; the
//! transport's send high-water mark bounds how much is in flight.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod dev_tracing;
pub mod engine;
pub mod readiness;
pub mod socket;

// Re-export core types
pub use bytes::Bytes;
pub use socket::{Endpoints, Socket};
pub use zmqstream_core::error::{Result, StreamError};
pub use zmqstream_core::events::{Observer, ObserverId, StreamEvent};
pub use zmqstream_core::inproc::InprocTransport;
pub use zmqstream_core::message::{Frame, Message};
pub use zmqstream_core::options::{OptionValue, SocketOption, SocketOptions};
pub use zmqstream_core::socket_type::SocketType;

/// Building blocks for custom transports.
pub mod transport {
    pub use zmqstream_core::signal::{ReadinessSignal, SignalHandle};
    pub use zmqstream_core::transport::{RecvOutcome, SendOutcome, Transport};
}

/// Commonly used types.
pub mod prelude {
    pub use crate::socket::Socket;
    pub use bytes::Bytes;
    pub use zmqstream_core::error::{Result, StreamError};
    pub use zmqstream_core::events::{Observer, StreamEvent};
    pub use zmqstream_core::message::Message;
    pub use zmqstream_core::options::{OptionValue, SocketOption, SocketOptions};
    pub use zmqstream_core::socket_type::SocketType;
}
