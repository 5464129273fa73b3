//! zmqstream Core
//!
//! This crate contains the runtime-agnostic building blocks:
//! - Multipart message model (`message`)
//! - Socket kinds and keyed options (`socket_type`, `options`, `config`)
//! - The non-blocking transport port (`transport`)
//! - Coalescing readiness signal shared by transport and monitor (`signal`)
//! - Drain / readable notifications and observers (`events`)
//! - In-process reference transport (`inproc`)
//! - Error types (`error`)

#![deny(unsafe_code)]
// Allow some pedantic lints that are intentional in this crate
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::module_name_repetitions)]
pub mod config;
pub mod error;
pub mod events;
pub mod inproc;
pub mod message;
pub mod options;
pub mod signal;
pub mod socket_type;
pub mod transport;

/// Types most callers of the core crate need.
pub mod prelude {
    pub use crate::error::{Result, StreamError};
    pub use crate::events::{Observer, ObserverId, StreamEvent};
    pub use crate::inproc::InprocTransport;
    pub use crate::message::{Frame, Message};
    pub use crate::options::{OptionValue, SocketOption, SocketOptions};
    pub use crate::signal::{ReadinessSignal, SignalHandle};
    pub use crate::socket_type::SocketType;
    pub use crate::transport::{RecvOutcome, SendOutcome, Transport};
}
