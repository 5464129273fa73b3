//! Default tuning values for stream sockets.
//!
//! These are the values `SocketOptions::default()` starts from. Tuning them
//! trades latency against fairness to other work on the same event loop.

use std::time::Duration;

/// Default number of messages returned by `read(None)` (100)
///
/// Bounds how long a single read holds the loop. Callers that want to empty
/// the inbox keep reading until they get the empty sentinel.
pub const DEFAULT_READ_BATCH: usize = 100;

/// Default number of queued messages sent per drain turn (100)
///
/// After this many sends the engine yields back to the host loop and resumes
/// on the next turn.
pub const DEFAULT_YIELD_AFTER: usize = 100;

/// Default send high water mark (1000 messages)
pub const DEFAULT_SEND_HWM: usize = 1000;

/// Default receive high water mark (1000 messages)
///
/// For the in-process transport this is the capacity of a socket's inbox.
pub const DEFAULT_RECV_HWM: usize = 1000;

/// Default linger period (30 seconds)
pub const DEFAULT_LINGER: Duration = Duration::from_secs(30);

/// Maximum identity length accepted by ZeroMQ peers
pub const MAX_IDENTITY_LEN: usize = 255;
