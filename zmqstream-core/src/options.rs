//! Socket configuration options
//!
//! Two views of the same settings: [`SocketOptions`] is the typed builder used
//! at construction time, and [`SocketOption`] / [`OptionValue`] are the keyed
//! form used by `set_option` / `get_option` after construction, similar to
//! libzmq's `zmq_setsockopt` / `zmq_getsockopt`.

use crate::config::{
    DEFAULT_LINGER, DEFAULT_READ_BATCH, DEFAULT_RECV_HWM, DEFAULT_SEND_HWM,
    DEFAULT_YIELD_AFTER, MAX_IDENTITY_LEN,
};
use crate::error::{Result, StreamError};
use crate::socket_type::SocketType;
use bytes::Bytes;
use std::fmt;
use std::time::Duration;

/// Socket configuration options.
///
/// `SocketOptions::default()` is the empty options object: a PAIR socket with
/// default limits.
///
/// # Examples
///
/// ```
/// use zmqstream_core::options::SocketOptions;
/// use zmqstream_core::socket_type::SocketType;
///
/// let opts = SocketOptions::new()
///     .with_type(SocketType::Dealer)
///     .with_identity("ExampleDealer")
///     .with_send_hwm(500);
/// assert_eq!(opts.socket_type, SocketType::Dealer);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocketOptions {
    /// Socket kind (ZMQ_TYPE). Default: PAIR.
    pub socket_type: SocketType,

    /// Socket identity / routing ID (ZMQ_IDENTITY)
    ///
    /// - Default: None (the transport assigns one)
    pub identity: Option<Bytes>,

    /// High water mark for sending (ZMQ_SNDHWM)
    ///
    /// Messages the transport may buffer outbound before reporting
    /// would-block. The engine's own queue is uncapped and relies on this.
    pub send_hwm: usize,

    /// High water mark for receiving (ZMQ_RCVHWM)
    pub recv_hwm: usize,

    /// Linger timeout (ZMQ_LINGER)
    ///
    /// How long the transport may keep undelivered messages after close.
    /// `None` means wait indefinitely. Messages still in the engine's own
    /// queue are always discarded on close.
    pub linger: Option<Duration>,

    /// Messages returned by `read(None)`.
    pub read_batch: usize,

    /// Queued messages sent per drain turn before yielding to the loop.
    pub yield_after: usize,
}

impl Default for SocketOptions {
    fn default() -> Self {
        Self {
            socket_type: SocketType::Pair,
            identity: None,
            send_hwm: DEFAULT_SEND_HWM,
            recv_hwm: DEFAULT_RECV_HWM,
            linger: Some(DEFAULT_LINGER),
            read_batch: DEFAULT_READ_BATCH,
            yield_after: DEFAULT_YIELD_AFTER,
        }
    }
}

impl From<SocketType> for SocketOptions {
    fn from(socket_type: SocketType) -> Self {
        Self::new().with_type(socket_type)
    }
}

impl SocketOptions {
    /// Create new socket options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the socket kind.
    pub fn with_type(mut self, socket_type: SocketType) -> Self {
        self.socket_type = socket_type;
        self
    }

    /// Set socket identity.
    pub fn with_identity(mut self, identity: impl Into<Bytes>) -> Self {
        self.identity = Some(identity.into());
        self
    }

    /// Set send high water mark.
    pub fn with_send_hwm(mut self, hwm: usize) -> Self {
        self.send_hwm = hwm;
        self
    }

    /// Set receive high water mark.
    pub fn with_recv_hwm(mut self, hwm: usize) -> Self {
        self.recv_hwm = hwm;
        self
    }

    /// Set linger timeout.
    pub fn with_linger(mut self, linger: Option<Duration>) -> Self {
        self.linger = linger;
        self
    }

    /// Set the default read batch size. Zero is clamped to one.
    pub fn with_read_batch(mut self, batch: usize) -> Self {
        self.read_batch = batch.max(1);
        self
    }

    /// Set the drain yield budget. Zero is clamped to one.
    pub fn with_yield_after(mut self, budget: usize) -> Self {
        self.yield_after = budget.max(1);
        self
    }

    /// Current value of a keyed option.
    #[must_use]
    pub fn get(&self, option: SocketOption) -> OptionValue {
        match option {
            SocketOption::Identity => {
                OptionValue::Bytes(self.identity.clone().unwrap_or_default())
            }
            SocketOption::SendHighWaterMark => OptionValue::Int(self.send_hwm as i64),
            SocketOption::RecvHighWaterMark => OptionValue::Int(self.recv_hwm as i64),
            SocketOption::Linger => OptionValue::Int(linger_to_millis(self.linger)),
            SocketOption::Type => OptionValue::Int(i64::from(self.socket_type.as_raw())),
        }
    }

    /// Validate and apply a keyed option.
    ///
    /// # Errors
    ///
    /// Returns `StreamError::InvalidOption` when the value has the wrong
    /// type, is out of range, or the option is read-only.
    pub fn set(&mut self, option: SocketOption, value: &OptionValue) -> Result<()> {
        match (option, value) {
            (SocketOption::Identity, OptionValue::Bytes(id)) => {
                validate_identity(id).map_err(|reason| StreamError::invalid_option(option, reason))?;
                self.identity = if id.is_empty() { None } else { Some(id.clone()) };
            }
            (SocketOption::SendHighWaterMark, OptionValue::Int(n)) => {
                self.send_hwm = non_negative(option, *n)?;
            }
            (SocketOption::RecvHighWaterMark, OptionValue::Int(n)) => {
                self.recv_hwm = non_negative(option, *n)?;
            }
            (SocketOption::Linger, OptionValue::Int(ms)) => {
                self.linger = match *ms {
                    -1 => None,
                    ms => Some(Duration::from_millis(non_negative(option, ms)? as u64)),
                };
            }
            (SocketOption::Type, _) => {
                return Err(StreamError::invalid_option(option, "option is read-only"));
            }
            (_, other) => {
                return Err(StreamError::invalid_option(
                    option,
                    format!("expected {} value, got {}", option.value_kind(), other.kind()),
                ));
            }
        }
        Ok(())
    }
}

fn non_negative(option: SocketOption, n: i64) -> Result<usize> {
    usize::try_from(n).map_err(|_| StreamError::invalid_option(option, format!("{n} is negative")))
}

/// libzmq encodes "linger forever" as -1.
fn linger_to_millis(linger: Option<Duration>) -> i64 {
    linger.map_or(-1, |d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
}

/// Identities are at most 255 bytes, and a leading null byte is reserved for
/// transport-generated ids.
fn validate_identity(id: &[u8]) -> std::result::Result<(), String> {
    if id.len() > MAX_IDENTITY_LEN {
        return Err(format!(
            "identity cannot exceed {MAX_IDENTITY_LEN} bytes (got {})",
            id.len()
        ));
    }
    if id.first() == Some(&0x00) {
        return Err("identity cannot start with null byte".to_string());
    }
    Ok(())
}

/// Keyed socket options.
///
/// Discriminants match libzmq's option constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum SocketOption {
    /// ZMQ_IDENTITY (5): bytes
    Identity = 5,
    /// ZMQ_TYPE (16): integer, read-only
    Type = 16,
    /// ZMQ_LINGER (17): integer milliseconds, -1 for infinite
    Linger = 17,
    /// ZMQ_SNDHWM (23): integer
    SendHighWaterMark = 23,
    /// ZMQ_RCVHWM (24): integer
    RecvHighWaterMark = 24,
}

impl SocketOption {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Identity => "IDENTITY",
            Self::Type => "TYPE",
            Self::Linger => "LINGER",
            Self::SendHighWaterMark => "SNDHWM",
            Self::RecvHighWaterMark => "RCVHWM",
        }
    }

    fn value_kind(self) -> &'static str {
        match self {
            Self::Identity => "bytes",
            Self::Type | Self::Linger | Self::SendHighWaterMark | Self::RecvHighWaterMark => {
                "integer"
            }
        }
    }
}

impl fmt::Display for SocketOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A keyed option value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    Bytes(Bytes),
    Int(i64),
}

impl OptionValue {
    #[must_use]
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Self::Bytes(b) => Some(b),
            Self::Int(_) => None,
        }
    }

    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            Self::Bytes(_) => None,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Bytes(_) => "bytes",
            Self::Int(_) => "integer",
        }
    }
}

impl From<Bytes> for OptionValue {
    fn from(b: Bytes) -> Self {
        Self::Bytes(b)
    }
}

impl From<&str> for OptionValue {
    fn from(s: &str) -> Self {
        Self::Bytes(Bytes::copy_from_slice(s.as_bytes()))
    }
}

impl From<&[u8]> for OptionValue {
    fn from(b: &[u8]) -> Self {
        Self::Bytes(Bytes::copy_from_slice(b))
    }
}

impl From<i64> for OptionValue {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<usize> for OptionValue {
    fn from(n: usize) -> Self {
        Self::Int(n as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let opts = SocketOptions::default();
        assert_eq!(opts.socket_type, SocketType::Pair);
        assert!(opts.identity.is_none());
        assert_eq!(opts.send_hwm, 1000);
        assert_eq!(opts.recv_hwm, 1000);
        assert_eq!(opts.read_batch, DEFAULT_READ_BATCH);
        assert_eq!(opts.yield_after, DEFAULT_YIELD_AFTER);
    }

    #[test]
    fn test_builder_pattern() {
        let opts = SocketOptions::new()
            .with_type(SocketType::Router)
            .with_identity(Bytes::from_static(b"worker-01"))
            .with_recv_hwm(2000)
            .with_read_batch(0);

        assert_eq!(opts.socket_type, SocketType::Router);
        assert_eq!(opts.identity, Some(Bytes::from_static(b"worker-01")));
        assert_eq!(opts.recv_hwm, 2000);
        assert_eq!(opts.read_batch, 1);
    }

    #[test]
    fn test_from_socket_type() {
        let opts = SocketOptions::from(SocketType::Push);
        assert_eq!(opts.socket_type, SocketType::Push);
        assert_eq!(opts.send_hwm, DEFAULT_SEND_HWM);
    }

    #[test]
    fn test_keyed_set_and_get() {
        let mut opts = SocketOptions::new();
        opts.set(SocketOption::Identity, &"TestClient".into()).unwrap();
        opts.set(SocketOption::SendHighWaterMark, &OptionValue::Int(10)).unwrap();

        assert_eq!(
            opts.get(SocketOption::Identity),
            OptionValue::Bytes(Bytes::from_static(b"TestClient"))
        );
        assert_eq!(opts.get(SocketOption::SendHighWaterMark).as_int(), Some(10));
        assert_eq!(opts.get(SocketOption::Type).as_int(), Some(0));
    }

    #[test]
    fn test_keyed_set_rejects_bad_values() {
        let mut opts = SocketOptions::new();

        let err = opts.set(SocketOption::Type, &OptionValue::Int(5)).unwrap_err();
        assert!(matches!(err, StreamError::InvalidOption { option: SocketOption::Type, .. }));

        assert!(opts.set(SocketOption::Identity, &OptionValue::Int(1)).is_err());
        assert!(opts.set(SocketOption::RecvHighWaterMark, &OptionValue::Int(-1)).is_err());
        assert!(opts.set(SocketOption::Identity, &OptionValue::from(&[0x01; 256][..])).is_err());
        assert!(opts.set(SocketOption::Identity, &OptionValue::from(&b"\x00peer"[..])).is_err());

        // Rejected values leave the options untouched.
        assert_eq!(opts, SocketOptions::default());
    }

    #[test]
    fn test_linger_option() {
        let mut opts = SocketOptions::new();
        assert_eq!(opts.get(SocketOption::Linger).as_int(), Some(30_000));

        opts.set(SocketOption::Linger, &OptionValue::Int(-1)).unwrap();
        assert_eq!(opts.linger, None);
        assert_eq!(opts.get(SocketOption::Linger).as_int(), Some(-1));

        opts.set(SocketOption::Linger, &OptionValue::Int(0)).unwrap();
        assert_eq!(opts.linger, Some(Duration::ZERO));
        assert!(opts.set(SocketOption::Linger, &OptionValue::Int(-5)).is_err());
    }

    #[test]
    fn test_empty_identity_clears() {
        let mut opts = SocketOptions::new().with_identity("peer");
        opts.set(SocketOption::Identity, &"".into()).unwrap();
        assert!(opts.identity.is_none());
    }
}
