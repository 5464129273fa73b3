//! Frame and message value types.
//!
//! A [`Frame`] is one opaque byte buffer. A [`Message`] is an ordered sequence
//! of frames that travels through the stream engine as a unit: it is queued,
//! sent and received whole, never split.

use bytes::Bytes;
use smallvec::SmallVec;
use std::io;

/// One opaque frame of a multipart message.
pub type Frame = Bytes;

/// Inline capacity before a message's frame list spills to the heap.
///
/// Envelopes like `[identity, empty, body]` fit without allocation.
const INLINE_FRAMES: usize = 4;

/// A multipart message.
///
/// Zero-frame messages are valid values: they are accepted by `write`, queued
/// and handed to the transport like any other message.
///
/// # Examples
///
/// ```
/// use zmqstream_core::message::Message;
///
/// let msg = Message::new()
///     .push_str("topic")
///     .push(vec![1u8, 2, 3]);
/// assert_eq!(msg.len(), 2);
/// assert_eq!(msg.byte_len(), 8);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Message {
    frames: SmallVec<[Frame; INLINE_FRAMES]>,
}

impl Message {
    /// Create a new message with no frames.
    #[must_use]
    pub fn new() -> Self {
        Self {
            frames: SmallVec::new(),
        }
    }

    /// Create a message from existing frames.
    #[must_use]
    pub fn from_frames(frames: Vec<Frame>) -> Self {
        Self {
            frames: SmallVec::from_vec(frames),
        }
    }

    /// Append a frame from anything convertible to `Bytes`.
    #[must_use]
    pub fn push(mut self, frame: impl Into<Frame>) -> Self {
        self.frames.push(frame.into());
        self
    }

    /// Append a UTF-8 string frame.
    #[must_use]
    pub fn push_str(mut self, s: &str) -> Self {
        self.frames.push(Bytes::copy_from_slice(s.as_bytes()));
        self
    }

    /// Append an empty frame (envelope delimiter).
    ///
    /// ```
    /// # use zmqstream_core::message::Message;
    /// // DEALER request: [empty] [body]
    /// let msg = Message::new().push_empty().push_str("ping:0");
    /// assert!(msg.frames()[0].is_empty());
    /// ```
    #[must_use]
    pub fn push_empty(mut self) -> Self {
        self.frames.push(Bytes::new());
        self
    }

    /// Append a frame in place.
    pub fn push_frame(&mut self, frame: impl Into<Frame>) {
        self.frames.push(frame.into());
    }

    /// Number of frames.
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// True when the message carries no frames.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Total payload size across all frames.
    #[must_use]
    pub fn byte_len(&self) -> usize {
        self.frames.iter().map(Bytes::len).sum()
    }

    #[must_use]
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    #[must_use]
    pub fn frame(&self, index: usize) -> Option<&Frame> {
        self.frames.get(index)
    }

    /// Replace the frame at `index`, returning the previous one.
    ///
    /// Returns `None` and leaves the message untouched when out of bounds.
    pub fn replace_frame(&mut self, index: usize, frame: impl Into<Frame>) -> Option<Frame> {
        let slot = self.frames.get_mut(index)?;
        Some(std::mem::replace(slot, frame.into()))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Frame> {
        self.frames.iter()
    }

    /// Consume the message and return its frames.
    #[must_use]
    pub fn into_frames(self) -> Vec<Frame> {
        self.frames.into_vec()
    }

    /// Interpret frame `index` as UTF-8.
    ///
    /// # Errors
    ///
    /// Returns an error if the frame doesn't exist or isn't valid UTF-8.
    pub fn parse_frame_str(&self, index: usize) -> io::Result<&str> {
        let frame = self.frames.get(index).ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidData, "Frame index out of bounds")
        })?;

        std::str::from_utf8(frame).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

impl From<Vec<Frame>> for Message {
    fn from(frames: Vec<Frame>) -> Self {
        Self::from_frames(frames)
    }
}

impl<B: Into<Frame>, const N: usize> From<[B; N]> for Message {
    fn from(frames: [B; N]) -> Self {
        frames.into_iter().collect()
    }
}

impl From<Message> for Vec<Frame> {
    fn from(msg: Message) -> Self {
        msg.into_frames()
    }
}

impl<B: Into<Frame>> FromIterator<B> for Message {
    fn from_iter<I: IntoIterator<Item = B>>(iter: I) -> Self {
        Self {
            frames: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl IntoIterator for Message {
    type Item = Frame;
    type IntoIter = smallvec::IntoIter<[Frame; INLINE_FRAMES]>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.into_iter()
    }
}

impl<'a> IntoIterator for &'a Message {
    type Item = &'a Frame;
    type IntoIter = std::slice::Iter<'a, Frame>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_builder() {
        let msg = Message::new()
            .push(&b"frame1"[..])
            .push_str("frame2")
            .push_empty()
            .push(vec![1u8, 2, 3]);

        assert_eq!(msg.len(), 4);
        assert_eq!(msg.frames()[0], b"frame1"[..]);
        assert_eq!(msg.frames()[1], b"frame2"[..]);
        assert_eq!(msg.frames()[2], b""[..]);
        assert_eq!(msg.frames()[3], &[1u8, 2, 3][..]);
    }

    #[test]
    fn test_zero_frame_message() {
        let msg = Message::new();
        assert!(msg.is_empty());
        assert_eq!(msg.byte_len(), 0);
        assert_eq!(msg, Message::from(Vec::<Frame>::new()));
        assert!(msg.into_frames().is_empty());
    }

    #[test]
    fn test_from_array_preserves_order() {
        let msg = Message::from(["one", "two", "three"]);
        let frames = msg.into_frames();
        assert_eq!(frames, vec![
            Bytes::from_static(b"one"),
            Bytes::from_static(b"two"),
            Bytes::from_static(b"three"),
        ]);
    }

    #[test]
    fn test_spills_past_inline_capacity() {
        let msg: Message = (0..10u8).map(|i| vec![i]).collect();
        assert_eq!(msg.len(), 10);
        assert_eq!(msg.frame(9).unwrap()[..], [9u8]);
    }

    #[test]
    fn test_replace_frame() {
        let mut msg = Message::from(["peer", "ping"]);
        let old = msg.replace_frame(1, "pong").unwrap();
        assert_eq!(old, Bytes::from_static(b"ping"));
        assert_eq!(msg.parse_frame_str(1).unwrap(), "pong");
        assert!(msg.replace_frame(5, "x").is_none());
    }

    #[test]
    fn test_parse_frame_str() {
        let msg = Message::new().push_str("topic").push(&b"\xff"[..]);

        assert_eq!(msg.parse_frame_str(0).unwrap(), "topic");
        assert!(msg.parse_frame_str(1).is_err()); // Invalid UTF-8
        assert!(msg.parse_frame_str(2).is_err()); // Out of bounds
    }
}
