//! Stream engine.
//!
//! The backpressure state machine between the application and a transport's
//! non-blocking primitives. It owns the outbound FIFO and the transport, and
//! decides when the application should hear about a drain or about readable
//! data.
//!
//! ## Outbound path
//!
//! ```text
//! enqueue ──► queue empty && writable ──► try_send ──► Sent: done (true)
//!                    │                        │
//!                    │                        └──► WouldBlock: tail (false)
//!                    └──► otherwise: tail (false)
//!
//! on_writable ──► pop head ──► try_send ──► Sent: next, up to the yield budget
//!                                  └──► WouldBlock: back to head, stop
//! ```
//!
//! A message is never split, reordered or partially sent. The queue has no
//! cap of its own; the transport's send high-water mark is what pushes back.
//!
//! ## Inbound path
//!
//! The engine never pulls on its own. A readable edge only produces a
//! notification, and only when the application is expecting one: initially,
//! and again after every pull that ran the transport dry or faulted.
//!
//! A receive fault after part of a batch was collected is held back: the
//! batch is returned and the fault is reported by the next pull.

use std::collections::VecDeque;
use std::io;
use tracing::{debug, trace, warn};
use zmqstream_core::error::{Result, StreamError};
use zmqstream_core::message::Message;
use zmqstream_core::options::SocketOptions;
use zmqstream_core::transport::{RecvOutcome, SendOutcome, Transport};

/// Lifecycle of an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Accepting operations.
    Open,
    /// Closed; every operation but `close` fails.
    Closed,
}

/// What a drain turn did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    /// Nothing was queued.
    Idle,
    /// The queue went from non-empty to empty. Reported once per transition.
    Drained,
    /// The transport stopped accepting messages with some still queued.
    Blocked,
    /// The yield budget ran out with messages queued and the transport
    /// still writable. The caller should schedule another turn.
    Yielded,
}

/// Outbound queue, drain policy and readable interest for one transport.
#[derive(Debug)]
pub struct StreamEngine<T: Transport> {
    transport: T,
    queue: VecDeque<Message>,
    state: EngineState,
    expect_drain: bool,
    expect_readable: bool,
    pending_fault: Option<io::Error>,
    read_batch: usize,
    yield_after: usize,
}

impl<T: Transport> StreamEngine<T> {
    /// Wrap an open transport.
    pub fn new(transport: T, options: &SocketOptions) -> Self {
        Self {
            transport,
            queue: VecDeque::new(),
            state: EngineState::Open,
            expect_drain: false,
            expect_readable: true,
            pending_fault: None,
            read_batch: options.read_batch.max(1),
            yield_after: options.yield_after.max(1),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// True after `close`.
    pub fn is_closed(&self) -> bool {
        self.state == EngineState::Closed
    }

    /// Messages waiting in the outbound queue.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Messages returned by `pull(None)`.
    pub fn read_batch(&self) -> usize {
        self.read_batch
    }

    /// Messages sent per drain turn before yielding.
    pub fn yield_after(&self) -> usize {
        self.yield_after
    }

    /// The wrapped transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The wrapped transport, mutably.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Fail with `Closed` unless the engine is open.
    pub fn ensure_open(&self) -> Result<()> {
        match self.state {
            EngineState::Open => Ok(()),
            EngineState::Closed => Err(StreamError::Closed),
        }
    }

    /// Hand a message to the transport, or queue it behind earlier ones.
    ///
    /// Returns `true` when the transport took the message directly and the
    /// caller may keep producing, `false` when it was queued and the caller
    /// should wait for a drain.
    ///
    /// # Errors
    ///
    /// `Closed` after `close`; `Transport` if the transport faulted on a
    /// direct send, in which case the message is lost.
    pub fn enqueue(&mut self, msg: Message) -> Result<bool> {
        self.ensure_open()?;

        if self.queue.is_empty() && self.transport.is_writable() {
            match self.transport.try_send(msg)? {
                SendOutcome::Sent => return Ok(true),
                SendOutcome::WouldBlock(msg) => self.push_back(msg),
            }
        } else {
            self.push_back(msg);
        }
        Ok(false)
    }

    fn push_back(&mut self, msg: Message) {
        self.queue.push_back(msg);
        self.expect_drain = true;
        trace!(queued = self.queue.len(), "Message queued");
    }

    /// Send queued messages while the transport is writable.
    ///
    /// Stops after `yield_after` sends so one busy socket cannot hold the
    /// host loop.
    ///
    /// # Errors
    ///
    /// `Transport` if a send faults. The faulting message is dropped; the
    /// rest of the queue keeps its order. If that message was the last one,
    /// the owed drain is still reported by [`take_drain_interest`].
    ///
    /// [`take_drain_interest`]: StreamEngine::take_drain_interest
    pub fn on_writable(&mut self) -> Result<DrainOutcome> {
        if self.is_closed() {
            return Ok(DrainOutcome::Idle);
        }

        let mut sent = 0;
        while sent < self.yield_after && self.transport.is_writable() {
            let Some(msg) = self.queue.pop_front() else {
                break;
            };
            match self.transport.try_send(msg) {
                Ok(SendOutcome::Sent) => sent += 1,
                Ok(SendOutcome::WouldBlock(msg)) => {
                    self.queue.push_front(msg);
                    break;
                }
                Err(e) => {
                    warn!(error = %e, queued = self.queue.len(), "Transport send failed while draining");
                    return Err(e.into());
                }
            }
        }

        let outcome = if self.queue.is_empty() {
            if self.take_drain_interest() {
                DrainOutcome::Drained
            } else {
                DrainOutcome::Idle
            }
        } else if sent == self.yield_after && self.transport.is_writable() {
            DrainOutcome::Yielded
        } else {
            DrainOutcome::Blocked
        };

        if sent > 0 {
            trace!(sent, queued = self.queue.len(), ?outcome, "Drain turn");
        }
        Ok(outcome)
    }

    /// True once when the queue has emptied since the last message was
    /// queued. `on_writable` calls this itself; after a faulted drain turn
    /// the caller does.
    pub fn take_drain_interest(&mut self) -> bool {
        !self.is_closed() && self.queue.is_empty() && std::mem::take(&mut self.expect_drain)
    }

    /// Receive up to `limit` messages, `None` meaning the default batch.
    ///
    /// Returns `Ok(None)` when nothing was available, or when `limit` is
    /// zero, in which case the transport is not touched. A batch shorter than
    /// `limit` means the transport ran dry.
    ///
    /// # Errors
    ///
    /// `Closed` after `close`. `Transport` if the first receive faults; a
    /// fault after some messages were received ends the batch early, those
    /// messages are returned, and the fault is returned by the next call.
    /// Either way readable interest is re-armed.
    pub fn pull(&mut self, limit: Option<usize>) -> Result<Option<Vec<Message>>> {
        self.ensure_open()?;

        let limit = limit.unwrap_or(self.read_batch);
        if limit == 0 {
            return Ok(None);
        }
        if let Some(e) = self.pending_fault.take() {
            self.expect_readable = true;
            return Err(e.into());
        }

        let mut batch = Vec::with_capacity(limit.min(self.read_batch));
        while batch.len() < limit {
            match self.transport.try_recv() {
                Ok(RecvOutcome::Received(msg)) => batch.push(msg),
                Ok(RecvOutcome::WouldBlock) => {
                    self.expect_readable = true;
                    break;
                }
                Err(e) if batch.is_empty() => {
                    self.expect_readable = true;
                    return Err(e.into());
                }
                Err(e) => {
                    warn!(error = %e, received = batch.len(), "Transport receive failed mid-batch");
                    self.pending_fault = Some(e);
                    break;
                }
            }
        }

        trace!(received = batch.len(), limit, "Pull");
        Ok((!batch.is_empty()).then_some(batch))
    }

    /// On a readable edge: should the application be told?
    ///
    /// Returns true at most once until the next pull runs the transport dry.
    pub fn take_readable_interest(&mut self) -> bool {
        !self.is_closed() && std::mem::take(&mut self.expect_readable)
    }

    /// Close the engine: discard queued messages and release the transport.
    ///
    /// A second call is a no-op. The engine is closed even if the transport
    /// reports an error while releasing.
    ///
    /// # Errors
    ///
    /// `Transport` if the transport failed to release its resources.
    pub fn close(&mut self) -> Result<()> {
        if self.is_closed() {
            return Ok(());
        }
        self.state = EngineState::Closed;
        let discarded = self.queue.len();
        self.queue.clear();
        self.expect_drain = false;
        self.expect_readable = false;
        self.pending_fault = None;
        debug!(
            socket_type = %self.transport.socket_type(),
            discarded,
            "Stream engine closed"
        );
        self.transport.close()?;
        Ok(())
    }
}

impl<T: Transport> Drop for StreamEngine<T> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!(error = %e, "Transport close failed on drop");
        }
    }
}
