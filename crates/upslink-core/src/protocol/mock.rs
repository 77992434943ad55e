//! Scripted transport for tests and dry runs
//!
//! `MockTransport` plays back queued replies: each complete write makes the
//! next queued reply available for reading, the way the UPS answers one
//! command at a time. `MockDelay` records waits instead of sleeping. Both
//! append to a shared `EventLog` so tests can check ordering and timing.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use super::{Delay, Transport, TransportError};

/// One observed interaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockEvent {
    /// Transport opened
    Open,
    /// Transport closed
    Close,
    /// Bytes handed to `write`
    Write(Vec<u8>),
    /// `bytes_available` was queried and returned this count
    Available(usize),
    /// Bytes returned by `read_exact`
    Read(Vec<u8>),
    /// A delay was requested
    Delay(Duration),
}

/// Shared, cloneable event log
#[derive(Debug, Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<MockEvent>>>);

impl EventLog {
    fn lock(&self) -> MutexGuard<'_, Vec<MockEvent>> {
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn push(&self, event: MockEvent) {
        self.lock().push(event);
    }

    /// Snapshot of all events so far
    pub fn events(&self) -> Vec<MockEvent> {
        self.lock().clone()
    }

    /// Every byte sequence written, in order
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.lock()
            .iter()
            .filter_map(|e| match e {
                MockEvent::Write(bytes) => Some(bytes.clone()),
                _ => None,
            })
            .collect()
    }

    /// Number of `bytes_available` queries
    pub fn availability_checks(&self) -> usize {
        self.lock()
            .iter()
            .filter(|e| matches!(e, MockEvent::Available(_)))
            .count()
    }

    /// Total delay requested between write `index` and write `index + 1`
    pub fn delay_after_write(&self, index: usize) -> Duration {
        self.lock()
            .iter()
            .skip_while({
                let mut seen = 0;
                move |e| {
                    if matches!(e, MockEvent::Write(_)) {
                        seen += 1;
                    }
                    seen <= index
                }
            })
            .skip(1)
            .take_while(|e| !matches!(e, MockEvent::Write(_)))
            .filter_map(|e| match e {
                MockEvent::Delay(d) => Some(*d),
                _ => None,
            })
            .sum()
    }

    /// Forget everything recorded so far
    pub fn clear(&self) {
        self.lock().clear();
    }
}

/// In-memory transport that answers writes from a reply queue
#[derive(Debug, Default)]
pub struct MockTransport {
    log: EventLog,
    replies: VecDeque<Vec<u8>>,
    pending: VecDeque<u8>,
    open: bool,
    fail_open: bool,
    write_limit: Option<usize>,
}

impl MockTransport {
    /// Closed transport with an empty reply queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Transport that appends to an existing log
    pub fn with_log(log: EventLog) -> Self {
        Self {
            log,
            ..Self::default()
        }
    }

    /// Handle to this transport's event log
    pub fn log(&self) -> EventLog {
        self.log.clone()
    }

    /// Queue the reply to the next command
    pub fn push_reply(&mut self, reply: impl AsRef<[u8]>) -> &mut Self {
        self.replies.push_back(reply.as_ref().to_vec());
        self
    }

    /// Queue a command that gets no answer at all
    pub fn push_silence(&mut self) -> &mut Self {
        self.replies.push_back(Vec::new());
        self
    }

    /// Number of replies not yet consumed
    pub fn queued_replies(&self) -> usize {
        self.replies.len()
    }

    /// Make `open` fail
    pub fn fail_open(&mut self, fail: bool) -> &mut Self {
        self.fail_open = fail;
        self
    }

    /// Cap how many bytes a single `write` accepts
    pub fn limit_writes(&mut self, limit: Option<usize>) -> &mut Self {
        self.write_limit = limit;
        self
    }
}

impl Transport for MockTransport {
    fn open(&mut self) -> Result<(), TransportError> {
        if self.fail_open {
            return Err(TransportError::Open("mock configured to fail".to_string()));
        }
        self.open = true;
        self.log.push(MockEvent::Open);
        Ok(())
    }

    fn close(&mut self) -> Result<(), TransportError> {
        if self.open {
            self.open = false;
            self.log.push(MockEvent::Close);
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, TransportError> {
        if !self.open {
            return Err(TransportError::NotOpen);
        }
        let written = self.write_limit.map_or(data.len(), |limit| limit.min(data.len()));
        self.log.push(MockEvent::Write(data[..written].to_vec()));

        // Only a complete command gets an answer
        if written == data.len() {
            let reply = self.replies.pop_front().unwrap_or_default();
            self.pending.extend(reply);
        }
        Ok(written)
    }

    fn bytes_available(&mut self) -> Result<usize, TransportError> {
        if !self.open {
            return Err(TransportError::NotOpen);
        }
        let count = self.pending.len();
        self.log.push(MockEvent::Available(count));
        Ok(count)
    }

    fn read_exact(&mut self, count: usize) -> Result<Vec<u8>, TransportError> {
        if !self.open {
            return Err(TransportError::NotOpen);
        }
        if count > self.pending.len() {
            return Err(TransportError::Io(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                "mock read timed out",
            )));
        }
        let bytes: Vec<u8> = self.pending.drain(..count).collect();
        self.log.push(MockEvent::Read(bytes.clone()));
        Ok(bytes)
    }
}

/// Delay that records instead of sleeping
#[derive(Debug, Clone, Default)]
pub struct MockDelay {
    log: EventLog,
}

impl MockDelay {
    /// Delay that appends to `log`
    pub fn with_log(log: EventLog) -> Self {
        Self { log }
    }
}

impl Delay for MockDelay {
    fn delay(&mut self, duration: Duration) {
        self.log.push(MockEvent::Delay(duration));
    }
}
