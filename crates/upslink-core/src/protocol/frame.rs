//! Raw reply frames
//!
//! A reply frame is whatever the UPS managed to send inside one settle
//! window. UPS-Link has no length prefix, so a frame is only trusted once it
//! is long enough for its command and carries CR LF at the offset that
//! command dictates.
//!
//! Bytes after the LF are outside the reply contract. Decoders never look at
//! them; `trailing` exposes them for diagnostics only.

use super::{CommandError, CR, LF};

/// Framing rule for one command's reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameLayout {
    /// Shortest acceptable frame
    pub min_len: usize,
    /// Offset of the CR byte; LF follows immediately
    pub terminator_at: usize,
}

impl FrameLayout {
    /// Layout for a `payload_len`-byte payload followed by CR LF
    pub const fn payload(payload_len: usize) -> Self {
        Self {
            min_len: payload_len + 2,
            terminator_at: payload_len,
        }
    }

    /// Number of payload bytes before the terminator
    pub fn payload_len(&self) -> usize {
        self.terminator_at
    }
}

/// The bytes read back for one command invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyFrame {
    bytes: Vec<u8>,
}

impl ReplyFrame {
    /// Wrap raw bytes read from the transport
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Raw frame bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Frame length
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether nothing was received
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Validate the frame against `layout` and return the payload preceding
    /// the terminator.
    ///
    /// Length is checked first, so a frame that is too short always fails
    /// with `FrameTooShort` even when the bytes present would parse.
    pub fn payload(&self, layout: FrameLayout) -> Result<&[u8], CommandError> {
        if self.bytes.len() < layout.min_len {
            return Err(CommandError::FrameTooShort {
                required: layout.min_len,
                actual: self.bytes.len(),
            });
        }
        self.expect_byte(layout.terminator_at, CR)?;
        self.expect_byte(layout.terminator_at + 1, LF)?;
        Ok(&self.bytes[..layout.terminator_at])
    }

    /// Bytes after the LF of `layout`, if any
    pub fn trailing(&self, layout: FrameLayout) -> &[u8] {
        self.bytes.get(layout.terminator_at + 2..).unwrap_or(&[])
    }

    /// Whether the frame carries a CR LF terminator at `offset`
    pub fn has_terminator_at(&self, offset: usize) -> bool {
        self.bytes.get(offset) == Some(&CR) && self.bytes.get(offset + 1) == Some(&LF)
    }

    fn expect_byte(&self, offset: usize, expected: u8) -> Result<(), CommandError> {
        let found = self.bytes.get(offset).copied();
        if found == Some(expected) {
            Ok(())
        } else {
            Err(CommandError::BadTerminator {
                offset,
                expected,
                found,
            })
        }
    }
}

impl From<Vec<u8>> for ReplyFrame {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

impl From<&[u8]> for ReplyFrame {
    fn from(bytes: &[u8]) -> Self {
        Self::new(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_layout() {
        let layout = FrameLayout::payload(5);
        assert_eq!(layout.min_len, 7);
        assert_eq!(layout.terminator_at, 5);
        assert_eq!(layout.payload_len(), 5);
    }

    #[test]
    fn test_payload_extraction() {
        let frame = ReplyFrame::from(&b"12.34\r\n"[..]);
        assert_eq!(frame.payload(FrameLayout::payload(5)).unwrap(), b"12.34");
    }

    #[test]
    fn test_short_frame_wins_over_parseable_bytes() {
        let frame = ReplyFrame::from(&b"OK\r"[..]);
        match frame.payload(FrameLayout::payload(2)) {
            Err(CommandError::FrameTooShort { required, actual }) => {
                assert_eq!(required, 4);
                assert_eq!(actual, 3);
            }
            other => panic!("expected FrameTooShort, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_cr() {
        let frame = ReplyFrame::from(&b"OKX\n"[..]);
        match frame.payload(FrameLayout::payload(2)) {
            Err(CommandError::BadTerminator {
                offset, found, ..
            }) => {
                assert_eq!(offset, 2);
                assert_eq!(found, Some(b'X'));
            }
            other => panic!("expected BadTerminator, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_lf() {
        let frame = ReplyFrame::from(&b"OK\r\r"[..]);
        assert!(matches!(
            frame.payload(FrameLayout::payload(2)),
            Err(CommandError::BadTerminator { offset: 3, .. })
        ));
    }

    #[test]
    fn test_trailing_bytes_are_ignored() {
        let frame = ReplyFrame::from(&b"SM\r\n!"[..]);
        let layout = FrameLayout::payload(2);
        assert_eq!(frame.payload(layout).unwrap(), b"SM");
        assert_eq!(frame.trailing(layout), b"!");
        assert!(ReplyFrame::from(&b"SM\r\n"[..]).trailing(layout).is_empty());
    }

    #[test]
    fn test_has_terminator_at() {
        let frame = ReplyFrame::from(&b"NA\r\n"[..]);
        assert!(frame.has_terminator_at(2));
        assert!(!frame.has_terminator_at(1));
        assert!(!frame.has_terminator_at(5));
    }
}
