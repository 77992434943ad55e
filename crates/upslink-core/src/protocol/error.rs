//! Protocol errors

use thiserror::Error;

/// Errors raised by the serial transport itself
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Serial port is not open")]
    NotOpen,

    #[error("Port not found: {0}")]
    PortNotFound(String),

    #[error("Failed to open serial port: {0}")]
    Open(String),

    #[error("Failed to close serial port: {0}")]
    Close(String),

    #[error("Serial port error: {0}")]
    Serial(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serialport::Error> for TransportError {
    fn from(e: serialport::Error) -> Self {
        match e.kind() {
            serialport::ErrorKind::NoDevice => TransportError::PortNotFound(e.description),
            _ => TransportError::Serial(e.description),
        }
    }
}

/// Errors that can occur while running a single UPS-Link command
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Short transmit: wrote {written} of {expected} bytes")]
    TransmitShort { written: usize, expected: usize },

    #[error("No response from UPS")]
    NoResponse,

    #[error("Reply too short: need {required} bytes, got {actual}")]
    FrameTooShort { required: usize, actual: usize },

    #[error("Bad terminator at offset {offset}: expected {expected:#04x}, got {found:?}")]
    BadTerminator {
        offset: usize,
        expected: u8,
        found: Option<u8>,
    },

    #[error("Cannot decode reply: {0}")]
    Decode(String),

    #[error("UPS refused the command (NA)")]
    NotAvailable,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl CommandError {
    /// Whether a retrying query may re-issue the command after this failure.
    ///
    /// Transport failures and bad caller input are surfaced immediately.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            CommandError::Transport(_) | CommandError::InvalidArgument(_)
        )
    }

    /// Integer code used by existing monitoring scripts.
    pub fn legacy_code(&self) -> i32 {
        match self {
            CommandError::TransmitShort { .. }
            | CommandError::FrameTooShort { .. }
            | CommandError::BadTerminator { .. } => -1,
            CommandError::NoResponse | CommandError::Decode(_) | CommandError::NotAvailable => -2,
            CommandError::Transport(_) => -3,
            CommandError::InvalidArgument(_) => -4,
        }
    }
}
