//! UPS-Link Protocol Communication
//!
//! Implements the APC UPS-Link request/response protocol: one command byte
//! goes out, the UPS answers with a short ASCII reply terminated by CR LF.
//!
//! There is no length prefix on replies. The driver waits a fixed settle
//! window after each transmit and treats whatever arrived as the frame, so
//! every decoder checks minimum length and terminator position itself.

pub mod commands;
pub mod decode;
mod driver;
mod error;
mod frame;
pub mod mock;
mod replies;
pub mod retry;
pub mod serial;
mod transport;

pub use commands::{Command, CommandSpec};
pub use driver::UpsLink;
pub use error::{CommandError, TransportError};
pub use frame::{FrameLayout, ReplyFrame};
pub use replies::{
    BatteryTestResult, BypassTransfer, CalibrationStart, LineQuality, ShutdownAbort, ShutdownAck,
    TransferCause, UpsStatus,
};
pub use serial::{list_ports, PortInfo, SerialTransport};
pub use transport::{Delay, ThreadDelay, Transport};

/// Line speed of the UPS-Link port
pub const DEFAULT_BAUD_RATE: u32 = 2400;

/// Transport read timeout in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 2000;

/// Wait between transmitting a command and draining the reply
pub const DEFAULT_SETTLE_MS: u64 = 500;

/// Gap between the two sends of a two-stage (long-press) command.
/// The UPS requires more than 1.5 seconds.
pub const DEFAULT_KEYPRESS_GAP_MS: u64 = 2000;

/// Shortest keypress gap the UPS will recognise
pub const MIN_KEYPRESS_GAP_MS: u64 = 1500;

/// Attempts made by the retrying queries
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;

/// Carriage return, first terminator byte
pub const CR: u8 = b'\r';

/// Line feed, second terminator byte
pub const LF: u8 = b'\n';
