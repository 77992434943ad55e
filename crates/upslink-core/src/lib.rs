//! # UPS-Link Core Library
//!
//! Request/response driver for APC Smart-UPS units speaking the UPS-Link
//! serial control language.

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//!
//! This library provides:
//! - A narrow serial transport contract with a `serialport` implementation
//! - The shared send / settle / drain skeleton every command runs through
//! - The full catalogue of single-character UPS-Link commands with typed replies
//! - Configuration loading and a polled measurement snapshot
//!
//! ## Example
//!
//! ```rust,ignore
//! use upslink_core::{config::LinkConfig, protocol::UpsLink};
//!
//! let mut ups = UpsLink::serial(LinkConfig::for_port("/dev/ttyS0"));
//! ups.open()?;
//! ups.enter_smart_mode()?;
//! println!("battery: {:.2} V", ups.battery_voltage()?);
//! ups.return_to_simple_mode()?;
//! ups.close()?;
//! ```

pub mod config;
pub mod protocol;
pub mod snapshot;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{ConfigError, LinkConfig};
    pub use crate::protocol::{
        BatteryTestResult, BypassTransfer, CalibrationStart, Command, CommandError, Delay,
        LineQuality, ReplyFrame, ShutdownAbort, ShutdownAck, Transport, TransportError,
        TransferCause, UpsLink, UpsStatus,
    };
    pub use crate::snapshot::UpsSnapshot;
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
