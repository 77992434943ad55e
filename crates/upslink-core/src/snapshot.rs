//! Polled measurement snapshot
//!
//! One pass over the common readings. A reading that fails is logged and
//! left empty; the snapshot itself never fails.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::protocol::{CommandError, Delay, Transport, UpsLink};

/// Readings taken in one polling pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpsSnapshot {
    /// When the pass started
    pub taken_at: DateTime<Utc>,
    /// Input line voltage
    pub line_voltage: Option<f64>,
    /// Output voltage
    pub output_voltage: Option<f64>,
    /// Operating frequency in Hz
    pub frequency: Option<f64>,
    /// Load in percent of rated Watts
    pub load_power: Option<f64>,
    /// Battery capacity in percent
    pub battery_capacity: Option<f64>,
    /// Battery voltage
    pub battery_voltage: Option<f64>,
    /// Internal temperature in °C
    pub internal_temperature: Option<f64>,
    /// Compatibility status value
    pub status: Option<u8>,
}

impl UpsSnapshot {
    /// Empty snapshot stamped with `taken_at`
    pub fn empty(taken_at: DateTime<Utc>) -> Self {
        Self {
            taken_at,
            line_voltage: None,
            output_voltage: None,
            frequency: None,
            load_power: None,
            battery_capacity: None,
            battery_voltage: None,
            internal_temperature: None,
            status: None,
        }
    }

    /// Number of readings present
    pub fn readings(&self) -> usize {
        [
            self.line_voltage,
            self.output_voltage,
            self.frequency,
            self.load_power,
            self.battery_capacity,
            self.battery_voltage,
            self.internal_temperature,
        ]
        .iter()
        .filter(|r| r.is_some())
        .count()
            + usize::from(self.status.is_some())
    }

    /// Serialize as JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

fn keep<T>(what: &str, result: Result<T, CommandError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(reading = what, error = %e, "reading unavailable");
            None
        }
    }
}

impl<T: Transport, D: Delay> UpsLink<T, D> {
    /// Read every common measurement once.
    ///
    /// The UPS must already be in smart mode. Individual failures leave
    /// the corresponding field empty.
    pub fn snapshot(&mut self) -> UpsSnapshot {
        let mut snapshot = UpsSnapshot::empty(Utc::now());
        snapshot.line_voltage = keep("line_voltage", self.line_voltage());
        snapshot.output_voltage = keep("output_voltage", self.output_voltage());
        snapshot.frequency = keep("frequency", self.frequency());
        snapshot.load_power = keep("load_power", self.load_power());
        snapshot.battery_capacity = keep("battery_capacity", self.battery_capacity());
        snapshot.battery_voltage = keep("battery_voltage", self.battery_voltage());
        snapshot.internal_temperature =
            keep("internal_temperature", self.internal_temperature());
        snapshot.status = keep("status", self.ups_status()).map(|s| s.value());
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LinkConfig;
    use crate::protocol::mock::{MockDelay, MockTransport};

    #[test]
    fn test_snapshot_collects_readings() {
        let mut transport = MockTransport::new();
        transport
            .push_reply(b"120.0\r\n")
            .push_reply(b"119.5\r\n")
            .push_reply(b"60.00\r\n")
            .push_reply(b"040.2\r\n")
            .push_reply(b"100.0\r\n")
            .push_reply(b"27.54\r\n")
            .push_reply(b"035.1\r\n")
            .push_reply(b"08\r\n");
        let mut ups = UpsLink::new(transport, MockDelay::default(), LinkConfig::default());
        ups.open().unwrap();

        let snapshot = ups.snapshot();
        assert_eq!(snapshot.line_voltage, Some(120.0));
        assert_eq!(snapshot.output_voltage, Some(119.5));
        assert_eq!(snapshot.frequency, Some(60.0));
        assert_eq!(snapshot.load_power, Some(40.2));
        assert_eq!(snapshot.battery_capacity, Some(100.0));
        assert_eq!(snapshot.battery_voltage, Some(27.54));
        assert_eq!(snapshot.internal_temperature, Some(35.1));
        assert_eq!(snapshot.status, Some(80));
        assert_eq!(snapshot.readings(), 8);
    }

    #[test]
    fn test_failed_reading_is_empty() {
        let mut transport = MockTransport::new();
        // Line voltage answers garbage, every other command is silent
        transport.push_reply(b"12x.0\r\n");
        let mut ups = UpsLink::new(transport, MockDelay::default(), LinkConfig::default());
        ups.open().unwrap();

        let snapshot = ups.snapshot();
        assert_eq!(snapshot.readings(), 0);
    }

    #[test]
    fn test_json_field_names() {
        let mut snapshot = UpsSnapshot::empty(Utc::now());
        snapshot.battery_voltage = Some(27.54);
        let json = snapshot.to_json().unwrap();
        assert!(json.contains("\"battery_voltage\":27.54"));
        assert!(json.contains("\"line_voltage\":null"));

        let back: UpsSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);
    }
}
