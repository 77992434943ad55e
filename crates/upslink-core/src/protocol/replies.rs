//! Typed reply domains
//!
//! Each categorical UPS-Link reply gets its own enum. `code()` returns the
//! integer that existing monitoring scripts log for the same reply.

use serde::{Deserialize, Serialize};

/// Reason for the most recent transfer to battery ('G')
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferCause {
    /// "O": no transfer since power-on
    NoTransfer,
    /// "R": unacceptable utility voltage rate of change
    RateOfChange,
    /// "H": high utility voltage
    HighLineVoltage,
    /// "L": low utility voltage
    LowLineVoltage,
    /// "T": line voltage notch or spike
    NotchOrSpike,
    /// "S": UPS-Link command or front-panel test
    SelfTest,
}

impl TransferCause {
    /// Map the reply character
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'O' => Some(Self::NoTransfer),
            b'R' => Some(Self::RateOfChange),
            b'H' => Some(Self::HighLineVoltage),
            b'L' => Some(Self::LowLineVoltage),
            b'T' => Some(Self::NotchOrSpike),
            b'S' => Some(Self::SelfTest),
            _ => None,
        }
    }

    /// Legacy integer code
    pub fn code(&self) -> i32 {
        match self {
            Self::NoTransfer => 0,
            Self::RateOfChange => 1,
            Self::HighLineVoltage => 2,
            Self::LowLineVoltage => 3,
            Self::NotchOrSpike => 4,
            Self::SelfTest => 5,
        }
    }
}

/// Result of the last battery test ('X')
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatteryTestResult {
    /// "OK": battery is good
    Passed,
    /// "BT": battery failed, insufficient capacity
    BadBattery,
    /// "NG": test invalid because of overload
    InvalidOverload,
    /// "NO": no result in the last five minutes
    NoResult,
}

impl BatteryTestResult {
    /// Legacy integer code
    pub fn code(&self) -> i32 {
        match self {
            Self::Passed => 0,
            Self::BadBattery => 1,
            Self::InvalidOverload => 2,
            Self::NoResult => 3,
        }
    }
}

/// Response to starting a run time calibration ('D')
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CalibrationStart {
    /// "OK": calibration started (or aborted, when one was running)
    Started,
    /// "NO": battery is not at 100%
    NotFullyCharged,
    /// "NA": a conflicting command is in progress
    Refused,
}

impl CalibrationStart {
    /// Legacy integer code
    pub fn code(&self) -> i32 {
        match self {
            Self::Started => 0,
            Self::NotFullyCharged => 1,
            Self::Refused => 2,
        }
    }
}

/// Utility line quality ('9')
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineQuality {
    /// "FF"
    Acceptable,
    /// "00"
    Unacceptable,
}

impl LineQuality {
    /// Legacy integer code
    pub fn code(&self) -> i32 {
        match self {
            Self::Acceptable => 0,
            Self::Unacceptable => 1,
        }
    }
}

/// Response to the bypass toggle ('^')
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BypassTransfer {
    /// "BYP": moving from inverter to bypass
    ToBypass,
    /// "INV": moving from bypass back to inverter
    ToInverter,
    /// "ERR": transfer impossible (low line or fault)
    Failed,
    /// "OK": bare acknowledgement sent by some firmware
    Acknowledged,
}

impl BypassTransfer {
    /// Legacy integer code
    pub fn code(&self) -> i32 {
        match self {
            Self::Acknowledged | Self::ToBypass => 0,
            Self::ToInverter => 1,
            Self::Failed => 2,
        }
    }
}

/// Acknowledgement of a shutdown-type command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShutdownAck {
    /// "OK": newer firmware acknowledged
    Accepted,
    /// "*": older firmware is about to turn off
    TurningOff,
    /// Nothing came back: the UPS switched off before answering
    Silent,
}

/// Response to abort shutdown (DEL)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShutdownAbort {
    /// "OK": pending shutdown aborted
    Aborted,
    /// "NO": nothing to abort, or the UPS is already off
    NotAborted,
}

/// UPS status register reply ('Q')
///
/// `value()` is the number existing monitoring logs record: the two received
/// characters read as decimal digits and combined as `first + 10 * second`.
/// This is not hexadecimal decoding and is kept as-is for log
/// compatibility. `bits()` decodes the same characters as the hexadecimal
/// register the UPS actually sends (first character is the high nibble).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpsStatus {
    value: u8,
    digits: [u8; 2],
}

impl UpsStatus {
    /// Build from the two payload characters. Both must be ASCII decimal digits.
    pub fn from_digits(digits: [u8; 2]) -> Option<Self> {
        if !digits.iter().all(u8::is_ascii_digit) {
            return None;
        }
        let low = digits[0] - b'0';
        let high = digits[1] - b'0';
        Some(Self {
            value: low + 10 * high,
            digits,
        })
    }

    /// Compatibility status value (`first + 10 * second`)
    pub fn value(&self) -> u8 {
        self.value
    }

    /// The two characters as received
    pub fn digits(&self) -> [u8; 2] {
        self.digits
    }

    /// Status register decoded as hexadecimal.
    ///
    /// Only replies made of decimal digits are accepted by
    /// [`from_digits`](Self::from_digits), so registers containing A-F
    /// ("0A" on line with SmartTrim, "0C" on line with SmartBoost) never
    /// reach this method. The flag accessors cover decimal-digit replies only.
    pub fn bits(&self) -> u8 {
        let nibble = |c: u8| (c as char).to_digit(16).unwrap_or(0) as u8;
        (nibble(self.digits[0]) << 4) | nibble(self.digits[1])
    }

    fn bit(&self, n: u8) -> bool {
        self.bits() & (1 << n) != 0
    }

    /// Bit 7
    pub fn replace_battery(&self) -> bool {
        self.bit(7)
    }

    /// Bit 6
    pub fn low_battery(&self) -> bool {
        self.bit(6)
    }

    /// Bit 5
    pub fn overloaded(&self) -> bool {
        self.bit(5)
    }

    /// Bit 4
    pub fn on_battery(&self) -> bool {
        self.bit(4)
    }

    /// Bit 3
    pub fn on_line(&self) -> bool {
        self.bit(3)
    }

    /// Bit 2
    pub fn smart_boost(&self) -> bool {
        self.bit(2)
    }

    /// Bit 1
    pub fn smart_trim(&self) -> bool {
        self.bit(1)
    }

    /// Bit 0
    pub fn calibrating(&self) -> bool {
        self.bit(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_cause_table() {
        let table = [
            (b'O', 0),
            (b'R', 1),
            (b'H', 2),
            (b'L', 3),
            (b'T', 4),
            (b'S', 5),
        ];
        for (byte, code) in table {
            let cause = TransferCause::from_byte(byte).unwrap();
            assert_eq!(cause.code(), code, "cause for {}", byte as char);
        }
        assert_eq!(TransferCause::from_byte(b'X'), None);
        assert_eq!(TransferCause::from_byte(b'o'), None);
    }

    #[test]
    fn test_battery_test_codes_are_distinct() {
        let codes = [
            BatteryTestResult::Passed.code(),
            BatteryTestResult::BadBattery.code(),
            BatteryTestResult::InvalidOverload.code(),
            BatteryTestResult::NoResult.code(),
        ];
        for (i, a) in codes.iter().enumerate() {
            for b in &codes[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_status_quirk_value() {
        let status = UpsStatus::from_digits(*b"01").unwrap();
        assert_eq!(status.value(), 10);

        let status = UpsStatus::from_digits(*b"08").unwrap();
        assert_eq!(status.value(), 80);

        let status = UpsStatus::from_digits(*b"50").unwrap();
        assert_eq!(status.value(), 5);
    }

    #[test]
    fn test_status_rejects_hex_letters() {
        assert!(UpsStatus::from_digits(*b"0A").is_none());
        assert!(UpsStatus::from_digits(*b" 8").is_none());
    }

    #[test]
    fn test_trim_and_boost_flags_from_decimal_digits() {
        let status = UpsStatus::from_digits(*b"02").unwrap();
        assert!(status.smart_trim());
        assert!(!status.on_line());

        let status = UpsStatus::from_digits(*b"04").unwrap();
        assert!(status.smart_boost());

        // On line plus trim or boost needs a hex digit
        assert!(UpsStatus::from_digits(*b"0A").is_none());
        assert!(UpsStatus::from_digits(*b"0C").is_none());
    }

    #[test]
    fn test_status_bits() {
        // "08": on line
        let status = UpsStatus::from_digits(*b"08").unwrap();
        assert_eq!(status.bits(), 0x08);
        assert!(status.on_line());
        assert!(!status.on_battery());

        // "50": on battery + low battery
        let status = UpsStatus::from_digits(*b"50").unwrap();
        assert_eq!(status.bits(), 0x50);
        assert!(status.on_battery());
        assert!(status.low_battery());
        assert!(!status.replace_battery());
        assert!(!status.calibrating());
    }
}
