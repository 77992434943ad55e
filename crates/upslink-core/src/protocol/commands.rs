//! Protocol commands
//!
//! The UPS-Link command catalogue. Every command runs through the same
//! send / settle / drain skeleton; what differs is captured here as data:
//! the command byte, the reply framing, whether the query is retried and
//! whether the byte must be "pressed" twice.

use serde::{Deserialize, Serialize};

use super::FrameLayout;

/// Ctrl-N, the turn-on keypress
pub const CTRL_N: u8 = 0x0E;

/// DEL, abort pending shutdown
pub const DEL: u8 = 0x7F;

/// UPS-Link commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Command {
    /// Enter smart signalling mode ('Y')
    EnterSmartMode,
    /// Leave smart mode ('R')
    ReturnToSimpleMode,
    /// Light all LEDs and sound the beeper ('A')
    TestLightsAndBeeper,
    /// Briefly switch to battery ('U')
    SimulatePowerFailure,
    /// Run the battery test ('W')
    BatteryTest,
    /// Turn off immediately ('Z' gap 'Z')
    TurnOff,
    /// Press the front ON button (Ctrl-N gap Ctrl-N)
    TurnOn,
    /// Start or abort run time calibration ('D')
    RunTimeCalibration,
    /// Toggle bypass mode ('^')
    ToggleBypass,
    /// Result of the last battery test ('X')
    QueryBatteryTest,
    /// Reason for the last transfer to battery ('G')
    QueryTransferCause,
    /// Utility line quality ('9')
    QueryLineQuality,
    /// Status register ('Q')
    QueryStatus,
    /// External battery packs ('>')
    BatteryPacks,
    /// Bad external battery packs ('<')
    BadBatteryPacks,
    /// Nominal battery voltage rating ('g')
    NominalBatteryVoltage,
    /// Remaining battery capacity in percent ('f')
    BatteryCapacity,
    /// Battery voltage ('B')
    BatteryVoltage,
    /// Internal temperature in °C ('C')
    InternalTemperature,
    /// Internal operating frequency in Hz ('F')
    Frequency,
    /// Input line voltage ('L')
    LineVoltage,
    /// Maximum line voltage since the last 'M' ('M')
    MaxLineVoltage,
    /// Minimum line voltage since the last 'N' ('N')
    MinLineVoltage,
    /// Output voltage ('O')
    OutputVoltage,
    /// Load as percent of rated Watts ('P')
    LoadPower,
    /// True RMS load current ('/')
    LoadCurrent,
    /// Load as percent of rated VA ('\')
    ApparentLoadPower,
    /// Turn off after the shutdown delay ('K' gap 'K')
    TurnOffAfterDelay,
    /// Shut down while on battery ('S')
    ShutdownOnBattery,
    /// Abort a pending shutdown (DEL)
    AbortShutdown,
    /// Shut down, wake after ddd tenths of an hour ('@ddd')
    ShutdownWithDelayedWakeup,
}

/// Per-command protocol parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandSpec {
    /// Byte sent to the UPS
    pub byte: u8,
    /// Framing of a well-formed reply
    pub layout: FrameLayout,
    /// Whether the query is re-issued on failure
    pub retries: bool,
    /// Whether the byte is sent twice with a keypress gap
    pub two_stage: bool,
}

impl CommandSpec {
    const fn reply(byte: u8, payload_len: usize) -> Self {
        Self {
            byte,
            layout: FrameLayout::payload(payload_len),
            retries: false,
            two_stage: false,
        }
    }

    const fn retried(mut self) -> Self {
        self.retries = true;
        self
    }

    const fn pressed_twice(mut self) -> Self {
        self.two_stage = true;
        self
    }
}

impl Command {
    /// Every command in the catalogue
    pub const ALL: [Command; 31] = [
        Command::EnterSmartMode,
        Command::ReturnToSimpleMode,
        Command::TestLightsAndBeeper,
        Command::SimulatePowerFailure,
        Command::BatteryTest,
        Command::TurnOff,
        Command::TurnOn,
        Command::RunTimeCalibration,
        Command::ToggleBypass,
        Command::QueryBatteryTest,
        Command::QueryTransferCause,
        Command::QueryLineQuality,
        Command::QueryStatus,
        Command::BatteryPacks,
        Command::BadBatteryPacks,
        Command::NominalBatteryVoltage,
        Command::BatteryCapacity,
        Command::BatteryVoltage,
        Command::InternalTemperature,
        Command::Frequency,
        Command::LineVoltage,
        Command::MaxLineVoltage,
        Command::MinLineVoltage,
        Command::OutputVoltage,
        Command::LoadPower,
        Command::LoadCurrent,
        Command::ApparentLoadPower,
        Command::TurnOffAfterDelay,
        Command::ShutdownOnBattery,
        Command::AbortShutdown,
        Command::ShutdownWithDelayedWakeup,
    ];

    /// Protocol parameters for this command
    pub fn spec(&self) -> CommandSpec {
        use CommandSpec as S;
        match self {
            Command::EnterSmartMode => S::reply(b'Y', 2),
            Command::ReturnToSimpleMode => S::reply(b'R', 3),
            Command::TestLightsAndBeeper => S::reply(b'A', 2),
            Command::SimulatePowerFailure => S::reply(b'U', 2),
            Command::BatteryTest => S::reply(b'W', 2),
            Command::TurnOff => S::reply(b'Z', 2).pressed_twice(),
            Command::TurnOn => S::reply(CTRL_N, 2).pressed_twice(),
            Command::RunTimeCalibration => S::reply(b'D', 2),
            // "BYP"/"INV"/"ERR"; a bare "OK" is handled by the decoder
            Command::ToggleBypass => S::reply(b'^', 3),
            Command::QueryBatteryTest => S::reply(b'X', 2),
            Command::QueryTransferCause => S::reply(b'G', 1),
            Command::QueryLineQuality => S::reply(b'9', 2),
            Command::QueryStatus => S::reply(b'Q', 2).retried(),
            Command::BatteryPacks => S::reply(b'>', 3),
            Command::BadBatteryPacks => S::reply(b'<', 3),
            Command::NominalBatteryVoltage => S::reply(b'g', 3),
            Command::BatteryCapacity => S::reply(b'f', 5).retried(),
            Command::BatteryVoltage => S::reply(b'B', 5).retried(),
            Command::InternalTemperature => S::reply(b'C', 5).retried(),
            Command::Frequency => S::reply(b'F', 5),
            Command::LineVoltage => S::reply(b'L', 5),
            Command::MaxLineVoltage => S::reply(b'M', 5),
            Command::MinLineVoltage => S::reply(b'N', 5),
            Command::OutputVoltage => S::reply(b'O', 5),
            Command::LoadPower => S::reply(b'P', 5),
            Command::LoadCurrent => S::reply(b'/', 5),
            Command::ApparentLoadPower => S::reply(b'\\', 5),
            Command::TurnOffAfterDelay => S::reply(b'K', 2).pressed_twice(),
            Command::ShutdownOnBattery => S::reply(b'S', 2),
            Command::AbortShutdown => S::reply(DEL, 2),
            Command::ShutdownWithDelayedWakeup => S::reply(b'@', 2),
        }
    }

    /// The command byte
    pub fn byte(&self) -> u8 {
        self.spec().byte
    }

    /// Look a command up by its byte
    pub fn from_byte(byte: u8) -> Option<Command> {
        Command::ALL.into_iter().find(|c| c.byte() == byte)
    }

    /// Short human-readable name, used in logs
    pub fn name(&self) -> &'static str {
        match self {
            Command::EnterSmartMode => "enter smart mode",
            Command::ReturnToSimpleMode => "return to simple mode",
            Command::TestLightsAndBeeper => "test lights and beeper",
            Command::SimulatePowerFailure => "simulate power failure",
            Command::BatteryTest => "battery test",
            Command::TurnOff => "turn off",
            Command::TurnOn => "turn on",
            Command::RunTimeCalibration => "run time calibration",
            Command::ToggleBypass => "toggle bypass",
            Command::QueryBatteryTest => "battery test result",
            Command::QueryTransferCause => "transfer cause",
            Command::QueryLineQuality => "line quality",
            Command::QueryStatus => "ups status",
            Command::BatteryPacks => "battery packs",
            Command::BadBatteryPacks => "bad battery packs",
            Command::NominalBatteryVoltage => "nominal battery voltage",
            Command::BatteryCapacity => "battery capacity",
            Command::BatteryVoltage => "battery voltage",
            Command::InternalTemperature => "internal temperature",
            Command::Frequency => "frequency",
            Command::LineVoltage => "line voltage",
            Command::MaxLineVoltage => "maximum line voltage",
            Command::MinLineVoltage => "minimum line voltage",
            Command::OutputVoltage => "output voltage",
            Command::LoadPower => "load power",
            Command::LoadCurrent => "load current",
            Command::ApparentLoadPower => "apparent load power",
            Command::TurnOffAfterDelay => "turn off after delay",
            Command::ShutdownOnBattery => "shutdown on battery",
            Command::AbortShutdown => "abort shutdown",
            Command::ShutdownWithDelayedWakeup => "shutdown with delayed wake-up",
        }
    }

    /// Whether the query is re-issued on failure
    pub fn retries(&self) -> bool {
        self.spec().retries
    }

    /// Whether the byte is sent twice with a keypress gap
    pub fn is_two_stage(&self) -> bool {
        self.spec().two_stage
    }
}

/// Encode the '@ddd' delayed wake-up command.
///
/// `tenths_of_hour` must fit in three digits (0..=999).
pub fn delayed_wakeup_bytes(tenths_of_hour: u16) -> Option<Vec<u8>> {
    if tenths_of_hour > 999 {
        return None;
    }
    let mut bytes = vec![Command::ShutdownWithDelayedWakeup.byte()];
    bytes.extend_from_slice(format!("{:03}", tenths_of_hour).as_bytes());
    Some(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_command_bytes() {
        assert_eq!(Command::EnterSmartMode.byte(), b'Y');
        assert_eq!(Command::QueryStatus.byte(), b'Q');
        assert_eq!(Command::BatteryCapacity.byte(), b'f');
        assert_eq!(Command::TurnOn.byte(), 14);
        assert_eq!(Command::ApparentLoadPower.byte(), b'\\');
    }

    #[test]
    fn test_command_bytes_are_unique() {
        let bytes: HashSet<u8> = Command::ALL.iter().map(|c| c.byte()).collect();
        assert_eq!(bytes.len(), Command::ALL.len());
    }

    #[test]
    fn test_from_byte_round_trips_catalogue() {
        for cmd in Command::ALL {
            assert_eq!(Command::from_byte(cmd.byte()), Some(cmd));
        }
        assert_eq!(Command::from_byte(b'z'), None);
    }

    #[test]
    fn test_retrying_queries() {
        let retried: Vec<Command> = Command::ALL.into_iter().filter(|c| c.retries()).collect();
        assert_eq!(
            retried,
            vec![
                Command::QueryStatus,
                Command::BatteryCapacity,
                Command::BatteryVoltage,
                Command::InternalTemperature,
            ]
        );
    }

    #[test]
    fn test_two_stage_commands() {
        let two_stage: Vec<Command> = Command::ALL
            .into_iter()
            .filter(|c| c.is_two_stage())
            .collect();
        assert_eq!(
            two_stage,
            vec![Command::TurnOff, Command::TurnOn, Command::TurnOffAfterDelay]
        );
    }

    #[test]
    fn test_layouts() {
        let layout = Command::BatteryVoltage.spec().layout;
        assert_eq!((layout.min_len, layout.terminator_at), (7, 5));

        let layout = Command::QueryTransferCause.spec().layout;
        assert_eq!((layout.min_len, layout.terminator_at), (3, 1));

        let layout = Command::ReturnToSimpleMode.spec().layout;
        assert_eq!((layout.min_len, layout.terminator_at), (5, 3));

        let layout = Command::BatteryPacks.spec().layout;
        assert_eq!((layout.min_len, layout.terminator_at), (5, 3));
    }

    #[test]
    fn test_delayed_wakeup_bytes() {
        assert_eq!(delayed_wakeup_bytes(126), Some(b"@126".to_vec()));
        assert_eq!(delayed_wakeup_bytes(5), Some(b"@005".to_vec()));
        assert_eq!(delayed_wakeup_bytes(1000), None);
    }
}
