//! UPS-Link driver
//!
//! Owns the transport and runs every command through one skeleton:
//! transmit, wait a fixed settle window, drain whatever arrived, decode.
//! The driver keeps no state between calls besides the open transport.

use std::time::Duration;

use super::{
    commands::delayed_wakeup_bytes,
    decode,
    retry::with_retries,
    BatteryTestResult, BypassTransfer, CalibrationStart, Command, CommandError, Delay,
    FrameLayout, LineQuality, ReplyFrame, SerialTransport, ShutdownAbort, ShutdownAck,
    ThreadDelay, TransferCause, Transport, TransportError, UpsStatus,
};
use crate::config::LinkConfig;

const BATTERY_TEST_REPLIES: &[(&[u8], BatteryTestResult)] = &[
    (b"OK", BatteryTestResult::Passed),
    (b"BT", BatteryTestResult::BadBattery),
    (b"NG", BatteryTestResult::InvalidOverload),
    (b"NO", BatteryTestResult::NoResult),
];

const CALIBRATION_REPLIES: &[(&[u8], CalibrationStart)] = &[
    (b"OK", CalibrationStart::Started),
    (b"NO", CalibrationStart::NotFullyCharged),
    (b"NA", CalibrationStart::Refused),
];

const LINE_QUALITY_REPLIES: &[(&[u8], LineQuality)] = &[
    (b"FF", LineQuality::Acceptable),
    (b"00", LineQuality::Unacceptable),
];

const BYPASS_REPLIES: &[(&[u8], BypassTransfer)] = &[
    (b"BYP", BypassTransfer::ToBypass),
    (b"INV", BypassTransfer::ToInverter),
    (b"ERR", BypassTransfer::Failed),
];

const ABORT_REPLIES: &[(&[u8], ShutdownAbort)] = &[
    (b"OK", ShutdownAbort::Aborted),
    (b"NO", ShutdownAbort::NotAborted),
];

/// Reply of older firmware that is about to switch off
const TURNING_OFF: u8 = b'*';

fn shutdown_ack(frame: &ReplyFrame, layout: FrameLayout) -> Result<ShutdownAck, CommandError> {
    if frame.as_bytes().first() == Some(&TURNING_OFF) {
        return Ok(ShutdownAck::TurningOff);
    }
    decode::acknowledgement(frame, layout).map(|()| ShutdownAck::Accepted)
}

/// Driver for one UPS on one transport
pub struct UpsLink<T = SerialTransport, D = ThreadDelay> {
    transport: T,
    delay: D,
    config: LinkConfig,
}

impl UpsLink<SerialTransport, ThreadDelay> {
    /// Driver for the serial port named in `config`
    pub fn serial(config: LinkConfig) -> Self {
        let transport = SerialTransport::with_settings(
            config.port_name.clone(),
            config.baud_rate,
            config.read_timeout(),
        );
        Self::new(transport, ThreadDelay, config)
    }
}

impl<T: Transport, D: Delay> UpsLink<T, D> {
    /// Create a driver; the transport is not opened yet
    pub fn new(transport: T, delay: D, config: LinkConfig) -> Self {
        Self {
            transport,
            delay,
            config,
        }
    }

    /// Active configuration
    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    /// Underlying transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Underlying transport, mutably
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Give back the transport and delay
    pub fn into_parts(self) -> (T, D) {
        (self.transport, self.delay)
    }

    /// Open the transport. No command may run before this succeeds.
    pub fn open(&mut self) -> Result<(), TransportError> {
        self.transport.open()
    }

    /// Close the transport
    pub fn close(&mut self) -> Result<(), TransportError> {
        self.transport.close()
    }

    /// Whether the transport is open
    pub fn is_open(&self) -> bool {
        self.transport.is_open()
    }

    /// Send `command`, wait `settle`, and return every byte that arrived.
    ///
    /// A short write fails with `TransmitShort` before any read is tried.
    /// An empty buffer after the settle window fails with `NoResponse`.
    /// Nothing is retried here.
    pub fn execute(&mut self, command: &[u8], settle: Duration) -> Result<ReplyFrame, CommandError> {
        if !self.transport.is_open() {
            return Err(TransportError::NotOpen.into());
        }

        tracing::debug!(command = %command.escape_ascii(), "transmit");
        let written = self.transport.write(command)?;
        if written != command.len() {
            return Err(CommandError::TransmitShort {
                written,
                expected: command.len(),
            });
        }

        self.delay.delay(settle);

        let available = self.transport.bytes_available()?;
        if available == 0 {
            tracing::debug!("no reply within settle window");
            return Err(CommandError::NoResponse);
        }

        let bytes = self.transport.read_exact(available)?;
        tracing::debug!(len = bytes.len(), reply = %bytes.escape_ascii(), "received");
        Ok(ReplyFrame::new(bytes))
    }

    /// One full exchange for `command`. Two-stage commands send `bytes`,
    /// wait the keypress gap and send them again; only the second reply
    /// is returned. A first press that fails to transmit ends the exchange
    /// before the second send.
    fn transact(&mut self, command: Command, bytes: &[u8]) -> Result<ReplyFrame, CommandError> {
        let settle = self.config.settle_delay();
        if command.is_two_stage() {
            match self.execute(bytes, settle) {
                // A press that never reached the UPS aborts the sequence
                Err(e @ (CommandError::Transport(_) | CommandError::TransmitShort { .. })) => {
                    return Err(e)
                }
                // The first press normally gets no answer
                Err(e) => tracing::debug!(error = %e, "first keypress"),
                Ok(frame) => {
                    tracing::debug!(reply = %frame.as_bytes().escape_ascii(), "first keypress")
                }
            }
            self.delay.delay(self.config.keypress_gap());
        }
        self.execute(bytes, settle)
    }

    /// Generic framed executor: send the command's bytes, decode the reply
    /// against the command's layout, and retry the whole exchange if the
    /// command is one of the retrying queries.
    fn run_with<R>(
        &mut self,
        command: Command,
        bytes: &[u8],
        decode: impl Fn(&ReplyFrame, FrameLayout) -> Result<R, CommandError>,
    ) -> Result<R, CommandError> {
        let spec = command.spec();
        let attempts = if spec.retries {
            self.config.retry_attempts
        } else {
            1
        };

        let span = tracing::debug_span!("command", name = command.name());
        let _enter = span.enter();

        with_retries(attempts, |_| {
            let frame = self.transact(command, bytes)?;
            decode(&frame, spec.layout).inspect_err(|e| {
                tracing::warn!(error = %e, reply = %frame.as_bytes().escape_ascii(), "rejected reply")
            })
        })
    }

    fn run<R>(
        &mut self,
        command: Command,
        decode: impl Fn(&ReplyFrame, FrameLayout) -> Result<R, CommandError>,
    ) -> Result<R, CommandError> {
        self.run_with(command, &[command.byte()], decode)
    }

    // ------------------------------------------------------------------
    // Mode switches
    // ------------------------------------------------------------------

    /// Put the UPS into smart mode ('Y' → "SM")
    pub fn enter_smart_mode(&mut self) -> Result<(), CommandError> {
        self.run(Command::EnterSmartMode, |frame, _| decode::exact(frame, b"SM"))
    }

    /// Leave smart mode ('R' → "BYE")
    pub fn return_to_simple_mode(&mut self) -> Result<(), CommandError> {
        self.run(Command::ReturnToSimpleMode, |frame, _| {
            decode::exact(frame, b"BYE")
        })
    }

    // ------------------------------------------------------------------
    // Tests and control
    // ------------------------------------------------------------------

    /// Light the front panel and sound the beeper for two seconds
    pub fn test_lights_and_beeper(&mut self) -> Result<(), CommandError> {
        self.run(Command::TestLightsAndBeeper, decode::acknowledgement)
    }

    /// Switch briefly to battery. Fails with `NotAvailable` when a
    /// conflicting command is active.
    pub fn simulate_power_failure(&mut self) -> Result<(), CommandError> {
        self.run(Command::SimulatePowerFailure, decode::acknowledgement)
    }

    /// Start the ~8 second battery test; fetch the outcome with
    /// [`battery_test_result`](Self::battery_test_result)
    pub fn battery_test(&mut self) -> Result<(), CommandError> {
        self.run(Command::BatteryTest, decode::acknowledgement)
    }

    /// Start (or abort a running) run time calibration
    pub fn run_time_calibration(&mut self) -> Result<CalibrationStart, CommandError> {
        self.run(Command::RunTimeCalibration, |frame, layout| {
            decode::sentinel(frame, layout, CALIBRATION_REPLIES)
        })
    }

    /// Toggle between bypass and inverter operation
    pub fn toggle_bypass(&mut self) -> Result<BypassTransfer, CommandError> {
        self.run(Command::ToggleBypass, |frame, layout| {
            if frame.as_bytes().starts_with(decode::OK) && frame.has_terminator_at(decode::OK.len())
            {
                return Ok(BypassTransfer::Acknowledged);
            }
            decode::sentinel(frame, layout, BYPASS_REPLIES)
        })
    }

    /// Turn the UPS off immediately ('Z' gap 'Z').
    ///
    /// A UPS that cuts power before answering the second press leaves the
    /// line silent; that is reported as [`ShutdownAck::Silent`].
    pub fn turn_off(&mut self) -> Result<ShutdownAck, CommandError> {
        let command = Command::TurnOff;
        let span = tracing::debug_span!("command", name = command.name());
        let _enter = span.enter();

        match self.transact(command, &[command.byte()]) {
            Ok(frame) => shutdown_ack(&frame, command.spec().layout),
            Err(CommandError::NoResponse) => Ok(ShutdownAck::Silent),
            Err(e) => Err(e),
        }
    }

    /// Press the front ON button (Ctrl-N gap Ctrl-N)
    pub fn turn_on(&mut self) -> Result<(), CommandError> {
        self.run(Command::TurnOn, decode::acknowledgement)
    }

    /// Turn off once the configured shutdown delay expires ('K' gap 'K')
    pub fn turn_off_after_delay(&mut self) -> Result<ShutdownAck, CommandError> {
        self.run(Command::TurnOffAfterDelay, shutdown_ack)
    }

    /// Shut down after the shutdown delay; only valid while on battery
    pub fn shutdown_on_battery(&mut self) -> Result<(), CommandError> {
        self.run(Command::ShutdownOnBattery, decode::acknowledgement)
    }

    /// Abort a pending '@', 'S' or 'K' shutdown
    pub fn abort_shutdown(&mut self) -> Result<ShutdownAbort, CommandError> {
        self.run(Command::AbortShutdown, |frame, layout| {
            decode::sentinel(frame, layout, ABORT_REPLIES)
        })
    }

    /// Shut down, then restore power after `tenths_of_hour` (0..=999)
    /// tenths of an hour
    pub fn shutdown_with_delayed_wakeup(
        &mut self,
        tenths_of_hour: u16,
    ) -> Result<ShutdownAck, CommandError> {
        let bytes = delayed_wakeup_bytes(tenths_of_hour).ok_or_else(|| {
            CommandError::InvalidArgument(format!(
                "wake-up delay {} exceeds 999 tenths of an hour",
                tenths_of_hour
            ))
        })?;
        self.run_with(Command::ShutdownWithDelayedWakeup, &bytes, shutdown_ack)
    }

    // ------------------------------------------------------------------
    // Status inquiries
    // ------------------------------------------------------------------

    /// Outcome of the last battery test (kept by the UPS for 5 minutes)
    pub fn battery_test_result(&mut self) -> Result<BatteryTestResult, CommandError> {
        self.run(Command::QueryBatteryTest, |frame, layout| {
            decode::sentinel(frame, layout, BATTERY_TEST_REPLIES)
        })
    }

    /// Reason for the most recent transfer to battery
    pub fn transfer_cause(&mut self) -> Result<TransferCause, CommandError> {
        self.run(Command::QueryTransferCause, |frame, layout| {
            decode::enumerated(frame, layout, TransferCause::from_byte)
        })
    }

    /// Whether the utility line is acceptable
    pub fn line_quality(&mut self) -> Result<LineQuality, CommandError> {
        self.run(Command::QueryLineQuality, |frame, layout| {
            decode::sentinel(frame, layout, LINE_QUALITY_REPLIES)
        })
    }

    /// Status register, retried on failure
    pub fn ups_status(&mut self) -> Result<UpsStatus, CommandError> {
        self.run(Command::QueryStatus, decode::status)
    }

    /// Number of external battery packs
    pub fn battery_packs(&mut self) -> Result<u16, CommandError> {
        self.run(Command::BatteryPacks, decode::count)
    }

    /// Number of bad external battery packs
    pub fn bad_battery_packs(&mut self) -> Result<u16, CommandError> {
        self.run(Command::BadBatteryPacks, decode::count)
    }

    /// Nominal battery voltage rating in volts (e.g. 24, 48)
    pub fn nominal_battery_voltage(&mut self) -> Result<u16, CommandError> {
        self.run(Command::NominalBatteryVoltage, decode::count)
    }

    // ------------------------------------------------------------------
    // Power measurements
    // ------------------------------------------------------------------

    /// Remaining battery capacity in percent, retried on failure
    pub fn battery_capacity(&mut self) -> Result<f64, CommandError> {
        self.run(Command::BatteryCapacity, decode::decimal)
    }

    /// Battery voltage in volts, retried on failure
    pub fn battery_voltage(&mut self) -> Result<f64, CommandError> {
        self.run(Command::BatteryVoltage, decode::decimal)
    }

    /// Internal temperature in °C, retried on failure
    pub fn internal_temperature(&mut self) -> Result<f64, CommandError> {
        self.run(Command::InternalTemperature, decode::decimal)
    }

    /// Internal operating frequency in Hz
    pub fn frequency(&mut self) -> Result<f64, CommandError> {
        self.run(Command::Frequency, decode::decimal)
    }

    /// Input line voltage
    pub fn line_voltage(&mut self) -> Result<f64, CommandError> {
        self.run(Command::LineVoltage, decode::decimal)
    }

    /// Highest line voltage since the previous call
    pub fn max_line_voltage(&mut self) -> Result<f64, CommandError> {
        self.run(Command::MaxLineVoltage, decode::decimal)
    }

    /// Lowest line voltage since the previous call
    pub fn min_line_voltage(&mut self) -> Result<f64, CommandError> {
        self.run(Command::MinLineVoltage, decode::decimal)
    }

    /// Output voltage
    pub fn output_voltage(&mut self) -> Result<f64, CommandError> {
        self.run(Command::OutputVoltage, decode::decimal)
    }

    /// Load as a percentage of rated Watts
    pub fn load_power(&mut self) -> Result<f64, CommandError> {
        self.run(Command::LoadPower, decode::decimal)
    }

    /// RMS load current in amps; `None` when the UPS answers "NA"
    pub fn load_current(&mut self) -> Result<Option<f64>, CommandError> {
        self.run(Command::LoadCurrent, decode::optional_decimal)
    }

    /// Load as a percentage of rated VA; `None` when the UPS answers "NA"
    pub fn apparent_load_power(&mut self) -> Result<Option<f64>, CommandError> {
        self.run(Command::ApparentLoadPower, decode::optional_decimal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::mock::{EventLog, MockDelay, MockEvent, MockTransport};

    fn link(replies: &[&[u8]]) -> (UpsLink<MockTransport, MockDelay>, EventLog) {
        let log = EventLog::default();
        let mut transport = MockTransport::with_log(log.clone());
        for reply in replies {
            transport.push_reply(reply);
        }
        let mut ups = UpsLink::new(
            transport,
            MockDelay::with_log(log.clone()),
            LinkConfig::default(),
        );
        ups.open().unwrap();
        (ups, log)
    }

    #[test]
    fn test_execute_sequence() {
        let (mut ups, log) = link(&[b"SM\r\n"]);
        let frame = ups.execute(b"Y", Duration::from_millis(500)).unwrap();
        assert_eq!(frame.as_bytes(), b"SM\r\n");
        assert_eq!(
            log.events(),
            vec![
                MockEvent::Open,
                MockEvent::Write(b"Y".to_vec()),
                MockEvent::Delay(Duration::from_millis(500)),
                MockEvent::Available(4),
                MockEvent::Read(b"SM\r\n".to_vec()),
            ]
        );
    }

    #[test]
    fn test_execute_requires_open_transport() {
        let mut ups = UpsLink::new(
            MockTransport::new(),
            MockDelay::default(),
            LinkConfig::default(),
        );
        assert!(matches!(
            ups.execute(b"Y", Duration::ZERO),
            Err(CommandError::Transport(TransportError::NotOpen))
        ));
    }

    #[test]
    fn test_execute_no_response() {
        let (mut ups, _log) = link(&[b""]);
        assert!(matches!(
            ups.execute(b"Y", Duration::ZERO),
            Err(CommandError::NoResponse)
        ));
    }

    #[test]
    fn test_shutdown_ack_asterisk() {
        let layout = FrameLayout::payload(2);
        assert_eq!(
            shutdown_ack(&ReplyFrame::from(&b"*"[..]), layout).unwrap(),
            ShutdownAck::TurningOff
        );
        assert_eq!(
            shutdown_ack(&ReplyFrame::from(&b"OK\r\n"[..]), layout).unwrap(),
            ShutdownAck::Accepted
        );
        assert!(matches!(
            shutdown_ack(&ReplyFrame::from(&b"NA\r\n"[..]), layout),
            Err(CommandError::NotAvailable)
        ));
    }

    #[test]
    fn test_into_parts_returns_transport() {
        let (ups, _log) = link(&[b"OK\r\n"]);
        let (transport, _delay) = ups.into_parts();
        assert!(transport.is_open());
        assert_eq!(transport.queued_replies(), 1);
    }
}
