//! Shared reply decoders
//!
//! Every command reply falls into one of a handful of grammars: a fixed
//! sentinel string, a single enumerated character, a fixed-width ASCII
//! decimal, a three-digit count, or the two status digits. The helpers here
//! validate framing first and only then look at the payload.

use super::{CommandError, FrameLayout, ReplyFrame, UpsStatus};

/// Generic acknowledgement
pub const OK: &[u8] = b"OK";

/// Command refused, or reading not available on this model
pub const NOT_AVAILABLE: &[u8] = b"NA";

/// Negative answer
pub const NO: &[u8] = b"NO";

fn describe(bytes: &[u8]) -> String {
    bytes.escape_ascii().to_string()
}

/// Parse a fixed-width ASCII decimal such as "dd.dd" or "ddd.d".
///
/// Only ASCII digits and at most one decimal point are accepted; signs,
/// spaces and exponents are decode errors.
pub fn parse_decimal(bytes: &[u8]) -> Result<f64, CommandError> {
    let digits = bytes.iter().filter(|b| b.is_ascii_digit()).count();
    let points = bytes.iter().filter(|&&b| b == b'.').count();
    if digits == 0 || points > 1 || digits + points != bytes.len() {
        return Err(CommandError::Decode(format!(
            "not a decimal value: \"{}\"",
            describe(bytes)
        )));
    }

    // Only digits and a single '.', so this is valid UTF-8 and parses
    std::str::from_utf8(bytes)
        .ok()
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(|| CommandError::Decode(format!("not a decimal value: \"{}\"", describe(bytes))))
}

/// Parse an unsigned ASCII digit run such as "024"
pub fn parse_count(bytes: &[u8]) -> Result<u16, CommandError> {
    if bytes.is_empty() || !bytes.iter().all(u8::is_ascii_digit) {
        return Err(CommandError::Decode(format!(
            "not a count: \"{}\"",
            describe(bytes)
        )));
    }
    bytes.iter().try_fold(0u16, |acc, &b| {
        acc.checked_mul(10)
            .and_then(|v| v.checked_add(u16::from(b - b'0')))
            .ok_or_else(|| CommandError::Decode(format!("count overflow: \"{}\"", describe(bytes))))
    })
}

/// Fixed-width decimal measurement followed by CR LF
pub fn decimal(frame: &ReplyFrame, layout: FrameLayout) -> Result<f64, CommandError> {
    parse_decimal(frame.payload(layout)?)
}

/// Decimal measurement that the UPS may answer with "NA" when the
/// reading does not exist on this model.
///
/// "NA" is accepted either bare ("NA\r\n") or padded to the field width.
pub fn optional_decimal(frame: &ReplyFrame, layout: FrameLayout) -> Result<Option<f64>, CommandError> {
    let bytes = frame.as_bytes();
    if bytes.starts_with(NOT_AVAILABLE) && frame.has_terminator_at(NOT_AVAILABLE.len()) {
        return Ok(None);
    }
    let payload = frame.payload(layout)?;
    if payload.starts_with(NOT_AVAILABLE) {
        return Ok(None);
    }
    parse_decimal(payload).map(Some)
}

/// Three-digit count followed by CR LF
pub fn count(frame: &ReplyFrame, layout: FrameLayout) -> Result<u16, CommandError> {
    parse_count(frame.payload(layout)?)
}

/// Look the payload up in a table of known sentinel strings.
///
/// The whole payload must match a key exactly; anything else is a decode
/// error, never a best-effort match.
pub fn sentinel<T: Copy>(
    frame: &ReplyFrame,
    layout: FrameLayout,
    table: &[(&[u8], T)],
) -> Result<T, CommandError> {
    let payload = frame.payload(layout)?;
    table
        .iter()
        .find(|(key, _)| *key == payload)
        .map(|&(_, value)| value)
        .ok_or_else(|| CommandError::Decode(format!("unexpected reply \"{}\"", describe(payload))))
}

/// Exact acknowledgement such as "SM" or "BYE"
pub fn exact(frame: &ReplyFrame, expected: &[u8]) -> Result<(), CommandError> {
    sentinel(frame, FrameLayout::payload(expected.len()), &[(expected, ())])
}

/// "OK" acknowledgement of a control command; "NA" means the UPS refused it
pub fn acknowledgement(frame: &ReplyFrame, layout: FrameLayout) -> Result<(), CommandError> {
    match sentinel(frame, layout, &[(OK, true), (NOT_AVAILABLE, false)])? {
        true => Ok(()),
        false => Err(CommandError::NotAvailable),
    }
}

/// One enumerated character followed by CR LF
pub fn enumerated<T>(
    frame: &ReplyFrame,
    layout: FrameLayout,
    map: impl Fn(u8) -> Option<T>,
) -> Result<T, CommandError> {
    let payload = frame.payload(layout)?;
    payload
        .first()
        .copied()
        .and_then(map)
        .ok_or_else(|| CommandError::Decode(format!("unknown code \"{}\"", describe(payload))))
}

/// Two status digits followed by CR LF
pub fn status(frame: &ReplyFrame, layout: FrameLayout) -> Result<UpsStatus, CommandError> {
    let payload = frame.payload(layout)?;
    match payload {
        [first, second, ..] => UpsStatus::from_digits([*first, *second]).ok_or_else(|| {
            CommandError::Decode(format!("not status digits: \"{}\"", describe(payload)))
        }),
        _ => Err(CommandError::Decode(format!(
            "not status digits: \"{}\"",
            describe(payload)
        ))),
    }
}
