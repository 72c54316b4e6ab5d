//! Legacy flat-file line codec.
//!
//! A legacy file starts with a version token (`3.0` or `4.0`) on its own
//! line. Every following line is one activity, fields separated by single
//! spaces, free-text fields percent-encoded:
//!
//! ```text
//! 3.0: kind time duration language file project computer
//! 4.0: kind time duration language file project computer vcs line char _ _
//! ```
//!
//! `vcs` is `type:repo:branch`, each part percent-encoded on its own. The two
//! trailing `4.0` fields are not interpreted.

use std::fmt;

use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};

use crate::activity::{ActivityKind, NewActivity};
use crate::error::DomainError;

/// Characters that would break the line layout if written raw.
const FIELD: &AsciiSet = &CONTROLS.add(b' ').add(b'%').add(b':');

/// Supported file versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegacyVersion {
    /// Seven fields, no VCS context.
    V3,
    /// Twelve fields, with VCS context and cursor position.
    V4,
}

impl LegacyVersion {
    /// Parses a header line. Returns `None` for unsupported versions.
    #[must_use]
    pub fn parse(header: &str) -> Option<Self> {
        match header.trim() {
            "3.0" => Some(Self::V3),
            "4.0" => Some(Self::V4),
            _ => None,
        }
    }

    /// Minimum field count of a data line.
    #[must_use]
    pub fn min_fields(self) -> usize {
        match self {
            Self::V3 => 7,
            Self::V4 => 12,
        }
    }
}

impl fmt::Display for LegacyVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V3 => f.write_str("3.0"),
            Self::V4 => f.write_str("4.0"),
        }
    }
}

/// Decodes one data line.
///
/// # Errors
///
/// Returns `DomainError::Validation` when the line has fewer fields than the
/// version requires, when `kind`, `time` or `duration` is not an integer, or
/// when a text field does not decode to UTF-8.
pub fn decode_line(line: &str, version: LegacyVersion) -> Result<NewActivity, DomainError> {
    let parts: Vec<&str> = line.split(' ').collect();
    if parts.len() < version.min_fields() {
        return Err(DomainError::Validation(format!(
            "version {version} needs {} fields, found {}",
            version.min_fields(),
            parts.len()
        )));
    }

    let kind = parse_number(parts[0], "kind")?;
    let time = parse_number(parts[1], "time")?;
    let duration = parse_number(parts[2], "duration")?;

    let mut activity = NewActivity::new(ActivityKind::from_code(kind), time, duration);
    activity.language = decode_field(parts[3])?;
    activity.file = decode_field(parts[4])?;
    activity.project = decode_field(parts[5])?;
    activity.computer_id = decode_field(parts[6])?;

    if version == LegacyVersion::V4 {
        let mut vcs = parts[7].split(':');
        activity.vcs_type = decode_field(vcs.next().unwrap_or_default())?;
        activity.vcs_repo = decode_field(vcs.next().unwrap_or_default())?;
        activity.vcs_branch = decode_field(vcs.next().unwrap_or_default())?;
        activity.line = parts[8].parse().unwrap_or(0);
        activity.character = parts[9].parse().unwrap_or(0);
    }

    Ok(activity)
}

/// Encodes an activity as a version `4.0` data line (without newline).
#[must_use]
pub fn encode_line(activity: &NewActivity) -> String {
    format!(
        "{} {} {} {} {} {} {} {}:{}:{} {} {} 0 0",
        activity.kind.code(),
        activity.time,
        activity.duration,
        encode_field(&activity.language),
        encode_field(&activity.file),
        encode_field(&activity.project),
        encode_field(&activity.computer_id),
        encode_field(&activity.vcs_type),
        encode_field(&activity.vcs_repo),
        encode_field(&activity.vcs_branch),
        activity.line,
        activity.character,
    )
}

/// Percent-decodes one text field.
///
/// # Errors
///
/// Returns `DomainError::Validation` if a `%` is not followed by two hex
/// digits, or if the decoded bytes are not UTF-8.
pub fn decode_field(raw: &str) -> Result<String, DomainError> {
    let bytes = raw.as_bytes();
    for (at, _) in raw.match_indices('%') {
        let escape = bytes.get(at + 1..at + 3);
        if !escape.is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit)) {
            return Err(DomainError::Validation(format!(
                "field {raw:?} has a malformed escape at byte {at}"
            )));
        }
    }
    percent_decode_str(raw)
        .decode_utf8()
        .map(std::borrow::Cow::into_owned)
        .map_err(|e| DomainError::Validation(format!("field {raw:?} is not valid UTF-8: {e}")))
}

fn encode_field(value: &str) -> String {
    utf8_percent_encode(value, FIELD).to_string()
}

fn parse_number(raw: &str, name: &str) -> Result<i64, DomainError> {
    raw.parse()
        .map_err(|_| DomainError::Validation(format!("{name} is not numeric: {raw:?}")))
}
