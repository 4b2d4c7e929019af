//! Query-string merging
//!
//! Parses `key=value&key=value` pairs and applies each recognized field to a
//! [`MotorParameters`] record. Values use C-style prefix parsing: leading
//! digits are taken, trailing garbage is ignored and a value with no digits
//! reads as zero. Every field is validated independently; a bad field is
//! clamped and reported, it never aborts the merge.

use heapless::{String, Vec};

use super::motor::{MotorParameters, StepMode};

/// Maximum number of diagnostics kept per merge
pub const MAX_DIAGNOSTICS: usize = 8;

/// Recognized query keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParamKey {
    RotationalSpeed,
    RotationalAccel,
    RotationalDecel,
    CurrentPosition,
    FinalPosition,
    StepMode,
    DwellTime,
}

impl ParamKey {
    /// Look up a query key
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "rs" => Some(Self::RotationalSpeed),
            "ra" => Some(Self::RotationalAccel),
            "rd" => Some(Self::RotationalDecel),
            "cis" => Some(Self::CurrentPosition),
            "fis" => Some(Self::FinalPosition),
            "sm" => Some(Self::StepMode),
            "dt" => Some(Self::DwellTime),
            _ => None,
        }
    }

    /// Query key for this field
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RotationalSpeed => "rs",
            Self::RotationalAccel => "ra",
            Self::RotationalDecel => "rd",
            Self::CurrentPosition => "cis",
            Self::FinalPosition => "fis",
            Self::StepMode => "sm",
            Self::DwellTime => "dt",
        }
    }
}

/// A non-fatal problem found while merging
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MergeDiagnostic {
    /// Negative or non-finite value replaced by 0
    Clamped { key: ParamKey },
    /// Step mode outside {0, 1, 2} replaced by full step
    InvalidStepMode { value: i64 },
    /// Key not recognized (truncated)
    Unrecognized(String<16>),
}

/// Outcome of a merge
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MergeReport {
    /// Number of recognized fields applied
    pub applied: u8,
    /// Diagnostics in query order
    pub diagnostics: Vec<MergeDiagnostic, MAX_DIAGNOSTICS>,
    /// Set when more diagnostics occurred than fit
    pub overflowed: bool,
}

impl MergeReport {
    /// Check if the merge produced no diagnostics
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty() && !self.overflowed
    }

    fn push(&mut self, diagnostic: MergeDiagnostic) {
        if self.diagnostics.push(diagnostic).is_err() {
            self.overflowed = true;
        }
    }
}

/// Merge a query string into `params`
///
/// Parsing stops at the first space (the end of the request target), at a
/// segment without `=`, or at a pair with an empty key or value.
pub fn merge_into(params: &mut MotorParameters, query: &str) -> MergeReport {
    let mut report = MergeReport::default();
    let end = query.find(' ').unwrap_or(query.len());
    let mut rest = &query[..end];

    while !rest.is_empty() {
        let Some(eq) = rest.find('=') else {
            break;
        };
        let key = &rest[..eq];
        let after = &rest[eq + 1..];
        let value_end = after.find('&').unwrap_or(after.len());
        let value = &after[..value_end];
        if key.is_empty() || value.is_empty() {
            break;
        }

        apply_field(params, key, value, &mut report);

        rest = after[value_end..].strip_prefix('&').unwrap_or("");
    }

    report
}

fn apply_field(params: &mut MotorParameters, key: &str, value: &str, report: &mut MergeReport) {
    let Some(param) = ParamKey::from_key(key) else {
        let mut name = String::new();
        for c in key.chars() {
            if name.push(c).is_err() {
                break;
            }
        }
        report.push(MergeDiagnostic::Unrecognized(name));
        return;
    };

    match param {
        ParamKey::RotationalSpeed => {
            params.rotational_speed = non_negative(parse_float(value), param, report)
        }
        ParamKey::RotationalAccel => {
            params.rotational_accel = non_negative(parse_float(value), param, report)
        }
        ParamKey::RotationalDecel => {
            params.rotational_decel = non_negative(parse_float(value), param, report)
        }
        ParamKey::CurrentPosition => {
            params.current_position = saturate_i32(parse_integer(value));
        }
        ParamKey::FinalPosition => {
            params.final_position = non_negative_u32(parse_integer(value), param, report);
        }
        ParamKey::StepMode => {
            let raw = parse_integer(value);
            params.step_mode = StepMode::from_wire(raw).unwrap_or_else(|| {
                report.push(MergeDiagnostic::InvalidStepMode { value: raw });
                StepMode::Full
            });
        }
        ParamKey::DwellTime => {
            params.dwell_time_ms = non_negative_u32(parse_integer(value), param, report);
        }
    }
    report.applied = report.applied.saturating_add(1);
}

fn non_negative(value: f32, key: ParamKey, report: &mut MergeReport) -> f32 {
    // Exponents past f32 range parse as infinity
    if value < 0.0 || !value.is_finite() {
        report.push(MergeDiagnostic::Clamped { key });
        0.0
    } else {
        value
    }
}

fn non_negative_u32(value: i64, key: ParamKey, report: &mut MergeReport) -> u32 {
    if value < 0 {
        report.push(MergeDiagnostic::Clamped { key });
        0
    } else {
        u32::try_from(value).unwrap_or(u32::MAX)
    }
}

fn saturate_i32(value: i64) -> i32 {
    value.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

/// Length of an optional sign followed by leading ASCII digits
fn signed_digits(bytes: &[u8]) -> (usize, usize) {
    let sign = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let digits = bytes[sign..].iter().take_while(|b| b.is_ascii_digit()).count();
    (sign, digits)
}

/// Parse the longest float prefix of `value`, or 0.0 if there is none
pub fn parse_float(value: &str) -> f32 {
    let value = value.trim_start();
    let bytes = value.as_bytes();

    let (sign, int_digits) = signed_digits(bytes);
    let mut end = sign + int_digits;
    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = bytes[end + 1..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count();
        if int_digits + frac_digits > 0 {
            end += 1 + frac_digits;
        }
    }
    if int_digits + frac_digits == 0 {
        return 0.0;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let (exp_sign, exp_digits) = signed_digits(&bytes[end + 1..]);
        if exp_digits > 0 {
            end += 1 + exp_sign + exp_digits;
        }
    }

    value[..end].parse().unwrap_or(0.0)
}

/// Parse the longest integer prefix of `value`, saturating, or 0 if there is none
pub fn parse_integer(value: &str) -> i64 {
    let bytes = value.trim_start().as_bytes();
    let (sign, digits) = signed_digits(bytes);
    let negative = sign == 1 && bytes[0] == b'-';

    bytes[sign..sign + digits].iter().fold(0i64, |acc, b| {
        let digit = i64::from(b - b'0');
        if negative {
            acc.saturating_mul(10).saturating_sub(digit)
        } else {
            acc.saturating_mul(10).saturating_add(digit)
        }
    })
}
