//! Built-in scalar conversion facility
//!
//! Covers numeric, boolean, character, decimal, text, date/time, duration and
//! unique-id conversions. Enum conversions need variant tables and live with
//! the convertible builder.
//!
//! Integer targets are range checked and report [`ConvertError::Overflow`];
//! fractional sources truncate toward zero.

use crate::decimal::Decimal;
use crate::error::ConvertError;
use crate::ty::{PrimitiveKind, Ty};
use crate::value::Value;
use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use uuid::Uuid;

/// Whether [`convert_scalar`] handles `from` to `to`
///
/// Nullable wrappers are looked through. Enums are never handled here.
#[must_use]
pub fn can_convert(from: &Ty, to: &Ty) -> bool {
    let (from, to) = (from.unwrap_nullable(), to.unwrap_nullable());
    if from.is_enum() || to.is_enum() {
        return false;
    }
    if !from.is_convertible_kind() || !to.is_convertible_kind() {
        return false;
    }
    match (from, to) {
        (a, b) if a == b => true,
        (_, Ty::String) | (Ty::String, _) => true,
        (Ty::Primitive(a), Ty::Primitive(b)) => primitive_pair(*a, *b),
        (Ty::Primitive(k), Ty::Decimal) | (Ty::Decimal, Ty::Primitive(k)) => {
            *k != PrimitiveKind::Char
        }
        _ => false,
    }
}

fn primitive_pair(from: PrimitiveKind, to: PrimitiveKind) -> bool {
    use PrimitiveKind::{Bool, Char};
    match (from, to) {
        (Char, Bool) | (Bool, Char) => false,
        (Char, k) | (k, Char) => k == Char || k.is_integer(),
        _ => true,
    }
}

/// Lossless primitive conversion
///
/// Widening pairs are emitted as a plain cast rather than a converter call.
#[must_use]
pub fn is_widening(from: PrimitiveKind, to: PrimitiveKind) -> bool {
    if from == to {
        return true;
    }
    match (from, to) {
        (PrimitiveKind::F32, PrimitiveKind::F64) => true,
        (a, b) if a.is_signed_integer() && b.is_signed_integer() => a.bits() < b.bits(),
        (a, b) if a.is_unsigned_integer() && b.is_integer() => {
            a.bits() < b.bits() || (b.is_unsigned_integer() && a.bits() <= b.bits())
        }
        (a, PrimitiveKind::F32) if a.is_integer() => a.bits() <= 16,
        (a, PrimitiveKind::F64) if a.is_integer() => a.bits() <= 32,
        _ => false,
    }
}

/// Convert a scalar value to `to`
///
/// `Null` converts to `Null`; replacing it with a zero value is the caller's
/// decision.
///
/// # Errors
/// [`ConvertError::Unsupported`] when no conversion exists,
/// [`ConvertError::Overflow`] and [`ConvertError::Parse`] when the value does
/// not fit, and [`ConvertError::ValueMismatch`] when the value's shape
/// contradicts `from`.
pub fn convert_scalar(value: Value, from: &Ty, to: &Ty) -> Result<Value, ConvertError> {
    if value.is_null() {
        return Ok(Value::Null);
    }
    if !can_convert(from, to) {
        return Err(ConvertError::Unsupported {
            from: from.clone(),
            to: to.clone(),
        });
    }
    let target = to.unwrap_nullable();
    match target {
        Ty::Primitive(kind) => to_primitive(value, *kind, target),
        Ty::String => to_text(&value)
            .map(Value::String)
            .ok_or_else(|| mismatch(from, &value)),
        Ty::Decimal => to_decimal(value, target),
        Ty::DateTime => match value {
            Value::DateTime(_) => Ok(value),
            Value::String(s) => DateTime::parse_from_rfc3339(s.trim())
                .map(|dt| Value::DateTime(dt.with_timezone(&Utc)))
                .map_err(|_| parse_error(s, target)),
            other => Err(mismatch(from, &other)),
        },
        Ty::Duration => match value {
            Value::Duration(_) => Ok(value),
            Value::String(s) => parse_duration(&s)
                .map(Value::Duration)
                .ok_or_else(|| parse_error(s, target)),
            other => Err(mismatch(from, &other)),
        },
        Ty::Uuid => match value {
            Value::Uuid(_) => Ok(value),
            Value::String(s) => Uuid::parse_str(s.trim())
                .map(Value::Uuid)
                .map_err(|_| parse_error(s, target)),
            other => Err(mismatch(from, &other)),
        },
        _ => Err(ConvertError::Unsupported {
            from: from.clone(),
            to: to.clone(),
        }),
    }
}

fn mismatch(expected: &Ty, found: &Value) -> ConvertError {
    ConvertError::ValueMismatch {
        expected: expected.clone(),
        found: found.kind(),
    }
}

fn parse_error(value: String, to: &Ty) -> ConvertError {
    ConvertError::Parse {
        value,
        to: to.clone(),
    }
}

fn overflow(value: impl ToString, to: &Ty) -> ConvertError {
    ConvertError::Overflow {
        value: value.to_string(),
        to: to.clone(),
    }
}

/// Render a scalar as text
///
/// Date/times use RFC 3339, durations `PT<seconds>S`, ids the hyphenated form.
#[must_use]
pub fn to_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::Bool(b) => b.to_string(),
        Value::Char(c) => c.to_string(),
        Value::Int(i) => i.to_string(),
        Value::UInt(u) => u.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Decimal(d) => d.to_string(),
        Value::String(s) => s.clone(),
        Value::DateTime(dt) => dt.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        Value::Duration(d) => format_duration(*d),
        Value::Uuid(id) => id.hyphenated().to_string(),
        _ => return None,
    };
    Some(text)
}

/// Format a duration as `PT<seconds>S` (fraction only when non-zero)
#[must_use]
pub fn format_duration(duration: TimeDelta) -> String {
    let negative = duration < TimeDelta::zero();
    let abs = duration.abs();
    let secs = abs.num_seconds();
    let nanos = abs.subsec_nanos();
    let sign = if negative { "-" } else { "" };
    if nanos == 0 {
        format!("{sign}PT{secs}S")
    } else {
        let fraction = format!("{nanos:09}");
        format!("{sign}PT{secs}.{}S", fraction.trim_end_matches('0'))
    }
}

/// Parse the `PT<seconds>S` form written by [`format_duration`]
#[must_use]
pub fn parse_duration(text: &str) -> Option<TimeDelta> {
    let text = text.trim();
    let (negative, rest) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let body = rest.strip_prefix("PT")?.strip_suffix('S')?;
    let (whole, fraction) = body.split_once('.').unwrap_or((body, ""));
    if whole.is_empty() || fraction.len() > 9 || !fraction.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let secs: i64 = whole.parse().ok()?;
    let nanos: u32 = if fraction.is_empty() {
        0
    } else {
        format!("{fraction:0<9}").parse().ok()?
    };
    let duration = TimeDelta::new(secs, nanos)?;
    Some(if negative { -duration } else { duration })
}

fn to_primitive(value: Value, kind: PrimitiveKind, target: &Ty) -> Result<Value, ConvertError> {
    match kind {
        PrimitiveKind::Bool => to_bool(value, target).map(Value::Bool),
        PrimitiveKind::Char => to_char(value, target).map(Value::Char),
        PrimitiveKind::F32 | PrimitiveKind::F64 => {
            let f = to_float(value, target)?;
            if kind == PrimitiveKind::F32 {
                #[allow(clippy::cast_possible_truncation)]
                let narrowed = f as f32;
                Ok(Value::Float(f64::from(narrowed)))
            } else {
                Ok(Value::Float(f))
            }
        }
        integer => {
            let n = to_integer(value, target)?;
            let Some((min, max)) = integer.integer_range() else {
                return Err(overflow(n, target));
            };
            if n < min || n > max {
                return Err(overflow(n, target));
            }
            if integer.is_signed_integer() {
                i64::try_from(n).map(Value::Int).map_err(|_| overflow(n, target))
            } else {
                u64::try_from(n).map(Value::UInt).map_err(|_| overflow(n, target))
            }
        }
    }
}

fn to_bool(value: Value, target: &Ty) -> Result<bool, ConvertError> {
    match value {
        Value::Bool(b) => Ok(b),
        Value::Int(i) => Ok(i != 0),
        Value::UInt(u) => Ok(u != 0),
        Value::Float(f) => Ok(f != 0.0),
        Value::Decimal(d) => Ok(d != Decimal::ZERO),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            _ => Err(parse_error(s, target)),
        },
        other => Err(mismatch(target, &other)),
    }
}

fn to_char(value: Value, target: &Ty) -> Result<char, ConvertError> {
    let code = match value {
        Value::Char(c) => return Ok(c),
        Value::Int(i) => u32::try_from(i).map_err(|_| overflow(i, target))?,
        Value::UInt(u) => u32::try_from(u).map_err(|_| overflow(u, target))?,
        Value::String(s) => {
            let mut chars = s.chars();
            return match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(c),
                _ => Err(parse_error(s, target)),
            };
        }
        other => return Err(mismatch(target, &other)),
    };
    char::from_u32(code).ok_or_else(|| overflow(code, target))
}

#[allow(clippy::cast_possible_truncation)]
fn to_integer(value: Value, target: &Ty) -> Result<i128, ConvertError> {
    match value {
        Value::Bool(b) => Ok(i128::from(b)),
        Value::Char(c) => Ok(i128::from(u32::from(c))),
        Value::Int(i) => Ok(i128::from(i)),
        Value::UInt(u) => Ok(i128::from(u)),
        Value::Float(f) => {
            // i128 comfortably covers every 64-bit target range
            if !f.is_finite() || f.abs() >= 1.0e38 {
                return Err(overflow(f, target));
            }
            Ok(f.trunc() as i128)
        }
        Value::Decimal(d) => Ok(d.trunc()),
        Value::String(s) => s.trim().parse::<i128>().map_err(|_| parse_error(s, target)),
        other => Err(mismatch(target, &other)),
    }
}

#[allow(clippy::cast_precision_loss)]
fn to_float(value: Value, target: &Ty) -> Result<f64, ConvertError> {
    match value {
        Value::Bool(b) => Ok(if b { 1.0 } else { 0.0 }),
        Value::Int(i) => Ok(i as f64),
        Value::UInt(u) => Ok(u as f64),
        Value::Float(f) => Ok(f),
        Value::Decimal(d) => Ok(d.to_f64()),
        Value::String(s) => s.trim().parse::<f64>().map_err(|_| parse_error(s, target)),
        other => Err(mismatch(target, &other)),
    }
}

fn to_decimal(value: Value, target: &Ty) -> Result<Value, ConvertError> {
    let decimal = match value {
        Value::Decimal(d) => d,
        Value::Bool(b) => Decimal::from(i64::from(b)),
        Value::Int(i) => Decimal::from(i),
        Value::UInt(u) => Decimal::from(u),
        Value::Float(f) => Decimal::from_f64(f).ok_or_else(|| overflow(f, target))?,
        Value::String(s) => s.parse::<Decimal>().map_err(|_| parse_error(s, target))?,
        other => return Err(mismatch(target, &other)),
    };
    Ok(Value::Decimal(decimal))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn conv(value: impl Into<Value>, from: Ty, to: Ty) -> Result<Value, ConvertError> {
        convert_scalar(value.into(), &from, &to)
    }

    #[test]
    fn numeric_conversions() {
        assert_eq!(conv(7_i32, Ty::I32, Ty::I64).unwrap(), Value::Int(7));
        assert_eq!(conv(7_i32, Ty::I32, Ty::U8).unwrap(), Value::UInt(7));
        assert_eq!(conv(2.9_f64, Ty::F64, Ty::I32).unwrap(), Value::Int(2));
        assert_eq!(conv(-2.9_f64, Ty::F64, Ty::I32).unwrap(), Value::Int(-2));
    }

    #[test]
    fn integer_overflow_is_reported() {
        let err = conv(300_i32, Ty::I32, Ty::U8).unwrap_err();
        assert!(matches!(err, ConvertError::Overflow { .. }));
        assert!(conv(-1_i32, Ty::I32, Ty::Primitive(PrimitiveKind::U32)).is_err());
    }

    #[test]
    fn text_round_trip() {
        assert_eq!(conv(42_i64, Ty::I64, Ty::String).unwrap(), Value::from("42"));
        assert_eq!(conv("42", Ty::String, Ty::I64).unwrap(), Value::Int(42));
        assert!(matches!(
            conv("forty", Ty::String, Ty::I64),
            Err(ConvertError::Parse { .. })
        ));
        assert_eq!(conv("TRUE", Ty::String, Ty::BOOL).unwrap(), Value::Bool(true));
    }

    #[test]
    fn decimal_conversions() {
        let d: Decimal = "12.75".parse().unwrap();
        assert_eq!(conv(d, Ty::Decimal, Ty::I32).unwrap(), Value::Int(12));
        assert_eq!(conv(3_i32, Ty::I32, Ty::Decimal).unwrap(), Value::Decimal(Decimal::from(3_i64)));
        assert_eq!(conv(d, Ty::Decimal, Ty::String).unwrap(), Value::from("12.75"));
    }

    #[test]
    fn datetime_and_uuid_text() {
        let dt = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let text = conv(dt, Ty::DateTime, Ty::String).unwrap();
        assert_eq!(text, Value::from("2024-05-01T12:00:00Z"));
        assert_eq!(conv(text, Ty::String, Ty::DateTime).unwrap(), Value::DateTime(dt));

        let id = Uuid::nil();
        let text = conv(id, Ty::Uuid, Ty::String).unwrap();
        assert_eq!(conv(text, Ty::String, Ty::Uuid).unwrap(), Value::Uuid(id));
    }

    #[test]
    fn duration_text() {
        let d = TimeDelta::milliseconds(90_500);
        assert_eq!(format_duration(d), "PT90.5S");
        assert_eq!(parse_duration("PT90.5S"), Some(d));
        assert_eq!(parse_duration("-PT3S"), Some(TimeDelta::seconds(-3)));
        assert_eq!(parse_duration("90s"), None);
    }

    #[test]
    fn char_rules() {
        assert_eq!(conv('A', Ty::CHAR, Ty::I32).unwrap(), Value::Int(65));
        assert_eq!(conv(66_i32, Ty::I32, Ty::CHAR).unwrap(), Value::Char('B'));
        assert!(!can_convert(&Ty::CHAR, &Ty::F64));
        assert!(!can_convert(&Ty::CHAR, &Ty::BOOL));
    }

    #[test]
    fn null_passes_through() {
        assert_eq!(
            convert_scalar(Value::Null, &Ty::nullable(Ty::I32), &Ty::I64).unwrap(),
            Value::Null
        );
    }

    #[test]
    fn unsupported_pairs() {
        assert!(!can_convert(&Ty::Uuid, &Ty::I32));
        assert!(!can_convert(&Ty::enumeration("E"), &Ty::String));
        assert!(!can_convert(&Ty::object("A"), &Ty::String));
        assert!(matches!(
            conv(Uuid::nil(), Ty::Uuid, Ty::I32),
            Err(ConvertError::Unsupported { .. })
        ));
    }

    #[test]
    fn widening() {
        use PrimitiveKind::*;
        assert!(is_widening(I32, I64));
        assert!(is_widening(U8, I16));
        assert!(is_widening(U16, U32));
        assert!(is_widening(I32, F64));
        assert!(!is_widening(I64, F64));
        assert!(!is_widening(I64, I32));
        assert!(!is_widening(U32, I32));
        assert!(!is_widening(I8, U64));
    }
}
