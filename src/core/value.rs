//! Purpose: Field-level decode/encode rules for wire JSON values.
//! Exports: `FromWire`, `ToWire`, `FieldCodec`, `Plain`, `NumericString`, `describe`.
//! Role: The uniform per-type rules every generated converter delegates to.
//! Invariants: Decoding never coerces between JSON shapes except where a codec says so.
//! Invariants: Numeric strings re-encode as strings; timestamps re-encode as RFC 3339.
use crate::core::error::{Error, ErrorKind};
use crate::core::path::WirePath;
use serde_json::{Number, Value};
use time::OffsetDateTime;
use time::format_description::well_known::{Iso8601, Rfc3339};

pub type WireResult<T> = Result<T, Error>;

pub trait FromWire: Sized {
    fn from_wire(value: Value, path: &WirePath<'_>) -> WireResult<Self>;
}

pub trait ToWire {
    fn to_wire(&self) -> WireResult<Value>;
}

/// How a single field is carried on the wire.
pub trait FieldCodec<T> {
    fn decode(value: Value, path: &WirePath<'_>) -> WireResult<T>;
    fn encode(value: &T) -> WireResult<Value>;
}

/// Use the type's own `FromWire`/`ToWire` rule.
pub struct Plain;

impl<T: FromWire + ToWire> FieldCodec<T> for Plain {
    fn decode(value: Value, path: &WirePath<'_>) -> WireResult<T> {
        T::from_wire(value, path)
    }

    fn encode(value: &T) -> WireResult<Value> {
        value.to_wire()
    }
}

/// 64-bit integers the gateway sends as strings to dodge float precision loss.
/// Either a JSON string or a JSON number is accepted on decode.
pub struct NumericString;

macro_rules! numeric_string_codec {
    ($($int:ty),+) => {
        $(
            impl FieldCodec<$int> for NumericString {
                fn decode(value: Value, path: &WirePath<'_>) -> WireResult<$int> {
                    if let Value::String(text) = &value {
                        return text.parse::<$int>().map_err(|err| {
                            malformed_number(path, stringify!($int), &value).with_source(err)
                        });
                    }
                    if value.is_number() {
                        return <$int as FromWire>::from_wire(value, path);
                    }
                    Err(unexpected(path, "numeric string or number", &value))
                }

                fn encode(value: &$int) -> WireResult<Value> {
                    Ok(Value::String(value.to_string()))
                }
            }
        )+
    };
}

numeric_string_codec!(i64, u64, i32, u32);

impl FromWire for String {
    fn from_wire(value: Value, path: &WirePath<'_>) -> WireResult<Self> {
        match value {
            Value::String(text) => Ok(text),
            other => Err(unexpected(path, "string", &other)),
        }
    }
}

impl ToWire for String {
    fn to_wire(&self) -> WireResult<Value> {
        Ok(Value::String(self.clone()))
    }
}

impl FromWire for bool {
    fn from_wire(value: Value, path: &WirePath<'_>) -> WireResult<Self> {
        match value {
            Value::Bool(flag) => Ok(flag),
            other => Err(unexpected(path, "boolean", &other)),
        }
    }
}

impl ToWire for bool {
    fn to_wire(&self) -> WireResult<Value> {
        Ok(Value::Bool(*self))
    }
}

macro_rules! integer_rule {
    ($($int:ty => $getter:ident),+) => {
        $(
            impl FromWire for $int {
                fn from_wire(value: Value, path: &WirePath<'_>) -> WireResult<Self> {
                    let Value::Number(number) = &value else {
                        return Err(unexpected(path, "integer", &value));
                    };
                    number
                        .$getter()
                        .and_then(|wide| <$int>::try_from(wide).ok())
                        .ok_or_else(|| malformed_number(path, stringify!($int), &value))
                }
            }

            impl ToWire for $int {
                fn to_wire(&self) -> WireResult<Value> {
                    Ok(Value::from(*self))
                }
            }
        )+
    };
}

integer_rule!(i64 => as_i64, i32 => as_i64, u64 => as_u64, u32 => as_u64);

impl FromWire for f64 {
    fn from_wire(value: Value, path: &WirePath<'_>) -> WireResult<Self> {
        match &value {
            Value::Number(number) => number
                .as_f64()
                .ok_or_else(|| malformed_number(path, "f64", &value)),
            _ => Err(unexpected(path, "number", &value)),
        }
    }
}

impl ToWire for f64 {
    fn to_wire(&self) -> WireResult<Value> {
        Number::from_f64(*self).map(Value::Number).ok_or_else(|| {
            Error::new(ErrorKind::MalformedNumber)
                .with_message("non-finite float cannot be written as JSON")
                .with_actual(self.to_string())
        })
    }
}

impl FromWire for OffsetDateTime {
    fn from_wire(value: Value, path: &WirePath<'_>) -> WireResult<Self> {
        let Value::String(text) = &value else {
            return Err(unexpected(path, "timestamp string", &value));
        };
        OffsetDateTime::parse(text, &Rfc3339)
            .or_else(|_| OffsetDateTime::parse(text, &Iso8601::DEFAULT))
            .map_err(|err| {
                Error::new(ErrorKind::InvalidTimestamp)
                    .with_message("timestamp is not ISO-8601")
                    .with_path(path.to_string())
                    .with_expected("ISO-8601 timestamp")
                    .with_actual(describe(&value))
                    .with_source(err)
            })
    }
}

impl ToWire for OffsetDateTime {
    fn to_wire(&self) -> WireResult<Value> {
        self.format(&Rfc3339).map(Value::String).map_err(|err| {
            Error::new(ErrorKind::InvalidTimestamp)
                .with_message("timestamp cannot be written as RFC 3339")
                .with_source(err)
        })
    }
}

impl<T: FromWire> FromWire for Vec<T> {
    fn from_wire(value: Value, path: &WirePath<'_>) -> WireResult<Self> {
        let items = expect_array(value, path)?;
        let mut out = Vec::with_capacity(items.len());
        for (idx, item) in items.into_iter().enumerate() {
            out.push(T::from_wire(item, &path.index(idx))?);
        }
        Ok(out)
    }
}

impl<T: ToWire> ToWire for Vec<T> {
    fn to_wire(&self) -> WireResult<Value> {
        self.iter()
            .map(ToWire::to_wire)
            .collect::<WireResult<Vec<_>>>()
            .map(Value::Array)
    }
}

/// Free-form payloads (application parameters, custom health properties) pass through untouched.
impl FromWire for Value {
    fn from_wire(value: Value, _path: &WirePath<'_>) -> WireResult<Self> {
        Ok(value)
    }
}

impl ToWire for Value {
    fn to_wire(&self) -> WireResult<Value> {
        Ok(self.clone())
    }
}

fn expect_array(value: Value, path: &WirePath<'_>) -> WireResult<Vec<Value>> {
    match value {
        Value::Array(items) => Ok(items),
        other => Err(unexpected(path, "array", &other)),
    }
}

pub(crate) fn unexpected(path: &WirePath<'_>, expected: &str, actual: &Value) -> Error {
    Error::new(ErrorKind::UnexpectedToken)
        .with_message(format!("expected {expected}"))
        .with_path(path.to_string())
        .with_expected(expected)
        .with_actual(describe(actual))
}

fn malformed_number(path: &WirePath<'_>, target: &str, actual: &Value) -> Error {
    Error::new(ErrorKind::MalformedNumber)
        .with_message(format!("value does not fit {target}"))
        .with_path(path.to_string())
        .with_expected(target)
        .with_actual(describe(actual))
}

const MAX_DESCRIBED_TEXT: usize = 64;

/// Short description of a JSON token for error reports; long strings are clipped.
pub fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(flag) => format!("boolean {flag}"),
        Value::Number(number) => format!("number {number}"),
        Value::String(text) => {
            if text.chars().count() > MAX_DESCRIBED_TEXT {
                let clipped: String = text.chars().take(MAX_DESCRIBED_TEXT).collect();
                format!("string \"{clipped}...\"")
            } else {
                format!("string \"{text}\"")
            }
        }
        Value::Array(items) => format!("array of {}", items.len()),
        Value::Object(_) => "object".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::{FieldCodec, FromWire, NumericString, ToWire, describe};
    use crate::core::error::ErrorKind;
    use crate::core::path::WirePath;
    use serde_json::{Value, json};
    use time::OffsetDateTime;
    use time::macros::datetime;

    #[test]
    fn numeric_string_accepts_both_forms() {
        let root = WirePath::Root;
        let from_text: i64 =
            <NumericString as FieldCodec<i64>>::decode(json!("12345"), &root).expect("text");
        let from_number: i64 =
            <NumericString as FieldCodec<i64>>::decode(json!(12345), &root).expect("number");
        assert_eq!(from_text, 12345);
        assert_eq!(from_text, from_number);
        assert_eq!(
            <NumericString as FieldCodec<i64>>::encode(&from_text).expect("encode"),
            json!("12345")
        );
    }

    #[test]
    fn numeric_string_rejects_garbage() {
        let root = WirePath::Root;
        let err = <NumericString as FieldCodec<u64>>::decode(json!("12a"), &root).expect_err("err");
        assert_eq!(err.kind(), ErrorKind::MalformedNumber);
        let err = <NumericString as FieldCodec<u64>>::decode(json!("-1"), &root).expect_err("err");
        assert_eq!(err.kind(), ErrorKind::MalformedNumber);
        let err = <NumericString as FieldCodec<u64>>::decode(json!(true), &root).expect_err("err");
        assert_eq!(err.kind(), ErrorKind::UnexpectedToken);
    }

    #[test]
    fn int64_min_survives_as_string() {
        let root = WirePath::Root;
        let low: i64 = <NumericString as FieldCodec<i64>>::decode(
            json!("-9223372036854775808"),
            &root,
        )
        .expect("low key");
        assert_eq!(low, i64::MIN);
    }

    #[test]
    fn integers_reject_fractions_and_overflow() {
        let root = WirePath::Root;
        let err = i32::from_wire(json!(1.5), &root).expect_err("fraction");
        assert_eq!(err.kind(), ErrorKind::MalformedNumber);
        let err = i32::from_wire(json!(4_294_967_296u64), &root).expect_err("overflow");
        assert_eq!(err.kind(), ErrorKind::MalformedNumber);
        assert_eq!(i32::from_wire(json!(100), &root).expect("ok"), 100);
    }

    #[test]
    fn timestamps_parse_gateway_forms() {
        let root = WirePath::Root;
        let parsed = OffsetDateTime::from_wire(json!("2024-03-01T08:30:00.000Z"), &root)
            .expect("rfc3339");
        assert_eq!(parsed, datetime!(2024-03-01 08:30 UTC));
        let unset = OffsetDateTime::from_wire(json!("0001-01-01T00:00:00.000Z"), &root)
            .expect("sentinel");
        assert_eq!(unset.year(), 1);
        assert_eq!(parsed.to_wire().expect("encode"), json!("2024-03-01T08:30:00Z"));
    }

    #[test]
    fn timestamps_reject_garbage() {
        let root = WirePath::Root;
        let field = root.field("ModifiedDate");
        let err = OffsetDateTime::from_wire(json!("yesterday"), &field).expect_err("err");
        assert_eq!(err.kind(), ErrorKind::InvalidTimestamp);
        assert_eq!(err.path(), Some("$.ModifiedDate"));
        let err = OffsetDateTime::from_wire(json!(17), &field).expect_err("err");
        assert_eq!(err.kind(), ErrorKind::UnexpectedToken);
    }

    #[test]
    fn list_errors_point_at_element() {
        let root = WirePath::Root;
        let err = Vec::<String>::from_wire(json!(["a", 2]), &root).expect_err("err");
        assert_eq!(err.path(), Some("$[1]"));
        assert_eq!(err.actual(), Some("number 2"));
        let empty = Vec::<String>::from_wire(json!([]), &root).expect("empty");
        assert!(empty.is_empty());
    }

    #[test]
    fn describe_clips_long_strings() {
        let long = Value::String("x".repeat(100));
        let text = describe(&long);
        assert!(text.ends_with("...\""));
        assert!(text.len() < 90);
        assert_eq!(describe(&json!({"a": 1})), "object");
    }
}
