//! Purpose: Public decode/encode entry points over text, bytes, readers, and values.
//! Exports: `from_str`, `from_slice`, `from_reader`, `from_value`, `to_value`,
//! `to_string`, `to_string_pretty`, `to_writer`.
//! Role: Single seam between raw JSON text and the typed converters.
//! Invariants: Malformed JSON text maps to `Syntax` with line/column; I/O failures map to `Io`.
//! Invariants: Decoding is buffered per document, so key order is never assumed.
use crate::core::error::{Error, ErrorKind};
use crate::core::path::WirePath;
use crate::core::value::{FromWire, ToWire, WireResult};
use serde_json::Value;
use serde_json::error::Category;
use std::io::{Read, Write};

pub fn from_str<T: FromWire>(input: &str) -> WireResult<T> {
    let value: Value = serde_json::from_str(input).map_err(parse_error)?;
    from_value(value)
}

pub fn from_slice<T: FromWire>(input: &[u8]) -> WireResult<T> {
    let value: Value = serde_json::from_slice(input).map_err(parse_error)?;
    from_value(value)
}

pub fn from_reader<T: FromWire, R: Read>(reader: R) -> WireResult<T> {
    let value: Value = serde_json::from_reader(reader).map_err(parse_error)?;
    from_value(value)
}

pub fn from_value<T: FromWire>(value: Value) -> WireResult<T> {
    T::from_wire(value, &WirePath::Root)
}

pub fn to_value<T: ToWire + ?Sized>(value: &T) -> WireResult<Value> {
    value.to_wire()
}

pub fn to_string<T: ToWire + ?Sized>(value: &T) -> WireResult<String> {
    let encoded = value.to_wire()?;
    serde_json::to_string(&encoded).map_err(encode_error)
}

pub fn to_string_pretty<T: ToWire + ?Sized>(value: &T) -> WireResult<String> {
    let encoded = value.to_wire()?;
    serde_json::to_string_pretty(&encoded).map_err(encode_error)
}

pub fn to_writer<T: ToWire + ?Sized, W: Write>(writer: W, value: &T) -> WireResult<()> {
    let encoded = value.to_wire()?;
    serde_json::to_writer(writer, &encoded).map_err(encode_error)
}

fn parse_error(err: serde_json::Error) -> Error {
    let kind = match err.classify() {
        Category::Io => ErrorKind::Io,
        Category::Syntax | Category::Eof | Category::Data => ErrorKind::Syntax,
    };
    let message = match err.classify() {
        Category::Eof => "unexpected end of JSON input",
        Category::Io => "failed to read JSON input",
        _ => "malformed JSON input",
    };
    let (line, column) = (err.line(), err.column());
    let mut mapped = Error::new(kind).with_message(message);
    if line > 0 {
        mapped = mapped.with_position(line, column);
    }
    mapped.with_source(err)
}

fn encode_error(err: serde_json::Error) -> Error {
    let kind = if err.is_io() {
        ErrorKind::Io
    } else {
        ErrorKind::Internal
    };
    Error::new(kind)
        .with_message("failed to write JSON output")
        .with_source(err)
}
