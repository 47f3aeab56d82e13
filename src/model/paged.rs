//! Purpose: Generic continuation-token page returned by list queries.
//! Exports: `PagedList`.
//! Invariants: An absent `Items` and an empty `Items` stay distinguishable after re-encoding.
use crate::core::path::WirePath;
use crate::core::record::{ObjectReader, ObjectWriter, WireRecord, read_record, write_record};
use crate::core::value::{FromWire, Plain, ToWire, WireResult};
use serde_json::Value;

#[derive(Clone, Debug, PartialEq)]
pub struct PagedList<T> {
    /// Opaque token for the next page; absent or empty on the last page.
    pub continuation_token: Option<String>,
    pub items: Option<Vec<T>>,
}

impl<T> Default for PagedList<T> {
    fn default() -> Self {
        Self {
            continuation_token: None,
            items: None,
        }
    }
}

impl<T> PagedList<T> {
    pub fn items(&self) -> &[T] {
        self.items.as_deref().unwrap_or(&[])
    }

    pub fn next_token(&self) -> Option<&str> {
        self.continuation_token
            .as_deref()
            .filter(|token| !token.is_empty())
    }
}

impl<T: FromWire + ToWire> WireRecord for PagedList<T> {
    const TYPE_NAME: &'static str = "PagedList";

    fn read_fields(reader: &mut ObjectReader<'_>) -> WireResult<Self> {
        Ok(Self {
            continuation_token: reader.optional::<String, Plain>("ContinuationToken")?,
            items: reader.optional::<Vec<T>, Plain>("Items")?,
        })
    }

    fn write_fields(&self, writer: &mut ObjectWriter) -> WireResult<()> {
        writer.optional::<String, Plain>("ContinuationToken", &self.continuation_token)?;
        writer.optional::<Vec<T>, Plain>("Items", &self.items)
    }
}

impl<T: FromWire + ToWire> FromWire for PagedList<T> {
    fn from_wire(value: Value, path: &WirePath<'_>) -> WireResult<Self> {
        read_record(value, path)
    }
}

impl<T: FromWire + ToWire> ToWire for PagedList<T> {
    fn to_wire(&self) -> WireResult<Value> {
        write_record(self)
    }
}

impl<T: FromWire + ToWire> serde::Serialize for PagedList<T> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let value = self.to_wire().map_err(serde::ser::Error::custom)?;
        serde::Serialize::serialize(&value, serializer)
    }
}

impl<'de, T: FromWire + ToWire> serde::Deserialize<'de> for PagedList<T> {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = <Value as serde::Deserialize>::deserialize(deserializer)?;
        Self::from_wire(value, &WirePath::Root).map_err(serde::de::Error::custom)
    }
}
