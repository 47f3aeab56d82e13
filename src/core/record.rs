//! Purpose: Object-level reader/writer used by every record converter.
//! Exports: `WireRecord`, `ObjectReader`, `ObjectWriter`, `read_record`, `write_record`.
//! Role: Shared mechanics for "take known keys, skip the rest" and "omit absent optionals".
//! Invariants: Unknown keys are never an error; missing required keys always are.
//! Invariants: Writers never emit `null` for an absent optional field.
use crate::core::error::{Error, ErrorKind};
use crate::core::path::WirePath;
use crate::core::value::{FieldCodec, WireResult, unexpected};
use serde_json::{Map, Value};

/// A record type whose fields map one-to-one to keys of a JSON object.
pub trait WireRecord: Sized {
    const TYPE_NAME: &'static str;

    fn read_fields(reader: &mut ObjectReader<'_>) -> WireResult<Self>;

    fn write_fields(&self, writer: &mut ObjectWriter) -> WireResult<()>;
}

pub fn read_record<T: WireRecord>(value: Value, path: &WirePath<'_>) -> WireResult<T> {
    let mut reader = ObjectReader::open(value, path, T::TYPE_NAME)?;
    let record = T::read_fields(&mut reader)?;
    reader.finish();
    Ok(record)
}

pub fn write_record<T: WireRecord>(record: &T) -> WireResult<Value> {
    let mut writer = ObjectWriter::new();
    record.write_fields(&mut writer)?;
    Ok(writer.finish())
}

pub struct ObjectReader<'p> {
    fields: Map<String, Value>,
    path: &'p WirePath<'p>,
    type_name: &'static str,
}

impl<'p> ObjectReader<'p> {
    pub fn open(value: Value, path: &'p WirePath<'p>, type_name: &'static str) -> WireResult<Self> {
        match value {
            Value::Object(fields) => Ok(Self {
                fields,
                path,
                type_name,
            }),
            other => Err(unexpected(path, &format!("{type_name} object"), &other)),
        }
    }

    pub fn path(&self) -> &WirePath<'p> {
        self.path
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Explicit `null` is treated as absent.
    pub fn optional<T, C: FieldCodec<T>>(&mut self, name: &'static str) -> WireResult<Option<T>> {
        match self.fields.remove(name) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => C::decode(value, &self.path.field(name)).map(Some),
        }
    }

    pub fn required<T, C: FieldCodec<T>>(&mut self, name: &'static str) -> WireResult<T> {
        match self.fields.remove(name) {
            None => Err(self.missing(name)),
            Some(Value::Null) => Err(unexpected(
                &self.path.field(name),
                "non-null value",
                &Value::Null,
            )
            .with_message(format!(
                "required field {name} of {} is null",
                self.type_name
            ))),
            Some(value) => C::decode(value, &self.path.field(name)),
        }
    }

    /// Removes and returns the discriminator string, wherever it sits in the object.
    pub fn discriminator(&mut self, name: &'static str) -> WireResult<String> {
        match self.fields.remove(name) {
            None | Some(Value::Null) => Err(self.missing(name)),
            Some(Value::String(kind)) => Ok(kind),
            Some(other) => Err(unexpected(
                &self.path.field(name),
                "discriminator string",
                &other,
            )),
        }
    }

    pub fn finish(self) {
        for key in self.fields.keys() {
            tracing::trace!(
                record = self.type_name,
                path = %self.path,
                key = %key,
                "skipping unrecognized property"
            );
        }
    }

    fn missing(&self, name: &str) -> Error {
        Error::new(ErrorKind::MissingRequiredField)
            .with_message(format!(
                "missing required field {name} of {}",
                self.type_name
            ))
            .with_path(self.path.field(name).to_string())
            .with_expected(name)
            .with_actual("absent")
    }
}

#[derive(Default)]
pub struct ObjectWriter {
    fields: Map<String, Value>,
}

impl ObjectWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn discriminator(&mut self, name: &'static str, kind: &'static str) {
        self.fields
            .insert(name.to_string(), Value::String(kind.to_string()));
    }

    pub fn required<T, C: FieldCodec<T>>(&mut self, name: &'static str, value: &T) -> WireResult<()> {
        let encoded = C::encode(value).map_err(|err| at_field(err, name))?;
        self.fields.insert(name.to_string(), encoded);
        Ok(())
    }

    pub fn optional<T, C: FieldCodec<T>>(
        &mut self,
        name: &'static str,
        value: &Option<T>,
    ) -> WireResult<()> {
        match value {
            Some(value) => self.required::<T, C>(name, value),
            None => Ok(()),
        }
    }

    pub fn finish(self) -> Value {
        Value::Object(self.fields)
    }
}

fn at_field(err: Error, name: &str) -> Error {
    if err.path().is_some() {
        return err;
    }
    err.with_path(WirePath::Root.field(name).to_string())
}

#[cfg(test)]
mod tests {
    use super::{ObjectReader, ObjectWriter};
    use crate::core::error::ErrorKind;
    use crate::core::path::WirePath;
    use crate::core::value::{NumericString, Plain};
    use serde_json::json;

    #[test]
    fn reader_takes_known_keys_and_tolerates_extras() {
        let root = WirePath::Root;
        let mut reader = ObjectReader::open(
            json!({"Name": "fabric:/app", "Extra": [1, 2], "Size": "42"}),
            &root,
            "Probe",
        )
        .expect("object");
        let name: String = reader.required::<_, Plain>("Name").expect("name");
        let size: Option<u64> = reader.optional::<_, NumericString>("Size").expect("size");
        let absent: Option<String> = reader.optional::<_, Plain>("Missing").expect("absent");
        reader.finish();
        assert_eq!(name, "fabric:/app");
        assert_eq!(size, Some(42));
        assert_eq!(absent, None);
    }

    #[test]
    fn reader_reports_missing_required_with_path() {
        let root = WirePath::Root;
        let nested = root.field("UpgradeDescription");
        let mut reader = ObjectReader::open(json!({}), &nested, "Probe").expect("object");
        let err = reader.required::<String, Plain>("Name").expect_err("missing");
        assert_eq!(err.kind(), ErrorKind::MissingRequiredField);
        assert_eq!(err.path(), Some("$.UpgradeDescription.Name"));
        assert_eq!(err.actual(), Some("absent"));
    }

    #[test]
    fn reader_rejects_non_objects() {
        let root = WirePath::Root;
        let err = ObjectReader::open(json!([1]), &root, "Probe")
            .err()
            .expect("array is not an object");
        assert_eq!(err.kind(), ErrorKind::UnexpectedToken);
        assert_eq!(err.actual(), Some("array of 1"));
    }

    #[test]
    fn null_counts_as_absent_for_optional_only() {
        let root = WirePath::Root;
        let mut reader =
            ObjectReader::open(json!({"A": null, "B": null}), &root, "Probe").expect("object");
        let a: Option<String> = reader.optional::<_, Plain>("A").expect("a");
        assert!(a.is_none());
        let err = reader.required::<String, Plain>("B").expect_err("b");
        assert_eq!(err.kind(), ErrorKind::UnexpectedToken);
    }

    #[test]
    fn writer_omits_absent_optionals() {
        let mut writer = ObjectWriter::new();
        writer.discriminator("Kind", "Named");
        writer
            .required::<_, Plain>("Name", &"svc1".to_string())
            .expect("name");
        writer
            .optional::<String, Plain>("Description", &None)
            .expect("description");
        writer
            .optional::<i64, NumericString>("LowKey", &Some(-5))
            .expect("low");
        let value = writer.finish();
        assert_eq!(value, json!({"Kind": "Named", "Name": "svc1", "LowKey": "-5"}));
        let keys: Vec<&String> = value.as_object().expect("object").keys().collect();
        assert_eq!(keys, ["Kind", "Name", "LowKey"]);
    }
}
