//! Purpose: Contracts for closed enumerations and discriminated families.
//! Exports: `WireEnum`, `PolymorphicFamily`, `unknown_enum_value`, `unknown_discriminator`.
//! Role: Compile-time dispatch tables; every family is a closed Rust enum.
//! Invariants: Value tables are `const` and never mutated.
//! Invariants: A value outside the table is a distinct, catchable error kind.
use crate::core::error::{Error, ErrorKind};
use crate::core::path::WirePath;

/// A closed set of wire strings matched ordinally.
pub trait WireEnum: Copy + Sized + 'static {
    const NAME: &'static str;
    const VALUES: &'static [&'static str];

    fn as_wire_str(&self) -> &'static str;

    fn from_wire_str(text: &str) -> Option<Self>;
}

/// A record family refined by a string tag held in one of its own keys.
pub trait PolymorphicFamily: Sized + 'static {
    const FAMILY: &'static str;
    const DISCRIMINATOR: &'static str;
    const KINDS: &'static [&'static str];

    fn kind(&self) -> &'static str;
}

pub fn unknown_enum_value(name: &str, values: &[&str], actual: &str, path: &WirePath<'_>) -> Error {
    Error::new(ErrorKind::UnknownEnumerationValue)
        .with_message(format!("unrecognized {name} value"))
        .with_path(path.to_string())
        .with_expected(one_of(values))
        .with_actual(format!("string \"{actual}\""))
}

pub fn unknown_discriminator(
    family: &str,
    discriminator: &str,
    kinds: &[&str],
    actual: &str,
    path: &WirePath<'_>,
) -> Error {
    Error::new(ErrorKind::UnknownDiscriminatorValue)
        .with_message(format!("unrecognized {discriminator} for {family}"))
        .with_path(path.field(discriminator).to_string())
        .with_expected(one_of(kinds))
        .with_actual(format!("string \"{actual}\""))
}

fn one_of(values: &[&str]) -> String {
    format!("one of {}", values.join(", "))
}

#[cfg(test)]
mod tests {
    use super::{unknown_discriminator, unknown_enum_value};
    use crate::core::error::ErrorKind;
    use crate::core::path::WirePath;

    #[test]
    fn unknown_discriminator_points_at_tag() {
        let root = WirePath::Root;
        let info = root.field("PartitionInformation");
        let err = unknown_discriminator(
            "PartitionInformation",
            "ServicePartitionKind",
            &["Int64Range", "Named", "Singleton"],
            "Bogus",
            &info,
        );
        assert_eq!(err.kind(), ErrorKind::UnknownDiscriminatorValue);
        assert_eq!(err.path(), Some("$.PartitionInformation.ServicePartitionKind"));
        assert_eq!(err.expected(), Some("one of Int64Range, Named, Singleton"));
        assert_eq!(err.actual(), Some("string \"Bogus\""));
    }

    #[test]
    fn unknown_enum_value_is_distinct_kind() {
        let err = unknown_enum_value("HealthState", &["Ok", "Error"], "ok", &WirePath::Root);
        assert_eq!(err.kind(), ErrorKind::UnknownEnumerationValue);
        assert_ne!(err.kind(), ErrorKind::UnknownDiscriminatorValue);
    }
}
