//! Purpose: Declarative schema macros that generate the per-type converters.
//! Exports: `record!`, `wire_enum!`, `polymorphic!` (crate-internal).
//! Role: One table per wire type; the repetitive converter code is generated, never hand-written.
//! Invariants: Field write order equals declaration order; a family writes its tag first.
//! Invariants: Generated serde impls delegate to the wire converters so both paths agree.
//!
//! ```text
//! record! {
//!     pub struct FileInfo {
//!         optional "FileSize" file_size: u64 as NumericString,
//!         optional "StoreRelativePath" store_relative_path: String,
//!     }
//! }
//! ```

macro_rules! field_ty {
    (required, $ty:ty) => { $ty };
    (optional, $ty:ty) => { ::std::option::Option<$ty> };
}

macro_rules! codec {
    () => { $crate::core::value::Plain };
    ($codec:ty) => { $codec };
}

macro_rules! serde_via_wire {
    ($name:ident) => {
        impl ::serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> ::std::result::Result<S::Ok, S::Error>
            where
                S: ::serde::Serializer,
            {
                let value = $crate::core::value::ToWire::to_wire(self)
                    .map_err(<S::Error as ::serde::ser::Error>::custom)?;
                ::serde::Serialize::serialize(&value, serializer)
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> ::std::result::Result<Self, D::Error>
            where
                D: ::serde::Deserializer<'de>,
            {
                let value = <::serde_json::Value as ::serde::Deserialize>::deserialize(deserializer)?;
                <$name as $crate::core::value::FromWire>::from_wire(
                    value,
                    &$crate::core::path::WirePath::Root,
                )
                .map_err(<D::Error as ::serde::de::Error>::custom)
            }
        }
    };
}

macro_rules! record {
    (
        $(#[$meta:meta])*
        pub struct $name:ident {
            $(
                $(#[$fmeta:meta])*
                $presence:ident $wire:literal $field:ident : $ty:ty $(as $codec:ty)?
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq)]
        pub struct $name {
            $(
                $(#[$fmeta])*
                pub $field: $crate::core::schema::field_ty!($presence, $ty),
            )*
        }

        impl $crate::core::record::WireRecord for $name {
            const TYPE_NAME: &'static str = stringify!($name);

            #[allow(unused_variables)]
            fn read_fields(
                reader: &mut $crate::core::record::ObjectReader<'_>,
            ) -> $crate::core::value::WireResult<Self> {
                Ok(Self {
                    $(
                        $field: reader
                            .$presence::<$ty, $crate::core::schema::codec!($($codec)?)>($wire)?,
                    )*
                })
            }

            #[allow(unused_variables)]
            fn write_fields(
                &self,
                writer: &mut $crate::core::record::ObjectWriter,
            ) -> $crate::core::value::WireResult<()> {
                $(
                    writer.$presence::<$ty, $crate::core::schema::codec!($($codec)?)>(
                        $wire,
                        &self.$field,
                    )?;
                )*
                Ok(())
            }
        }

        impl $crate::core::value::FromWire for $name {
            fn from_wire(
                value: ::serde_json::Value,
                path: &$crate::core::path::WirePath<'_>,
            ) -> $crate::core::value::WireResult<Self> {
                $crate::core::record::read_record(value, path)
            }
        }

        impl $crate::core::value::ToWire for $name {
            fn to_wire(&self) -> $crate::core::value::WireResult<::serde_json::Value> {
                $crate::core::record::write_record(self)
            }
        }

        $crate::core::schema::serde_via_wire!($name);
    };
}

macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $(
                $(#[$vmeta:meta])*
                $variant:ident = $wire:literal
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                $variant,
            )+
        }

        impl $crate::core::dispatch::WireEnum for $name {
            const NAME: &'static str = stringify!($name);
            const VALUES: &'static [&'static str] = &[$($wire),+];

            fn as_wire_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $wire,)+
                }
            }

            fn from_wire_str(text: &str) -> ::std::option::Option<Self> {
                match text {
                    $($wire => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str($crate::core::dispatch::WireEnum::as_wire_str(self))
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = $crate::core::error::Error;

            fn from_str(text: &str) -> ::std::result::Result<Self, Self::Err> {
                use $crate::core::dispatch::WireEnum as _;
                Self::from_wire_str(text).ok_or_else(|| {
                    $crate::core::dispatch::unknown_enum_value(
                        Self::NAME,
                        Self::VALUES,
                        text,
                        &$crate::core::path::WirePath::Root,
                    )
                })
            }
        }

        impl $crate::core::value::FromWire for $name {
            fn from_wire(
                value: ::serde_json::Value,
                path: &$crate::core::path::WirePath<'_>,
            ) -> $crate::core::value::WireResult<Self> {
                use $crate::core::dispatch::WireEnum as _;
                match value {
                    ::serde_json::Value::String(text) => {
                        Self::from_wire_str(&text).ok_or_else(|| {
                            $crate::core::dispatch::unknown_enum_value(
                                Self::NAME,
                                Self::VALUES,
                                &text,
                                path,
                            )
                        })
                    }
                    other => Err($crate::core::value::unexpected(
                        path,
                        concat!(stringify!($name), " string"),
                        &other,
                    )),
                }
            }
        }

        impl $crate::core::value::ToWire for $name {
            fn to_wire(&self) -> $crate::core::value::WireResult<::serde_json::Value> {
                Ok(::serde_json::Value::String(
                    $crate::core::dispatch::WireEnum::as_wire_str(self).to_string(),
                ))
            }
        }

        $crate::core::schema::serde_via_wire!($name);
    };
}

macro_rules! polymorphic {
    (
        $(#[$meta:meta])*
        pub enum $name:ident tagged $disc:literal {
            $(
                $(#[$vmeta:meta])*
                $wire:literal => $variant:ident($inner:ty)
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                $variant($inner),
            )+
        }

        impl $crate::core::dispatch::PolymorphicFamily for $name {
            const FAMILY: &'static str = stringify!($name);
            const DISCRIMINATOR: &'static str = $disc;
            const KINDS: &'static [&'static str] = &[$($wire),+];

            fn kind(&self) -> &'static str {
                match self {
                    $(Self::$variant(_) => $wire,)+
                }
            }
        }

        impl $crate::core::value::FromWire for $name {
            fn from_wire(
                value: ::serde_json::Value,
                path: &$crate::core::path::WirePath<'_>,
            ) -> $crate::core::value::WireResult<Self> {
                use $crate::core::dispatch::PolymorphicFamily as _;
                let mut reader =
                    $crate::core::record::ObjectReader::open(value, path, stringify!($name))?;
                let kind = reader.discriminator($disc)?;
                let decoded = match kind.as_str() {
                    $(
                        $wire => Self::$variant(
                            <$inner as $crate::core::record::WireRecord>::read_fields(&mut reader)?,
                        ),
                    )+
                    other => {
                        return Err($crate::core::dispatch::unknown_discriminator(
                            Self::FAMILY,
                            $disc,
                            Self::KINDS,
                            other,
                            path,
                        ));
                    }
                };
                reader.finish();
                Ok(decoded)
            }
        }

        impl $crate::core::value::ToWire for $name {
            fn to_wire(&self) -> $crate::core::value::WireResult<::serde_json::Value> {
                let mut writer = $crate::core::record::ObjectWriter::new();
                writer.discriminator(
                    $disc,
                    $crate::core::dispatch::PolymorphicFamily::kind(self),
                );
                match self {
                    $(
                        Self::$variant(inner) => {
                            $crate::core::record::WireRecord::write_fields(inner, &mut writer)?
                        }
                    )+
                }
                Ok(writer.finish())
            }
        }

        $crate::core::schema::serde_via_wire!($name);
    };
}

pub(crate) use codec;
pub(crate) use field_ty;
pub(crate) use polymorphic;
pub(crate) use record;
pub(crate) use serde_via_wire;
pub(crate) use wire_enum;
