//! The wire format.
//!
//! Both encodings share one vocabulary, expressed by the [`Encoder`] and
//! [`Decoder`] traits, and differ only in bytes:
//!
//! | item            | binary                              | text                        |
//! |-----------------|-------------------------------------|-----------------------------|
//! | mode preamble   | `u32` LE (0, 1, 2)                  | `Mode=Default\n`            |
//! | null            | 8 x `0xFF`                          | `null;`                     |
//! | type name       | string                              | `{full name}`               |
//! | tag             | 1 byte                              | `\n`, ` *`, ` #`, ` !`      |
//! | count, index    | `i32` LE                            | integer token               |
//! | integer         | fixed width LE                      | `0x1F;`, `-0x1F;`           |
//! | `f32` / `f64`   | IEEE LE                             | `1.5f;` / `1.5d;`           |
//! | decimal         | 16 bytes, `lo mid hi flags`         | `12.50m;`                   |
//! | `char`          | `u32` LE scalar value               | `'c';`                      |
//! | string          | `i64` LE UTF-16 length + UTF-16 LE  | `"escaped";`                |
//! | GUID            | 16 bytes                            | `{hyphenated};`             |
//! | member names    | `i32` count + strings               | `0x2;"a";"b";`              |
//! | end occurrence  | nothing                             | `\n`                        |
//!
//! A binary stream never starts with `M`, so the first byte tells the
//! encodings apart, see [`sniff`].

// -----------------------------------------------------------------------------
// Modules

mod binary;
mod buffer;
mod text;

// -----------------------------------------------------------------------------
// Exports

pub use binary::{BinaryDecoder, BinaryEncoder};
pub use buffer::{ByteReader, ByteWriter};
pub use text::{TextDecoder, TextEncoder};

// -----------------------------------------------------------------------------
// Traits

use std::io::Read;

use gs_reflect::Value;
use gs_reflect::info::PrimitiveKind;

use crate::{CodecError, Encoding, Mode, ObjectTag};

/// Writes the vocabulary of the wire format.
pub trait Encoder {
    fn write_mode(&mut self, mode: Mode) -> Result<(), CodecError>;

    /// The null marker, also used for null strings.
    fn write_null(&mut self) -> Result<(), CodecError>;

    fn write_type_name(&mut self, name: &str) -> Result<(), CodecError>;

    fn write_tag(&mut self, tag: ObjectTag) -> Result<(), CodecError>;

    /// Element count following [`ObjectTag::ObjectList`].
    fn write_count(&mut self, count: i32) -> Result<(), CodecError>;

    /// Entry index following [`ObjectTag::ObjectIndex`].
    fn write_index(&mut self, index: i32) -> Result<(), CodecError>;

    #[inline]
    fn write_condition(&mut self, present: bool) -> Result<(), CodecError> {
        self.write_primitive(&Value::Bool(present))
    }

    fn write_member_names(&mut self, names: &[&str]) -> Result<(), CodecError>;

    /// Writes a leaf value. The kind is taken from the value.
    fn write_primitive(&mut self, value: &Value) -> Result<(), CodecError>;

    fn end_occurrence(&mut self) -> Result<(), CodecError>;

    /// Flushes the stream and returns the number of bytes written.
    fn finish(&mut self) -> Result<u64, CodecError>;
}

/// Reads the vocabulary of the wire format.
///
/// Leaf values that cannot be decoded are reported as
/// [`CodecError::Malformed`] after being consumed, every other error
/// leaves the stream unusable.
pub trait Decoder {
    fn read_mode(&mut self) -> Result<Mode, CodecError>;

    /// Reads a type name, `None` for the null marker.
    fn read_type_name(&mut self) -> Result<Option<String>, CodecError>;

    fn read_tag(&mut self) -> Result<ObjectTag, CodecError>;

    fn read_count(&mut self) -> Result<i32, CodecError>;

    fn read_index(&mut self) -> Result<i32, CodecError>;

    fn read_condition(&mut self) -> Result<bool, CodecError> {
        match self.read_primitive(PrimitiveKind::Bool)? {
            Value::Bool(present) => Ok(present),
            other => Err(CodecError::Malformed {
                kind: "condition",
                detail: format!("{other:?}"),
            }),
        }
    }

    fn read_member_names(&mut self) -> Result<Vec<String>, CodecError>;

    /// Reads a leaf value of `kind`. Strings may be `Null`.
    fn read_primitive(&mut self, kind: PrimitiveKind) -> Result<Value, CodecError>;

    fn end_occurrence(&mut self) -> Result<(), CodecError>;

    /// Bytes consumed so far.
    fn position(&self) -> u64;
}

/// Limits applied while decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeLimits {
    /// Longest string, in UTF-16 code units.
    pub max_string_len: usize,
    pub max_member_names: usize,
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self {
            max_string_len: 1 << 24,
            max_member_names: 1 << 16,
        }
    }
}

/// Detects the encoding of a stream from its first byte.
///
/// Returns `None` for an empty stream.
pub fn sniff<R: Read>(reader: &mut ByteReader<R>) -> Result<Option<Encoding>, CodecError> {
    Ok(reader.peek_byte()?.map(|first| match first {
        b'M' => Encoding::Text,
        _ => Encoding::Binary,
    }))
}

pub(crate) fn limit(what: &'static str, len: usize, max: usize) -> Result<(), CodecError> {
    if len > max {
        return Err(CodecError::LimitExceeded {
            what,
            len: len as u64,
            max: max as u64,
        });
    }
    Ok(())
}

pub(crate) fn not_a_leaf(value: &Value) -> CodecError {
    CodecError::Malformed {
        kind: "leaf",
        detail: format!("{value:?} is not a primitive value"),
    }
}
