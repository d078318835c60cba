use std::io::{Read, Write};

use gs_reflect::Value;
use gs_reflect::info::PrimitiveKind;
use gs_reflect::value::Decimal;
use uuid::Uuid;

use super::{ByteReader, ByteWriter, DecodeLimits, Decoder, Encoder, limit, not_a_leaf};
use crate::{CodecError, Mode, ObjectTag};

/// Length prefix of a null string, also the null marker.
const NULL_LEN: i64 = -1;

// -----------------------------------------------------------------------------
// BinaryEncoder

/// Fixed-width little endian encoding.
pub struct BinaryEncoder<W: Write> {
    out: ByteWriter<W>,
}

impl<W: Write> BinaryEncoder<W> {
    pub fn new(out: ByteWriter<W>) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }

    fn write_string(&mut self, s: &str) -> Result<(), CodecError> {
        let units: Vec<u16> = s.encode_utf16().collect();
        let mut bytes = Vec::with_capacity(8 + units.len() * 2);
        bytes.extend_from_slice(&(units.len() as i64).to_le_bytes());
        for unit in units {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        self.out.write_bytes(&bytes)
    }
}

impl<W: Write> Encoder for BinaryEncoder<W> {
    fn write_mode(&mut self, mode: Mode) -> Result<(), CodecError> {
        self.out.write_bytes(&mode.to_u32().to_le_bytes())
    }

    fn write_null(&mut self) -> Result<(), CodecError> {
        self.out.write_bytes(&NULL_LEN.to_le_bytes())
    }

    fn write_type_name(&mut self, name: &str) -> Result<(), CodecError> {
        self.write_string(name)
    }

    fn write_tag(&mut self, tag: ObjectTag) -> Result<(), CodecError> {
        self.out.write_byte(tag.to_byte())
    }

    fn write_count(&mut self, count: i32) -> Result<(), CodecError> {
        self.out.write_bytes(&count.to_le_bytes())
    }

    fn write_index(&mut self, index: i32) -> Result<(), CodecError> {
        self.out.write_bytes(&index.to_le_bytes())
    }

    fn write_member_names(&mut self, names: &[&str]) -> Result<(), CodecError> {
        self.write_count(names.len() as i32)?;
        for name in names {
            self.write_string(name)?;
        }
        Ok(())
    }

    fn write_primitive(&mut self, value: &Value) -> Result<(), CodecError> {
        match value {
            Value::Bool(v) => self.out.write_byte(*v as u8),
            Value::Char(v) => self.out.write_bytes(&(*v as u32).to_le_bytes()),
            Value::I8(v) => self.out.write_bytes(&v.to_le_bytes()),
            Value::I16(v) => self.out.write_bytes(&v.to_le_bytes()),
            Value::I32(v) => self.out.write_bytes(&v.to_le_bytes()),
            Value::I64(v) => self.out.write_bytes(&v.to_le_bytes()),
            Value::U8(v) => self.out.write_bytes(&v.to_le_bytes()),
            Value::U16(v) => self.out.write_bytes(&v.to_le_bytes()),
            Value::U32(v) => self.out.write_bytes(&v.to_le_bytes()),
            Value::U64(v) => self.out.write_bytes(&v.to_le_bytes()),
            Value::F32(v) => self.out.write_bytes(&v.to_le_bytes()),
            Value::F64(v) => self.out.write_bytes(&v.to_le_bytes()),
            Value::Decimal(v) => self.out.write_bytes(&v.to_le_bytes()),
            Value::String(v) => self.write_string(v),
            Value::Guid(v) => self.out.write_bytes(v.as_bytes()),
            other => Err(not_a_leaf(other)),
        }
    }

    #[inline]
    fn end_occurrence(&mut self) -> Result<(), CodecError> {
        Ok(())
    }

    fn finish(&mut self) -> Result<u64, CodecError> {
        self.out.finish()
    }
}

// -----------------------------------------------------------------------------
// BinaryDecoder

/// Reads streams written by [`BinaryEncoder`].
pub struct BinaryDecoder<R: Read> {
    input: ByteReader<R>,
    limits: DecodeLimits,
}

impl<R: Read> BinaryDecoder<R> {
    pub fn new(input: ByteReader<R>, limits: DecodeLimits) -> Self {
        Self { input, limits }
    }

    fn read_i32(&mut self) -> Result<i32, CodecError> {
        Ok(i32::from_le_bytes(self.input.read_array()?))
    }

    /// Reads a length-prefixed UTF-16 string.
    ///
    /// The outer `Result` fails on structural errors, the inner one when the
    /// code units are not valid UTF-16.
    fn read_string(&mut self) -> Result<Option<Result<String, String>>, CodecError> {
        let len = i64::from_le_bytes(self.input.read_array()?);
        if len == NULL_LEN {
            return Ok(None);
        }
        if len < 0 {
            return Err(self.input.corrupt(format!("string length {len}")));
        }
        // Two bytes per code unit, computed before narrowing to `usize`.
        let max = self.limits.max_string_len;
        let too_long = || CodecError::LimitExceeded {
            what: "string length",
            len: len as u64,
            max: max as u64,
        };
        let units = usize::try_from(len).map_err(|_| too_long())?;
        limit("string length", units, max)?;
        let size = len
            .checked_mul(2)
            .and_then(|size| usize::try_from(size).ok())
            .ok_or_else(too_long)?;
        let bytes = self.input.read_bytes(size)?;
        let units: Vec<u16> = bytes
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        Ok(Some(String::from_utf16(&units).map_err(|err| err.to_string())))
    }
}

fn malformed(kind: PrimitiveKind, detail: impl Into<String>) -> CodecError {
    CodecError::Malformed {
        kind: kind.path(),
        detail: detail.into(),
    }
}

impl<R: Read> Decoder for BinaryDecoder<R> {
    fn read_mode(&mut self) -> Result<Mode, CodecError> {
        let code = u32::from_le_bytes(self.input.read_array()?);
        Mode::from_u32(code).ok_or_else(|| CodecError::UnknownMode(code.to_string()))
    }

    fn read_type_name(&mut self) -> Result<Option<String>, CodecError> {
        match self.read_string()? {
            None => Ok(None),
            Some(Ok(name)) => Ok(Some(name)),
            Some(Err(detail)) => Err(self.input.corrupt(format!("type name: {detail}"))),
        }
    }

    fn read_tag(&mut self) -> Result<ObjectTag, CodecError> {
        let byte = self.input.read_byte()?;
        ObjectTag::from_byte(byte).ok_or_else(|| CodecError::UnknownTag(format!("{byte:#04x}")))
    }

    fn read_count(&mut self) -> Result<i32, CodecError> {
        self.read_i32()
    }

    fn read_index(&mut self) -> Result<i32, CodecError> {
        self.read_i32()
    }

    fn read_member_names(&mut self) -> Result<Vec<String>, CodecError> {
        let count = self.read_i32()?;
        let count = usize::try_from(count).map_err(|_| self.input.corrupt(format!("member count {count}")))?;
        limit("member name list", count, self.limits.max_member_names)?;

        let mut names = Vec::with_capacity(count);
        for _ in 0..count {
            match self.read_string()? {
                Some(Ok(name)) => names.push(name),
                Some(Err(detail)) => return Err(self.input.corrupt(format!("member name: {detail}"))),
                None => return Err(self.input.corrupt("null member name")),
            }
        }
        Ok(names)
    }

    fn read_primitive(&mut self, kind: PrimitiveKind) -> Result<Value, CodecError> {
        let input = &mut self.input;
        Ok(match kind {
            PrimitiveKind::Bool => match input.read_byte()? {
                0 => Value::Bool(false),
                1 => Value::Bool(true),
                other => return Err(malformed(kind, format!("byte {other:#04x}"))),
            },
            PrimitiveKind::Char => {
                let code = u32::from_le_bytes(input.read_array()?);
                let ch = char::from_u32(code).ok_or_else(|| malformed(kind, format!("scalar {code:#x}")))?;
                Value::Char(ch)
            }
            PrimitiveKind::I8 => Value::I8(i8::from_le_bytes(input.read_array()?)),
            PrimitiveKind::I16 => Value::I16(i16::from_le_bytes(input.read_array()?)),
            PrimitiveKind::I32 => Value::I32(i32::from_le_bytes(input.read_array()?)),
            PrimitiveKind::I64 => Value::I64(i64::from_le_bytes(input.read_array()?)),
            PrimitiveKind::U8 => Value::U8(u8::from_le_bytes(input.read_array()?)),
            PrimitiveKind::U16 => Value::U16(u16::from_le_bytes(input.read_array()?)),
            PrimitiveKind::U32 => Value::U32(u32::from_le_bytes(input.read_array()?)),
            PrimitiveKind::U64 => Value::U64(u64::from_le_bytes(input.read_array()?)),
            PrimitiveKind::F32 => Value::F32(f32::from_le_bytes(input.read_array()?)),
            PrimitiveKind::F64 => Value::F64(f64::from_le_bytes(input.read_array()?)),
            PrimitiveKind::Decimal => {
                let decimal = Decimal::from_le_bytes(input.read_array()?).map_err(|err| malformed(kind, err.to_string()))?;
                Value::Decimal(decimal)
            }
            PrimitiveKind::Guid => Value::Guid(Uuid::from_bytes(input.read_array()?)),
            PrimitiveKind::String => match self.read_string()? {
                None => Value::Null,
                Some(Ok(s)) => Value::String(s),
                Some(Err(detail)) => return Err(malformed(kind, detail)),
            },
        })
    }

    #[inline]
    fn end_occurrence(&mut self) -> Result<(), CodecError> {
        Ok(())
    }

    #[inline]
    fn position(&self) -> u64 {
        self.input.position()
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use gs_reflect::Value;
    use gs_reflect::info::PrimitiveKind;
    use gs_reflect::value::Decimal;
    use uuid::Uuid;

    use super::{BinaryDecoder, BinaryEncoder};
    use crate::codec::{ByteReader, ByteWriter, DecodeLimits, Decoder, Encoder};
    use crate::{CodecError, Mode, ObjectTag};

    fn encode(f: impl FnOnce(&mut BinaryEncoder<&mut Vec<u8>>)) -> Vec<u8> {
        let mut out = Vec::new();
        let mut encoder = BinaryEncoder::new(ByteWriter::new(&mut out, 16));
        f(&mut encoder);
        encoder.finish().unwrap();
        drop(encoder);
        out
    }

    fn decoder(bytes: &[u8]) -> BinaryDecoder<&[u8]> {
        BinaryDecoder::new(ByteReader::new(bytes, 16), DecodeLimits::default())
    }

    #[test]
    fn layout() {
        let bytes = encode(|e| {
            e.write_mode(Mode::ByName).unwrap();
            e.write_null().unwrap();
            e.write_type_name("ab").unwrap();
            e.write_tag(ObjectTag::ObjectIndex).unwrap();
            e.write_index(7).unwrap();
            e.write_primitive(&Value::Char('é')).unwrap();
        });
        let mut expected = vec![1, 0, 0, 0];
        expected.extend([0xFF; 8]);
        expected.extend([2, 0, 0, 0, 0, 0, 0, 0, b'a', 0, b'b', 0]);
        expected.push(3);
        expected.extend([7, 0, 0, 0]);
        expected.extend([0xE9, 0, 0, 0]);
        assert_eq!(bytes, expected);
    }

    #[test]
    fn leaves_round_trip() {
        let values = [
            Value::Bool(true),
            Value::Char('\u{1F600}'),
            Value::I8(-8),
            Value::I16(i16::MIN),
            Value::I32(-32),
            Value::I64(i64::MAX),
            Value::U8(8),
            Value::U16(u16::MAX),
            Value::U32(32),
            Value::U64(u64::MAX),
            Value::F32(1.5),
            Value::F64(-0.25),
            Value::Decimal(Decimal::new(-12345, 3).unwrap()),
            Value::String("h\u{e9}llo \u{1F600}".into()),
            Value::Guid(Uuid::from_u128(0x0123_4567_89AB_CDEF_0123_4567_89AB_CDEF)),
        ];
        let bytes = encode(|e| {
            for value in &values {
                e.write_primitive(value).unwrap();
            }
            e.write_null().unwrap();
        });
        let mut d = decoder(&bytes);
        for value in &values {
            let kind = value.primitive_kind().unwrap();
            assert!(d.read_primitive(kind).unwrap().deep_eq(value));
        }
        assert!(d.read_primitive(PrimitiveKind::String).unwrap().is_null());
    }

    #[test]
    fn malformed_leaves_keep_alignment() {
        let mut bytes = vec![9];
        bytes.extend(0xD800u32.to_le_bytes());
        bytes.extend(5i32.to_le_bytes());
        let mut d = decoder(&bytes);
        assert!(matches!(d.read_primitive(PrimitiveKind::Bool), Err(CodecError::Malformed { .. })));
        assert!(matches!(d.read_primitive(PrimitiveKind::Char), Err(CodecError::Malformed { .. })));
        assert!(matches!(d.read_primitive(PrimitiveKind::I32), Ok(Value::I32(5))));
    }

    #[test]
    fn structural_errors() {
        assert!(matches!(decoder(&[3, 0, 0, 0]).read_mode(), Err(CodecError::UnknownMode(_))));
        assert!(matches!(decoder(&[9]).read_tag(), Err(CodecError::UnknownTag(_))));
        assert!(matches!(decoder(&[1, 0]).read_count(), Err(CodecError::UnexpectedEof)));

        let huge = 1i64 << 40;
        assert!(matches!(
            decoder(&huge.to_le_bytes()).read_type_name(),
            Err(CodecError::LimitExceeded { .. })
        ));
        assert!(matches!(
            decoder(&(-2i64).to_le_bytes()).read_type_name(),
            Err(CodecError::Corrupt { .. })
        ));
    }

    #[test]
    fn unbounded_string_limit_still_rejects_oversized_lengths() {
        let limits = DecodeLimits {
            max_string_len: usize::MAX,
            ..DecodeLimits::default()
        };
        let bytes = i64::MAX.to_le_bytes();
        let mut d = BinaryDecoder::new(ByteReader::new(&bytes[..], 16), limits);
        assert!(matches!(d.read_type_name(), Err(CodecError::LimitExceeded { .. })));
    }

    #[test]
    fn member_names() {
        let bytes = encode(|e| e.write_member_names(&["x", "yy"]).unwrap());
        assert_eq!(decoder(&bytes).read_member_names().unwrap(), ["x", "yy"]);

        let limits = DecodeLimits {
            max_member_names: 1,
            ..DecodeLimits::default()
        };
        let mut d = BinaryDecoder::new(ByteReader::new(&bytes[..], 16), limits);
        assert!(matches!(d.read_member_names(), Err(CodecError::LimitExceeded { .. })));
    }
}
