use std::io::{Read, Write};

use gs_reflect::Value;
use gs_reflect::info::PrimitiveKind;
use gs_reflect::value::Decimal;
use uuid::Uuid;

use super::{ByteReader, ByteWriter, DecodeLimits, Decoder, Encoder, limit, not_a_leaf};
use crate::{CodecError, Mode, ObjectTag};

const MODE_PREFIX: &[u8] = b"Mode=";
const NULL_TOKEN: &[u8] = b"null;";

/// Longest scalar token (numbers, GUIDs, booleans) before the stream is
/// considered corrupt.
const MAX_TOKEN_LEN: usize = 128;

// -----------------------------------------------------------------------------
// TextEncoder

/// Human readable encoding. Every scalar ends with `;`, every occurrence
/// with a line break.
pub struct TextEncoder<W: Write> {
    out: ByteWriter<W>,
}

impl<W: Write> TextEncoder<W> {
    pub fn new(out: ByteWriter<W>) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }

    #[inline]
    fn token(&mut self, text: &str) -> Result<(), CodecError> {
        self.out.write_bytes(text.as_bytes())
    }

    fn int(&mut self, value: i128) -> Result<(), CodecError> {
        if value < 0 {
            self.token(&format!("-0x{:X};", value.unsigned_abs()))
        } else {
            self.token(&format!("0x{value:X};"))
        }
    }

    fn string(&mut self, s: &str) -> Result<(), CodecError> {
        let mut text = String::with_capacity(s.len() + 3);
        text.push('"');
        for ch in s.chars() {
            escape_into(&mut text, ch);
        }
        text.push_str("\";");
        self.token(&text)
    }
}

fn escape_into(text: &mut String, ch: char) {
    match ch {
        '\\' => text.push_str("\\\\"),
        '"' => text.push_str("\\\""),
        '\'' => text.push_str("\\'"),
        '\n' => text.push_str("\\n"),
        '\r' => text.push_str("\\r"),
        '\t' => text.push_str("\\t"),
        '\0' => text.push_str("\\0"),
        other => text.push(other),
    }
}

impl<W: Write> Encoder for TextEncoder<W> {
    fn write_mode(&mut self, mode: Mode) -> Result<(), CodecError> {
        self.token(&format!("Mode={}\n", mode.name()))
    }

    fn write_null(&mut self) -> Result<(), CodecError> {
        self.out.write_bytes(NULL_TOKEN)
    }

    fn write_type_name(&mut self, name: &str) -> Result<(), CodecError> {
        self.token(&format!("{{{name}}}"))
    }

    fn write_tag(&mut self, tag: ObjectTag) -> Result<(), CodecError> {
        match tag.sigil() {
            Some(sigil) => self.out.write_bytes(&[b' ', sigil]),
            None => self.out.write_byte(b'\n'),
        }
    }

    fn write_count(&mut self, count: i32) -> Result<(), CodecError> {
        self.int(count as i128)
    }

    fn write_index(&mut self, index: i32) -> Result<(), CodecError> {
        self.int(index as i128)
    }

    fn write_member_names(&mut self, names: &[&str]) -> Result<(), CodecError> {
        self.int(names.len() as i128)?;
        for name in names {
            self.string(name)?;
        }
        Ok(())
    }

    fn write_primitive(&mut self, value: &Value) -> Result<(), CodecError> {
        match value {
            Value::Bool(v) => self.token(if *v { "true;" } else { "false;" }),
            Value::Char(v) => {
                let mut text = String::from("'");
                escape_into(&mut text, *v);
                text.push_str("';");
                self.token(&text)
            }
            // `Debug` keeps the exponent form, `Display` would not.
            Value::F32(v) => self.token(&format!("{v:?}f;")),
            Value::F64(v) => self.token(&format!("{v:?}d;")),
            Value::Decimal(v) => self.token(&format!("{v}m;")),
            Value::String(v) => self.string(v),
            Value::Guid(v) => self.token(&format!("{{{}}};", v.hyphenated())),
            other => match other.as_i128() {
                Some(int) if other.primitive_kind().is_some() => self.int(int),
                _ => Err(not_a_leaf(other)),
            },
        }
    }

    fn end_occurrence(&mut self) -> Result<(), CodecError> {
        self.out.write_byte(b'\n')
    }

    fn finish(&mut self) -> Result<u64, CodecError> {
        self.out.finish()
    }
}

// -----------------------------------------------------------------------------
// TextDecoder

/// Reads streams written by [`TextEncoder`].
pub struct TextDecoder<R: Read> {
    input: ByteReader<R>,
    limits: DecodeLimits,
}

impl<R: Read> TextDecoder<R> {
    pub fn new(input: ByteReader<R>, limits: DecodeLimits) -> Self {
        Self { input, limits }
    }

    fn expect(&mut self, expected: &[u8]) -> Result<(), CodecError> {
        let found = self.input.read_bytes(expected.len())?;
        if found != expected {
            let detail = format!(
                "expected `{}`, found `{}`",
                String::from_utf8_lossy(expected).escape_debug(),
                String::from_utf8_lossy(found).escape_debug(),
            );
            return Err(self.input.corrupt(detail));
        }
        Ok(())
    }

    fn peek(&mut self) -> Result<u8, CodecError> {
        self.input.peek_byte()?.ok_or(CodecError::UnexpectedEof)
    }

    /// Reads up to and including `end`, returning the bytes before it.
    fn read_until(&mut self, end: u8, max: usize) -> Result<Vec<u8>, CodecError> {
        let mut bytes = Vec::new();
        loop {
            let byte = self.input.read_byte()?;
            if byte == end {
                return Ok(bytes);
            }
            if bytes.len() == max {
                return Err(self.input.corrupt(format!(
                    "no `{}` within {max} bytes",
                    (end as char).escape_debug()
                )));
            }
            bytes.push(byte);
        }
    }

    /// Reads a scalar token up to its `;`.
    fn scalar(&mut self) -> Result<String, CodecError> {
        let bytes = self.read_until(b';', MAX_TOKEN_LEN)?;
        String::from_utf8(bytes).map_err(|_| self.input.corrupt("token is not UTF-8"))
    }

    /// Reads an integer token used for structure, where a bad token is fatal.
    fn structural_int(&mut self, what: &str) -> Result<i32, CodecError> {
        let token = self.scalar()?;
        parse_int(&token)
            .and_then(|v| i32::try_from(v).ok())
            .ok_or_else(|| self.input.corrupt(format!("{what} `{token}`")))
    }

    /// Reads one possibly escaped character of a quoted literal.
    ///
    /// Returns `Ok(None)` on an unescaped `quote`, `Err(detail)` in the inner
    /// result for an unknown escape or invalid UTF-8, consuming it anyway.
    fn quoted_char(&mut self, quote: u8) -> Result<Option<Result<char, String>>, CodecError> {
        let lead = self.input.read_byte()?;
        if lead == quote {
            return Ok(None);
        }
        if lead == b'\\' {
            let escaped = self.input.read_byte()?;
            return Ok(Some(match escaped {
                b'\\' => Ok('\\'),
                b'"' => Ok('"'),
                b'\'' => Ok('\''),
                b'n' => Ok('\n'),
                b'r' => Ok('\r'),
                b't' => Ok('\t'),
                b'0' => Ok('\0'),
                other => Err(format!("unknown escape `\\{}`", (other as char).escape_debug())),
            }));
        }
        let width = match lead {
            0x00..=0x7F => 1,
            0xC0..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF7 => 4,
            _ => return Ok(Some(Err(format!("invalid UTF-8 lead byte {lead:#04x}")))),
        };
        let mut buf = [lead, 0, 0, 0];
        for slot in &mut buf[1..width] {
            let byte = self.input.read_byte()?;
            // A quote inside a sequence would desynchronise the literal.
            if byte == quote {
                return Err(self.input.corrupt("truncated UTF-8 sequence"));
            }
            *slot = byte;
        }
        Ok(Some(
            core::str::from_utf8(&buf[..width])
                .ok()
                .and_then(|s| s.chars().next())
                .ok_or_else(|| "invalid UTF-8 sequence".to_owned()),
        ))
    }

    /// Reads the rest of a `"..."` literal after the opening quote.
    fn string_body(&mut self) -> Result<Result<String, String>, CodecError> {
        let mut text = String::new();
        let mut units = 0usize;
        let mut error = None;
        while let Some(ch) = self.quoted_char(b'"')? {
            match ch {
                Ok(ch) => {
                    units += ch.len_utf16();
                    limit("string length", units, self.limits.max_string_len)?;
                    text.push(ch);
                }
                Err(detail) => error = error.or(Some(detail)),
            }
        }
        self.expect(b";")?;
        Ok(match error {
            Some(detail) => Err(detail),
            None => Ok(text),
        })
    }

    fn read_string(&mut self) -> Result<Value, CodecError> {
        match self.peek()? {
            b'n' => {
                self.expect(NULL_TOKEN)?;
                Ok(Value::Null)
            }
            b'"' => {
                self.input.read_byte()?;
                self.string_body()?
                    .map(Value::String)
                    .map_err(|detail| malformed(PrimitiveKind::String, detail))
            }
            other => Err(self.input.corrupt(format!(
                "expected a string literal, found `{}`",
                (other as char).escape_debug()
            ))),
        }
    }

    fn read_char(&mut self) -> Result<Value, CodecError> {
        self.expect(b"'")?;
        let ch = self
            .quoted_char(b'\'')?
            .ok_or_else(|| self.input.corrupt("empty character literal"))?;
        self.expect(b"';")?;
        ch.map(Value::Char)
            .map_err(|detail| malformed(PrimitiveKind::Char, detail))
    }
}

fn malformed(kind: PrimitiveKind, detail: impl Into<String>) -> CodecError {
    CodecError::Malformed {
        kind: kind.path(),
        detail: detail.into(),
    }
}

/// Parses `0x1F` or `-0x1F`.
fn parse_int(token: &str) -> Option<i128> {
    let (negative, rest) = match token.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, token),
    };
    let digits = rest.strip_prefix("0x")?;
    // `from_str_radix` accepts a sign of its own.
    if digits.starts_with(['+', '-']) {
        return None;
    }
    let magnitude = i128::from_str_radix(digits, 16).ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

fn parse_scalar(kind: PrimitiveKind, token: &str) -> Option<Value> {
    match kind {
        PrimitiveKind::Bool => match token {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => None,
        },
        PrimitiveKind::F32 => token.strip_suffix('f')?.parse().ok().map(Value::F32),
        PrimitiveKind::F64 => token.strip_suffix('d')?.parse().ok().map(Value::F64),
        PrimitiveKind::Decimal => token
            .strip_suffix('m')?
            .parse::<Decimal>()
            .ok()
            .map(Value::Decimal),
        PrimitiveKind::Guid => {
            let inner = token.strip_prefix('{')?.strip_suffix('}')?;
            Uuid::try_parse(inner).ok().map(Value::Guid)
        }
        _ => Value::from_int(kind, parse_int(token)?),
    }
}

impl<R: Read> Decoder for TextDecoder<R> {
    fn read_mode(&mut self) -> Result<Mode, CodecError> {
        self.expect(MODE_PREFIX)?;
        let bytes = self.read_until(b'\n', 32)?;
        let line = String::from_utf8_lossy(&bytes);
        let name: &str = line.strip_suffix('\r').unwrap_or(&line);
        Mode::from_name(name).ok_or_else(|| CodecError::UnknownMode(name.to_owned()))
    }

    fn read_type_name(&mut self) -> Result<Option<String>, CodecError> {
        match self.peek()? {
            b'n' => {
                self.expect(NULL_TOKEN)?;
                Ok(None)
            }
            b'{' => {
                self.input.read_byte()?;
                let bytes = self.read_until(b'}', self.limits.max_string_len)?;
                let name = String::from_utf8(bytes).map_err(|_| self.input.corrupt("type name is not UTF-8"))?;
                Ok(Some(name))
            }
            other => Err(self.input.corrupt(format!(
                "expected a type name, found `{}`",
                (other as char).escape_debug()
            ))),
        }
    }

    fn read_tag(&mut self) -> Result<ObjectTag, CodecError> {
        match self.input.read_byte()? {
            b'\n' => Ok(ObjectTag::ObjectReference),
            b'\r' => {
                self.expect(b"\n")?;
                Ok(ObjectTag::ObjectReference)
            }
            b' ' => {
                let sigil = self.input.read_byte()?;
                ObjectTag::from_sigil(sigil).ok_or_else(|| CodecError::UnknownTag(format!(" {}", sigil as char)))
            }
            other => Err(CodecError::UnknownTag((other as char).escape_debug().to_string())),
        }
    }

    fn read_count(&mut self) -> Result<i32, CodecError> {
        self.structural_int("count")
    }

    fn read_index(&mut self) -> Result<i32, CodecError> {
        self.structural_int("index")
    }

    fn read_member_names(&mut self) -> Result<Vec<String>, CodecError> {
        let count = self.structural_int("member count")?;
        let count = usize::try_from(count).map_err(|_| self.input.corrupt(format!("member count {count}")))?;
        limit("member name list", count, self.limits.max_member_names)?;

        let mut names = Vec::with_capacity(count);
        for _ in 0..count {
            match self.read_string() {
                Ok(Value::String(name)) => names.push(name),
                Ok(_) => return Err(self.input.corrupt("null member name")),
                Err(CodecError::Malformed { detail, .. }) => {
                    return Err(self.input.corrupt(format!("member name: {detail}")));
                }
                Err(err) => return Err(err),
            }
        }
        Ok(names)
    }

    fn read_primitive(&mut self, kind: PrimitiveKind) -> Result<Value, CodecError> {
        match kind {
            PrimitiveKind::String => self.read_string(),
            PrimitiveKind::Char => self.read_char(),
            _ => {
                let token = self.scalar()?;
                parse_scalar(kind, &token).ok_or_else(|| malformed(kind, format!("`{token}`")))
            }
        }
    }

    fn end_occurrence(&mut self) -> Result<(), CodecError> {
        match self.input.read_byte()? {
            b'\n' => Ok(()),
            b'\r' => self.expect(b"\n"),
            other => Err(self.input.corrupt(format!(
                "expected end of occurrence, found `{}`",
                (other as char).escape_debug()
            ))),
        }
    }

    #[inline]
    fn position(&self) -> u64 {
        self.input.position()
    }
}

// -----------------------------------------------------------------------------
// Tests
