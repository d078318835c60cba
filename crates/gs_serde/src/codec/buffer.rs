use std::io::{self, Read, Write};

use crate::CodecError;

// -----------------------------------------------------------------------------
// ByteWriter

/// Buffered writer over any [`Write`].
///
/// Bytes are collected in a fixed-size buffer and flushed when the next
/// field does not fit. A field larger than the whole buffer grows it.
pub struct ByteWriter<W: Write> {
    inner: W,
    buf: Vec<u8>,
    capacity: usize,
    written: u64,
}

impl<W: Write> ByteWriter<W> {
    pub fn new(inner: W, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner,
            buf: Vec::with_capacity(capacity),
            capacity,
            written: 0,
        }
    }

    /// Appends `bytes`, flushing first if they do not fit.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), CodecError> {
        if self.buf.len() + bytes.len() > self.capacity {
            self.flush_buffer()?;
            if bytes.len() > self.capacity {
                self.capacity = bytes.len();
                self.buf.reserve(self.capacity);
            }
        }
        self.buf.extend_from_slice(bytes);
        self.written += bytes.len() as u64;
        Ok(())
    }

    #[inline]
    pub fn write_byte(&mut self, byte: u8) -> Result<(), CodecError> {
        self.write_bytes(&[byte])
    }

    fn flush_buffer(&mut self) -> Result<(), CodecError> {
        if !self.buf.is_empty() {
            self.inner.write_all(&self.buf)?;
            self.buf.clear();
        }
        Ok(())
    }

    /// Writes out everything buffered and flushes the underlying writer.
    ///
    /// Returns the number of bytes written since creation.
    pub fn finish(&mut self) -> Result<u64, CodecError> {
        self.flush_buffer()?;
        self.inner.flush()?;
        Ok(self.written)
    }

    /// Bytes written so far, buffered ones included.
    #[inline]
    pub fn position(&self) -> u64 {
        self.written
    }

    /// Current buffer capacity.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the underlying writer. Buffered bytes not yet flushed are lost.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

// -----------------------------------------------------------------------------
// ByteReader

/// Buffered reader over any [`Read`].
///
/// When a field is not fully buffered the unread bytes are moved to the
/// front of the buffer and the rest is pulled from the stream.
pub struct ByteReader<R: Read> {
    inner: R,
    buf: Vec<u8>,
    pos: usize,
    end: usize,
    consumed: u64,
}

impl<R: Read> ByteReader<R> {
    pub fn new(inner: R, capacity: usize) -> Self {
        Self {
            inner,
            buf: vec![0; capacity.max(1)],
            pos: 0,
            end: 0,
            consumed: 0,
        }
    }

    /// Makes sure at least `n` unread bytes are buffered.
    fn fill(&mut self, n: usize) -> Result<(), CodecError> {
        if self.end - self.pos >= n {
            return Ok(());
        }
        if self.pos > 0 {
            self.buf.copy_within(self.pos..self.end, 0);
            self.end -= self.pos;
            self.pos = 0;
        }
        if self.buf.len() < n {
            self.buf.resize(n, 0);
        }
        while self.end < n {
            match self.inner.read(&mut self.buf[self.end..]) {
                Ok(0) => return Err(CodecError::UnexpectedEof),
                Ok(read) => self.end += read,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
                Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => {
                    return Err(CodecError::UnexpectedEof);
                }
                Err(err) => return Err(err.into()),
            }
        }
        Ok(())
    }

    /// Consumes exactly `n` bytes.
    pub fn read_bytes(&mut self, n: usize) -> Result<&[u8], CodecError> {
        self.fill(n)?;
        let start = self.pos;
        self.pos += n;
        self.consumed += n as u64;
        Ok(&self.buf[start..self.pos])
    }

    /// Consumes exactly `N` bytes into an array.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], CodecError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    #[inline]
    pub fn read_byte(&mut self) -> Result<u8, CodecError> {
        let [byte] = self.read_array::<1>()?;
        Ok(byte)
    }

    /// Returns the next byte without consuming it, `None` at end of stream.
    pub fn peek_byte(&mut self) -> Result<Option<u8>, CodecError> {
        match self.fill(1) {
            Ok(()) => Ok(Some(self.buf[self.pos])),
            Err(CodecError::UnexpectedEof) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Bytes consumed so far.
    #[inline]
    pub fn position(&self) -> u64 {
        self.consumed
    }

    /// Builds a [`CodecError::Corrupt`] at the current position.
    pub fn corrupt(&self, detail: impl Into<String>) -> CodecError {
        CodecError::Corrupt {
            position: self.consumed,
            detail: detail.into(),
        }
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::{ByteReader, ByteWriter};
    use crate::CodecError;

    #[test]
    fn writer_flushes_and_grows() {
        let mut out = Vec::new();
        let mut writer = ByteWriter::new(&mut out, 4);
        writer.write_bytes(b"abc").unwrap();
        writer.write_bytes(b"de").unwrap();
        writer.write_bytes(b"0123456789").unwrap();
        assert_eq!(writer.capacity(), 10);
        assert_eq!(writer.finish().unwrap(), 15);
        assert_eq!(out, b"abcde0123456789");
    }

    #[test]
    fn reader_refills_across_fields() {
        // A one byte read at a time exercises the shifting path.
        struct Trickle<'a>(&'a [u8]);

        impl std::io::Read for Trickle<'_> {
            fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
                match (self.0.split_first(), buf.first_mut()) {
                    (Some((byte, rest)), Some(slot)) => {
                        *slot = *byte;
                        self.0 = rest;
                        Ok(1)
                    }
                    _ => Ok(0),
                }
            }
        }

        let mut reader = ByteReader::new(Trickle(b"hello world"), 3);
        assert_eq!(reader.read_bytes(2).unwrap(), b"he");
        assert_eq!(reader.peek_byte().unwrap(), Some(b'l'));
        assert_eq!(reader.read_bytes(7).unwrap(), b"llo wor");
        assert_eq!(reader.read_array::<2>().unwrap(), *b"ld");
        assert_eq!(reader.position(), 11);
        assert_eq!(reader.peek_byte().unwrap(), None);
        assert!(matches!(reader.read_byte(), Err(CodecError::UnexpectedEof)));
    }
}
