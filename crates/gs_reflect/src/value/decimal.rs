use core::fmt;
use core::str::FromStr;

use thiserror::Error;

/// Largest scale a [`Decimal`] can carry.
pub const MAX_SCALE: u32 = 28;

const MANTISSA_LIMIT: u128 = 1 << 96;
const SIGN_BIT: u32 = 1 << 31;
const SCALE_SHIFT: u32 = 16;
const FLAGS_MASK: u32 = SIGN_BIT | (0xFF << SCALE_SHIFT);

/// An error building or parsing a [`Decimal`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DecimalError {
    #[error("decimal mantissa does not fit in 96 bits")]
    Overflow,
    #[error("decimal scale {0} exceeds {MAX_SCALE}")]
    Scale(u32),
    #[error("invalid decimal flags {0:#010x}")]
    Flags(u32),
    #[error("invalid decimal literal `{0}`")]
    Syntax(String),
}

// -----------------------------------------------------------------------------
// Decimal

/// A 128-bit decimal floating point number.
///
/// The value is `mantissa / 10^scale` with a 96-bit unsigned mantissa, a
/// sign bit and a scale in `0..=28`. The layout is four 32-bit words,
/// `lo, mid, hi, flags`, the scale stored in bits 16 to 23 of `flags` and
/// the sign in bit 31.
///
/// Trailing zeros are significant: `1.0` and `1.00` are different values
/// with different representations, and both survive a round trip.
///
/// # Examples
///
/// ```
/// use gs_reflect::value::Decimal;
///
/// let price: Decimal = "-12.50".parse().unwrap();
/// assert_eq!(price.mantissa(), -1250);
/// assert_eq!(price.scale(), 2);
/// assert_eq!(price.to_string(), "-12.50");
///
/// let bits = price.to_bits();
/// assert_eq!(Decimal::from_bits(bits).unwrap(), price);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Decimal {
    lo: u32,
    mid: u32,
    hi: u32,
    flags: u32,
}

impl Decimal {
    /// Zero with scale zero.
    pub const ZERO: Self = Self {
        lo: 0,
        mid: 0,
        hi: 0,
        flags: 0,
    };

    /// Creates `mantissa / 10^scale`.
    pub fn new(mantissa: i128, scale: u32) -> Result<Self, DecimalError> {
        if scale > MAX_SCALE {
            return Err(DecimalError::Scale(scale));
        }
        let magnitude = mantissa.unsigned_abs();
        if magnitude >= MANTISSA_LIMIT {
            return Err(DecimalError::Overflow);
        }
        let mut flags = scale << SCALE_SHIFT;
        if mantissa < 0 {
            flags |= SIGN_BIT;
        }
        Ok(Self {
            lo: magnitude as u32,
            mid: (magnitude >> 32) as u32,
            hi: (magnitude >> 64) as u32,
            flags,
        })
    }

    /// The signed mantissa.
    pub fn mantissa(&self) -> i128 {
        let magnitude = (self.lo as i128) | ((self.mid as i128) << 32) | ((self.hi as i128) << 64);
        if self.is_negative() { -magnitude } else { magnitude }
    }

    /// Number of digits after the decimal point.
    #[inline]
    pub fn scale(&self) -> u32 {
        (self.flags >> SCALE_SHIFT) & 0xFF
    }

    /// Returns `true` if the sign bit is set.
    #[inline]
    pub fn is_negative(&self) -> bool {
        self.flags & SIGN_BIT != 0
    }

    /// The four words `lo, mid, hi, flags`.
    #[inline]
    pub fn to_bits(&self) -> [u32; 4] {
        [self.lo, self.mid, self.hi, self.flags]
    }

    /// Rebuilds a decimal from its four words, validating the flags.
    pub fn from_bits(bits: [u32; 4]) -> Result<Self, DecimalError> {
        let [lo, mid, hi, flags] = bits;
        if flags & !FLAGS_MASK != 0 {
            return Err(DecimalError::Flags(flags));
        }
        let this = Self { lo, mid, hi, flags };
        if this.scale() > MAX_SCALE {
            return Err(DecimalError::Scale(this.scale()));
        }
        Ok(this)
    }

    /// The 16-byte little endian encoding of [`to_bits`](Self::to_bits).
    pub fn to_le_bytes(&self) -> [u8; 16] {
        let mut out = [0u8; 16];
        for (chunk, word) in out.chunks_exact_mut(4).zip(self.to_bits()) {
            chunk.copy_from_slice(&word.to_le_bytes());
        }
        out
    }

    /// Inverse of [`to_le_bytes`](Self::to_le_bytes).
    pub fn from_le_bytes(bytes: [u8; 16]) -> Result<Self, DecimalError> {
        let mut bits = [0u32; 4];
        for (word, chunk) in bits.iter_mut().zip(bytes.chunks_exact(4)) {
            *word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
        Self::from_bits(bits)
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.mantissa().unsigned_abs().to_string();
        let scale = self.scale() as usize;
        let sign = if self.is_negative() { "-" } else { "" };
        if scale == 0 {
            return write!(f, "{sign}{digits}");
        }
        let padded = if digits.len() <= scale {
            format!("{}{}", "0".repeat(scale + 1 - digits.len()), digits)
        } else {
            digits
        };
        let (int, frac) = padded.split_at(padded.len() - scale);
        write!(f, "{sign}{int}.{frac}")
    }
}

impl fmt::Debug for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Decimal({self})")
    }
}

impl FromStr for Decimal {
    type Err = DecimalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let syntax = || DecimalError::Syntax(s.into());
        let (negative, body) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s.strip_prefix('+').unwrap_or(s)),
        };
        let (int, frac) = body.split_once('.').unwrap_or((body, ""));
        if int.is_empty() && frac.is_empty() {
            return Err(syntax());
        }
        if !int.bytes().chain(frac.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(syntax());
        }

        let mut magnitude: u128 = 0;
        for digit in int.bytes().chain(frac.bytes()) {
            magnitude = magnitude
                .checked_mul(10)
                .and_then(|m| m.checked_add((digit - b'0') as u128))
                .filter(|m| *m < MANTISSA_LIMIT)
                .ok_or(DecimalError::Overflow)?;
        }

        let scale = u32::try_from(frac.len()).map_err(|_| DecimalError::Scale(u32::MAX))?;
        let mut this = Self::new(magnitude as i128, scale)?;
        if negative {
            this.flags |= SIGN_BIT;
        }
        Ok(this)
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::{Decimal, DecimalError};

    #[test]
    fn display_pads_small_values() {
        assert_eq!(Decimal::new(5, 3).unwrap().to_string(), "0.005");
        assert_eq!(Decimal::new(0, 2).unwrap().to_string(), "0.00");
        assert_eq!(Decimal::new(-7, 0).unwrap().to_string(), "-7");
        assert_eq!(Decimal::new(123456, 2).unwrap().to_string(), "1234.56");
    }

    #[test]
    fn parse_keeps_scale() {
        let a: Decimal = "1.0".parse().unwrap();
        let b: Decimal = "1.00".parse().unwrap();
        assert_ne!(a, b);
        assert_eq!(b.to_string(), "1.00");
        assert_eq!(".5".parse::<Decimal>().unwrap().to_string(), "0.5");
    }

    #[test]
    fn limits() {
        let max = (1i128 << 96) - 1;
        assert!(Decimal::new(max, 0).is_ok());
        assert_eq!(Decimal::new(max + 1, 0), Err(DecimalError::Overflow));
        assert_eq!(Decimal::new(1, 29), Err(DecimalError::Scale(29)));
        assert!(matches!("1.2.3".parse::<Decimal>(), Err(DecimalError::Syntax(_))));
        assert!(matches!("".parse::<Decimal>(), Err(DecimalError::Syntax(_))));
    }

    #[test]
    fn byte_layout() {
        let value = Decimal::new(-1, 1).unwrap();
        let bytes = value.to_le_bytes();
        assert_eq!(&bytes[..4], &[1, 0, 0, 0]);
        assert_eq!(&bytes[12..], &[0, 0, 1, 0x80]);
        assert_eq!(Decimal::from_le_bytes(bytes).unwrap(), value);

        let mut bad = bytes;
        bad[12] = 1;
        assert!(matches!(Decimal::from_le_bytes(bad), Err(DecimalError::Flags(_))));
    }
}
