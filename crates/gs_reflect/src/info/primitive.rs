use core::fmt;

use serde::{Deserialize, Serialize};

use crate::info::TypeNameDescriptor;

/// Component name shared by every built-in type.
pub const CORE_COMPONENT: &str = "core";

/// Path of the built-in `object` type, the declared type of a dynamic slot.
pub const OBJECT_PATH: &str = "core.object";

// -----------------------------------------------------------------------------
// PrimitiveKind

/// The closed set of leaf types the wire codec encodes directly.
///
/// Every kind owns a type name in the [`CORE_COMPONENT`] component, which is
/// what a stream carries when a primitive is stored in a dynamic slot.
///
/// # Examples
///
/// ```
/// use gs_reflect::info::PrimitiveKind;
///
/// assert_eq!(PrimitiveKind::I32.path(), "core.i32");
/// assert_eq!(
///     PrimitiveKind::I32.type_name(),
///     "core.i32, core, Version=0.0.0, Culture=neutral, Token=null",
/// );
/// assert_eq!(PrimitiveKind::from_path("core.guid"), Some(PrimitiveKind::Guid));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveKind {
    Bool,
    Char,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    Decimal,
    String,
    Guid,
}

impl PrimitiveKind {
    /// All kinds, in registration order.
    pub const ALL: [PrimitiveKind; 15] = [
        Self::Bool,
        Self::Char,
        Self::I8,
        Self::I16,
        Self::I32,
        Self::I64,
        Self::U8,
        Self::U16,
        Self::U32,
        Self::U64,
        Self::F32,
        Self::F64,
        Self::Decimal,
        Self::String,
        Self::Guid,
    ];

    /// The dotted path of this kind's type name.
    pub const fn path(self) -> &'static str {
        match self {
            Self::Bool => "core.bool",
            Self::Char => "core.char",
            Self::I8 => "core.i8",
            Self::I16 => "core.i16",
            Self::I32 => "core.i32",
            Self::I64 => "core.i64",
            Self::U8 => "core.u8",
            Self::U16 => "core.u16",
            Self::U32 => "core.u32",
            Self::U64 => "core.u64",
            Self::F32 => "core.f32",
            Self::F64 => "core.f64",
            Self::Decimal => "core.decimal",
            Self::String => "core.string",
            Self::Guid => "core.guid",
        }
    }

    /// Inverse of [`PrimitiveKind::path`].
    pub fn from_path(path: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.path() == path)
    }

    /// The five-part name descriptor of this kind.
    pub fn descriptor(self) -> TypeNameDescriptor {
        TypeNameDescriptor::new(self.path(), CORE_COMPONENT)
    }

    /// The full five-part type name of this kind.
    pub fn type_name(self) -> String {
        self.descriptor().full_name()
    }

    /// Returns `true` if the kind admits a null value.
    #[inline]
    pub const fn is_nullable(self) -> bool {
        matches!(self, Self::String)
    }

    /// Returns the integer width if this kind is an integer.
    pub const fn int_width(self) -> Option<IntWidth> {
        match self {
            Self::I8 => Some(IntWidth::I8),
            Self::I16 => Some(IntWidth::I16),
            Self::I32 => Some(IntWidth::I32),
            Self::I64 => Some(IntWidth::I64),
            Self::U8 => Some(IntWidth::U8),
            Self::U16 => Some(IntWidth::U16),
            Self::U32 => Some(IntWidth::U32),
            Self::U64 => Some(IntWidth::U64),
            _ => None,
        }
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

// -----------------------------------------------------------------------------
// IntWidth

/// Backing integer of an enum type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntWidth {
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
}

impl IntWidth {
    /// All widths.
    pub const ALL: [IntWidth; 8] = [
        Self::I8,
        Self::I16,
        Self::I32,
        Self::I64,
        Self::U8,
        Self::U16,
        Self::U32,
        Self::U64,
    ];

    /// The primitive kind with the same encoding.
    pub const fn kind(self) -> PrimitiveKind {
        match self {
            Self::I8 => PrimitiveKind::I8,
            Self::I16 => PrimitiveKind::I16,
            Self::I32 => PrimitiveKind::I32,
            Self::I64 => PrimitiveKind::I64,
            Self::U8 => PrimitiveKind::U8,
            Self::U16 => PrimitiveKind::U16,
            Self::U32 => PrimitiveKind::U32,
            Self::U64 => PrimitiveKind::U64,
        }
    }

    /// Size in bytes.
    pub const fn size(self) -> usize {
        match self {
            Self::I8 | Self::U8 => 1,
            Self::I16 | Self::U16 => 2,
            Self::I32 | Self::U32 => 4,
            Self::I64 | Self::U64 => 8,
        }
    }

    /// Smallest representable value.
    pub const fn min(self) -> i128 {
        match self {
            Self::I8 => i8::MIN as i128,
            Self::I16 => i16::MIN as i128,
            Self::I32 => i32::MIN as i128,
            Self::I64 => i64::MIN as i128,
            Self::U8 | Self::U16 | Self::U32 | Self::U64 => 0,
        }
    }

    /// Largest representable value.
    pub const fn max(self) -> i128 {
        match self {
            Self::I8 => i8::MAX as i128,
            Self::I16 => i16::MAX as i128,
            Self::I32 => i32::MAX as i128,
            Self::I64 => i64::MAX as i128,
            Self::U8 => u8::MAX as i128,
            Self::U16 => u16::MAX as i128,
            Self::U32 => u32::MAX as i128,
            Self::U64 => u64::MAX as i128,
        }
    }

    /// Returns `true` if `value` fits this width.
    #[inline]
    pub const fn contains(self, value: i128) -> bool {
        value >= self.min() && value <= self.max()
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::{IntWidth, PrimitiveKind};

    #[test]
    fn paths_are_unique_and_invertible() {
        for kind in PrimitiveKind::ALL {
            assert_eq!(PrimitiveKind::from_path(kind.path()), Some(kind));
        }
        assert_eq!(PrimitiveKind::from_path("core.object"), None);
    }

    #[test]
    fn int_width_ranges() {
        assert!(IntWidth::U8.contains(255));
        assert!(!IntWidth::U8.contains(256));
        assert!(IntWidth::I64.contains(i64::MIN as i128));
        assert!(IntWidth::U64.contains(u64::MAX as i128));
        assert!(!IntWidth::U64.contains(-1));
        for width in IntWidth::ALL {
            assert_eq!(width.kind().int_width(), Some(width));
        }
    }
}
