use uuid::Uuid;

use crate::info::{PrimitiveKind, TypeHandle};
use crate::value::{Decimal, DynamicObject, ObjectRef};

// -----------------------------------------------------------------------------
// EnumValue

/// A value of an enum type.
#[derive(Debug, Clone)]
pub struct EnumValue {
    ty: TypeHandle,
    value: i128,
}

impl EnumValue {
    /// Creates an enum value. The value is not checked against the variants.
    #[inline]
    pub fn new(ty: TypeHandle, value: i128) -> Self {
        Self { ty, value }
    }

    #[inline]
    pub fn ty(&self) -> &TypeHandle {
        &self.ty
    }

    /// The backing integer.
    #[inline]
    pub fn value(&self) -> i128 {
        self.value
    }

    /// Name of the matching variant, if any.
    pub fn variant(&self) -> Option<&str> {
        self.ty.as_enum().and_then(|info| info.variant_name(self.value))
    }
}

// -----------------------------------------------------------------------------
// Value

/// A dynamically typed value.
///
/// Primitives are stored inline, structs are owned copies, and objects are
/// shared handles: cloning a [`Value::Object`] clones the handle, not the
/// object.
///
/// # Examples
///
/// ```
/// use gs_reflect::info::PrimitiveKind;
/// use gs_reflect::value::Value;
///
/// let v = Value::from("hello");
/// assert_eq!(v.primitive_kind(), Some(PrimitiveKind::String));
/// assert_eq!(v.as_str(), Some("hello"));
///
/// assert_eq!(Value::from(7u16).as_i128(), Some(7));
/// assert!(Value::default_of(PrimitiveKind::String).is_null());
/// ```
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Char(char),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    Decimal(Decimal),
    String(String),
    Guid(Uuid),
    Enum(EnumValue),
    Struct(Box<DynamicObject>),
    Object(ObjectRef),
}

impl Value {
    /// The default value of a primitive kind. Strings default to null.
    pub fn default_of(kind: PrimitiveKind) -> Self {
        match kind {
            PrimitiveKind::Bool => Self::Bool(false),
            PrimitiveKind::Char => Self::Char('\0'),
            PrimitiveKind::I8 => Self::I8(0),
            PrimitiveKind::I16 => Self::I16(0),
            PrimitiveKind::I32 => Self::I32(0),
            PrimitiveKind::I64 => Self::I64(0),
            PrimitiveKind::U8 => Self::U8(0),
            PrimitiveKind::U16 => Self::U16(0),
            PrimitiveKind::U32 => Self::U32(0),
            PrimitiveKind::U64 => Self::U64(0),
            PrimitiveKind::F32 => Self::F32(0.0),
            PrimitiveKind::F64 => Self::F64(0.0),
            PrimitiveKind::Decimal => Self::Decimal(Decimal::ZERO),
            PrimitiveKind::String => Self::Null,
            PrimitiveKind::Guid => Self::Guid(Uuid::nil()),
        }
    }

    /// Builds an integer value of the given kind.
    ///
    /// Returns `None` if `kind` is not an integer kind or `value` is out of range.
    pub fn from_int(kind: PrimitiveKind, value: i128) -> Option<Self> {
        Some(match kind {
            PrimitiveKind::I8 => Self::I8(i8::try_from(value).ok()?),
            PrimitiveKind::I16 => Self::I16(i16::try_from(value).ok()?),
            PrimitiveKind::I32 => Self::I32(i32::try_from(value).ok()?),
            PrimitiveKind::I64 => Self::I64(i64::try_from(value).ok()?),
            PrimitiveKind::U8 => Self::U8(u8::try_from(value).ok()?),
            PrimitiveKind::U16 => Self::U16(u16::try_from(value).ok()?),
            PrimitiveKind::U32 => Self::U32(u32::try_from(value).ok()?),
            PrimitiveKind::U64 => Self::U64(u64::try_from(value).ok()?),
            _ => return None,
        })
    }

    /// The primitive kind of a leaf value. `Null` has none.
    pub fn primitive_kind(&self) -> Option<PrimitiveKind> {
        Some(match self {
            Self::Bool(_) => PrimitiveKind::Bool,
            Self::Char(_) => PrimitiveKind::Char,
            Self::I8(_) => PrimitiveKind::I8,
            Self::I16(_) => PrimitiveKind::I16,
            Self::I32(_) => PrimitiveKind::I32,
            Self::I64(_) => PrimitiveKind::I64,
            Self::U8(_) => PrimitiveKind::U8,
            Self::U16(_) => PrimitiveKind::U16,
            Self::U32(_) => PrimitiveKind::U32,
            Self::U64(_) => PrimitiveKind::U64,
            Self::F32(_) => PrimitiveKind::F32,
            Self::F64(_) => PrimitiveKind::F64,
            Self::Decimal(_) => PrimitiveKind::Decimal,
            Self::String(_) => PrimitiveKind::String,
            Self::Guid(_) => PrimitiveKind::Guid,
            Self::Null | Self::Enum(_) | Self::Struct(_) | Self::Object(_) => return None,
        })
    }

    /// Full name of the runtime type, `None` for `Null`.
    pub fn type_name(&self) -> Option<String> {
        match self {
            Self::Null => None,
            Self::Enum(e) => Some(e.ty().name().to_owned()),
            Self::Struct(s) => Some(s.ty().name().to_owned()),
            Self::Object(o) => Some(o.type_handle().name().to_owned()),
            other => other.primitive_kind().map(PrimitiveKind::type_name),
        }
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Widens any integer value.
    pub fn as_i128(&self) -> Option<i128> {
        Some(match self {
            Self::I8(v) => *v as i128,
            Self::I16(v) => *v as i128,
            Self::I32(v) => *v as i128,
            Self::I64(v) => *v as i128,
            Self::U8(v) => *v as i128,
            Self::U16(v) => *v as i128,
            Self::U32(v) => *v as i128,
            Self::U64(v) => *v as i128,
            Self::Enum(e) => e.value(),
            _ => return None,
        })
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&DynamicObject> {
        match self {
            Self::Struct(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<&EnumValue> {
        match self {
            Self::Enum(e) => Some(e),
            _ => None,
        }
    }
}

// -----------------------------------------------------------------------------
// Conversions

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                #[inline]
                fn from(value: $ty) -> Self {
                    Self::$variant(value)
                }
            }
        )*
    };
}

impl_from! {
    bool => Bool,
    char => Char,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    f32 => F32,
    f64 => F64,
    Decimal => Decimal,
    String => String,
    Uuid => Guid,
    EnumValue => Enum,
    ObjectRef => Object,
}

impl From<&str> for Value {
    #[inline]
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<DynamicObject> for Value {
    #[inline]
    fn from(value: DynamicObject) -> Self {
        Self::Struct(Box::new(value))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    #[inline]
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}
