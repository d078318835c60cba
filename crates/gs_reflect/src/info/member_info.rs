use core::fmt;
use std::borrow::Cow;
use std::sync::Arc;

use crate::info::{CORE_COMPONENT, OBJECT_PATH, PrimitiveKind, TypeNameDescriptor};
use crate::value::{DynamicObject, Value};

// -----------------------------------------------------------------------------
// MemberType

/// Declared type of a member, collection element or constructor parameter.
///
/// The declared type decides how a slot is encoded: a primitive slot holds
/// the raw value, every other slot starts with the runtime type name of
/// its value (or the null marker).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MemberType {
    /// A leaf type, encoded without a type name.
    Primitive(PrimitiveKind),
    /// Any registered type, by full five-part name.
    Named(String),
    /// Any value at all.
    Dynamic,
}

impl MemberType {
    /// Creates a [`MemberType::Named`].
    #[inline]
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    /// The full type name of the declared type.
    pub fn type_name(&self) -> Cow<'_, str> {
        match self {
            Self::Primitive(kind) => Cow::Owned(kind.type_name()),
            Self::Named(name) => Cow::Borrowed(name),
            Self::Dynamic => Cow::Owned(TypeNameDescriptor::new(OBJECT_PATH, CORE_COMPONENT).full_name()),
        }
    }
}

impl From<PrimitiveKind> for MemberType {
    #[inline]
    fn from(kind: PrimitiveKind) -> Self {
        Self::Primitive(kind)
    }
}

impl From<&TypeNameDescriptor> for MemberType {
    #[inline]
    fn from(desc: &TypeNameDescriptor) -> Self {
        Self::Named(desc.full_name())
    }
}

// -----------------------------------------------------------------------------
// MemberKind & MemberAccess

/// What kind of member this is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    Field,
    Property,
    /// The indexed accessor of a collection. Never serialized.
    Indexer,
}

/// How a member may be written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberAccess {
    /// Freely readable and writable.
    ReadWrite,
    /// No setter at all.
    ///
    /// A read-only property is still written to the stream, but its value
    /// is dropped when reading unless an alternate setter is declared.
    /// A read-only field is an immutable backing field and is not
    /// serialized.
    ReadOnly,
    /// The setter exists but is not public.
    ///
    /// Not serialized unless an alternate setter is declared.
    Protected,
}

// -----------------------------------------------------------------------------
// MemberInfo

/// A setter invoked instead of a direct assignment.
pub type Setter = Arc<dyn Fn(&mut DynamicObject, Value) + Send + Sync>;

#[derive(Clone)]
struct NamedSetter {
    name: String,
    func: Setter,
}

/// A field or property of a type.
///
/// Construction is fluent:
///
/// ```
/// use gs_reflect::info::{MemberAccess, MemberInfo, PrimitiveKind};
///
/// let member = MemberInfo::property("label", PrimitiveKind::String)
///     .read_only()
///     .with_condition("has_label");
///
/// assert_eq!(member.name(), "label");
/// assert_eq!(member.access(), MemberAccess::ReadOnly);
/// assert_eq!(member.condition(), Some("has_label"));
/// assert!(!member.is_assignable());
/// ```
#[derive(Clone)]
pub struct MemberInfo {
    name: String,
    ty: MemberType,
    kind: MemberKind,
    access: MemberAccess,
    is_static: bool,
    skip: bool,
    condition: Option<String>,
    setter: Option<NamedSetter>,
    index: usize,
}

impl MemberInfo {
    fn new(name: String, ty: MemberType, kind: MemberKind) -> Self {
        Self {
            name,
            ty,
            kind,
            access: MemberAccess::ReadWrite,
            is_static: false,
            skip: false,
            condition: None,
            setter: None,
            index: 0,
        }
    }

    /// Creates a writable field.
    pub fn field(name: impl Into<String>, ty: impl Into<MemberType>) -> Self {
        Self::new(name.into(), ty.into(), MemberKind::Field)
    }

    /// Creates a writable property.
    pub fn property(name: impl Into<String>, ty: impl Into<MemberType>) -> Self {
        Self::new(name.into(), ty.into(), MemberKind::Property)
    }

    /// Creates the indexer of a collection type.
    pub fn indexer(ty: impl Into<MemberType>) -> Self {
        Self::new("Item".into(), ty.into(), MemberKind::Indexer)
    }

    /// Removes the setter.
    #[must_use]
    pub fn read_only(mut self) -> Self {
        self.access = MemberAccess::ReadOnly;
        self
    }

    /// Makes the setter non-public.
    #[must_use]
    pub fn protected(mut self) -> Self {
        self.access = MemberAccess::Protected;
        self
    }

    /// Marks the member as static (type-level, never serialized).
    #[must_use]
    pub fn with_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Excludes the member from serialization.
    #[must_use]
    pub fn skip(mut self) -> Self {
        self.skip = true;
        self
    }

    /// Serializes the member only when the named boolean member of the
    /// owning instance is `true`.
    #[must_use]
    pub fn with_condition(mut self, member: impl Into<String>) -> Self {
        self.condition = Some(member.into());
        self
    }

    /// Assigns the member through `func` instead of writing it directly.
    #[must_use]
    pub fn with_setter(
        mut self,
        name: impl Into<String>,
        func: impl Fn(&mut DynamicObject, Value) + Send + Sync + 'static,
    ) -> Self {
        self.setter = Some(NamedSetter {
            name: name.into(),
            func: Arc::new(func),
        });
        self
    }

    #[inline]
    pub(crate) fn with_index(mut self, index: usize) -> Self {
        self.index = index;
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn ty(&self) -> &MemberType {
        &self.ty
    }

    #[inline]
    pub fn kind(&self) -> MemberKind {
        self.kind
    }

    #[inline]
    pub fn access(&self) -> MemberAccess {
        self.access
    }

    #[inline]
    pub fn is_static(&self) -> bool {
        self.is_static
    }

    #[inline]
    pub fn is_skipped(&self) -> bool {
        self.skip
    }

    /// Name of the boolean member deciding whether this one is present.
    #[inline]
    pub fn condition(&self) -> Option<&str> {
        self.condition.as_deref()
    }

    /// Name of the alternate setter, if any.
    #[inline]
    pub fn setter_name(&self) -> Option<&str> {
        self.setter.as_ref().map(|s| s.name.as_str())
    }

    /// The alternate setter, if any.
    #[inline]
    pub fn setter(&self) -> Option<&Setter> {
        self.setter.as_ref().map(|s| &s.func)
    }

    /// Position in the declaring type.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Returns `true` if a deserialized value can be stored in this member.
    pub fn is_assignable(&self) -> bool {
        self.setter.is_some() || self.access == MemberAccess::ReadWrite
    }

    /// Stores `value` in `target`, through the alternate setter if declared.
    ///
    /// Returns `false` if the member cannot be written.
    pub fn assign(&self, target: &mut DynamicObject, value: Value) -> bool {
        match (&self.setter, self.access) {
            (Some(setter), _) => {
                (setter.func)(target, value);
                true
            }
            (None, MemberAccess::ReadWrite) => {
                target.set(self.name.as_str(), value);
                true
            }
            (None, _) => false,
        }
    }
}

impl fmt::Debug for MemberInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberInfo")
            .field("name", &self.name)
            .field("ty", &self.ty)
            .field("kind", &self.kind)
            .field("access", &self.access)
            .field("is_static", &self.is_static)
            .field("skip", &self.skip)
            .field("condition", &self.condition)
            .field("setter", &self.setter_name())
            .field("index", &self.index)
            .finish()
    }
}
