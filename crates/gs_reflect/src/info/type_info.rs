use core::fmt;
use std::sync::Arc;

use bitflags::bitflags;

use crate::info::{
    ConstructorInfo, IntWidth, MemberInfo, MemberType, MethodInfo, PrimitiveKind, TypeNameDescriptor,
};

/// A shared, immutable type descriptor.
pub type TypeHandle = Arc<TypeDescriptor>;

// -----------------------------------------------------------------------------
// TypeKind

/// Variants of an enum type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumInfo {
    width: IntWidth,
    variants: Vec<(String, i128)>,
}

impl EnumInfo {
    /// Backing integer width.
    #[inline]
    pub fn width(&self) -> IntWidth {
        self.width
    }

    /// Named values, in declaration order.
    #[inline]
    pub fn variants(&self) -> &[(String, i128)] {
        &self.variants
    }

    /// Finds the name of a value.
    pub fn variant_name(&self, value: i128) -> Option<&str> {
        self.variants
            .iter()
            .find(|(_, v)| *v == value)
            .map(|(name, _)| name.as_str())
    }

    /// Finds the value of a name.
    pub fn variant_value(&self, name: &str) -> Option<i128> {
        self.variants.iter().find(|(n, _)| n == name).map(|(_, v)| *v)
    }
}

/// The shape of a type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeKind {
    /// A built-in leaf type.
    Primitive(PrimitiveKind),
    /// An integer-backed enumeration.
    Enum(EnumInfo),
    /// A value aggregate. Copied, never shared, never identity-tracked.
    Struct,
    /// A reference aggregate. Instances are shared through `ObjectRef`.
    Class,
    /// A fixed-length indexable container of the given element type.
    Array(MemberType),
}

// -----------------------------------------------------------------------------
// Contracts

bitflags! {
    /// Capabilities a type implements, inherited by derived types.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Contracts: u8 {
        /// Elements can be enumerated.
        const ITERABLE = 1;
        /// Generic list over its single type argument.
        const GENERIC_LIST = 1 << 1;
        /// Untyped, index-resizable list.
        const LIST = 1 << 2;
    }
}

/// Generic definition and arguments of a closed generic type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenericInfo {
    definition: String,
    args: Vec<MemberType>,
}

impl GenericInfo {
    /// Full name of the generic definition.
    #[inline]
    pub fn definition(&self) -> &str {
        &self.definition
    }

    /// Type arguments, in order.
    #[inline]
    pub fn args(&self) -> &[MemberType] {
        &self.args
    }
}

// -----------------------------------------------------------------------------
// TypeDescriptor

/// Everything the serializer knows about one type.
///
/// Descriptors are registered in a [`TypeRegistry`](crate::registry::TypeRegistry)
/// and referenced by other descriptors through their full name, so types
/// may refer to each other in any order.
///
/// # Examples
///
/// ```
/// use gs_reflect::info::{
///     ConstructorInfo, Contracts, MemberInfo, MemberType, PrimitiveKind,
///     TypeDescriptor, TypeKind, TypeNameDescriptor,
/// };
///
/// let shape = TypeNameDescriptor::new("geometry.Shape", "geometry");
/// let circle = TypeDescriptor::class(TypeNameDescriptor::new("geometry.Circle", "geometry"))
///     .serializable()
///     .with_base(&shape)
///     .with_member(MemberInfo::field("radius", PrimitiveKind::F64))
///     .with_constructor(ConstructorInfo::assigning("radius"));
///
/// assert_eq!(circle.kind(), &TypeKind::Class);
/// assert_eq!(circle.base(), Some(shape.full_name().as_str()));
/// assert_eq!(circle.member("radius").unwrap().index(), 0);
///
/// let bag = TypeDescriptor::class(TypeNameDescriptor::new("coll.Bag`1", "coll"))
///     .with_contracts(Contracts::ITERABLE)
///     .with_generic_args(vec![MemberType::Primitive(PrimitiveKind::I32)]);
///
/// assert!(bag.name().starts_with("coll.Bag`1[[core.i32, core,"));
/// assert_eq!(bag.generic().unwrap().definition(), "coll.Bag`1, coll, Version=0.0.0, Culture=neutral, Token=null");
/// ```
#[derive(Clone)]
pub struct TypeDescriptor {
    name: String,
    descriptor: TypeNameDescriptor,
    kind: TypeKind,
    base: Option<String>,
    serializable: bool,
    is_abstract: bool,
    members: Vec<MemberInfo>,
    constructors: Vec<ConstructorInfo>,
    methods: Vec<MethodInfo>,
    contracts: Contracts,
    generic: Option<GenericInfo>,
}

impl TypeDescriptor {
    fn new(descriptor: TypeNameDescriptor, kind: TypeKind) -> Self {
        Self {
            name: descriptor.full_name(),
            descriptor,
            kind,
            base: None,
            serializable: false,
            is_abstract: false,
            members: Vec::new(),
            constructors: Vec::new(),
            methods: Vec::new(),
            contracts: Contracts::empty(),
            generic: None,
        }
    }

    /// Creates the descriptor of a built-in leaf type.
    pub fn primitive(kind: PrimitiveKind) -> Self {
        let mut this = Self::new(kind.descriptor(), TypeKind::Primitive(kind));
        this.serializable = true;
        this
    }

    /// Creates a reference type.
    pub fn class(name: TypeNameDescriptor) -> Self {
        Self::new(name, TypeKind::Class)
    }

    /// Creates a value type.
    pub fn structure(name: TypeNameDescriptor) -> Self {
        Self::new(name, TypeKind::Struct)
    }

    /// Creates an enum backed by `width`. Enums are always serializable.
    pub fn enumeration(name: TypeNameDescriptor, width: IntWidth) -> Self {
        let mut this = Self::new(
            name,
            TypeKind::Enum(EnumInfo {
                width,
                variants: Vec::new(),
            }),
        );
        this.serializable = true;
        this
    }

    /// Creates a fixed-length array type.
    pub fn array(name: TypeNameDescriptor, element: impl Into<MemberType>) -> Self {
        let mut this = Self::new(name, TypeKind::Array(element.into()));
        this.contracts = Contracts::ITERABLE;
        this
    }

    /// Flags the type as serializable.
    #[must_use]
    pub fn serializable(mut self) -> Self {
        self.serializable = true;
        self
    }

    /// Marks the type as abstract; it can never be instantiated.
    #[must_use]
    pub fn abstract_type(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    /// Sets the base type.
    #[must_use]
    pub fn with_base(mut self, base: &TypeNameDescriptor) -> Self {
        self.base = Some(base.full_name());
        self
    }

    /// Appends a member. Its index is its position in this type.
    #[must_use]
    pub fn with_member(mut self, member: MemberInfo) -> Self {
        let index = self.members.len();
        self.members.push(member.with_index(index));
        self
    }

    #[must_use]
    pub fn with_constructor(mut self, ctor: ConstructorInfo) -> Self {
        self.constructors.push(ctor);
        self
    }

    #[must_use]
    pub fn with_method(mut self, method: MethodInfo) -> Self {
        self.methods.push(method);
        self
    }

    #[must_use]
    pub fn with_contracts(mut self, contracts: Contracts) -> Self {
        self.contracts |= contracts;
        self
    }

    /// Adds a named value to an enum type. Ignored for other kinds.
    #[must_use]
    pub fn with_variant(mut self, name: impl Into<String>, value: i128) -> Self {
        if let TypeKind::Enum(info) = &mut self.kind {
            info.variants.push((name.into(), value));
        }
        self
    }

    /// Closes the type over `args`.
    ///
    /// The current name becomes the generic definition and the type name
    /// is rewritten to carry the arguments.
    #[must_use]
    pub fn with_generic_args(mut self, args: Vec<MemberType>) -> Self {
        let definition = self.name.clone();
        let rendered = args
            .iter()
            .map(|arg| format!("[{}]", arg.type_name()))
            .collect::<Vec<_>>()
            .join(",");
        self.descriptor.path = format!("{}[{}]", self.descriptor.path, rendered);
        self.name = self.descriptor.full_name();
        self.generic = Some(GenericInfo { definition, args });
        self
    }

    /// Full five-part name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The parts of the name.
    #[inline]
    pub fn descriptor(&self) -> &TypeNameDescriptor {
        &self.descriptor
    }

    #[inline]
    pub fn kind(&self) -> &TypeKind {
        &self.kind
    }

    /// Returns the primitive kind of a built-in leaf type.
    pub fn as_primitive(&self) -> Option<PrimitiveKind> {
        match self.kind {
            TypeKind::Primitive(kind) => Some(kind),
            _ => None,
        }
    }

    /// Returns the enum information of an enum type.
    pub fn as_enum(&self) -> Option<&EnumInfo> {
        match &self.kind {
            TypeKind::Enum(info) => Some(info),
            _ => None,
        }
    }

    /// Returns `true` for types copied by value (primitives, enums, structs).
    pub fn is_value_type(&self) -> bool {
        matches!(
            self.kind,
            TypeKind::Primitive(_) | TypeKind::Enum(_) | TypeKind::Struct
        )
    }

    /// Full name of the base type.
    #[inline]
    pub fn base(&self) -> Option<&str> {
        self.base.as_deref()
    }

    /// Returns `true` if this type itself is flagged serializable.
    #[inline]
    pub fn is_serializable(&self) -> bool {
        self.serializable
    }

    #[inline]
    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    /// Members declared by this type, base members excluded.
    #[inline]
    pub fn members(&self) -> &[MemberInfo] {
        &self.members
    }

    /// Finds a member declared by this type.
    pub fn member(&self, name: &str) -> Option<&MemberInfo> {
        self.members.iter().find(|m| m.name() == name)
    }

    #[inline]
    pub fn constructors(&self) -> &[ConstructorInfo] {
        &self.constructors
    }

    #[inline]
    pub fn methods(&self) -> &[MethodInfo] {
        &self.methods
    }

    /// Contracts declared by this type, base contracts excluded.
    #[inline]
    pub fn contracts(&self) -> Contracts {
        self.contracts
    }

    #[inline]
    pub fn generic(&self) -> Option<&GenericInfo> {
        self.generic.as_ref()
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("base", &self.base)
            .field("serializable", &self.serializable)
            .field("is_abstract", &self.is_abstract)
            .field("members", &self.members)
            .field("constructors", &self.constructors)
            .field("methods", &self.methods)
            .field("contracts", &self.contracts)
            .field("generic", &self.generic)
            .finish()
    }
}

// -----------------------------------------------------------------------------
// Tests
