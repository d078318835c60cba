//! Type descriptors.
//!
//! A [`TypeDescriptor`] is everything the serializer knows about a type:
//! its five-part name, its kind, its base type, and the members,
//! constructors and methods it exposes. Descriptors are built once with
//! the fluent `with_*` methods and then shared as [`TypeHandle`]s.
//!
//! ## Menu
//!
//! - [`PrimitiveKind`] / [`IntWidth`]: the closed set of leaf types.
//! - [`TypeNameDescriptor`]: `path, component, Version=.., Culture=.., Token=..`.
//! - [`TypeIdentifier`]: a type name split into generic definition and arguments.
//! - [`MemberInfo`] / [`MemberType`]: fields and properties.
//! - [`ConstructorInfo`] / [`MethodInfo`]: callable members.
//! - [`TypeDescriptor`] / [`TypeKind`] / [`Contracts`]: the type itself.

// -----------------------------------------------------------------------------
// Modules

mod constructor_info;
mod member_info;
mod primitive;
mod type_identifier;
mod type_info;
mod type_name;

// -----------------------------------------------------------------------------
// Exports

pub use constructor_info::{ConstructorFn, ConstructorInfo, MethodFn, MethodInfo};
pub use member_info::{MemberAccess, MemberInfo, MemberKind, MemberType, Setter};
pub use primitive::{CORE_COMPONENT, IntWidth, OBJECT_PATH, PrimitiveKind};
pub use type_identifier::TypeIdentifier;
pub use type_info::{Contracts, EnumInfo, GenericInfo, TypeDescriptor, TypeHandle, TypeKind};
pub use type_name::{TypeNameDescriptor, TypeNameError, WILDCARD};

pub(crate) use type_name::split_top_level;
