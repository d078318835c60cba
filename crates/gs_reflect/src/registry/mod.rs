//! The type registry and member resolution.
//!
//! A [`TypeRegistry`] owns every [`TypeDescriptor`](crate::info::TypeDescriptor)
//! a graph may contain and answers the questions the serializer asks about
//! them:
//!
//! - which type in the base chain is the nearest serializable one
//!   ([`serializable_ancestor`](TypeRegistry::serializable_ancestor));
//! - which members are written, and in what order
//!   ([`serializable_members`](TypeRegistry::serializable_members));
//! - which annotated constructor rebuilds an instance
//!   ([`constructor_parameters`](TypeRegistry::constructor_parameters));
//! - how to allocate a fresh instance ([`instantiate`](TypeRegistry::instantiate)).
//!
//! ## Auto registration
//!
//! With the `auto_register` feature, descriptors can be submitted from
//! anywhere with [`auto_register!`](crate::auto_register) and collected
//! by [`TypeRegistry::auto_register`]. We use [`inventory`] crate to
//! implement static registration.
//!
//! [`inventory`]: https://docs.rs/inventory

// -----------------------------------------------------------------------------
// Modules

mod auto_register;
mod error;
mod resolver;
mod type_registry;

// -----------------------------------------------------------------------------
// Exports

pub use auto_register::AutoRegistration;
pub use error::ConstructError;
pub use resolver::{BaseChain, MemberOrder};
pub use type_registry::TypeRegistry;
