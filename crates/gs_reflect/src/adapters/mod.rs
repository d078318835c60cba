//! Collection adapters.
//!
//! A type behaves as a collection when its elements can be enumerated
//! (read side) *and* some adapter knows how to append elements to a fresh
//! instance (write side). Types that fail either test are written as plain
//! aggregates.
//!
//! ## Menu
//!
//! - [`CollectionAdapter`]: stateless type matcher, shared freely.
//! - [`Inserter`]: an adapter bound to one destination object.
//! - [`AdapterRegistry`]: custom adapters first, then the built-ins
//!   [`ArrayAdapter`], [`ListAdapter`] and [`AddAdapter`], first match wins.
//!
//! ## Example
//!
//! ```
//! use gs_reflect::adapters::AdapterRegistry;
//! use gs_reflect::info::{MemberType, PrimitiveKind, TypeDescriptor, TypeNameDescriptor};
//! use gs_reflect::registry::TypeRegistry;
//! use gs_reflect::value::Value;
//!
//! let mut registry = TypeRegistry::new();
//! let ints = registry.register(
//!     TypeDescriptor::array(TypeNameDescriptor::new("app.Ints", "app"), PrimitiveKind::I32),
//! );
//!
//! let adapters = AdapterRegistry::new();
//! let target = registry.instantiate(&ints, 2).unwrap().into_ref();
//! let (mut inserter, element) = adapters.try_get_write_adapter_for(&target, &registry).unwrap();
//! assert_eq!(element, MemberType::Primitive(PrimitiveKind::I32));
//!
//! inserter.append(Value::I32(7)).unwrap();
//! inserter.append(Value::I32(8)).unwrap();
//! assert!(inserter.append(Value::I32(9)).is_err());
//! assert_eq!(target.read().items().len(), 2);
//! ```

// -----------------------------------------------------------------------------
// Modules

mod add;
mod array;
mod list;
mod registry;

// -----------------------------------------------------------------------------
// Exports

pub use add::{ADD_METHOD, AddAdapter};
pub use array::ArrayAdapter;
pub use list::ListAdapter;
pub use registry::AdapterRegistry;

// -----------------------------------------------------------------------------
// Traits

use thiserror::Error;

use crate::info::{MemberType, TypeHandle};
use crate::registry::TypeRegistry;
use crate::value::{ObjectRef, Value};

/// An error appending an element to a collection.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum InsertError {
    #[error("fixed-length collection of {len} elements is full")]
    Overflow { len: usize },
    #[error("element rejected: {0}")]
    Rejected(String),
    #[error("type `{0}` has no usable add operation")]
    MissingOperation(String),
}

/// Appends elements to one particular collection instance.
///
/// Inserters are created by [`CollectionAdapter::bind`] and are not meant
/// to be shared between destinations.
pub trait Inserter: Send {
    /// Appends one element.
    fn append(&mut self, value: Value) -> Result<(), InsertError>;
}

/// Recognizes collection types and binds inserters to their instances.
///
/// Matching is stateless: a single adapter may be shared by any number of
/// walkers.
pub trait CollectionAdapter: Send + Sync + 'static {
    /// Adapter name, used in log output.
    fn name(&self) -> &str;

    /// Returns the element type if this adapter can populate `ty`.
    fn try_match_type(&self, ty: &TypeHandle, registry: &TypeRegistry) -> Option<MemberType>;

    /// Binds an inserter to `target`, an instance of a type this adapter
    /// matched.
    fn bind(&self, target: ObjectRef, ty: &TypeHandle, registry: &TypeRegistry) -> Box<dyn Inserter>;
}
