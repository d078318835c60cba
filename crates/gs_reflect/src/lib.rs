#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

// -----------------------------------------------------------------------------
// Extern Self

// Lets `gs_reflect::...` paths inside exported macros work in this crate too.
extern crate self as gs_reflect;

// -----------------------------------------------------------------------------
// Modules

pub mod adapters;
pub mod info;
pub mod overrides;
pub mod registry;
pub mod value;

// -----------------------------------------------------------------------------
// Top-Level exports

#[doc(hidden)]
pub mod __macro_exports {
    #[cfg(feature = "auto_register")]
    pub use inventory;
}

pub use info::{MemberType, TypeDescriptor, TypeHandle};
pub use registry::TypeRegistry;
pub use value::{DynamicObject, ObjectRef, Value};
