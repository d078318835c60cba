//! The dynamic value model.
//!
//! ## Menu
//!
//! - [`Value`]: any value a member or element can hold.
//! - [`DynamicObject`]: an instance of a registered struct or class type.
//! - [`ObjectRef`]: a shared, identity-carrying handle to a class instance.
//! - [`EnumValue`]: an enum type plus its backing integer.
//! - [`Decimal`]: a 96-bit mantissa decimal.

// -----------------------------------------------------------------------------
// Modules

mod decimal;
mod deep_eq;
mod object;
mod value;

// -----------------------------------------------------------------------------
// Exports

pub use decimal::{Decimal, DecimalError, MAX_SCALE};
pub use object::{DynamicObject, ObjectRef};
pub use value::{EnumValue, Value};
