use gs_utils::hash::HashSet;

use crate::value::{DynamicObject, Value};

impl Value {
    /// Structural equality over whole graphs.
    ///
    /// Objects are compared by type name, fields (by name, order ignored)
    /// and items. A pair of objects already under comparison is assumed
    /// equal, so cyclic graphs terminate. Floats compare bitwise, which
    /// makes `NaN` equal to itself.
    ///
    /// Identity is not compared: two graphs with different sharing can
    /// still be deep-equal.
    ///
    /// # Examples
    ///
    /// ```
    /// use gs_reflect::value::Value;
    ///
    /// assert!(Value::from(f64::NAN).deep_eq(&Value::from(f64::NAN)));
    /// assert!(!Value::from(1i32).deep_eq(&Value::from(1i64)));
    /// ```
    pub fn deep_eq(&self, other: &Value) -> bool {
        let mut seen = HashSet::default();
        eq_values(self, other, &mut seen)
    }
}

fn eq_values(a: &Value, b: &Value, seen: &mut HashSet<(usize, usize)>) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Char(x), Value::Char(y)) => x == y,
        (Value::I8(x), Value::I8(y)) => x == y,
        (Value::I16(x), Value::I16(y)) => x == y,
        (Value::I32(x), Value::I32(y)) => x == y,
        (Value::I64(x), Value::I64(y)) => x == y,
        (Value::U8(x), Value::U8(y)) => x == y,
        (Value::U16(x), Value::U16(y)) => x == y,
        (Value::U32(x), Value::U32(y)) => x == y,
        (Value::U64(x), Value::U64(y)) => x == y,
        (Value::F32(x), Value::F32(y)) => x.to_bits() == y.to_bits(),
        (Value::F64(x), Value::F64(y)) => x.to_bits() == y.to_bits(),
        (Value::Decimal(x), Value::Decimal(y)) => x == y,
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Guid(x), Value::Guid(y)) => x == y,
        (Value::Enum(x), Value::Enum(y)) => x.ty().name() == y.ty().name() && x.value() == y.value(),
        (Value::Struct(x), Value::Struct(y)) => eq_objects(x, y, seen),
        (Value::Object(x), Value::Object(y)) => {
            if x.ptr_eq(y) {
                return true;
            }
            if !seen.insert((x.as_ptr() as usize, y.as_ptr() as usize)) {
                return true;
            }
            // Snapshots keep no lock alive while recursing.
            let (x, y) = (x.snapshot(), y.snapshot());
            eq_objects(&x, &y, seen)
        }
        _ => false,
    }
}

fn eq_objects(a: &DynamicObject, b: &DynamicObject, seen: &mut HashSet<(usize, usize)>) -> bool {
    if a.type_name() != b.type_name()
        || a.field_len() != b.field_len()
        || a.items().len() != b.items().len()
    {
        return false;
    }
    for (name, value) in a.iter_fields() {
        match b.get(name) {
            Some(other) if eq_values(value, other, seen) => {}
            _ => return false,
        }
    }
    a.items()
        .iter()
        .zip(b.items())
        .all(|(x, y)| eq_values(x, y, seen))
}

// -----------------------------------------------------------------------------
// Tests
