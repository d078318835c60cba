use crate::adapters::{CollectionAdapter, InsertError, Inserter};
use crate::info::{MemberType, TypeHandle, TypeKind};
use crate::registry::TypeRegistry;
use crate::value::{ObjectRef, Value};

/// Fills fixed-length arrays by index.
///
/// The destination must already hold as many elements as will be appended,
/// which is what [`TypeRegistry::instantiate`] does for arrays.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArrayAdapter;

impl CollectionAdapter for ArrayAdapter {
    fn name(&self) -> &str {
        "array"
    }

    fn try_match_type(&self, ty: &TypeHandle, _registry: &TypeRegistry) -> Option<MemberType> {
        match ty.kind() {
            TypeKind::Array(element) => Some(element.clone()),
            _ => None,
        }
    }

    fn bind(&self, target: ObjectRef, _ty: &TypeHandle, _registry: &TypeRegistry) -> Box<dyn Inserter> {
        Box::new(ArrayInserter { target, next: 0 })
    }
}

struct ArrayInserter {
    target: ObjectRef,
    next: usize,
}

impl Inserter for ArrayInserter {
    fn append(&mut self, value: Value) -> Result<(), InsertError> {
        let mut object = self.target.write();
        let items = object.items_mut();
        let len = items.len();
        let slot = items.get_mut(self.next).ok_or(InsertError::Overflow { len })?;
        *slot = value;
        self.next += 1;
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// Tests
