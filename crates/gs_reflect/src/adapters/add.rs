use crate::adapters::{CollectionAdapter, InsertError, Inserter};
use crate::info::{MemberType, MethodInfo, TypeHandle};
use crate::registry::TypeRegistry;
use crate::value::{ObjectRef, Value};

/// Name of the method [`AddAdapter`] looks for.
pub const ADD_METHOD: &str = "add";

/// Fills generic containers through their `add` method.
///
/// Matches a closed generic type with an `add` method, declared on the type
/// or a base type, whose only parameter is exactly the first type argument.
#[derive(Debug, Clone, Copy, Default)]
pub struct AddAdapter;

/// Finds the `add` method of `ty` and the element type it accepts.
fn find_add(ty: &TypeHandle, registry: &TypeRegistry) -> Option<(MethodInfo, MemberType)> {
    let element = ty.generic()?.args().first()?;
    registry.base_chain(ty).find_map(|t| {
        t.methods()
            .iter()
            .find(|m| m.name() == ADD_METHOD && matches!(m.params(), [p] if p == element))
            .map(|m| (m.clone(), element.clone()))
    })
}

impl CollectionAdapter for AddAdapter {
    fn name(&self) -> &str {
        ADD_METHOD
    }

    fn try_match_type(&self, ty: &TypeHandle, registry: &TypeRegistry) -> Option<MemberType> {
        find_add(ty, registry).map(|(_, element)| element)
    }

    fn bind(&self, target: ObjectRef, ty: &TypeHandle, registry: &TypeRegistry) -> Box<dyn Inserter> {
        Box::new(AddInserter {
            target,
            method: find_add(ty, registry).map(|(method, _)| method),
            ty: ty.name().to_owned(),
        })
    }
}

struct AddInserter {
    target: ObjectRef,
    method: Option<MethodInfo>,
    ty: String,
}

impl Inserter for AddInserter {
    fn append(&mut self, value: Value) -> Result<(), InsertError> {
        let Some(method) = &self.method else {
            return Err(InsertError::MissingOperation(self.ty.clone()));
        };
        let mut object = self.target.write();
        method
            .invoke(&mut object, vec![value])
            .map_err(InsertError::Rejected)
    }
}

// -----------------------------------------------------------------------------
// Tests
