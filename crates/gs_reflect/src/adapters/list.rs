use crate::adapters::{CollectionAdapter, InsertError, Inserter};
use crate::info::{Contracts, MemberType, TypeHandle};
use crate::registry::TypeRegistry;
use crate::value::{ObjectRef, Value};

/// Fills resizable lists by pushing elements.
///
/// Matches a type declaring both the generic and the untyped list
/// contracts, directly or through a base type, and closed over exactly one
/// type argument, which is the element type.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListAdapter;

impl CollectionAdapter for ListAdapter {
    fn name(&self) -> &str {
        "list"
    }

    fn try_match_type(&self, ty: &TypeHandle, registry: &TypeRegistry) -> Option<MemberType> {
        if !registry
            .contracts_of(ty)
            .contains(Contracts::GENERIC_LIST | Contracts::LIST)
        {
            return None;
        }
        match registry.base_chain(ty).find_map(|t| t.generic())?.args() {
            [element] => Some(element.clone()),
            _ => None,
        }
    }

    fn bind(&self, target: ObjectRef, _ty: &TypeHandle, _registry: &TypeRegistry) -> Box<dyn Inserter> {
        Box::new(ListInserter(target))
    }
}

struct ListInserter(ObjectRef);

impl Inserter for ListInserter {
    #[inline]
    fn append(&mut self, value: Value) -> Result<(), InsertError> {
        self.0.write().push_item(value);
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// Tests
