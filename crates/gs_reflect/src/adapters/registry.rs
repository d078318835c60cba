use core::fmt;
use core::slice;
use std::sync::Arc;

use crate::adapters::{AddAdapter, ArrayAdapter, CollectionAdapter, Inserter, ListAdapter};
use crate::info::{Contracts, MemberType, TypeHandle, TypeKind};
use crate::registry::TypeRegistry;
use crate::value::{DynamicObject, ObjectRef, Value};

static BUILTINS: [&dyn CollectionAdapter; 3] = [&ArrayAdapter, &ListAdapter, &AddAdapter];

// -----------------------------------------------------------------------------
// AdapterRegistry

/// The ordered list of collection adapters consulted by the serializer.
///
/// Adapters added with [`push`](Self::push) are tried in insertion order
/// before the built-in array, list and `add` adapters.
#[derive(Clone, Default)]
pub struct AdapterRegistry {
    custom: Vec<Arc<dyn CollectionAdapter>>,
}

impl AdapterRegistry {
    /// Creates a registry holding only the built-in adapters.
    #[inline]
    pub const fn new() -> Self {
        Self { custom: Vec::new() }
    }

    /// Adds a custom adapter, tried before the built-ins.
    pub fn push(&mut self, adapter: impl CollectionAdapter) {
        self.custom.push(Arc::new(adapter));
    }

    /// Builder form of [`push`](Self::push).
    #[must_use]
    pub fn with(mut self, adapter: impl CollectionAdapter) -> Self {
        self.push(adapter);
        self
    }

    /// Every adapter in the order it is tried.
    pub fn iter(&self) -> impl Iterator<Item = &dyn CollectionAdapter> {
        let builtins: &[&dyn CollectionAdapter] = &BUILTINS;
        self.custom
            .iter()
            .map(|adapter| &**adapter)
            .chain(builtins.iter().copied())
    }

    /// Returns `true` if the elements of `ty` can be enumerated.
    pub fn is_iterable(&self, ty: &TypeHandle, registry: &TypeRegistry) -> bool {
        matches!(ty.kind(), TypeKind::Array(_))
            || registry.contracts_of(ty).contains(Contracts::ITERABLE)
    }

    /// Iterates over the elements of `object` if its type is iterable.
    pub fn try_get_read_adapter<'a>(
        &self,
        ty: &TypeHandle,
        object: &'a DynamicObject,
        registry: &TypeRegistry,
    ) -> Option<slice::Iter<'a, Value>> {
        self.is_iterable(ty, registry).then(|| object.items().iter())
    }

    /// Finds the first adapter able to populate `ty`, and the element type.
    pub fn try_get_write_adapter(
        &self,
        ty: &TypeHandle,
        registry: &TypeRegistry,
    ) -> Option<(&dyn CollectionAdapter, MemberType)> {
        self.iter().find_map(|adapter| {
            adapter
                .try_match_type(ty, registry)
                .map(|element| (adapter, element))
        })
    }

    /// Finds the first adapter able to populate `target` and binds it.
    pub fn try_get_write_adapter_for(
        &self,
        target: &ObjectRef,
        registry: &TypeRegistry,
    ) -> Option<(Box<dyn Inserter>, MemberType)> {
        let ty = target.type_handle();
        let (adapter, element) = self.try_get_write_adapter(&ty, registry)?;
        log::trace!("populating `{}` with the {} adapter", ty.name(), adapter.name());
        Some((adapter.bind(target.clone(), &ty, registry), element))
    }

    /// Returns the element type if `ty` is written as a collection.
    ///
    /// A collection must be iterable and have a matching write adapter.
    pub fn collection_element(&self, ty: &TypeHandle, registry: &TypeRegistry) -> Option<MemberType> {
        if !self.is_iterable(ty, registry) {
            return None;
        }
        self.try_get_write_adapter(ty, registry)
            .map(|(_, element)| element)
    }
}

impl fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.iter().map(|adapter| adapter.name()))
            .finish()
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::AdapterRegistry;
    use crate::adapters::{CollectionAdapter, InsertError, Inserter};
    use crate::info::{Contracts, MemberType, PrimitiveKind, TypeDescriptor, TypeHandle, TypeNameDescriptor};
    use crate::registry::TypeRegistry;
    use crate::value::{ObjectRef, Value};

    struct Tally;

    struct TallyInserter(ObjectRef);

    impl Inserter for TallyInserter {
        fn append(&mut self, value: Value) -> Result<(), InsertError> {
            let mut object = self.0.write();
            let count = object.get("count").and_then(Value::as_i128).unwrap_or(0);
            object.set("count", Value::I64(count as i64 + 1));
            object.push_item(value);
            Ok(())
        }
    }

    impl CollectionAdapter for Tally {
        fn name(&self) -> &str {
            "tally"
        }

        fn try_match_type(&self, ty: &TypeHandle, _registry: &TypeRegistry) -> Option<MemberType> {
            (ty.descriptor().short_name() == "Tally").then_some(MemberType::Dynamic)
        }

        fn bind(&self, target: ObjectRef, _ty: &TypeHandle, _registry: &TypeRegistry) -> Box<dyn Inserter> {
            Box::new(TallyInserter(target))
        }
    }

    #[test]
    fn custom_adapters_come_first() {
        let mut registry = TypeRegistry::new();
        let ty = registry.register(
            TypeDescriptor::class(TypeNameDescriptor::new("test.Tally", "test"))
                .with_contracts(Contracts::all())
                .with_generic_args(vec![PrimitiveKind::U8.into()]),
        );

        let builtin = AdapterRegistry::new();
        assert_eq!(
            builtin.collection_element(&ty, &registry),
            Some(MemberType::Primitive(PrimitiveKind::U8))
        );

        let adapters = AdapterRegistry::new().with(Tally);
        assert_eq!(format!("{adapters:?}"), r#"["tally", "array", "list", "add"]"#);
        let target = registry.instantiate(&ty, 0).unwrap().into_ref();
        let (mut inserter, element) = adapters.try_get_write_adapter_for(&target, &registry).unwrap();
        assert_eq!(element, MemberType::Dynamic);
        inserter.append(Value::from("x")).unwrap();
        assert!(matches!(target.get("count"), Some(Value::I64(1))));
    }

    #[test]
    fn plain_types_are_not_collections() {
        let mut registry = TypeRegistry::new();
        // Iterable but nothing can populate it.
        let view = registry.register(
            TypeDescriptor::class(TypeNameDescriptor::new("test.View", "test"))
                .with_contracts(Contracts::ITERABLE),
        );
        // Populatable but not iterable.
        let sink = registry.register(
            TypeDescriptor::class(TypeNameDescriptor::new("test.Sink`1", "test"))
                .with_contracts(Contracts::GENERIC_LIST | Contracts::LIST)
                .with_generic_args(vec![PrimitiveKind::U8.into()]),
        );

        let adapters = AdapterRegistry::new();
        let object = registry.instantiate(&view, 0).unwrap();
        assert!(adapters.try_get_read_adapter(&view, &object, &registry).is_some());
        assert!(adapters.collection_element(&view, &registry).is_none());
        assert!(adapters.try_get_write_adapter(&sink, &registry).is_some());
        assert!(adapters.collection_element(&sink, &registry).is_none());
    }
}
