use std::sync::Arc;

use gs_utils::hash::{HashMap, HashSet};

use crate::info::{
    CORE_COMPONENT, ConstructorInfo, MemberType, OBJECT_PATH, PrimitiveKind, TypeDescriptor, TypeHandle, TypeKind,
    TypeNameDescriptor,
};
use crate::registry::ConstructError;
use crate::value::{DynamicObject, EnumValue, Value};

/// Struct defaults nested deeper than this are left null.
const MAX_DEFAULT_DEPTH: usize = 32;

// -----------------------------------------------------------------------------
// TypeRegistry

/// A registry of type descriptors.
///
/// This struct is used as the central store for type information.
/// Types are looked up by their full five-part name, which is what a
/// stream carries, or by their dotted path when it is unambiguous.
///
/// It will be used during deserialization, but can also be used to build
/// default instances of any registered type.
///
/// # Example
///
/// ```
/// use gs_reflect::info::{MemberInfo, PrimitiveKind, TypeDescriptor, TypeNameDescriptor};
/// use gs_reflect::registry::TypeRegistry;
/// use gs_reflect::value::Value;
///
/// let mut registry = TypeRegistry::new();
/// let user = registry.register(
///     TypeDescriptor::class(TypeNameDescriptor::new("app.User", "app"))
///         .serializable()
///         .with_member(MemberInfo::field("name", PrimitiveKind::String))
///         .with_member(MemberInfo::field("age", PrimitiveKind::U8)),
/// );
///
/// assert!(registry.get_by_path("app.User").is_some());
///
/// let instance = registry.instantiate(&user, 0).unwrap();
/// assert!(instance.get("name").unwrap().is_null());
/// assert!(matches!(instance.get("age"), Some(Value::U8(0))));
/// ```
pub struct TypeRegistry {
    types: Vec<TypeHandle>,
    name_to_index: HashMap<String, usize>,
    path_to_index: HashMap<String, usize>,
    ambiguous_paths: HashSet<String>,
    primitives: Vec<TypeHandle>,
}

impl Default for TypeRegistry {
    /// See [`TypeRegistry::new`] .
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistry {
    /// Create a type registry with default registrations for built-in types.
    ///
    /// - every [`PrimitiveKind`]
    /// - `core.object`, the abstract root of dynamic slots
    pub fn new() -> Self {
        let mut registry = Self {
            types: Vec::new(),
            name_to_index: HashMap::default(),
            path_to_index: HashMap::default(),
            ambiguous_paths: HashSet::default(),
            primitives: Vec::with_capacity(PrimitiveKind::ALL.len()),
        };
        for kind in PrimitiveKind::ALL {
            let handle = registry.register(TypeDescriptor::primitive(kind));
            registry.primitives.push(handle);
        }
        registry.register(
            TypeDescriptor::class(TypeNameDescriptor::new(OBJECT_PATH, CORE_COMPONENT))
                .serializable()
                .abstract_type(),
        );
        registry
    }

    // # Validity
    // The name must **not** already exist.
    fn add_new_type(&mut self, handle: TypeHandle) -> usize {
        let index = self.types.len();
        let path = handle.descriptor().path.clone();

        // Check for duplicate paths.
        if !self.ambiguous_paths.contains(&path) {
            if self.path_to_index.contains_key(&path) {
                self.path_to_index.remove(&path);
                self.ambiguous_paths.insert(path);
            } else {
                self.path_to_index.insert(path, index);
            }
        }

        self.name_to_index.insert(handle.name().to_owned(), index);
        self.types.push(handle);
        index
    }

    /// Registers a type if no type with the same name exists yet.
    ///
    /// Returns the handle stored in the registry, which is the existing one
    /// if the name was already registered.
    pub fn register(&mut self, ty: TypeDescriptor) -> TypeHandle {
        if let Some(&index) = self.name_to_index.get(ty.name()) {
            log::debug!("type `{}` is already registered", ty.name());
            return self.types[index].clone();
        }
        let handle = Arc::new(ty);
        self.add_new_type(handle.clone());
        handle
    }

    /// Registers a type, **overwriting** any type with the same name.
    ///
    /// Handles already given out keep pointing to the old descriptor.
    pub fn insert(&mut self, ty: TypeDescriptor) -> TypeHandle {
        let handle = Arc::new(ty);
        match self.name_to_index.get(handle.name()) {
            Some(&index) => self.types[index] = handle.clone(),
            None => {
                self.add_new_type(handle.clone());
            }
        }
        handle
    }

    /// Registers every descriptor submitted with [`auto_register!`](crate::auto_register).
    ///
    /// Repeated calls are cheap and will not insert duplicates.
    ///
    /// ## Return Value
    ///
    /// Returns `true` if automatic registration is available, `false` when
    /// the `auto_register` feature is disabled.
    #[cfg(feature = "auto_register")]
    pub fn auto_register(&mut self) -> bool {
        for registration in inventory::iter::<crate::registry::AutoRegistration> {
            self.register(registration.build());
        }
        true
    }

    /// Registers every descriptor submitted with [`auto_register!`](crate::auto_register).
    ///
    /// The `auto_register` feature is disabled, so this always returns `false`.
    #[cfg(not(feature = "auto_register"))]
    #[inline(always)]
    pub fn auto_register(&mut self) -> bool {
        false
    }

    /// Returns the type registered under a full name.
    #[inline]
    pub fn get(&self, name: &str) -> Option<&TypeHandle> {
        self.name_to_index.get(name).map(|&index| &self.types[index])
    }

    /// Returns the type registered under a dotted path.
    ///
    /// Returns `None` if the path is unknown or shared by several types.
    #[inline]
    pub fn get_by_path(&self, path: &str) -> Option<&TypeHandle> {
        self.path_to_index.get(path).map(|&index| &self.types[index])
    }

    /// Returns `true` if the path is shared by several registered types.
    #[inline]
    pub fn is_ambiguous(&self, path: &str) -> bool {
        self.ambiguous_paths.contains(path)
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.name_to_index.contains_key(name)
    }

    /// The descriptor of a built-in leaf type.
    #[inline]
    pub fn primitive(&self, kind: PrimitiveKind) -> &TypeHandle {
        // Registered in `PrimitiveKind::ALL` order by `new`.
        &self.primitives[kind as usize]
    }

    /// Resolves a declared type to a registered type.
    pub fn resolve_member_type(&self, ty: &MemberType) -> Option<&TypeHandle> {
        match ty {
            MemberType::Primitive(kind) => Some(self.primitive(*kind)),
            MemberType::Named(name) => self.get(name),
            MemberType::Dynamic => None,
        }
    }

    /// All registered types, in registration order.
    #[inline]
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &TypeHandle> {
        self.types.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// The default value of a declared type.
    ///
    /// Leaf types get their zero value, enums their zero value, structs a
    /// default instance; references and unknown types are `Null`.
    pub fn default_value(&self, ty: &MemberType) -> Value {
        self.default_value_at(ty, 0)
    }

    fn default_value_at(&self, ty: &MemberType, depth: usize) -> Value {
        let handle = match ty {
            MemberType::Primitive(kind) => return Value::default_of(*kind),
            MemberType::Dynamic => return Value::Null,
            MemberType::Named(name) => match self.get(name) {
                Some(handle) => handle,
                None => return Value::Null,
            },
        };
        match handle.kind() {
            TypeKind::Primitive(kind) => Value::default_of(*kind),
            TypeKind::Enum(_) => Value::Enum(EnumValue::new(handle.clone(), 0)),
            TypeKind::Struct if depth < MAX_DEFAULT_DEPTH => {
                Value::Struct(Box::new(self.default_instance(handle, 0, depth + 1)))
            }
            _ => Value::Null,
        }
    }

    /// Allocates an instance with every member at its default value.
    ///
    /// Arrays are created with `capacity` default elements, other
    /// collections reserve room for `capacity` elements.
    ///
    /// Abstract types and leaf types cannot be instantiated.
    pub fn instantiate(&self, ty: &TypeHandle, capacity: usize) -> Result<DynamicObject, ConstructError> {
        match ty.kind() {
            TypeKind::Primitive(_) | TypeKind::Enum(_) => {
                Err(ConstructError::NotAggregate(ty.name().to_owned()))
            }
            _ if ty.is_abstract() => Err(ConstructError::Abstract(ty.name().to_owned())),
            _ => Ok(self.default_instance(ty, capacity, 0)),
        }
    }

    fn default_instance(&self, ty: &TypeHandle, capacity: usize, depth: usize) -> DynamicObject {
        let mut object = DynamicObject::new(ty.clone());
        for member in self.instance_members(ty) {
            object.set(member.name(), self.default_value_at(member.ty(), depth));
        }
        match ty.kind() {
            TypeKind::Array(element) => {
                let element = self.default_value_at(element, depth);
                object.items_mut().resize(capacity, element);
            }
            _ => object.items_mut().reserve(capacity),
        }
        object
    }

    /// Allocates an instance and runs `ctor` on it.
    pub fn construct(
        &self,
        ty: &TypeHandle,
        ctor: &ConstructorInfo,
        args: Vec<Value>,
    ) -> Result<DynamicObject, ConstructError> {
        let mut object = self.instantiate(ty, 0)?;
        ctor.invoke(&mut object, args)
            .map_err(|message| ConstructError::Failed {
                ty: ty.name().to_owned(),
                message,
            })?;
        Ok(object)
    }
}

// -----------------------------------------------------------------------------
// Tests
