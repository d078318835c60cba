use core::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use gs_utils::hash::HashMap;

use crate::info::TypeHandle;
use crate::value::Value;

// -----------------------------------------------------------------------------
// DynamicObject

/// A live instance of a registered type.
///
/// Fields are kept in insertion order with a name index, like a struct whose
/// layout is only known at runtime. Collection types additionally store
/// their elements in [`items`](DynamicObject::items).
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use gs_reflect::info::{TypeDescriptor, TypeNameDescriptor};
/// use gs_reflect::value::{DynamicObject, Value};
///
/// let ty = Arc::new(TypeDescriptor::class(TypeNameDescriptor::new("app.User", "app")));
/// let user = DynamicObject::new(ty)
///     .with("name", "ada")
///     .with("age", 36);
///
/// assert_eq!(user.get("name").and_then(Value::as_str), Some("ada"));
/// assert_eq!(user.field_len(), 2);
/// ```
#[derive(Clone)]
pub struct DynamicObject {
    ty: TypeHandle,
    field_names: Vec<String>,
    fields: Vec<Value>,
    field_indices: HashMap<String, usize>,
    items: Vec<Value>,
}

impl DynamicObject {
    /// Creates an object without fields or items.
    pub fn new(ty: TypeHandle) -> Self {
        Self {
            ty,
            field_names: Vec::new(),
            fields: Vec::new(),
            field_indices: HashMap::default(),
            items: Vec::new(),
        }
    }

    #[inline]
    pub fn ty(&self) -> &TypeHandle {
        &self.ty
    }

    /// Full name of the object's type.
    #[inline]
    pub fn type_name(&self) -> &str {
        self.ty.name()
    }

    /// Sets a field, appending it if it does not exist yet.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.field_indices.get(&name) {
            Some(&index) => self.fields[index] = value,
            None => {
                self.field_indices.insert(name.clone(), self.fields.len());
                self.field_names.push(name);
                self.fields.push(value);
            }
        }
    }

    /// Builder form of [`set`](Self::set).
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.field_indices.get(name).map(|&index| &self.fields[index])
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.field_indices
            .get(name)
            .map(|&index| &mut self.fields[index])
    }

    /// Number of fields.
    #[inline]
    pub fn field_len(&self) -> usize {
        self.fields.len()
    }

    /// Fields in insertion order.
    pub fn iter_fields(&self) -> impl ExactSizeIterator<Item = (&str, &Value)> {
        self.field_names
            .iter()
            .map(String::as_str)
            .zip(self.fields.iter())
    }

    /// Collection elements.
    #[inline]
    pub fn items(&self) -> &[Value] {
        &self.items
    }

    #[inline]
    pub fn items_mut(&mut self) -> &mut Vec<Value> {
        &mut self.items
    }

    /// Appends a collection element.
    #[inline]
    pub fn push_item(&mut self, value: impl Into<Value>) {
        self.items.push(value.into());
    }

    /// Builder form that appends every element of `items`.
    #[must_use]
    pub fn with_items<V: Into<Value>>(mut self, items: impl IntoIterator<Item = V>) -> Self {
        self.items.extend(items.into_iter().map(Into::into));
        self
    }

    /// Moves the object behind a shared handle.
    #[inline]
    pub fn into_ref(self) -> ObjectRef {
        ObjectRef::new(self)
    }
}

impl fmt::Debug for DynamicObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct(self.ty.descriptor().short_name());
        for (name, value) in self.iter_fields() {
            s.field(name, value);
        }
        if !self.items.is_empty() {
            s.field("items", &self.items);
        }
        s.finish()
    }
}

// -----------------------------------------------------------------------------
// ObjectRef

/// A shared handle to a [`DynamicObject`].
///
/// Identity is the allocation: two handles are the same object exactly when
/// [`ptr_eq`](ObjectRef::ptr_eq) says so, regardless of their contents.
/// Locks are never poisoned from the caller's point of view, a panic while
/// holding a guard leaves the data as it was.
#[derive(Clone)]
pub struct ObjectRef(Arc<RwLock<DynamicObject>>);

impl ObjectRef {
    #[inline]
    pub fn new(object: DynamicObject) -> Self {
        Self(Arc::new(RwLock::new(object)))
    }

    /// Locks the object for reading.
    #[inline]
    pub fn read(&self) -> RwLockReadGuard<'_, DynamicObject> {
        self.0.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Locks the object for writing.
    #[inline]
    pub fn write(&self) -> RwLockWriteGuard<'_, DynamicObject> {
        self.0.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns `true` if both handles point to the same object.
    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Address of the shared allocation, the object's identity.
    #[inline]
    pub fn as_ptr(&self) -> *const RwLock<DynamicObject> {
        Arc::as_ptr(&self.0)
    }

    /// The object's type.
    #[inline]
    pub fn type_handle(&self) -> TypeHandle {
        self.read().ty().clone()
    }

    /// Clones a field out of the object.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.read().get(name).cloned()
    }

    /// Sets a field.
    pub fn set(&self, name: impl Into<String>, value: impl Into<Value>) {
        self.write().set(name, value);
    }

    /// Clones the object's current state out of the lock.
    pub fn snapshot(&self) -> DynamicObject {
        self.read().clone()
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_read() {
            Ok(object) => write!(f, "ObjectRef({} @ {:p})", object.type_name(), self.as_ptr()),
            Err(_) => write!(f, "ObjectRef(<locked> @ {:p})", self.as_ptr()),
        }
    }
}

// -----------------------------------------------------------------------------
// Tests
