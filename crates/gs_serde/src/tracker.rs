//! Per-call bookkeeping of reference objects.
//!
//! Every reference object met while walking gets one entry, in discovery
//! order. The entry's position is its index on the wire: the serializer
//! writes it after [`ObjectTag::ObjectIndex`](crate::ObjectTag) and the
//! deserializer uses it to resolve the same back-reference.
//!
//! Entries double as the worklist. An entry is *pending* until its body
//! (collection elements and member list) has been written or read; the
//! walker keeps taking [`next_pending`](IdentityTracker::next_pending)
//! until none is left. Objects built by constructor have no body and are
//! complete from the start.

use gs_reflect::{MemberType, ObjectRef, TypeHandle};
use gs_utils::PtrMap;

/// Count recorded for an object that is not a collection.
pub const PLAIN_COUNT: i32 = -1;

// -----------------------------------------------------------------------------
// SerializableObject

/// A reference object recorded by the serializer.
#[derive(Debug, Clone)]
pub struct SerializableObject {
    object: ObjectRef,
    ty: TypeHandle,
    count: i32,
    element: Option<MemberType>,
    completed: bool,
}

impl SerializableObject {
    #[inline]
    pub fn object(&self) -> &ObjectRef {
        &self.object
    }

    /// The serializable ancestor the object is written as.
    #[inline]
    pub fn ty(&self) -> &TypeHandle {
        &self.ty
    }

    /// Element count of a collection, [`PLAIN_COUNT`] otherwise.
    #[inline]
    pub fn count(&self) -> i32 {
        self.count
    }

    /// Declared element type, `Some` for collections only.
    #[inline]
    pub fn element(&self) -> Option<&MemberType> {
        self.element.as_ref()
    }

    #[inline]
    pub fn is_completed(&self) -> bool {
        self.completed
    }
}

// -----------------------------------------------------------------------------
// IdentityTracker

/// Identity map and worklist of the serializer.
///
/// Objects are identified by address, see [`PtrMap`]. Entries keep their
/// object alive, so an address cannot be reused while it is tracked.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use gs_reflect::info::{TypeDescriptor, TypeNameDescriptor};
/// use gs_reflect::value::DynamicObject;
/// use gs_serde::tracker::{IdentityTracker, PLAIN_COUNT};
///
/// let ty = Arc::new(TypeDescriptor::class(TypeNameDescriptor::new("app.Node", "app")));
/// let node = DynamicObject::new(ty.clone()).into_ref();
///
/// let mut tracker = IdentityTracker::new();
/// assert_eq!(tracker.index_of(&node), None);
///
/// let index = tracker.record(&node, ty, PLAIN_COUNT, None);
/// assert_eq!(tracker.index_of(&node), Some(index));
/// assert_eq!(tracker.next_pending(), Some(index));
///
/// tracker.complete(index);
/// assert_eq!(tracker.next_pending(), None);
/// ```
#[derive(Debug, Default)]
pub struct IdentityTracker {
    entries: Vec<SerializableObject>,
    indices: PtrMap<usize>,
    cursor: usize,
    completed: usize,
}

impl IdentityTracker {
    #[inline]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
            indices: PtrMap::new(),
            cursor: 0,
            completed: 0,
        }
    }

    fn push(&mut self, object: &ObjectRef, entry: SerializableObject) -> usize {
        let index = self.entries.len();
        let inserted = self.indices.try_insert(object.as_ptr(), || index);
        debug_assert!(inserted, "object recorded twice");
        if entry.completed {
            self.completed += 1;
        }
        self.entries.push(entry);
        index
    }

    /// Records a newly discovered object whose body is still to be written.
    ///
    /// Must be called once per object, before any of its members is
    /// expanded, so cycles resolve to a back-reference.
    pub fn record(
        &mut self,
        object: &ObjectRef,
        ty: TypeHandle,
        count: i32,
        element: Option<MemberType>,
    ) -> usize {
        let entry = SerializableObject {
            object: object.clone(),
            ty,
            count,
            element,
            completed: false,
        };
        self.push(object, entry)
    }

    /// Records an object that is fully written where it is discovered.
    pub fn record_completed(&mut self, object: &ObjectRef, ty: TypeHandle) -> usize {
        let entry = SerializableObject {
            object: object.clone(),
            ty,
            count: PLAIN_COUNT,
            element: None,
            completed: true,
        };
        self.push(object, entry)
    }

    #[inline]
    pub fn index_of(&self, object: &ObjectRef) -> Option<usize> {
        self.indices.get(object.as_ptr()).copied()
    }

    #[inline]
    pub fn is_known(&self, object: &ObjectRef) -> bool {
        self.indices.contains(object.as_ptr())
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&SerializableObject> {
        self.entries.get(index)
    }

    /// Returns the first entry whose body has not been written, in
    /// discovery order.
    pub fn next_pending(&mut self) -> Option<usize> {
        while let Some(entry) = self.entries.get(self.cursor) {
            if !entry.completed {
                return Some(self.cursor);
            }
            self.cursor += 1;
        }
        None
    }

    /// Marks the body of an entry as written.
    pub fn complete(&mut self, index: usize) {
        if let Some(entry) = self.entries.get_mut(index)
            && !entry.completed
        {
            entry.completed = true;
            self.completed += 1;
        }
    }

    /// Number of recorded objects.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of completed entries.
    #[inline]
    pub fn completed(&self) -> usize {
        self.completed
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.indices.clear();
        self.cursor = 0;
        self.completed = 0;
    }
}

// -----------------------------------------------------------------------------
// ObjectTable

/// An entry of an [`ObjectTable`].
#[derive(Debug, Clone)]
pub struct TableEntry<T> {
    value: T,
    ty: TypeHandle,
    count: i32,
    element: Option<MemberType>,
    completed: bool,
}

impl<T> TableEntry<T> {
    #[inline]
    pub fn value(&self) -> &T {
        &self.value
    }

    /// The type whose members the body carries.
    #[inline]
    pub fn ty(&self) -> &TypeHandle {
        &self.ty
    }

    #[inline]
    pub fn count(&self) -> i32 {
        self.count
    }

    #[inline]
    pub fn element(&self) -> Option<&MemberType> {
        self.element.as_ref()
    }

    #[inline]
    pub fn is_completed(&self) -> bool {
        self.completed
    }
}

#[derive(Debug, Clone)]
enum Slot<T> {
    /// Taken by a constructed object whose arguments are being read.
    Reserved,
    Filled(TableEntry<T>),
}

/// Index table and worklist of the reader.
///
/// The deserializer stores [`ObjectRef`]s. The checker only needs the
/// shape of each entry and stores `()`.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use gs_reflect::info::{TypeDescriptor, TypeNameDescriptor};
/// use gs_serde::tracker::{ObjectTable, PLAIN_COUNT};
///
/// let ty = Arc::new(TypeDescriptor::class(TypeNameDescriptor::new("app.Node", "app")));
///
/// let mut table = ObjectTable::new();
/// let first = table.push((), ty.clone(), PLAIN_COUNT, None);
/// let second = table.reserve();
///
/// // Reserved slots cannot be referenced until filled.
/// assert!(table.get(second).is_none());
/// table.fill(second, (), ty);
/// assert!(table.get(second).is_some());
///
/// assert_eq!(table.next_pending(), Some(first));
/// ```
#[derive(Debug)]
pub struct ObjectTable<T = ObjectRef> {
    slots: Vec<Slot<T>>,
    cursor: usize,
    completed: usize,
}

impl<T> Default for ObjectTable<T> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ObjectTable<T> {
    #[inline]
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            cursor: 0,
            completed: 0,
        }
    }

    /// Registers an allocated object whose body is still to be read.
    ///
    /// Called before any member is read, so members may refer back to it.
    pub fn push(&mut self, value: T, ty: TypeHandle, count: i32, element: Option<MemberType>) -> usize {
        let index = self.slots.len();
        self.slots.push(Slot::Filled(TableEntry {
            value,
            ty,
            count,
            element,
            completed: false,
        }));
        index
    }

    /// Takes the next index for an object that does not exist yet.
    pub fn reserve(&mut self) -> usize {
        let index = self.slots.len();
        self.slots.push(Slot::Reserved);
        index
    }

    /// Stores a constructed object in a reserved slot. It has no body.
    ///
    /// Returns `false` if the slot was not reserved.
    pub fn fill(&mut self, index: usize, value: T, ty: TypeHandle) -> bool {
        match self.slots.get_mut(index) {
            Some(slot @ Slot::Reserved) => {
                *slot = Slot::Filled(TableEntry {
                    value,
                    ty,
                    count: PLAIN_COUNT,
                    element: None,
                    completed: true,
                });
                self.completed += 1;
                true
            }
            _ => false,
        }
    }

    /// The object at `index`, `None` when out of range or still reserved.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.entry(index).map(TableEntry::value)
    }

    pub fn entry(&self, index: usize) -> Option<&TableEntry<T>> {
        match self.slots.get(index) {
            Some(Slot::Filled(entry)) => Some(entry),
            _ => None,
        }
    }

    /// Returns the first filled entry whose body has not been read.
    ///
    /// Reserved slots are skipped: they are filled before the walker gets
    /// back to the worklist.
    pub fn next_pending(&mut self) -> Option<usize> {
        while let Some(slot) = self.slots.get(self.cursor) {
            if let Slot::Filled(entry) = slot
                && !entry.completed
            {
                return Some(self.cursor);
            }
            self.cursor += 1;
        }
        None
    }

    pub fn complete(&mut self, index: usize) {
        if let Some(Slot::Filled(entry)) = self.slots.get_mut(index)
            && !entry.completed
        {
            entry.completed = true;
            self.completed += 1;
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    #[inline]
    pub fn completed(&self) -> usize {
        self.completed
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.cursor = 0;
        self.completed = 0;
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use gs_reflect::info::{PrimitiveKind, TypeDescriptor, TypeNameDescriptor};
    use gs_reflect::value::DynamicObject;
    use gs_reflect::{MemberType, TypeHandle};

    use super::{IdentityTracker, ObjectTable, PLAIN_COUNT};

    fn node_type() -> TypeHandle {
        Arc::new(TypeDescriptor::class(TypeNameDescriptor::new("test.Node", "test")))
    }

    #[test]
    fn identity_is_the_allocation() {
        let ty = node_type();
        let a = DynamicObject::new(ty.clone()).into_ref();
        let b = DynamicObject::new(ty.clone()).into_ref();

        let mut tracker = IdentityTracker::new();
        let ia = tracker.record(&a, ty.clone(), PLAIN_COUNT, None);
        assert!(tracker.is_known(&a.clone()));
        assert!(!tracker.is_known(&b));

        let ib = tracker.record_completed(&b, ty);
        assert_eq!((ia, ib), (0, 1));
        assert_eq!(tracker.get(ia).unwrap().count(), PLAIN_COUNT);
        assert_eq!(tracker.get(ib).unwrap().count(), PLAIN_COUNT);
        assert_eq!(tracker.completed(), 1);

        tracker.clear();
        assert!(tracker.is_empty());
        assert!(!tracker.is_known(&a));
    }

    #[test]
    fn worklist_is_discovery_order() {
        let ty = node_type();
        let objects: Vec<_> = (0..4).map(|_| DynamicObject::new(ty.clone()).into_ref()).collect();

        let mut tracker = IdentityTracker::new();
        tracker.record(&objects[0], ty.clone(), PLAIN_COUNT, None);
        tracker.record_completed(&objects[1], ty.clone());
        tracker.record(&objects[2], ty.clone(), 3, Some(MemberType::Primitive(PrimitiveKind::I32)));

        let mut visited = Vec::new();
        while let Some(index) = tracker.next_pending() {
            visited.push(index);
            if index == 0 {
                // Discovered while writing the body of entry 0.
                tracker.record(&objects[3], ty.clone(), PLAIN_COUNT, None);
            }
            tracker.complete(index);
        }
        assert_eq!(visited, [0, 2, 3]);
        assert_eq!(tracker.completed(), tracker.len());
        assert_eq!(tracker.get(2).unwrap().count(), 3);
        assert!(tracker.get(2).unwrap().element().is_some());
    }

    #[test]
    fn table_reserves_and_fills() {
        let ty = node_type();
        let mut table: ObjectTable<u8> = ObjectTable::new();

        let reserved = table.reserve();
        let pushed = table.push(7, ty.clone(), PLAIN_COUNT, None);

        assert_eq!(table.get(reserved), None);
        assert_eq!(table.get(pushed), Some(&7));
        assert_eq!(table.get(9), None);
        assert_eq!(table.next_pending(), Some(pushed));

        assert!(table.fill(reserved, 3, ty.clone()));
        assert!(!table.fill(reserved, 4, ty));
        assert_eq!(table.get(reserved), Some(&3));
        assert_eq!(table.entry(reserved).unwrap().count(), PLAIN_COUNT);

        table.complete(pushed);
        assert_eq!(table.next_pending(), None);
        assert_eq!(table.completed(), 2);
    }
}
