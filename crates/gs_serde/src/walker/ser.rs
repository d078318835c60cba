use gs_reflect::info::{PrimitiveKind, TypeKind};
use gs_reflect::value::{DynamicObject, ObjectRef};
use gs_reflect::{MemberType, TypeHandle, Value};

use super::type_stack::TypeStack;
use super::{Context, Layouts, SlotKind};
use crate::codec::Encoder;
use crate::tracker::{IdentityTracker, PLAIN_COUNT, SerializableObject};
use crate::{Mode, ObjectTag, SerializeError};

// -----------------------------------------------------------------------------
// Writer

/// One serialization call.
pub(super) struct Writer<'a, E: Encoder> {
    cx: Context<'a>,
    encoder: E,
    tracker: IdentityTracker,
    layouts: Layouts,
    depth: usize,
    stack: TypeStack,
}

impl<'a, E: Encoder> Writer<'a, E> {
    pub fn new(cx: Context<'a>, encoder: E) -> Self {
        Self {
            layouts: Layouts::new(cx.options.mode.member_order()),
            cx,
            encoder,
            tracker: IdentityTracker::new(),
            depth: 0,
            stack: TypeStack::new(),
        }
    }

    pub fn run(mut self, root: &Value) -> Result<u64, SerializeError> {
        let result = self.walk(root);
        if let Err(err) = &result {
            self.stack.report(format_args!("serialization failed: {err}"));
        }
        result
    }

    fn walk(&mut self, root: &Value) -> Result<u64, SerializeError> {
        self.encoder.write_mode(self.cx.options.mode)?;
        self.write_slot(root, &MemberType::Dynamic)?;

        while let Some(index) = self.tracker.next_pending() {
            let Some(entry) = self.tracker.get(index).cloned() else {
                break;
            };
            log::trace!("writing body of entry {index} (`{}`)", entry.ty().name());
            self.write_body(&entry)?;
            self.tracker.complete(index);
            self.cx.progress.update(self.tracker.completed(), self.tracker.len());
        }

        let bytes = self.encoder.finish()?;
        log::debug!("serialized {} objects in {bytes} bytes", self.tracker.len());
        Ok(bytes)
    }

    fn enter(&mut self, name: &str) -> Result<(), SerializeError> {
        self.depth += 1;
        self.cx.check_depth(self.depth).map_err(SerializeError::DepthExceeded)?;
        self.stack.push(name);
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
        self.stack.pop();
    }

    // -------------------------------------------------------------------------
    // Slots

    fn write_slot(&mut self, value: &Value, declared: &MemberType) -> Result<(), SerializeError> {
        match self.cx.slot_kind(declared) {
            SlotKind::Leaf(kind) => self.write_leaf(value, kind),
            SlotKind::Enum(ty) => self.write_enum(value, &ty),
            SlotKind::Typed => self.write_typed(value),
        }
    }

    fn write_leaf(&mut self, value: &Value, kind: PrimitiveKind) -> Result<(), SerializeError> {
        match value {
            Value::Null if kind.is_nullable() => Ok(self.encoder.write_null()?),
            _ if value.primitive_kind() == Some(kind) => Ok(self.encoder.write_primitive(value)?),
            _ => Err(mismatch(kind.type_name(), value)),
        }
    }

    fn write_enum(&mut self, value: &Value, ty: &TypeHandle) -> Result<(), SerializeError> {
        let Some(info) = ty.as_enum() else {
            return Err(mismatch(ty.name().to_owned(), value));
        };
        let raw = value
            .as_i128()
            .and_then(|int| Value::from_int(info.width().kind(), int))
            .ok_or_else(|| mismatch(ty.name().to_owned(), value))?;
        Ok(self.encoder.write_primitive(&raw)?)
    }

    fn write_typed(&mut self, value: &Value) -> Result<(), SerializeError> {
        match value {
            Value::Null => Ok(self.encoder.write_null()?),
            Value::Enum(e) => {
                self.encoder.write_type_name(e.ty().name())?;
                self.write_enum(value, e.ty())
            }
            Value::Struct(object) => {
                let ancestor = self.ancestor(object.ty())?;
                self.encoder.write_type_name(ancestor.name())?;
                self.write_inline(object, &ancestor)
            }
            Value::Object(object) => self.write_reference(object),
            leaf => match leaf.primitive_kind() {
                Some(kind) => {
                    self.encoder.write_type_name(&kind.type_name())?;
                    Ok(self.encoder.write_primitive(leaf)?)
                }
                None => Err(mismatch("a serializable value".to_owned(), leaf)),
            },
        }
    }

    fn ancestor(&self, ty: &TypeHandle) -> Result<TypeHandle, SerializeError> {
        self.cx
            .registry
            .serializable_ancestor(ty)
            .ok_or_else(|| SerializeError::NotSerializable(ty.name().to_owned()))
    }

    /// Writes a struct occurrence in place.
    fn write_inline(&mut self, object: &DynamicObject, ty: &TypeHandle) -> Result<(), SerializeError> {
        self.enter(ty.name())?;
        self.write_occurrence(object, ty)?;
        self.leave();
        Ok(())
    }

    fn write_reference(&mut self, object: &ObjectRef) -> Result<(), SerializeError> {
        if let Some(index) = self.tracker.index_of(object) {
            let name = self
                .tracker
                .get(index)
                .map(|entry| entry.ty().name().to_owned())
                .unwrap_or_default();
            self.encoder.write_type_name(&name)?;
            self.encoder.write_tag(ObjectTag::ObjectIndex)?;
            return Ok(self.encoder.write_index(wire_int(index)?)?);
        }

        let ty = object.type_handle();
        let ancestor = self.ancestor(&ty)?;
        self.encoder.write_type_name(ancestor.name())?;

        let registry = self.cx.registry;
        match ancestor.kind() {
            TypeKind::Class | TypeKind::Array(_) => {}
            TypeKind::Struct => {
                // A value type behind a handle is still written by value.
                let snapshot = object.snapshot();
                return self.write_inline(&snapshot, &ancestor);
            }
            TypeKind::Primitive(_) | TypeKind::Enum(_) => {
                return Err(mismatch("a reference type".to_owned(), &Value::Object(object.clone())));
            }
        }

        if let Some(element) = self.cx.adapters.collection_element(&ancestor, registry) {
            let count = {
                let guard = object.read();
                self.cx
                    .adapters
                    .try_get_read_adapter(&ancestor, &guard, registry)
                    .map_or(0, |items| items.len())
            };
            self.encoder.write_tag(ObjectTag::ObjectList)?;
            let count = wire_int(count)?;
            self.encoder.write_count(count)?;
            self.tracker.record(object, ancestor, count, Some(element));
            return Ok(());
        }

        if let Some((_, params)) = registry.constructor_parameters(&ancestor) {
            self.encoder.write_tag(ObjectTag::ConstructedObject)?;
            self.tracker.record_completed(object, ancestor.clone());
            let snapshot = object.snapshot();
            self.enter(ancestor.name())?;
            for param in &params {
                let value = snapshot
                    .get(param.name())
                    .cloned()
                    .unwrap_or_else(|| registry.default_value(param.ty()));
                self.write_slot(&value, param.ty())?;
            }
            self.leave();
            return Ok(self.encoder.end_occurrence()?);
        }

        self.encoder.write_tag(ObjectTag::ObjectReference)?;
        self.tracker.record(object, ancestor, PLAIN_COUNT, None);
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Bodies

    fn write_body(&mut self, entry: &SerializableObject) -> Result<(), SerializeError> {
        let snapshot = entry.object().snapshot();
        self.stack.clear();
        self.stack.push(entry.ty().name());

        if let Some(element) = entry.element() {
            let count = usize::try_from(entry.count()).unwrap_or(0);
            let items: Vec<Value> = self
                .cx
                .adapters
                .try_get_read_adapter(entry.ty(), &snapshot, self.cx.registry)
                .map(|items| items.take(count).cloned().collect())
                .unwrap_or_default();
            if items.len() != count {
                return Err(SerializeError::TypeMismatch {
                    expected: format!("{count} elements"),
                    found: format!("{} elements", items.len()),
                });
            }
            for item in &items {
                self.write_slot(item, element)?;
            }
        }

        self.write_occurrence(&snapshot, entry.ty())
    }

    /// Writes the member list of `object` as an instance of `ty`.
    fn write_occurrence(&mut self, object: &DynamicObject, ty: &TypeHandle) -> Result<(), SerializeError> {
        let registry = self.cx.registry;
        let layout = self.layouts.get(registry, ty);
        if let Some((member, condition)) = &layout.invalid_condition {
            return Err(SerializeError::InvalidCondition {
                member: member.clone(),
                condition: condition.clone(),
            });
        }

        if self.cx.options.mode == Mode::ByName {
            let names: Vec<&str> = layout.members.iter().map(|m| m.name()).collect();
            self.encoder.write_member_names(&names)?;
        }

        for member in &layout.members {
            if let Some(condition) = member.condition() {
                let present = object.get(condition).and_then(Value::as_bool).unwrap_or(false);
                self.encoder.write_condition(present)?;
                if !present {
                    continue;
                }
            }
            let value = object
                .get(member.name())
                .cloned()
                .unwrap_or_else(|| registry.default_value(member.ty()));
            self.write_slot(&value, member.ty())?;
        }

        Ok(self.encoder.end_occurrence()?)
    }
}

fn mismatch(expected: String, value: &Value) -> SerializeError {
    SerializeError::TypeMismatch {
        expected,
        found: value.type_name().unwrap_or_else(|| "null".to_owned()),
    }
}

/// Counts and indices are `i32` on the wire.
fn wire_int(value: usize) -> Result<i32, SerializeError> {
    i32::try_from(value).map_err(|_| SerializeError::TypeMismatch {
        expected: "at most i32::MAX entries".to_owned(),
        found: value.to_string(),
    })
}
