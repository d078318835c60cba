use gs_reflect::info::{MemberInfo, PrimitiveKind, TypeKind};
use gs_reflect::value::{DynamicObject, EnumValue, ObjectRef};
use gs_reflect::{MemberType, TypeHandle, Value};

use super::type_stack::TypeStack;
use super::{Context, Layouts, SlotKind};
use crate::codec::Decoder;
use crate::tracker::{ObjectTable, PLAIN_COUNT};
use crate::{CodecError, DeserializeError, Mode, ObjectTag};

// -----------------------------------------------------------------------------
// Reader

/// One deserialization call.
///
/// Lenient where the stream stays aligned: a leaf that does not parse
/// becomes its default, a dangling back-reference becomes `Null`, and a
/// value that does not fit its member is dropped. Each substitution is
/// logged as a warning. Everything else is an error.
pub(super) struct Reader<'a, D: Decoder> {
    cx: Context<'a>,
    decoder: D,
    table: ObjectTable,
    layouts: Layouts,
    mode: Mode,
    depth: usize,
    stack: TypeStack,
}

impl<'a, D: Decoder> Reader<'a, D> {
    pub fn new(cx: Context<'a>, decoder: D) -> Self {
        Self {
            layouts: Layouts::new(Mode::default().member_order()),
            cx,
            decoder,
            table: ObjectTable::new(),
            mode: Mode::default(),
            depth: 0,
            stack: TypeStack::new(),
        }
    }

    pub fn run(mut self) -> Result<Value, DeserializeError> {
        let result = self.walk();
        if let Err(err) = &result {
            self.stack.report(format_args!(
                "deserialization failed at byte {}: {err}",
                self.decoder.position()
            ));
        }
        result
    }

    fn walk(&mut self) -> Result<Value, DeserializeError> {
        self.mode = self.decoder.read_mode()?;
        self.layouts = Layouts::new(self.mode.member_order());

        let root = self.read_slot(&MemberType::Dynamic)?;
        self.check_root(&root)?;

        while let Some(index) = self.table.next_pending() {
            self.read_body(index)?;
            self.table.complete(index);
            self.cx.progress.update(self.table.completed(), self.table.len());
        }

        log::debug!(
            "deserialized {} objects from {} bytes",
            self.table.len(),
            self.decoder.position()
        );
        Ok(root)
    }

    fn check_root(&self, root: &Value) -> Result<(), DeserializeError> {
        let Some(hint) = self.cx.root_hint() else {
            return Ok(());
        };
        let ty = match root {
            Value::Null => return Ok(()),
            Value::Object(object) => object.type_handle(),
            Value::Struct(object) => object.ty().clone(),
            Value::Enum(e) => e.ty().clone(),
            leaf => match leaf.primitive_kind() {
                Some(kind) => self.cx.registry.primitive(kind).clone(),
                None => return Ok(()),
            },
        };
        if !self.cx.registry.derives_from(&ty, hint) {
            return Err(DeserializeError::RootTypeMismatch {
                expected: hint.to_owned(),
                found: ty.name().to_owned(),
            });
        }
        Ok(())
    }

    fn enter(&mut self, name: &str) -> Result<(), DeserializeError> {
        self.depth += 1;
        self.cx.check_depth(self.depth).map_err(DeserializeError::DepthExceeded)?;
        self.stack.push(name);
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
        self.stack.pop();
    }

    fn corrupt(&self, detail: String) -> DeserializeError {
        DeserializeError::Codec(CodecError::Corrupt {
            position: self.decoder.position(),
            detail,
        })
    }

    // -------------------------------------------------------------------------
    // Slots

    fn read_slot(&mut self, declared: &MemberType) -> Result<Value, DeserializeError> {
        match self.cx.slot_kind(declared) {
            SlotKind::Leaf(kind) => self.read_leaf(kind),
            SlotKind::Enum(ty) => self.read_enum(ty),
            SlotKind::Typed => self.read_typed(),
        }
    }

    fn read_leaf(&mut self, kind: PrimitiveKind) -> Result<Value, DeserializeError> {
        match self.decoder.read_primitive(kind) {
            Ok(value) => Ok(value),
            Err(err) if err.is_recoverable() => {
                log::warn!("{err}, using the default value");
                Ok(Value::default_of(kind))
            }
            Err(err) => Err(err.into()),
        }
    }

    fn read_enum(&mut self, ty: TypeHandle) -> Result<Value, DeserializeError> {
        let Some(info) = ty.as_enum() else {
            return Err(self.corrupt(format!("`{}` is not an enum", ty.name())));
        };
        let raw = self.read_leaf(info.width().kind())?;
        let value = raw.as_i128().unwrap_or_default();
        Ok(Value::Enum(EnumValue::new(ty, value)))
    }

    fn read_typed(&mut self) -> Result<Value, DeserializeError> {
        let Some(name) = self.decoder.read_type_name()? else {
            return Ok(Value::Null);
        };
        let ty = self.cx.overrides.resolve(&name, self.cx.registry)?;
        match ty.kind() {
            TypeKind::Primitive(kind) => self.read_leaf(*kind),
            TypeKind::Enum(_) => self.read_enum(ty.clone()),
            TypeKind::Struct => {
                let ancestor = self.ancestor(&ty)?;
                let mut object = self.cx.registry.instantiate(&ty, 0)?;
                self.enter(ancestor.name())?;
                let values = self.read_occurrence(&ancestor)?;
                self.leave();
                self.assign(&mut object, values);
                Ok(Value::Struct(Box::new(object)))
            }
            TypeKind::Class | TypeKind::Array(_) => self.read_tagged(ty.clone()),
        }
    }

    fn ancestor(&self, ty: &TypeHandle) -> Result<TypeHandle, DeserializeError> {
        self.cx
            .registry
            .serializable_ancestor(ty)
            .ok_or_else(|| DeserializeError::NotSerializable(ty.name().to_owned()))
    }

    fn read_tagged(&mut self, ty: TypeHandle) -> Result<Value, DeserializeError> {
        let registry = self.cx.registry;
        match self.decoder.read_tag()? {
            ObjectTag::ObjectIndex => {
                let index = self.decoder.read_index()?;
                let found = usize::try_from(index).ok().and_then(|i| self.table.get(i));
                match found {
                    Some(object) => Ok(Value::Object(object.clone())),
                    None => {
                        log::warn!("back-reference to unknown object {index} of `{}`, using null", ty.name());
                        Ok(Value::Null)
                    }
                }
            }
            ObjectTag::ObjectList => {
                let count = self.decoder.read_count()?;
                let Ok(len) = usize::try_from(count) else {
                    return Err(self.corrupt(format!("negative element count {count}")));
                };
                let ancestor = self.ancestor(&ty)?;
                let Some((_, element)) = self.cx.adapters.try_get_write_adapter(&ty, registry) else {
                    return Err(DeserializeError::NotACollection(ty.name().to_owned()));
                };
                let object = registry.instantiate(&ty, len)?.into_ref();
                self.table.push(object.clone(), ancestor, count, Some(element));
                Ok(Value::Object(object))
            }
            ObjectTag::ConstructedObject => {
                let Some((ctor, params)) = registry.constructor_parameters(&ty) else {
                    return Err(DeserializeError::MissingConstructor(ty.name().to_owned()));
                };
                let index = self.table.reserve();
                self.enter(ty.name())?;
                let mut args = Vec::with_capacity(params.len());
                for param in &params {
                    args.push(self.read_slot(param.ty())?);
                }
                self.leave();
                self.decoder.end_occurrence()?;

                let object = registry.construct(&ty, &ctor, args)?.into_ref();
                self.table.fill(index, object.clone(), ty);
                Ok(Value::Object(object))
            }
            ObjectTag::ObjectReference => {
                let ancestor = self.ancestor(&ty)?;
                let object = registry.instantiate(&ty, 0)?.into_ref();
                self.table.push(object.clone(), ancestor, PLAIN_COUNT, None);
                Ok(Value::Object(object))
            }
        }
    }

    // -------------------------------------------------------------------------
    // Bodies

    fn read_body(&mut self, index: usize) -> Result<(), DeserializeError> {
        let Some(entry) = self.table.entry(index) else {
            return Ok(());
        };
        let object = entry.value().clone();
        let ty = entry.ty().clone();
        let count = usize::try_from(entry.count()).unwrap_or(0);
        let element = entry.element().cloned();

        log::trace!("reading body of entry {index} (`{}`)", ty.name());
        self.stack.clear();
        self.stack.push(ty.name());

        if let Some(element) = element {
            self.read_elements(&object, &element, count)?;
        }

        let values = self.read_occurrence(&ty)?;
        self.assign(&mut object.write(), values);
        Ok(())
    }

    fn read_elements(&mut self, object: &ObjectRef, element: &MemberType, count: usize) -> Result<(), DeserializeError> {
        let registry = self.cx.registry;
        let Some((mut inserter, _)) = self.cx.adapters.try_get_write_adapter_for(object, registry) else {
            return Err(DeserializeError::NotACollection(object.type_handle().name().to_owned()));
        };
        for _ in 0..count {
            let mut value = self.read_slot(element)?;
            if !registry.is_assignable(&value, element) {
                log::warn!(
                    "element `{}` does not fit `{}`, using the default value",
                    value.type_name().unwrap_or_default(),
                    element.type_name()
                );
                value = registry.default_value(element);
            }
            inserter.append(value)?;
        }
        Ok(())
    }

    /// Reads one member list. Values are returned, not assigned, so no
    /// lock is held while nested values are read.
    fn read_occurrence(&mut self, ty: &TypeHandle) -> Result<Vec<(MemberInfo, Value)>, DeserializeError> {
        let layout = self.layouts.get(self.cx.registry, ty);

        let members: Vec<MemberInfo> = if self.mode == Mode::ByName {
            let names = self.decoder.read_member_names()?;
            names
                .iter()
                .map(|name| {
                    layout.member(name).cloned().ok_or_else(|| DeserializeError::UnknownMember {
                        ty: ty.name().to_owned(),
                        member: name.clone(),
                    })
                })
                .collect::<Result<_, _>>()?
        } else {
            layout.members.clone()
        };

        let mut values = Vec::with_capacity(members.len());
        for member in members {
            if member.condition().is_some() && !self.read_condition(&member)? {
                continue;
            }
            let value = self.read_slot(member.ty())?;
            values.push((member, value));
        }

        self.decoder.end_occurrence()?;
        Ok(values)
    }

    fn read_condition(&mut self, member: &MemberInfo) -> Result<bool, DeserializeError> {
        match self.decoder.read_condition() {
            Ok(present) => Ok(present),
            Err(err) if err.is_recoverable() => {
                log::warn!("{err}, treating the condition of `{}` as false", member.name());
                Ok(false)
            }
            Err(err) => Err(err.into()),
        }
    }

    fn assign(&self, target: &mut DynamicObject, values: Vec<(MemberInfo, Value)>) {
        let registry = self.cx.registry;
        for (member, value) in values {
            if !member.is_assignable() {
                log::trace!("`{}` is read-only, value dropped", member.name());
                continue;
            }
            if !registry.is_assignable(&value, member.ty()) {
                log::warn!(
                    "`{}` value does not fit member `{}` of `{}`, keeping the default",
                    value.type_name().unwrap_or_else(|| "null".to_owned()),
                    member.name(),
                    target.type_name()
                );
                continue;
            }
            member.assign(target, value);
        }
    }
}
