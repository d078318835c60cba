use gs_reflect::info::{PrimitiveKind, TypeKind};
use gs_reflect::registry::ConstructError;
use gs_reflect::{MemberType, TypeHandle};

use super::type_stack::TypeStack;
use super::{Context, Layouts, SlotKind};
use crate::codec::Decoder;
use crate::tracker::{ObjectTable, PLAIN_COUNT};
use crate::{CodecError, DeserializeError, Mode, ObjectTag};

// -----------------------------------------------------------------------------
// Checker

/// One check call.
///
/// Follows the stream exactly like the reader, but builds nothing and
/// tolerates nothing: whatever the reader would replace by a default or
/// `Null` is an error here. Value fitness is not checked, only structure
/// and type resolution.
pub(super) struct Checker<'a, D: Decoder> {
    cx: Context<'a>,
    decoder: D,
    table: ObjectTable<()>,
    layouts: Layouts,
    mode: Mode,
    depth: usize,
    stack: TypeStack,
}

impl<'a, D: Decoder> Checker<'a, D> {
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

    pub fn run(mut self) -> Result<(), DeserializeError> {
        let result = self.walk();
        if let Err(err) = &result {
            self.stack.report(format_args!(
                "check failed at byte {}: {err}",
                self.decoder.position()
            ));
        }
        result
    }

    fn walk(&mut self) -> Result<(), DeserializeError> {
        self.mode = self.decoder.read_mode()?;
        self.layouts = Layouts::new(self.mode.member_order());

        let root = self.check_slot(&MemberType::Dynamic)?;
        self.check_root(root.as_ref())?;

        while let Some(index) = self.table.next_pending() {
            self.check_body(index)?;
            self.table.complete(index);
            self.cx.progress.update(self.table.completed(), self.table.len());
        }
        Ok(())
    }

    fn check_root(&self, root: Option<&TypeHandle>) -> Result<(), DeserializeError> {
        let (Some(hint), Some(ty)) = (self.cx.root_hint(), root) else {
            return Ok(());
        };
        if !self.cx.registry.derives_from(ty, hint) {
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

    /// Checks one slot and returns the type of the value in it, `None`
    /// for null.
    fn check_slot(&mut self, declared: &MemberType) -> Result<Option<TypeHandle>, DeserializeError> {
        match self.cx.slot_kind(declared) {
            SlotKind::Leaf(kind) => {
                self.check_leaf(kind)?;
                Ok(Some(self.cx.registry.primitive(kind).clone()))
            }
            SlotKind::Enum(ty) => {
                self.check_enum(&ty)?;
                Ok(Some(ty))
            }
            SlotKind::Typed => self.check_typed(),
        }
    }

    fn check_leaf(&mut self, kind: PrimitiveKind) -> Result<(), DeserializeError> {
        self.decoder.read_primitive(kind)?;
        Ok(())
    }

    fn check_enum(&mut self, ty: &TypeHandle) -> Result<(), DeserializeError> {
        let Some(info) = ty.as_enum() else {
            return Err(self.corrupt(format!("`{}` is not an enum", ty.name())));
        };
        self.check_leaf(info.width().kind())
    }

    fn check_typed(&mut self) -> Result<Option<TypeHandle>, DeserializeError> {
        let Some(name) = self.decoder.read_type_name()? else {
            return Ok(None);
        };
        let ty = self.cx.overrides.resolve(&name, self.cx.registry)?;
        match ty.kind() {
            TypeKind::Primitive(kind) => self.check_leaf(*kind)?,
            TypeKind::Enum(_) => self.check_enum(&ty)?,
            TypeKind::Struct => {
                allocatable(&ty)?;
                let ancestor = self.ancestor(&ty)?;
                self.enter(ancestor.name())?;
                self.check_occurrence(&ancestor)?;
                self.leave();
            }
            TypeKind::Class | TypeKind::Array(_) => self.check_tagged(&ty)?,
        }
        Ok(Some(ty))
    }

    fn ancestor(&self, ty: &TypeHandle) -> Result<TypeHandle, DeserializeError> {
        self.cx
            .registry
            .serializable_ancestor(ty)
            .ok_or_else(|| DeserializeError::NotSerializable(ty.name().to_owned()))
    }

    fn check_tagged(&mut self, ty: &TypeHandle) -> Result<(), DeserializeError> {
        let registry = self.cx.registry;
        match self.decoder.read_tag()? {
            ObjectTag::ObjectIndex => {
                let index = self.decoder.read_index()?;
                // Reserved slots belong to objects whose arguments are being read.
                let known = usize::try_from(index).ok().and_then(|i| self.table.get(i)).is_some();
                if !known {
                    return Err(self.corrupt(format!("back-reference to unknown object {index}")));
                }
            }
            ObjectTag::ObjectList => {
                let count = self.decoder.read_count()?;
                if count < 0 {
                    return Err(self.corrupt(format!("negative element count {count}")));
                }
                allocatable(ty)?;
                let ancestor = self.ancestor(ty)?;
                let Some((_, element)) = self.cx.adapters.try_get_write_adapter(ty, registry) else {
                    return Err(DeserializeError::NotACollection(ty.name().to_owned()));
                };
                self.table.push((), ancestor, count, Some(element));
            }
            ObjectTag::ConstructedObject => {
                allocatable(ty)?;
                let Some((_, params)) = registry.constructor_parameters(ty) else {
                    return Err(DeserializeError::MissingConstructor(ty.name().to_owned()));
                };
                let index = self.table.reserve();
                self.enter(ty.name())?;
                for param in &params {
                    self.check_slot(param.ty())?;
                }
                self.leave();
                self.decoder.end_occurrence()?;
                self.table.fill(index, (), ty.clone());
            }
            ObjectTag::ObjectReference => {
                allocatable(ty)?;
                let ancestor = self.ancestor(ty)?;
                self.table.push((), ancestor, PLAIN_COUNT, None);
            }
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Bodies

    fn check_body(&mut self, index: usize) -> Result<(), DeserializeError> {
        let Some(entry) = self.table.entry(index) else {
            return Ok(());
        };
        let ty = entry.ty().clone();
        let count = entry.count();
        let element = entry.element().cloned();

        self.stack.clear();
        self.stack.push(ty.name());

        if let Some(element) = element {
            for _ in 0..count {
                self.check_slot(&element)?;
            }
        }
        self.check_occurrence(&ty)
    }

    fn check_occurrence(&mut self, ty: &TypeHandle) -> Result<(), DeserializeError> {
        let layout = self.layouts.get(self.cx.registry, ty);

        if self.mode == Mode::ByName {
            let names = self.decoder.read_member_names()?;
            let mut members = Vec::with_capacity(names.len());
            for name in &names {
                let Some(member) = layout.member(name) else {
                    return Err(DeserializeError::UnknownMember {
                        ty: ty.name().to_owned(),
                        member: name.clone(),
                    });
                };
                members.push(member.clone());
            }
            for member in &members {
                if member.condition().is_none() || self.decoder.read_condition()? {
                    self.check_slot(member.ty())?;
                }
            }
        } else {
            for member in &layout.members {
                if member.condition().is_none() || self.decoder.read_condition()? {
                    self.check_slot(member.ty())?;
                }
            }
        }

        Ok(self.decoder.end_occurrence()?)
    }
}

fn allocatable(ty: &TypeHandle) -> Result<(), ConstructError> {
    if ty.is_abstract() {
        return Err(ConstructError::Abstract(ty.name().to_owned()));
    }
    Ok(())
}
