use serde::{Deserialize, Serialize};

use crate::info::{
    ConstructorInfo, Contracts, MemberAccess, MemberInfo, MemberKind, MemberType, MethodInfo,
    TypeHandle, TypeKind,
};
use crate::registry::TypeRegistry;
use crate::value::Value;

/// Base chains longer than this are treated as cyclic and cut.
const MAX_CHAIN: usize = 64;

// -----------------------------------------------------------------------------
// MemberOrder

/// Order in which the members of a type are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MemberOrder {
    /// Byte-wise by name. Independent of declaration order.
    #[default]
    Lexicographic,
    /// Base type members first, then declaration order.
    Declared,
}

// -----------------------------------------------------------------------------
// BaseChain

/// Iterator over a type and its registered base types, most derived first.
///
/// Stops at the first base type that is not registered.
pub struct BaseChain<'a> {
    registry: &'a TypeRegistry,
    next: Option<&'a TypeHandle>,
    steps: usize,
}

impl<'a> Iterator for BaseChain<'a> {
    type Item = &'a TypeHandle;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.take()?;
        self.steps += 1;
        if self.steps < MAX_CHAIN {
            self.next = current.base().and_then(|base| self.registry.get(base));
        }
        Some(current)
    }
}

// -----------------------------------------------------------------------------
// Resolution

impl TypeRegistry {
    /// Iterates over `ty` and its base types.
    #[inline]
    pub fn base_chain<'a>(&'a self, ty: &'a TypeHandle) -> BaseChain<'a> {
        BaseChain {
            registry: self,
            next: Some(ty),
            steps: 0,
        }
    }

    /// Returns `true` if `ancestor` is `ty` or one of its base types.
    pub fn derives_from(&self, ty: &TypeHandle, ancestor: &str) -> bool {
        self.base_chain(ty).any(|t| t.name() == ancestor)
    }

    /// Contracts of `ty` and all its base types.
    pub fn contracts_of(&self, ty: &TypeHandle) -> Contracts {
        self.base_chain(ty)
            .fold(Contracts::empty(), |acc, t| acc | t.contracts())
    }

    /// Finds a method by name on `ty` or its base types, most derived first.
    pub fn find_method<'a>(&'a self, ty: &'a TypeHandle, name: &str) -> Option<&'a MethodInfo> {
        self.base_chain(ty)
            .find_map(|t| t.methods().iter().find(|m| m.name() == name))
    }

    /// Finds the nearest type flagged serializable, starting from `ty` itself.
    ///
    /// Returns `None` if no type in the chain is serializable, in which case
    /// the value cannot be processed at all.
    ///
    /// # Examples
    ///
    /// ```
    /// use gs_reflect::info::{TypeDescriptor, TypeNameDescriptor};
    /// use gs_reflect::registry::TypeRegistry;
    ///
    /// let base = TypeNameDescriptor::new("app.Base", "app");
    /// let mut registry = TypeRegistry::new();
    /// registry.register(TypeDescriptor::class(base.clone()).serializable());
    /// let derived = registry.register(
    ///     TypeDescriptor::class(TypeNameDescriptor::new("app.Derived", "app")).with_base(&base),
    /// );
    ///
    /// let ancestor = registry.serializable_ancestor(&derived).unwrap();
    /// assert_eq!(ancestor.name(), base.full_name());
    /// ```
    pub fn serializable_ancestor(&self, ty: &TypeHandle) -> Option<TypeHandle> {
        self.base_chain(ty).find(|t| t.is_serializable()).cloned()
    }

    /// Every instance member of `ty`, base members first.
    ///
    /// A member redeclared by a derived type replaces the base member at the
    /// base member's position. Static members and the indexer are excluded.
    pub fn instance_members(&self, ty: &TypeHandle) -> Vec<MemberInfo> {
        let chain: Vec<&TypeHandle> = self.base_chain(ty).collect();
        let mut members: Vec<MemberInfo> = Vec::new();
        for t in chain.into_iter().rev() {
            for member in t.members() {
                if member.is_static() || member.kind() == MemberKind::Indexer {
                    continue;
                }
                match members.iter_mut().find(|m| m.name() == member.name()) {
                    Some(slot) => *slot = member.clone(),
                    None => members.push(member.clone()),
                }
            }
        }
        members
    }

    /// The members written for an instance of `ty`, in `order`.
    ///
    /// Excluded:
    /// - static members and the indexer;
    /// - members marked with [`skip`](MemberInfo::skip);
    /// - read-only fields (immutable backing fields);
    /// - protected properties without an alternate setter.
    ///
    /// Read-only properties are kept: they are written, and dropped when
    /// read back unless an alternate setter is declared.
    pub fn serializable_members(&self, ty: &TypeHandle, order: MemberOrder) -> Vec<MemberInfo> {
        let mut members: Vec<MemberInfo> = self
            .instance_members(ty)
            .into_iter()
            .filter(|member| is_serialized(member))
            .collect();
        if order == MemberOrder::Lexicographic {
            members.sort_by(|a, b| a.name().cmp(b.name()));
        }
        members
    }

    /// Finds the constructor that rebuilds `ty` from member values.
    ///
    /// A constructor qualifies when its annotation is non-empty, lists as
    /// many names as the constructor takes parameters, and every name
    /// matches exactly one instance member of `ty`. The first qualifying
    /// constructor wins; the members are returned in parameter order.
    pub fn constructor_parameters(&self, ty: &TypeHandle) -> Option<(ConstructorInfo, Vec<MemberInfo>)> {
        if !matches!(ty.kind(), TypeKind::Class) {
            return None;
        }
        let members = self.instance_members(ty);
        ty.constructors().iter().find_map(|ctor| {
            let names = ctor.parameter_names();
            if names.is_empty() || names.len() != ctor.arity() {
                return None;
            }
            let params = names
                .iter()
                .map(|name| {
                    let mut found = members.iter().filter(|m| m.name() == name.as_str());
                    match (found.next(), found.next()) {
                        (Some(member), None) => Some(member.clone()),
                        _ => None,
                    }
                })
                .collect::<Option<Vec<_>>>()?;
            Some((ctor.clone(), params))
        })
    }

    /// Returns `true` if `value` may be stored in a slot declared as `declared`.
    ///
    /// Aggregates are assignable to their own type and to any base type.
    /// `Null` is assignable to strings and to reference-like declared types.
    /// Declared types that are not registered accept anything but `Null`
    /// leaf mismatches.
    pub fn is_assignable(&self, value: &Value, declared: &MemberType) -> bool {
        let name = match declared {
            MemberType::Dynamic => return true,
            MemberType::Primitive(kind) => {
                return match value {
                    Value::Null => kind.is_nullable(),
                    other => other.primitive_kind() == Some(*kind),
                };
            }
            MemberType::Named(name) => name.as_str(),
        };
        let target = self.get(name);
        match value {
            Value::Null => match target.map(|t| t.kind()) {
                Some(TypeKind::Primitive(kind)) => kind.is_nullable(),
                Some(TypeKind::Enum(_) | TypeKind::Struct) => false,
                _ => true,
            },
            Value::Enum(e) => e.ty().name() == name,
            Value::Struct(s) => self.derives_from(s.ty(), name),
            Value::Object(o) => self.derives_from(&o.type_handle(), name),
            leaf => match target {
                Some(t) => t.as_primitive().is_some() && leaf.primitive_kind() == t.as_primitive(),
                None => false,
            },
        }
    }
}

fn is_serialized(member: &MemberInfo) -> bool {
    if member.is_skipped() {
        return false;
    }
    match (member.kind(), member.access()) {
        (MemberKind::Indexer, _) => false,
        (MemberKind::Field, MemberAccess::ReadOnly) => false,
        (_, MemberAccess::Protected) => member.setter_name().is_some(),
        _ => true,
    }
}

// -----------------------------------------------------------------------------
// Tests
