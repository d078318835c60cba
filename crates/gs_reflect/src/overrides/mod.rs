//! Type name overrides applied when reading a stream.
//!
//! Types move between namespaces and components, get renamed, or are
//! replaced by compatible types. [`TypeOverrides`] rewrites the names found
//! in a stream before they are resolved, in a fixed order:
//!
//! 1. **Name rules** ([`TypeOverrides::names`]): the first [`NameOverride`]
//!    matching the name, see [`name_match`]. For a closed generic name the
//!    rule applies to the generic definition and, when
//!    [`cascade_generics`](TypeOverrides::cascade_generics) is set, to every
//!    type argument independently.
//! 2. **Registry lookup** of the rewritten name.
//! 3. **Type rules**, applied to the resolved type:
//!    - the exact type table ([`TypeOverrides::types`]);
//!    - for a closed generic type, the same rules on the definition and,
//!      when cascading, on every argument, then reconstruction;
//!    - the component table ([`TypeOverrides::components`]).
//!
//! A type rule whose result is not registered is ignored with a warning.
//!
//! ## Configuration
//!
//! Overrides are plain data and can be loaded with any serde format:
//!
//! ```
//! use gs_reflect::overrides::TypeOverrides;
//!
//! let overrides: TypeOverrides = serde_json::from_str(r#"{
//!     "names": [{
//!         "search": { "path": "legacy", "component": "legacy" },
//!         "replace": { "path": "app", "component": "app" }
//!     }],
//!     "cascade_generics": false
//! }"#).unwrap();
//!
//! assert_eq!(
//!     overrides.rewrite_name("legacy.User, legacy, Version=0.0.0, Culture=neutral, Token=null").unwrap(),
//!     "app.User, app, Version=0.0.0, Culture=neutral, Token=null",
//! );
//! ```

// -----------------------------------------------------------------------------
// Modules

mod name_match;

// -----------------------------------------------------------------------------
// Exports

pub use name_match::name_match;

// -----------------------------------------------------------------------------
// TypeOverrides

use gs_utils::hash::HashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::info::{TypeHandle, TypeIdentifier, TypeNameDescriptor, TypeNameError};
use crate::registry::TypeRegistry;

/// An error turning a stream type name into a registered type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ResolveError {
    #[error(transparent)]
    Name(#[from] TypeNameError),
    #[error("type `{0}` is not registered")]
    Unresolved(String),
}

/// A search and replacement pattern pair.
///
/// See [`name_match`] for the matching rules.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NameOverride {
    pub search: TypeNameDescriptor,
    pub replace: TypeNameDescriptor,
}

impl NameOverride {
    pub fn new(search: TypeNameDescriptor, replace: TypeNameDescriptor) -> Self {
        Self { search, replace }
    }

    /// Rewrites a full name, `None` if it does not parse or does not match.
    pub fn apply(&self, name: &str) -> Option<String> {
        let desc = TypeNameDescriptor::parse(name).ok()?;
        name_match(&desc, &self.search, &self.replace).map(|d| d.full_name())
    }

    /// Rewrites a full name keeping its path, for component rules.
    fn apply_component(&self, name: &str) -> Option<String> {
        let desc = TypeNameDescriptor::parse(name).ok()?;
        let search = TypeNameDescriptor {
            path: String::new(),
            ..self.search.clone()
        };
        let replace = TypeNameDescriptor {
            path: String::new(),
            ..self.replace.clone()
        };
        name_match(&desc, &search, &replace).map(|d| d.full_name())
    }
}

/// The override tables used by the deserializer.
///
/// # Examples
///
/// ```
/// use gs_reflect::info::{TypeDescriptor, TypeNameDescriptor};
/// use gs_reflect::overrides::TypeOverrides;
/// use gs_reflect::registry::TypeRegistry;
///
/// let old = TypeNameDescriptor::new("app.UserV1", "app");
/// let new = TypeNameDescriptor::new("app.UserV2", "app");
///
/// let mut registry = TypeRegistry::new();
/// registry.register(TypeDescriptor::class(old.clone()).serializable());
/// registry.register(TypeDescriptor::class(new.clone()).serializable());
///
/// let overrides = TypeOverrides::new().with_type(old.full_name(), new.full_name());
/// let ty = overrides.resolve(&old.full_name(), &registry).unwrap();
/// assert_eq!(ty.name(), new.full_name());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypeOverrides {
    /// Name rules, first match wins.
    pub names: Vec<NameOverride>,
    /// Exact type replacements, by full name.
    pub types: HashMap<String, String>,
    /// Component rules. Only the component, version, culture and token
    /// parts of the patterns are used.
    pub components: Vec<NameOverride>,
    /// Whether rules apply to generic type arguments.
    pub cascade_generics: bool,
}

impl Default for TypeOverrides {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeOverrides {
    /// Creates empty tables with generic cascading enabled.
    pub fn new() -> Self {
        Self {
            names: Vec::new(),
            types: HashMap::default(),
            components: Vec::new(),
            cascade_generics: true,
        }
    }

    /// Returns `true` if no rule is configured.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty() && self.types.is_empty() && self.components.is_empty()
    }

    #[must_use]
    pub fn with_name(mut self, search: TypeNameDescriptor, replace: TypeNameDescriptor) -> Self {
        self.names.push(NameOverride::new(search, replace));
        self
    }

    #[must_use]
    pub fn with_type(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.types.insert(from.into(), to.into());
        self
    }

    #[must_use]
    pub fn with_component(mut self, search: TypeNameDescriptor, replace: TypeNameDescriptor) -> Self {
        self.components.push(NameOverride::new(search, replace));
        self
    }

    #[must_use]
    pub fn with_cascade_generics(mut self, cascade: bool) -> Self {
        self.cascade_generics = cascade;
        self
    }

    /// Applies the name rules to a stream type name.
    pub fn rewrite_name(&self, name: &str) -> Result<String, TypeNameError> {
        if self.names.is_empty() {
            return Ok(name.to_owned());
        }
        let id = TypeIdentifier::parse(name)?;
        let rewritten = id.map_definitions(self.cascade_generics, &mut |definition: &str| {
            self.names
                .iter()
                .find_map(|rule| rule.apply(definition))
                .unwrap_or_else(|| definition.to_owned())
        });
        Ok(rewritten.to_name())
    }

    /// Applies the type rules to a resolved type.
    ///
    /// Falls back to `ty` when the overridden name is not registered.
    pub fn override_type(&self, ty: &TypeHandle, registry: &TypeRegistry) -> TypeHandle {
        if self.types.is_empty() && self.components.is_empty() {
            return ty.clone();
        }
        let Ok(id) = TypeIdentifier::parse(ty.name()) else {
            return ty.clone();
        };
        let candidate = self.override_identifier(&id).to_name();
        if candidate == ty.name() {
            return ty.clone();
        }
        match registry.get(&candidate) {
            Some(target) => {
                log::debug!("type `{}` overridden by `{candidate}`", ty.name());
                target.clone()
            }
            None => {
                log::warn!(
                    "override `{candidate}` of `{}` is not registered, keeping the original",
                    ty.name()
                );
                ty.clone()
            }
        }
    }

    fn override_identifier(&self, id: &TypeIdentifier) -> TypeIdentifier {
        if let Some(target) = self.types.get(&id.to_name()) {
            return TypeIdentifier::Simple(target.clone());
        }
        match id {
            TypeIdentifier::Simple(name) => TypeIdentifier::Simple(self.override_definition(name)),
            TypeIdentifier::Generic { definition, params } => TypeIdentifier::Generic {
                definition: self.override_definition(definition),
                params: if self.cascade_generics {
                    params.iter().map(|p| self.override_identifier(p)).collect()
                } else {
                    params.clone()
                },
            },
        }
    }

    fn override_definition(&self, name: &str) -> String {
        if let Some(target) = self.types.get(name) {
            return target.clone();
        }
        self.components
            .iter()
            .find_map(|rule| rule.apply_component(name))
            .unwrap_or_else(|| name.to_owned())
    }

    /// Resolves a stream type name: name rules, registry lookup, type rules.
    pub fn resolve(&self, name: &str, registry: &TypeRegistry) -> Result<TypeHandle, ResolveError> {
        let rewritten = self.rewrite_name(name)?;
        let ty = registry
            .get(&rewritten)
            .ok_or_else(|| ResolveError::Unresolved(rewritten.clone()))?;
        Ok(self.override_type(ty, registry))
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::{ResolveError, TypeOverrides};
    use crate::info::{MemberType, TypeDescriptor, TypeNameDescriptor};
    use crate::registry::TypeRegistry;

    fn name(path: &str, component: &str) -> TypeNameDescriptor {
        TypeNameDescriptor::new(path, component)
    }

    fn bag_of(arg: &TypeNameDescriptor) -> TypeDescriptor {
        TypeDescriptor::class(name("coll.Bag`1", "coll")).with_generic_args(vec![MemberType::from(arg)])
    }

    fn move_rule() -> (TypeNameDescriptor, TypeNameDescriptor) {
        (
            TypeNameDescriptor::pattern("old", "old", "", "", ""),
            TypeNameDescriptor::pattern("new", "new", "", "", ""),
        )
    }

    #[test]
    fn name_rules_cascade_into_arguments() {
        let (search, replace) = move_rule();
        let source = bag_of(&name("old.Item", "old"));
        let expected = bag_of(&name("new.Item", "new"));

        let cascading = TypeOverrides::new().with_name(search.clone(), replace.clone());
        assert_eq!(cascading.rewrite_name(source.name()).unwrap(), expected.name());

        let flat = cascading.with_cascade_generics(false);
        assert_eq!(flat.rewrite_name(source.name()).unwrap(), source.name());
    }

    #[test]
    fn resolve_reports_unknown_names() {
        let registry = TypeRegistry::new();
        let overrides = TypeOverrides::new();
        assert!(matches!(
            overrides.resolve(&name("nope.T", "nope").full_name(), &registry),
            Err(ResolveError::Unresolved(_))
        ));
        assert!(matches!(
            overrides.resolve("not a type name", &registry),
            Err(ResolveError::Unresolved(_))
        ));

        let (search, replace) = move_rule();
        let with_rules = TypeOverrides::new().with_name(search, replace);
        assert!(matches!(
            with_rules.resolve("broken, name", &registry),
            Err(ResolveError::Unresolved(_))
        ));
        assert!(matches!(
            with_rules.resolve("broken[[x], name", &registry),
            Err(ResolveError::Name(_))
        ));
    }

    #[test]
    fn type_rules_priority() {
        let old_item = name("old.Item", "old");
        let new_item = name("old.Item", "new");
        let renamed = name("app.Renamed", "app");

        let mut registry = TypeRegistry::new();
        for desc in [&old_item, &new_item, &renamed] {
            registry.register(TypeDescriptor::class(desc.clone()).serializable());
        }
        registry.register(bag_of(&old_item));
        let new_bag = registry.register(bag_of(&new_item));

        let component = TypeOverrides::new().with_component(
            TypeNameDescriptor::pattern("", "old", "", "", ""),
            TypeNameDescriptor::pattern("", "new", "", "", ""),
        );
        let ty = component.resolve(&old_item.full_name(), &registry).unwrap();
        assert_eq!(ty.name(), new_item.full_name());

        // The exact table wins over the component table.
        let exact = component
            .clone()
            .with_type(old_item.full_name(), renamed.full_name());
        let ty = exact.resolve(&old_item.full_name(), &registry).unwrap();
        assert_eq!(ty.name(), renamed.full_name());

        // Generic definitions are kept (component `coll` does not match),
        // the argument moves to the new component.
        let ty = component.resolve(bag_of(&old_item).name(), &registry).unwrap();
        assert_eq!(ty.name(), new_bag.name());

        // Unregistered candidates fall back to the original type.
        let dangling = TypeOverrides::new().with_type(old_item.full_name(), "gone.T, gone, Version=0.0.0, Culture=neutral, Token=null");
        let ty = dangling.resolve(&old_item.full_name(), &registry).unwrap();
        assert_eq!(ty.name(), old_item.full_name());
    }

    #[test]
    fn config_formats() {
        let overrides = TypeOverrides::new()
            .with_type("a", "b")
            .with_name(name("x", "y"), name("z", "w"))
            .with_cascade_generics(false);

        let text = ron::to_string(&overrides).unwrap();
        assert_eq!(ron::from_str::<TypeOverrides>(&text).unwrap(), overrides);

        let json = serde_json::to_string(&overrides).unwrap();
        assert_eq!(serde_json::from_str::<TypeOverrides>(&json).unwrap(), overrides);

        let sparse: TypeOverrides = ron::from_str("(types: {\"a\": \"b\"})").unwrap();
        assert!(sparse.cascade_generics);
        assert_eq!(sparse.types.get("a").map(String::as_str), Some("b"));
    }
}
