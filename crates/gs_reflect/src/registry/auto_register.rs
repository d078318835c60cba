use crate::info::TypeDescriptor;

// -----------------------------------------------------------------------------
// AutoRegistration

/// A descriptor factory collected by [`TypeRegistry::auto_register`].
///
/// Created through [`auto_register!`](crate::auto_register).
///
/// [`TypeRegistry::auto_register`]: crate::registry::TypeRegistry::auto_register
#[derive(Debug, Clone, Copy)]
pub struct AutoRegistration {
    build: fn() -> TypeDescriptor,
}

impl AutoRegistration {
    #[inline]
    pub const fn new(build: fn() -> TypeDescriptor) -> Self {
        Self { build }
    }

    /// Builds the descriptor.
    #[inline]
    pub fn build(&self) -> TypeDescriptor {
        (self.build)()
    }
}

#[cfg(feature = "auto_register")]
inventory::collect!(AutoRegistration);

/// Submits a descriptor factory for [`TypeRegistry::auto_register`].
///
/// The argument is a path to a `fn() -> TypeDescriptor`. Without the
/// `auto_register` feature the macro expands to nothing.
///
/// # Examples
///
/// ```
/// use gs_reflect::info::{TypeDescriptor, TypeNameDescriptor};
/// use gs_reflect::registry::TypeRegistry;
///
/// fn settings() -> TypeDescriptor {
///     TypeDescriptor::class(TypeNameDescriptor::new("app.Settings", "app")).serializable()
/// }
///
/// gs_reflect::auto_register!(settings);
///
/// let mut registry = TypeRegistry::new();
/// if registry.auto_register() {
///     assert!(registry.contains("app.Settings, app, Version=0.0.0, Culture=neutral, Token=null"));
/// }
/// ```
///
/// [`TypeRegistry::auto_register`]: crate::registry::TypeRegistry::auto_register
#[cfg(feature = "auto_register")]
#[macro_export]
macro_rules! auto_register {
    ($build:path) => {
        $crate::__macro_exports::inventory::submit! {
            $crate::registry::AutoRegistration::new($build)
        }
    };
}

/// Submits a descriptor factory for `TypeRegistry::auto_register`.
///
/// The `auto_register` feature is disabled, so this expands to nothing.
#[cfg(not(feature = "auto_register"))]
#[macro_export]
macro_rules! auto_register {
    ($build:path) => {};
}
