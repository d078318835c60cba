//! The graph walker.
//!
//! [`GraphSerializer`] turns a [`Value`] graph into a stream and back.
//! One walk has three phases:
//!
//! 1. the mode preamble;
//! 2. the root slot, declared as [`MemberType::Dynamic`];
//! 3. the worklist: the body of every reference object, in discovery
//!    order, until no entry is pending.
//!
//! A *slot* is wherever a value is stored: the root, a member, a
//! collection element or a constructor argument. What a slot holds on the
//! wire depends on its declared type:
//!
//! - a leaf type: the raw value;
//! - an enum type: the raw integer of the enum's width;
//! - anything else: the null marker, or the type name of the value
//!   followed by its payload. Leaves and enums are raw values, structs
//!   are their member list inline, and reference objects are a tag.
//!
//! ## Menu
//!
//! - [`GraphSerializer`]: configuration and entry points.
//! - [`Task`]: handle of an async call.
//! - [`Progress`]: shared progress of the current call.

// -----------------------------------------------------------------------------
// Modules

mod check;
mod de;
mod ser;
mod type_stack;

#[cfg(test)]
mod tests;

use std::io::{Read, Write};
use std::sync::Arc;

use gs_reflect::adapters::{AdapterRegistry, CollectionAdapter};
use gs_reflect::info::{MemberInfo, MemberType, PrimitiveKind, TypeKind};
use gs_reflect::overrides::TypeOverrides;
use gs_reflect::registry::MemberOrder;
use gs_reflect::{TypeHandle, TypeRegistry, Value};
use gs_utils::hash::HashMap;

use crate::codec::{
    BinaryDecoder, BinaryEncoder, ByteReader, ByteWriter, DecodeLimits, TextDecoder, TextEncoder, sniff,
};
use crate::task::{self, Task};
use crate::{CodecError, DeserializeError, Encoding, Progress, SerializeError, SerializerOptions};

use check::Checker;
use de::Reader;
use ser::Writer;

// -----------------------------------------------------------------------------
// GraphSerializer

/// Serializes and deserializes object graphs.
///
/// A serializer owns its configuration and nothing else: every call starts
/// from a clean worklist, so one instance can be reused for any number of
/// calls. Sync calls take `&mut self`; the async variants run on a clone of
/// the serializer, which shares the [`Progress`] handle.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use gs_reflect::info::{MemberInfo, PrimitiveKind, TypeDescriptor, TypeNameDescriptor};
/// use gs_reflect::registry::TypeRegistry;
/// use gs_reflect::value::Value;
/// use gs_serde::GraphSerializer;
///
/// let mut registry = TypeRegistry::new();
/// let user = registry.register(
///     TypeDescriptor::class(TypeNameDescriptor::new("app.User", "app"))
///         .serializable()
///         .with_member(MemberInfo::field("name", PrimitiveKind::String)),
/// );
///
/// let object = registry.instantiate(&user, 0).unwrap().with("name", "ada").into_ref();
///
/// let mut serializer = GraphSerializer::new(Arc::new(registry));
/// let mut bytes = Vec::new();
/// serializer.serialize(&mut bytes, &Value::Object(object)).unwrap();
///
/// assert!(serializer.check(&bytes[..]));
///
/// let copy = serializer.deserialize(&bytes[..]).unwrap();
/// let copy = copy.as_object().unwrap();
/// assert_eq!(copy.get("name").unwrap().as_str(), Some("ada"));
/// ```
#[derive(Clone)]
pub struct GraphSerializer {
    registry: Arc<TypeRegistry>,
    adapters: AdapterRegistry,
    overrides: Arc<TypeOverrides>,
    options: SerializerOptions,
    progress: Progress,
}

impl GraphSerializer {
    /// Creates a serializer with the default options, no overrides and the
    /// built-in collection adapters.
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        Self {
            registry,
            adapters: AdapterRegistry::new(),
            overrides: Arc::new(TypeOverrides::new()),
            options: SerializerOptions::default(),
            progress: Progress::new(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: SerializerOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets the type-name overrides applied when reading.
    #[must_use]
    pub fn with_overrides(mut self, overrides: TypeOverrides) -> Self {
        self.overrides = Arc::new(overrides);
        self
    }

    /// Adds a custom collection adapter, tried before the built-in ones
    /// and before adapters added earlier are tried.
    #[must_use]
    pub fn with_adapter(mut self, adapter: impl CollectionAdapter) -> Self {
        self.adapters.push(adapter);
        self
    }

    /// Replaces the collection adapters.
    #[must_use]
    pub fn with_adapters(mut self, adapters: AdapterRegistry) -> Self {
        self.adapters = adapters;
        self
    }

    #[inline]
    pub fn options(&self) -> &SerializerOptions {
        &self.options
    }

    #[inline]
    pub fn options_mut(&mut self) -> &mut SerializerOptions {
        &mut self.options
    }

    #[inline]
    pub fn overrides(&self) -> &TypeOverrides {
        &self.overrides
    }

    #[inline]
    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    /// Progress of the current or last call, in `0.0..=1.0`.
    #[inline]
    pub fn progress(&self) -> f32 {
        self.progress.get()
    }

    /// A handle observing the progress of every call made through this
    /// serializer or its clones.
    #[inline]
    pub fn progress_handle(&self) -> Progress {
        self.progress.clone()
    }

    fn context(&self) -> Context<'_> {
        Context {
            registry: &self.registry,
            adapters: &self.adapters,
            overrides: &self.overrides,
            options: &self.options,
            progress: &self.progress,
        }
    }

    fn limits(&self) -> DecodeLimits {
        DecodeLimits {
            max_string_len: self.options.max_string_len,
            max_member_names: self.options.max_member_names,
        }
    }

    /// Writes the graph reachable from `root` to `output`.
    ///
    /// The encoding is the one of the configured [`Format`](crate::Format).
    /// Returns the number of bytes written.
    pub fn serialize<W: Write>(&mut self, output: W, root: &Value) -> Result<u64, SerializeError> {
        self.progress.reset();
        let out = ByteWriter::new(output, self.options.buffer_size);
        let cx = self.context();
        let result = match self.options.format.encoding() {
            Encoding::Binary => Writer::new(cx, BinaryEncoder::new(out)).run(root),
            Encoding::Text => Writer::new(cx, TextEncoder::new(out)).run(root),
        };
        self.progress.finish();
        result
    }

    /// Reads a graph from `input` and returns its root.
    pub fn deserialize<R: Read>(&mut self, input: R) -> Result<Value, DeserializeError> {
        self.progress.reset();
        let result = self.deserialize_inner(input);
        self.progress.finish();
        result
    }

    fn deserialize_inner<R: Read>(&self, input: R) -> Result<Value, DeserializeError> {
        let mut reader = ByteReader::new(input, self.options.buffer_size);
        let encoding = self.detect(&mut reader)?;
        let cx = self.context();
        match encoding {
            Encoding::Binary => Reader::new(cx, BinaryDecoder::new(reader, self.limits())).run(),
            Encoding::Text => Reader::new(cx, TextDecoder::new(reader, self.limits())).run(),
        }
    }

    /// Returns `true` if `input` holds a stream this serializer can read.
    ///
    /// Walks the stream like [`deserialize`](Self::deserialize) without
    /// building anything, and stops at the first inconsistency. The reason
    /// of a `false` is logged at debug level.
    pub fn check<R: Read>(&mut self, input: R) -> bool {
        self.progress.reset();
        let result = self.check_inner(input);
        self.progress.finish();
        match result {
            Ok(()) => true,
            Err(err) => {
                log::debug!("check failed: {err}");
                false
            }
        }
    }

    fn check_inner<R: Read>(&self, input: R) -> Result<(), DeserializeError> {
        let mut reader = ByteReader::new(input, self.options.buffer_size);
        let encoding = self.detect(&mut reader)?;
        let cx = self.context();
        match encoding {
            Encoding::Binary => Checker::new(cx, BinaryDecoder::new(reader, self.limits())).run(),
            Encoding::Text => Checker::new(cx, TextDecoder::new(reader, self.limits())).run(),
        }
    }

    fn detect<R: Read>(&self, reader: &mut ByteReader<R>) -> Result<Encoding, DeserializeError> {
        let found = sniff(reader)?.ok_or(CodecError::UnexpectedEof)?;
        let format = self.options.format;
        if !format.accepts(found) {
            return Err(DeserializeError::FormatMismatch {
                expected: format.encoding(),
                found,
            });
        }
        Ok(found)
    }

    /// Runs [`serialize`](Self::serialize) on a worker thread.
    ///
    /// The output is handed back when the call succeeds.
    pub fn serialize_async<W>(&self, output: W, root: Value) -> Task<Result<W, SerializeError>>
    where
        W: Write + Send + 'static,
    {
        let mut walker = self.clone();
        task::spawn(move || {
            let mut output = output;
            walker.serialize(&mut output, &root)?;
            Ok(output)
        })
    }

    /// Runs [`deserialize`](Self::deserialize) on a worker thread.
    pub fn deserialize_async<R>(&self, input: R) -> Task<Result<Value, DeserializeError>>
    where
        R: Read + Send + 'static,
    {
        let mut walker = self.clone();
        task::spawn(move || walker.deserialize(input))
    }

    /// Runs [`check`](Self::check) on a worker thread.
    pub fn check_async<R>(&self, input: R) -> Task<bool>
    where
        R: Read + Send + 'static,
    {
        let mut walker = self.clone();
        task::spawn(move || walker.check(input))
    }
}

impl core::fmt::Debug for GraphSerializer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("GraphSerializer")
            .field("options", &self.options)
            .field("overrides", &self.overrides)
            .field("adapters", &self.adapters)
            .field("types", &self.registry.len())
            .field("progress", &self.progress)
            .finish()
    }
}

// -----------------------------------------------------------------------------
// Context

/// Everything a single walk borrows from its [`GraphSerializer`].
#[derive(Clone, Copy)]
struct Context<'a> {
    registry: &'a TypeRegistry,
    adapters: &'a AdapterRegistry,
    overrides: &'a TypeOverrides,
    options: &'a SerializerOptions,
    progress: &'a Progress,
}

/// How a declared type is stored in a slot.
enum SlotKind {
    /// Raw leaf value.
    Leaf(PrimitiveKind),
    /// Raw integer of an enum type.
    Enum(TypeHandle),
    /// Type name, then payload.
    Typed,
}

impl Context<'_> {
    fn slot_kind(&self, declared: &MemberType) -> SlotKind {
        match declared {
            MemberType::Primitive(kind) => SlotKind::Leaf(*kind),
            MemberType::Dynamic => SlotKind::Typed,
            MemberType::Named(name) => match self.registry.get(name) {
                Some(ty) => match ty.kind() {
                    TypeKind::Primitive(kind) => SlotKind::Leaf(*kind),
                    TypeKind::Enum(_) => SlotKind::Enum(ty.clone()),
                    _ => SlotKind::Typed,
                },
                None => SlotKind::Typed,
            },
        }
    }

    /// Resolves the optional root type hint to a full type name.
    fn root_hint(&self) -> Option<&str> {
        let hint = self.options.root_type.as_deref()?;
        Some(
            self.registry
                .get(hint)
                .or_else(|| self.registry.get_by_path(hint))
                .map_or(hint, |ty| ty.name()),
        )
    }

    fn check_depth(&self, depth: usize) -> Result<(), usize> {
        if depth > self.options.max_depth {
            return Err(self.options.max_depth);
        }
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// Layouts

/// The members of a type as they appear in an occurrence.
struct Layout {
    members: Vec<MemberInfo>,
    /// First member whose condition is not a boolean member, with the
    /// condition's name.
    invalid_condition: Option<(String, String)>,
}

impl Layout {
    fn build(registry: &TypeRegistry, ty: &TypeHandle, order: MemberOrder) -> Self {
        let members = registry.serializable_members(ty, order);
        let invalid_condition = members.iter().find_map(|member| {
            let condition = member.condition()?;
            let is_bool = ty_member(registry, ty, condition)
                .is_some_and(|m| *m.ty() == MemberType::Primitive(PrimitiveKind::Bool));
            (!is_bool).then(|| (member.name().to_owned(), condition.to_owned()))
        });
        Self {
            members,
            invalid_condition,
        }
    }

    fn member(&self, name: &str) -> Option<&MemberInfo> {
        self.members.iter().find(|m| m.name() == name)
    }
}

fn ty_member(registry: &TypeRegistry, ty: &TypeHandle, name: &str) -> Option<MemberInfo> {
    registry.base_chain(ty).find_map(|t| t.member(name).cloned())
}

/// Per-call cache of [`Layout`]s, by type name.
struct Layouts {
    order: MemberOrder,
    map: HashMap<String, Arc<Layout>>,
}

impl Layouts {
    fn new(order: MemberOrder) -> Self {
        Self {
            order,
            map: HashMap::default(),
        }
    }

    fn get(&mut self, registry: &TypeRegistry, ty: &TypeHandle) -> Arc<Layout> {
        if let Some(layout) = self.map.get(ty.name()) {
            return layout.clone();
        }
        let layout = Arc::new(Layout::build(registry, ty, self.order));
        self.map.insert(ty.name().to_owned(), layout.clone());
        layout
    }
}
