use std::io::Cursor;
use std::sync::Arc;

use gs_reflect::adapters::{CollectionAdapter, InsertError, Inserter};
use gs_reflect::info::{
    ConstructorInfo, Contracts, IntWidth, MemberInfo, MemberType, MethodInfo, PrimitiveKind, TypeDescriptor,
    TypeHandle, TypeNameDescriptor,
};
use gs_reflect::overrides::TypeOverrides;
use gs_reflect::registry::TypeRegistry;
use gs_reflect::value::{Decimal, EnumValue, ObjectRef, Value};
use uuid::Uuid;

use super::GraphSerializer;
use crate::codec::{BinaryDecoder, BinaryEncoder, ByteReader, ByteWriter, DecodeLimits, Decoder, Encoder};
use crate::{DeserializeError, Format, Mode, ObjectTag, SerializeError, SerializerOptions};

// -----------------------------------------------------------------------------
// Fixtures

fn name(path: &str) -> TypeNameDescriptor {
    TypeNameDescriptor::new(path, "test")
}

fn full(path: &str) -> String {
    name(path).full_name()
}

fn member_name(kind: PrimitiveKind) -> String {
    format!("{kind:?}").to_lowercase()
}

fn enum_path(width: IntWidth) -> String {
    format!("app.Enum{width:?}")
}

fn enum_member(width: IntWidth) -> String {
    format!("enum_{width:?}").to_lowercase()
}

fn registry() -> TypeRegistry {
    let mut registry = TypeRegistry::new();

    registry.register(
        TypeDescriptor::class(name("app.Plain"))
            .serializable()
            .with_member(MemberInfo::field("text", PrimitiveKind::String)),
    );
    registry.register(
        TypeDescriptor::class(name("app.Node"))
            .serializable()
            .with_member(MemberInfo::field("label", PrimitiveKind::String))
            .with_member(MemberInfo::field("me", MemberType::Dynamic))
            .with_member(MemberInfo::field("next", &name("app.Node"))),
    );
    registry.register(
        TypeDescriptor::class(name("app.Pair"))
            .serializable()
            .with_member(MemberInfo::field("first", MemberType::Dynamic))
            .with_member(MemberInfo::field("second", MemberType::Dynamic)),
    );
    registry.register(
        TypeDescriptor::structure(name("app.Point"))
            .serializable()
            .with_member(MemberInfo::field("x", PrimitiveKind::I32))
            .with_member(MemberInfo::field("y", PrimitiveKind::I32)),
    );
    registry.register(
        TypeDescriptor::enumeration(name("app.Color"), IntWidth::U8)
            .with_variant("Red", 0)
            .with_variant("Blue", 2),
    );
    registry.register(
        TypeDescriptor::class(name("app.Shape"))
            .serializable()
            .with_member(MemberInfo::field("origin", &name("app.Point")))
            .with_member(MemberInfo::field("color", &name("app.Color")))
            .with_member(MemberInfo::field("extra", MemberType::Dynamic))
            .with_member(MemberInfo::property("ratio", PrimitiveKind::F64)),
    );
    registry.register(
        TypeDescriptor::class(name("app.Gated"))
            .serializable()
            .with_member(MemberInfo::field("has_extra", PrimitiveKind::Bool))
            .with_member(MemberInfo::field("extra", PrimitiveKind::String).with_condition("has_extra")),
    );
    registry.register(
        TypeDescriptor::class(name("app.Stamped"))
            .serializable()
            .with_member(MemberInfo::field("id", PrimitiveKind::I32))
            .with_member(MemberInfo::property("created", PrimitiveKind::String).read_only())
            .with_member(
                MemberInfo::property("code", PrimitiveKind::I32)
                    .read_only()
                    .with_setter("set_code", |object, value| object.set("code", value)),
            ),
    );
    registry.register(
        TypeDescriptor::class(name("app.Circle"))
            .serializable()
            .with_member(MemberInfo::field("radius", PrimitiveKind::F64).read_only())
            .with_constructor(ConstructorInfo::assigning("radius")),
    );
    registry.register(
        TypeDescriptor::class(name("app.Loop"))
            .serializable()
            .with_member(MemberInfo::field("me", MemberType::Dynamic).read_only())
            .with_constructor(ConstructorInfo::assigning("me")),
    );
    registry.register(
        TypeDescriptor::class(name("app.Broken"))
            .serializable()
            .with_member(MemberInfo::field("radius", PrimitiveKind::F64).read_only())
            .with_constructor(ConstructorInfo::annotated("radius", 1, |_, _| Err("boom".to_owned()))),
    );
    registry.register(
        TypeDescriptor::class(name("app.LegacyUser"))
            .serializable()
            .with_member(MemberInfo::field("name", PrimitiveKind::String))
            .with_member(MemberInfo::field("age", PrimitiveKind::I32)),
    );
    registry.register(
        TypeDescriptor::class(name("app.User"))
            .serializable()
            .with_member(MemberInfo::field("name", PrimitiveKind::String))
            .with_member(MemberInfo::field("age", PrimitiveKind::I32)),
    );
    registry.register(
        TypeDescriptor::class(name("app.Animal"))
            .serializable()
            .with_member(MemberInfo::field("name", PrimitiveKind::String)),
    );
    registry.register(
        TypeDescriptor::class(name("app.Dog"))
            .with_base(&name("app.Animal"))
            .with_member(MemberInfo::field("breed", PrimitiveKind::String)),
    );
    registry.register(
        TypeDescriptor::class(name("app.Owner"))
            .serializable()
            .with_member(MemberInfo::field("pet", &name("app.Plain"))),
    );
    registry.register(
        TypeDescriptor::class(name("app.Flag"))
            .serializable()
            .with_member(MemberInfo::field("on", PrimitiveKind::Bool)),
    );
    registry.register(
        TypeDescriptor::structure(name("app.Wrap"))
            .serializable()
            .with_member(MemberInfo::field("inner", MemberType::Dynamic)),
    );

    // Collections.
    registry.register(TypeDescriptor::array(name("app.Ints"), PrimitiveKind::I32).serializable());
    registry.register(
        TypeDescriptor::class(name("app.Tally"))
            .serializable()
            .with_contracts(Contracts::ITERABLE)
            .with_member(MemberInfo::field("total", PrimitiveKind::I64)),
    );

    // One member per leaf kind, one enum per width.
    let mut everything = TypeDescriptor::class(name("app.Everything")).serializable();
    for kind in PrimitiveKind::ALL {
        everything = everything.with_member(MemberInfo::field(member_name(kind), kind));
    }
    for width in IntWidth::ALL {
        let path = enum_path(width);
        registry.register(TypeDescriptor::enumeration(name(&path), width));
        everything = everything.with_member(MemberInfo::field(enum_member(width), &name(&path)));
    }
    everything = everything
        .with_member(MemberInfo::field("boxed", MemberType::Dynamic))
        .with_member(MemberInfo::field("null_text", PrimitiveKind::String));
    registry.register(everything);

    registry
}

fn ty(registry: &TypeRegistry, path: &str) -> TypeHandle {
    registry.get(&full(path)).unwrap().clone()
}

fn object(registry: &TypeRegistry, path: &str) -> ObjectRef {
    registry.instantiate(&ty(registry, path), 0).unwrap().into_ref()
}

fn serializer(registry: &Arc<TypeRegistry>, mode: Mode, format: Format) -> GraphSerializer {
    GraphSerializer::new(registry.clone()).with_options(SerializerOptions {
        mode,
        format,
        ..SerializerOptions::default()
    })
}

fn to_bytes(serializer: &mut GraphSerializer, root: &Value) -> Vec<u8> {
    let mut bytes = Vec::new();
    serializer.serialize(&mut bytes, root).unwrap();
    bytes
}

/// Serializes, checks and deserializes `root`.
fn round_trip(serializer: &mut GraphSerializer, root: &Value) -> Value {
    let bytes = to_bytes(serializer, root);
    assert!(serializer.check(&bytes[..]), "check failed with {:?}", serializer.options());
    serializer.deserialize(&bytes[..]).unwrap()
}

fn sample(kind: PrimitiveKind) -> Value {
    match kind {
        PrimitiveKind::Bool => Value::Bool(true),
        PrimitiveKind::Char => Value::Char('é'),
        PrimitiveKind::I8 => Value::I8(-8),
        PrimitiveKind::I16 => Value::I16(-1600),
        PrimitiveKind::I32 => Value::I32(-32_000_000),
        PrimitiveKind::I64 => Value::I64(i64::MIN),
        PrimitiveKind::U8 => Value::U8(200),
        PrimitiveKind::U16 => Value::U16(60_000),
        PrimitiveKind::U32 => Value::U32(4_000_000_000),
        PrimitiveKind::U64 => Value::U64(u64::MAX),
        PrimitiveKind::F32 => Value::F32(1.5),
        PrimitiveKind::F64 => Value::F64(-1e300),
        PrimitiveKind::Decimal => Value::Decimal("-12.50".parse::<Decimal>().unwrap()),
        PrimitiveKind::String => Value::from("quote \" tab \t line \n end"),
        PrimitiveKind::Guid => Value::Guid(Uuid::from_u128(0x0123_4567_89ab_cdef_0123_4567_89ab_cdef)),
    }
}

fn enum_sample(width: IntWidth) -> i128 {
    match width {
        IntWidth::I8 => i8::MIN.into(),
        IntWidth::I16 => i16::MIN.into(),
        IntWidth::I32 => i32::MIN.into(),
        IntWidth::I64 => i64::MIN.into(),
        IntWidth::U8 => u8::MAX.into(),
        IntWidth::U16 => u16::MAX.into(),
        IntWidth::U32 => u32::MAX.into(),
        IntWidth::U64 => u64::MAX.into(),
    }
}

const FORMATS: [Format; 2] = [Format::BinaryPreferred, Format::TextPreferred];

// -----------------------------------------------------------------------------
// Round trips

#[test]
fn plain_object_in_binary_default_mode() {
    let registry = Arc::new(registry());
    let plain = object(&registry, "app.Plain");
    plain.set("text", "test");

    let mut serializer = GraphSerializer::new(registry.clone());
    let copy = round_trip(&mut serializer, &Value::Object(plain));

    let copy = copy.as_object().unwrap();
    assert_eq!(copy.type_handle().name(), full("app.Plain"));
    assert_eq!(copy.get("text").unwrap().as_str(), Some("test"));
}

#[test]
fn every_leaf_and_enum_width_in_every_mode() {
    let registry = Arc::new(registry());
    let root = object(&registry, "app.Everything");
    for kind in PrimitiveKind::ALL {
        root.set(member_name(kind), sample(kind));
    }
    for width in IntWidth::ALL {
        let path = enum_path(width);
        let value = EnumValue::new(ty(&registry, &path), enum_sample(width));
        root.set(enum_member(width), value);
    }
    root.set("boxed", Value::U16(7));
    root.set("null_text", Value::Null);
    let root = Value::Object(root);

    for mode in Mode::ALL {
        for format in FORMATS {
            let mut serializer = serializer(&registry, mode, format);
            let copy = round_trip(&mut serializer, &root);
            assert!(copy.deep_eq(&root), "{mode:?} / {format:?}");
        }
    }
}

#[test]
fn structs_and_boxed_values() {
    let registry = Arc::new(registry());
    let point = |x: i32, y: i32| {
        registry
            .instantiate(&ty(&registry, "app.Point"), 0)
            .unwrap()
            .with("x", x)
            .with("y", y)
    };

    let shape = object(&registry, "app.Shape");
    shape.set("origin", point(3, -4));
    shape.set("color", EnumValue::new(ty(&registry, "app.Color"), 2));
    shape.set("extra", point(9, 9));
    shape.set("ratio", 0.25f64);
    let root = Value::Object(shape);

    for mode in Mode::ALL {
        for format in FORMATS {
            let mut serializer = serializer(&registry, mode, format);
            let copy = round_trip(&mut serializer, &root);
            assert!(copy.deep_eq(&root), "{mode:?} / {format:?}");

            let copy = copy.as_object().unwrap();
            let color = copy.get("color").unwrap();
            assert_eq!(color.as_enum().unwrap().variant(), Some("Blue"));
        }
    }

    // A struct as the root is written inline.
    let mut serializer = GraphSerializer::new(registry.clone());
    let root = Value::from(point(1, 2));
    assert!(round_trip(&mut serializer, &root).deep_eq(&root));
}

#[test]
fn collections_through_each_adapter() {
    let mut registry = registry();
    // Closed generic types get their arguments in the name.
    let list = registry.register(
        TypeDescriptor::class(name("app.IntList`1"))
            .serializable()
            .with_contracts(Contracts::ITERABLE | Contracts::GENERIC_LIST | Contracts::LIST)
            .with_generic_args(vec![PrimitiveKind::I32.into()]),
    );
    let bag = registry.register(
        TypeDescriptor::class(name("app.IntBag`1"))
            .serializable()
            .with_contracts(Contracts::ITERABLE)
            .with_method(MethodInfo::new("add", vec![PrimitiveKind::I32.into()], |object, mut args| {
                object.push_item(args.pop().unwrap_or(Value::Null));
                Ok(())
            }))
            .with_generic_args(vec![PrimitiveKind::I32.into()]),
    );
    let array = ty(&registry, "app.Ints");
    let registry = Arc::new(registry);

    for collection in [array, list, bag] {
        let path = collection.name().to_owned();
        let root = Value::Object(
            registry
                .instantiate(&collection, 0)
                .unwrap()
                .with_items([1, 2, 3])
                .into_ref(),
        );

        for format in FORMATS {
            let mut serializer = serializer(&registry, Mode::Default, format);
            let copy = round_trip(&mut serializer, &root);
            let items: Vec<i128> = copy
                .as_object()
                .unwrap()
                .read()
                .items()
                .iter()
                .filter_map(Value::as_i128)
                .collect();
            assert_eq!(items, [1, 2, 3], "{path} / {format:?}");
        }
    }
}

#[test]
fn serializes_through_the_serializable_ancestor() {
    let registry = Arc::new(registry());
    let dog = object(&registry, "app.Dog");
    dog.set("name", "rex");
    dog.set("breed", "collie");

    let mut serializer = GraphSerializer::new(registry.clone());
    let copy = round_trip(&mut serializer, &Value::Object(dog));

    let copy = copy.as_object().unwrap();
    assert_eq!(copy.type_handle().name(), full("app.Animal"));
    assert_eq!(copy.get("name").unwrap().as_str(), Some("rex"));
    assert!(copy.get("breed").is_none());
}

// -----------------------------------------------------------------------------
// Identity

#[test]
fn self_reference_is_a_back_reference_to_index_zero() {
    let registry = Arc::new(registry());
    let node = object(&registry, "app.Node");
    node.set("label", "n");
    node.set("me", node.clone());

    let mut serializer = GraphSerializer::new(registry.clone());
    let bytes = to_bytes(&mut serializer, &Value::Object(node.clone()));

    let mut decoder = BinaryDecoder::new(ByteReader::new(&bytes[..], 64), DecodeLimits::default());
    assert_eq!(decoder.read_mode().unwrap(), Mode::Default);
    assert_eq!(decoder.read_type_name().unwrap(), Some(full("app.Node")));
    assert_eq!(decoder.read_tag().unwrap(), ObjectTag::ObjectReference);
    // Body of entry 0, members in name order.
    assert_eq!(decoder.read_primitive(PrimitiveKind::String).unwrap().as_str(), Some("n"));
    assert_eq!(decoder.read_type_name().unwrap(), Some(full("app.Node")));
    assert_eq!(decoder.read_tag().unwrap(), ObjectTag::ObjectIndex);
    assert_eq!(decoder.read_index().unwrap(), 0);
    assert_eq!(decoder.read_type_name().unwrap(), None);
    decoder.end_occurrence().unwrap();

    assert!(serializer.check(&bytes[..]));
    let copy = serializer.deserialize(&bytes[..]).unwrap();
    let copy = copy.as_object().unwrap();
    let me = copy.get("me").unwrap();
    assert!(me.as_object().unwrap().ptr_eq(copy));
    assert!(!copy.ptr_eq(&node));
}

#[test]
fn cycles_and_sharing_survive() {
    let registry = Arc::new(registry());
    let a = object(&registry, "app.Node");
    let b = object(&registry, "app.Node");
    a.set("label", "a");
    a.set("next", b.clone());
    b.set("label", "b");
    b.set("next", a.clone());
    b.set("me", b.clone());

    let pair = object(&registry, "app.Pair");
    pair.set("first", a.clone());
    pair.set("second", a);
    let root = Value::Object(pair);

    for mode in Mode::ALL {
        for format in FORMATS {
            let mut serializer = serializer(&registry, mode, format);
            let copy = round_trip(&mut serializer, &root);
            assert!(copy.deep_eq(&root), "{mode:?} / {format:?}");

            let pair = copy.as_object().unwrap();
            let first = pair.get("first").unwrap();
            let second = pair.get("second").unwrap();
            let a = first.as_object().unwrap();
            assert!(a.ptr_eq(second.as_object().unwrap()));

            let b = a.get("next").unwrap();
            let b = b.as_object().unwrap();
            assert!(b.get("next").unwrap().as_object().unwrap().ptr_eq(a));
            assert!(b.get("me").unwrap().as_object().unwrap().ptr_eq(b));
        }
    }
}

#[test]
fn constructed_objects_are_shared() {
    let registry = Arc::new(registry());
    let circle = registry
        .instantiate(&ty(&registry, "app.Circle"), 0)
        .unwrap()
        .with("radius", 2.5f64)
        .into_ref();
    let pair = object(&registry, "app.Pair");
    pair.set("first", circle.clone());
    pair.set("second", circle);
    let root = Value::Object(pair);

    for format in FORMATS {
        let mut serializer = serializer(&registry, Mode::Declared, format);
        let copy = round_trip(&mut serializer, &root);
        assert!(copy.deep_eq(&root), "{format:?}");

        let pair = copy.as_object().unwrap();
        let first = pair.get("first").unwrap();
        let second = pair.get("second").unwrap();
        assert!(first.as_object().unwrap().ptr_eq(second.as_object().unwrap()));
    }
}

#[test]
fn failing_constructor_propagates() {
    let registry = Arc::new(registry());
    let broken = registry
        .instantiate(&ty(&registry, "app.Broken"), 0)
        .unwrap()
        .with("radius", 1.0f64)
        .into_ref();

    let mut serializer = GraphSerializer::new(registry.clone());
    let bytes = to_bytes(&mut serializer, &Value::Object(broken));

    // The checker never constructs.
    assert!(serializer.check(&bytes[..]));
    assert!(matches!(
        serializer.deserialize(&bytes[..]),
        Err(DeserializeError::Construct(_))
    ));
}

// -----------------------------------------------------------------------------
// Member policy

#[test]
fn type_override_substitutes_the_target() {
    let registry = Arc::new(registry());
    let legacy = object(&registry, "app.LegacyUser");
    legacy.set("name", "ada");
    legacy.set("age", 36);

    let mut writer = GraphSerializer::new(registry.clone());
    let bytes = to_bytes(&mut writer, &Value::Object(legacy));

    let mut reader = GraphSerializer::new(registry.clone())
        .with_overrides(TypeOverrides::new().with_type(full("app.LegacyUser"), full("app.User")));
    assert!(reader.check(&bytes[..]));

    let user = reader.deserialize(&bytes[..]).unwrap();
    let user = user.as_object().unwrap();
    assert_eq!(user.type_handle().name(), full("app.User"));
    assert_eq!(user.get("name").unwrap().as_str(), Some("ada"));
    assert_eq!(user.get("age").unwrap().as_i128(), Some(36));
}

#[test]
fn false_condition_omits_the_value() {
    let registry = Arc::new(registry());
    let gated = |flag: bool, extra: &str| {
        let object = object(&registry, "app.Gated");
        object.set("has_extra", flag);
        object.set("extra", extra);
        Value::Object(object)
    };

    for format in FORMATS {
        let mut serializer = serializer(&registry, Mode::Default, format);

        let hidden = to_bytes(&mut serializer, &gated(false, "secret"));
        let other = to_bytes(&mut serializer, &gated(false, "something else"));
        assert_eq!(hidden, other);

        let copy = serializer.deserialize(&hidden[..]).unwrap();
        let extra = copy.as_object().unwrap().get("extra").unwrap();
        assert!(extra.deep_eq(&Value::default_of(PrimitiveKind::String)));

        let shown = gated(true, "secret");
        assert!(round_trip(&mut serializer, &shown).deep_eq(&shown));
    }
}

#[test]
fn read_only_property_is_written_but_not_read() {
    let registry = Arc::new(registry());
    let stamped = object(&registry, "app.Stamped");
    stamped.set("id", 5);
    stamped.set("created", "2020-01-01");
    stamped.set("code", 77);
    let root = Value::Object(stamped);

    let mut serializer = GraphSerializer::new(registry.clone());
    let bytes = to_bytes(&mut serializer, &root);
    let needle: Vec<u8> = "2020-01-01".encode_utf16().flat_map(u16::to_le_bytes).collect();
    assert!(bytes.windows(needle.len()).any(|w| w == needle));

    let copy = serializer.deserialize(&bytes[..]).unwrap();
    assert!(!copy.deep_eq(&root));

    let copy = copy.as_object().unwrap();
    assert_eq!(copy.get("id").unwrap().as_i128(), Some(5));
    // Read-only, but declares an alternate setter.
    assert_eq!(copy.get("code").unwrap().as_i128(), Some(77));
    assert!(copy.get("created").unwrap().deep_eq(&Value::default_of(PrimitiveKind::String)));
}

#[test]
fn custom_adapter_is_tried_first() {
    struct Tally;

    struct TallyInserter(ObjectRef);

    impl Inserter for TallyInserter {
        fn append(&mut self, value: Value) -> Result<(), InsertError> {
            let mut object = self.0.write();
            let total = object.get("total").and_then(Value::as_i128).unwrap_or(0);
            object.set("total", (total + 1) as i64);
            object.push_item(value);
            Ok(())
        }
    }

    impl CollectionAdapter for Tally {
        fn name(&self) -> &str {
            "tally"
        }

        fn try_match_type(&self, ty: &TypeHandle, _registry: &TypeRegistry) -> Option<MemberType> {
            ty.name().contains("app.Tally").then_some(MemberType::Primitive(PrimitiveKind::String))
        }

        fn bind(&self, target: ObjectRef, _ty: &TypeHandle, _registry: &TypeRegistry) -> Box<dyn Inserter> {
            Box::new(TallyInserter(target))
        }
    }

    let registry = Arc::new(registry());
    let tally = registry
        .instantiate(&ty(&registry, "app.Tally"), 0)
        .unwrap()
        .with_items(["x", "y"])
        .into_ref();
    let root = Value::Object(tally);

    let mut serializer = GraphSerializer::new(registry.clone()).with_adapter(Tally);
    let copy = round_trip(&mut serializer, &root);
    let copy = copy.as_object().unwrap();
    assert_eq!(copy.read().items().len(), 2);
    // Members are read after the elements and overwrite the tally.
    assert_eq!(copy.get("total").unwrap().as_i128(), Some(0));

    // Without the adapter the type is a plain object.
    let mut plain = GraphSerializer::new(registry.clone());
    let copy = round_trip(&mut plain, &root);
    assert!(copy.as_object().unwrap().read().items().is_empty());
}

// -----------------------------------------------------------------------------
// Leniency and failures

/// Writes a stream by hand.
fn craft(f: impl FnOnce(&mut BinaryEncoder<Vec<u8>>)) -> Vec<u8> {
    let mut encoder = BinaryEncoder::new(ByteWriter::new(Vec::new(), 64));
    f(&mut encoder);
    encoder.finish().unwrap();
    encoder.into_inner()
}

#[test]
fn corrupted_type_name_fails_the_check() {
    let registry = Arc::new(registry());
    let plain = object(&registry, "app.Plain");
    plain.set("text", "test");

    let mut serializer = GraphSerializer::new(registry.clone());
    let mut bytes = to_bytes(&mut serializer, &Value::Object(plain));
    assert!(serializer.check(&bytes[..]));

    // Mode, then the length of the root type name, then its first unit.
    assert_eq!(bytes[12], b'a');
    bytes[12] = b'z';
    assert!(!serializer.check(&bytes[..]));
    assert!(matches!(
        serializer.deserialize(&bytes[..]),
        Err(DeserializeError::Resolve(_))
    ));
    bytes[12] = b'a';

    // Truncation is never silent either.
    assert!(!serializer.check(&bytes[..bytes.len() - 1]));
    assert!(!serializer.check(&b""[..]));
    assert!(!serializer.check(&b"Mode=Sideways\n"[..]));
}

#[test]
fn dangling_back_reference_reads_as_null() {
    let registry = Arc::new(registry());
    let bytes = craft(|e| {
        e.write_mode(Mode::Default).unwrap();
        e.write_type_name(&full("app.Node")).unwrap();
        e.write_tag(ObjectTag::ObjectReference).unwrap();
        e.write_primitive(&Value::from("n")).unwrap();
        e.write_type_name(&full("app.Node")).unwrap();
        e.write_tag(ObjectTag::ObjectIndex).unwrap();
        e.write_index(7).unwrap();
        e.write_null().unwrap();
        e.end_occurrence().unwrap();
    });

    let mut serializer = GraphSerializer::new(registry.clone());
    assert!(!serializer.check(&bytes[..]));

    let node = serializer.deserialize(&bytes[..]).unwrap();
    let node = node.as_object().unwrap();
    assert_eq!(node.get("label").unwrap().as_str(), Some("n"));
    assert!(node.get("me").unwrap().is_null());
}

#[test]
fn constructor_argument_cannot_see_its_own_object() {
    let registry = Arc::new(registry());
    let looped = object(&registry, "app.Loop");
    looped.set("me", looped.clone());
    let root = Value::Object(looped);

    for format in FORMATS {
        let mut serializer = serializer(&registry, Mode::Default, format);
        let bytes = to_bytes(&mut serializer, &root);

        // The argument is written as a back-reference to the reserved slot.
        assert!(!serializer.check(&bytes[..]), "{format:?}");

        let copy = serializer.deserialize(&bytes[..]).unwrap();
        let copy = copy.as_object().unwrap();
        assert_eq!(copy.type_handle().name(), full("app.Loop"));
        assert!(copy.get("me").unwrap().is_null(), "{format:?}");
    }
}

#[test]
fn malformed_leaf_reads_as_default() {
    let registry = Arc::new(registry());
    let bytes = craft(|e| {
        e.write_mode(Mode::Default).unwrap();
        e.write_type_name(&full("app.Flag")).unwrap();
        e.write_tag(ObjectTag::ObjectReference).unwrap();
        // Not a valid boolean byte.
        e.write_primitive(&Value::U8(7)).unwrap();
        e.end_occurrence().unwrap();
    });

    let mut serializer = GraphSerializer::new(registry.clone());
    assert!(!serializer.check(&bytes[..]));

    let flag = serializer.deserialize(&bytes[..]).unwrap();
    assert_eq!(flag.as_object().unwrap().get("on").unwrap().as_bool(), Some(false));
}

#[test]
fn unassignable_value_keeps_the_default() {
    let registry = Arc::new(registry());
    let bytes = craft(|e| {
        e.write_mode(Mode::Default).unwrap();
        e.write_type_name(&full("app.Owner")).unwrap();
        e.write_tag(ObjectTag::ObjectReference).unwrap();
        // `pet` is declared as `app.Plain`.
        e.write_type_name(&full("app.Node")).unwrap();
        e.write_tag(ObjectTag::ObjectReference).unwrap();
        e.end_occurrence().unwrap();
        // Body of the node.
        e.write_primitive(&Value::from("stray")).unwrap();
        e.write_null().unwrap();
        e.write_null().unwrap();
        e.end_occurrence().unwrap();
    });

    let mut serializer = GraphSerializer::new(registry.clone());
    assert!(serializer.check(&bytes[..]));

    let owner = serializer.deserialize(&bytes[..]).unwrap();
    assert!(owner.as_object().unwrap().get("pet").unwrap().is_null());
}

#[test]
fn unknown_member_name_is_an_error() {
    let registry = Arc::new(registry());
    let bytes = craft(|e| {
        e.write_mode(Mode::ByName).unwrap();
        e.write_type_name(&full("app.Plain")).unwrap();
        e.write_tag(ObjectTag::ObjectReference).unwrap();
        e.write_member_names(&["bogus"]).unwrap();
        e.write_primitive(&Value::from("x")).unwrap();
        e.end_occurrence().unwrap();
    });

    let mut serializer = GraphSerializer::new(registry.clone());
    assert!(!serializer.check(&bytes[..]));
    assert!(matches!(
        serializer.deserialize(&bytes[..]),
        Err(DeserializeError::UnknownMember { member, .. }) if member == "bogus"
    ));
}

#[test]
fn format_and_root_type_are_enforced() {
    let registry = Arc::new(registry());
    let plain = object(&registry, "app.Plain");
    let root = Value::Object(plain);

    let mut text = serializer(&registry, Mode::Default, Format::TextPreferred);
    let bytes = to_bytes(&mut text, &root);
    assert!(bytes.starts_with(b"Mode=Default"));

    let mut binary_only = serializer(&registry, Mode::Default, Format::BinaryOnly);
    assert!(!binary_only.check(&bytes[..]));
    assert!(matches!(
        binary_only.deserialize(&bytes[..]),
        Err(DeserializeError::FormatMismatch { .. })
    ));

    // A preferred format reads both encodings.
    let mut binary = serializer(&registry, Mode::Default, Format::BinaryPreferred);
    assert!(binary.check(&bytes[..]));

    binary.options_mut().root_type = Some("app.Plain".to_owned());
    assert!(binary.deserialize(&bytes[..]).is_ok());

    binary.options_mut().root_type = Some("app.Node".to_owned());
    assert!(!binary.check(&bytes[..]));
    assert!(matches!(
        binary.deserialize(&bytes[..]),
        Err(DeserializeError::RootTypeMismatch { .. })
    ));
}

#[test]
fn depth_is_bounded() {
    let registry = Arc::new(registry());
    let wrap = ty(&registry, "app.Wrap");
    let mut value = Value::Null;
    for _ in 0..3 {
        value = Value::from(registry.instantiate(&wrap, 0).unwrap().with("inner", value));
    }

    let mut serializer = GraphSerializer::new(registry.clone());
    let bytes = to_bytes(&mut serializer, &value);

    serializer.options_mut().max_depth = 2;
    assert!(matches!(
        serializer.serialize(&mut Vec::new(), &value),
        Err(SerializeError::DepthExceeded(2))
    ));
    assert!(!serializer.check(&bytes[..]));
    assert!(matches!(
        serializer.deserialize(&bytes[..]),
        Err(DeserializeError::DepthExceeded(2))
    ));
}

#[test]
fn unserializable_value_is_an_error() {
    let mut registry = registry();
    let hidden = registry.register(TypeDescriptor::class(name("app.Hidden")));
    let registry = Arc::new(registry);
    let root = Value::Object(registry.instantiate(&hidden, 0).unwrap().into_ref());

    let mut serializer = GraphSerializer::new(registry.clone());
    assert!(matches!(
        serializer.serialize(&mut Vec::new(), &root),
        Err(SerializeError::NotSerializable(_))
    ));
    assert_eq!(serializer.progress(), 1.0);
}

// -----------------------------------------------------------------------------
// Progress & async

#[test]
fn progress_ends_at_one() {
    let registry = Arc::new(registry());
    let mut serializer = GraphSerializer::new(registry.clone());
    let handle = serializer.progress_handle();
    assert_eq!(handle.get(), 0.0);

    let pair = object(&registry, "app.Pair");
    pair.set("first", object(&registry, "app.Plain"));
    pair.set("second", object(&registry, "app.Plain"));
    let bytes = to_bytes(&mut serializer, &Value::Object(pair));
    assert_eq!(handle.get(), 1.0);

    serializer.deserialize(&bytes[..]).unwrap();
    assert_eq!(serializer.progress(), 1.0);
}

#[test]
fn async_calls_match_sync_calls() {
    let registry = Arc::new(registry());
    let node = object(&registry, "app.Node");
    node.set("label", "async");
    node.set("me", node.clone());
    let root = Value::Object(node);

    let serializer = GraphSerializer::new(registry.clone());
    let bytes = serializer.serialize_async(Vec::new(), root.clone()).wait().unwrap();

    assert!(serializer.check_async(Cursor::new(bytes.clone())).wait());
    let copy = serializer.deserialize_async(Cursor::new(bytes)).wait().unwrap();
    assert!(copy.deep_eq(&root));
    assert_eq!(serializer.progress(), 1.0);

    let awaited = futures_lite::future::block_on(async {
        serializer.check_async(Cursor::new(Vec::new())).await
    });
    assert!(!awaited);
}
