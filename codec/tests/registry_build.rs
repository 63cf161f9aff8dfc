use codec::{
    BindOp, OpcodeDescriptor, OpcodeRegistry, PlanItem, RegistryError, Skip, SkipReason,
};
use layout::{FieldKind, LayoutId, LayoutSet, RecordLayout};
use schema::{FieldType, MessageSchema, SchemaSet};

fn layouts() -> LayoutSet {
    LayoutSet::builder()
        .layout(
            RecordLayout::new("Tint")
                .field("red", FieldKind::uint(1))
                .field("blue", FieldKind::uint(1)),
        )
        .layout(
            RecordLayout::new("Zone")
                .field("zone_id", FieldKind::uint(2))
                .field("name", FieldKind::owned_string())
                .field("next", FieldKind::list("Zone")),
        )
        .layout(
            RecordLayout::new("Player")
                .field("hp", FieldKind::sint(4))
                .field("color", FieldKind::nested("Tint"))
                .field("zones", FieldKind::list("Zone")),
        )
        .build()
        .unwrap()
}

fn schemas() -> SchemaSet {
    SchemaSet::builder()
        .schema(
            MessageSchema::new("Tint")
                .field("red", 1, FieldType::Int32)
                .field("blue", 2, FieldType::Int32),
        )
        .schema(
            MessageSchema::new("Zone")
                .field("zone_id", 1, FieldType::Int32)
                .field("name", 2, FieldType::String)
                .field("next", 3, FieldType::Int32),
        )
        .schema(
            MessageSchema::new("Player")
                .field("hp", 1, FieldType::Int32)
                .field("color", 2, FieldType::message("Tint"))
                .field("zones", 3, FieldType::repeated("Zone")),
        )
        .build()
        .unwrap()
}

#[test]
fn missing_nested_opcode_is_a_build_error() {
    let err = OpcodeRegistry::builder(layouts(), schemas())
        .opcode(OpcodeDescriptor::new(1, "Player", "Player"))
        .opcode(OpcodeDescriptor::new(3, "Zone", "Zone"))
        .build()
        .unwrap_err();
    assert_eq!(
        err,
        RegistryError::MissingNestedOpcode {
            opcode: 1,
            field: "color".to_string(),
            layout: LayoutId::new("Tint"),
        }
    );
}

#[test]
fn missing_repeated_target_is_a_build_error() {
    let err = OpcodeRegistry::builder(layouts(), schemas())
        .opcode(OpcodeDescriptor::new(1, "Player", "Player"))
        .opcode(OpcodeDescriptor::new(2, "Tint", "Tint"))
        .opcode(OpcodeDescriptor::new(3, "Zone", "Zone").repeated("visited"))
        .build()
        .unwrap_err();
    assert_eq!(
        err,
        RegistryError::MissingRepeatedField {
            opcode: 1,
            field: "zones".to_string(),
            target: "visited".to_string(),
        }
    );
}

#[test]
fn plans_bind_in_schema_order() {
    let registry = OpcodeRegistry::builder(layouts(), schemas())
        .opcode(OpcodeDescriptor::new(1, "Player", "Player"))
        .opcode(OpcodeDescriptor::new(2, "Tint", "Tint"))
        .opcode(OpcodeDescriptor::new(3, "Zone", "Zone").repeated("zones"))
        .build()
        .unwrap();

    let plan = registry.plan(1).unwrap();
    let ops: Vec<&BindOp> = plan.bound().map(|entry| &entry.op).collect();
    assert!(matches!(ops[0], BindOp::Scalar(_)));
    assert_eq!(ops[1], &BindOp::Nested { opcode: 2 });
    assert_eq!(ops[2], &BindOp::List { opcode: 3, target: 2 });
    assert_eq!(
        plan.occupied_size(),
        4 + 2 + layout::POINTER_SIZE
    );

    // The node's own link is never bound, even when the schema names it.
    let zone = registry.plan(3).unwrap();
    assert_eq!(
        zone.items().last(),
        Some(&PlanItem::Skip(Skip {
            field: "next".to_string(),
            reason: SkipReason::ListLink,
        }))
    );
}

#[test]
fn incompatible_types_are_skipped() {
    let schemas = SchemaSet::builder()
        .schema(MessageSchema::new("Tint").field("red", 1, FieldType::Bool))
        .schema(
            MessageSchema::new("Zone")
                .field("zone_id", 1, FieldType::String)
                .field("name", 2, FieldType::String),
        )
        .schema(
            MessageSchema::new("Player")
                .field("hp", 1, FieldType::Int32)
                .field("color", 2, FieldType::Int32)
                .field("zones", 3, FieldType::repeated("Tint")),
        )
        .build()
        .unwrap();
    let registry = OpcodeRegistry::builder(layouts(), schemas)
        .opcode(OpcodeDescriptor::new(1, "Player", "Player"))
        .opcode(OpcodeDescriptor::new(2, "Tint", "Tint"))
        .opcode(OpcodeDescriptor::new(3, "Zone", "Zone"))
        .build()
        .unwrap();

    let skipped: Vec<(&str, SkipReason)> = registry
        .plan(1)
        .unwrap()
        .skipped()
        .map(|skip| (skip.field.as_str(), skip.reason))
        .collect();
    assert_eq!(
        skipped,
        vec![
            ("color", SkipReason::TypeMismatch),
            ("zones", SkipReason::TypeMismatch),
        ]
    );
    assert_eq!(registry.plan(2).unwrap().skipped().count(), 1);
    assert_eq!(registry.plan(3).unwrap().skipped().count(), 1);
}

#[test]
fn shared_layout_resolves_to_repeated_then_lowest_opcode() {
    let registry = OpcodeRegistry::builder(layouts(), schemas())
        .opcode(OpcodeDescriptor::new(1, "Player", "Player"))
        .opcode(OpcodeDescriptor::new(0x10, "Tint", "Tint"))
        .opcode(OpcodeDescriptor::new(0x05, "Tint", "Tint"))
        .opcode(OpcodeDescriptor::new(0x30, "Zone", "Zone"))
        .opcode(OpcodeDescriptor::new(0x20, "Zone", "Zone").repeated("zones"))
        .build()
        .unwrap();
    assert_eq!(registry.opcode_for_layout(&LayoutId::new("Tint")), Some(0x05));
    assert_eq!(registry.opcode_for_layout(&LayoutId::new("Zone")), Some(0x20));
    assert_eq!(
        registry.plan(1).unwrap().bound().nth(1).map(|entry| &entry.op),
        Some(&BindOp::Nested { opcode: 0x05 })
    );
}

#[cfg(feature = "serde")]
#[test]
fn registry_from_json_config() {
    let config = codec::RegistryConfig {
        layouts: layouts().iter().map(|layout| (**layout).clone()).collect(),
        schemas: schemas().iter().map(|schema| (**schema).clone()).collect(),
        opcodes: vec![
            OpcodeDescriptor::new(1, "Player", "Player"),
            OpcodeDescriptor::new(2, "Tint", "Tint"),
            OpcodeDescriptor::new(3, "Zone", "Zone").repeated("zones"),
        ],
    };
    let text = config.to_json().unwrap();
    let built = codec::RegistryConfig::from_json(&text).unwrap().build().unwrap();
    let direct = config.build().unwrap();
    assert_eq!(built.fingerprint(), direct.fingerprint());
}
