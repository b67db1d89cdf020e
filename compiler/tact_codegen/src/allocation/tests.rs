use pretty_assertions::assert_eq;
use tact_ir::{InitDescription, ReceiverDescription};

use super::*;

fn primitives() -> Vec<TypeDescription> {
    ["Int", "Bool", "Address", "Cell", "Slice", "Builder", "String"]
        .into_iter()
        .map(TypeDescription::primitive)
        .collect()
}

fn binary(type_name: &str) -> ReceiverDescription {
    ReceiverDescription::new(
        ReceiverSelector::InternalBinary {
            type_name: type_name.to_string(),
            arg: "msg".to_string(),
        },
        vec![],
    )
}

fn graph_with(types: Vec<TypeDescription>) -> TypeGraph {
    let mut all = primitives();
    all.extend(types);
    TypeGraph::new(all, vec![])
}

fn names(cell: &AllocationCell) -> Vec<&str> {
    cell.ops.iter().map(|op| op.name.as_str()).collect()
}

// ── Prefixes ──

#[test]
fn payload_prefix_is_derived_from_signature() {
    let graph = graph_with(vec![
        TypeDescription::structure("Deploy", 1).with_field_as(
            "queryId",
            TypeRef::simple("Int"),
            Some("uint64"),
        ),
        TypeDescription::contract("Counter", 2).with_receiver(binary("Deploy")),
    ]);
    let engine = AllocationEngine::new(&graph);
    let deploy = engine.allocation("Deploy");
    assert_eq!(deploy.signature, "Deploy{queryId:uint64}");
    assert_eq!(deploy.prefix, Some(2_490_013_878));
    assert_eq!(deploy.root_size(), CellSize::bits(96));
}

#[test]
fn signature_formats() {
    let graph = graph_with(vec![
        TypeDescription::structure("Transfer", 1)
            .with_field("to", TypeRef::simple("Address"))
            .with_field_as("amount", TypeRef::simple("Int"), Some("coins"))
            .with_field("payload", TypeRef::optional("Cell")),
        TypeDescription::contract("Wallet", 2).with_receiver(binary("Transfer")),
    ]);
    let transfer = AllocationEngine::new(&graph).allocation("Transfer");
    assert_eq!(
        transfer.signature,
        "Transfer{to:address,amount:coins,payload:Maybe ^cell}"
    );
    assert_eq!(transfer.prefix, Some(69_046_701));
}

#[test]
fn map_and_struct_formats() {
    let graph = graph_with(vec![
        TypeDescription::structure("Point", 1).with_field("x", TypeRef::simple("Int")),
        TypeDescription::structure("Board", 2)
            .with_field("origin", TypeRef::simple("Point"))
            .with_field("cells", TypeRef::map("Int", "Point"))
            .with_field(
                "owners",
                TypeRef::Map {
                    key: "Int".to_string(),
                    value: "Address".to_string(),
                    key_as: Some("uint8".to_string()),
                    value_as: None,
                },
            )
            .with_field_as("tail", TypeRef::simple("Slice"), Some("remaining")),
    ]);
    let board = AllocationEngine::new(&graph).allocation("Board");
    assert_eq!(
        board.signature,
        "Board{origin:Point,cells:dict<int, ^Point>,owners:dict<uint8, address>,tail:remainder<slice>}"
    );
}

#[test]
fn only_payloads_get_prefixes() {
    let graph = graph_with(vec![
        TypeDescription::structure("Loose", 1)
            .with_field("x", TypeRef::simple("Int"))
            .with_prefix(7),
        TypeDescription::structure("Declared", 2)
            .with_field("x", TypeRef::simple("Int"))
            .with_prefix(0x1234_5678),
        TypeDescription::contract("C", 3).with_receiver(binary("Declared")),
    ]);
    let engine = AllocationEngine::new(&graph);
    assert_eq!(engine.allocation("Loose").prefix, None);
    assert_eq!(engine.allocation("Declared").prefix, Some(0x1234_5678));
    assert_eq!(engine.allocation("C").prefix, None);
}

// ── Field layouts ──

#[test]
fn scalar_layouts() {
    let graph = graph_with(vec![TypeDescription::structure("S", 1)
        .with_field("a", TypeRef::simple("Int"))
        .with_field_as("b", TypeRef::simple("Int"), Some("uint8"))
        .with_field_as("c", TypeRef::simple("Int"), Some("int32"))
        .with_field_as("d", TypeRef::simple("Int"), Some("coins"))
        .with_field("e", TypeRef::simple("Bool"))
        .with_field("f", TypeRef::optional("Address"))
        .with_field("g", TypeRef::simple("String"))]);
    let s = AllocationEngine::new(&graph).allocation("S");
    let layouts: Vec<_> = s.operations().map(|op| op.layout.clone()).collect();
    assert_eq!(
        layouts,
        vec![
            FieldLayout::Int {
                bits: 257,
                signed: true
            },
            FieldLayout::Int {
                bits: 8,
                signed: false
            },
            FieldLayout::Int {
                bits: 32,
                signed: true
            },
            FieldLayout::Coins,
            FieldLayout::Bool,
            FieldLayout::Address,
            FieldLayout::Reference(RefKind::String),
        ]
    );
    assert_eq!(
        s.root_size(),
        CellSize {
            bits: 257 + 8 + 32 + 124 + 1 + 1 + 267,
            refs: 1
        }
    );
}

#[test]
fn maps_take_a_bit_and_a_reference() {
    let graph = graph_with(vec![
        TypeDescription::structure("S", 1).with_field("m", TypeRef::map("Int", "Bool"))
    ]);
    let s = AllocationEngine::new(&graph).allocation("S");
    assert_eq!(s.root.ops[0].layout, FieldLayout::Dictionary);
    assert_eq!(s.root_size(), CellSize { bits: 1, refs: 1 });
}

#[test]
#[should_panic(expected = "unsupported serialization format `uint300` for `Int`")]
fn oversized_int_format_panics() {
    let graph = graph_with(vec![TypeDescription::structure("S", 1).with_field_as(
        "a",
        TypeRef::simple("Int"),
        Some("uint300"),
    )]);
    let _ = AllocationEngine::new(&graph).allocation("S");
}

#[test]
#[should_panic(expected = "`remaining` field `tail` must be the last one")]
fn remainder_must_be_last() {
    let graph = graph_with(vec![TypeDescription::structure("S", 1)
        .with_field_as("tail", TypeRef::simple("Slice"), Some("remaining"))
        .with_field("x", TypeRef::simple("Int"))]);
    let _ = AllocationEngine::new(&graph).allocation("S");
}

// ── Chaining ──

#[test]
fn bits_overflow_into_a_chained_cell() {
    let mut wide = TypeDescription::structure("Wide", 1);
    for name in ["a", "b", "c", "d", "e"] {
        wide = wide.with_field(name, TypeRef::simple("Address"));
    }
    let graph = graph_with(vec![wide]);
    let wide = AllocationEngine::new(&graph).allocation("Wide");

    assert_eq!(names(&wide.root), vec!["a", "b", "c"]);
    let next = wide.root.next.as_deref();
    assert_eq!(next.map(names), Some(vec!["d", "e"]));
    assert!(!wide.is_single_cell());
    assert_eq!(wide.root_size(), CellSize { bits: 801, refs: 1 });
    assert_eq!(
        wide.operations().map(|op| op.name.as_str()).collect::<Vec<_>>(),
        vec!["a", "b", "c", "d", "e"]
    );
}

#[test]
fn one_reference_is_kept_for_the_continuation() {
    let graph = graph_with(vec![TypeDescription::structure("Refs", 1)
        .with_field("a", TypeRef::simple("Cell"))
        .with_field("b", TypeRef::simple("Cell"))
        .with_field("c", TypeRef::simple("Cell"))
        .with_field("d", TypeRef::simple("Cell"))]);
    let refs = AllocationEngine::new(&graph).allocation("Refs");
    assert_eq!(names(&refs.root), vec!["a", "b", "c"]);
    assert_eq!(refs.root.next.as_deref().map(names), Some(vec!["d"]));
    assert_eq!(refs.root_size().refs, CELL_REFS);
}

#[test]
fn prefix_counts_against_the_root_cell() {
    let mut message = TypeDescription::structure("Big", 1);
    for name in ["a", "b", "c"] {
        message = message.with_field(name, TypeRef::simple("Int"));
    }
    message = message.with_field_as("d", TypeRef::simple("Int"), Some("uint232"));
    let graph = graph_with(vec![
        message,
        TypeDescription::contract("C", 2).with_receiver(binary("Big")),
    ]);
    let engine = AllocationEngine::new(&graph);
    let big = engine.allocation("Big");
    // 32 + 3 * 257 + 232 = 1035 > 1023
    assert_eq!(names(&big.root), vec!["a", "b", "c"]);
    assert_eq!(big.root.next.as_deref().map(names), Some(vec!["d"]));
}

// ── Nested structs ──

#[test]
fn small_structs_are_inlined() {
    let graph = graph_with(vec![
        TypeDescription::structure("Point", 1)
            .with_field("x", TypeRef::simple("Int"))
            .with_field("y", TypeRef::simple("Int")),
        TypeDescription::structure("Line", 2)
            .with_field("a", TypeRef::simple("Point"))
            .with_field("b", TypeRef::optional("Point")),
    ]);
    let line = AllocationEngine::new(&graph).allocation("Line");
    assert_eq!(
        line.root.ops[0].layout,
        FieldLayout::Struct {
            type_name: "Point".to_string(),
            boxed: false,
            size: CellSize::bits(514),
        }
    );
    // 514 + 1 + 514 does not fit, so the optional point is boxed.
    assert_eq!(
        line.root.ops[1].layout,
        FieldLayout::Struct {
            type_name: "Point".to_string(),
            boxed: true,
            size: CellSize::bits(514),
        }
    );
    assert!(line.root.ops[1].optional);
    assert!(line.is_single_cell());
}

#[test]
fn multi_cell_structs_are_boxed() {
    let mut wide = TypeDescription::structure("Wide", 1);
    for name in ["a", "b", "c", "d"] {
        wide = wide.with_field(name, TypeRef::simple("Address"));
    }
    let graph = graph_with(vec![
        wide,
        TypeDescription::structure("Holder", 2).with_field("w", TypeRef::simple("Wide")),
    ]);
    let holder = AllocationEngine::new(&graph).allocation("Holder");
    assert!(matches!(
        holder.root.ops[0].layout,
        FieldLayout::Struct { boxed: true, .. }
    ));
    assert_eq!(holder.root_size(), CellSize::refs(1));
}

#[test]
fn structs_ending_in_a_remainder_are_boxed() {
    let graph = graph_with(vec![
        TypeDescription::structure("Tail", 1)
            .with_field_as("a", TypeRef::simple("Int"), Some("uint8"))
            .with_field_as("rest", TypeRef::simple("Slice"), Some("remaining")),
        TypeDescription::structure("Outer", 2)
            .with_field("inner", TypeRef::simple("Tail"))
            .with_field_as("y", TypeRef::simple("Int"), Some("uint8")),
    ]);
    let engine = AllocationEngine::new(&graph);
    let tail = engine.allocation("Tail");
    assert!(tail.is_single_cell());
    assert!(tail.ends_in_remainder());

    let outer = engine.allocation("Outer");
    assert_eq!(
        outer.root.ops[0].layout,
        FieldLayout::Struct {
            type_name: "Tail".to_string(),
            boxed: true,
            size: CellSize::bits(8),
        }
    );
    assert_eq!(names(&outer.root), vec!["inner", "y"]);
    assert_eq!(outer.root_size(), CellSize { bits: 8, refs: 1 });
}

#[test]
#[should_panic(expected = "type `Node` contains itself")]
fn recursive_layout_panics() {
    let graph = graph_with(vec![
        TypeDescription::structure("Node", 1).with_field("next", TypeRef::optional("Node"))
    ]);
    let _ = AllocationEngine::new(&graph).allocation("Node");
}

// ── Tables ──

#[test]
fn allocations_cover_types_and_init_arguments() {
    let graph = graph_with(vec![
        TypeDescription::structure("Point", 1).with_field("x", TypeRef::simple("Int")),
        TypeDescription::contract("Counter", 2)
            .with_field("value", TypeRef::simple("Int"))
            .with_init(InitDescription {
                args: vec![tact_ir::FunctionArg::new("start", TypeRef::simple("Int"))],
                statements: vec![],
            }),
    ]);
    let allocations = Allocations::resolve(&graph);
    let names: Vec<_> = allocations.iter().map(|a| a.type_name.as_str()).collect();
    assert_eq!(names, vec!["Point", "Counter", "$init$Counter"]);

    let init = allocations.get("$init$Counter");
    assert_eq!(init.signature, "$init$Counter{start:int257}");
    assert_eq!(init.prefix, None);
    assert!(allocations.find("Missing").is_none());
}

#[test]
fn allocation_is_memoized() {
    let graph = graph_with(vec![
        TypeDescription::structure("Point", 1).with_field("x", TypeRef::simple("Int"))
    ]);
    let engine = AllocationEngine::new(&graph);
    assert_eq!(engine.allocation("Point"), engine.allocation("Point"));
}
