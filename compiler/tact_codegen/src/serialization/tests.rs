use pretty_assertions::assert_eq;
use tact_ir::{ReceiverDescription, ReceiverSelector, TypeDescription, TypeRef};

use super::*;
use crate::accessors::write_accessors;
use crate::allocation::Allocations;
use crate::stdlib::write_stdlib;

fn primitives() -> Vec<TypeDescription> {
    ["Int", "Bool", "Address", "Cell", "Slice", "String"]
        .into_iter()
        .map(TypeDescription::primitive)
        .collect()
}

fn receives(contract: &str, messages: &[&str]) -> TypeDescription {
    let mut c = TypeDescription::contract(contract, 100);
    for message in messages {
        c = c.with_receiver(ReceiverDescription::new(
            ReceiverSelector::InternalBinary {
                type_name: (*message).to_string(),
                arg: "msg".to_string(),
            },
            vec![],
        ));
    }
    c
}

/// Render every serializer and parser, keeping those named in `used`.
fn render(types: Vec<TypeDescription>, used: &[&str]) -> String {
    let mut all = primitives();
    all.extend(types);
    let graph = TypeGraph::new(all, vec![]);
    let mut ctx = WriterContext::new();
    write_stdlib(&mut ctx);
    for allocation in Allocations::resolve(&graph).iter() {
        write_serializer(allocation, &graph, &mut ctx);
        write_parser(allocation, &graph, &mut ctx);
    }
    for desc in graph.types().iter().filter(|t| t.is_aggregate()) {
        write_accessors(desc, &graph, &mut ctx);
    }
    for name in used {
        ctx.used(name);
    }
    ctx.render(false)
}

fn deploy() -> TypeDescription {
    TypeDescription::structure("Deploy", 1).with_field_as(
        "queryId",
        TypeRef::simple("Int"),
        Some("uint64"),
    )
}

// ── Messages ──

#[test]
fn deploy_writer() {
    let out = render(
        vec![deploy(), receives("Counter", &["Deploy"])],
        &["__gen_write_Deploy"],
    );
    assert!(out.contains(
        "builder __gen_write_Deploy(builder build_0, (int) v) inline {\n    \
         var (v'queryId) = v;\n    \
         build_0 = build_0.store_uint(2490013878, 32);\n    \
         build_0 = build_0.store_uint(v'queryId, 64);\n    \
         return build_0;\n}"
    ));
    assert!(!out.contains("__gen_read_Deploy"));
}

#[test]
fn deploy_parser_checks_the_prefix() {
    let out = render(
        vec![deploy(), receives("Counter", &["Deploy"])],
        &["__gen_read_Deploy"],
    );
    assert!(out.contains(
        "(slice, (int)) __gen_read_Deploy(slice sc_0) inline {\n    \
         throw_unless(129, sc_0~load_uint(32) == 2490013878);\n    \
         var v'queryId = sc_0~load_uint(64);\n    \
         return (sc_0, (v'queryId));\n}"
    ));
}

#[test]
fn plain_structs_have_no_prefix() {
    let out = render(vec![deploy()], &["__gen_write_Deploy", "__gen_read_Deploy"]);
    assert!(!out.contains("store_uint(2490013878, 32)"));
    assert!(!out.contains("throw_unless(129"));
}

#[test]
fn empty_structs() {
    let out = render(
        vec![TypeDescription::structure("Unit", 1)],
        &["__gen_write_Unit", "__gen_read_Unit"],
    );
    assert!(out.contains(
        "builder __gen_write_Unit(builder build_0, tuple v) inline {\n    return build_0;\n}"
    ));
    assert!(out.contains(
        "(slice, tuple) __gen_read_Unit(slice sc_0) inline {\n    return (sc_0, null());\n}"
    ));
}

// ── Field kinds ──

#[test]
fn optional_and_coin_fields() {
    let transfer = TypeDescription::structure("Transfer", 1)
        .with_field("to", TypeRef::simple("Address"))
        .with_field_as("amount", TypeRef::simple("Int"), Some("coins"))
        .with_field("payload", TypeRef::optional("Cell"));
    let out = render(
        vec![transfer],
        &["__gen_write_Transfer", "__gen_read_Transfer"],
    );
    assert!(out.contains("build_0 = __tact_store_address(build_0, v'to);"));
    assert!(out.contains("build_0 = build_0.store_coins(v'amount);"));
    assert!(out.contains(
        "    if (null?(v'payload)) {\n        \
         build_0 = build_0.store_int(false, 1);\n    \
         } else {\n        \
         build_0 = build_0.store_int(true, 1);\n        \
         build_0 = build_0.store_ref(v'payload);\n    }"
    ));
    assert!(out.contains("var v'to = sc_0~__tact_load_address();"));
    assert!(out.contains(
        "    cell v'payload = null();\n    \
         if (sc_0~load_int(1)) {\n        \
         v'payload = sc_0~load_ref();\n    }"
    ));
    // Address helpers bring their verification along.
    assert!(out.contains("slice __tact_verify_address(slice address) inline {"));
}

#[test]
fn nested_structs() {
    let point = TypeDescription::structure("Point", 1)
        .with_field("x", TypeRef::simple("Int"))
        .with_field("y", TypeRef::simple("Int"));
    let line = TypeDescription::structure("Line", 2)
        .with_field("a", TypeRef::simple("Point"))
        .with_field("b", TypeRef::optional("Point"));
    let out = render(vec![point, line], &["__gen_write_Line", "__gen_read_Line"]);

    assert!(out.contains("build_0 = __gen_write_Point(build_0, v'a);"));
    assert!(out.contains(
        "build_0 = build_0.store_ref(__gen_write_Point(begin_cell(), __gen_Point_not_null(v'b)).end_cell());"
    ));
    assert!(out.contains("var v'a = sc_0~__gen_read_Point();"));
    assert!(out.contains(
        "    if (sc_0~load_int(1)) {\n        \
         slice sc_0'b = sc_0~load_ref().begin_parse();\n        \
         v'b = __gen_Point_as_optional(sc_0'b~__gen_read_Point());\n    }"
    ));
    // The nested helpers become reachable through the outer ones.
    assert!(out.contains("builder __gen_write_Point(builder build_0, (int, int) v) inline {"));
    assert!(out.contains("tuple __gen_Point_as_optional((int, int) v) inline {"));
}

#[test]
fn structs_ending_in_a_remainder_get_their_own_cell() {
    let tail = TypeDescription::structure("Tail", 1)
        .with_field_as("a", TypeRef::simple("Int"), Some("uint8"))
        .with_field_as("rest", TypeRef::simple("Slice"), Some("remaining"));
    let outer = TypeDescription::structure("Outer", 2)
        .with_field("inner", TypeRef::simple("Tail"))
        .with_field_as("y", TypeRef::simple("Int"), Some("uint8"));
    let out = render(vec![tail, outer], &["__gen_write_Outer", "__gen_read_Outer"]);

    assert!(out.contains(
        "    build_0 = build_0.store_ref(__gen_write_Tail(begin_cell(), v'inner).end_cell());\n    \
         build_0 = build_0.store_uint(v'y, 8);\n"
    ));
    assert!(out.contains(
        "    slice sc_0'inner = sc_0~load_ref().begin_parse();\n    \
         var v'inner = sc_0'inner~__gen_read_Tail();\n    \
         var v'y = sc_0~load_uint(8);\n"
    ));
    // The remainder only ever sees the boxed cell.
    assert!(out.contains("    build_0 = build_0.store_slice(v'rest);\n"));
    assert!(out.contains("    var v'rest = sc_0;\n"));
}

// ── Chaining ──

#[test]
fn chained_cells_are_written_and_read_in_the_same_order() {
    let mut wide = TypeDescription::structure("Wide", 1);
    for name in ["a", "b", "c", "d", "e"] {
        wide = wide.with_field(name, TypeRef::simple("Address"));
    }
    let out = render(vec![wide], &["__gen_write_Wide", "__gen_read_Wide"]);

    assert!(out.contains(
        "    build_0 = __tact_store_address(build_0, v'c);\n    \
         var build_1 = begin_cell();\n    \
         build_1 = __tact_store_address(build_1, v'd);\n    \
         build_1 = __tact_store_address(build_1, v'e);\n    \
         build_0 = build_0.store_ref(build_1.end_cell());\n    \
         return build_0;"
    ));
    assert!(out.contains(
        "    var v'c = sc_0~__tact_load_address();\n    \
         slice sc_1 = sc_0~load_ref().begin_parse();\n    \
         var v'd = sc_1~__tact_load_address();\n    \
         var v'e = sc_1~__tact_load_address();\n    \
         return (sc_0, (v'a, v'b, v'c, v'd, v'e));"
    ));
}

#[test]
fn writer_and_parser_agree_on_field_order() {
    let mut wide = TypeDescription::structure("Wide", 1);
    for name in ["a", "b", "c", "d", "e", "f", "g"] {
        wide = wide.with_field(name, TypeRef::simple("Address"));
    }
    let out = render(vec![wide], &["__gen_write_Wide", "__gen_read_Wide"]);

    let stored: Vec<&str> = out
        .lines()
        .filter(|l| l.trim().starts_with("build_"))
        .filter_map(|l| l.trim().split("__tact_store_address(").nth(1))
        .filter_map(|rest| rest.split(", ").nth(1))
        .map(|v| v.trim_end_matches(");"))
        .collect();
    let loaded: Vec<&str> = out
        .lines()
        .filter(|l| l.contains("~__tact_load_address()"))
        .filter_map(|l| l.trim().strip_prefix("var "))
        .filter_map(|l| l.split(" = ").next())
        .collect();
    assert_eq!(stored, vec!["v'a", "v'b", "v'c", "v'd", "v'e", "v'f", "v'g"]);
    assert_eq!(stored, loaded);
}

#[test]
fn func_type_of_allocations() {
    let mut all = primitives();
    all.push(deploy());
    all.push(TypeDescription::structure("Unit", 2));
    let graph = TypeGraph::new(all, vec![]);
    let allocations = Allocations::resolve(&graph);
    assert_eq!(
        allocation_func_type(allocations.get("Deploy"), &graph),
        "(int)"
    );
    assert_eq!(allocation_func_type(allocations.get("Unit"), &graph), "tuple");
}
