//! Field accessors and optional conversions for structs and contracts.
//!
//! Optional structs travel as a single `tuple` holding the struct's leaves,
//! or `null` when absent. `__gen_T_as_optional` packs a tensor into that
//! tuple and `__gen_T_not_null` unpacks it, throwing on `null`.

use tact_ir::{TypeDescription, TypeGraph};

use crate::context::{Flag, WriterContext};
use crate::func_type::resolve_func_type_of;
use crate::stdlib::{exit_code, tuple_create, tuple_destroy};
use crate::tensor::{RenderMode, Tensor};

pub fn getter_name(type_name: &str, field: &str) -> String {
    format!("__gen_{type_name}_get_{field}")
}

pub fn as_optional_name(type_name: &str) -> String {
    format!("__gen_{type_name}_as_optional")
}

pub fn not_null_name(type_name: &str) -> String {
    format!("__gen_{type_name}_not_null")
}

/// Declare a field getter for every field of `desc`.
///
/// Optional conversions are not declared here; use sites ask for them
/// through [`as_optional`] and [`not_null`].
pub fn write_accessors(desc: &TypeDescription, graph: &TypeGraph, ctx: &mut WriterContext) {
    let ty = resolve_func_type_of(desc, graph);
    let fields: Vec<String> = desc.fields.iter().map(|f| format!("v'{}", f.name)).collect();

    for field in &desc.fields {
        let name = getter_name(&desc.name, &field.name);
        ctx.fun(&name, |ctx| {
            ctx.signature(format!("_ {name}({ty} v)"));
            ctx.flag(Flag::Inline);
            ctx.body(|ctx| {
                ctx.append(format!("var ({}) = v;", fields.join(", ")));
                ctx.append(format!("return v'{};", field.name));
            });
        });
    }
}

/// Declare `__gen_T_as_optional` for struct `type_name` on demand and
/// return its name.
pub fn as_optional(type_name: &str, graph: &TypeGraph, ctx: &mut WriterContext) -> String {
    let name = as_optional_name(type_name);
    ctx.fun(&name, |ctx| {
        let desc = graph.get_type(type_name);
        let ty = resolve_func_type_of(desc, graph);
        let tensor = Tensor::resolve(&desc.fields, graph, "v");
        let leaves: Vec<&str> = tensor.leaves().into_iter().map(|(name, _)| name).collect();

        ctx.signature(format!("tuple {name}({ty} v)"));
        ctx.flag(Flag::Inline);
        ctx.body(|ctx| {
            if leaves.is_empty() {
                ctx.append("return empty_tuple();");
                return;
            }
            ctx.append(tensor.bind("v"));
            let create = tuple_create(ctx, leaves.len());
            ctx.append(format!("return {create}({});", leaves.join(", ")));
        });
    });
    ctx.used(&name)
}

/// Declare `__gen_T_not_null` for struct `type_name` on demand and return
/// its name.
pub fn not_null(type_name: &str, graph: &TypeGraph, ctx: &mut WriterContext) -> String {
    let name = not_null_name(type_name);
    ctx.fun(&name, |ctx| {
        let desc = graph.get_type(type_name);
        let ty = resolve_func_type_of(desc, graph);
        let tensor = Tensor::resolve(&desc.fields, graph, "v");

        ctx.signature(format!("{ty} {name}(tuple v)"));
        ctx.flag(Flag::Inline);
        ctx.body(|ctx| {
            ctx.append(format!(
                "throw_if({}, null?(v));",
                exit_code::NULL_REFERENCE
            ));
            let leaves = tensor.leaves();
            if leaves.is_empty() {
                ctx.append("return v;");
                return;
            }
            let destroy = tuple_destroy(ctx, leaves.len());
            let typed: Vec<String> = leaves
                .into_iter()
                .map(|(name, ty)| format!("{ty} {name}"))
                .collect();
            ctx.append(format!("var ({}) = {destroy}(v);", typed.join(", ")));
            ctx.append(format!("return {};", tensor.render(RenderMode::Names)));
        });
    });
    ctx.used(&name)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tact_ir::TypeRef;

    use super::*;

    fn graph() -> TypeGraph {
        TypeGraph::new(
            vec![
                TypeDescription::primitive("Int"),
                TypeDescription::primitive("Address"),
                TypeDescription::structure("Point", 1)
                    .with_field("x", TypeRef::simple("Int"))
                    .with_field("y", TypeRef::simple("Int")),
                TypeDescription::structure("Line", 2)
                    .with_field("a", TypeRef::simple("Point"))
                    .with_field("owner", TypeRef::simple("Address")),
                TypeDescription::contract("Keeper", 3).with_field("line", TypeRef::simple("Line")),
            ],
            vec![],
        )
    }

    fn render_used(names: &[String]) -> String {
        let graph = graph();
        let mut ctx = WriterContext::new();
        for desc in graph.types().iter().filter(|t| t.is_aggregate()) {
            write_accessors(desc, &graph, &mut ctx);
        }
        for name in names {
            ctx.used(name);
        }
        ctx.render(false)
    }

    #[test]
    fn field_getter() {
        let out = render_used(&[getter_name("Line", "owner")]);
        assert!(out.contains(
            "_ __gen_Line_get_owner(((int, int), slice) v) inline {\n    var (v'a, v'owner) = v;\n    return v'owner;\n}"
        ));
    }

    #[test]
    fn optional_conversions_flatten_leaves() {
        let graph = graph();
        let mut ctx = WriterContext::new();
        assert_eq!(as_optional("Line", &graph, &mut ctx), "__gen_Line_as_optional");
        assert_eq!(not_null("Line", &graph, &mut ctx), "__gen_Line_not_null");
        let out = ctx.render(false);
        assert!(out.contains(
            "tuple __gen_Line_as_optional(((int, int), slice) v) inline {\n    \
             var ((int v'a'x, int v'a'y), slice v'owner) = v;\n    \
             return __tact_tuple_create_3(v'a'x, v'a'y, v'owner);\n}"
        ));
        assert!(out.contains(
            "((int, int), slice) __gen_Line_not_null(tuple v) inline {\n    \
             throw_if(128, null?(v));\n    \
             var (int v'a'x, int v'a'y, slice v'owner) = __tact_tuple_destroy_3(v);\n    \
             return ((v'a'x, v'a'y), v'owner);\n}"
        ));
        assert!(out.contains("asm \"3 TUPLE\";"));
    }

    #[test]
    fn optional_conversions_are_declared_on_demand() {
        let graph = graph();
        let mut ctx = WriterContext::new();
        for desc in graph.types().iter().filter(|t| t.is_aggregate()) {
            write_accessors(desc, &graph, &mut ctx);
        }
        assert!(ctx.is_declared(&getter_name("Keeper", "line")));
        assert!(!ctx.is_declared(&as_optional_name("Line")));
        assert!(!ctx.is_declared(&not_null_name("Point")));
    }

    #[test]
    fn wide_structs_use_variable_tuples() {
        let mut wide = TypeDescription::structure("Wide", 9);
        for i in 0..20 {
            wide = wide.with_field(format!("f{i}"), TypeRef::simple("Int"));
        }
        let graph = TypeGraph::new(vec![TypeDescription::primitive("Int"), wide], vec![]);
        let mut ctx = WriterContext::new();
        as_optional("Wide", &graph, &mut ctx);
        not_null("Wide", &graph, &mut ctx);
        let out = ctx.render(false);
        assert!(out.contains("__tact_tuple_create_20(v'f0, v'f1,"));
        assert!(out.contains("asm \"20 PUSHINT TUPLEVAR\";"));
        assert!(out.contains("asm \"20 PUSHINT UNTUPLEVAR\";"));
    }

    #[test]
    fn contract_getters_take_the_whole_state() {
        let out = render_used(&[getter_name("Keeper", "line")]);
        assert!(out.contains("_ __gen_Keeper_get_line((((int, int), slice)) v) inline {"));
    }

    #[test]
    fn unused_accessors_are_dropped() {
        let out = render_used(&[]);
        assert_eq!(out, "#pragma version >=0.4.0;\n#include \"stdlib.fc\";\n");
    }
}
