//! Serializers and parsers generated from allocations.
//!
//! For type `T` the writer is `builder __gen_write_T(builder build_0, <T> v)`
//! and the parser is `(slice, <T>) __gen_read_T(slice sc_0)`. Both walk the
//! allocation chain in the same order: the fields of a cell, then its
//! continuation as the last reference.

use tact_ir::TypeGraph;

use crate::accessors::{as_optional, not_null};
use crate::allocation::{Allocation, AllocationCell, AllocationOperation, FieldLayout, RefKind};
use crate::context::{Flag, WriterContext};
use crate::func_type::resolve_func_type;
use crate::stdlib::{exit_code, LOAD_ADDRESS, STORE_ADDRESS};

pub fn writer_name(type_name: &str) -> String {
    format!("__gen_write_{type_name}")
}

pub fn reader_name(type_name: &str) -> String {
    format!("__gen_read_{type_name}")
}

/// FunC type of the value an allocation describes.
pub fn allocation_func_type(allocation: &Allocation, graph: &TypeGraph) -> String {
    if allocation.is_empty() {
        return "tuple".to_string();
    }
    let parts: Vec<String> = allocation
        .operations()
        .map(|op| resolve_func_type(&op.ty, graph))
        .collect();
    format!("({})", parts.join(", "))
}

fn value_name(op: &AllocationOperation) -> String {
    format!("v'{}", op.name)
}

// ── Writer ──

pub fn write_serializer(allocation: &Allocation, graph: &TypeGraph, ctx: &mut WriterContext) {
    let name = writer_name(&allocation.type_name);
    let ty = allocation_func_type(allocation, graph);
    ctx.fun(&name, |ctx| {
        ctx.signature(format!("builder {name}(builder build_0, {ty} v)"));
        ctx.flag(Flag::Inline);
        ctx.body(|ctx| {
            let names: Vec<String> = allocation.operations().map(value_name).collect();
            if !names.is_empty() {
                ctx.append(format!("var ({}) = v;", names.join(", ")));
            }
            if let Some(prefix) = allocation.prefix {
                ctx.append(format!("build_0 = build_0.store_uint({prefix}, 32);"));
            }
            write_cell(&allocation.root, 0, graph, ctx);
            ctx.append("return build_0;");
        });
    });
}

fn write_cell(cell: &AllocationCell, depth: usize, graph: &TypeGraph, ctx: &mut WriterContext) {
    let b = format!("build_{depth}");
    for op in &cell.ops {
        write_operation(op, &b, graph, ctx);
    }
    if let Some(next) = &cell.next {
        let next_b = format!("build_{}", depth + 1);
        ctx.append(format!("var {next_b} = begin_cell();"));
        write_cell(next, depth + 1, graph, ctx);
        ctx.append(format!("{b} = {b}.store_ref({next_b}.end_cell());"));
    }
}

fn write_operation(
    op: &AllocationOperation,
    b: &str,
    graph: &TypeGraph,
    ctx: &mut WriterContext,
) {
    let value = value_name(op);
    if !op.optional {
        let line = store_value(&op.layout, &value, b, ctx);
        ctx.append(line);
        return;
    }
    ctx.append(format!("if (null?({value})) {{"));
    ctx.in_indent(|ctx| ctx.append(format!("{b} = {b}.store_int(false, 1);")));
    ctx.append("} else {");
    ctx.in_indent(|ctx| {
        ctx.append(format!("{b} = {b}.store_int(true, 1);"));
        let payload = match &op.layout {
            FieldLayout::Struct { type_name, .. } => {
                let unwrap = not_null(type_name, graph, ctx);
                format!("{unwrap}({value})")
            }
            _ => value.clone(),
        };
        let line = store_value(&op.layout, &payload, b, ctx);
        ctx.append(line);
    });
    ctx.append("}");
}

fn store_value(layout: &FieldLayout, value: &str, b: &str, ctx: &mut WriterContext) -> String {
    match layout {
        FieldLayout::Int { bits, signed: true } => format!("{b} = {b}.store_int({value}, {bits});"),
        FieldLayout::Int {
            bits,
            signed: false,
        } => format!("{b} = {b}.store_uint({value}, {bits});"),
        FieldLayout::Coins => format!("{b} = {b}.store_coins({value});"),
        FieldLayout::Bool => format!("{b} = {b}.store_int({value}, 1);"),
        FieldLayout::Address => {
            let store = ctx.used(STORE_ADDRESS);
            format!("{b} = {store}({b}, {value});")
        }
        FieldLayout::Reference(RefKind::Cell) => format!("{b} = {b}.store_ref({value});"),
        FieldLayout::Reference(RefKind::Slice | RefKind::String) => {
            format!("{b} = {b}.store_ref(begin_cell().store_slice({value}).end_cell());")
        }
        FieldLayout::Reference(RefKind::Builder) => {
            format!("{b} = {b}.store_ref({value}.end_cell());")
        }
        FieldLayout::Remainder(RefKind::Cell) => {
            format!("{b} = {b}.store_slice({value}.begin_parse());")
        }
        FieldLayout::Remainder(RefKind::Slice | RefKind::String) => {
            format!("{b} = {b}.store_slice({value});")
        }
        FieldLayout::Remainder(RefKind::Builder) => format!("{b} = {b}.store_builder({value});"),
        FieldLayout::Struct {
            type_name, boxed, ..
        } => {
            let writer = ctx.used(&writer_name(type_name));
            if *boxed {
                format!("{b} = {b}.store_ref({writer}(begin_cell(), {value}).end_cell());")
            } else {
                format!("{b} = {writer}({b}, {value});")
            }
        }
        FieldLayout::Dictionary => format!("{b} = {b}.store_dict({value});"),
    }
}

// ── Parser ──

pub fn write_parser(allocation: &Allocation, graph: &TypeGraph, ctx: &mut WriterContext) {
    let name = reader_name(&allocation.type_name);
    let ty = allocation_func_type(allocation, graph);
    ctx.fun(&name, |ctx| {
        ctx.signature(format!("(slice, {ty}) {name}(slice sc_0)"));
        ctx.flag(Flag::Inline);
        ctx.body(|ctx| {
            if let Some(prefix) = allocation.prefix {
                ctx.append(format!(
                    "throw_unless({}, sc_0~load_uint(32) == {prefix});",
                    exit_code::INVALID_PREFIX
                ));
            }
            read_cell(&allocation.root, 0, graph, ctx);
            let names: Vec<String> = allocation.operations().map(value_name).collect();
            if names.is_empty() {
                ctx.append("return (sc_0, null());");
            } else {
                ctx.append(format!("return (sc_0, ({}));", names.join(", ")));
            }
        });
    });
}

fn read_cell(cell: &AllocationCell, depth: usize, graph: &TypeGraph, ctx: &mut WriterContext) {
    let sc = format!("sc_{depth}");
    for op in &cell.ops {
        read_operation(op, &sc, graph, ctx);
    }
    if let Some(next) = &cell.next {
        let next_sc = format!("sc_{}", depth + 1);
        ctx.append(format!("slice {next_sc} = {sc}~load_ref().begin_parse();"));
        read_cell(next, depth + 1, graph, ctx);
    }
}

fn read_operation(op: &AllocationOperation, sc: &str, graph: &TypeGraph, ctx: &mut WriterContext) {
    let var = value_name(op);
    if !op.optional {
        let value = load_value(op, sc, ctx);
        ctx.append(format!("var {var} = {value};"));
        return;
    }
    let ty = resolve_func_type(&op.ty, graph);
    ctx.append(format!("{ty} {var} = null();"));
    ctx.append(format!("if ({sc}~load_int(1)) {{"));
    ctx.in_indent(|ctx| {
        let mut value = load_value(op, sc, ctx);
        if let FieldLayout::Struct { type_name, .. } = &op.layout {
            let wrap = as_optional(type_name, graph, ctx);
            value = format!("{wrap}({value})");
        }
        ctx.append(format!("{var} = {value};"));
    });
    ctx.append("}");
}

/// Expression reading one field from `sc`; may emit a helper binding first.
fn load_value(op: &AllocationOperation, sc: &str, ctx: &mut WriterContext) -> String {
    match &op.layout {
        FieldLayout::Int { bits, signed: true } => format!("{sc}~load_int({bits})"),
        FieldLayout::Int {
            bits,
            signed: false,
        } => format!("{sc}~load_uint({bits})"),
        FieldLayout::Coins => format!("{sc}~load_coins()"),
        FieldLayout::Bool => format!("{sc}~load_int(1)"),
        FieldLayout::Address => {
            let load = ctx.used(LOAD_ADDRESS);
            format!("{sc}~{load}()")
        }
        FieldLayout::Reference(RefKind::Cell) => format!("{sc}~load_ref()"),
        FieldLayout::Reference(RefKind::Slice | RefKind::String) => {
            format!("{sc}~load_ref().begin_parse()")
        }
        FieldLayout::Reference(RefKind::Builder) => {
            format!("begin_cell().store_slice({sc}~load_ref().begin_parse())")
        }
        FieldLayout::Remainder(RefKind::Cell) => format!("begin_cell().store_slice({sc}).end_cell()"),
        FieldLayout::Remainder(RefKind::Slice | RefKind::String) => sc.to_string(),
        FieldLayout::Remainder(RefKind::Builder) => format!("begin_cell().store_slice({sc})"),
        FieldLayout::Struct {
            type_name, boxed, ..
        } => {
            let reader = ctx.used(&reader_name(type_name));
            if *boxed {
                let nested = format!("{sc}'{}", op.name);
                ctx.append(format!("slice {nested} = {sc}~load_ref().begin_parse();"));
                format!("{nested}~{reader}()")
            } else {
                format!("{sc}~{reader}()")
            }
        }
        FieldLayout::Dictionary => format!("{sc}~load_dict()"),
    }
}

#[cfg(test)]
mod tests;
