//! Contract storage: load, store, init and child deployment.
//!
//! Persistent data is `[ref: system cell][1 bit: initialized][payload]`. The
//! payload is the contract state once initialized and the init arguments
//! before that, so the first message of a lazily deployed contract runs init.

use tact_ir::{Statement, TypeDescription, TypeGraph, TypeRef};

use crate::allocation::init_type_name;
use crate::context::{Flag, WriterContext};
use crate::expression::{write_expression, ReturnStyle, Scope};
use crate::func_type::{resolve_func_type, resolve_func_type_of};
use crate::function::{unpack, write_statements};
use crate::program::CodegenOptions;
use crate::serialization::{reader_name, writer_name};
use crate::stdlib::{exit_code, CONTEXT_SYS, DICT_GET_CODE, DICT_SET_CODE};
use crate::tensor::{RenderMode, Tensor, TensorEntry};

pub fn load_name(contract: &str) -> String {
    format!("__gen_load_{contract}")
}

pub fn store_name(contract: &str) -> String {
    format!("__gen_store_{contract}")
}

pub fn init_name(contract: &str) -> String {
    format!("__gen_{contract}_init")
}

pub fn init_child_name(contract: &str) -> String {
    format!("__gen_{contract}_init_child")
}

fn self_tensor(contract: &TypeDescription, graph: &TypeGraph) -> Tensor {
    Tensor::of_type(&TypeRef::simple(contract.name.clone()), graph, "self")
}

/// Emit the load and store functions of `contract`.
pub fn write_storage_ops(
    contract: &TypeDescription,
    graph: &TypeGraph,
    options: &CodegenOptions,
    ctx: &mut WriterContext,
) {
    let ty = resolve_func_type_of(contract, graph);
    let has_fields = !contract.fields.is_empty();
    let init = contract.init_or_default();

    let load = load_name(&contract.name);
    ctx.fun(&load, |ctx| {
        ctx.signature(format!("{ty} {load}()"));
        ctx.flag(Flag::Impure);
        ctx.flag(Flag::Inline);
        ctx.body(|ctx| {
            let sys = ctx.used(CONTEXT_SYS);
            ctx.append("slice $sc = get_data().begin_parse();");
            ctx.append("");
            ctx.append(";; Context");
            ctx.append(format!("{sys} = $sc~load_ref();"));
            ctx.append("int $loaded = $sc~load_int(1);");
            ctx.append("");
            ctx.append(";; Load data");
            ctx.append("if ($loaded) {");
            ctx.in_indent(|ctx| {
                if has_fields {
                    let reader = ctx.used(&reader_name(&contract.name));
                    ctx.append(format!("return $sc~{reader}();"));
                } else {
                    ctx.append("return null();");
                }
            });
            ctx.append("} else {");
            ctx.in_indent(|ctx| {
                if !options.masterchain {
                    ctx.append(";; Allow only workchain deployments");
                    ctx.append(format!(
                        "throw_unless({}, my_address().preload_uint(11) == 1024);",
                        exit_code::MASTERCHAIN_NOT_ENABLED
                    ));
                }
                if !init.args.is_empty() {
                    let reader = ctx.used(&reader_name(&init_type_name(&contract.name)));
                    let typed: Vec<String> = init
                        .args
                        .iter()
                        .map(|a| format!("{} ${}", resolve_func_type(&a.ty, graph), a.name))
                        .collect();
                    ctx.append(format!("({}) = $sc~{reader}();", typed.join(", ")));
                    ctx.append("$sc.end_parse();");
                }
                let target = ctx.used(&init_name(&contract.name));
                let names: Vec<String> =
                    init.args.iter().map(|a| format!("${}", a.name)).collect();
                ctx.append(format!("return {target}({});", names.join(", ")));
            });
            ctx.append("}");
        });
    });

    let store = store_name(&contract.name);
    ctx.fun(&store, |ctx| {
        ctx.signature(format!("() {store}({ty} v)"));
        ctx.flag(Flag::Impure);
        ctx.flag(Flag::Inline);
        ctx.body(|ctx| {
            let sys = ctx.used(CONTEXT_SYS);
            ctx.append("builder b = begin_cell();");
            ctx.append(format!("b = b.store_ref({sys});"));
            ctx.append("b = b.store_int(true, 1);");
            if has_fields {
                let writer = ctx.used(&writer_name(&contract.name));
                ctx.append(format!("b = {writer}(b, v);"));
            }
            ctx.append("set_data(b.end_cell());");
        });
    });
}

/// Null value shaped like `entry`, so unset nested structs still type check.
fn null_value(entry: &TensorEntry) -> String {
    match entry {
        TensorEntry::Leaf { .. } => "null()".to_string(),
        TensorEntry::Group { entries, .. } => {
            let parts: Vec<String> = entries.iter().map(null_value).collect();
            format!("({})", parts.join(", "))
        }
    }
}

/// Emit `__gen_C_init`, which builds the initial state from init arguments.
///
/// A contract without an init block behaves as if it declared an empty one.
pub fn write_init(contract: &TypeDescription, graph: &TypeGraph, ctx: &mut WriterContext) {
    let init = contract.init_or_default();
    let ty = resolve_func_type_of(contract, graph);
    let name = init_name(&contract.name);
    let args: Vec<String> = init
        .args
        .iter()
        .map(|a| format!("{} {}", resolve_func_type(&a.ty, graph), a.name))
        .collect();
    let tensor = self_tensor(contract, graph);

    ctx.fun(&name, |ctx| {
        ctx.signature(format!("{ty} {name}({})", args.join(", ")));
        ctx.flag(Flag::Impure);
        ctx.user();
        ctx.body(|ctx| {
            let mut scope = Scope::new(graph, ReturnStyle::SelfOnly);
            for arg in &init.args {
                unpack(&arg.name, &arg.ty, &mut scope, ctx);
            }

            let values: Vec<String> = contract
                .fields
                .iter()
                .zip(tensor.entries())
                .map(|(field, entry)| match &field.default {
                    Some(default) => write_expression(default, &scope, ctx),
                    None => null_value(entry),
                })
                .collect();
            if values.is_empty() {
                ctx.append("tuple self = null();");
            } else {
                ctx.append(format!(
                    "var {} = ({});",
                    tensor.render(RenderMode::Full),
                    values.join(", ")
                ));
            }
            scope.declare("self", TypeRef::simple(contract.name.clone()));

            write_statements(&init.statements, &mut scope, ctx);
            if !init.statements.last().is_some_and(Statement::is_return) {
                ctx.append(format!("return {};", scope.self_value()));
            }
        });
    });
}

/// Emit `__gen_C_init_child`, which computes `(code, data)` for deploying `C`.
pub fn write_init_child(
    contract: &TypeDescription,
    graph: &TypeGraph,
    options: &CodegenOptions,
    ctx: &mut WriterContext,
) {
    let init = contract.init_or_default();
    let name = init_child_name(&contract.name);
    let mut params = vec!["cell sys'".to_string()];
    params.extend(
        init.args
            .iter()
            .map(|a| format!("{} {}", resolve_func_type(&a.ty, graph), a.name)),
    );

    ctx.fun(&name, |ctx| {
        ctx.signature(format!("(cell, cell) {name}({})", params.join(", ")));
        if options.inline {
            ctx.flag(Flag::Inline);
        }
        ctx.body(|ctx| {
            let get = ctx.used(DICT_GET_CODE);
            let set = ctx.used(DICT_SET_CODE);
            ctx.write(
                "
                slice sc' = sys'.begin_parse();
                cell source = sc'~load_dict();
                cell contracts = new_dict();
            ",
            );

            ctx.append("");
            ctx.append(format!(";; Contract Code: {}", contract.name));
            ctx.append(format!("cell mine = {get}(source, {});", contract.uid));
            ctx.append(format!(
                "contracts = {set}(contracts, {}, mine);",
                contract.uid
            ));

            for dependency in &contract.depends_on {
                let uid = graph.get_type(dependency).uid;
                ctx.append("");
                ctx.append(format!(";; Contract Code: {dependency}"));
                ctx.append(format!("cell code_{uid} = {get}(source, {uid});"));
                ctx.append(format!("contracts = {set}(contracts, {uid}, code_{uid});"));
            }

            ctx.append("");
            ctx.append(";; Build cell");
            ctx.write(
                "
                builder b = begin_cell();
                b = b.store_ref(begin_cell().store_dict(contracts).end_cell());
                b = b.store_int(false, 1);
            ",
            );
            let writer = ctx.used(&writer_name(&init_type_name(&contract.name)));
            if init.args.is_empty() {
                ctx.append(format!("b = {writer}(b, null());"));
            } else {
                let names: Vec<&str> = init.args.iter().map(|a| a.name.as_str()).collect();
                ctx.append(format!("b = {writer}(b, ({}));", names.join(", ")));
            }
            ctx.append("return (mine, b.end_cell());");
        });
    });
}
