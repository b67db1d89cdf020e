//! Whole-program emission.

use rustc_hash::FxHashMap;
use tact_ir::{AbiDescriptor, ReceiverSelector, TypeDescription, TypeGraph};
use tracing::debug;

use crate::accessors::write_accessors;
use crate::allocation::Allocations;
use crate::context::WriterContext;
use crate::error::{CodegenError, CodegenResult};
use crate::func_type::resolve_func_type;
use crate::function::{getter_registry_name, write_function, write_getter, write_receiver};
use crate::router::{comment_receivers, hash_of, write_router, CommentReceiver};
use crate::serialization::{write_parser, write_serializer};
use crate::stdlib::{exit_code, write_stdlib};
use crate::storage::{init_child_name, write_init, write_init_child, write_storage_ops};

/// Interfaces every compiled contract reports, ahead of its own.
const BUILTIN_INTERFACES: [&str; 3] = [
    "org.ton.introspection.v0",
    "org.ton.abi.ipfs.v0",
    "org.ton.deploy.lazy.v0",
];

/// Code generation switches.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CodegenOptions {
    /// Annotate every rendered function with its registry name and dependencies.
    pub debug: bool,
    /// Allow deployment to the masterchain.
    pub masterchain: bool,
    /// Mark child deployment helpers `inline`.
    pub inline: bool,
}

/// Compile `graph` into one FunC program.
///
/// With `name` set, that contract is the entry point. Without it the graph
/// must hold at most one contract; with none, the entry point rejects every
/// message.
#[tracing::instrument(level = "debug", skip_all, fields(contract = name.unwrap_or("")))]
pub fn write_program(
    graph: &TypeGraph,
    abi: &AbiDescriptor,
    name: Option<&str>,
    options: &CodegenOptions,
) -> CodegenResult<String> {
    let target = select_contract(graph, name)?;

    let mut comments: FxHashMap<&str, Vec<CommentReceiver>> = FxHashMap::default();
    for contract in graph.contracts() {
        comments.insert(&contract.name, comment_receivers(contract)?);
    }

    let allocations = Allocations::resolve(graph);
    let mut ctx = WriterContext::new();

    write_stdlib(&mut ctx);

    for allocation in allocations.iter() {
        write_serializer(allocation, graph, &mut ctx);
        write_parser(allocation, graph, &mut ctx);
    }
    debug!("wrote serializers");

    for desc in graph.types().iter().filter(|t| t.is_aggregate()) {
        write_accessors(desc, graph, &mut ctx);
    }

    for contract in graph.contracts() {
        write_storage_ops(contract, graph, options, &mut ctx);
        write_init_child(contract, graph, options, &mut ctx);
    }
    debug!("wrote storage");

    for f in graph.static_functions() {
        write_function(f, graph, &mut ctx);
    }
    for desc in graph.types().iter().filter(|t| !t.is_contract()) {
        for f in &desc.functions {
            write_function(f, graph, &mut ctx);
        }
    }

    for contract in graph.contracts() {
        let selected = target.is_some_and(|t| t.name == contract.name);
        write_init(contract, graph, &mut ctx);
        for f in &contract.functions {
            write_function(f, graph, &mut ctx);
            if selected && f.is_getter {
                write_getter(f, contract, graph, &mut ctx);
            }
        }
        let hashes = comments.get(contract.name.as_str()).map_or(&[][..], Vec::as_slice);
        for receiver in &contract.receivers {
            let hash = match &receiver.selector {
                ReceiverSelector::InternalComment { comment } => Some(hash_of(hashes, comment)),
                _ => None,
            };
            write_receiver(contract, receiver, hash, graph, &mut ctx);
        }
    }
    debug!("wrote functions and receivers");

    match target {
        Some(contract) => {
            let hashes = comments.get(contract.name.as_str()).map_or(&[][..], Vec::as_slice);
            write_main(contract, hashes, abi, &allocations, graph, &mut ctx);
        }
        None => write_empty_main(&mut ctx),
    }

    Ok(ctx.render(options.debug))
}

fn select_contract<'g>(
    graph: &'g TypeGraph,
    name: Option<&str>,
) -> CodegenResult<Option<&'g TypeDescription>> {
    if let Some(name) = name {
        return graph
            .contracts()
            .find(|c| c.name == name)
            .map(Some)
            .ok_or_else(|| CodegenError::ContractNotFound {
                name: name.to_string(),
            });
    }
    let contracts: Vec<&TypeDescription> = graph.contracts().collect();
    match contracts.as_slice() {
        [] => Ok(None),
        [only] => Ok(Some(*only)),
        _ => Err(CodegenError::TooManyContracts {
            names: contracts.iter().map(|c| c.name.clone()).collect(),
        }),
    }
}

fn write_main(
    contract: &TypeDescription,
    comments: &[CommentReceiver],
    abi: &AbiDescriptor,
    allocations: &Allocations,
    graph: &TypeGraph,
    ctx: &mut WriterContext,
) {
    let name = &contract.name;
    let init = contract.init_or_default();
    ctx.main(|ctx| {
        ctx.append(";;");
        ctx.append(format!(";; Receivers of a Contract {name}"));
        ctx.append(";;");
        ctx.append("");
        write_router(contract, comments, allocations, graph, ctx);

        for f in contract.functions.iter().filter(|f| f.is_getter) {
            ctx.used(&getter_registry_name(f));
        }

        ctx.append("");
        ctx.append(";;");
        ctx.append(format!(";; Get methods of a Contract {name}"));
        ctx.append(";;");

        let mut params = vec!["cell sys'".to_string()];
        params.extend(
            init.args
                .iter()
                .map(|a| format!("{} {}", resolve_func_type(&a.ty, graph), a.name)),
        );
        let mut args = vec!["sys'"];
        args.extend(init.args.iter().map(|a| a.name.as_str()));
        let init_child = ctx.used(&init_child_name(name));
        ctx.append("");
        ctx.append(format!(
            "(cell, cell) init_{name}({}) method_id {{",
            params.join(", ")
        ));
        ctx.in_indent(|ctx| ctx.append(format!("return {init_child}({});", args.join(", "))));
        ctx.append("}");

        let interfaces: Vec<&str> = BUILTIN_INTERFACES
            .iter()
            .copied()
            .chain(contract.interfaces.iter().map(String::as_str))
            .collect();
        ctx.append("");
        ctx.append("_ supported_interfaces() method_id {");
        ctx.in_indent(|ctx| {
            ctx.append("return (");
            ctx.in_indent(|ctx| {
                let last = interfaces.len() - 1;
                for (i, interface) in interfaces.iter().enumerate() {
                    let comma = if i == last { "" } else { "," };
                    ctx.append(format!("\"{interface}\"H >> 128{comma}"));
                }
            });
            ctx.append(");");
        });
        ctx.append("}");

        ctx.append("");
        ctx.append("_ get_abi_ipfs() method_id {");
        ctx.in_indent(|ctx| ctx.append(format!("return \"{}\";", abi.link)));
        ctx.append("}");

        ctx.append("");
        ctx.append("_ lazy_deployment_completed() method_id {");
        ctx.in_indent(|ctx| ctx.append("return get_data().begin_parse().load_int(1);"));
        ctx.append("}");
    });
}

/// Entry point of a program without contracts: every message is rejected.
fn write_empty_main(ctx: &mut WriterContext) {
    ctx.main(|ctx| {
        ctx.append("() recv_internal(cell in_msg_cell, slice in_msg) impure {");
        ctx.in_indent(|ctx| {
            ctx.append(format!("throw({});", exit_code::INVALID_MESSAGE));
        });
        ctx.append("}");
    });
}
