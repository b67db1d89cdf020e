//! Statement lowering and function emission.
//!
//! Contract members take the contract tensor as `self` and hand it back
//! alongside their result, so callers invoke them with `~` and observe the
//! updated state. Other functions receive `self` by value.

use tact_ir::{
    BinaryOp, FunctionArg, FunctionBody, FunctionDescription, ReceiverDescription,
    ReceiverSelector, Statement, TypeDescription, TypeGraph, TypeRef,
};

use crate::context::{Flag, WriterContext};
use crate::expression::{write_expression, ReturnStyle, Scope};
use crate::func_type::resolve_func_type;
use crate::stack::ensure_sufficient_stack;
use crate::storage::load_name;
use crate::tensor::{RenderMode, Tensor};

/// Registry name of a function with a statement body.
pub fn function_name(f: &FunctionDescription) -> String {
    match &f.owner {
        Some(owner) => format!("__gen_{owner}_{}", f.name),
        None => format!("__gen_{}", f.name),
    }
}

/// Registry name of the exported getter wrapping contract function `f`.
pub fn getter_registry_name(f: &FunctionDescription) -> String {
    format!("__gen_get_{}", f.name)
}

pub fn receiver_name(
    contract: &str,
    selector: &ReceiverSelector,
    comment_hash: Option<&str>,
) -> String {
    match selector {
        ReceiverSelector::InternalBinary { type_name, .. } => {
            format!("__gen_{contract}_receive_{type_name}")
        }
        ReceiverSelector::InternalEmpty => format!("__gen_{contract}_receive"),
        ReceiverSelector::InternalComment { comment } => match comment_hash {
            Some(hash) => format!("__gen_{contract}_receive_comment_{hash}"),
            None => panic!("text receiver \"{comment}\" has no hash"),
        },
        ReceiverSelector::InternalBounce { .. } => format!("__gen_{contract}_receive_bounced"),
        ReceiverSelector::InternalFallback { .. } => format!("__gen_{contract}_receive_fallback"),
    }
}

// ── Statements ──

pub fn write_statements(statements: &[Statement], scope: &mut Scope<'_>, ctx: &mut WriterContext) {
    for statement in statements {
        write_statement(statement, scope, ctx);
    }
}

/// Lower a nested block; its locals go out of scope afterwards.
fn write_block(statements: &[Statement], scope: &mut Scope<'_>, ctx: &mut WriterContext) {
    let depth = scope.depth();
    ctx.in_indent(|ctx| write_statements(statements, scope, ctx));
    scope.truncate(depth);
}

fn write_statement(statement: &Statement, scope: &mut Scope<'_>, ctx: &mut WriterContext) {
    ensure_sufficient_stack(|| match statement {
        Statement::Let {
            name,
            ty,
            expression,
        } => {
            let value = write_expression(expression, scope, ctx);
            let func_type = resolve_func_type(ty, scope.graph());
            match scope.declare(name, ty.clone()) {
                Some(tensor) => ctx.append(tensor.bind(&value)),
                None => ctx.append(format!("{func_type} {name} = {value};")),
            }
        }
        Statement::Return { expression } => {
            let value = expression
                .as_ref()
                .map(|e| write_expression(e, scope, ctx));
            let line = match scope.returns() {
                ReturnStyle::Value => match value {
                    Some(value) => format!("return {value};"),
                    None => "return ();".to_string(),
                },
                ReturnStyle::WithSelf => format!(
                    "return ({}, {});",
                    scope.self_value(),
                    value.as_deref().unwrap_or("()")
                ),
                ReturnStyle::SelfOnly => format!("return {};", scope.self_value()),
            };
            ctx.append(line);
        }
        Statement::Expression { expression } => {
            let value = write_expression(expression, scope, ctx);
            ctx.append(format!("{value};"));
        }
        Statement::Assign { path, expression } => {
            let value = write_expression(expression, scope, ctx);
            ctx.append(format!("{} = {value};", scope.lvalue(path)));
        }
        Statement::AugmentedAssign {
            path,
            op,
            expression,
        } => {
            let value = write_expression(expression, scope, ctx);
            let target = scope.lvalue(path);
            let symbol = match op {
                BinaryOp::And => "&",
                BinaryOp::Or => "|",
                other => other.as_symbol(),
            };
            ctx.append(format!("{target} = ({target} {symbol} {value});"));
        }
        Statement::Condition {
            condition,
            true_statements,
            false_statements,
        } => {
            let condition = write_expression(condition, scope, ctx);
            ctx.append(format!("if ({condition}) {{"));
            write_block(true_statements, scope, ctx);
            if let Some(false_statements) = false_statements {
                ctx.append("} else {");
                write_block(false_statements, scope, ctx);
            }
            ctx.append("}");
        }
        Statement::While {
            condition,
            statements,
        } => {
            let condition = write_expression(condition, scope, ctx);
            ctx.append(format!("while ({condition}) {{"));
            write_block(statements, scope, ctx);
            ctx.append("}");
        }
        Statement::Until {
            condition,
            statements,
        } => {
            ctx.append("do {");
            write_block(statements, scope, ctx);
            let condition = write_expression(condition, scope, ctx);
            ctx.append(format!("}} until ({condition});"));
        }
        Statement::Repeat {
            iterations,
            statements,
        } => {
            let iterations = write_expression(iterations, scope, ctx);
            ctx.append(format!("repeat ({iterations}) {{"));
            write_block(statements, scope, ctx);
            ctx.append("}");
        }
    });
}

fn ends_with_return(statements: &[Statement]) -> bool {
    statements.last().is_some_and(Statement::is_return)
}

/// Declare `name` in scope and destructure it when it is an aggregate.
pub(crate) fn unpack(name: &str, ty: &TypeRef, scope: &mut Scope<'_>, ctx: &mut WriterContext) {
    if let Some(tensor) = scope.declare(name, ty.clone()) {
        ctx.append(tensor.bind(name));
    }
}

fn typed_args(args: &[FunctionArg], graph: &TypeGraph) -> Vec<String> {
    args.iter()
        .map(|a| format!("{} {}", resolve_func_type(&a.ty, graph), a.name))
        .collect()
}

// ── Functions ──

/// Emit a free function, member function or extension.
///
/// Native bindings already exist in the target library and emit nothing.
pub fn write_function(f: &FunctionDescription, graph: &TypeGraph, ctx: &mut WriterContext) {
    let FunctionBody::Statements { statements } = &f.body else {
        return;
    };
    let name = function_name(f);
    let returns = resolve_func_type(&f.returns, graph);
    let owner = f.owner.as_deref().map(|o| graph.get_type(o));
    let is_contract = owner.is_some_and(TypeDescription::is_contract);
    let self_ty = owner.map(|o| TypeRef::simple(o.name.clone()));

    let mut params = Vec::new();
    let mut self_func = String::new();
    if let Some(self_ty) = &self_ty {
        self_func = resolve_func_type(self_ty, graph);
        params.push(format!("{self_func} self"));
    }
    params.extend(typed_args(&f.args, graph));

    let signature = if is_contract {
        format!("({self_func}, {returns}) {name}({})", params.join(", "))
    } else {
        format!("{returns} {name}({})", params.join(", "))
    };
    let style = if is_contract {
        ReturnStyle::WithSelf
    } else {
        ReturnStyle::Value
    };

    ctx.fun(&name, |ctx| {
        ctx.signature(signature);
        ctx.flag(Flag::Impure);
        if f.is_inline {
            ctx.flag(Flag::Inline);
        }
        ctx.user();
        ctx.body(|ctx| {
            let mut scope = Scope::new(graph, style);
            if let Some(self_ty) = &self_ty {
                unpack("self", self_ty, &mut scope, ctx);
            }
            for arg in &f.args {
                unpack(&arg.name, &arg.ty, &mut scope, ctx);
            }
            write_statements(statements, &mut scope, ctx);
            if is_contract && !ends_with_return(statements) {
                ctx.append(format!("return ({}, ());", scope.self_value()));
            }
        });
    });
}

/// Emit the `method_id` wrapper exposing contract function `f` as a getter.
pub fn write_getter(
    f: &FunctionDescription,
    contract: &TypeDescription,
    graph: &TypeGraph,
    ctx: &mut WriterContext,
) {
    let self_tensor = Tensor::of_type(&TypeRef::simple(contract.name.clone()), graph, "self");
    ctx.fun(&getter_registry_name(f), |ctx| {
        ctx.signature(format!("_ {}({})", f.name, typed_args(&f.args, graph).join(", ")));
        ctx.flag(Flag::MethodId);
        ctx.body(|ctx| {
            ctx.append(";; Load contract state");
            let load = ctx.used(&load_name(&contract.name));
            ctx.append(self_tensor.bind(&format!("{load}()")));
            ctx.append("");
            ctx.append(";; Execute getter");
            let target = ctx.used(&function_name(f));
            let args: Vec<&str> = f.args.iter().map(|a| a.name.as_str()).collect();
            ctx.append(format!(
                "var res = {}~{target}({});",
                self_tensor.render(RenderMode::Names),
                args.join(", ")
            ));
            ctx.append("");
            ctx.append("return res;");
        });
    });
}

// ── Receivers ──

/// Emit the handler for one receiver of `contract`.
///
/// `comment_hash` is the precomputed hash for text receivers.
pub fn write_receiver(
    contract: &TypeDescription,
    receiver: &ReceiverDescription,
    comment_hash: Option<&str>,
    graph: &TypeGraph,
    ctx: &mut WriterContext,
) {
    let name = receiver_name(&contract.name, &receiver.selector, comment_hash);
    let self_ty = TypeRef::simple(contract.name.clone());
    let self_func = resolve_func_type(&self_ty, graph);
    let arg = match &receiver.selector {
        ReceiverSelector::InternalBinary { type_name, arg } => {
            Some((arg.as_str(), TypeRef::simple(type_name.clone())))
        }
        ReceiverSelector::InternalBounce { arg } | ReceiverSelector::InternalFallback { arg } => {
            Some((arg.as_str(), TypeRef::simple("Slice")))
        }
        ReceiverSelector::InternalEmpty | ReceiverSelector::InternalComment { .. } => None,
    };

    let mut params = vec![format!("{self_func} self")];
    if let Some((arg, ty)) = &arg {
        params.push(format!("{} {arg}", resolve_func_type(ty, graph)));
    }

    ctx.fun(&name, |ctx| {
        ctx.signature(format!("({self_func}, ()) {name}({})", params.join(", ")));
        ctx.flag(Flag::Impure);
        ctx.user();
        ctx.body(|ctx| {
            let mut scope = Scope::new(graph, ReturnStyle::WithSelf);
            unpack("self", &self_ty, &mut scope, ctx);
            if let Some((arg, ty)) = &arg {
                unpack(arg, ty, &mut scope, ctx);
            }
            write_statements(&receiver.statements, &mut scope, ctx);
            if !ends_with_return(&receiver.statements) {
                ctx.append(format!("return ({}, ());", scope.self_value()));
            }
        });
    });
}
