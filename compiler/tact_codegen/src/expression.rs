//! Expression lowering.
//!
//! Expressions arrive resolved and type checked. Lowering only needs enough
//! type information to pick accessors and calling conventions, which
//! [`Scope::type_of`] reconstructs structurally from the type graph.

use tact_ir::{BinaryOp, Expression, FunctionBody, TypeGraph, TypeKind, TypeRef, UnaryOp};

use crate::accessors::{getter_name, not_null};
use crate::context::WriterContext;
use crate::func_type::is_tensor;
use crate::function::function_name;
use crate::serialization::writer_name;
use crate::stack::ensure_sufficient_stack;
use crate::stdlib::{CONTEXT_SYS, NOT_NULL};
use crate::storage::init_child_name;
use crate::tensor::{RenderMode, Tensor, TensorEntry};

/// What a `return` statement hands back.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ReturnStyle {
    /// `return value;`
    Value,
    /// `return (self, value);`, for contract members and receivers.
    WithSelf,
    /// `return self;`, for contract initializers.
    SelfOnly,
}

#[derive(Clone, Debug)]
struct Local {
    name: String,
    ty: TypeRef,
    /// Leaves of a destructured aggregate.
    tensor: Option<Tensor>,
}

/// Locals visible to the code being lowered.
#[derive(Clone, Debug)]
pub struct Scope<'a> {
    graph: &'a TypeGraph,
    locals: Vec<Local>,
    returns: ReturnStyle,
}

impl<'a> Scope<'a> {
    pub fn new(graph: &'a TypeGraph, returns: ReturnStyle) -> Self {
        Self {
            graph,
            locals: Vec::new(),
            returns,
        }
    }

    pub fn graph(&self) -> &'a TypeGraph {
        self.graph
    }

    pub fn returns(&self) -> ReturnStyle {
        self.returns
    }

    /// Declare a local; aggregates are destructured and their tensor returned.
    pub fn declare(&mut self, name: &str, ty: TypeRef) -> Option<&Tensor> {
        let tensor = is_tensor(&ty, self.graph).then(|| Tensor::of_type(&ty, self.graph, name));
        self.locals.push(Local {
            name: name.to_string(),
            ty,
            tensor,
        });
        self.locals.last().and_then(|l| l.tensor.as_ref())
    }

    /// Number of declared locals, for restoring after a block.
    pub fn depth(&self) -> usize {
        self.locals.len()
    }

    pub fn truncate(&mut self, depth: usize) {
        self.locals.truncate(depth);
    }

    fn local(&self, name: &str) -> &Local {
        match self.locals.iter().rev().find(|l| l.name == name) {
            Some(local) => local,
            None => panic!("unknown identifier `{name}`"),
        }
    }

    /// A local's value: its name, or its leaves for destructured aggregates.
    pub fn value_of(&self, name: &str) -> String {
        let local = self.local(name);
        match &local.tensor {
            Some(tensor) => tensor.render(RenderMode::Names),
            None => local.name.clone(),
        }
    }

    /// The current value of `self`.
    pub fn self_value(&self) -> String {
        self.value_of("self")
    }

    /// Assignable target for `path`, e.g. `["self", "a", "b"]` → `self'a'b`.
    ///
    /// # Panics
    ///
    /// Panics if the path does not end in a destructured leaf or group.
    pub fn lvalue(&self, path: &[String]) -> String {
        let Some((root, rest)) = path.split_first() else {
            panic!("empty assignment target");
        };
        let local = self.local(root);
        if rest.is_empty() {
            return self.value_of(root);
        }
        let fields: Vec<&str> = rest.iter().map(String::as_str).collect();
        match local.tensor.as_ref().and_then(|t| t.lookup(&fields)) {
            Some(entry) => entry.render(RenderMode::Names),
            None => panic!("cannot assign to `{}`", path.join(".")),
        }
    }

    /// Structural type of `expr`.
    pub fn type_of(&self, expr: &Expression) -> TypeRef {
        ensure_sufficient_stack(|| match expr {
            Expression::Number { .. } => TypeRef::simple("Int"),
            Expression::Boolean { .. } => TypeRef::simple("Bool"),
            Expression::String { .. } => TypeRef::simple("String"),
            Expression::Null => TypeRef::Void,
            Expression::Id { name } => self.local(name).ty.clone(),
            Expression::Binary { op, .. } => {
                if op.is_comparison() {
                    TypeRef::simple("Bool")
                } else {
                    TypeRef::simple("Int")
                }
            }
            Expression::Unary { op, operand } => match op {
                UnaryOp::Neg => TypeRef::simple("Int"),
                UnaryOp::Not => TypeRef::simple("Bool"),
                UnaryOp::NotNull => match self.type_of(operand) {
                    TypeRef::Simple { name, .. } => TypeRef::simple(name),
                    other => other,
                },
            },
            Expression::Field { source, name } => {
                let owner = self.type_name_of(source);
                match self.graph.get_type(&owner).field(name) {
                    Some(field) => match &field.ty {
                        TypeRef::Bounced { name } => TypeRef::simple(name.clone()),
                        ty => ty.clone(),
                    },
                    None => panic!("type `{owner}` has no field `{name}`"),
                }
            }
            Expression::Call { receiver, name, .. } => {
                let owner = self.type_name_of(receiver);
                let desc = self.graph.get_type(&owner);
                match desc.function(name) {
                    Some(f) => f.returns.clone(),
                    None if name == "toCell" => TypeRef::simple("Cell"),
                    None => panic!("type `{owner}` has no method `{name}`"),
                }
            }
            Expression::StaticCall { name, .. } => match self.graph.find_static_function(name) {
                Some(f) => f.returns.clone(),
                None => panic!("unknown function `{name}`"),
            },
            Expression::StructInstance { type_name, .. } => TypeRef::simple(type_name.clone()),
            Expression::InitOf { .. } => TypeRef::simple("StateInit"),
            Expression::Conditional { then_branch, .. } => self.type_of(then_branch),
        })
    }

    fn type_name_of(&self, expr: &Expression) -> String {
        match self.type_of(expr).type_name() {
            Some(name) => name.to_string(),
            None => panic!("expression has no named type: {expr:?}"),
        }
    }

    /// The destructured entry `expr` refers to, when it is a field path
    /// rooted at a destructured local.
    fn entry_of(&self, expr: &Expression) -> Option<&TensorEntry> {
        let mut path = Vec::new();
        let mut current = expr;
        while let Expression::Field { source, name } = current {
            path.push(name.as_str());
            current = source;
        }
        let Expression::Id { name } = current else {
            return None;
        };
        path.reverse();
        self.local(name).tensor.as_ref()?.lookup(&path)
    }
}

/// Lower `expr` to a FunC expression.
pub fn write_expression(expr: &Expression, scope: &Scope<'_>, ctx: &mut WriterContext) -> String {
    ensure_sufficient_stack(|| match expr {
        Expression::Number { value } => value.clone(),
        Expression::Boolean { value } => if *value { "true" } else { "false" }.to_string(),
        Expression::Null => "null()".to_string(),
        Expression::String { value } => format!("\"{value}\""),
        Expression::Id { name } => scope.value_of(name),
        Expression::Binary { op, left, right } => write_binary(*op, left, right, scope, ctx),
        Expression::Unary { op, operand } => {
            let value = write_expression(operand, scope, ctx);
            match op {
                UnaryOp::Neg => format!("(- {value})"),
                UnaryOp::Not => format!("(~ {value})"),
                UnaryOp::NotNull => {
                    let check = match scope.type_of(operand) {
                        TypeRef::Simple { name, .. }
                            if scope.graph().get_type(&name).kind == TypeKind::Struct =>
                        {
                            not_null(&name, scope.graph(), ctx)
                        }
                        _ => ctx.used(NOT_NULL),
                    };
                    format!("{check}({value})")
                }
            }
        }
        Expression::Field { source, name } => {
            if let Some(entry) = scope.entry_of(expr) {
                return entry.render(RenderMode::Names);
            }
            let owner = scope.type_name_of(source);
            let getter = ctx.used(&getter_name(&owner, name));
            let value = write_expression(source, scope, ctx);
            format!("{getter}({value})")
        }
        Expression::Call {
            receiver,
            name,
            args,
        } => write_call(receiver, name, args, scope, ctx),
        Expression::StaticCall { name, args } => {
            let Some(f) = scope.graph().find_static_function(name) else {
                panic!("unknown function `{name}`");
            };
            let args = write_args(args, scope, ctx);
            let target = match &f.body {
                FunctionBody::Native { func_name } => native(func_name, ctx),
                FunctionBody::Statements { .. } => ctx.used(&function_name(f)),
            };
            format!("{target}({})", args.join(", "))
        }
        Expression::StructInstance { type_name, args } => {
            let desc = scope.graph().get_type(type_name);
            if desc.fields.is_empty() {
                return "null()".to_string();
            }
            let values: Vec<String> = desc
                .fields
                .iter()
                .map(|field| {
                    let arg = args.iter().find(|a| a.name == field.name);
                    match (arg, &field.default) {
                        (Some(arg), _) => write_expression(&arg.value, scope, ctx),
                        (None, Some(default)) => write_expression(default, scope, ctx),
                        (None, None) => "null()".to_string(),
                    }
                })
                .collect();
            format!("({})", values.join(", "))
        }
        Expression::InitOf { contract, args } => {
            let init = ctx.used(&init_child_name(contract));
            let sys = ctx.used(CONTEXT_SYS);
            let mut all = vec![sys];
            all.extend(write_args(args, scope, ctx));
            format!("{init}({})", all.join(", "))
        }
        Expression::Conditional {
            condition,
            then_branch,
            else_branch,
        } => {
            let condition = write_expression(condition, scope, ctx);
            let then_branch = write_expression(then_branch, scope, ctx);
            let else_branch = write_expression(else_branch, scope, ctx);
            format!("({condition} ? {then_branch} : {else_branch})")
        }
    })
}

fn write_args(args: &[Expression], scope: &Scope<'_>, ctx: &mut WriterContext) -> Vec<String> {
    args.iter()
        .map(|a| write_expression(a, scope, ctx))
        .collect()
}

/// Native bindings may name support functions; those must be marked used.
fn native(func_name: &str, ctx: &mut WriterContext) -> String {
    if ctx.is_declared(func_name) {
        ctx.used(func_name)
    } else {
        func_name.to_string()
    }
}

fn write_binary(
    op: BinaryOp,
    left: &Expression,
    right: &Expression,
    scope: &Scope<'_>,
    ctx: &mut WriterContext,
) -> String {
    match (op, left, right) {
        (BinaryOp::Eq | BinaryOp::NotEq, value, Expression::Null)
        | (BinaryOp::Eq | BinaryOp::NotEq, Expression::Null, value) => {
            let value = write_expression(value, scope, ctx);
            if op == BinaryOp::Eq {
                format!("null?({value})")
            } else {
                format!("(~ null?({value}))")
            }
        }
        _ => {
            let l = write_expression(left, scope, ctx);
            let r = write_expression(right, scope, ctx);
            let symbol = match op {
                BinaryOp::And => "&",
                BinaryOp::Or => "|",
                other => other.as_symbol(),
            };
            format!("({l} {symbol} {r})")
        }
    }
}

fn write_call(
    receiver: &Expression,
    name: &str,
    args: &[Expression],
    scope: &Scope<'_>,
    ctx: &mut WriterContext,
) -> String {
    let owner = scope.type_name_of(receiver);
    let desc = scope.graph().get_type(&owner);
    let Some(f) = desc.function(name) else {
        if name == "toCell" && desc.kind == TypeKind::Struct {
            let writer = ctx.used(&writer_name(&owner));
            let value = write_expression(receiver, scope, ctx);
            return format!("{writer}(begin_cell(), {value}).end_cell()");
        }
        panic!("type `{owner}` has no method `{name}`");
    };
    let args = write_args(args, scope, ctx);
    match &f.body {
        FunctionBody::Native { func_name } => {
            let target = native(func_name, ctx);
            let mut all = vec![write_expression(receiver, scope, ctx)];
            all.extend(args);
            format!("{target}({})", all.join(", "))
        }
        FunctionBody::Statements { .. } if desc.is_contract() => {
            assert!(
                matches!(receiver, Expression::Id { name } if name == "self"),
                "contract method `{name}` can only be called on `self`"
            );
            let target = ctx.used(&function_name(f));
            format!("{}~{target}({})", scope.self_value(), args.join(", "))
        }
        FunctionBody::Statements { .. } => {
            let target = ctx.used(&function_name(f));
            let mut all = vec![write_expression(receiver, scope, ctx)];
            all.extend(args);
            format!("{target}({})", all.join(", "))
        }
    }
}
