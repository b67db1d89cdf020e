//! Mapping from Tact types to FunC stack types.

use tact_ir::{TypeDescription, TypeGraph, TypeKind, TypeRef};

use crate::stack::ensure_sufficient_stack;

/// FunC type of a value of type `ty`.
///
/// Aggregates become nested tensors; optional aggregates and aggregates
/// without fields are a single opaque `tuple`.
pub fn resolve_func_type(ty: &TypeRef, graph: &TypeGraph) -> String {
    match ty {
        TypeRef::Simple { name, optional } => {
            let desc = graph.get_type(name);
            match desc.kind {
                TypeKind::Primitive => primitive_func_type(name).to_string(),
                TypeKind::Struct | TypeKind::Contract if *optional => "tuple".to_string(),
                TypeKind::Struct | TypeKind::Contract => resolve_func_type_of(desc, graph),
                TypeKind::Trait => panic!("trait `{name}` cannot be used as a value"),
            }
        }
        TypeRef::Bounced { name } => resolve_func_type_of(graph.get_type(name), graph),
        TypeRef::Map { .. } => "cell".to_string(),
        TypeRef::Void => "()".to_string(),
    }
}

/// FunC type of a struct or contract value.
pub fn resolve_func_type_of(desc: &TypeDescription, graph: &TypeGraph) -> String {
    if desc.fields.is_empty() {
        return "tuple".to_string();
    }
    ensure_sufficient_stack(|| {
        let parts: Vec<String> = desc
            .fields
            .iter()
            .map(|f| resolve_func_type(&f.ty, graph))
            .collect();
        format!("({})", parts.join(", "))
    })
}

/// FunC type of a primitive.
///
/// # Panics
///
/// Panics on a primitive the backend has no representation for.
pub fn primitive_func_type(name: &str) -> &'static str {
    match name {
        "Int" | "Bool" => "int",
        "Slice" | "Address" | "String" => "slice",
        "Cell" => "cell",
        "Builder" => "builder",
        "StringBuilder" => "tuple",
        _ => panic!("unknown primitive type `{name}`"),
    }
}

/// Whether values of `ty` are destructured into a tensor of fields.
///
/// True for non-optional structs and contracts that have at least one field.
pub fn is_tensor(ty: &TypeRef, graph: &TypeGraph) -> bool {
    let (name, optional) = match ty {
        TypeRef::Simple { name, optional } => (name, *optional),
        TypeRef::Bounced { name } => (name, false),
        TypeRef::Map { .. } | TypeRef::Void => return false,
    };
    let desc = graph.get_type(name);
    !optional && desc.is_aggregate() && !desc.fields.is_empty()
}
