//! Tensor resolution.
//!
//! FunC passes aggregates as flat runs of stack values. A struct field that
//! is itself a struct expands in place, so `self.a.b` becomes the variable
//! `self'a'b` and the rendered tensor type keeps the nesting:
//! `(int self'x, (int self'a'b, slice self'a'c))`.

use tact_ir::{FieldDescription, TypeGraph, TypeRef};

use crate::func_type::{is_tensor, resolve_func_type};
use crate::stack::ensure_sufficient_stack;

/// Path separator inside generated variable names.
pub const SEPARATOR: char = '\'';

/// How a tensor is rendered.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RenderMode {
    /// `type name` pairs, for destructuring binds and parameters.
    Full,
    /// Bare names, for passing the values on.
    Names,
}

/// One field of a tensor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TensorEntry {
    Leaf {
        field: String,
        name: String,
        ty: String,
    },
    Group {
        field: String,
        name: String,
        entries: Vec<TensorEntry>,
    },
}

impl TensorEntry {
    /// Source-level field name.
    pub fn field(&self) -> &str {
        match self {
            Self::Leaf { field, .. } | Self::Group { field, .. } => field,
        }
    }

    /// Generated variable name (or name prefix, for groups).
    pub fn name(&self) -> &str {
        match self {
            Self::Leaf { name, .. } | Self::Group { name, .. } => name,
        }
    }

    pub fn render(&self, mode: RenderMode) -> String {
        match self {
            Self::Leaf { name, ty, .. } => match mode {
                RenderMode::Full => format!("{ty} {name}"),
                RenderMode::Names => name.clone(),
            },
            Self::Group { entries, .. } => render_entries(entries, mode),
        }
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<(&'a str, &'a str)>) {
        match self {
            Self::Leaf { name, ty, .. } => out.push((name, ty)),
            Self::Group { entries, .. } => {
                for entry in entries {
                    entry.collect_leaves(out);
                }
            }
        }
    }
}

/// The flattened view of an aggregate value bound to `prefix`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tensor {
    prefix: String,
    entries: Vec<TensorEntry>,
}

impl Tensor {
    /// Resolve `fields` of an aggregate named `prefix`.
    pub fn resolve(fields: &[FieldDescription], graph: &TypeGraph, prefix: &str) -> Self {
        let entries = fields
            .iter()
            .map(|f| resolve_entry(&f.name, &f.ty, graph, prefix))
            .collect();
        Self {
            prefix: prefix.to_string(),
            entries,
        }
    }

    /// Resolve a value of type `ty`; non-tensor values yield an empty tensor.
    pub fn of_type(ty: &TypeRef, graph: &TypeGraph, prefix: &str) -> Self {
        match ty.type_name() {
            Some(name) if is_tensor(ty, graph) => {
                Self::resolve(&graph.get_type(name).fields, graph, prefix)
            }
            _ => Self {
                prefix: prefix.to_string(),
                entries: Vec::new(),
            },
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn entries(&self) -> &[TensorEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All scalar leaves as `(name, FunC type)`, depth first.
    pub fn leaves(&self) -> Vec<(&str, &str)> {
        let mut out = Vec::new();
        for entry in &self.entries {
            entry.collect_leaves(&mut out);
        }
        out
    }

    /// Render the whole tensor; an empty one is the opaque value `prefix`.
    pub fn render(&self, mode: RenderMode) -> String {
        if self.entries.is_empty() {
            return match mode {
                RenderMode::Full => format!("tuple {}", self.prefix),
                RenderMode::Names => self.prefix.clone(),
            };
        }
        render_entries(&self.entries, mode)
    }

    /// A statement binding every leaf from `value`.
    pub fn bind(&self, value: &str) -> String {
        if self.entries.is_empty() {
            format!("tuple {} = {value};", self.prefix)
        } else {
            format!("var {} = {value};", self.render(RenderMode::Full))
        }
    }

    /// Entry reached by following field names from the root.
    pub fn lookup(&self, path: &[&str]) -> Option<&TensorEntry> {
        let (first, rest) = path.split_first()?;
        let mut entry = self.entries.iter().find(|e| e.field() == *first)?;
        for field in rest {
            match entry {
                TensorEntry::Group { entries, .. } => {
                    entry = entries.iter().find(|e| e.field() == *field)?;
                }
                TensorEntry::Leaf { .. } => return None,
            }
        }
        Some(entry)
    }
}

fn resolve_entry(field: &str, ty: &TypeRef, graph: &TypeGraph, prefix: &str) -> TensorEntry {
    let name = format!("{prefix}{SEPARATOR}{field}");
    match ty.type_name() {
        Some(type_name) if is_tensor(ty, graph) => ensure_sufficient_stack(|| {
            let entries = graph
                .get_type(type_name)
                .fields
                .iter()
                .map(|f| resolve_entry(&f.name, &f.ty, graph, &name))
                .collect();
            TensorEntry::Group {
                field: field.to_string(),
                name,
                entries,
            }
        }),
        _ => TensorEntry::Leaf {
            field: field.to_string(),
            ty: resolve_func_type(ty, graph),
            name,
        },
    }
}

fn render_entries(entries: &[TensorEntry], mode: RenderMode) -> String {
    let parts: Vec<String> = entries.iter().map(|e| e.render(mode)).collect();
    format!("({})", parts.join(", "))
}
