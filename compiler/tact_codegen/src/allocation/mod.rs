//! Persistent layout allocation.
//!
//! Every struct, contract and contract init-argument list gets an
//! [`Allocation`]: its fields packed in declaration order into a chain of
//! cells. The serializer and the parser of a type walk the same chain, so
//! whatever one writes the other reads back.
//!
//! Layouts are memoized per type. Nested structs are allocated on demand
//! while their owner is being allocated; a type that reaches itself is a
//! broken type graph and aborts.

use std::cell::RefCell;
use std::ops::Add;

use rustc_hash::{FxHashMap, FxHashSet};
use tact_ir::{FieldDescription, ReceiverSelector, TypeDescription, TypeGraph, TypeKind, TypeRef};

use crate::cell_hash::message_id;
use crate::stack::ensure_sufficient_stack;

/// Data bits of one cell.
pub const CELL_BITS: u32 = 1023;

/// References of one cell.
pub const CELL_REFS: u32 = 4;

/// References fields may use; the last one is kept for the continuation.
pub const FIELD_REFS: u32 = CELL_REFS - 1;

/// Width of a message discriminator.
pub const PREFIX_BITS: u32 = 32;

/// Name of the synthetic type holding a contract's init arguments.
pub fn init_type_name(contract: &str) -> String {
    format!("$init${contract}")
}

/// Bits and references taken by some part of a cell.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct CellSize {
    pub bits: u32,
    pub refs: u32,
}

impl CellSize {
    pub const ZERO: Self = Self { bits: 0, refs: 0 };

    pub const fn bits(bits: u32) -> Self {
        Self { bits, refs: 0 }
    }

    pub const fn refs(refs: u32) -> Self {
        Self { bits: 0, refs }
    }

    /// Whether `other` still fits next to `self` in one cell.
    pub const fn fits(self, other: Self) -> bool {
        self.bits + other.bits <= CELL_BITS && self.refs + other.refs <= FIELD_REFS
    }
}

impl Add for CellSize {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            bits: self.bits + rhs.bits,
            refs: self.refs + rhs.refs,
        }
    }
}

/// Primitive kinds stored behind a reference or as the cell remainder.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum RefKind {
    Cell,
    Slice,
    Builder,
    String,
}

/// How one field is laid out.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum FieldLayout {
    Int { bits: u32, signed: bool },
    Coins,
    Bool,
    Address,
    /// Stored in its own referenced cell.
    Reference(RefKind),
    /// Takes the rest of the current cell; always the last field.
    Remainder(RefKind),
    /// A nested struct, either inline (taking `size` of this cell) or boxed.
    Struct {
        type_name: String,
        boxed: bool,
        size: CellSize,
    },
    /// A dictionary: one presence bit plus one reference.
    Dictionary,
}

impl FieldLayout {
    pub fn size(&self) -> CellSize {
        match self {
            Self::Int { bits, .. } => CellSize::bits(*bits),
            Self::Coins => CellSize::bits(124),
            Self::Bool => CellSize::bits(1),
            Self::Address => CellSize::bits(267),
            Self::Reference(_) | Self::Struct { boxed: true, .. } => CellSize::refs(1),
            Self::Remainder(_) => CellSize::ZERO,
            Self::Struct { size, .. } => *size,
            Self::Dictionary => CellSize { bits: 1, refs: 1 },
        }
    }
}

/// One field of an allocation.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AllocationOperation {
    pub name: String,
    pub ty: TypeRef,
    pub layout: FieldLayout,
    /// Preceded by a presence bit.
    pub optional: bool,
}

impl AllocationOperation {
    pub fn size(&self) -> CellSize {
        let presence = CellSize::bits(u32::from(self.optional));
        self.layout.size() + presence
    }

    /// The same field boxed into a reference, if it is an inline struct.
    fn boxed(&self) -> Option<Self> {
        match &self.layout {
            FieldLayout::Struct {
                type_name,
                boxed: false,
                size,
            } => Some(Self {
                layout: FieldLayout::Struct {
                    type_name: type_name.clone(),
                    boxed: true,
                    size: *size,
                },
                ..self.clone()
            }),
            _ => None,
        }
    }
}

/// One cell of an allocation chain.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct AllocationCell {
    pub ops: Vec<AllocationOperation>,
    /// Continuation, stored as the last reference of this cell.
    pub next: Option<Box<AllocationCell>>,
}

impl AllocationCell {
    /// Space taken by this cell's fields and its continuation reference.
    pub fn size(&self) -> CellSize {
        let fields = self
            .ops
            .iter()
            .fold(CellSize::ZERO, |acc, op| acc + op.size());
        fields + CellSize::refs(u32::from(self.next.is_some()))
    }
}

/// The persistent layout of one type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Allocation {
    pub type_name: String,
    /// Layout signature, e.g. `Deploy{queryId:uint64}`.
    pub signature: String,
    /// Discriminator stored before the fields of message payloads.
    pub prefix: Option<u32>,
    pub root: AllocationCell,
}

impl Allocation {
    /// Cells of the chain, root first.
    pub fn cells(&self) -> impl Iterator<Item = &AllocationCell> {
        std::iter::successors(Some(&self.root), |cell| cell.next.as_deref())
    }

    /// All fields in chain order, which is declaration order.
    pub fn operations(&self) -> impl Iterator<Item = &AllocationOperation> {
        self.cells().flat_map(|cell| cell.ops.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.root.ops.is_empty()
    }

    pub fn is_single_cell(&self) -> bool {
        self.root.next.is_none()
    }

    /// Whether the last field takes the rest of its cell.
    pub fn ends_in_remainder(&self) -> bool {
        self.operations()
            .last()
            .is_some_and(|op| matches!(op.layout, FieldLayout::Remainder(_)))
    }

    /// Space taken in the root cell, prefix included.
    pub fn root_size(&self) -> CellSize {
        let prefix = if self.prefix.is_some() {
            PREFIX_BITS
        } else {
            0
        };
        self.root.size() + CellSize::bits(prefix)
    }
}

/// Memoizing allocator over one type graph.
///
/// # Interior Mutability
///
/// Uses `RefCell` for the cache and the cycle-detection set so that nested
/// structs can be allocated recursively through `&self`.
pub struct AllocationEngine<'g> {
    graph: &'g TypeGraph,
    /// Types received by some contract's binary receiver.
    payloads: FxHashSet<String>,
    cache: RefCell<FxHashMap<String, Allocation>>,
    /// Types currently being allocated.
    allocating: RefCell<FxHashSet<String>>,
}

impl<'g> AllocationEngine<'g> {
    pub fn new(graph: &'g TypeGraph) -> Self {
        let payloads = graph
            .contracts()
            .flat_map(|c| c.receivers.iter())
            .filter_map(|r| match &r.selector {
                ReceiverSelector::InternalBinary { type_name, .. } => Some(type_name.clone()),
                _ => None,
            })
            .collect();
        Self {
            graph,
            payloads,
            cache: RefCell::new(FxHashMap::default()),
            allocating: RefCell::new(FxHashSet::default()),
        }
    }

    /// Allocation of struct or contract `name`.
    ///
    /// # Panics
    ///
    /// Panics if the type contains itself or has a field that cannot be
    /// serialized.
    pub fn allocation(&self, name: &str) -> Allocation {
        if let Some(cached) = self.cache.borrow().get(name) {
            return cached.clone();
        }
        assert!(
            self.allocating.borrow_mut().insert(name.to_string()),
            "type `{name}` contains itself"
        );

        let desc = self.graph.get_type(name);
        let payload = self.payloads.contains(name);
        let result = ensure_sufficient_stack(|| {
            self.allocate(name, &desc.fields, desc.prefix.filter(|_| payload), payload)
        });

        self.allocating.borrow_mut().remove(name);
        self.cache
            .borrow_mut()
            .insert(name.to_string(), result.clone());
        result
    }

    /// Allocation of a contract's init arguments.
    pub fn init_allocation(&self, contract: &TypeDescription) -> Allocation {
        let name = init_type_name(&contract.name);
        if let Some(cached) = self.cache.borrow().get(&name) {
            return cached.clone();
        }
        let fields: Vec<FieldDescription> = contract
            .init
            .iter()
            .flat_map(|init| init.args.iter())
            .enumerate()
            .map(|(index, arg)| FieldDescription {
                name: arg.name.clone(),
                ty: arg.ty.clone(),
                index,
                default: None,
                as_format: None,
            })
            .collect();
        let result = self.allocate(&name, &fields, None, false);
        self.cache.borrow_mut().insert(name, result.clone());
        result
    }

    fn allocate(
        &self,
        name: &str,
        fields: &[FieldDescription],
        explicit_prefix: Option<u32>,
        payload: bool,
    ) -> Allocation {
        let formats: Vec<String> = fields
            .iter()
            .map(|f| format!("{}:{}", f.name, self.format_of(f)))
            .collect();
        let signature = format!("{name}{{{}}}", formats.join(","));
        let prefix = payload.then(|| explicit_prefix.unwrap_or_else(|| message_id(&signature)));

        let ops = fields.iter().map(|f| self.operation(f)).collect();
        let reserved = if prefix.is_some() { PREFIX_BITS } else { 0 };
        let root = place(ops, CellSize::bits(reserved));

        let allocation = Allocation {
            type_name: name.to_string(),
            signature,
            prefix,
            root,
        };
        tracing::trace!(
            type_name = name,
            signature = %allocation.signature,
            prefix = ?allocation.prefix,
            cells = allocation.cells().count(),
            "allocated layout"
        );
        allocation
    }

    fn operation(&self, field: &FieldDescription) -> AllocationOperation {
        let (layout, optional) = match &field.ty {
            TypeRef::Simple { name, optional } => {
                (self.layout_of(name, field.as_format.as_deref()), *optional)
            }
            TypeRef::Bounced { name } => (self.layout_of(name, None), false),
            TypeRef::Map { .. } => (FieldLayout::Dictionary, false),
            TypeRef::Void => panic!("field `{}` has no type", field.name),
        };
        AllocationOperation {
            name: field.name.clone(),
            ty: field.ty.clone(),
            layout,
            optional,
        }
    }

    fn layout_of(&self, type_name: &str, format: Option<&str>) -> FieldLayout {
        let desc = self.graph.get_type(type_name);
        match desc.kind {
            TypeKind::Primitive => primitive_layout(type_name, format),
            TypeKind::Struct => {
                let nested = self.allocation(type_name);
                // A remainder would swallow the owner's following fields.
                FieldLayout::Struct {
                    type_name: type_name.to_string(),
                    boxed: !nested.is_single_cell() || nested.ends_in_remainder(),
                    size: nested.root_size(),
                }
            }
            TypeKind::Contract | TypeKind::Trait => {
                panic!("`{type_name}` cannot be stored in a field")
            }
        }
    }

    /// Field format used in layout signatures.
    fn format_of(&self, field: &FieldDescription) -> String {
        match &field.ty {
            TypeRef::Simple { name, optional } => {
                let desc = self.graph.get_type(name);
                let base = match desc.kind {
                    TypeKind::Primitive => primitive_format(name, field.as_format.as_deref()),
                    _ => name.clone(),
                };
                if *optional {
                    format!("Maybe {base}")
                } else {
                    base
                }
            }
            TypeRef::Bounced { name } => name.clone(),
            TypeRef::Map {
                key,
                value,
                key_as,
                value_as,
            } => format!(
                "dict<{}, {}>",
                key_as.clone().unwrap_or_else(|| self.map_format(key)),
                value_as.clone().unwrap_or_else(|| self.map_format(value)),
            ),
            TypeRef::Void => panic!("field `{}` has no type", field.name),
        }
    }

    fn map_format(&self, name: &str) -> String {
        match self.graph.get_type(name).kind {
            TypeKind::Primitive => match name {
                "Int" => "int".to_string(),
                "Bool" => "bool".to_string(),
                "Address" => "address".to_string(),
                "Cell" => "^cell".to_string(),
                _ => panic!("`{name}` cannot be used in a map"),
            },
            _ => format!("^{name}"),
        }
    }
}

/// Pack `ops` into a chain of cells, the first of which already has `used` taken.
fn place(ops: Vec<AllocationOperation>, mut used: CellSize) -> AllocationCell {
    let mut cell = AllocationCell::default();
    let mut rest = ops.into_iter();
    while let Some(op) = rest.next() {
        if matches!(op.layout, FieldLayout::Remainder(_)) {
            assert!(
                rest.as_slice().is_empty(),
                "`remaining` field `{}` must be the last one",
                op.name
            );
            cell.ops.push(op);
            break;
        }
        if used.fits(op.size()) {
            used = used + op.size();
            cell.ops.push(op);
            continue;
        }
        if let Some(boxed) = op.boxed().filter(|b| used.fits(b.size())) {
            used = used + boxed.size();
            cell.ops.push(boxed);
            continue;
        }
        assert!(
            !cell.ops.is_empty(),
            "field `{}` does not fit into an empty cell",
            op.name
        );
        let remaining = std::iter::once(op).chain(rest).collect();
        cell.next = Some(Box::new(place(remaining, CellSize::ZERO)));
        break;
    }
    cell
}

fn ref_kind(name: &str) -> Option<RefKind> {
    match name {
        "Cell" => Some(RefKind::Cell),
        "Slice" => Some(RefKind::Slice),
        "Builder" => Some(RefKind::Builder),
        "String" => Some(RefKind::String),
        _ => None,
    }
}

fn primitive_layout(name: &str, format: Option<&str>) -> FieldLayout {
    if name == "Int" {
        return int_layout(format);
    }
    match (name, ref_kind(name), format) {
        ("Bool", _, None) => FieldLayout::Bool,
        ("Address", _, None) => FieldLayout::Address,
        (_, Some(kind), None) => FieldLayout::Reference(kind),
        (_, Some(kind), Some("remaining")) => FieldLayout::Remainder(kind),
        (_, _, Some(format)) => panic!("unsupported serialization format `{format}` for `{name}`"),
        (_, None, None) => panic!("`{name}` cannot be serialized"),
    }
}

fn int_layout(format: Option<&str>) -> FieldLayout {
    let Some(format) = format else {
        return FieldLayout::Int {
            bits: 257,
            signed: true,
        };
    };
    if format == "coins" {
        return FieldLayout::Coins;
    }
    let (signed, digits) = if let Some(digits) = format.strip_prefix("uint") {
        (false, digits)
    } else if let Some(digits) = format.strip_prefix("int") {
        (true, digits)
    } else {
        panic!("unsupported serialization format `{format}` for `Int`");
    };
    let max = if signed { 257 } else { 256 };
    match digits.parse::<u32>() {
        Ok(bits) if (1..=max).contains(&bits) => FieldLayout::Int { bits, signed },
        _ => panic!("unsupported serialization format `{format}` for `Int`"),
    }
}

fn primitive_format(name: &str, format: Option<&str>) -> String {
    let remaining = format == Some("remaining");
    let referenced = |kind: &str| {
        if remaining {
            format!("remainder<{kind}>")
        } else {
            format!("^{kind}")
        }
    };
    match name {
        "Int" => format.unwrap_or("int257").to_string(),
        "Bool" => "bool".to_string(),
        "Address" => "address".to_string(),
        "Cell" => referenced("cell"),
        "Slice" => referenced("slice"),
        "Builder" => referenced("builder"),
        "String" => referenced("string"),
        _ => panic!("`{name}` cannot be serialized"),
    }
}

/// Allocations of every struct, contract and init-argument list, in
/// declaration order.
#[derive(Clone, Debug, Default)]
pub struct Allocations {
    entries: Vec<Allocation>,
    index: FxHashMap<String, usize>,
}

impl Allocations {
    pub fn resolve(graph: &TypeGraph) -> Self {
        let engine = AllocationEngine::new(graph);
        let mut entries = Vec::new();
        for ty in graph.types().iter().filter(|t| t.is_aggregate()) {
            entries.push(engine.allocation(&ty.name));
            if ty.is_contract() {
                entries.push(engine.init_allocation(ty));
            }
        }
        let index = entries
            .iter()
            .enumerate()
            .map(|(i, a)| (a.type_name.clone(), i))
            .collect();
        tracing::debug!(count = entries.len(), "resolved allocations");
        Self { entries, index }
    }

    pub fn find(&self, name: &str) -> Option<&Allocation> {
        self.index.get(name).map(|&i| &self.entries[i])
    }

    /// # Panics
    ///
    /// Panics if `name` has no allocation.
    pub fn get(&self, name: &str) -> &Allocation {
        match self.find(name) {
            Some(allocation) => allocation,
            None => panic!("no allocation for `{name}`"),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Allocation> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests;
