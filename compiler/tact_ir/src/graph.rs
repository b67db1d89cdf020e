//! The resolved type graph.

use rustc_hash::FxHashMap;

use crate::types::{FunctionDescription, TypeDescription, TypeKind};

/// Every type and free function of one program, in declaration order.
///
/// Iteration order is declaration order so that everything derived from the
/// graph is reproducible; the hash maps are only used for lookup.
#[derive(Clone, Debug, Default)]
pub struct TypeGraph {
    types: Vec<TypeDescription>,
    functions: Vec<FunctionDescription>,
    type_index: FxHashMap<String, usize>,
    function_index: FxHashMap<String, usize>,
}

impl TypeGraph {
    /// Build a graph. On duplicate names the first declaration wins.
    pub fn new(types: Vec<TypeDescription>, functions: Vec<FunctionDescription>) -> Self {
        let mut type_index = FxHashMap::default();
        for (i, ty) in types.iter().enumerate() {
            type_index.entry(ty.name.clone()).or_insert(i);
        }
        let mut function_index = FxHashMap::default();
        for (i, f) in functions.iter().enumerate() {
            function_index.entry(f.name.clone()).or_insert(i);
        }
        Self {
            types,
            functions,
            type_index,
            function_index,
        }
    }

    pub fn types(&self) -> &[TypeDescription] {
        &self.types
    }

    pub fn contracts(&self) -> impl Iterator<Item = &TypeDescription> {
        self.types.iter().filter(|t| t.kind == TypeKind::Contract)
    }

    pub fn static_functions(&self) -> &[FunctionDescription] {
        &self.functions
    }

    pub fn find_type(&self, name: &str) -> Option<&TypeDescription> {
        self.type_index.get(name).map(|&i| &self.types[i])
    }

    /// Look up a type that the front end guarantees to exist.
    ///
    /// # Panics
    ///
    /// Panics if the type is not part of the graph.
    pub fn get_type(&self, name: &str) -> &TypeDescription {
        match self.find_type(name) {
            Some(ty) => ty,
            None => panic!("type `{name}` is not part of the type graph"),
        }
    }

    pub fn find_static_function(&self, name: &str) -> Option<&FunctionDescription> {
        self.function_index.get(name).map(|&i| &self.functions[i])
    }
}

/// Serializable form of a program, as produced by an external front end.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProgramDescription {
    #[cfg_attr(feature = "serde", serde(default))]
    pub types: Vec<TypeDescription>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub functions: Vec<FunctionDescription>,
}

impl ProgramDescription {
    pub fn into_graph(self) -> TypeGraph {
        TypeGraph::new(self.types, self.functions)
    }
}
