//! Tact IR - resolved program descriptions
//!
//! This crate holds the data handed from the front end to the backend:
//! - Type descriptions (primitives, structs, contracts, traits)
//! - Type references used by fields, arguments and returns
//! - Receivers and their selectors
//! - Function, getter and init descriptions
//! - Resolved statement/expression trees for bodies
//! - The ordered type graph with name lookup
//!
//! Everything here is immutable once built. The backend assumes the front end
//! already validated the graph: it never re-checks semantics, it only aborts
//! on structural impossibilities.
//!
//! # Serialization
//!
//! With the `serde` feature every type can be read from and written to JSON,
//! which is how the driver accepts programs from an external front end.

pub mod abi;
pub mod ast;
mod graph;
mod types;

pub use abi::AbiDescriptor;
pub use ast::{BinaryOp, Expression, NewParameter, Statement, UnaryOp};
pub use graph::{ProgramDescription, TypeGraph};
pub use types::{
    FieldDescription, FunctionArg, FunctionBody, FunctionDescription, InitDescription,
    ReceiverDescription, ReceiverSelector, TypeDescription, TypeKind, TypeRef,
};
