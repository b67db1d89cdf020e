//! FunC Code Generation Backend for Tact
//!
//! This crate lowers a resolved Tact type graph into one FunC program:
//!
//! 1. **Allocations** - bit-packed cell layouts and message prefixes
//! 2. **Tensors** - nested structs flattened onto the FunC stack
//! 3. **Writer context** - dependency-tracked emission, only reachable code is rendered
//! 4. **Router** - `recv_internal` dispatch over typed, text, empty, bounce and fallback receivers
//!
//! # Architecture
//!
//! ```text
//! TypeGraph + AbiDescriptor
//!        ↓
//!    Allocations     (layouts, prefixes)
//!        ↓
//!   WriterContext    (stdlib, serializers, accessors, storage, functions, router)
//!        ↓
//!      render        (FunC source)
//! ```

pub mod accessors;
pub mod allocation;
mod cell_hash;
pub mod context;
mod error;
mod expression;
pub mod func_type;
mod function;
mod program;
mod router;
pub mod serialization;
mod stack;
pub mod stdlib;
mod storage;
pub mod tensor;

pub use allocation::{Allocation, AllocationEngine, Allocations};
pub use cell_hash::{comment_hash, message_id, MAX_COMMENT_BYTES};
pub use context::{Flag, WriterContext};
pub use error::{CodegenError, CodegenResult};
pub use program::{write_program, CodegenOptions};
pub use tensor::{RenderMode, Tensor};
