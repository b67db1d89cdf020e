//! User-facing code generation errors.
//!
//! Broken invariants of the type graph are not reported here; they abort
//! with a panic, since the front end already validated the program.

use thiserror::Error;

/// Errors reported by [`write_program`](crate::write_program).
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CodegenError {
    #[error("contract `{name}` not found")]
    ContractNotFound { name: String },

    #[error("too many contracts ({}): choose one to compile", .names.join(", "))]
    TooManyContracts { names: Vec<String> },

    #[error("text receiver \"{comment}\" takes {bytes} bytes, at most {max} fit into one cell")]
    CommentTooLong {
        comment: String,
        bytes: usize,
        max: usize,
    },
}

/// Convenience result alias.
pub type CodegenResult<T> = Result<T, CodegenError>;
