//! Result types of the driver.

use tact_codegen::CodegenError;

/// Generated FunC for one contract.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompileOutput {
    /// Complete FunC source, ready for the FunC compiler.
    pub code: String,
    /// Contract whose entry points were generated, if the program has any.
    pub contract: Option<String>,
}

/// Why a compilation produced no code.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("invalid program description: {0}")]
    Input(#[from] serde_json::Error),

    #[error(transparent)]
    Codegen(#[from] CodegenError),
}
