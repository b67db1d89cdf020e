//! Compilation entry points.

use serde::Deserialize;
use tact_codegen::{write_program, CodegenOptions};
use tact_ir::{AbiDescriptor, ProgramDescription, TypeGraph};
use tracing::{debug, info};

use crate::output::{CompileError, CompileOutput};

/// Configuration for a compilation run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CompileConfig {
    /// Contract to generate entry points for; required when the program
    /// declares more than one.
    pub contract: Option<String>,
    /// Annotate every generated function with its name and dependencies.
    pub debug: bool,
    /// Allow deployment to the masterchain.
    pub masterchain: bool,
    /// Mark child-deployment helpers `inline`.
    pub inline: bool,
}

impl CompileConfig {
    fn options(&self) -> CodegenOptions {
        CodegenOptions {
            debug: self.debug,
            masterchain: self.masterchain,
            inline: self.inline,
        }
    }
}

/// A JSON compilation request: the program plus its ABI descriptor.
#[derive(Clone, Debug, Deserialize)]
pub struct CompileInput {
    #[serde(flatten)]
    pub program: ProgramDescription,
    pub abi: AbiDescriptor,
}

/// Generate FunC for `graph`.
pub fn compile(
    graph: &TypeGraph,
    abi: &AbiDescriptor,
    config: &CompileConfig,
) -> Result<CompileOutput, CompileError> {
    let name = config.contract.as_deref();
    let code = write_program(graph, abi, name, &config.options())?;

    let contract = match name {
        Some(name) => Some(name.to_string()),
        None => graph.contracts().next().map(|c| c.name.clone()),
    };
    info!(
        contract = contract.as_deref().unwrap_or("<none>"),
        bytes = code.len(),
        "generated FunC"
    );
    Ok(CompileOutput { code, contract })
}

/// Parse a JSON [`CompileInput`] and generate FunC for it.
pub fn compile_json(json: &str, config: &CompileConfig) -> Result<CompileOutput, CompileError> {
    let input: CompileInput = serde_json::from_str(json)?;
    debug!(
        types = input.program.types.len(),
        functions = input.program.functions.len(),
        "parsed program description"
    );
    let graph = input.program.into_graph();
    compile(&graph, &input.abi, config)
}
