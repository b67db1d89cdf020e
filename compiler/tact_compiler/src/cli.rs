//! Command-line option parsing for `tactc`.

use std::path::PathBuf;

use crate::pipeline::CompileConfig;

/// Parsed `tactc` invocation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CliOptions {
    /// JSON program description to compile.
    pub input: PathBuf,
    /// Where to write the FunC source; stdout when absent.
    pub output: Option<PathBuf>,
    pub config: CompileConfig,
}

/// Parse the arguments following the program name.
pub fn parse_args(args: &[String]) -> Result<CliOptions, String> {
    let mut options = CliOptions::default();
    let mut input = None;
    let mut i = 0;
    while i < args.len() {
        let arg = args[i].as_str();
        match arg {
            "-o" => {
                let Some(path) = args.get(i + 1) else {
                    return Err("`-o` expects a path".to_string());
                };
                options.output = Some(PathBuf::from(path));
                i += 1;
            }
            "--debug" => options.config.debug = true,
            "--masterchain" => options.config.masterchain = true,
            "--inline" => options.config.inline = true,
            _ => {
                if let Some(name) = arg.strip_prefix("--contract=") {
                    if name.is_empty() {
                        return Err("`--contract=` expects a contract name".to_string());
                    }
                    options.config.contract = Some(name.to_string());
                } else if arg.starts_with('-') {
                    return Err(format!("unknown option `{arg}`"));
                } else if input.is_none() {
                    input = Some(PathBuf::from(arg));
                } else {
                    return Err(format!("unexpected argument `{arg}`"));
                }
            }
        }
        i += 1;
    }
    options.input = input.ok_or_else(|| "missing input file".to_string())?;
    Ok(options)
}
