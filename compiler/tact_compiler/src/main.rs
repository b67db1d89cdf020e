//! Tact backend CLI.
//!
//! Reads a JSON program description and writes the generated FunC.

use tact_compiler::{compile_json, init_tracing, parse_args};

fn main() {
    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let options = match parse_args(&args) {
        Ok(options) => options,
        Err(message) => {
            eprintln!("error: {message}");
            print_usage();
            std::process::exit(1);
        }
    };

    let json = match std::fs::read_to_string(&options.input) {
        Ok(json) => json,
        Err(e) => {
            eprintln!("error: cannot read '{}': {e}", options.input.display());
            std::process::exit(1);
        }
    };

    let output = match compile_json(&json, &options.config) {
        Ok(output) => output,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };

    match &options.output {
        Some(path) => {
            if let Err(e) = std::fs::write(path, &output.code) {
                eprintln!("error: cannot write '{}': {e}", path.display());
                std::process::exit(1);
            }
        }
        None => print!("{}", output.code),
    }
}

fn print_usage() {
    eprintln!("Usage: tactc <program.json> [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --contract=<name>   Contract to generate entry points for");
    eprintln!("  --debug             Annotate functions with their dependencies");
    eprintln!("  --masterchain       Allow masterchain deployments");
    eprintln!("  --inline            Inline child-deployment helpers");
    eprintln!("  -o <path>           Output file (default: stdout)");
}
