use pretty_assertions::assert_eq;
use tact_codegen::CodegenError;
use tact_ir::{AbiDescriptor, TypeDescription, TypeGraph, TypeRef};

use crate::{compile, compile_json, parse_args, CompileConfig, CompileError};

const COUNTER: &str = r#"{
    "types": [
        {"kind": "primitive", "name": "Int", "uid": 0},
        {
            "kind": "struct", "name": "Deploy", "uid": 1,
            "fields": [
                {"name": "queryId", "type": {"kind": "simple", "name": "Int"}, "index": 0, "as_format": "uint64"}
            ]
        },
        {
            "kind": "contract", "name": "Counter", "uid": 2,
            "fields": [
                {"name": "value", "type": {"kind": "simple", "name": "Int"}, "index": 0, "as_format": "uint32"}
            ],
            "receivers": [
                {"selector": {"kind": "internal-binary", "type_name": "Deploy", "arg": "msg"}},
                {"selector": {"kind": "internal-comment", "comment": "increment"}}
            ]
        }
    ],
    "abi": {"link": "ipfs://QmCounter"}
}"#;

fn ok(result: Result<crate::CompileOutput, CompileError>) -> crate::CompileOutput {
    match result {
        Ok(output) => output,
        Err(e) => panic!("compilation failed: {e}"),
    }
}

fn args(list: &[&str]) -> Vec<String> {
    list.iter().map(ToString::to_string).collect()
}

// compile_json tests

#[test]
fn json_program_compiles() {
    let output = ok(compile_json(COUNTER, &CompileConfig::default()));
    assert_eq!(output.contract.as_deref(), Some("Counter"));
    assert!(output.code.starts_with("#pragma version >=0.4.0;"));
    assert!(output.code.contains("if (op == 2490013878) {"));
    assert!(output.code.contains("return \"ipfs://QmCounter\";"));
}

#[test]
fn config_reaches_the_generator() {
    let config = CompileConfig {
        debug: true,
        masterchain: true,
        ..CompileConfig::default()
    };
    let output = ok(compile_json(COUNTER, &config));
    assert!(output.code.contains(";; Depends on:"));
    assert!(!output.code.contains("throw_unless(137"));
}

#[test]
fn malformed_json_is_an_input_error() {
    let err = compile_json("{\"types\": [", &CompileConfig::default());
    assert!(matches!(err, Err(CompileError::Input(_))));
}

#[test]
fn missing_abi_is_an_input_error() {
    let err = compile_json("{\"types\": []}", &CompileConfig::default());
    let Err(err) = err else {
        panic!("expected an error");
    };
    assert!(err.to_string().starts_with("invalid program description:"));
}

// compile tests

#[test]
fn unknown_contract_is_reported() {
    let graph = TypeGraph::new(
        vec![
            TypeDescription::primitive("Int"),
            TypeDescription::contract("Counter", 1).with_field("value", TypeRef::simple("Int")),
        ],
        vec![],
    );
    let config = CompileConfig {
        contract: Some("Wallet".to_string()),
        ..CompileConfig::default()
    };
    let err = compile(&graph, &AbiDescriptor::new("ipfs://x"), &config);
    let Err(CompileError::Codegen(err)) = err else {
        panic!("expected a codegen error");
    };
    assert_eq!(
        err,
        CodegenError::ContractNotFound {
            name: "Wallet".to_string()
        }
    );
    assert_eq!(err.to_string(), "contract `Wallet` not found");
}

#[test]
fn program_without_contracts_has_no_entry_contract() {
    let graph = TypeGraph::new(vec![TypeDescription::primitive("Int")], vec![]);
    let output = ok(compile(
        &graph,
        &AbiDescriptor::new("ipfs://x"),
        &CompileConfig::default(),
    ));
    assert_eq!(output.contract, None);
    assert!(output.code.contains("throw(130);"));
}

// parse_args tests

#[test]
fn parse_args_reads_flags_and_paths() {
    let options = match parse_args(&args(&[
        "counter.json",
        "--contract=Counter",
        "--debug",
        "--inline",
        "-o",
        "out/counter.fc",
    ])) {
        Ok(options) => options,
        Err(e) => panic!("{e}"),
    };
    assert_eq!(options.input.to_str(), Some("counter.json"));
    assert_eq!(
        options.output.as_deref().and_then(|p| p.to_str()),
        Some("out/counter.fc")
    );
    assert_eq!(
        options.config,
        CompileConfig {
            contract: Some("Counter".to_string()),
            debug: true,
            masterchain: false,
            inline: true,
        }
    );
}

#[test]
fn parse_args_rejects_bad_invocations() {
    assert_eq!(parse_args(&args(&[])), Err("missing input file".to_string()));
    assert_eq!(
        parse_args(&args(&["a.json", "--fast"])),
        Err("unknown option `--fast`".to_string())
    );
    assert_eq!(
        parse_args(&args(&["a.json", "b.json"])),
        Err("unexpected argument `b.json`".to_string())
    );
    assert_eq!(
        parse_args(&args(&["a.json", "-o"])),
        Err("`-o` expects a path".to_string())
    );
}
