// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

use assert_cmd::Command;
use solidity_ast::{AssignmentOperator, AstBuilder, ContractNode, SolType, SourceUnit, StatementKind};
use std::{fs, path::Path};

fn counter_unit(extra: Option<StatementKind>) -> SourceUnit {
    let mut b = AstBuilder::new("Counter.sol");
    let count = b.state_var("count", SolType::uint(8));
    let by = b.param("by", SolType::uint(8));
    let target = b.ident(&count);
    let amount = b.ident(&by);
    let add = b.assign_op(AssignmentOperator::AssignAdd, target, amount);
    let mut stmts = vec![b.expr_stmt(add)];
    if let Some(kind) = extra {
        stmts.push(b.stmt(kind));
    }
    let body = b.block(stmts);
    let inc = b.function("inc", vec![by], vec![], body);
    let contract = b.contract(
        "Counter",
        vec![ContractNode::StateVariable(count), ContractNode::Function(inc)],
    );
    b.source_unit(vec![contract])
}

fn write_ast(dir: &Path, units: &[SourceUnit]) -> String {
    let path = dir.join("ast.json");
    fs::write(&path, serde_json::to_string_pretty(units).unwrap()).unwrap();
    path.to_string_lossy().to_string()
}

fn solc_verify() -> Command {
    let mut cmd = Command::cargo_bin("solc-verify").unwrap();
    cmd.env_remove("BOOGIE_EXE");
    cmd
}

#[test]
fn generates_boogie_program() {
    let dir = tempfile::tempdir().unwrap();
    let ast = write_ast(dir.path(), &[counter_unit(None)]);
    let output = dir.path().join("Counter.bpl");
    let result = solc_verify()
        .args([ast.as_str(), "-o", output.to_str().unwrap()])
        .output()
        .unwrap();
    assert!(result.status.success());
    let stdout = String::from_utf8_lossy(&result.stdout);
    assert!(stdout.contains("Boogie program written to"));
    let program = fs::read_to_string(&output).unwrap();
    assert!(program.contains("type address_t;"));
    assert!(program.contains("// ------- Contract: Counter -------"));
    assert!(program.contains(": [address_t]int;"));
}

#[test]
fn configuration_file_selects_encoding() {
    let dir = tempfile::tempdir().unwrap();
    let ast = write_ast(dir.path(), &[counter_unit(None)]);
    let output = dir.path().join("Counter.bpl");
    let config = dir.path().join("solc-verify.toml");
    fs::write(
        &config,
        format!(
            "encoding = \"bv\"\noverflow_checks = true\noutput_path = {:?}\n",
            output.to_string_lossy()
        ),
    )
    .unwrap();
    solc_verify()
        .args([ast.as_str(), "--config", config.to_str().unwrap()])
        .assert()
        .success();
    let program = fs::read_to_string(&output).unwrap();
    assert!(program.contains(": [address_t]bv8;"));
    assert!(program.contains("{:message \"Overflow in computation\"}"));
}

#[test]
fn unsupported_constructs_fail_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let ast = write_ast(dir.path(), &[counter_unit(Some(StatementKind::InlineAssembly))]);
    let output = dir.path().join("Counter.bpl");
    let result = solc_verify()
        .args([ast.as_str(), "-o", output.to_str().unwrap()])
        .output()
        .unwrap();
    assert!(!result.status.success());
    assert!(String::from_utf8_lossy(&result.stdout).contains("exiting with translation errors"));
    assert!(String::from_utf8_lossy(&result.stderr).contains("Inline assembly is not supported"));
    // written anyway for inspection
    assert!(output.exists());
}

#[test]
fn malformed_input_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ast.json");
    fs::write(&path, "{ \"id\": 1, \"path\": ").unwrap();
    let result = solc_verify().arg(path.to_str().unwrap()).output().unwrap();
    assert!(!result.status.success());
    assert!(String::from_utf8_lossy(&result.stdout).contains("parsing"));
}
