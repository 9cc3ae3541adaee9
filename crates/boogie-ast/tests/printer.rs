// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

use boogie_ast::{
    Attr, Binding, Block, Decl, Expr, Procedure, Program, Specification, Stmt, Type,
};

fn sample_program() -> Program {
    let mut program = Program::new("// prelude");
    program.add_decl(Decl::opaque_type("address_t"));
    program.add_decl(Decl::constant(
        "__zero__address",
        Type::named("address_t"),
        true,
    ));
    program.add_decl(Decl::variable(
        "__balance",
        Type::map(Type::named("address_t"), Type::Int),
    ));
    program.add_decl(Decl::function(
        "bv8add",
        vec![Binding::anonymous(Type::Bv(8)), Binding::anonymous(Type::Bv(8))],
        Type::Bv(8),
        None,
        vec![Attr::bv_builtin("bvadd")],
    ));

    let x = Expr::id("x#5");
    let sum = Expr::plus(x.clone(), Expr::int(1));
    let procedure = Procedure {
        params: vec![
            Binding::new("__this", Type::named("address_t")),
            Binding::new("x#5", Type::Int),
        ],
        returns: vec![Binding::new("r#6", Type::Int)],
        locals: vec![Decl::variable("tmp#7", Type::Int)],
        requires: vec![Specification::new(
            Expr::gt(x.clone(), Expr::int(0)),
            vec![Attr::message("positive")],
        )],
        ensures: vec![Specification::new(
            Expr::eq(Expr::id("r#6"), sum.clone()),
            vec![],
        )],
        modifies: vec!["__balance".to_string()],
        blocks: vec![
            Block::new(vec![
                Stmt::assign(Expr::id("tmp#7"), sum),
                Stmt::assign(Expr::id("r#6"), Expr::id("tmp#7")),
                Stmt::goto("$return0"),
            ]),
            Block::labelled("$return0", vec![]),
        ],
    };
    program.add_decl(Decl::procedure("inc#4", procedure).with_attrs(vec![Attr::inline(1)]));
    program
}

#[test]
fn prints_whole_program() {
    let expected = "\
// prelude

type address_t;

const unique __zero__address: address_t;

var __balance: [address_t]int;

function {:bvbuiltin \"bvadd\"} bv8add(bv8, bv8) returns (bv8);

procedure {:inline 1} inc#4(__this: address_t, x#5: int)
  returns (r#6: int)
  modifies __balance;
  requires {:message \"positive\"} (x#5 > 0);
  ensures (r#6 == (x#5 + 1));
{
  var tmp#7: int;
  tmp#7 := (x#5 + 1);
  r#6 := tmp#7;
  goto $return0;
  $return0:
}
";
    assert_eq!(sample_program().to_string(), expected);
}

#[test]
fn printing_is_deterministic() {
    assert_eq!(sample_program().to_string(), sample_program().to_string());
}

#[test]
fn while_with_invariants() {
    let mut program = Program::default();
    let loop_body = Block::new(vec![
        Stmt::assign(Expr::id("i"), Expr::plus(Expr::id("i"), Expr::int(1))),
        Stmt::IfElse {
            cond: Some(Expr::gt(Expr::id("i"), Expr::int(10))),
            then_block: Block::new(vec![Stmt::Break]),
            else_block: None,
        },
    ]);
    let procedure = Procedure {
        blocks: vec![Block::new(vec![
            Stmt::comment("loop"),
            Stmt::While {
                cond: Expr::bool(true),
                invariants: vec![Specification::new(
                    Expr::gte(Expr::id("i"), Expr::int(0)),
                    vec![],
                )],
                body: loop_body,
            },
            Stmt::Havoc(vec!["i".to_string()]),
            Stmt::Return,
        ])],
        ..Default::default()
    };
    program.add_decl(Decl::procedure("main", procedure));
    program.add_decl(Decl::comment("", "------- Contract: A -------"));
    program.add_decl(Decl::axiom(Expr::neq(Expr::id("a"), Expr::id("b"))));

    let expected = "\
procedure main()
{
  // loop
  while (true)
    invariant (i >= 0);
  {
    i := (i + 1);
    if ((i > 10)) {
      break;
    }
  }
  havoc i;
  return;
}

// ------- Contract: A -------

axiom (a != b);
";
    assert_eq!(program.to_string(), expected);
}
