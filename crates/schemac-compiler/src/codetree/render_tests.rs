use indoc::indoc;

use super::render::inline;
use super::{Dim, Node, Renderer, Row, Storage, TreeError, TypeRegistry};

fn render(nodes: &[Node]) -> String {
    Renderer::new(TypeRegistry::builtin(), "    ")
        .render(nodes)
        .unwrap()
}

#[test]
fn function_with_loop() {
    let i = || Node::ident("i");
    let function = Node::Function {
        ret: "void".into(),
        name: "f".into(),
        params: vec![Node::param("FILE *", "out"), Node::param("int", "indent")],
        body: vec![
            Node::var("int", "i"),
            Node::For {
                init: Box::new(Node::binary(i(), "=", Node::Int(0))),
                cond: Box::new(Node::binary(i(), "<", Node::Int(3))),
                step: Box::new(Node::binary(i(), "+=", Node::Int(1))),
                body: vec![Node::statement(Node::call("g", vec![i()]))],
            },
            Node::Return(None),
        ],
    };

    assert_eq!(
        render(&[function]),
        indoc! {"
            void f(FILE *out, int indent) {
                int i;
                for (i = 0; i < 3; i += 1) {
                    g(i);
                }
                return;
            }
        "}
    );
}

#[test]
fn nested_anonymous_struct() {
    let node = Node::Struct {
        tag: Some("config_main_s".into()),
        declarator: None,
        body: vec![
            Node::var("int", "port"),
            Node::Struct {
                tag: None,
                declarator: Some("server".into()),
                body: vec![Node::var("char *", "host")],
            },
        ],
    };

    assert_eq!(
        render(&[node]),
        indoc! {"
            struct config_main_s {
                int port;
                struct {
                    char *host;
                } server;
            };
        "}
    );
}

#[test]
fn table_rows_and_sentinels() {
    let row = |name: &str| Node::Designated(vec![Node::field_init("symbol", Node::str(name))]);
    let groups = Node::Table {
        storage: Storage::Static,
        ty: "schemac_transition_t".into(),
        name: "config_CTransition_vars".into(),
        rows: vec![Some(Row::new(row("port"), "port")), None],
    };
    let ints = Node::Table {
        storage: Storage::Static,
        ty: "schemac_int_t".into(),
        name: "config_CInt_vars".into(),
        rows: vec![
            Some(Row::new(row("a"), "a")),
            Some(Row::new(Node::Designated(vec![]), "b").with_pos(Some("line 3, column 1".into()))),
        ],
    };

    assert_eq!(
        render(&[groups, ints]),
        indoc! {r#"
            static schemac_transition_t config_CTransition_vars[2] = {
                { .symbol = "port" }, // 0. port
                { NULL }, // 1. sentinel
            };
            static schemac_int_t config_CInt_vars[2] = {
                { .symbol = "a" }, // 0. a
                {}  // 1. b
                // line 3, column 1
            };
        "#}
    );
}

#[test]
fn preamble_lines() {
    let nodes = [
        Node::Comment(vec![
            "THIS IS AUTOGENERATED FILE".into(),
            "DO NOT EDIT!!!".into(),
        ]),
        Node::Blank,
        Node::StdInclude("schemac_rt.h".into()),
        Node::Include("config.h".into()),
        Node::Define {
            name: "CONFIG_H".into(),
            value: String::new(),
        },
    ];
    assert_eq!(
        render(&nodes),
        indoc! {r#"
            /* THIS IS AUTOGENERATED FILE */
            /* DO NOT EDIT!!! */

            #include <schemac_rt.h>
            #include "config.h"
            #define CONFIG_H
        "#}
    );
}

#[test]
fn struct_initializer() {
    let node = Node::StructInit {
        storage: Storage::None,
        ty: "schemac_cmdline_t".into(),
        name: "config_cmdline".into(),
        fields: vec![
            Node::field_init("filename", Node::ident("NULL")),
            Node::field_init("debug", Node::Int(0)),
        ],
    };
    assert_eq!(
        render(&[node]),
        indoc! {"
            schemac_cmdline_t config_cmdline = {
                .filename = NULL,
                .debug = 0,
            };
        "}
    );
}

#[test]
fn declarations() {
    let optidx = Node::VarInit {
        storage: Storage::Static,
        ty: "int".into(),
        name: "config_optidx".into(),
        dim: Dim::Unsized,
        init: Box::new(Node::Array(vec![Node::Int(501), Node::Int(0)])),
    };
    let forward = Node::Var {
        storage: Storage::Static,
        ty: "schemac_group_t".into(),
        name: "config_CGroup_vars".into(),
        dim: Dim::Sized(3),
    };
    let prototype = Node::Prototype {
        storage: Storage::Extern,
        ret: "int".into(),
        name: "f".into(),
        params: vec![],
    };
    assert_eq!(
        render(&[optidx, forward, prototype]),
        indoc! {"
            static int config_optidx[] = {501, 0};
            static schemac_group_t config_CGroup_vars[3];
            extern int f(void);
        "}
    );
}

#[test]
fn inline_fragments() {
    let callback = Node::cast("schemac_state_fun", Node::addr(Node::ident("schemac_CInt")));
    insta::assert_snapshot!(inline(&callback), @"(schemac_state_fun)&schemac_CInt");

    let flag = Node::ternary(
        Node::arrow(Node::ident("cfg"), "debug"),
        Node::str("true"),
        Node::str("false"),
    );
    insta::assert_snapshot!(inline(&flag), @r#"cfg->debug ? "true" : "false""#);

    let offset = Node::OffsetOf {
        ty: "config_main_t".into(),
        member: "server.port".into(),
    };
    assert_eq!(inline(&offset), "offsetof(config_main_t, server.port)");
    assert_eq!(inline(&Node::str("say \"hi\"\n")), r#""say \"hi\"\n""#);
    assert_eq!(inline(&Node::Float(8080.0)), "8080.0");
    assert_eq!(inline(&Node::Float(0.25)), "0.25");
    assert_eq!(inline(&Node::Designated(vec![])), "{}");
    assert_eq!(
        inline(&Node::member(Node::Subscript {
            base: Box::new(Node::ident("vars")),
            index: Box::new(Node::UInt(2)),
        }, "value")),
        "vars[2].value"
    );
}

#[test]
fn custom_indent_unit() {
    let node = Node::If {
        cond: Box::new(Node::Not(Box::new(Node::ident("ok")))),
        body: vec![Node::Return(Some(Box::new(Node::Int(1))))],
    };
    let function = Node::Function {
        ret: "int".into(),
        name: "check".into(),
        params: vec![],
        body: vec![node, Node::Blank, Node::Return(Some(Box::new(Node::Int(0))))],
    };
    let text = Renderer::new(TypeRegistry::builtin(), "\t")
        .render(&[function])
        .unwrap();
    assert_eq!(text, "int check(void) {\n\tif (!ok) {\n\t\treturn 1;\n\t}\n\n\treturn 0;\n}\n");
}

#[test]
fn invalid_tree_is_rejected() {
    let stray = Node::statement(Node::call("f", vec![]));
    let err = Renderer::new(TypeRegistry::builtin(), "  ")
        .render(&[stray])
        .unwrap_err();
    assert!(matches!(err, TreeError::FieldKindMismatch { field: "TopLevel", .. }));

    let unfixed = TypeRegistry::new();
    let err = Renderer::new(&unfixed, "  ").render(&[Node::Blank]).unwrap_err();
    assert!(matches!(err, TreeError::UnresolvedSlot { .. }));
}

#[test]
fn rendering_is_deterministic() {
    let nodes = [
        Node::comment("x"),
        Node::Function {
            ret: "void".into(),
            name: "f".into(),
            params: vec![],
            body: vec![Node::statement(Node::call("g", vec![Node::Int(1)]))],
        },
    ];
    assert_eq!(render(&nodes), render(&nodes));
}
