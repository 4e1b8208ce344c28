use indoc::indoc;

use crate::{
    CompositeSpec, Literal, OptionClass, ScalarKind, SchemaError, SpecKind, load_str,
};

#[test]
fn loads_port_scenario() {
    let schema = load_str(indoc! {r#"
        {
          "__meta__": { "program_name": "demo", "description": "Demo server" },
          "port": { "!Int": { "min": 1, "max": 65535, "=": 8080,
                              "command_line": "-p --port", "environ": "DEMO_PORT",
                              "description": "Listening port" } }
        }
    "#})
    .unwrap();

    assert_eq!(schema.meta().program_name, "demo");
    let port = schema.root().get("port").unwrap();
    let scalar = port.as_scalar().unwrap();
    assert_eq!(scalar.kind(), ScalarKind::Integer);
    assert_eq!(scalar.default_value(), Some(&Literal::Int(8080)));
    assert_eq!(scalar.min(), Some(&Literal::Int(1)));
    assert_eq!(port.meta().description.as_deref(), Some("Listening port"));

    let binding = &port.meta().binding;
    assert_eq!(binding.options()[0].class(), OptionClass::Option);
    assert_eq!(binding.options()[0].short(), Some('p'));
    assert_eq!(binding.env().unwrap().as_str(), "DEMO_PORT");
}

#[test]
fn preserves_member_order() {
    let schema = load_str(r#"{ "b": { "!Int": 1 }, "a": { "!Int": 2 }, "c": { "x": { "!Bool": true } } }"#)
        .unwrap();
    let names: Vec<_> = schema.root().members().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, ["b", "a", "c"]);
}

#[test]
fn renamed_keys_keep_their_document_spelling() {
    let schema = load_str(r#"{ "log-level": { "!Int": 3 }, "default": { "x-y": { "!Bool": true } } }"#)
        .unwrap();
    let root = schema.root();
    let keyed: Vec<_> = root
        .keyed_members()
        .map(|(key, name, _)| (key, name.as_str()))
        .collect();
    assert_eq!(keyed, [("log-level", "log_level"), ("default", "default_")]);
    assert_eq!(root.key("port"), "port");

    let SpecKind::Composite(CompositeSpec::Group(inner)) = root.get("default_").unwrap().kind() else {
        panic!("expected a group");
    };
    assert_eq!(inner.key("x_y"), "x-y");
}

#[test]
fn shorthand_defaults_and_units() {
    let schema = load_str(indoc! {r#"
        {
          "buffer": { "!UInt": "4ki" },
          "ratio": { "!Float": "1.5k" },
          "name": { "!String": "srv" },
          "log-file": { "!File": null }
        }
    "#})
    .unwrap();
    let default = |name: &str| {
        schema
            .root()
            .get(name)
            .and_then(|s| s.as_scalar())
            .and_then(|s| s.default_value().cloned())
    };
    assert_eq!(default("buffer"), Some(Literal::UInt(4096)));
    assert_eq!(default("ratio"), Some(Literal::Float(1500.0)));
    assert_eq!(default("name"), Some(Literal::Str("srv".into())));
    assert_eq!(default("log_file"), None);
}

#[test]
fn composites_and_types() {
    let schema = load_str(indoc! {r#"
        {
          "__types__": {
            "Base": { "id": { "!Int": 0 } },
            "Endpoint": { "__inherits__": "Base", "host": { "!String": "localhost" } }
          },
          "servers": { "!Array": { "!Struct": "Endpoint" } },
          "limits": { "!Mapping": { "key": { "!String": null }, "value": { "!Int": 0 } } }
        }
    "#})
    .unwrap();

    let endpoint = schema.resolve("Endpoint").unwrap();
    assert_eq!(endpoint.inherits().unwrap().as_str(), "Base");
    assert!(endpoint.members().contains("host"));

    let SpecKind::Composite(CompositeSpec::Array(element)) =
        schema.root().get("servers").unwrap().kind()
    else {
        panic!("servers should be an array");
    };
    assert!(matches!(
        element.kind(),
        SpecKind::Composite(CompositeSpec::NamedType(n)) if n.as_str() == "Endpoint"
    ));
    assert!(matches!(
        schema.root().get("limits").unwrap().kind(),
        SpecKind::Composite(CompositeSpec::Mapping { .. })
    ));
}

#[test]
fn tagged_types() {
    let schema = load_str(indoc! {r#"
        {
          "__types__": {
            "Shape": { "__tag__": "kind", "__tags__": { "circle": 1, "square": 2 },
                       "kind": { "!Int": 1 } }
          },
          "shape": { "!Struct": "Shape" }
        }
    "#})
    .unwrap();
    let shape = schema.resolve("Shape").unwrap();
    assert_eq!(shape.tag().unwrap().as_str(), "kind");
    assert_eq!(shape.tag_values().count(), 2);
    assert!(!shape.members().contains("__tag__"));
}

#[test]
fn rejects_unknown_attribute() {
    let err = load_str(r#"{ "port": { "!Int": { "minimum": 1 } } }"#).unwrap_err();
    let SchemaError::Document { path, message } = err else {
        panic!("unexpected error {err:?}");
    };
    assert_eq!(path, "port");
    assert!(message.contains("minimum"), "{message}");
}

#[test]
fn rejects_unknown_tag() {
    let err = load_str(r#"{ "x": { "!Complex": null } }"#).unwrap_err();
    assert_eq!(err.to_string(), "x: unknown tag `!Complex`");
}

#[test]
fn rejects_bad_default() {
    let err = load_str(r#"{ "flag": { "!Bool": "yes" } }"#).unwrap_err();
    assert_eq!(
        err,
        SchemaError::At {
            path: "flag".into(),
            source: Box::new(SchemaError::AttributeMismatch {
                kind: ScalarKind::Boolean,
                attribute: "default",
            }),
        }
    );
}

#[test]
fn rejects_bad_binding() {
    let err = load_str(r#"{ "n": { "!Int": { "command_line": "n" } } }"#).unwrap_err();
    assert_eq!(err.root_cause(), &SchemaError::InvalidBinding("n".into()));
    assert_eq!(err.to_string(), "n: invalid command-line binding `n`");
}

#[test]
fn rejects_malformed_json() {
    assert!(matches!(load_str("{"), Err(SchemaError::Syntax(_))));
    assert!(matches!(load_str("[]"), Err(SchemaError::Document { .. })));
}
