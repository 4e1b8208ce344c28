use indoc::indoc;
use schemac_core::{Literal, SchemaError};

use super::{AggregateBody, AggregateKind, DescData, DescRef, Layout, TableKind, lower};
use crate::Error;
use crate::test_utils::{layout, schema};

fn paths(layout: &Layout, kind: TableKind) -> Vec<String> {
    layout
        .table(kind)
        .iter()
        .map(|d| d.path.to_string())
        .collect()
}

/// Every transition must point at a descriptor lowered for the same path.
fn assert_transitions_consistent(layout: &Layout) {
    for entry in layout.transitions().iter().flatten() {
        assert_eq!(layout.get(entry.target).path, entry.path);
    }
}

#[test]
fn port_scenario() {
    let layout = layout(r#"{ "port": { "!Int": { "min": 1, "max": 65535, "=": 8080 } } }"#);

    let ints = layout.table(TableKind::Int);
    assert_eq!(ints.len(), 1);
    assert_eq!(ints[0].index, 0);
    assert_eq!(ints[0].path.to_string(), "port");
    let DescData::Scalar(spec) = &ints[0].data else {
        panic!("expected a scalar");
    };
    assert_eq!(spec.default_value(), Some(&Literal::Int(8080)));

    assert_eq!(layout.table(TableKind::Group).len(), 1);
    assert_eq!(layout.root(), DescRef::new(TableKind::Group, 0));

    let transitions = layout.transitions();
    assert_eq!(transitions.len(), 2);
    let port = transitions[0].as_ref().unwrap();
    assert_eq!(port.symbol.as_str(), "port");
    assert_eq!(port.target, DescRef::new(TableKind::Int, 0));
    assert!(transitions[1].is_none());
}

#[test]
fn root_group_is_first() {
    let layout = layout(indoc! {r#"
        {
          "a": { "x": { "!Int": 1 } },
          "b": { "c": { "y": { "!Int": 2 } } }
        }
    "#});

    assert_eq!(
        paths(&layout, TableKind::Group),
        ["<root>", "b", "b.c", "a"]
    );
    assert_eq!(layout.root().index, 0);
    for (index, group) in layout.table(TableKind::Group).iter().enumerate() {
        assert_eq!(group.index, index);
    }
    assert_transitions_consistent(&layout);

    let members: Vec<_> = layout
        .members(layout.root())
        .map(|t| (t.symbol.as_str(), t.target))
        .collect();
    assert_eq!(
        members,
        [
            ("a", DescRef::new(TableKind::Group, 3)),
            ("b", DescRef::new(TableKind::Group, 1)),
        ]
    );
}

#[test]
fn sentinel_only_for_non_empty_groups() {
    let layout = layout(r#"{ "empty": {}, "x": { "!Int": 1 } }"#);

    let empty = layout
        .table(TableKind::Group)
        .iter()
        .find(|g| g.path.to_string() == "empty")
        .unwrap();
    assert_eq!(empty.data, DescData::Group { transitions: None });
    assert_eq!(layout.members(DescRef::new(TableKind::Group, empty.index)).count(), 0);

    let sentinels = layout.transitions().iter().filter(|t| t.is_none()).count();
    assert_eq!(sentinels, 1);
    assert!(layout.transitions().last().unwrap().is_none());
}

#[test]
fn every_non_empty_group_has_one_sentinel() {
    let layout = layout(indoc! {r#"
        {
          "a": { "x": { "!Int": 1 }, "y": { "!Int": 2 } },
          "b": { "c": { "z": { "!Bool": true } } },
          "d": {}
        }
    "#});
    let sentinels = layout.transitions().iter().filter(|t| t.is_none()).count();
    // root, a, b, b.c
    assert_eq!(sentinels, 4);
}

#[test]
fn indices_follow_first_visit_order() {
    let json = indoc! {r#"
        {
          "first": { "!Int": 1 },
          "nested": { "second": { "!Int": 2 }, "flag": { "!Bool": false } },
          "third": { "!Int": 3 }
        }
    "#};
    let once = layout(json);
    assert_eq!(
        paths(&once, TableKind::Int),
        ["first", "nested.second", "third"]
    );
    assert_eq!(paths(&once, TableKind::Bool), ["nested.flag"]);
    assert_eq!(once, layout(json));
}

#[test]
fn field_paths_track_owner() {
    let layout = layout(indoc! {r#"
        {
          "server": { "listen": { "port": { "!Int": 80 } } },
          "tags": { "!Array": { "!String": null } },
          "limits": { "!Mapping": { "key": { "!String": null }, "value": { "!UInt": 0 } } }
        }
    "#});

    let port = &layout.table(TableKind::Int)[0];
    assert_eq!(port.field.owner, "main");
    assert_eq!(port.field.dotted(), "server.listen.port");

    let strings = layout.table(TableKind::String);
    assert_eq!(strings[0].field.to_string(), "tags_a::value");
    assert_eq!(strings[1].field.to_string(), "limits_m::key");
    assert_eq!(layout.table(TableKind::UInt)[0].field.to_string(), "limits_m::value");

    let root = layout.get(layout.root());
    assert_eq!(root.field.to_string(), "main");
}

#[test]
fn array_of_strings() {
    let layout = layout(r#"{ "tags": { "!Array": { "!String": null } } }"#);

    let array = &layout.table(TableKind::Array)[0];
    let DescData::Array { element, aggregate } = &array.data else {
        panic!("expected an array");
    };
    assert_eq!(aggregate, "tags_a");
    assert_eq!(*element, DescRef::new(TableKind::String, 0));
    assert_eq!(layout.get(*element).path.to_string(), "tags[]");

    let names: Vec<_> = layout.aggregates().map(|a| a.name.as_str()).collect();
    assert_eq!(names, ["main", "tags_a"]);
    let element_agg = layout.aggregate("tags_a").unwrap();
    assert_eq!(element_agg.kind, AggregateKind::ArrayElement);
    assert_eq!(element_agg.body(), AggregateBody::Element(*element));
}

#[test]
fn shared_named_type() {
    let layout = layout(indoc! {r#"
        {
          "__types__": { "Endpoint": { "host": { "!String": "localhost" }, "port": { "!Int": 80 } } },
          "primary": { "!Struct": "Endpoint" },
          "backup": { "!Struct": "Endpoint" }
        }
    "#});

    assert_eq!(paths(&layout, TableKind::Custom), ["primary", "backup"]);
    assert_eq!(paths(&layout, TableKind::Usertype), ["__types__.Endpoint"]);
    assert_eq!(paths(&layout, TableKind::Int), ["__types__.Endpoint.port"]);
    let endpoints = layout
        .aggregates()
        .filter(|a| a.name == "Endpoint")
        .count();
    assert_eq!(endpoints, 1);

    let usertype = layout.usertype("Endpoint").unwrap();
    let DescData::Usertype { group, .. } = &layout.get(usertype).data else {
        panic!("expected a usertype");
    };
    let members: Vec<_> = layout.members(*group).map(|t| t.symbol.as_str()).collect();
    assert_eq!(members, ["host", "port"]);
    assert_eq!(layout.get(*group).field.owner, "Endpoint");
    assert_transitions_consistent(&layout);
}

#[test]
fn unused_types_lowered_after_root() {
    let layout = layout(indoc! {r#"
        {
          "__types__": {
            "Unused": { "a": { "x": { "!Int": 1 } } },
            "Used": { "y": { "!Int": 2 } }
          },
          "nested": { "u": { "!Struct": "Used" } }
        }
    "#});

    assert_eq!(layout.root().index, 0);
    let names: Vec<_> = layout.usertypes().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, ["Used", "Unused"]);
    let groups = paths(&layout, TableKind::Group);
    assert_eq!(groups[0], "<root>");
    assert_eq!(
        &groups[groups.len() - 2..],
        ["__types__.Unused.a", "__types__.Unused"]
    );
    assert_transitions_consistent(&layout);
}

#[test]
fn inherited_members_come_first() {
    let layout = layout(indoc! {r#"
        {
          "__types__": {
            "Base": { "id": { "!Int": 0 } },
            "Derived": { "__inherits__": "Base", "name": { "!String": null } }
          },
          "item": { "!Struct": "Derived" }
        }
    "#});
    let usertype = layout.usertype("Derived").unwrap();
    let DescData::Usertype { group, .. } = &layout.get(usertype).data else {
        panic!("expected a usertype");
    };
    let members: Vec<_> = layout.members(*group).map(|t| t.path.to_string()).collect();
    assert_eq!(members, ["__types__.Derived.id", "__types__.Derived.name"]);
}

#[test]
fn redefined_inherited_member() {
    let schema = schema(indoc! {r#"
        {
          "__types__": {
            "Base": { "id": { "!Int": 0 } },
            "Derived": { "__inherits__": "Base", "id": { "!Int": 1 } }
          }
        }
    "#});
    let err = lower(&schema).unwrap_err();
    let Error::Schema(SchemaError::At { path, source }) = err else {
        panic!("unexpected error {err:?}");
    };
    assert_eq!(path, "__types__.Derived.id");
    assert!(matches!(*source, SchemaError::DuplicateMember(_)));
}

#[test]
fn unresolved_type_reference() {
    let schema = schema(r#"{ "upstream": { "sub": { "!Struct": "Missing" } } }"#);
    let err = lower(&schema).unwrap_err();
    let Error::UnresolvedTypeReference { name, path, pos } = &err else {
        panic!("unexpected error {err:?}");
    };
    assert_eq!(name.as_str(), "Missing");
    assert_eq!(path.to_string(), "upstream.sub");
    assert_eq!(*pos, None);
    assert_eq!(
        err.to_string(),
        "upstream.sub: unresolved type reference `Missing`"
    );
}

#[test]
fn unknown_base_type() {
    let schema = schema(r#"{ "__types__": { "T": { "__inherits__": "Nope" } } }"#);
    assert!(matches!(
        lower(&schema),
        Err(Error::UnresolvedTypeReference { name, .. }) if name.as_str() == "Nope"
    ));
}

#[test]
fn self_embedding_by_value_is_unsupported() {
    let schema = schema(indoc! {r#"
        {
          "__types__": { "Node": { "next": { "inner": { "!Struct": "Node" } } } },
          "root": { "!Struct": "Node" }
        }
    "#});
    let err = lower(&schema).unwrap_err();
    assert_eq!(
        err.to_string(),
        "__types__.Node.next.inner: unsupported schema shape: type `Node` embeds itself by value"
    );
}

#[test]
fn recursion_through_array_is_allowed() {
    let layout = layout(indoc! {r#"
        {
          "__types__": { "Node": { "name": { "!String": null }, "children": { "!Array": { "!Struct": "Node" } } } },
          "tree": { "!Struct": "Node" }
        }
    "#});
    assert_eq!(layout.table(TableKind::Usertype).len(), 1);
    assert_eq!(paths(&layout, TableKind::Custom), ["__types__.Node.children[]", "tree"]);
    assert!(layout.aggregate("Node_children_a").is_some());
}

#[test]
fn tag_member_must_exist() {
    let schema = schema(r#"{ "__types__": { "Shape": { "__tag__": "kind", "size": { "!Int": 1 } } } }"#);
    let err = lower(&schema).unwrap_err();
    assert!(matches!(err, Error::UnsupportedSchemaShape { .. }), "{err:?}");
}

#[test]
fn tag_values_form_sentinel_run() {
    let layout = layout(indoc! {r#"
        {
          "__types__": {
            "Shape": { "__tag__": "kind", "__tags__": { "circle": 1, "square": 2 }, "kind": { "!Int": 1 } }
          }
        }
    "#});
    let tags: Vec<_> = layout
        .tags()
        .iter()
        .map(|t| t.as_ref().map(|t| (t.name.as_str(), t.value)))
        .collect();
    assert_eq!(tags, [Some(("circle", 1)), Some(("square", 2)), None]);
    let DescData::Usertype { tags, tag_member, .. } = &layout.table(TableKind::Usertype)[0].data
    else {
        panic!("expected a usertype");
    };
    assert_eq!(*tags, Some(0));
    assert_eq!(tag_member.as_ref().unwrap().as_str(), "kind");
}

#[test]
fn reserved_type_name() {
    let schema = schema(r#"{ "__types__": { "main": {} } }"#);
    assert!(matches!(
        lower(&schema),
        Err(Error::UnsupportedSchemaShape { .. })
    ));
}

#[test]
fn aggregate_names_are_unique() {
    let layout = layout(indoc! {r#"
        {
          "a_b": { "!Array": { "!Int": null } },
          "a": { "b": { "!Array": { "!Int": null } } }
        }
    "#});
    let names: Vec<_> = layout.aggregates().map(|a| a.name.as_str()).collect();
    assert_eq!(names, ["main", "a_b_a", "a_b_a2"]);
}

#[test]
fn bound_in_first_encounter_order() {
    let layout = layout(indoc! {r#"
        {
          "b": { "!Int": { "command_line": "--bee" } },
          "group": { "a": { "!Bool": { "environ": "A" } } },
          "c": { "!Int": 0 }
        }
    "#});
    let bound: Vec<_> = layout
        .bound()
        .iter()
        .map(|&r| layout.get(r).path.to_string())
        .collect();
    assert_eq!(bound, ["b", "group.a"]);
}
