//! JSON schema documents.
//!
//! Object key order is significant and preserved. A plain object is a group;
//! an object with a single `!Tag` key is a typed node:
//!
//! ```json
//! {
//!   "__meta__": { "program_name": "demo" },
//!   "__types__": { "Endpoint": { "host": { "!String": "localhost" } } },
//!   "port": { "!Int": { "min": 1, "max": 65535, "=": 8080, "command_line": "-p --port" } },
//!   "upstream": { "!Struct": "Endpoint" },
//!   "tags": { "!Array": { "!String": null } }
//! }
//! ```

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::utils::{c_varname, parse_float_with_units, parse_int_with_units};
use crate::{
    Binding, CliOption, Group, Ident, Literal, OptionClass, PathChecks, ScalarKind, ScalarSpec,
    Schema, SchemaError, SchemaMeta, SchemaPath, Spec, TypeDef,
};

const META_KEY: &str = "__meta__";
const TYPES_KEY: &str = "__types__";
const INHERITS_KEY: &str = "__inherits__";
const TAG_KEY: &str = "__tag__";
const TAGS_KEY: &str = "__tags__";

/// Attributes accepted inside a tagged node.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawAttrs {
    #[serde(rename = "=")]
    eq: Option<Value>,
    default: Option<Value>,
    min: Option<Value>,
    max: Option<Value>,
    check_existence: Option<bool>,
    check_dir: Option<bool>,
    check_writable: Option<bool>,
    element: Option<Value>,
    key: Option<Value>,
    value: Option<Value>,
    #[serde(rename = "type")]
    type_name: Option<String>,
    description: Option<String>,
    command_line: Option<String>,
    command_line_incr: Option<String>,
    command_line_decr: Option<String>,
    command_line_enable: Option<String>,
    command_line_disable: Option<String>,
    environ: Option<String>,
}

/// Parse a schema document from JSON text.
pub fn load_str(text: &str) -> Result<Schema, SchemaError> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| SchemaError::Syntax(e.to_string()))?;
    load_value(&value)
}

/// Build a schema from an already parsed JSON value.
pub fn load_value(value: &Value) -> Result<Schema, SchemaError> {
    let Value::Object(top) = value else {
        return Err(doc_error(&SchemaPath::root(), "document must be an object"));
    };

    let mut builder = Schema::builder();
    if let Some(meta) = top.get(META_KEY) {
        let meta: SchemaMeta = serde_json::from_value(meta.clone())
            .map_err(|e| doc_error(&SchemaPath::root(), &format!("{META_KEY}: {e}")))?;
        builder = builder.meta(meta);
    }

    if let Some(types) = top.get(TYPES_KEY) {
        let Value::Object(types) = types else {
            return Err(doc_error(&SchemaPath::root(), "__types__ must be an object"));
        };
        for (name, body) in types {
            let name = ident(&SchemaPath::root(), name)?;
            let path = SchemaPath::type_def(&name);
            let type_def = load_type_def(&path, name, body)?;
            builder.add_type(type_def).map_err(|e| at(&path, e))?;
        }
    }

    let mut root = Group::new();
    for (key, spec) in top {
        if key == META_KEY || key == TYPES_KEY {
            continue;
        }
        let name = ident(&SchemaPath::root(), &c_varname(key))?;
        let path = SchemaPath::root().member(&name);
        let spec = load_spec(&path, spec)?;
        root.insert_keyed(key, name, spec).map_err(|e| at(&path, e))?;
    }

    Ok(builder.root(root).build())
}

fn load_type_def(path: &SchemaPath, name: Ident, body: &Value) -> Result<TypeDef, SchemaError> {
    let Value::Object(body) = body else {
        return Err(doc_error(path, "type definition must be an object"));
    };

    let mut members = Group::new();
    for (key, spec) in body {
        if matches!(key.as_str(), INHERITS_KEY | TAG_KEY | TAGS_KEY) {
            continue;
        }
        let member = ident(path, &c_varname(key))?;
        let member_path = path.member(&member);
        let spec = load_spec(&member_path, spec)?;
        members
            .insert_keyed(key, member, spec)
            .map_err(|e| at(&member_path, e))?;
    }

    let mut type_def = TypeDef::new(name, members);
    if let Some(base) = body.get(INHERITS_KEY) {
        type_def = type_def.with_inherits(ident(path, expect_str(path, INHERITS_KEY, base)?)?);
    }
    if let Some(tag) = body.get(TAG_KEY) {
        type_def = type_def.with_tag(ident(path, &c_varname(expect_str(path, TAG_KEY, tag)?))?);
    }
    if let Some(tags) = body.get(TAGS_KEY) {
        let Value::Object(tags) = tags else {
            return Err(doc_error(path, "__tags__ must be an object"));
        };
        for (tag_name, value) in tags {
            let Some(value) = value.as_i64() else {
                return Err(doc_error(path, &format!("tag `{tag_name}` must be an integer")));
            };
            type_def = type_def
                .with_tag_value(ident(path, &c_varname(tag_name))?, value)
                .map_err(|e| at(path, e))?;
        }
    }
    Ok(type_def)
}

fn load_spec(path: &SchemaPath, value: &Value) -> Result<Spec, SchemaError> {
    let Value::Object(map) = value else {
        return Err(doc_error(path, "expected a group object or a tagged node"));
    };
    if let Some((tag, inner)) = as_tagged(map) {
        return load_tagged(path, tag, inner);
    }

    let mut group = Group::new();
    for (key, spec) in map {
        let name = ident(path, &c_varname(key))?;
        let member_path = path.member(&name);
        let spec = load_spec(&member_path, spec)?;
        group.insert_keyed(key, name, spec).map_err(|e| at(&member_path, e))?;
    }
    Ok(Spec::group(group))
}

fn as_tagged(map: &Map<String, Value>) -> Option<(&str, &Value)> {
    if map.len() != 1 {
        return None;
    }
    let (key, value) = map.iter().next()?;
    key.starts_with('!').then_some((key.as_str(), value))
}

fn load_tagged(path: &SchemaPath, tag: &str, inner: &Value) -> Result<Spec, SchemaError> {
    let attrs = match inner {
        Value::Object(map) if as_tagged(map).is_some() => RawAttrs {
            element: Some(inner.clone()),
            ..RawAttrs::default()
        },
        Value::Object(_) => serde_json::from_value(inner.clone())
            .map_err(|e| doc_error(path, &format!("{tag}: {e}")))?,
        Value::Null => RawAttrs::default(),
        Value::String(s) if tag == "!Struct" => RawAttrs {
            type_name: Some(s.clone()),
            ..RawAttrs::default()
        },
        scalar => RawAttrs {
            default: Some(scalar.clone()),
            ..RawAttrs::default()
        },
    };

    let scalar_kind = match tag {
        "!Int" => Some(ScalarKind::Integer),
        "!UInt" => Some(ScalarKind::UnsignedInteger),
        "!Float" => Some(ScalarKind::Float),
        "!Bool" => Some(ScalarKind::Boolean),
        "!String" => Some(ScalarKind::String),
        "!File" => Some(ScalarKind::FilePath),
        "!Dir" => Some(ScalarKind::DirectoryPath),
        _ => None,
    };

    let spec = match (scalar_kind, tag) {
        (Some(kind), _) => Spec::scalar(load_scalar(path, kind, &attrs)?),
        (None, "!Array") => {
            let element = attrs
                .element
                .as_ref()
                .ok_or_else(|| doc_error(path, "!Array needs an element"))?;
            Spec::array(load_spec(&path.child(crate::Segment::Element), element)?)
        }
        (None, "!Mapping") => {
            let (Some(key), Some(value)) = (&attrs.key, &attrs.value) else {
                return Err(doc_error(path, "!Mapping needs a key and a value"));
            };
            Spec::mapping(
                load_spec(&path.child(crate::Segment::Key), key)?,
                load_spec(&path.child(crate::Segment::Value), value)?,
            )
        }
        (None, "!Struct") => {
            let name = attrs
                .type_name
                .as_deref()
                .ok_or_else(|| doc_error(path, "!Struct needs a type name"))?;
            Spec::named(ident(path, name)?)
        }
        (None, other) => return Err(doc_error(path, &format!("unknown tag `{other}`"))),
    };

    let mut spec = spec.with_binding(load_binding(path, &attrs)?);
    if let Some(description) = attrs.description {
        spec = spec.with_description(description);
    }
    Ok(spec)
}

fn load_scalar(
    path: &SchemaPath,
    kind: ScalarKind,
    attrs: &RawAttrs,
) -> Result<ScalarSpec, SchemaError> {
    let mut spec = ScalarSpec::new(kind);
    if let Some(default) = attrs.eq.as_ref().or(attrs.default.as_ref()) {
        spec = spec
            .with_default(literal(path, kind, default)?)
            .map_err(|e| at(path, e))?;
    }
    if let Some(min) = &attrs.min {
        spec = spec.with_min(literal(path, kind, min)?).map_err(|e| at(path, e))?;
    }
    if let Some(max) = &attrs.max {
        spec = spec.with_max(literal(path, kind, max)?).map_err(|e| at(path, e))?;
    }
    let checks = PathChecks {
        existence: attrs.check_existence,
        is_dir: attrs.check_dir,
        writable: attrs.check_writable,
    };
    spec.with_checks(checks).map_err(|e| at(path, e))
}

fn literal(path: &SchemaPath, kind: ScalarKind, value: &Value) -> Result<Literal, SchemaError> {
    let literal = match value {
        Value::Bool(b) => Some(Literal::Bool(*b)),
        Value::Number(n) => n
            .as_i64()
            .map(Literal::Int)
            .or_else(|| n.as_u64().map(Literal::UInt))
            .or_else(|| n.as_f64().map(Literal::Float)),
        Value::String(s) => match kind {
            ScalarKind::Integer | ScalarKind::UnsignedInteger => {
                parse_int_with_units(s).map(Literal::Int)
            }
            ScalarKind::Float => parse_float_with_units(s).map(Literal::Float),
            _ => Some(Literal::Str(s.clone())),
        },
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    };
    literal.ok_or_else(|| doc_error(path, &format!("`{value}` is not a valid {kind} value")))
}

fn load_binding(path: &SchemaPath, attrs: &RawAttrs) -> Result<Binding, SchemaError> {
    let mut binding = Binding::new();
    let sources = [
        (OptionClass::Option, &attrs.command_line),
        (OptionClass::IncrementOption, &attrs.command_line_incr),
        (OptionClass::DecrementOption, &attrs.command_line_decr),
        (OptionClass::EnableOption, &attrs.command_line_enable),
        (OptionClass::DisableOption, &attrs.command_line_disable),
    ];
    for (class, source) in sources {
        if let Some(source) = source {
            let option = CliOption::parse(class, source).map_err(|e| at(path, e))?;
            binding = binding.with_option(option);
        }
    }
    if let Some(env) = &attrs.environ {
        binding = binding.with_env(ident(path, env)?);
    }
    Ok(binding)
}

fn expect_str<'v>(path: &SchemaPath, key: &str, value: &'v Value) -> Result<&'v str, SchemaError> {
    value
        .as_str()
        .ok_or_else(|| doc_error(path, &format!("{key} must be a string")))
}

fn ident(path: &SchemaPath, name: &str) -> Result<Ident, SchemaError> {
    Ident::new(name).map_err(|e| at(path, e))
}

fn at(path: &SchemaPath, error: SchemaError) -> SchemaError {
    SchemaError::At {
        path: path.to_string(),
        source: Box::new(error),
    }
}

fn doc_error(path: &SchemaPath, message: &str) -> SchemaError {
    SchemaError::Document {
        path: path.to_string(),
        message: message.to_string(),
    }
}
