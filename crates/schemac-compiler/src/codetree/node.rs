//! Node taxonomy of the code tree.
//!
//! Each variant is rendered from a constant [`Template`]; the template names
//! the fields it substitutes and [`Node::field`] resolves them. Child nodes
//! are checked against the slots the [`TypeRegistry`](super::TypeRegistry)
//! declares for the variant.

use std::borrow::Cow;

use schemac_core::utils::c_string;

/// Storage class of a declaration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Storage {
    #[default]
    None,
    Static,
    Extern,
}

impl Storage {
    fn keyword(self) -> Option<&'static str> {
        match self {
            Storage::None => None,
            Storage::Static => Some("static"),
            Storage::Extern => Some("extern"),
        }
    }
}

/// Array dimension of a declaration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Dim {
    #[default]
    Scalar,
    Unsized,
    Sized(usize),
}

/// One row of a [`Node::Table`].
#[derive(Clone, Debug, PartialEq)]
pub struct Row {
    pub value: Node,
    /// Text after `// <index>. `.
    pub comment: String,
    /// Source position line emitted after the row.
    pub pos: Option<String>,
}

impl Row {
    pub fn new(value: Node, comment: impl Into<String>) -> Self {
        Self {
            value,
            comment: comment.into(),
            pos: None,
        }
    }

    pub fn with_pos(mut self, pos: Option<String>) -> Self {
        self.pos = pos;
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    Blank,
    Comment(Vec<String>),
    StdInclude(String),
    Include(String),
    Define { name: String, value: String },
    Ifndef(String),
    Endif,

    Ident(String),
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(String),
    Member { base: Box<Node>, name: String },
    Arrow { base: Box<Node>, name: String },
    Subscript { base: Box<Node>, index: Box<Node> },
    Ref(Box<Node>),
    Deref(Box<Node>),
    Not(Box<Node>),
    Binary {
        op: &'static str,
        left: Box<Node>,
        right: Box<Node>,
    },
    Ternary {
        cond: Box<Node>,
        then: Box<Node>,
        otherwise: Box<Node>,
    },
    Cast { ty: String, expr: Box<Node> },
    Sizeof(String),
    OffsetOf { ty: String, member: String },
    Call { func: String, args: Vec<Node> },

    Array(Vec<Node>),
    Designated(Vec<Node>),
    FieldInit { name: String, value: Box<Node> },

    Param { ty: String, name: String },
    Var {
        storage: Storage,
        ty: String,
        name: String,
        dim: Dim,
    },
    VarInit {
        storage: Storage,
        ty: String,
        name: String,
        dim: Dim,
        init: Box<Node>,
    },
    Typedef { ty: String, name: String },
    Prototype {
        storage: Storage,
        ret: String,
        name: String,
        params: Vec<Node>,
    },

    Statement(Box<Node>),
    Assign { target: Box<Node>, value: Box<Node> },
    Return(Option<Box<Node>>),

    Struct {
        tag: Option<String>,
        declarator: Option<String>,
        body: Vec<Node>,
    },
    Function {
        ret: String,
        name: String,
        params: Vec<Node>,
        body: Vec<Node>,
    },
    For {
        init: Box<Node>,
        cond: Box<Node>,
        step: Box<Node>,
        body: Vec<Node>,
    },
    If { cond: Box<Node>, body: Vec<Node> },

    /// Sentinel-aware descriptor table; `None` rows are sentinels.
    Table {
        storage: Storage,
        ty: String,
        name: String,
        rows: Vec<Option<Row>>,
    },
    /// Multi-line designated initializer of a single object.
    StructInit {
        storage: Storage,
        ty: String,
        name: String,
        fields: Vec<Node>,
    },
}

/// Fieldless mirror of [`Node`], used by the registry and in errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeKind {
    Blank,
    Comment,
    StdInclude,
    Include,
    Define,
    Ifndef,
    Endif,
    Ident,
    Int,
    UInt,
    Float,
    Str,
    Member,
    Arrow,
    Subscript,
    Ref,
    Deref,
    Not,
    Binary,
    Ternary,
    Cast,
    Sizeof,
    OffsetOf,
    Call,
    Array,
    Designated,
    FieldInit,
    Param,
    Var,
    VarInit,
    Typedef,
    Prototype,
    Statement,
    Assign,
    Return,
    Struct,
    Function,
    For,
    If,
    Table,
    StructInit,
}

impl NodeKind {
    pub const ALL: [NodeKind; 41] = [
        NodeKind::Blank,
        NodeKind::Comment,
        NodeKind::StdInclude,
        NodeKind::Include,
        NodeKind::Define,
        NodeKind::Ifndef,
        NodeKind::Endif,
        NodeKind::Ident,
        NodeKind::Int,
        NodeKind::UInt,
        NodeKind::Float,
        NodeKind::Str,
        NodeKind::Member,
        NodeKind::Arrow,
        NodeKind::Subscript,
        NodeKind::Ref,
        NodeKind::Deref,
        NodeKind::Not,
        NodeKind::Binary,
        NodeKind::Ternary,
        NodeKind::Cast,
        NodeKind::Sizeof,
        NodeKind::OffsetOf,
        NodeKind::Call,
        NodeKind::Array,
        NodeKind::Designated,
        NodeKind::FieldInit,
        NodeKind::Param,
        NodeKind::Var,
        NodeKind::VarInit,
        NodeKind::Typedef,
        NodeKind::Prototype,
        NodeKind::Statement,
        NodeKind::Assign,
        NodeKind::Return,
        NodeKind::Struct,
        NodeKind::Function,
        NodeKind::For,
        NodeKind::If,
        NodeKind::Table,
        NodeKind::StructInit,
    ];

    /// Rendering template of the variant.
    pub fn template(self) -> Template {
        use Template::*;
        match self {
            NodeKind::Blank => Line(""),
            NodeKind::Comment => EachLine("/* {line} */"),
            NodeKind::StdInclude => Line("#include <{name}>"),
            NodeKind::Include => Line("#include \"{name}\""),
            NodeKind::Define => Line("#define {name}{ value}"),
            NodeKind::Ifndef => Line("#ifndef {name}"),
            NodeKind::Endif => Line("#endif"),
            NodeKind::Ident | NodeKind::Int | NodeKind::UInt | NodeKind::Float | NodeKind::Str => {
                Line("{value}")
            }
            NodeKind::Member => Line("{base}.{name}"),
            NodeKind::Arrow => Line("{base}->{name}"),
            NodeKind::Subscript => Line("{base}[{index}]"),
            NodeKind::Ref => Line("&{expr}"),
            NodeKind::Deref => Line("*{expr}"),
            NodeKind::Not => Line("!{expr}"),
            NodeKind::Binary => Line("{left} {op} {right}"),
            NodeKind::Ternary => Line("{cond} ? {then} : {otherwise}"),
            NodeKind::Cast => Line("({ty}){expr}"),
            NodeKind::Sizeof => Line("sizeof({ty})"),
            NodeKind::OffsetOf => Line("offsetof({ty}, {member})"),
            NodeKind::Call => Line("{func}({args})"),
            NodeKind::Array => Line("{{{items}}}"),
            NodeKind::Designated => Line("{{{ fields }}}"),
            NodeKind::FieldInit => Line(".{name} = {value}"),
            NodeKind::Param => Line("{decl}"),
            NodeKind::Var => Line("{storage }{decl}{dim};"),
            NodeKind::VarInit => Line("{storage }{decl}{dim} = {init};"),
            NodeKind::Typedef => Line("typedef {ty} {name};"),
            NodeKind::Prototype => Line("{storage }{decl}({params});"),
            NodeKind::Statement => Line("{expr};"),
            NodeKind::Assign => Line("{target} = {value};"),
            NodeKind::Return => Line("return{ expr};"),
            NodeKind::Struct => Block {
                start: "struct{ tag} {{",
                end: "}}{ declarator};",
            },
            NodeKind::Function => Block {
                start: "{decl}({params}) {{",
                end: "}}",
            },
            NodeKind::For => Block {
                start: "for ({init}; {cond}; {step}) {{",
                end: "}}",
            },
            NodeKind::If => Block {
                start: "if ({cond}) {{",
                end: "}}",
            },
            NodeKind::Table => Rows {
                start: "{storage }{ty} {name}[{len}] = {{",
                end: "}};",
            },
            NodeKind::StructInit => Rows {
                start: "{storage }{ty} {name} = {{",
                end: "}};",
            },
        }
    }
}

/// How a variant turns into text.
///
/// Placeholders are `{field}`; whitespace inside the braces (`{ tag}`,
/// `{storage }`) is emitted only around a non-empty value. `{{` and `}}` are
/// literal braces.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Template {
    /// One line, or an inline fragment when used as a field.
    Line(&'static str),
    /// The template repeated for every line of a comment, as `{line}`.
    EachLine(&'static str),
    /// Start line, indented body, end line.
    Block {
        start: &'static str,
        end: &'static str,
    },
    /// Start line, one indented line per row, end line.
    Rows {
        start: &'static str,
        end: &'static str,
    },
}

/// A resolved template field.
#[derive(Debug)]
pub enum FieldValue<'a> {
    Text(Cow<'a, str>),
    Node(&'a Node),
    List(&'a [Node], &'static str),
    Absent,
}

fn text<'a>(s: &'a str) -> FieldValue<'a> {
    FieldValue::Text(Cow::Borrowed(s))
}

fn owned<'a>(s: String) -> FieldValue<'a> {
    FieldValue::Text(Cow::Owned(s))
}

fn opt_text(s: &Option<String>) -> FieldValue<'_> {
    s.as_deref().map_or(FieldValue::Absent, text)
}

/// `char *name` for pointer types, `int name` otherwise.
pub fn declarator(ty: &str, name: &str) -> String {
    if ty.ends_with('*') {
        format!("{ty}{name}")
    } else {
        format!("{ty} {name}")
    }
}

fn dim_text(dim: Dim) -> FieldValue<'static> {
    match dim {
        Dim::Scalar => FieldValue::Absent,
        Dim::Unsized => text("[]"),
        Dim::Sized(n) => owned(format!("[{n}]")),
    }
}

fn storage_text(storage: Storage) -> FieldValue<'static> {
    storage.keyword().map_or(FieldValue::Absent, text)
}

/// Shortest decimal form that still reads back as a C double.
pub fn float_literal(value: f64) -> String {
    let mut s = format!("{value:?}");
    if value.is_finite() && !s.contains(['.', 'e']) {
        s.push_str(".0");
    }
    s
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Blank => NodeKind::Blank,
            Node::Comment(_) => NodeKind::Comment,
            Node::StdInclude(_) => NodeKind::StdInclude,
            Node::Include(_) => NodeKind::Include,
            Node::Define { .. } => NodeKind::Define,
            Node::Ifndef(_) => NodeKind::Ifndef,
            Node::Endif => NodeKind::Endif,
            Node::Ident(_) => NodeKind::Ident,
            Node::Int(_) => NodeKind::Int,
            Node::UInt(_) => NodeKind::UInt,
            Node::Float(_) => NodeKind::Float,
            Node::Str(_) => NodeKind::Str,
            Node::Member { .. } => NodeKind::Member,
            Node::Arrow { .. } => NodeKind::Arrow,
            Node::Subscript { .. } => NodeKind::Subscript,
            Node::Ref(_) => NodeKind::Ref,
            Node::Deref(_) => NodeKind::Deref,
            Node::Not(_) => NodeKind::Not,
            Node::Binary { .. } => NodeKind::Binary,
            Node::Ternary { .. } => NodeKind::Ternary,
            Node::Cast { .. } => NodeKind::Cast,
            Node::Sizeof(_) => NodeKind::Sizeof,
            Node::OffsetOf { .. } => NodeKind::OffsetOf,
            Node::Call { .. } => NodeKind::Call,
            Node::Array(_) => NodeKind::Array,
            Node::Designated(_) => NodeKind::Designated,
            Node::FieldInit { .. } => NodeKind::FieldInit,
            Node::Param { .. } => NodeKind::Param,
            Node::Var { .. } => NodeKind::Var,
            Node::VarInit { .. } => NodeKind::VarInit,
            Node::Typedef { .. } => NodeKind::Typedef,
            Node::Prototype { .. } => NodeKind::Prototype,
            Node::Statement(_) => NodeKind::Statement,
            Node::Assign { .. } => NodeKind::Assign,
            Node::Return(_) => NodeKind::Return,
            Node::Struct { .. } => NodeKind::Struct,
            Node::Function { .. } => NodeKind::Function,
            Node::For { .. } => NodeKind::For,
            Node::If { .. } => NodeKind::If,
            Node::Table { .. } => NodeKind::Table,
            Node::StructInit { .. } => NodeKind::StructInit,
        }
    }

    /// Resolve a template field; `None` when the variant has no such field.
    pub fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        let value = match (self, name) {
            (Node::StdInclude(n) | Node::Include(n) | Node::Ifndef(n), "name") => text(n),
            (Node::Define { name, .. }, "name") => text(name),
            (Node::Define { value, .. }, "value") => text(value),

            (Node::Ident(v), "value") => text(v),
            (Node::Int(v), "value") => owned(v.to_string()),
            (Node::UInt(v), "value") => owned(v.to_string()),
            (Node::Float(v), "value") => owned(float_literal(*v)),
            (Node::Str(v), "value") => owned(c_string(v)),

            (Node::Member { base, .. } | Node::Arrow { base, .. }, "base") => FieldValue::Node(base),
            (Node::Member { name, .. } | Node::Arrow { name, .. }, "name") => text(name),
            (Node::Subscript { base, .. }, "base") => FieldValue::Node(base),
            (Node::Subscript { index, .. }, "index") => FieldValue::Node(index),
            (Node::Ref(e) | Node::Deref(e) | Node::Not(e), "expr") => FieldValue::Node(e),
            (Node::Binary { op, .. }, "op") => text(op),
            (Node::Binary { left, .. }, "left") => FieldValue::Node(left),
            (Node::Binary { right, .. }, "right") => FieldValue::Node(right),
            (Node::Ternary { cond, .. }, "cond") => FieldValue::Node(cond),
            (Node::Ternary { then, .. }, "then") => FieldValue::Node(then),
            (Node::Ternary { otherwise, .. }, "otherwise") => FieldValue::Node(otherwise),
            (Node::Cast { ty, .. }, "ty") => text(ty),
            (Node::Cast { expr, .. }, "expr") => FieldValue::Node(expr),
            (Node::Sizeof(ty), "ty") => text(ty),
            (Node::OffsetOf { ty, .. }, "ty") => text(ty),
            (Node::OffsetOf { member, .. }, "member") => text(member),
            (Node::Call { func, .. }, "func") => text(func),
            (Node::Call { args, .. }, "args") => FieldValue::List(args, ", "),

            (Node::Array(items), "items") => FieldValue::List(items, ", "),
            (Node::Designated(fields), "fields") => FieldValue::List(fields, ", "),
            (Node::FieldInit { name, .. }, "name") => text(name),
            (Node::FieldInit { value, .. }, "value") => FieldValue::Node(value),

            (Node::Param { ty, name }, "decl") => owned(declarator(ty, name)),
            (
                Node::Var { storage, .. }
                | Node::VarInit { storage, .. }
                | Node::Prototype { storage, .. }
                | Node::Table { storage, .. }
                | Node::StructInit { storage, .. },
                "storage",
            ) => storage_text(*storage),
            (Node::Var { ty, name, .. } | Node::VarInit { ty, name, .. }, "decl") => {
                owned(declarator(ty, name))
            }
            (Node::Var { dim, .. } | Node::VarInit { dim, .. }, "dim") => dim_text(*dim),
            (Node::VarInit { init, .. }, "init") => FieldValue::Node(init),
            (Node::Typedef { ty, .. }, "ty") => text(ty),
            (Node::Typedef { name, .. }, "name") => text(name),
            (Node::Prototype { ret, name, .. } | Node::Function { ret, name, .. }, "decl") => {
                owned(declarator(ret, name))
            }
            (Node::Prototype { params, .. } | Node::Function { params, .. }, "params") => {
                if params.is_empty() {
                    text("void")
                } else {
                    FieldValue::List(params, ", ")
                }
            }

            (Node::Statement(e), "expr") => FieldValue::Node(e),
            (Node::Assign { target, .. }, "target") => FieldValue::Node(target),
            (Node::Assign { value, .. }, "value") => FieldValue::Node(value),
            (Node::Return(e), "expr") => e.as_deref().map_or(FieldValue::Absent, FieldValue::Node),

            (Node::Struct { tag, .. }, "tag") => opt_text(tag),
            (Node::Struct { declarator, .. }, "declarator") => opt_text(declarator),
            (Node::For { init, .. }, "init") => FieldValue::Node(init),
            (Node::For { cond, .. } | Node::If { cond, .. }, "cond") => FieldValue::Node(cond),
            (Node::For { step, .. }, "step") => FieldValue::Node(step),

            (Node::Table { ty, .. } | Node::StructInit { ty, .. }, "ty") => text(ty),
            (Node::Table { name, .. } | Node::StructInit { name, .. }, "name") => text(name),
            (Node::Table { rows, .. }, "len") => owned(rows.len().to_string()),
            _ => return None,
        };
        Some(value)
    }

    /// Every child node, keyed by the field that holds it.
    pub fn children(&self) -> Vec<(&'static str, &Node)> {
        fn list<'a>(field: &'static str, nodes: &'a [Node], out: &mut Vec<(&'static str, &'a Node)>) {
            out.extend(nodes.iter().map(|n| (field, n)));
        }

        let mut out: Vec<(&'static str, &Node)> = Vec::new();
        match self {
            Node::Member { base, .. } | Node::Arrow { base, .. } => out.push(("base", base)),
            Node::Subscript { base, index } => {
                out.push(("base", base));
                out.push(("index", index));
            }
            Node::Ref(e) | Node::Deref(e) | Node::Not(e) => out.push(("expr", e)),
            Node::Binary { left, right, .. } => {
                out.push(("left", left));
                out.push(("right", right));
            }
            Node::Ternary {
                cond,
                then,
                otherwise,
            } => {
                out.push(("cond", cond));
                out.push(("then", then));
                out.push(("otherwise", otherwise));
            }
            Node::Cast { expr, .. } => out.push(("expr", expr)),
            Node::Call { args, .. } => list("args", args, &mut out),
            Node::Array(items) => list("items", items, &mut out),
            Node::Designated(fields) => list("fields", fields, &mut out),
            Node::FieldInit { value, .. } => out.push(("value", value)),
            Node::VarInit { init, .. } => out.push(("init", init)),
            Node::Prototype { params, .. } => list("params", params, &mut out),
            Node::Statement(e) => out.push(("expr", e)),
            Node::Assign { target, value } => {
                out.push(("target", target));
                out.push(("value", value));
            }
            Node::Return(Some(e)) => out.push(("expr", e)),
            Node::Struct { body, .. } => list("body", body, &mut out),
            Node::Function { params, body, .. } => {
                list("params", params, &mut out);
                list("body", body, &mut out);
            }
            Node::For {
                init,
                cond,
                step,
                body,
            } => {
                out.push(("init", init));
                out.push(("cond", cond));
                out.push(("step", step));
                list("body", body, &mut out);
            }
            Node::If { cond, body } => {
                out.push(("cond", cond));
                list("body", body, &mut out);
            }
            Node::Table { rows, .. } => {
                for row in rows.iter().flatten() {
                    out.push(("rows", &row.value));
                }
            }
            Node::StructInit { fields, .. } => list("fields", fields, &mut out),
            _ => {}
        }
        out
    }

    /// Child list a [`ScopeBuilder`](super::ScopeBuilder) populates.
    pub fn body_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Node::Struct { body, .. }
            | Node::Function { body, .. }
            | Node::For { body, .. }
            | Node::If { body, .. } => Some(body),
            _ => None,
        }
    }

    /// Comment lines, for [`Template::EachLine`].
    pub fn lines(&self) -> &[String] {
        match self {
            Node::Comment(lines) => lines,
            _ => &[],
        }
    }
}

/// Constructors for the variants the generator builds most.
impl Node {
    pub fn ident(name: impl Into<String>) -> Self {
        Node::Ident(name.into())
    }

    pub fn str(value: impl Into<String>) -> Self {
        Node::Str(value.into())
    }

    pub fn comment(line: impl Into<String>) -> Self {
        Node::Comment(vec![line.into()])
    }

    pub fn arrow(base: Node, name: impl Into<String>) -> Self {
        Node::Arrow {
            base: Box::new(base),
            name: name.into(),
        }
    }

    pub fn member(base: Node, name: impl Into<String>) -> Self {
        Node::Member {
            base: Box::new(base),
            name: name.into(),
        }
    }

    pub fn addr(expr: Node) -> Self {
        Node::Ref(Box::new(expr))
    }

    pub fn binary(left: Node, op: &'static str, right: Node) -> Self {
        Node::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn ternary(cond: Node, then: Node, otherwise: Node) -> Self {
        Node::Ternary {
            cond: Box::new(cond),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        }
    }

    pub fn cast(ty: impl Into<String>, expr: Node) -> Self {
        Node::Cast {
            ty: ty.into(),
            expr: Box::new(expr),
        }
    }

    pub fn call(func: impl Into<String>, args: Vec<Node>) -> Self {
        Node::Call {
            func: func.into(),
            args,
        }
    }

    pub fn field_init(name: impl Into<String>, value: Node) -> Self {
        Node::FieldInit {
            name: name.into(),
            value: Box::new(value),
        }
    }

    pub fn param(ty: impl Into<String>, name: impl Into<String>) -> Self {
        Node::Param {
            ty: ty.into(),
            name: name.into(),
        }
    }

    pub fn var(ty: impl Into<String>, name: impl Into<String>) -> Self {
        Node::Var {
            storage: Storage::None,
            ty: ty.into(),
            name: name.into(),
            dim: Dim::Scalar,
        }
    }

    pub fn assign(target: Node, value: Node) -> Self {
        Node::Assign {
            target: Box::new(target),
            value: Box::new(value),
        }
    }

    pub fn statement(expr: Node) -> Self {
        Node::Statement(Box::new(expr))
    }

    pub fn function(ret: impl Into<String>, name: impl Into<String>, params: Vec<Node>) -> Self {
        Node::Function {
            ret: ret.into(),
            name: name.into(),
            params,
            body: Vec::new(),
        }
    }

    /// Prototype matching a [`Node::Function`] header.
    pub fn prototype_of(function: &Node) -> Option<Self> {
        let Node::Function {
            ret, name, params, ..
        } = function
        else {
            return None;
        };
        Some(Node::Prototype {
            storage: Storage::None,
            ret: ret.clone(),
            name: name.clone(),
            params: params.clone(),
        })
    }
}
