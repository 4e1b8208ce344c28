//! Printer and defaults functions.
//!
//! Both walk an aggregate in schema order. Groups are flattened into the
//! enclosing function, lists become a loop over the runtime linked list, and
//! named types and composite list elements call their own function, which is
//! synthesized on first use and memoized by name.

use schemac_core::ScalarKind;
use tracing::debug;

use super::generator::{Generator, access, literal};
use crate::codetree::{Node, ScopeBuilder};
use crate::invariants::{ensure_aggregate, ensure_member};
use crate::lower::{AggregateBody, DescData, DescRef, Descriptor};
use crate::{Error, Result};

/// Aggregate of the schema root.
pub(super) const MAIN: &str = "main";

/// Function under construction and where its support functions go.
#[derive(Clone, Copy)]
struct Frame<'s, 'r> {
    ast: &'s ScopeBuilder<'r>,
    prototypes: &'s ScopeBuilder<'r>,
    /// Aggregate the function receives as `cfg`.
    aggregate: &'s str,
}

impl Frame<'_, '_> {
    /// Storage of `d`: `cfg-><chain>`, or `<cursor>-><chain>` inside a loop.
    fn value(&self, d: &Descriptor) -> Node {
        access(self.base(&d.field.owner), &d.field.chain)
    }

    /// Element count stored next to a list pointer.
    fn length(&self, d: &Descriptor) -> Node {
        let (last, rest) = ensure_member(d.field.chain.split_last(), &d.field.owner);
        let len = format!("{last}_len");
        if rest.is_empty() {
            Node::arrow(Node::ident(self.base(&d.field.owner)), len)
        } else {
            Node::member(access(self.base(&d.field.owner), rest), len)
        }
    }

    fn base<'n>(&self, owner: &'n str) -> &'n str {
        if owner == self.aggregate { "cfg" } else { owner }
    }
}

impl<'a> Generator<'a> {
    /// Emit `<prefix>_print_<aggregate>` unless it exists; returns its name.
    pub(super) fn ensure_printer<'r>(
        &mut self,
        ast: &ScopeBuilder<'r>,
        prototypes: &ScopeBuilder<'r>,
        aggregate: &str,
    ) -> Result<String> {
        let name = self.printer_name(aggregate);
        if !self.emitted.insert(name.clone()) {
            return Ok(name);
        }

        let function = self.printer_header(aggregate);
        declare(prototypes, &function)?;
        let frame = Frame {
            ast,
            prototypes,
            aggregate,
        };
        let contents = self.contents(aggregate);
        ast.append(Node::Blank)?;
        ast.scoped(function, |body| self.print_contents(frame, body, contents, 0))?;
        debug!(function = %name, "synthesized printer");
        Ok(name)
    }

    /// Emit `<prefix>_defaults_<aggregate>` unless it exists; returns its name.
    pub(super) fn ensure_defaults<'r>(
        &mut self,
        ast: &ScopeBuilder<'r>,
        prototypes: &ScopeBuilder<'r>,
        aggregate: &str,
    ) -> Result<String> {
        let name = self.defaults_name(aggregate);
        if !self.emitted.insert(name.clone()) {
            return Ok(name);
        }

        let function = self.defaults_header(aggregate);
        declare(prototypes, &function)?;
        let frame = Frame {
            ast,
            prototypes,
            aggregate,
        };
        let parts = match ensure_aggregate(self.layout.aggregate(aggregate), aggregate).body() {
            AggregateBody::Group(group) => vec![group],
            AggregateBody::Element(value) => vec![value],
            AggregateBody::Entry { key, value } => vec![key, value],
        };
        ast.append(Node::Blank)?;
        ast.scoped(function, |body| {
            parts
                .into_iter()
                .try_for_each(|part| self.defaults_contents(frame, body, part))
        })?;
        debug!(function = %name, "synthesized defaults");
        Ok(name)
    }

    /// `<prefix>_print_config`: YAML preamble, then the root printer.
    pub(super) fn print_config(&self, ast: &ScopeBuilder<'_>) -> Result<()> {
        let function = self.print_config_header();
        let title = format!("# Configuration {}\n", self.program_name()).replace('%', "%%");
        ast.append(Node::Blank)?;
        ast.scoped(function, |body| {
            for line in ["%%YAML 1.1\n", title.as_str(), "---\n"] {
                body.append(Node::statement(Node::call(
                    "fprintf",
                    vec![out(), Node::str(line)],
                )))?;
            }
            body.append(Node::statement(Node::call(
                self.printer_name(MAIN),
                vec![out(), Node::ident("cfg"), Node::Int(0)],
            )))?;
            Ok::<_, Error>(())
        })?;
        Ok(())
    }

    /// `<prefix>_readfile`: parse a file into `cfg` starting at the root group.
    pub(super) fn readfile(&self, ast: &ScopeBuilder<'_>) -> Result<()> {
        let function = self.readfile_header();
        let root = self.row_ref(self.layout.root());
        ast.append(Node::Blank)?;
        ast.scoped(function, |body| {
            body.append(Node::Return(Some(Box::new(Node::call(
                "schemac_readfile",
                vec![
                    Node::ident("filename"),
                    root,
                    Node::ident("cfg"),
                    Node::ident("debug"),
                ],
            )))))
        })?;
        Ok(())
    }

    /// `void <prefix>_print_<aggregate>(FILE *out, <agg_t> *cfg, int indent)`
    pub(super) fn printer_header(&self, aggregate: &str) -> Node {
        Node::function(
            "void",
            self.printer_name(aggregate),
            vec![
                Node::param("FILE *", "out"),
                Node::param(format!("{} *", self.agg_type(aggregate)), "cfg"),
                Node::param("int", "indent"),
            ],
        )
    }

    pub(super) fn defaults_header(&self, aggregate: &str) -> Node {
        Node::function(
            "void",
            self.defaults_name(aggregate),
            vec![Node::param(format!("{} *", self.agg_type(aggregate)), "cfg")],
        )
    }

    pub(super) fn print_config_header(&self) -> Node {
        Node::function(
            "void",
            format!("{}_print_config", self.prefix()),
            vec![
                Node::param("FILE *", "out"),
                Node::param(format!("{} *", self.agg_type(MAIN)), "cfg"),
            ],
        )
    }

    pub(super) fn readfile_header(&self) -> Node {
        Node::function(
            "int",
            format!("{}_readfile", self.prefix()),
            vec![
                Node::param("char *", "filename"),
                Node::param(format!("{} *", self.agg_type(MAIN)), "cfg"),
                Node::param("int", "debug"),
            ],
        )
    }

    /// What an aggregate's printer walks.
    fn contents(&self, aggregate: &str) -> DescRef {
        match ensure_aggregate(self.layout.aggregate(aggregate), aggregate).body() {
            AggregateBody::Group(group) => group,
            AggregateBody::Element(value) | AggregateBody::Entry { value, .. } => value,
        }
    }

    /// Lines following a `key:` line, at `depth`.
    fn print_contents<'r>(
        &mut self,
        frame: Frame<'_, 'r>,
        scope: &ScopeBuilder<'r>,
        r: DescRef,
        depth: i64,
    ) -> Result<()> {
        let layout = self.layout;
        let d = layout.get(r);
        match &d.data {
            DescData::Group { .. } => {
                for member in layout.members(r) {
                    self.print_member(frame, scope, member.symbol.as_str(), member.target, depth)?;
                }
                Ok(())
            }
            DescData::Custom { type_name } => {
                let printer = self.ensure_printer(frame.ast, frame.prototypes, type_name.as_str())?;
                scope.append(Node::statement(Node::call(
                    printer,
                    vec![out(), Node::addr(frame.value(d)), indent(depth)],
                )))?;
                Ok(())
            }
            DescData::Array { element, aggregate } => {
                self.print_list(frame, scope, d, aggregate, None, *element, depth)
            }
            DescData::Mapping {
                key,
                value,
                aggregate,
            } => self.print_list(frame, scope, d, aggregate, Some(*key), *value, depth),
            DescData::Scalar(_) | DescData::Usertype { .. } => Err(Error::unsupported(
                &d.path,
                d.pos,
                "no printer rule for this node",
            )),
        }
    }

    fn print_member<'r>(
        &mut self,
        frame: Frame<'_, 'r>,
        scope: &ScopeBuilder<'r>,
        key: &str,
        r: DescRef,
        depth: i64,
    ) -> Result<()> {
        let d = self.layout.get(r);
        if let DescData::Scalar(spec) = &d.data {
            let (format, arg) = scalar_format(spec.kind(), frame.value(d));
            return print_line(scope, depth, format!("{key}: {format}\n"), vec![arg]);
        }
        print_line(scope, depth, format!("{key}:\n"), vec![])?;
        self.print_contents(frame, scope, r, depth + 2)
    }

    /// Loop over an array or mapping; one `- ` or `key: ` line per element.
    #[allow(clippy::too_many_arguments)]
    fn print_list<'r>(
        &mut self,
        frame: Frame<'_, 'r>,
        scope: &ScopeBuilder<'r>,
        list: &Descriptor,
        aggregate: &str,
        key: Option<DescRef>,
        value: DescRef,
        depth: i64,
    ) -> Result<()> {
        let layout = self.layout;
        let elem_ptr = format!("{} *", self.agg_type(aggregate));
        let cursor = || Node::ident(aggregate);
        scope.insert_first(Node::var(&elem_ptr, aggregate))?;

        let next = Node::cast(&elem_ptr, Node::member(Node::arrow(cursor(), "head"), "next"));
        let lp = Node::For {
            init: Box::new(Node::binary(cursor(), "=", frame.value(list))),
            cond: Box::new(cursor()),
            step: Box::new(Node::binary(cursor(), "=", next)),
            body: Vec::new(),
        };

        scope.scoped(lp, |body| {
            let (mut format, mut args) = match key {
                Some(key) => {
                    let key = layout.get(key);
                    let DescData::Scalar(spec) = &key.data else {
                        return Err(Error::unsupported(
                            &list.path,
                            list.pos,
                            "mapping keys must be scalars",
                        ));
                    };
                    let (format, arg) = scalar_format(spec.kind(), frame.value(key));
                    (format!("{format}:"), vec![arg])
                }
                None => ("-".to_string(), vec![]),
            };

            let value_d = layout.get(value);
            if let DescData::Scalar(spec) = &value_d.data {
                let (value_format, arg) = scalar_format(spec.kind(), frame.value(value_d));
                format.push_str(&format!(" {value_format}\n"));
                args.push(arg);
                return print_line(body, depth, format, args);
            }

            format.push('\n');
            print_line(body, depth, format, args)?;
            let printer = self.ensure_printer(frame.ast, frame.prototypes, aggregate)?;
            body.append(Node::statement(Node::call(
                printer,
                vec![out(), cursor(), indent(depth + 2)],
            )))?;
            Ok(())
        })
    }

    fn defaults_contents<'r>(
        &mut self,
        frame: Frame<'_, 'r>,
        scope: &ScopeBuilder<'r>,
        r: DescRef,
    ) -> Result<()> {
        let layout = self.layout;
        let d = layout.get(r);
        match &d.data {
            DescData::Scalar(spec) => {
                if let Some(default) = spec.default_value() {
                    let value = match literal(spec.kind(), default) {
                        text @ Node::Str(_) => Node::cast("char *", text),
                        value => value,
                    };
                    scope.append(Node::assign(frame.value(d), value))?;
                }
            }
            DescData::Group { .. } => {
                for member in layout.members(r) {
                    self.defaults_contents(frame, scope, member.target)?;
                }
            }
            DescData::Array { .. } | DescData::Mapping { .. } => {
                scope.append(Node::assign(frame.value(d), Node::ident("NULL")))?;
                scope.append(Node::assign(frame.length(d), Node::Int(0)))?;
            }
            DescData::Custom { type_name } => {
                let defaults = self.ensure_defaults(frame.ast, frame.prototypes, type_name.as_str())?;
                scope.append(Node::statement(Node::call(
                    defaults,
                    vec![Node::addr(frame.value(d))],
                )))?;
            }
            DescData::Usertype { .. } => {
                return Err(Error::unsupported(
                    &d.path,
                    d.pos,
                    "no defaults rule for this node",
                ));
            }
        }
        Ok(())
    }
}

fn declare(prototypes: &ScopeBuilder<'_>, function: &Node) -> Result<()> {
    if let Some(prototype) = Node::prototype_of(function) {
        prototypes.append(prototype)?;
    }
    Ok(())
}

fn out() -> Node {
    Node::ident("out")
}

/// `indent`, or `indent + <depth>`.
fn indent(depth: i64) -> Node {
    if depth == 0 {
        Node::ident("indent")
    } else {
        Node::binary(Node::ident("indent"), "+", Node::Int(depth))
    }
}

/// `schemac_print_indent(out, ...)` followed by one `fprintf`.
fn print_line(scope: &ScopeBuilder<'_>, depth: i64, format: String, args: Vec<Node>) -> Result<()> {
    scope.append(Node::statement(Node::call(
        "schemac_print_indent",
        vec![out(), indent(depth)],
    )))?;
    let mut call_args = vec![out(), Node::str(format)];
    call_args.extend(args);
    scope.append(Node::statement(Node::call("fprintf", call_args)))?;
    Ok(())
}

/// Conversion and argument printing a scalar stored at `value`.
fn scalar_format(kind: ScalarKind, value: Node) -> (&'static str, Node) {
    match kind {
        ScalarKind::Integer => ("%d", value),
        ScalarKind::UnsignedInteger => ("%u", value),
        ScalarKind::Float => ("%g", value),
        ScalarKind::Boolean => (
            "%s",
            Node::ternary(value, Node::str("true"), Node::str("false")),
        ),
        ScalarKind::String | ScalarKind::FilePath | ScalarKind::DirectoryPath => {
            ("%s", Node::ternary(value.clone(), value, Node::str("~")))
        }
    }
}
