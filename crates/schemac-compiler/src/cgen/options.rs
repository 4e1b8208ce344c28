//! Command-line option and environment variable tables.
//!
//! Every distinct `(target, class)` pair becomes one `COption` row and gets
//! the getopt value `1000 + <row index>`, in first-encounter order. The
//! runtime looks a short option up through `optidx`, which runs parallel to
//! `optstr` (a `:` position holds 0).

use std::collections::HashSet;

use schemac_core::{CliOption, Ident, OptionClass, ScalarKind};
use tracing::debug;

use super::generator::{Generator, fn_ref};
use crate::codetree::{Dim, Node, Row, ScopeBuilder, Storage};
use crate::lower::{DescData, DescRef, Descriptor, Layout};
use crate::{Error, Result};

pub(super) const VAL_BASE: u32 = 1000;
const OPTION_FUN: &str = "schemac_option_fun";

/// Options the runtime always provides, with their getopt values.
pub(super) const BUILTIN_LONG: [(&str, bool, u32); 5] = [
    ("help", false, 500),
    ("config", true, 501),
    ("debug-config", false, 502),
    ("print-config", false, 600),
    ("check-config", false, 601),
];
const BUILTIN_OPTSTR: &str = "c:hP";
const BUILTIN_OPTIDX: [u32; 4] = [501, 0, 500, 600];

/// One distinct thing the command line can do to a value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) struct Action {
    pub target: DescRef,
    pub class: OptionClass,
}

#[derive(Clone, Debug)]
pub(super) struct PlannedOption<'a> {
    pub option: &'a CliOption,
    pub target: DescRef,
    pub val: u32,
}

/// Validated bindings, numbered.
#[derive(Clone, Debug, Default)]
pub(super) struct OptionPlan<'a> {
    pub actions: Vec<Action>,
    pub options: Vec<PlannedOption<'a>>,
    pub env: Vec<(&'a Ident, DescRef)>,
}

impl<'a> OptionPlan<'a> {
    pub fn build(layout: &'a Layout) -> Result<Self> {
        let mut plan = OptionPlan::default();
        let mut shorts: HashSet<char> = BUILTIN_OPTSTR.chars().filter(|&c| c != ':').collect();
        let mut longs: HashSet<&str> = BUILTIN_LONG.iter().map(|&(name, ..)| name).collect();

        for &target in layout.bound() {
            let d = layout.get(target);
            let kind = bound_kind(d)?;
            for option in d.binding.options() {
                check_class(d, kind, option.class())?;
                if let Some(c) = option.short()
                    && !shorts.insert(c)
                {
                    return Err(Error::unsupported(
                        &d.path,
                        d.pos,
                        format!("option `-{c}` is already in use"),
                    ));
                }
                if let Some(long) = option.long()
                    && !longs.insert(long)
                {
                    return Err(Error::unsupported(
                        &d.path,
                        d.pos,
                        format!("option `--{long}` is already in use"),
                    ));
                }

                let action = Action {
                    target,
                    class: option.class(),
                };
                let index = match plan.actions.iter().position(|a| *a == action) {
                    Some(index) => index,
                    None => {
                        plan.actions.push(action);
                        plan.actions.len() - 1
                    }
                };
                let val = VAL_BASE + index as u32;
                debug!(option = %option.param(), val, path = %d.path, "assigned option");
                plan.options.push(PlannedOption {
                    option,
                    target,
                    val,
                });
            }
            if let Some(env) = d.binding.env() {
                plan.env.push((env, target));
            }
        }
        Ok(plan)
    }

    /// `c:hP` followed by every short option, `:` marking an argument.
    pub fn optstr(&self) -> String {
        let mut optstr = BUILTIN_OPTSTR.to_string();
        for planned in &self.options {
            if let Some(c) = planned.option.short() {
                optstr.push(c);
                if planned.option.has_argument() {
                    optstr.push(':');
                }
            }
        }
        optstr
    }

    /// getopt value of every `optstr` position.
    pub fn optidx(&self) -> Vec<u32> {
        let mut optidx = BUILTIN_OPTIDX.to_vec();
        for planned in &self.options {
            if planned.option.short().is_some() {
                optidx.push(planned.val);
                if planned.option.has_argument() {
                    optidx.push(0);
                }
            }
        }
        optidx
    }
}

/// Scalar kind of a binding target reachable from the root by members only.
fn bound_kind(d: &Descriptor) -> Result<ScalarKind> {
    let DescData::Scalar(spec) = &d.data else {
        return Err(Error::unsupported(
            &d.path,
            d.pos,
            "command-line and environment bindings need a scalar target",
        ));
    };
    if d.path.is_repeated() {
        return Err(Error::unsupported(
            &d.path,
            d.pos,
            "bindings cannot reach through an array, a mapping or a named type",
        ));
    }
    Ok(spec.kind())
}

fn check_class(d: &Descriptor, kind: ScalarKind, class: OptionClass) -> Result<()> {
    let reason = match class {
        OptionClass::IncrementOption | OptionClass::DecrementOption if !kind.is_numeric() => {
            format!("{kind} values cannot be incremented or decremented")
        }
        OptionClass::EnableOption | OptionClass::DisableOption
            if kind != ScalarKind::Boolean =>
        {
            format!("{kind} values cannot be enabled or disabled")
        }
        _ => return Ok(()),
    };
    Err(Error::unsupported(&d.path, d.pos, reason))
}

/// Runtime option callback, e.g. `schemac_CInt_incr_o`.
fn option_callback(target: DescRef, class: OptionClass) -> String {
    let suffix = match class {
        OptionClass::Option => "_o",
        OptionClass::IncrementOption => "_incr_o",
        OptionClass::DecrementOption => "_decr_o",
        OptionClass::EnableOption => "_enable_o",
        OptionClass::DisableOption => "_disable_o",
    };
    format!("schemac_{}{suffix}", target.kind.table_suffix())
}

impl Generator<'_> {
    pub(super) fn option_tables(&self, ast: &ScopeBuilder<'_>, plan: &OptionPlan<'_>) -> Result<()> {
        let p = self.prefix();

        let mut options: Vec<Option<Row>> = plan
            .actions
            .iter()
            .map(|a| {
                let fields = vec![
                    Node::field_init(
                        "callback",
                        fn_ref(OPTION_FUN, &option_callback(a.target, a.class)),
                    ),
                    Node::field_init("prop", self.prop(a.target)),
                ];
                Some(Row::new(
                    Node::Designated(fields),
                    self.layout.get(a.target).path.to_string(),
                ))
            })
            .collect();
        options.push(None);
        self.option_table(ast, "schemac_option_t", format!("{p}_COption_vars"), options)?;

        let mut env: Vec<Option<Row>> = plan
            .env
            .iter()
            .map(|&(name, target)| {
                let fields = vec![
                    Node::field_init("name", Node::str(name.as_str())),
                    Node::field_init(
                        "callback",
                        fn_ref(OPTION_FUN, &option_callback(target, OptionClass::Option)),
                    ),
                    Node::field_init("prop", self.prop(target)),
                ];
                Some(Row::new(
                    Node::Designated(fields),
                    self.layout.get(target).path.to_string(),
                ))
            })
            .collect();
        env.push(None);
        self.option_table(ast, "schemac_envvar_t", format!("{p}_CEnv_vars"), env)?;

        let builtin = BUILTIN_LONG
            .iter()
            .map(|&(name, has_arg, val)| Some(getopt_row(name, has_arg, val, name)));
        let user = plan.options.iter().filter_map(|planned| {
            let long = planned.option.long()?;
            let path = self.layout.get(planned.target).path.to_string();
            Some(Some(getopt_row(
                long,
                planned.option.has_argument(),
                planned.val,
                path,
            )))
        });
        let mut getopt: Vec<Option<Row>> = builtin.chain(user).collect();
        getopt.push(None);
        self.option_table(ast, "struct option", format!("{p}_getopt_options"), getopt)?;

        ast.append(Node::Blank)?;
        ast.append(Node::VarInit {
            storage: Storage::Static,
            ty: "int".into(),
            name: format!("{p}_optidx"),
            dim: Dim::Unsized,
            init: Box::new(Node::Array(
                plan.optidx()
                    .into_iter()
                    .map(|v| Node::Int(i64::from(v)))
                    .collect(),
            )),
        })?;

        let filename = match self.schema.meta().default_config.as_str() {
            "" => Node::ident("NULL"),
            name => Node::str(name),
        };
        ast.append(Node::Blank)?;
        ast.append(Node::StructInit {
            storage: Storage::None,
            ty: "schemac_cmdline_t".into(),
            name: format!("{p}_cmdline"),
            fields: vec![
                Node::field_init("usage", Node::str(self.usage())),
                Node::field_init("full_description", Node::str(self.full_description(plan))),
                Node::field_init("optstr", Node::str(plan.optstr())),
                Node::field_init("optidx", Node::ident(format!("{p}_optidx"))),
                Node::field_init("options", Node::ident(format!("{p}_getopt_options"))),
                Node::field_init("schemac_options", Node::ident(format!("{p}_COption_vars"))),
                Node::field_init("env_vars", Node::ident(format!("{p}_CEnv_vars"))),
                Node::field_init(
                    "print_callback",
                    fn_ref("schemac_print_fun", &format!("{p}_print_config")),
                ),
                Node::field_init("filename", filename),
                Node::field_init("debug", Node::Int(0)),
            ],
        })?;
        Ok(())
    }

    fn option_table(
        &self,
        ast: &ScopeBuilder<'_>,
        ty: &str,
        name: String,
        rows: Vec<Option<Row>>,
    ) -> Result<()> {
        ast.append(Node::Blank)?;
        ast.append(Node::Table {
            storage: Storage::Static,
            ty: ty.to_string(),
            name,
            rows,
        })?;
        Ok(())
    }
}

fn getopt_row(name: &str, has_arg: bool, val: u32, comment: impl Into<String>) -> Row {
    let fields = vec![
        Node::field_init("name", Node::str(name)),
        Node::field_init("has_arg", Node::Int(i64::from(has_arg))),
        Node::field_init("flag", Node::ident("NULL")),
        Node::field_init("val", Node::Int(i64::from(val))),
    ];
    Row::new(Node::Designated(fields), comment)
}
