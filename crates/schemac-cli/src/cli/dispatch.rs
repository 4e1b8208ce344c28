//! Dispatch logic: extract params from ArgMatches and convert to command args.

use std::path::PathBuf;

use clap::ArgMatches;

use crate::commands::check::CheckArgs;
use crate::commands::generate::GenerateArgs;

pub struct GenerateParams {
    pub schema_path: PathBuf,
    pub name: String,
    pub target: Option<String>,
    pub output: Option<PathBuf>,
    pub header: Option<PathBuf>,
    pub verbose: u8,
}

impl GenerateParams {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            schema_path: schema_path(m),
            name: m
                .get_one::<String>("name")
                .cloned()
                .unwrap_or_else(|| "config".to_string()),
            target: m.get_one::<String>("target").cloned(),
            output: m.get_one::<PathBuf>("output").cloned(),
            header: m.get_one::<PathBuf>("header").cloned(),
            verbose: m.get_count("verbose"),
        }
    }
}

impl From<GenerateParams> for GenerateArgs {
    fn from(p: GenerateParams) -> Self {
        Self {
            schema_path: p.schema_path,
            name: p.name,
            target: p.target,
            output: p.output,
            header: p.header,
        }
    }
}

pub struct CheckParams {
    pub schema_path: PathBuf,
    pub verbose: u8,
}

impl CheckParams {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            schema_path: schema_path(m),
            verbose: m.get_count("verbose"),
        }
    }
}

impl From<CheckParams> for CheckArgs {
    fn from(p: CheckParams) -> Self {
        Self {
            schema_path: p.schema_path,
        }
    }
}

// `schema_path` is required, so clap rejects the command before dispatch.
fn schema_path(m: &ArgMatches) -> PathBuf {
    m.get_one::<PathBuf>("schema_path")
        .cloned()
        .unwrap_or_default()
}
