//! Shared argument builders for CLI commands.
//!
//! Each function returns a `clap::Arg` so commands compose the same
//! definitions.

use std::path::PathBuf;

use clap::{Arg, ArgAction, value_parser};

/// Schema document (positional).
pub fn schema_path_arg() -> Arg {
    Arg::new("schema_path")
        .value_name("SCHEMA")
        .value_parser(value_parser!(PathBuf))
        .required(true)
        .help("JSON schema document")
}

/// Symbol prefix (-n/--name).
pub fn name_arg() -> Arg {
    Arg::new("name")
        .short('n')
        .long("name")
        .value_name("NAME")
        .default_value("config")
        .help("Prefix of every generated C symbol")
}

/// Header base name (-t/--target).
pub fn target_arg() -> Arg {
    Arg::new("target")
        .short('t')
        .long("target")
        .value_name("TARGET")
        .help("Base name of the companion header (defaults to NAME)")
}

/// Source output (-o/--output).
pub fn output_file_arg() -> Arg {
    Arg::new("output")
        .short('o')
        .long("output")
        .value_name("FILE")
        .value_parser(value_parser!(PathBuf))
        .help("Write the C source to FILE instead of stdout")
}

/// Header output (--header).
pub fn header_file_arg() -> Arg {
    Arg::new("header")
        .long("header")
        .value_name("FILE")
        .value_parser(value_parser!(PathBuf))
        .help("Write the companion header to FILE")
}

/// Verbosity level (-v, -vv).
pub fn verbose_arg() -> Arg {
    Arg::new("verbose")
        .short('v')
        .long("verbose")
        .action(ArgAction::Count)
        .help("Verbosity level (-v for debug, -vv for trace)")
}
