//! Command builders for the CLI.

use clap::Command;

use super::args::*;

/// Build the complete CLI with all subcommands.
pub fn build_cli() -> Command {
    Command::new("schemac")
        .about("Compile a configuration schema into C tables and support functions")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(generate_command())
        .subcommand(check_command())
}

/// Generate the C source and, optionally, its header.
pub fn generate_command() -> Command {
    Command::new("generate")
        .about("Generate C source and header from a schema")
        .override_usage(
            "\
  schemac generate <SCHEMA> [-n NAME] [-t TARGET] [-o OUT.c] [--header OUT.h]",
        )
        .after_help(
            r#"EXAMPLES:
  schemac generate app.json                      # source to stdout
  schemac generate app.json -n app -o app.c      # writes app.c and app.h
  schemac generate app.json -o src/config.c --header include/config.h"#,
        )
        .arg(schema_path_arg())
        .arg(name_arg())
        .arg(target_arg())
        .arg(output_file_arg())
        .arg(header_file_arg())
        .arg(verbose_arg())
}

/// Run every check `generate` does, without writing anything.
pub fn check_command() -> Command {
    Command::new("check")
        .about("Validate a schema and report its table sizes")
        .after_help(
            r#"EXAMPLES:
  schemac check app.json
  SCHEMAC_LOG=trace schemac check app.json   # log every descriptor"#,
        )
        .arg(schema_path_arg())
        .arg(verbose_arg())
}
