use std::fmt::Write as _;
use std::path::PathBuf;

use schemac_compiler::check;
use schemac_compiler::lower::{Layout, TableKind};

use super::{CliError, load_schema};

pub struct CheckArgs {
    pub schema_path: PathBuf,
}

pub fn run(args: CheckArgs) -> Result<(), CliError> {
    let schema = load_schema(&args.schema_path)?;
    let layout = check(&schema)?;
    print!("{}", summary(&layout));
    Ok(())
}

/// One `<table>: <rows>` line per non-empty table, then the aggregate count.
pub fn summary(layout: &Layout) -> String {
    let mut out = String::new();
    for kind in TableKind::ALL {
        let len = layout.len(kind);
        if len > 0 {
            let _ = writeln!(out, "{}: {len}", kind.table_suffix());
        }
    }
    let _ = writeln!(out, "aggregates: {}", layout.aggregates().count());
    out
}
