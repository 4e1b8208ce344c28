pub mod check;
pub mod generate;

#[cfg(test)]
mod generate_tests;

use std::fs;
use std::path::{Path, PathBuf};

use schemac_core::{Schema, SchemaError};
use tracing::debug;

/// Errors reported by CLI commands.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("cannot read `{}`: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot write `{}`: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Compile(#[from] schemac_compiler::Error),
}

/// Read and parse a JSON schema document.
pub fn load_schema(path: &Path) -> Result<Schema, CliError> {
    let text = fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let schema = schemac_core::load_str(&text)?;
    debug!(path = %path.display(), "loaded schema");
    Ok(schema)
}

pub fn write_file(path: &Path, contents: &str) -> Result<(), CliError> {
    fs::write(path, contents).map_err(|source| CliError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), bytes = contents.len(), "wrote file");
    Ok(())
}
