use std::io::{self, Write};
use std::path::PathBuf;

use schemac_compiler::{Config, generate, generate_header};

use super::{CliError, load_schema, write_file};

pub struct GenerateArgs {
    pub schema_path: PathBuf,
    pub name: String,
    pub target: Option<String>,
    pub output: Option<PathBuf>,
    pub header: Option<PathBuf>,
}

impl GenerateArgs {
    fn config(&self) -> Config {
        let config = Config::new().name(self.name.as_str());
        match &self.target {
            Some(target) => config.target(target.as_str()),
            None => config,
        }
    }

    /// Where the header goes: `--header`, else `<target>.h` beside `--output`.
    pub fn header_path(&self, config: &Config) -> Option<PathBuf> {
        if let Some(header) = &self.header {
            return Some(header.clone());
        }
        let output = self.output.as_ref()?;
        Some(output.with_file_name(format!("{}.h", config.target_name())))
    }
}

pub fn run(args: GenerateArgs) -> Result<(), CliError> {
    let schema = load_schema(&args.schema_path)?;
    let config = args.config();

    let source = generate(&schema, &config)?;
    let header = match args.header_path(&config) {
        Some(path) => Some((path, generate_header(&schema, &config)?)),
        None => None,
    };

    match &args.output {
        Some(path) => write_file(path, &source)?,
        None => io::stdout()
            .write_all(source.as_bytes())
            .map_err(|err| CliError::Write {
                path: PathBuf::from("<stdout>"),
                source: err,
            })?,
    }
    if let Some((path, text)) = header {
        write_file(&path, &text)?;
    }
    Ok(())
}
