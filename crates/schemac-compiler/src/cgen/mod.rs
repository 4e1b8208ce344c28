//! C code generation from a lowered schema.
//!
//! `generate` produces the source file (descriptor tables, support functions
//! and the command-line descriptor); `generate_header` produces the companion
//! header the source includes. `check` runs every validation `generate`
//! does without rendering anything.

mod config;
mod functions;
mod generator;
mod header;
mod help;
mod options;
mod tables;

#[cfg(test)]
mod options_tests;

pub use config::Config;

use schemac_core::Schema;
use tracing::debug;

use crate::Result;
use crate::codetree::Renderer;
use crate::lower::{Layout, lower};
use generator::Generator;
use options::OptionPlan;

/// Lower a schema and validate it for generation, without rendering.
pub fn check(schema: &Schema) -> Result<Layout> {
    let layout = lower(schema)?;
    Generator::new(schema, &layout, &Config::default()).check_shapes()?;
    let options = OptionPlan::build(&layout)?;
    debug!(
        options = options.options.len(),
        env = options.env.len(),
        "checked schema"
    );
    Ok(layout)
}

/// Generate the C source file for a schema.
pub fn generate(schema: &Schema, config: &Config) -> Result<String> {
    config.validate()?;
    let layout = lower(schema)?;
    let mut generator = Generator::new(schema, &layout, config);
    let nodes = generator.source()?;
    let text = Renderer::new(generator.registry, config.indent.as_str()).render(&nodes)?;
    debug!(prefix = config.prefix(), bytes = text.len(), "rendered source");
    Ok(text)
}

/// Generate the companion header for a schema.
pub fn generate_header(schema: &Schema, config: &Config) -> Result<String> {
    config.validate()?;
    let layout = lower(schema)?;
    let generator = Generator::new(schema, &layout, config);
    let nodes = generator.header()?;
    let text = Renderer::new(generator.registry, config.indent.as_str()).render(&nodes)?;
    debug!(prefix = config.prefix(), bytes = text.len(), "rendered header");
    Ok(text)
}
