//! Test utilities.

use schemac_core::Schema;

use crate::Config;
use crate::lower::{Layout, lower};

/// Parse a JSON schema document, panicking on errors.
pub fn schema(json: &str) -> Schema {
    schemac_core::load_str(json).unwrap_or_else(|e| panic!("invalid test schema: {e}"))
}

/// Parse and lower a JSON schema document.
pub fn layout(json: &str) -> Layout {
    lower(&schema(json)).unwrap_or_else(|e| panic!("lowering failed: {e}"))
}

/// Generate C source with the default config.
pub fn source(json: &str) -> String {
    crate::generate(&schema(json), &Config::new()).unwrap_or_else(|e| panic!("generate failed: {e}"))
}

/// Generate the companion header with the default config.
pub fn header(json: &str) -> String {
    crate::generate_header(&schema(json), &Config::new())
        .unwrap_or_else(|e| panic!("generate_header failed: {e}"))
}

/// The single line of `text` containing `needle`.
pub fn line_with<'a>(text: &'a str, needle: &str) -> &'a str {
    let mut lines = text.lines().filter(|l| l.contains(needle));
    let line = lines
        .next()
        .unwrap_or_else(|| panic!("no line contains `{needle}` in:\n{text}"));
    assert!(
        lines.next().is_none(),
        "more than one line contains `{needle}` in:\n{text}"
    );
    line
}

/// The block starting at the line that begins with `head`, through the first
/// closing line at column 0 (`}` or `};`).
pub fn block<'a>(text: &'a str, head: &str) -> &'a str {
    let start = text
        .lines()
        .position(|l| l.starts_with(head))
        .unwrap_or_else(|| panic!("no line starts with `{head}` in:\n{text}"));
    let offset: usize = text.lines().take(start).map(|l| l.len() + 1).sum();
    let rest = &text[offset..];
    let end = rest
        .lines()
        .scan(0, |at, line| {
            *at += line.len() + 1;
            Some((*at, line))
        })
        .find(|(_, line)| line.starts_with('}'))
        .map(|(at, _)| at)
        .unwrap_or_else(|| panic!("block `{head}` is not closed in:\n{text}"));
    &rest[..end]
}
