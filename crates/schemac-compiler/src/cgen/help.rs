//! Usage and `--help` text embedded in the command-line descriptor.

use schemac_core::OptionClass;

use super::generator::Generator;
use super::options::OptionPlan;
use crate::lower::DescRef;

/// Option column width; longer parameters put the description on its own line.
const PARAM_WIDTH: usize = 17;
const DESCRIPTION_INDENT: &str = "                    ";

const BUILTIN_HELP: [(&str, &str); 5] = [
    ("-h, --help", "Print this help"),
    ("-c, --config=FILE", "Configuration file name"),
    ("--debug-config", "Print debugging information while parsing configuration file"),
    ("-P, --print-config", "Print configuration after reading, then exit"),
    ("--check-config", "Check configuration and exit"),
];

impl Generator<'_> {
    pub(super) fn usage(&self) -> String {
        format!("Usage:\n    {} [options]\n", self.program_name())
    }

    pub(super) fn full_description(&self, plan: &OptionPlan<'_>) -> String {
        let width = self.config.help_width;
        let mut text = self.usage();
        text.push('\n');

        let description = self.schema.meta().description.as_str();
        if !description.trim().is_empty() {
            text.push_str("Description:\n");
            for line in wrap(description, width, "    ", "    ") {
                text.push_str(&line);
                text.push('\n');
            }
            text.push('\n');
        }

        text.push_str("Options:\n");
        let builtin = BUILTIN_HELP
            .iter()
            .map(|&(param, description)| (param.to_string(), description.to_string()));
        for (param, description) in builtin.chain(self.option_help(plan)) {
            for line in option_lines(&param, &description, width) {
                text.push_str(&line);
                text.push('\n');
            }
        }
        text
    }

    /// `(params, description)` per target and class, targets in
    /// first-encounter order.
    fn option_help(&self, plan: &OptionPlan<'_>) -> Vec<(String, String)> {
        let mut targets: Vec<DescRef> = Vec::new();
        for action in &plan.actions {
            if !targets.contains(&action.target) {
                targets.push(action.target);
            }
        }

        let mut entries = Vec::new();
        for target in targets {
            let has_value_option = plan
                .actions
                .iter()
                .any(|a| a.target == target && a.class == OptionClass::Option);
            for class in OptionClass::ALL {
                let params: Vec<String> = plan
                    .options
                    .iter()
                    .filter(|o| o.target == target && o.option.class() == class)
                    .map(|o| o.option.param())
                    .collect();
                if params.is_empty() {
                    continue;
                }
                let description = match class {
                    OptionClass::IncrementOption if has_value_option => {
                        "Increment aforementioned value".to_string()
                    }
                    OptionClass::DecrementOption if has_value_option => {
                        "Decrement aforementioned value".to_string()
                    }
                    OptionClass::EnableOption if has_value_option => {
                        "Enable aforementioned value".to_string()
                    }
                    OptionClass::DisableOption if has_value_option => {
                        "Disable aforementioned value".to_string()
                    }
                    _ => self
                        .layout
                        .get(target)
                        .description
                        .clone()
                        .unwrap_or_default(),
                };
                entries.push((params.join(", "), description));
            }
        }
        entries
    }
}

fn option_lines(param: &str, description: &str, width: usize) -> Vec<String> {
    if param.len() < PARAM_WIDTH {
        let head = format!("  {param:width$} ", width = PARAM_WIDTH);
        let lines = wrap(description, width, &head, DESCRIPTION_INDENT);
        if lines.is_empty() {
            vec![format!("  {param}")]
        } else {
            lines
        }
    } else {
        let mut lines = vec![format!("  {param}")];
        lines.extend(wrap(description, width, DESCRIPTION_INDENT, DESCRIPTION_INDENT));
        lines
    }
}

/// Greedy word wrap; a word longer than the line still gets a line of its own.
pub(super) fn wrap(text: &str, width: usize, initial: &str, subsequent: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = initial.to_string();
    let mut empty = true;
    for word in text.split_whitespace() {
        if !empty && line.chars().count() + 1 + word.chars().count() > width {
            lines.push(std::mem::replace(&mut line, subsequent.to_string()));
            empty = true;
        }
        if !empty {
            line.push(' ');
        }
        line.push_str(word);
        empty = false;
    }
    if !empty {
        lines.push(line);
    }
    lines
}
