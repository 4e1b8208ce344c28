/// Render `s` as a C string literal, quotes included.
///
/// # Examples
/// ```
/// use schemac_core::utils::c_string;
/// assert_eq!(c_string("port"), "\"port\"");
/// assert_eq!(c_string("a \"b\"\n"), r#""a \"b\"\n""#);
/// ```
pub fn c_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if (c as u32) < 0x20 || c as u32 == 0x7f => {
                out.push_str(&format!("\\{:03o}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Words that cannot be used verbatim as C member names.
const RESERVED: &[&str] = &[
    "auto", "bool", "break", "case", "char", "class", "const", "continue", "default", "do",
    "double", "else", "enum", "extern", "float", "for", "goto", "if", "int", "long", "register",
    "return", "short", "signed", "sizeof", "static", "struct", "switch", "typedef", "union",
    "unsigned", "void", "volatile", "while",
];

/// Turn a schema key into a C-compatible member name.
///
/// Dashes become underscores, a leading digit gets an underscore prefix and
/// reserved words get an underscore suffix.
///
/// # Examples
/// ```
/// use schemac_core::utils::c_varname;
/// assert_eq!(c_varname("log-level"), "log_level");
/// assert_eq!(c_varname("2fa"), "_2fa");
/// assert_eq!(c_varname("default"), "default_");
/// ```
pub fn c_varname(key: &str) -> String {
    let mut name = key.replace('-', "_");
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert(0, '_');
    }
    if RESERVED.contains(&name.as_str()) {
        name.push('_');
    }
    name
}

fn unit_multiplier(unit: &str) -> Option<u64> {
    let m = match unit {
        "k" => 1_000,
        "ki" => 1 << 10,
        "M" => 1_000_000,
        "Mi" => 1 << 20,
        "G" => 1_000_000_000,
        "Gi" => 1 << 30,
        "T" => 1_000_000_000_000,
        "Ti" => 1 << 40,
        "P" => 1_000_000_000_000_000,
        "Pi" => 1 << 50,
        "E" => 1_000_000_000_000_000_000,
        "Ei" => 1 << 60,
        _ => return None,
    };
    Some(m)
}

/// Split `"  -10 ki "` into `("-10", Some("ki"))`.
fn split_unit(value: &str) -> Option<(String, Option<&str>)> {
    let value = value.trim();
    let digits_end = value
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || c == '.' || c == ' ' || (i == 0 && c == '-')))
        .map(|(i, _)| i)
        .unwrap_or(value.len());
    let number: String = value[..digits_end].chars().filter(|c| *c != ' ').collect();
    let unit = value[digits_end..].trim();
    if number.is_empty() || number == "-" {
        return None;
    }
    Some((number, (!unit.is_empty()).then_some(unit)))
}

/// Parse an integer with an optional SI/IEC unit suffix (`10k`, `4Mi`).
///
/// # Examples
/// ```
/// use schemac_core::utils::parse_int_with_units;
/// assert_eq!(parse_int_with_units("10k"), Some(10_000));
/// assert_eq!(parse_int_with_units("-2 Ki"), None);
/// assert_eq!(parse_int_with_units("4Mi"), Some(4 << 20));
/// ```
pub fn parse_int_with_units(value: &str) -> Option<i64> {
    let (number, unit) = split_unit(value)?;
    let base: i64 = number.parse().ok()?;
    match unit {
        None => Some(base),
        Some(unit) => {
            let m = i64::try_from(unit_multiplier(unit)?).ok()?;
            base.checked_mul(m)
        }
    }
}

/// Parse a float with an optional SI/IEC unit suffix (`1.5k`).
pub fn parse_float_with_units(value: &str) -> Option<f64> {
    let (number, unit) = split_unit(value)?;
    let base: f64 = number.parse().ok()?;
    match unit {
        None => Some(base),
        Some(unit) => Some(base * unit_multiplier(unit)? as f64),
    }
}
