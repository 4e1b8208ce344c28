use crate::{Binding, CliOption, Ident, OptionClass, SchemaError};

#[test]
fn parse_short_and_long() {
    let option = CliOption::parse(OptionClass::Option, "-p --port").unwrap();
    assert_eq!(option.short(), Some('p'));
    assert_eq!(option.long(), Some("port"));
    assert!(option.has_argument());
    assert_eq!(option.param(), "-p, --port=VALUE");
}

#[test]
fn parse_single_forms() {
    let short = CliOption::parse(OptionClass::Option, "-j").unwrap();
    assert_eq!(short.param(), "-j VALUE");

    let flag = CliOption::parse(OptionClass::EnableOption, "--daemon").unwrap();
    assert_eq!(flag.short(), None);
    assert!(!flag.has_argument());
    assert_eq!(flag.param(), "--daemon");

    let incr = CliOption::parse(OptionClass::IncrementOption, "-v --verbose").unwrap();
    assert_eq!(incr.param(), "-v, --verbose");
}

#[test]
fn parse_rejects_malformed() {
    for source in ["", "port", "-pq", "-p -q", "--a --b", "--bad_name", "-!"] {
        assert_eq!(
            CliOption::parse(OptionClass::Option, source),
            Err(SchemaError::InvalidBinding(source.to_string())),
            "{source}"
        );
    }
}

#[test]
fn only_plain_options_take_arguments() {
    let with_arg: Vec<_> = OptionClass::ALL
        .into_iter()
        .filter(|c| c.has_argument())
        .collect();
    assert_eq!(with_arg, vec![OptionClass::Option]);
}

#[test]
fn binding_accumulates() {
    let binding = Binding::new();
    assert!(binding.is_empty());

    let binding = binding
        .with_option(CliOption::parse(OptionClass::Option, "--port").unwrap())
        .with_env(Ident::new("PORT").unwrap());
    assert!(!binding.is_empty());
    assert_eq!(binding.options().len(), 1);
    assert_eq!(binding.env().map(Ident::as_str), Some("PORT"));
}
