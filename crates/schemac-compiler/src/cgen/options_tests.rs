use indoc::indoc;

use super::generator::Generator;
use super::help::wrap;
use super::options::OptionPlan;
use crate::test_utils::{block, layout, line_with, schema, source};
use crate::{Config, generate};

const DEMO: &str = indoc! {r#"
    {
      "__meta__": {
        "program_name": "demo",
        "description": "Demo daemon.",
        "default_config": "/etc/demo.json"
      },
      "port": {
        "!Int": {
          "=": 8080,
          "command_line": "-p --port",
          "command_line_incr": "--port-incr",
          "environ": "DEMO_PORT",
          "description": "Port to listen on"
        }
      },
      "verbose": {
        "!Bool": {
          "command_line_enable": "-v",
          "command_line_disable": "--quiet",
          "description": "Chatty output"
        }
      },
      "name": { "!String": { "command_line": "--name" } }
    }
"#};

fn generate_err(json: &str) -> String {
    generate(&schema(json), &Config::new())
        .unwrap_err()
        .to_string()
}

#[test]
fn values_are_numbered_per_action() {
    let layout = layout(DEMO);
    let plan = OptionPlan::build(&layout).unwrap();
    let vals: Vec<_> = plan
        .options
        .iter()
        .map(|o| (o.option.param(), o.val))
        .collect();
    assert_eq!(
        vals,
        [
            ("-p, --port=VALUE".to_string(), 1000),
            ("--port-incr".to_string(), 1001),
            ("-v".to_string(), 1002),
            ("--quiet".to_string(), 1003),
            ("--name=VALUE".to_string(), 1004),
        ]
    );
    assert_eq!(plan.optstr(), "c:hPp:v");
    assert_eq!(plan.optidx(), [501, 0, 500, 600, 1000, 0, 1002]);
}

#[test]
fn option_and_env_tables() {
    let src = source(DEMO);
    assert_eq!(
        block(&src, "static schemac_option_t config_COption_vars[6] = {"),
        indoc! {"
            static schemac_option_t config_COption_vars[6] = {
                { .callback = (schemac_option_fun)&schemac_CInt_o, .prop = (schemac_placeholder_t *)&config_CInt_vars[0] }, // 0. port
                { .callback = (schemac_option_fun)&schemac_CInt_incr_o, .prop = (schemac_placeholder_t *)&config_CInt_vars[0] }, // 1. port
                { .callback = (schemac_option_fun)&schemac_CBool_enable_o, .prop = (schemac_placeholder_t *)&config_CBool_vars[0] }, // 2. verbose
                { .callback = (schemac_option_fun)&schemac_CBool_disable_o, .prop = (schemac_placeholder_t *)&config_CBool_vars[0] }, // 3. verbose
                { .callback = (schemac_option_fun)&schemac_CString_o, .prop = (schemac_placeholder_t *)&config_CString_vars[0] }, // 4. name
                { NULL }, // 5. sentinel
            };
        "}
    );
    assert_eq!(
        block(&src, "static schemac_envvar_t config_CEnv_vars[2] = {"),
        indoc! {r#"
            static schemac_envvar_t config_CEnv_vars[2] = {
                { .name = "DEMO_PORT", .callback = (schemac_option_fun)&schemac_CInt_o, .prop = (schemac_placeholder_t *)&config_CInt_vars[0] }, // 0. port
                { NULL }, // 1. sentinel
            };
        "#}
    );
}

#[test]
fn getopt_table_and_descriptor() {
    let src = source(DEMO);
    assert_eq!(
        block(&src, "static struct option config_getopt_options[10] = {"),
        indoc! {r#"
            static struct option config_getopt_options[10] = {
                { .name = "help", .has_arg = 0, .flag = NULL, .val = 500 }, // 0. help
                { .name = "config", .has_arg = 1, .flag = NULL, .val = 501 }, // 1. config
                { .name = "debug-config", .has_arg = 0, .flag = NULL, .val = 502 }, // 2. debug-config
                { .name = "print-config", .has_arg = 0, .flag = NULL, .val = 600 }, // 3. print-config
                { .name = "check-config", .has_arg = 0, .flag = NULL, .val = 601 }, // 4. check-config
                { .name = "port", .has_arg = 1, .flag = NULL, .val = 1000 }, // 5. port
                { .name = "port-incr", .has_arg = 0, .flag = NULL, .val = 1001 }, // 6. port
                { .name = "quiet", .has_arg = 0, .flag = NULL, .val = 1003 }, // 7. verbose
                { .name = "name", .has_arg = 1, .flag = NULL, .val = 1004 }, // 8. name
                { NULL }, // 9. sentinel
            };
        "#}
    );
    assert_eq!(
        line_with(&src, "config_optidx[] ="),
        "static int config_optidx[] = {501, 0, 500, 600, 1000, 0, 1002};"
    );
    assert_eq!(line_with(&src, ".optstr ="), r#"    .optstr = "c:hPp:v","#);
    assert_eq!(line_with(&src, ".filename ="), r#"    .filename = "/etc/demo.json","#);
    assert_eq!(
        line_with(&src, ".print_callback ="),
        "    .print_callback = (schemac_print_fun)&config_print_config,"
    );
    assert_eq!(line_with(&src, ".debug ="), "    .debug = 0,");
}

#[test]
fn no_default_config_means_null_filename() {
    let src = source(r#"{ "a": { "!Int": 1 } }"#);
    assert_eq!(line_with(&src, ".filename ="), "    .filename = NULL,");
    assert_eq!(line_with(&src, ".optstr ="), r#"    .optstr = "c:hP","#);
    assert_eq!(
        line_with(&src, "config_optidx[] ="),
        "static int config_optidx[] = {501, 0, 500, 600};"
    );
    assert!(src.contains("static schemac_option_t config_COption_vars[1] = {\n    { NULL }, // 0. sentinel\n};\n"));
}

#[test]
fn help_text() {
    let schema = schema(DEMO);
    let layout = layout(DEMO);
    let config = Config::new();
    let generator = Generator::new(&schema, &layout, &config);
    let plan = OptionPlan::build(&layout).unwrap();

    assert_eq!(generator.usage(), "Usage:\n    demo [options]\n");
    assert_eq!(
        generator.full_description(&plan),
        indoc! {"
            Usage:
                demo [options]

            Description:
                Demo daemon.

            Options:
              -h, --help        Print this help
              -c, --config=FILE
                                Configuration file name
              --debug-config    Print debugging information while parsing configuration file
              -P, --print-config
                                Print configuration after reading, then exit
              --check-config    Check configuration and exit
              -p, --port=VALUE  Port to listen on
              --port-incr       Increment aforementioned value
              -v                Chatty output
              --quiet           Chatty output
              --name=VALUE
        "}
    );
}

#[test]
fn help_skips_empty_description() {
    let json = r#"{ "a": { "!Int": 1 } }"#;
    let (schema, layout, config) = (schema(json), layout(json), Config::new().name("app"));
    let generator = Generator::new(&schema, &layout, &config);
    let plan = OptionPlan::build(&layout).unwrap();
    let text = generator.full_description(&plan);
    assert!(text.starts_with("Usage:\n    app [options]\n\nOptions:\n"), "{text}");
}

#[test]
fn wrap_is_greedy() {
    assert_eq!(wrap("aaa bbb ccc", 7, "", "  "), ["aaa bbb", "  ccc"]);
    assert_eq!(wrap("abcdefghij", 4, "> ", ""), ["> abcdefghij"]);
    assert_eq!(wrap("  one\n two ", 80, "", ""), ["one two"]);
    assert!(wrap("   ", 80, "x", "y").is_empty());
}

#[test]
fn duplicate_and_reserved_options() {
    let err = generate_err(indoc! {r#"
        {
          "a": { "!Int": { "command_line": "-p" } },
          "b": { "!Int": { "command_line": "-p" } }
        }
    "#});
    assert_eq!(err, "b: unsupported schema shape: option `-p` is already in use");

    let err = generate_err(r#"{ "x": { "!Bool": { "command_line_enable": "-h" } } }"#);
    assert_eq!(err, "x: unsupported schema shape: option `-h` is already in use");

    let err = generate_err(r#"{ "x": { "!String": { "command_line": "--config" } } }"#);
    assert_eq!(
        err,
        "x: unsupported schema shape: option `--config` is already in use"
    );
}

#[test]
fn option_class_must_fit_the_kind() {
    let err = generate_err(r#"{ "name": { "!String": { "command_line_incr": "--more" } } }"#);
    assert_eq!(
        err,
        "name: unsupported schema shape: String values cannot be incremented or decremented"
    );

    let err = generate_err(r#"{ "n": { "!Int": { "command_line_enable": "--on" } } }"#);
    assert_eq!(
        err,
        "n: unsupported schema shape: Integer values cannot be enabled or disabled"
    );
}

#[test]
fn bindings_need_a_direct_scalar() {
    let err = generate_err(r#"{ "list": { "!Array": { "!Int": { "command_line": "-x" } } } }"#);
    assert_eq!(
        err,
        "list[]: unsupported schema shape: bindings cannot reach through an array, a mapping or a named type"
    );

    let err = generate_err(indoc! {r#"
        {
          "__types__": { "T": { "a": { "!Int": { "environ": "A" } } } },
          "t": { "!Struct": "T" }
        }
    "#});
    assert_eq!(
        err,
        "__types__.T.a: unsupported schema shape: bindings cannot reach through an array, a mapping or a named type"
    );
}
