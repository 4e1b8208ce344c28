use std::fs;
use std::path::{Path, PathBuf};

use indoc::indoc;
use schemac_compiler::{Config, check};

use super::check::{CheckArgs, run as run_check, summary};
use super::generate::{GenerateArgs, run};
use super::{CliError, load_schema};

const SCHEMA: &str = indoc! {r#"
    {
      "__meta__": { "program_name": "demo" },
      "port": { "!Int": { "=": 8080, "command_line": "-p --port" } },
      "tags": { "!Array": { "!String": null } }
    }
"#};

fn write_schema(dir: &Path) -> PathBuf {
    let path = dir.join("demo.json");
    fs::write(&path, SCHEMA).unwrap();
    path
}

fn args(schema_path: PathBuf) -> GenerateArgs {
    GenerateArgs {
        schema_path,
        name: "demo".to_string(),
        target: None,
        output: None,
        header: None,
    }
}

#[test]
fn writes_source_and_sibling_header() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("demo.c");
    let args = GenerateArgs {
        output: Some(output.clone()),
        ..args(write_schema(dir.path()))
    };
    run(args).unwrap();

    let source = fs::read_to_string(&output).unwrap();
    assert!(source.contains("#include \"demo.h\""));
    assert!(source.contains("static schemac_int_t demo_CInt_vars[1] = {"));

    let header = fs::read_to_string(dir.path().join("demo.h")).unwrap();
    assert!(header.starts_with("/* THIS IS AUTOGENERATED FILE */\n"));
    assert!(header.contains("#ifndef DEMO_H"));
    assert!(header.contains("extern schemac_cmdline_t demo_cmdline;"));
}

#[test]
fn explicit_header_path_and_target() {
    let dir = tempfile::tempdir().unwrap();
    let header = dir.path().join("include.h");
    let args = GenerateArgs {
        target: Some("demo_cfg".to_string()),
        output: Some(dir.path().join("out.c")),
        header: Some(header.clone()),
        ..args(write_schema(dir.path()))
    };
    run(args).unwrap();

    assert!(fs::read_to_string(&header).unwrap().contains("#ifndef DEMO_CFG_H"));
    assert!(!dir.path().join("demo_cfg.h").exists());
    let source = fs::read_to_string(dir.path().join("out.c")).unwrap();
    assert!(source.contains("#include \"demo_cfg.h\""));
}

#[test]
fn header_path_defaults() {
    let stdout_only = args(PathBuf::from("s.json"));
    assert_eq!(stdout_only.header_path(&Config::new().name("demo")), None);

    let with_output = GenerateArgs {
        output: Some(PathBuf::from("build/app.c")),
        ..args(PathBuf::from("s.json"))
    };
    assert_eq!(
        with_output.header_path(&Config::new().name("demo").target("app_config")),
        Some(PathBuf::from("build/app_config.h"))
    );
}

#[test]
fn missing_schema_is_a_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = run(args(dir.path().join("absent.json"))).unwrap_err();
    assert!(matches!(err, CliError::Read { .. }), "{err:?}");
    assert!(err.to_string().starts_with("cannot read `"));
}

#[test]
fn schema_errors_are_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.json");
    fs::write(&path, r#"{ "a": { "!Struct": "Missing" } }"#).unwrap();
    let err = run(args(path)).unwrap_err();
    assert!(
        matches!(err, CliError::Compile(schemac_compiler::Error::UnresolvedTypeReference { .. })),
        "{err:?}"
    );
}

#[test]
fn check_summary() {
    let dir = tempfile::tempdir().unwrap();
    let schema = load_schema(&write_schema(dir.path())).unwrap();
    let layout = check(&schema).unwrap();
    assert_eq!(
        summary(&layout),
        indoc! {"
            CInt: 1
            CString: 1
            CArray: 1
            CGroup: 1
            CTransition: 3
            aggregates: 2
        "}
    );
}

#[test]
fn check_rejects_what_generate_rejects() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clash.json");
    fs::write(
        &path,
        r#"{ "a": { "!Int": { "command_line": "-p" } }, "b": { "!Int": { "command_line": "-p" } } }"#,
    )
    .unwrap();

    let err = run_check(CheckArgs { schema_path: path.clone() }).unwrap_err();
    assert_eq!(
        err.to_string(),
        "b: unsupported schema shape: option `-p` is already in use"
    );
    assert!(run(args(path)).is_err());
}
