//! Integration tests for `shinobi tsc` and `shinobi outputs`.
//!
//! A fake compiler selected through `SHINOBI_TSC` replays a canned file
//! listing, so the tests need no TypeScript installation.

use anyhow::{Context, Result, ensure};
use predicates::prelude::*;
use rstest::rstest;
use shinobi::depfile::{DependencyRecord, sorted_inputs};
use shinobi_env::NODE_ENV;
use test_support::{FakeTsc, Fixture, shinobi::run_shinobi_in, shinobi::shinobi_in};

/// Without Node.js output names are derived rather than asked for.
const NO_NODE: (&str, &str) = (NODE_ENV, "shinobi-test-missing-node");

fn sources() -> Result<Fixture> {
    Fixture::with_files(&[
        ("src/index.ts", "import { util } from './util';\n"),
        ("src/util.ts", "export const util = 1;\n"),
        ("tsconfig.json", "{}\n"),
    ])
}

fn listing(fixture: &Fixture) -> String {
    ["src/index.ts", "src/util.ts"]
        .iter()
        .map(|file| format!("{}\n", fixture.path(file)))
        .collect()
}

#[test]
fn compile_writes_a_dependency_record() -> Result<()> {
    let fixture = sources()?;
    let tsc = FakeTsc::new(&listing(&fixture), 0)?;
    let (key, program) = tsc.env();
    shinobi_in(fixture.root())?
        .env(key, program)
        .args(["tsc", "--out", "dist/index.js", "--outDir", "dist", "--", "src/index.ts"])
        .assert()
        .success();
    let record = DependencyRecord::read(&fixture.path("dist/index.js.depfile"))
        .context("read dependency record")?;
    ensure!(record.output() == "dist/index.js");
    ensure!(sorted_inputs(&record) == ["src/index.ts", "src/util.ts"]);
    let expected_args = vec![
        "--listFiles".to_owned(),
        "--pretty".to_owned(),
        "false".to_owned(),
        "--outDir".to_owned(),
        "dist".to_owned(),
        fixture.path("src/index.ts").into_string(),
    ];
    ensure!(tsc.recorded_args()? == expected_args, "args {:?}", tsc.recorded_args()?);
    ensure!(tsc.recorded_cwd()? == fixture.root());
    Ok(())
}

#[test]
fn compile_runs_in_the_requested_directory() -> Result<()> {
    let fixture = Fixture::with_files(&[("pkg/src/index.ts", "")])?;
    let tsc = FakeTsc::new(&format!("{}\n", fixture.path("pkg/src/index.ts")), 0)?;
    let (key, program) = tsc.env();
    shinobi_in(fixture.root())?
        .env(key, program)
        .args(["tsc", "--cwd", "pkg", "--out", "pkg/dist/index.js", "--", "pkg/src/index.ts"])
        .assert()
        .success();
    ensure!(tsc.recorded_cwd()? == fixture.path("pkg"));
    let record = DependencyRecord::read(&fixture.path("pkg/dist/index.js.depfile"))
        .context("read dependency record")?;
    ensure!(sorted_inputs(&record) == ["pkg/src/index.ts"]);
    Ok(())
}

#[test]
fn failed_compile_reports_only_error_lines() -> Result<()> {
    let fixture = sources()?;
    let output = format!(
        "{}src/index.ts(3,7): error TS2322: Type 'string' is not assignable to type 'number'.\n",
        listing(&fixture)
    );
    let tsc = FakeTsc::new(&output, 2)?;
    let (key, program) = tsc.env();
    shinobi_in(fixture.root())?
        .env(key, program)
        .args(["tsc", "--out", "dist/index.js", "--", "src/index.ts"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error TS2322"))
        .stderr(predicate::str::contains("src/util.ts").not());
    ensure!(!fixture.path("dist/index.js.depfile").exists());
    Ok(())
}

#[test]
fn typecheck_touches_the_stamp() -> Result<()> {
    let fixture = sources()?;
    let tsc = FakeTsc::new(&listing(&fixture), 0)?;
    let (key, program) = tsc.env();
    shinobi_in(fixture.root())?
        .env(key, program)
        .args(["tsc", "--typecheck", "--out", ".shinobi/typecheck.stamp", "--strict"])
        .args(["--", "src/index.ts"])
        .assert()
        .success();
    ensure!(fixture.path(".shinobi/typecheck.stamp").is_file());
    ensure!(fixture.path(".shinobi/typecheck.stamp.depfile").is_file());
    let args = tsc.recorded_args()?;
    ensure!(args.first().map(String::as_str) == Some("--noEmit"), "args {args:?}");
    ensure!(args.iter().any(|arg| arg == "--strict"));
    Ok(())
}

#[test]
fn dyndep_mode_writes_a_dyndep_file() -> Result<()> {
    let fixture = sources()?;
    let tsc = FakeTsc::new(&listing(&fixture), 0)?;
    let (key, program) = tsc.env();
    shinobi_in(fixture.root())?
        .env(key, program)
        .args(["tsc", "--out", "dist/index.js.dyndep", "--dyndep-for", "dist/index.js"])
        .args(["--", "src/index.ts"])
        .assert()
        .success();
    ensure!(
        fixture.read("dist/index.js.dyndep")?
            == "ninja_dyndep_version = 1\nbuild dist/index.js : dyndep | src/index.ts src/util.ts\n"
    );
    ensure!(tsc.recorded_args()?.first().map(String::as_str) == Some("--listFilesOnly"));
    Ok(())
}

#[test]
fn a_json_input_is_passed_as_the_project() -> Result<()> {
    let fixture = sources()?;
    let tsc = FakeTsc::new(&listing(&fixture), 0)?;
    let (key, program) = tsc.env();
    shinobi_in(fixture.root())?
        .env(key, program)
        .args(["tsc", "--out", "dist/index.js", "--", "tsconfig.json"])
        .assert()
        .success();
    let args = tsc.recorded_args()?;
    let project = fixture.path("tsconfig.json").into_string();
    ensure!(
        args.windows(2).any(|pair| pair == ["--project".to_owned(), project.clone()]),
        "args {args:?}"
    );
    Ok(())
}

#[test]
fn missing_compiler_is_reported() -> Result<()> {
    let fixture = sources()?;
    shinobi_in(fixture.root())?
        .env("SHINOBI_TSC", fixture.path("no-such-tsc").as_str())
        .args(["tsc", "--out", "dist/index.js", "--", "src/index.ts"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no-such-tsc"));
    Ok(())
}

#[rstest]
#[case::plain(&["src/index.ts"], None, "dist/index.js\n")]
#[case::declarations(
    &["src/a.ts", "src/b.mts"],
    Some(r#"{"outDir": "dist", "declaration": true}"#),
    "dist/a.js\ndist/a.d.ts\ndist/b.mjs\ndist/b.d.mts\n"
)]
#[case::no_emit(&["src/index.ts"], Some(r#"{"noEmit": true}"#), "")]
fn outputs_prints_one_path_per_line(
    #[case] inputs: &[&str],
    #[case] options: Option<&str>,
    #[case] expected: &str,
) -> Result<()> {
    let fixture = Fixture::new()?;
    let options = options.unwrap_or(r#"{"outDir": "dist"}"#);
    let mut args = vec!["outputs", "--options", options];
    args.extend_from_slice(inputs);
    let run = run_shinobi_in(fixture.root(), &args, &[NO_NODE])?;
    ensure!(run.success, "stderr: {}", run.stderr);
    ensure!(run.stdout == expected, "stdout {:?}", run.stdout);
    Ok(())
}

#[test]
fn outputs_prefixes_the_working_directory() -> Result<()> {
    let fixture = Fixture::new()?;
    let run = run_shinobi_in(
        fixture.root(),
        &["outputs", "--cwd", "package", "--options", r#"{"outDir": "dist"}"#, "package/src/index.cts"],
        &[NO_NODE],
    )?;
    ensure!(run.success, "stderr: {}", run.stderr);
    ensure!(run.stdout == "package/dist/index.cjs\n", "stdout {:?}", run.stdout);
    Ok(())
}

#[test]
fn outputs_resolves_projects_through_the_compiler() -> Result<()> {
    let fixture = sources()?;
    let shown = r#"{"compilerOptions": {"outDir": "./lib"}, "files": ["./src/index.ts", "./src/util.ts"]}"#;
    let tsc = FakeTsc::new(shown, 0)?;
    let (key, program) = tsc.env();
    let run = run_shinobi_in(
        fixture.root(),
        &["outputs", "--project", "tsconfig.json"],
        &[(key, program), NO_NODE],
    )?;
    ensure!(run.success, "stderr: {}", run.stderr);
    ensure!(run.stdout == "lib/index.js\nlib/util.js\n", "stdout {:?}", run.stdout);
    ensure!(tsc.recorded_args()?.first().map(String::as_str) == Some("--showConfig"));
    Ok(())
}

#[test]
fn outputs_are_named_by_typescript_when_node_is_available() -> Result<()> {
    let fixture = Fixture::new()?;
    let node = FakeTsc::new(r#"["src/a.d.ts","src/data.json"]"#, 0)?;
    let run = run_shinobi_in(
        fixture.root(),
        &[
            "outputs",
            "--options",
            r#"{"allowJs": true, "declaration": true, "emitDeclarationOnly": true}"#,
            "src/a.js",
            "src/data.json",
        ],
        &[node.env_as(NODE_ENV)],
    )?;
    ensure!(run.success, "stderr: {}", run.stderr);
    ensure!(run.stdout == "src/a.d.ts\nsrc/data.json\n", "stdout {:?}", run.stdout);
    let args = node.recorded_args()?;
    let forwarded = args
        .iter()
        .skip_while(|arg| arg.as_str() != "--")
        .skip(2)
        .map(String::as_str)
        .collect::<Vec<_>>();
    ensure!(
        forwarded
            == [
                "src/a.js",
                "src/data.json",
                "--allowJs",
                "--declaration",
                "--emitDeclarationOnly"
            ],
        "args {args:?}"
    );
    Ok(())
}

#[test]
fn outputs_fall_back_when_typescript_is_missing() -> Result<()> {
    let fixture = Fixture::new()?;
    let node = FakeTsc::new("", 3)?;
    let run = run_shinobi_in(
        fixture.root(),
        &["outputs", "--options", r#"{"outDir": "out"}"#, "src/a.ts", "src/data.json"],
        &[node.env_as(NODE_ENV)],
    )?;
    ensure!(run.success, "stderr: {}", run.stderr);
    ensure!(run.stdout == "out/a.js\nout/data.json\n", "stdout {:?}", run.stdout);
    Ok(())
}

#[test]
fn invalid_options_are_rejected() -> Result<()> {
    let fixture = Fixture::new()?;
    let run = run_shinobi_in(fixture.root(), &["outputs", "--options", "[1]", "a.ts"], &[])?;
    ensure!(!run.success);
    ensure!(run.stdout.is_empty());
    Ok(())
}
