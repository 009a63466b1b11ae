//! Unit tests for CLI commands.

use super::aliases::{apply_aliases, deny_conflicts, render_output, AliasesArgs};
use super::*;
use crate::output::colors::ColorSupport;
use crate::output::errors::ErrorFormatter;
use pea_config::{parse_snapshot, AliasingSection};
use pea_core::types::{SourceLanguage, TargetId};
use std::fs;
use tempfile::TempDir;

const SIMPLE: &str = r#"
[[package]]
name = "app"

[[package.target]]
name = "App"
dependencies = [{ product = "Utils", package = "lib", module-aliases = { Utils = "FooUtils" } }]

[[package.product]]
name = "App"
targets = ["App"]

[[package]]
name = "lib"

[[package.target]]
name = "Utils"
sources = ["src/utils.ts"]

[[package.product]]
name = "Utils"
targets = ["Utils"]
"#;

const CONFLICT: &str = r#"
[[package]]
name = "app"

[[package.target]]
name = "App"
dependencies = [
  { product = "A", package = "a", module-aliases = { Shared = "X" } },
  { product = "B", package = "b", module-aliases = { Shared = "Y" } },
]

[[package.product]]
name = "App"
targets = ["App"]

[[package]]
name = "a"

[[package.target]]
name = "Shared"

[[package.target]]
name = "A"
dependencies = [{ target = "Shared" }]

[[package.product]]
name = "A"
targets = ["A"]

[[package]]
name = "b"

[[package.target]]
name = "Shared"

[[package.target]]
name = "B"
dependencies = [{ target = "Shared" }]

[[package.product]]
name = "B"
targets = ["B"]
"#;

/// Create a test command context in a temporary directory
fn create_test_context(temp_dir: &TempDir) -> CommandContext {
    CommandContext {
        cwd: Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap(),
        output: crate::output::OutputHandler::new(),
    }
}

fn args(snapshot: &str) -> AliasesArgs {
    AliasesArgs {
        snapshot: snapshot.into(),
        json: false,
        primary_language: None,
        deny_conflicts: false,
    }
}

#[test]
fn test_apply_aliases_lists_renamed_targets() {
    let mut graph = parse_snapshot(SIMPLE).unwrap().into_graph().unwrap();
    let output = apply_aliases(&mut graph, &AliasingSection::default()).unwrap();

    let utils = output
        .targets
        .iter()
        .find(|aliased| aliased.target == TargetId::new("lib", "Utils"))
        .unwrap();
    assert_eq!(utils.module, "FooUtils");
    assert_eq!(utils.aliases.get("Utils").map(String::as_str), Some("FooUtils"));
    assert!(output.diagnostics.is_empty());
    assert_eq!(output.report.applied, 2);
}

#[test]
fn test_render_output_without_colors() {
    let mut graph = parse_snapshot(SIMPLE).unwrap().into_graph().unwrap();
    let output = apply_aliases(&mut graph, &AliasingSection::default()).unwrap();
    let lines = render_output(&output, &ColorSupport::disabled());

    assert!(lines.contains(&"lib:Utils as FooUtils".to_string()));
    assert!(lines.contains(&"  Utils -> FooUtils".to_string()));
    assert_eq!(lines.last().unwrap(), "2 applied, 0 dropped, 2 products reconciled");
}

#[test]
fn test_render_empty_output() {
    let mut graph = parse_snapshot("[[package]]\nname = \"app\"\n").unwrap().into_graph().unwrap();
    let output = apply_aliases(&mut graph, &AliasingSection::default()).unwrap();
    let lines = render_output(&output, &ColorSupport::disabled());

    assert_eq!(lines[0], "No module aliases applied");
}

#[test]
fn test_conflicts_are_reported_and_denied_on_request() {
    let mut graph = parse_snapshot(CONFLICT).unwrap().into_graph().unwrap();
    let output = apply_aliases(&mut graph, &AliasingSection::default()).unwrap();

    assert_eq!(output.diagnostics.len(), 1);
    assert_eq!(output.report.dropped.len(), 1);
    let lines = render_output(&output, &ColorSupport::disabled());
    assert!(lines.iter().any(|line| line.starts_with("info: Dropped alias for module 'Shared'")));

    assert!(deny_conflicts(&AliasingSection::default(), &output.report).is_ok());
    let strict = AliasingSection {
        deny_conflicts: true,
        ..AliasingSection::default()
    };
    match deny_conflicts(&strict, &output.report) {
        Err(PeaError::ConfigValidation { field, reason }) => {
            assert_eq!(field, "aliasing.deny-conflicts");
            assert!(reason.contains("Shared (app:App)"));
        }
        other => panic!("Expected ConfigValidation, got {:?}", other),
    }
}

#[test]
fn test_json_output_shape() {
    let mut graph = parse_snapshot(SIMPLE).unwrap().into_graph().unwrap();
    let output = apply_aliases(&mut graph, &AliasingSection::default()).unwrap();
    let json = serde_json::to_value(&output).unwrap();

    assert_eq!(json["report"]["applied"], 2);
    assert!(json["targets"].as_array().unwrap().iter().any(|target| target["module"] == "FooUtils"));
    assert!(json["diagnostics"].as_array().unwrap().is_empty());
}

#[test]
fn test_rename_of_foreign_target_fails() {
    let snapshot = r#"
[[package]]
name = "lib"

[[package.target]]
name = "Native"
sources = ["native/shim.c", "native/shim.h"]
module-aliases = { Native = "LibNative" }

[[package.product]]
name = "Native"
targets = ["Native"]
"#;
    let mut graph = parse_snapshot(snapshot).unwrap().into_graph().unwrap();

    let error = apply_aliases(&mut graph, &AliasingSection::default()).unwrap_err();
    assert!(matches!(error, PeaError::UnsupportedRenameTarget { .. }));

    let c = AliasingSection {
        primary_language: SourceLanguage::C,
        ..AliasingSection::default()
    };
    let mut graph = parse_snapshot(snapshot).unwrap().into_graph().unwrap();
    let output = apply_aliases(&mut graph, &c).unwrap();
    assert_eq!(output.targets[0].module, "LibNative");
}

#[test]
fn test_cli_overrides() {
    let mut aliases_args = args("graph.toml");
    assert!(aliases_args.cli_overrides().is_empty());

    aliases_args.primary_language = Some("javascript".to_string());
    aliases_args.deny_conflicts = true;
    assert_eq!(
        aliases_args.cli_overrides(),
        vec![
            ("primary-language", "javascript".to_string()),
            ("deny-conflicts", "true".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_load_config_applies_cli_overrides() {
    let temp_dir = tempfile::tempdir().unwrap();
    fs::write(
        temp_dir.path().join("pea.toml"),
        "[package]\nname = \"app\"\n\n[aliasing]\nprimary-language = \"javascript\"\n",
    )
    .unwrap();
    let ctx = create_test_context(&temp_dir);

    let config = ctx.load_config(&[]).await.unwrap();
    assert_eq!(config.package_name(), Some("app"));
    assert_eq!(config.aliasing().primary_language, SourceLanguage::JavaScript);

    let config = ctx.load_config(&[("primary-language", "c".to_string())]).await.unwrap();
    assert_eq!(config.aliasing().primary_language, SourceLanguage::C);
}

#[tokio::test]
async fn test_aliases_command_reads_relative_snapshot() {
    let temp_dir = tempfile::tempdir().unwrap();
    fs::write(temp_dir.path().join("graph.toml"), SIMPLE).unwrap();
    let ctx = create_test_context(&temp_dir);

    let result = aliases::execute(args("graph.toml"), &ctx).await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_aliases_command_missing_snapshot() {
    let temp_dir = tempfile::tempdir().unwrap();
    let ctx = create_test_context(&temp_dir);

    let result = aliases::execute(args("missing.toml"), &ctx).await;
    assert!(matches!(result, Err(PeaError::Io { .. })));
}

#[tokio::test]
async fn test_aliases_command_denies_conflicts() {
    let temp_dir = tempfile::tempdir().unwrap();
    fs::write(temp_dir.path().join("graph.toml"), CONFLICT).unwrap();
    let ctx = create_test_context(&temp_dir);

    let mut strict = args("graph.toml");
    strict.deny_conflicts = true;
    assert!(aliases::execute(strict, &ctx).await.is_err());
    assert!(aliases::execute(args("graph.toml"), &ctx).await.is_ok());
}

#[test]
fn test_error_formatter_shows_location_and_help() {
    let formatter = ErrorFormatter::with_colors(ColorSupport::disabled());

    let parse = PeaError::TomlParse {
        file: "graph.toml".to_string(),
        message: "expected `]`".to_string(),
        line: 3,
        column: 17,
    };
    assert!(formatter.format_error(&parse).contains("--> graph.toml:3:17"));

    let cycle = PeaError::CircularDependency {
        cycle: "a/A -> b/B -> a/A".to_string(),
    };
    let formatted = formatter.format_error(&cycle);
    assert!(formatted.starts_with("error: Circular dependency detected"));
    assert!(formatted.contains("help: Remove circular dependencies"));
}
