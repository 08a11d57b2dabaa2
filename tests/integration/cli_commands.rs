//! Integration tests for the CLI route table

use super::test_utils::{workspace_with, EnvGuard};
use clap::Parser;
use resman::cli::{Cli, RunContext};
use resman::manifest::ManifestStore;
use std::fs;

fn run(ws: &std::path::Path, args: &[&str]) -> resman::cli::CommandOutput {
    let mut argv = vec!["resman", "--workspace"];
    let ws = ws.to_str().unwrap();
    argv.push(ws);
    argv.extend_from_slice(args);
    let cli = Cli::try_parse_from(argv).unwrap();
    let ctx = RunContext::new(cli.workspace.clone(), cli.config.clone()).unwrap();
    ctx.execute(&cli.command).unwrap()
}

#[test]
fn test_full_publish_cycle() {
    let _env = EnvGuard::new();
    let temp_dir = workspace_with(&["LF Génie/Semestre 1/Algèbre/Cours Final.pdf"]);
    let ws = temp_dir.path();

    let sanitized = run(ws, &["sanitize", "--yes"]);
    assert_eq!(sanitized.exit_code(), 0, "{}", sanitized.rendered);

    let generated = run(ws, &["generate", "--format", "json"]);
    assert!(generated.ok);
    let report: serde_json::Value = serde_json::from_str(&generated.rendered).unwrap();
    assert_eq!(report["counts"]["documents"], 1);

    let local = run(ws, &["verify-local"]);
    assert!(local.ok, "{}", local.rendered);

    let resolved = run(ws, &["resolve-urls", "media"]);
    assert!(resolved.ok);
    let remote = ManifestStore::load(ws.join("assets/resources_manifest_online.json")).unwrap();
    let url = remote.filieres[0].semestres[0].matieres[0].pdfs[0]
        .url()
        .unwrap()
        .to_string();
    assert_eq!(
        url,
        "https://media.githubusercontent.com/media/acct/courses/main/assets/resources/lf_genie/semestre_1/algebre/cours_final.pdf"
    );

    let exported = run(ws, &["export-web"]);
    assert!(exported.ok);
    let web = ManifestStore::load(ws.join("assets/resources_manifest_web.json")).unwrap();
    assert_eq!(
        web.filieres[0].semestres[0].matieres[0].folder,
        "resources/lf_genie/semestre_1/algebre"
    );
}

#[test]
fn test_verify_local_reports_defects_with_exit_code_two() {
    let _env = EnvGuard::new();
    let temp_dir = workspace_with(&["f/s/m/a.pdf", "f/s/m/b.pdf"]);
    let ws = temp_dir.path();

    run(ws, &["generate"]);
    fs::remove_file(ws.join("assets/resources/f/s/m/b.pdf")).unwrap();

    let output = run(ws, &["verify-local", "--format", "json"]);
    assert_eq!(output.exit_code(), 2);
    let report: serde_json::Value = serde_json::from_str(&output.rendered).unwrap();
    assert_eq!(report["documents_missing"], 1);
    assert_eq!(report["missing"][0]["kind"], "missing_resource");
    assert_eq!(report["missing"][0]["path"], "assets/resources/f/s/m/b.pdf");
}

#[test]
fn test_fix_paths_dry_run_leaves_manifest_alone() {
    let _env = EnvGuard::new();
    let temp_dir = workspace_with(&["f/s/m/a.pdf"]);
    let ws = temp_dir.path();
    run(ws, &["generate"]);

    let manifest_path = ws.join("assets/resources_manifest.json");
    let original = fs::read_to_string(&manifest_path).unwrap();
    let broken = original.replace("\"assets/resources/f/s/m\"", "\"assets/assets/resources/f/s/m\"");
    fs::write(&manifest_path, &broken).unwrap();

    let dry = run(ws, &["fix-paths", "--dry-run"]);
    assert!(dry.ok, "{}", dry.rendered);
    assert!(dry.rendered.contains("assets/assets/resources/f/s/m"));
    assert_eq!(fs::read_to_string(&manifest_path).unwrap(), broken);

    let applied = run(ws, &["fix-paths"]);
    assert!(applied.ok);
    let fixed = ManifestStore::load(&manifest_path).unwrap();
    assert_eq!(fixed.filieres[0].semestres[0].matieres[0].folder, "assets/resources/f/s/m");
}

#[test]
fn test_resolve_urls_without_coordinates_fails() {
    let _env = EnvGuard::new();
    let temp_dir = workspace_with(&["f/s/m/a.pdf"]);
    let ws = temp_dir.path();
    fs::write(ws.join("resman.toml"), "[resources]\nroot = \"assets/resources\"\n").unwrap();
    run(ws, &["generate"]);

    let cli = Cli::try_parse_from(["resman", "--workspace", ws.to_str().unwrap(), "resolve-urls"]).unwrap();
    let ctx = RunContext::new(cli.workspace.clone(), None).unwrap();
    let err = ctx.execute(&cli.command).unwrap_err();
    assert!(err.to_string().contains("remote.account"));
}

#[test]
fn test_sanitize_without_terminal_requires_yes() {
    let _env = EnvGuard::new();
    let temp_dir = workspace_with(&["F/S/M/Cours.pdf"]);
    let ws = temp_dir.path();

    let cli = Cli::try_parse_from(["resman", "--workspace", ws.to_str().unwrap(), "sanitize"]).unwrap();
    let ctx = RunContext::new(cli.workspace.clone(), None).unwrap();
    if std::io::IsTerminal::is_terminal(&std::io::stdin()) {
        return;
    }
    let err = ctx.execute(&cli.command).unwrap_err();
    assert!(err.to_string().contains("--yes"));
    assert!(ws.join("assets/resources/F/S/M/Cours.pdf").is_file());
}
