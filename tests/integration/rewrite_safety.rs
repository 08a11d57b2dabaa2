//! Integration tests for the two-phase tree rewrite

use super::test_utils::write_pdf;
use resman::manifest::ManifestStore;
use resman::tree::hasher::compute_tree_digest;
use resman::tree::rewriter::{RewriteStatus, TreeRewriter};
use resman::tree::walker::TreeScanner;
use std::fs;
use tempfile::TempDir;

fn scan(root: &std::path::Path) -> resman::manifest::Manifest {
    TreeScanner::new(root.to_path_buf())
        .with_root_label("res")
        .scan()
        .unwrap()
        .manifest
}

#[test]
fn test_rewrite_backs_up_then_renames_every_level() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("res");
    write_pdf(&root, "LF Génie Civil/Semestre 1/Algèbre Linéaire/Algèbre Linéaire (2023).pdf");
    write_pdf(&root, "LF Génie Civil/Semestre 1/Algèbre Linéaire/TD 1.PDF");
    let before = compute_tree_digest(&root).unwrap();

    let manifest_path = temp_dir.path().join("manifest.json");
    let outcome = TreeRewriter::new(root.clone(), "res")
        .persist_to(manifest_path.clone())
        .rewrite(&scan(&root))
        .unwrap();

    let report = outcome.report;
    assert_eq!(report.status, RewriteStatus::Completed);
    assert!(report.ok);
    assert_eq!(report.renamed, report.planned);

    let backup = report.backup.expect("backup is always taken");
    assert_eq!(compute_tree_digest(&backup.path).unwrap(), before);
    assert_eq!(backup.files, 2);

    let subject = root.join("lf_genie_civil/semestre_1/algebre_lineaire");
    assert!(subject.join("algebre_lineaire_2023.pdf").is_file());
    assert!(subject.join("td_1.pdf").is_file());

    let saved = ManifestStore::load(&manifest_path).unwrap();
    assert_eq!(saved, outcome.tree);
    assert_eq!(saved, scan(&root));
}

#[test]
fn test_non_ascii_only_document_survives_rescan() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("res");
    write_pdf(&root, "f/s/m/数学.pdf");
    write_pdf(&root, "f/s/m/b.pdf");

    let outcome = TreeRewriter::new(root.clone(), "res")
        .rewrite(&scan(&root))
        .unwrap();
    assert!(outcome.report.ok);
    assert!(root.join("f/s/m/.pdf").is_file());

    let rescanned = scan(&root);
    assert_eq!(rescanned.counts().documents, 2);
    assert_eq!(rescanned, outcome.tree);
}

#[test]
fn test_collisions_abort_before_backup() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("res");
    write_pdf(&root, "F/S/M/Cours.pdf");
    write_pdf(&root, "F/S/M/cours.pdf");
    let before = compute_tree_digest(&root).unwrap();

    let outcome = TreeRewriter::new(root.clone(), "res")
        .rewrite(&scan(&root))
        .unwrap();

    assert_eq!(outcome.report.status, RewriteStatus::Conflicted);
    assert!(!outcome.report.ok);
    assert!(outcome.report.backup.is_none());
    assert_eq!(outcome.report.renamed, 0);
    assert_eq!(compute_tree_digest(&root).unwrap(), before);

    let siblings: Vec<_> = fs::read_dir(temp_dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(siblings.len(), 1, "no backup directory may be created");
}

#[test]
fn test_rewrite_of_canonical_tree_renames_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("res");
    write_pdf(&root, "f/s/m/a.pdf");

    let rewriter = TreeRewriter::new(root.clone(), "res");
    let plan = rewriter.plan(&scan(&root));
    assert!(plan.is_noop());
    assert_eq!(plan.unchanged, 4);

    let outcome = rewriter.rewrite(&scan(&root)).unwrap();
    assert!(outcome.report.ok);
    assert_eq!(outcome.report.renamed, 0);
    assert!(root.join("f/s/m/a.pdf").is_file());
}

#[test]
fn test_plan_does_not_touch_disk() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("res");
    write_pdf(&root, "Filière A/Sem 1/Maths/Cours Final.pdf");
    let before = compute_tree_digest(&root).unwrap();

    let plan = TreeRewriter::new(root.clone(), "res").plan(&scan(&root));
    assert_eq!(plan.ops.len(), 4);
    assert!(plan.conflicts.is_empty());
    assert_eq!(
        plan.tree.filieres[0].semestres[0].matieres[0].folder,
        "res/filiere_a/sem_1/maths"
    );
    assert_eq!(compute_tree_digest(&root).unwrap(), before);
}
