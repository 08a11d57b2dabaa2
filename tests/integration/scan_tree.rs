//! Integration tests for scanning a resource tree into a manifest

use super::test_utils::write_pdf;
use resman::manifest::Document;
use resman::tree::walker::TreeScanner;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_single_subject_tree() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("res");
    write_pdf(&root, "filiere_a/sem_1/maths/cours.pdf");

    let outcome = TreeScanner::new(root.clone())
        .with_root_label("res")
        .scan()
        .unwrap();

    let manifest = &outcome.manifest;
    assert_eq!(manifest.filieres.len(), 1);
    assert_eq!(manifest.filieres[0].semestres.len(), 1);
    let matiere = &manifest.filieres[0].semestres[0].matieres[0];
    assert_eq!(matiere.folder, "res/filiere_a/sem_1/maths");
    assert_eq!(matiere.pdfs, vec![Document::Local("cours.pdf".to_string())]);
    assert!(outcome.skipped.is_empty());
}

#[test]
fn test_empty_branches_and_non_pdfs_are_pruned() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().to_path_buf();
    write_pdf(&root, "f/s/kept/a.PDF");
    fs::create_dir_all(root.join("f/s/empty")).unwrap();
    fs::create_dir_all(root.join("f/only_dirs/m")).unwrap();
    fs::create_dir_all(root.join("g/s/m")).unwrap();
    fs::write(root.join("g/s/m/notes.txt"), "text").unwrap();
    fs::write(root.join("stray.pdf"), "top-level file").unwrap();

    let outcome = TreeScanner::new(root).with_root_label("r").scan().unwrap();
    let counts = outcome.counts;
    assert_eq!(counts.filieres, 1);
    assert_eq!(counts.semestres, 1);
    assert_eq!(counts.matieres, 1);
    assert_eq!(counts.documents, 1);
    assert_eq!(outcome.manifest.filieres[0].semestres[0].matieres[0].name, "kept");
}

#[test]
fn test_scan_order_is_stable() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().to_path_buf();
    for rel in ["b/s2/x/2.pdf", "a/s1/y/1.pdf", "b/s1/z/3.pdf", "a/s1/y/0.pdf"] {
        write_pdf(&root, rel);
    }

    let scanner = TreeScanner::new(root).with_root_label("r");
    let first = scanner.scan().unwrap().manifest;
    let second = scanner.scan().unwrap().manifest;
    assert_eq!(first, second);

    let names: Vec<&str> = first.filieres.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["a", "b"]);
    let docs: Vec<&str> = first.filieres[0].semestres[0].matieres[0]
        .pdfs
        .iter()
        .map(|d| d.name())
        .collect();
    assert_eq!(docs, vec!["0.pdf", "1.pdf"]);
}

#[test]
fn test_git_directory_is_ignored() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().to_path_buf();
    write_pdf(&root, ".git/objects/pack/x.pdf");
    write_pdf(&root, "f/s/m/a.pdf");

    let outcome = TreeScanner::new(root).with_root_label("r").scan().unwrap();
    assert_eq!(outcome.counts.filieres, 1);
    assert_eq!(outcome.manifest.filieres[0].name, "f");
}

#[test]
fn test_missing_root_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let result = TreeScanner::new(temp_dir.path().join("absent")).scan();
    assert!(result.is_err());
}
