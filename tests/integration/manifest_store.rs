//! Integration tests for manifest persistence and inspection

use resman::error::{Defect, StorageError};
use resman::manifest::{
    fix_duplicated_roots, inspect, web_flavor, Document, Filiere, Manifest, ManifestStore, Matiere,
    Semestre,
};
use std::fs;
use tempfile::TempDir;

fn manifest_with_folder(folder: &str) -> Manifest {
    Manifest {
        filieres: vec![Filiere {
            name: "lf_genie".to_string(),
            semestres: vec![Semestre {
                name: "semestre_1".to_string(),
                matieres: vec![Matiere {
                    name: "algebre".to_string(),
                    folder: folder.to_string(),
                    pdfs: vec![Document::Local("cours.pdf".to_string())],
                }],
            }],
        }],
    }
}

#[test]
fn test_save_then_load_preserves_order_and_content() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested/dir/manifest.json");
    let manifest = manifest_with_folder("assets/resources/lf_genie/semestre_1/algebre");

    ManifestStore::save(&manifest, &path).unwrap();
    let loaded = ManifestStore::load(&path).unwrap();
    assert_eq!(loaded, manifest);
    assert!(!path.with_extension("json.tmp").exists());
}

#[test]
fn test_load_rejects_malformed_json() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("manifest.json");
    fs::write(&path, "{ \"filieres\": [").unwrap();

    match ManifestStore::load(&path) {
        Err(StorageError::ManifestParse { path: reported, .. }) => assert_eq!(reported, path),
        other => panic!("expected parse error, got {:?}", other),
    }
}

#[test]
fn test_load_checked_reports_duplicated_root() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("manifest.json");
    ManifestStore::save(&manifest_with_folder("assets/assets/x"), &path).unwrap();

    let (_, defects) = ManifestStore::load_checked(&path, "assets").unwrap();
    assert!(defects
        .iter()
        .any(|d| matches!(d, Defect::StructuralDefect { .. })));
}

#[test]
fn test_inspect_accepts_canonical_folders() {
    let manifest = manifest_with_folder("assets/resources/lf_genie/semestre_1/algebre");
    assert!(inspect(&manifest, "assets/resources").is_empty());
}

#[test]
fn test_fix_duplicated_roots_rewrites_folder() {
    let mut manifest = manifest_with_folder("assets/assets/x");
    let fixes = fix_duplicated_roots(&mut manifest, "assets");
    assert_eq!(fixes.len(), 1);
    assert_eq!(fixes[0].from, "assets/assets/x");
    assert_eq!(fixes[0].to, "assets/x");
    assert_eq!(manifest.filieres[0].semestres[0].matieres[0].folder, "assets/x");
}

#[test]
fn test_web_flavor_strips_root_parent() {
    let manifest = manifest_with_folder("assets/resources/lf_genie/semestre_1/algebre");
    let web = web_flavor(&manifest, "assets/resources");
    assert_eq!(
        web.filieres[0].semestres[0].matieres[0].folder,
        "resources/lf_genie/semestre_1/algebre"
    );
    assert_eq!(web.filieres[0].semestres[0].matieres[0].pdfs, manifest.filieres[0].semestres[0].matieres[0].pdfs);
}
