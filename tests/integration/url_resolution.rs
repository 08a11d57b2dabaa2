//! Integration tests for remote URL resolution

use resman::manifest::{Document, DocumentSource, Filiere, Manifest, Matiere, Semestre};
use resman::remote::{resolve, resolve_manifest, RemoteCoordinates, UrlStrategy};

fn coords() -> RemoteCoordinates {
    RemoteCoordinates::new("acct", "courses", "main")
}

#[test]
fn test_media_url_for_spaced_filename() {
    let url = resolve(
        UrlStrategy::Media,
        &coords(),
        "resources/filiere_a/sem_1/maths",
        "Cours Final.pdf",
    );
    assert!(url.starts_with("https://media.githubusercontent.com/media/acct/courses/main/"));
    assert!(url.ends_with("/resources/filiere_a/sem_1/maths/Cours%20Final.pdf"));
}

#[test]
fn test_each_strategy_uses_its_host() {
    let hosts: Vec<String> = UrlStrategy::ALL
        .iter()
        .map(|s| resolve(*s, &coords(), "r/f/s/m", "a.pdf"))
        .collect();
    assert!(hosts[0].starts_with("https://raw.githubusercontent.com/"));
    assert!(hosts[1].starts_with("https://github.com/acct/courses/raw/main/"));
    assert!(hosts[2].starts_with("https://media.githubusercontent.com/media/"));
}

#[test]
fn test_resolve_manifest_tags_every_document() {
    let manifest = Manifest {
        filieres: vec![Filiere {
            name: "f".to_string(),
            semestres: vec![Semestre {
                name: "s".to_string(),
                matieres: vec![Matiere {
                    name: "m".to_string(),
                    folder: "assets/resources/f/s/m".to_string(),
                    pdfs: vec!["a.pdf".into(), "b c.pdf".into()],
                }],
            }],
        }],
    };

    let remote = resolve_manifest(&manifest, UrlStrategy::Download, &coords());
    let pdfs = &remote.filieres[0].semestres[0].matieres[0].pdfs;
    assert_eq!(pdfs.len(), 2);
    for doc in pdfs {
        match doc {
            Document::Remote(remote) => assert_eq!(remote.source, DocumentSource::Download),
            other => panic!("expected remote document, got {:?}", other),
        }
    }
    assert_eq!(
        pdfs[1].url(),
        Some("https://github.com/acct/courses/raw/main/assets/resources/f/s/m/b%20c.pdf")
    );

    // Re-resolving a remote flavor is stable
    assert_eq!(resolve_manifest(&remote, UrlStrategy::Download, &coords()), remote);
}

#[test]
fn test_remote_flavor_json_shape() {
    let manifest = Manifest {
        filieres: vec![Filiere {
            name: "f".to_string(),
            semestres: vec![Semestre {
                name: "s".to_string(),
                matieres: vec![Matiere {
                    name: "m".to_string(),
                    folder: "r/f/s/m".to_string(),
                    pdfs: vec!["a.pdf".into()],
                }],
            }],
        }],
    };
    let remote = resolve_manifest(&manifest, UrlStrategy::Media, &coords());
    let value = serde_json::to_value(&remote).unwrap();
    let doc = &value["filieres"][0]["semestres"][0]["matieres"][0]["pdfs"][0];
    assert_eq!(doc["name"], "a.pdf");
    assert_eq!(doc["source"], "media_lfs");
    assert!(doc["url"].as_str().unwrap().ends_with("/r/f/s/m/a.pdf"));
}
