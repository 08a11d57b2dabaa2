//! Manifest data model
//!
//! The manifest is a strict four-level tree: filière -> semestre -> matière ->
//! documents. It is always derived from the filesystem (see
//! [`crate::tree::walker`]) and persisted whole by [`ManifestStore`].

use crate::tree::path;
use serde::{Deserialize, Serialize};

mod flavor;
mod store;

pub use flavor::{web_flavor, web_root, Flavor};
pub use store::{fix_duplicated_roots, inspect, ManifestStore, PathFix};

/// Root of the persisted manifest
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub filieres: Vec<Filiere>,
}

/// Top-level academic track
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filiere {
    pub name: String,
    pub semestres: Vec<Semestre>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Semestre {
    pub name: String,
    pub matieres: Vec<Matiere>,
}

/// A subject: one folder of documents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Matiere {
    pub name: String,
    pub folder: String,
    pub pdfs: Vec<Document>,
}

/// A document entry. Bare filename in the local flavors, an object with a
/// resolved URL in the remote flavor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Document {
    Local(String),
    Remote(RemoteDocument),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteDocument {
    pub name: String,
    pub url: String,
    pub source: DocumentSource,
}

/// Hosting strategy tag stored next to each resolved URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentSource {
    Raw,
    Download,
    MediaLfs,
}

impl Document {
    pub fn name(&self) -> &str {
        match self {
            Document::Local(name) => name,
            Document::Remote(remote) => &remote.name,
        }
    }

    pub fn url(&self) -> Option<&str> {
        match self {
            Document::Local(_) => None,
            Document::Remote(remote) => Some(&remote.url),
        }
    }
}

impl From<&str> for Document {
    fn from(name: &str) -> Self {
        Document::Local(name.to_string())
    }
}

/// Borrowed view of one subject with its ancestors, as yielded by [`Manifest::subjects`].
#[derive(Debug, Clone, Copy)]
pub struct SubjectRef<'a> {
    pub filiere: &'a Filiere,
    pub semestre: &'a Semestre,
    pub matiere: &'a Matiere,
}

impl SubjectRef<'_> {
    /// `filiere/semestre/matiere`, used to label defects.
    pub fn label(&self) -> String {
        format!(
            "{}/{}/{}",
            self.filiere.name, self.semestre.name, self.matiere.name
        )
    }
}

/// Entity counts for summaries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestCounts {
    pub filieres: usize,
    pub semestres: usize,
    pub matieres: usize,
    pub documents: usize,
}

impl Manifest {
    /// Iterate every subject in manifest order.
    pub fn subjects(&self) -> impl Iterator<Item = SubjectRef<'_>> {
        self.filieres.iter().flat_map(|filiere| {
            filiere.semestres.iter().flat_map(move |semestre| {
                semestre.matieres.iter().map(move |matiere| SubjectRef {
                    filiere,
                    semestre,
                    matiere,
                })
            })
        })
    }

    /// Mutable access to every subject in manifest order.
    pub fn matieres_mut(&mut self) -> impl Iterator<Item = &mut Matiere> {
        self.filieres
            .iter_mut()
            .flat_map(|f| f.semestres.iter_mut())
            .flat_map(|s| s.matieres.iter_mut())
    }

    pub fn counts(&self) -> ManifestCounts {
        let mut counts = ManifestCounts {
            filieres: self.filieres.len(),
            ..ManifestCounts::default()
        };
        for filiere in &self.filieres {
            counts.semestres += filiere.semestres.len();
            for semestre in &filiere.semestres {
                counts.matieres += semestre.matieres.len();
                counts.documents += semestre
                    .matieres
                    .iter()
                    .map(|m| m.pdfs.len())
                    .sum::<usize>();
            }
        }
        counts
    }

    /// Which flavor this tree looks like relative to the resource `root`.
    ///
    /// `Remote` if any document carries a URL. `Web` when every folder sits
    /// under the web root and none under `root` itself. `Local` otherwise,
    /// including the empty tree.
    pub fn flavor_hint(&self, root: &str) -> Flavor {
        let any_remote = self
            .subjects()
            .any(|s| s.matiere.pdfs.iter().any(|d| matches!(d, Document::Remote(_))));
        if any_remote {
            return Flavor::Remote;
        }

        let root = path::normalize_path_string(root);
        let web = flavor::web_root(&root);
        let mut folders = self.subjects().map(|s| s.matiere.folder.as_str()).peekable();
        if web != root
            && folders.peek().is_some()
            && folders.all(|f| path::is_under_root(f, &web) && !path::is_under_root(f, &root))
        {
            Flavor::Web
        } else {
            Flavor::Local
        }
    }
}
