//! Remote URL resolution for hosted documents
//!
//! Pure string templates; no network I/O happens here.

use crate::manifest::{Document, DocumentSource, Manifest, RemoteDocument};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Everything but RFC 3986 unreserved characters is escaped in file names.
const FILENAME_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// How a document URL is built
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrlStrategy {
    /// Raw content host. Fast, but serves pointer stubs for large-object files.
    Raw,
    /// Repository `raw/` path; redirects to real content.
    Download,
    /// Large-object media endpoint.
    Media,
}

impl UrlStrategy {
    pub const ALL: [UrlStrategy; 3] = [UrlStrategy::Raw, UrlStrategy::Download, UrlStrategy::Media];

    pub fn as_str(self) -> &'static str {
        match self {
            UrlStrategy::Raw => "raw",
            UrlStrategy::Download => "download",
            UrlStrategy::Media => "media",
        }
    }

    /// Tag stored in the remote manifest flavor.
    pub fn source(self) -> DocumentSource {
        match self {
            UrlStrategy::Raw => DocumentSource::Raw,
            UrlStrategy::Download => DocumentSource::Download,
            UrlStrategy::Media => DocumentSource::MediaLfs,
        }
    }
}

impl fmt::Display for UrlStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UrlStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "raw" => Ok(UrlStrategy::Raw),
            "download" => Ok(UrlStrategy::Download),
            "media" | "media_lfs" => Ok(UrlStrategy::Media),
            other => Err(format!(
                "Unknown URL strategy '{}' (expected raw, download, or media)",
                other
            )),
        }
    }
}

/// Hosting coordinates: where the repository lives and which hosts serve it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteCoordinates {
    pub account: String,
    pub repository: String,
    pub branch: String,
    pub raw_host: String,
    pub host: String,
    pub media_host: String,
}

impl RemoteCoordinates {
    /// Coordinates on the default public hosts.
    pub fn new(
        account: impl Into<String>,
        repository: impl Into<String>,
        branch: impl Into<String>,
    ) -> Self {
        Self {
            account: account.into(),
            repository: repository.into(),
            branch: branch.into(),
            raw_host: "raw.githubusercontent.com".to_string(),
            host: "github.com".to_string(),
            media_host: "media.githubusercontent.com".to_string(),
        }
    }

    /// Missing pieces, by config key name.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.account.trim().is_empty() {
            missing.push("remote.account");
        }
        if self.repository.trim().is_empty() {
            missing.push("remote.repository");
        }
        if self.branch.trim().is_empty() {
            missing.push("remote.branch");
        }
        missing
    }
}

/// Percent-encode a document file name for use in a URL path.
pub fn encode_filename(name: &str) -> String {
    utf8_percent_encode(name, FILENAME_ENCODE_SET).to_string()
}

/// Build the URL of `document` inside `folder` under `strategy`.
///
/// `folder` is inserted verbatim (it is already a canonical path); the
/// document name is percent-encoded.
pub fn resolve(
    strategy: UrlStrategy,
    coords: &RemoteCoordinates,
    folder: &str,
    document: &str,
) -> String {
    let folder = folder.trim_matches('/');
    let document = encode_filename(document);
    match strategy {
        UrlStrategy::Raw => format!(
            "https://{}/{}/{}/{}/{}/{}",
            coords.raw_host, coords.account, coords.repository, coords.branch, folder, document
        ),
        UrlStrategy::Download => format!(
            "https://{}/{}/{}/raw/{}/{}/{}",
            coords.host, coords.account, coords.repository, coords.branch, folder, document
        ),
        UrlStrategy::Media => format!(
            "https://{}/media/{}/{}/{}/{}/{}",
            coords.media_host, coords.account, coords.repository, coords.branch, folder, document
        ),
    }
}

/// Derive the remote flavor of `manifest`: every document gains a URL and
/// source tag. Documents that already carry a URL are re-resolved.
pub fn resolve_manifest(
    manifest: &Manifest,
    strategy: UrlStrategy,
    coords: &RemoteCoordinates,
) -> Manifest {
    let mut remote = manifest.clone();
    for matiere in remote.matieres_mut() {
        let folder = matiere.folder.clone();
        for doc in matiere.pdfs.iter_mut() {
            let name = doc.name().to_string();
            let url = resolve(strategy, coords, &folder, &name);
            *doc = Document::Remote(RemoteDocument {
                name,
                url,
                source: strategy.source(),
            });
        }
    }
    remote
}
