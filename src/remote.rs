//! Hosted-document URLs and the probes that check them

pub mod probe;
pub mod url;

pub use probe::{is_pointer_stub, HttpProber, ProbeOutcome, Prober, LFS_POINTER_MAGIC};
pub use url::{encode_filename, resolve, resolve_manifest, RemoteCoordinates, UrlStrategy};
