//! Remote reachability check with bounded parallelism
//!
//! Probes are independent; each writes only its own result slot and the
//! report is assembled after the stream drains or the deadline fires.

use crate::error::Defect;
use crate::manifest::Manifest;
use crate::remote::{ProbeOutcome, Prober};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

/// Knobs for [`check_remote`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoteCheckOptions {
    /// Probes in flight at once (at least 1)
    pub concurrency: usize,
    /// Per-attempt timeout
    pub timeout: Duration,
    /// Extra attempts for transient failures
    pub retries: u32,
    /// Budget for the whole pass
    pub deadline: Duration,
}

impl Default for RemoteCheckOptions {
    fn default() -> Self {
        Self {
            concurrency: 8,
            timeout: Duration::from_secs(10),
            retries: 1,
            deadline: Duration::from_secs(300),
        }
    }
}

/// Result of a remote check
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemoteReport {
    pub ok: bool,
    pub total: usize,
    pub accessible: usize,
    pub failing: usize,
    pub pointers: usize,
    /// Probes cut short by the overall deadline
    pub timed_out: usize,
    pub elapsed_ms: u64,
    /// Documents that carry no URL
    pub missing: Vec<Defect>,
    /// Unreachable URLs and pointer stubs, in manifest order
    pub errors: Vec<Defect>,
}

struct Target {
    document: String,
    url: String,
}

/// Probe every document URL of `manifest`.
///
/// Transient network failures are retried up to `options.retries` times;
/// HTTP error statuses are not. When `options.deadline` passes, outstanding
/// probes are dropped and reported as timeouts.
#[instrument(skip_all, fields(concurrency = options.concurrency))]
pub async fn check_remote<P>(manifest: &Manifest, prober: &P, options: &RemoteCheckOptions) -> RemoteReport
where
    P: Prober + ?Sized,
{
    let started = Instant::now();
    let mut report = RemoteReport::default();
    let mut targets = Vec::new();

    for subject in manifest.subjects() {
        for doc in &subject.matiere.pdfs {
            report.total += 1;
            match doc.url() {
                Some(url) => targets.push(Target {
                    document: format!("{}/{}", subject.label(), doc.name()),
                    url: url.to_string(),
                }),
                None => report.missing.push(Defect::StructuralDefect {
                    location: format!("{}/{}", subject.label(), doc.name()),
                    detail: "document has no resolved URL".to_string(),
                    suggested_fix: Some("run resolve-urls first".to_string()),
                }),
            }
        }
    }

    let timeout = options.timeout;
    let retries = options.retries;
    let mut outcomes: Vec<Option<ProbeOutcome>> = vec![None; targets.len()];
    let probes = stream::iter(targets.iter().enumerate().map(move |(index, target)| {
        let url = target.url.as_str();
        async move { (index, probe_with_retries(prober, url, timeout, retries).await) }
    }))
    .buffer_unordered(options.concurrency.max(1));
    futures::pin_mut!(probes);

    let deadline = tokio::time::Instant::now() + options.deadline;
    loop {
        match tokio::time::timeout_at(deadline, probes.next()).await {
            Ok(Some((index, outcome))) => outcomes[index] = Some(outcome),
            Ok(None) => break,
            Err(_) => {
                warn!(
                    deadline_secs = options.deadline.as_secs(),
                    outstanding = outcomes.iter().filter(|o| o.is_none()).count(),
                    "Remote check deadline reached"
                );
                break;
            }
        }
    }

    for (target, outcome) in targets.iter().zip(outcomes) {
        match outcome {
            Some(ProbeOutcome::Accessible) => {
                debug!(url = %target.url, "Accessible");
                report.accessible += 1;
            }
            Some(ProbeOutcome::PointerStub) => {
                warn!(url = %target.url, "Pointer stub served");
                report.pointers += 1;
                report.errors.push(Defect::IndirectionPointerDetected {
                    document: target.document.clone(),
                    url: target.url.clone(),
                });
            }
            Some(ProbeOutcome::HttpStatus(status)) => {
                warn!(url = %target.url, status, "Unreachable");
                report.failing += 1;
                report.errors.push(Defect::RemoteUnreachable {
                    document: target.document.clone(),
                    url: target.url.clone(),
                    status: Some(status),
                    reason: format!("HTTP {}", status),
                });
            }
            Some(ProbeOutcome::Network { message, .. }) => {
                warn!(url = %target.url, error = %message, "Unreachable");
                report.failing += 1;
                report.errors.push(Defect::RemoteUnreachable {
                    document: target.document.clone(),
                    url: target.url.clone(),
                    status: None,
                    reason: message,
                });
            }
            None => {
                report.failing += 1;
                report.timed_out += 1;
                report.errors.push(Defect::RemoteUnreachable {
                    document: target.document.clone(),
                    url: target.url.clone(),
                    status: None,
                    reason: format!(
                        "timeout: overall deadline of {}s reached",
                        options.deadline.as_secs()
                    ),
                });
            }
        }
    }

    report.failing += report.missing.len();
    report.ok = report.errors.is_empty() && report.missing.is_empty();
    report.elapsed_ms = started.elapsed().as_millis() as u64;
    info!(
        total = report.total,
        accessible = report.accessible,
        failing = report.failing,
        pointers = report.pointers,
        elapsed_ms = report.elapsed_ms,
        "Remote check complete"
    );
    report
}

async fn probe_with_retries<P>(prober: &P, url: &str, timeout: Duration, retries: u32) -> ProbeOutcome
where
    P: Prober + ?Sized,
{
    let mut attempt = 0;
    loop {
        let outcome = match tokio::time::timeout(timeout, prober.probe(url)).await {
            Ok(outcome) => outcome,
            Err(_) => ProbeOutcome::Network {
                message: format!("timeout after {}ms", timeout.as_millis()),
                transient: true,
            },
        };
        if outcome.is_transient() && attempt < retries {
            attempt += 1;
            debug!(url, attempt, "Retrying transient failure");
            continue;
        }
        return outcome;
    }
}
