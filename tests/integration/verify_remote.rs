//! Integration tests for the remote check

use async_trait::async_trait;
use resman::error::Defect;
use resman::manifest::{Document, DocumentSource, Filiere, Manifest, Matiere, RemoteDocument, Semestre};
use resman::remote::{HttpProber, ProbeOutcome, Prober};
use resman::verify::{check_remote, RemoteCheckOptions};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

fn remote_manifest(urls: &[(&str, &str)]) -> Manifest {
    Manifest {
        filieres: vec![Filiere {
            name: "f".to_string(),
            semestres: vec![Semestre {
                name: "s".to_string(),
                matieres: vec![Matiere {
                    name: "m".to_string(),
                    folder: "res/f/s/m".to_string(),
                    pdfs: urls
                        .iter()
                        .map(|(name, url)| {
                            Document::Remote(RemoteDocument {
                                name: name.to_string(),
                                url: url.to_string(),
                                source: DocumentSource::Raw,
                            })
                        })
                        .collect(),
                }],
            }],
        }],
    }
}

fn options() -> RemoteCheckOptions {
    RemoteCheckOptions {
        concurrency: 4,
        timeout: Duration::from_secs(5),
        retries: 1,
        deadline: Duration::from_secs(30),
    }
}

struct Slow {
    calls: AtomicUsize,
}

#[async_trait]
impl Prober for Slow {
    async fn probe(&self, _url: &str) -> ProbeOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(30)).await;
        ProbeOutcome::Accessible
    }
}

#[tokio::test]
async fn test_deadline_cuts_outstanding_probes() {
    let manifest = remote_manifest(&[("a.pdf", "https://h/a.pdf"), ("b.pdf", "https://h/b.pdf")]);
    let prober = Slow {
        calls: AtomicUsize::new(0),
    };
    let options = RemoteCheckOptions {
        concurrency: 2,
        timeout: Duration::from_secs(60),
        retries: 0,
        deadline: Duration::from_millis(200),
    };

    let report = check_remote(&manifest, &prober, &options).await;
    assert_eq!(report.total, 2);
    assert_eq!(report.timed_out, 2);
    assert_eq!(report.failing, 2);
    assert!(!report.ok);
    assert!(report.elapsed_ms < 10_000);
    assert!(report.errors.iter().all(|d| matches!(
        d,
        Defect::RemoteUnreachable { reason, .. } if reason.starts_with("timeout")
    )));
}

struct Fixed(HashMap<String, ProbeOutcome>);

#[async_trait]
impl Prober for Fixed {
    async fn probe(&self, url: &str) -> ProbeOutcome {
        self.0.get(url).cloned().unwrap_or(ProbeOutcome::HttpStatus(404))
    }
}

#[tokio::test]
async fn test_counts_add_up() {
    let manifest = remote_manifest(&[
        ("ok.pdf", "https://h/ok.pdf"),
        ("stub.pdf", "https://h/stub.pdf"),
        ("gone.pdf", "https://h/gone.pdf"),
    ]);
    let prober = Fixed(HashMap::from([
        ("https://h/ok.pdf".to_string(), ProbeOutcome::Accessible),
        ("https://h/stub.pdf".to_string(), ProbeOutcome::PointerStub),
    ]));

    let report = check_remote(&manifest, &prober, &options()).await;
    assert_eq!(report.total, 3);
    assert_eq!(report.accessible, 1);
    assert_eq!(report.pointers, 1);
    assert_eq!(report.failing, 1);
    assert_eq!(report.errors.len(), 2);
}

/// Minimal HTTP/1.1 server: one response per connection, keyed by path.
async fn serve(routes: HashMap<&'static str, (u16, &'static [u8])>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        loop {
            let (mut socket, _) = match listener.accept().await {
                Ok(conn) => conn,
                Err(_) => return,
            };
            let routes = routes.clone();
            tokio::spawn(async move {
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }
                let text = String::from_utf8_lossy(&request);
                let mut parts = text.split_whitespace();
                let method = parts.next().unwrap_or_default().to_string();
                let path = parts.next().unwrap_or_default().to_string();
                let (status, body) = routes
                    .get(path.as_str())
                    .copied()
                    .unwrap_or((404, &b"not found"[..]));
                let reason = if status == 200 { "OK" } else { "Not Found" };
                let mut response = format!(
                    "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    status,
                    reason,
                    body.len()
                )
                .into_bytes();
                if method != "HEAD" {
                    response.extend_from_slice(body);
                }
                let _ = socket.write_all(&response).await;
                let _ = socket.shutdown().await;
            });
        }
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn test_http_pointer_stub_is_not_accessible() {
    let base = serve(HashMap::from([
        (
            "/pointer.pdf",
            (
                200,
                &b"version https://git-lfs.github.com/spec/v1\noid sha256:4d7a\nsize 1234\n"[..],
            ),
        ),
        ("/real.pdf", (200, &b"%PDF-1.7\n%\xe2\xe3\xcf\xd3\n1 0 obj"[..])),
    ]))
    .await;
    let manifest = remote_manifest(&[
        ("pointer.pdf", &format!("{}/pointer.pdf", base)),
        ("real.pdf", &format!("{}/real.pdf", base)),
        ("missing.pdf", &format!("{}/missing.pdf", base)),
    ]);
    let client = reqwest::Client::builder().no_proxy().build().unwrap();
    let prober = HttpProber::with_client(client, 256);

    let report = check_remote(&manifest, &prober, &options()).await;
    assert_eq!(report.total, 3);
    assert_eq!(report.accessible, 1);
    assert_eq!(report.pointers, 1);
    assert_eq!(report.failing, 1);
    assert!(report.errors.iter().any(|d| matches!(
        d,
        Defect::IndirectionPointerDetected { url, .. } if url.ends_with("/pointer.pdf")
    )));
    assert!(report.errors.iter().any(|d| matches!(
        d,
        Defect::RemoteUnreachable { status: Some(404), .. }
    )));
}

#[tokio::test]
async fn test_connection_refused_is_network_failure() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = reqwest::Client::builder().no_proxy().build().unwrap();
    let prober = HttpProber::with_client(client, 256);
    let outcome = prober.probe(&format!("http://{}/x.pdf", addr)).await;
    assert!(outcome.is_transient(), "refused connection should be transient: {:?}", outcome);
}
