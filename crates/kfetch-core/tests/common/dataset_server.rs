//! Minimal HTTP/1.1 stand-in for the dataset service, for integration tests.
//!
//! Serves `/api/v1/datasets/view/{owner}/{slug}` (metadata JSON) and
//! `/api/v1/datasets/download/{owner}/{slug}?dataset_version_number=N`, which
//! redirects to `/blobs/...` where the payload is served.

#![allow(dead_code)]

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ServedDataset {
    pub owner: String,
    pub slug: String,
    pub version: u32,
    pub body: Vec<u8>,
    /// Sent as `Content-Disposition: attachment; filename="..."` when set.
    pub filename: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ServerOptions {
    /// Exact `Authorization` header value required on API routes (401 otherwise).
    pub required_auth: Option<String>,
    /// Close blob responses after half the advertised body.
    pub truncate_blobs: bool,
}

#[derive(Debug, Default)]
pub struct Hits {
    pub metadata: AtomicUsize,
    pub downloads: AtomicUsize,
}

pub struct DatasetServer {
    pub api_base_url: String,
    pub hits: Arc<Hits>,
}

impl DatasetServer {
    pub fn metadata_hits(&self) -> usize {
        self.hits.metadata.load(Ordering::SeqCst)
    }

    pub fn download_hits(&self) -> usize {
        self.hits.downloads.load(Ordering::SeqCst)
    }
}

/// Starts a server in a background thread. Runs until the process exits.
pub fn start(datasets: Vec<ServedDataset>, opts: ServerOptions) -> DatasetServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let datasets = Arc::new(datasets);
    let hits = Arc::new(Hits::default());
    let hits_srv = Arc::clone(&hits);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let datasets = Arc::clone(&datasets);
            let hits = Arc::clone(&hits_srv);
            let opts = opts.clone();
            thread::spawn(move || handle(stream, &datasets, &opts, &hits));
        }
    });
    DatasetServer {
        api_base_url: format!("http://127.0.0.1:{}/api/v1", port),
        hits,
    }
}

/// A base URL nothing listens on.
pub fn dead_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}/api/v1", port)
}

fn handle(mut stream: TcpStream, datasets: &[ServedDataset], opts: &ServerOptions, hits: &Hits) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));

    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut chunk) {
            Ok(0) | Err(_) => return,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
    let request = String::from_utf8_lossy(&buf).into_owned();
    let (method, target, auth) = parse_request(&request);
    if !method.eq_ignore_ascii_case("GET") {
        respond(&mut stream, "405 Method Not Allowed", &[], b"");
        return;
    }

    let (path, query) = target.split_once('?').unwrap_or((target.as_str(), ""));
    let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();

    if let ["api", "v1", ..] = segments.as_slice() {
        if let Some(required) = &opts.required_auth {
            if auth.as_deref() != Some(required.as_str()) {
                respond(&mut stream, "401 Unauthorized", &[], b"{\"code\":401}");
                return;
            }
        }
    }

    match segments.as_slice() {
        ["api", "v1", "datasets", "view", owner, slug] => {
            hits.metadata.fetch_add(1, Ordering::SeqCst);
            let latest = datasets
                .iter()
                .filter(|d| d.owner == *owner && d.slug == *slug)
                .map(|d| d.version)
                .max();
            match latest {
                Some(v) => {
                    let body = format!(
                        "{{\"ref\":\"{}/{}\",\"currentVersionNumber\":{}}}",
                        owner, slug, v
                    );
                    respond(
                        &mut stream,
                        "200 OK",
                        &["Content-Type: application/json"],
                        body.as_bytes(),
                    );
                }
                None => respond(&mut stream, "404 Not Found", &[], b"{\"code\":404}"),
            }
        }
        ["api", "v1", "datasets", "download", owner, slug] => {
            let version = query
                .split('&')
                .find_map(|kv| kv.strip_prefix("dataset_version_number="))
                .and_then(|v| v.parse::<u32>().ok());
            let found = datasets
                .iter()
                .any(|d| d.owner == *owner && d.slug == *slug && Some(d.version) == version);
            match (found, version) {
                (true, Some(v)) => {
                    let location = format!("Location: /blobs/{}/{}/{}", owner, slug, v);
                    respond(&mut stream, "302 Found", &[location.as_str()], b"");
                }
                _ => respond(&mut stream, "404 Not Found", &[], b"{\"code\":404}"),
            }
        }
        ["blobs", owner, slug, v] => {
            let ds = datasets
                .iter()
                .find(|d| d.owner == *owner && d.slug == *slug && d.version.to_string() == *v);
            match ds {
                Some(ds) => {
                    hits.downloads.fetch_add(1, Ordering::SeqCst);
                    let disposition = ds
                        .filename
                        .as_ref()
                        .map(|f| format!("Content-Disposition: attachment; filename=\"{}\"", f));
                    let headers: Vec<&str> = disposition.iter().map(|s| s.as_str()).collect();
                    if opts.truncate_blobs {
                        respond_truncated(&mut stream, &headers, &ds.body);
                    } else {
                        respond(&mut stream, "200 OK", &headers, &ds.body);
                    }
                }
                None => respond(&mut stream, "404 Not Found", &[], b""),
            }
        }
        _ => respond(&mut stream, "404 Not Found", &[], b""),
    }
}

fn respond(stream: &mut TcpStream, status: &str, headers: &[&str], body: &[u8]) {
    let mut head = format!(
        "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n",
        status,
        body.len()
    );
    for h in headers {
        head.push_str(h);
        head.push_str("\r\n");
    }
    head.push_str("\r\n");
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(body);
    let _ = stream.flush();
}

fn respond_truncated(stream: &mut TcpStream, headers: &[&str], body: &[u8]) {
    let mut head = format!(
        "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n",
        body.len()
    );
    for h in headers {
        head.push_str(h);
        head.push_str("\r\n");
    }
    head.push_str("\r\n");
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(&body[..body.len() / 2]);
    let _ = stream.flush();
}

/// Returns (method, request target, Authorization header).
fn parse_request(request: &str) -> (String, String, Option<String>) {
    let mut lines = request.lines();
    let mut first = lines.next().unwrap_or("").split_whitespace();
    let method = first.next().unwrap_or("").to_string();
    let target = first.next().unwrap_or("/").to_string();
    let mut auth = None;
    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("authorization") {
                auth = Some(value.trim().to_string());
            }
        }
    }
    (method, target, auth)
}

/// Zip archive with the given entries, for use as a served body.
pub fn zip_body(entries: &[(&str, &[u8])]) -> Vec<u8> {
    use std::io::Cursor;
    let mut w = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in entries {
        w.start_file(*name, zip::write::FileOptions::default())
            .unwrap();
        w.write_all(data).unwrap();
    }
    w.finish().unwrap().into_inner()
}
