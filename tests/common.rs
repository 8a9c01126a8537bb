//! Shared test helpers.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use github520::app::App;
use github520::config::Settings;
use github520::fetch::{HttpGet, HttpResponse};
use github520::platform::{Platform, PlatformKind};
use github520::{Error, Result};
use tempfile::TempDir;

/// Create a temp directory to hold a fake hosts file and its backups.
/// Uses current dir (workspace) so sandbox allows full access.
pub fn temp_hosts_dir() -> TempDir {
    tempfile::Builder::new()
        .prefix("github520_test_")
        .tempdir_in(std::env::current_dir().unwrap_or_else(|_| Path::new(".").into()))
        .expect("temp dir")
}

/// Write `content` as `hosts` inside `dir` and return its path.
pub fn write_hosts(dir: &Path, content: &str) -> PathBuf {
    let path = dir.join("hosts");
    std::fs::write(&path, content).unwrap();
    path
}

/// Canned responses keyed by URL; unknown URLs fail like a dead network.
#[derive(Default, Clone)]
pub struct MockClient {
    responses: Arc<Mutex<HashMap<String, std::result::Result<HttpResponse, String>>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ok(self, url: &str, body: &str) -> Self {
        self.respond(url, 200, body)
    }

    pub fn respond(self, url: &str, status: u16, body: &str) -> Self {
        self.responses.lock().unwrap().insert(
            url.to_string(),
            Ok(HttpResponse {
                status,
                body: body.to_string(),
            }),
        );
        self
    }

    pub fn fail(self, url: &str, reason: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert(url.to_string(), Err(reason.to_string()));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl HttpGet for MockClient {
    fn get(&self, url: &str, _timeout: Duration) -> Result<HttpResponse> {
        self.calls.lock().unwrap().push(url.to_string());
        match self.responses.lock().unwrap().get(url) {
            Some(Ok(res)) => Ok(res.clone()),
            Some(Err(reason)) => Err(Error::network(url, reason)),
            None => Err(Error::network(url, "timed out after 5s")),
        }
    }
}

/// Platform stand-in that records calls instead of touching the OS.
#[derive(Clone)]
pub struct MockPlatform {
    pub elevated: Arc<AtomicBool>,
    pub flushes: Arc<AtomicUsize>,
    pub flush_fails: Arc<AtomicBool>,
    pub edits: Arc<Mutex<Vec<PathBuf>>>,
    pub opened: Arc<Mutex<Vec<PathBuf>>>,
    pub kind: PlatformKind,
    pub elevate_result: Arc<Mutex<Option<String>>>,
}

impl MockPlatform {
    pub fn new() -> Self {
        Self {
            elevated: Arc::new(AtomicBool::new(true)),
            flushes: Arc::new(AtomicUsize::new(0)),
            flush_fails: Arc::new(AtomicBool::new(false)),
            edits: Arc::new(Mutex::new(Vec::new())),
            opened: Arc::new(Mutex::new(Vec::new())),
            kind: PlatformKind::Unix,
            elevate_result: Arc::new(Mutex::new(None)),
        }
    }

    pub fn unprivileged(self) -> Self {
        self.elevated.store(false, Ordering::SeqCst);
        self
    }

    pub fn flush_count(&self) -> usize {
        self.flushes.load(Ordering::SeqCst)
    }
}

impl Platform for MockPlatform {
    fn kind(&self) -> PlatformKind {
        self.kind
    }

    fn has_elevated_rights(&self) -> bool {
        self.elevated.load(Ordering::SeqCst)
    }

    fn elevate(&self) -> Result<()> {
        match self.elevate_result.lock().unwrap().clone() {
            None => Ok(()),
            Some(reason) => Err(Error::Privilege(reason)),
        }
    }

    fn flush_dns(&self) -> Result<()> {
        self.flushes.fetch_add(1, Ordering::SeqCst);
        if self.flush_fails.load(Ordering::SeqCst) {
            return Err(Error::subprocess("flush", "exited with 1"));
        }
        Ok(())
    }

    fn open_editor(&self, path: &Path) -> Result<()> {
        self.edits.lock().unwrap().push(path.to_path_buf());
        Ok(())
    }

    fn open_directory(&self, dir: &Path) -> Result<()> {
        self.opened.lock().unwrap().push(dir.to_path_buf());
        Ok(())
    }
}

pub const SOURCE: &str = "https://hosts.test/hosts";

/// App over a temp hosts file with one mock source.
pub fn test_app(hosts: &Path, client: MockClient, platform: MockPlatform) -> App {
    let settings = Settings::for_test(hosts).with_sources(vec![SOURCE.to_string()]);
    App::new(settings, Box::new(platform), Box::new(client))
}

/// Backup files next to `hosts`.
pub fn backup_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            let name = p.file_name().unwrap().to_string_lossy();
            name.starts_with("hosts.") && name.ends_with(".bak")
        })
        .collect();
    files.sort();
    files
}

/// Canned reply for one path on the local test server.
pub struct Route {
    pub path: &'static str,
    pub status: u16,
    pub location: Option<&'static str>,
    pub body: &'static str,
}

impl Route {
    pub fn ok(path: &'static str, body: &'static str) -> Self {
        Self {
            path,
            status: 200,
            location: None,
            body,
        }
    }

    pub fn redirect(path: &'static str, status: u16, location: &'static str) -> Self {
        Self {
            path,
            status,
            location: Some(location),
            body: "",
        }
    }
}

/// Serve `routes` over plain HTTP/1.1 on a loopback port, one request per
/// connection. Unknown paths get a 404. Returns the base URL.
pub fn serve_http(routes: Vec<Route>) -> String {
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;

    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    std::thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { continue };
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut request_line = String::new();
            if reader.read_line(&mut request_line).is_err() {
                continue;
            }
            // drain headers
            let mut line = String::new();
            while reader.read_line(&mut line).map(|n| n > 2).unwrap_or(false) {
                line.clear();
            }
            let path = request_line.split_whitespace().nth(1).unwrap_or("/");
            let reply = match routes.iter().find(|r| r.path == path) {
                Some(route) => {
                    let location = route
                        .location
                        .map(|l| format!("Location: {l}\r\n"))
                        .unwrap_or_default();
                    format!(
                        "HTTP/1.1 {} X\r\n{location}Content-Length: {}\r\nConnection: close\r\n\r\n{}",
                        route.status,
                        route.body.len(),
                        route.body
                    )
                }
                None => "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
                    .to_string(),
            };
            let _ = stream.write_all(reply.as_bytes());
        }
    });
    format!("http://{addr}")
}
