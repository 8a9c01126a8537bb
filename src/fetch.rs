//! Fetching replacement hosts content from remote sources.
//!
//! Sources are tried in order and the first non-empty 200 response wins,
//! after following up to a few redirects.
//! Sources ending in `.json` carry a `{ "domain": "ip", ... }` document that is
//! turned into `ip domain` lines.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use http::header::{HOST, LOCATION, USER_AGENT};
use http::{Request, Uri};
use http_body_util::{BodyExt, Empty};
use hyper::body::Bytes;
use hyper_util::rt::TokioIo;
use log::{debug, info, warn};
use rustls::pki_types::ServerName;
use rustls::{ClientConfig, RootCertStore};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;

use crate::error::{Error, Result};

/// The User-Agent header sent with requests.
static AGENT: &str = concat!("github520/", env!("CARGO_PKG_VERSION"));

/// Redirect hops followed before a source counts as failed.
const MAX_REDIRECTS: usize = 5;

/// Status and body of a completed request.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// Blocking GET with a timeout.
pub trait HttpGet {
    fn get(&self, url: &str, timeout: Duration) -> Result<HttpResponse>;
}

/// HTTP/1.1 client over hyper and rustls, driven by its own current-thread runtime.
pub struct HyperClient {
    runtime: tokio::runtime::Runtime,
    tls: Arc<ClientConfig>,
}

impl HyperClient {
    pub fn new() -> anyhow::Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("build tokio runtime")?;
        let mut roots = RootCertStore::empty();
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        let tls = ClientConfig::builder()
            .with_root_certificates(roots)
            .with_no_client_auth();
        Ok(Self {
            runtime,
            tls: Arc::new(tls),
        })
    }

    /// GET `url`, following redirects the way browsers do.
    async fn request(&self, url: &str) -> anyhow::Result<HttpResponse> {
        let mut uri: Uri = url.parse().context("invalid URL")?;
        for _ in 0..=MAX_REDIRECTS {
            let reply = self.request_once(&uri).await?;
            match reply.location {
                Some(location) if is_redirect(reply.status) => {
                    let next = resolve_location(&uri, &location)?;
                    debug!("{uri} redirected ({}) to {next}", reply.status);
                    uri = next;
                }
                _ => {
                    return Ok(HttpResponse {
                        status: reply.status,
                        body: reply.body,
                    })
                }
            }
        }
        anyhow::bail!("more than {MAX_REDIRECTS} redirects")
    }

    async fn request_once(&self, uri: &Uri) -> anyhow::Result<Reply> {
        let https = match uri.scheme_str() {
            Some("https") => true,
            Some("http") => false,
            other => anyhow::bail!("unsupported scheme {other:?}"),
        };
        let host = uri.host().context("URL has no host")?.to_string();
        let port = uri.port_u16().unwrap_or(if https { 443 } else { 80 });
        let path = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");

        let req = Request::builder()
            .uri(path)
            .header(HOST, host.as_str())
            .header(USER_AGENT, AGENT)
            .body(Empty::<Bytes>::new())?;

        info!("connecting to {host}:{port}");
        let tcp = TcpStream::connect((host.as_str(), port))
            .await
            .with_context(|| format!("connect {host}:{port}"))?;

        if https {
            let name = ServerName::try_from(host.clone()).context("invalid TLS server name")?;
            let stream = TlsConnector::from(Arc::clone(&self.tls))
                .connect(name, tcp)
                .await
                .context("TLS handshake")?;
            send(TokioIo::new(stream), req).await
        } else {
            send(TokioIo::new(tcp), req).await
        }
    }
}

/// One response on the wire, before redirects are followed.
struct Reply {
    status: u16,
    location: Option<String>,
    body: String,
}

fn is_redirect(status: u16) -> bool {
    matches!(status, 301 | 302 | 303 | 307 | 308)
}

/// Resolve a `Location` header against the URI that sent it.
fn resolve_location(base: &Uri, location: &str) -> anyhow::Result<Uri> {
    let scheme = base.scheme_str().unwrap_or("http");
    let url = if location.contains("://") {
        location.to_string()
    } else if let Some(rest) = location.strip_prefix("//") {
        format!("{scheme}://{rest}")
    } else {
        let authority = base.authority().context("URL has no host")?;
        if location.starts_with('/') {
            format!("{scheme}://{authority}{location}")
        } else {
            let dir = base.path().rsplit_once('/').map_or("", |(dir, _)| dir);
            format!("{scheme}://{authority}{dir}/{location}")
        }
    };
    url.parse()
        .with_context(|| format!("invalid redirect target {location:?}"))
}

async fn send<T>(io: T, req: Request<Empty<Bytes>>) -> anyhow::Result<Reply>
where
    T: hyper::rt::Read + hyper::rt::Write + Unpin + Send + 'static,
{
    let (mut sender, conn) = hyper::client::conn::http1::handshake(io).await?;
    tokio::spawn(async move {
        if let Err(e) = conn.await {
            debug!("connection closed: {e}");
        }
    });
    let res = sender.send_request(req).await?;
    let status = res.status().as_u16();
    let location = res
        .headers()
        .get(LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    let body = res.into_body().collect().await?.to_bytes();
    debug!("received {} bytes (status {status})", body.len());
    Ok(Reply {
        status,
        location,
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}

impl HttpGet for HyperClient {
    fn get(&self, url: &str, timeout: Duration) -> Result<HttpResponse> {
        self.runtime.block_on(async {
            match tokio::time::timeout(timeout, self.request(url)).await {
                Ok(Ok(res)) => Ok(res),
                Ok(Err(e)) => Err(Error::network(url, format!("{e:#}"))),
                Err(_) => Err(Error::network(
                    url,
                    format!("timed out after {}s", timeout.as_secs()),
                )),
            }
        })
    }
}

/// Whether a source serves the JSON document form.
pub fn is_structured(url: &str) -> bool {
    let path = url.split(&['?', '#'][..]).next().unwrap_or(url);
    path.ends_with(".json")
}

/// Turn `{ "domain": "ip", ... }` into `ip domain` lines, in document order.
pub fn json_to_lines(body: &str) -> std::result::Result<String, String> {
    let doc: serde_json::Value = serde_json::from_str(body).map_err(|e| e.to_string())?;
    let map = doc
        .as_object()
        .ok_or_else(|| "expected a JSON object".to_string())?;
    let mut lines = Vec::with_capacity(map.len());
    for (domain, ip) in map {
        let ip = ip
            .as_str()
            .ok_or_else(|| format!("address for {domain} is not a string"))?;
        lines.push(format!("{ip} {domain}"));
    }
    Ok(lines.join("\n"))
}

/// Walks an ordered list of sources until one yields content.
pub struct ContentFetcher<'a> {
    client: &'a dyn HttpGet,
    timeout: Duration,
}

impl<'a> ContentFetcher<'a> {
    pub fn new(client: &'a dyn HttpGet, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// First non-empty content from `urls`, or `None` once all have failed.
    pub fn fetch(&self, urls: &[String]) -> Option<String> {
        for url in urls {
            match self.fetch_one(url) {
                Ok(content) => {
                    info!("fetched hosts content from {url}");
                    return Some(content);
                }
                Err(e) => warn!("{e}"),
            }
        }
        None
    }

    fn fetch_one(&self, url: &str) -> Result<String> {
        let res = self.client.get(url, self.timeout)?;
        if res.status != 200 {
            return Err(Error::network(url, format!("HTTP status {}", res.status)));
        }
        let content = if is_structured(url) {
            json_to_lines(&res.body).map_err(|e| Error::network(url, format!("malformed JSON: {e}")))?
        } else {
            res.body
        };
        if content.trim().is_empty() {
            return Err(Error::network(url, "empty response"));
        }
        Ok(content)
    }
}
