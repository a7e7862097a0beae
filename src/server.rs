//! HTTP front end for the dashboard.
//!
//! Routes:
//! - `GET /?chat_id=<id|All>` renders the dashboard
//! - `POST /refresh` (or `GET /refresh`) drops the cached dataset and
//!   redirects back to `/` with the same selection
//! - `GET /metrics` serves Prometheus metrics

use std::convert::Infallible;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::header::{HeaderValue, CACHE_CONTROL, CONTENT_TYPE, LOCATION};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode, Uri};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};
use url::form_urlencoded;

use crate::analytics::ChatFilter;
use crate::cache::{CacheStatus, TtlCache};
use crate::config::{Config, ViewSettings};
use crate::report::{build_view, html};
use crate::store::{load_dataset, Dataset};
use crate::{metrics, Error};

const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";
const CHAT_PARAM: &str = "chat_id";

/// A rendered page with its HTTP status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub status: StatusCode,
    pub body: String,
}

/// Dashboard state shared by all requests: the dataset cache.
pub struct Dashboard {
    db_path: PathBuf,
    settings: ViewSettings,
    cache: Mutex<TtlCache<Dataset>>,
}

impl Dashboard {
    pub fn new(db_path: PathBuf, cache_ttl: Duration, settings: ViewSettings) -> Self {
        Self {
            db_path,
            settings,
            cache: Mutex::new(TtlCache::new(cache_ttl)),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.db_path.clone(), config.cache_ttl, config.view)
    }

    pub fn db_path(&self) -> &PathBuf {
        &self.db_path
    }

    fn lock_cache(&self) -> MutexGuard<'_, TtlCache<Dataset>> {
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Load, filter, aggregate and render one page.
    ///
    /// The cache lock is held for the whole render, so renders never overlap.
    pub fn render(&self, selection: &ChatFilter) -> Page {
        let start = Instant::now();
        let mut cache = self.lock_cache();

        let dataset = match cache.get_or_try_load(|| load_dataset(&self.db_path)) {
            Ok((dataset, status)) => {
                metrics::record_dataset_load(status.label());
                if status == CacheStatus::Hit {
                    debug!("Serving dataset from cache");
                }
                dataset
            }
            Err(err) => {
                metrics::record_dataset_load("error");
                metrics::record_render("html", start.elapsed(), false);
                warn!(path = %self.db_path.display(), "Failed to load database: {}", err);
                return Page {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    body: html::render_error(&format!("Failed to load database: {}", err)),
                };
            }
        };

        let page = match build_view(&dataset, selection, &self.settings) {
            Ok(view) => Page {
                status: StatusCode::OK,
                body: html::render_dashboard(&view),
            },
            Err(err) => {
                warn!(filter = %selection, "Failed to render dashboard: {}", err);
                Page {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    body: html::render_error(&failure_message(&err)),
                }
            }
        };

        metrics::record_render("html", start.elapsed(), page.status.is_success());
        page
    }

    /// Drop the cached dataset; the next render rereads the database.
    pub fn refresh(&self) {
        self.lock_cache().invalidate();
        metrics::record_cache_invalidation();
        info!("Dataset cache invalidated");
    }

    /// Route one request. Synchronous; call from a blocking context.
    pub fn dispatch(&self, method: &Method, uri: &Uri, body: &[u8]) -> Response<Full<Bytes>> {
        match (method, uri.path()) {
            (&Method::GET, "/") | (&Method::HEAD, "/") => {
                let selection = ChatFilter::parse(query_param(uri, CHAT_PARAM).as_deref());
                let page = self.render(&selection);
                html_response(page.status, page.body)
            }
            (&Method::POST, "/refresh") => {
                let selection = form_param(body, CHAT_PARAM);
                self.refresh();
                redirect_to_dashboard(selection.as_deref())
            }
            (&Method::GET, "/refresh") => {
                let selection = query_param(uri, CHAT_PARAM);
                self.refresh();
                redirect_to_dashboard(selection.as_deref())
            }
            (&Method::GET, "/metrics") => metrics_response(),
            (_, "/") | (_, "/refresh") | (_, "/metrics") => {
                plain_response(StatusCode::METHOD_NOT_ALLOWED, "method not allowed")
            }
            _ => plain_response(StatusCode::NOT_FOUND, "not found"),
        }
    }
}

fn failure_message(err: &Error) -> String {
    if err.is_load_failure() {
        format!("Failed to load database: {}", err)
    } else {
        format!("Failed to render dashboard: {}", err)
    }
}

fn query_param(uri: &Uri, name: &str) -> Option<String> {
    uri.query().and_then(|q| form_param(q.as_bytes(), name))
}

fn form_param(input: &[u8], name: &str) -> Option<String> {
    form_urlencoded::parse(input)
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

/// `/` or `/?chat_id=<selection>` for a concrete chat.
pub fn dashboard_location(selection: Option<&str>) -> String {
    match ChatFilter::parse(selection) {
        ChatFilter::All => "/".to_string(),
        chat => {
            let query = form_urlencoded::Serializer::new(String::new())
                .append_pair(CHAT_PARAM, &chat.to_string())
                .finish();
            format!("/?{}", query)
        }
    }
}

fn with_header(
    mut response: Response<Full<Bytes>>,
    name: hyper::header::HeaderName,
    value: HeaderValue,
) -> Response<Full<Bytes>> {
    response.headers_mut().insert(name, value);
    response
}

fn plain_response(status: StatusCode, body: &'static str) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::from(body));
    *response.status_mut() = status;
    with_header(
        response,
        CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    )
}

fn html_response(status: StatusCode, body: String) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::from(body));
    *response.status_mut() = status;
    let response = with_header(response, CONTENT_TYPE, HeaderValue::from_static(HTML_CONTENT_TYPE));
    with_header(response, CACHE_CONTROL, HeaderValue::from_static("no-store"))
}

fn redirect_to_dashboard(selection: Option<&str>) -> Response<Full<Bytes>> {
    let location = HeaderValue::from_str(&dashboard_location(selection))
        .unwrap_or_else(|_| HeaderValue::from_static("/"));
    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = StatusCode::SEE_OTHER;
    with_header(response, LOCATION, location)
}

fn metrics_response() -> Response<Full<Bytes>> {
    match metrics::encode_metrics() {
        Ok((content_type, buffer)) => {
            let value = HeaderValue::from_str(&content_type)
                .unwrap_or_else(|_| HeaderValue::from_static("text/plain; version=0.0.4"));
            with_header(Response::new(Full::from(buffer)), CONTENT_TYPE, value)
        }
        Err(_) => plain_response(StatusCode::INTERNAL_SERVER_ERROR, "encode error"),
    }
}

async fn handle_request(
    req: Request<Incoming>,
    dashboard: Arc<Dashboard>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let (parts, body) = req.into_parts();
    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(err) => {
            warn!("Failed to read request body: {}", err);
            return Ok(plain_response(StatusCode::BAD_REQUEST, "unreadable body"));
        }
    };

    debug!(method = %parts.method, uri = %parts.uri, "Handling request");
    let result = tokio::task::spawn_blocking(move || {
        dashboard.dispatch(&parts.method, &parts.uri, &body)
    })
    .await;

    Ok(result.unwrap_or_else(|err| {
        error!("Render task failed: {}", err);
        plain_response(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
    }))
}

/// Accept connections until the listener fails.
pub async fn serve(addr: SocketAddr, dashboard: Arc<Dashboard>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    serve_listener(listener, dashboard).await
}

pub async fn serve_listener(listener: TcpListener, dashboard: Arc<Dashboard>) -> anyhow::Result<()> {
    let addr = listener.local_addr()?;
    info!(%addr, db = %dashboard.db_path().display(), "Dashboard server started");

    loop {
        let (stream, peer) = listener.accept().await?;
        let io = TokioIo::new(stream);
        let dashboard = Arc::clone(&dashboard);
        let service = service_fn(move |req| handle_request(req, Arc::clone(&dashboard)));

        tokio::spawn(async move {
            if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                warn!(?peer, "Dashboard connection error: {}", err);
            }
        });
    }
}
