//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: method validation, body size
//! limits, API-vs-static dispatch, and access logging.

use crate::api;
use crate::config::AppState;
use crate::handler::static_files;
use crate::http;
use crate::logger::{self, AccessLogEntry};
use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::{Method, Request, Response};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

/// Request context encapsulating information needed for request processing
pub struct RequestContext<'a> {
    pub path: &'a str,
    pub is_head: bool,
}

/// Main entry point for HTTP request handling
///
/// Generic over the body type so tests can drive the dispatch with prebuilt
/// bodies instead of live connections.
pub async fn handle_request<B: Body>(
    req: Request<B>,
    state: Arc<AppState>,
    remote_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let entry = state
        .config
        .logging
        .access_log
        .then(|| new_access_entry(&req, remote_addr));

    let response = dispatch(req, &state).await;

    if let Some(mut entry) = entry {
        entry.status = response.status().as_u16();
        entry.body_bytes = response_body_bytes(&response);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

async fn dispatch<B: Body>(req: Request<B>, state: &Arc<AppState>) -> Response<Full<Bytes>> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    if method == Method::OPTIONS {
        return http::build_options_response(state.config.http.enable_cors);
    }

    if let Some(resp) = check_body_size(&req, state.config.http.max_body_size) {
        return resp;
    }

    // API endpoints handle their own method validation
    if path == "/api" || path.starts_with("/api/") {
        return api::handle_api_request(req, Arc::clone(state)).await;
    }

    // Everything else is the static responder: GET and HEAD only
    match method {
        Method::GET | Method::HEAD => {
            let ctx = RequestContext {
                path: &path,
                is_head: method == Method::HEAD,
            };
            static_files::serve_path(
                &ctx,
                &state.config.static_files.root_dir,
                &state.config.static_files.fallback_file,
            )
            .await
        }
        _ => {
            logger::log_warning(&format!("Method not allowed: {method} {path}"));
            http::build_405_response("GET, HEAD, OPTIONS")
        }
    }
}

/// Validate Content-Length header and return 413 if exceeded
fn check_body_size<B>(req: &Request<B>, max_body_size: u64) -> Option<Response<Full<Bytes>>> {
    let content_length = req.headers().get("content-length")?;
    content_length.to_str().map_or_else(
        |_| {
            logger::log_warning("Content-Length header contains non-ASCII characters");
            None
        },
        |size_str| match size_str.parse::<u64>() {
            Ok(size) if size > max_body_size => {
                logger::log_error(&format!(
                    "Request body too large: {size} bytes (max: {max_body_size})"
                ));
                Some(http::build_413_response())
            }
            Err(_) => {
                logger::log_warning(&format!(
                    "Invalid Content-Length value: '{size_str}', skipping size check"
                ));
                None
            }
            _ => None,
        },
    )
}

fn new_access_entry<B>(req: &Request<B>, remote_addr: SocketAddr) -> AccessLogEntry {
    let mut entry = AccessLogEntry::new(
        remote_addr.ip().to_string(),
        req.method().to_string(),
        req.uri().path().to_string(),
    );
    entry.query = req.uri().query().map(ToString::to_string);
    entry.referer = header_string(req, "referer");
    entry.user_agent = header_string(req, "user-agent");
    entry
}

fn header_string<B>(req: &Request<B>, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

/// Response body size in bytes
fn response_body_bytes(response: &Response<Full<Bytes>>) -> usize {
    usize::try_from(response.body().size_hint().exact().unwrap_or(0)).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        Config, HttpConfig, LoggingConfig, PerformanceConfig, ServerConfig, StaticFilesConfig,
        StorageConfig,
    };
    use crate::storage::DocumentStore;
    use hyper::StatusCode;
    use std::path::Path;

    fn test_state(dir: &Path, max_body_size: u64) -> Arc<AppState> {
        let config = Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                workers: None,
            },
            storage: StorageConfig {
                data_file: dir
                    .join("data")
                    .join("controleDados.json")
                    .to_string_lossy()
                    .into_owned(),
            },
            static_files: StaticFilesConfig {
                root_dir: dir.to_string_lossy().into_owned(),
                fallback_file: "index.html".to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                access_log: false,
                access_log_format: "common".to_string(),
                access_log_file: None,
                error_log_file: None,
            },
            performance: PerformanceConfig {
                keep_alive_timeout: 75,
                read_timeout: 30,
                write_timeout: 30,
                max_connections: None,
            },
            http: HttpConfig {
                enable_cors: false,
                max_body_size,
            },
        };
        let store = Arc::new(DocumentStore::new(&config.storage.data_file));
        Arc::new(AppState::new(config, store))
    }

    fn request(method: Method, path: &str, body: &str) -> Request<Full<Bytes>> {
        Request::builder()
            .method(method)
            .uri(path)
            .body(Full::new(Bytes::from(body.to_string())))
            .unwrap()
    }

    #[tokio::test]
    async fn test_oversized_body_is_rejected_with_413() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path(), 64);

        let mut req = request(Method::POST, "/api/dados", "{}");
        req.headers_mut()
            .insert("content-length", "65".parse().unwrap());

        let resp = dispatch(req, &state).await;
        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);

        // A body within the limit passes the check
        let mut req = request(Method::POST, "/api/dados", "{}");
        req.headers_mut()
            .insert("content-length", "2".parse().unwrap());
        let resp = dispatch(req, &state).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_non_get_on_static_path_is_405() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path(), 10_485_760);

        let resp = dispatch(request(Method::POST, "/pagina.html", "{}"), &state).await;
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(resp.headers()["Allow"], "GET, HEAD, OPTIONS");
    }

    #[tokio::test]
    async fn test_options_answered_before_routing() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path(), 10_485_760);

        let resp = dispatch(request(Method::OPTIONS, "/qualquer", ""), &state).await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_unmatched_path_serves_fallback() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), b"<html>spa</html>").unwrap();
        let state = test_state(dir.path(), 10_485_760);

        let resp = dispatch(request(Method::GET, "/rota/do/cliente", ""), &state).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()["Content-Type"], "text/html; charset=utf-8");
    }
}
