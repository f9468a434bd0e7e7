// API module entry
// Read/write endpoints for the persisted JSON document

mod handlers;
mod response;

use http_body_util::{BodyExt, Full};
use hyper::body::{Body, Bytes};
use hyper::{Method, Request, Response};
use std::sync::Arc;

use crate::config::AppState;
use crate::logger;

/// API route handler
///
/// Dispatches to handler functions based on request path and method. Generic
/// over the body type so tests can drive it with prebuilt bodies.
pub async fn handle_api_request<B: Body>(
    req: Request<B>,
    state: Arc<AppState>,
) -> Response<Full<Bytes>> {
    let path = req.uri().path().to_string();
    let method = req.method().clone();

    match (method, path.as_str()) {
        (Method::GET, "/api/dados") => handlers::handle_get_document(&state.store).await,
        (Method::POST, "/api/dados") => {
            let body = if let Ok(collected) = req.collect().await {
                collected.to_bytes()
            } else {
                logger::log_api_request("POST", &path, 400);
                return response::bad_request("Failed to read request body");
            };
            handlers::handle_replace_document(&state.store, &body).await
        }
        (_, "/api/dados") => {
            logger::log_api_request(req.method().as_str(), &path, 405);
            response::method_not_allowed()
        }
        // Unknown route
        _ => {
            logger::log_api_request(req.method().as_str(), &path, 404);
            response::not_found()
        }
    }
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
    use serde_json::json;
    use std::path::Path;

    fn test_state(dir: &Path) -> Arc<AppState> {
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
                max_body_size: 10_485_760,
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

    async fn body_json(resp: Response<Full<Bytes>>) -> serde_json::Value {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_post_then_get_through_dispatch() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());

        let req = request(Method::POST, "/api/dados", r#"{"municipios":["A","B"]}"#);
        let resp = handle_api_request(req, Arc::clone(&state)).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await, json!({ "status": "ok" }));

        let req = request(Method::GET, "/api/dados", "");
        let resp = handle_api_request(req, state).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await, json!({ "municipios": ["A", "B"] }));
    }

    #[tokio::test]
    async fn test_wrong_method_on_document_endpoint_is_405() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());

        for method in [Method::DELETE, Method::PUT, Method::PATCH] {
            let req = request(method, "/api/dados", "");
            let resp = handle_api_request(req, Arc::clone(&state)).await;
            assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
            assert_eq!(resp.headers()["Allow"], "GET, POST, OPTIONS");
        }
    }

    #[tokio::test]
    async fn test_unknown_api_path_is_404() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());

        let req = request(Method::GET, "/api/outra-coisa", "");
        let resp = handle_api_request(req, state).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body = body_json(resp).await;
        assert_eq!(body["error"], "Not Found");
    }

    #[tokio::test]
    async fn test_malformed_post_through_dispatch_is_400() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());

        let req = request(Method::POST, "/api/dados", "{ nao e json");
        let resp = handle_api_request(req, state).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
