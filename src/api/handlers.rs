// Document endpoint handlers module

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use serde_json::Value;

use super::response::{bad_request, json_response, server_error};
use crate::logger;
use crate::storage::DocumentStore;

/// GET /api/dados - return the current document
///
/// Creates the default document first when the storage file is absent.
pub async fn handle_get_document(store: &DocumentStore) -> Response<Full<Bytes>> {
    match store.read().await {
        Ok(document) => {
            logger::log_api_request("GET", "/api/dados", 200);
            json_response(StatusCode::OK, &document)
        }
        Err(e) => {
            logger::log_error(&e);
            logger::log_api_request("GET", "/api/dados", 500);
            server_error()
        }
    }
}

/// POST /api/dados - replace the document wholesale
///
/// The body is parsed before the storage file is touched: a malformed
/// payload gets a 400 and leaves the stored document intact. There are no
/// partial-patch semantics; the previous contents are discarded entirely.
pub async fn handle_replace_document(store: &DocumentStore, body: &Bytes) -> Response<Full<Bytes>> {
    let document: Value = match serde_json::from_slice(body) {
        Ok(v) => v,
        Err(e) => {
            logger::log_api_request("POST", "/api/dados", 400);
            return bad_request(&format!("Invalid JSON: {e}"));
        }
    };

    if let Err(e) = store.ensure_exists().await {
        logger::log_error(&e);
        logger::log_api_request("POST", "/api/dados", 500);
        return server_error();
    }

    match store.replace(&document).await {
        Ok(()) => {
            logger::log_api_request("POST", "/api/dados", 200);
            json_response(StatusCode::OK, &serde_json::json!({ "status": "ok" }))
        }
        Err(e) => {
            logger::log_error(&e);
            logger::log_api_request("POST", "/api/dados", 500);
            server_error()
        }
    }
}
