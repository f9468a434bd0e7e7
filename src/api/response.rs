// API response utility functions module

use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use serde::Serialize;

/// Build JSON response
pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<Full<Bytes>> {
    let json = match serde_json::to_string(body) {
        Ok(j) => j,
        Err(e) => {
            logger::log_error(&format!("Failed to serialize response: {e}"));
            return server_error();
        }
    };

    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from(json)))
        .unwrap_or_else(|e| {
            logger::log_error(&format!("Failed to build response: {e}"));
            Response::new(Full::new(Bytes::from("Error")))
        })
}

/// 404 Not Found response
pub fn not_found() -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::NOT_FOUND)
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from(
            r#"{"error":"Not Found","available_endpoints":["/api/dados"]}"#,
        )))
        .unwrap_or_else(|_| Response::new(Full::new(Bytes::from("Not Found"))))
}

/// 400 Bad Request response
pub fn bad_request(message: &str) -> Response<Full<Bytes>> {
    let body = serde_json::json!({
        "error": {
            "code": 400,
            "message": message
        }
    });
    Response::builder()
        .status(StatusCode::BAD_REQUEST)
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from(body.to_string())))
        .unwrap_or_else(|_| Response::new(Full::new(Bytes::from("Bad Request"))))
}

/// 405 Method Not Allowed response
pub fn method_not_allowed() -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::METHOD_NOT_ALLOWED)
        .header("Content-Type", "application/json")
        .header("Allow", "GET, POST, OPTIONS")
        .body(Full::new(Bytes::from(r#"{"error":"Method Not Allowed"}"#)))
        .unwrap_or_else(|_| Response::new(Full::new(Bytes::from("Method Not Allowed"))))
}

/// 500 Internal Server Error response
pub fn server_error() -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::INTERNAL_SERVER_ERROR)
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from(
            r#"{"error":"Internal server error"}"#,
        )))
        .unwrap_or_else(|_| Response::new(Full::new(Bytes::from("Error"))))
}
