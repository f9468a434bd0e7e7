//! Static file serving module
//!
//! Maps request paths to files under the configured root directory and falls
//! back to a single default file for unmatched paths, so client-side-routed
//! single-page applications can handle unknown URLs.

use crate::handler::router::RequestContext;
use crate::http::{self, mime};
use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use std::path::Path;
use tokio::fs;

/// Serve the file at the request path, or the fallback file when the path
/// does not resolve to an existing file
pub async fn serve_path(
    ctx: &RequestContext<'_>,
    root_dir: &str,
    fallback_file: &str,
) -> Response<Full<Bytes>> {
    if let Some((content, content_type)) = load_from_root(root_dir, ctx.path).await {
        return http::build_file_response(content, content_type, ctx.is_head);
    }

    match load_fallback(root_dir, fallback_file).await {
        Some((content, content_type)) => {
            http::build_file_response(content, content_type, ctx.is_head)
        }
        None => {
            logger::log_warning(&format!(
                "Fallback file '{fallback_file}' not found under '{root_dir}'"
            ));
            http::build_404_response()
        }
    }
}

/// Load a file by request path, resolved against the root directory
///
/// Returns None for empty paths, directories, missing files, and paths that
/// escape the root after canonicalization.
pub async fn load_from_root(root_dir: &str, path: &str) -> Option<(Vec<u8>, &'static str)> {
    let clean_path = path.trim_start_matches('/');
    if clean_path.is_empty() {
        return None;
    }

    // Reject parent-dir components outright; filenames merely containing
    // dots (e.g. "notes..txt") stay untouched
    if Path::new(clean_path)
        .components()
        .any(|c| matches!(c, std::path::Component::ParentDir))
    {
        logger::log_warning(&format!("Path traversal attempt blocked: {path}"));
        return None;
    }

    let file_path = Path::new(root_dir).join(clean_path);

    let root_canonical = match Path::new(root_dir).canonicalize() {
        Ok(p) => p,
        Err(e) => {
            logger::log_warning(&format!(
                "Static root not found or inaccessible '{root_dir}': {e}"
            ));
            return None;
        }
    };

    // Missing files are common (fallback case), no need to log
    let Ok(file_path_canonical) = file_path.canonicalize() else {
        return None;
    };
    if !file_path_canonical.starts_with(&root_canonical) {
        logger::log_warning(&format!(
            "Path traversal attempt blocked: {} -> {}",
            path,
            file_path_canonical.display()
        ));
        return None;
    }

    if !file_path_canonical.is_file() {
        return None;
    }

    let content = match fs::read(&file_path_canonical).await {
        Ok(c) => c,
        Err(e) => {
            logger::log_error(&format!(
                "Failed to read file '{}': {}",
                file_path_canonical.display(),
                e
            ));
            return None;
        }
    };

    let content_type =
        mime::get_content_type(file_path_canonical.extension().and_then(|e| e.to_str()));

    Some((content, content_type))
}

/// Load the fallback file from the root directory
pub async fn load_fallback(root_dir: &str, fallback_file: &str) -> Option<(Vec<u8>, &'static str)> {
    let path = Path::new(root_dir).join(fallback_file);
    let content = fs::read(&path).await.ok()?;
    let content_type = mime::get_content_type(path.extension().and_then(|e| e.to_str()));
    Some((content, content_type))
}
