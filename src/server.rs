//! Local HTTP server to preview a generated site.
use std::convert::Infallible;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{ALLOW, CONTENT_TYPE};
use hyper::{Method, Request, Response, StatusCode};
use log::{debug, warn};

use crate::bucket::content_type_for;

const INDEX_FILE: &str = "index.html";

/// Map a percent-encoded request path onto a file under `root`.  `None` for paths that would leave
/// `root` or that do not decode to UTF-8.
#[must_use]
pub fn resolve_path(root: &Path, request_path: &str) -> Option<PathBuf> {
    let decoded = urlencoding::decode(request_path).ok()?;
    let relative = Path::new(decoded.trim_start_matches('/'));
    let mut path = root.to_path_buf();
    for component in relative.components() {
        match component {
            Component::Normal(segment) => path.push(segment),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    if decoded.ends_with('/') || path.is_dir() {
        path.push(INDEX_FILE);
    }
    Some(path)
}

fn status_response(status: StatusCode) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from(
        status.canonical_reason().unwrap_or_default(),
    )));
    *response.status_mut() = status;
    response
}

/// Serve one request for a static file under `root`.
///
/// # Errors
/// Never fails; missing files are answered with `404 Not Found`.
pub async fn handle_request<B>(
    req: Request<B>,
    root: Arc<PathBuf>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    debug!("(handle_request) {} {}", req.method(), req.uri().path());

    if req.method() != Method::GET && req.method() != Method::HEAD {
        let mut response = status_response(StatusCode::METHOD_NOT_ALLOWED);
        response
            .headers_mut()
            .insert(ALLOW, hyper::header::HeaderValue::from_static("GET, HEAD"));
        return Ok(response);
    }

    let Some(path) = resolve_path(&root, req.uri().path()) else {
        warn!("(handle_request) Rejecting path {}", req.uri().path());
        return Ok(status_response(StatusCode::NOT_FOUND));
    };

    match tokio::fs::read(&path).await {
        Ok(content) => {
            let body = if req.method() == Method::HEAD {
                Bytes::new()
            } else {
                Bytes::from(content)
            };
            let mut response = Response::new(Full::new(body));
            response.headers_mut().insert(
                CONTENT_TYPE,
                hyper::header::HeaderValue::from_static(content_type_for(&path)),
            );
            Ok(response)
        }
        Err(e) => {
            debug!("(handle_request) {} not served: {e}", path.display());
            Ok(status_response(StatusCode::NOT_FOUND))
        }
    }
}
