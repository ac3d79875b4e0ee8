//! `/api/documents` request handling, independent of the HTTP transport

use rand::Rng;
use serde::Serialize;

use crate::mock_data::MockCatalog;

pub const JSON: &str = "application/json";
pub const TEXT: &str = "text/plain; charset=utf-8";
pub const PDF: &str = "application/pdf";

/// A response ready to be written to the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type: TEXT,
            body: body.into().into_bytes(),
        }
    }

    pub fn json<T: Serialize>(status: u16, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(body) => Self {
                status,
                content_type: JSON,
                body,
            },
            Err(e) => {
                log::error!("Failed to serialize response: {e}");
                Self::text(500, "Internal server error")
            }
        }
    }

    pub fn body_str(&self) -> &str {
        std::str::from_utf8(&self.body).unwrap_or("")
    }
}

/// Where a request path leads
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route<'a> {
    Documents,
    MockFile(&'a str),
    NotFound,
}

/// Split a request target into route and raw query string
pub fn route(target: &str) -> (Route<'_>, &str) {
    let (path, query) = target.split_once('?').unwrap_or((target, ""));
    let route = match path.trim_end_matches('/') {
        "/api/documents" => Route::Documents,
        other => match other.strip_prefix("/mock-documents/") {
            Some(name) if is_plain_file_name(name) => Route::MockFile(name),
            _ => Route::NotFound,
        },
    };
    (route, query)
}

fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(['/', '\\']) && name != "." && name != ".."
}

/// All values given for `id` in a query string
pub fn query_ids(query: &str) -> Vec<String> {
    url::form_urlencoded::parse(query.as_bytes())
        .filter(|(key, _)| key == "id")
        .map(|(_, value)| value.into_owned())
        .collect()
}

/// Serves the document catalog from mock data
#[derive(Debug, Clone, Default)]
pub struct DocumentsHandler {
    catalog: MockCatalog,
}

impl DocumentsHandler {
    pub fn new(catalog: MockCatalog) -> Self {
        Self { catalog }
    }

    /// Answer `/api/documents`.
    ///
    /// Only GET is allowed. A single non-empty `id` returns that document, a
    /// repeated `id` is rejected with 404, and no `id` returns the listing.
    /// Every branch produces exactly one response.
    pub fn handle<R: Rng + ?Sized>(&self, method: &str, query: &str, rng: &mut R) -> ApiResponse {
        if method != "GET" {
            return ApiResponse::text(405, format!("Method {method} not allowed"));
        }

        let ids = query_ids(query);
        match ids.as_slice() {
            [] => ApiResponse::json(200, &self.catalog.listing(rng)),
            [id] if id.is_empty() => ApiResponse::json(200, &self.catalog.listing(rng)),
            [id] => ApiResponse::json(200, &self.catalog.document(rng, id)),
            many => ApiResponse::text(404, format!("User of id {} not found", many.join(","))),
        }
    }
}
