//! Render request and response types

use std::sync::Arc;

use super::types::PageText;

/// Unique identifier for background requests
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RequestId(pub u64);

impl RequestId {
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }
}

/// Request sent to the render worker
#[derive(Debug)]
pub enum RenderRequest {
    /// Extract the text layer of a page (1-indexed)
    Page { id: RequestId, page: usize },

    /// Shutdown the worker
    Shutdown,
}

/// Errors from the render worker
#[derive(Debug, thiserror::Error)]
pub enum WorkerFault {
    #[error("PDF engine: {0}")]
    Pdf(#[from] mupdf::error::Error),

    #[error("page {page} is outside 1..={page_count}")]
    PageOutOfRange { page: usize, page_count: usize },

    #[error("{detail}")]
    Generic { detail: String },
}

impl WorkerFault {
    pub fn generic(msg: impl Into<String>) -> Self {
        Self::Generic { detail: msg.into() }
    }
}

/// Response from the render worker
#[derive(Debug)]
pub enum RenderResponse {
    /// Document opened (sent once, before any page)
    DocumentInfo { page_count: usize },

    /// Document could not be opened; the worker has exited
    LoadFailed(WorkerFault),

    /// Extracted page text
    Page {
        id: RequestId,
        page: usize,
        data: Arc<PageText>,
    },

    /// Error while extracting a page
    Error { id: RequestId, error: WorkerFault },
}
