//! PDF page rendering infrastructure

mod cache;
mod request;
mod service;
mod state;
mod types;
mod worker;

pub use cache::PageCache;
pub use request::{RenderRequest, RenderResponse, RequestId, WorkerFault};
pub use service::{PageStatus, RenderService};
pub use state::{Command, Effect, RenderState, has_pagination};
pub use types::*;
pub use worker::{MupdfSource, PageSource, SourceFactory, mupdf_factory, render_worker};

/// Pages kept in memory per open document
pub const DEFAULT_CACHE_SIZE: usize = 16;
