//! Mock document catalog API

mod handler;
mod server;

pub use handler::{ApiResponse, DocumentsHandler, Route, query_ids, route};
pub use server::{ApiServer, ServerConfig, ServerHandle};
