pub mod anchor;
pub mod api;
pub mod document;
pub mod error;
pub mod event_source;
pub mod fetch;
pub mod main_app;
pub mod mock_data;
pub mod panic_handler;
pub mod pdf;
pub mod settings;
pub mod theme;
pub mod widget;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// Re-export main app components
pub use main_app::{App, AppAction, FocusedPanel, run_app_with_event_source};
