//! Errors surfaced inline by the document viewer

/// Failures that replace a region of the document view with a message.
///
/// None of these propagate past the component that shows them and none are
/// retried.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ViewerError {
    #[error("Failed to load the document.")]
    DocumentLoadFailed,

    #[error("Failed to load the page.")]
    PageLoadFailed,

    #[error("No PDF file selected.")]
    NoFileProvided,

    #[error("No page selected.")]
    NoPageSelected,

    #[error("Failed to fetch {what}: {reason}")]
    FetchFailed { what: String, reason: String },
}

impl ViewerError {
    pub fn fetch_failed(what: impl Into<String>, reason: impl ToString) -> Self {
        Self::FetchFailed {
            what: what.into(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_user_facing() {
        assert_eq!(
            ViewerError::NoFileProvided.to_string(),
            "No PDF file selected."
        );
        assert_eq!(
            ViewerError::fetch_failed("document 12", "status 500").to_string(),
            "Failed to fetch document 12: status 500"
        );
    }
}
