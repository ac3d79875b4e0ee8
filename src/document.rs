//! Document records exchanged with the catalog API

use serde::{Deserialize, Serialize};

/// A named region or term described by a document.
///
/// The element's `id` doubles as the anchor name used inside the PDF text
/// (`#<id>`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementInfo {
    pub id: String,
    pub name: String,
    pub description: String,
}

/// A catalog entry: a PDF reference plus the elements annotated in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub url: String,
    pub saved: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub elements: Vec<ElementInfo>,
}

impl Document {
    /// Panel title for this document
    pub fn display_title(id: &str) -> &str {
        if id.is_empty() { "Unnamed document" } else { id }
    }
}
