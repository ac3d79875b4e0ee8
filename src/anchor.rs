//! Text anchors and the single active-anchor cell shared by the page view and
//! the element panel.

/// Marker that turns a text fragment into an anchor
pub const ANCHOR_MARKER: char = '#';

/// How a fragment of page text is rendered
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextFragment {
    /// Interactive region named after the fragment, marker stripped
    Anchor(String),
    PlainText,
}

impl TextFragment {
    /// Classify a text fragment by its leading marker.
    ///
    /// A bare marker with nothing after it is plain text.
    pub fn classify(text: &str) -> Self {
        match text.strip_prefix(ANCHOR_MARKER) {
            Some(name) if !name.is_empty() => Self::Anchor(name.to_string()),
            _ => Self::PlainText,
        }
    }

    pub fn anchor_name(&self) -> Option<&str> {
        match self {
            Self::Anchor(name) => Some(name),
            Self::PlainText => None,
        }
    }
}

/// Hover transitions reported by the views that show anchors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnchorChange {
    Enter(String),
    Leave,
}

/// The one anchor currently hovered or selected, if any.
///
/// Owned by the document view and lent to children by reference; children
/// hand back [`AnchorChange`]s instead of mutating it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveAnchor(Option<String>);

impl ActiveAnchor {
    pub fn get(&self) -> Option<&str> {
        self.0.as_deref()
    }

    pub fn is_active(&self, name: &str) -> bool {
        self.0.as_deref() == Some(name)
    }

    pub fn is_none(&self) -> bool {
        self.0.is_none()
    }

    /// Apply a transition, returning whether the active anchor changed
    pub fn apply(&mut self, change: AnchorChange) -> bool {
        let next = match change {
            AnchorChange::Enter(name) => Some(name),
            AnchorChange::Leave => None,
        };
        if self.0 == next {
            return false;
        }
        log::debug!("Active anchor {:?} -> {:?}", self.0, next);
        self.0 = next;
        true
    }

    pub fn clear(&mut self) -> bool {
        self.apply(AnchorChange::Leave)
    }
}
