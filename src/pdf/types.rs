//! Core types for the extracted page text layer

use crate::anchor::TextFragment;

/// Bounding box in page points
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FragmentBounds {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

/// One whitespace-delimited run of text on a page
#[derive(Clone, Debug, PartialEq)]
pub struct PageFragment {
    /// Text exactly as it appears on the page
    pub text: String,
    pub kind: TextFragment,
    pub bounds: FragmentBounds,
    /// Index of the text line this fragment was read from
    pub line_id: usize,
}

impl PageFragment {
    pub fn new(text: impl Into<String>, bounds: FragmentBounds, line_id: usize) -> Self {
        let text = text.into();
        let kind = TextFragment::classify(&text);
        Self {
            text,
            kind,
            bounds,
            line_id,
        }
    }

    /// Text shown on screen: anchors lose their marker
    pub fn display_text(&self) -> &str {
        self.kind.anchor_name().unwrap_or(&self.text)
    }
}

/// Text layer of a single rendered page
#[derive(Clone, Debug, PartialEq)]
pub struct PageText {
    /// Page number (1-indexed)
    pub page_num: usize,
    /// Page width in points
    pub width: f32,
    /// Page height in points
    pub height: f32,
    pub fragments: Vec<PageFragment>,
}

impl PageText {
    pub fn anchors(&self) -> impl Iterator<Item = &str> {
        self.fragments.iter().filter_map(|f| f.kind.anchor_name())
    }

    /// Build a page from plain lines, one fragment per word.
    ///
    /// Lines are laid out top to bottom with a fixed advance per character,
    /// which is what MuPDF reports for a monospaced page.
    pub fn from_lines(page_num: usize, lines: &[&str]) -> Self {
        const CHAR_WIDTH: f32 = 6.0;
        const LINE_HEIGHT: f32 = 12.0;

        let mut fragments = Vec::new();
        let mut width: f32 = 0.0;
        for (line_id, line) in lines.iter().enumerate() {
            let y0 = line_id as f32 * LINE_HEIGHT;
            for (start, word) in split_words(line) {
                let x0 = start as f32 * CHAR_WIDTH;
                let x1 = x0 + word.chars().count() as f32 * CHAR_WIDTH;
                width = width.max(x1);
                fragments.push(PageFragment::new(
                    word,
                    FragmentBounds {
                        x0,
                        y0,
                        x1,
                        y1: y0 + LINE_HEIGHT,
                    },
                    line_id,
                ));
            }
        }

        Self {
            page_num,
            width: width.max(CHAR_WIDTH),
            height: (lines.len().max(1) as f32) * LINE_HEIGHT,
            fragments,
        }
    }
}

/// Split a line into words with their starting character column
pub(crate) fn split_words(line: &str) -> Vec<(usize, &str)> {
    let mut words = Vec::new();
    let mut start: Option<(usize, usize)> = None;

    for (col, (byte_idx, ch)) in line.char_indices().enumerate() {
        match (ch.is_whitespace(), start) {
            (false, None) => start = Some((col, byte_idx)),
            (true, Some((word_col, word_byte))) => {
                words.push((word_col, &line[word_byte..byte_idx]));
                start = None;
            }
            _ => {}
        }
    }
    if let Some((word_col, word_byte)) = start {
        words.push((word_col, &line[word_byte..]));
    }

    words
}
