//! PDF render worker - runs in a separate thread

use std::sync::Arc;

use flume::{Receiver, Sender};
use mupdf::text_page::TextBlockType;
use mupdf::{Document, TextPageFlags};

use super::request::{RenderRequest, RenderResponse, WorkerFault};
use super::types::{FragmentBounds, PageFragment, PageText};

/// A paged document whose text layer can be extracted.
///
/// Implementations live entirely on the worker thread, so they need not be
/// `Send` (MuPDF documents are not).
pub trait PageSource {
    fn page_count(&self) -> usize;

    /// Extract the text layer of a page (1-indexed)
    fn extract_page(&self, page: usize) -> Result<PageText, WorkerFault>;
}

/// Opens a [`PageSource`] from raw file bytes on the worker thread
pub type SourceFactory =
    Arc<dyn Fn(Arc<[u8]>) -> Result<Box<dyn PageSource>, WorkerFault> + Send + Sync>;

/// Factory backed by MuPDF
pub fn mupdf_factory() -> SourceFactory {
    Arc::new(|bytes: Arc<[u8]>| {
        MupdfSource::from_bytes(&bytes).map(|source| Box::new(source) as Box<dyn PageSource>)
    })
}

pub struct MupdfSource {
    doc: Document,
    page_count: usize,
}

impl MupdfSource {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, WorkerFault> {
        let doc = Document::from_bytes(bytes, "application/pdf")?;
        let page_count = usize::try_from(doc.page_count()?).unwrap_or(0);
        Ok(Self { doc, page_count })
    }
}

impl PageSource for MupdfSource {
    fn page_count(&self) -> usize {
        self.page_count
    }

    fn extract_page(&self, page_num: usize) -> Result<PageText, WorkerFault> {
        if page_num == 0 || page_num > self.page_count {
            return Err(WorkerFault::PageOutOfRange {
                page: page_num,
                page_count: self.page_count,
            });
        }

        let page = self.doc.load_page((page_num - 1) as i32)?;
        let bounds = page.bounds()?;
        let text_page = page.to_text_page(TextPageFlags::empty())?;

        let mut fragments = Vec::new();
        let mut line_id = 0usize;
        for block in text_page.blocks() {
            if block.r#type() != TextBlockType::Text {
                continue;
            }
            for line in block.lines() {
                let bbox = line.bounds();
                let chars: Vec<(f32, char)> = line
                    .chars()
                    .filter_map(|ch| ch.char().map(|c| (ch.origin().x - bounds.x0, c)))
                    .collect();
                fragments.extend(line_fragments(
                    &chars,
                    bbox.x1 - bounds.x0,
                    (bbox.y0 - bounds.y0, bbox.y1 - bounds.y0),
                    line_id,
                ));
                line_id += 1;
            }
        }

        Ok(PageText {
            page_num,
            width: bounds.x1 - bounds.x0,
            height: bounds.y1 - bounds.y0,
            fragments,
        })
    }
}

/// Split a positioned text line into word fragments.
///
/// A word ends where the next whitespace character starts, or at `line_end`
/// for the last word on the line.
pub(crate) fn line_fragments(
    chars: &[(f32, char)],
    line_end: f32,
    (y0, y1): (f32, f32),
    line_id: usize,
) -> Vec<PageFragment> {
    let mut fragments = Vec::new();
    let mut word = String::new();
    let mut word_x0 = 0.0;

    for &(x, c) in chars {
        if c.is_whitespace() {
            if !word.is_empty() {
                let bounds = FragmentBounds { x0: word_x0, y0, x1: x, y1 };
                fragments.push(PageFragment::new(std::mem::take(&mut word), bounds, line_id));
            }
            continue;
        }
        if word.is_empty() {
            word_x0 = x;
        }
        word.push(c);
    }

    if !word.is_empty() {
        let bounds = FragmentBounds {
            x0: word_x0,
            y0,
            x1: line_end.max(word_x0),
            y1,
        };
        fragments.push(PageFragment::new(word, bounds, line_id));
    }

    fragments
}

/// Main worker function - runs in a dedicated thread
#[expect(
    clippy::needless_pass_by_value,
    reason = "Values moved into thread, need ownership"
)]
pub fn render_worker(
    bytes: Arc<[u8]>,
    factory: SourceFactory,
    requests: Receiver<RenderRequest>,
    responses: Sender<RenderResponse>,
) {
    let source = match factory(bytes) {
        Ok(source) => source,
        Err(e) => {
            log::error!("Failed to open document: {e}");
            let _ = responses.send(RenderResponse::LoadFailed(e));
            return;
        }
    };

    let page_count = source.page_count();
    log::debug!("Render worker opened document with {page_count} pages");
    let _ = responses.send(RenderResponse::DocumentInfo { page_count });

    for request in requests {
        match request {
            RenderRequest::Page { id, page } => {
                let response = match source.extract_page(page) {
                    Ok(data) => RenderResponse::Page {
                        id,
                        page,
                        data: Arc::new(data),
                    },
                    Err(error) => {
                        log::warn!("Failed to extract page {page}: {error}");
                        RenderResponse::Error { id, error }
                    }
                };
                if responses.send(response).is_err() {
                    break;
                }
            }

            RenderRequest::Shutdown => break,
        }
    }
}
