//! Render service - owns the worker thread, page cache and page state

use std::collections::HashMap;
use std::sync::Arc;

use flume::{Receiver, Sender};

use super::cache::PageCache;
use super::request::{RenderRequest, RenderResponse, RequestId};
use super::state::{Command, Effect, RenderState};
use super::types::PageText;
use super::worker::{SourceFactory, render_worker};
use super::DEFAULT_CACHE_SIZE;
use crate::error::ViewerError;

/// What the page region should show right now
#[derive(Clone, Debug, PartialEq)]
pub enum PageStatus {
    LoadingDocument,
    LoadingPage,
    Ready(Arc<PageText>),
    Failed(ViewerError),
}

/// Manages PDF page extraction on a worker thread with caching
pub struct RenderService {
    state: RenderState,
    request_tx: Sender<RenderRequest>,
    response_rx: Receiver<RenderResponse>,
    next_request_id: u64,
    pending_requests: HashMap<RequestId, usize>,
    cache: PageCache,
    loaded: bool,
    document_error: Option<ViewerError>,
    page_errors: HashMap<usize, ViewerError>,
}

impl RenderService {
    /// Create a new render service with the default cache size
    #[must_use]
    pub fn new(bytes: Arc<[u8]>, factory: SourceFactory) -> Self {
        Self::with_config(bytes, factory, DEFAULT_CACHE_SIZE)
    }

    #[must_use]
    pub fn with_config(bytes: Arc<[u8]>, factory: SourceFactory, cache_size: usize) -> Self {
        let (request_tx, request_rx) = flume::unbounded();
        let (response_tx, response_rx) = flume::unbounded();

        std::thread::spawn(move || {
            render_worker(bytes, factory, request_rx, response_tx);
        });

        Self {
            state: RenderState::new(),
            request_tx,
            response_rx,
            next_request_id: 1,
            pending_requests: HashMap::new(),
            cache: PageCache::new(cache_size),
            loaded: false,
            document_error: None,
            page_errors: HashMap::new(),
        }
    }

    #[must_use]
    pub fn current_page(&self) -> usize {
        self.state.current_page
    }

    #[must_use]
    pub fn page_count(&self) -> usize {
        self.state.page_count
    }

    /// Apply a command to the render state
    pub fn apply_command(&mut self, cmd: Command) {
        let effects = self.state.apply(cmd);
        self.execute_effects(effects);
    }

    fn execute_effects(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::RenderCurrentPage => self.request_page(self.state.current_page),
            }
        }
    }

    fn request_page(&mut self, page: usize) {
        if self.cache.contains(page) || self.pending_requests.values().any(|&p| p == page) {
            return;
        }
        self.page_errors.remove(&page);

        let id = RequestId::new(self.next_request_id);
        self.next_request_id += 1;
        self.pending_requests.insert(id, page);

        if self
            .request_tx
            .send(RenderRequest::Page { id, page })
            .is_err()
        {
            log::error!("Render worker is gone, cannot request page {page}");
            self.pending_requests.remove(&id);
            self.page_errors.insert(page, ViewerError::PageLoadFailed);
        }
    }

    /// Drain worker responses. Returns true if anything changed.
    pub fn poll_responses(&mut self) -> bool {
        let mut changed = false;
        while let Ok(response) = self.response_rx.try_recv() {
            changed = true;
            match response {
                RenderResponse::DocumentInfo { page_count } => {
                    self.loaded = true;
                    self.apply_command(Command::SetPageCount(page_count));
                }

                RenderResponse::LoadFailed(fault) => {
                    log::error!("Document failed to load: {fault}");
                    self.document_error = Some(ViewerError::DocumentLoadFailed);
                }

                RenderResponse::Page { id, page, data } => {
                    self.pending_requests.remove(&id);
                    self.cache.insert(page, data);
                }

                RenderResponse::Error { id, error } => {
                    let page = self.pending_requests.remove(&id);
                    log::error!("Page {page:?} failed to load: {error}");
                    if let Some(page) = page {
                        self.page_errors.insert(page, ViewerError::PageLoadFailed);
                    }
                }
            }
        }
        changed
    }

    #[must_use]
    pub fn has_pending(&self) -> bool {
        (!self.loaded && self.document_error.is_none()) || !self.pending_requests.is_empty()
    }

    /// Status of the current page
    pub fn status(&mut self) -> PageStatus {
        if let Some(err) = &self.document_error {
            return PageStatus::Failed(err.clone());
        }
        if !self.loaded {
            return PageStatus::LoadingDocument;
        }
        if self.state.page_count == 0 {
            return PageStatus::Failed(ViewerError::NoPageSelected);
        }

        let page = self.state.current_page;
        if let Some(err) = self.page_errors.get(&page) {
            return PageStatus::Failed(err.clone());
        }
        match self.cache.get(page) {
            Some(data) => PageStatus::Ready(data),
            None => PageStatus::LoadingPage,
        }
    }
}

impl Drop for RenderService {
    fn drop(&mut self) {
        let _ = self.request_tx.send(RenderRequest::Shutdown);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::has_pagination;
    use crate::pdf::request::WorkerFault;
    use crate::pdf::worker::PageSource;
    use std::time::{Duration, Instant};

    struct Pages(Vec<PageText>);

    impl PageSource for Pages {
        fn page_count(&self) -> usize {
            self.0.len()
        }

        fn extract_page(&self, page: usize) -> Result<PageText, WorkerFault> {
            page.checked_sub(1)
                .and_then(|idx| self.0.get(idx))
                .cloned()
                .ok_or_else(|| WorkerFault::generic("missing page"))
        }
    }

    fn pages_factory(pages: Vec<PageText>) -> SourceFactory {
        Arc::new(move |_bytes| Ok(Box::new(Pages(pages.clone())) as Box<dyn PageSource>))
    }

    fn wait_until(service: &mut RenderService, mut done: impl FnMut(&mut RenderService) -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            service.poll_responses();
            if done(service) {
                return;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        panic!("render service did not settle");
    }

    fn bytes() -> Arc<[u8]> {
        Arc::from(&b"%PDF-1.4"[..])
    }

    #[test]
    fn loads_first_page_after_document_info() {
        let factory = pages_factory(vec![
            PageText::from_lines(1, &["first #10001"]),
            PageText::from_lines(2, &["second"]),
        ]);
        let mut service = RenderService::new(bytes(), factory);
        assert_eq!(service.status(), PageStatus::LoadingDocument);

        wait_until(&mut service, |s| matches!(s.status(), PageStatus::Ready(_)));
        assert_eq!(service.page_count(), 2);
        assert!(has_pagination(service.page_count()));
        let PageStatus::Ready(page) = service.status() else {
            unreachable!()
        };
        assert_eq!(page.page_num, 1);
    }

    #[test]
    fn navigating_requests_the_new_page() {
        let factory = pages_factory(vec![
            PageText::from_lines(1, &["one"]),
            PageText::from_lines(2, &["two"]),
        ]);
        let mut service = RenderService::new(bytes(), factory);
        wait_until(&mut service, |s| matches!(s.status(), PageStatus::Ready(_)));

        service.apply_command(Command::NextPage);
        assert_eq!(service.current_page(), 2);
        wait_until(&mut service, |s| {
            matches!(s.status(), PageStatus::Ready(ref p) if p.page_num == 2)
        });

        // Going back is served from cache without a round trip
        service.apply_command(Command::PrevPage);
        assert!(matches!(service.status(), PageStatus::Ready(ref p) if p.page_num == 1));
    }

    #[test]
    fn open_failure_reports_document_load_failed() {
        let factory: SourceFactory = Arc::new(|_| Err(WorkerFault::generic("broken")));
        let mut service = RenderService::new(bytes(), factory);
        wait_until(&mut service, |s| !matches!(s.status(), PageStatus::LoadingDocument));
        assert_eq!(
            service.status(),
            PageStatus::Failed(ViewerError::DocumentLoadFailed)
        );
    }

    #[test]
    fn empty_document_reports_no_page_selected() {
        let mut service = RenderService::new(bytes(), pages_factory(vec![]));
        wait_until(&mut service, |s| !matches!(s.status(), PageStatus::LoadingDocument));
        assert_eq!(service.status(), PageStatus::Failed(ViewerError::NoPageSelected));
    }

    #[test]
    fn extraction_failure_reports_page_load_failed() {
        struct Broken;
        impl PageSource for Broken {
            fn page_count(&self) -> usize {
                1
            }
            fn extract_page(&self, _page: usize) -> Result<PageText, WorkerFault> {
                Err(WorkerFault::generic("bad content stream"))
            }
        }

        let factory: SourceFactory = Arc::new(|_| Ok(Box::new(Broken) as Box<dyn PageSource>));
        let mut service = RenderService::new(bytes(), factory);
        wait_until(&mut service, |s| matches!(s.status(), PageStatus::Failed(_)));
        assert_eq!(service.status(), PageStatus::Failed(ViewerError::PageLoadFailed));
    }
}
