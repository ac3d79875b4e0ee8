//! Document fetching from the catalog API.
//!
//! Every fetch runs on its own thread and reports back over a channel tagged
//! with a [`RequestId`]. The UI drains the channel once per tick. Responses
//! for requests that were cancelled in the meantime (for example because the
//! user navigated away) are dropped on arrival.

use std::collections::HashMap;
use std::io::Read;
use std::sync::Arc;
use std::time::Duration;

use flume::{Receiver, Sender};
use log::{debug, warn};
use url::Url;

use crate::document::Document;
use crate::error::ViewerError;
use crate::pdf::RequestId;

/// Upper bound on downloaded PDF size
const MAX_FILE_BYTES: u64 = 256 * 1024 * 1024;

/// Where documents and their files come from
pub trait DocumentSource: Send + Sync {
    /// `GET /api/documents?id=<id>`
    fn fetch_document(&self, id: &str) -> Result<Document, ViewerError>;

    /// `GET /api/documents`
    fn list_documents(&self) -> Result<Vec<Document>, ViewerError>;

    /// Download the PDF a document refers to
    fn fetch_file(&self, url: &str) -> Result<Vec<u8>, ViewerError>;
}

/// [`DocumentSource`] talking HTTP to the catalog server
pub struct HttpDocumentSource {
    agent: ureq::Agent,
    base: Url,
}

impl HttpDocumentSource {
    pub fn new(base_url: &str, timeout: Option<Duration>) -> anyhow::Result<Self> {
        let base = Url::parse(base_url)?;
        let mut builder = ureq::AgentBuilder::new();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            agent: builder.build(),
            base,
        })
    }

    /// Endpoint URL for one document, or for the listing when `id` is `None`
    pub fn documents_url(&self, id: Option<&str>) -> Result<Url, url::ParseError> {
        let mut url = self.base.join("/api/documents")?;
        if let Some(id) = id {
            url.query_pairs_mut().append_pair("id", id);
        }
        Ok(url)
    }

    /// Resolve a document's file reference against the server base
    pub fn resolve_file_url(&self, reference: &str) -> Result<Url, url::ParseError> {
        match Url::parse(reference) {
            Ok(url) => Ok(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => self.base.join(reference),
            Err(e) => Err(e),
        }
    }

    fn get(&self, url: &Url, what: &str) -> Result<ureq::Response, ViewerError> {
        debug!("GET {url}");
        self.agent.request_url("GET", url).call().map_err(|e| match e {
            ureq::Error::Status(code, _) => ViewerError::fetch_failed(what, format!("status {code}")),
            ureq::Error::Transport(transport) => ViewerError::fetch_failed(what, transport),
        })
    }
}

impl DocumentSource for HttpDocumentSource {
    fn fetch_document(&self, id: &str) -> Result<Document, ViewerError> {
        let what = format!("document {id}");
        let url = self
            .documents_url(Some(id))
            .map_err(|e| ViewerError::fetch_failed(&what, e))?;
        self.get(&url, &what)?
            .into_json()
            .map_err(|e| ViewerError::fetch_failed(&what, e))
    }

    fn list_documents(&self) -> Result<Vec<Document>, ViewerError> {
        let what = "document list";
        let url = self
            .documents_url(None)
            .map_err(|e| ViewerError::fetch_failed(what, e))?;
        self.get(&url, what)?
            .into_json()
            .map_err(|e| ViewerError::fetch_failed(what, e))
    }

    fn fetch_file(&self, reference: &str) -> Result<Vec<u8>, ViewerError> {
        if reference.trim().is_empty() {
            return Err(ViewerError::NoFileProvided);
        }
        let what = reference.to_string();
        let url = self
            .resolve_file_url(reference)
            .map_err(|e| ViewerError::fetch_failed(&what, e))?;

        let mut bytes = Vec::new();
        if url.scheme() == "file" {
            let path = url
                .to_file_path()
                .map_err(|()| ViewerError::fetch_failed(&what, "not a local path"))?;
            bytes = std::fs::read(&path).map_err(|e| ViewerError::fetch_failed(&what, e))?;
        } else {
            self.get(&url, &what)?
                .into_reader()
                .take(MAX_FILE_BYTES)
                .read_to_end(&mut bytes)
                .map_err(|e| ViewerError::fetch_failed(&what, e))?;
        }

        if bytes.is_empty() {
            return Err(ViewerError::NoFileProvided);
        }
        Ok(bytes)
    }
}

/// Progress of a fetch as seen by a view
#[derive(Debug, Clone, PartialEq)]
pub enum FetchState<T> {
    Loading,
    Loaded(T),
    Failed(ViewerError),
}

impl<T> FetchState<T> {
    pub fn loaded(&self) -> Option<&T> {
        match self {
            Self::Loaded(value) => Some(value),
            _ => None,
        }
    }
}

impl<T> From<Result<T, ViewerError>> for FetchState<T> {
    fn from(result: Result<T, ViewerError>) -> Self {
        match result {
            Ok(value) => Self::Loaded(value),
            Err(e) => Self::Failed(e),
        }
    }
}

#[derive(Debug)]
pub enum FetchPayload {
    Document(Result<Document, ViewerError>),
    Catalog(Result<Vec<Document>, ViewerError>),
    File(Result<Arc<[u8]>, ViewerError>),
}

#[derive(Debug)]
pub struct FetchResponse {
    pub id: RequestId,
    pub payload: FetchPayload,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum FetchKind {
    Document(String),
    Catalog,
    File(String),
}

/// Runs fetches in the background and hands back their results
pub struct DocumentFetcher {
    source: Arc<dyn DocumentSource>,
    response_tx: Sender<FetchResponse>,
    response_rx: Receiver<FetchResponse>,
    next_request_id: u64,
    pending: HashMap<RequestId, FetchKind>,
}

impl DocumentFetcher {
    pub fn new(source: Arc<dyn DocumentSource>) -> Self {
        let (response_tx, response_rx) = flume::unbounded();
        Self {
            source,
            response_tx,
            response_rx,
            next_request_id: 1,
            pending: HashMap::new(),
        }
    }

    pub fn request_document(&mut self, id: &str) -> RequestId {
        let doc_id = id.to_string();
        self.spawn(FetchKind::Document(doc_id.clone()), move |source| {
            FetchPayload::Document(source.fetch_document(&doc_id))
        })
    }

    pub fn request_catalog(&mut self) -> RequestId {
        self.spawn(FetchKind::Catalog, |source| {
            FetchPayload::Catalog(source.list_documents())
        })
    }

    pub fn request_file(&mut self, url: &str) -> RequestId {
        let reference = url.to_string();
        self.spawn(FetchKind::File(reference.clone()), move |source| {
            FetchPayload::File(source.fetch_file(&reference).map(Arc::from))
        })
    }

    /// Start a fetch unless an identical one is already in flight
    fn spawn(
        &mut self,
        kind: FetchKind,
        job: impl FnOnce(&dyn DocumentSource) -> FetchPayload + Send + 'static,
    ) -> RequestId {
        if let Some((&id, _)) = self.pending.iter().find(|(_, pending)| **pending == kind) {
            debug!("Reusing in-flight request {id:?} for {kind:?}");
            return id;
        }

        let id = RequestId::new(self.next_request_id);
        self.next_request_id += 1;
        debug!("Starting request {id:?} for {kind:?}");
        self.pending.insert(id, kind);

        let source = Arc::clone(&self.source);
        let tx = self.response_tx.clone();
        std::thread::spawn(move || {
            let payload = job(source.as_ref());
            let _ = tx.send(FetchResponse { id, payload });
        });

        id
    }

    /// Forget a request; its response will be dropped when it arrives
    pub fn cancel(&mut self, id: RequestId) {
        if self.pending.remove(&id).is_some() {
            debug!("Cancelled request {id:?}");
        }
    }

    pub fn cancel_all(&mut self) {
        self.pending.clear();
    }

    #[must_use]
    pub fn is_pending(&self, id: RequestId) -> bool {
        self.pending.contains_key(&id)
    }

    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Collect finished fetches that are still wanted
    pub fn poll(&mut self) -> Vec<FetchResponse> {
        let mut ready = Vec::new();
        while let Ok(response) = self.response_rx.try_recv() {
            if self.pending.remove(&response.id).is_some() {
                ready.push(response);
            } else {
                warn!("Dropping stale response for {:?}", response.id);
            }
        }
        ready
    }
}
