use std::path::PathBuf;
use std::time::Duration;

use docview::api::{ApiServer, DocumentsHandler, ServerConfig, ServerHandle};
use docview::document::Document;
use docview::error::ViewerError;
use docview::fetch::{DocumentSource, HttpDocumentSource};
use docview::mock_data::{ELEMENT_COUNT, LISTING_COUNT, MockCatalog};

fn start_server(documents_dir: Option<PathBuf>) -> ServerHandle {
    let config = ServerConfig {
        bind: "127.0.0.1:0".to_string(),
        delay_ms: 0..0,
        documents_dir,
        threads: 2,
    };
    ApiServer::bind(config, DocumentsHandler::new(MockCatalog::new()))
        .unwrap()
        .spawn()
}

fn documents_url(server: &ServerHandle) -> String {
    format!("{}/api/documents", server.base_url().unwrap())
}

#[test]
fn listing_starts_with_fixed_documents() {
    let server = start_server(None);

    let docs: Vec<Document> = ureq::get(&documents_url(&server))
        .call()
        .unwrap()
        .into_json()
        .unwrap();

    assert_eq!(docs[0].id, "test");
    assert_eq!(docs[1].id, "test2");
    let random = docs.len() - 2;
    assert!(LISTING_COUNT.contains(&random), "{random} random documents");

    server.shutdown();
}

#[test]
fn any_id_yields_a_document_with_bounded_elements() {
    let server = start_server(None);
    let url = documents_url(&server);

    for id in ["abc", "12345", "x y"] {
        let doc: Document = ureq::get(&url)
            .query("id", id)
            .call()
            .unwrap()
            .into_json()
            .unwrap();
        assert_eq!(doc.id, id);
        assert!(ELEMENT_COUNT.contains(&doc.elements.len()));
    }

    // Fixed documents are generated once and keep their element bounds
    let fetch_fixed = |id: &str| -> Document {
        ureq::get(&url).query("id", id).call().unwrap().into_json().unwrap()
    };
    for id in ["test", "test2"] {
        let first = fetch_fixed(id);
        assert_eq!(first, fetch_fixed(id));
        assert_eq!(first.url, format!("/mock-documents/{id}.pdf"));
        assert!(ELEMENT_COUNT.contains(&first.elements.len()));
    }

    server.shutdown();
}

#[test]
fn non_get_methods_get_exactly_one_405() {
    let server = start_server(None);
    let url = documents_url(&server);

    for method in ["POST", "PUT", "DELETE"] {
        match ureq::request(method, &url).call() {
            Err(ureq::Error::Status(405, response)) => {
                assert_eq!(
                    response.into_string().unwrap(),
                    format!("Method {method} not allowed")
                );
            }
            other => panic!("{method}: unexpected {other:?}"),
        }
    }

    server.shutdown();
}

#[test]
fn repeated_id_is_not_found() {
    let server = start_server(None);
    let url = format!("{}?id=a&id=b", documents_url(&server));

    match ureq::get(&url).call() {
        Err(ureq::Error::Status(404, response)) => {
            assert_eq!(response.into_string().unwrap(), "User of id a,b not found");
        }
        other => panic!("unexpected {other:?}"),
    }

    server.shutdown();
}

#[test]
fn unknown_paths_are_not_found() {
    let server = start_server(None);
    let url = format!("{}/api/other", server.base_url().unwrap());

    assert!(matches!(
        ureq::get(&url).call(),
        Err(ureq::Error::Status(404, _))
    ));

    server.shutdown();
}

#[test]
fn http_source_reads_documents_and_files() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("test2.pdf"), b"%PDF-1.4 fake").unwrap();
    let server = start_server(Some(dir.path().to_path_buf()));

    let source =
        HttpDocumentSource::new(&server.base_url().unwrap(), Some(Duration::from_secs(5))).unwrap();

    let listing = source.list_documents().unwrap();
    assert_eq!(listing[0].id, "test");

    let doc = source.fetch_document("test2").unwrap();
    assert!(ELEMENT_COUNT.contains(&doc.elements.len()));

    let bytes = source.fetch_file(&doc.url).unwrap();
    assert_eq!(bytes, b"%PDF-1.4 fake");

    // test.pdf was never written
    match source.fetch_file("/mock-documents/test.pdf") {
        Err(ViewerError::FetchFailed { reason, .. }) => assert_eq!(reason, "status 404"),
        other => panic!("unexpected {other:?}"),
    }

    server.shutdown();
}

#[test]
fn unreachable_server_reports_fetch_failure() {
    // Bind then shut down to get a port nobody listens on
    let server = start_server(None);
    let base = server.base_url().unwrap();
    server.shutdown();

    let source = HttpDocumentSource::new(&base, Some(Duration::from_secs(2))).unwrap();
    assert!(matches!(
        source.fetch_document("test"),
        Err(ViewerError::FetchFailed { .. })
    ));
}
