//! Randomly generated document data served by the mock API

use std::collections::HashSet;
use std::ops::Range;

use rand::Rng;
use rand::seq::SliceRandom;

use crate::document::{Document, ElementInfo};

/// Number of elements generated for a random document
pub const ELEMENT_COUNT: Range<usize> = 5..20;
/// Number of random documents appended to the catalog listing
pub const LISTING_COUNT: Range<usize> = 5..20;

const LOREM: &[&str] = &[
    "lorem", "ipsum", "dolor", "sit", "amet", "consectetur", "adipiscing", "elit", "sed", "do",
    "eiusmod", "tempor", "incididunt", "ut", "labore", "et", "dolore", "magna", "aliqua", "enim",
    "ad", "minim", "veniam", "quis", "nostrud", "exercitation", "ullamco", "laboris", "nisi",
    "aliquip", "ex", "ea", "commodo", "consequat", "duis", "aute", "irure", "in", "reprehenderit",
    "voluptate", "velit", "esse", "cillum", "fugiat", "nulla", "pariatur", "excepteur", "sint",
    "occaecat", "cupidatat", "non", "proident", "sunt", "culpa", "qui", "officia", "deserunt",
    "mollit", "anim", "id", "est", "laborum",
];

fn lorem_words<R: Rng + ?Sized>(rng: &mut R, count: usize) -> String {
    (0..count)
        .filter_map(|_| LOREM.choose(rng).copied())
        .collect::<Vec<_>>()
        .join(" ")
}

fn lorem_sentence<R: Rng + ?Sized>(rng: &mut R) -> String {
    let count = rng.gen_range(4..12);
    let mut sentence = lorem_words(rng, count);
    if let Some(first) = sentence.get(..1) {
        let upper = first.to_uppercase();
        sentence.replace_range(..1, &upper);
    }
    sentence.push('.');
    sentence
}

fn lorem_sentences<R: Rng + ?Sized>(rng: &mut R, count: usize) -> String {
    (0..count)
        .map(|_| lorem_sentence(rng))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Generate a list of elements with distinct five-digit ids
pub fn random_elements<R: Rng + ?Sized>(rng: &mut R) -> Vec<ElementInfo> {
    let amount = rng.gen_range(ELEMENT_COUNT);
    let mut seen = HashSet::with_capacity(amount);
    let mut elements = Vec::with_capacity(amount);

    while elements.len() < amount {
        let id = rng.gen_range(10_000..100_000u32).to_string();
        if !seen.insert(id.clone()) {
            continue;
        }
        let description_words = rng.gen_range(0..20);
        elements.push(ElementInfo {
            id,
            name: lorem_words(rng, 2),
            description: lorem_words(rng, description_words),
        });
    }

    elements
}

fn random_id<R: Rng + ?Sized>(rng: &mut R) -> String {
    rng.gen_range(1..=999u32).to_string()
}

/// Mock PDF location for a document id
pub fn mock_url(id: &str) -> String {
    format!("/mock-documents/{id}.pdf")
}

/// Generate a document with random content.
///
/// When `id` is given, the document keeps that id but its url still points at
/// the randomly chosen one, mirroring how the catalog hands out mock files.
pub fn random_document<R: Rng + ?Sized>(rng: &mut R, id: Option<&str>) -> Document {
    let generated_id = random_id(rng);
    let url = mock_url(&generated_id);
    let description = rng.gen_bool(0.9).then(|| lorem_sentences(rng, 2));
    let saved = rng.gen_bool(0.1);
    let elements = random_elements(rng);

    Document {
        id: id.map_or(generated_id, str::to_string),
        url,
        saved,
        description,
        elements,
    }
}

/// The fixed documents every listing starts with, plus random fill.
///
/// `test` and `test2` are generated once, like any other document, and then
/// served unchanged for the lifetime of the catalog.
#[derive(Debug, Clone)]
pub struct MockCatalog {
    fixed: Vec<Document>,
}

impl Default for MockCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCatalog {
    pub fn new() -> Self {
        Self::with_rng(&mut rand::thread_rng())
    }

    pub fn with_rng<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let fixed = FIXED_DOCUMENTS
            .iter()
            .map(|&(id, description)| Document {
                url: mock_url(id),
                description: Some(description.to_string()),
                ..random_document(rng, Some(id))
            })
            .collect();
        Self { fixed }
    }

    pub fn fixed(&self) -> &[Document] {
        &self.fixed
    }

    /// Look up a fixed document, falling back to random data under the given id
    pub fn document<R: Rng + ?Sized>(&self, rng: &mut R, id: &str) -> Document {
        self.fixed
            .iter()
            .find(|doc| doc.id == id)
            .cloned()
            .unwrap_or_else(|| random_document(rng, Some(id)))
    }

    /// Fixed documents first, followed by a random batch
    pub fn listing<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<Document> {
        let amount = rng.gen_range(LISTING_COUNT);
        let mut docs = self.fixed.clone();
        docs.extend((0..amount).map(|_| random_document(rng, None)));
        docs
    }
}

const FIXED_DOCUMENTS: &[(&str, &str)] = &[
    ("test", "Example document with no elements and one page."),
    (
        "test2",
        "Example document with elements and consisting of two pages.",
    ),
];

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn random_documents_have_between_5_and_20_elements() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let doc = random_document(&mut rng, None);
            assert!(ELEMENT_COUNT.contains(&doc.elements.len()), "{}", doc.elements.len());
        }
    }

    #[test]
    fn element_ids_are_unique_within_a_document() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..100 {
            let elements = random_elements(&mut rng);
            let ids: HashSet<_> = elements.iter().map(|e| e.id.as_str()).collect();
            assert_eq!(ids.len(), elements.len());
            assert!(elements.iter().all(|e| e.id.len() == 5));
        }
    }

    #[test]
    fn requested_id_is_kept() {
        let mut rng = StdRng::seed_from_u64(3);
        let catalog = MockCatalog::new();
        let doc = catalog.document(&mut rng, "4242");
        assert_eq!(doc.id, "4242");
        assert!(doc.url.starts_with("/mock-documents/"));
        assert!(doc.url.ends_with(".pdf"));
    }

    #[test]
    fn fixed_documents_are_returned_verbatim() {
        let mut rng = StdRng::seed_from_u64(5);
        let catalog = MockCatalog::new();

        let first = catalog.document(&mut rng, "test2");
        let second = catalog.document(&mut rng, "test2");
        assert_eq!(first, second);
        assert_eq!(first.url, "/mock-documents/test2.pdf");
    }

    #[test]
    fn fixed_documents_keep_random_elements() {
        let mut rng = StdRng::seed_from_u64(21);
        let catalog = MockCatalog::with_rng(&mut rng);

        for (doc, (id, description)) in catalog.fixed().iter().zip(FIXED_DOCUMENTS) {
            assert_eq!(doc.id, *id);
            assert_eq!(doc.url, mock_url(id));
            assert_eq!(doc.description.as_deref(), Some(*description));
            assert!(ELEMENT_COUNT.contains(&doc.elements.len()), "{}", doc.elements.len());
        }
    }

    #[test]
    fn listing_starts_with_fixed_documents() {
        let mut rng = StdRng::seed_from_u64(9);
        let listing = MockCatalog::new().listing(&mut rng);

        assert_eq!(listing[0].id, "test");
        assert_eq!(listing[1].id, "test2");
        assert!(LISTING_COUNT.contains(&(listing.len() - 2)));
    }

    #[test]
    fn sentences_are_capitalized_and_terminated() {
        let mut rng = StdRng::seed_from_u64(1);
        let text = lorem_sentences(&mut rng, 2);
        assert!(text.chars().next().unwrap().is_uppercase());
        assert!(text.ends_with('.'));
        assert_eq!(text.matches('.').count(), 2);
    }
}
