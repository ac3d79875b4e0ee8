pub mod test_helpers {
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    use crate::document::{Document, ElementInfo};
    use crate::error::ViewerError;
    use crate::event_source::{Event, KeyCode, KeyModifiers, SimulatedEventSource};
    use crate::fetch::DocumentSource;
    use crate::main_app::App;
    use crate::mock_data::mock_url;
    use crate::pdf::{PageSource, PageText, SourceFactory, WorkerFault};
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    /// Builder for creating test scenarios with simulated user input
    #[derive(Default)]
    pub struct TestScenarioBuilder {
        pub(crate) events: Vec<Event>,
    }

    impl TestScenarioBuilder {
        pub fn new() -> Self {
            Self::default()
        }

        /// Add a character key press
        pub fn press_char(mut self, c: char) -> Self {
            self.events.push(SimulatedEventSource::char_key(c));
            self
        }

        fn press(mut self, code: KeyCode) -> Self {
            self.events
                .push(SimulatedEventSource::key_event(code, KeyModifiers::empty()));
            self
        }

        pub fn press_enter(self) -> Self {
            self.press(KeyCode::Enter)
        }

        pub fn press_tab(self) -> Self {
            self.press(KeyCode::Tab)
        }

        pub fn press_esc(self) -> Self {
            self.press(KeyCode::Esc)
        }

        /// Navigate down n times (press 'j' n times)
        pub fn navigate_down(mut self, times: usize) -> Self {
            for _ in 0..times {
                self.events.push(SimulatedEventSource::char_key('j'));
            }
            self
        }

        /// Navigate up n times (press 'k' n times)
        pub fn navigate_up(mut self, times: usize) -> Self {
            for _ in 0..times {
                self.events.push(SimulatedEventSource::char_key('k'));
            }
            self
        }

        pub fn next_page(self) -> Self {
            self.press_char('l')
        }

        pub fn prev_page(self) -> Self {
            self.press_char('h')
        }

        pub fn mouse_move(mut self, column: u16, row: u16) -> Self {
            self.events.push(SimulatedEventSource::mouse_move(column, row));
            self
        }

        pub fn click(mut self, column: u16, row: u16) -> Self {
            self.events.push(SimulatedEventSource::mouse_click(column, row));
            self
        }

        /// Quit the application (press 'q')
        pub fn quit(self) -> Self {
            self.press_char('q')
        }

        /// Build the simulated event source
        pub fn build(self) -> SimulatedEventSource {
            SimulatedEventSource::new(self.events)
        }
    }

    /// Deterministic `test`/`test2` documents: `test` has no elements, `test2`
    /// has five whose ids match the anchors in two-page test fixtures.
    pub fn fixture_documents() -> Vec<Document> {
        let elements = [
            ("10001", "lorem ipsum", "Opening clause of the first page."),
            ("10002", "dolor sit", "Definition referenced throughout the agreement."),
            ("10003", "amet consectetur", "Term that applies to both parties."),
            ("20001", "adipiscing elit", "Appendix entry on the second page."),
            ("20002", "sed eiusmod", "Closing remark with signatures."),
        ]
        .into_iter()
        .map(|(id, name, description)| ElementInfo {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
        })
        .collect();

        vec![
            Document {
                id: "test".to_string(),
                url: mock_url("test"),
                saved: false,
                description: Some("Example document with no elements and one page.".to_string()),
                elements: Vec::new(),
            },
            Document {
                id: "test2".to_string(),
                url: mock_url("test2"),
                saved: false,
                description: Some(
                    "Example document with elements and consisting of two pages.".to_string(),
                ),
                elements,
            },
        ]
    }

    /// In-memory catalog serving [`fixture_documents`]
    pub struct StaticDocumentSource {
        pub documents: Vec<Document>,
        pub file: Vec<u8>,
    }

    impl StaticDocumentSource {
        pub fn with_fixed_documents() -> Self {
            Self {
                documents: fixture_documents(),
                file: b"%PDF-1.4 static".to_vec(),
            }
        }
    }

    impl DocumentSource for StaticDocumentSource {
        fn fetch_document(&self, id: &str) -> Result<Document, ViewerError> {
            self.documents
                .iter()
                .find(|doc| doc.id == id)
                .cloned()
                .ok_or_else(|| ViewerError::fetch_failed(format!("document {id}"), "status 404"))
        }

        fn list_documents(&self) -> Result<Vec<Document>, ViewerError> {
            Ok(self.documents.clone())
        }

        fn fetch_file(&self, url: &str) -> Result<Vec<u8>, ViewerError> {
            if url.trim().is_empty() || self.file.is_empty() {
                return Err(ViewerError::NoFileProvided);
            }
            Ok(self.file.clone())
        }
    }

    struct StaticPages(Vec<PageText>);

    impl PageSource for StaticPages {
        fn page_count(&self) -> usize {
            self.0.len()
        }

        fn extract_page(&self, page: usize) -> Result<PageText, WorkerFault> {
            page.checked_sub(1)
                .and_then(|idx| self.0.get(idx))
                .cloned()
                .ok_or_else(|| WorkerFault::generic(format!("no page {page}")))
        }
    }

    /// Page source factory that ignores the file bytes and serves `pages`
    pub fn static_pages_factory(pages: Vec<PageText>) -> SourceFactory {
        Arc::new(move |_bytes| Ok(Box::new(StaticPages(pages.clone())) as Box<dyn PageSource>))
    }

    /// Tick the app until its background fetches and renders have finished
    pub fn settle(app: &mut App) {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            app.tick();
            if !app.is_busy() || Instant::now() > deadline {
                break;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        app.tick();
    }

    /// Create a test terminal for snapshot testing
    pub fn create_test_terminal(width: u16, height: u16) -> Terminal<TestBackend> {
        let backend = TestBackend::new(width, height);
        Terminal::new(backend).unwrap()
    }

    /// Capture the current terminal buffer as a string
    pub fn capture_terminal_state(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        let mut lines = Vec::new();

        for y in 0..buffer.area.height {
            let mut line = String::new();
            for x in 0..buffer.area.width {
                line.push_str(buffer[(x, y)].symbol());
            }
            // Trim trailing whitespace from each line
            lines.push(line.trim_end().to_string());
        }

        // Remove trailing empty lines
        while lines.last().is_some_and(|l| l.is_empty()) {
            lines.pop();
        }

        lines.join("\n")
    }

    /// Screen position of the first occurrence of `needle`
    pub fn find_text(terminal: &Terminal<TestBackend>, needle: &str) -> Option<(u16, u16)> {
        let state = capture_terminal_state(terminal);
        state.lines().enumerate().find_map(|(y, line)| {
            line.find(needle).map(|byte| {
                let x = line[..byte].chars().count();
                (x as u16, y as u16)
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::test_helpers::*;

    #[test]
    fn test_scenario_builder() {
        let scenario = TestScenarioBuilder::new()
            .navigate_down(2)
            .press_enter()
            .press_tab()
            .mouse_move(3, 4)
            .navigate_up(1)
            .quit()
            .build();

        assert_eq!(scenario.events.len(), 7);
    }
}
