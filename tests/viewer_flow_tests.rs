use std::sync::Arc;

use docview::event_source::SimulatedEventSource;
use docview::fetch::FetchState;
use docview::pdf::{PageStatus, PageText};
use docview::test_utils::test_helpers::{
    StaticDocumentSource, TestScenarioBuilder, capture_terminal_state, create_test_terminal,
    find_text, settle, static_pages_factory,
};
use docview::theme::current_theme;
use docview::{App, run_app_with_event_source};
use ratatui::Terminal;
use ratatui::backend::TestBackend;

fn two_pages() -> Vec<PageText> {
    vec![
        PageText::from_lines(1, &["Intro #10001 and", "see #10002 here"]),
        PageText::from_lines(2, &["Appendix #20001"]),
    ]
}

fn open(id: Option<&str>, pages: Vec<PageText>) -> App {
    let source = StaticDocumentSource::with_fixed_documents();
    let mut app = App::new(Arc::new(source), static_pages_factory(pages), id);
    settle(&mut app);
    app
}

fn draw(terminal: &mut Terminal<TestBackend>, app: &mut App) -> String {
    terminal.draw(|f| app.draw(f)).unwrap();
    capture_terminal_state(terminal)
}

/// Every screen position where `needle` starts, left to right.
/// The page sits left of the element list, so page hits come first.
fn positions(terminal: &Terminal<TestBackend>, needle: &str) -> Vec<(u16, u16)> {
    let mut found: Vec<(u16, u16)> = capture_terminal_state(terminal)
        .lines()
        .enumerate()
        .flat_map(|(y, line)| {
            line.match_indices(needle)
                .map(move |(byte, _)| (line[..byte].chars().count() as u16, y as u16))
                .collect::<Vec<_>>()
        })
        .collect();
    found.sort_by_key(|&(x, _)| x);
    found
}

#[test]
fn hovering_a_page_anchor_highlights_the_matching_element() {
    let mut app = open(Some("test2"), two_pages());
    let mut terminal = create_test_terminal(100, 30);
    draw(&mut terminal, &mut app);

    let spots = positions(&terminal, "10001");
    assert_eq!(spots.len(), 2, "one in the page, one in the element list");
    let (page_x, page_y) = spots[0];
    let (list_x, list_y) = spots[1];
    assert!(list_x > page_x);

    app.handle_event(&SimulatedEventSource::mouse_move(page_x + 1, page_y));
    let view = app.current_document().unwrap();
    assert_eq!(view.active_anchor().get(), Some("10001"));
    assert_eq!(view.element_panel().highlighted(view.active_anchor()), vec![0]);

    draw(&mut terminal, &mut app);
    let palette = current_theme();
    let buffer = terminal.backend().buffer();
    assert_eq!(buffer[(page_x, page_y)].bg, palette.base_0a);
    assert_eq!(buffer[(list_x, list_y)].bg, palette.base_0a);

    // The other anchor on the page stays unhighlighted
    let (other_x, other_y) = positions(&terminal, "10002")[0];
    assert_ne!(terminal.backend().buffer()[(other_x, other_y)].bg, palette.base_0a);

    // Moving off the anchor clears everything
    app.handle_event(&SimulatedEventSource::mouse_move(0, 29));
    let view = app.current_document().unwrap();
    assert!(view.active_anchor().is_none());
    assert!(view.element_panel().highlighted(view.active_anchor()).is_empty());
}

#[test]
fn hovering_an_element_highlights_its_page_anchor() {
    let mut app = open(Some("test2"), two_pages());
    let mut terminal = create_test_terminal(100, 30);
    draw(&mut terminal, &mut app);

    let (list_x, list_y) = positions(&terminal, "10002")[1];
    app.handle_event(&SimulatedEventSource::mouse_move(list_x, list_y));
    assert_eq!(
        app.current_document().unwrap().active_anchor().get(),
        Some("10002")
    );

    draw(&mut terminal, &mut app);
    let (page_x, page_y) = positions(&terminal, "10002")[0];
    assert_eq!(
        terminal.backend().buffer()[(page_x, page_y)].bg,
        current_theme().base_0a
    );
}

#[test]
fn moving_from_an_element_onto_a_page_anchor_activates_the_page_anchor() {
    let mut app = open(Some("test2"), two_pages());
    let mut terminal = create_test_terminal(100, 30);
    draw(&mut terminal, &mut app);

    let (list_x, list_y) = positions(&terminal, "10002")[1];
    let (page_x, page_y) = positions(&terminal, "10001")[0];

    app.handle_event(&SimulatedEventSource::mouse_move(list_x, list_y));
    assert_eq!(
        app.current_document().unwrap().active_anchor().get(),
        Some("10002")
    );

    // One move leaves the list row and lands on a different anchor
    app.handle_event(&SimulatedEventSource::mouse_move(page_x, page_y));
    let view = app.current_document().unwrap();
    assert_eq!(view.active_anchor().get(), Some("10001"));
    assert_eq!(view.element_panel().highlighted(view.active_anchor()), vec![0]);
}

#[test]
fn keyboard_paging_and_escape() {
    let mut app = open(Some("test2"), two_pages());
    let mut terminal = create_test_terminal(100, 30);

    let mut events = TestScenarioBuilder::new()
        .next_page()
        .next_page()
        .navigate_down(1)
        .quit()
        .build();
    run_app_with_event_source(&mut terminal, &mut app, &mut events).unwrap();
    settle(&mut app);

    let view = app.current_document().unwrap();
    assert_eq!(view.current_page(), 2, "paging stops at the last page");
    assert_eq!(view.active_anchor().get(), Some("10001"));

    let mut events = TestScenarioBuilder::new()
        .prev_page()
        .press_esc()
        .quit()
        .build();
    run_app_with_event_source(&mut terminal, &mut app, &mut events).unwrap();

    let view = app.current_document().unwrap();
    assert_eq!(view.current_page(), 1);
    assert!(view.active_anchor().is_none());
    assert!(view.element_panel().highlighted(view.active_anchor()).is_empty());
}

#[test]
fn pagination_is_shown_only_for_multi_page_documents() {
    let mut single = open(Some("test"), vec![PageText::from_lines(1, &["Only page"])]);
    let mut terminal = create_test_terminal(100, 30);
    let screen = draw(&mut terminal, &mut single);
    assert!(screen.contains("Page 1/1"));
    assert!(!screen.contains('›'));

    let mut double = open(Some("test2"), two_pages());
    let screen = draw(&mut terminal, &mut double);
    assert!(screen.contains("Page 1/2"));
    assert!(screen.contains('›'));

    // Clicking the next arrow moves to the last page and no further
    let (x, y) = find_text(&terminal, "›").unwrap();
    double.handle_event(&SimulatedEventSource::mouse_click(x, y));
    settle(&mut double);
    let screen = draw(&mut terminal, &mut double);
    assert!(screen.contains("Page 2/2"));
    assert!(screen.contains("Appendix"));

    double.handle_event(&SimulatedEventSource::mouse_click(x, y));
    assert_eq!(double.current_document().unwrap().current_page(), 2);
}

#[test]
fn catalog_to_document_and_back() {
    let mut app = open(None, two_pages());
    let mut terminal = create_test_terminal(100, 30);

    let mut events = TestScenarioBuilder::new()
        .navigate_down(1)
        .press_enter()
        .quit()
        .build();
    run_app_with_event_source(&mut terminal, &mut app, &mut events).unwrap();
    settle(&mut app);

    assert_eq!(app.title(), "test2 | docview");
    let screen = draw(&mut terminal, &mut app);
    assert!(screen.contains("test2"));
    assert!(screen.contains("Elements (5)"));
    assert!(screen.contains("Not saved"), "details header drawn from the loaded document");

    let mut events = TestScenarioBuilder::new().press_char('b').quit().build();
    run_app_with_event_source(&mut terminal, &mut app, &mut events).unwrap();
    assert!(app.current_document().is_none());
    assert_eq!(app.title(), "Catalog | docview");
}

#[test]
fn leaving_before_the_fetch_finishes_drops_its_result() {
    let source = StaticDocumentSource::with_fixed_documents();
    let mut app = App::new(
        Arc::new(source),
        static_pages_factory(two_pages()),
        Some("test2"),
    );
    app.show_catalog();
    settle(&mut app);

    assert!(app.current_document().is_none());
    assert_eq!(app.catalog().and_then(|c| c.list()).map(|l| l.len()), Some(2));
}

#[test]
fn failed_document_fetch_is_shown_inline() {
    let mut app = open(Some("missing"), two_pages());
    let view = app.current_document().unwrap();
    assert!(matches!(view.document(), FetchState::Failed(_)));

    let mut terminal = create_test_terminal(100, 30);
    let screen = draw(&mut terminal, &mut app);
    assert!(screen.contains("Failed to fetch document missing"));
}

#[test]
fn document_without_pages_reports_no_page() {
    let mut app = open(Some("test2"), Vec::new());
    let view = app.current_document_mut().unwrap();
    assert_eq!(view.page_count(), 0);
    assert!(matches!(view.page_status(), PageStatus::Failed(_)));

    let mut terminal = create_test_terminal(100, 30);
    assert!(draw(&mut terminal, &mut app).contains("No page selected."));
}

#[test]
fn empty_id_gets_a_placeholder_title() {
    let mut source = StaticDocumentSource::with_fixed_documents();
    source.documents[0].id = String::new();
    let mut app = App::new(Arc::new(source), static_pages_factory(two_pages()), Some(""));
    settle(&mut app);

    assert_eq!(app.title(), "Unnamed document | docview");
    let mut terminal = create_test_terminal(100, 30);
    assert!(draw(&mut terminal, &mut app).contains("Unnamed document"));
}
