use std::io::stdout;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::SetTitle;
use log::{debug, error, info};
use ratatui::{
    Frame, Terminal,
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use crate::anchor::{ActiveAnchor, AnchorChange};
use crate::document::Document;
use crate::error::ViewerError;
use crate::event_source::EventSource;
use crate::fetch::{DocumentFetcher, DocumentSource, FetchPayload, FetchState};
use crate::pdf::{Command, PageStatus, PageText, RenderService, RequestId, SourceFactory};
use crate::theme::{Base16Palette, current_theme};
use crate::widget::catalog_list::CatalogList;
use crate::widget::element_panel::{self, ElementPanel};
use crate::widget::page_view::{PageAreas, PageView, render_message};
use crate::widget::pagination;

const APP_TITLE: &str = "docview";
const DETAILS_HEIGHT: u16 = 4;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum AppAction {
    Quit,
}

#[derive(PartialEq, Debug, Clone, Copy)]
pub enum FocusedPanel {
    Page,
    Elements,
}

/// Screen regions of the document view, kept from the last draw for mouse hit testing
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DocumentLayout {
    pub body: Rect,
    pub page: Rect,
    pub page_content: Rect,
    pub pagination: Option<Rect>,
    pub details: Rect,
    pub elements: Rect,
    pub help: Rect,
}

impl DocumentLayout {
    pub fn compute(area: Rect, page_count: usize) -> Self {
        let [body, help] = Layout::vertical([Constraint::Min(0), Constraint::Length(1)]).areas(area);
        let inner = Block::default().borders(Borders::ALL).inner(body);
        let [page, side] =
            Layout::horizontal([Constraint::Percentage(62), Constraint::Percentage(38)]).areas(inner);
        let [details, elements] =
            Layout::vertical([Constraint::Length(DETAILS_HEIGHT), Constraint::Min(0)]).areas(side);

        let page_inner = Block::default().borders(Borders::ALL).inner(page);
        let areas = PageAreas::compute(page_inner, page_count);

        Self {
            body,
            page,
            page_content: areas.content,
            pagination: areas.pagination,
            details,
            elements,
            help,
        }
    }
}

fn contains(area: Rect, x: u16, y: u16) -> bool {
    x >= area.x && x < area.x + area.width && y >= area.y && y < area.y + area.height
}

/// Catalog listing and its fetch
pub struct CatalogScreen {
    request: Option<RequestId>,
    state: FetchState<CatalogList>,
    area: Rect,
}

impl CatalogScreen {
    fn new(fetcher: &mut DocumentFetcher) -> Self {
        Self {
            request: Some(fetcher.request_catalog()),
            state: FetchState::Loading,
            area: Rect::default(),
        }
    }

    pub fn list(&self) -> Option<&CatalogList> {
        self.state.loaded()
    }
}

/// Everything shown for one open document; dropped on navigation away
pub struct DocumentView {
    id: String,
    document_request: Option<RequestId>,
    file_request: Option<RequestId>,
    document: FetchState<Document>,
    file_error: Option<ViewerError>,
    renderer: Option<RenderService>,
    elements: ElementPanel,
    page_view: PageView,
    anchor: ActiveAnchor,
    focus: FocusedPanel,
    layout: Option<DocumentLayout>,
}

impl DocumentView {
    fn new(id: &str, fetcher: &mut DocumentFetcher) -> Self {
        Self {
            id: id.to_string(),
            document_request: Some(fetcher.request_document(id)),
            file_request: None,
            document: FetchState::Loading,
            file_error: None,
            renderer: None,
            elements: ElementPanel::new(Vec::new()),
            page_view: PageView::new(),
            anchor: ActiveAnchor::default(),
            focus: FocusedPanel::Page,
            layout: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn document(&self) -> &FetchState<Document> {
        &self.document
    }

    pub fn active_anchor(&self) -> &ActiveAnchor {
        &self.anchor
    }

    pub fn element_panel(&self) -> &ElementPanel {
        &self.elements
    }

    pub fn focus(&self) -> FocusedPanel {
        self.focus
    }

    pub fn current_page(&self) -> usize {
        self.renderer.as_ref().map_or(1, RenderService::current_page)
    }

    pub fn page_count(&self) -> usize {
        self.renderer.as_ref().map_or(0, RenderService::page_count)
    }

    /// What the page region shows right now
    pub fn page_status(&mut self) -> PageStatus {
        if let Some(err) = &self.file_error {
            return PageStatus::Failed(err.clone());
        }
        match self.renderer.as_mut() {
            Some(renderer) => renderer.status(),
            None => PageStatus::LoadingDocument,
        }
    }

    fn ready_page(&mut self) -> Option<Arc<PageText>> {
        match self.page_status() {
            PageStatus::Ready(page) => Some(page),
            _ => None,
        }
    }

    fn set_anchor(&mut self, change: AnchorChange) {
        if self.anchor.apply(change) {
            self.elements.sync_with_anchor(&self.anchor);
        }
    }

    pub fn clear_anchor(&mut self) {
        self.elements.clear_selection();
        self.page_view.reset_hover();
        self.set_anchor(AnchorChange::Leave);
    }

    pub fn apply_page_command(&mut self, cmd: Command) {
        let Some(renderer) = self.renderer.as_mut() else {
            return;
        };
        let before = renderer.current_page();
        renderer.apply_command(cmd);
        if renderer.current_page() != before {
            debug!("Page {before} -> {}", renderer.current_page());
            // The hovered anchor is no longer under the cursor
            if self.page_view.reset_hover() {
                self.set_anchor(AnchorChange::Leave);
            }
        }
    }

    fn is_busy(&self) -> bool {
        self.renderer.as_ref().is_some_and(RenderService::has_pending)
    }

    fn handle_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('h') | KeyCode::Left | KeyCode::PageUp => {
                self.apply_page_command(Command::PrevPage);
            }
            KeyCode::Char('l') | KeyCode::Right | KeyCode::PageDown => {
                self.apply_page_command(Command::NextPage);
            }
            KeyCode::Char('g') | KeyCode::Home => self.apply_page_command(Command::FirstPage),
            KeyCode::Char('G') | KeyCode::End => self.apply_page_command(Command::LastPage),
            KeyCode::Char('j') => self.select_next_element(),
            KeyCode::Char('k') => self.select_previous_element(),
            KeyCode::Down => match self.focus {
                FocusedPanel::Elements => self.select_next_element(),
                FocusedPanel::Page => self.apply_page_command(Command::NextPage),
            },
            KeyCode::Up => match self.focus {
                FocusedPanel::Elements => self.select_previous_element(),
                FocusedPanel::Page => self.apply_page_command(Command::PrevPage),
            },
            KeyCode::Tab => {
                self.focus = match self.focus {
                    FocusedPanel::Page => FocusedPanel::Elements,
                    FocusedPanel::Elements => FocusedPanel::Page,
                };
            }
            KeyCode::Esc => self.clear_anchor(),
            _ => {}
        }
    }

    fn select_next_element(&mut self) {
        if let Some(change) = self.elements.move_selection_down() {
            self.set_anchor(change);
        }
    }

    fn select_previous_element(&mut self) {
        if let Some(change) = self.elements.move_selection_up() {
            self.set_anchor(change);
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        let Some(layout) = self.layout else {
            return;
        };
        let (x, y) = (mouse.column, mouse.row);

        match mouse.kind {
            MouseEventKind::Moved => {
                let page = self.ready_page();
                let from_page =
                    self.page_view
                        .handle_mouse_move(x, y, layout.page_content, page.as_deref());
                let from_list = self.elements.handle_mouse_move(x, y, layout.elements);

                // Leaving one region and entering another in the same move must end on the enter
                let mut changes: Vec<AnchorChange> = from_page.into_iter().chain(from_list).collect();
                changes.sort_by_key(|change| matches!(change, AnchorChange::Enter(_)));
                for change in changes {
                    self.set_anchor(change);
                }
            }
            MouseEventKind::Down(MouseButton::Left) => {
                if let Some(area) = layout.pagination {
                    if let Some(target) =
                        pagination::handle_click(x, y, self.current_page(), self.page_count(), area)
                    {
                        self.apply_page_command(Command::GoToPage(target));
                        return;
                    }
                }
                if contains(layout.elements, x, y) {
                    self.focus = FocusedPanel::Elements;
                    if let Some(change) = self.elements.handle_mouse_click(x, y, layout.elements) {
                        self.set_anchor(change);
                    }
                } else if contains(layout.page, x, y) {
                    self.focus = FocusedPanel::Page;
                }
            }
            MouseEventKind::ScrollDown if contains(layout.elements, x, y) => {
                self.select_next_element();
            }
            MouseEventKind::ScrollUp if contains(layout.elements, x, y) => {
                self.select_previous_element();
            }
            MouseEventKind::ScrollDown if contains(layout.page, x, y) => {
                self.apply_page_command(Command::NextPage);
            }
            MouseEventKind::ScrollUp if contains(layout.page, x, y) => {
                self.apply_page_command(Command::PrevPage);
            }
            _ => {}
        }
    }

    fn draw(&mut self, f: &mut Frame, area: Rect, palette: &Base16Palette) {
        let layout = DocumentLayout::compute(area, self.page_count());
        self.layout = Some(layout);

        let body = layout.body;
        let outer = Block::default()
            .borders(Borders::ALL)
            .title(format!(" {} ", Document::display_title(&self.id)))
            .border_style(Style::default().fg(palette.base_04))
            .style(Style::default().bg(palette.base_00));
        let inner = outer.inner(body);
        f.render_widget(outer, body);

        let status = self.page_status();
        let (current_page, page_count) = (self.current_page(), self.page_count());
        match &self.document {
            FetchState::Loading => {
                render_message(f, inner, "Loading…", Style::default().fg(palette.base_05));
            }
            FetchState::Failed(err) => {
                render_message(f, inner, &err.to_string(), palette.error_style());
            }
            FetchState::Loaded(document) => {
                self.page_view.render(
                    f,
                    layout.page,
                    self.focus == FocusedPanel::Page,
                    &status,
                    current_page,
                    page_count,
                    &self.anchor,
                    palette,
                );
                element_panel::render_details(f, layout.details, document, palette);
                self.elements.render(
                    f,
                    layout.elements,
                    self.focus == FocusedPanel::Elements,
                    &self.anchor,
                    palette,
                );
            }
        }

        render_help(
            f,
            layout.help,
            "h/l: Page  g/G: First/Last  j/k: Elements  Esc: Clear  Tab: Focus  b: Back  q: Quit",
            palette,
        );
    }
}

fn render_help(f: &mut Frame, area: Rect, text: &str, palette: &Base16Palette) {
    let help = Paragraph::new(Line::from(Span::styled(
        text.to_string(),
        Style::default().fg(palette.base_03),
    )));
    f.render_widget(help, area);
}

fn render_catalog_placeholder(
    f: &mut Frame,
    area: Rect,
    message: &str,
    style: Style,
    palette: &Base16Palette,
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Catalog ")
        .border_style(Style::default().fg(palette.base_04));
    let inner = block.inner(area);
    f.render_widget(block, area);
    render_message(f, inner, message, style);
}

pub struct App {
    fetcher: DocumentFetcher,
    factory: SourceFactory,
    catalog: Option<CatalogScreen>,
    document: Option<DocumentView>,
    /// Push the window title to the terminal when it changes
    pub set_terminal_title: bool,
    last_title: Option<String>,
}

impl App {
    /// Start on the catalog, or directly on `initial_document` if given
    pub fn new(
        source: Arc<dyn DocumentSource>,
        factory: SourceFactory,
        initial_document: Option<&str>,
    ) -> Self {
        let mut app = Self {
            fetcher: DocumentFetcher::new(source),
            factory,
            catalog: None,
            document: None,
            set_terminal_title: false,
            last_title: None,
        };
        match initial_document {
            Some(id) => app.open_document(id),
            None => app.show_catalog(),
        }
        app
    }

    pub fn catalog(&self) -> Option<&CatalogScreen> {
        self.catalog.as_ref()
    }

    pub fn current_document(&self) -> Option<&DocumentView> {
        self.document.as_ref()
    }

    pub fn current_document_mut(&mut self) -> Option<&mut DocumentView> {
        self.document.as_mut()
    }

    pub fn open_document(&mut self, id: &str) {
        info!("Opening document {id:?}");
        self.document = Some(DocumentView::new(id, &mut self.fetcher));
    }

    /// Leave the document view; its in-flight fetches are abandoned
    pub fn show_catalog(&mut self) {
        if let Some(view) = self.document.take() {
            info!("Closing document {:?}", view.id);
            for id in [view.document_request, view.file_request].into_iter().flatten() {
                self.fetcher.cancel(id);
            }
        }
        let stale = match &self.catalog {
            None => true,
            Some(screen) => matches!(screen.state, FetchState::Failed(_)),
        };
        if stale {
            self.catalog = Some(CatalogScreen::new(&mut self.fetcher));
        }
    }

    /// Terminal window title for the current screen
    pub fn title(&self) -> String {
        match &self.document {
            Some(view) => format!("{} | {APP_TITLE}", Document::display_title(&view.id)),
            None => format!("Catalog | {APP_TITLE}"),
        }
    }

    /// Whether background work is still outstanding
    pub fn is_busy(&self) -> bool {
        self.fetcher.has_pending() || self.document.as_ref().is_some_and(DocumentView::is_busy)
    }

    /// Drain fetch and render results. Returns true if anything changed.
    pub fn tick(&mut self) -> bool {
        let mut changed = false;

        for response in self.fetcher.poll() {
            changed = true;
            match response.payload {
                FetchPayload::Catalog(result) => {
                    let Some(screen) = self.catalog.as_mut() else {
                        continue;
                    };
                    if screen.request != Some(response.id) {
                        continue;
                    }
                    screen.request = None;
                    if let Err(e) = &result {
                        error!("Catalog fetch failed: {e}");
                    }
                    screen.state = result.map(CatalogList::new).into();
                }

                FetchPayload::Document(result) => {
                    let Some(view) = self.document.as_mut() else {
                        continue;
                    };
                    if view.document_request != Some(response.id) {
                        continue;
                    }
                    view.document_request = None;
                    match result {
                        Ok(document) => {
                            debug!(
                                "Document {:?} has {} elements",
                                document.id,
                                document.elements.len()
                            );
                            view.elements = ElementPanel::new(document.elements.clone());
                            if document.url.trim().is_empty() {
                                view.file_error = Some(ViewerError::NoFileProvided);
                            } else {
                                view.file_request = Some(self.fetcher.request_file(&document.url));
                            }
                            view.document = FetchState::Loaded(document);
                        }
                        Err(e) => {
                            error!("Document {:?} fetch failed: {e}", view.id);
                            view.document = FetchState::Failed(e);
                        }
                    }
                }

                FetchPayload::File(result) => {
                    let Some(view) = self.document.as_mut() else {
                        continue;
                    };
                    if view.file_request != Some(response.id) {
                        continue;
                    }
                    view.file_request = None;
                    match result {
                        Ok(bytes) => {
                            debug!("Fetched {} bytes for {:?}", bytes.len(), view.id);
                            view.renderer = Some(RenderService::new(bytes, Arc::clone(&self.factory)));
                        }
                        Err(e) => {
                            error!("File fetch for {:?} failed: {e}", view.id);
                            view.file_error = Some(e);
                        }
                    }
                }
            }
        }

        if let Some(renderer) = self.document.as_mut().and_then(|view| view.renderer.as_mut()) {
            changed |= renderer.poll_responses();
        }

        changed
    }

    pub fn handle_event(&mut self, event: &Event) -> Option<AppAction> {
        match event {
            Event::Key(key) => self.handle_key_event(*key),
            Event::Mouse(mouse) => {
                self.handle_mouse_event(*mouse);
                None
            }
            _ => None,
        }
    }

    pub fn handle_key_event(&mut self, key: KeyEvent) -> Option<AppAction> {
        if key.kind != KeyEventKind::Press {
            return None;
        }
        if key.code == KeyCode::Char('q') {
            return Some(AppAction::Quit);
        }

        if self.document.is_some() {
            if matches!(key.code, KeyCode::Char('b') | KeyCode::Backspace) {
                self.show_catalog();
            } else if let Some(view) = self.document.as_mut() {
                view.handle_key(key);
            }
            return None;
        }

        let Some(list) = self.catalog.as_mut().and_then(|screen| match &mut screen.state {
            FetchState::Loaded(list) => Some(list),
            _ => None,
        }) else {
            return None;
        };
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => list.move_selection_down(),
            KeyCode::Char('k') | KeyCode::Up => list.move_selection_up(),
            KeyCode::Enter => {
                if let Some(id) = list.get_selected_document().map(|doc| doc.id.clone()) {
                    self.open_document(&id);
                }
            }
            _ => {}
        }
        None
    }

    pub fn handle_mouse_event(&mut self, mouse: MouseEvent) {
        if let Some(view) = self.document.as_mut() {
            view.handle_mouse(mouse);
            return;
        }

        let Some(screen) = self.catalog.as_mut() else {
            return;
        };
        let area = screen.area;
        let FetchState::Loaded(list) = &mut screen.state else {
            return;
        };
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if list.handle_mouse_click(mouse.column, mouse.row, area) {
                    if let Some(id) = list.get_selected_document().map(|doc| doc.id.clone()) {
                        self.open_document(&id);
                    }
                }
            }
            MouseEventKind::ScrollDown => list.move_selection_down(),
            MouseEventKind::ScrollUp => list.move_selection_up(),
            _ => {}
        }
    }

    pub fn draw(&mut self, f: &mut Frame) {
        let palette = current_theme();
        let area = f.area();

        if let Some(view) = self.document.as_mut() {
            view.draw(f, area, palette);
            return;
        }

        let [list_area, help_area] =
            Layout::vertical([Constraint::Min(0), Constraint::Length(1)]).areas(area);
        if let Some(screen) = self.catalog.as_mut() {
            screen.area = list_area;
            match &mut screen.state {
                FetchState::Loaded(list) => list.render(f, list_area, true, palette),
                FetchState::Loading => render_catalog_placeholder(
                    f,
                    list_area,
                    "Loading…",
                    Style::default().fg(palette.base_05),
                    palette,
                ),
                FetchState::Failed(err) => render_catalog_placeholder(
                    f,
                    list_area,
                    &err.to_string(),
                    palette.error_style(),
                    palette,
                ),
            }
        }
        render_help(f, help_area, "j/k: Move  Enter: Open  q: Quit", palette);
    }

    fn update_terminal_title(&mut self) {
        let title = self.title();
        if self.last_title.as_deref() == Some(title.as_str()) {
            return;
        }
        if self.set_terminal_title {
            if let Err(e) = execute!(stdout(), SetTitle(&title)) {
                debug!("Failed to set terminal title: {e}");
            }
        }
        self.last_title = Some(title);
    }
}

pub fn run_app_with_event_source<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    event_source: &mut dyn EventSource,
) -> Result<()>
where
    B::Error: Send + Sync + 'static,
{
    let tick_rate = Duration::from_millis(50);
    let mut last_tick = Instant::now();
    let mut first_render = true;
    loop {
        let mut events_processed = 0;
        let mut should_quit = false;
        while event_source.poll(Duration::from_millis(0))? && events_processed < 50 {
            let event = event_source.read()?;
            events_processed += 1;

            match event {
                // Horizontal scrolling floods the queue on some terminals
                Event::Mouse(MouseEvent {
                    kind: MouseEventKind::ScrollLeft | MouseEventKind::ScrollRight,
                    ..
                }) => {}
                _ => {
                    if app.handle_event(&event) == Some(AppAction::Quit) {
                        should_quit = true;
                    }
                }
            }

            if should_quit {
                break;
            }
        }

        let mut needs_redraw = events_processed > 0;

        if first_render {
            needs_redraw = true;
            first_render = false;
        }

        if last_tick.elapsed() >= tick_rate {
            if app.tick() {
                needs_redraw = true;
            }
            last_tick = Instant::now();
        }

        if needs_redraw {
            app.update_terminal_title();
            terminal.draw(|f| app.draw(f))?;
        }

        if should_quit {
            return Ok(());
        }

        // If no events were processed, wait a bit to avoid busy-waiting
        if events_processed == 0 {
            let timeout = tick_rate
                .checked_sub(last_tick.elapsed())
                .unwrap_or_else(|| Duration::from_secs(0));
            let _ = event_source.poll(timeout);
        }
    }
}
