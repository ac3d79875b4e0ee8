use crate::anchor::{ActiveAnchor, AnchorChange};
use crate::document::{Document, ElementInfo};
use crate::theme::Base16Palette;
use ratatui::{
    Frame,
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};

/// Side panel listing the elements of the open document.
///
/// The selected row follows the active anchor, so keyboard selection, mouse
/// hover and hovering an anchor on the page all land on the same element.
pub struct ElementPanel {
    selected: Option<usize>,
    list_state: ListState,
    elements: Vec<ElementInfo>,
    hovered: Option<usize>,
}

impl ElementPanel {
    pub fn new(elements: Vec<ElementInfo>) -> Self {
        Self {
            selected: None,
            list_state: ListState::default(),
            elements,
            hovered: None,
        }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    fn select(&mut self, index: usize) -> Option<AnchorChange> {
        let element = self.elements.get(index)?;
        self.selected = Some(index);
        self.list_state.select(Some(index));
        Some(AnchorChange::Enter(element.id.clone()))
    }

    pub fn move_selection_down(&mut self) -> Option<AnchorChange> {
        match self.selected {
            None if !self.elements.is_empty() => self.select(0),
            Some(i) if i + 1 < self.elements.len() => self.select(i + 1),
            _ => None,
        }
    }

    pub fn move_selection_up(&mut self) -> Option<AnchorChange> {
        match self.selected {
            None if !self.elements.is_empty() => self.select(self.elements.len() - 1),
            Some(i) if i > 0 => self.select(i - 1),
            _ => None,
        }
    }

    pub fn clear_selection(&mut self) -> Option<AnchorChange> {
        self.hovered = None;
        self.list_state.select(None);
        self.selected.take().map(|_| AnchorChange::Leave)
    }

    /// Index of the element drawn at row `y`, accounting for borders and scroll
    fn index_at(&self, x: u16, y: u16, area: Rect) -> Option<usize> {
        let inside = x > area.x
            && x < (area.x + area.width).saturating_sub(1)
            && y > area.y
            && y < (area.y + area.height).saturating_sub(1);
        if !inside {
            return None;
        }
        let index = self.list_state.offset() + (y - area.y - 1) as usize;
        (index < self.elements.len()).then_some(index)
    }

    /// Hovering a row activates its element; leaving the rows clears it
    pub fn handle_mouse_move(&mut self, x: u16, y: u16, area: Rect) -> Option<AnchorChange> {
        match self.index_at(x, y, area) {
            Some(index) if self.hovered != Some(index) => {
                self.hovered = Some(index);
                self.select(index)
            }
            Some(_) => None,
            None => {
                self.hovered.take()?;
                self.clear_selection()
            }
        }
    }

    pub fn handle_mouse_click(&mut self, x: u16, y: u16, area: Rect) -> Option<AnchorChange> {
        let index = self.index_at(x, y, area)?;
        self.hovered = Some(index);
        self.select(index)
    }

    /// Follow an anchor activated elsewhere, scrolling its element into view
    pub fn sync_with_anchor(&mut self, anchor: &ActiveAnchor) {
        let position = anchor
            .get()
            .and_then(|name| self.elements.iter().position(|e| e.id == name));
        if position != self.selected {
            self.selected = position;
            self.list_state.select(position);
        }
    }

    /// Rows rendered with the active-anchor highlight
    pub fn highlighted(&self, anchor: &ActiveAnchor) -> Vec<usize> {
        self.elements
            .iter()
            .enumerate()
            .filter(|(_, e)| anchor.is_active(&e.id))
            .map(|(i, _)| i)
            .collect()
    }

    pub fn render(
        &mut self,
        f: &mut Frame,
        area: Rect,
        is_focused: bool,
        anchor: &ActiveAnchor,
        palette: &Base16Palette,
    ) {
        let (text_color, border_color, _bg_color) = palette.get_panel_colors(is_focused);
        let (selection_bg, _selection_fg) = palette.get_selection_colors(is_focused);

        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!(" Elements ({}) ", self.elements.len()))
            .border_style(Style::default().fg(border_color))
            .style(Style::default().bg(palette.base_00));

        if self.elements.is_empty() {
            let inner = block.inner(area);
            f.render_widget(block, area);
            f.render_widget(
                Paragraph::new("No elements")
                    .style(Style::default().fg(palette.base_03))
                    .alignment(Alignment::Center),
                inner,
            );
            return;
        }

        let items: Vec<ListItem> = self
            .elements
            .iter()
            .map(|element| {
                ListItem::new(Line::from(vec![
                    Span::styled(element.id.clone(), palette.anchor_style(anchor.is_active(&element.id))),
                    Span::raw(" "),
                    Span::styled(element.name.clone(), Style::default().fg(text_color)),
                    Span::raw(" "),
                    Span::styled(
                        element.description.clone(),
                        Style::default().fg(palette.base_03),
                    ),
                ]))
            })
            .collect();

        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().bg(selection_bg))
            .style(Style::default().bg(palette.base_00));

        f.render_stateful_widget(list, area, &mut self.list_state);
    }
}

/// Description and saved flag shown above the element list
pub fn render_details(f: &mut Frame, area: Rect, document: &Document, palette: &Base16Palette) {
    let description = match &document.description {
        Some(text) => Span::styled(text.clone(), Style::default().fg(palette.base_05)),
        None => Span::styled(
            "No description",
            Style::default()
                .fg(palette.base_03)
                .add_modifier(Modifier::ITALIC),
        ),
    };
    let saved = if document.saved {
        Span::styled("● Saved", Style::default().fg(palette.base_0b))
    } else {
        Span::styled("○ Not saved", Style::default().fg(palette.base_03))
    };

    let details = Paragraph::new(vec![Line::from(saved), Line::from(description)])
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Details ")
                .border_style(Style::default().fg(palette.base_03)),
        );
    f.render_widget(details, area);
}
