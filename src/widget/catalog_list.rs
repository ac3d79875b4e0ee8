use crate::document::Document;
use crate::theme::Base16Palette;
use ratatui::{
    Frame,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState},
};

pub struct CatalogList {
    pub selected: usize,
    pub list_state: ListState,
    documents: Vec<Document>,
}

impl CatalogList {
    pub fn new(documents: Vec<Document>) -> Self {
        let mut list_state = ListState::default();
        if !documents.is_empty() {
            list_state.select(Some(0));
        }

        Self {
            selected: 0,
            list_state,
            documents,
        }
    }

    pub fn move_selection_down(&mut self) {
        if self.selected < self.documents.len().saturating_sub(1) {
            self.selected += 1;
            self.list_state.select(Some(self.selected));
        }
    }

    pub fn move_selection_up(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
            self.list_state.select(Some(self.selected));
        }
    }

    pub fn get_selected_document(&self) -> Option<&Document> {
        self.documents.get(self.selected)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Handle mouse click at the given position
    /// Returns true if an item was clicked
    pub fn handle_mouse_click(&mut self, _x: u16, y: u16, area: Rect) -> bool {
        // Skip the top and bottom border rows
        if y > area.y && y + 1 < area.y + area.height {
            let new_index = self.list_state.offset() + (y - area.y - 1) as usize;
            if new_index < self.documents.len() {
                self.selected = new_index;
                self.list_state.select(Some(new_index));
                return true;
            }
        }
        false
    }

    pub fn render(&mut self, f: &mut Frame, area: Rect, is_focused: bool, palette: &Base16Palette) {
        let (text_color, border_color, _bg_color) = palette.get_panel_colors(is_focused);
        let (selection_bg, selection_fg) = palette.get_selection_colors(is_focused);

        let id_width = self
            .documents
            .iter()
            .map(|doc| Document::display_title(&doc.id).chars().count())
            .max()
            .unwrap_or(0);

        let items: Vec<ListItem> = self
            .documents
            .iter()
            .map(|doc| {
                let marker = if doc.saved {
                    Span::styled("● ", Style::default().fg(palette.base_0b))
                } else {
                    Span::raw("  ")
                };
                let title = format!("{:<id_width$}", Document::display_title(&doc.id));
                let description = doc.description.clone().unwrap_or_default();
                ListItem::new(Line::from(vec![
                    marker,
                    Span::styled(title, Style::default().fg(text_color)),
                    Span::raw("  "),
                    Span::styled(description, Style::default().fg(palette.base_03)),
                ]))
            })
            .collect();

        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(" Catalog ")
                    .border_style(Style::default().fg(border_color))
                    .style(Style::default().bg(palette.base_00)),
            )
            .highlight_style(Style::default().bg(selection_bg).fg(selection_fg))
            .style(Style::default().bg(palette.base_00));

        f.render_stateful_widget(list, area, &mut self.list_state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_data::MockCatalog;

    #[test]
    fn selection_stays_in_bounds() {
        let catalog = MockCatalog::new();
        let mut list = CatalogList::new(catalog.fixed().to_vec());

        list.move_selection_up();
        assert_eq!(list.get_selected_document().map(|d| d.id.as_str()), Some("test"));
        list.move_selection_down();
        list.move_selection_down();
        assert_eq!(list.get_selected_document().map(|d| d.id.as_str()), Some("test2"));
    }

    #[test]
    fn click_selects_row_under_cursor() {
        let catalog = MockCatalog::new();
        let mut list = CatalogList::new(catalog.fixed().to_vec());
        let area = Rect::new(0, 0, 40, 10);

        assert!(list.handle_mouse_click(3, 2, area));
        assert_eq!(list.selected, 1);
        assert!(!list.handle_mouse_click(3, 0, area));
        assert!(!list.handle_mouse_click(3, 5, area));
        assert_eq!(list.selected, 1);
    }
}
