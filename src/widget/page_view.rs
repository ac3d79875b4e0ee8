//! Text-layer rendering of the current PDF page with interactive anchors

use ratatui::{
    Frame,
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::Style,
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use super::pagination;
use crate::anchor::{ActiveAnchor, AnchorChange};
use crate::pdf::{PageFragment, PageStatus, PageText, has_pagination};
use crate::theme::Base16Palette;

/// A fragment positioned in terminal cells
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlacedFragment {
    pub x: u16,
    pub y: u16,
    pub text: String,
    pub anchor: Option<String>,
}

impl PlacedFragment {
    fn contains(&self, x: u16, y: u16) -> bool {
        y == self.y && x >= self.x && x < self.x.saturating_add(self.text.width() as u16)
    }
}

/// A page's fragments mapped onto a terminal area.
///
/// Lines keep their vertical order; a line that would land on a row already
/// used is pushed down, and words on a line never overlap.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PageLayout {
    pub fragments: Vec<PlacedFragment>,
}

impl PageLayout {
    pub fn compute(page: &PageText, area: Rect) -> Self {
        if area.width == 0 || area.height == 0 || page.fragments.is_empty() {
            return Self::default();
        }

        let page_width = page.width.max(1.0);
        let page_height = page.height.max(1.0);

        // Text placed outside the page box (hidden or clipped by the PDF) is never shown
        let on_page = |f: &&PageFragment| {
            f.bounds.x0.is_finite() && f.bounds.y0.is_finite() && f.bounds.x0 < page_width
        };

        let mut lines: Vec<(usize, f32, Vec<&PageFragment>)> = Vec::new();
        for fragment in page.fragments.iter().filter(on_page) {
            match lines.iter_mut().find(|(id, _, _)| *id == fragment.line_id) {
                Some((_, _, words)) => words.push(fragment),
                None => lines.push((fragment.line_id, fragment.bounds.y0, vec![fragment])),
            }
        }
        lines.sort_by(|a, b| a.1.total_cmp(&b.1));

        let right = area.x.saturating_add(area.width);

        let mut placed = Vec::new();
        let mut next_row = 0u16;
        for (_, y0, mut words) in lines {
            let desired_row = ((y0 / page_height) * f32::from(area.height)).floor().max(0.0) as u16;
            let row = desired_row.max(next_row);
            if row >= area.height {
                break;
            }
            next_row = row + 1;

            words.sort_by(|a, b| a.bounds.x0.total_cmp(&b.bounds.x0));
            let mut cursor = area.x;
            for word in words {
                let offset =
                    ((word.bounds.x0 / page_width) * f32::from(area.width)).floor().max(0.0) as u16;
                let col = area.x.saturating_add(offset).max(cursor);
                if col >= right {
                    break;
                }
                let text = truncate_to_width(word.display_text(), (right - col) as usize);
                if text.is_empty() {
                    break;
                }
                let width = text.width() as u16;
                placed.push(PlacedFragment {
                    x: col,
                    y: area.y + row,
                    text,
                    anchor: word.kind.anchor_name().map(str::to_string),
                });
                cursor = col.saturating_add(width).saturating_add(1);
            }
        }

        Self { fragments: placed }
    }

    /// Anchor under a screen cell
    pub fn anchor_at(&self, x: u16, y: u16) -> Option<&str> {
        self.fragments
            .iter()
            .find(|f| f.anchor.is_some() && f.contains(x, y))
            .and_then(|f| f.anchor.as_deref())
    }

    /// Fragments drawn with the active-anchor highlight
    pub fn highlighted<'a>(&'a self, anchor: &'a ActiveAnchor) -> impl Iterator<Item = &'a PlacedFragment> {
        self.fragments
            .iter()
            .filter(move |f| f.anchor.as_deref().is_some_and(|name| anchor.is_active(name)))
    }

    pub fn render(&self, buf: &mut Buffer, anchor: &ActiveAnchor, palette: &Base16Palette) {
        let text_style = Style::default().fg(palette.base_05);
        for fragment in &self.fragments {
            let style = match &fragment.anchor {
                Some(name) => palette.anchor_style(anchor.is_active(name)),
                None => text_style,
            };
            buf.set_string(fragment.x, fragment.y, &fragment.text, style);
        }
    }
}

fn truncate_to_width(text: &str, max_width: usize) -> String {
    let mut width = 0;
    text.chars()
        .take_while(|c| {
            width += c.width().unwrap_or(0);
            width <= max_width
        })
        .collect()
}

/// Regions of the page panel
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageAreas {
    pub content: Rect,
    pub pagination: Option<Rect>,
}

impl PageAreas {
    /// Split the inside of the page block; the pagination row sits at the bottom
    pub fn compute(inner: Rect, page_count: usize) -> Self {
        if has_pagination(page_count) && inner.height >= 2 {
            let content = Rect::new(inner.x, inner.y, inner.width, inner.height - 1);
            let pagination = Rect::new(inner.x, inner.y + inner.height - 1, inner.width, 1);
            Self {
                content,
                pagination: Some(pagination),
            }
        } else {
            Self {
                content: inner,
                pagination: None,
            }
        }
    }
}

/// Hover tracking for anchors on the page
#[derive(Debug, Default)]
pub struct PageView {
    hovered: Option<String>,
}

impl PageView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget the hovered anchor, e.g. after the page changed.
    /// Returns true if an anchor was hovered.
    pub fn reset_hover(&mut self) -> bool {
        self.hovered.take().is_some()
    }

    /// Translate mouse movement into anchor enter/leave transitions
    pub fn handle_mouse_move(
        &mut self,
        x: u16,
        y: u16,
        content: Rect,
        page: Option<&PageText>,
    ) -> Option<AnchorChange> {
        let over = page.and_then(|page| {
            PageLayout::compute(page, content)
                .anchor_at(x, y)
                .map(str::to_string)
        });

        match over {
            Some(name) if self.hovered.as_deref() != Some(name.as_str()) => {
                self.hovered = Some(name.clone());
                Some(AnchorChange::Enter(name))
            }
            Some(_) => None,
            None => self.hovered.take().map(|_| AnchorChange::Leave),
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn render(
        &self,
        f: &mut Frame,
        area: Rect,
        is_focused: bool,
        status: &PageStatus,
        current_page: usize,
        page_count: usize,
        anchor: &ActiveAnchor,
        palette: &Base16Palette,
    ) {
        let (text_color, border_color, _bg_color) = palette.get_panel_colors(is_focused);
        let title = if page_count > 0 {
            format!(" Page {current_page}/{page_count} ")
        } else {
            " Page ".to_string()
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .title(title)
            .border_style(Style::default().fg(border_color));
        let inner = block.inner(area);
        f.render_widget(block, area);

        let areas = PageAreas::compute(inner, page_count);
        match status {
            PageStatus::Ready(page) => {
                PageLayout::compute(page, areas.content).render(f.buffer_mut(), anchor, palette);
            }
            PageStatus::LoadingDocument | PageStatus::LoadingPage => {
                render_message(f, areas.content, "Loading…", Style::default().fg(text_color));
            }
            PageStatus::Failed(err) => {
                render_message(f, areas.content, &err.to_string(), palette.error_style());
            }
        }

        if let Some(pagination_area) = areas.pagination {
            pagination::render(f, pagination_area, current_page, page_count, palette);
        }
    }
}

/// Centered single-message placeholder for a view region
pub fn render_message(f: &mut Frame, area: Rect, message: &str, style: Style) {
    if area.height == 0 {
        return;
    }
    let row = Rect::new(area.x, area.y + area.height / 2, area.width, 1);
    Paragraph::new(message.to_string())
        .style(style)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(row, f.buffer_mut());
}
