//! Page selector shown under the page when a document has several pages

use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};
use unicode_width::UnicodeWidthStr;

use crate::theme::Base16Palette;

const BOUNDARY_COUNT: i64 = 1;
const SIBLING_COUNT: i64 = 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageItem {
    Previous,
    Page(usize),
    Ellipsis,
    Next,
}

impl PageItem {
    fn label(&self) -> String {
        match self {
            PageItem::Previous => " ‹ ".to_string(),
            PageItem::Next => " › ".to_string(),
            PageItem::Ellipsis => " … ".to_string(),
            PageItem::Page(n) => format!(" {n} "),
        }
    }

    /// Page this item leads to from `current`, if it is enabled
    pub fn target(&self, current: usize, count: usize) -> Option<usize> {
        match *self {
            PageItem::Previous if current > 1 => Some(current - 1),
            PageItem::Next if current < count => Some(current + 1),
            PageItem::Page(n) if n != current => Some(n),
            _ => None,
        }
    }
}

fn range(start: i64, end: i64) -> impl Iterator<Item = i64> {
    start..=end
}

/// Items of the page selector: first and last page, the current page with one
/// neighbour on each side, ellipses for the gaps.
pub fn pagination_items(page: usize, count: usize) -> Vec<PageItem> {
    let page = page as i64;
    let count = count as i64;

    let start_pages: Vec<i64> = range(1, BOUNDARY_COUNT.min(count)).collect();
    let end_pages: Vec<i64> = range((count - BOUNDARY_COUNT + 1).max(BOUNDARY_COUNT + 1), count).collect();

    let siblings_start = (page - SIBLING_COUNT)
        .min(count - BOUNDARY_COUNT - SIBLING_COUNT * 2 - 1)
        .max(BOUNDARY_COUNT + 2);
    let siblings_end = (page + SIBLING_COUNT)
        .max(BOUNDARY_COUNT + SIBLING_COUNT * 2 + 2)
        .min(end_pages.first().map_or(count - 1, |first| first - 2));

    let mut items = vec![PageItem::Previous];
    items.extend(start_pages.iter().map(|&p| PageItem::Page(p as usize)));

    if siblings_start > BOUNDARY_COUNT + 2 {
        items.push(PageItem::Ellipsis);
    } else if BOUNDARY_COUNT + 1 < count - BOUNDARY_COUNT {
        items.push(PageItem::Page((BOUNDARY_COUNT + 1) as usize));
    }

    items.extend(range(siblings_start, siblings_end).map(|p| PageItem::Page(p as usize)));

    if siblings_end < count - BOUNDARY_COUNT - 1 {
        items.push(PageItem::Ellipsis);
    } else if count - BOUNDARY_COUNT > BOUNDARY_COUNT {
        items.push(PageItem::Page((count - BOUNDARY_COUNT) as usize));
    }

    items.extend(end_pages.iter().map(|&p| PageItem::Page(p as usize)));
    items.push(PageItem::Next);
    items
}

/// Screen positions of the selector items, centered in `area`
pub fn layout(page: usize, count: usize, area: Rect) -> Vec<(Rect, PageItem)> {
    let items = pagination_items(page, count);
    let total: u16 = items.iter().map(|item| item.label().width() as u16).sum();
    let mut x = area.x + area.width.saturating_sub(total) / 2;

    let mut placed = Vec::with_capacity(items.len());
    for item in items {
        let width = item.label().width() as u16;
        if x + width > area.x + area.width {
            break;
        }
        placed.push((Rect::new(x, area.y, width, 1), item));
        x += width;
    }
    placed
}

/// Page chosen by a click at (x, y), if any
pub fn handle_click(x: u16, y: u16, page: usize, count: usize, area: Rect) -> Option<usize> {
    layout(page, count, area)
        .into_iter()
        .find(|(rect, _)| y == rect.y && x >= rect.x && x < rect.x + rect.width)
        .and_then(|(_, item)| item.target(page, count))
}

pub fn render(f: &mut Frame, area: Rect, page: usize, count: usize, palette: &Base16Palette) {
    let placed = layout(page, count, area);
    let Some((first, _)) = placed.first() else {
        return;
    };
    let offset = first.x - area.x;

    let mut spans = vec![Span::raw(" ".repeat(offset as usize))];
    for (_, item) in &placed {
        let style = match item {
            PageItem::Page(n) if *n == page => Style::default()
                .fg(palette.base_00)
                .bg(palette.base_0d)
                .add_modifier(Modifier::BOLD),
            PageItem::Ellipsis => Style::default().fg(palette.base_03),
            _ if item.target(page, count).is_none() => Style::default().fg(palette.base_03),
            _ => Style::default().fg(palette.base_05),
        };
        spans.push(Span::styled(item.label(), style));
    }

    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use PageItem::*;

    #[test]
    fn two_pages() {
        assert_eq!(pagination_items(1, 2), vec![Previous, Page(1), Page(2), Next]);
    }

    #[test]
    fn short_documents_list_every_page() {
        assert_eq!(
            pagination_items(3, 5),
            vec![Previous, Page(1), Page(2), Page(3), Page(4), Page(5), Next]
        );
        assert_eq!(
            pagination_items(1, 7),
            vec![Previous, Page(1), Page(2), Page(3), Page(4), Page(5), Page(6), Page(7), Next]
        );
    }

    #[test]
    fn long_documents_collapse_gaps() {
        assert_eq!(
            pagination_items(1, 10),
            vec![Previous, Page(1), Page(2), Page(3), Page(4), Page(5), Ellipsis, Page(10), Next]
        );
        assert_eq!(
            pagination_items(5, 10),
            vec![Previous, Page(1), Ellipsis, Page(4), Page(5), Page(6), Ellipsis, Page(10), Next]
        );
        assert_eq!(
            pagination_items(10, 10),
            vec![Previous, Page(1), Ellipsis, Page(6), Page(7), Page(8), Page(9), Page(10), Next]
        );
    }

    #[test]
    fn disabled_items_have_no_target() {
        assert_eq!(Previous.target(1, 3), None);
        assert_eq!(Next.target(3, 3), None);
        assert_eq!(Page(2).target(2, 3), None);
        assert_eq!(Ellipsis.target(2, 9), None);
        assert_eq!(Next.target(1, 3), Some(2));
        assert_eq!(Page(3).target(1, 3), Some(3));
    }

    #[test]
    fn clicks_map_to_pages() {
        let area = Rect::new(0, 10, 40, 1);
        let placed = layout(1, 3, area);
        let (rect, item) = placed[3];
        assert_eq!(item, Page(3));

        assert_eq!(handle_click(rect.x + 1, 10, 1, 3, area), Some(3));
        assert_eq!(handle_click(rect.x + 1, 9, 1, 3, area), None);
        assert_eq!(handle_click(0, 10, 1, 3, area), None);
    }
}
