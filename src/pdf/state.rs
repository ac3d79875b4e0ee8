//! Page navigation state

/// Whether a document with `page_count` pages gets a pagination control
#[must_use]
pub fn has_pagination(page_count: usize) -> bool {
    page_count >= 2
}

/// Current page state for a PDF document
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderState {
    /// Current page (1-indexed, always within `1..=page_count` once known)
    pub current_page: usize,

    /// Total page count, 0 until the document reports it
    pub page_count: usize,
}

impl Default for RenderState {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderState {
    #[must_use]
    pub fn new() -> Self {
        Self {
            current_page: 1,
            page_count: 0,
        }
    }

    fn clamp(&self, page: usize) -> usize {
        page.clamp(1, self.page_count.max(1))
    }

    /// Apply a command and return resulting effects
    #[must_use]
    pub fn apply(&mut self, cmd: Command) -> Vec<Effect> {
        match cmd {
            Command::GoToPage(page) => self.go_to(page),

            Command::NextPage => self.go_to(self.current_page.saturating_add(1)),

            Command::PrevPage => self.go_to(self.current_page.saturating_sub(1)),

            Command::FirstPage => self.go_to(1),

            Command::LastPage => self.go_to(self.page_count),

            Command::SetPageCount(count) => {
                self.page_count = count;
                self.current_page = self.clamp(self.current_page);
                if count == 0 {
                    vec![]
                } else {
                    vec![Effect::RenderCurrentPage]
                }
            }
        }
    }

    fn go_to(&mut self, page: usize) -> Vec<Effect> {
        if self.page_count == 0 {
            return vec![];
        }
        let clamped = self.clamp(page);
        if self.current_page != clamped {
            self.current_page = clamped;
            vec![Effect::RenderCurrentPage]
        } else {
            vec![]
        }
    }
}

/// Commands that modify render state
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Go to a page (1-indexed), clamped to the document
    GoToPage(usize),
    NextPage,
    PrevPage,
    FirstPage,
    LastPage,
    /// Document reported its page count
    SetPageCount(usize),
}

/// Side effects requested by a state change
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    RenderCurrentPage,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with_pages(count: usize) -> RenderState {
        let mut state = RenderState::new();
        let _ = state.apply(Command::SetPageCount(count));
        state
    }

    #[test]
    fn page_is_clamped_to_document() {
        let mut state = state_with_pages(3);

        assert_eq!(state.apply(Command::GoToPage(10)), vec![Effect::RenderCurrentPage]);
        assert_eq!(state.current_page, 3);

        assert_eq!(state.apply(Command::NextPage), vec![]);
        assert_eq!(state.current_page, 3);

        let _ = state.apply(Command::GoToPage(0));
        assert_eq!(state.current_page, 1);

        assert_eq!(state.apply(Command::PrevPage), vec![]);
        assert_eq!(state.current_page, 1);
    }

    #[test]
    fn first_and_last_page() {
        let mut state = state_with_pages(5);
        let _ = state.apply(Command::LastPage);
        assert_eq!(state.current_page, 5);
        let _ = state.apply(Command::FirstPage);
        assert_eq!(state.current_page, 1);
    }

    #[test]
    fn shrinking_page_count_pulls_current_page_back() {
        let mut state = state_with_pages(8);
        let _ = state.apply(Command::GoToPage(8));
        let _ = state.apply(Command::SetPageCount(2));
        assert_eq!(state.current_page, 2);
    }

    #[test]
    fn navigation_is_inert_without_pages() {
        let mut state = RenderState::new();
        assert_eq!(state.apply(Command::NextPage), vec![]);
        assert_eq!(state.current_page, 1);
        assert_eq!(state.apply(Command::SetPageCount(0)), vec![]);
    }

    #[test]
    fn pagination_needs_two_pages() {
        assert!(!has_pagination(state_with_pages(0).page_count));
        assert!(!has_pagination(state_with_pages(1).page_count));
        assert!(has_pagination(state_with_pages(2).page_count));
    }
}
