// Selectable list state shared by the browser tabs.
// Tracks loading status and keyboard selection over loaded items.

use ratatui::widgets::ListState;

/// Loading state for data read from disk.
#[derive(Debug, Clone, Default)]
pub enum LoadingState<T> {
    #[default]
    Idle,
    Loaded(T),
    Error(String),
}

impl<T> LoadingState<T> {
    pub fn is_loaded(&self) -> bool {
        matches!(self, LoadingState::Loaded(_))
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            LoadingState::Loaded(data) => Some(data),
            _ => None,
        }
    }
}

/// State for a selectable list with keyboard navigation.
#[derive(Debug, Clone)]
pub struct SelectableList<T> {
    pub data: LoadingState<Vec<T>>,
    pub list_state: ListState,
}

impl<T> Default for SelectableList<T> {
    fn default() -> Self {
        Self {
            data: LoadingState::Idle,
            list_state: ListState::default(),
        }
    }
}

impl<T> SelectableList<T> {
    pub fn len(&self) -> usize {
        self.data.data().map_or(0, Vec::len)
    }

    /// Select the next item in the list.
    pub fn select_next(&mut self) {
        let len = self.len();
        if len == 0 {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) if i >= len - 1 => i,
            Some(i) => i + 1,
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    /// Select the previous item in the list.
    pub fn select_prev(&mut self) {
        if self.len() == 0 {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) => i.saturating_sub(1),
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    pub fn select_first(&mut self) {
        if self.len() > 0 {
            self.list_state.select(Some(0));
        }
    }

    pub fn select_last(&mut self) {
        let len = self.len();
        if len > 0 {
            self.list_state.select(Some(len - 1));
        }
    }

    /// Get the selected item.
    pub fn selected_item(&self) -> Option<&T> {
        let index = self.list_state.selected()?;
        self.data.data()?.get(index)
    }

    /// Set loaded data, keeping the selection index when still in range.
    pub fn set_loaded(&mut self, items: Vec<T>) {
        let len = items.len();
        self.data = LoadingState::Loaded(items);
        let selected = match self.list_state.selected() {
            _ if len == 0 => None,
            Some(i) => Some(i.min(len - 1)),
            None => Some(0),
        };
        self.list_state.select(selected);
    }

    pub fn set_error(&mut self, error: String) {
        self.data = LoadingState::Error(error);
        self.list_state.select(None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_navigation_clamps() {
        let mut list = SelectableList::default();
        list.select_next();
        assert_eq!(list.list_state.selected(), None);

        list.set_loaded(vec!["a", "b", "c"]);
        assert_eq!(list.selected_item(), Some(&"a"));

        list.select_prev();
        assert_eq!(list.selected_item(), Some(&"a"));

        list.select_last();
        list.select_next();
        assert_eq!(list.selected_item(), Some(&"c"));
    }

    #[test]
    fn test_reload_keeps_selection_in_range() {
        let mut list = SelectableList::default();
        list.set_loaded(vec![1, 2, 3]);
        list.select_last();

        list.set_loaded(vec![1]);
        assert_eq!(list.selected_item(), Some(&1));

        list.set_loaded(Vec::new());
        assert_eq!(list.selected_item(), None);
    }

    #[test]
    fn test_error_clears_selection() {
        let mut list: SelectableList<u8> = SelectableList::default();
        list.set_loaded(vec![1]);
        list.set_error("boom".to_string());

        assert!(!list.data.is_loaded());
        assert_eq!(list.selected_item(), None);
    }
}
