//! Application state and logic

use std::time::{Duration, Instant};

use shelf_core::{Item, ItemDraft, ItemPatch, Store};

use crate::commands::item::title_case;

/// Lowest and highest rating reachable with +/-
const RATING_MIN: i64 = 1;
const RATING_MAX: i64 = 10;

/// Input mode for the application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// Normal navigation mode
    Normal,
    /// Typing into the prompt line
    Prompt,
}

/// What the prompt line is collecting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    /// Name of a new item in the active category
    Add,
    /// New name for the selected item
    Rename,
    /// New year for the selected item
    Year,
}

impl PromptKind {
    pub fn label(self) -> &'static str {
        match self {
            PromptKind::Add => "Add",
            PromptKind::Rename => "Name",
            PromptKind::Year => "Year",
        }
    }
}

/// Application state
pub struct App {
    /// Whether the app should exit
    pub should_quit: bool,
    /// Current input mode
    pub input_mode: InputMode,
    /// What the prompt is for
    pub prompt_kind: Option<PromptKind>,
    /// Prompt input buffer
    pub input: String,
    /// Cursor position in the prompt, in characters
    pub cursor: usize,
    /// Category tabs with item counts
    pub tabs: Vec<(String, usize)>,
    /// Index of the active tab
    pub tab_index: usize,
    /// Items of the active category in display order
    pub items: Vec<Item>,
    /// Currently selected item index
    pub item_index: usize,
    /// Whether the list is sorted by rating
    pub sorted: bool,
    /// Status message to display temporarily
    pub status_message: Option<String>,
    /// When the status message was set (for auto-dismiss)
    pub status_message_time: Option<Instant>,
    /// Error shown in a modal until a key is pressed
    pub error: Option<String>,
    /// Whether help overlay is visible
    pub show_help: bool,
}

impl App {
    /// Create a new app with data from store
    pub fn new(store: &Store) -> Self {
        let mut app = Self {
            should_quit: false,
            input_mode: InputMode::Normal,
            prompt_kind: None,
            input: String::new(),
            cursor: 0,
            tabs: Vec::new(),
            tab_index: 0,
            items: Vec::new(),
            item_index: 0,
            sorted: false,
            status_message: None,
            status_message_time: None,
            error: None,
            show_help: false,
        };
        app.refresh(store);
        app
    }

    /// Reload tabs and items from the store
    pub fn refresh(&mut self, store: &Store) {
        let state = store.state();
        self.tabs = store.categories();
        self.tab_index = self
            .tabs
            .iter()
            .position(|(kind, _)| *kind == state.active_type)
            .unwrap_or(0);
        self.items = store.visible_items().into_iter().cloned().collect();
        self.sorted = state.sort_by_rating;

        if self.items.is_empty() {
            self.item_index = 0;
        } else {
            self.item_index = self.item_index.min(self.items.len() - 1);
        }
    }

    /// Name of the active category
    pub fn active_type(&self) -> Option<&str> {
        self.tabs.get(self.tab_index).map(|(kind, _)| kind.as_str())
    }

    /// Get the currently selected item
    pub fn current_item(&self) -> Option<&Item> {
        self.items.get(self.item_index)
    }

    /// Set a status message (will auto-dismiss after 3 seconds)
    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
        self.status_message_time = Some(Instant::now());
    }

    /// Check and clear expired status message
    pub fn check_status_timeout(&mut self) {
        if let Some(time) = self.status_message_time {
            if time.elapsed() > Duration::from_secs(3) {
                self.status_message = None;
                self.status_message_time = None;
            }
        }
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// Toggle help overlay
    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    // ==================== Navigation ====================

    pub fn move_up(&mut self) {
        self.item_index = self.item_index.saturating_sub(1);
    }

    pub fn move_down(&mut self) {
        if self.item_index < self.items.len().saturating_sub(1) {
            self.item_index += 1;
        }
    }

    pub fn move_to_first(&mut self) {
        self.item_index = 0;
    }

    pub fn move_to_last(&mut self) {
        self.item_index = self.items.len().saturating_sub(1);
    }

    /// Switch to the next category tab (wrapping)
    pub fn next_tab(&mut self, store: &mut Store) -> anyhow::Result<()> {
        if self.tabs.is_empty() {
            return Ok(());
        }
        let index = (self.tab_index + 1) % self.tabs.len();
        self.select_tab(store, index)
    }

    /// Switch to the previous category tab (wrapping)
    pub fn prev_tab(&mut self, store: &mut Store) -> anyhow::Result<()> {
        if self.tabs.is_empty() {
            return Ok(());
        }
        let index = (self.tab_index + self.tabs.len() - 1) % self.tabs.len();
        self.select_tab(store, index)
    }

    fn select_tab(&mut self, store: &mut Store, index: usize) -> anyhow::Result<()> {
        let Some((kind, _)) = self.tabs.get(index).cloned() else {
            return Ok(());
        };
        self.item_index = 0;
        let result = store.set_active_type(&kind);
        self.refresh(store);
        result
    }

    // ==================== Mutations ====================

    /// Swap the selected item with its neighbour; `up` moves it towards the top
    pub fn move_current(&mut self, store: &mut Store, up: bool) -> anyhow::Result<()> {
        if self.sorted {
            self.set_status("Manual ordering is disabled while sorting by rating (s)");
            return Ok(());
        }
        let Some(item) = self.current_item() else {
            return Ok(());
        };
        let id = item.id.clone();

        let target = if up {
            if self.item_index == 0 {
                return Ok(());
            }
            self.item_index - 1
        } else {
            if self.item_index + 1 >= self.items.len() {
                return Ok(());
            }
            self.item_index + 1
        };

        let result = store.move_item(&id, target);
        self.item_index = target;
        self.refresh(store);
        result
    }

    /// Flip rating sort
    pub fn toggle_sort(&mut self, store: &mut Store) -> anyhow::Result<()> {
        let result = store.toggle_sort();
        self.refresh(store);
        let sorted = result?;
        self.set_status(if sorted {
            "Sorted by rating"
        } else {
            "Manual order"
        });
        Ok(())
    }

    /// Change the selected item's rating by `delta`, within 1..=10
    pub fn adjust_rating(&mut self, store: &mut Store, delta: i64) -> anyhow::Result<()> {
        let Some(item) = self.current_item() else {
            return Ok(());
        };
        let id = item.id.clone();
        let rating = (item.display_rating() + delta).clamp(RATING_MIN, RATING_MAX);
        if rating == item.display_rating() {
            return Ok(());
        }

        let patch = ItemPatch {
            rating: Some(rating),
            ..Default::default()
        };
        let result = store.update_item(&id, patch);
        self.refresh(store);
        self.follow(&id);
        result.map(|_| ())
    }

    /// Delete the selected item
    pub fn delete_current(&mut self, store: &mut Store) -> anyhow::Result<()> {
        let Some(item) = self.current_item().cloned() else {
            return Ok(());
        };
        let result = store.delete_item(&item.id);
        self.refresh(store);
        result?;
        self.set_status(format!("Deleted '{}'", item.name));
        Ok(())
    }

    // ==================== Prompt ====================

    /// Open the prompt line, pre-filled where it makes sense
    pub fn start_prompt(&mut self, kind: PromptKind) {
        let initial = match kind {
            PromptKind::Add => String::new(),
            PromptKind::Rename => match self.current_item() {
                Some(item) => item.name.clone(),
                None => return,
            },
            PromptKind::Year => match self.current_item() {
                Some(item) => item.year.clone(),
                None => return,
            },
        };

        self.input_mode = InputMode::Prompt;
        self.prompt_kind = Some(kind);
        self.cursor = initial.chars().count();
        self.input = initial;
    }

    /// Close the prompt without applying it
    pub fn cancel_prompt(&mut self) {
        self.input_mode = InputMode::Normal;
        self.prompt_kind = None;
        self.input.clear();
        self.cursor = 0;
    }

    /// Apply the prompt to the store and close it
    pub fn submit_prompt(&mut self, store: &mut Store) -> anyhow::Result<()> {
        let kind = self.prompt_kind;
        let input = self.input.trim().to_string();
        self.cancel_prompt();

        match kind {
            Some(PromptKind::Add) => {
                let name = title_case(&input);
                if name.is_empty() {
                    self.set_status("Add cancelled (empty name)");
                    return Ok(());
                }
                let Some(kind) = self.active_type().map(str::to_string) else {
                    return Ok(());
                };
                let result = store.add_item(ItemDraft::new(kind, name));
                self.refresh(store);
                let item = result?;
                self.follow(&item.id);
                self.set_status(format!("Added '{}'", item.name));
            }
            Some(PromptKind::Rename) => {
                let name = title_case(&input);
                if name.is_empty() {
                    self.set_status("Rename cancelled (empty name)");
                    return Ok(());
                }
                self.patch_current(
                    store,
                    ItemPatch {
                        name: Some(name),
                        ..Default::default()
                    },
                )?;
            }
            Some(PromptKind::Year) => {
                self.patch_current(
                    store,
                    ItemPatch {
                        year: Some(input),
                        ..Default::default()
                    },
                )?;
            }
            None => {}
        }
        Ok(())
    }

    fn patch_current(&mut self, store: &mut Store, patch: ItemPatch) -> anyhow::Result<()> {
        let Some(id) = self.current_item().map(|i| i.id.clone()) else {
            return Ok(());
        };
        let result = store.update_item(&id, patch);
        self.refresh(store);
        self.follow(&id);
        result?;
        self.set_status("Item updated");
        Ok(())
    }

    /// Keep the selection on `id` after the list changed
    fn follow(&mut self, id: &str) {
        if let Some(pos) = self.items.iter().position(|i| i.id == id) {
            self.item_index = pos;
        }
    }

    /// Insert character at cursor position
    pub fn insert_char(&mut self, c: char) {
        let at = byte_offset(&self.input, self.cursor);
        self.input.insert(at, c);
        self.cursor += 1;
    }

    /// Delete character before cursor
    pub fn delete_char(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let at = byte_offset(&self.input, self.cursor);
            self.input.remove(at);
        }
    }

    pub fn cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        if self.cursor < self.input.chars().count() {
            self.cursor += 1;
        }
    }
}

/// Byte index of the `chars`-th character
fn byte_offset(s: &str, chars: usize) -> usize {
    s.char_indices()
        .nth(chars)
        .map(|(idx, _)| idx)
        .unwrap_or(s.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shelf_core::{Config, MemoryKv};

    fn store() -> Store {
        Store::with_backend(Box::new(MemoryKv::new()), Config::default())
    }

    fn names(app: &App) -> Vec<&str> {
        app.items.iter().map(|i| i.name.as_str()).collect()
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.insert_char(c);
        }
    }

    #[test]
    fn test_new_shows_configured_tabs() {
        let store = store();
        let app = App::new(&store);

        assert_eq!(app.active_type(), Some("movies"));
        assert_eq!(app.tabs.len(), 2);
        assert!(app.items.is_empty());
        assert!(app.current_item().is_none());
    }

    #[test]
    fn test_add_through_prompt() {
        let mut store = store();
        let mut app = App::new(&store);

        app.start_prompt(PromptKind::Add);
        assert_eq!(app.input_mode, InputMode::Prompt);
        type_text(&mut app, "blade runner");
        app.submit_prompt(&mut store).unwrap();

        assert_eq!(app.input_mode, InputMode::Normal);
        assert_eq!(names(&app), vec!["Blade Runner"]);
        assert_eq!(app.current_item().unwrap().rating, 5);
    }

    #[test]
    fn test_empty_add_is_cancelled() {
        let mut store = store();
        let mut app = App::new(&store);

        app.start_prompt(PromptKind::Add);
        type_text(&mut app, "   ");
        app.submit_prompt(&mut store).unwrap();

        assert!(store.state().items.is_empty());
        assert!(app.status_message.is_some());
    }

    #[test]
    fn test_rename_prefills_current_name() {
        let mut store = store();
        store.add_item(ItemDraft::new("movies", "Alien")).unwrap();
        let mut app = App::new(&store);

        app.start_prompt(PromptKind::Rename);
        assert_eq!(app.input, "Alien");
        assert_eq!(app.cursor, 5);

        type_text(&mut app, "s");
        app.submit_prompt(&mut store).unwrap();
        assert_eq!(names(&app), vec!["Aliens"]);
    }

    #[test]
    fn test_rename_without_selection_does_nothing() {
        let store = store();
        let mut app = App::new(&store);

        app.start_prompt(PromptKind::Rename);
        assert_eq!(app.input_mode, InputMode::Normal);
    }

    #[test]
    fn test_tab_switching_persists_active_type() {
        let mut store = store();
        store.add_item(ItemDraft::new("series", "Dark")).unwrap();
        let mut app = App::new(&store);

        app.next_tab(&mut store).unwrap();
        assert_eq!(app.active_type(), Some("series"));
        assert_eq!(store.state().active_type, "series");
        assert_eq!(names(&app), vec!["Dark"]);

        // Wraps around
        app.next_tab(&mut store).unwrap();
        assert_eq!(app.active_type(), Some("movies"));
        app.prev_tab(&mut store).unwrap();
        assert_eq!(app.active_type(), Some("series"));
    }

    #[test]
    fn test_move_current() {
        let mut store = store();
        store.add_item(ItemDraft::new("movies", "A")).unwrap();
        store.add_item(ItemDraft::new("movies", "B")).unwrap();
        store.add_item(ItemDraft::new("movies", "C")).unwrap();
        let mut app = App::new(&store);

        app.move_current(&mut store, false).unwrap();
        assert_eq!(names(&app), vec!["B", "A", "C"]);
        assert_eq!(app.current_item().unwrap().name, "A");

        app.move_to_last();
        app.move_current(&mut store, true).unwrap();
        assert_eq!(names(&app), vec!["B", "C", "A"]);

        // Top item cannot move further up
        app.move_to_first();
        app.move_current(&mut store, true).unwrap();
        assert_eq!(names(&app), vec!["B", "C", "A"]);
    }

    #[test]
    fn test_move_blocked_while_sorted() {
        let mut store = store();
        store.add_item(ItemDraft::new("movies", "A")).unwrap();
        store.add_item(ItemDraft::new("movies", "B")).unwrap();
        let mut app = App::new(&store);

        app.toggle_sort(&mut store).unwrap();
        assert!(app.sorted);
        app.move_current(&mut store, false).unwrap();

        assert_eq!(names(&app), vec!["A", "B"]);
        assert!(app.status_message.is_some());
    }

    #[test]
    fn test_adjust_rating_clamps() {
        let mut store = store();
        store
            .add_item(ItemDraft::new("movies", "A").rating(9))
            .unwrap();
        let mut app = App::new(&store);

        app.adjust_rating(&mut store, 1).unwrap();
        app.adjust_rating(&mut store, 1).unwrap();
        assert_eq!(app.current_item().unwrap().rating, 10);

        for _ in 0..12 {
            app.adjust_rating(&mut store, -1).unwrap();
        }
        assert_eq!(app.current_item().unwrap().rating, 1);
    }

    #[test]
    fn test_sorted_selection_follows_rated_item() {
        let mut store = store();
        store.add_item(ItemDraft::new("movies", "A").rating(6)).unwrap();
        store.add_item(ItemDraft::new("movies", "B").rating(7)).unwrap();
        let mut app = App::new(&store);
        app.toggle_sort(&mut store).unwrap();
        assert_eq!(names(&app), vec!["B", "A"]);

        app.move_to_last();
        app.adjust_rating(&mut store, 2).unwrap();
        assert_eq!(names(&app), vec!["A", "B"]);
        assert_eq!(app.current_item().unwrap().name, "A");
    }

    #[test]
    fn test_delete_current_clamps_selection() {
        let mut store = store();
        store.add_item(ItemDraft::new("movies", "A")).unwrap();
        store.add_item(ItemDraft::new("movies", "B")).unwrap();
        let mut app = App::new(&store);

        app.move_to_last();
        app.delete_current(&mut store).unwrap();
        assert_eq!(names(&app), vec!["A"]);
        assert_eq!(app.item_index, 0);

        app.delete_current(&mut store).unwrap();
        assert!(app.items.is_empty());
        // Nothing selected: no-op
        app.delete_current(&mut store).unwrap();
    }

    #[test]
    fn test_prompt_editing_handles_multibyte() {
        let store = store();
        let mut app = App::new(&store);

        app.start_prompt(PromptKind::Add);
        type_text(&mut app, "açã");
        app.cursor_left();
        app.delete_char();
        assert_eq!(app.input, "aã");
        app.cursor_right();
        app.insert_char('o');
        assert_eq!(app.input, "aão");

        app.cancel_prompt();
        assert!(app.input.is_empty());
        assert_eq!(app.input_mode, InputMode::Normal);
    }

    #[test]
    fn test_status_and_error() {
        let store = store();
        let mut app = App::new(&store);

        app.set_status("hello");
        app.check_status_timeout();
        assert_eq!(app.status_message.as_deref(), Some("hello"));

        app.set_error("boom");
        assert!(app.has_error());
        app.clear_error();
        assert!(!app.has_error());
    }
}
