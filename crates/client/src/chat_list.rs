//! Sidebar conversation list.

use proto::{ChatId, ConversationSummary, ValidationError};

use crate::edit::{EditState, SaveOutcome};
use crate::render::truncate_title;

/// One sidebar row: the summary plus its edit mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatListItem {
    pub summary: ConversationSummary,
    pub edit: EditState,
}

impl ChatListItem {
    fn new(summary: ConversationSummary) -> Self {
        Self {
            summary,
            edit: EditState::View,
        }
    }

    pub fn id(&self) -> &ChatId {
        &self.summary.id
    }

    /// Full, untruncated title.
    pub fn title(&self) -> &str {
        &self.summary.title
    }

    /// View-mode label.
    pub fn label(&self) -> String {
        truncate_title(&self.summary.title)
    }

    pub fn is_active(&self) -> bool {
        self.summary.is_active
    }
}

/// Ordered conversation list, newest first, with at most one active item
/// and at most one item in edit mode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatListView {
    items: Vec<ChatListItem>,
}

impl ChatListView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the list from server-rendered summaries, keeping only the first active marker.
    pub fn from_summaries(summaries: impl IntoIterator<Item = ConversationSummary>) -> Self {
        let mut seen_active = false;
        let items = summaries
            .into_iter()
            .map(|mut summary| {
                summary.is_active = summary.is_active && !seen_active;
                seen_active |= summary.is_active;
                ChatListItem::new(summary)
            })
            .collect();
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChatListItem> {
        self.items.iter()
    }

    pub fn get(&self, id: &ChatId) -> Option<&ChatListItem> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn get_index(&self, index: usize) -> Option<&ChatListItem> {
        self.items.get(index)
    }

    pub fn position(&self, id: &ChatId) -> Option<usize> {
        self.items.iter().position(|item| item.id() == id)
    }

    pub fn contains(&self, id: &ChatId) -> bool {
        self.get(id).is_some()
    }

    fn get_mut(&mut self, id: &ChatId) -> Option<&mut ChatListItem> {
        self.items.iter_mut().find(|item| item.id() == id)
    }

    /// Prepends an entry. An existing entry with the same id is replaced.
    ///
    /// Only `make_active` clears other active markers.
    pub fn insert(&mut self, id: ChatId, title: impl Into<String>, make_active: bool) {
        self.items.retain(|item| item.id() != &id);
        if make_active {
            self.clear_active();
        }
        let mut summary = ConversationSummary::new(id, title);
        summary.is_active = make_active;
        self.items.insert(0, ChatListItem::new(summary));
    }

    pub fn remove(&mut self, id: &ChatId) -> Option<ChatListItem> {
        let index = self.position(id)?;
        Some(self.items.remove(index))
    }

    /// Marks `id` active (or none) and clears every other marker.
    pub fn set_active(&mut self, id: Option<&ChatId>) {
        for item in &mut self.items {
            item.summary.is_active = Some(item.id()) == id;
        }
    }

    fn clear_active(&mut self) {
        self.set_active(None);
    }

    pub fn active_id(&self) -> Option<&ChatId> {
        self.items
            .iter()
            .find(|item| item.is_active())
            .map(ChatListItem::id)
    }

    /// Replaces the stored title. Returns `false` when the id is unknown.
    pub fn update_title(&mut self, id: &ChatId, title: impl Into<String>) -> bool {
        match self.get_mut(id) {
            Some(item) => {
                item.summary.title = title.into();
                true
            }
            None => false,
        }
    }

    pub fn editing_id(&self) -> Option<&ChatId> {
        self.items
            .iter()
            .find(|item| item.edit.is_editing())
            .map(ChatListItem::id)
    }

    /// Cancels any edit in progress and returns the id it belonged to.
    pub fn cancel_all_edits(&mut self) -> Option<ChatId> {
        let mut cancelled = None;
        for item in &mut self.items {
            if item.edit.is_editing() {
                item.edit.cancel();
                cancelled = Some(item.summary.id.clone());
            }
        }
        cancelled
    }

    /// Puts `id` into edit mode, force-cancelling any other edit first.
    ///
    /// Returns the id whose edit was cancelled, if any.
    pub fn begin_edit(&mut self, id: &ChatId) -> Result<Option<ChatId>, ValidationError> {
        if !self.contains(id) {
            return Err(ValidationError::UnknownChat(id.to_string()));
        }
        if self.editing_id() == Some(id) {
            return Ok(None);
        }
        let cancelled = self.cancel_all_edits();
        if let Some(item) = self.get_mut(id) {
            item.edit = EditState::begin(&item.summary.title);
        }
        Ok(cancelled)
    }

    pub fn cancel_edit(&mut self, id: &ChatId) -> bool {
        match self.get_mut(id) {
            Some(item) if item.edit.is_editing() => {
                item.edit.cancel();
                true
            }
            _ => false,
        }
    }

    /// Editable draft of `id`, if it is in edit mode and not saving.
    pub fn draft_mut(&mut self, id: &ChatId) -> Option<&mut String> {
        self.get_mut(id)?.edit.draft_mut()
    }

    /// Validates the draft of `id`; see [`EditState::prepare_save`].
    pub fn prepare_save(&mut self, id: &ChatId) -> Result<SaveOutcome, ValidationError> {
        let item = self
            .get_mut(id)
            .ok_or_else(|| ValidationError::UnknownChat(id.to_string()))?;
        item.edit
            .prepare_save()
            .unwrap_or_else(|| Err(ValidationError::NotEditing(id.to_string())))
    }

    /// Settles an in-flight rename: stores `title` on success, then returns to view mode.
    ///
    /// An item whose edit was cancelled or restarted meanwhile keeps its edit state.
    pub fn finish_rename(&mut self, id: &ChatId, title: Option<String>) {
        let Some(item) = self.get_mut(id) else {
            return;
        };
        if let Some(title) = title {
            item.summary.title = title;
        }
        if item.edit.is_saving() {
            item.edit.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> ChatId {
        ChatId::from(s)
    }

    fn list_of(ids: &[&str]) -> ChatListView {
        let mut list = ChatListView::new();
        for chat in ids.iter().rev() {
            list.insert(id(chat), format!("Title {chat}"), false);
        }
        list
    }

    #[test]
    fn insert_prepends_newest_first() {
        let list = list_of(&["c", "b", "a"]);
        let order: Vec<&str> = list.iter().map(|item| item.id().as_str()).collect();
        assert_eq!(order, vec!["c", "b", "a"]);
    }

    #[test]
    fn at_most_one_active_marker() {
        let mut list = list_of(&["a", "b"]);
        list.set_active(Some(&id("a")));
        list.insert(id("c"), "Third", true);
        assert_eq!(list.iter().filter(|item| item.is_active()).count(), 1);
        assert_eq!(list.active_id(), Some(&id("c")));

        list.set_active(None);
        assert_eq!(list.active_id(), None);
    }

    #[test]
    fn inactive_insert_keeps_existing_marker() {
        let mut list = list_of(&["a"]);
        list.set_active(Some(&id("a")));
        list.insert(id("b"), "Second", false);
        assert_eq!(list.active_id(), Some(&id("a")));
    }

    #[test]
    fn from_summaries_keeps_first_active_only() {
        let mut first = ConversationSummary::new("a", "A");
        first.is_active = true;
        let mut second = ConversationSummary::new("b", "B");
        second.is_active = true;
        let list = ChatListView::from_summaries([first, second]);
        assert_eq!(list.active_id(), Some(&id("a")));
        assert!(!list.get(&id("b")).unwrap().is_active());
    }

    #[test]
    fn editing_b_cancels_a_and_restores_title() {
        let mut list = list_of(&["a", "b"]);
        list.begin_edit(&id("a")).unwrap();
        *list.draft_mut(&id("a")).unwrap() = "half-typed".to_string();

        let cancelled = list.begin_edit(&id("b")).unwrap();
        assert_eq!(cancelled, Some(id("a")));
        let a = list.get(&id("a")).unwrap();
        assert_eq!(a.edit, EditState::View);
        assert_eq!(a.title(), "Title a");
        assert_eq!(list.editing_id(), Some(&id("b")));
    }

    #[test]
    fn begin_edit_unknown_chat_fails() {
        let mut list = list_of(&["a"]);
        assert_eq!(
            list.begin_edit(&id("zzz")),
            Err(ValidationError::UnknownChat("zzz".to_string()))
        );
    }

    #[test]
    fn prepare_save_requires_edit_mode() {
        let mut list = list_of(&["a"]);
        assert_eq!(
            list.prepare_save(&id("a")),
            Err(ValidationError::NotEditing("a".to_string()))
        );
    }

    #[test]
    fn finish_rename_success_and_failure() {
        let mut list = list_of(&["a"]);
        list.begin_edit(&id("a")).unwrap();
        *list.draft_mut(&id("a")).unwrap() = "Renamed".to_string();
        assert_eq!(
            list.prepare_save(&id("a")),
            Ok(SaveOutcome::Rename("Renamed".to_string()))
        );
        list.finish_rename(&id("a"), None);
        assert_eq!(list.get(&id("a")).unwrap().title(), "Title a");
        assert_eq!(list.editing_id(), None);

        list.begin_edit(&id("a")).unwrap();
        *list.draft_mut(&id("a")).unwrap() = "Renamed".to_string();
        list.prepare_save(&id("a")).unwrap();
        list.finish_rename(&id("a"), Some("Renamed".to_string()));
        assert_eq!(list.get(&id("a")).unwrap().title(), "Renamed");
        assert_eq!(list.editing_id(), None);
    }

    #[test]
    fn label_truncates_but_title_is_full() {
        let mut list = ChatListView::new();
        let long = "An extremely long conversation title here";
        list.insert(id("a"), long, false);
        let item = list.get(&id("a")).unwrap();
        assert_eq!(item.label(), "An extremely long convers...");
        assert_eq!(item.title(), long);
    }

    #[test]
    fn remove_returns_item() {
        let mut list = list_of(&["a", "b"]);
        assert!(list.remove(&id("a")).is_some());
        assert!(list.remove(&id("a")).is_none());
        assert_eq!(list.len(), 1);
    }
}
