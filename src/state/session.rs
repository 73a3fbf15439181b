//! The session context: items, the label arena and the audit log.
//!
//! A `Session` is passed explicitly to every operation; there is no global
//! state. Items are index-stable and never removed. Labels are stored in an
//! arena keyed by id and are never removed from it either, so ids can be
//! resolved for the whole lifetime of the session.

use std::collections::{BTreeSet, HashMap};

use crate::format::{self, AutoSaveManager, SessionBackend, TaskKey};
use crate::model::{EventAction, Item, LabelId, LabelNode, SessionEvent, now_millis};
use crate::state::error::SessionError;

/// Receiver of redraw requests (the rendering collaborator).
pub trait RedrawSink {
    /// Redraw the given item from current session state.
    fn request_redraw(&mut self, item_index: usize);
}

impl<F: FnMut(usize)> RedrawSink for F {
    fn request_redraw(&mut self, item_index: usize) {
        self(item_index)
    }
}

/// State of one annotation task.
#[derive(Debug)]
pub struct Session {
    /// Project this task belongs to.
    pub project_name: String,
    /// Task index within the project.
    pub task_index: usize,
    /// Session start, milliseconds since the Unix epoch.
    pub start_time: i64,
    /// Category definitions, passed through unmodified.
    pub categories: serde_json::Value,
    /// Client description, passed through.
    pub user_agent: String,
    /// Client network info, passed through unmodified.
    pub ip_info: serde_json::Value,

    pub(crate) items: Vec<Item>,
    /// Label ids in creation order.
    pub(crate) labels: Vec<LabelId>,
    pub(crate) label_by_id: HashMap<LabelId, LabelNode>,
    pub(crate) last_label_id: LabelId,
    pub(crate) current_item: usize,
    pub(crate) events: Vec<SessionEvent>,

    /// Bumped on every mutation that can change what is drawn.
    revision: u64,
    /// Items waiting to be redrawn. Requests coalesce.
    redraw_requests: BTreeSet<usize>,
    auto_save: AutoSaveManager,
}

impl Session {
    /// Create an empty session for a project.
    pub fn new(project_name: impl Into<String>) -> Self {
        Self {
            project_name: project_name.into(),
            task_index: 0,
            start_time: now_millis(),
            categories: serde_json::Value::Null,
            user_agent: String::new(),
            ip_info: serde_json::Value::Null,
            items: Vec::new(),
            labels: Vec::new(),
            label_by_id: HashMap::new(),
            last_label_id: 0,
            current_item: 0,
            events: Vec::new(),
            revision: 0,
            redraw_requests: BTreeSet::new(),
            auto_save: AutoSaveManager::disabled(),
        }
    }

    /// Replace the auto-save manager (sessions start with auto-save off).
    pub fn with_auto_save(mut self, auto_save: AutoSaveManager) -> Self {
        self.auto_save = auto_save;
        self
    }

    // ========================================================================
    // Items
    // ========================================================================

    /// Append an item at the next index. The first item becomes active.
    pub fn add_item(&mut self, url: impl Into<String>) -> &Item {
        let index = self.items.len();
        let mut item = Item::new(index, url);
        item.active = index == self.current_item;
        self.items.push(item);
        log::debug!("Added item {}", index);
        &self.items[index]
    }

    /// All items in sequence order.
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Get an item by index.
    pub fn item(&self, index: usize) -> Option<&Item> {
        self.items.get(index)
    }

    /// Index of the active item.
    pub fn current_item_index(&self) -> usize {
        self.current_item
    }

    /// The active item, if the session has any items.
    pub fn current_item(&self) -> Option<&Item> {
        self.items.get(self.current_item)
    }

    /// Make the item at `index` active. Indices wrap around the sequence
    /// using Euclidean modulo, so -1 is the last item.
    pub fn goto_item(&mut self, index: i64) -> Result<usize, SessionError> {
        if self.items.is_empty() {
            return Err(SessionError::InvalidNavigation);
        }
        let target = index.rem_euclid(self.items.len() as i64) as usize;

        if let Some(item) = self.items.get_mut(self.current_item) {
            item.active = false;
        }
        self.current_item = target;
        self.items[target].active = true;

        log::info!("Navigated to item {}/{}", target + 1, self.items.len());
        self.log_event(SessionEvent::new(now_millis(), EventAction::GotoItem).with_item(target));
        self.touch();
        Ok(target)
    }

    /// The item before the active one, or `None` at the start.
    pub fn previous_item(&self) -> Option<&Item> {
        self.current_item
            .checked_sub(1)
            .and_then(|i| self.items.get(i))
    }

    /// The item after the active one, or `None` at the end.
    pub fn next_item(&self) -> Option<&Item> {
        self.items.get(self.current_item + 1)
    }

    /// Called by the image loader once an item's image is ready.
    pub fn on_item_loaded(&mut self, index: usize) {
        let Some(item) = self.items.get_mut(index) else {
            log::warn!("Load notification for unknown item {}", index);
            return;
        };
        item.ready = true;
        log::debug!("Item {} ready", index);
        self.log_event(SessionEvent::new(now_millis(), EventAction::Loaded).with_item(index));
        if index == self.current_item {
            self.request_redraw(index);
        }
    }

    // ========================================================================
    // Labels
    // ========================================================================

    /// Get a label by id, valid or not.
    pub fn label(&self, id: LabelId) -> Option<&LabelNode> {
        self.label_by_id.get(&id)
    }

    pub(crate) fn label_mut(&mut self, id: LabelId) -> Option<&mut LabelNode> {
        self.label_by_id.get_mut(&id)
    }

    /// Valid labels in creation order.
    pub fn labels(&self) -> impl Iterator<Item = &LabelNode> {
        self.all_labels().filter(|l| l.valid)
    }

    /// Every label still listed in the session, including deleted ones.
    pub fn all_labels(&self) -> impl Iterator<Item = &LabelNode> {
        self.labels.iter().filter_map(|id| self.label_by_id.get(id))
    }

    /// Check if the ordered label list still contains an id.
    pub fn lists_label(&self, id: LabelId) -> bool {
        self.labels.contains(&id)
    }

    /// Every id ever allocated in this session.
    pub fn label_ids(&self) -> impl Iterator<Item = LabelId> + '_ {
        self.label_by_id.keys().copied()
    }

    /// Number of valid labels.
    pub fn num_valid_labels(&self) -> usize {
        self.labels().count()
    }

    /// Highest id allocated so far. The next label gets this plus one.
    pub fn last_label_id(&self) -> LabelId {
        self.last_label_id
    }

    /// Labels drawn on an item, resolved through the arena.
    pub fn item_labels(&self, index: usize) -> Vec<&LabelNode> {
        self.items
            .get(index)
            .map(|item| {
                item.label_refs
                    .iter()
                    .filter_map(|id| self.label_by_id.get(id))
                    .collect()
            })
            .unwrap_or_default()
    }

    // ========================================================================
    // Events, redraws, revisions
    // ========================================================================

    /// The audit log.
    pub fn events(&self) -> &[SessionEvent] {
        &self.events
    }

    pub(crate) fn log_event(&mut self, event: SessionEvent) {
        self.events.push(event);
    }

    /// Queue a redraw for an item. Repeated requests collapse into one.
    pub fn request_redraw(&mut self, item_index: usize) {
        self.redraw_requests.insert(item_index);
    }

    /// Items with a pending redraw.
    pub fn pending_redraws(&self) -> impl Iterator<Item = usize> + '_ {
        self.redraw_requests.iter().copied()
    }

    /// Hand every pending redraw to the renderer. Returns how many were sent.
    pub fn drain_redraws(&mut self, sink: &mut impl RedrawSink) -> usize {
        let pending = std::mem::take(&mut self.redraw_requests);
        for index in &pending {
            sink.request_redraw(*index);
        }
        pending.len()
    }

    /// Counter that changes whenever drawable state changes.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Record a mutation of drawable state.
    pub(crate) fn touch(&mut self) {
        self.revision += 1;
        self.auto_save.mark_dirty();
        if !self.items.is_empty() {
            self.request_redraw(self.current_item);
        }
    }

    // ========================================================================
    // Load / save
    // ========================================================================

    /// Load a task from a backend. Blocks until the whole document is in
    /// hand; nothing is applied until it has been fully decoded.
    pub fn load(
        backend: &dyn SessionBackend,
        task_index: usize,
        project_name: &str,
    ) -> Result<Self, SessionError> {
        let key = TaskKey::new(task_index, project_name);
        log::info!("Loading task {} of project '{}'", task_index, project_name);

        let json = backend.load(&key)?;
        let mut session = format::from_json(&json)?;
        session.task_index = task_index;
        if session.project_name.is_empty() {
            session.project_name = project_name.to_string();
        }

        log::info!(
            "Loaded {} items with {} labels",
            session.items.len(),
            session.num_valid_labels()
        );
        Ok(session)
    }

    /// Serialize and hand the session to the backend. The outcome does not
    /// affect session state beyond auto-save bookkeeping.
    pub fn save(&mut self, backend: &dyn SessionBackend) {
        let key = TaskKey::new(self.task_index, &self.project_name);
        let result = format::to_json(self).and_then(|json| backend.save(&key, &json));
        match result {
            Ok(()) => {
                log::info!(
                    "Saved task {} ({} labels)",
                    self.task_index,
                    self.num_valid_labels()
                );
                self.auto_save.mark_saved();
            }
            Err(e) => {
                log::warn!("Failed to save task {}: {}", self.task_index, e);
                self.auto_save.mark_save_failed();
            }
        }
    }

    /// Save if the auto-save timing says it is due. Returns true if a save
    /// was attempted.
    pub fn maybe_auto_save(&mut self, backend: &dyn SessionBackend) -> bool {
        if !self.auto_save.should_save() {
            return false;
        }
        log::debug!("Auto-saving task {}", self.task_index);
        self.save(backend);
        true
    }

    /// Check if there are changes not yet saved.
    pub fn has_unsaved_changes(&self) -> bool {
        self.auto_save.is_dirty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_with_items(n: usize) -> Session {
        let mut session = Session::new("test");
        for i in 0..n {
            session.add_item(format!("img{}.jpg", i));
        }
        session
    }

    #[test]
    fn test_add_item_assigns_indices() {
        let session = session_with_items(3);
        let indices: Vec<usize> = session.items().iter().map(|i| i.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert!(session.items()[0].active);
        assert!(!session.items()[1].active);
    }

    #[test]
    fn test_goto_item_wraps() {
        let mut session = session_with_items(3);
        assert_eq!(session.goto_item(-1).unwrap(), 2);
        assert_eq!(session.goto_item(3).unwrap(), 0);
        assert_eq!(session.goto_item(7).unwrap(), 1);
        assert_eq!(session.goto_item(-4).unwrap(), 2);
    }

    #[test]
    fn test_goto_item_moves_active_flag() {
        let mut session = session_with_items(3);
        session.goto_item(2).unwrap();
        let active: Vec<bool> = session.items().iter().map(|i| i.active).collect();
        assert_eq!(active, vec![false, false, true]);
        assert_eq!(session.current_item_index(), 2);
    }

    #[test]
    fn test_goto_item_on_empty_session_fails() {
        let mut session = Session::new("empty");
        assert!(matches!(
            session.goto_item(0),
            Err(SessionError::InvalidNavigation)
        ));
    }

    #[test]
    fn test_previous_and_next_stop_at_boundaries() {
        let mut session = session_with_items(2);
        assert!(session.previous_item().is_none());
        assert_eq!(session.next_item().map(|i| i.index), Some(1));
        session.goto_item(1).unwrap();
        assert_eq!(session.previous_item().map(|i| i.index), Some(0));
        assert!(session.next_item().is_none());
    }

    #[test]
    fn test_item_loaded_sets_ready_and_logs() {
        let mut session = session_with_items(2);
        session.on_item_loaded(1);
        assert!(session.items()[1].ready);
        let last = session.events().last().unwrap();
        assert!(last.is(EventAction::Loaded));
        assert_eq!(last.item_index, 1);
    }

    #[test]
    fn test_redraw_requests_coalesce() {
        let mut session = session_with_items(2);
        session.request_redraw(0);
        session.request_redraw(0);
        session.request_redraw(1);

        let mut drawn = Vec::new();
        let sent = session.drain_redraws(&mut |i: usize| drawn.push(i));
        assert_eq!(sent, 2);
        assert_eq!(drawn, vec![0, 1]);
        assert_eq!(session.drain_redraws(&mut |_: usize| {}), 0);
    }

    #[test]
    fn test_navigation_bumps_revision() {
        let mut session = session_with_items(2);
        let before = session.revision();
        session.goto_item(1).unwrap();
        assert!(session.revision() > before);
        assert_eq!(session.pending_redraws().collect::<Vec<_>>(), vec![1]);
    }
}
