//! The single state container of the document library. Every change goes
//! through an [`Action`] and the pure [`reduce`] function; [`Store`] wraps the
//! state for sharing and announces changes on the event channel.

use std::collections::HashSet;
use std::mem;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use serde::Serialize;

use crate::model::compliance::{self, Row};
use crate::model::drag::{can_hover, DragState};
use crate::model::entry::DocumentEntry;
use crate::model::path_ops::{breadcrumbs, normalize, path_from_breadcrumbs, Breadcrumb};
use crate::service::events::EventSubs;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Dialog {
    CreateFolder,
    Upload,
    Rename(DocumentEntry),
    DeleteConfirm(DocumentEntry),
    BulkDeleteConfirm { count: usize },
}

/// A transient status line. `stamp` identifies the record so an expiry timer
/// only ever clears the record it was started for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationProgress {
    pub status: String,
    pub processed: Option<usize>,
    pub total: Option<usize>,
    pub stamp: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct State {
    /// The current folder's listing, folders first. Replaced wholesale, never patched.
    pub documents: Vec<DocumentEntry>,
    pub current_path: String,
    pub breadcrumbs: Vec<Breadcrumb>,
    /// Paths of selected entries. Only ever contains paths of `documents`.
    pub selection: HashSet<String>,
    pub drag: Option<DragState>,
    pub is_loading: bool,
    pub is_refreshing: bool,
    pub error: Option<String>,
    pub dialog: Option<Dialog>,
    pub progress: Option<OperationProgress>,
}

impl Default for State {
    fn default() -> Self {
        Self {
            documents: vec![],
            current_path: String::new(),
            breadcrumbs: breadcrumbs(""),
            selection: HashSet::new(),
            drag: None,
            is_loading: false,
            is_refreshing: false,
            error: None,
            dialog: None,
            progress: None,
        }
    }
}

impl State {
    pub fn find(&self, path: &str) -> Option<&DocumentEntry> {
        self.documents.iter().find(|d| d.path == path)
    }

    /// Selected entries in listing order.
    pub fn selected_entries(&self) -> Vec<DocumentEntry> {
        self.documents
            .iter()
            .filter(|d| self.selection.contains(&d.path))
            .cloned()
            .collect()
    }

    pub fn rows(&self) -> Vec<Row> {
        compliance::rows(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    SetDocuments(Vec<DocumentEntry>),
    /// Replaces the listing only if `folder` is still the current path.
    SetListing { folder: String, documents: Vec<DocumentEntry> },
    /// Also resets breadcrumbs, and the listing and selection when the folder changes.
    SetCurrentPath(String),
    /// Navigates to the last crumb of a chain that starts at the root.
    SetBreadcrumbs(Vec<Breadcrumb>),
    SetSelection(HashSet<String>),
    ToggleSelection(String),
    StartDrag(Vec<DocumentEntry>),
    SetDropTarget(Option<DocumentEntry>),
    ClearDrag,
    SetLoading(bool),
    SetRefreshing(bool),
    SetError(Option<String>),
    OpenDialog(Dialog),
    CloseDialog,
    SetProgress(Option<OperationProgress>),
    /// Clears the progress record only if it still carries this stamp.
    ExpireProgress(u64),
}

/// Applies `action` to `state`. Total: an action that makes no sense from the
/// current state leaves it untouched.
pub fn reduce(state: &mut State, action: Action) {
    match action {
        Action::SetDocuments(documents) => {
            state.documents = documents;
            let visible: HashSet<&str> = state.documents.iter().map(|d| d.path.as_str()).collect();
            state.selection.retain(|path| visible.contains(path.as_str()));
            let documents = &state.documents;
            if let Some(drag) = state.drag.as_mut() {
                drag.drop_target = drag
                    .drop_target
                    .take()
                    .and_then(|target| documents.iter().find(|d| d.path == target.path))
                    .cloned();
            }
        }
        Action::SetListing { folder, documents } => {
            if folder == state.current_path {
                reduce(state, Action::SetDocuments(documents));
            } else {
                debug!("discarding listing of {folder:?}, now showing {:?}", state.current_path);
            }
        }
        Action::SetCurrentPath(path) => {
            let path = normalize(&path);
            if path != state.current_path {
                state.current_path = path;
                state.documents.clear();
                state.selection.clear();
            }
            state.breadcrumbs = breadcrumbs(&state.current_path);
        }
        Action::SetBreadcrumbs(crumbs) => {
            if crumbs.first() == Some(&Breadcrumb::root()) {
                reduce(state, Action::SetCurrentPath(path_from_breadcrumbs(&crumbs)));
            } else {
                debug!("ignoring breadcrumbs that do not start at the root");
            }
        }
        Action::SetSelection(mut selection) => {
            selection.retain(|path| state.documents.iter().any(|d| &d.path == path));
            state.selection = selection;
        }
        Action::ToggleSelection(path) => {
            if !state.selection.remove(&path) && state.find(&path).is_some() {
                state.selection.insert(path);
            }
        }
        Action::StartDrag(dragged) => {
            if !dragged.is_empty() {
                state.drag = Some(DragState::new(dragged));
            }
        }
        Action::SetDropTarget(target) => {
            if let Some(drag) = &mut state.drag {
                match target {
                    Some(target) if can_hover(&target, &drag.dragged) => {
                        drag.drop_target = Some(target)
                    }
                    Some(_) => {}
                    None => drag.drop_target = None,
                }
            }
        }
        Action::ClearDrag => state.drag = None,
        Action::SetLoading(loading) => state.is_loading = loading,
        Action::SetRefreshing(refreshing) => state.is_refreshing = refreshing,
        Action::SetError(error) => state.error = error,
        Action::OpenDialog(dialog) => state.dialog = Some(dialog),
        Action::CloseDialog => state.dialog = None,
        Action::SetProgress(progress) => state.progress = progress,
        Action::ExpireProgress(stamp) => {
            if state.progress.as_ref().map(|p| p.stamp) == Some(stamp) {
                state.progress = None;
            }
        }
    }
}

#[derive(Clone)]
pub struct Store {
    state: Arc<RwLock<State>>,
    events: EventSubs,
    stamps: Arc<AtomicU64>,
    stale: Arc<AtomicBool>,
}

impl Store {
    pub fn new(events: EventSubs) -> Self {
        Self {
            state: Default::default(),
            events,
            stamps: Default::default(),
            stale: Default::default(),
        }
    }

    pub fn dispatch(&self, action: Action) {
        trace!(?action, "dispatch");
        let path_changed = {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            let before = state.current_path.clone();
            reduce(&mut state, action);
            (state.current_path != before).then(|| state.current_path.clone())
        };

        if let Some(path) = path_changed {
            self.events.path_changed(path);
        }
        self.events.state_changed();
    }

    pub fn read<R>(&self, f: impl FnOnce(&State) -> R) -> R {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        f(&state)
    }

    pub fn state(&self) -> State {
        self.read(State::clone)
    }

    /// Raises `is_refreshing` unless it is already raised. Returns whether this
    /// caller now owns the refresh. A caller that loses marks the listing in
    /// flight as stale so the owner fetches once more.
    pub fn try_begin_refresh(&self) -> bool {
        let began = {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            let began = !mem::replace(&mut state.is_refreshing, true);
            if !began {
                self.stale.store(true, Ordering::SeqCst);
            }
            began
        };
        if began {
            self.events.state_changed();
        }
        began
    }

    /// Lowers `is_refreshing` and `is_loading` if `fetched` is still the
    /// current folder and no refresh was dropped meanwhile. Otherwise the
    /// caller keeps the refresh and must fetch again.
    pub fn finish_refresh(&self, fetched: &str) -> bool {
        let finished = {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            let stale = self.stale.swap(false, Ordering::SeqCst);
            let finished = state.current_path == fetched && !stale;
            if finished {
                state.is_refreshing = false;
                state.is_loading = false;
            }
            finished
        };
        if finished {
            self.events.state_changed();
        }
        finished
    }

    /// Removes the drag session from the store and hands back what it held, in
    /// one step, so the caller keeps the dragged items after the state is gone.
    pub fn take_drag(&self) -> Option<DragState> {
        let taken = {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            state.drag.take()
        };
        if taken.is_some() {
            self.events.state_changed();
        }
        taken
    }

    pub fn next_stamp(&self) -> u64 {
        self.stamps.fetch_add(1, Ordering::SeqCst) + 1
    }
}

#[cfg(test)]
mod test {
    use crate::model::entry::{Classification, DocumentEntry};
    use crate::model::path_ops::Breadcrumb;

    use super::*;

    fn listing() -> Vec<DocumentEntry> {
        vec![
            DocumentEntry::folder("A/x"),
            DocumentEntry::file("A/a.txt", Classification::Unset),
            DocumentEntry::file("A/b.txt", Classification::Public),
        ]
    }

    fn state_in_a() -> State {
        let mut state = State::default();
        reduce(&mut state, Action::SetCurrentPath("A".to_string()));
        reduce(&mut state, Action::SetDocuments(listing()));
        state
    }

    #[test]
    fn navigating_clears_selection() {
        let mut state = state_in_a();
        reduce(&mut state, Action::ToggleSelection("A/a.txt".to_string()));
        assert_eq!(state.selection.len(), 1);

        reduce(&mut state, Action::SetCurrentPath("B".to_string()));

        assert!(state.selection.is_empty());
        assert!(state.documents.is_empty());
        assert_eq!(state.breadcrumbs.last().unwrap().path, "B");
    }

    #[test]
    fn same_path_keeps_selection() {
        let mut state = state_in_a();
        reduce(&mut state, Action::ToggleSelection("A/a.txt".to_string()));
        reduce(&mut state, Action::SetCurrentPath("/A/".to_string()));
        assert_eq!(state.selection.len(), 1);
    }

    #[test]
    fn selection_only_covers_visible_entries() {
        let mut state = state_in_a();
        reduce(&mut state, Action::ToggleSelection("B/elsewhere.txt".to_string()));
        assert!(state.selection.is_empty());

        let all = ["A/x", "A/a.txt", "nope"].iter().map(|s| s.to_string()).collect();
        reduce(&mut state, Action::SetSelection(all));
        assert_eq!(state.selection.len(), 2);
        assert!(!state.selection.contains("nope"));
    }

    #[test]
    fn listing_for_another_folder_is_discarded() {
        let mut state = state_in_a();
        reduce(
            &mut state,
            Action::SetListing { folder: "B".to_string(), documents: vec![DocumentEntry::folder("B/y")] },
        );
        assert_eq!(state.documents, listing());

        reduce(&mut state, Action::SetListing { folder: "A".to_string(), documents: vec![] });
        assert!(state.documents.is_empty());
    }

    #[test]
    fn toggle_twice_deselects() {
        let mut state = state_in_a();
        reduce(&mut state, Action::ToggleSelection("A/a.txt".to_string()));
        reduce(&mut state, Action::ToggleSelection("A/a.txt".to_string()));
        assert!(state.selection.is_empty());
    }

    #[test]
    fn refresh_prunes_vanished_selection_and_rederives_drop_target() {
        let mut state = state_in_a();
        reduce(&mut state, Action::ToggleSelection("A/a.txt".to_string()));
        reduce(&mut state, Action::StartDrag(vec![DocumentEntry::file("A/b.txt", Classification::Public)]));
        reduce(&mut state, Action::SetDropTarget(Some(DocumentEntry::folder("A/x"))));

        let mut fresh = DocumentEntry::folder("A/x");
        fresh.name = "x (renamed elsewhere)".to_string();
        reduce(&mut state, Action::SetDocuments(vec![fresh.clone()]));

        assert!(state.selection.is_empty());
        assert_eq!(state.drag.as_ref().unwrap().drop_target, Some(fresh));

        reduce(&mut state, Action::SetDocuments(vec![]));
        assert_eq!(state.drag.as_ref().unwrap().drop_target, None);
    }

    #[test]
    fn dragged_folder_cannot_be_its_own_target() {
        let mut state = state_in_a();
        reduce(&mut state, Action::StartDrag(vec![DocumentEntry::folder("A/x")]));
        reduce(&mut state, Action::SetDropTarget(Some(DocumentEntry::folder("A/x"))));
        assert_eq!(state.drag.unwrap().drop_target, None);
    }

    #[test]
    fn drop_target_without_drag_is_a_no_op() {
        let mut state = state_in_a();
        let before = state.clone();
        reduce(&mut state, Action::SetDropTarget(Some(DocumentEntry::folder("A/x"))));
        reduce(&mut state, Action::ClearDrag);
        assert_eq!(state, before);
    }

    #[test]
    fn breadcrumbs_without_root_are_ignored() {
        let mut state = state_in_a();
        let before = state.clone();
        reduce(
            &mut state,
            Action::SetBreadcrumbs(vec![Breadcrumb { name: "Z".to_string(), path: "Z".to_string() }]),
        );
        reduce(&mut state, Action::SetBreadcrumbs(vec![]));
        assert_eq!(state, before);
    }

    #[test]
    fn breadcrumbs_navigate_to_their_last_crumb() {
        let mut state = State::default();
        reduce(&mut state, Action::SetCurrentPath("A/B/C".to_string()));
        let chain = state.breadcrumbs[..=1].to_vec();

        reduce(&mut state, Action::SetBreadcrumbs(chain));

        assert_eq!(state.current_path, "A");
        assert_eq!(state.breadcrumbs, breadcrumbs("A"));
        assert!(state.documents.is_empty());

        reduce(&mut state, Action::SetBreadcrumbs(vec![Breadcrumb::root()]));
        assert_eq!(state.current_path, "");
    }

    #[test]
    fn dismissing_missing_error_is_a_no_op() {
        let mut state = State::default();
        reduce(&mut state, Action::SetError(None));
        reduce(&mut state, Action::CloseDialog);
        assert_eq!(state, State::default());
    }

    #[test]
    fn stale_expiry_leaves_newer_progress() {
        let mut state = State::default();
        let progress = |stamp| OperationProgress {
            status: "Moving".to_string(),
            processed: None,
            total: None,
            stamp,
        };
        reduce(&mut state, Action::SetProgress(Some(progress(1))));
        reduce(&mut state, Action::SetProgress(Some(progress(2))));
        reduce(&mut state, Action::ExpireProgress(1));
        assert_eq!(state.progress.as_ref().map(|p| p.stamp), Some(2));
        reduce(&mut state, Action::ExpireProgress(2));
        assert_eq!(state.progress, None);
    }

    #[test]
    fn dropped_refresh_keeps_the_owner_fetching() {
        let store = Store::new(EventSubs::default());
        assert!(store.try_begin_refresh());
        assert!(!store.try_begin_refresh());

        assert!(!store.finish_refresh(""));
        assert!(store.read(|s| s.is_refreshing));

        assert!(store.finish_refresh(""));
        assert!(!store.read(|s| s.is_refreshing));
        assert!(store.try_begin_refresh());
    }
}
