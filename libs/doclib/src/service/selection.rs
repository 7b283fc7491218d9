use std::collections::HashSet;

use crate::io::network::Requester;
use crate::model::entry::DocumentEntry;
use crate::model::store::Action;
use crate::DocLibrary;

impl<C: Requester> DocLibrary<C> {
    /// Entries outside the current listing cannot be selected.
    pub fn toggle_select(&self, path: &str) {
        self.store.dispatch(Action::ToggleSelection(path.to_string()));
    }

    /// Selects every visible entry in one replace.
    pub fn select_all(&self) {
        let all: HashSet<String> = self.store.read(|s| s.documents.iter().map(|d| d.path.clone()).collect());
        self.store.dispatch(Action::SetSelection(all));
    }

    pub fn clear_selection(&self) {
        self.store.dispatch(Action::SetSelection(HashSet::new()));
    }

    /// Selected entries in listing order.
    pub fn selected(&self) -> Vec<DocumentEntry> {
        self.store.read(|s| s.selected_entries())
    }

    pub(crate) fn selected_paths(&self) -> Vec<String> {
        self.selected().into_iter().map(|e| e.path).collect()
    }
}
