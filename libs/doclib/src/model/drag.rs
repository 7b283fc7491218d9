use std::collections::HashSet;

use serde::Serialize;

use crate::model::entry::DocumentEntry;
use crate::model::path_ops::is_within;

/// The transient part of a drag gesture that lives in the store. Entries are
/// always compared by `path`: listings are replaced wholesale on refresh, so a
/// held entry is never the same value as the one currently rendered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DragState {
    pub dragged: Vec<DocumentEntry>,
    pub drop_target: Option<DocumentEntry>,
}

impl DragState {
    pub fn new(dragged: Vec<DocumentEntry>) -> Self {
        Self { dragged, drop_target: None }
    }

    pub fn is_dragged(&self, path: &str) -> bool {
        self.dragged.iter().any(|d| d.path == path)
    }

    pub fn is_drop_target(&self, path: &str) -> bool {
        self.drop_target.as_ref().map(|t| t.path == path).unwrap_or(false)
    }

    pub fn dragged_paths(&self) -> Vec<String> {
        self.dragged.iter().map(|d| d.path.clone()).collect()
    }
}

/// Dragging an entry that is part of the selection drags the whole selection,
/// otherwise just the entry.
pub fn drag_payload(
    item: &DocumentEntry, documents: &[DocumentEntry], selection: &HashSet<String>,
) -> Vec<DocumentEntry> {
    if selection.contains(&item.path) {
        documents
            .iter()
            .filter(|doc| selection.contains(&doc.path))
            .cloned()
            .collect()
    } else {
        vec![item.clone()]
    }
}

/// A folder may become the drop target unless it is being dragged itself or
/// sits inside a dragged folder.
pub fn can_hover(target: &DocumentEntry, dragged: &[DocumentEntry]) -> bool {
    target.is_folder
        && !dragged
            .iter()
            .any(|d| d.path == target.path || (d.is_folder && is_within(&target.path, &d.path)))
}

/// Whether leaving `hovered` towards `related` ends the hover. Moving onto
/// something inside the hovered row does not.
pub fn leave_clears(hovered: &str, related: Option<&str>) -> bool {
    match related {
        Some(related) if hovered.is_empty() => !related.is_empty(),
        Some(related) => !is_within(related, hovered),
        None => true,
    }
}

/// Source paths a drop of `dragged` onto `target` should move. `None` when the
/// drop is invalid or would not move anything.
pub fn validate_drop(target: &DocumentEntry, dragged: &[DocumentEntry]) -> Option<Vec<String>> {
    if dragged.is_empty() || !can_hover(target, dragged) {
        return None;
    }

    let sources: Vec<String> = dragged
        .iter()
        .filter(|d| d.parent() != target.path)
        .map(|d| d.path.clone())
        .collect();

    if sources.is_empty() {
        None
    } else {
        Some(sources)
    }
}

#[cfg(test)]
mod test {
    use crate::model::entry::{Classification, DocumentEntry};

    use super::*;

    fn file(path: &str) -> DocumentEntry {
        DocumentEntry::file(path, Classification::Public)
    }

    fn folder(path: &str) -> DocumentEntry {
        DocumentEntry::folder(path)
    }

    #[test]
    fn selected_item_drags_whole_selection() {
        let docs = vec![folder("A/x"), file("A/a.txt"), file("A/b.txt")];
        let selection: HashSet<String> = ["A/a.txt", "A/x"].iter().map(|s| s.to_string()).collect();

        let payload = drag_payload(&docs[1], &docs, &selection);
        assert_eq!(payload, vec![folder("A/x"), file("A/a.txt")]);

        let payload = drag_payload(&docs[2], &docs, &selection);
        assert_eq!(payload, vec![file("A/b.txt")]);
    }

    #[test]
    fn self_drop_is_rejected() {
        let dragged = vec![folder("A/x")];
        assert!(!can_hover(&folder("A/x"), &dragged));
        assert_eq!(validate_drop(&folder("A/x"), &dragged), None);
    }

    #[test]
    fn drop_into_descendant_is_rejected() {
        let dragged = vec![folder("A/x")];
        assert_eq!(validate_drop(&folder("A/x/y"), &dragged), None);
        assert_eq!(validate_drop(&folder("A/xy"), &dragged), Some(vec!["A/x".to_string()]));
    }

    #[test]
    fn files_are_never_targets() {
        assert_eq!(validate_drop(&file("A/c.txt"), &[file("A/a.txt")]), None);
    }

    #[test]
    fn drop_into_current_parent_moves_nothing() {
        assert_eq!(validate_drop(&folder("A"), &[file("A/a.txt")]), None);
        assert_eq!(
            validate_drop(&folder("A"), &[file("A/a.txt"), file("B/b.txt")]),
            Some(vec!["B/b.txt".to_string()])
        );
    }

    #[test]
    fn leaving_into_own_row_keeps_hover() {
        assert!(!leave_clears("A/x", Some("A/x")));
        assert!(leave_clears("A/x", Some("A/y")));
        assert!(leave_clears("A/x", None));
    }
}
