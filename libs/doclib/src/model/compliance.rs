use serde::Serialize;

use crate::model::entry::DocumentEntry;
use crate::model::store::State;

/// A file whose classification is still the sentinel must be highlighted.
/// Folders never carry a classification and are never flagged. The flag is
/// purely visual, no operation checks it.
pub fn needs_classification(entry: &DocumentEntry) -> bool {
    !entry.is_folder
        && entry
            .classification
            .as_ref()
            .map(|c| c.is_unset())
            .unwrap_or(false)
}

/// Everything a renderer needs to draw one row of the listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Row {
    pub entry: DocumentEntry,
    pub selected: bool,
    pub dragged: bool,
    pub drop_target: bool,
    pub needs_classification: bool,
}

pub fn rows(state: &State) -> Vec<Row> {
    state
        .documents
        .iter()
        .map(|entry| Row {
            selected: state.selection.contains(&entry.path),
            dragged: state.drag.as_ref().map(|d| d.is_dragged(&entry.path)).unwrap_or(false),
            drop_target: state
                .drag
                .as_ref()
                .map(|d| d.is_drop_target(&entry.path))
                .unwrap_or(false),
            needs_classification: needs_classification(entry),
            entry: entry.clone(),
        })
        .collect()
}

#[cfg(test)]
mod test {
    use crate::model::entry::{Classification, DocumentEntry};

    use super::*;

    #[test]
    fn unset_files_are_flagged() {
        assert!(needs_classification(&DocumentEntry::file("a.pdf", Classification::Unset)));
        assert!(!needs_classification(&DocumentEntry::file("b.pdf", Classification::Internal)));
    }

    #[test]
    fn folders_are_never_flagged() {
        let mut folder = DocumentEntry::folder("A");
        assert!(!needs_classification(&folder));

        // even if a server sent one anyway
        folder.classification = Some(Classification::Unset);
        assert!(!needs_classification(&folder));
    }

    #[test]
    fn rows_flag_in_listing_order() {
        let state = State {
            documents: vec![
                DocumentEntry::folder("A"),
                DocumentEntry::file("a.pdf", Classification::Unset),
                DocumentEntry::file("b.pdf", Classification::Public),
                DocumentEntry::file("c.pdf", Classification::Unset),
            ],
            ..Default::default()
        };
        let paths: Vec<String> = rows(&state)
            .into_iter()
            .filter(|row| row.needs_classification)
            .map(|row| row.entry.path)
            .collect();
        assert_eq!(paths, vec!["a.pdf", "c.pdf"]);
    }
}
