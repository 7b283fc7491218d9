//! Drag-and-drop reorganization. A gesture moves through
//! idle -> dragging -> (hovering <-> dragging) -> idle. The dragged items and
//! the hovered folder live in the store; the session here owns the watchdog
//! and makes sure every way a gesture can end clears that state exactly once.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::task::JoinHandle;

use crate::io::network::Requester;
use crate::model::drag::{drag_payload, leave_clears, validate_drop, DragState};
use crate::model::entry::DocumentEntry;
use crate::model::errors::DocResult;
use crate::model::store::{Action, Store};
use crate::service::file::MoveOutcome;
use crate::DocLibrary;

#[derive(Clone, Default)]
pub struct DragSessions {
    active: Arc<Mutex<Option<ActiveDrag>>>,
    ids: Arc<AtomicU64>,
}

struct ActiveDrag {
    id: u64,
    watchdog: JoinHandle<()>,
}

impl DragSessions {
    /// Ends whatever session is active and takes the drag state out of the
    /// store. Idempotent: later calls find nothing and return `None`.
    pub fn close(&self, store: &Store) -> Option<DragState> {
        let active = self.active.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(active) = active {
            trace!("closing drag session {}", active.id);
            active.watchdog.abort();
        }
        store.take_drag()
    }

    /// Watchdog path: only clears if session `id` is still the active one.
    fn expire(&self, id: u64, store: &Store) -> bool {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if active.as_ref().map(|a| a.id) != Some(id) {
            return false;
        }
        *active = None;
        drop(active);
        store.take_drag();
        true
    }

    pub fn is_active(&self) -> bool {
        self.active.lock().unwrap_or_else(PoisonError::into_inner).is_some()
    }
}

impl<C: Requester> DocLibrary<C> {
    /// Starts dragging `item`, or the whole selection if `item` is part of it.
    pub fn drag_start(&self, item: &DocumentEntry) {
        self.drag.close(&self.store);

        let payload = self
            .store
            .read(|s| drag_payload(item, &s.documents, &s.selection));
        debug!("drag started with {} item(s)", payload.len());
        self.store.dispatch(Action::StartDrag(payload));

        let id = self.drag.ids.fetch_add(1, Ordering::SeqCst) + 1;
        let sessions = self.drag.clone();
        let store = self.store.clone();
        let timeout = self.config.drag_timeout;

        let mut active = self.drag.active.lock().unwrap_or_else(PoisonError::into_inner);
        let watchdog = self.rt.spawn(async move {
            tokio::time::sleep(timeout).await;
            if sessions.expire(id, &store) {
                warn!("drag session {id} got no terminal event within {timeout:?}, cleared");
            }
        });
        *active = Some(ActiveDrag { id, watchdog });
    }

    /// Hovering a folder makes it the drop target, unless it is being dragged.
    pub fn drag_enter(&self, target: &DocumentEntry) {
        self.store.dispatch(Action::SetDropTarget(Some(target.clone())));
    }

    /// Leaving `target` for `related` (the path under the pointer now, if any)
    /// clears the drop target unless the pointer stayed inside `target`'s row.
    pub fn drag_leave(&self, target: &DocumentEntry, related: Option<&str>) {
        let hovering = self.store.read(|s| {
            s.drag
                .as_ref()
                .map(|d| d.is_drop_target(&target.path))
                .unwrap_or(false)
        });
        if hovering && leave_clears(&target.path, related) {
            self.store.dispatch(Action::SetDropTarget(None));
        }
    }

    /// The gesture ended without a drop on a folder.
    pub fn drag_end(&self) {
        self.drag.close(&self.store);
    }

    /// Something was dropped somewhere that is not a folder row.
    pub fn external_drop(&self) {
        self.drag.close(&self.store);
    }

    /// Drops the dragged items onto `target`. The session is closed first and
    /// the items it held are what gets moved. Invalid drops (onto a file, onto
    /// a dragged folder or inside one) do nothing and return `None`.
    pub async fn drop_on(&self, target: &DocumentEntry) -> DocResult<Option<MoveOutcome>> {
        let Some(snapshot) = self.drag.close(&self.store) else {
            debug!("drop without an active drag");
            return Ok(None);
        };

        let Some(sources) = validate_drop(target, &snapshot.dragged) else {
            debug!("ignoring drop of {} item(s) onto {:?}", snapshot.dragged.len(), target.path);
            return Ok(None);
        };

        self.move_entries(sources, &target.path).await.map(Some)
    }

    /// Call when the view goes away; no drag state survives it.
    pub fn teardown(&self) {
        self.drag.close(&self.store);
    }
}
