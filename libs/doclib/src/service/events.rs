pub use tokio::sync::broadcast::{self, Receiver, Sender};
use tracing::*;

use crate::io::network::Requester;
use crate::DocLibrary;

#[derive(Clone)]
pub struct EventSubs {
    tx: Sender<Event>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Some action was applied to the store. Renderers should re-read it.
    StateChanged,

    /// The displayed folder changed; its listing has to be fetched.
    PathChanged(String),
}

impl Default for EventSubs {
    fn default() -> Self {
        let (tx, _) = broadcast::channel::<Event>(10000);
        Self { tx }
    }
}

impl EventSubs {
    pub(crate) fn state_changed(&self) {
        self.queue(Event::StateChanged);
    }

    pub(crate) fn path_changed(&self, path: String) {
        self.queue(Event::PathChanged(path));
    }

    fn queue(&self, evt: Event) {
        // no receivers is the normal case for headless use
        if self.tx.receiver_count() == 0 {
            return;
        }
        if let Err(e) = self.tx.send(evt.clone()) {
            error!(?evt, ?e, "could not queue");
        }
    }

    pub fn subscribe(&self) -> Receiver<Event> {
        self.tx.subscribe()
    }
}

impl<C: Requester> DocLibrary<C> {
    pub fn subscribe(&self) -> Receiver<Event> {
        self.events.subscribe()
    }
}
