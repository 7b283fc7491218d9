use tokio::sync::broadcast::error::RecvError;

use crate::io::network::Requester;
use crate::model::errors::Unexpected;
use crate::service::events::Event;
use crate::DocLibrary;

impl<C: Requester> DocLibrary<C> {
    /// The one place folder listings follow navigation: every change of the
    /// current path triggers a refresh.
    pub(crate) fn setup_listing_observer(&self) {
        let mut rx = self.subscribe();
        let bg = self.clone();

        self.rt.spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(Event::PathChanged(path)) => {
                        debug!("observed navigation to {path:?}");
                        bg.refresh().await.log_and_ignore();
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("listing observer lagged by {skipped} events, refreshing");
                        bg.refresh().await.log_and_ignore();
                    }
                    Err(RecvError::Closed) => {
                        debug!("event channel closed, stopping listing observer");
                        return;
                    }
                }
            }
        });
    }
}
