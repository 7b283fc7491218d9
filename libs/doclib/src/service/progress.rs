use crate::io::network::Requester;
use crate::model::errors::{DocErr, DocResult};
use crate::model::store::{Action, OperationProgress};
use crate::DocLibrary;

impl<C: Requester> DocLibrary<C> {
    /// Shows a status line that disappears after `progress_timeout` unless a
    /// newer one replaced it first.
    pub fn report_progress(&self, status: impl Into<String>, counts: Option<(usize, usize)>) {
        let stamp = self.store.next_stamp();
        let progress = OperationProgress {
            status: status.into(),
            processed: counts.map(|(processed, _)| processed),
            total: counts.map(|(_, total)| total),
            stamp,
        };
        info!(status = %progress.status, "progress");
        self.store.dispatch(Action::SetProgress(Some(progress)));

        let store = self.store.clone();
        let timeout = self.config.progress_timeout;
        self.rt.spawn(async move {
            tokio::time::sleep(timeout).await;
            store.dispatch(Action::ExpireProgress(stamp));
        });
    }

    pub fn dismiss_progress(&self) {
        self.store.dispatch(Action::SetProgress(None));
    }

    pub fn dismiss_error(&self) {
        self.store.dispatch(Action::SetError(None));
    }

    /// Puts a failed operation on the error banner and hands it back to the
    /// caller unchanged. Validation failures are the user's and stay off the
    /// banner.
    pub(crate) fn surface<T>(&self, result: DocResult<T>) -> DocResult<T> {
        if let Err(err) = &result {
            self.show_error(err);
        }
        result
    }

    pub(crate) fn show_error(&self, err: &DocErr) {
        if err.kind.is_validation() {
            debug!(kind = ?err.kind, "refused");
            return;
        }
        error!(kind = ?err.kind, "operation failed");
        self.store.dispatch(Action::SetError(Some(err.to_string())));
    }
}
