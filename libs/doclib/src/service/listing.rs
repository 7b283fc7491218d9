use crate::io::network::{ApiError, Requester};
use crate::model::api::ListFolderRequest;
use crate::model::entry::{normalize_listing, DocumentEntry};
use crate::model::errors::{DocErr, DocErrKind, DocResult};
use crate::model::path_ops::{normalize, parent_of, path_from_breadcrumbs};
use crate::model::store::Action;
use crate::DocLibrary;

impl<C: Requester> DocLibrary<C> {
    /// Fetches one folder's entries, normalized and sorted folders first.
    /// Does not touch the store.
    #[instrument(level = "debug", skip(self), err(Debug))]
    pub async fn list_folder(&self, folder: &str) -> DocResult<Vec<DocumentEntry>> {
        let payload = self
            .client
            .request(ListFolderRequest { folder: normalize(folder) })
            .await
            .map_err(|err| -> DocErr {
                match err {
                    ApiError::Status { status, detail } => DocErrKind::Fetch(
                        detail.unwrap_or_else(|| format!("the service answered {status}")),
                    )
                    .into(),
                    other => other.into(),
                }
            })?;

        normalize_listing(payload)
    }

    /// Replaces the listing with the current folder's contents. A refresh
    /// requested while another one is in flight is dropped, not queued, and
    /// makes the one in flight fetch once more before it ends. If the folder
    /// changed meanwhile the stale result is discarded.
    #[instrument(level = "debug", skip(self), err(Debug))]
    pub async fn refresh(&self) -> DocResult<()> {
        if !self.store.try_begin_refresh() {
            debug!("listing already in flight, dropping refresh");
            return Ok(());
        }

        let result = loop {
            let folder = self.store.read(|s| s.current_path.clone());
            let result = self.list_folder(&folder).await;
            if let Ok(documents) = &result {
                self.store
                    .dispatch(Action::SetListing { folder: folder.clone(), documents: documents.clone() });
            }
            if self.store.finish_refresh(&folder) {
                break result;
            }
            debug!("listing of {folder:?} went stale, fetching again");
        };

        self.surface(result).map(|_| ())
    }

    /// Shows `path`. Leaving a folder clears the selection.
    pub async fn navigate_to(&self, path: &str) -> DocResult<()> {
        let path = normalize(path);
        self.go(&path, Action::SetCurrentPath(path.clone())).await
    }

    /// Applies a navigation `action` that lands on `path`, then refreshes.
    async fn go(&self, path: &str, action: Action) -> DocResult<()> {
        let changed = self.store.read(|s| s.current_path != path);
        if changed {
            info!("navigating to {path:?}");
            self.store.dispatch(Action::SetLoading(true));
        }
        self.store.dispatch(action);

        // the observer picks folder changes up on its own
        if changed && self.config.background_work {
            return Ok(());
        }
        self.refresh().await
    }

    /// Activating a folder row opens it. Files have nothing to open into.
    pub async fn open_entry(&self, entry: &DocumentEntry) -> DocResult<()> {
        if !entry.is_folder {
            debug!("{:?} is a file, not opening", entry.path);
            return Ok(());
        }
        self.navigate_to(&entry.path).await
    }

    pub async fn navigate_up(&self) -> DocResult<()> {
        let current = self.store.read(|s| s.current_path.clone());
        if current.is_empty() {
            return Err(DocErrKind::AlreadyAtRoot.into());
        }
        self.navigate_to(parent_of(&current)).await
    }

    /// Jumps to the crumb at `index`; out of range indexes do nothing.
    pub async fn navigate_to_breadcrumb(&self, index: usize) -> DocResult<()> {
        let chain = self.store.read(|s| s.breadcrumbs.get(..=index).map(<[_]>::to_vec));
        match chain {
            Some(chain) => {
                let path = path_from_breadcrumbs(&chain);
                self.go(&path, Action::SetBreadcrumbs(chain)).await
            }
            None => Ok(()),
        }
    }
}
