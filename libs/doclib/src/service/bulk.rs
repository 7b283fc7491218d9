use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::PathBuf;

use chrono::{DateTime, Local};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

use crate::io::network::Requester;
use crate::model::api::{BulkDeleteRequest, BulkDownloadRequest};
use crate::model::errors::{DocErr, DocErrKind, DocResult, Unexpected};
use crate::model::path_ops::parent_of;
use crate::model::store::{Action, Dialog};
use crate::service::file::MoveOutcome;
use crate::DocLibrary;

/// Archive names carry their generation time down to the millisecond.
pub fn archive_name(generated_at: DateTime<Local>) -> String {
    format!("documents_{}.zip", generated_at.format("%Y%m%d_%H%M%S_%3f"))
}

impl<C: Requester> DocLibrary<C> {
    /// Deletes `paths` in one call. Callers confirm the whole batch first
    /// (see [Self::request_bulk_delete]).
    #[instrument(level = "debug", skip(self), err(Debug))]
    pub async fn bulk_delete(&self, paths: Vec<String>) -> DocResult<()> {
        if paths.is_empty() {
            return Err(DocErrKind::NothingSelected.into());
        }
        let count = paths.len();

        let result = self
            .client
            .request(BulkDeleteRequest { filenames: paths })
            .await
            .map(|_| ())
            .map_err(DocErr::from);

        let result = self.surface(result);
        if result.is_ok() {
            self.store.dispatch(Action::SetSelection(HashSet::new()));
            self.report_progress(format!("Deleted {count} item(s)"), Some((count, count)));
        }
        self.refresh().await.log_and_ignore();
        result
    }

    /// Opens one confirmation covering the whole selection.
    pub fn request_bulk_delete(&self) -> DocResult<()> {
        let count = self.store.read(|s| s.selection.len());
        if count == 0 {
            return Err(DocErrKind::NothingSelected.into());
        }
        self.store.dispatch(Action::OpenDialog(Dialog::BulkDeleteConfirm { count }));
        Ok(())
    }

    pub async fn confirm_bulk_delete(&self) -> DocResult<()> {
        if !self.store.read(|s| matches!(s.dialog, Some(Dialog::BulkDeleteConfirm { .. }))) {
            return Err(DocErrKind::NoDialogOpen.into());
        }
        self.store.dispatch(Action::CloseDialog);
        self.bulk_delete(self.selected_paths()).await
    }

    /// The archive the service builds for `paths`.
    #[instrument(level = "debug", skip(self), err(Debug))]
    pub async fn bulk_download(&self, paths: Vec<String>, current_folder: &str) -> DocResult<Vec<u8>> {
        if paths.is_empty() {
            return Err(DocErrKind::NothingSelected.into());
        }
        let result = self
            .client
            .request_bytes(BulkDownloadRequest {
                filenames: paths,
                current_folder: current_folder.to_string(),
            })
            .await
            .map_err(DocErr::from);
        self.surface(result)
    }

    /// Downloads the selection as one archive into the downloads folder and
    /// returns where it was saved.
    pub async fn download_selected(&self) -> DocResult<PathBuf> {
        let paths = self.selected_paths();
        let current = self.store.read(|s| s.current_path.clone());
        let count = paths.len();

        let archive = self.bulk_download(paths, &current).await?;
        let saved = self.surface(self.save_archive(&archive).await)?;

        info!("saved {count} item(s) to {}", saved.display());
        self.report_progress(format!("Downloaded {count} item(s)"), Some((count, count)));
        Ok(saved)
    }

    async fn save_archive(&self, archive: &[u8]) -> DocResult<PathBuf> {
        let dir = self.config.downloads_dir();
        fs::create_dir_all(&dir).await?;

        let name = archive_name(Local::now());
        let stem = name.trim_end_matches(".zip").to_string();
        let mut attempt = 0;
        loop {
            let candidate = match attempt {
                0 => dir.join(&name),
                n => dir.join(format!("{stem}-{n}.zip")),
            };
            match OpenOptions::new().write(true).create_new(true).open(&candidate).await {
                Ok(mut file) => {
                    file.write_all(archive).await?;
                    file.flush().await?;
                    return Ok(candidate);
                }
                Err(err) if err.kind() == ErrorKind::AlreadyExists => attempt += 1,
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Moves the selection one folder up and follows it there.
    pub async fn move_selected_to_parent(&self) -> DocResult<MoveOutcome> {
        let current = self.store.read(|s| s.current_path.clone());
        if current.is_empty() {
            return Err(DocErrKind::AlreadyAtRoot.into());
        }
        let paths = self.selected_paths();
        if paths.is_empty() {
            return Err(DocErrKind::NothingSelected.into());
        }

        let parent = parent_of(&current).to_string();
        let outcome = self.move_entries(paths, &parent).await?;
        self.navigate_to(&parent).await?;
        Ok(outcome)
    }
}

#[cfg(test)]
mod test {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn archive_names_embed_time() {
        let at = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(archive_name(at), "documents_20240309_140507_000.zip");
    }
}
