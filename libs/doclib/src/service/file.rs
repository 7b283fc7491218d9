use std::path::PathBuf;

use serde::Serialize;

use crate::io::network::Requester;
use crate::model::api::*;
use crate::model::entry::{extension, Classification, DocumentEntry};
use crate::model::errors::{DocErr, DocErrKind, DocResult, Unexpected};
use crate::model::path_ops::{normalize, parent_of};
use crate::model::store::{Action, Dialog};
use crate::DocLibrary;

/// What a move did. A move where nothing landed is an error instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveOutcome {
    pub target_folder: String,
    pub moved: Vec<String>,
    pub failed: Vec<MoveFailure>,
}

impl MoveOutcome {
    pub fn is_partial(&self) -> bool {
        !self.failed.is_empty()
    }

    pub fn summary(&self) -> String {
        if self.failed.is_empty() {
            format!("Moved {} item(s)", self.moved.len())
        } else {
            format!(
                "Moved {} item(s), but {} failed. Check the logs for details.",
                self.moved.len(),
                self.failed.len()
            )
        }
    }
}

/// The name a rename will actually send. Files keep their extension when the
/// new name leaves it out; folders are renamed verbatim.
pub fn rename_target(entry: &DocumentEntry, new_name: &str) -> DocResult<String> {
    let new_name = new_name.trim();
    if new_name.is_empty() {
        return Err(if entry.is_folder {
            DocErrKind::FolderNameEmpty
        } else {
            DocErrKind::FileNameEmpty
        }
        .into());
    }
    if new_name.contains('/') {
        return Err(DocErrKind::FileNameContainsSlash.into());
    }

    let name = match extension(&entry.name) {
        Some(ext) if entry.is_file() => {
            let suffix = format!(".{}", ext.to_lowercase());
            if new_name.to_lowercase().ends_with(&suffix) {
                new_name.to_string()
            } else {
                format!("{new_name}.{ext}")
            }
        }
        _ => new_name.to_string(),
    };

    if name == entry.name {
        return Err(DocErrKind::RenameUnchanged.into());
    }
    Ok(name)
}

fn folder_name(name: &str) -> DocResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DocErrKind::FolderNameEmpty.into());
    }
    if name.contains('/') {
        return Err(DocErrKind::FileNameContainsSlash.into());
    }
    Ok(name.to_string())
}

impl<C: Requester> DocLibrary<C> {
    /// Refetches the current folder after a mutation, whatever its outcome. If
    /// a listing is already in flight its owner fetches again instead.
    async fn resync(&self) {
        self.refresh().await.log_and_ignore();
    }

    fn target_or_current(&self, target_folder: Option<&str>) -> String {
        match target_folder {
            Some(folder) => normalize(folder),
            None => self.store.read(|s| s.current_path.clone()),
        }
    }

    /// Uploads `files` into `target_folder` (the current folder when `None`).
    /// Partial uploads are reported, not treated as failures.
    #[instrument(level = "debug", skip(self, files), fields(files = files.len()), err(Debug))]
    pub async fn upload_files(
        &self, files: Vec<UploadFile>, target_folder: Option<&str>,
    ) -> DocResult<UploadResponse> {
        if files.is_empty() {
            return Err(DocErrKind::NothingSelected.into());
        }
        let folder = self.target_or_current(target_folder);
        let total = files.len();
        self.report_progress(format!("Uploading {total} file(s)"), Some((0, total)));

        let result = self
            .client
            .upload(UploadRequest { folder, files })
            .await
            .map_err(DocErr::from)
            .and_then(|response| match response.status {
                UploadStatus::Success => {
                    self.report_progress(
                        format!("Uploaded {} file(s)", response.total_uploaded),
                        Some((response.total_uploaded, total)),
                    );
                    Ok(response)
                }
                UploadStatus::Partial => {
                    for err in response.error_messages() {
                        warn!("upload error: {err}");
                    }
                    self.report_progress(
                        format!(
                            "Uploaded {} file(s), {} failed",
                            response.total_uploaded, response.total_failed
                        ),
                        Some((response.total_uploaded, total)),
                    );
                    Ok(response)
                }
                UploadStatus::Error => {
                    let messages = response.error_messages();
                    let msg = if messages.is_empty() {
                        format!("none of the {total} file(s) were uploaded")
                    } else {
                        messages.join("; ")
                    };
                    Err(DocErrKind::Upload(msg).into())
                }
            });

        let result = self.surface(result);
        if result.is_err() {
            self.dismiss_progress();
        }
        self.resync().await;
        result
    }

    /// Reads local files and uploads them, for files dropped in from outside.
    pub async fn upload_paths(
        &self, paths: &[PathBuf], target_folder: Option<&str>,
    ) -> DocResult<UploadResponse> {
        let mut files = Vec::with_capacity(paths.len());
        for path in paths {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .ok_or(DocErrKind::FileNameEmpty)?;
            let content = self.surface(tokio::fs::read(path).await.map_err(DocErr::from))?;
            files.push(UploadFile { name, content });
        }
        self.upload_files(files, target_folder).await
    }

    /// Deletes one entry. Folders go with everything inside them, on the
    /// server, with no undo; callers confirm first (see [Self::request_delete]).
    #[instrument(level = "debug", skip(self, entry), fields(path = %entry.path), err(Debug))]
    pub async fn delete_entry(&self, entry: &DocumentEntry) -> DocResult<()> {
        let path = entry.path.clone();
        let result = if entry.is_folder {
            self.client.request(DeleteFolderRequest { path }).await
        } else {
            self.client.request(DeleteFileRequest { path }).await
        }
        .map(|_| ())
        .map_err(DocErr::from);

        let result = self.surface(result);
        if result.is_ok() {
            self.report_progress(format!("Deleted {}", entry.name), None);
        }
        self.resync().await;
        result
    }

    /// Renames `entry` inside its folder and returns the name that was sent.
    #[instrument(level = "debug", skip(self, entry), fields(path = %entry.path), err(Debug))]
    pub async fn rename_entry(&self, entry: &DocumentEntry, new_name: &str) -> DocResult<String> {
        let new_name = self.surface(rename_target(entry, new_name))?;
        let request = RenameRequest {
            old_name: entry.name.clone(),
            new_name: new_name.clone(),
            folder: parent_of(&entry.path).to_string(),
            update_metadata: true,
        };

        let result = if entry.is_folder {
            self.client.request(RenameFolderRequest(request)).await
        } else {
            self.client.request(request).await
        }
        .map(|_| new_name)
        .map_err(DocErr::from);

        let result = self.surface(result);
        if let Ok(name) = &result {
            self.report_progress(format!("Renamed {} to {name}", entry.name), None);
        }
        self.resync().await;
        result
    }

    #[instrument(level = "debug", skip(self), err(Debug))]
    pub async fn create_folder(&self, name: &str, parent_folder: &str) -> DocResult<()> {
        let name = self.surface(folder_name(name))?;
        let request = CreateFolderRequest { name: name.clone(), parent_folder: normalize(parent_folder) };

        let result = self
            .client
            .request(request)
            .await
            .map(|_| ())
            .map_err(DocErr::from);

        let result = self.surface(result);
        if result.is_ok() {
            self.report_progress(format!("Created folder {name}"), None);
        }
        self.resync().await;
        result
    }

    #[instrument(level = "debug", skip(self), err(Debug))]
    pub async fn update_classification(
        &self, path: &str, classification: Classification,
    ) -> DocResult<()> {
        let path = normalize(path);
        if self.store.read(|s| s.find(&path).map(|e| e.is_folder).unwrap_or(false)) {
            return Err(DocErrKind::NotAFile.into());
        }

        let result = self
            .client
            .request(UpdateClassificationRequest {
                filename: path.clone(),
                security_classification: classification,
            })
            .await
            .map(|_| ())
            .map_err(DocErr::from);

        let result = self.surface(result);
        if result.is_ok() {
            self.report_progress(format!("Updated classification of {path}"), None);
        }
        self.resync().await;
        result
    }

    /// Moves every source into `target_folder` in one call. Partial failure is
    /// reported with both counts; total failure is an error.
    #[instrument(level = "debug", skip(self), err(Debug))]
    pub async fn move_entries(
        &self, source_paths: Vec<String>, target_folder: &str,
    ) -> DocResult<MoveOutcome> {
        if source_paths.is_empty() {
            return Err(DocErrKind::NothingSelected.into());
        }
        let target_folder = normalize(target_folder);
        let requested = source_paths.len();
        self.report_progress(format!("Moving {requested} item(s)"), Some((0, requested)));

        let result = self
            .client
            .request(MoveRequest { source_paths, target_folder: target_folder.clone() })
            .await
            .map_err(DocErr::from)
            .and_then(|response| {
                let MoveResults { successful, failed } = response.results;
                for failure in &failed {
                    warn!(
                        "failed to move {} into {target_folder:?}: {}",
                        failure.path(),
                        failure.reason().unwrap_or("no reason given")
                    );
                }
                if successful.is_empty() && !failed.is_empty() {
                    return Err(DocErrKind::MoveFailed { failed: failed.len() }.into());
                }
                Ok(MoveOutcome { target_folder: target_folder.clone(), moved: successful, failed })
            });

        let result = self.surface(result);
        match &result {
            Ok(outcome) => self.report_progress(
                outcome.summary(),
                Some((outcome.moved.len(), outcome.moved.len() + outcome.failed.len())),
            ),
            Err(_) => self.dismiss_progress(),
        }
        self.resync().await;
        result
    }

    /// Raw bytes of a file, for previews.
    #[instrument(level = "debug", skip(self, entry), fields(path = %entry.path), err(Debug))]
    pub async fn fetch_content(&self, entry: &DocumentEntry) -> DocResult<Vec<u8>> {
        if entry.is_folder {
            return Err(DocErrKind::NotAFile.into());
        }
        let result = self
            .client
            .request_bytes(FileContentRequest { path: entry.path.clone() })
            .await
            .map_err(DocErr::from);
        self.surface(result)
    }

    pub fn open_create_folder(&self) {
        self.store.dispatch(Action::OpenDialog(Dialog::CreateFolder));
    }

    pub fn open_upload(&self) {
        self.store.dispatch(Action::OpenDialog(Dialog::Upload));
    }

    pub fn open_rename(&self, entry: &DocumentEntry) {
        self.store.dispatch(Action::OpenDialog(Dialog::Rename(entry.clone())));
    }

    /// Asks for confirmation before [Self::delete_entry].
    pub fn request_delete(&self, entry: &DocumentEntry) {
        self.store.dispatch(Action::OpenDialog(Dialog::DeleteConfirm(entry.clone())));
    }

    pub fn cancel_dialog(&self) {
        self.store.dispatch(Action::CloseDialog);
    }

    pub async fn confirm_delete(&self) -> DocResult<()> {
        let Some(Dialog::DeleteConfirm(entry)) = self.store.read(|s| s.dialog.clone()) else {
            return Err(DocErrKind::NoDialogOpen.into());
        };
        self.store.dispatch(Action::CloseDialog);
        self.delete_entry(&entry).await
    }

    /// Keeps the dialog open when the name is refused so it can be corrected.
    pub async fn confirm_rename(&self, new_name: &str) -> DocResult<String> {
        let Some(Dialog::Rename(entry)) = self.store.read(|s| s.dialog.clone()) else {
            return Err(DocErrKind::NoDialogOpen.into());
        };
        rename_target(&entry, new_name)?;
        self.store.dispatch(Action::CloseDialog);
        self.rename_entry(&entry, new_name).await
    }

    pub async fn confirm_create_folder(&self, name: &str) -> DocResult<()> {
        if self.store.read(|s| s.dialog != Some(Dialog::CreateFolder)) {
            return Err(DocErrKind::NoDialogOpen.into());
        }
        folder_name(name)?;
        self.store.dispatch(Action::CloseDialog);
        let parent = self.store.read(|s| s.current_path.clone());
        self.create_folder(name, &parent).await
    }

    pub async fn confirm_upload(&self, files: Vec<UploadFile>) -> DocResult<UploadResponse> {
        if self.store.read(|s| s.dialog != Some(Dialog::Upload)) {
            return Err(DocErrKind::NoDialogOpen.into());
        }
        self.store.dispatch(Action::CloseDialog);
        self.upload_files(files, None).await
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn rename_keeps_extension() {
        let entry = DocumentEntry::file("A/report.pdf", Classification::Public);
        assert_eq!(rename_target(&entry, "summary").unwrap(), "summary.pdf");
        assert_eq!(rename_target(&entry, "summary.PDF").unwrap(), "summary.PDF");
        assert_eq!(rename_target(&entry, " summary ").unwrap(), "summary.pdf");
    }

    #[test]
    fn rename_folder_verbatim() {
        let entry = DocumentEntry::folder("A/v1.0");
        assert_eq!(rename_target(&entry, "v2").unwrap(), "v2");
    }

    #[test]
    fn rename_refusals() {
        let entry = DocumentEntry::file("A/report.pdf", Classification::Public);
        assert_eq!(rename_target(&entry, "report").unwrap_err().kind, DocErrKind::RenameUnchanged);
        assert_eq!(rename_target(&entry, "  ").unwrap_err().kind, DocErrKind::FileNameEmpty);
        assert_eq!(rename_target(&entry, "a/b").unwrap_err().kind, DocErrKind::FileNameContainsSlash);
        assert_eq!(
            rename_target(&DocumentEntry::folder("A"), "").unwrap_err().kind,
            DocErrKind::FolderNameEmpty
        );
    }

    #[test]
    fn move_summary_mentions_both_counts() {
        let outcome = MoveOutcome {
            target_folder: "B".to_string(),
            moved: vec!["a".to_string()],
            failed: vec![MoveFailure::Path("b".to_string())],
        };
        assert_eq!(outcome.summary(), "Moved 1 item(s), but 1 failed. Check the logs for details.");
    }
}
