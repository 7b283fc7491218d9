use std::path::PathBuf;
use std::sync::Arc;

use tokio::runtime::Runtime;

use crate::model::api::{UploadFile, UploadResponse};
use crate::model::core_config::Config;
use crate::model::entry::{Classification, DocumentEntry};
use crate::model::errors::DocResult;
use crate::model::store::State;
use crate::service::events::{Event, Receiver};
use crate::service::file::MoveOutcome;

/// [crate::DocLibrary] for callers without an async runtime. Owns a runtime
/// and blocks on it for every network-bound call.
#[derive(Clone)]
pub struct DocLibrary {
    lib: crate::DocLibrary,
    rt: Arc<Runtime>,
}

impl DocLibrary {
    pub fn init(config: Config) -> DocResult<Self> {
        let rt = Arc::new(Runtime::new()?);
        let lib = rt.block_on(crate::DocLibrary::init(config))?;
        Ok(Self { lib, rt })
    }

    pub fn get_config(&self) -> Config {
        self.lib.config.clone()
    }

    pub fn state(&self) -> State {
        self.lib.state()
    }

    pub fn subscribe(&self) -> Receiver<Event> {
        self.lib.subscribe()
    }

    pub fn refresh(&self) -> DocResult<()> {
        self.rt.block_on(self.lib.refresh())
    }

    pub fn list_folder(&self, folder: &str) -> DocResult<Vec<DocumentEntry>> {
        self.rt.block_on(self.lib.list_folder(folder))
    }

    pub fn navigate_to(&self, path: &str) -> DocResult<()> {
        self.rt.block_on(self.lib.navigate_to(path))
    }

    pub fn open_entry(&self, entry: &DocumentEntry) -> DocResult<()> {
        self.rt.block_on(self.lib.open_entry(entry))
    }

    pub fn navigate_up(&self) -> DocResult<()> {
        self.rt.block_on(self.lib.navigate_up())
    }

    pub fn navigate_to_breadcrumb(&self, index: usize) -> DocResult<()> {
        self.rt.block_on(self.lib.navigate_to_breadcrumb(index))
    }

    pub fn toggle_select(&self, path: &str) {
        self.lib.toggle_select(path)
    }

    pub fn select_all(&self) {
        self.lib.select_all()
    }

    pub fn clear_selection(&self) {
        self.lib.clear_selection()
    }

    pub fn selected(&self) -> Vec<DocumentEntry> {
        self.lib.selected()
    }

    pub fn create_folder(&self, name: &str, parent_folder: &str) -> DocResult<()> {
        self.rt.block_on(self.lib.create_folder(name, parent_folder))
    }

    pub fn rename_entry(&self, entry: &DocumentEntry, new_name: &str) -> DocResult<String> {
        self.rt.block_on(self.lib.rename_entry(entry, new_name))
    }

    pub fn delete_entry(&self, entry: &DocumentEntry) -> DocResult<()> {
        self.rt.block_on(self.lib.delete_entry(entry))
    }

    pub fn open_create_folder(&self) {
        self.lib.open_create_folder()
    }

    pub fn open_upload(&self) {
        self.lib.open_upload()
    }

    pub fn open_rename(&self, entry: &DocumentEntry) {
        self.lib.open_rename(entry)
    }

    pub fn request_delete(&self, entry: &DocumentEntry) {
        self.lib.request_delete(entry)
    }

    pub fn cancel_dialog(&self) {
        self.lib.cancel_dialog()
    }

    pub fn confirm_delete(&self) -> DocResult<()> {
        self.rt.block_on(self.lib.confirm_delete())
    }

    pub fn confirm_rename(&self, new_name: &str) -> DocResult<String> {
        self.rt.block_on(self.lib.confirm_rename(new_name))
    }

    pub fn confirm_create_folder(&self, name: &str) -> DocResult<()> {
        self.rt.block_on(self.lib.confirm_create_folder(name))
    }

    pub fn confirm_upload(&self, files: Vec<UploadFile>) -> DocResult<UploadResponse> {
        self.rt.block_on(self.lib.confirm_upload(files))
    }

    pub fn update_classification(
        &self, path: &str, classification: Classification,
    ) -> DocResult<()> {
        self.rt
            .block_on(self.lib.update_classification(path, classification))
    }

    pub fn upload_files(
        &self, files: Vec<UploadFile>, target_folder: Option<&str>,
    ) -> DocResult<UploadResponse> {
        self.rt.block_on(self.lib.upload_files(files, target_folder))
    }

    pub fn upload_paths(
        &self, paths: &[PathBuf], target_folder: Option<&str>,
    ) -> DocResult<UploadResponse> {
        self.rt.block_on(self.lib.upload_paths(paths, target_folder))
    }

    pub fn move_entries(
        &self, source_paths: Vec<String>, target_folder: &str,
    ) -> DocResult<MoveOutcome> {
        self.rt
            .block_on(self.lib.move_entries(source_paths, target_folder))
    }

    pub fn fetch_content(&self, entry: &DocumentEntry) -> DocResult<Vec<u8>> {
        self.rt.block_on(self.lib.fetch_content(entry))
    }

    pub fn bulk_delete(&self, paths: Vec<String>) -> DocResult<()> {
        self.rt.block_on(self.lib.bulk_delete(paths))
    }

    pub fn request_bulk_delete(&self) -> DocResult<()> {
        self.lib.request_bulk_delete()
    }

    pub fn confirm_bulk_delete(&self) -> DocResult<()> {
        self.rt.block_on(self.lib.confirm_bulk_delete())
    }

    pub fn bulk_download(&self, paths: Vec<String>, current_folder: &str) -> DocResult<Vec<u8>> {
        self.rt
            .block_on(self.lib.bulk_download(paths, current_folder))
    }

    pub fn download_selected(&self) -> DocResult<PathBuf> {
        self.rt.block_on(self.lib.download_selected())
    }

    pub fn move_selected_to_parent(&self) -> DocResult<MoveOutcome> {
        self.rt.block_on(self.lib.move_selected_to_parent())
    }

    pub fn drag_start(&self, item: &DocumentEntry) {
        self.lib.drag_start(item)
    }

    pub fn drag_enter(&self, target: &DocumentEntry) {
        self.lib.drag_enter(target)
    }

    pub fn drag_leave(&self, target: &DocumentEntry, related: Option<&str>) {
        self.lib.drag_leave(target, related)
    }

    pub fn drag_end(&self) {
        self.lib.drag_end()
    }

    pub fn drop_on(&self, target: &DocumentEntry) -> DocResult<Option<MoveOutcome>> {
        self.rt.block_on(self.lib.drop_on(target))
    }

    pub fn external_drop(&self) {
        self.lib.external_drop()
    }

    pub fn teardown(&self) {
        self.lib.teardown()
    }

    pub fn report_progress(&self, status: impl Into<String>, counts: Option<(usize, usize)>) {
        self.lib.report_progress(status, counts)
    }

    pub fn dismiss_error(&self) {
        self.lib.dismiss_error()
    }

    pub fn dismiss_progress(&self) {
        self.lib.dismiss_progress()
    }
}
