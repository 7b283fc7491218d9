use std::fmt::Debug;

use http::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::entry::Classification;

/// One call against the document service. POST requests carry themselves as
/// a JSON body; GET and DELETE requests address an entry through `target`
/// and `query`.
pub trait Request: Serialize + Debug + Send + Sync + 'static {
    type Response: Debug + DeserializeOwned + Send;
    const METHOD: Method;
    const ROUTE: &'static str;

    /// An entry path appended to `ROUTE`, one url segment per path segment.
    fn target(&self) -> Option<&str> {
        None
    }

    fn query(&self) -> Vec<(&'static str, String)> {
        vec![]
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
pub struct ListFolderRequest {
    pub folder: String,
}

impl Request for ListFolderRequest {
    /// Left raw: a payload that is not an array is a fetch error, not a
    /// deserialization detail.
    type Response = Value;
    const METHOD: Method = Method::GET;
    const ROUTE: &'static str = "/files";

    fn query(&self) -> Vec<(&'static str, String)> {
        vec![("folder", self.folder.clone())]
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
pub struct DeleteFileRequest {
    #[serde(skip)]
    pub path: String,
}

impl Request for DeleteFileRequest {
    type Response = Value;
    const METHOD: Method = Method::DELETE;
    const ROUTE: &'static str = "/files";

    fn target(&self) -> Option<&str> {
        Some(&self.path)
    }
}

/// Deletes the folder and everything below it. There is no undo.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
pub struct DeleteFolderRequest {
    #[serde(skip)]
    pub path: String,
}

impl Request for DeleteFolderRequest {
    type Response = Value;
    const METHOD: Method = Method::DELETE;
    const ROUTE: &'static str = "/delete_folder";

    fn target(&self) -> Option<&str> {
        Some(&self.path)
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
pub struct BulkDeleteRequest {
    pub filenames: Vec<String>,
}

impl Request for BulkDeleteRequest {
    type Response = Value;
    const METHOD: Method = Method::POST;
    const ROUTE: &'static str = "/bulk-delete";
}

/// Answered with a binary archive rather than JSON.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
pub struct BulkDownloadRequest {
    pub filenames: Vec<String>,
    pub current_folder: String,
}

impl Request for BulkDownloadRequest {
    type Response = Value;
    const METHOD: Method = Method::POST;
    const ROUTE: &'static str = "/bulk-download";
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
pub struct CreateFolderRequest {
    pub name: String,
    pub parent_folder: String,
}

impl Request for CreateFolderRequest {
    type Response = Value;
    const METHOD: Method = Method::POST;
    const ROUTE: &'static str = "/create_folder";
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
pub struct RenameRequest {
    pub old_name: String,
    pub new_name: String,
    pub folder: String,
    pub update_metadata: bool,
}

impl Request for RenameRequest {
    type Response = Value;
    const METHOD: Method = Method::POST;
    const ROUTE: &'static str = "/rename_file";
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(transparent)]
pub struct RenameFolderRequest(pub RenameRequest);

impl Request for RenameFolderRequest {
    type Response = Value;
    const METHOD: Method = Method::POST;
    const ROUTE: &'static str = "/rename_folder";
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
pub struct MoveRequest {
    pub source_paths: Vec<String>,
    pub target_folder: String,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Default)]
pub struct MoveResponse {
    #[serde(default)]
    pub results: MoveResults,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Default)]
pub struct MoveResults {
    #[serde(default)]
    pub successful: Vec<String>,
    #[serde(default)]
    pub failed: Vec<MoveFailure>,
}

/// The service reports failed moves either as bare paths or with a reason.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(untagged)]
pub enum MoveFailure {
    Path(String),
    Detailed {
        #[serde(alias = "source_path")]
        path: String,
        #[serde(default, alias = "detail")]
        error: Option<String>,
    },
}

impl MoveFailure {
    pub fn path(&self) -> &str {
        match self {
            MoveFailure::Path(path) | MoveFailure::Detailed { path, .. } => path,
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            MoveFailure::Path(_) => None,
            MoveFailure::Detailed { error, .. } => error.as_deref(),
        }
    }
}

impl Request for MoveRequest {
    type Response = MoveResponse;
    const METHOD: Method = Method::POST;
    const ROUTE: &'static str = "/move-file";
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
pub struct UpdateClassificationRequest {
    pub filename: String,
    pub security_classification: Classification,
}

impl Request for UpdateClassificationRequest {
    type Response = Value;
    const METHOD: Method = Method::POST;
    const ROUTE: &'static str = "/update-security";
}

/// Raw bytes of a file, for previews.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
pub struct FileContentRequest {
    #[serde(skip)]
    pub path: String,
}

impl Request for FileContentRequest {
    type Response = Value;
    const METHOD: Method = Method::GET;
    const ROUTE: &'static str = "/file-content";

    fn target(&self) -> Option<&str> {
        Some(&self.path)
    }
}

/// Multipart upload; sent as form fields `files` and `folder`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub folder: String,
    pub files: Vec<UploadFile>,
}

impl UploadRequest {
    pub const METHOD: Method = Method::POST;
    pub const ROUTE: &'static str = "/upload";
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub name: String,
    pub content: Vec<u8>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    Success,
    Partial,
    Error,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub struct UploadResponse {
    pub status: UploadStatus,
    #[serde(default)]
    pub total_uploaded: usize,
    #[serde(default)]
    pub total_failed: usize,
    #[serde(default)]
    pub errors: Vec<Value>,
}

impl UploadResponse {
    pub fn error_messages(&self) -> Vec<String> {
        self.errors.iter().map(detail_text).collect()
    }
}

/// Human readable text out of a `detail`-ish JSON value.
pub fn detail_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Object(map) => ["detail", "error", "message"]
            .iter()
            .find_map(|key| map.get(*key))
            .map(detail_text)
            .unwrap_or_else(|| value.to_string()),
        _ => value.to_string(),
    }
}
