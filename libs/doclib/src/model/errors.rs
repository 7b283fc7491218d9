use std::backtrace::Backtrace;
use std::fmt::{self, Display, Formatter};
use std::io;
use std::panic::Location;

use serde::{Serialize, Serializer};
use tracing::error;

use crate::io::network::ApiError;

pub type DocResult<T> = Result<T, DocErr>;

#[derive(Debug)]
pub struct DocErr {
    pub kind: DocErrKind,
    pub backtrace: Option<Backtrace>,
}

impl Serialize for DocErr {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.kind.to_string())
    }
}

impl Display for DocErr {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.kind)
    }
}

impl std::error::Error for DocErr {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocErrKind {
    /// A folder listing could not be fetched or was not a list of entries.
    Fetch(String),
    /// The document service answered with a non-2xx status.
    Server { status: u16, detail: Option<String> },
    ServerUnreachable,

    FolderNameEmpty,
    FileNameEmpty,
    FileNameContainsSlash,
    RenameUnchanged,
    NothingSelected,
    AlreadyAtRoot,
    NoDialogOpen,
    NotAFile,

    MoveFailed { failed: usize },
    Upload(String),

    Io(String),
    Unexpected(String),
}

/// The text shown on the error banner. Server errors prefer the detail the
/// service sent back.
impl Display for DocErrKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            DocErrKind::Fetch(msg) => write!(f, "Failed to fetch documents: {msg}"),
            DocErrKind::Server { detail: Some(detail), .. } => write!(f, "{detail}"),
            DocErrKind::Server { status, detail: None } => {
                write!(f, "The document service rejected the request (status {status})")
            }
            DocErrKind::ServerUnreachable => write!(f, "Could not reach the document service"),
            DocErrKind::FolderNameEmpty => write!(f, "A folder name cannot be empty"),
            DocErrKind::FileNameEmpty => write!(f, "A file name cannot be empty"),
            DocErrKind::FileNameContainsSlash => write!(f, "A name cannot contain slashes"),
            DocErrKind::RenameUnchanged => write!(f, "The new name is the same as the old one"),
            DocErrKind::NothingSelected => write!(f, "Select at least one item first"),
            DocErrKind::AlreadyAtRoot => write!(f, "There is no folder above the root"),
            DocErrKind::NoDialogOpen => write!(f, "There is nothing to confirm"),
            DocErrKind::NotAFile => write!(f, "Only files can do that"),
            DocErrKind::MoveFailed { failed } => write!(f, "Failed to move {failed} item(s)"),
            DocErrKind::Upload(msg) => write!(f, "Upload failed: {msg}"),
            DocErrKind::Io(msg) => write!(f, "Could not access local files: {msg}"),
            DocErrKind::Unexpected(msg) => write!(f, "Unexpected error: {msg}"),
        }
    }
}

impl DocErrKind {
    /// Validation failures are caused by the user and never reach the network.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            DocErrKind::FolderNameEmpty
                | DocErrKind::FileNameEmpty
                | DocErrKind::FileNameContainsSlash
                | DocErrKind::RenameUnchanged
                | DocErrKind::NothingSelected
                | DocErrKind::AlreadyAtRoot
                | DocErrKind::NoDialogOpen
                | DocErrKind::NotAFile
        )
    }
}

impl From<DocErrKind> for DocErr {
    fn from(kind: DocErrKind) -> Self {
        Self { kind, backtrace: Some(Backtrace::force_capture()) }
    }
}

impl From<ApiError> for DocErr {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Status { status, detail } => DocErrKind::Server { status, detail },
            ApiError::SendFailed(_) => DocErrKind::ServerUnreachable,
            ApiError::Deserialize(msg) => DocErrKind::Fetch(msg),
            ApiError::ReceiveFailed(msg)
            | ApiError::Serialize(msg)
            | ApiError::InvalidUrl(msg) => DocErrKind::Unexpected(msg),
        }
        .into()
    }
}

impl From<io::Error> for DocErr {
    fn from(err: io::Error) -> Self {
        DocErrKind::Io(err.to_string()).into()
    }
}

pub trait Unexpected<T> {
    fn log_and_ignore(self) -> Option<T>;
}

impl<T, E: std::fmt::Debug> Unexpected<T> for Result<T, E> {
    #[track_caller]
    fn log_and_ignore(self) -> Option<T> {
        let location = Location::caller();
        if let Err(e) = &self {
            error!("error ignored at {}:{} {e:?}", location.file(), location.line());
        }

        self.ok()
    }
}
