use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::errors::{DocErrKind, DocResult};
use crate::model::path_ops::{file_name, normalize, parent_of};

/// What the document service sends for files nobody has classified yet.
pub const UNSET_CLASSIFICATION: &str = "SELECT A CLASSIFICATION";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Classification {
    Unset,
    Public,
    Internal,
    Confidential,
    Restricted,
    /// A tag this client does not know about, kept verbatim.
    Other(String),
}

impl Classification {
    pub fn as_str(&self) -> &str {
        match self {
            Classification::Unset => UNSET_CLASSIFICATION,
            Classification::Public => "PUBLIC",
            Classification::Internal => "INTERNAL",
            Classification::Confidential => "CONFIDENTIAL",
            Classification::Restricted => "RESTRICTED",
            Classification::Other(other) => other,
        }
    }

    pub fn is_unset(&self) -> bool {
        matches!(self, Classification::Unset)
    }
}

impl From<String> for Classification {
    fn from(value: String) -> Self {
        let trimmed = value.trim();
        match trimmed.to_ascii_uppercase().as_str() {
            "" | UNSET_CLASSIFICATION => Classification::Unset,
            "PUBLIC" => Classification::Public,
            "INTERNAL" => Classification::Internal,
            "CONFIDENTIAL" => Classification::Confidential,
            "RESTRICTED" => Classification::Restricted,
            _ => Classification::Other(trimmed.to_string()),
        }
    }
}

impl From<&str> for Classification {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<Classification> for String {
    fn from(value: Classification) -> Self {
        value.as_str().to_string()
    }
}

impl Display for Classification {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One row of a folder listing as the document service sends it.
#[derive(Debug, Clone, Deserialize)]
pub struct WireEntry {
    pub name: String,
    pub path: String,
    #[serde(rename = "type", default)]
    pub file_type: Option<String>,
    #[serde(default, alias = "uploadDate")]
    pub upload_date: Option<String>,
    #[serde(default, alias = "security_classification")]
    pub classification: Option<String>,
}

/// A file or folder in the current listing. `id` is always the `path`, so
/// folders and files are addressed the same way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentEntry {
    pub id: String,
    pub path: String,
    pub name: String,
    pub is_folder: bool,
    pub file_type: Option<String>,
    /// Always `None` for folders.
    pub classification: Option<Classification>,
    /// Always `None` for folders.
    pub upload_date: Option<String>,
}

impl DocumentEntry {
    pub fn folder(path: &str) -> Self {
        let path = normalize(path);
        Self {
            id: path.clone(),
            name: file_name(&path).to_string(),
            path,
            is_folder: true,
            file_type: Some("folder".to_string()),
            classification: None,
            upload_date: None,
        }
    }

    pub fn file(path: &str, classification: Classification) -> Self {
        let path = normalize(path);
        let name = file_name(&path).to_string();
        Self {
            id: path.clone(),
            file_type: extension(&name).map(str::to_string),
            name,
            path,
            is_folder: false,
            classification: Some(classification),
            upload_date: None,
        }
    }

    pub fn is_file(&self) -> bool {
        !self.is_folder
    }

    pub fn parent(&self) -> &str {
        parent_of(&self.path)
    }

    /// Derives `is_folder` and `id`, and drops the file-only fields from folders.
    pub fn from_wire(wire: WireEntry) -> Self {
        let is_folder = wire.file_type.as_deref() == Some("folder");
        let path = normalize(&wire.path);
        let (classification, upload_date) = if is_folder {
            (None, None)
        } else {
            let classification = wire
                .classification
                .map(Classification::from)
                .unwrap_or(Classification::Unset);
            (Some(classification), wire.upload_date)
        };

        Self {
            id: path.clone(),
            path,
            name: wire.name,
            is_folder,
            file_type: wire.file_type,
            classification,
            upload_date,
        }
    }
}

/// The extension of a file name without the dot, if it has one. Dotfiles like
/// `.env` have no extension.
pub fn extension(name: &str) -> Option<&str> {
    match name.rfind('.') {
        Some(0) | None => None,
        Some(idx) if idx + 1 == name.len() => None,
        Some(idx) => Some(&name[idx + 1..]),
    }
}

/// Folders before files, then by name, then by path so the order is total.
pub fn listing_order(a: &DocumentEntry, b: &DocumentEntry) -> Ordering {
    b.is_folder
        .cmp(&a.is_folder)
        .then_with(|| a.name.cmp(&b.name))
        .then_with(|| a.path.cmp(&b.path))
}

pub fn sort_entries(entries: &mut [DocumentEntry]) {
    entries.sort_by(listing_order);
}

/// Turns a raw listing payload into sorted entries with unique paths.
pub fn normalize_listing(payload: Value) -> DocResult<Vec<DocumentEntry>> {
    let Value::Array(items) = payload else {
        return Err(DocErrKind::Fetch("expected a list of entries".to_string()).into());
    };

    let mut seen = HashSet::with_capacity(items.len());
    let mut entries = Vec::with_capacity(items.len());
    for item in items {
        let wire: WireEntry = serde_json::from_value(item)
            .map_err(|err| DocErrKind::Fetch(format!("malformed entry: {err}")))?;
        let entry = DocumentEntry::from_wire(wire);
        if !seen.insert(entry.path.clone()) {
            warn!("dropping duplicate listing entry {}", entry.path);
            continue;
        }
        entries.push(entry);
    }

    sort_entries(&mut entries);
    Ok(entries)
}
