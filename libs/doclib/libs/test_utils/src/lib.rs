//! An in-memory document service and fixtures for exercising doclib without
//! a server.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::env;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use doclib::io::network::{ApiError, Requester};
use doclib::model::api::{Request, UploadRequest, UploadResponse, UploadStatus};
use doclib::model::entry::{extension, Classification, DocumentEntry};
use doclib::model::path_ops::{file_name, is_within, join, normalize, parent_of};
use doclib::{Config, DocLibrary};
use http::Method;
use serde_json::{json, Value};
use tokio::sync::watch;
use uuid::Uuid;

pub fn test_config() -> Config {
    let dir = env::temp_dir().join(format!("doclib-{}", Uuid::new_v4()));

    Config {
        api_url: "http://localhost:8000".to_string(),
        writeable_path: dir.to_string_lossy().to_string(),
        background_work: false,
        logs: false,
        stdout_logs: false,
        colored_logs: false,
        drag_timeout: Duration::from_millis(300),
        progress_timeout: Duration::from_secs(1),
    }
}

pub async fn test_lib(service: &MockService) -> DocLibrary<MockService> {
    DocLibrary::with_client(test_config(), service.clone())
        .await
        .unwrap()
}

pub fn folder(path: &str) -> DocumentEntry {
    DocumentEntry::folder(path)
}

pub fn file(path: &str) -> DocumentEntry {
    DocumentEntry::file(path, Classification::Public)
}

/// The entry at `path` in the current listing.
pub fn listed(lib: &DocLibrary<MockService>, path: &str) -> DocumentEntry {
    lib.state()
        .find(path)
        .cloned()
        .unwrap_or_else(|| panic!("{path} is not in the current listing"))
}

pub fn listed_paths(lib: &DocLibrary<MockService>) -> Vec<String> {
    lib.state().documents.into_iter().map(|d| d.path).collect()
}

/// Polls `check` for up to two seconds.
pub async fn eventually(mut check: impl FnMut() -> bool) -> bool {
    for _ in 0..100 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    check()
}

/// One request as the service received it.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub method: Method,
    pub route: &'static str,
    pub target: Option<String>,
    pub query: Vec<(&'static str, String)>,
    pub body: Value,
}

#[derive(Debug, Clone)]
struct Node {
    is_folder: bool,
    classification: Classification,
    content: Vec<u8>,
}

#[derive(Default)]
struct Inner {
    nodes: BTreeMap<String, Node>,
    calls: Vec<Call>,
    failures: HashMap<(Method, &'static str), ApiError>,
    refuse_moves: HashSet<String>,
    raw_listings: HashMap<String, Value>,
    upload_script: Option<UploadResponse>,
}

/// A document service backed by a tree in memory. Every request is recorded
/// before anything else happens, so refusals that never reach the network
/// show up as missing calls.
#[derive(Clone)]
pub struct MockService {
    inner: Arc<Mutex<Inner>>,
    listings_open: Arc<watch::Sender<bool>>,
}

impl Default for MockService {
    fn default() -> Self {
        Self::new()
    }
}

impl MockService {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(true);
        Self { inner: Default::default(), listings_open: Arc::new(tx) }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap()
    }

    pub fn add_folder(&self, path: &str) -> &Self {
        let path = normalize(path);
        let mut inner = self.lock();
        let mut current = String::new();
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            current = join(&current, segment);
            inner.nodes.entry(current.clone()).or_insert(Node {
                is_folder: true,
                classification: Classification::Unset,
                content: vec![],
            });
        }
        self
    }

    pub fn add_file(&self, path: &str, classification: Classification) -> &Self {
        let path = normalize(path);
        self.add_folder(parent_of(&path));
        self.lock().nodes.insert(
            path.clone(),
            Node { is_folder: false, classification, content: path.as_bytes().to_vec() },
        );
        self
    }

    pub fn exists(&self, path: &str) -> bool {
        self.lock().nodes.contains_key(&normalize(path))
    }

    pub fn classification(&self, path: &str) -> Option<Classification> {
        self.lock()
            .nodes
            .get(&normalize(path))
            .map(|n| n.classification.clone())
    }

    /// Every call to `method` `route` fails with `err` until cleared.
    pub fn fail(&self, method: Method, route: &'static str, err: ApiError) {
        self.lock().failures.insert((method, route), err);
    }

    pub fn clear_failures(&self) {
        self.lock().failures.clear();
    }

    /// Moves of `path` are reported as failed.
    pub fn refuse_move(&self, path: &str) {
        self.lock().refuse_moves.insert(normalize(path));
    }

    /// Listings of `folder` answer with `payload` instead of the tree.
    pub fn raw_listing(&self, folder: &str, payload: Value) {
        self.lock().raw_listings.insert(normalize(folder), payload);
    }

    /// The next upload answers with `response`; its first `total_uploaded`
    /// files are stored.
    pub fn script_upload(&self, response: UploadResponse) {
        self.lock().upload_script = Some(response);
    }

    /// Listings wait until [Self::release_listings].
    pub fn hold_listings(&self) {
        self.listings_open.send_replace(false);
    }

    pub fn release_listings(&self) {
        self.listings_open.send_replace(true);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    pub fn calls_to(&self, method: Method, route: &str) -> Vec<Call> {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.method == method && c.route == route)
            .cloned()
            .collect()
    }

    /// Calls other than folder listings.
    pub fn mutations(&self) -> Vec<Call> {
        self.lock()
            .calls
            .iter()
            .filter(|c| !(c.method == Method::GET && c.route == "/files"))
            .cloned()
            .collect()
    }

    pub fn listings(&self) -> usize {
        self.calls_to(Method::GET, "/files").len()
    }

    fn record(&self, call: Call) -> Result<(), ApiError> {
        let mut inner = self.lock();
        let failure = inner.failures.get(&(call.method.clone(), call.route)).cloned();
        inner.calls.push(call);
        match failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn wait_for_listings(&self) {
        let mut rx = self.listings_open.subscribe();
        let _ = rx.wait_for(|open| *open).await;
    }

    fn handle(&self, call: &Call) -> Result<Value, ApiError> {
        let mut inner = self.lock();
        let body = &call.body;
        let text = |key: &str| body.get(key).and_then(Value::as_str).unwrap_or_default().to_string();

        match (call.method.as_str(), call.route) {
            ("GET", "/files") => {
                let folder = call
                    .query
                    .iter()
                    .find(|(k, _)| *k == "folder")
                    .map(|(_, v)| normalize(v))
                    .unwrap_or_default();
                if let Some(raw) = inner.raw_listings.get(&folder) {
                    return Ok(raw.clone());
                }
                if !folder.is_empty() && !inner.nodes.get(&folder).map(|n| n.is_folder).unwrap_or(false) {
                    return Err(not_found(&folder));
                }
                Ok(Value::Array(
                    inner
                        .nodes
                        .iter()
                        .filter(|(path, _)| parent_of(path) == folder)
                        .map(|(path, node)| wire(path, node))
                        .collect(),
                ))
            }
            ("DELETE", "/files") | ("DELETE", "/delete_folder") => {
                let path = normalize(call.target.as_deref().unwrap_or_default());
                remove(&mut inner.nodes, &path)?;
                Ok(json!({ "message": format!("{path} deleted") }))
            }
            ("POST", "/bulk-delete") => {
                let mut deleted = 0;
                for path in body["filenames"].as_array().into_iter().flatten() {
                    if remove(&mut inner.nodes, &normalize(path.as_str().unwrap_or_default())).is_ok() {
                        deleted += 1;
                    }
                }
                Ok(json!({ "deleted": deleted }))
            }
            ("POST", "/create_folder") => {
                let path = join(&text("parent_folder"), &text("name"));
                if inner.nodes.contains_key(&path) {
                    return Err(ApiError::Status {
                        status: 409,
                        detail: Some(format!("{path} already exists")),
                    });
                }
                inner.nodes.insert(
                    path,
                    Node { is_folder: true, classification: Classification::Unset, content: vec![] },
                );
                Ok(json!({ "message": "created" }))
            }
            ("POST", "/rename_file") | ("POST", "/rename_folder") => {
                let folder = text("folder");
                let from = join(&folder, &text("old_name"));
                let to = join(&folder, &text("new_name"));
                relocate(&mut inner.nodes, &from, &to)?;
                Ok(json!({ "message": "renamed" }))
            }
            ("POST", "/move-file") => {
                let target = normalize(&text("target_folder"));
                let mut successful = vec![];
                let mut failed = vec![];
                for source in body["source_paths"].as_array().into_iter().flatten() {
                    let source = normalize(source.as_str().unwrap_or_default());
                    let to = join(&target, file_name(&source));
                    if inner.refuse_moves.contains(&source) {
                        failed.push(json!({ "path": source, "error": "refused" }));
                        continue;
                    }
                    match relocate(&mut inner.nodes, &source, &to) {
                        Ok(()) => successful.push(json!(source)),
                        Err(_) => failed.push(json!(source)),
                    }
                }
                Ok(json!({ "results": { "successful": successful, "failed": failed } }))
            }
            ("POST", "/update-security") => {
                let path = normalize(&text("filename"));
                let node = inner.nodes.get_mut(&path).ok_or_else(|| not_found(&path))?;
                node.classification = Classification::from(text("security_classification"));
                Ok(json!({ "message": "updated" }))
            }
            ("GET", "/file-content") => {
                let path = normalize(call.target.as_deref().unwrap_or_default());
                let node = inner.nodes.get(&path).ok_or_else(|| not_found(&path))?;
                Ok(json!(node.content))
            }
            ("POST", "/bulk-download") => Ok(json!(archive(body))),
            (method, route) => Err(ApiError::Status {
                status: 404,
                detail: Some(format!("no route {method} {route}")),
            }),
        }
    }

    fn bytes(&self, call: &Call) -> Result<Vec<u8>, ApiError> {
        match call.route {
            "/bulk-download" => Ok(archive(&call.body)),
            _ => {
                let value = self.handle(call)?;
                serde_json::from_value(value).map_err(|err| ApiError::Deserialize(err.to_string()))
            }
        }
    }
}

fn call_for<T: Request>(request: &T) -> Result<Call, ApiError> {
    Ok(Call {
        method: T::METHOD,
        route: T::ROUTE,
        target: request.target().map(str::to_string),
        query: request.query(),
        body: serde_json::to_value(request).map_err(|err| ApiError::Serialize(err.to_string()))?,
    })
}

fn not_found(path: &str) -> ApiError {
    ApiError::Status { status: 404, detail: Some(format!("{path} not found")) }
}

fn wire(path: &str, node: &Node) -> Value {
    if node.is_folder {
        json!({ "name": file_name(path), "path": path, "type": "folder" })
    } else {
        json!({
            "name": file_name(path),
            "path": path,
            "type": extension(file_name(path)).unwrap_or("file"),
            "upload_date": "2024-01-01T00:00:00",
            "classification": node.classification.as_str(),
        })
    }
}

fn archive(body: &Value) -> Vec<u8> {
    let names: Vec<&str> = body["filenames"]
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .collect();
    format!("PK{}", names.join("\n")).into_bytes()
}

fn remove(nodes: &mut BTreeMap<String, Node>, path: &str) -> Result<(), ApiError> {
    if !nodes.contains_key(path) {
        return Err(not_found(path));
    }
    nodes.retain(|p, _| !is_within(p, path));
    Ok(())
}

/// Moves `from` and everything under it to `to`.
fn relocate(nodes: &mut BTreeMap<String, Node>, from: &str, to: &str) -> Result<(), ApiError> {
    if !nodes.contains_key(from) {
        return Err(not_found(from));
    }
    if nodes.contains_key(to) {
        return Err(ApiError::Status { status: 409, detail: Some(format!("{to} already exists")) });
    }
    let moving: Vec<String> = nodes
        .keys()
        .filter(|p| is_within(p, from))
        .cloned()
        .collect();
    for old in moving {
        if let Some(node) = nodes.remove(&old) {
            let new = format!("{to}{}", &old[from.len()..]);
            nodes.insert(new, node);
        }
    }
    Ok(())
}

impl Requester for MockService {
    async fn request<T: Request>(&self, request: T) -> Result<T::Response, ApiError> {
        let call = call_for(&request)?;
        let listing = call.method == Method::GET && call.route == "/files";
        self.record(call.clone())?;
        // a listing answers with the tree as it was when the request arrived
        let value = self.handle(&call);
        if listing {
            self.wait_for_listings().await;
        }
        serde_json::from_value(value?).map_err(|err| ApiError::Deserialize(err.to_string()))
    }

    async fn request_bytes<T: Request>(&self, request: T) -> Result<Vec<u8>, ApiError> {
        let call = call_for(&request)?;
        self.record(call.clone())?;
        self.bytes(&call)
    }

    async fn upload(&self, request: UploadRequest) -> Result<UploadResponse, ApiError> {
        let names: Vec<&str> = request.files.iter().map(|f| f.name.as_str()).collect();
        self.record(Call {
            method: UploadRequest::METHOD,
            route: UploadRequest::ROUTE,
            target: None,
            query: vec![],
            body: json!({ "folder": &request.folder, "files": names }),
        })?;

        let mut inner = self.lock();
        let response = inner.upload_script.take().unwrap_or(UploadResponse {
            status: UploadStatus::Success,
            total_uploaded: request.files.len(),
            total_failed: 0,
            errors: vec![],
        });
        for upload in request.files.iter().take(response.total_uploaded) {
            inner.nodes.insert(
                join(&request.folder, &upload.name),
                Node {
                    is_folder: false,
                    classification: Classification::Unset,
                    content: upload.content.clone(),
                },
            );
        }
        Ok(response)
    }
}

#[cfg(test)]
mod test {
    use std::env;

    use super::test_config;

    #[test]
    fn every_config_gets_its_own_dir() {
        let a = test_config().writeable_path;
        let b = test_config().writeable_path;
        assert_ne!(a, b);
        assert!(a.starts_with(&*env::temp_dir().to_string_lossy()));
    }
}
