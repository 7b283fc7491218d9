use std::future::Future;
use std::time::{Duration, Instant};

use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response, Url};
use serde_json::Value;

use crate::get_code_version;
use crate::model::api::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Any non-2xx answer, with the service's `detail` when it sent one.
    Status { status: u16, detail: Option<String> },
    Serialize(String),
    SendFailed(String),
    ReceiveFailed(String),
    Deserialize(String),
    InvalidUrl(String),
}

/// Everything the library needs from the document service. [Network] talks
/// to a real one; tests substitute an in-memory service.
pub trait Requester: Clone + Send + Sync + 'static {
    fn request<T: Request>(
        &self, request: T,
    ) -> impl Future<Output = Result<T::Response, ApiError>> + Send;

    /// Like [Requester::request] for endpoints that answer with a binary body.
    fn request_bytes<T: Request>(
        &self, request: T,
    ) -> impl Future<Output = Result<Vec<u8>, ApiError>> + Send;

    fn upload(
        &self, request: UploadRequest,
    ) -> impl Future<Output = Result<UploadResponse, ApiError>> + Send;
}

#[derive(Debug, Clone)]
pub struct Network {
    pub client: Client,
    pub api_url: String,
    pub get_code_version: fn() -> &'static str,
}

impl Network {
    pub fn new(api_url: &str) -> Self {
        Self {
            client: Default::default(),
            api_url: api_url.trim_end_matches('/').to_string(),
            get_code_version,
        }
    }

    fn url(&self, route: &str, target: Option<&str>) -> Result<Url, ApiError> {
        let mut url = Url::parse(&format!("{}{}", self.api_url, route))
            .map_err(|err| ApiError::InvalidUrl(err.to_string()))?;
        if let Some(target) = target {
            url.path_segments_mut()
                .map_err(|_| ApiError::InvalidUrl(self.api_url.clone()))?
                .extend(target.split('/').filter(|seg| !seg.is_empty()));
        }
        Ok(url)
    }

    fn build<T: Request>(&self, request: &T) -> Result<RequestBuilder, ApiError> {
        let url = self.url(T::ROUTE, request.target())?;
        let mut builder = self
            .client
            .request(T::METHOD, url)
            .header("Accept-Version", (self.get_code_version)());

        let query = request.query();
        if !query.is_empty() {
            builder = builder.query(&query);
        }
        if T::METHOD == http::Method::POST {
            let body =
                serde_json::to_vec(request).map_err(|err| ApiError::Serialize(err.to_string()))?;
            builder = builder
                .header(http::header::CONTENT_TYPE, "application/json")
                .body(body);
        }
        Ok(builder)
    }

    async fn send(&self, route: &str, builder: RequestBuilder) -> Result<Vec<u8>, ApiError> {
        let start = Instant::now();
        let sent = builder.send().await.map_err(|err| {
            warn!("send to {route} failed: {err:?}");
            ApiError::SendFailed(err.to_string())
        })?;
        if start.elapsed() > Duration::from_millis(1000) {
            warn!("network request to {route} took {:?}", start.elapsed());
        }

        check(sent).await
    }
}

/// Reads the body of a successful response, or turns a failed one into
/// [ApiError::Status].
async fn check(response: Response) -> Result<Vec<u8>, ApiError> {
    let status = response.status();
    let body = response
        .bytes()
        .await
        .map_err(|err| ApiError::ReceiveFailed(err.to_string()))?;

    if status.is_success() {
        return Ok(body.to_vec());
    }

    let detail = serde_json::from_slice::<Value>(&body)
        .ok()
        .and_then(|v| v.get("detail").map(detail_text));
    Err(ApiError::Status { status: status.as_u16(), detail })
}

pub(crate) fn parse_body<T: serde::de::DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    // empty bodies (204s, bare deletes) read as null
    let body: &[u8] = if body.is_empty() { b"null" } else { body };
    serde_json::from_slice(body).map_err(|err| ApiError::Deserialize(err.to_string()))
}

impl Requester for Network {
    #[instrument(level = "debug", skip(self, request), fields(route = T::ROUTE), err(Debug))]
    async fn request<T: Request>(&self, request: T) -> Result<T::Response, ApiError> {
        let builder = self.build(&request)?;
        let body = self.send(T::ROUTE, builder).await?;
        parse_body(&body)
    }

    #[instrument(level = "debug", skip(self, request), fields(route = T::ROUTE), err(Debug))]
    async fn request_bytes<T: Request>(&self, request: T) -> Result<Vec<u8>, ApiError> {
        let builder = self.build(&request)?;
        self.send(T::ROUTE, builder).await
    }

    #[instrument(level = "debug", skip(self, request), fields(files = request.files.len()), err(Debug))]
    async fn upload(&self, request: UploadRequest) -> Result<UploadResponse, ApiError> {
        let mut form = Form::new().text("folder", request.folder);
        for file in request.files {
            form = form.part("files", Part::bytes(file.content).file_name(file.name));
        }

        let builder = self
            .client
            .request(UploadRequest::METHOD, self.url(UploadRequest::ROUTE, None)?)
            .header("Accept-Version", (self.get_code_version)())
            .multipart(form);
        let body = self.send(UploadRequest::ROUTE, builder).await?;
        parse_body(&body)
    }
}
