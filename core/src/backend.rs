use crate::config::ClientConfig;
use crate::error::BackendError;
use crate::upload::UploadFile;
use async_trait::async_trait;
use neurodoc_protocol::SearchPayload;
use neurodoc_protocol::SearchRequest;
use reqwest::multipart::Form;
use reqwest::multipart::Part;
use url::Url;

/// The remote search service. Each call is a single attempt.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    async fn search(&self, request: &SearchRequest) -> Result<SearchPayload, BackendError>;

    async fn upload(&self, file: UploadFile) -> Result<(), BackendError>;
}

/// [`SearchBackend`] over HTTP. No request timeout is configured: a hung
/// request stays outstanding until the server answers or the session ends.
#[derive(Clone, Debug)]
pub struct HttpBackend {
    http: reqwest::Client,
    search_url: Url,
    upload_url: Url,
}

impl HttpBackend {
    pub fn new(config: &ClientConfig) -> Result<Self, BackendError> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            http,
            search_url: config.search_url()?,
            upload_url: config.upload_url()?,
        })
    }
}

#[async_trait]
impl SearchBackend for HttpBackend {
    async fn search(&self, request: &SearchRequest) -> Result<SearchPayload, BackendError> {
        let resp = self
            .http
            .get(self.search_url.clone())
            .query(&request.query_pairs())
            .send()
            .await?;
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(BackendError::Status {
                endpoint: "search",
                status,
                body,
            });
        }
        let body = resp.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn upload(&self, file: UploadFile) -> Result<(), BackendError> {
        let part = Part::bytes(file.contents)
            .file_name(file.name)
            .mime_str(&file.mime)?;
        let form = Form::new().part("file", part);
        let resp = self
            .http
            .post(self.upload_url.clone())
            .multipart(form)
            .send()
            .await?;
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(BackendError::Status {
                endpoint: "upload",
                status,
                body,
            });
        }
        Ok(())
    }
}
