use std::time::Duration;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use core_types::{
    ChatHistory, ChatReply, DocumentList, DocumentSummary, FileHandle, KnowledgeBackend,
    UploadReceipt,
};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

/// `KnowledgeBackend` over the backend's HTTP endpoints.
pub struct HttpKnowledgeBackend {
    client: Client,
    base_url: String,
}

impl HttpKnowledgeBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build http client")?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self
            .client
            .get(self.endpoint(path))
            .send()
            .await
            .with_context(|| format!("failed to request {path}"))?;
        let response = ensure_success(path, response).await?;
        response
            .json()
            .await
            .with_context(|| format!("invalid {path} response json"))
    }
}

#[async_trait]
impl KnowledgeBackend for HttpKnowledgeBackend {
    async fn upload(&self, file: &FileHandle) -> Result<UploadReceipt> {
        let bytes = tokio::fs::read(&file.path)
            .await
            .with_context(|| format!("failed to read {}", file.path.display()))?;
        let form = Form::new().part("file", Part::bytes(bytes).file_name(file.name.clone()));

        let response = self
            .client
            .post(self.endpoint("/upload"))
            .multipart(form)
            .send()
            .await
            .context("failed to request /upload")?;
        let response = ensure_success("/upload", response).await?;

        let text = response.text().await.unwrap_or_default();
        let receipt = serde_json::from_str::<UploadReceipt>(&text).unwrap_or_else(|err| {
            debug!(filename = %file.name, %err, "upload response is not a receipt");
            UploadReceipt::default()
        });
        Ok(receipt)
    }

    async fn chat(&self, question: &str) -> Result<ChatReply> {
        let response = self
            .client
            .post(self.endpoint("/chat"))
            .query(&[("question", question)])
            .send()
            .await
            .context("failed to request /chat")?;
        let response = ensure_success("/chat", response).await?;
        response.json().await.context("invalid /chat response json")
    }

    async fn documents(&self) -> Result<Vec<DocumentSummary>> {
        let list: DocumentList = self.get_json("/documents").await?;
        Ok(list.documents)
    }

    async fn chat_history(&self) -> Result<ChatHistory> {
        self.get_json("/chat-history").await
    }
}

async fn ensure_success(path: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        bail!("{path} request failed: {status} {text}");
    }
    Ok(response)
}
