use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub type MessageId = Uuid;
pub type ToastId = Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum UiLanguage {
    ZhCn,
    EnUs,
}

/// A file chosen for upload. Contents are read from `path` only when the
/// upload request is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHandle {
    pub name: String,
    pub size_bytes: u64,
    pub path: PathBuf,
}

impl FileHandle {
    pub fn new(name: impl Into<String>, size_bytes: u64, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            size_bytes,
            path: path.into(),
        }
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let metadata = std::fs::metadata(path)
            .with_context(|| format!("failed to read file metadata {}", path.display()))?;
        if !metadata.is_file() {
            bail!("not a regular file: {}", path.display());
        }
        let name = path
            .file_name()
            .map(|value| value.to_string_lossy().to_string())
            .ok_or_else(|| anyhow!("invalid file path: {}", path.display()))?;
        Ok(Self::new(name, metadata.len(), path))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    User,
    Bot,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Eq, PartialEq)]
pub struct SourceRef {
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_index: Option<u32>,
}

impl SourceRef {
    pub fn named(filename: impl Into<String>) -> Self {
        Self {
            filename: Some(filename.into()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: MessageId,
    pub content: String,
    pub sender: Sender,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<SourceRef>>,
    pub timestamp: DateTime<Local>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: MessageId::new_v4(),
            content: content.into(),
            sender: Sender::User,
            sources: None,
            timestamp: Local::now(),
        }
    }

    pub fn bot(content: impl Into<String>, sources: Option<Vec<SourceRef>>) -> Self {
        Self {
            id: MessageId::new_v4(),
            content: content.into(),
            sender: Sender::Bot,
            sources,
            timestamp: Local::now(),
        }
    }
}

/// Body of a successful `POST /chat`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatReply {
    pub answer: String,
    #[serde(default)]
    pub sources: Option<Vec<SourceRef>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UploadReceipt {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub file_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct DocumentSummary {
    pub filename: String,
    pub file_size: u64,
    pub upload_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentList {
    pub documents: Vec<DocumentSummary>,
}

/// `GET /chat-history` payload. Kept as raw JSON: observed, never rendered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatHistory(pub serde_json::Value);

impl ChatHistory {
    /// Entries under `chat_history`, or zero when that field is absent or not a list.
    pub fn entry_count(&self) -> usize {
        self.0
            .get("chat_history")
            .and_then(serde_json::Value::as_array)
            .map_or(0, Vec::len)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub id: ToastId,
    pub message: String,
    pub kind: NoticeKind,
    pub ttl: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcesBlock {
    pub label: String,
    pub items: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageView {
    pub id: MessageId,
    pub sender: Sender,
    pub body: String,
    pub sources: Option<SourcesBlock>,
    pub time_label: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WelcomeBanner {
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRow {
    pub filename: String,
    pub size_label: String,
    pub uploaded_label: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentListView {
    Empty { label: String },
    Rows(Vec<DocumentRow>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionRow {
    pub name: String,
    pub size_label: String,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Control {
    Upload,
    Send,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlState {
    pub enabled: bool,
    pub label: String,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum SyncEndpoint {
    Documents,
    History,
}

impl fmt::Display for SyncEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncEndpoint::Documents => f.write_str("/documents"),
            SyncEndpoint::History => f.write_str("/chat-history"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("upload of `{filename}` failed: {detail}")]
    UploadFailed { filename: String, detail: String },

    #[error("chat request failed: {detail}")]
    ChatRequestFailed { detail: String },

    #[error("sync of {endpoint} failed: {detail}")]
    SyncFailed {
        endpoint: SyncEndpoint,
        detail: String,
    },
}

#[async_trait]
pub trait KnowledgeBackend: Send + Sync {
    async fn upload(&self, file: &FileHandle) -> Result<UploadReceipt>;
    async fn chat(&self, question: &str) -> Result<ChatReply>;
    async fn documents(&self) -> Result<Vec<DocumentSummary>>;
    async fn chat_history(&self) -> Result<ChatHistory>;
}

/// Everything the controller is allowed to do to the visible page.
///
/// Implementations own their view state and mutate it through `&self`; the
/// controller never holds its own locks while calling into a surface.
pub trait RenderSurface: Send + Sync {
    fn append_message(&self, message: &MessageView);
    fn show_typing(&self);
    fn remove_typing(&self);
    fn remove_welcome(&self);
    fn reset_timeline(&self, welcome: &WelcomeBanner);
    fn scroll_to_end(&self);
    fn render_documents(&self, documents: &DocumentListView);
    fn render_selection(&self, files: &[SelectionRow]);
    fn set_control(&self, control: Control, state: &ControlState);
    fn clear_input(&self);
    fn show_toast(&self, toast: &Toast);
}
