use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use core_types::{
    ChatHistory, ChatReply, Control, ControlState, DocumentListView, DocumentSummary, FileHandle,
    KnowledgeBackend, MessageView, NoticeKind, RenderSurface, SelectionRow, Sender, SourceRef,
    Toast, UploadReceipt, WelcomeBanner,
};
use parking_lot::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    AppendMessage(Sender, String),
    ShowTyping,
    RemoveTyping,
    RemoveWelcome,
    ResetTimeline,
    ScrollToEnd,
    RenderDocuments,
    RenderSelection(usize),
    SetControl(Control, bool),
    ClearInput,
    Toast(NoticeKind, String),
}

#[derive(Debug)]
struct SurfaceState {
    events: Vec<Event>,
    messages: Vec<MessageView>,
    typing: usize,
    welcome: bool,
    documents: Option<DocumentListView>,
    selection: Vec<SelectionRow>,
    controls: HashMap<Control, ControlState>,
    toasts: Vec<Toast>,
    violations: Vec<String>,
}

/// Records every surface call and checks the timeline invariants as it goes.
#[derive(Debug)]
pub struct RecordingSurface {
    state: Mutex<SurfaceState>,
}

impl Default for RecordingSurface {
    fn default() -> Self {
        Self {
            state: Mutex::new(SurfaceState {
                events: Vec::new(),
                messages: Vec::new(),
                typing: 0,
                welcome: true,
                documents: None,
                selection: Vec::new(),
                controls: HashMap::new(),
                toasts: Vec::new(),
                violations: Vec::new(),
            }),
        }
    }
}

impl RecordingSurface {
    pub fn events(&self) -> Vec<Event> {
        self.state.lock().events.clone()
    }

    pub fn messages(&self) -> Vec<MessageView> {
        self.state.lock().messages.clone()
    }

    pub fn typing_visible(&self) -> bool {
        self.state.lock().typing > 0
    }

    pub fn welcome_visible(&self) -> bool {
        self.state.lock().welcome
    }

    pub fn documents(&self) -> Option<DocumentListView> {
        self.state.lock().documents.clone()
    }

    pub fn selection(&self) -> Vec<SelectionRow> {
        self.state.lock().selection.clone()
    }

    pub fn control(&self, control: Control) -> Option<ControlState> {
        self.state.lock().controls.get(&control).cloned()
    }

    pub fn toasts(&self) -> Vec<Toast> {
        self.state.lock().toasts.clone()
    }

    pub fn violations(&self) -> Vec<String> {
        self.state.lock().violations.clone()
    }
}

impl RenderSurface for RecordingSurface {
    fn append_message(&self, message: &MessageView) {
        let mut state = self.state.lock();
        if message.sender == Sender::Bot && state.typing > 0 {
            state
                .violations
                .push(format!("reply `{}` appended while typing", message.body));
        }
        state
            .events
            .push(Event::AppendMessage(message.sender, message.body.clone()));
        state.messages.push(message.clone());
    }

    fn show_typing(&self) {
        let mut state = self.state.lock();
        state.typing += 1;
        if state.typing > 1 {
            state.violations.push("second typing indicator".to_string());
        }
        state.events.push(Event::ShowTyping);
    }

    fn remove_typing(&self) {
        let mut state = self.state.lock();
        if state.typing == 0 {
            state
                .violations
                .push("removed a typing indicator that is not shown".to_string());
        }
        state.typing = state.typing.saturating_sub(1);
        state.events.push(Event::RemoveTyping);
    }

    fn remove_welcome(&self) {
        let mut state = self.state.lock();
        if !state.welcome {
            state
                .violations
                .push("welcome removed while hidden".to_string());
        }
        state.welcome = false;
        state.events.push(Event::RemoveWelcome);
    }

    fn reset_timeline(&self, _welcome: &WelcomeBanner) {
        let mut state = self.state.lock();
        state.messages.clear();
        state.typing = 0;
        state.welcome = true;
        state.events.push(Event::ResetTimeline);
    }

    fn scroll_to_end(&self) {
        self.state.lock().events.push(Event::ScrollToEnd);
    }

    fn render_documents(&self, documents: &DocumentListView) {
        let mut state = self.state.lock();
        state.documents = Some(documents.clone());
        state.events.push(Event::RenderDocuments);
    }

    fn render_selection(&self, files: &[SelectionRow]) {
        let mut state = self.state.lock();
        state.selection = files.to_vec();
        state.events.push(Event::RenderSelection(files.len()));
    }

    fn set_control(&self, control: Control, control_state: &ControlState) {
        let mut state = self.state.lock();
        state.controls.insert(control, control_state.clone());
        state
            .events
            .push(Event::SetControl(control, control_state.enabled));
    }

    fn clear_input(&self) {
        self.state.lock().events.push(Event::ClearInput);
    }

    fn show_toast(&self, toast: &Toast) {
        let mut state = self.state.lock();
        state
            .events
            .push(Event::Toast(toast.kind, toast.message.clone()));
        state.toasts.push(toast.clone());
    }
}

/// What the scripted backend saw of the surface while a request was in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Probe {
    pub typing_visible: bool,
    pub send_enabled: Option<bool>,
    pub upload_enabled: Option<bool>,
    pub upload_label: Option<String>,
}

type Script<T> = Mutex<VecDeque<std::result::Result<T, String>>>;

/// Backend double driven by queued outcomes. The last queued outcome of each
/// endpoint repeats once the queue is down to one entry.
pub struct ScriptedBackend {
    calls: Arc<Mutex<Vec<String>>>,
    probes: Arc<Mutex<Vec<Probe>>>,
    surface: Option<Arc<RecordingSurface>>,
    failing_uploads: HashSet<String>,
    chat: Script<ChatReply>,
    documents: Script<Vec<DocumentSummary>>,
    history: Script<ChatHistory>,
}

impl Default for ScriptedBackend {
    fn default() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            probes: Arc::new(Mutex::new(Vec::new())),
            surface: None,
            failing_uploads: HashSet::new(),
            chat: Mutex::new(VecDeque::new()),
            documents: Mutex::new(VecDeque::new()),
            history: Mutex::new(VecDeque::from([Ok(ChatHistory::default())])),
        }
    }
}

impl ScriptedBackend {
    pub fn calls(&self) -> Arc<Mutex<Vec<String>>> {
        self.calls.clone()
    }

    pub fn probes(&self) -> Arc<Mutex<Vec<Probe>>> {
        self.probes.clone()
    }

    pub fn observing(mut self, surface: Arc<RecordingSurface>) -> Self {
        self.surface = Some(surface);
        self
    }

    pub fn failing_upload(mut self, filename: &str) -> Self {
        self.failing_uploads.insert(filename.to_string());
        self
    }

    pub fn with_chat_reply(self, answer: &str, sources: Option<Vec<SourceRef>>) -> Self {
        self.chat.lock().push_back(Ok(ChatReply {
            answer: answer.to_string(),
            sources,
            question: None,
        }));
        self
    }

    pub fn with_chat_failure(self, detail: &str) -> Self {
        self.chat.lock().push_back(Err(detail.to_string()));
        self
    }

    pub fn with_documents(self, documents: Vec<DocumentSummary>) -> Self {
        self.documents.lock().push_back(Ok(documents));
        self
    }

    pub fn with_documents_failure(self, detail: &str) -> Self {
        self.documents.lock().push_back(Err(detail.to_string()));
        self
    }

    pub fn with_history_failure(self, detail: &str) -> Self {
        {
            let mut history = self.history.lock();
            history.clear();
            history.push_back(Err(detail.to_string()));
        }
        self
    }

    fn record(&self, call: String) {
        self.calls.lock().push(call);
        if let Some(surface) = &self.surface {
            let upload = surface.control(Control::Upload);
            self.probes.lock().push(Probe {
                typing_visible: surface.typing_visible(),
                send_enabled: surface.control(Control::Send).map(|state| state.enabled),
                upload_enabled: upload.as_ref().map(|state| state.enabled),
                upload_label: upload.map(|state| state.label),
            });
        }
    }
}

fn next<T: Clone>(script: &Script<T>, endpoint: &str) -> Result<T> {
    let mut queue = script.lock();
    let outcome = if queue.len() > 1 {
        queue.pop_front()
    } else {
        queue.front().cloned()
    };
    match outcome {
        Some(Ok(value)) => Ok(value),
        Some(Err(detail)) => Err(anyhow!("{endpoint} failed: {detail}")),
        None => Err(anyhow!("{endpoint} not scripted")),
    }
}

#[async_trait]
impl KnowledgeBackend for ScriptedBackend {
    async fn upload(&self, file: &FileHandle) -> Result<UploadReceipt> {
        self.record(format!("upload:{}", file.name));
        tokio::task::yield_now().await;
        if self.failing_uploads.contains(&file.name) {
            return Err(anyhow!("upload request failed: 500 Internal Server Error"));
        }
        Ok(UploadReceipt::default())
    }

    async fn chat(&self, question: &str) -> Result<ChatReply> {
        self.record(format!("chat:{question}"));
        tokio::task::yield_now().await;
        next(&self.chat, "/chat")
    }

    async fn documents(&self) -> Result<Vec<DocumentSummary>> {
        self.record("documents".to_string());
        next(&self.documents, "/documents")
    }

    async fn chat_history(&self) -> Result<ChatHistory> {
        self.record("history".to_string());
        next(&self.history, "/chat-history")
    }
}

pub fn document(filename: &str, file_size: u64, upload_date: &str) -> DocumentSummary {
    DocumentSummary {
        filename: filename.to_string(),
        file_size,
        upload_date: upload_date.to_string(),
        id: None,
        content_type: None,
        processed: None,
    }
}
