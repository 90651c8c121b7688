use std::time::Instant;

use core_types::{
    Control, ControlState, DocumentListView, MessageView, RenderSurface, SelectionRow, Toast,
    WelcomeBanner,
};
use parking_lot::Mutex;

/// What the window paints on the next frame.
#[derive(Debug, Clone)]
pub struct ViewSnapshot {
    pub welcome: Option<WelcomeBanner>,
    pub messages: Vec<MessageView>,
    pub typing: bool,
    pub documents: Option<DocumentListView>,
    pub selection: Vec<SelectionRow>,
    pub upload: ControlState,
    pub send: ControlState,
    pub toasts: Vec<Toast>,
    pub input_generation: u64,
    pub scroll_generation: u64,
}

#[derive(Debug)]
struct ViewState {
    welcome: Option<WelcomeBanner>,
    messages: Vec<MessageView>,
    typing: bool,
    documents: Option<DocumentListView>,
    selection: Vec<SelectionRow>,
    upload: ControlState,
    send: ControlState,
    toasts: Vec<(Instant, Toast)>,
    input_generation: u64,
    scroll_generation: u64,
}

/// `RenderSurface` backed by plain view state that the gpui window reads.
#[derive(Debug)]
pub struct DesktopSurface {
    state: Mutex<ViewState>,
}

impl Default for DesktopSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl DesktopSurface {
    pub fn new() -> Self {
        let idle = ControlState {
            enabled: false,
            label: String::new(),
        };
        Self {
            state: Mutex::new(ViewState {
                welcome: None,
                messages: Vec::new(),
                typing: false,
                documents: None,
                selection: Vec::new(),
                upload: idle.clone(),
                send: idle,
                toasts: Vec::new(),
                input_generation: 0,
                scroll_generation: 0,
            }),
        }
    }

    /// Drops expired toasts, then copies out the current state.
    pub fn snapshot(&self) -> ViewSnapshot {
        self.snapshot_at(Instant::now())
    }

    fn snapshot_at(&self, now: Instant) -> ViewSnapshot {
        let mut state = self.state.lock();
        state
            .toasts
            .retain(|(shown_at, toast)| now.duration_since(*shown_at) < toast.ttl);
        ViewSnapshot {
            welcome: state.welcome.clone(),
            messages: state.messages.clone(),
            typing: state.typing,
            documents: state.documents.clone(),
            selection: state.selection.clone(),
            upload: state.upload.clone(),
            send: state.send.clone(),
            toasts: state.toasts.iter().map(|(_, toast)| toast.clone()).collect(),
            input_generation: state.input_generation,
            scroll_generation: state.scroll_generation,
        }
    }
}

impl RenderSurface for DesktopSurface {
    fn append_message(&self, message: &MessageView) {
        self.state.lock().messages.push(message.clone());
    }

    fn show_typing(&self) {
        self.state.lock().typing = true;
    }

    fn remove_typing(&self) {
        self.state.lock().typing = false;
    }

    fn remove_welcome(&self) {
        self.state.lock().welcome = None;
    }

    fn reset_timeline(&self, welcome: &WelcomeBanner) {
        let mut state = self.state.lock();
        state.messages.clear();
        state.typing = false;
        state.welcome = Some(welcome.clone());
    }

    fn scroll_to_end(&self) {
        self.state.lock().scroll_generation += 1;
    }

    fn render_documents(&self, documents: &DocumentListView) {
        self.state.lock().documents = Some(documents.clone());
    }

    fn render_selection(&self, files: &[SelectionRow]) {
        self.state.lock().selection = files.to_vec();
    }

    fn set_control(&self, control: Control, control_state: &ControlState) {
        let mut state = self.state.lock();
        match control {
            Control::Upload => state.upload = control_state.clone(),
            Control::Send => state.send = control_state.clone(),
        }
    }

    fn clear_input(&self) {
        self.state.lock().input_generation += 1;
    }

    fn show_toast(&self, toast: &Toast) {
        self.state.lock().toasts.push((Instant::now(), toast.clone()));
    }
}
