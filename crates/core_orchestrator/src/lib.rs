//! Interaction controller for the knowledge-base chat client.
//!
//! The controller owns the session-scoped state (busy flags, pending file
//! selection, welcome/typing markers) and drives a [`KnowledgeBackend`]
//! against a [`RenderSurface`]. Every flow absorbs its own failures; nothing
//! here returns an error to the caller.

mod busy;
mod chat;
pub mod render;
mod sync;
mod upload;

#[cfg(test)]
mod testing;

use std::sync::Arc;
use std::time::Duration;

use core_types::{
    ChatMessage, Control, ControlState, KnowledgeBackend, NoticeKind, RenderSurface, Sender,
    Toast, ToastId,
};
use i18n::I18n;
use parking_lot::Mutex;
use tracing::debug;

use crate::busy::{BusyFlag, BusyGuard};

pub use render::{format_byte_size, format_timestamp, format_upload_date};

#[derive(Debug, Clone)]
pub struct ControllerOptions {
    pub toast_ttl: Duration,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            toast_ttl: Duration::from_millis(3000),
        }
    }
}

#[derive(Debug)]
struct SessionState {
    selection: Vec<core_types::FileHandle>,
    welcome_visible: bool,
    typing_visible: bool,
}

pub struct InteractionController {
    backend: Arc<dyn KnowledgeBackend>,
    surface: Arc<dyn RenderSurface>,
    i18n: I18n,
    options: ControllerOptions,
    upload_busy: BusyFlag,
    send_busy: BusyFlag,
    state: Mutex<SessionState>,
}

impl InteractionController {
    pub fn new(
        backend: Arc<dyn KnowledgeBackend>,
        surface: Arc<dyn RenderSurface>,
        i18n: I18n,
    ) -> Self {
        Self {
            backend,
            surface,
            i18n,
            options: ControllerOptions::default(),
            upload_busy: BusyFlag::default(),
            send_busy: BusyFlag::default(),
            state: Mutex::new(SessionState {
                selection: Vec::new(),
                welcome_visible: true,
                typing_visible: false,
            }),
        }
    }

    pub fn with_options(mut self, options: ControllerOptions) -> Self {
        self.options = options;
        self
    }

    pub fn i18n(&self) -> &I18n {
        &self.i18n
    }

    /// Paints the initial page and loads both lists once.
    pub async fn start(&self) {
        self.surface.reset_timeline(&render::welcome_banner(&self.i18n));
        self.surface.render_selection(&[]);
        self.sync_control(Control::Upload);
        self.sync_control(Control::Send);
        futures::join!(self.refresh_documents(), self.refresh_history());
    }

    pub fn is_busy(&self, control: Control) -> bool {
        self.busy_flag(control).is_set()
    }

    pub fn notify(&self, message: impl Into<String>, kind: NoticeKind) -> ToastId {
        let toast = Toast {
            id: ToastId::new_v4(),
            message: message.into(),
            kind,
            ttl: self.options.toast_ttl,
        };
        debug!(?kind, message = %toast.message, "notification");
        self.surface.show_toast(&toast);
        toast.id
    }

    /// Puts the welcome banner back. Backend history is left untouched.
    pub fn clear_timeline(&self) {
        {
            let mut state = self.state.lock();
            state.welcome_visible = true;
            state.typing_visible = false;
        }
        self.surface.reset_timeline(&render::welcome_banner(&self.i18n));
    }

    fn append_message(&self, message: &ChatMessage) {
        let remove_welcome = message.sender == Sender::User && {
            let mut state = self.state.lock();
            std::mem::replace(&mut state.welcome_visible, false)
        };
        if remove_welcome {
            self.surface.remove_welcome();
        }
        self.surface
            .append_message(&render::render_message(message, &self.i18n));
        self.surface.scroll_to_end();
    }

    fn show_typing(&self) {
        let already_visible = std::mem::replace(&mut self.state.lock().typing_visible, true);
        if !already_visible {
            self.surface.show_typing();
            self.surface.scroll_to_end();
        }
    }

    fn hide_typing(&self) {
        let was_visible = std::mem::replace(&mut self.state.lock().typing_visible, false);
        if was_visible {
            self.surface.remove_typing();
        }
    }

    fn acquire_busy(&self, control: Control) -> BusyGuard<'_> {
        BusyGuard::acquire(self, control)
    }

    pub(crate) fn busy_flag(&self, control: Control) -> &BusyFlag {
        match control {
            Control::Upload => &self.upload_busy,
            Control::Send => &self.send_busy,
        }
    }

    pub(crate) fn sync_control(&self, control: Control) {
        let busy = self.busy_flag(control).is_set();
        let state = match control {
            Control::Upload => {
                let has_selection = !self.state.lock().selection.is_empty();
                ControlState {
                    enabled: !busy && has_selection,
                    label: self
                        .i18n
                        .t(if busy { "upload.busy" } else { "upload.button" })
                        .to_string(),
                }
            }
            Control::Send => ControlState {
                enabled: !busy,
                label: self
                    .i18n
                    .t(if busy { "chat.sending" } else { "chat.send" })
                    .to_string(),
            },
        };
        self.surface.set_control(control, &state);
    }
}
