use core_types::{ChatMessage, Control, ControllerError};
use tracing::{info, warn};

use crate::InteractionController;

impl InteractionController {
    /// Sends one question and renders the answer, or a fixed apology when the
    /// request fails. History is refreshed only after a successful exchange.
    pub async fn submit_message(&self, text: &str) {
        let question = text.trim();
        if question.is_empty() {
            return;
        }

        let _busy = self.acquire_busy(Control::Send);

        self.append_message(&ChatMessage::user(question));
        self.surface.clear_input();
        self.show_typing();

        match self.backend.chat(question).await {
            Ok(reply) => {
                self.hide_typing();
                let source_count = reply.sources.as_ref().map_or(0, Vec::len);
                self.append_message(&ChatMessage::bot(reply.answer, reply.sources));
                info!(sources = source_count, "chat reply rendered");
                self.refresh_history().await;
            }
            Err(err) => {
                let error = ControllerError::ChatRequestFailed {
                    detail: format!("{err:#}"),
                };
                warn!(%error, "chat exchange absorbed");
                self.hide_typing();
                self.append_message(&ChatMessage::bot(self.i18n.t("chat.apology"), None));
            }
        }
    }
}
