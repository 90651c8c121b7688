use core_types::{ControllerError, SyncEndpoint};
use tracing::{debug, warn};

use crate::{InteractionController, render};

impl InteractionController {
    /// Replaces the document list with the backend's current one. On failure
    /// the previous list stays on screen.
    pub async fn refresh_documents(&self) {
        match self.backend.documents().await {
            Ok(documents) => {
                debug!(count = documents.len(), "documents refreshed");
                self.surface
                    .render_documents(&render::render_documents(&documents, &self.i18n));
            }
            Err(err) => self.sync_failed(SyncEndpoint::Documents, &err),
        }
    }

    pub async fn refresh_history(&self) {
        match self.backend.chat_history().await {
            Ok(history) => {
                debug!(entries = history.entry_count(), "chat history refreshed");
            }
            Err(err) => self.sync_failed(SyncEndpoint::History, &err),
        }
    }

    fn sync_failed(&self, endpoint: SyncEndpoint, err: &anyhow::Error) {
        let error = ControllerError::SyncFailed {
            endpoint,
            detail: format!("{err:#}"),
        };
        warn!(%error, "list sync skipped");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use core_types::{DocumentListView, DocumentRow, UiLanguage};
    use i18n::I18n;

    use crate::InteractionController;
    use crate::testing::{RecordingSurface, ScriptedBackend, document};

    fn build(backend: ScriptedBackend) -> (InteractionController, Arc<RecordingSurface>) {
        let surface = Arc::new(RecordingSurface::default());
        let controller = InteractionController::new(
            Arc::new(backend),
            surface.clone(),
            I18n::new(UiLanguage::EnUs),
        );
        (controller, surface)
    }

    #[tokio::test]
    async fn renders_documents_with_formatted_sizes() {
        let (controller, surface) = build(
            ScriptedBackend::default().with_documents(vec![document("a.pdf", 2048, "2024-01-01")]),
        );

        controller.refresh_documents().await;

        assert_eq!(
            surface.documents(),
            Some(DocumentListView::Rows(vec![DocumentRow {
                filename: "a.pdf".to_string(),
                size_label: "2 KB".to_string(),
                uploaded_label: "2024-01-01".to_string(),
            }]))
        );
    }

    #[tokio::test]
    async fn refresh_replaces_instead_of_merging() {
        let (controller, surface) = build(
            ScriptedBackend::default()
                .with_documents(vec![
                    document("old.txt", 10, "2024-01-01"),
                    document("keep.md", 20, "2024-01-02"),
                ])
                .with_documents(vec![document("keep.md", 20, "2024-01-02")]),
        );

        controller.refresh_documents().await;
        controller.refresh_documents().await;

        let Some(DocumentListView::Rows(rows)) = surface.documents() else {
            panic!("expected rows");
        };
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].filename, "keep.md");
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_list_and_stays_silent() {
        let (controller, surface) = build(
            ScriptedBackend::default()
                .with_documents(vec![document("a.pdf", 2048, "2024-01-01")])
                .with_documents_failure("503 Service Unavailable"),
        );

        controller.refresh_documents().await;
        let before = surface.documents();
        controller.refresh_documents().await;

        assert_eq!(surface.documents(), before);
        assert!(surface.toasts().is_empty());
    }

    #[tokio::test]
    async fn history_refresh_never_touches_the_surface() {
        let (controller, surface) =
            build(ScriptedBackend::default().with_history_failure("timeout"));

        controller.refresh_history().await;

        assert!(surface.events().is_empty());
    }
}
