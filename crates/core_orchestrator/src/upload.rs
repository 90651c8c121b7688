use core_types::{Control, ControllerError, FileHandle, NoticeKind};
use tracing::{debug, info, warn};

use crate::{InteractionController, render};

impl InteractionController {
    /// Replaces the pending selection (file picker change or drop).
    pub fn select_files(&self, files: Vec<FileHandle>) {
        let rows = render::render_selection(&files);
        self.state.lock().selection = files;
        self.surface.render_selection(&rows);
        self.sync_control(Control::Upload);
    }

    pub fn selection(&self) -> Vec<FileHandle> {
        self.state.lock().selection.clone()
    }

    pub async fn upload_selection(&self) {
        let files = self.selection();
        self.submit_upload(files).await;
    }

    /// Uploads `files` one request at a time, in order, stopping at the first
    /// failure. Only a fully successful batch clears the selection and
    /// refreshes the document list.
    pub async fn submit_upload(&self, files: Vec<FileHandle>) {
        if files.is_empty() {
            return;
        }

        let _busy = self.acquire_busy(Control::Upload);

        if let Err(error) = self.upload_sequentially(&files).await {
            warn!(%error, "upload batch aborted");
            if let ControllerError::UploadFailed { filename, detail } = &error {
                self.notify(
                    self.i18n.format(
                        "upload.failed",
                        &[("file", filename.as_str()), ("detail", detail.as_str())],
                    ),
                    NoticeKind::Error,
                );
            }
            return;
        }

        info!(count = files.len(), "upload batch complete");
        let count = files.len().to_string();
        self.notify(
            self.i18n.format("upload.succeeded", &[("count", count.as_str())]),
            NoticeKind::Success,
        );
        self.clear_selection();
        self.refresh_documents().await;
    }

    async fn upload_sequentially(&self, files: &[FileHandle]) -> Result<(), ControllerError> {
        for file in files {
            debug!(filename = %file.name, size = file.size_bytes, "uploading file");
            self.backend
                .upload(file)
                .await
                .map_err(|err| ControllerError::UploadFailed {
                    filename: file.name.clone(),
                    detail: format!("{err:#}"),
                })?;
        }
        Ok(())
    }

    fn clear_selection(&self) {
        self.state.lock().selection.clear();
        self.surface.render_selection(&[]);
        self.sync_control(Control::Upload);
    }
}
