//! Pure projections from domain values to what a [`RenderSurface`] shows.
//!
//! [`RenderSurface`]: core_types::RenderSurface

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use core_types::{
    ChatMessage, DocumentListView, DocumentRow, DocumentSummary, FileHandle, MessageView,
    SelectionRow, SourceRef, SourcesBlock, WelcomeBanner,
};
use i18n::I18n;

const SIZE_UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

/// Base-1024 size label with at most two decimals, trailing zeros dropped.
pub fn format_byte_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rounded = (value * 100.0).round() / 100.0;
    format!("{rounded} {}", SIZE_UNITS[unit])
}

pub fn format_timestamp(timestamp: &DateTime<Local>) -> String {
    timestamp.format("%H:%M").to_string()
}

/// Renders an ISO-8601 upload date as `YYYY-MM-DD`, or returns it verbatim
/// when it cannot be parsed.
pub fn format_upload_date(raw: &str) -> String {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return parsed.with_timezone(&Local).format("%Y-%m-%d").to_string();
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return parsed.format("%Y-%m-%d").to_string();
    }
    if let Ok(parsed) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return parsed.format("%Y-%m-%d").to_string();
    }
    raw.to_string()
}

pub fn render_sources(sources: &[SourceRef], i18n: &I18n) -> Option<SourcesBlock> {
    if sources.is_empty() {
        return None;
    }

    let items = sources
        .iter()
        .map(|source| match source.filename.as_deref() {
            Some(name) if !name.trim().is_empty() => name.to_string(),
            _ => i18n.t("chat.source_unknown").to_string(),
        })
        .collect();
    Some(SourcesBlock {
        label: i18n.t("chat.sources").to_string(),
        items,
    })
}

pub fn render_message(message: &ChatMessage, i18n: &I18n) -> MessageView {
    MessageView {
        id: message.id,
        sender: message.sender,
        body: message.content.clone(),
        sources: message
            .sources
            .as_deref()
            .and_then(|sources| render_sources(sources, i18n)),
        time_label: format_timestamp(&message.timestamp),
    }
}

pub fn render_documents(documents: &[DocumentSummary], i18n: &I18n) -> DocumentListView {
    if documents.is_empty() {
        return DocumentListView::Empty {
            label: i18n.t("documents.empty").to_string(),
        };
    }

    DocumentListView::Rows(
        documents
            .iter()
            .map(|doc| DocumentRow {
                filename: doc.filename.clone(),
                size_label: format_byte_size(doc.file_size),
                uploaded_label: format_upload_date(&doc.upload_date),
            })
            .collect(),
    )
}

pub fn render_selection(files: &[FileHandle]) -> Vec<SelectionRow> {
    files
        .iter()
        .map(|file| SelectionRow {
            name: file.name.clone(),
            size_label: format_byte_size(file.size_bytes),
        })
        .collect()
}

pub fn welcome_banner(i18n: &I18n) -> WelcomeBanner {
    WelcomeBanner {
        title: i18n.t("welcome.title").to_string(),
        body: i18n.t("welcome.body").to_string(),
    }
}
