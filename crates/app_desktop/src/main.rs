mod surface;

use std::fs;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use backend_http::HttpKnowledgeBackend;
use config::{AppConfig, ConfigStore};
use core_orchestrator::{ControllerOptions, InteractionController};
use core_types::{
    Control, ControlState, DocumentListView, FileHandle, MessageView, NoticeKind, Sender,
};
use gpui::{
    App, Application, Bounds, Context, ExternalPaths, KeyDownEvent, MouseButton,
    PathPromptOptions, ScrollHandle, Window, WindowBounds, WindowOptions, div, point, prelude::*,
    px, rgb, size,
};
use i18n::I18n;
use surface::{DesktopSurface, ViewSnapshot};
use tokio::runtime::Runtime;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

struct KbChatApp {
    controller: Arc<InteractionController>,
    surface: Arc<DesktopSurface>,
    runtime: Arc<Runtime>,
    in_flight: Arc<AtomicUsize>,
    input: String,
    seen_input_generation: u64,
    seen_scroll_generation: u64,
    timeline_scroll: ScrollHandle,
}

impl KbChatApp {
    fn new(
        controller: Arc<InteractionController>,
        surface: Arc<DesktopSurface>,
        runtime: Arc<Runtime>,
        in_flight: Arc<AtomicUsize>,
    ) -> Self {
        Self {
            controller,
            surface,
            runtime,
            in_flight,
            input: String::new(),
            seen_input_generation: 0,
            seen_scroll_generation: 0,
            timeline_scroll: ScrollHandle::new(),
        }
    }

    fn i18n(&self) -> &I18n {
        self.controller.i18n()
    }

    fn spawn_flow<F, Fut>(&self, flow: F)
    where
        F: FnOnce(Arc<InteractionController>) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        spawn_tracked(
            &self.runtime,
            &self.in_flight,
            flow(self.controller.clone()),
        );
    }

    fn send_input(&mut self) {
        if self.controller.is_busy(Control::Send) {
            return;
        }
        let Some(text) = take_question(&mut self.input) else {
            return;
        };
        self.spawn_flow(move |controller| async move {
            controller.submit_message(&text).await;
        });
    }

    fn upload_selection(&mut self) {
        if self.controller.is_busy(Control::Upload) || self.controller.selection().is_empty() {
            return;
        }
        self.spawn_flow(|controller| async move {
            controller.upload_selection().await;
        });
    }

    fn choose_files(&mut self, cx: &mut Context<Self>) {
        let picked = cx.prompt_for_paths(PathPromptOptions {
            files: true,
            directories: false,
            multiple: true,
            prompt: None,
        });
        cx.spawn(async move |this, cx| match picked.await {
            Ok(Ok(Some(paths))) => {
                let _ = this.update(cx, |this, cx| {
                    this.select_paths(&paths);
                    cx.notify();
                });
            }
            Ok(Ok(None)) => debug!("file picker dismissed"),
            Ok(Err(err)) => warn!("file picker failed: {err:#}"),
            Err(_) => debug!("file picker closed without an answer"),
        })
        .detach();
    }

    /// Shared by the drop zone and the file picker.
    fn select_paths(&mut self, paths: &[PathBuf]) {
        let files = file_handles(paths);
        if files.is_empty() {
            self.controller
                .notify(self.i18n().t("upload.drop_hint"), NoticeKind::Info);
            return;
        }
        self.controller.select_files(files);
    }

    fn handle_key(&mut self, event: &KeyDownEvent) -> bool {
        let keystroke = &event.keystroke;
        match keystroke.key.as_str() {
            "enter" => {
                self.send_input();
                true
            }
            "backspace" => self.input.pop().is_some(),
            _ => {
                if keystroke.modifiers.control || keystroke.modifiers.platform {
                    return false;
                }
                match keystroke.key_char.as_deref() {
                    Some(text) => {
                        self.input.push_str(text);
                        true
                    }
                    None => false,
                }
            }
        }
    }

    /// Applies the one-shot requests the controller made since the last frame.
    fn apply_surface_requests(&mut self, view: &ViewSnapshot) {
        if view.input_generation != self.seen_input_generation {
            self.seen_input_generation = view.input_generation;
            self.input.clear();
        }
        if view.scroll_generation != self.seen_scroll_generation {
            self.seen_scroll_generation = view.scroll_generation;
            let max_offset = self.timeline_scroll.max_offset().height;
            let current_x = self.timeline_scroll.offset().x;
            self.timeline_scroll.set_offset(point(current_x, -max_offset));
        }
    }
}

impl Render for KbChatApp {
    fn render(&mut self, window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let view = self.surface.snapshot();
        self.apply_surface_requests(&view);
        if self.in_flight.load(Ordering::SeqCst) > 0 || !view.toasts.is_empty() {
            window.request_animation_frame();
        }

        let i18n = self.i18n().clone();

        let mut sidebar = div()
            .id("documents")
            .flex()
            .flex_col()
            .gap_2()
            .w(px(280.))
            .h_full()
            .p_3()
            .bg(rgb(0x1f2937))
            .overflow_y_scroll()
            .child(div().text_base().child(i18n.t("documents.title").to_string()))
            .child(
                div()
                    .id("drop-zone")
                    .p_3()
                    .rounded_md()
                    .border_1()
                    .border_color(rgb(0x475569))
                    .text_color(rgb(0x94a3b8))
                    .on_drop(cx.listener(|this, paths: &ExternalPaths, _window, cx| {
                        this.select_paths(paths.paths());
                        cx.notify();
                    }))
                    .child(i18n.t("upload.drop_hint").to_string()),
            )
            .child(
                control_button(&ControlState {
                    enabled: true,
                    label: i18n.t("upload.choose").to_string(),
                })
                .on_mouse_down(
                    MouseButton::Left,
                    cx.listener(|this, _event, _window, cx| {
                        this.choose_files(cx);
                    }),
                ),
            );
        for row in &view.selection {
            sidebar = sidebar.child(
                div()
                    .text_sm()
                    .text_color(rgb(0xcbd5e1))
                    .child(format!("{} ({})", row.name, row.size_label)),
            );
        }
        sidebar = sidebar
            .child(control_button(&view.upload).on_mouse_down(
                MouseButton::Left,
                cx.listener(|this, _event, _window, cx| {
                    this.upload_selection();
                    cx.notify();
                }),
            ))
            .child(document_list(view.documents.as_ref()));

        let mut timeline = div()
            .id("timeline")
            .track_scroll(&self.timeline_scroll)
            .flex()
            .flex_col()
            .flex_1()
            .gap_2()
            .p_3()
            .overflow_y_scroll();
        if let Some(welcome) = &view.welcome {
            timeline = timeline.child(
                div()
                    .p_4()
                    .rounded_md()
                    .bg(rgb(0x1e293b))
                    .child(div().text_xl().child(welcome.title.clone()))
                    .child(div().text_sm().child(welcome.body.clone())),
            );
        }
        for message in &view.messages {
            timeline = timeline.child(message_bubble(message, &i18n));
        }
        if view.typing {
            timeline = timeline.child(
                div()
                    .text_sm()
                    .text_color(rgb(0x94a3b8))
                    .child(i18n.t("chat.typing").to_string()),
            );
        }

        let input_text = if self.input.is_empty() {
            i18n.t("chat.placeholder").to_string()
        } else {
            self.input.clone()
        };
        let composer = div()
            .flex()
            .gap_2()
            .p_3()
            .border_t_1()
            .border_color(rgb(0x334155))
            .child(
                div()
                    .flex_1()
                    .p_2()
                    .rounded_md()
                    .bg(rgb(0x1e293b))
                    .text_color(if self.input.is_empty() {
                        rgb(0x64748b)
                    } else {
                        rgb(0xf1f5f9)
                    })
                    .child(input_text),
            )
            .child(control_button(&view.send).on_mouse_down(
                MouseButton::Left,
                cx.listener(|this, _event, _window, cx| {
                    this.send_input();
                    cx.notify();
                }),
            ))
            .child(
                div()
                    .px_3()
                    .py_1()
                    .rounded_md()
                    .bg(rgb(0x2d2d2d))
                    .on_mouse_down(
                        MouseButton::Left,
                        cx.listener(|this, _event, _window, cx| {
                            this.controller.clear_timeline();
                            cx.notify();
                        }),
                    )
                    .child(i18n.t("chat.clear").to_string()),
            );

        let mut toasts = div().flex().flex_col().gap_1().p_2();
        for toast in &view.toasts {
            toasts = toasts.child(
                div()
                    .px_3()
                    .py_2()
                    .rounded_md()
                    .bg(toast_color(toast.kind))
                    .text_color(rgb(0xffffff))
                    .child(toast.message.clone()),
            );
        }

        div()
            .size_full()
            .flex()
            .bg(rgb(0x0f172a))
            .text_color(rgb(0xe2e8f0))
            .text_sm()
            .tab_index(0)
            .on_key_down(cx.listener(|this, event: &KeyDownEvent, _window, cx| {
                if this.handle_key(event) {
                    cx.notify();
                }
            }))
            .child(sidebar)
            .child(
                div()
                    .flex()
                    .flex_col()
                    .flex_1()
                    .h_full()
                    .child(div().p_3().text_xl().child(i18n.t("app.title").to_string()))
                    .child(toasts)
                    .child(timeline)
                    .child(composer),
            )
    }
}

/// Empties the input line, returning its text unless it was blank. Taken before
/// the chat flow starts so a second Enter finds nothing to send.
fn take_question(input: &mut String) -> Option<String> {
    if input.trim().is_empty() {
        return None;
    }
    Some(std::mem::take(input))
}

fn file_handles(paths: &[PathBuf]) -> Vec<FileHandle> {
    paths
        .iter()
        .filter_map(|path| match FileHandle::from_path(path) {
            Ok(file) => Some(file),
            Err(err) => {
                warn!(path = %path.display(), "skipping selected path: {err:#}");
                None
            }
        })
        .collect()
}

fn control_button(state: &ControlState) -> gpui::Div {
    div()
        .px_3()
        .py_1()
        .rounded_md()
        .bg(if state.enabled {
            rgb(0x3355aa)
        } else {
            rgb(0x2d2d2d)
        })
        .text_color(if state.enabled {
            rgb(0xffffff)
        } else {
            rgb(0x9a9a9a)
        })
        .child(state.label.clone())
}

fn document_list(documents: Option<&DocumentListView>) -> gpui::Div {
    let mut list = div().flex().flex_col().gap_1();
    match documents {
        None => {}
        Some(DocumentListView::Empty { label }) => {
            list = list.child(div().text_color(rgb(0x94a3b8)).child(label.clone()));
        }
        Some(DocumentListView::Rows(rows)) => {
            for row in rows {
                list = list.child(
                    div()
                        .p_2()
                        .rounded_sm()
                        .bg(rgb(0x111827))
                        .child(row.filename.clone())
                        .child(
                            div()
                                .text_xs()
                                .text_color(rgb(0x94a3b8))
                                .child(format!("{} · {}", row.size_label, row.uploaded_label)),
                        ),
                );
            }
        }
    }
    list
}

fn message_bubble(message: &MessageView, i18n: &I18n) -> gpui::Div {
    let (who, background) = match message.sender {
        Sender::User => (i18n.t("chat.you"), rgb(0x1d4ed8)),
        Sender::Bot => (i18n.t("chat.assistant"), rgb(0x1e293b)),
    };
    let mut bubble = div()
        .p_3()
        .rounded_md()
        .bg(background)
        .child(
            div()
                .text_xs()
                .text_color(rgb(0xcbd5e1))
                .child(format!("{who} · {}", message.time_label)),
        )
        .child(message.body.clone());
    if let Some(sources) = &message.sources {
        let mut block = div()
            .mt_2()
            .text_xs()
            .text_color(rgb(0x94a3b8))
            .child(sources.label.clone());
        for item in &sources.items {
            block = block.child(format!("• {item}"));
        }
        bubble = bubble.child(block);
    }
    bubble
}

fn toast_color(kind: NoticeKind) -> gpui::Rgba {
    match kind {
        NoticeKind::Success => rgb(0x15803d),
        NoticeKind::Error => rgb(0xb91c1c),
        NoticeKind::Info => rgb(0x1d4ed8),
    }
}

fn spawn_tracked<Fut>(runtime: &Runtime, in_flight: &Arc<AtomicUsize>, future: Fut)
where
    Fut: Future<Output = ()> + Send + 'static,
{
    in_flight.fetch_add(1, Ordering::SeqCst);
    let in_flight = in_flight.clone();
    runtime.spawn(async move {
        future.await;
        in_flight.fetch_sub(1, Ordering::SeqCst);
    });
}

fn main() {
    let mut data_dir = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    data_dir.push("kbchat");
    if let Err(err) = fs::create_dir_all(&data_dir) {
        eprintln!("failed to prepare data dir: {err}");
    }
    let _log_guard = init_local_logger(&data_dir.join("logs"));

    let loaded = ConfigStore::from_default_location().and_then(|store| store.load_or_init());
    let config = match loaded {
        Ok(cfg) => cfg,
        Err(err) => {
            error!("failed to load config: {err:#}");
            AppConfig::default()
        }
    };

    let runtime = match Runtime::new() {
        Ok(rt) => Arc::new(rt),
        Err(err) => {
            eprintln!("failed to create tokio runtime: {err}");
            return;
        }
    };

    let backend = match HttpKnowledgeBackend::with_timeout(
        config.backend.base_url.clone(),
        config.backend.timeout(),
    ) {
        Ok(backend) => backend,
        Err(err) => {
            error!("failed to build backend client: {err:#}");
            return;
        }
    };
    info!(base_url = %backend.base_url(), "backend configured");

    let surface = Arc::new(DesktopSurface::new());
    let controller = Arc::new(
        InteractionController::new(
            Arc::new(backend),
            surface.clone(),
            I18n::new(config.language),
        )
        .with_options(ControllerOptions {
            toast_ttl: config.ui.toast_duration(),
        }),
    );

    let in_flight = Arc::new(AtomicUsize::new(0));
    {
        let controller = controller.clone();
        spawn_tracked(&runtime, &in_flight, async move {
            controller.start().await;
        });
    }

    let title = controller.i18n().t("app.title").to_string();
    Application::new().run(move |cx: &mut App| {
        let bounds = Bounds::centered(None, size(px(1100.0), px(760.0)), cx);
        cx.open_window(
            WindowOptions {
                window_bounds: Some(WindowBounds::Windowed(bounds)),
                titlebar: Some(gpui::TitlebarOptions {
                    title: Some(title.clone().into()),
                    ..Default::default()
                }),
                ..Default::default()
            },
            {
                let controller = controller.clone();
                let surface = surface.clone();
                let runtime = runtime.clone();
                let in_flight = in_flight.clone();
                move |_, cx| cx.new(|_| KbChatApp::new(controller, surface, runtime, in_flight))
            },
        )
        .expect("open main window");
        cx.activate(true);
    });
}

fn init_local_logger(log_dir: &Path) -> tracing_appender::non_blocking::WorkerGuard {
    if let Err(err) = fs::create_dir_all(log_dir) {
        eprintln!("failed to create log dir `{}`: {err}", log_dir.display());
    }
    let file_appender = tracing_appender::rolling::daily(log_dir, "kbchat.log");
    let (writer, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,app_desktop=debug,core_orchestrator=debug"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .json()
        .with_writer(writer)
        .init();

    guard
}
