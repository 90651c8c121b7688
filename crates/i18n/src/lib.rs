use std::collections::BTreeMap;

use core_types::UiLanguage;

#[derive(Debug, Clone)]
pub struct I18n {
    lang: UiLanguage,
    zh_cn: BTreeMap<&'static str, &'static str>,
    en_us: BTreeMap<&'static str, &'static str>,
}

impl I18n {
    pub fn new(lang: UiLanguage) -> Self {
        Self {
            lang,
            zh_cn: zh_cn_map(),
            en_us: en_us_map(),
        }
    }

    pub fn t<'a>(&'a self, key: &'a str) -> &'a str {
        match self.lang {
            UiLanguage::ZhCn => self
                .zh_cn
                .get(key)
                .copied()
                .or_else(|| self.en_us.get(key).copied())
                .unwrap_or(key),
            UiLanguage::EnUs => self
                .en_us
                .get(key)
                .copied()
                .or_else(|| self.zh_cn.get(key).copied())
                .unwrap_or(key),
        }
    }

    /// Looks up `key` and replaces each `{name}` placeholder with its value.
    pub fn format(&self, key: &str, args: &[(&str, &str)]) -> String {
        let mut text = self.t(key).to_string();
        for (name, value) in args {
            text = text.replace(&format!("{{{name}}}"), value);
        }
        text
    }
}

fn zh_cn_map() -> BTreeMap<&'static str, &'static str> {
    BTreeMap::from([
        ("app.title", "知识库问答"),
        ("welcome.title", "欢迎使用知识库问答"),
        ("welcome.body", "先在左侧上传文档，然后就文档内容提问。"),
        ("chat.placeholder", "输入关于文档的问题，回车发送"),
        ("chat.send", "发送"),
        ("chat.sending", "发送中..."),
        ("chat.typing", "正在思考..."),
        ("chat.clear", "清空会话"),
        ("chat.you", "你"),
        ("chat.assistant", "助手"),
        (
            "chat.apology",
            "抱歉，处理你的问题时出现错误，请稍后重试。",
        ),
        ("chat.sources", "来源："),
        ("chat.source_unknown", "未知文档"),
        ("upload.button", "上传文件"),
        ("upload.choose", "选择文件"),
        ("upload.busy", "上传中..."),
        ("upload.drop_hint", "将文件拖放到此处"),
        ("upload.succeeded", "已成功上传 {count} 个文件"),
        ("upload.failed", "上传 {file} 失败：{detail}"),
        ("documents.title", "文档"),
        ("documents.empty", "尚未上传任何文档"),
    ])
}

fn en_us_map() -> BTreeMap<&'static str, &'static str> {
    BTreeMap::from([
        ("app.title", "Knowledge Base Chat"),
        ("welcome.title", "Welcome to Knowledge Base Chat"),
        (
            "welcome.body",
            "Upload documents on the left, then ask questions about them.",
        ),
        ("chat.placeholder", "Ask a question about your documents, Enter to send"),
        ("chat.send", "Send"),
        ("chat.sending", "Sending..."),
        ("chat.typing", "Assistant is typing..."),
        ("chat.clear", "Clear chat"),
        ("chat.you", "You"),
        ("chat.assistant", "Assistant"),
        (
            "chat.apology",
            "Sorry, I encountered an error while processing your question. Please try again.",
        ),
        ("chat.sources", "Sources:"),
        ("chat.source_unknown", "Unknown document"),
        ("upload.button", "Upload Files"),
        ("upload.choose", "Choose Files"),
        ("upload.busy", "Uploading..."),
        ("upload.drop_hint", "Drop files here"),
        ("upload.succeeded", "Uploaded {count} file(s) successfully"),
        ("upload.failed", "Failed to upload {file}: {detail}"),
        ("documents.title", "Documents"),
        ("documents.empty", "No documents uploaded yet"),
    ])
}
