use crate::config::ImportConfig;
use crate::utils::error::Result;
use regex::Regex;
use reqwest::Client;
use scraper::{ElementRef, Html, Node, Selector};
use std::sync::OnceLock;
use std::time::Duration;
use url::Url;

/// 從網頁擷取出的題目；正確答案由使用者稍後選擇
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedQuiz {
    pub question: String,
    pub options: Vec<String>,
}

impl ImportedQuiz {
    fn new(question: impl Into<String>, options: Vec<String>) -> Option<Self> {
        let question = question.into().trim().to_string();
        let options: Vec<String> = options
            .into_iter()
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect();
        (!question.is_empty() && options.len() >= 2).then_some(Self { question, options })
    }
}

fn channel_post_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"t\.me/([^/\s]+/\d+)").expect("channel pattern is valid"))
}

fn option_marker_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9][\.\)]\s*").expect("marker pattern is valid"))
}

/// 頁面純文字的題目格式
fn text_patterns() -> &'static [Regex; 3] {
    static RE: OnceLock<[Regex; 3]> = OnceLock::new();
    RE.get_or_init(|| {
        [
            Regex::new(r"(?is)question:\s*([^?]+\??)\s*options:(.+)").expect("pattern is valid"),
            Regex::new(r"(?is)quiz:\s*([^?]+\??)\s*a\)(.*?)b\)(.*?)c\)(.*?)(?:d\)(.*?))?$")
                .expect("pattern is valid"),
            Regex::new(r"(?is)([^?]+\??)\s*a\.\s*(.*?)\s*b\.\s*(.*?)\s*c\.\s*(.*?)(?:\s*d\.\s*(.*?))?$")
                .expect("pattern is valid"),
        ]
    })
}

/// 整理使用者輸入的網址；無法辨識的 t.me 格式回傳 None
pub fn normalize_url(input: &str) -> Option<String> {
    let input = input.trim();
    if input.starts_with("http://") || input.starts_with("https://") {
        return Some(input.to_string());
    }
    if input.contains("t.me/") {
        return channel_post_regex()
            .captures(input)
            .map(|caps| format!("https://t.me/{}", &caps[1]));
    }
    Some(format!("https://{}", input))
}

/// `t.me/<channel>/<id>` 形式的網址
fn channel_post(url: &Url) -> Option<(String, String)> {
    let mut segments = url.path_segments()?.filter(|s| !s.is_empty());
    let channel = segments.next()?.to_string();
    let post = segments.next()?.to_string();
    if segments.next().is_some() || post.parse::<u64>().is_err() {
        return None;
    }
    Some((channel, post))
}

fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

fn element_text(element: ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// 依 `<br>` 拆行後的非空白行
fn element_lines(element: ElementRef) -> Vec<String> {
    let mut text = String::new();
    for node in element.descendants() {
        match node.value() {
            Node::Text(t) => text.push_str(t),
            Node::Element(e) if e.name() == "br" => text.push('\n'),
            _ => {}
        }
    }
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

/// 1. 頁面中的投票元件
pub fn parse_poll_widget(html: &str) -> Option<ImportedQuiz> {
    let document = Html::parse_document(html);
    let question = document
        .select(&selector(".tgme_widget_message_poll_question")?)
        .next()
        .map(element_text)?;
    let options: Vec<String> = document
        .select(&selector(".tgme_widget_message_poll_option_text")?)
        .map(element_text)
        .collect();
    ImportedQuiz::new(question, options)
}

/// 2. 嵌入檢視中的訊息文字：第一行為題目，其餘為選項
pub fn parse_embedded_message(html: &str) -> Option<ImportedQuiz> {
    let document = Html::parse_document(html);
    let message_selector = selector(".tgme_widget_message_text")?;

    if let Some(message) = document.select(&message_selector).next() {
        let lines = element_lines(message);
        if lines.len() >= 3 {
            let options = lines[1..]
                .iter()
                .map(|line| option_marker_regex().replace(line, "").to_string())
                .collect();
            if let Some(quiz) = ImportedQuiz::new(lines[0].clone(), options) {
                return Some(quiz);
            }
        }
    }

    let title = document
        .select(&selector(r#"meta[property="og:title"]"#)?)
        .next()
        .and_then(|meta| meta.value().attr("content"))
        .map(str::trim)
        .filter(|title| title.to_lowercase().contains("quiz"))?
        .to_string();
    let paragraphs: Vec<String> = document
        .select(&selector(".tgme_widget_message_text p")?)
        .map(element_text)
        .collect();
    ImportedQuiz::new(title, paragraphs)
}

/// 3. 頁面純文字中的常見題目格式
pub fn parse_text_patterns(html: &str) -> Option<ImportedQuiz> {
    let document = Html::parse_document(html);
    let text = document
        .root_element()
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ");

    for (i, pattern) in text_patterns().iter().enumerate() {
        let Some(caps) = pattern.captures(&text) else {
            continue;
        };
        let question = caps.get(1).map_or("", |m| m.as_str());
        let options: Vec<String> = if i == 0 {
            caps.get(2)
                .map_or("", |m| m.as_str())
                .split([',', ';', '\n'])
                .map(String::from)
                .collect()
        } else {
            (2..=5)
                .filter_map(|g| caps.get(g))
                .map(|m| m.as_str().to_string())
                .collect()
        };
        if let Some(quiz) = ImportedQuiz::new(question, options) {
            return Some(quiz);
        }
    }
    None
}

/// 從 Telegram 公開頁面擷取題目
#[derive(Debug, Clone)]
pub struct QuizImporter {
    client: Client,
    allowed_hosts: Vec<String>,
}

impl QuizImporter {
    pub fn new(config: &ImportConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            allowed_hosts: config.allowed_hosts.clone(),
        })
    }

    fn is_allowed(&self, url: &Url) -> bool {
        url.host_str()
            .map(|host| self.allowed_hosts.iter().any(|allowed| allowed == host))
            .unwrap_or(false)
    }

    async fn fetch(&self, url: &Url) -> Option<String> {
        let response = match self.client.get(url.clone()).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("⚠️ Failed to fetch {}: {}", url, e);
                return None;
            }
        };
        if !response.status().is_success() {
            tracing::warn!("⚠️ {} returned HTTP {}", url, response.status());
            return None;
        }
        match response.text().await {
            Ok(body) => Some(body),
            Err(e) => {
                tracing::warn!("⚠️ Failed to read body of {}: {}", url, e);
                None
            }
        }
    }

    pub async fn extract(&self, raw_url: &str) -> Option<ImportedQuiz> {
        let url = match Url::parse(raw_url) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("⚠️ Invalid import URL {}: {}", raw_url, e);
                return None;
            }
        };
        if !self.is_allowed(&url) {
            tracing::warn!("⚠️ Refusing to import from host {:?}", url.host_str());
            return None;
        }

        tracing::info!("🔍 Extracting quiz from {}", url);
        let page = self.fetch(&url).await;

        if let Some(quiz) = page.as_deref().and_then(parse_poll_widget) {
            tracing::info!("✅ Found poll widget with {} options", quiz.options.len());
            return Some(quiz);
        }

        if let Some((channel, post)) = channel_post(&url) {
            let mut embed = url.clone();
            embed.set_path(&format!("/{}/{}", channel, post));
            embed.set_query(Some("embed=1"));
            if let Some(quiz) = self.fetch(&embed).await.as_deref().and_then(parse_embedded_message) {
                tracing::info!("✅ Extracted quiz from embedded view with {} options", quiz.options.len());
                return Some(quiz);
            }
        }

        if let Some(quiz) = page.as_deref().and_then(parse_text_patterns) {
            tracing::info!("✅ Extracted quiz from page text");
            return Some(quiz);
        }

        tracing::warn!("❌ Failed to extract quiz from {}", url);
        None
    }
}
