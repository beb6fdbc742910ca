use async_trait::async_trait;
use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};
use once_cell::sync::Lazy;
use regex::bytes::Regex;
use reqwest::{header::CONTENT_TYPE, Client, StatusCode};
use scraper::{ElementRef, Html, Node};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::{
    config::FetchConfig,
    domain::{FetchedPage, Target},
};

const LINE_BREAK_TAGS: &[&str] = &[
    "br", "p", "div", "li", "h1", "h2", "h3", "h4", "h5", "h6",
];
const SKIPPED_TAGS: &[&str] = &["script", "style", "noscript", "template"];
/// Bytes scanned for a `<meta>` charset declaration.
const CHARSET_SNIFF_LIMIT: usize = 1024;

static META_CHARSET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i-u)<meta[^>]*?charset\s*=\s*["']?\s*([a-z0-9_:.\-]+)"#)
        .expect("valid meta charset regex")
});

/// Recoverable fetch failures. The monitor treats the target as unchanged
/// for the cycle and retries next time.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("target is not an http(s) url")]
    InvalidTarget,
    #[error("request failed: {0}")]
    Request(#[source] reqwest::Error),
    #[error("request timed out")]
    Timeout,
    #[error("server responded with {0}")]
    Status(StatusCode),
    #[error("failed to decode response body: {0}")]
    Body(#[source] reqwest::Error),
}

#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch(&self, target: &Target) -> Result<FetchedPage, FetchError>;
}

pub struct WebContentFetcher {
    client: Client,
    config: FetchConfig,
}

impl WebContentFetcher {
    pub fn new(client: Client, config: FetchConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl PageSource for WebContentFetcher {
    async fn fetch(&self, target: &Target) -> Result<FetchedPage, FetchError> {
        let url = match Url::parse(target.as_str()) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => url,
            _ => return Err(FetchError::InvalidTarget),
        };

        let response = self
            .client
            .get(url)
            .timeout(self.config.timeout)
            .header(reqwest::header::USER_AGENT, &self.config.user_agent)
            .send()
            .await
            .map_err(classify_request_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let declared = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .and_then(content_type_charset)
            .map(str::to_string);
        let bytes = response.bytes().await.map_err(|err| {
            if err.is_timeout() {
                FetchError::Timeout
            } else {
                FetchError::Body(err)
            }
        })?;
        let body = decode_body(&bytes, declared.as_deref());

        let content = extract_text(&body);
        let fingerprint = fingerprint(&content);
        debug!(
            target: "fetch",
            url = %target,
            fingerprint = %fingerprint,
            bytes = body.len(),
            "page fetched"
        );
        Ok(FetchedPage {
            fingerprint,
            content,
        })
    }
}

fn classify_request_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Request(err)
    }
}

fn content_type_charset(content_type: &str) -> Option<&str> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        name.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches('"'))
    })
}

/// Decodes a response body. The header charset wins, then a `<meta>`
/// declaration near the top of the document. Undeclared bodies are UTF-8
/// when they validate and windows-1252 otherwise. A byte-order mark
/// overrides all of these.
pub fn decode_body(bytes: &[u8], header_charset: Option<&str>) -> String {
    let declared = header_charset
        .and_then(|label| Encoding::for_label(label.as_bytes()))
        .or_else(|| {
            let head = &bytes[..bytes.len().min(CHARSET_SNIFF_LIMIT)];
            let label = META_CHARSET.captures(head)?.get(1)?;
            Encoding::for_label(label.as_bytes())
        });
    let encoding = match declared {
        Some(encoding) => encoding,
        None if std::str::from_utf8(bytes).is_ok() => UTF_8,
        None => WINDOWS_1252,
    };
    let (text, _, _) = encoding.decode(bytes);
    text.into_owned()
}

/// Extracts readable text from markup. Block-level elements end a line,
/// everything else is flattened away.
pub fn extract_text(markup: &str) -> String {
    let document = Html::parse_document(markup);
    let mut raw = String::with_capacity(markup.len() / 2);
    collect_text(document.root_element(), &mut raw);
    normalize_text(&raw)
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => {
                let name = el.name();
                if SKIPPED_TAGS.contains(&name) {
                    continue;
                }
                if name == "br" {
                    out.push('\n');
                    continue;
                }
                let breaks = LINE_BREAK_TAGS.contains(&name);
                if breaks && !out.is_empty() && !out.ends_with('\n') {
                    out.push('\n');
                }
                if let Some(nested) = ElementRef::wrap(child) {
                    collect_text(nested, out);
                }
                if breaks {
                    out.push('\n');
                }
            }
            _ => {}
        }
    }
}

/// Trims every line, collapses runs of blank lines to one and drops
/// leading and trailing blank lines.
pub fn normalize_text(raw: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();
    for line in raw.lines() {
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            lines.push(trimmed);
        } else if lines.last().is_some_and(|last| !last.is_empty()) {
            lines.push("");
        }
    }
    while lines.last().is_some_and(|last| last.is_empty()) {
        lines.pop();
    }
    lines.join("\n")
}

/// SHA-256 of the UTF-8 text as lowercase hex.
pub fn fingerprint(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}
