//! Breadth-first web crawler producing web documents.
//!
//! Starting from a root URL, pages are fetched level by level up to
//! `max_depth` levels (the root is level 1). Only links under the root URL
//! are followed. Non-success responses and non-HTML content are skipped.

use crate::document::{Document, DocumentKind};
use crate::error::{AutodocError, Result};
use regex::Regex;
use reqwest::{Client, Url};
use std::collections::{HashSet, VecDeque};
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Elements whose content is never part of the page text.
const STRIPPED_TAGS: &[&str] = &["script", "style", "nav", "header", "footer"];

/// Link targets that are never pages.
const ASSET_EXTENSIONS: &[&str] = &[
    "css", "js", "png", "jpg", "jpeg", "gif", "svg", "ico", "pdf", "zip", "gz", "woff", "woff2",
];

static HREF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)href\s*=\s*["']([^"'#]+)"#).expect("valid href regex")
});

static STRIP_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    STRIPPED_TAGS
        .iter()
        .map(|tag| {
            Regex::new(&format!(r"(?is)<{tag}\b[^>]*>.*?</{tag}\s*>")).expect("valid strip regex")
        })
        .collect()
});

/// Crawl settings.
#[derive(Debug, Clone)]
pub struct CrawlOptions {
    /// Levels of pages to load; 1 loads only the root.
    pub max_depth: usize,
    /// Per-request timeout.
    pub timeout_secs: u64,
    /// Upper bound on fetched pages.
    pub max_pages: usize,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            max_depth: 2,
            timeout_secs: 30,
            max_pages: 500,
        }
    }
}

/// HTTP crawler.
pub struct Crawler {
    client: Client,
    options: CrawlOptions,
}

impl Crawler {
    pub fn new(options: CrawlOptions) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(options.timeout_secs))
            .build()?;
        Ok(Self { client, options })
    }

    /// Crawl from `root` and return one document per page with text.
    pub async fn crawl(&self, root: &str) -> Result<Vec<Document>> {
        let root = Url::parse(root)
            .map_err(|e| AutodocError::InvalidConfig(format!("invalid URL '{}': {}", root, e)))?;

        let mut visited: HashSet<String> = HashSet::new();
        let mut queue: VecDeque<(Url, usize)> = VecDeque::new();
        let mut documents = Vec::new();

        visited.insert(root.as_str().to_string());
        queue.push_back((root.clone(), 1));

        while let Some((url, depth)) = queue.pop_front() {
            if depth > self.options.max_depth {
                continue;
            }
            if documents.len() >= self.options.max_pages {
                warn!(max_pages = self.options.max_pages, "page limit reached, stopping crawl");
                break;
            }

            let Some(html) = self.fetch(&url).await else {
                continue;
            };

            let text = extract_text(&html);
            if text.is_empty() {
                debug!(url = %url, "page has no text");
            } else {
                documents.push(Document::new(url.as_str(), text, DocumentKind::Web));
            }

            if depth < self.options.max_depth {
                for link in extract_links(&html, &url) {
                    if is_within(&root, &link) && visited.insert(link.as_str().to_string()) {
                        queue.push_back((link, depth + 1));
                    }
                }
            }
        }

        info!(pages = documents.len(), root = %root, "crawl finished");
        Ok(documents)
    }

    async fn fetch(&self, url: &Url) -> Option<String> {
        let response = match self.client.get(url.clone()).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("failed to fetch {}: {}", url, e);
                return None;
            }
        };

        let status = response.status();
        if !status.is_success() {
            debug!(url = %url, %status, "skipping non-success response");
            return None;
        }

        let is_html = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_none_or(|v| v.contains("html"));
        if !is_html {
            debug!(url = %url, "skipping non-HTML content");
            return None;
        }

        match response.text().await {
            Ok(body) => Some(body),
            Err(e) => {
                warn!("failed to read body of {}: {}", url, e);
                None
            }
        }
    }
}

/// Whether `link` lies under `root` (same origin and path prefix).
fn is_within(root: &Url, link: &Url) -> bool {
    link.as_str().starts_with(root.as_str())
}

/// Absolute links found in `html`, resolved against `base`.
///
/// Fragments are dropped and asset files are skipped.
pub fn extract_links(html: &str, base: &Url) -> Vec<Url> {
    let mut links = Vec::new();
    for caps in HREF_RE.captures_iter(html) {
        let href = caps[1].trim();
        if href.starts_with("mailto:") || href.starts_with("javascript:") {
            continue;
        }
        let Ok(mut url) = base.join(href) else {
            continue;
        };
        if !matches!(url.scheme(), "http" | "https") {
            continue;
        }
        url.set_fragment(None);

        let is_asset = url
            .path()
            .rsplit_once('.')
            .is_some_and(|(_, ext)| ASSET_EXTENSIONS.contains(&ext.to_lowercase().as_str()));
        if !is_asset && !links.contains(&url) {
            links.push(url);
        }
    }
    links
}

/// Visible text of an HTML page, one non-empty phrase per line.
pub fn extract_text(html: &str) -> String {
    let mut cleaned = html.to_string();
    for re in STRIP_RES.iter() {
        cleaned = re.replace_all(&cleaned, "").into_owned();
    }

    let rendered = html2text::from_read(cleaned.as_bytes(), 200);
    rendered
        .lines()
        .flat_map(|line| line.split("  "))
        .map(str::trim)
        .filter(|phrase| !phrase.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
