//! Web page download and HTML-to-text conversion

use crate::error::{EvError, Result};
use async_trait::async_trait;
use futures::future::join_all;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use tracing::{debug, info, warn};

const USER_AGENT: &str = "EVMarketAnalysisBot/1.0";

static SCRIPT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script[^>]*>.*?</script>").expect("valid regex"));
static STYLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<style[^>]*>.*?</style>").expect("valid regex"));
static COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("valid regex"));
static BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<br\s*/?>|</(p|div|li|tr|h[1-6]|section|article|header|footer)>")
        .expect("valid regex")
});
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));

/// Downloads raw HTML
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// reqwest-backed page fetcher
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Create a fetcher with a per-request timeout
    ///
    /// TLS certificates are verified unless `accept_invalid_certs` is set.
    pub fn new(timeout: Duration, accept_invalid_certs: bool) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .danger_accept_invalid_certs(accept_invalid_certs)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(EvError::Api(format!("GET {url} returned {status}")));
        }

        Ok(response.text().await?)
    }
}

/// Text extracted from one downloaded page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchedPage {
    pub url: String,
    pub text: String,
}

/// Downloads many pages concurrently and converts them to text
#[derive(Clone)]
pub struct WebContentFetcher {
    fetcher: Arc<dyn PageFetcher>,
}

impl WebContentFetcher {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self { fetcher }
    }

    /// Fetch every URL concurrently
    ///
    /// Failed, timed-out and empty pages are logged and left out; the rest
    /// keep the input order.
    pub async fn fetch_multiple(&self, urls: &[String]) -> Vec<FetchedPage> {
        info!("Loading {} documents", urls.len());

        let downloads = urls.iter().map(|url| async move {
            match self.fetcher.fetch(url).await {
                Ok(html) => {
                    debug!(url = url.as_str(), bytes = html.len(), "Downloaded page");
                    Some((url, html))
                }
                Err(e) => {
                    warn!(url = url.as_str(), "Failed to download page: {}", e);
                    None
                }
            }
        });

        let pages: Vec<FetchedPage> = join_all(downloads)
            .await
            .into_iter()
            .flatten()
            .filter_map(|(url, html)| {
                let text = html_to_text(&html);
                (!text.is_empty()).then(|| FetchedPage {
                    url: url.clone(),
                    text,
                })
            })
            .collect();

        info!("Loaded {} of {} documents", pages.len(), urls.len());
        pages
    }

    /// Fetch a single page as text
    pub async fn fetch_single(&self, url: &str) -> Option<String> {
        self.fetch_multiple(&[url.to_string()])
            .await
            .into_iter()
            .next()
            .map(|page| page.text)
    }
}

/// Convert HTML to plain text
///
/// Scripts, styles and comments are dropped, block elements become line
/// breaks, every line is trimmed and blank lines are removed.
pub fn html_to_text(html: &str) -> String {
    let text = SCRIPT_RE.replace_all(html, "");
    let text = STYLE_RE.replace_all(&text, "");
    let text = COMMENT_RE.replace_all(&text, "");
    let text = BLOCK_RE.replace_all(&text, "\n");
    let text = TAG_RE.replace_all(&text, "");
    let text = decode_entities(&text);

    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct StaticFetcher {
        pages: HashMap<String, String>,
    }

    #[async_trait]
    impl PageFetcher for StaticFetcher {
        async fn fetch(&self, url: &str) -> Result<String> {
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| EvError::Api(format!("timeout: {url}")))
        }
    }

    #[test]
    fn test_html_to_text() {
        let html = r#"<html><head><style>p { color: red }</style>
            <script>var x = "<p>hidden</p>";</script></head>
            <body><h1>EV Sales</h1><p>  Tesla &amp; BYD lead  </p>
            <!-- tracking --><div>Growth&nbsp;30%</div><br/>
            </body></html>"#;

        assert_eq!(html_to_text(html), "EV Sales\nTesla & BYD lead\nGrowth 30%");
    }

    #[test]
    fn test_html_to_text_empty() {
        assert_eq!(html_to_text("<html><script>x()</script></html>"), "");
    }

    #[tokio::test]
    async fn test_fetch_multiple_skips_failures() {
        let mut pages = HashMap::new();
        pages.insert("https://a.com".to_string(), "<p>first</p>".to_string());
        pages.insert("https://c.com".to_string(), "<p>third</p>".to_string());
        pages.insert("https://d.com".to_string(), "<script>only()</script>".to_string());

        let fetcher = WebContentFetcher::new(Arc::new(StaticFetcher { pages }));
        let urls: Vec<String> = ["https://a.com", "https://b.com", "https://c.com", "https://d.com"]
            .iter()
            .map(ToString::to_string)
            .collect();

        let fetched = fetcher.fetch_multiple(&urls).await;
        assert_eq!(fetched.len(), 2);
        assert_eq!(fetched[0].url, "https://a.com");
        assert_eq!(fetched[0].text, "first");
        assert_eq!(fetched[1].url, "https://c.com");

        assert_eq!(fetcher.fetch_single("https://b.com").await, None);
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_http_fetcher() {
        let fetcher = HttpFetcher::new(Duration::from_secs(10), false).unwrap();
        let html = fetcher.fetch("https://example.com").await.unwrap();
        assert!(html_to_text(&html).contains("Example Domain"));
    }
}
