use async_trait::async_trait;
use nq_core::{Error, Result};
use reqwest::Client;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Readable content of a web page.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedPage {
    pub url: String,
    pub title: String,
    pub text: String,
}

#[async_trait]
pub trait ContentFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedPage>;
}

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("nq/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ContentFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        let parsed = validate_url(url)?;
        debug!("🌐 Fetching {}", parsed);

        let html = self
            .client
            .get(parsed.as_str())
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        parse_page(url, &html)
    }
}

/// Only absolute http(s) URLs can be ingested.
pub fn validate_url(url: &str) -> Result<Url> {
    let parsed = Url::parse(url.trim()).map_err(|e| Error::InvalidInput(format!("Invalid URL {}: {}", url, e)))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        scheme => Err(Error::InvalidInput(format!("Unsupported URL scheme {} in {}", scheme, url))),
    }
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| Error::Ingestion(format!("Bad selector {}: {}", css, e)))
}

fn clean_text(raw: String) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Title from og:title, the first `h1` or `<title>`; text from the `<p>` elements.
pub fn parse_page(url: &str, html: &str) -> Result<FetchedPage> {
    let document = Html::parse_document(html);

    let og_title = document
        .select(&selector("meta[property='og:title']")?)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(|content| clean_text(content.to_string()));
    let h1 = document
        .select(&selector("h1")?)
        .next()
        .map(|el| clean_text(el.text().collect()));
    let head_title = document
        .select(&selector("title")?)
        .next()
        .map(|el| clean_text(el.text().collect()));

    let title = [og_title, h1, head_title]
        .into_iter()
        .flatten()
        .find(|t| !t.is_empty())
        .unwrap_or_else(|| url.to_string());

    let text = document
        .select(&selector("p")?)
        .map(|el| clean_text(el.text().collect()))
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    if text.is_empty() {
        return Err(Error::Ingestion(format!("No article text found at {}", url)));
    }

    Ok(FetchedPage {
        url: url.to_string(),
        title,
        text,
    })
}
