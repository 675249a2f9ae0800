//! Link-following HTTP crawl engine.
//!
//! For every keyword, each seed template is expanded into a URL and fetched.
//! The first `branches` unseen in-scope links of the seed page become level-0
//! items; items above `depth` are expanded the same way. Seed expansions are
//! spaced by `delay.seed` and item fetches by `delay.video`.

use std::collections::{HashSet, VecDeque};
use std::net::IpAddr;
use std::time::Duration;

use chrono::Utc;
use reqwest::Client;
use reqwest::header::{ACCEPT_LANGUAGE, HeaderMap, HeaderValue};
use scraper::{Html, Selector};
use tracing::{debug, info, instrument, warn};
use url::Url;

use collectonce_shared::{
    CollectError, CrawlResult, CrawlSpec, CrawledItem, FetchFailure, Result,
};

use crate::CrawlCapability;
use crate::pacing::Pacer;

/// User-Agent string for crawl requests.
const USER_AGENT: &str = concat!("collectonce/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// HttpCrawler
// ---------------------------------------------------------------------------

/// Counters reported when the crawler is disposed.
#[derive(Debug, Default)]
struct SessionStats {
    keywords_attempted: usize,
    keywords_collected: usize,
    items: usize,
    pages_fetched: usize,
}

/// HTTP implementation of [`CrawlCapability`].
pub struct HttpCrawler {
    spec: CrawlSpec,
    client: Client,
    seed_pacer: Pacer,
    video_pacer: Pacer,
    stats: SessionStats,
    /// Allow localhost/private IPs (for integration tests with mock servers).
    allow_localhost: bool,
}

impl HttpCrawler {
    /// Build the crawler (and its HTTP client) from a validated spec.
    pub fn new(spec: &CrawlSpec) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(lang) = accept_language(spec.language.as_deref(), spec.country.as_deref()) {
            let value = HeaderValue::from_str(&lang).map_err(|e| {
                CollectError::config(format!("invalid language/country '{lang}': {e}"))
            })?;
            headers.insert(ACCEPT_LANGUAGE, value);
        }

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| CollectError::Network(format!("failed to build HTTP client: {e}")))?;

        info!(
            seeds = spec.seeds.len(),
            branches = spec.branches,
            depth = spec.depth,
            delay_seed_ms = spec.delay.seed.as_millis() as u64,
            delay_video_ms = spec.delay.video.as_millis() as u64,
            "crawler ready"
        );

        Ok(Self {
            spec: spec.clone(),
            client,
            seed_pacer: Pacer::new(spec.delay.seed),
            video_pacer: Pacer::new(spec.delay.video),
            stats: SessionStats::default(),
            allow_localhost: false,
        })
    }

    /// Allow crawling localhost/private IPs (for integration tests).
    #[cfg(test)]
    pub fn allow_localhost(mut self) -> Self {
        self.allow_localhost = true;
        self
    }

    #[instrument(skip(self), fields(seeds = self.spec.seeds.len()))]
    async fn collect_keyword(&mut self, keyword: &str) -> Result<Option<CrawlResult>> {
        self.stats.keywords_attempted += 1;

        let mut visited = HashSet::<String>::new();
        let mut items: Vec<CrawledItem> = Vec::new();
        let mut errors: Vec<FetchFailure> = Vec::new();
        let mut unreachable_seeds = 0usize;

        let templates = self.spec.seeds.clone();
        for template in &templates {
            let seed_url = expand_seed_template(
                template,
                keyword,
                self.spec.country.as_deref(),
                self.spec.language.as_deref(),
            )?;

            if !self.allow_localhost && is_ssrf_target(&seed_url) {
                warn!(%seed_url, "SSRF protection: blocked seed");
                errors.push(FetchFailure {
                    url: seed_url.to_string(),
                    message: "blocked by SSRF protection".into(),
                });
                unreachable_seeds += 1;
                continue;
            }

            self.seed_pacer.wait().await;
            debug!(%seed_url, "expanding seed");

            let page = match self.fetch(&seed_url).await {
                Ok(page) => page,
                Err(FetchError::Unreachable(message)) => {
                    warn!(%seed_url, error = %message, "seed unreachable");
                    errors.push(FetchFailure {
                        url: seed_url.to_string(),
                        message,
                    });
                    unreachable_seeds += 1;
                    continue;
                }
                Err(FetchError::Rejected(message)) => {
                    warn!(%seed_url, error = %message, "seed rejected");
                    errors.push(FetchFailure {
                        url: seed_url.to_string(),
                        message,
                    });
                    continue;
                }
            };

            visited.insert(normalize_url(&seed_url));
            let scope = CrawlScope::new(&seed_url);
            let mut queue: VecDeque<(Url, u32, Option<String>)> = self
                .select_children(&page.links, &scope, &mut visited)
                .into_iter()
                .map(|url| (url, 0, None))
                .collect();

            while let Some((url, level, parent)) = queue.pop_front() {
                self.video_pacer.wait().await;

                match self.fetch(&url).await {
                    Ok(item_page) => {
                        if level < self.spec.depth {
                            for child in self.select_children(&item_page.links, &scope, &mut visited) {
                                queue.push_back((child, level + 1, Some(url.to_string())));
                            }
                        }
                        items.push(CrawledItem {
                            url: url.to_string(),
                            title: item_page.title,
                            seed: seed_url.to_string(),
                            level,
                            parent,
                        });
                    }
                    Err(e) => {
                        debug!(%url, error = %e, "item fetch failed");
                        errors.push(FetchFailure {
                            url: url.to_string(),
                            message: e.to_string(),
                        });
                    }
                }
            }
        }

        if unreachable_seeds == templates.len() {
            return Err(CollectError::Network(format!(
                "none of the {} seed(s) could be reached",
                templates.len()
            )));
        }

        if items.is_empty() {
            info!(failures = errors.len(), "no items discovered");
            return Ok(None);
        }

        self.stats.keywords_collected += 1;
        self.stats.items += items.len();

        info!(items = items.len(), failures = errors.len(), "keyword collected");

        Ok(Some(CrawlResult {
            keyword: keyword.to_string(),
            collected_at: Utc::now(),
            items,
            errors,
        }))
    }

    /// Pick up to `branches` unseen, in-scope links, marking them visited.
    fn select_children(
        &self,
        links: &[String],
        scope: &CrawlScope,
        visited: &mut HashSet<String>,
    ) -> Vec<Url> {
        let limit = self.spec.branches as usize;
        let mut selected = Vec::new();

        for link in links {
            if selected.len() >= limit {
                break;
            }
            let Ok(url) = Url::parse(link) else {
                continue;
            };
            if !scope.in_scope(&url) {
                continue;
            }
            if !self.allow_localhost && is_ssrf_target(&url) {
                continue;
            }
            if visited.insert(normalize_url(&url)) {
                selected.push(url);
            }
        }

        selected
    }

    /// Fetch a page and extract its title and links.
    async fn fetch(&mut self, url: &Url) -> std::result::Result<ParsedPage, FetchError> {
        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| FetchError::Unreachable(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Rejected(format!("{url}: HTTP {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Rejected(format!("{url}: body read failed: {e}")))?;

        self.stats.pages_fetched += 1;
        Ok(parse_page(&body, url))
    }
}

impl CrawlCapability for HttpCrawler {
    async fn collect(&mut self, keyword: &str) -> Result<Option<CrawlResult>> {
        self.collect_keyword(keyword).await
    }

    async fn dispose(self) -> Result<()> {
        info!(
            keywords_attempted = self.stats.keywords_attempted,
            keywords_collected = self.stats.keywords_collected,
            items = self.stats.items,
            pages_fetched = self.stats.pages_fetched,
            "crawler disposed"
        );
        Ok(())
    }
}

/// Why a single fetch failed.
#[derive(Debug)]
enum FetchError {
    /// Transport-level failure (DNS, connect, timeout).
    Unreachable(String),
    /// The server answered, but not with a usable page.
    Rejected(String),
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unreachable(msg) | Self::Rejected(msg) => f.write_str(msg),
        }
    }
}

// ---------------------------------------------------------------------------
// Seed templates and locale
// ---------------------------------------------------------------------------

/// Substitute `{keyword}`, `{country}` and `{language}` into a seed template.
///
/// Values are form-encoded; missing locale values substitute as empty.
pub fn expand_seed_template(
    template: &str,
    keyword: &str,
    country: Option<&str>,
    language: Option<&str>,
) -> Result<Url> {
    let encode = |s: &str| url::form_urlencoded::byte_serialize(s.as_bytes()).collect::<String>();
    let expanded = template
        .replace("{keyword}", &encode(keyword))
        .replace("{country}", &encode(country.unwrap_or("")))
        .replace("{language}", &encode(language.unwrap_or("")));

    Url::parse(&expanded)
        .map_err(|e| CollectError::config(format!("seed '{template}' is not a valid URL: {e}")))
}

/// Build an `Accept-Language` value from the locale hints.
fn accept_language(language: Option<&str>, country: Option<&str>) -> Option<String> {
    match (language, country) {
        (Some(lang), Some(country)) => Some(format!("{lang}-{country}, {lang};q=0.9")),
        (Some(lang), None) => Some(lang.to_string()),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Scope checking
// ---------------------------------------------------------------------------

/// Items must stay on the seed's host.
struct CrawlScope {
    base_host: String,
}

impl CrawlScope {
    fn new(seed_url: &Url) -> Self {
        Self {
            base_host: seed_url.host_str().unwrap_or("").to_string(),
        }
    }

    fn in_scope(&self, url: &Url) -> bool {
        if url.scheme() != "http" && url.scheme() != "https" {
            return false;
        }
        url.host_str().unwrap_or("") == self.base_host
    }
}

// ---------------------------------------------------------------------------
// SSRF protection
// ---------------------------------------------------------------------------

/// Check if a URL targets a potentially dangerous resource.
fn is_ssrf_target(url: &Url) -> bool {
    match url.scheme() {
        "http" | "https" => {}
        _ => return true,
    }

    if let Some(host) = url.host_str() {
        let bare = host.trim_start_matches('[').trim_end_matches(']');
        if let Ok(ip) = bare.parse::<IpAddr>() {
            return is_private_ip(&ip);
        }
        if host == "localhost" || host.ends_with(".local") || host.ends_with(".internal") {
            return true;
        }
    }

    false
}

/// Check if an IP is in a private/reserved range.
fn is_private_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            v4.is_loopback()
                || v4.is_private()
                || v4.is_link_local()
                || v4.is_broadcast()
                || v4.is_unspecified()
                // 100.64.0.0/10 (Carrier-grade NAT)
                || (v4.octets()[0] == 100 && (v4.octets()[1] & 0xC0) == 64)
        }
        IpAddr::V6(v6) => v6.is_loopback() || v6.is_unspecified(),
    }
}

// ---------------------------------------------------------------------------
// Page parsing
// ---------------------------------------------------------------------------

/// What the crawler keeps from a fetched page.
#[derive(Debug, Clone)]
struct ParsedPage {
    title: Option<String>,
    links: Vec<String>,
}

/// Parse HTML synchronously; `Html` never lives across an await point.
fn parse_page(body: &str, url: &Url) -> ParsedPage {
    let doc = Html::parse_document(body);
    ParsedPage {
        title: extract_title(&doc),
        links: extract_links(&doc, url),
    }
}

/// Title from `<title>`, falling back to the first `<h1>`.
fn extract_title(doc: &Html) -> Option<String> {
    ["title", "h1"].iter().find_map(|sel| {
        let selector = Selector::parse(sel).ok()?;
        doc.select(&selector)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .filter(|t| !t.is_empty())
    })
}

/// Extract all links from a document, resolved against the base URL.
fn extract_links(doc: &Html, base_url: &Url) -> Vec<String> {
    let Ok(link_sel) = Selector::parse("a[href]") else {
        return Vec::new();
    };
    let mut links = Vec::new();

    for el in doc.select(&link_sel) {
        if let Some(href) = el.value().attr("href") {
            if href.starts_with('#')
                || href.starts_with("javascript:")
                || href.starts_with("mailto:")
            {
                continue;
            }

            if let Ok(mut resolved) = base_url.join(href) {
                resolved.set_fragment(None);
                links.push(resolved.to_string());
            }
        }
    }

    links
}

/// Normalize a URL for deduplication (strip fragment and trailing slash).
fn normalize_url(url: &Url) -> String {
    let mut normalized = url.clone();
    normalized.set_fragment(None);
    let mut s = normalized.to_string();
    if s.ends_with('/') && s.matches('/').count() > 3 {
        s.pop();
    }
    s
}
