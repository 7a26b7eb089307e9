use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::config::FetchConfig;
use crate::error::FetchError;

/// Which extract of an entity to ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Variant {
    /// Only the entries in force.
    #[default]
    Current,
    /// Every entry ever registered, including ended ones.
    Full,
}

impl Variant {
    pub fn flag(self) -> u8 {
        match self {
            Variant::Current => 0,
            Variant::Full => 1,
        }
    }

    pub fn from_flag(flag: &str) -> Option<Variant> {
        match flag.trim() {
            "0" => Some(Variant::Current),
            "1" => Some(Variant::Full),
            _ => None,
        }
    }
}

/// Locates one detail page: entity id, court id and extract variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetailKey {
    pub id: u64,
    pub court: u8,
    pub variant: Variant,
}

impl DetailKey {
    /// Read `ID`, `SID` and `P` from a link such as `vypis.asp?ID=1001&SID=2&P=0`.
    pub fn from_link(link: &str) -> Option<DetailKey> {
        let query = link.split_once('?').map_or(link, |(_, q)| q);
        let query = query.replace("&amp;", "&");

        let (mut id, mut court, mut variant) = (None, None, None);
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match key.to_ascii_uppercase().as_str() {
                "ID" => id = value.trim().parse::<u64>().ok(),
                "SID" => court = value.trim().parse::<u8>().ok(),
                "P" => variant = Variant::from_flag(&value),
                _ => {}
            }
        }
        Some(DetailKey { id: id?, court: court?, variant: variant? })
    }
}

/// Every page the registry serves that we know how to read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageRequest {
    Detail(DetailKey),
    ByName(String),
    ByIco(String),
    ByPerson { surname: String, first_name: String },
}

/// Search terms go out in the site's codepage, then form-encoded.
fn encode_term(term: &str) -> String {
    let (bytes, _, _) = encoding_rs::WINDOWS_1250.encode(term.trim());
    url::form_urlencoded::byte_serialize(&bytes).collect()
}

fn short_hash(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    digest[..8].iter().map(|b| format!("{b:02x}")).collect()
}

impl PageRequest {
    /// Path and query relative to the registry's base URL.
    pub fn path(&self) -> String {
        match self {
            PageRequest::Detail(key) => format!(
                "vypis.asp?ID={}&SID={}&P={}",
                key.id,
                key.court,
                key.variant.flag()
            ),
            PageRequest::ByName(name) => {
                format!("hladaj_subjekt.asp?OBMENO={}&PF=0&R=on", encode_term(name))
            }
            PageRequest::ByIco(ico) => format!("hladaj_ico.asp?ICO={}&SID=0", encode_term(ico)),
            PageRequest::ByPerson { surname, first_name } => format!(
                "hladaj_osoba.asp?PR={}&MENO={}&SID=0&T=f0&R=on",
                encode_term(surname),
                encode_term(first_name)
            ),
        }
    }

    /// File-name-safe key built from the request parameters.
    pub fn cache_key(&self) -> String {
        match self {
            PageRequest::Detail(key) => {
                format!("detail-{}-{}-{}", key.id, key.court, key.variant.flag())
            }
            PageRequest::ByName(_) => format!("name-{}", short_hash(&self.path())),
            PageRequest::ByIco(ico) => format!("ico-{}", short_hash(ico)),
            PageRequest::ByPerson { .. } => format!("person-{}", short_hash(&self.path())),
        }
    }
}

/// Source of raw page bytes, undecoded.
pub trait PageFetcher: Send + Sync {
    fn fetch(&self, request: &PageRequest) -> impl Future<Output = Result<Vec<u8>, FetchError>> + Send;
}

/// Counts requests and says when to pause: after every `every`-th one.
#[derive(Debug)]
pub struct Throttle {
    every: u64,
    delay: Duration,
    count: AtomicU64,
}

impl Throttle {
    pub fn new(every: u64, delay: Duration) -> Self {
        Throttle { every, delay, count: AtomicU64::new(0) }
    }

    /// Record one request; returns the pause owed after it, if any.
    pub fn tick(&self) -> Option<Duration> {
        let n = self.count.fetch_add(1, Ordering::Relaxed) + 1;
        if self.every == 0 || self.delay.is_zero() || n % self.every != 0 {
            return None;
        }
        Some(self.delay)
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }
}

/// `base * 2^attempt`, saturating instead of overflowing.
pub fn backoff_for(base: Duration, attempt: u32) -> Duration {
    let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
    base.saturating_mul(factor)
}

/// Live registry over HTTP, with retry on rate limiting and server errors.
pub struct HttpFetcher {
    client: reqwest::Client,
    config: FetchConfig,
    throttle: Throttle,
}

impl HttpFetcher {
    pub fn new(config: FetchConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|source| FetchError::Transport {
                url: config.base_url.clone(),
                source,
            })?;
        let throttle = Throttle::new(config.delay_every, config.delay);
        Ok(HttpFetcher { client, config, throttle })
    }

    pub fn url_for(&self, request: &PageRequest) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), request.path())
    }

    async fn fetch_once(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let transport = |source| FetchError::Transport { url: url.to_string(), source };

        let start = Instant::now();
        let response = self.client.get(url).send().await.map_err(transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let body = response.bytes().await.map_err(transport)?;
        if body.is_empty() {
            return Err(FetchError::Empty { url: url.to_string() });
        }
        debug!(url, bytes = body.len(), ms = start.elapsed().as_millis() as u64, "fetched");
        Ok(body.to_vec())
    }
}

impl PageFetcher for HttpFetcher {
    async fn fetch(&self, request: &PageRequest) -> Result<Vec<u8>, FetchError> {
        let url = self.url_for(request);
        info!("Fetching {}", url);

        let mut attempt = 0;
        let body = loop {
            match self.fetch_once(&url).await {
                Ok(body) => break body,
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    let backoff = backoff_for(self.config.base_backoff, attempt);
                    warn!(
                        "{} (attempt {}/{}), backing off {:.1}s",
                        e,
                        attempt + 1,
                        self.config.max_retries,
                        backoff.as_secs_f64()
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        };

        if let Some(pause) = self.throttle.tick() {
            tokio::time::sleep(pause).await;
        }
        Ok(body)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashMap;
    use std::sync::atomic::AtomicUsize;

    use super::*;

    /// Serves pages from memory, keyed by request path.
    #[derive(Default)]
    pub struct FakeFetcher {
        pages: HashMap<String, Vec<u8>>,
        calls: AtomicUsize,
    }

    impl FakeFetcher {
        pub fn with(mut self, request: PageRequest, body: impl Into<Vec<u8>>) -> Self {
            self.pages.insert(request.path(), body.into());
            self
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl PageFetcher for FakeFetcher {
        async fn fetch(&self, request: &PageRequest) -> Result<Vec<u8>, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.pages.get(&request.path()).cloned().ok_or(FetchError::Status {
                url: request.path(),
                status: 404,
            })
        }
    }

    /// A fixture re-encoded into the registry's codepage.
    pub fn fixture(name: &str) -> Vec<u8> {
        let html = std::fs::read_to_string(format!("tests/fixtures/{}.html", name)).unwrap();
        encoding_rs::WINDOWS_1250.encode(&html).0.into_owned()
    }
}
