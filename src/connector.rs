//! Lookups against the live registry: fetch a page, extract it, sign it.

use tracing::{debug, info};

use crate::cache::CachedFetcher;
use crate::config::{ConnectorConfig, ParserConfig};
use crate::error::ConnectorError;
use crate::fetch::{DetailKey, HttpFetcher, PageFetcher, PageRequest, Variant};
use crate::parser::search::{EntityRows, PersonRows, RowFormatter, SearchResults};
use crate::parser::Extractor;
use crate::record::{MetaContext, Record};

/// Highest court id the registry uses; 0 means "any court" and only works in searches.
const MAX_COURT: u8 = 9;
const ICO_DIGITS: usize = 8;

pub struct Connector<F = CachedFetcher<HttpFetcher>> {
    fetcher: F,
    extractor: Extractor,
    server: String,
}

impl Connector {
    /// HTTP fetcher, behind the file cache when a directory is configured.
    pub fn from_config(config: &ConnectorConfig) -> Result<Self, ConnectorError> {
        let http = HttpFetcher::new(config.fetch.clone())?;
        let fetcher = CachedFetcher::new(http, config.cache_dir.clone());
        Ok(Connector::new(fetcher, &config.parser, config.server.clone()))
    }
}

impl<F: PageFetcher> Connector<F> {
    pub fn new(fetcher: F, parser: &ParserConfig, server: impl Into<String>) -> Self {
        Connector {
            fetcher,
            extractor: Extractor::new(parser),
            server: server.into(),
        }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub async fn detail_by_id(&self, id: i64, court: u8, variant: Variant) -> Result<Record, ConnectorError> {
        let id = u64::try_from(id)
            .ok()
            .filter(|id| *id >= 1)
            .ok_or(ConnectorError::InvalidId(id))?;
        self.detail(DetailKey { id, court, variant }).await
    }

    /// Follow a detail link taken from a search result page; `variant`
    /// overrides the link's own `P` flag.
    pub async fn detail_by_link(&self, link: &str, variant: Option<Variant>) -> Result<Record, ConnectorError> {
        let mut key = DetailKey::from_link(link).ok_or_else(|| ConnectorError::InvalidLink(link.to_string()))?;
        if key.id == 0 {
            return Err(ConnectorError::InvalidLink(link.to_string()));
        }
        if let Some(variant) = variant {
            key.variant = variant;
        }
        self.detail(key).await
    }

    async fn detail(&self, key: DetailKey) -> Result<Record, ConnectorError> {
        if !(1..=MAX_COURT).contains(&key.court) {
            return Err(ConnectorError::InvalidCourt(key.court));
        }
        let ctx = MetaContext::new(self.server.clone());
        let raw = self.fetcher.fetch(&PageRequest::Detail(key)).await?;
        let record = self.extractor.extract_detail(&raw, &ctx)?;
        info!(id = key.id, court = key.court, keys = record.len(), "detail extracted");
        Ok(record)
    }

    async fn search(&self, request: PageRequest, formatter: &dyn RowFormatter) -> Result<SearchResults, ConnectorError> {
        let raw = self.fetcher.fetch(&request).await?;
        let results = self.extractor.extract_search_results(&raw, formatter)?;
        info!(hits = results.len(), "search done");
        Ok(results)
    }

    pub async fn find_by_name(&self, name: &str) -> Result<SearchResults, ConnectorError> {
        self.search(PageRequest::ByName(name.to_string()), &EntityRows).await
    }

    /// Non-digits are dropped; anything but eight digits finds nothing
    /// without asking the registry.
    pub async fn find_by_ico(&self, ico: &str) -> Result<SearchResults, ConnectorError> {
        let Some(ico) = clean_ico(ico) else {
            debug!(ico, "malformed ICO, nothing to look up");
            return Ok(SearchResults::default());
        };
        self.search(PageRequest::ByIco(ico), &EntityRows).await
    }

    pub async fn find_by_person(&self, surname: &str, first_name: &str) -> Result<SearchResults, ConnectorError> {
        let request = PageRequest::ByPerson {
            surname: surname.to_string(),
            first_name: first_name.to_string(),
        };
        self.search(request, &PersonRows).await
    }

    /// Search by ICO and open the first hit.
    pub async fn detail_by_ico(&self, ico: &str, variant: Option<Variant>) -> Result<Option<Record>, ConnectorError> {
        let results = self.find_by_ico(ico).await?;
        let Some(link) = results.first_link() else {
            return Ok(None);
        };
        self.detail_by_link(link, variant).await.map(Some)
    }
}

fn clean_ico(ico: &str) -> Option<String> {
    let digits: String = ico.chars().filter(char::is_ascii_digit).collect();
    (digits.len() == ICO_DIGITS).then_some(digits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::testing::{fixture, FakeFetcher};

    fn key(id: u64, court: u8, variant: Variant) -> PageRequest {
        PageRequest::Detail(DetailKey { id, court, variant })
    }

    fn connector() -> Connector<FakeFetcher> {
        let fake = FakeFetcher::default()
            .with(key(1001, 2, Variant::Current), fixture("detail_sro"))
            .with(key(1001, 2, Variant::Full), fixture("detail_as_liquidation"))
            .with(PageRequest::ByIco("36294268".into()), fixture("search_matador"))
            .with(PageRequest::ByName("Matador".into()), fixture("search_matador"))
            .with(
                PageRequest::ByPerson { surname: "Kováč".into(), first_name: "Ján".into() },
                fixture("search_person"),
            );
        Connector::new(fake, &ParserConfig::default(), "test")
    }

    #[tokio::test]
    async fn detail_by_id_signs_record() {
        let c = connector();
        let r = c.detail_by_id(1001, 2, Variant::Current).await.unwrap();
        assert_eq!(r.get_str("ico"), Some("36294268"));
        assert_eq!(r.get("meta").unwrap()["server"], "test");
    }

    #[tokio::test]
    async fn bad_ids_rejected_before_fetching() {
        let c = connector();
        assert!(matches!(
            c.detail_by_id(0, 2, Variant::Current).await,
            Err(ConnectorError::InvalidId(0))
        ));
        assert!(matches!(
            c.detail_by_id(-5, 2, Variant::Current).await,
            Err(ConnectorError::InvalidId(-5))
        ));
        assert!(matches!(
            c.detail_by_id(1001, 0, Variant::Current).await,
            Err(ConnectorError::InvalidCourt(0))
        ));
        assert!(matches!(
            c.detail_by_id(1001, 10, Variant::Current).await,
            Err(ConnectorError::InvalidCourt(10))
        ));
        assert_eq!(c.fetcher().calls(), 0);
    }

    #[tokio::test]
    async fn link_with_variant_override() {
        let c = connector();
        let r = c
            .detail_by_link("vypis.asp?ID=1001&SID=2&P=0", Some(Variant::Full))
            .await
            .unwrap();
        assert_eq!(r.get_str("oddiel"), Some("Sa"));
        assert!(matches!(
            c.detail_by_link("vypis.asp?SID=2&P=0", None).await,
            Err(ConnectorError::InvalidLink(_))
        ));
    }

    #[tokio::test]
    async fn missing_page_is_fetch_error() {
        let c = connector();
        assert!(matches!(
            c.detail_by_id(9999, 2, Variant::Current).await,
            Err(ConnectorError::Fetch(_))
        ));
    }

    #[tokio::test]
    async fn malformed_ico_finds_nothing() {
        let c = connector();
        assert!(c.find_by_ico("1234").await.unwrap().is_empty());
        assert!(c.detail_by_ico("12 34", None).await.unwrap().is_none());
        assert_eq!(c.fetcher().calls(), 0);
    }

    #[tokio::test]
    async fn detail_by_ico_opens_first_hit() {
        let c = connector();
        let r = c.detail_by_ico("36 294 268", None).await.unwrap().unwrap();
        assert_eq!(r.get_str("obchodne_meno"), Some("Harvex, s.r.o."));
        assert_eq!(c.fetcher().calls(), 2);
    }

    #[tokio::test]
    async fn searches() {
        let c = connector();
        let by_name = c.find_by_name("Matador").await.unwrap();
        assert_eq!(by_name.len(), 3);
        let by_person = c.find_by_person("Kováč", "Ján").await.unwrap();
        assert!(by_person.get("Kováč Ján (Matador s.r.o.)").is_some());
    }
}
