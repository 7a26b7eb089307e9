use std::path::PathBuf;
use std::time::Duration;

use encoding_rs::Encoding;

pub const BASE_URL: &str = "http://www.orsr.sk";
const TIMEOUT_SECS: u64 = 30;
const DELAY_MS: u64 = 500;
const MAX_RETRIES: u32 = 3;
const BASE_BACKOFF_MS: u64 = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RepairMode {
    /// Re-serialize the parsed input as well-formed markup and parse that.
    #[default]
    Repair,
    /// Let the tree builder absorb errors in a single pass.
    TolerantOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strictness {
    /// Unusable markup is a `MarkupError`.
    #[default]
    Strict,
    /// Unusable markup yields an empty (but still signed) record.
    Lenient,
}

#[derive(Debug, Clone)]
pub struct ParserConfig {
    pub repair: RepairMode,
    pub strictness: Strictness,
    /// Leading body blocks holding page furniture rather than data.
    pub skip_blocks: usize,
    /// Codepage the registry serves its pages in.
    pub encoding: &'static Encoding,
}

impl Default for ParserConfig {
    fn default() -> Self {
        ParserConfig {
            repair: RepairMode::default(),
            strictness: Strictness::default(),
            skip_blocks: 1,
            encoding: encoding_rs::WINDOWS_1250,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub base_url: String,
    pub timeout: Duration,
    /// Sleep `delay` after every `delay_every`-th request; 0 disables the delay.
    pub delay_every: u64,
    pub delay: Duration,
    pub max_retries: u32,
    pub base_backoff: Duration,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        FetchConfig {
            base_url: BASE_URL.to_string(),
            timeout: Duration::from_secs(TIMEOUT_SECS),
            delay_every: 1,
            delay: Duration::from_millis(DELAY_MS),
            max_retries: MAX_RETRIES,
            base_backoff: Duration::from_millis(BASE_BACKOFF_MS),
            user_agent: format!("orsr_parser/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConnectorConfig {
    pub parser: ParserConfig,
    pub fetch: FetchConfig,
    /// Responses are cached here when set.
    pub cache_dir: Option<PathBuf>,
    /// Reported in the record's meta block.
    pub server: String,
}
