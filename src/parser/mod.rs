pub mod blocks;
pub mod dates;
pub mod extract;
pub mod fields;
pub mod money;
pub mod search;
pub mod sections;

use tracing::debug;

use crate::config::ParserConfig;
use crate::error::MarkupError;
use crate::markup::MarkupLoader;
use crate::record::{MetaContext, Record};
use search::{RowFormatter, SearchResults};

/// Raw page bytes in, structured data out. Holds no per-page state, so one
/// instance can serve many threads.
pub struct Extractor {
    loader: MarkupLoader,
    skip_blocks: usize,
}

impl Extractor {
    pub fn new(config: &ParserConfig) -> Self {
        Extractor {
            loader: MarkupLoader::new(config),
            skip_blocks: config.skip_blocks,
        }
    }

    /// Three passes: markup -> labelled blocks -> merged record, then the meta block.
    pub fn extract_detail(&self, raw: &[u8], ctx: &MetaContext) -> Result<Record, MarkupError> {
        let doc = self.loader.load(raw)?;
        let record = sections::extract_record(&doc, self.skip_blocks);
        debug!(keys = record.len(), "detail extracted");
        Ok(record.finish(ctx))
    }

    pub fn extract_search_results(
        &self,
        raw: &[u8],
        formatter: &dyn RowFormatter,
    ) -> Result<SearchResults, MarkupError> {
        let doc = self.loader.load(raw)?;
        Ok(search::extract_search_results(&doc, formatter))
    }
}

impl Default for Extractor {
    fn default() -> Self {
        Extractor::new(&ParserConfig::default())
    }
}

// ── Tests ──
