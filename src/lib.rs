//! Extraction of structured records from the Slovak business register
//! (ORSR) web pages, plus a small client for the live site.

pub mod cache;
pub mod config;
pub mod connector;
pub mod error;
pub mod fetch;
pub mod markup;
pub mod output;
pub mod parser;
pub mod record;
pub mod text;

pub use config::{ConnectorConfig, FetchConfig, ParserConfig, RepairMode, Strictness};
pub use connector::Connector;
pub use error::{ConnectorError, FetchError, MarkupError, OutputError};
pub use fetch::{PageFetcher, PageRequest, Variant};
pub use output::{render, OutputFormat};
pub use parser::search::{EntityRows, PersonRows, RowFormatter, SearchResults};
pub use parser::Extractor;
pub use record::{MetaContext, Record, Summary};
