//! Tolerant markup loading: legacy codepage decoding, optional repair pass,
//! tree construction and the strict/lenient failure policy.

pub mod path;

use encoding_rs::Encoding;
use scraper::{ElementRef, Html};
use tracing::{debug, warn};

use crate::config::{ParserConfig, RepairMode, Strictness};
use crate::error::MarkupError;
use crate::text::collapse_whitespace;

pub use path::{select, text_of};

/// How the raw markup becomes a tree.
pub trait MarkupStrategy: Send + Sync {
    fn build(&self, markup: &str) -> Html;
}

/// Coerce the input into well-formed markup first, then parse the repaired text.
pub struct RepairThenParse;

impl MarkupStrategy for RepairThenParse {
    fn build(&self, markup: &str) -> Html {
        let first = Html::parse_document(markup);
        if first.errors.is_empty() {
            return first;
        }
        debug!(errors = first.errors.len(), "repairing malformed markup");
        let repaired = first.html();
        Html::parse_document(&repaired)
    }
}

/// Parse once; the tree builder absorbs structural errors on its own.
pub struct TolerantParse;

impl MarkupStrategy for TolerantParse {
    fn build(&self, markup: &str) -> Html {
        let html = Html::parse_document(markup);
        if !html.errors.is_empty() {
            debug!(errors = html.errors.len(), "ignoring markup errors");
        }
        html
    }
}

/// A decoded page and its tree.
pub struct Document {
    text: String,
    html: Html,
}

impl Document {
    pub fn empty() -> Self {
        Document {
            text: String::new(),
            html: Html::parse_document(""),
        }
    }

    /// UTF-8 text the tree was built from.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn root(&self) -> ElementRef<'_> {
        self.html.root_element()
    }

    /// Evaluate a path from the document root.
    pub fn query(&self, path: &str) -> Vec<ElementRef<'_>> {
        select(self.root(), path)
    }

    /// True when the body holds no elements at all.
    pub fn is_empty(&self) -> bool {
        self.query("/html/body/*").is_empty()
    }

    pub fn diagnostics(&self) -> Vec<String> {
        self.html.errors.iter().map(|e| e.to_string()).collect()
    }
}

pub struct MarkupLoader {
    strategy: Box<dyn MarkupStrategy>,
    strictness: Strictness,
    encoding: &'static Encoding,
}

impl MarkupLoader {
    pub fn new(config: &ParserConfig) -> Self {
        let strategy: Box<dyn MarkupStrategy> = match config.repair {
            RepairMode::Repair => Box::new(RepairThenParse),
            RepairMode::TolerantOnly => Box::new(TolerantParse),
        };
        MarkupLoader {
            strategy,
            strictness: config.strictness,
            encoding: config.encoding,
        }
    }

    /// Re-encode from the source codepage to UTF-8 and flatten whitespace.
    ///
    /// Bytes the codepage cannot map are replaced, never rejected.
    pub fn decode(&self, raw: &[u8]) -> String {
        let (text, had_errors) = self.encoding.decode_without_bom_handling(raw);
        if had_errors {
            warn!(encoding = self.encoding.name(), "undecodable bytes replaced");
        }
        let text = text.replace(
            &self.encoding.name().to_ascii_lowercase(),
            "utf-8",
        );
        collapse_whitespace(&text)
    }

    pub fn load(&self, raw: &[u8]) -> Result<Document, MarkupError> {
        let text = self.decode(raw);
        let html = self.strategy.build(&text);
        let doc = Document { text, html };

        if doc.is_empty() {
            let diagnostics = doc.diagnostics();
            return match self.strictness {
                Strictness::Strict => Err(MarkupError { diagnostics }),
                Strictness::Lenient => {
                    warn!(diagnostics = diagnostics.len(), "unusable markup, continuing with an empty tree");
                    Ok(Document::empty())
                }
            };
        }

        Ok(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cp1250(text: &str) -> Vec<u8> {
        encoding_rs::WINDOWS_1250.encode(text).0.into_owned()
    }

    fn loader(repair: RepairMode, strictness: Strictness) -> MarkupLoader {
        MarkupLoader::new(&ParserConfig {
            repair,
            strictness,
            ..ParserConfig::default()
        })
    }

    #[test]
    fn decodes_windows_1250() {
        let l = loader(RepairMode::Repair, Strictness::Strict);
        let raw = cp1250("<meta charset=windows-1250><p>Štatutárny&nbsp;orgán:\n  konateľ</p>");
        let text = l.decode(&raw);
        assert!(text.contains("Štatutárny orgán: konateľ"));
        assert!(text.contains("charset=utf-8"));
    }

    #[test]
    fn control_bytes_do_not_fail() {
        let l = loader(RepairMode::Repair, Strictness::Strict);
        let raw = [b'<', b'p', b'>', b'a', 0x98, b'b', b'<', b'/', b'p', b'>'];
        let doc = l.load(&raw).unwrap();
        assert!(doc.text().contains('a'));
    }

    #[test]
    fn malformed_markup_still_builds() {
        for mode in [RepairMode::Repair, RepairMode::TolerantOnly] {
            let l = loader(mode, Strictness::Strict);
            let doc = l.load(&cp1250("<table><tr><td>IČO:<td><b>123</table><p>unclosed")).unwrap();
            assert!(!doc.query("/html/body/table").is_empty());
            let cells = doc.query("/html/body/table/tr/td[2]");
            assert_eq!(text_of(cells[0]), "123");
        }
    }

    #[test]
    fn empty_input_strict_is_error() {
        let l = loader(RepairMode::Repair, Strictness::Strict);
        assert!(l.load(b"   ").is_err());
    }

    #[test]
    fn empty_input_lenient_is_empty_tree() {
        let l = loader(RepairMode::TolerantOnly, Strictness::Lenient);
        let doc = l.load(b"").unwrap();
        assert!(doc.is_empty());
    }
}
