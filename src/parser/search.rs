//! Search result pages: a fixed table of entity names and their detail links.

use scraper::ElementRef;
use serde::ser::{Serialize, SerializeMap, Serializer};
use tracing::debug;

use crate::markup::{select, text_of, Document};

/// Rows live in the second column of the third body table.
const RESULT_ROWS: &str = "/html/body/table[3]/tr/td[2]";

/// Turns one result row (given by its name cell) into a label and a link.
pub trait RowFormatter: Send + Sync {
    fn format(&self, cell: ElementRef<'_>) -> Option<(String, String)>;
}

fn first_link(cell: ElementRef<'_>, path: &str) -> Option<String> {
    select(cell, path)
        .into_iter()
        .find_map(|a| a.value().attr("href").map(str::to_string))
}

/// Entity name with quotes dropped; link from the next column.
pub struct EntityRows;

impl RowFormatter for EntityRows {
    fn format(&self, cell: ElementRef<'_>) -> Option<(String, String)> {
        let label = text_of(cell).replace('"', "").trim().to_string();
        let link = first_link(cell, "../td[3]/div/a")?;
        Some((label, link))
    }
}

/// "{person} ({entity})"; the link sits one column further right.
pub struct PersonRows;

impl RowFormatter for PersonRows {
    fn format(&self, cell: ElementRef<'_>) -> Option<(String, String)> {
        let person = text_of(cell);
        let entity = select(cell, "../td[3]")
            .into_iter()
            .next()
            .map(text_of)
            .unwrap_or_default();
        let link = first_link(cell, "../td[4]/div/a")?;
        Some((format!("{person} ({entity})"), link))
    }
}

/// Ordered label -> link pairs; serializes as a mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchResults(Vec<(String, String)>);

impl SearchResults {
    /// Add a hit. A label seen before with another link gets a " [n]" suffix;
    /// the same label and link twice is stored once.
    pub fn insert(&mut self, label: String, link: String) {
        for n in 1.. {
            let key = if n == 1 { label.clone() } else { format!("{label} [{n}]") };
            match self.get(&key) {
                Some(existing) if existing == link => return,
                Some(_) => continue,
                None => {
                    self.0.push((key, link));
                    return;
                }
            }
        }
    }

    pub fn get(&self, label: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, link)| link.as_str())
    }

    pub fn first_link(&self) -> Option<&str> {
        self.0.first().map(|(_, link)| link.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(l, link)| (l.as_str(), link.as_str()))
    }
}

impl Serialize for SearchResults {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (label, link) in &self.0 {
            map.serialize_entry(label, link)?;
        }
        map.end()
    }
}

pub fn extract_search_results(doc: &Document, formatter: &dyn RowFormatter) -> SearchResults {
    let mut results = SearchResults::default();
    for cell in doc.query(RESULT_ROWS) {
        match formatter.format(cell) {
            Some((label, link)) if !label.is_empty() => results.insert(label, link),
            _ => debug!(text = %text_of(cell), "result row without label or link"),
        }
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParserConfig;
    use crate::markup::MarkupLoader;

    fn load(path: &str) -> Document {
        let html = std::fs::read_to_string(path).unwrap();
        MarkupLoader::new(&ParserConfig::default())
            .load(&encoding_rs::WINDOWS_1250.encode(&html).0)
            .unwrap()
    }

    #[test]
    fn duplicate_names_disambiguated() {
        let doc = load("tests/fixtures/search_matador.html");
        let r = extract_search_results(&doc, &EntityRows);
        assert_eq!(r.get("Matador s.r.o."), Some("vypis.asp?ID=1001&SID=2&P=0"));
        assert_eq!(r.get("Matador s.r.o. [2]"), Some("vypis.asp?ID=2002&SID=4&P=0"));
        assert_ne!(r.get("Matador s.r.o."), r.get("Matador s.r.o. [2]"));
    }

    #[test]
    fn quotes_dropped_and_repeats_collapsed() {
        let doc = load("tests/fixtures/search_matador.html");
        let r = extract_search_results(&doc, &EntityRows);
        assert_eq!(r.get("Harvex, s.r.o."), Some("vypis.asp?ID=3003&SID=3&P=0"));
        assert_eq!(r.len(), 3);
        assert_eq!(r.first_link(), Some("vypis.asp?ID=1001&SID=2&P=0"));
    }

    #[test]
    fn person_rows_combine_columns() {
        let doc = load("tests/fixtures/search_person.html");
        let r = extract_search_results(&doc, &PersonRows);
        assert_eq!(
            r.get("Kováč Ján (Matador s.r.o.)"),
            Some("vypis.asp?ID=1001&SID=2&P=0")
        );
        assert_eq!(r.len(), 2);
    }

    #[test]
    fn serializes_in_order() {
        let mut r = SearchResults::default();
        r.insert("B".into(), "b".into());
        r.insert("A".into(), "a".into());
        r.insert("A".into(), "c".into());
        assert_eq!(serde_json::to_string(&r).unwrap(), r#"{"B":"b","A":"a","A [2]":"c"}"#);
    }

    #[test]
    fn no_results_table() {
        let doc = MarkupLoader::new(&ParserConfig::default())
            .load(b"<html><body><p>Nenasli sa ziadne zaznamy</p></body></html>")
            .unwrap();
        assert!(extract_search_results(&doc, &EntityRows).is_empty());
    }
}
