use scraper::ElementRef;

use super::dates::{DateLabels, DateRange};
use crate::markup::{select, text_of, Document};
use crate::text::join_fragments;

/// One labelled row of a detail page: first column label, second column value.
#[derive(Debug, Clone)]
pub struct Block<'a> {
    pub label: String,
    pub value: Option<ElementRef<'a>>,
}

/// Walk the top-level body blocks, skipping the leading page furniture, and
/// collect every row that carries a label.
pub fn collect_blocks(doc: &Document, skip: usize) -> Vec<Block<'_>> {
    let mut blocks = Vec::new();

    for element in doc.query("/html/body/*").into_iter().skip(skip) {
        for row in select(element, "*") {
            let Some(label_cell) = select(row, ".//td[1]").into_iter().next() else {
                continue;
            };
            let label = text_of(label_cell);
            if label.is_empty() {
                continue;
            }
            let value = select(row, ".//td[2]").into_iter().next();
            blocks.push(Block { label, value });
        }
    }

    blocks
}

/// One nested-table entry of a value cell, e.g. a single officer or a
/// single business activity, with its "(od: .. do: ..)" validity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Entry {
    /// Plain text of the first column.
    pub text: String,
    /// First column fragments joined into one comma separated line.
    pub line: String,
    pub validity: DateRange,
}

/// What a section routine gets to look at.
pub struct SectionInput<'a> {
    pub label: &'a str,
    pub value: Option<ElementRef<'a>>,
}

impl<'a> SectionInput<'a> {
    pub fn new(block: &'a Block<'a>) -> Self {
        SectionInput {
            label: &block.label,
            value: block.value,
        }
    }

    /// Text of the whole value cell.
    pub fn value_text(&self) -> String {
        self.value.map(text_of).unwrap_or_default()
    }

    /// Evaluate `path` relative to the value cell.
    pub fn query(&self, path: &str) -> Vec<ElementRef<'a>> {
        self.value.map(|v| select(v, path)).unwrap_or_default()
    }

    /// Every nested-table entry of the value cell, in page order.
    ///
    /// A value cell without nested tables yields its own text as a single entry.
    pub fn entries(&self) -> Vec<Entry> {
        let Some(value) = self.value else {
            return Vec::new();
        };

        let tables = select(value, ".//table");
        if tables.is_empty() {
            let text = text_of(value);
            if text.is_empty() {
                return Vec::new();
            }
            let validity = DateRange::scan(&text, DateLabels::Validity);
            return vec![Entry { line: text.clone(), text, validity }];
        }

        tables.into_iter().filter_map(table_entry).collect()
    }

    /// The entry that is in force: no end date, latest start date, later
    /// position on ties. Falls back to the last entry.
    pub fn current_entry(&self) -> Option<Entry> {
        current_entry(self.entries())
    }
}

fn table_entry(table: ElementRef<'_>) -> Option<Entry> {
    let text = select(table, ".//tr/td[1]")
        .into_iter()
        .map(text_of)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    if text.is_empty() {
        return None;
    }

    let fragments: Vec<String> = select(table, ".//tr/td[1]/*").into_iter().map(text_of).collect();
    let line = if fragments.iter().any(|f| !f.is_empty()) {
        join_fragments(fragments.iter().map(String::as_str))
    } else {
        text.clone()
    };

    let dates = select(table, ".//tr/td[2]")
        .into_iter()
        .map(text_of)
        .collect::<Vec<_>>()
        .join(" ");
    let validity = DateRange::scan(&dates, DateLabels::Validity);

    Some(Entry { text, line, validity })
}

pub fn current_entry(entries: Vec<Entry>) -> Option<Entry> {
    let pick = entries
        .iter()
        .enumerate()
        .filter(|(_, e)| e.validity.until.is_none())
        .max_by_key(|(i, e)| (e.validity.since_date(), *i))
        .map(|(i, _)| i);

    match pick {
        Some(i) => entries.into_iter().nth(i),
        None => entries.into_iter().last(),
    }
}
