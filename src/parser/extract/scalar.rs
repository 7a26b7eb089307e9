use serde_json::Value;

use crate::parser::blocks::SectionInput;
use crate::parser::dates::normalize_date;
use crate::parser::sections::SectionExtractor;
use crate::record::{fragment, Fragment, Record};
use crate::text::{collapse_whitespace, strip_all_whitespace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    /// Text of the entry in force.
    Text,
    /// Same, with every space removed (registration numbers).
    Compact,
    /// A D.M.YYYY date, normalized; the raw text when no date is found.
    Date,
    /// Every entry, always reported even when empty.
    List,
}

/// A section whose value is one string, one date or a plain list of strings.
#[derive(Debug, Clone, Copy)]
pub struct Scalar {
    pub key: &'static str,
    pub kind: ScalarKind,
}

pub const ICO: Scalar = Scalar { key: "ico", kind: ScalarKind::Compact };
pub const REGISTERED_ON: Scalar = Scalar { key: "den_zapisu", kind: ScalarKind::Date };
pub const DELETED_ON: Scalar = Scalar { key: "den_vymazu", kind: ScalarKind::Date };
pub const DELETION_REASON: Scalar = Scalar { key: "dovod_vymazu", kind: ScalarKind::Text };
pub const LEGAL_FORM: Scalar = Scalar { key: "pravna_forma", kind: ScalarKind::Text };
pub const ACTIVITIES: Scalar = Scalar { key: "predmet_cinnosti", kind: ScalarKind::List };
pub const LIQUIDATION: Scalar = Scalar { key: "likvidacia_udaje", kind: ScalarKind::List };
pub const REPRESENTATION: Scalar = Scalar { key: "zastupovanie", kind: ScalarKind::Text };
pub const ACTING: Scalar = Scalar { key: "konanie_menom_spolocnosti", kind: ScalarKind::Text };
pub const UPDATED_ON: Scalar = Scalar { key: "datum_aktualizacie", kind: ScalarKind::Date };
pub const EXTRACTED_ON: Scalar = Scalar { key: "datum_vypisu", kind: ScalarKind::Date };

impl SectionExtractor for Scalar {
    fn extract(&self, input: &SectionInput<'_>, _record: &Record) -> Option<Fragment> {
        let value = match self.kind {
            ScalarKind::List => Value::Array(
                input
                    .entries()
                    .into_iter()
                    .map(|e| Value::String(collapse_whitespace(&e.text)))
                    .collect(),
            ),
            kind => {
                let text = input.current_entry().map(|e| e.text)?;
                let text = match kind {
                    ScalarKind::Compact => strip_all_whitespace(&text),
                    ScalarKind::Date => normalize_date(&text).unwrap_or(text),
                    _ => text,
                };
                if text.is_empty() {
                    return None;
                }
                Value::String(text)
            }
        };
        Some(fragment(self.key, value))
    }
}

#[cfg(test)]
mod tests {
    use scraper::Html;

    use super::*;
    use crate::markup::select;

    fn run(scalar: Scalar, value_html: &str) -> Option<Fragment> {
        let html = Html::parse_document(&format!(
            "<table><tr><td>label</td><td>{value_html}</td></tr></table>"
        ));
        let value = select(html.root_element(), "//td[2]").into_iter().next();
        scalar.extract(&SectionInput { label: "label", value }, &Record::new())
    }

    #[test]
    fn ico_loses_spaces() {
        let f = run(ICO, "<table><tr><td>36 294 268</td><td>(od: 18.04.2006)</td></tr></table>").unwrap();
        assert_eq!(f["ico"], "36294268");
    }

    #[test]
    fn date_normalized() {
        let f = run(REGISTERED_ON, "<table><tr><td>5.3.1992</td></tr></table>").unwrap();
        assert_eq!(f["den_zapisu"], "05.03.1992");
        let f = run(EXTRACTED_ON, "18.10.2016").unwrap();
        assert_eq!(f["datum_vypisu"], "18.10.2016");
    }

    #[test]
    fn empty_value_omits_key() {
        assert!(run(LEGAL_FORM, "").is_none());
        assert!(run(LEGAL_FORM, "<table><tr><td> </td></tr></table>").is_none());
    }

    #[test]
    fn list_is_always_reported() {
        let f = run(ACTIVITIES, "").unwrap();
        assert_eq!(f["predmet_cinnosti"], Value::Array(Vec::new()));

        let f = run(
            ACTIVITIES,
            "<table><tr><td>kúpa tovaru</td><td>(od: 1.1.2000)</td></tr></table>\
             <table><tr><td>sprostredkovateľská činnosť</td><td>(od: 1.1.2000)</td></tr></table>",
        )
        .unwrap();
        assert_eq!(f["predmet_cinnosti"].as_array().map(Vec::len), Some(2));
        assert_eq!(f["predmet_cinnosti"][1], "sprostredkovateľská činnosť");
    }

    #[test]
    fn text_uses_entry_in_force() {
        let f = run(
            LEGAL_FORM,
            "<table><tr><td>Verejná obchodná spoločnosť</td><td>(od: 1.1.1995 do: 1.1.2000)</td></tr></table>\
             <table><tr><td>Spoločnosť s ručením obmedzeným</td><td>(od: 1.1.2000)</td></tr></table>",
        )
        .unwrap();
        assert_eq!(f["pravna_forma"], "Spoločnosť s ručením obmedzeným");
    }
}
