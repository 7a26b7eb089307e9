use crate::parser::blocks::{current_entry, Entry, SectionInput};
use crate::parser::sections::SectionExtractor;
use crate::record::{Fragment, Record};
use crate::text::{collapse_whitespace, fold_key};

/// Business name. Renames leave several entries; the one in force wins and
/// its wording tells whether the entity is in liquidation or bankruptcy.
pub struct CompanyName;

impl SectionExtractor for CompanyName {
    fn extract(&self, input: &SectionInput<'_>, _record: &Record) -> Option<Fragment> {
        let entries: Vec<Entry> = input
            .entries()
            .into_iter()
            .map(|mut e| {
                e.text = collapse_whitespace(&e.text.replace('"', ""));
                e
            })
            .filter(|e| !e.text.is_empty())
            .collect();
        let name = current_entry(entries)?.text;
        let folded = fold_key(&name);

        let mut out = Fragment::new();
        out.insert("obchodne_meno".into(), name.into());
        out.insert("likvidacia".into(), folded.contains("v likvidacii").into());
        out.insert("konkurz".into(), folded.contains("v konkurze").into());
        Some(out)
    }
}
