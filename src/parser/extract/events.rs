use serde::Serialize;
use serde_json::Value;

use crate::parser::blocks::SectionInput;
use crate::parser::dates::{strip_validity, DateLabels, DateRange};
use crate::parser::sections::SectionExtractor;
use crate::record::{fragment, Fragment, Record};

/// One logged legal fact and when it took effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Event {
    pub text: String,
    #[serde(rename = "od", skip_serializing_if = "Option::is_none")]
    pub since: Option<String>,
    #[serde(rename = "do", skip_serializing_if = "Option::is_none")]
    pub until: Option<String>,
}

/// "Ďalšie právne skutočnosti": free-text log, always reported.
pub struct LegalFacts;

impl SectionExtractor for LegalFacts {
    fn extract(&self, input: &SectionInput<'_>, _record: &Record) -> Option<Fragment> {
        let events: Vec<Event> = input
            .entries()
            .into_iter()
            .filter_map(|entry| {
                let dates = entry
                    .validity
                    .or(DateRange::scan(&entry.text, DateLabels::Validity));
                let text = strip_validity(&entry.text);
                (!text.is_empty()).then_some(Event {
                    text,
                    since: dates.since,
                    until: dates.until,
                })
            })
            .collect();
        let list = serde_json::to_value(events).unwrap_or(Value::Array(Vec::new()));
        Some(fragment("dalsie_skutocnosti", list))
    }
}
