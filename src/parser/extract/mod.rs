pub mod address;
pub mod capital;
pub mod court;
pub mod events;
pub mod name;
pub mod persons;
pub mod scalar;

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use super::blocks::Entry;
use super::dates::{DateLabels, DateRange};
use super::fields::{split_fields, split_name_function, Address};
use crate::text::close_up_spaced_letters;

/// Tokens of a person line that are not part of the name or address.
static PERSON_SKIP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(trval[ýy]\s+pobyt|vznik\s+funkcie|skon[čc]enie\s+funkcie)").unwrap()
});

/// Officer, partner, liquidator or board member.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PersonRecord {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,
    #[serde(flatten)]
    pub address: Address,
    #[serde(flatten)]
    pub dates: DateRange,
}

/// Parse "name[ - function], street number, city zip[, country]" plus the
/// appointment dates, which come from "Vznik funkcie:" / "Skončenie funkcie:"
/// or, failing that, from the entry's own validity.
pub fn parse_person(entry: &Entry) -> Option<PersonRecord> {
    let line = entry.line.as_str();
    let tokens = line
        .split(',')
        .map(str::trim)
        .filter(|t| t.is_empty() || !PERSON_SKIP_RE.is_match(t))
        .count();
    let names: &[&str] = if tokens >= 4 {
        &["name", "street", "city", "country"]
    } else {
        &["name", "street", "city"]
    };
    let parts = split_fields(line, names, ",", Some(&PERSON_SKIP_RE));

    let raw_name = parts.get("name").map(|n| close_up_spaced_letters(n))?;
    let (name, function) = split_name_function(&raw_name);
    if name.is_empty() {
        return None;
    }

    let address = Address::from_parts(
        parts.get("street").map(String::as_str),
        parts.get("city").map(String::as_str),
        parts.get("country").map(String::as_str),
    );
    let dates = DateRange::scan(line, DateLabels::Function).or(entry.validity.clone());

    Some(PersonRecord { name, function, address, dates })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(line: &str, validity: &str) -> Entry {
        Entry {
            text: line.to_string(),
            line: line.to_string(),
            validity: DateRange::scan(validity, DateLabels::Validity),
        }
    }

    #[test]
    fn officer_with_function_and_dates() {
        let p = parse_person(&entry(
            "Ing. Vladislav Šustr - predseda predstavenstva, Pod Kalváriou 373, Topoľčany 955 01, Vznik funkcie: 15.06.2015",
            "(od: 20.06.2015)",
        ))
        .unwrap();
        assert_eq!(p.name, "Ing. Vladislav Šustr");
        assert_eq!(p.function.as_deref(), Some("predseda predstavenstva"));
        assert_eq!(p.address.street, "Pod Kalváriou");
        assert_eq!(p.address.number, "373");
        assert_eq!(p.address.city, "Topoľčany");
        assert_eq!(p.address.zip, "95501");
        assert_eq!(p.dates.since.as_deref(), Some("15.06.2015"));
        assert!(p.address.country.is_none());
    }

    #[test]
    fn validity_is_the_fallback() {
        let p = parse_person(&entry("Ján Novák, Hlavná 5, Nitra 949 01", "(od: 01.02.2003 do: 05.06.2010)")).unwrap();
        assert_eq!(p.dates.since.as_deref(), Some("01.02.2003"));
        assert_eq!(p.dates.until.as_deref(), Some("05.06.2010"));
        assert!(p.function.is_none());
    }

    #[test]
    fn foreign_person_has_country() {
        let p = parse_person(&entry("Hans Müller, Hauptstrasse 5, Wien A-1010, Rakúska republika", "")).unwrap();
        assert_eq!(p.address.city, "Wien");
        assert_eq!(p.address.zip, "A-1010");
        assert_eq!(p.address.country.as_deref(), Some("Rakúska republika"));
    }

    #[test]
    fn spaced_out_name_rejoined() {
        let p = parse_person(&entry("J o z e f  N o v á k, Hlavná 5, Nitra", "")).unwrap();
        assert_eq!(p.name, "Jozef Novák");
    }

    #[test]
    fn empty_street_slot_keeps_city_in_place() {
        let p = parse_person(&entry("Ján Novák, , Nitra 949 01", "")).unwrap();
        assert_eq!(p.address.street, "");
        assert_eq!(p.address.number, "");
        assert_eq!(p.address.city, "Nitra");
        assert_eq!(p.address.zip, "94901");
    }

    #[test]
    fn residence_token_skipped() {
        let p = parse_person(&entry("Ján Novák, Trvalý pobyt v SR:, Hlavná 5, Nitra 949 01", "")).unwrap();
        assert_eq!(p.address.street, "Hlavná");
        assert_eq!(p.address.city, "Nitra");
        assert!(p.address.country.is_none());
    }

    #[test]
    fn serialized_flat() {
        let p = parse_person(&entry("Ján Novák, Hlavná 5, Nitra 949 01", "(od: 01.02.2003)")).unwrap();
        let v = serde_json::to_value(p).unwrap();
        assert_eq!(v["name"], "Ján Novák");
        assert_eq!(v["zip"], "94901");
        assert_eq!(v["since"], "01.02.2003");
        assert!(v.get("until").is_none());
        assert!(v.get("function").is_none());
    }
}
