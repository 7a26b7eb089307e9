use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use super::{parse_person, PersonRecord};
use crate::parser::blocks::{Entry, SectionInput};
use crate::parser::fields::split_name_function;
use crate::parser::sections::SectionExtractor;
use crate::record::{fragment, Fragment, Record};

const HOME_COUNTRY: &str = "Slovenská republika";
/// Group name for members listed before any body name.
const UNNAMED_GROUP: &str = "clenovia";

fn persons(entries: &[Entry]) -> Vec<PersonRecord> {
    entries
        .iter()
        .filter_map(|e| {
            let person = parse_person(e);
            if person.is_none() {
                warn!(line = %e.line, "person entry not understood");
            }
            person
        })
        .collect()
}

fn to_list<T: Serialize>(items: &[T]) -> Value {
    serde_json::to_value(items).unwrap_or(Value::Array(Vec::new()))
}

/// Partners ("Spoločníci"); always reported.
pub struct Partners;

impl SectionExtractor for Partners {
    fn extract(&self, input: &SectionInput<'_>, _record: &Record) -> Option<Fragment> {
        Some(fragment("spolocnici", to_list(&persons(&input.entries()))))
    }
}

/// Liquidators; omitted when there are none.
pub struct Liquidators;

impl SectionExtractor for Liquidators {
    fn extract(&self, input: &SectionInput<'_>, _record: &Record) -> Option<Fragment> {
        let list = persons(&input.entries());
        (!list.is_empty()).then(|| fragment("likvidatori", to_list(&list)))
    }
}

/// Supervisory board members; home country assumed unless one is given.
pub struct SupervisoryBoard;

impl SectionExtractor for SupervisoryBoard {
    fn extract(&self, input: &SectionInput<'_>, _record: &Record) -> Option<Fragment> {
        let list: Vec<PersonRecord> = persons(&input.entries())
            .into_iter()
            .map(|mut p| {
                p.address.country.get_or_insert_with(|| HOME_COUNTRY.to_string());
                p
            })
            .collect();
        (!list.is_empty()).then(|| fragment("dozorna_rada", to_list(&list)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BodyGroup {
    pub nazov: String,
    pub osoby: Vec<PersonRecord>,
}

/// Statutory body: a body name ("konateľ", "predstavenstvo") followed by its
/// members, possibly several bodies in a row.
pub struct StatutoryBody;

impl StatutoryBody {
    /// A line without an address that is not a "name - function" pair names a body.
    fn is_group_name(entry: &Entry) -> bool {
        !entry.line.contains(',') && split_name_function(&entry.line).1.is_none()
    }
}

impl SectionExtractor for StatutoryBody {
    fn extract(&self, input: &SectionInput<'_>, _record: &Record) -> Option<Fragment> {
        let mut groups: Vec<BodyGroup> = Vec::new();

        for entry in input.entries() {
            if Self::is_group_name(&entry) {
                groups.push(BodyGroup { nazov: entry.text.clone(), osoby: Vec::new() });
                continue;
            }
            let Some(person) = parse_person(&entry) else {
                warn!(line = %entry.line, "statutory body entry not understood");
                continue;
            };
            match groups.last_mut() {
                Some(group) => group.osoby.push(person),
                None => groups.push(BodyGroup {
                    nazov: UNNAMED_GROUP.to_string(),
                    osoby: vec![person],
                }),
            }
        }

        (!groups.is_empty()).then(|| fragment("statutarny_organ", to_list(&groups)))
    }
}

#[cfg(test)]
mod tests {
    use scraper::Html;

    use super::*;
    use crate::markup::select;

    fn run(extractor: &dyn SectionExtractor, rows: &[&str]) -> Option<Fragment> {
        let tables: String = rows
            .iter()
            .map(|r| format!("<table><tr><td>{r}</td><td>(od: 01.01.2010)</td></tr></table>"))
            .collect();
        let html = Html::parse_document(&format!(
            "<table><tr><td>label</td><td>{tables}</td></tr></table>"
        ));
        let value = select(html.root_element(), "//td[2]").into_iter().next();
        extractor.extract(&SectionInput { label: "label", value }, &Record::new())
    }

    #[test]
    fn statutory_groups() {
        let f = run(
            &StatutoryBody,
            &[
                "<span>konateľ</span>",
                "<span>Ing. Ján Novák</span><br><span>Hlavná</span> <span>5</span><br><span>Bratislava</span> <span>821 04</span><br><span>Vznik funkcie: 01.02.2003</span>",
                "<span>prokurista</span>",
                "<span>Eva Malá</span><br><span>Nová 7</span><br><span>Nitra 949 01</span>",
            ],
        )
        .unwrap();
        let groups = f["statutarny_organ"].as_array().unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0]["nazov"], "konateľ");
        assert_eq!(groups[0]["osoby"][0]["name"], "Ing. Ján Novák");
        assert_eq!(groups[0]["osoby"][0]["city"], "Bratislava");
        assert_eq!(groups[0]["osoby"][0]["zip"], "82104");
        assert_eq!(groups[0]["osoby"][0]["since"], "01.02.2003");
        assert_eq!(groups[1]["nazov"], "prokurista");
        assert_eq!(groups[1]["osoby"][0]["since"], "01.01.2010");
    }

    #[test]
    fn members_before_any_body_name() {
        let f = run(&StatutoryBody, &["<span>Ing. Vladislav Šustr - predseda predstavenstva</span>"]).unwrap();
        let groups = f["statutarny_organ"].as_array().unwrap();
        assert_eq!(groups[0]["nazov"], UNNAMED_GROUP);
        assert_eq!(groups[0]["osoby"][0]["function"], "predseda predstavenstva");
    }

    #[test]
    fn board_defaults_country() {
        let f = run(
            &SupervisoryBoard,
            &[
                "<span>Peter Veľký</span><br><span>Dlhá 1</span><br><span>Žilina 010 01</span>",
                "<span>Hans Müller</span><br><span>Ring 3</span><br><span>Wien A-1010</span><br><span>Rakúska republika</span>",
            ],
        )
        .unwrap();
        let board = f["dozorna_rada"].as_array().unwrap();
        assert_eq!(board[0]["country"], HOME_COUNTRY);
        assert_eq!(board[1]["country"], "Rakúska republika");
    }

    #[test]
    fn partners_always_listed() {
        let f = run(&Partners, &[]).unwrap();
        assert_eq!(f["spolocnici"], Value::Array(Vec::new()));
        assert!(run(&Liquidators, &[]).is_none());
        assert!(run(&SupervisoryBoard, &[]).is_none());
    }
}
