use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};
use tracing::warn;

use crate::parser::blocks::SectionInput;
use crate::parser::money::{amount_or_raw, parse_amount};
use crate::parser::sections::SectionExtractor;
use crate::record::{fragment, Fragment, Record};
use crate::text::{collapse_whitespace, fold_key, join_digit_groups};

static PAID_UP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)rozsah\s+splatenia\s*:?").unwrap());
static DEPOSIT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)vklad\s*:").unwrap());
static DEPOSIT_PAID_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)splaten[ée]\s*:").unwrap());
static KEY_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9_]").unwrap());

fn money_value(text: &str) -> Option<Value> {
    parse_amount(text).and_then(|m| serde_json::to_value(m).ok())
}

/// "6 972 EUR Rozsah splatenia: 6 972 EUR".
pub struct RegisteredCapital;

impl SectionExtractor for RegisteredCapital {
    fn extract(&self, input: &SectionInput<'_>, _record: &Record) -> Option<Fragment> {
        let text = input.current_entry()?.text;
        let (amount, paid) = match PAID_UP_RE.find(&text) {
            Some(m) => (&text[..m.start()], Some(&text[m.end()..])),
            None => (text.as_str(), None),
        };

        let Some(vyska) = money_value(amount) else {
            warn!(text = %text, "registered capital not understood, keeping raw text");
            return Some(fragment("zakladne_imanie", collapse_whitespace(&text)));
        };
        let mut out = Map::new();
        out.insert("vyska".into(), vyska);
        if let Some(paid) = paid.and_then(money_value) {
            out.insert("splatene".into(), paid);
        }
        Some(fragment("zakladne_imanie", Value::Object(out)))
    }
}

/// Partner contributions: "Ing. Tibor Rauch, Vklad: 200 000 Sk, Splatené: 200 000 Sk".
/// Always reported.
pub struct Contributions;

impl Contributions {
    fn parse(line: &str) -> Map<String, Value> {
        let mut out = Map::new();
        let (name, rest) = match DEPOSIT_RE.find(line) {
            Some(m) => (&line[..m.start()], &line[m.end()..]),
            None => (line, ""),
        };
        let name = name.trim().trim_end_matches(',').trim();
        if !name.is_empty() {
            out.insert("name".into(), name.into());
        }

        let (deposit, paid) = match DEPOSIT_PAID_RE.find(rest) {
            Some(m) => (&rest[..m.start()], Some(&rest[m.end()..])),
            None => (rest, None),
        };
        if !deposit.trim().is_empty() {
            out.insert("vklad".into(), amount_or_raw(deposit.trim().trim_end_matches(',')));
        }
        if let Some(paid) = paid.filter(|p| !p.trim().is_empty()) {
            out.insert("splatene".into(), amount_or_raw(paid.trim()));
        }
        out
    }
}

impl SectionExtractor for Contributions {
    fn extract(&self, input: &SectionInput<'_>, _record: &Record) -> Option<Fragment> {
        let list: Vec<Value> = input
            .entries()
            .iter()
            .map(|e| Contributions::parse(&e.line))
            .filter(|m| !m.is_empty())
            .map(Value::Object)
            .collect();
        Some(fragment("vyska_vkladu", Value::Array(list)))
    }
}

/// Share classes, one "Key: value" list per entry; omitted when there are none.
pub struct Shares;

impl Shares {
    fn parse(line: &str) -> Map<String, Value> {
        let mut out = Map::new();
        for item in line.split(',') {
            let Some((key, value)) = item.split_once(':') else {
                continue;
            };
            let key = KEY_RE
                .replace_all(&fold_key(key).replace(' ', "_"), "")
                .into_owned();
            let value = value.trim();
            if key.is_empty() || value.is_empty() {
                continue;
            }
            let value = match key.as_str() {
                "pocet" => Value::String(join_digit_groups(value)),
                "menovita_hodnota" => amount_or_raw(value),
                _ => Value::String(value.to_string()),
            };
            out.insert(key, value);
        }
        out
    }
}

impl SectionExtractor for Shares {
    fn extract(&self, input: &SectionInput<'_>, _record: &Record) -> Option<Fragment> {
        let list: Vec<Value> = input
            .entries()
            .iter()
            .map(|e| Shares::parse(&e.line))
            .filter(|m| !m.is_empty())
            .map(Value::Object)
            .collect();
        (!list.is_empty()).then(|| fragment("akcie", Value::Array(list)))
    }
}
