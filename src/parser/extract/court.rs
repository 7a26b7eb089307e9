use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::warn;

use crate::parser::blocks::SectionInput;
use crate::parser::sections::SectionExtractor;
use crate::record::{
    Fragment, Record, TYP_OSOBY_FYZICKA, TYP_OSOBY_PRAVNICKA, TYP_SUDU_MESTSKY, TYP_SUDU_OKRESNY,
};
use crate::text::{collapse_whitespace, fold_key};

static COURT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bs[úu]du\s+(.+)$").unwrap());
static SECTION_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)oddiel\s*:\s*(\S+)").unwrap());
static INSERT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)vlo[žz]ka(?:\s+[čc][íi]slo)?\s*:\s*(\S+)").unwrap());

/// "Výpis z Obchodného registra Okresného súdu Banská Bystrica".
pub struct Court;

impl SectionExtractor for Court {
    fn extract(&self, input: &SectionInput<'_>, _record: &Record) -> Option<Fragment> {
        let label = collapse_whitespace(input.label);
        let mut out = Fragment::new();

        let kind = if fold_key(&label).contains("mestsk") {
            TYP_SUDU_MESTSKY
        } else {
            TYP_SUDU_OKRESNY
        };

        match COURT_RE.captures(&label) {
            Some(caps) => {
                out.insert("prislusny_sud".into(), caps[1].trim().into());
                out.insert("typ_sudu".into(), kind.into());
            }
            None => warn!(label = %label, "court name not found"),
        }
        Some(out)
    }
}

/// Register category inferred from the section ("oddiel") code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Company,
    Cooperative,
    Enterprise,
    SoleTrader,
}

impl EntityKind {
    pub fn from_section(code: &str) -> EntityKind {
        let code = fold_key(code);
        if code.contains("firm") {
            EntityKind::SoleTrader
        } else if code.contains("dr") {
            EntityKind::Cooperative
        } else if code.contains("psn") {
            EntityKind::Enterprise
        } else {
            EntityKind::Company
        }
    }

    pub fn typ_osoby(self) -> &'static str {
        match self {
            EntityKind::SoleTrader => TYP_OSOBY_FYZICKA,
            _ => TYP_OSOBY_PRAVNICKA,
        }
    }

    fn subject(self) -> &'static str {
        match self {
            EntityKind::Company => "Spoločnosť zapísaná",
            EntityKind::Cooperative => "Družstvo zapísané",
            EntityKind::Enterprise => "Podnik zapísaný",
            EntityKind::SoleTrader => "Fyzická osoba zapísaná",
        }
    }
}

/// The court as the header text names it.
struct CourtRef<'a> {
    name: &'a str,
    city_court: bool,
}

impl CourtRef<'_> {
    fn genitive(&self) -> &'static str {
        if self.city_court {
            "Mestského súdu"
        } else {
            "Okresného súdu"
        }
    }

    fn short(&self) -> &'static str {
        if self.city_court {
            "MS"
        } else {
            "OS"
        }
    }
}

/// "Oddiel: Sro ... Vložka číslo: 8429/S" -> section, insert and header text.
pub struct Registration;

impl SectionExtractor for Registration {
    fn extract(&self, input: &SectionInput<'_>, record: &Record) -> Option<Fragment> {
        let text = collapse_whitespace(&format!("{} {}", input.label, input.value_text()));
        let section = SECTION_RE.captures(&text).map(|c| c[1].to_string());
        let insert = INSERT_RE.captures(&text).map(|c| c[1].to_string());

        let mut out = Fragment::new();
        let Some(section) = section.filter(|s| !s.is_empty()) else {
            warn!(text = %text, "section code not found");
            return insert.map(|i| crate::record::fragment("vlozka", i));
        };
        let kind = EntityKind::from_section(&section);

        out.insert("oddiel".into(), section.clone().into());
        if let Some(insert) = &insert {
            out.insert("vlozka".into(), insert.clone().into());
        }
        out.insert("typ_osoby".into(), kind.typ_osoby().into());

        let Some(name) = record.get_str("prislusny_sud") else {
            warn!("court not extracted before the section block, header skipped");
            return Some(out);
        };
        let court = CourtRef {
            name,
            city_court: record.get_str("typ_sudu") == Some(TYP_SUDU_MESTSKY),
        };
        let (full, short) = header(kind, &court, &section, insert.as_deref().unwrap_or_default());
        out.insert("hlavicka".into(), Value::String(full));
        out.insert("hlavicka_kratka".into(), Value::String(short));

        Some(out)
    }
}

fn header(kind: EntityKind, court: &CourtRef<'_>, section: &str, insert: &str) -> (String, String) {
    let registry = format!("{} v obchodnom registri {} {}", kind.subject(), court.genitive(), court.name);
    match kind {
        EntityKind::Company => (
            format!("{registry}, oddiel {section}, vložka {insert}."),
            format!("{} {}, oddiel {section}, vložka {insert}", court.short(), court.name),
        ),
        _ => (
            format!("{registry}, vložka {insert}."),
            format!("{} {}, vložka {insert}", court.short(), court.name),
        ),
    }
}
