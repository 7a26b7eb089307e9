use std::sync::LazyLock;

use tracing::debug;

use super::blocks::{collect_blocks, SectionInput};
use super::extract::{address, capital, court, events, name, persons, scalar};
use crate::markup::Document;
use crate::record::{Fragment, Record};
use crate::text::fold_key;

/// One extraction routine. `record` holds every fragment merged so far, so a
/// routine can read what earlier blocks produced (the court name, say).
pub trait SectionExtractor: Send + Sync {
    fn extract(&self, input: &SectionInput<'_>, record: &Record) -> Option<Fragment>;
}

pub struct LabelRule {
    pub label: &'static str,
    pub extractor: &'static dyn SectionExtractor,
}

/// Checked top to bottom; the first label contained in a block's label wins.
pub static LABEL_RULES: &[LabelRule] = &[
    LabelRule { label: "Výpis z Obchodného registra", extractor: &court::Court },
    LabelRule { label: "Oddiel", extractor: &court::Registration },
    LabelRule { label: "Obchodné meno", extractor: &name::CompanyName },
    LabelRule { label: "Sídlo", extractor: &address::Seat },
    LabelRule { label: "Bydlisko", extractor: &address::Seat },
    LabelRule { label: "IČO", extractor: &scalar::ICO },
    LabelRule { label: "Deň zápisu", extractor: &scalar::REGISTERED_ON },
    LabelRule { label: "Deň výmazu", extractor: &scalar::DELETED_ON },
    LabelRule { label: "Dôvod výmazu", extractor: &scalar::DELETION_REASON },
    LabelRule { label: "Právna forma", extractor: &scalar::LEGAL_FORM },
    LabelRule { label: "Predmet činnosti", extractor: &scalar::ACTIVITIES },
    LabelRule { label: "Spoločníci", extractor: &persons::Partners },
    LabelRule { label: "Výška vkladu", extractor: &capital::Contributions },
    LabelRule { label: "Štatutárny orgán", extractor: &persons::StatutoryBody },
    LabelRule { label: "Likvidátor", extractor: &persons::Liquidators },
    LabelRule { label: "Likvidácia", extractor: &scalar::LIQUIDATION },
    LabelRule { label: "Zastupovanie", extractor: &scalar::REPRESENTATION },
    LabelRule { label: "Konanie menom spoločnosti", extractor: &scalar::ACTING },
    LabelRule { label: "Základné imanie", extractor: &capital::RegisteredCapital },
    LabelRule { label: "Akcie", extractor: &capital::Shares },
    LabelRule { label: "Dozorná rada", extractor: &persons::SupervisoryBoard },
    LabelRule { label: "Ďalšie právne skutočnosti", extractor: &events::LegalFacts },
    LabelRule { label: "Dátum aktualizácie", extractor: &scalar::UPDATED_ON },
    LabelRule { label: "Dátum výpisu", extractor: &scalar::EXTRACTED_ON },
];

static FOLDED_LABELS: LazyLock<Vec<(String, &'static LabelRule)>> =
    LazyLock::new(|| LABEL_RULES.iter().map(|rule| (fold_key(rule.label), rule)).collect());

/// First rule whose label occurs in `label`, ignoring case and accents.
pub fn match_label(label: &str) -> Option<&'static LabelRule> {
    let folded = fold_key(label);
    FOLDED_LABELS
        .iter()
        .find(|(key, _)| folded.contains(key.as_str()))
        .map(|(_, rule)| *rule)
}

/// Dispatch every labelled block once and fold the fragments into a record.
pub fn extract_record(doc: &Document, skip_blocks: usize) -> Record {
    collect_blocks(doc, skip_blocks)
        .iter()
        .fold(Record::new(), |record, block| {
            let Some(rule) = match_label(&block.label) else {
                debug!(label = %block.label, "no routine for label");
                return record;
            };
            debug!(label = %block.label, rule = rule.label, "dispatching block");
            match rule.extractor.extract(&SectionInput::new(block), &record) {
                Some(fragment) if !fragment.is_empty() => record.merge(fragment),
                _ => record,
            }
        })
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_match_loosely() {
        assert_eq!(match_label("Obchodné meno:").map(|r| r.label), Some("Obchodné meno"));
        assert_eq!(match_label("OBCHODNE MENO").map(|r| r.label), Some("Obchodné meno"));
        assert_eq!(match_label("Oddiel: Sro").map(|r| r.label), Some("Oddiel"));
        assert_eq!(
            match_label("Výpis z Obchodného registra Okresného súdu Bratislava I").map(|r| r.label),
            Some("Výpis z Obchodného registra")
        );
        assert!(match_label("Vyhľadávanie").is_none());
    }

    #[test]
    fn liquidator_and_liquidation_are_distinct() {
        assert_eq!(match_label("Likvidátor:").map(|r| r.label), Some("Likvidátor"));
        assert_eq!(match_label("Likvidácia:").map(|r| r.label), Some("Likvidácia"));
    }

    #[test]
    fn first_rule_wins() {
        // contains both "Obchodné meno" and "Sídlo"; the earlier rule is used
        assert_eq!(match_label("Obchodné meno a sídlo").map(|r| r.label), Some("Obchodné meno"));
    }

    #[test]
    fn dates_at_the_bottom() {
        assert_eq!(match_label("Dátum aktualizácie údajov:").map(|r| r.label), Some("Dátum aktualizácie"));
        assert_eq!(match_label("Dátum výpisu:").map(|r| r.label), Some("Dátum výpisu"));
    }
}
