//! Text clean-up helpers shared by the markup loader and the field parsers.

use std::sync::LazyLock;

use regex::Regex;

static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static WIDE_GAP_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s{2,}").unwrap());
static DECIMAL_COMMA_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d),(\d)").unwrap());
static DIGIT_GROUPS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{1,3}(?: \d{3})+\b").unwrap());
static NON_PLAIN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^A-Za-z0-9\-_ ]").unwrap());

/// Replace every run of whitespace (including `&nbsp;`) with one space and trim.
pub fn collapse_whitespace(text: &str) -> String {
    let text = text.replace("&nbsp;", " ");
    WHITESPACE_RE.replace_all(&text, " ").trim().to_string()
}

/// Remove whitespace entirely, e.g. "36 294 268" -> "36294268".
pub fn strip_all_whitespace(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace() && *c != '\u{a0}')
        .collect()
}

/// Map accented Latin letters to plain ASCII. With `strip_extra`, anything
/// outside `[A-Za-z0-9-_ ]` is dropped afterwards.
pub fn fold_accents(text: &str, strip_extra: bool) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match fold_char(c) {
            Some(rep) => out.push_str(rep),
            None => out.push(c),
        }
    }
    if strip_extra {
        NON_PLAIN_RE.replace_all(&out, "").into_owned()
    } else {
        out
    }
}

fn fold_char(c: char) -> Option<&'static str> {
    let rep = match c {
        // sk / cz consonants
        'š' | 'ś' => "s",
        'Š' | 'Ś' => "S",
        'ž' | 'ź' | 'ż' => "z",
        'Ž' | 'Ź' | 'Ż' => "Z",
        'ť' => "t",
        'Ť' => "T",
        'ľ' | 'ĺ' | 'ł' => "l",
        'Ľ' | 'Ĺ' | 'Ł' => "L",
        'č' | 'ć' => "c",
        'Č' | 'Ć' => "C",
        'ŕ' | 'ř' => "r",
        'Ŕ' | 'Ř' => "R",
        'ň' | 'ń' => "n",
        'Ň' | 'Ń' => "N",
        'ď' => "d",
        'Ď' => "D",
        // vowels
        'á' | 'ä' | 'ą' => "a",
        'Á' | 'Ä' | 'Ą' => "A",
        'é' | 'ě' | 'ę' => "e",
        'É' | 'Ě' | 'Ę' => "E",
        'í' => "i",
        'Í' => "I",
        'ó' | 'ô' | 'ö' | 'ő' => "o",
        'Ó' | 'Ô' | 'Ö' | 'Ő' => "O",
        'ú' | 'ů' | 'ü' | 'ű' => "u",
        'Ú' | 'Ů' | 'Ü' | 'Ű' => "U",
        'ý' => "y",
        'Ý' => "Y",
        'ß' => "ss",
        _ => return None,
    };
    Some(rep)
}

/// Lowercased, accent-free form used for label comparisons.
pub fn fold_key(text: &str) -> String {
    fold_accents(&collapse_whitespace(text), false).to_lowercase()
}

/// Rejoin words rendered as spaced-out letters, e.g. "N o v á k" -> "Novák".
///
/// Only runs of at least four single-character tokens are joined. Runs of two
/// or more spaces are kept as word boundaries.
pub fn close_up_spaced_letters(text: &str) -> String {
    WIDE_GAP_RE
        .split(text.trim())
        .map(close_up_segment)
        .collect::<Vec<_>>()
        .join(" ")
}

fn close_up_segment(segment: &str) -> String {
    let tokens: Vec<&str> = segment.split(' ').filter(|t| !t.is_empty()).collect();
    let mut words: Vec<String> = Vec::with_capacity(tokens.len());
    let mut i = 0;

    while i < tokens.len() {
        let run = tokens[i..]
            .iter()
            .take_while(|t| is_single_letter(t))
            .count();
        if run >= 4 {
            words.push(tokens[i..i + run].concat());
            i += run;
        } else {
            words.push(tokens[i].to_string());
            i += 1;
        }
    }

    words.join(" ")
}

fn is_single_letter(token: &str) -> bool {
    let mut chars = token.chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if c.is_alphabetic())
}

/// Rewrite "1 234,50" as "1 234.50"; only commas with digits on both sides move.
pub fn normalize_decimal_comma(text: &str) -> String {
    DECIMAL_COMMA_RE.replace_all(text, "$1.$2").into_owned()
}

/// Drop thousands-separator spaces inside numbers: "6 972 989 EUR" -> "6972989 EUR".
pub fn join_digit_groups(text: &str) -> String {
    DIGIT_GROUPS_RE
        .replace_all(text, |caps: &regex::Captures| caps[0].replace(' ', ""))
        .into_owned()
}

/// Join the fragments of a multi-line cell into one comma separated line.
///
/// Decimal commas become points, other commas inside a fragment are removed,
/// and an empty fragment (a `<br>`) becomes a field separator.
pub fn join_fragments<'a, I>(fragments: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut out = String::new();
    for fragment in fragments {
        let cleaned = normalize_decimal_comma(&collapse_whitespace(fragment)).replace(',', "");
        if cleaned.is_empty() {
            out.push_str(", ");
        } else {
            out.push(' ');
            out.push_str(&cleaned);
        }
    }
    collapse_whitespace(&out)
        .trim_matches(|c: char| c == ' ' || c == ',' || c == '\t' || c == '\n')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapse_handles_nbsp() {
        assert_eq!(collapse_whitespace("  Obchodné&nbsp;meno:\u{a0}\n x "), "Obchodné meno: x");
    }

    #[test]
    fn strip_all() {
        assert_eq!(strip_all_whitespace(" 36 294\u{a0}268 "), "36294268");
    }

    #[test]
    fn fold_slovak_and_neighbours() {
        assert_eq!(fold_accents("Štatutárny orgán", false), "Statutarny organ");
        assert_eq!(fold_accents("Říčany Győr Łódź Müller", false), "Ricany Gyor Lodz Muller");
    }

    #[test]
    fn fold_strip_extra() {
        assert_eq!(fold_accents("Pšn (štátny)", true), "Psn statny");
    }

    #[test]
    fn fold_is_idempotent() {
        for sample in ["Ďalšie právne skutočnosti", "Łódź, ß-straße", "already plain", "Žilina 010 01"] {
            for strip in [false, true] {
                let once = fold_accents(sample, strip);
                assert_eq!(fold_accents(&once, strip), once);
            }
        }
    }

    #[test]
    fn spaced_letters_rejoined() {
        assert_eq!(close_up_spaced_letters("Ing. N o v á k"), "Ing. Novák");
        assert_eq!(close_up_spaced_letters("J o z e f  N o v á k"), "Jozef Novák");
    }

    #[test]
    fn short_runs_untouched() {
        assert_eq!(close_up_spaced_letters("Ján A B Novák"), "Ján A B Novák");
        assert_eq!(close_up_spaced_letters("a s"), "a s");
    }

    #[test]
    fn decimal_comma() {
        assert_eq!(normalize_decimal_comma("1 234,50 EUR"), "1 234.50 EUR");
        assert_eq!(normalize_decimal_comma("Bratislava, 821 04"), "Bratislava, 821 04");
    }

    #[test]
    fn digit_groups() {
        assert_eq!(join_digit_groups("6 972 989 EUR"), "6972989 EUR");
        assert_eq!(join_digit_groups("Bratislava 821 04"), "Bratislava 821 04");
    }

    #[test]
    fn fragments_joined() {
        let parts = ["Ing. Ján Novák", "", "Hlavná", "5", "", "Bratislava, mesto", "821 04", ""];
        assert_eq!(join_fragments(parts), "Ing. Ján Novák, Hlavná 5, Bratislava mesto 821 04");
    }

    #[test]
    fn fragments_keep_decimals() {
        assert_eq!(join_fragments(["Vklad:", "33,19 EUR", "", "Splatené:", "33,19 EUR"]), "Vklad: 33.19 EUR, Splatené: 33.19 EUR");
    }
}
