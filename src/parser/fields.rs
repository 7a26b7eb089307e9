//! Positional field splitting and the per-field fix-ups applied afterwards.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::text::collapse_whitespace;

/// Token that sometimes stands where an address is expected.
pub static RESIDENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^trval[ýy]\s+pobyt").unwrap());

static LEADING_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d[0-9A-Za-z/]{0,4})\s+(\D.*)$").unwrap());
static TRAILING_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*?\D)\s+(\d[\d /\-]*[A-Za-z]?)$").unwrap());
static BARE_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d[\d /\-]*[A-Za-z]?").unwrap());
static HOUSE_MARK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bč\.\s*").unwrap());
static ZIP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.*?)\s*\b(\d{3}) ?(\d{2})\b(?:\s+(\D.*))?$").unwrap()
});
static FOREIGN_ZIP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+?)\s+([A-Z]{1,3}-[0-9A-Z][0-9A-Z ]*)$").unwrap());

const ROLE_WORDS: &[&str] = &[
    "predseda",
    "podpredseda",
    "člen",
    "clen",
    "konateľ",
    "konatel",
    "riaditeľ",
    "riaditel",
    "prokurista",
    "likvidátor",
    "likvidator",
    "vedúci",
    "veduci",
    "správca",
    "spravca",
];

pub type FieldMap = BTreeMap<String, String>;

/// Split `line` on `separator` and hand the tokens to `names` left to right.
///
/// Tokens matching `skip` are dropped first; empty tokens keep their slot, so
/// "a,,c" gives the middle name "". Surplus tokens are discarded and names
/// without a token are left out of the result.
pub fn split_fields(line: &str, names: &[&str], separator: &str, skip: Option<&Regex>) -> FieldMap {
    let tokens = line
        .split(separator)
        .map(str::trim)
        .filter(|t| t.is_empty() || skip.map_or(true, |re| !re.is_match(t)));

    names
        .iter()
        .zip(tokens)
        .map(|(name, token)| (name.to_string(), token.to_string()))
        .collect()
}

/// "Ing. Vladislav Šustr - predseda predstavenstva" -> name + function.
///
/// Hyphenated surnames stay whole: the part before the dash needs two words
/// and the part after it has to read like a role.
pub fn split_name_function(text: &str) -> (String, Option<String>) {
    let text = collapse_whitespace(text);
    let Some((head, tail)) = text.split_once(" - ").or_else(|| text.split_once('-')) else {
        return (text, None);
    };
    let (head, tail) = (head.trim(), tail.trim());

    if head.split_whitespace().count() >= 2 && !tail.is_empty() && looks_like_role(tail) {
        (head.trim_end_matches(',').trim().to_string(), Some(tail.to_string()))
    } else {
        (text, None)
    }
}

/// A known role word, or a lowercase first word longer than three letters
/// (so particles like "van" or "de" in a surname do not count).
fn looks_like_role(text: &str) -> bool {
    let lower = text.to_lowercase();
    if ROLE_WORDS.iter().any(|w| lower.contains(w)) {
        return true;
    }
    let first = text.split_whitespace().next().unwrap_or_default();
    first.chars().count() > 3 && first.chars().all(|c| c.is_alphabetic() && c.is_lowercase())
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StreetNumber {
    pub street: String,
    pub number: String,
}

/// Separate the house number from a street line.
///
/// Tried in order: leading short number token, trailing number token,
/// anything with letters left (street kept, no number), digits only (the
/// line is read as a bare number). A "č." house-number marker is dropped first.
pub fn split_street_number(line: &str) -> StreetNumber {
    let line = collapse_whitespace(&HOUSE_MARK_RE.replace_all(line, " "));

    if let Some(caps) = LEADING_NUMBER_RE.captures(&line) {
        return StreetNumber {
            street: caps[2].trim().to_string(),
            number: caps[1].trim().to_string(),
        };
    }
    if let Some(caps) = TRAILING_NUMBER_RE.captures(&line) {
        return StreetNumber {
            street: caps[1].trim().to_string(),
            number: caps[2].trim().to_string(),
        };
    }
    if !has_digit(&line) || line.chars().any(char::is_alphabetic) {
        return StreetNumber { street: line, number: String::new() };
    }
    let number = BARE_NUMBER_RE
        .find(&line)
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default();
    StreetNumber { street: String::new(), number }
}

pub fn has_digit(text: &str) -> bool {
    text.chars().any(|c| c.is_ascii_digit())
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CityZip {
    pub city: String,
    pub zip: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,
}

/// "Bratislava 821 04" -> city "Bratislava", zip "82104".
///
/// Falls back to a trailing hyphenated code ("Wien A-1010"); without any
/// postal code the whole text is the city.
pub fn split_city_zip(text: &str) -> CityZip {
    let text = collapse_whitespace(text);

    if let Some(caps) = ZIP_RE.captures(&text) {
        return CityZip {
            city: caps[1].trim().to_string(),
            zip: format!("{}{}", &caps[2], &caps[3]),
            district: caps.get(4).map(|m| m.as_str().trim().to_string()),
        };
    }
    if let Some(caps) = FOREIGN_ZIP_RE.captures(&text) {
        return CityZip {
            city: caps[1].trim().to_string(),
            zip: caps[2].trim().to_string(),
            district: None,
        };
    }
    CityZip { city: text, zip: String::new(), district: None }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Address {
    pub street: String,
    pub number: String,
    pub city: String,
    pub zip: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

impl Address {
    pub fn is_blank(&self) -> bool {
        self.street.is_empty() && self.number.is_empty() && self.city.is_empty() && self.zip.is_empty()
    }

    /// Fill street/number and city/zip from the raw street and city tokens.
    ///
    /// Without a city token, a street token carrying no digits is a bare
    /// place name: street and number stay empty and the text becomes the city.
    pub fn from_parts(street: Option<&str>, city: Option<&str>, country: Option<&str>) -> Address {
        let mut address = Address {
            country: country.filter(|c| !c.is_empty()).map(str::to_string),
            ..Address::default()
        };

        let mut place = None;
        if let Some(street) = street.filter(|s| !s.is_empty()) {
            if has_digit(street) {
                let sn = split_street_number(street);
                address.street = sn.street;
                address.number = sn.number;
            } else {
                place = Some(collapse_whitespace(street));
            }
        }

        match city.filter(|c| !c.is_empty()) {
            Some(city) => {
                let cz = split_city_zip(city);
                address.city = cz.city;
                address.zip = cz.zip;
                address.district = cz.district;
                // no house number, so the first token was the street after all
                if let Some(place) = place {
                    address.street = place;
                }
            }
            None => {
                if let Some(place) = place {
                    address.city = place;
                }
            }
        }

        address
    }
}

/// Parse a one-line address "street number, city zip[, country]".
pub fn parse_address(line: &str) -> Address {
    let parts = split_fields(line, &["street", "city", "country"], ",", Some(&RESIDENCE_RE));
    let mut address = Address::from_parts(
        parts.get("street").map(String::as_str),
        parts.get("city").map(String::as_str),
        parts.get("country").map(String::as_str),
    );
    if address.is_blank() && !line.trim().is_empty() {
        address.city = collapse_whitespace(line);
    }
    address
}
