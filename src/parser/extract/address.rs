use tracing::debug;

use crate::parser::blocks::SectionInput;
use crate::parser::fields::parse_address;
use crate::parser::sections::SectionExtractor;
use crate::record::{fragment, Fragment, Record};

/// Registered office or residence; both land under `adresa`.
pub struct Seat;

impl SectionExtractor for Seat {
    fn extract(&self, input: &SectionInput<'_>, _record: &Record) -> Option<Fragment> {
        let entry = input.current_entry()?;
        let address = parse_address(&entry.line);
        if address.zip.is_empty() && address.street.is_empty() {
            debug!(line = %entry.line, "address without street or postal code");
        }
        let value = serde_json::to_value(address).ok()?;
        Some(fragment("adresa", value))
    }
}
