//! Parser for the central bank daily rates document.
//!
//! The document looks like:
//!
//! ```xml
//! <ValCurs Date="17.10.2026" name="Foreign Currency Market">
//!   <Valute ID="R01235">
//!     <NumCode>840</NumCode>
//!     <CharCode>USD</CharCode>
//!     <Nominal>1</Nominal>
//!     <Name>Доллар США</Name>
//!     <Value>81,2125</Value>
//!   </Valute>
//! </ValCurs>
//! ```

use crate::core::{CurrencyEntry, RateError, RateTable};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct ValCurs {
    #[serde(rename = "@Date", default)]
    date: Option<String>,
    #[serde(rename = "Valute", default)]
    valutes: Vec<Valute>,
}

#[derive(Debug, Deserialize)]
struct Valute {
    #[serde(rename = "CharCode")]
    char_code: String,
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Nominal")]
    nominal: String,
    #[serde(rename = "Value")]
    value: String,
}

/// Parses a decimal written with either a comma or a period separator.
pub fn parse_decimal(text: &str) -> Option<Decimal> {
    text.trim().replace(',', ".").parse::<Decimal>().ok()
}

fn parse_entry(valute: Valute) -> Result<CurrencyEntry, RateError> {
    let code = valute.char_code.trim().to_string();

    let nominal = valute
        .nominal
        .trim()
        .parse::<u32>()
        .ok()
        .filter(|n| *n > 0)
        .ok_or_else(|| {
            RateError::MalformedData(format!(
                "invalid nominal '{}' for {code}",
                valute.nominal
            ))
        })?;

    let value = parse_decimal(&valute.value)
        .filter(|v| *v > Decimal::ZERO)
        .ok_or_else(|| {
            RateError::MalformedData(format!("invalid value '{}' for {code}", valute.value))
        })?;

    Ok(CurrencyEntry {
        code,
        name: valute.name.trim().to_string(),
        nominal,
        value,
    })
}

pub fn parse_rate_table(document: &str) -> Result<RateTable, RateError> {
    let val_curs: ValCurs = quick_xml::de::from_str(document)
        .map_err(|e| RateError::MalformedData(format!("failed to parse XML: {e}")))?;

    let entries = val_curs
        .valutes
        .into_iter()
        .map(parse_entry)
        .collect::<Result<Vec<_>, _>>()?;
    let table = RateTable {
        date: val_curs.date,
        entries,
    };

    if table.is_empty() {
        return Err(RateError::MalformedData(
            "document contains no currency entries".to_string(),
        ));
    }

    debug!(count = table.len(), date = ?table.date, "Parsed rate table");
    Ok(table)
}
