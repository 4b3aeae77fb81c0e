//! Exchange rate types shared by the store, the bot and the CLI

use chrono::{DateTime, Local};
use rust_decimal::Decimal;
use std::fmt::Display;

/// One quoted currency: `value` roubles per `nominal` units of `code`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrencyEntry {
    pub code: String,
    pub name: String,
    pub nominal: u32,
    pub value: Decimal,
}

impl CurrencyEntry {
    /// Price of a single unit of the currency.
    pub fn unit_value(&self) -> Decimal {
        self.value / Decimal::from(self.nominal)
    }
}

impl Display for CurrencyEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - {}", self.code, self.name)
    }
}

/// A parsed snapshot of the feed, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateTable {
    /// Quote date as published in the document, e.g. `17.10.2026`.
    pub date: Option<String>,
    pub entries: Vec<CurrencyEntry>,
}

impl RateTable {
    pub fn find(&self, code: &str) -> Option<&CurrencyEntry> {
        self.entries.iter().find(|entry| entry.code == code)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Up,
    Down,
    Flat,
}

impl Trend {
    pub fn from_delta(delta: Decimal) -> Self {
        if delta > Decimal::ZERO {
            Trend::Up
        } else if delta < Decimal::ZERO {
            Trend::Down
        } else {
            Trend::Flat
        }
    }
}

/// Result of a rate query, including the change since the previous query.
#[derive(Debug, Clone, PartialEq)]
pub struct RateQuote {
    pub code: String,
    pub name: String,
    pub nominal: u32,
    pub value: Decimal,
    pub delta: Decimal,
    pub is_stale: bool,
    pub updated_at: DateTime<Local>,
}

impl RateQuote {
    pub fn trend(&self) -> Trend {
        Trend::from_delta(self.delta)
    }
}

/// Result of converting an amount of a currency into roubles.
#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    pub code: String,
    pub name: String,
    pub amount: Decimal,
    pub result: Decimal,
}
