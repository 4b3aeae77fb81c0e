//! Core business logic abstractions

pub mod config;
pub mod error;
pub mod log;
pub mod rates;
pub mod source;

// Re-export main types for cleaner imports
pub use error::RateError;
pub use rates::{Conversion, CurrencyEntry, RateQuote, RateTable, Trend};
pub use source::RateSource;
