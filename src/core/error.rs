//! Error taxonomy for fetching and serving exchange rates

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RateError {
    #[error("Request to rate source failed: {0}")]
    Network(String),

    #[error("Rate source returned an empty response")]
    EmptyResponse,

    #[error("Malformed rate document: {0}")]
    MalformedData(String),

    #[error("Currency '{0}' not found")]
    CurrencyNotFound(String),

    #[error("Exchange rate data is unavailable")]
    DataUnavailable,

    #[error("Invalid amount: '{0}'")]
    InvalidAmount(String),

    #[error("Invalid currency code: '{0}'")]
    InvalidCurrencyFormat(String),
}
