//! Abstraction over where the rate document comes from

use super::error::RateError;
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait RateSource: Send + Sync {
    /// Fetches the raw rate document as text.
    async fn fetch_document(&self) -> Result<String, RateError>;
}

#[async_trait]
impl<T: RateSource + ?Sized> RateSource for Arc<T> {
    async fn fetch_document(&self) -> Result<String, RateError> {
        (**self).fetch_document().await
    }
}
