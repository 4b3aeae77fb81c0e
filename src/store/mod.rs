//! Shared exchange rate cache and conversion engine.

pub mod cache;

use crate::core::{Conversion, CurrencyEntry, RateError, RateQuote, RateSource, RateTable};
use crate::providers::feed::{parse_decimal, parse_rate_table};
use cache::{CacheState, Snapshot};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, instrument, warn};

/// Serves rates from a single cached table, refreshing it once `ttl` has elapsed.
///
/// A failed refresh never discards the cached table: callers keep getting the
/// last known rates (flagged as stale) until a fetch succeeds again. Only when
/// nothing was ever fetched do operations report [`RateError::DataUnavailable`].
pub struct RateStore {
    source: Box<dyn RateSource>,
    ttl: Duration,
    state: RwLock<CacheState>,
    // Serializes refreshes; the state lock is never held across a fetch
    refresh: Mutex<()>,
}

impl RateStore {
    pub fn new(source: impl RateSource + 'static, ttl: Duration) -> Self {
        Self {
            source: Box::new(source),
            ttl,
            state: RwLock::new(CacheState::new()),
            refresh: Mutex::new(()),
        }
    }

    /// Fetches and parses a new table, replacing the cached one on success.
    pub async fn fetch(&self) -> Result<Arc<RateTable>, RateError> {
        self.refresh_snapshot().await.map(|snapshot| snapshot.table)
    }

    #[instrument(name = "RateRefresh", skip(self))]
    async fn refresh_snapshot(&self) -> Result<Snapshot, RateError> {
        let document = self.source.fetch_document().await?;
        // Whitespace-only bodies count as empty whatever the source
        if document.trim().is_empty() {
            return Err(RateError::EmptyResponse);
        }

        let table = parse_rate_table(&document)?;
        let snapshot = self.state.write().await.replace(table);
        info!(
            entries = snapshot.table.entries.len(),
            date = ?snapshot.table.date,
            "Exchange rates refreshed"
        );
        Ok(snapshot)
    }

    async fn ensure_fresh(&self) -> Option<Snapshot> {
        if let Some(snapshot) = self.state.read().await.fresh(self.ttl) {
            return Some(snapshot);
        }

        let current = self.state.read().await.current();
        let _guard = match self.refresh.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                if current.is_some() {
                    debug!("Refresh in progress, serving cached rates");
                    return current;
                }
                // Nothing cached yet: wait for the in-flight attempt and take its outcome
                let _guard = self.refresh.lock().await;
                return self.state.read().await.current();
            }
        };

        // Another caller may have refreshed between the checks above
        if let Some(snapshot) = self.state.read().await.fresh(self.ttl) {
            debug!("Rates refreshed by a concurrent caller");
            return Some(snapshot);
        }

        match self.refresh_snapshot().await {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                let current = self.state.read().await.current();
                match &current {
                    Some(stale) => warn!(
                        error = %e,
                        updated_at = %stale.updated_at,
                        "Failed to refresh exchange rates, serving cached data"
                    ),
                    None => warn!(error = %e, "Failed to refresh exchange rates, no data available"),
                }
                current
            }
        }
    }

    fn find(snapshot: &Snapshot, code: &str) -> Result<CurrencyEntry, RateError> {
        snapshot
            .table
            .find(code)
            .cloned()
            .ok_or_else(|| RateError::CurrencyNotFound(code.to_string()))
    }

    /// Current table, refreshed if needed. `None` when no data was ever fetched.
    pub async fn rates(&self) -> Option<Arc<RateTable>> {
        self.ensure_fresh().await.map(|snapshot| snapshot.table)
    }

    /// `"CODE - Name"` for every currency, in document order.
    pub async fn list_currencies(&self) -> Vec<String> {
        self.rates()
            .await
            .map(|table| table.entries.iter().map(ToString::to_string).collect())
            .unwrap_or_default()
    }

    /// Finds `code` (case-sensitive) in the current table.
    pub async fn lookup(&self, code: &str) -> Result<CurrencyEntry, RateError> {
        let snapshot = self.ensure_fresh().await.ok_or(RateError::DataUnavailable)?;
        Self::find(&snapshot, code)
    }

    /// Looks up `code` and reports the change since the previous `get_rate` for it.
    #[instrument(skip(self))]
    pub async fn get_rate(&self, code: &str) -> Result<RateQuote, RateError> {
        let snapshot = self.ensure_fresh().await.ok_or(RateError::DataUnavailable)?;
        let entry = Self::find(&snapshot, code)?;

        let delta = self.state.write().await.observe(&entry.code, entry.value);
        debug!(%delta, "Rate observed");

        Ok(RateQuote {
            code: entry.code,
            name: entry.name,
            nominal: entry.nominal,
            value: entry.value,
            delta,
            is_stale: snapshot.is_stale(self.ttl),
            updated_at: snapshot.updated_at,
        })
    }

    /// Converts `amount_text` units of `code` into the base currency.
    #[instrument(skip(self))]
    pub async fn convert(&self, code: &str, amount_text: &str) -> Result<Conversion, RateError> {
        let amount = parse_decimal(amount_text)
            .filter(|amount| *amount >= Decimal::ZERO)
            .ok_or_else(|| RateError::InvalidAmount(amount_text.to_string()))?;

        // Catches swapped arguments such as `/convert 100 USD`
        if !code.is_empty() && code.chars().all(|c| c.is_ascii_digit()) {
            return Err(RateError::InvalidCurrencyFormat(code.to_string()));
        }

        let entry = self.lookup(code).await?;
        let result = entry
            .unit_value()
            .checked_mul(amount)
            .ok_or_else(|| RateError::InvalidAmount(amount_text.to_string()))?;

        Ok(Conversion {
            code: entry.code,
            name: entry.name,
            amount,
            result,
        })
    }

    pub async fn previous_value(&self, code: &str) -> Option<Decimal> {
        self.state.read().await.previous_value(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Replays canned responses; once exhausted every fetch fails.
    pub struct ScriptedSource {
        responses: std::sync::Mutex<VecDeque<Result<String, RateError>>>,
        delay: Option<Duration>,
        calls: AtomicUsize,
    }

    impl ScriptedSource {
        pub fn new(responses: Vec<Result<String, RateError>>) -> Arc<Self> {
            Arc::new(Self {
                responses: std::sync::Mutex::new(responses.into()),
                delay: None,
                calls: AtomicUsize::new(0),
            })
        }

        pub fn with_delay(responses: Vec<Result<String, RateError>>, delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                responses: std::sync::Mutex::new(responses.into()),
                delay: Some(delay),
                calls: AtomicUsize::new(0),
            })
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RateSource for ScriptedSource {
        async fn fetch_document(&self) -> Result<String, RateError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(RateError::Network("connection refused".to_string())))
        }
    }

    /// Builds a rate document from `(code, nominal, value)` triples.
    pub fn document(entries: &[(&str, u32, &str)]) -> String {
        let valutes: String = entries
            .iter()
            .map(|(code, nominal, value)| {
                format!(
                    "<Valute><CharCode>{code}</CharCode><Nominal>{nominal}</Nominal>\
                     <Name>{code} name</Name><Value>{value}</Value></Valute>"
                )
            })
            .collect();
        format!(r#"<ValCurs Date="17.10.2026">{valutes}</ValCurs>"#)
    }

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    const TTL: Duration = Duration::from_secs(3600);

    fn usd_doc(value: &str) -> Result<String, RateError> {
        Ok(document(&[("USD", 1, value), ("JPY", 100, "61,5")]))
    }

    #[tokio::test]
    async fn test_list_currencies_in_document_order() {
        let source = ScriptedSource::new(vec![usd_doc("90,0")]);
        let store = RateStore::new(Arc::clone(&source), TTL);

        let list = store.list_currencies().await;
        assert_eq!(list, vec!["USD - USD name", "JPY - JPY name"]);
    }

    #[tokio::test]
    async fn test_list_currencies_empty_when_unavailable() {
        let source = ScriptedSource::new(vec![]);
        let store = RateStore::new(Arc::clone(&source), TTL);

        assert!(store.list_currencies().await.is_empty());
        assert!(store.rates().await.is_none());
    }

    #[tokio::test]
    async fn test_fresh_cache_does_not_refetch() {
        let source = ScriptedSource::new(vec![usd_doc("90,0")]);
        let store = RateStore::new(Arc::clone(&source), TTL);

        store.lookup("USD").await.unwrap();
        store.lookup("JPY").await.unwrap();
        store.list_currencies().await;
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_lookup_returns_entry() {
        let source = ScriptedSource::new(vec![usd_doc("90,0")]);
        let store = RateStore::new(Arc::clone(&source), TTL);

        let jpy = store.lookup("JPY").await.unwrap();
        assert_eq!(jpy.nominal, 100);
        assert_eq!(jpy.value, d("61.5"));
        assert!(jpy.nominal > 0 && jpy.value > Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_lookup_unknown_code() {
        let source = ScriptedSource::new(vec![usd_doc("90,0")]);
        let store = RateStore::new(Arc::clone(&source), TTL);

        let result = store.lookup("ZZZ").await;
        assert_eq!(result, Err(RateError::CurrencyNotFound("ZZZ".to_string())));
        assert!(result.unwrap_err().to_string().contains("ZZZ"));

        // Lookups are case-sensitive
        assert!(matches!(
            store.lookup("usd").await,
            Err(RateError::CurrencyNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_unavailable_without_data() {
        let source = ScriptedSource::new(vec![
            Err(RateError::Network("timeout".to_string())),
            Err(RateError::MalformedData("bad".to_string())),
        ]);
        let store = RateStore::new(Arc::clone(&source), TTL);

        assert_eq!(store.lookup("USD").await, Err(RateError::DataUnavailable));
        assert_eq!(store.get_rate("USD").await, Err(RateError::DataUnavailable));
        assert_eq!(
            store.convert("USD", "1").await,
            Err(RateError::DataUnavailable)
        );
        // Every call re-attempts the fetch
        assert_eq!(source.calls(), 3);
    }

    #[tokio::test]
    async fn test_recovers_after_failed_first_fetch() {
        let source = ScriptedSource::new(vec![Err(RateError::EmptyResponse), usd_doc("90,0")]);
        let store = RateStore::new(Arc::clone(&source), TTL);

        assert_eq!(store.lookup("USD").await, Err(RateError::DataUnavailable));
        let usd = store.lookup("USD").await.unwrap();
        assert_eq!(usd.value, d("90"));
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_get_rate_delta_is_lazy_per_code() {
        let source = ScriptedSource::new(vec![usd_doc("90,0"), usd_doc("92,5")]);
        let store = RateStore::new(Arc::clone(&source), Duration::ZERO);

        // TTL of zero refreshes on every call
        let first = store.get_rate("USD").await.unwrap();
        assert_eq!(first.delta, Decimal::ZERO);

        let second = store.get_rate("USD").await.unwrap();
        assert_eq!(second.value, d("92.5"));
        assert_eq!(second.delta, d("2.5"));

        // JPY was never queried before, so it has no previous value
        assert_eq!(store.previous_value("JPY").await, None);
    }

    #[tokio::test]
    async fn test_get_rate_twice_on_same_table_is_flat() {
        let source = ScriptedSource::new(vec![usd_doc("90,0")]);
        let store = RateStore::new(Arc::clone(&source), TTL);

        store.get_rate("USD").await.unwrap();
        let second = store.get_rate("USD").await.unwrap();
        assert_eq!(second.delta, Decimal::ZERO);
        assert_eq!(second.trend(), crate::core::Trend::Flat);
        assert!(!second.is_stale);
    }

    #[tokio::test]
    async fn test_fetch_does_not_touch_previous_values() {
        let source = ScriptedSource::new(vec![usd_doc("90,0"), usd_doc("95,0")]);
        let store = RateStore::new(Arc::clone(&source), TTL);

        store.get_rate("USD").await.unwrap();
        store.fetch().await.unwrap();
        assert_eq!(store.previous_value("USD").await, Some(d("90")));

        let quote = store.get_rate("USD").await.unwrap();
        assert_eq!(quote.delta, d("5"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_table_served_after_failed_refresh() {
        let source = ScriptedSource::new(vec![
            usd_doc("90,0"),
            Err(RateError::Network("timeout".to_string())),
        ]);
        let store = RateStore::new(Arc::clone(&source), TTL);

        let fresh = store.get_rate("USD").await.unwrap();
        assert!(!fresh.is_stale);

        tokio::time::advance(TTL).await;

        let stale = store.get_rate("USD").await.unwrap();
        assert!(stale.is_stale);
        assert_eq!(stale.value, d("90"));
        assert_eq!(stale.updated_at, fresh.updated_at);
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_after_ttl_replaces_table() {
        let source = ScriptedSource::new(vec![usd_doc("90,0"), usd_doc("91,0")]);
        let store = RateStore::new(Arc::clone(&source), TTL);

        assert_eq!(store.lookup("USD").await.unwrap().value, d("90"));
        tokio::time::advance(TTL + Duration::from_secs(1)).await;

        let quote = store.get_rate("USD").await.unwrap();
        assert_eq!(quote.value, d("91"));
        assert!(!quote.is_stale);
    }

    #[tokio::test]
    async fn test_bad_documents_never_replace_valid_table() {
        let source = ScriptedSource::new(vec![
            usd_doc("90,0"),
            Ok(String::new()),
            Ok(" \r\n\t".to_string()),
            Ok("<html><body>maintenance</body></html>".to_string()),
            Ok("garbage".to_string()),
        ]);
        let store = RateStore::new(Arc::clone(&source), TTL);
        store.fetch().await.unwrap();

        assert_eq!(store.fetch().await, Err(RateError::EmptyResponse));
        assert_eq!(store.fetch().await, Err(RateError::EmptyResponse));
        assert!(matches!(store.fetch().await, Err(RateError::MalformedData(_))));
        assert!(matches!(store.fetch().await, Err(RateError::MalformedData(_))));

        assert_eq!(store.lookup("USD").await.unwrap().value, d("90"));
    }

    #[tokio::test]
    async fn test_convert() {
        let source = ScriptedSource::new(vec![usd_doc("90")]);
        let store = RateStore::new(Arc::clone(&source), TTL);

        let conversion = store.convert("USD", "100").await.unwrap();
        assert_eq!(conversion.result, d("9000"));
        assert_eq!(format!("{:.2}", conversion.result.round_dp(2)), "9000.00");
        assert_eq!(conversion.amount, d("100"));
        assert_eq!(conversion.name, "USD name");
    }

    #[tokio::test]
    async fn test_convert_honours_nominal_and_comma() {
        let source = ScriptedSource::new(vec![Ok(document(&[("HUF", 10, "25,0")]))]);
        let store = RateStore::new(Arc::clone(&source), TTL);

        let conversion = store.convert("HUF", "4,0").await.unwrap();
        assert_eq!(conversion.result, d("10"));
    }

    #[tokio::test]
    async fn test_convert_rejects_bad_input_without_fetching() {
        let source = ScriptedSource::new(vec![]);
        let store = RateStore::new(Arc::clone(&source), TTL);

        assert_eq!(
            store.convert("USD", "-5").await,
            Err(RateError::InvalidAmount("-5".to_string()))
        );
        assert_eq!(
            store.convert("USD", "abc").await,
            Err(RateError::InvalidAmount("abc".to_string()))
        );
        assert_eq!(
            store.convert("123", "100").await,
            Err(RateError::InvalidCurrencyFormat("123".to_string()))
        );
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn test_convert_only_treats_ascii_digits_as_swapped_arguments() {
        let source = ScriptedSource::new(vec![usd_doc("90")]);
        let store = RateStore::new(Arc::clone(&source), TTL);

        assert_eq!(
            store.convert("Ⅻ", "1").await,
            Err(RateError::CurrencyNotFound("Ⅻ".to_string()))
        );
        assert_eq!(
            store.convert("½", "1").await,
            Err(RateError::CurrencyNotFound("½".to_string()))
        );
    }

    #[tokio::test]
    async fn test_convert_errors_propagate_unchanged() {
        let source = ScriptedSource::new(vec![usd_doc("90")]);
        let store = RateStore::new(Arc::clone(&source), TTL);

        assert_eq!(
            store.convert("ZZZ", "1").await,
            Err(RateError::CurrencyNotFound("ZZZ".to_string()))
        );
        assert!(store.convert("USD", "0").await.is_ok());
    }

    #[tokio::test]
    async fn test_convert_does_not_update_previous_values() {
        let source = ScriptedSource::new(vec![usd_doc("90")]);
        let store = RateStore::new(Arc::clone(&source), TTL);

        store.convert("USD", "10").await.unwrap();
        assert_eq!(store.previous_value("USD").await, None);
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_fetch() {
        let source = ScriptedSource::with_delay(vec![usd_doc("90")], Duration::from_millis(20));
        let store = RateStore::new(Arc::clone(&source), TTL);

        let (usd, jpy, list) = tokio::join!(
            store.lookup("USD"),
            store.lookup("JPY"),
            store.list_currencies()
        );

        assert!(usd.is_ok());
        assert!(jpy.is_ok());
        assert_eq!(list.len(), 2);
        assert_eq!(source.calls(), 1);
    }

    async fn timed_rate(store: &RateStore, code: &str) -> (Result<RateQuote, RateError>, Duration) {
        let started = tokio::time::Instant::now();
        let quote = store.get_rate(code).await;
        (quote, started.elapsed())
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_callers_do_not_queue_behind_failing_refresh() {
        let fetch_time = Duration::from_secs(5);
        let source = ScriptedSource::with_delay(vec![usd_doc("90")], fetch_time);
        let store = RateStore::new(Arc::clone(&source), TTL);

        store.get_rate("USD").await.unwrap();
        tokio::time::advance(TTL).await;

        let results = tokio::join!(
            timed_rate(&store, "USD"),
            timed_rate(&store, "USD"),
            timed_rate(&store, "USD"),
            timed_rate(&store, "USD"),
            timed_rate(&store, "USD")
        );

        for (quote, waited) in [results.0, results.1, results.2, results.3, results.4] {
            let quote = quote.unwrap();
            assert!(quote.is_stale);
            assert_eq!(quote.value, d("90"));
            assert!(waited <= fetch_time, "waited {waited:?}");
        }
        // One initial fetch plus a single refresh attempt
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_waiters_on_empty_cache_share_failed_refresh() {
        let fetch_time = Duration::from_secs(5);
        let source = ScriptedSource::with_delay(vec![], fetch_time);
        let store = RateStore::new(Arc::clone(&source), TTL);

        let results = tokio::join!(
            timed_rate(&store, "USD"),
            timed_rate(&store, "USD"),
            timed_rate(&store, "USD")
        );

        for (quote, waited) in [results.0, results.1, results.2] {
            assert_eq!(quote, Err(RateError::DataUnavailable));
            assert!(waited <= fetch_time, "waited {waited:?}");
        }
        assert_eq!(source.calls(), 1);
    }
}
