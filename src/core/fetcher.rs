//! Snapshot Fetcher - settle-all fan-out for one network
//!
//! Flow per invocation:
//! 1. Five branches run concurrently on one task (TPS with finality, gas,
//!    market, TVL, uptime), each under its own timeout. TPS and finality
//!    share one branch because both come from the same block window, and
//!    the gas and market branches share one quote per coin
//! 2. Every branch lands in its own slot; a failure only degrades its field
//! 3. Usable values become `live`, everything else takes the network's
//!    fallback constant and is `estimated`
//! 4. The whole pipeline runs in a spawned task; a panic there yields an
//!    all-estimated snapshot with `error` set

use async_trait::async_trait;
use std::any::Any;
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::OnceCell;
use tracing::{debug, error, info, warn};

use super::clock::{Clock, SystemClock};
use super::metrics::{self, is_percentage, is_positive};
use super::poller::PollSource;
use super::sources::{ChainSource, MarketQuote, MarketSource, TvlSource};
use crate::models::config::FallbackProfile;
use crate::models::errors::{AppError, AppResult, ErrorCode};
use crate::models::types::{DataQuality, Field, NetworkId, NetworkSnapshot};
use crate::utils::constants::{chain_params, ChainParams, CoinRef};

/// Run a branch under a timeout; expiry is an error like any other
pub async fn with_timeout<T, F>(label: &str, limit: Duration, fut: F) -> AppResult<T>
where
    F: Future<Output = AppResult<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(outcome) => outcome,
        Err(_) => Err(AppError::timeout(label, limit.as_millis())),
    }
}

/// Fetches `NetworkSnapshot`s for one network
#[derive(Clone)]
pub struct SnapshotFetcher {
    inner: Arc<FetcherInner>,
}

struct FetcherInner {
    network: NetworkId,
    params: ChainParams,
    fallback: FallbackProfile,
    chain: Arc<dyn ChainSource>,
    market: Arc<dyn MarketSource>,
    tvl: Arc<dyn TvlSource>,
    timeout: Duration,
    clock: Arc<dyn Clock>,
}

/// Raw branch outcomes of one fetch, before validation
struct Branches {
    tps: AppResult<f64>,
    gas_usd: AppResult<f64>,
    market: AppResult<MarketQuote>,
    tvl: AppResult<f64>,
    uptime: AppResult<f64>,
    finality: AppResult<f64>,
}

impl SnapshotFetcher {
    pub fn new(
        chain: Arc<dyn ChainSource>,
        market: Arc<dyn MarketSource>,
        tvl: Arc<dyn TvlSource>,
        timeout: Duration,
    ) -> Self {
        let network = chain.network();
        Self {
            inner: Arc::new(FetcherInner {
                network,
                params: chain_params(network),
                fallback: FallbackProfile::for_network(network),
                chain,
                market,
                tvl,
                timeout,
                clock: Arc::new(SystemClock),
            }),
        }
    }

    /// Replace the timestamp source (tests)
    pub fn with_clock(self, clock: Arc<dyn Clock>) -> Self {
        let inner = &self.inner;
        Self {
            inner: Arc::new(FetcherInner {
                network: inner.network,
                params: inner.params,
                fallback: inner.fallback,
                chain: inner.chain.clone(),
                market: inner.market.clone(),
                tvl: inner.tvl.clone(),
                timeout: inner.timeout,
                clock,
            }),
        }
    }

    pub fn network(&self) -> NetworkId {
        self.inner.network
    }

    pub fn timeout(&self) -> Duration {
        self.inner.timeout
    }

    /// Produce a snapshot. Never fails: upstream trouble degrades fields,
    /// anything worse degrades the whole snapshot.
    pub async fn fetch(&self) -> NetworkSnapshot {
        let started = Instant::now();
        let this = self.clone();

        match tokio::spawn(async move { this.assemble().await }).await {
            Ok(snapshot) => {
                info!(
                    "📊 {} snapshot: {}/{} fields live in {:?}",
                    self.inner.network,
                    snapshot.live_count(),
                    Field::ALL.len(),
                    started.elapsed()
                );
                snapshot
            }
            Err(e) => {
                let err = catch_all_error(e);
                error!("❌ {} fetch failed, using fallback snapshot: {}", self.inner.network, err);
                NetworkSnapshot::fallback(
                    self.inner.network,
                    &self.inner.fallback,
                    self.inner.clock.now(),
                    err.message,
                )
            }
        }
    }

    async fn assemble(&self) -> NetworkSnapshot {
        let inner = &self.inner;
        let limit = inner.timeout;
        let quotes = QuoteCache::new(
            inner.market.as_ref(),
            [Some(inner.params.native_coin), inner.params.market_coin].into_iter().flatten(),
        );

        let (window, gas_usd, market, tvl, uptime) = tokio::join!(
            with_timeout("tps/finality", limit, async { Ok::<_, AppError>(inner.chain.tps_and_finality().await) }),
            with_timeout("gas price", limit, self.gas_cost_usd(&quotes)),
            with_timeout("market data", limit, self.market_quote(&quotes)),
            with_timeout("tvl", limit, inner.tvl.chain_tvl(inner.network.display_name())),
            with_timeout("uptime", limit, inner.chain.uptime()),
        );
        let (tps, finality) = match window {
            Ok(pair) => pair,
            Err(e) => (Err(e.detached()), Err(e)),
        };

        self.build_snapshot(Branches {
            tps,
            gas_usd,
            market,
            tvl,
            uptime,
            finality,
        })
    }

    /// Gas reading and native price fetched concurrently; both must succeed
    async fn gas_cost_usd(&self, quotes: &QuoteCache<'_>) -> AppResult<f64> {
        let inner = &self.inner;
        let (reading, native) = tokio::join!(inner.chain.gas_price(), quotes.quote(&inner.params.native_coin));
        let reading = reading?;
        let native_usd = native?
            .price_usd
            .ok_or_else(|| AppError::missing(format!("No USD price for {}", inner.params.native_coin.symbol)))?;

        metrics::tx_cost_usd(reading.price_per_unit, &inner.params, native_usd).ok_or_else(|| {
            AppError::invalid_response(format!(
                "Unusable gas reading {} at ${}",
                reading.price_per_unit, native_usd
            ))
        })
    }

    async fn market_quote(&self, quotes: &QuoteCache<'_>) -> AppResult<MarketQuote> {
        match &self.inner.params.market_coin {
            Some(coin) => quotes.quote(coin).await,
            None => Err(AppError::unsupported("market data")),
        }
    }

    fn build_snapshot(&self, branches: Branches) -> NetworkSnapshot {
        let inner = &self.inner;
        let fallback = &inner.fallback;
        let mut quality = BTreeMap::new();

        let quote = branches.market;
        let market_value = |pick: fn(&MarketQuote) -> Option<f64>, what: &str| {
            quote.as_ref().map_err(AppError::detached).and_then(|q| {
                pick(q).ok_or_else(|| AppError::missing(format!("{} missing from quote", what)))
            })
        };

        let tps = self
            .settle(Field::Tps, branches.tps.and_then(|v| check(v, is_positive, "tps")), &mut quality)
            .map(metrics::round1)
            .unwrap_or(fallback.tps);

        let gas_price = self
            .settle(Field::GasPrice, branches.gas_usd, &mut quality)
            .map(|usd| metrics::format_usd_fixed(usd, inner.params.gas_precision))
            .unwrap_or_else(|| fallback.gas_price.to_string());

        let finality = self
            .settle(
                Field::Finality,
                branches.finality.and_then(|v| check(v, is_positive, "finality")),
                &mut quality,
            )
            .map(metrics::format_duration_secs)
            .unwrap_or_else(|| fallback.finality.to_string());

        let uptime = self
            .settle(
                Field::Uptime,
                branches.uptime.and_then(|v| check(v, is_percentage, "uptime")),
                &mut quality,
            )
            .map(round2)
            .unwrap_or(fallback.uptime);

        let market_cap = self
            .settle(
                Field::MarketCap,
                market_value(|q| q.market_cap_usd, "market cap").and_then(|v| check(v, is_positive, "market cap")),
                &mut quality,
            )
            .map(metrics::format_usd_compact)
            .unwrap_or_else(|| fallback.market_cap.to_string());

        let volume_24h = self
            .settle(
                Field::Volume24h,
                market_value(|q| q.volume_24h_usd, "24h volume").and_then(|v| check(v, is_positive, "24h volume")),
                &mut quality,
            )
            .map(metrics::format_usd_compact)
            .unwrap_or_else(|| fallback.volume_24h.to_string());

        let price_change_24h = self
            .settle(
                Field::PriceChange24h,
                market_value(|q| q.change_24h_pct, "24h change").and_then(|v| check(v, f64::is_finite, "24h change")),
                &mut quality,
            )
            .map(round2)
            .unwrap_or(fallback.price_change_24h);

        let tvl = self
            .settle(Field::Tvl, branches.tvl.and_then(|v| check(v, is_positive, "tvl")), &mut quality)
            .map(metrics::format_usd_compact)
            .unwrap_or_else(|| fallback.tvl.to_string());

        NetworkSnapshot {
            network: inner.network,
            tps: Some(tps),
            gas_price: Some(gas_price),
            finality,
            uptime,
            market_cap,
            volume_24h,
            price_change_24h,
            tvl,
            last_updated: inner.clock.now(),
            data_quality: quality,
            error: None,
        }
    }

    /// Record a field's provenance and hand back the live value, if any
    fn settle<T>(&self, field: Field, outcome: AppResult<T>, quality: &mut BTreeMap<Field, DataQuality>) -> Option<T> {
        match outcome {
            Ok(value) => {
                quality.insert(field, DataQuality::Live);
                Some(value)
            }
            Err(e) => {
                if e.code == ErrorCode::UnsupportedMetric {
                    debug!("{} {} estimated: {}", self.inner.network, field.as_str(), e.message);
                } else {
                    warn!("⚠️ {} {} estimated: {}", self.inner.network, field.as_str(), e);
                }
                quality.insert(field, DataQuality::Estimated);
                None
            }
        }
    }
}

#[async_trait]
impl PollSource for SnapshotFetcher {
    type Output = NetworkSnapshot;

    fn name(&self) -> String {
        self.inner.network.as_str().to_string()
    }

    async fn poll(&self) -> AppResult<NetworkSnapshot> {
        Ok(self.fetch().await)
    }

    fn failure_of(&self, snapshot: &NetworkSnapshot) -> Option<String> {
        snapshot.error.clone()
    }
}

fn check(value: f64, usable: fn(f64) -> bool, what: &str) -> AppResult<f64> {
    if usable(value) {
        Ok(value)
    } else {
        Err(AppError::invalid_response(format!("Unusable {}: {}", what, value)))
    }
}

/// Market quotes requested during one fetch, at most one upstream call per
/// coin. Concurrent callers for the same coin wait on the first call.
struct QuoteCache<'a> {
    market: &'a dyn MarketSource,
    cells: Vec<(CoinRef, OnceCell<AppResult<MarketQuote>>)>,
}

impl<'a> QuoteCache<'a> {
    fn new(market: &'a dyn MarketSource, coins: impl IntoIterator<Item = CoinRef>) -> Self {
        let mut cells: Vec<(CoinRef, OnceCell<AppResult<MarketQuote>>)> = Vec::new();
        for coin in coins {
            if !cells.iter().any(|(c, _)| *c == coin) {
                cells.push((coin, OnceCell::new()));
            }
        }
        Self { market, cells }
    }

    async fn quote(&self, coin: &CoinRef) -> AppResult<MarketQuote> {
        match self.cells.iter().find(|(c, _)| c == coin) {
            Some((_, cell)) => cell
                .get_or_init(|| self.market.quote(coin))
                .await
                .as_ref()
                .copied()
                .map_err(AppError::detached),
            None => self.market.quote(coin).await,
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Error for a fetch task that never produced a snapshot
fn catch_all_error(e: tokio::task::JoinError) -> AppError {
    if e.is_panic() {
        AppError::panicked(format!("Failed to fetch live data: {}", panic_message(e.into_panic())))
    } else {
        AppError::internal("Failed to fetch live data: fetch task cancelled")
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "fetch task panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sources::GasReading;
    use crate::utils::constants::{COIN_ETH, COIN_SOL};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_with_timeout_expires() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok::<_, AppError>(1)
        };
        let err = with_timeout("slow", Duration::from_secs(10), slow).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::UpstreamTimeout);
        assert!(err.message.contains("10000ms"));
    }

    #[test]
    fn test_check_and_rounding() {
        assert!(check(f64::NAN, is_positive, "tps").is_err());
        assert_eq!(check(4.0, is_positive, "tps").unwrap(), 4.0);
        assert_eq!(round2(99.956), 99.96);
        assert_eq!(panic_message(Box::new("boom")), "boom");
    }

    #[tokio::test]
    async fn test_panic_maps_to_fetch_panicked() {
        let joined = tokio::spawn(async { panic!("window exploded") }).await;
        let err = catch_all_error(joined.unwrap_err());
        assert_eq!(err.code, ErrorCode::FetchPanicked);
        assert_eq!(err.message, "Failed to fetch live data: window exploded");
    }

    struct Flat(NetworkId);

    #[async_trait]
    impl ChainSource for Flat {
        fn network(&self) -> NetworkId {
            self.0
        }

        async fn tps(&self) -> AppResult<f64> {
            Ok(12.0)
        }

        async fn gas_price(&self) -> AppResult<GasReading> {
            Ok(GasReading { price_per_unit: 1e9 })
        }
    }

    struct CountingMarket(AtomicUsize);

    #[async_trait]
    impl MarketSource for CountingMarket {
        fn name(&self) -> &str {
            "counting"
        }

        async fn quote(&self, _coin: &CoinRef) -> AppResult<MarketQuote> {
            self.0.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            Ok(MarketQuote {
                price_usd: Some(2_000.0),
                market_cap_usd: Some(2.4e11),
                volume_24h_usd: Some(1e10),
                change_24h_pct: Some(0.3),
            })
        }
    }

    struct NoTvl;

    #[async_trait]
    impl TvlSource for NoTvl {
        async fn chain_tvl(&self, _chain_name: &str) -> AppResult<f64> {
            Err(AppError::missing("no tvl"))
        }
    }

    async fn quote_calls(network: NetworkId) -> (usize, NetworkSnapshot) {
        let market = Arc::new(CountingMarket(AtomicUsize::new(0)));
        let fetcher = SnapshotFetcher::new(
            Arc::new(Flat(network)),
            market.clone(),
            Arc::new(NoTvl),
            Duration::from_secs(10),
        );
        let snapshot = fetcher.fetch().await;
        (market.0.load(Ordering::SeqCst), snapshot)
    }

    #[tokio::test]
    async fn test_gas_and_market_share_one_quote() {
        let (calls, snapshot) = quote_calls(NetworkId::Ethereum).await;
        assert_eq!(calls, 1);
        assert!(snapshot.is_live(Field::GasPrice));
        assert!(snapshot.is_live(Field::MarketCap));
        assert_eq!(snapshot.gas_price.as_deref(), Some("$0.04"));
    }

    #[tokio::test]
    async fn test_distinct_coins_quoted_separately() {
        // Base pays gas in ETH and has no market coin
        let (calls, snapshot) = quote_calls(NetworkId::Base).await;
        assert_eq!(calls, 1);
        assert!(snapshot.is_live(Field::GasPrice));
        assert!(!snapshot.is_live(Field::MarketCap));

        let market = CountingMarket(AtomicUsize::new(0));
        let cache = QuoteCache::new(&market, [COIN_ETH, COIN_SOL, COIN_ETH]);
        let (a, b, c) = tokio::join!(cache.quote(&COIN_ETH), cache.quote(&COIN_SOL), cache.quote(&COIN_ETH));
        assert!(a.is_ok() && b.is_ok() && c.is_ok());
        assert_eq!(market.0.load(Ordering::SeqCst), 2);
    }
}
