//! Metric derivations and display formatting
//!
//! Pure functions only: every upstream-facing module feeds raw readings in
//! here and gets back either a usable value or `None`.

use crate::utils::constants::ChainParams;

/// One block (or checkpoint) of a TPS window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockSample {
    pub height: u64,
    /// Unix seconds, fractional where the chain reports sub-second time
    pub timestamp: f64,
    pub tx_count: u64,
}

/// Cumulative transaction counter reading (Sui checkpoints)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CounterSample {
    pub total_transactions: u64,
    pub timestamp_ms: u64,
}

/// Solana performance sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerfSample {
    pub num_transactions: u64,
    pub sample_period_secs: u64,
}

/// Round to one decimal place
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn window_bounds(samples: &[BlockSample]) -> Option<(&BlockSample, &BlockSample)> {
    if samples.len() < 2 {
        return None;
    }
    let oldest = samples.iter().min_by_key(|s| s.height)?;
    let newest = samples.iter().max_by_key(|s| s.height)?;
    if oldest.height == newest.height {
        return None;
    }
    Some((oldest, newest))
}

/// Transactions per second across a window of blocks.
///
/// Sums `tx_count` over every sample and divides by the time between the
/// oldest and newest block (by height). Returns `None` for fewer than two
/// blocks or a non-positive elapsed time.
pub fn tps_from_blocks(samples: &[BlockSample]) -> Option<f64> {
    let (oldest, newest) = window_bounds(samples)?;
    let elapsed = newest.timestamp - oldest.timestamp;
    if !is_positive(elapsed) {
        return None;
    }
    let total: u64 = samples.iter().map(|s| s.tx_count).sum();
    positive(round1(total as f64 / elapsed))
}

/// Mean seconds between consecutive blocks of the window
pub fn mean_block_interval(samples: &[BlockSample]) -> Option<f64> {
    let (oldest, newest) = window_bounds(samples)?;
    let elapsed = newest.timestamp - oldest.timestamp;
    let blocks = (newest.height - oldest.height) as f64;
    positive(elapsed / blocks)
}

/// TPS from two readings of a cumulative transaction counter
pub fn tps_from_counters(first: CounterSample, last: CounterSample) -> Option<f64> {
    if last.timestamp_ms <= first.timestamp_ms {
        return None;
    }
    let txs = last.total_transactions.checked_sub(first.total_transactions)?;
    let elapsed = (last.timestamp_ms - first.timestamp_ms) as f64 / 1000.0;
    positive(round1(txs as f64 / elapsed))
}

/// TPS from performance samples: Σ transactions / Σ sample seconds
pub fn tps_from_samples(samples: &[PerfSample]) -> Option<f64> {
    let seconds: u64 = samples.iter().map(|s| s.sample_period_secs).sum();
    if seconds == 0 {
        return None;
    }
    let txs: u64 = samples.iter().map(|s| s.num_transactions).sum();
    positive(round1(txs as f64 / seconds as f64))
}

/// USD cost of one typical transaction.
///
/// `price_per_unit` is in the chain's smallest unit (wei, lamports, MIST).
pub fn tx_cost_usd(price_per_unit: f64, params: &ChainParams, native_usd: f64) -> Option<f64> {
    if !is_positive(price_per_unit) || !is_positive(native_usd) {
        return None;
    }
    let native = price_per_unit * params.gas_units_per_tx / 10f64.powi(params.native_decimals);
    positive(native * native_usd)
}

/// `$` + fixed decimals, e.g. `format_usd_fixed(0.0021, 4)` → `"$0.0021"`
pub fn format_usd_fixed(value: f64, precision: usize) -> String {
    format!("${:.*}", precision, value)
}

/// Auto-scaled currency for market cap, volume and TVL: `$445.8B`, `$623.0M`
pub fn format_usd_compact(value: f64) -> String {
    const SCALES: [(f64, &str); 4] = [(1e12, "T"), (1e9, "B"), (1e6, "M"), (1e3, "K")];

    for (scale, suffix) in SCALES {
        if value.abs() >= scale {
            return format!("${:.1}{}", value / scale, suffix);
        }
    }
    format!("${:.2}", value)
}

/// Finality display: sub-10s values keep one decimal, longer ones are whole
/// seconds, and anything beyond a day is expressed in days
pub fn format_duration_secs(secs: f64) -> String {
    const DAY: f64 = 86_400.0;

    if secs >= DAY {
        let days = (secs / DAY).round() as u64;
        if days == 1 {
            "1 day".to_string()
        } else {
            format!("{} days", days)
        }
    } else if secs >= 10.0 {
        format!("{:.0}s", secs)
    } else {
        format!("{:.1}s", secs)
    }
}

pub fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

fn positive(value: f64) -> Option<f64> {
    is_positive(value).then_some(value)
}

pub fn is_percentage(value: f64) -> bool {
    value.is_finite() && (0.0..=100.0).contains(&value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::types::NetworkId;
    use crate::utils::constants::chain_params;

    fn block(height: u64, timestamp: f64, tx_count: u64) -> BlockSample {
        BlockSample {
            height,
            timestamp,
            tx_count,
        }
    }

    #[test]
    fn test_tps_from_blocks() {
        // 10 blocks, 150 txs each, spanning 108s
        let samples: Vec<_> = (0..10)
            .map(|i| block(100 + i, 1_700_000_000.0 + 12.0 * i as f64, 150))
            .collect();
        let tps = tps_from_blocks(&samples).unwrap();
        assert!((tps - 1500.0 / 108.0).abs() < 0.05);
    }

    #[test]
    fn test_tps_rejects_flat_or_inverted_window() {
        let flat = [block(1, 50.0, 10), block(2, 50.0, 10)];
        assert_eq!(tps_from_blocks(&flat), None);

        let inverted = [block(1, 60.0, 10), block(2, 50.0, 10)];
        assert_eq!(tps_from_blocks(&inverted), None);

        assert_eq!(tps_from_blocks(&[block(1, 1.0, 5)]), None);
        assert_eq!(tps_from_blocks(&[]), None);
    }

    #[test]
    fn test_tps_ignores_sample_order() {
        let samples = [block(3, 30.0, 10), block(1, 10.0, 10), block(2, 20.0, 10)];
        assert_eq!(tps_from_blocks(&samples), Some(1.5));
        assert_eq!(mean_block_interval(&samples), Some(10.0));
    }

    #[test]
    fn test_tps_from_counters() {
        let first = CounterSample {
            total_transactions: 1_000,
            timestamp_ms: 10_000,
        };
        let last = CounterSample {
            total_transactions: 6_000,
            timestamp_ms: 12_000,
        };
        assert_eq!(tps_from_counters(first, last), Some(2500.0));
        assert_eq!(tps_from_counters(last, first), None);
    }

    #[test]
    fn test_tps_from_samples() {
        let samples = [
            PerfSample {
                num_transactions: 120_000,
                sample_period_secs: 60,
            },
            PerfSample {
                num_transactions: 180_000,
                sample_period_secs: 60,
            },
        ];
        assert_eq!(tps_from_samples(&samples), Some(2500.0));
        assert_eq!(tps_from_samples(&[]), None);
    }

    #[test]
    fn test_tx_cost_ethereum() {
        // 20 gwei * 21000 gas at $3000/ETH
        let params = chain_params(NetworkId::Ethereum);
        let cost = tx_cost_usd(20e9, &params, 3000.0).unwrap();
        assert!((cost - 1.26).abs() < 1e-9);
        assert_eq!(format_usd_fixed(cost, params.gas_precision), "$1.26");
        assert_eq!(tx_cost_usd(0.0, &params, 3000.0), None);
        assert_eq!(tx_cost_usd(20e9, &params, f64::NAN), None);
    }

    #[test]
    fn test_format_usd_compact() {
        assert_eq!(format_usd_compact(445_800_000_000.0), "$445.8B");
        assert_eq!(format_usd_compact(1_200_000_000_000.0), "$1.2T");
        assert_eq!(format_usd_compact(623_000_000.0), "$623.0M");
        assert_eq!(format_usd_compact(12_500.0), "$12.5K");
        assert_eq!(format_usd_compact(12.0), "$12.00");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration_secs(0.42), "0.4s");
        assert_eq!(format_duration_secs(12.1), "12s");
        assert_eq!(format_duration_secs(7.0 * 86_400.0), "7 days");
    }

    #[test]
    fn test_value_guards() {
        assert!(is_percentage(99.9));
        assert!(!is_percentage(100.5));
        assert!(!is_positive(f64::INFINITY));
        assert!(!is_positive(-1.0));
    }
}
