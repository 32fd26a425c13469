//! Core Module - aggregation logic
//!
//! Chain sources, the settle-all snapshot fetcher, pollers and the monitor
//! that ties them together.

pub mod chains;
pub mod clock;
pub mod developer;
pub mod fetcher;
pub mod metrics;
pub mod monitor;
pub mod poller;
pub mod sources;

pub use clock::{Clock, FixedClock, SystemClock};
pub use developer::{DeveloperActivityFetcher, DeveloperReport};
pub use fetcher::SnapshotFetcher;
pub use monitor::NetworkMonitor;
pub use poller::{PollSource, PollState, Poller};
pub use sources::{ChainSource, GasReading, MarketChain, MarketQuote, MarketSource, TvlSource};
