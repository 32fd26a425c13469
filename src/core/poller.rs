//! Poller - interval-driven refresh of one source
//!
//! - One poll immediately on start, then one per interval tick
//! - Polls are neither queued nor deduplicated; the last to finish wins
//! - `stop()` (or drop) cancels the timer and clears `loading`; polls
//!   already in flight finish but their state update is discarded
//! - State is published through a `watch` channel

use async_trait::async_trait;
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::models::errors::AppResult;

/// Something a poller can refresh
#[async_trait]
pub trait PollSource: Send + Sync + 'static {
    type Output: Send + Sync + 'static;

    fn name(&self) -> String;

    async fn poll(&self) -> AppResult<Self::Output>;

    /// Top-level failure carried inside an otherwise usable output
    fn failure_of(&self, _output: &Self::Output) -> Option<String> {
        None
    }
}

/// Latest state held by a poller
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PollState<T> {
    /// `None` until the first poll resolves
    pub snapshot: Option<Arc<T>>,
    /// True while at least one poll is in flight
    pub loading: bool,
    pub error: Option<String>,
}

impl<T> Clone for PollState<T> {
    fn clone(&self) -> Self {
        Self {
            snapshot: self.snapshot.clone(),
            loading: self.loading,
            error: self.error.clone(),
        }
    }
}

impl<T> Default for PollState<T> {
    fn default() -> Self {
        Self {
            snapshot: None,
            loading: false,
            error: None,
        }
    }
}

pub struct Poller<T> {
    name: String,
    interval: Duration,
    tx: Arc<watch::Sender<PollState<T>>>,
    rx: watch::Receiver<PollState<T>>,
    cancel: CancellationToken,
}

impl<T: Send + Sync + 'static> Poller<T> {
    /// Start polling. Must be called inside a Tokio runtime.
    pub fn start<S>(source: Arc<S>, interval: Duration) -> Self
    where
        S: PollSource<Output = T>,
    {
        let (tx, rx) = watch::channel(PollState::default());
        let tx = Arc::new(tx);
        let cancel = CancellationToken::new();
        let name = source.name();

        tokio::spawn(run_timer(source, interval, tx.clone(), cancel.clone()));
        info!("⏱️ Poller started for {} (every {:?})", name, interval);

        Self {
            name,
            interval,
            tx,
            rx,
            cancel,
        }
    }

    pub fn is_running(&self) -> bool {
        !self.cancel.is_cancelled()
    }

    pub fn state(&self) -> PollState<T> {
        self.rx.borrow().clone()
    }

    pub fn latest(&self) -> Option<Arc<T>> {
        self.rx.borrow().snapshot.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PollState<T>> {
        self.rx.clone()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl<T> Poller<T> {
    /// Cancel the timer. Returns once no state update can land anymore.
    pub fn stop(&self) {
        if !self.cancel.is_cancelled() {
            self.cancel.cancel();
            info!("🛑 Poller stopped for {}", self.name);
        }
        // Updates check cancellation under the channel lock, so after this
        // no in-flight poll can flip `loading` back
        self.tx.send_if_modified(|state| std::mem::replace(&mut state.loading, false));
    }
}

impl<T> Drop for Poller<T> {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_timer<S: PollSource>(
    source: Arc<S>,
    interval: Duration,
    tx: Arc<watch::Sender<PollState<S::Output>>>,
    cancel: CancellationToken,
) {
    let in_flight = Arc::new(AtomicUsize::new(0));
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                spawn_poll(source.clone(), tx.clone(), cancel.clone(), in_flight.clone());
            }
        }
    }
    debug!("Timer loop for {} exited", source.name());
}

fn spawn_poll<S: PollSource>(
    source: Arc<S>,
    tx: Arc<watch::Sender<PollState<S::Output>>>,
    cancel: CancellationToken,
    in_flight: Arc<AtomicUsize>,
) {
    tx.send_if_modified(|state| {
        in_flight.fetch_add(1, Ordering::SeqCst);
        if cancel.is_cancelled() || state.loading {
            return false;
        }
        state.loading = true;
        true
    });

    tokio::spawn(async move {
        let task_source = source.clone();
        let outcome = tokio::spawn(async move { task_source.poll().await }).await;

        let (snapshot, error) = match outcome {
            Ok(Ok(output)) => {
                let failure = source.failure_of(&output);
                (Some(Arc::new(output)), failure)
            }
            Ok(Err(e)) => {
                warn!("⚠️ Poll of {} failed: {}", source.name(), e);
                (None, Some(e.to_string()))
            }
            Err(e) => {
                warn!("⚠️ Poll task of {} died: {}", source.name(), e);
                (None, Some(format!("Poll task failed: {}", e)))
            }
        };

        tx.send_if_modified(move |state| {
            let remaining = in_flight.fetch_sub(1, Ordering::SeqCst) - 1;
            if cancel.is_cancelled() {
                return false;
            }
            if let Some(snapshot) = snapshot {
                state.snapshot = Some(snapshot);
            }
            state.error = error;
            state.loading = remaining > 0;
            true
        });
    });
}
