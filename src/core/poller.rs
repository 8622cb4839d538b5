/// Background polling tasks
///
/// Pollers only perform I/O and forward results over unbounded channels;
/// the run loop that owns the state drains them each frame. Every task is
/// owned by a [`PollHandle`] that aborts it when dropped, so replacing or
/// dropping a handle is all it takes to stop a timer.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{interval, interval_at, Instant, MissedTickBehavior};
use tracing::debug;

use crate::core::api::{ApiError, MonitorBackend};
use crate::core::log_session::TimerKind;
use crate::core::models::{ContainerInventoryEntry, ContainerStats, MetricsResponse};
use crate::utils::Intervals;

/// Owns a spawned task; aborts it on drop
#[derive(Debug)]
pub struct PollHandle {
    handle: JoinHandle<()>,
}

impl PollHandle {
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Run `fetch` now and then every `period`, sending each result to `tx`.
///
/// The next fetch is not started before the previous one finished. The task
/// ends on its own once the receiver is gone.
pub fn spawn_poller<T, F, Fut>(period: Duration, tx: UnboundedSender<T>, mut fetch: F) -> PollHandle
where
    T: Send + 'static,
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = T> + Send + 'static,
{
    let handle = tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let value = fetch().await;
            if tx.send(value).is_err() {
                break;
            }
        }
    });

    PollHandle { handle }
}

/// Send `tick` every `period`, first one after a full period
pub fn spawn_ticker<K>(period: Duration, tx: UnboundedSender<K>, tick: K) -> PollHandle
where
    K: Clone + Send + 'static,
{
    let handle = tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if tx.send(tick.clone()).is_err() {
                break;
            }
        }
    });

    PollHandle { handle }
}

pub fn spawn_metrics_poller(
    backend: Arc<dyn MonitorBackend>,
    period: Duration,
    tx: UnboundedSender<Result<MetricsResponse, ApiError>>,
) -> PollHandle {
    spawn_poller(period, tx, move || {
        let backend = backend.clone();
        async move { backend.metrics().await }
    })
}

pub fn spawn_inventory_poller(
    backend: Arc<dyn MonitorBackend>,
    period: Duration,
    tx: UnboundedSender<Result<Vec<ContainerInventoryEntry>, ApiError>>,
) -> PollHandle {
    spawn_poller(period, tx, move || {
        let backend = backend.clone();
        async move { backend.containers().await }
    })
}

pub fn spawn_stats_poller(
    backend: Arc<dyn MonitorBackend>,
    period: Duration,
    tx: UnboundedSender<Result<ContainerStats, ApiError>>,
) -> PollHandle {
    spawn_poller(period, tx, move || {
        let backend = backend.clone();
        async move { backend.container_stats().await }
    })
}

/// The log viewer's single timer: static refresh or real-time tail, never both
pub struct LogTicker {
    active: Option<(TimerKind, PollHandle)>,
    tx: UnboundedSender<TimerKind>,
    intervals: Intervals,
}

impl LogTicker {
    pub fn new(tx: UnboundedSender<TimerKind>, intervals: Intervals) -> Self {
        Self { active: None, tx, intervals }
    }

    pub fn active(&self) -> Option<TimerKind> {
        self.active.as_ref().map(|(kind, _)| *kind)
    }

    /// Make the running timer match `wanted`. Returns true if it changed.
    pub fn sync(&mut self, wanted: Option<TimerKind>) -> bool {
        if self.active() == wanted {
            return false;
        }

        // Old task is aborted before the new one starts
        self.active = None;

        if let Some(kind) = wanted {
            let period = match kind {
                TimerKind::StaticRefresh => self.intervals.log_refresh,
                TimerKind::RealTimeTail => self.intervals.log_tail,
            };
            debug!(?kind, ?period, "Starting log timer");
            self.active = Some((kind, spawn_ticker(period, self.tx.clone(), kind)));
        }

        true
    }
}
