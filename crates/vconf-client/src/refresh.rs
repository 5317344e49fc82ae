//! Background refresh loop
//!
//! The loop wakes on a fixed period, fetches the latest payload and hands it
//! to the callback only when it differs byte-for-byte from the cached one.
//! Fetch failures are logged and the tick is skipped.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, warn};

use crate::error::Result;

/// Callback invoked with the new payload on every observed change
pub type RefreshCallback = Box<dyn Fn(Bytes) + Send + Sync + 'static>;

/// Last payload seen by the client, shared by foreground reads and the
/// refresh loop
#[derive(Clone, Default)]
pub struct PayloadCache {
    inner: Arc<Mutex<Bytes>>,
}

impl PayloadCache {
    pub fn get(&self) -> Bytes {
        self.inner.lock().clone()
    }

    pub fn store(&self, payload: Bytes) {
        *self.inner.lock() = payload;
    }

    /// Replace the cached payload when `fresh` differs from it.
    ///
    /// Returns whether a replacement happened.
    pub fn replace_if_changed(&self, fresh: &Bytes) -> bool {
        let mut cached = self.inner.lock();
        if *cached == *fresh {
            return false;
        }
        *cached = fresh.clone();
        true
    }
}

/// Attachment state of a client's refresh loop
///
/// Attach-once, stop-once: once a callback has been assigned the state never
/// returns to `Unassigned`.
pub(crate) enum RefreshState {
    Unassigned,
    Running(oneshot::Sender<()>),
    Stopped,
}

impl RefreshState {
    /// Deliver the stop signal if the loop is running
    pub(crate) fn stop(&mut self) {
        match std::mem::replace(self, RefreshState::Stopped) {
            RefreshState::Running(tx) => {
                // The loop may already be gone with its runtime
                let _ = tx.send(());
            }
            RefreshState::Unassigned => *self = RefreshState::Unassigned,
            RefreshState::Stopped => {}
        }
    }
}

/// Spawn the refresh loop on the current Tokio runtime.
///
/// The first tick fires one `period` after spawning. A fetch that overruns
/// the period delays the next tick instead of queueing missed ones. The loop
/// exits when `stop` resolves, including when its sender is dropped.
pub(crate) fn spawn_refresh<F, Fut>(
    period: Duration,
    cache: PayloadCache,
    fetch: F,
    callback: RefreshCallback,
    mut stop: oneshot::Receiver<()>,
) -> JoinHandle<()>
where
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Bytes>> + Send + 'static,
{
    tokio::spawn(async move {
        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = &mut stop => {
                    debug!("config refresh stopped");
                    break;
                }
                _ = ticker.tick() => {
                    match fetch().await {
                        Ok(fresh) => {
                            if cache.replace_if_changed(&fresh) {
                                debug!(bytes = fresh.len(), "config changed, dispatching callback");
                                callback(fresh);
                            }
                        }
                        Err(e) => warn!(error = %e, "config refresh failed"),
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const PERIOD: Duration = Duration::from_millis(100);

    struct Harness {
        fetches: Arc<AtomicUsize>,
        seen: Arc<Mutex<Vec<Bytes>>>,
        stop: Option<oneshot::Sender<()>>,
        task: JoinHandle<()>,
    }

    fn start(cache: PayloadCache, script: Vec<Result<Bytes>>) -> Harness {
        let script = Arc::new(Mutex::new(VecDeque::from(script)));
        let fetches = Arc::new(AtomicUsize::new(0));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let (tx, rx) = oneshot::channel();

        let fetch = {
            let fetches = fetches.clone();
            move || {
                fetches.fetch_add(1, Ordering::SeqCst);
                let next = script.lock().pop_front();
                async move { next.unwrap_or(Err(ClientError::EmptyConfigData)) }
            }
        };
        let callback: RefreshCallback = {
            let seen = seen.clone();
            Box::new(move |payload| seen.lock().push(payload))
        };

        let task = spawn_refresh(PERIOD, cache, fetch, callback, rx);
        Harness {
            fetches,
            seen,
            stop: Some(tx),
            task,
        }
    }

    #[test]
    fn test_replace_if_changed() {
        let cache = PayloadCache::default();
        let a = Bytes::from_static(b"{\"a\":1}");

        assert!(cache.replace_if_changed(&a));
        assert!(!cache.replace_if_changed(&a.clone()));
        assert_eq!(cache.get(), a);
    }

    #[test]
    fn test_stop_is_idempotent() {
        let (tx, mut rx) = oneshot::channel();
        let mut state = RefreshState::Running(tx);

        state.stop();
        assert!(matches!(state, RefreshState::Stopped));
        assert!(rx.try_recv().is_ok());

        state.stop();
        assert!(matches!(state, RefreshState::Stopped));

        let mut idle = RefreshState::Unassigned;
        idle.stop();
        assert!(matches!(idle, RefreshState::Unassigned));
    }

    #[tokio::test(start_paused = true)]
    async fn test_callback_fires_once_on_change() {
        let a = Bytes::from_static(b"A");
        let b = Bytes::from_static(b"B");
        let cache = PayloadCache::default();
        cache.store(a.clone());

        let mut h = start(cache.clone(), vec![Ok(a.clone()), Ok(a), Ok(b.clone())]);
        time::sleep(PERIOD * 3 + PERIOD / 2).await;

        assert_eq!(h.fetches.load(Ordering::SeqCst), 3);
        assert_eq!(*h.seen.lock(), vec![b.clone()]);
        assert_eq!(cache.get(), b);

        h.stop.take().unwrap().send(()).unwrap();
        h.task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_error_skips_tick() {
        let b = Bytes::from_static(b"B");
        let mut h = start(
            PayloadCache::default(),
            vec![Err(ClientError::EmptyServiceName), Ok(b.clone())],
        );
        time::sleep(PERIOD * 2 + PERIOD / 2).await;

        assert_eq!(h.fetches.load(Ordering::SeqCst), 2);
        assert_eq!(*h.seen.lock(), vec![b]);

        h.stop.take().unwrap().send(()).unwrap();
        h.task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_ends_polling() {
        let mut h = start(PayloadCache::default(), Vec::new());
        time::sleep(PERIOD + PERIOD / 2).await;
        assert_eq!(h.fetches.load(Ordering::SeqCst), 1);

        drop(h.stop.take());
        h.task.await.unwrap();

        time::sleep(PERIOD * 5).await;
        assert_eq!(h.fetches.load(Ordering::SeqCst), 1);
        assert!(h.seen.lock().is_empty());
    }
}
