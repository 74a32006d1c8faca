//! Reactive plumbing shared by the coin services.

use std::{sync::Arc, time::Duration};

use futures::{
    Stream, StreamExt,
    future::{self, Either},
    stream,
};
use tokio::sync::watch;

use crate::Result;

/// The manual-refresh broadcast.
///
/// An explicit object injected into every dependent pipeline rather than
/// ambient global state: calling [`refresh`](Self::refresh) makes all
/// listening pipelines refetch immediately and restart their timers.
#[derive(Clone, Debug)]
pub struct RefreshHandle {
    tx: Arc<watch::Sender<u64>>,
}

impl RefreshHandle {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(0);
        Self { tx: Arc::new(tx) }
    }

    /// Signal all listeners to refetch now.
    pub fn refresh(&self) {
        self.tx.send_modify(|generation| *generation += 1);
    }

    pub fn listen(&self) -> RefreshListener {
        RefreshListener {
            rx: self.tx.subscribe(),
        }
    }
}

impl Default for RefreshHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// One pipeline's subscription to the refresh broadcast.
#[derive(Clone, Debug)]
pub struct RefreshListener {
    rx: watch::Receiver<u64>,
}

impl RefreshListener {
    /// Wait for the next refresh signal.
    ///
    /// If the handle has been dropped no further signal can arrive and this
    /// never resolves; polling pipelines then run on their timers alone.
    pub async fn triggered(&mut self) {
        if self.rx.changed().await.is_err() {
            future::pending::<()>().await;
        }
    }
}

/// A stream that yields `fetch` results: once immediately, then on every
/// `period` tick, refetching at once and restarting the cadence whenever the
/// refresh listener fires.
///
/// Polling continues until the stream is dropped; cancellation is the
/// subscriber's responsibility.
pub fn poll_stream<T, F, Fut>(
    period: Duration,
    listener: RefreshListener,
    fetch: F,
) -> impl Send + Unpin + Stream<Item = Result<T>>
where
    T: Send + 'static,
    F: Fn() -> Fut + Send + 'static,
    Fut: Send + Future<Output = Result<T>>,
{
    let mut timer = tokio::time::interval(period);
    timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    stream::unfold(
        (timer, listener, fetch),
        |(mut timer, mut listener, fetch)| async move {
            tokio::select! {
                _ = timer.tick() => {}
                _ = listener.triggered() => {
                    // Manual refresh: fetch now, restart the cadence.
                    timer.reset();
                }
            }
            let item = fetch().await;
            Some((item, (timer, listener, fetch)))
        },
    )
    .boxed()
}

/// Combine the latest values of two streams.
///
/// Holds back until both sides have emitted at least once, then emits the
/// current pair and re-emits it whenever either side updates. Ends when both
/// inputs end.
pub fn combine_latest<'a, A, B>(
    left: impl Send + Unpin + Stream<Item = A> + 'a,
    right: impl Send + Unpin + Stream<Item = B> + 'a,
) -> impl Send + Unpin + Stream<Item = (A, B)> + 'a
where
    A: Clone + Send + 'a,
    B: Clone + Send + 'a,
{
    stream::select(left.map(Either::Left), right.map(Either::Right))
        .scan((None, None), |latest, item| {
            match item {
                Either::Left(a) => latest.0 = Some(a),
                Either::Right(b) => latest.1 = Some(b),
            }
            let pair = match latest {
                (Some(a), Some(b)) => Some((a.clone(), b.clone())),
                _ => None,
            };
            future::ready(Some(pair))
        })
        .filter_map(future::ready)
        .boxed()
}
