//! Sequential and concurrent drivers over an [`Executor`].
//!
//! The concurrent driver is a fixed worker pool: a feeder task fills a
//! bounded queue with `(index, identifier)` pairs and closes it, workers
//! drain the queue until it is closed and empty, and the caller collects
//! from the result queue until every worker has hung up.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::core::worker_count;
use crate::data::{Outcome, ResultOrder};

/// Performs the request for one identifier.
///
/// [`Endpoint`](crate::Endpoint) is the production implementation; anything
/// else implementing it can be driven by the same dispatchers.
pub trait Executor: Clone + Send + Sync + 'static {
    type Output: Send + 'static;
    type Error: fmt::Display + Send;

    fn execute(
        &self,
        identifier: &str,
        payload: &str,
    ) -> impl Future<Output = Result<Self::Output, Self::Error>> + Send;
}

/// Run every identifier one after another; `results[i]` belongs to
/// `identifiers[i]`.
pub async fn run_sequential<E, S>(executor: &E, identifiers: &[S]) -> Vec<Outcome<E::Output>>
where
    E: Executor,
    S: AsRef<str>,
{
    let mut results = Vec::with_capacity(identifiers.len());
    for id in identifiers {
        results.push(Outcome::from_result(executor.execute(id.as_ref(), "").await));
    }
    results
}

/// Run identifiers on a pool of [`worker_count`] workers.
///
/// The result list always has one entry per identifier. With
/// [`ResultOrder::Input`] entries line up with `identifiers`; with
/// [`ResultOrder::Completion`] they appear in the order requests finished.
pub async fn run_concurrent<E, S>(
    executor: &E,
    identifiers: &[S],
    max_parallel: usize,
    order: ResultOrder,
) -> Vec<Outcome<E::Output>>
where
    E: Executor,
    S: AsRef<str>,
{
    let total = identifiers.len();
    if total == 0 {
        return Vec::new();
    }

    let workers = worker_count(total, max_parallel);
    let (feed_tx, feed_rx) = mpsc::channel::<(usize, String)>(workers * 2);
    let (result_tx, mut result_rx) = mpsc::channel::<(usize, Outcome<E::Output>)>(workers);
    let feed_rx = Arc::new(Mutex::new(feed_rx));

    let ids: Vec<String> = identifiers.iter().map(|s| s.as_ref().to_owned()).collect();
    let feeder = tokio::spawn(async move {
        for item in ids.into_iter().enumerate() {
            if feed_tx.send(item).await.is_err() {
                break;
            }
        }
    });

    let mut pool = JoinSet::new();
    for worker_id in 0..workers {
        pool.spawn(worker_loop(
            worker_id,
            executor.clone(),
            feed_rx.clone(),
            result_tx.clone(),
        ));
    }
    // Only workers may keep the queues open, or a dead pool stalls the feeder.
    drop(feed_rx);
    drop(result_tx);

    let mut arrived = Vec::with_capacity(total);
    while let Some(item) = result_rx.recv().await {
        arrived.push(item);
    }

    while let Some(joined) = pool.join_next().await {
        if let Err(e) = joined {
            warn!(error = %e, "dispatch worker stopped abnormally");
        }
    }
    if let Err(e) = feeder.await {
        warn!(error = %e, "dispatch feeder stopped abnormally");
    }

    assemble(arrived, identifiers, order)
}

async fn worker_loop<E: Executor>(
    worker_id: usize,
    executor: E,
    feed: Arc<Mutex<mpsc::Receiver<(usize, String)>>>,
    results: mpsc::Sender<(usize, Outcome<E::Output>)>,
) {
    debug!(worker_id, "dispatch worker started");

    loop {
        let next = {
            let mut feed = feed.lock().await;
            feed.recv().await
        };
        let Some((index, identifier)) = next else {
            break;
        };

        let outcome = Outcome::from_result(executor.execute(&identifier, "").await);
        if results.send((index, outcome)).await.is_err() {
            break;
        }
    }

    debug!(worker_id, "dispatch worker stopped");
}

/// Lay out collected results; slots a crashed worker never reported become
/// errors so the length always matches the input.
fn assemble<T, S: AsRef<str>>(
    arrived: Vec<(usize, Outcome<T>)>,
    identifiers: &[S],
    order: ResultOrder,
) -> Vec<Outcome<T>> {
    let lost = |index: usize| {
        Outcome::Error(format!(
            "failure for {:?} worker stopped before reporting a result",
            identifiers[index].as_ref()
        ))
    };

    match order {
        ResultOrder::Input => {
            let mut slots: Vec<Option<Outcome<T>>> =
                std::iter::repeat_with(|| None).take(identifiers.len()).collect();
            for (index, outcome) in arrived {
                slots[index] = Some(outcome);
            }
            slots
                .into_iter()
                .enumerate()
                .map(|(index, slot)| slot.unwrap_or_else(|| lost(index)))
                .collect()
        }
        ResultOrder::Completion => {
            let mut reported = vec![false; identifiers.len()];
            let mut results = Vec::with_capacity(identifiers.len());
            for (index, outcome) in arrived {
                reported[index] = true;
                results.push(outcome);
            }
            for (index, _) in reported.iter().enumerate().filter(|(_, done)| !**done) {
                results.push(lost(index));
            }
            results
        }
    }
}
