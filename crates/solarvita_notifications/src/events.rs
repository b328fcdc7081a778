//! In-process trigger bus.
//!
//! The writer publishes a creation event for every stored record; the worker
//! runs one dispatch task per event and drains the queue before it stops.

use solarvita_common::{NotificationRecord, SolarvitaError};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tracing::{debug, error, info};

use crate::dispatch::DispatchTrigger;

#[derive(Debug, Clone)]
pub enum TriggerEvent {
    NotificationCreated(NotificationRecord),
}

#[derive(Debug, Clone)]
pub struct TriggerSender {
    inner: mpsc::Sender<TriggerEvent>,
}

impl TriggerSender {
    pub async fn publish(&self, event: TriggerEvent) -> Result<(), SolarvitaError> {
        self.inner.send(event).await.map_err(|_| {
            error!("Trigger worker is gone, event dropped");
            SolarvitaError::Internal("Trigger bus is closed".to_string())
        })
    }
}

pub type TriggerReceiver = mpsc::Receiver<TriggerEvent>;

/// Creates the bus. A capacity of zero is raised to one.
pub fn channel(capacity: usize) -> (TriggerSender, TriggerReceiver) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (TriggerSender { inner: tx }, rx)
}

/// Consumes events until every sender is dropped, then waits for the
/// dispatches still in flight. Queued events are never dropped.
pub async fn run_worker(mut receiver: TriggerReceiver, dispatch: Arc<DispatchTrigger>) {
    info!("Trigger worker started");
    let mut in_flight = JoinSet::new();

    loop {
        tokio::select! {
            event = receiver.recv() => match event {
                Some(TriggerEvent::NotificationCreated(record)) => {
                    debug!(id = %record.id, "Notification created");
                    let dispatch = Arc::clone(&dispatch);
                    in_flight.spawn(async move {
                        if let Err(err) = dispatch.dispatch(&record).await {
                            error!(id = %record.id, error = %err, "Dispatch failed");
                        }
                    });
                }
                None => break,
            },
            Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                log_join(joined);
            }
        }
    }

    if !in_flight.is_empty() {
        info!(pending = in_flight.len(), "Waiting for in-flight dispatches");
    }
    while let Some(joined) = in_flight.join_next().await {
        log_join(joined);
    }

    info!("Trigger worker stopped");
}

fn log_join(joined: Result<(), JoinError>) {
    if let Err(err) = joined {
        error!(error = %err, "Dispatch task panicked");
    }
}

pub fn spawn_worker(receiver: TriggerReceiver, dispatch: Arc<DispatchTrigger>) -> JoinHandle<()> {
    tokio::spawn(run_worker(receiver, dispatch))
}
