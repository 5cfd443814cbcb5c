//! Background thread for region production.
//!
//! Production requests are sent to a dedicated thread that builds the whole
//! [`RegionCollection`] off the interactive thread and posts it back over a
//! channel. The receiver applies it in one step, so readers never observe a
//! partially built collection.

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::data::RasterImage;
use crate::model::RegionCollection;
use crate::producer::{ProductionError, RegionProducer};

/// Request to produce regions, sent to the background thread.
struct ProductionRequest {
    /// Monotonic id; later requests supersede earlier ones
    generation: u64,
    image: Arc<RasterImage>,
    producer: Arc<dyn RegionProducer>,
}

/// Message sent to the worker thread.
enum ThreadMessage {
    /// Produce a region collection
    Produce(ProductionRequest),
    /// Shutdown the thread
    Shutdown,
}

/// Result posted back by the worker.
#[derive(Debug)]
pub enum ProductionOutcome {
    /// A complete collection, ready to swap in
    Produced {
        generation: u64,
        image: Arc<RasterImage>,
        collection: Arc<RegionCollection>,
    },
    /// Production failed; the caller keeps its current collection
    Failed {
        generation: u64,
        error: ProductionError,
    },
}

impl ProductionOutcome {
    /// Generation of the request this outcome answers.
    pub fn generation(&self) -> u64 {
        match self {
            ProductionOutcome::Produced { generation, .. }
            | ProductionOutcome::Failed { generation, .. } => *generation,
        }
    }
}

/// Manages a background thread for region production.
pub struct ProductionWorker {
    /// Sender for requests to the background thread
    request_tx: Sender<ThreadMessage>,
    /// Receiver for results from the background thread
    result_rx: Receiver<ProductionOutcome>,
    /// Handle to the background thread (for joining on drop)
    thread_handle: Option<JoinHandle<()>>,
    /// Generation assigned to the most recent request
    latest_generation: u64,
    /// Requests sent but not yet answered
    pending: usize,
}

impl ProductionWorker {
    /// Spawn a new worker thread.
    pub fn spawn() -> Result<Self, ProductionError> {
        let (request_tx, request_rx) = mpsc::channel::<ThreadMessage>();
        let (result_tx, result_rx) = mpsc::channel::<ProductionOutcome>();

        let thread_handle = thread::Builder::new()
            .name("region-producer".to_string())
            .spawn(move || {
                log::info!("Region production thread started");
                Self::thread_loop(request_rx, result_tx);
                log::info!("Region production thread exiting");
            })
            .map_err(|e| {
                ProductionError::WorkerUnavailable(format!("failed to spawn thread: {}", e))
            })?;

        Ok(Self {
            request_tx,
            result_rx,
            thread_handle: Some(thread_handle),
            latest_generation: 0,
            pending: 0,
        })
    }

    /// Background thread main loop.
    fn thread_loop(request_rx: Receiver<ThreadMessage>, result_tx: Sender<ProductionOutcome>) {
        loop {
            match request_rx.recv() {
                Ok(ThreadMessage::Produce(request)) => {
                    let outcome = Self::produce(request);
                    if result_tx.send(outcome).is_err() {
                        log::warn!("Result channel closed, production thread exiting");
                        break;
                    }
                }
                Ok(ThreadMessage::Shutdown) => {
                    log::debug!("Received shutdown signal");
                    break;
                }
                Err(_) => {
                    log::debug!("Request channel closed, production thread exiting");
                    break;
                }
            }
        }
    }

    fn produce(request: ProductionRequest) -> ProductionOutcome {
        let ProductionRequest {
            generation,
            image,
            producer,
        } = request;
        log::debug!(
            "Producing regions for request {} with {}",
            generation,
            producer.id()
        );
        match producer.produce(&image) {
            Ok(collection) => ProductionOutcome::Produced {
                generation,
                image,
                collection: Arc::new(collection),
            },
            Err(error) => {
                log::debug!("Production request {} failed: {}", generation, error);
                ProductionOutcome::Failed { generation, error }
            }
        }
    }

    /// Queue a production request and return its generation.
    pub fn request(
        &mut self,
        image: Arc<RasterImage>,
        producer: Arc<dyn RegionProducer>,
    ) -> Result<u64, ProductionError> {
        let generation = self.latest_generation + 1;
        let request = ProductionRequest {
            generation,
            image,
            producer,
        };

        self.request_tx
            .send(ThreadMessage::Produce(request))
            .map_err(|_| ProductionError::WorkerUnavailable("request channel closed".into()))?;

        self.latest_generation = generation;
        self.pending += 1;
        log::debug!("Sent production request {}", generation);
        Ok(generation)
    }

    /// Take one completed outcome, if any. Non-blocking.
    pub fn take_one_result(&mut self) -> Option<ProductionOutcome> {
        match self.result_rx.try_recv() {
            Ok(outcome) => {
                self.pending = self.pending.saturating_sub(1);
                Some(outcome)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                log::warn!("Production thread disconnected");
                None
            }
        }
    }

    /// Wait up to `timeout` for one completed outcome.
    pub fn wait_one_result(&mut self, timeout: Duration) -> Option<ProductionOutcome> {
        match self.result_rx.recv_timeout(timeout) {
            Ok(outcome) => {
                self.pending = self.pending.saturating_sub(1);
                Some(outcome)
            }
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => {
                log::warn!("Production thread disconnected");
                None
            }
        }
    }

    /// Generation of the most recent request (0 if none was sent).
    pub fn latest_generation(&self) -> u64 {
        self.latest_generation
    }

    /// Number of requests without an outcome yet.
    pub fn pending_count(&self) -> usize {
        self.pending
    }
}

impl Drop for ProductionWorker {
    fn drop(&mut self) {
        log::debug!("Shutting down region production thread");

        let _ = self.request_tx.send(ThreadMessage::Shutdown);

        if let Some(handle) = self.thread_handle.take() {
            if let Err(e) = handle.join() {
                log::warn!("Production thread panicked: {:?}", e);
            }
        }
    }
}
