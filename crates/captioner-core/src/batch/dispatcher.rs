//! Bounded-concurrency job dispatcher with cooperative cancellation.
//!
//! A feeder task pushes jobs into a bounded queue; a fixed number of worker
//! tasks pull from it. Results are collected in completion order. The
//! cancellation token is checked before each job is queued, before each job
//! starts, and after each result is collected. Jobs that already started run
//! to completion.

use crate::config::BatchConfig;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;

/// Outcome of one job, keyed by the image it processed.
#[derive(Debug)]
pub struct JobResult<O> {
    pub image: PathBuf,
    pub outcome: O,
}

/// Everything collected from one batch run.
#[derive(Debug)]
pub struct BatchReport<T> {
    /// Results in completion order
    pub results: Vec<T>,
    /// Jobs handed to the dispatcher
    pub total: usize,
    /// Whether collection stopped because of cancellation
    pub cancelled: bool,
}

impl<T> BatchReport<T> {
    /// Number of results collected.
    pub fn processed(&self) -> usize {
        self.results.len()
    }
}

/// Fixed-size worker pool over a bounded job queue.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    workers: usize,
    queue_capacity: usize,
}

impl Dispatcher {
    pub fn new(workers: usize, queue_capacity: usize) -> Self {
        Self {
            workers: workers.max(1),
            queue_capacity: queue_capacity.max(1),
        }
    }

    pub fn from_config(config: &BatchConfig) -> Self {
        Self::new(config.workers, config.queue_capacity)
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run `job_fn` over every job.
    ///
    /// `on_panic` converts a panicking job into a regular result so siblings
    /// keep going. `on_result` sees each result as it is collected (progress
    /// reporting, or cancelling the token).
    pub async fn run<J, T, F, Fut, P, R>(
        &self,
        jobs: Vec<J>,
        cancel: &CancellationToken,
        job_fn: F,
        on_panic: P,
        mut on_result: R,
    ) -> BatchReport<T>
    where
        J: Clone + Send + Sync + 'static,
        T: Send + 'static,
        F: Fn(J) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = T> + Send + 'static,
        P: Fn(&J, String) -> T + Send + Sync + 'static,
        R: FnMut(&T),
    {
        let total = jobs.len();
        if total == 0 {
            return BatchReport {
                results: Vec::new(),
                total,
                cancelled: cancel.is_cancelled(),
            };
        }

        let (job_tx, job_rx) = mpsc::channel::<J>(self.queue_capacity);
        let (result_tx, mut result_rx) = mpsc::channel::<T>(self.queue_capacity);
        let job_rx = Arc::new(Mutex::new(job_rx));

        // Feeder: stops submitting as soon as cancellation is observed
        let feeder_cancel = cancel.clone();
        tokio::spawn(async move {
            for job in jobs {
                if feeder_cancel.is_cancelled() {
                    break;
                }
                tokio::select! {
                    biased;
                    _ = feeder_cancel.cancelled() => break,
                    sent = job_tx.send(job) => {
                        if sent.is_err() {
                            break;
                        }
                    }
                }
            }
        });

        let job_fn = Arc::new(job_fn);
        let on_panic = Arc::new(on_panic);
        for worker_id in 0..self.workers.min(total) {
            let job_rx = job_rx.clone();
            let result_tx = result_tx.clone();
            let cancel = cancel.clone();
            let job_fn = job_fn.clone();
            let on_panic = on_panic.clone();

            tokio::spawn(async move {
                loop {
                    let next = {
                        let mut rx = job_rx.lock().await;
                        tokio::select! {
                            biased;
                            _ = cancel.cancelled() => None,
                            job = rx.recv() => job,
                        }
                    };
                    let Some(job) = next else { break };
                    if cancel.is_cancelled() {
                        break;
                    }

                    // Run in its own task so a panic stays contained
                    let result = match tokio::spawn(job_fn(job.clone())).await {
                        Ok(result) => result,
                        Err(e) => {
                            tracing::error!("Worker {worker_id}: job panicked: {e}");
                            on_panic(&job, e.to_string())
                        }
                    };
                    if result_tx.send(result).await.is_err() {
                        break;
                    }
                }
            });
        }
        drop(result_tx);

        let mut results = Vec::with_capacity(total);
        let mut cancelled = false;
        while let Some(result) = result_rx.recv().await {
            on_result(&result);
            results.push(result);
            if cancel.is_cancelled() {
                cancelled = true;
                tracing::warn!("Batch processing was stopped by the user.");
                break;
            }
        }
        if !cancelled && results.len() < total && cancel.is_cancelled() {
            cancelled = true;
            tracing::warn!("Batch processing was stopped by the user.");
        }

        BatchReport {
            results,
            total,
            cancelled,
        }
    }
}
