// crates/suitegen-core/src/scheduler.rs
// ============================================================================
// Module: Batch Scheduler
// Description: Memory-bounded batching over a fixed pool of worker threads.
// Purpose: Generate large contracts within bounded memory and time.
// Dependencies: suitegen-config, suitegen-contract, serde, tracing
// ============================================================================

//! ## Overview
//! Operations are split into contiguous batches sized by the memory budget and
//! dispatched to named worker threads through a bounded channel of
//! [`WorkerMessage`] envelopes. Workers reply with [`WorkerReply`] envelopes;
//! the coordinating thread owns the cache and the error registry and is the
//! only place results are aggregated.
//!
//! # Invariants
//! - Aggregated artifacts follow input order regardless of completion order.
//! - A batch that exceeds its timeout is reported once; its late result is discarded.
//! - Workers never touch the cache or the error registry.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::any::Any;
use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::ops::Range;
use std::panic;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::mpsc;
use std::sync::mpsc::RecvTimeoutError;
use std::thread;
use std::time::Duration;
use std::time::Instant;

use serde::Serialize;
use suitegen_config::ConcurrencyOptions;
use suitegen_contract::Operation;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::error::GenerationError;
use crate::error::Stage;
use crate::hashing::batch_cache_key;
use crate::interfaces::AccountedMemoryProbe;
use crate::interfaces::BatchOutput;
use crate::interfaces::BatchProcessor;
use crate::interfaces::MemoryProbe;
use crate::interfaces::OperationArtifact;
use crate::recovery::ErrorContext;
use crate::recovery::RecoveryCoordinator;
use crate::recovery::RecoveryOutcome;
use crate::recovery::RecoveryPolicy;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Cache size that triggers pruning.
pub const CACHE_MAX_ENTRIES: usize = 100;
/// Entries kept after pruning.
pub const CACHE_RETAIN_ENTRIES: usize = 50;
/// Streaming chunks between memory samples.
pub const MEMORY_SAMPLE_INTERVAL: usize = 10;

// ============================================================================
// SECTION: Metrics
// ============================================================================

/// Terminal state of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    /// Produced output.
    Completed,
    /// Processor panicked or no worker was available.
    Failed,
    /// Exceeded the time budget.
    TimedOut,
}

impl BatchStatus {
    /// Returns a stable label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::TimedOut => "timed_out",
        }
    }
}

/// Timing and size of one batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchMetrics {
    /// Batch identifier, ascending in input order.
    pub batch_id: usize,
    /// Operations in the batch.
    pub operation_count: usize,
    /// Wall time from start to result.
    pub duration_ms: u64,
    /// Estimated bytes retained by the output.
    pub estimated_bytes: u64,
    /// True when served from the cache.
    pub cache_hit: bool,
    /// Terminal state.
    pub status: BatchStatus,
}

/// Streaming progress after one chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkProgress {
    /// Operations processed so far.
    pub processed: usize,
    /// Total operations.
    pub total: usize,
    /// Completion percentage.
    pub percentage: u8,
}

/// Aggregated scheduler output.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScheduleOutcome {
    /// Artifacts in input order (empty in streaming mode).
    pub artifacts: Vec<OperationArtifact>,
    /// Per-batch metrics in batch order.
    pub metrics: Vec<BatchMetrics>,
}

// ============================================================================
// SECTION: Cache
// ============================================================================

/// Cached batch output.
#[derive(Debug, Clone)]
struct CacheEntry {
    /// Stored output.
    output: BatchOutput,
    /// Logical time of the last insert or hit.
    last_used: u64,
}

/// Batch result cache keyed by canonical batch digests.
///
/// # Invariants
/// - Never holds more than [`CACHE_MAX_ENTRIES`] entries after an insert.
#[derive(Debug, Clone, Default)]
pub struct BatchCache {
    /// Entries by key.
    entries: BTreeMap<String, CacheEntry>,
    /// Logical clock for recency.
    clock: u64,
}

impl BatchCache {
    /// Returns a cached output and marks it recently used.
    pub fn get(&mut self, key: &str) -> Option<BatchOutput> {
        self.clock = self.clock.saturating_add(1);
        let clock = self.clock;
        self.entries.get_mut(key).map(|entry| {
            entry.last_used = clock;
            entry.output.clone()
        })
    }

    /// Stores an output, pruning when the cache grows past its bound.
    pub fn insert(&mut self, key: String, output: BatchOutput) {
        self.clock = self.clock.saturating_add(1);
        self.entries.insert(key, CacheEntry {
            output,
            last_used: self.clock,
        });
        if self.entries.len() > CACHE_MAX_ENTRIES {
            self.prune(CACHE_RETAIN_ENTRIES);
        }
    }

    /// Keeps only the `retain` most recently used entries.
    pub fn prune(&mut self, retain: usize) {
        if self.entries.len() <= retain {
            return;
        }
        let mut recency: Vec<u64> = self.entries.values().map(|entry| entry.last_used).collect();
        recency.sort_unstable_by(|left, right| right.cmp(left));
        let cutoff = recency.get(retain.saturating_sub(1)).copied().unwrap_or(0);
        self.entries.retain(|_, entry| entry.last_used >= cutoff);
        debug!(retained = self.entries.len(), "batch cache pruned");
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Estimates retained bytes.
    #[must_use]
    pub fn estimated_bytes(&self) -> u64 {
        self.entries.values().map(|entry| entry.output.estimated_bytes()).fold(0, u64::saturating_add)
    }
}

/// Coordinator-owned state of one run.
#[derive(Debug)]
pub struct RunContext {
    /// Error recovery and registry.
    pub recovery: RecoveryCoordinator,
    /// Batch cache.
    pub cache: BatchCache,
}

impl RunContext {
    /// Builds a fresh run context.
    #[must_use]
    pub fn new(policy: RecoveryPolicy) -> Self {
        Self {
            recovery: RecoveryCoordinator::new(policy),
            cache: BatchCache::default(),
        }
    }
}

// ============================================================================
// SECTION: Worker Protocol
// ============================================================================

/// Envelope sent to workers.
#[derive(Debug)]
pub struct WorkerMessage {
    /// Dispatch sequence number.
    pub sequence: u64,
    /// Time the message was queued.
    pub enqueued_at: Instant,
    /// Message body.
    pub payload: WorkerPayload,
}

/// Worker message body.
#[derive(Debug)]
pub enum WorkerPayload {
    /// Process a contiguous slice of operations.
    Process {
        /// Batch identifier.
        batch_id: usize,
        /// Operation range.
        range: Range<usize>,
    },
    /// Exit the worker loop.
    Shutdown,
}

/// Envelope returned by workers.
#[derive(Debug)]
pub struct WorkerReply {
    /// Worker number.
    pub worker: usize,
    /// Batch identifier.
    pub batch_id: usize,
    /// Reply body.
    pub payload: ReplyPayload,
}

/// Worker reply body.
#[derive(Debug)]
pub enum ReplyPayload {
    /// The worker picked the batch up.
    Started,
    /// The batch produced output.
    Completed {
        /// Batch output.
        output: BatchOutput,
    },
    /// The processor panicked.
    Failed {
        /// Panic message.
        message: String,
    },
}

// ============================================================================
// SECTION: Scheduler
// ============================================================================

/// Batch in flight on the pool.
struct Pending {
    /// Operation count.
    operation_count: usize,
    /// Cache key when caching applies.
    cache_key: Option<String>,
    /// Time the batch was queued.
    dispatched: Instant,
    /// Worker that picked the batch up.
    worker: Option<usize>,
    /// Time the worker picked the batch up.
    started: Option<Instant>,
}

/// Batch to run.
struct BatchJob {
    /// Batch identifier.
    batch_id: usize,
    /// Operation range.
    range: Range<usize>,
    /// Cache key when caching applies.
    cache_key: Option<String>,
}

/// Partitions operations and runs a [`BatchProcessor`] over a worker pool.
pub struct BatchScheduler<P: BatchProcessor> {
    /// Per-batch work.
    processor: Arc<P>,
    /// Concurrency knobs.
    options: ConcurrencyOptions,
    /// Memory sampling hook.
    probe: Box<dyn MemoryProbe>,
}

impl<P: BatchProcessor> BatchScheduler<P> {
    /// Builds a scheduler with the accounted-bytes memory probe.
    #[must_use]
    pub fn new(processor: Arc<P>, options: ConcurrencyOptions) -> Self {
        Self {
            processor,
            options,
            probe: Box::new(AccountedMemoryProbe),
        }
    }

    /// Replaces the memory probe.
    #[must_use]
    pub fn with_probe(mut self, probe: Box<dyn MemoryProbe>) -> Self {
        self.probe = probe;
        self
    }

    /// Returns the effective batch size.
    ///
    /// `min(batch_size, budget / (per_operation_estimate * workers))`, floored at 1.
    #[must_use]
    pub fn batch_size(&self) -> usize {
        let per_operation = self.options.per_operation_memory_kb.saturating_mul(1024);
        let workers = u64::try_from(self.options.max_workers.max(1)).unwrap_or(u64::MAX);
        let denominator = per_operation.saturating_mul(workers);
        let bounded = if denominator == 0 {
            self.options.batch_size
        } else {
            let fit = self.options.memory_budget_bytes() / denominator;
            usize::try_from(fit).unwrap_or(usize::MAX).min(self.options.batch_size)
        };
        bounded.max(1)
    }

    /// Splits `0 .. len` into contiguous batch ranges.
    #[must_use]
    pub fn partition(&self, len: usize) -> Vec<Range<usize>> {
        let size = self.batch_size();
        (0 .. len).step_by(size).map(|start| start .. (start + size).min(len)).collect()
    }

    /// Processes every operation and returns artifacts in input order.
    pub fn process(&mut self, operations: &Arc<[Operation]>, context: &mut RunContext) -> ScheduleOutcome {
        let total = operations.len();
        if total <= self.options.direct_threshold {
            info!(operations = total, "processing operations directly");
            let jobs = self.jobs(operations, vec![0 .. total], 0);
            return self.run_jobs(operations, jobs, context, false);
        }
        if self.options.streaming {
            let mut artifacts = Vec::with_capacity(total);
            let mut outcome = self.process_streaming(operations, context, |_, mut chunk| {
                artifacts.append(&mut chunk);
            });
            outcome.artifacts = artifacts;
            return outcome;
        }
        let batches = self.partition(total);
        info!(
            operations = total,
            batches = batches.len(),
            batch_size = self.batch_size(),
            workers = self.options.max_workers,
            "scheduling batches"
        );
        let jobs = self.jobs(operations, batches, 0);
        self.run_jobs(operations, jobs, context, true)
    }

    /// Processes operations chunk by chunk, handing each chunk's artifacts to
    /// `on_chunk` before the next chunk is dispatched.
    pub fn process_streaming<F>(
        &mut self,
        operations: &Arc<[Operation]>,
        context: &mut RunContext,
        mut on_chunk: F,
    ) -> ScheduleOutcome
    where
        F: FnMut(ChunkProgress, Vec<OperationArtifact>),
    {
        let total = operations.len();
        let chunk_size = self.options.chunk_size.max(1);
        let threshold = self.options.memory_threshold_mb.saturating_mul(1024 * 1024);
        let mut metrics = Vec::new();
        let mut next_batch = 0;
        let mut processed = 0;
        for (chunk_index, start) in (0 .. total).step_by(chunk_size).enumerate() {
            let end = (start + chunk_size).min(total);
            let batches: Vec<Range<usize>> =
                self.partition(end - start).into_iter().map(|range| range.start + start .. range.end + start).collect();
            let jobs = self.jobs(operations, batches, next_batch);
            next_batch += jobs.len();
            let chunk = self.run_jobs(operations, jobs, context, true);
            metrics.extend(chunk.metrics);
            processed = end;
            let progress = ChunkProgress {
                processed,
                total,
                percentage: percentage(processed, total),
            };
            debug!(processed, total, percentage = progress.percentage, "chunk flushed");
            on_chunk(progress, chunk.artifacts);
            if (chunk_index + 1) % MEMORY_SAMPLE_INTERVAL == 0 {
                let footprint = self.probe.sample(context.cache.estimated_bytes());
                if footprint > threshold {
                    warn!(footprint, threshold, "memory threshold exceeded");
                    context.cache.prune(CACHE_RETAIN_ENTRIES);
                    self.probe.release_hint();
                }
            }
        }
        info!(processed, total, "streaming complete");
        ScheduleOutcome {
            artifacts: Vec::new(),
            metrics,
        }
    }

    /// Builds jobs with cache keys for a set of ranges.
    fn jobs(&self, operations: &Arc<[Operation]>, ranges: Vec<Range<usize>>, first_id: usize) -> Vec<BatchJob> {
        let fingerprint = if self.options.cache_enabled { Some(self.processor.fingerprint()) } else { None };
        ranges
            .into_iter()
            .enumerate()
            .map(|(offset, range)| {
                let cache_key = fingerprint.as_deref().and_then(|fingerprint| {
                    operations.get(range.clone()).and_then(|slice| batch_cache_key(slice, fingerprint).ok())
                });
                BatchJob {
                    batch_id: first_id + offset,
                    range,
                    cache_key,
                }
            })
            .collect()
    }

    /// Runs jobs through the cache and then inline or on the pool.
    fn run_jobs(
        &self,
        operations: &Arc<[Operation]>,
        jobs: Vec<BatchJob>,
        context: &mut RunContext,
        pooled: bool,
    ) -> ScheduleOutcome {
        let mut results: BTreeMap<usize, (BatchOutput, BatchMetrics)> = BTreeMap::new();
        let mut metrics: BTreeMap<usize, BatchMetrics> = BTreeMap::new();
        let mut misses = Vec::new();
        for job in jobs {
            if let Some(key) = &job.cache_key
                && let Some(output) = context.cache.get(key)
            {
                debug!(batch_id = job.batch_id, "batch cache hit");
                let metric = BatchMetrics {
                    batch_id: job.batch_id,
                    operation_count: job.range.len(),
                    duration_ms: 0,
                    estimated_bytes: output.estimated_bytes(),
                    cache_hit: true,
                    status: BatchStatus::Completed,
                };
                results.insert(job.batch_id, (output, metric));
                continue;
            }
            misses.push(job);
        }
        let completed = if pooled && misses.len() > 1 && self.options.max_workers > 1 {
            self.run_pool(operations, misses, context, &mut metrics)
        } else {
            self.run_inline(operations, misses, context, &mut metrics)
        };
        for (batch_id, (output, metric)) in completed {
            results.insert(batch_id, (output, metric));
        }

        let mut artifacts = Vec::new();
        for (batch_id, (output, metric)) in results {
            for record in output.errors {
                context.recovery.absorb(record);
            }
            artifacts.extend(output.artifacts);
            metrics.insert(batch_id, metric);
        }
        ScheduleOutcome {
            artifacts,
            metrics: metrics.into_values().collect(),
        }
    }

    /// Runs jobs on the coordinating thread.
    fn run_inline(
        &self,
        operations: &Arc<[Operation]>,
        jobs: Vec<BatchJob>,
        context: &mut RunContext,
        metrics: &mut BTreeMap<usize, BatchMetrics>,
    ) -> BTreeMap<usize, (BatchOutput, BatchMetrics)> {
        let mut completed = BTreeMap::new();
        for job in jobs {
            let started = Instant::now();
            let count = job.range.len();
            match run_batch(self.processor.as_ref(), operations, job.batch_id, job.range) {
                Ok(output) => {
                    let metric = completed_metrics(job.batch_id, count, started, &output);
                    if let Some(key) = job.cache_key {
                        context.cache.insert(key, output.clone());
                    }
                    completed.insert(job.batch_id, (output, metric));
                }
                Err(message) => {
                    fail_batch(context, metrics, job.batch_id, count, started, BatchStatus::Failed, message);
                }
            }
        }
        completed
    }

    /// Runs jobs on a pool of named worker threads.
    fn run_pool(
        &self,
        operations: &Arc<[Operation]>,
        jobs: Vec<BatchJob>,
        context: &mut RunContext,
        metrics: &mut BTreeMap<usize, BatchMetrics>,
    ) -> BTreeMap<usize, (BatchOutput, BatchMetrics)> {
        let worker_count = self.options.max_workers.min(jobs.len()).max(1);
        let (sender, receiver) = mpsc::sync_channel::<WorkerMessage>(jobs.len() + worker_count);
        let receiver = Arc::new(Mutex::new(receiver));
        let (reply_sender, replies) = mpsc::channel::<WorkerReply>();
        let mut spawned = 0;
        for worker in 0 .. worker_count {
            let processor = Arc::clone(&self.processor);
            let operations = Arc::clone(operations);
            let receiver = Arc::clone(&receiver);
            let reply_sender = reply_sender.clone();
            let result = thread::Builder::new().name(format!("suitegen-worker-{worker}")).spawn(move || {
                worker_loop(worker, processor.as_ref(), &operations, &receiver, &reply_sender);
            });
            match result {
                Ok(_) => spawned += 1,
                Err(err) => {
                    let error = GenerationError::Dependency(format!("failed to spawn worker thread: {err}"));
                    context.recovery.report(&error, ErrorContext::stage(Stage::Schedule), RecoveryOutcome::Skipped);
                }
            }
        }
        drop(reply_sender);
        if spawned == 0 {
            return self.run_inline(operations, jobs, context, metrics);
        }

        let mut pending: BTreeMap<usize, Pending> = BTreeMap::new();
        for (sequence, job) in (1_u64 ..).zip(jobs) {
            let message = WorkerMessage {
                sequence,
                enqueued_at: Instant::now(),
                payload: WorkerPayload::Process {
                    batch_id: job.batch_id,
                    range: job.range.clone(),
                },
            };
            if sender.try_send(message).is_err() {
                let error = GenerationError::Dependency(format!("worker queue rejected batch {}", job.batch_id));
                context.recovery.report(
                    &error,
                    ErrorContext::stage(Stage::Schedule).with_batch(job.batch_id),
                    RecoveryOutcome::Skipped,
                );
                continue;
            }
            pending.insert(job.batch_id, Pending {
                operation_count: job.range.len(),
                cache_key: job.cache_key,
                dispatched: Instant::now(),
                worker: None,
                started: None,
            });
        }
        for _ in 0 .. spawned {
            let _ = sender.try_send(WorkerMessage {
                sequence: 0,
                enqueued_at: Instant::now(),
                payload: WorkerPayload::Shutdown,
            });
        }

        let timeout = Duration::from_millis(self.options.timeout_ms.max(1));
        let mut completed = BTreeMap::new();
        let mut stuck: BTreeSet<usize> = BTreeSet::new();
        while !pending.is_empty() {
            let now = Instant::now();
            let wait = pending
                .values()
                .filter_map(|batch| batch.started)
                .map(|started| (started + timeout).saturating_duration_since(now))
                .min()
                .unwrap_or(timeout);
            match replies.recv_timeout(wait) {
                Ok(reply) => {
                    let batch_id = reply.batch_id;
                    match reply.payload {
                        ReplyPayload::Started => {
                            if let Some(batch) = pending.get_mut(&batch_id) {
                                batch.worker = Some(reply.worker);
                                batch.started = Some(Instant::now());
                            }
                            debug!(batch_id, worker = reply.worker, "batch started");
                        }
                        ReplyPayload::Completed {
                            output,
                        } => {
                            let Some(batch) = pending.remove(&batch_id) else {
                                stuck.remove(&reply.worker);
                                debug!(batch_id, worker = reply.worker, "discarding late batch result");
                                continue;
                            };
                            let started = batch.started.unwrap_or(now);
                            let metric = completed_metrics(batch_id, batch.operation_count, started, &output);
                            if let Some(key) = batch.cache_key {
                                context.cache.insert(key, output.clone());
                            }
                            completed.insert(batch_id, (output, metric));
                        }
                        ReplyPayload::Failed {
                            message,
                        } => {
                            if let Some(batch) = pending.remove(&batch_id) {
                                let started = batch.started.unwrap_or(now);
                                fail_batch(
                                    context,
                                    metrics,
                                    batch_id,
                                    batch.operation_count,
                                    started,
                                    BatchStatus::Failed,
                                    message,
                                );
                            } else {
                                stuck.remove(&reply.worker);
                            }
                        }
                    }
                }
                Err(RecvTimeoutError::Timeout) => {
                    let now = Instant::now();
                    let expired: Vec<usize> = pending
                        .iter()
                        .filter(|(_, batch)| batch.started.is_some_and(|started| now.duration_since(started) >= timeout))
                        .map(|(batch_id, _)| *batch_id)
                        .collect();
                    for batch_id in expired {
                        if let Some(batch) = pending.remove(&batch_id) {
                            if let Some(worker) = batch.worker {
                                stuck.insert(worker);
                            }
                            let started = batch.started.unwrap_or(now);
                            fail_batch(
                                context,
                                metrics,
                                batch_id,
                                batch.operation_count,
                                started,
                                BatchStatus::TimedOut,
                                format!("batch {batch_id} exceeded {} ms", self.options.timeout_ms),
                            );
                        }
                    }
                }
                Err(RecvTimeoutError::Disconnected) => {
                    for (batch_id, batch) in std::mem::take(&mut pending) {
                        fail_batch(
                            context,
                            metrics,
                            batch_id,
                            batch.operation_count,
                            batch.started.unwrap_or(now),
                            BatchStatus::Failed,
                            "no live workers remain".to_string(),
                        );
                    }
                }
            }
            if !pending.is_empty() && stuck.len() >= spawned {
                warn!(stuck = stuck.len(), queued = pending.len(), "every worker is past its time budget");
                for (batch_id, batch) in std::mem::take(&mut pending) {
                    fail_batch(
                        context,
                        metrics,
                        batch_id,
                        batch.operation_count,
                        batch.dispatched,
                        BatchStatus::TimedOut,
                        format!("batch {batch_id} was never picked up within {} ms", self.options.timeout_ms),
                    );
                }
            }
        }
        completed
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Receives envelopes until shutdown or disconnect.
fn worker_loop<P: BatchProcessor>(
    worker: usize,
    processor: &P,
    operations: &Arc<[Operation]>,
    receiver: &Mutex<mpsc::Receiver<WorkerMessage>>,
    replies: &mpsc::Sender<WorkerReply>,
) {
    loop {
        let message = match receiver.lock() {
            Ok(guard) => guard.recv(),
            Err(_) => return,
        };
        let Ok(message) = message else {
            return;
        };
        match message.payload {
            WorkerPayload::Shutdown => return,
            WorkerPayload::Process {
                batch_id,
                range,
            } => {
                let queue_wait_ms = u64::try_from(message.enqueued_at.elapsed().as_millis()).unwrap_or(u64::MAX);
                debug!(worker, batch_id, sequence = message.sequence, queue_wait_ms, "worker picked up batch");
                let started = WorkerReply {
                    worker,
                    batch_id,
                    payload: ReplyPayload::Started,
                };
                if replies.send(started).is_err() {
                    return;
                }
                let payload = match run_batch(processor, operations, batch_id, range) {
                    Ok(output) => ReplyPayload::Completed {
                        output,
                    },
                    Err(message) => ReplyPayload::Failed {
                        message,
                    },
                };
                let reply = WorkerReply {
                    worker,
                    batch_id,
                    payload,
                };
                if replies.send(reply).is_err() {
                    return;
                }
            }
        }
    }
}

/// Runs one batch, converting panics into an error message.
fn run_batch<P: BatchProcessor + ?Sized>(
    processor: &P,
    operations: &Arc<[Operation]>,
    batch_id: usize,
    range: Range<usize>,
) -> Result<BatchOutput, String> {
    let Some(slice) = operations.get(range) else {
        return Err(format!("batch {batch_id} range is out of bounds"));
    };
    panic::catch_unwind(AssertUnwindSafe(|| processor.process(batch_id, slice))).map_err(|payload| panic_message(&*payload))
}

/// Extracts a message from a panic payload.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|message| (*message).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "batch processor panicked".to_string())
}

/// Builds metrics for a completed batch.
fn completed_metrics(batch_id: usize, operation_count: usize, started: Instant, output: &BatchOutput) -> BatchMetrics {
    BatchMetrics {
        batch_id,
        operation_count,
        duration_ms: elapsed_ms(started),
        estimated_bytes: output.estimated_bytes(),
        cache_hit: false,
        status: BatchStatus::Completed,
    }
}

/// Records a failed or timed-out batch.
fn fail_batch(
    context: &mut RunContext,
    metrics: &mut BTreeMap<usize, BatchMetrics>,
    batch_id: usize,
    operation_count: usize,
    started: Instant,
    status: BatchStatus,
    message: String,
) {
    let error = match status {
        BatchStatus::TimedOut => GenerationError::Timeout(message),
        BatchStatus::Completed | BatchStatus::Failed => GenerationError::Unknown(message),
    };
    warn!(batch_id, status = status.as_str(), "batch did not complete");
    context.recovery.report(&error, ErrorContext::stage(Stage::Schedule).with_batch(batch_id), RecoveryOutcome::Skipped);
    metrics.insert(batch_id, BatchMetrics {
        batch_id,
        operation_count,
        duration_ms: elapsed_ms(started),
        estimated_bytes: 0,
        cache_hit: false,
        status,
    });
}

/// Milliseconds since `started`.
fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Integer completion percentage.
fn percentage(processed: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    u8::try_from(processed.saturating_mul(100) / total).unwrap_or(100)
}
