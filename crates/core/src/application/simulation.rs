// Simulation - orchestrates producers and consumers around one bounded queue

use crate::application::worker::constants::*;
use crate::application::worker::{
    cancel_channel, execute_guarded, CancelSender, CancelToken, ConsumerWorker, PanicGuardResult,
    ProducerWorker,
};
use crate::domain::{BoundedQueue, Message, QueueError, WorkerOutcome, WorkerReport, WorkerRole};
use crate::error::{AppError, Result};
use crate::port::id_provider::UuidProvider;
use crate::port::time_provider::SystemTimeProvider;
use crate::port::{
    CountingObserver, DelayPolicy, IdProvider, NoDelay, QueueObserver, RandomDelay, TimeProvider,
    TracingObserver,
};
use serde::{Serialize, Serializer};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info, info_span, warn, Instrument};

fn as_millis<S: Serializer>(duration: &Duration, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_millis() as u64)
}

/// Simulation configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimulationConfig {
    pub producers: usize,
    pub consumers: usize,
    pub messages_per_producer: usize,
    pub queue_capacity: usize,
    /// Upper bound for the whole run before stragglers are cancelled
    #[serde(rename = "timeout_ms", serialize_with = "as_millis")]
    pub timeout: Duration,
    /// How long cancelled workers get to report back
    #[serde(rename = "grace_period_ms", serialize_with = "as_millis")]
    pub grace_period: Duration,
    /// Exclusive upper bound of the random delay after each produce (zero disables)
    #[serde(rename = "producer_delay_max_ms", serialize_with = "as_millis")]
    pub producer_delay_max: Duration,
    /// Exclusive upper bound of the random delay after each consume (zero disables)
    #[serde(rename = "consumer_delay_max_ms", serialize_with = "as_millis")]
    pub consumer_delay_max: Duration,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            producers: DEFAULT_PRODUCERS,
            consumers: DEFAULT_CONSUMERS,
            messages_per_producer: DEFAULT_MESSAGES_PER_PRODUCER,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            timeout: DEFAULT_COMPLETION_TIMEOUT,
            grace_period: DEFAULT_GRACE_PERIOD,
            producer_delay_max: DEFAULT_PRODUCER_DELAY_MAX,
            consumer_delay_max: DEFAULT_CONSUMER_DELAY_MAX,
        }
    }
}

impl SimulationConfig {
    /// Same shape as default, with simulated delays turned off
    pub fn without_delays(mut self) -> Self {
        self.producer_delay_max = Duration::ZERO;
        self.consumer_delay_max = Duration::ZERO;
        self
    }

    /// Total items the producers will generate (saturates; `validate` rejects overflow)
    pub fn total_messages(&self) -> usize {
        self.producers.saturating_mul(self.messages_per_producer)
    }

    pub fn validate(&self) -> Result<()> {
        if self.producers == 0 {
            return Err(AppError::Validation(
                "at least one producer is required".to_string(),
            ));
        }
        if self.consumers == 0 {
            return Err(AppError::Validation(
                "at least one consumer is required".to_string(),
            ));
        }
        if self.queue_capacity == 0 {
            return Err(QueueError::InvalidArgument(
                "capacity must be positive, got 0".to_string(),
            )
            .into());
        }
        if self.producers.checked_mul(self.messages_per_producer).is_none() {
            return Err(AppError::Validation(format!(
                "{} producers x {} messages overflows the message count",
                self.producers, self.messages_per_producer
            )));
        }
        if self.producers.checked_add(self.consumers).is_none() {
            return Err(AppError::Validation("worker count overflows".to_string()));
        }
        if self.timeout.is_zero() {
            return Err(AppError::Validation("timeout must be positive".to_string()));
        }
        Ok(())
    }

    /// Split the total across consumers; the first `total % consumers` get one extra.
    /// The quotas always sum to `total_messages()`.
    pub fn consumer_quotas(&self) -> Vec<usize> {
        if self.consumers == 0 {
            return Vec::new();
        }
        let total = self.total_messages();
        let base = total / self.consumers;
        let remainder = total % self.consumers;
        (0..self.consumers)
            .map(|i| base + usize::from(i < remainder))
            .collect()
    }
}

/// Outcome of one simulation run
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub run_id: String,
    pub config: SimulationConfig,
    pub expected: usize,
    pub produced: usize,
    pub consumed: usize,
    pub remaining_in_queue: usize,
    pub timed_out: bool,
    /// Workers that neither finished nor stopped within the grace period
    pub detached_workers: usize,
    pub started_at_ms: i64,
    pub finished_at_ms: i64,
    /// Reports in spawn order (producers first); detached workers are `Lost`
    pub workers: Vec<WorkerReport>,
}

impl SimulationReport {
    /// Expected items that never reached a consumer
    pub fn shortfall(&self) -> usize {
        self.expected.saturating_sub(self.consumed)
    }

    pub fn is_complete(&self) -> bool {
        !self.timed_out && self.shortfall() == 0
    }

    pub fn elapsed_ms(&self) -> i64 {
        self.finished_at_ms - self.started_at_ms
    }
}

/// Static description of a spawned worker, used when it cannot report itself
struct WorkerSlot {
    name: String,
    role: WorkerRole,
    quota: usize,
}

impl WorkerSlot {
    fn lost(&self) -> WorkerReport {
        WorkerReport {
            worker: self.name.clone(),
            role: self.role,
            quota: self.quota,
            completed: 0,
            outcome: WorkerOutcome::Lost,
        }
    }
}

/// Slot index plus whatever the worker thread returned
type Finished = (usize, PanicGuardResult<WorkerReport>);

/// Supervisor: one queue, P producers, C consumers, bounded wait for completion
pub struct Simulation {
    config: SimulationConfig,
    producer_delay: Arc<dyn DelayPolicy>,
    consumer_delay: Arc<dyn DelayPolicy>,
    observer: Arc<dyn QueueObserver>,
    time_provider: Arc<dyn TimeProvider>,
    id_provider: Arc<dyn IdProvider>,
}

impl Simulation {
    /// Create a simulation whose delays follow the config's upper bounds
    pub fn new(config: SimulationConfig) -> Self {
        let producer_delay = delay_policy(config.producer_delay_max);
        let consumer_delay = delay_policy(config.consumer_delay_max);
        Self {
            config,
            producer_delay,
            consumer_delay,
            observer: Arc::new(TracingObserver),
            time_provider: Arc::new(SystemTimeProvider),
            id_provider: Arc::new(UuidProvider),
        }
    }

    pub fn with_delays(
        mut self,
        producer_delay: Arc<dyn DelayPolicy>,
        consumer_delay: Arc<dyn DelayPolicy>,
    ) -> Self {
        self.producer_delay = producer_delay;
        self.consumer_delay = consumer_delay;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn QueueObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_time_provider(mut self, time_provider: Arc<dyn TimeProvider>) -> Self {
        self.time_provider = time_provider;
        self
    }

    pub fn with_id_provider(mut self, id_provider: Arc<dyn IdProvider>) -> Self {
        self.id_provider = id_provider;
        self
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Run all workers to completion or until the timeout.
    ///
    /// On timeout the remaining workers are cancelled and given the grace
    /// period to stop; a shortfall is reported, not returned as an error.
    /// A worker panic cancels the run and is returned as `AppError::Worker`.
    pub async fn run(&self) -> Result<SimulationReport> {
        self.config.validate()?;

        let run_id = self.id_provider.generate_id();
        let span = info_span!("simulation", run_id = %run_id);
        self.run_inner(run_id).instrument(span).await
    }

    async fn run_inner(&self, run_id: String) -> Result<SimulationReport> {
        let config = &self.config;
        info!(
            producers = config.producers,
            consumers = config.consumers,
            messages_per_producer = config.messages_per_producer,
            queue_capacity = config.queue_capacity,
            "Starting producer-consumer simulation"
        );

        let started_at_ms = self.time_provider.now_millis();
        let queue = Arc::new(BoundedQueue::<Message>::new(config.queue_capacity)?);
        let (cancel_tx, cancel) = cancel_channel();
        cancel_tx.wake_on_cancel(queue.clone());
        let progress = Arc::new(CountingObserver::new(Arc::clone(&self.observer)));

        let (done_tx, mut done_rx) = mpsc::unbounded_channel::<Finished>();
        let slots = match self.spawn_workers(&queue, &progress, &cancel, &done_tx) {
            Ok(slots) => slots,
            Err(e) => {
                cancel_tx.cancel();
                return Err(e);
            }
        };
        // Only the worker threads hold senders now
        drop(done_tx);

        let mut collector = Collector::new(&slots, &cancel_tx);

        let timed_out = tokio::time::timeout(config.timeout, collector.drain(&mut done_rx))
            .await
            .is_err();

        let mut detached_workers = 0;
        if timed_out {
            warn!(
                timeout_ms = config.timeout.as_millis() as u64,
                outstanding = collector.outstanding(),
                "Completion timeout reached, cancelling remaining workers"
            );
            cancel_tx.cancel();

            let stopped =
                tokio::time::timeout(config.grace_period, collector.drain(&mut done_rx)).await;
            if stopped.is_err() {
                detached_workers = collector.outstanding();
                warn!(
                    stragglers = detached_workers,
                    "Workers did not stop within grace period, detaching"
                );
            }
        }

        if !collector.panics.is_empty() {
            let panics = collector.panics.join("; ");
            error!(panics = %panics, "Simulation aborted by worker panic");
            return Err(AppError::Worker(panics));
        }

        let report = SimulationReport {
            run_id,
            config: config.clone(),
            expected: config.total_messages(),
            produced: progress.produced(),
            consumed: progress.consumed(),
            remaining_in_queue: queue.size(),
            timed_out,
            detached_workers,
            started_at_ms,
            finished_at_ms: self.time_provider.now_millis(),
            workers: collector.into_reports(),
        };

        if report.shortfall() > 0 {
            warn!(
                expected = report.expected,
                consumed = report.consumed,
                shortfall = report.shortfall(),
                "Simulation finished with a shortfall"
            );
        }
        info!(
            expected = report.expected,
            produced = report.produced,
            consumed = report.consumed,
            remaining_in_queue = report.remaining_in_queue,
            elapsed_ms = report.elapsed_ms(),
            "Simulation completed"
        );

        Ok(report)
    }

    /// Start one OS thread per worker, producers first
    fn spawn_workers(
        &self,
        queue: &Arc<BoundedQueue<Message>>,
        progress: &Arc<CountingObserver>,
        cancel: &CancelToken,
        done: &mpsc::UnboundedSender<Finished>,
    ) -> Result<Vec<WorkerSlot>> {
        let config = &self.config;
        let mut slots = Vec::with_capacity(config.producers + config.consumers);

        for i in 1..=config.producers {
            let name = format!("producer-{}", i);
            let quota = config.messages_per_producer;
            let label_prefix = format!("{}-P{}", MESSAGE_LABEL_PREFIX, i);
            let producer = ProducerWorker::new(name.clone(), Arc::clone(queue))
                .with_delay(Arc::clone(&self.producer_delay))
                .with_observer(progress.clone());
            let token = cancel.clone();

            spawn_worker(&name, slots.len(), done, move || {
                producer.run(quota, &label_prefix, &token)
            })?;
            slots.push(WorkerSlot {
                name,
                role: WorkerRole::Producer,
                quota,
            });
        }

        for (i, quota) in config.consumer_quotas().into_iter().enumerate() {
            let name = format!("consumer-{}", i + 1);
            let consumer = ConsumerWorker::new(name.clone(), Arc::clone(queue))
                .with_delay(Arc::clone(&self.consumer_delay))
                .with_observer(progress.clone());
            let token = cancel.clone();

            spawn_worker(&name, slots.len(), done, move || consumer.run(quota, &token))?;
            slots.push(WorkerSlot {
                name,
                role: WorkerRole::Consumer,
                quota,
            });
        }

        Ok(slots)
    }
}

/// Run `work` on a dedicated, named OS thread and send its result to `done`.
/// The thread is never joined; a straggler past the grace period just keeps
/// running until it returns and does not hold up process exit.
fn spawn_worker<F>(
    name: &str,
    index: usize,
    done: &mpsc::UnboundedSender<Finished>,
    work: F,
) -> Result<()>
where
    F: FnOnce() -> WorkerReport + Send + 'static,
{
    let done = done.clone();
    thread::Builder::new()
        .name(name.to_string())
        .spawn(move || {
            let result = execute_guarded(AssertUnwindSafe(work));
            // Receiver is gone once the run has detached this worker
            let _ = done.send((index, result));
        })
        .map(|_| ())
        .map_err(|e| AppError::Internal(format!("failed to spawn {}: {}", name, e)))
}

fn delay_policy(max: Duration) -> Arc<dyn DelayPolicy> {
    if max.is_zero() {
        Arc::new(NoDelay)
    } else {
        Arc::new(RandomDelay::new(max))
    }
}

/// Gathers worker results into their slots as the threads finish
struct Collector<'a> {
    slots: &'a [WorkerSlot],
    cancel_tx: &'a CancelSender,
    reports: Vec<Option<WorkerReport>>,
    panics: Vec<String>,
}

impl<'a> Collector<'a> {
    fn new(slots: &'a [WorkerSlot], cancel_tx: &'a CancelSender) -> Self {
        Self {
            slots,
            cancel_tx,
            reports: vec![None; slots.len()],
            panics: Vec::new(),
        }
    }

    /// Receive until every worker has reported. Cancel safe: results already
    /// received stay collected if the surrounding timeout fires.
    async fn drain(&mut self, done: &mut mpsc::UnboundedReceiver<Finished>) {
        while self.outstanding() > 0 {
            let Some((index, result)) = done.recv().await else {
                break;
            };
            match result {
                PanicGuardResult::Success(report) => {
                    self.reports[index] = Some(report);
                }
                PanicGuardResult::Panicked(msg) => {
                    let slot = &self.slots[index];
                    error!(
                        worker = %slot.name,
                        panic_msg = %msg,
                        "Worker panicked, cancelling run"
                    );
                    self.panics.push(format!("{}: {}", slot.name, msg));
                    self.reports[index] = Some(slot.lost());
                    // Blocked workers must not wait on a queue that may be broken
                    self.cancel_tx.cancel();
                }
            }
        }
    }

    fn outstanding(&self) -> usize {
        self.reports.iter().filter(|r| r.is_none()).count()
    }

    /// Reports in slot order; workers that never reported become `Lost`
    fn into_reports(self) -> Vec<WorkerReport> {
        self.reports
            .into_iter()
            .zip(self.slots)
            .map(|(report, slot)| report.unwrap_or_else(|| slot.lost()))
            .collect()
    }
}
