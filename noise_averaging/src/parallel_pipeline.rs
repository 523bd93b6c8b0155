// THEORY:
// The parallel sampler spreads sample synthesis across a pool of tokio workers
// while keeping the two guarantees the sequential path gives for free:
//
// 1.  **Independent generators**: no generator is shared. Every sample is produced
//     with its own `StdRng`, seeded from (base seed, sample index). The same base
//     seed therefore yields the same sample set regardless of worker count or
//     scheduling.
// 2.  **Stable order**: the sample index is assigned when the task is dispatched.
//     Results come back in completion order, are parked in a pending map, and are
//     released into the `SampleSet` strictly in index order.

use crate::core_modules::frame::frame::Frame;
use crate::core_modules::noise_injector::inject;
use crate::core_modules::noise_ratio::NoiseRatioRange;
use crate::core_modules::sample_set::SampleSet;
use crate::error::{AveragingError, Result};
use futures::stream::{FuturesUnordered, StreamExt};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

pub struct SampleTask {
    pub index: usize,
    pub seed: u64,
    pub result_sender: oneshot::Sender<Result<Frame>>,
}

/// Seed of the generator that produces sample `index`.
pub fn sample_seed(base_seed: u64, index: usize) -> u64 {
    base_seed.wrapping_add(index as u64)
}

/// Produces sample `index` exactly as a pool worker would.
pub fn generate_sample(
    reference: &Frame,
    range: &NoiseRatioRange,
    base_seed: u64,
    index: usize,
) -> Result<Frame> {
    generate_seeded(reference, range, sample_seed(base_seed, index))
}

fn generate_seeded(reference: &Frame, range: &NoiseRatioRange, seed: u64) -> Result<Frame> {
    let mut rng = StdRng::seed_from_u64(seed);
    let ratio = range.sample(&mut rng);
    inject(reference, ratio, &mut rng)
}

pub struct WorkerPool {
    task_sender: mpsc::UnboundedSender<SampleTask>,
    workers: Vec<tokio::task::JoinHandle<()>>,
}

impl WorkerPool {
    /// Must be called from within a tokio runtime.
    pub fn new(reference: Arc<Frame>, range: NoiseRatioRange, worker_count: usize) -> Self {
        let worker_count = worker_count.max(1);
        let (task_sender, mut task_receiver) = mpsc::unbounded_channel::<SampleTask>();
        let mut workers = Vec::with_capacity(worker_count);

        let (worker_senders, worker_receivers): (Vec<_>, Vec<_>) = (0..worker_count)
            .map(|_| mpsc::unbounded_channel::<SampleTask>())
            .unzip();

        // Round-robin dispatcher
        tokio::spawn(async move {
            let mut worker_idx = 0;
            while let Some(task) = task_receiver.recv().await {
                let _ = worker_senders[worker_idx].send(task);
                worker_idx = (worker_idx + 1) % worker_count;
            }
        });

        for mut worker_receiver in worker_receivers {
            let reference = Arc::clone(&reference);
            let worker = tokio::spawn(async move {
                while let Some(task) = worker_receiver.recv().await {
                    debug!(index = task.index, "worker generating sample");
                    let sample = generate_seeded(&reference, &range, task.seed);
                    let _ = task.result_sender.send(sample);
                }
            });
            workers.push(worker);
        }

        Self {
            task_sender,
            workers,
        }
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    pub fn submit(&self, index: usize, seed: u64) -> Result<oneshot::Receiver<Result<Frame>>> {
        let (result_sender, result_receiver) = oneshot::channel();
        self.task_sender
            .send(SampleTask {
                index,
                seed,
                result_sender,
            })
            .map_err(|_| AveragingError::Worker("failed to send task to worker pool"))?;
        Ok(result_receiver)
    }
}

pub struct ParallelSampler {
    worker_pool: WorkerPool,
    base_seed: u64,
}

impl ParallelSampler {
    /// `workers == 0` sizes the pool to the number of CPUs.
    pub fn new(
        reference: Frame,
        range: NoiseRatioRange,
        base_seed: u64,
        workers: usize,
    ) -> Result<Self> {
        if reference.is_empty() {
            return Err(AveragingError::invalid("image", "reference image has no pixels"));
        }
        let workers = if workers == 0 { num_cpus::get() } else { workers };
        Ok(Self {
            worker_pool: WorkerPool::new(Arc::new(reference), range, workers),
            base_seed,
        })
    }

    pub fn worker_count(&self) -> usize {
        self.worker_pool.worker_count()
    }

    pub async fn generate(&self, count: usize) -> Result<SampleSet> {
        if count == 0 {
            return Err(AveragingError::invalid("sample_count", "at least one sample is required"));
        }

        let mut in_flight = FuturesUnordered::new();
        for index in 0..count {
            let receiver = self
                .worker_pool
                .submit(index, sample_seed(self.base_seed, index))?;
            in_flight.push(async move { (index, receiver.await) });
        }

        let mut pending: HashMap<usize, Frame> = HashMap::new();
        let mut samples = SampleSet::with_capacity(count);
        while let Some((index, received)) = in_flight.next().await {
            let sample =
                received.map_err(|_| AveragingError::Worker("failed to receive result from worker"))??;
            debug!(index, "parallel sample ready");
            pending.insert(index, sample);

            while let Some(next) = pending.remove(&samples.len()) {
                samples.push(next);
            }
        }
        Ok(samples)
    }
}
