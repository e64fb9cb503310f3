//! Worker pool management.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver};

use crate::crypto::{Fingerprint, GenerationError};
use crate::matcher::PatternSet;

use super::cpu::{CpuWorker, WorkerStats};
use super::{Candidate, Generator};

const CHANNEL_CAPACITY: usize = 100;

/// A candidate whose fingerprint matched.
#[derive(Debug, Clone)]
pub struct VanityResult<T> {
    /// The matching candidate
    pub item: T,
    /// Its key ID
    pub fingerprint: Fingerprint,
    /// The ID of the worker that found this result
    pub worker_id: usize,
}

/// What a worker reports to the consumer.
#[derive(Debug)]
pub enum WorkerMessage<T> {
    Found(VanityResult<T>),
    Failed {
        worker_id: usize,
        error: GenerationError,
    },
}

/// Manages a pool of workers searching in parallel.
pub struct WorkerPool<T> {
    num_workers: usize,
    patterns: Arc<PatternSet>,
    /// Worker thread handles (Option to allow taking during join)
    handles: Option<Vec<JoinHandle<()>>>,
    result_rx: Receiver<WorkerMessage<T>>,
    stop_flag: Arc<AtomicBool>,
    stats: Arc<WorkerStats>,
    start_time: Instant,
}

impl<T: Candidate> WorkerPool<T> {
    /// Spawns `num_workers` search loops, each with its own generator.
    pub fn new<G, F>(num_workers: usize, patterns: Arc<PatternSet>, make_generator: F) -> io::Result<Self>
    where
        G: Generator<Output = T>,
        F: FnMut(usize) -> G,
    {
        Self::with_stop_flag(
            num_workers,
            patterns,
            Arc::new(AtomicBool::new(false)),
            make_generator,
        )
    }

    /// Like [`WorkerPool::new`], sharing an existing stop flag.
    pub fn with_stop_flag<G, F>(
        num_workers: usize,
        patterns: Arc<PatternSet>,
        stop_flag: Arc<AtomicBool>,
        mut make_generator: F,
    ) -> io::Result<Self>
    where
        G: Generator<Output = T>,
        F: FnMut(usize) -> G,
    {
        let (result_tx, result_rx) = bounded(CHANNEL_CAPACITY);
        let stats = Arc::new(WorkerStats::new());

        let mut pool = Self {
            num_workers,
            patterns: patterns.clone(),
            handles: Some(Vec::with_capacity(num_workers)),
            result_rx,
            stop_flag: stop_flag.clone(),
            stats: stats.clone(),
            start_time: Instant::now(),
        };

        for id in 0..num_workers {
            let worker = CpuWorker::new(
                id,
                make_generator(id),
                patterns.clone(),
                result_tx.clone(),
                stop_flag.clone(),
                stats.clone(),
            );

            // on failure the pool is dropped, which stops and joins what was spawned
            let handle = thread::Builder::new()
                .name(format!("vanity-worker-{}", id))
                .spawn(move || worker.run())?;
            if let Some(handles) = pool.handles.as_mut() {
                handles.push(handle);
            }
        }

        // the channel disconnects once every worker has exited
        drop(result_tx);
        Ok(pool)
    }

    /// Waits for a worker message with timeout.
    ///
    /// Returns `None` if the timeout expires or every worker has exited.
    pub fn wait_for_message(&self, timeout: Duration) -> Option<WorkerMessage<T>> {
        self.result_rx.recv_timeout(timeout).ok()
    }

    /// Stops the pool and yields every message still in flight, ending once
    /// all workers have exited.
    pub fn drain(&self) -> impl Iterator<Item = WorkerMessage<T>> + '_ {
        self.stop();
        self.result_rx.iter()
    }
}

impl<T> WorkerPool<T> {
    /// Signals all workers to stop.
    pub fn stop(&self) {
        self.stop_flag.store(true, Ordering::Relaxed);
    }

    /// Stops the pool and waits for all workers to complete.
    pub fn join(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.stop();
        if let Some(handles) = self.handles.take() {
            for handle in handles {
                // keep the channel moving so no worker stays blocked on a full queue
                while !handle.is_finished() {
                    let _ = self.result_rx.recv_timeout(Duration::from_millis(50));
                }
                let _ = handle.join();
            }
        }
    }

    /// Returns the number of workers.
    pub fn num_workers(&self) -> usize {
        self.num_workers
    }

    /// Returns the rules being searched for.
    pub fn patterns(&self) -> &PatternSet {
        &self.patterns
    }

    /// Returns the total attempts across all workers.
    pub fn total_attempts(&self) -> u64 {
        self.stats.total_attempts()
    }

    /// Returns the total matches found.
    pub fn total_matches(&self) -> u64 {
        self.stats.total_matches()
    }

    /// Returns the elapsed time since the pool was created.
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Returns the current attempt rate per second.
    pub fn attempts_per_second(&self) -> f64 {
        let elapsed = self.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.total_attempts() as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Returns a clone of the stop flag for external use (e.g., signal handlers).
    pub fn stop_flag_clone(&self) -> Arc<AtomicBool> {
        self.stop_flag.clone()
    }

    /// Returns true if the pool has been signaled to stop.
    pub fn is_stopped(&self) -> bool {
        self.stop_flag.load(Ordering::Relaxed)
    }
}

impl<T> Drop for WorkerPool<T> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Emits fingerprints 1, 2, 3, ... forever.
    struct Sequence(u64);

    impl Generator for Sequence {
        type Output = Fingerprint;

        fn generate(&mut self) -> Result<Fingerprint, GenerationError> {
            self.0 += 1;
            Ok(Fingerprint::from_bytes(self.0.to_be_bytes()))
        }
    }

    fn patterns(rules: &str) -> Arc<PatternSet> {
        Arc::new(PatternSet::compile(rules).0)
    }

    #[test]
    fn test_pool_reports_matches() {
        let pool = WorkerPool::new(2, patterns("ff$"), |id| Sequence(id as u64 * 1_000_000)).unwrap();
        assert_eq!(pool.num_workers(), 2);

        let message = pool.wait_for_message(Duration::from_secs(10)).unwrap();
        match message {
            WorkerMessage::Found(result) => assert!(result.fingerprint.to_hex().ends_with("ff")),
            WorkerMessage::Failed { .. } => panic!("unexpected failure"),
        }
        assert!(pool.total_attempts() > 0);
        pool.join();
    }

    #[test]
    fn test_drain_ends_when_workers_exit() {
        let pool = WorkerPool::new(3, patterns("^z"), |_| Sequence(0)).unwrap();
        assert_eq!(pool.drain().count(), 0);
        assert!(pool.is_stopped());
    }

    #[test]
    fn test_shared_stop_flag() {
        let stop = Arc::new(AtomicBool::new(false));
        let pool = WorkerPool::with_stop_flag(1, patterns("0"), stop.clone(), |_| Sequence(0)).unwrap();
        stop.store(true, Ordering::Relaxed);
        assert!(pool.is_stopped());
        pool.join();
    }

    #[test]
    fn test_drop_does_not_hang_with_full_channel() {
        let pool = WorkerPool::new(2, patterns("."), |_| Sequence(0)).unwrap();
        while pool.total_matches() < CHANNEL_CAPACITY as u64 {
            thread::sleep(Duration::from_millis(1));
        }
        drop(pool);
    }
}
