//! CPU-based search loop.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam_channel::Sender;
use tracing::{debug, info, warn};

use crate::matcher::PatternSet;

use super::{Candidate, Generator, VanityResult, WorkerMessage};

/// Counters shared by every worker of a pool.
#[derive(Debug, Default)]
pub struct WorkerStats {
    /// Candidates generated and tested
    pub attempts: AtomicU64,
    /// Candidates that matched at least one rule
    pub matches_found: AtomicU64,
}

impl WorkerStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total attempts.
    pub fn total_attempts(&self) -> u64 {
        self.attempts.load(Ordering::Relaxed)
    }

    /// Returns the total matches found.
    pub fn total_matches(&self) -> u64 {
        self.matches_found.load(Ordering::Relaxed)
    }
}

/// A CPU worker that generates candidates and tests their fingerprints.
pub struct CpuWorker<G: Generator> {
    id: usize,
    generator: G,
    patterns: Arc<PatternSet>,
    result_tx: Sender<WorkerMessage<G::Output>>,
    stop_flag: Arc<AtomicBool>,
    stats: Arc<WorkerStats>,
}

impl<G: Generator> CpuWorker<G> {
    pub fn new(
        id: usize,
        generator: G,
        patterns: Arc<PatternSet>,
        result_tx: Sender<WorkerMessage<G::Output>>,
        stop_flag: Arc<AtomicBool>,
        stats: Arc<WorkerStats>,
    ) -> Self {
        Self {
            id,
            generator,
            patterns,
            result_tx,
            stop_flag,
            stats,
        }
    }

    /// Runs the search loop.
    ///
    /// The stop flag is only consulted between attempts, so an attempt that
    /// already started always completes. The loop ends when:
    /// - the stop flag is set
    /// - generation fails (the pool is stopped and the error forwarded)
    /// - the receiving side is gone
    pub fn run(mut self) {
        debug!(worker = self.id, "worker started");

        while !self.stop_flag.load(Ordering::Relaxed) {
            let candidate = match self.generator.generate() {
                Ok(candidate) => candidate,
                Err(error) => {
                    warn!(worker = self.id, %error, "key generation failed");
                    self.stop_flag.store(true, Ordering::Relaxed);
                    let _ = self.result_tx.send(WorkerMessage::Failed {
                        worker_id: self.id,
                        error,
                    });
                    break;
                }
            };
            self.stats.attempts.fetch_add(1, Ordering::Relaxed);

            let fingerprint = candidate.fingerprint();
            if !self.patterns.matches(&fingerprint.to_hex()).is_match() {
                continue;
            }

            self.stats.matches_found.fetch_add(1, Ordering::Relaxed);
            info!(worker = self.id, key_id = %fingerprint, "found match");

            let result = VanityResult {
                item: candidate,
                fingerprint,
                worker_id: self.id,
            };
            if self.result_tx.send(WorkerMessage::Found(result)).is_err() {
                break;
            }
        }

        debug!(worker = self.id, "worker stopped");
    }

    /// Returns the worker ID.
    pub fn id(&self) -> usize {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{Fingerprint, GenerationError};
    use crossbeam_channel::unbounded;

    struct Counter {
        next: u64,
        fail_at: Option<u64>,
    }

    impl Generator for Counter {
        type Output = Fingerprint;

        fn generate(&mut self) -> Result<Fingerprint, GenerationError> {
            if self.fail_at == Some(self.next) {
                return Err(GenerationError::InvalidKey);
            }
            self.next += 1;
            Ok(Fingerprint::from_bytes(self.next.to_be_bytes()))
        }
    }

    fn patterns(rules: &str) -> Arc<PatternSet> {
        Arc::new(PatternSet::compile(rules).0)
    }

    #[test]
    fn test_failure_stops_worker() {
        let (tx, rx) = unbounded();
        let stop = Arc::new(AtomicBool::new(false));
        let stats = Arc::new(WorkerStats::new());
        let generator = Counter {
            next: 0,
            fail_at: Some(40),
        };

        CpuWorker::new(3, generator, patterns("0$"), tx, stop.clone(), stats.clone()).run();

        assert!(stop.load(Ordering::Relaxed));
        assert_eq!(stats.total_attempts(), 40);
        assert_eq!(stats.total_matches(), 2);

        let messages: Vec<_> = rx.iter().collect();
        assert_eq!(messages.len(), 3);
        assert!(matches!(&messages[0], WorkerMessage::Found(r) if r.fingerprint.to_u64() == 0x10));
        assert!(matches!(&messages[2], WorkerMessage::Failed { worker_id: 3, .. }));
    }

    #[test]
    fn test_stop_flag_checked_before_attempt() {
        let (tx, rx) = unbounded();
        let stop = Arc::new(AtomicBool::new(true));
        let stats = Arc::new(WorkerStats::new());
        let generator = Counter {
            next: 0,
            fail_at: None,
        };

        CpuWorker::new(0, generator, patterns("."), tx, stop, stats.clone()).run();

        assert_eq!(stats.total_attempts(), 0);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_closed_channel_ends_loop() {
        let (tx, rx) = unbounded();
        drop(rx);
        let stop = Arc::new(AtomicBool::new(false));
        let stats = Arc::new(WorkerStats::new());
        let generator = Counter {
            next: 0,
            fail_at: None,
        };

        CpuWorker::new(0, generator, patterns("."), tx, stop, stats.clone()).run();
        assert_eq!(stats.total_attempts(), 1);
    }
}
