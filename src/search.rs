//! The consumer side of a search: receives matches from the worker pool,
//! exports each one, and decides when to stop.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::crypto::{Fingerprint, GenerationError};
use crate::export::{ExportError, ExportedFiles, Persist};
use crate::worker::{Candidate, VanityResult, WorkerMessage, WorkerPool};

/// Longest time the consumer blocks before re-checking the stop flag.
const POLL_INTERVAL: Duration = Duration::from_millis(200);

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("no valid pattern to search for")]
    NoPatterns,
    #[error("worker {worker_id}: key generation failed: {source}")]
    Generation {
        worker_id: usize,
        #[source]
        source: GenerationError,
    },
    #[error("export failed: {0}")]
    Export(#[from] ExportError),
}

/// How many matches to export before stopping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    /// Stop after this many exported matches
    Count(u64),
    /// Run until interrupted
    Continuous,
}

impl SearchMode {
    /// `0` means continuous, as on the command line.
    pub fn from_count(count: u64) -> Self {
        if count == 0 {
            SearchMode::Continuous
        } else {
            SearchMode::Count(count)
        }
    }

    fn is_satisfied(self, exported: usize) -> bool {
        match self {
            SearchMode::Count(n) => exported as u64 >= n,
            SearchMode::Continuous => false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub mode: SearchMode,
    pub report_interval: Duration,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            mode: SearchMode::Continuous,
            report_interval: Duration::from_secs(5),
        }
    }
}

/// Progress notifications for the operator.
#[derive(Debug)]
pub enum SearchEvent<'a> {
    Progress {
        attempts: u64,
        matches: u64,
        elapsed: Duration,
        rate: f64,
    },
    Exported {
        index: usize,
        fingerprint: Fingerprint,
        worker_id: usize,
        files: &'a ExportedFiles,
    },
}

/// Outcome of a finished search.
#[derive(Debug, Clone)]
pub struct SearchSummary {
    pub attempts: u64,
    pub matches: u64,
    pub elapsed: Duration,
    pub rate: f64,
    pub exported: Vec<ExportedFiles>,
    /// True if the stop flag was raised from outside (e.g. Ctrl-C)
    pub interrupted: bool,
}

/// Drives `pool` until the mode is satisfied, the stop flag is raised, or
/// an error occurs.
///
/// Every match is fully exported before the next one is looked at. When the
/// search is interrupted, matches already reported by workers are drained
/// and exported as well.
pub fn run<T, P, F>(
    pool: WorkerPool<T>,
    sink: &P,
    options: &SearchOptions,
    mut on_event: F,
) -> Result<SearchSummary, SearchError>
where
    T: Candidate,
    P: Persist<T>,
    F: FnMut(SearchEvent<'_>),
{
    if pool.patterns().is_empty() {
        return Err(SearchError::NoPatterns);
    }

    let mut exported = Vec::new();
    let mut last_report = pool.elapsed();
    let poll = options.report_interval.min(POLL_INTERVAL).max(Duration::from_millis(1));

    let completed = loop {
        if options.mode.is_satisfied(exported.len()) {
            break true;
        }
        if pool.is_stopped() {
            break false;
        }

        if let Some(message) = pool.wait_for_message(poll) {
            let result = accept(message)?;
            export(sink, result, &mut exported, &mut on_event)?;
        }

        let elapsed = pool.elapsed();
        if elapsed.saturating_sub(last_report) >= options.report_interval {
            last_report = elapsed;
            on_event(SearchEvent::Progress {
                attempts: pool.total_attempts(),
                matches: pool.total_matches(),
                elapsed,
                rate: pool.attempts_per_second(),
            });
        }
    };

    if completed {
        debug!(exported = exported.len(), "target reached");
        pool.stop();
    } else {
        info!("search interrupted, exporting pending matches");
        for message in pool.drain() {
            if options.mode.is_satisfied(exported.len()) {
                break;
            }
            let result = accept(message)?;
            export(sink, result, &mut exported, &mut on_event)?;
        }
    }

    let summary = SearchSummary {
        attempts: pool.total_attempts(),
        matches: pool.total_matches(),
        elapsed: pool.elapsed(),
        rate: pool.attempts_per_second(),
        exported,
        interrupted: !completed,
    };
    pool.join();
    Ok(summary)
}

fn accept<T>(message: WorkerMessage<T>) -> Result<VanityResult<T>, SearchError> {
    match message {
        WorkerMessage::Found(result) => Ok(result),
        WorkerMessage::Failed { worker_id, error } => Err(SearchError::Generation {
            worker_id,
            source: error,
        }),
    }
}

fn export<T, P, F>(
    sink: &P,
    result: VanityResult<T>,
    exported: &mut Vec<ExportedFiles>,
    on_event: &mut F,
) -> Result<(), SearchError>
where
    P: Persist<T>,
    F: FnMut(SearchEvent<'_>),
{
    let files = sink.persist(&result.item).map_err(|e| {
        warn!(key_id = %result.fingerprint, error = %e, "export failed");
        e
    })?;
    info!(key_id = %result.fingerprint, asc = %files.asc.display(), pem = %files.pem.display(), "exported match");

    exported.push(files);
    on_event(SearchEvent::Exported {
        index: exported.len(),
        fingerprint: result.fingerprint,
        worker_id: result.worker_id,
        files: &exported[exported.len() - 1],
    });
    Ok(())
}
