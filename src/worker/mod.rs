//! Worker pool for parallel vanity key search.
//!
//! This module provides:
//! - The generator seam between the search loop and key generation
//! - Multi-threaded CPU workers, each an independent search loop
//! - Shared stop flag and attempt counters

mod cpu;
mod pool;

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::crypto::{Fingerprint, GenerationError, Holder, Identity};

pub use cpu::{CpuWorker, WorkerStats};
pub use pool::{VanityResult, WorkerMessage, WorkerPool};

/// Anything a search loop can test against the pattern set.
pub trait Candidate: Send + 'static {
    fn fingerprint(&self) -> Fingerprint;
}

impl Candidate for Identity {
    #[inline]
    fn fingerprint(&self) -> Fingerprint {
        Identity::fingerprint(self)
    }
}

#[cfg(test)]
impl Candidate for Fingerprint {
    fn fingerprint(&self) -> Fingerprint {
        *self
    }
}

/// Produces one fresh candidate per call.
pub trait Generator: Send + 'static {
    type Output: Candidate;

    fn generate(&mut self) -> Result<Self::Output, GenerationError>;
}

/// Generates certified identities for a fixed holder and creation time.
#[derive(Debug, Clone)]
pub struct IdentityGenerator {
    holder: Arc<Holder>,
    created_at: DateTime<Utc>,
    bits: usize,
}

impl IdentityGenerator {
    pub fn new(holder: Arc<Holder>, created_at: DateTime<Utc>, bits: usize) -> Self {
        Self {
            holder,
            created_at,
            bits,
        }
    }
}

impl Generator for IdentityGenerator {
    type Output = Identity;

    fn generate(&mut self) -> Result<Identity, GenerationError> {
        Identity::generate(&self.holder, self.created_at, self.bits)
    }
}
