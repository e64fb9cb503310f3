//! # vanityid
//!
//! Vanity OpenPGP key ID generator.
//!
//! ## Architecture
//!
//! - `crypto`: RSA key generation, self-certified identities, key IDs
//! - `matcher`: Regular-expression rules over the hex key ID
//! - `worker`: Parallel search loops and worker pool management
//! - `search`: Consuming matches, exporting them, stopping
//! - `export` / `armor`: `.asc` and `.pem` artifacts
//! - `convert`: OpenPGP and raw RSA key conversions
//! - `config`: Command-line configuration

pub mod armor;
pub mod config;
pub mod convert;
pub mod crypto;
pub mod export;
pub mod matcher;
pub mod search;
pub mod worker;

pub use config::Config;
pub use crypto::{Fingerprint, GenerationError, Holder, Identity};
pub use export::{ExportError, ExportedFiles, Exporter, Persist};
pub use matcher::{MatchResult, Pattern, PatternDiagnostic, PatternSet};
pub use search::{SearchError, SearchEvent, SearchMode, SearchOptions, SearchSummary};
pub use worker::{IdentityGenerator, VanityResult, WorkerPool};

/// Installs the `tracing` subscriber used by every binary.
///
/// Defaults to `info`, overridable through `RUST_LOG`.
pub fn init_logging() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
