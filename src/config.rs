//! Command-line configuration for the search and conversion binaries.

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, SubsecRound, Utc};
use clap::{Args, Parser};

use crate::crypto::Holder;
use crate::matcher::{PatternDiagnostic, PatternSet};

/// Format of `--date`, always interpreted as UTC.
pub const DATE_FORMAT: &str = "%Y-%m-%d_%H:%M:%S";

/// Identity of the key holder, shared by `vanityid` and `rsa2opgp`.
#[derive(Args, Debug, Clone)]
pub struct HolderArgs {
    /// Name of the key holder
    #[arg(short, long)]
    pub name: String,

    /// Optional comment for the user id
    #[arg(short, long, default_value = "")]
    pub comment: String,

    /// Email address of the key holder
    #[arg(short, long)]
    pub email: String,

    /// Key creation time as YYYY-MM-DD_HH:MM:SS in UTC (default: now)
    #[arg(short, long)]
    pub date: Option<String>,
}

impl HolderArgs {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::EmptyName);
        }
        if self.email.trim().is_empty() {
            return Err(ConfigError::EmptyEmail);
        }
        self.creation_time()?;
        Ok(())
    }

    pub fn holder(&self) -> Holder {
        Holder::new(&self.name, &self.comment, &self.email)
    }

    /// Returns the requested creation time, or the current time truncated to
    /// whole seconds.
    pub fn creation_time(&self) -> Result<DateTime<Utc>, ConfigError> {
        match &self.date {
            Some(date) => parse_date(date),
            None => Ok(Utc::now().trunc_subsecs(0)),
        }
    }
}

/// Vanity OpenPGP key ID generator
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    #[command(flatten)]
    pub holder: HolderArgs,

    /// RSA key size in bits
    #[arg(short, long, default_value = "4096")]
    pub bits: usize,

    /// Comma-separated regular expressions matched against the key ID
    #[arg(short, long)]
    pub pattern: String,

    /// Directory the matching keys are written to
    #[arg(short, long, default_value = ".")]
    pub out: PathBuf,

    /// Number of worker threads (default: number of CPU cores)
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Stop after exporting N keys (0 = run until interrupted)
    #[arg(short = 'k', long, default_value = "0")]
    pub count: u64,

    /// Progress report interval in seconds
    #[arg(short, long, default_value = "5")]
    pub report_interval: u64,
}

impl Config {
    /// Returns the number of workers, defaulting to CPU count
    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(num_cpus::get)
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.holder.validate()?;

        if self.worker_count() == 0 {
            return Err(ConfigError::NoWorkers);
        }

        let (patterns, _) = self.patterns();
        if patterns.is_empty() {
            return Err(ConfigError::NoPatterns);
        }

        check_output_dir(&self.out)
    }

    /// Compiles the pattern list; invalid rules come back as diagnostics.
    pub fn patterns(&self) -> (PatternSet, Vec<PatternDiagnostic>) {
        PatternSet::compile(&self.pattern)
    }
}

/// Convert an OpenPGP private key into a PEM RSA private key
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Opgp2RsaConfig {
    /// Armored OpenPGP private key
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Passphrase of an encrypted private key
    #[arg(short, long)]
    pub passphrase: Option<String>,
}

/// Convert a PEM RSA private key into an OpenPGP key
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Rsa2OpgpConfig {
    /// PEM encoded RSA private key (PKCS#1 or PKCS#8)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub holder: HolderArgs,
}

/// Parses a `YYYY-MM-DD_HH:MM:SS` UTC timestamp.
pub fn parse_date(date: &str) -> Result<DateTime<Utc>, ConfigError> {
    NaiveDateTime::parse_from_str(date, DATE_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|source| ConfigError::InvalidDate {
            date: date.to_string(),
            source,
        })
}

fn check_output_dir(dir: &Path) -> Result<(), ConfigError> {
    let unusable = |reason: String| ConfigError::OutputDir {
        path: dir.to_path_buf(),
        reason,
    };

    if !dir.is_dir() {
        return Err(unusable("not a directory".into()));
    }
    tempfile::NamedTempFile::new_in(dir)
        .map(drop)
        .map_err(|e| unusable(format!("not writable: {e}")))
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Name must not be empty")]
    EmptyName,
    #[error("Email must not be empty")]
    EmptyEmail,
    #[error("Invalid date '{date}' (expected YYYY-MM-DD_HH:MM:SS): {source}")]
    InvalidDate {
        date: String,
        #[source]
        source: chrono::ParseError,
    },
    #[error("Output directory {path} is unusable: {reason}")]
    OutputDir { path: PathBuf, reason: String },
    #[error("No valid pattern given")]
    NoPatterns,
    #[error("At least one worker is required")]
    NoWorkers,
}
