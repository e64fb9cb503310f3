//! Pattern matching for key fingerprints.
//!
//! Operator rules are regular expressions searched (not anchored) within the
//! 16-character lowercase hex fingerprint:
//! - A rule set is a comma-delimited list; a fingerprint matches if any rule does
//! - Rules that fail to compile are reported and dropped, never fatal

mod pattern;

pub use pattern::{MatchResult, Pattern, PatternDiagnostic, PatternSet};
