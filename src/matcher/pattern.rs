//! Pattern matching implementation.

use std::fmt;

use regex::Regex;

/// Number of hex characters in a rendered fingerprint.
const FINGERPRINT_HEX_LEN: usize = 16;

/// Result of a pattern match operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchResult {
    /// At least one rule matched
    Match,
    /// No match
    NoMatch,
}

impl MatchResult {
    #[inline]
    pub fn is_match(self) -> bool {
        matches!(self, MatchResult::Match)
    }
}

/// A rule that could not be compiled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternDiagnostic {
    /// The rule text as supplied by the operator
    pub rule: String,
    /// Why it was rejected
    pub reason: String,
}

impl fmt::Display for PatternDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid pattern '{}': {}", self.rule, self.reason)
    }
}

/// A single compiled rule.
#[derive(Debug, Clone)]
pub struct Pattern {
    rule: String,
    regex: Regex,
}

impl Pattern {
    /// Compiles a rule as a case-sensitive regular expression.
    pub fn new(rule: impl Into<String>) -> Result<Self, PatternDiagnostic> {
        let rule = rule.into();
        match Regex::new(&rule) {
            Ok(regex) => Ok(Self { rule, regex }),
            Err(e) => Err(PatternDiagnostic {
                reason: e.to_string(),
                rule,
            }),
        }
    }

    /// Returns the rule text.
    pub fn rule(&self) -> &str {
        &self.rule
    }

    /// Searches the fingerprint for the rule.
    #[inline]
    pub fn matches(&self, fingerprint: &str) -> MatchResult {
        if self.regex.is_match(fingerprint) {
            MatchResult::Match
        } else {
            MatchResult::NoMatch
        }
    }

    /// Returns the expected number of attempts per match, when the rule is a
    /// plain lowercase hex literal (optionally anchored with `^` and/or `$`).
    ///
    /// For a literal of length n there are 16^n equally likely values, spread
    /// over 17 - n possible positions unless the rule is anchored.
    pub fn estimated_difficulty(&self) -> Option<u64> {
        let (anchored_start, rest) = match self.rule.strip_prefix('^') {
            Some(rest) => (true, rest),
            None => (false, self.rule.as_str()),
        };
        let (anchored_end, literal) = match rest.strip_suffix('$') {
            Some(literal) => (true, literal),
            None => (false, rest),
        };

        let is_literal = !literal.is_empty()
            && literal
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c));
        if !is_literal || literal.len() > FINGERPRINT_HEX_LEN {
            return None;
        }

        let n = literal.len();
        let positions = match (anchored_start, anchored_end) {
            (true, true) if n != FINGERPRINT_HEX_LEN => return None,
            (true, _) | (_, true) => 1,
            (false, false) => (FINGERPRINT_HEX_LEN + 1 - n) as u64,
        };

        Some((16u64.saturating_pow(n as u32) / positions).max(1))
    }
}

/// An ordered set of compiled rules; matching is a logical OR.
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    patterns: Vec<Pattern>,
}

impl PatternSet {
    /// Splits a comma-delimited rule string and compiles every rule.
    ///
    /// Each piece is compiled exactly as written, so an empty piece is the
    /// empty regex and matches every fingerprint. Rules that fail to compile
    /// are returned as diagnostics and left out of the set.
    pub fn compile(rules: &str) -> (Self, Vec<PatternDiagnostic>) {
        Self::from_rules(rules.split(','))
    }

    /// Compiles each rule of an already split rule list.
    pub fn from_rules<I, S>(rules: I) -> (Self, Vec<PatternDiagnostic>)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut patterns = Vec::new();
        let mut diagnostics = Vec::new();

        for rule in rules {
            match Pattern::new(rule) {
                Ok(pattern) => patterns.push(pattern),
                Err(diagnostic) => diagnostics.push(diagnostic),
            }
        }

        (Self { patterns }, diagnostics)
    }

    /// Returns `Match` iff at least one rule matches, stopping at the first hit.
    #[inline]
    pub fn matches(&self, fingerprint: &str) -> MatchResult {
        if self
            .patterns
            .iter()
            .any(|p| p.matches(fingerprint).is_match())
        {
            MatchResult::Match
        } else {
            MatchResult::NoMatch
        }
    }

    /// Returns true if no rule survived compilation; such a set never matches.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Returns the number of compiled rules.
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Iterates over the compiled rules in order.
    pub fn iter(&self) -> impl Iterator<Item = &Pattern> {
        self.patterns.iter()
    }

    /// Returns the expected number of attempts per match for the whole set,
    /// when every rule is a hex literal.
    pub fn estimated_difficulty(&self) -> Option<u64> {
        if self.patterns.is_empty() {
            return None;
        }

        let mut probability = 0.0f64;
        for pattern in &self.patterns {
            probability += 1.0 / pattern.estimated_difficulty()? as f64;
        }

        Some((1.0 / probability.min(1.0)).round() as u64)
    }

    /// Returns a human-readable difficulty estimate.
    ///
    /// Key generation dominates the cost of every attempt, so the buckets are
    /// far lower than for hash-based vanity searches.
    pub fn difficulty_description(&self) -> String {
        match self.estimated_difficulty() {
            None => "Unknown (regular expression)".into(),
            Some(0..=16) => "Very Easy (seconds)".into(),
            Some(17..=256) => "Easy (minutes)".into(),
            Some(257..=4_096) => "Medium (hours)".into(),
            Some(4_097..=65_536) => "Hard (days)".into(),
            Some(_) => "Very Hard (weeks or more)".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substring_match() {
        let pattern = Pattern::new("dead").unwrap();
        assert!(pattern.matches("0123deadbeef4567").is_match());
        assert!(!pattern.matches("0123beefbeef4567").is_match());
    }

    #[test]
    fn test_anchored_rule() {
        let pattern = Pattern::new("^0000").unwrap();
        assert!(pattern.matches("0000a1b2c3d4e5f6").is_match());
        assert!(!pattern.matches("a1b20000c3d4e5f6").is_match());
    }

    #[test]
    fn test_case_sensitive() {
        let pattern = Pattern::new("BEEF").unwrap();
        assert!(!pattern.matches("0123deadbeef4567").is_match());
    }

    #[test]
    fn test_regex_rule() {
        let pattern = Pattern::new("dead.*beef").unwrap();
        assert!(pattern.matches("dead0000beef1111").is_match());
        assert!(!pattern.matches("beef0000dead1111").is_match());
    }

    #[test]
    fn test_compile_reports_invalid_rules() {
        let (set, diagnostics) = PatternSet::compile("dead,(unclosed,beef");
        assert_eq!(set.len(), 2);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].rule, "(unclosed");
        assert!(diagnostics[0].to_string().starts_with("invalid pattern '(unclosed'"));
    }

    #[test]
    fn test_compile_keeps_rules_verbatim() {
        let (set, diagnostics) = PatternSet::compile(" dead,beef");
        let rules: Vec<_> = set.iter().map(Pattern::rule).collect();
        assert_eq!(rules, [" dead", "beef"]);
        assert!(diagnostics.is_empty());
        assert!(!set.matches("dead000000000000").is_match());
    }

    #[test]
    fn test_trailing_comma_matches_everything() {
        let (set, diagnostics) = PatternSet::compile("dead,");
        assert_eq!(set.len(), 2);
        assert!(diagnostics.is_empty());
        assert!(set.matches("1111111111111111").is_match());
        assert_eq!(set.estimated_difficulty(), None);
    }

    #[test]
    fn test_set_is_logical_or() {
        let (set, _) = PatternSet::compile("^ffff,cafe$");
        assert!(set.matches("ffff000000000000").is_match());
        assert!(set.matches("000000000000cafe").is_match());
        assert!(!set.matches("0000ffffcafe0000").is_match());
    }

    #[test]
    fn test_empty_set_never_matches() {
        let (set, diagnostics) = PatternSet::compile("[,(");
        assert!(set.is_empty());
        assert_eq!(diagnostics.len(), 2);
        assert!(!set.matches("0000000000000000").is_match());
    }

    #[test]
    fn test_difficulty() {
        assert_eq!(Pattern::new("^dead").unwrap().estimated_difficulty(), Some(65536));
        assert_eq!(Pattern::new("dead").unwrap().estimated_difficulty(), Some(65536 / 13));
        assert_eq!(Pattern::new("dead.*beef").unwrap().estimated_difficulty(), None);

        let (set, _) = PatternSet::compile("^00,^ff");
        assert_eq!(set.estimated_difficulty(), Some(128));
        assert_eq!(set.difficulty_description(), "Easy (minutes)");
    }
}
