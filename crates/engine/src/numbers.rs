//! Business number generation for settlements.
//!
//! Numbers are `prefix + suffix`. The generator is injected into the
//! [`Engine`](crate::Engine) so tests can use deterministic sequences.

use std::{
    fmt,
    sync::atomic::{AtomicU64, Ordering},
};

use chrono::Utc;
use uuid::Uuid;

/// Prefix used for settlement numbers.
pub const SETTLEMENT_PREFIX: &str = "ST";

pub trait NumberGenerator: Send + Sync + fmt::Debug {
    /// Returns a new number for the given type prefix.
    fn next_number(&self, prefix: &str) -> String;
}

/// `prefix + yyyymmddHHMMSS + 6 random hex digits`.
///
/// Uniqueness is probabilistic; the `settlements.settlement_no` unique index
/// is the final guard.
#[derive(Debug, Default)]
pub struct TimestampNumberGenerator;

impl NumberGenerator for TimestampNumberGenerator {
    fn next_number(&self, prefix: &str) -> String {
        let random = Uuid::new_v4().simple().to_string();
        format!(
            "{prefix}{}{}",
            Utc::now().format("%Y%m%d%H%M%S"),
            random[..6].to_ascii_uppercase()
        )
    }
}

/// Deterministic `prefix + zero-padded counter`, starting at 1.
#[derive(Debug)]
pub struct SequenceNumberGenerator {
    next: AtomicU64,
}

impl SequenceNumberGenerator {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    pub fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }
}

impl Default for SequenceNumberGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl NumberGenerator for SequenceNumberGenerator {
    fn next_number(&self, prefix: &str) -> String {
        let value = self.next.fetch_add(1, Ordering::Relaxed);
        format!("{prefix}{value:08}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_numbers_carry_prefix_and_length() {
        let generator = TimestampNumberGenerator;
        let number = generator.next_number(SETTLEMENT_PREFIX);
        assert!(number.starts_with("ST"));
        assert_eq!(number.len(), 2 + 14 + 6);
        assert_ne!(number, generator.next_number(SETTLEMENT_PREFIX));
    }

    #[test]
    fn sequence_numbers_are_deterministic() {
        let generator = SequenceNumberGenerator::starting_at(7);
        assert_eq!(generator.next_number("ST"), "ST00000007");
        assert_eq!(generator.next_number("WD"), "WD00000008");
    }
}
