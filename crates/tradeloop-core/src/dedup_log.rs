//! Log-once cache.

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::fmt::Display;
use tracing::info;

use crate::types::Side;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct DedupKey {
    logger: String,
    symbol: String,
    date: DateTime<Utc>,
    direction: Side,
    action: String,
}

/// Emits each (logger, symbol, date, direction, action) message at most once.
///
/// Keys are never evicted; the set lives as long as its owner.
#[derive(Debug, Default)]
pub struct DedupLog {
    seen: HashSet<DedupKey>,
}

impl DedupLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log `message` at info level unless this key was already logged.
    ///
    /// Returns `true` if the message was emitted.
    pub fn log_once(
        &mut self,
        logger: &str,
        symbol: &str,
        date: DateTime<Utc>,
        direction: Side,
        action: &str,
        message: impl Display,
    ) -> bool {
        let key = DedupKey {
            logger: logger.to_string(),
            symbol: symbol.to_string(),
            date,
            direction,
            action: action.to_string(),
        };
        if !self.seen.insert(key) {
            return false;
        }

        info!(logger, action, "[{}] [{}] [{}] - {}", symbol, date, direction, message);
        true
    }

    /// Check whether a key has been logged.
    pub fn contains(
        &self,
        logger: &str,
        symbol: &str,
        date: DateTime<Utc>,
        direction: Side,
        action: &str,
    ) -> bool {
        self.seen.contains(&DedupKey {
            logger: logger.to_string(),
            symbol: symbol.to_string(),
            date,
            direction,
            action: action.to_string(),
        })
    }

    /// Number of distinct keys logged so far.
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 4, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_identical_key_logs_once() {
        let mut log = DedupLog::new();

        let emitted: Vec<bool> = (0..5)
            .map(|i| log.log_once("ma_cross", "EURUSD", noon(), Side::Buy, "entry", i))
            .collect();

        assert_eq!(emitted, vec![true, false, false, false, false]);
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_each_key_component_distinguishes() {
        let mut log = DedupLog::new();
        let later = noon() + chrono::Duration::hours(1);

        assert!(log.log_once("a", "EURUSD", noon(), Side::Buy, "entry", "x"));
        assert!(log.log_once("b", "EURUSD", noon(), Side::Buy, "entry", "x"));
        assert!(log.log_once("a", "GBPUSD", noon(), Side::Buy, "entry", "x"));
        assert!(log.log_once("a", "EURUSD", later, Side::Buy, "entry", "x"));
        assert!(log.log_once("a", "EURUSD", noon(), Side::Sell, "entry", "x"));
        assert!(log.log_once("a", "EURUSD", noon(), Side::Buy, "exit", "x"));

        assert_eq!(log.len(), 6);
        assert!(log.contains("a", "EURUSD", later, Side::Buy, "entry"));
        assert!(!log.contains("a", "EURUSD", later, Side::Sell, "exit"));
    }

    #[test]
    fn test_message_is_not_part_of_key() {
        let mut log = DedupLog::new();
        assert!(log.log_once("a", "EURUSD", noon(), Side::Buy, "entry", "first"));
        assert!(!log.log_once("a", "EURUSD", noon(), Side::Buy, "entry", "second"));
    }
}
