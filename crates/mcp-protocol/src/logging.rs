//! Logging severities (§4.9 "log-level gating"), mapped to RFC-5424 syslog
//! severities exactly as the MCP spec requires.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoggingLevel {
    Debug,
    Info,
    Notice,
    Warning,
    Error,
    Critical,
    Alert,
    Emergency,
}

impl LoggingLevel {
    /// `0` (debug) through `7` (emergency); `Ord` on the enum already reflects
    /// this, this exists for call sites that want the raw number.
    pub fn priority(self) -> u8 {
        self as u8
    }

    /// True when `self` is at least as severe as `threshold` — the rule
    /// §4.9 uses to gate `notifications/message` delivery.
    pub fn should_log(self, threshold: LoggingLevel) -> bool {
        self >= threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_is_strictly_increasing() {
        let levels = [
            LoggingLevel::Debug,
            LoggingLevel::Info,
            LoggingLevel::Notice,
            LoggingLevel::Warning,
            LoggingLevel::Error,
            LoggingLevel::Critical,
            LoggingLevel::Alert,
            LoggingLevel::Emergency,
        ];
        for pair in levels.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn should_log_compares_against_threshold() {
        assert!(LoggingLevel::Error.should_log(LoggingLevel::Warning));
        assert!(LoggingLevel::Warning.should_log(LoggingLevel::Warning));
        assert!(!LoggingLevel::Info.should_log(LoggingLevel::Error));
    }

    #[test]
    fn serializes_lowercase() {
        let json = serde_json::to_string(&LoggingLevel::Notice).unwrap();
        assert_eq!(json, "\"notice\"");
    }
}
