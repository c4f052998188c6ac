use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::str::FromStr;

use crate::error::TelemetryError;

/// Set of telemetry signals an exporter configuration applies to.
///
/// Values combine with `|`; a zero value selects nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SignalKind(u8);

const NAMED_KINDS: &[(&str, SignalKind)] = &[
    ("None", SignalKind::NONE),
    ("Traces", SignalKind::TRACES),
    ("Logs", SignalKind::LOGS),
    ("Metrics", SignalKind::METRICS),
    ("TracesAndLogs", SignalKind::TRACES_AND_LOGS),
    ("TracesAndMetrics", SignalKind::TRACES_AND_METRICS),
    ("LogsAndMetrics", SignalKind::LOGS_AND_METRICS),
    ("TracesAndLogsAndMetrics", SignalKind::TRACES_AND_LOGS_AND_METRICS),
];

impl SignalKind {
    pub const NONE: Self = Self(0);
    pub const TRACES: Self = Self(1);
    pub const LOGS: Self = Self(2);
    pub const METRICS: Self = Self(4);
    pub const TRACES_AND_LOGS: Self = Self(1 | 2);
    pub const TRACES_AND_METRICS: Self = Self(1 | 4);
    pub const LOGS_AND_METRICS: Self = Self(2 | 4);
    pub const TRACES_AND_LOGS_AND_METRICS: Self = Self(1 | 2 | 4);

    const ALL_BITS: u8 = 1 | 2 | 4;

    /// Single-signal kinds in dispatch order.
    const SINGLE: [Self; 3] = [Self::TRACES, Self::METRICS, Self::LOGS];

    pub const fn from_bits(bits: u8) -> Option<Self> {
        if bits & !Self::ALL_BITS == 0 {
            Some(Self(bits))
        } else {
            None
        }
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Whether every bit of `other` is also set in `self`.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// The single-signal kinds set in `self`, traces first, then metrics, then logs.
    pub fn iter(self) -> impl Iterator<Item = SignalKind> {
        Self::SINGLE
            .into_iter()
            .filter(move |kind| self.contains(*kind))
    }
}

impl Default for SignalKind {
    fn default() -> Self {
        Self::TRACES
    }
}

impl BitOr for SignalKind {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl BitOrAssign for SignalKind {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = self.union(rhs);
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match NAMED_KINDS.iter().find(|(_, kind)| kind == self) {
            Some((name, _)) => f.write_str(name),
            None => write!(f, "{}", self.0),
        }
    }
}

impl FromStr for SignalKind {
    type Err = TelemetryError;

    /// Accepts a named value (`TracesAndLogs`), a comma-separated list of
    /// names (`Traces, Logs`) or the numeric bit value (`3`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();

        if let Ok(bits) = trimmed.parse::<u8>() {
            return Self::from_bits(bits)
                .ok_or_else(|| TelemetryError::invalid_value("Signals", s, "unknown signal bits"));
        }

        let mut kinds = Self::NONE;
        for part in trimmed.split(',') {
            let part = part.trim();
            let (_, kind) = NAMED_KINDS
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(part))
                .ok_or_else(|| {
                    TelemetryError::invalid_value("Signals", s, format!("unknown signal '{part}'"))
                })?;
            kinds |= *kind;
        }

        Ok(kinds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_traces() {
        assert_eq!(SignalKind::default(), SignalKind::TRACES);
    }

    #[test]
    fn combinations_are_unions_of_single_kinds() {
        assert_eq!(SignalKind::TRACES | SignalKind::LOGS, SignalKind::TRACES_AND_LOGS);
        assert_eq!(
            SignalKind::TRACES | SignalKind::LOGS | SignalKind::METRICS,
            SignalKind::TRACES_AND_LOGS_AND_METRICS
        );
        assert!(SignalKind::TRACES_AND_METRICS.contains(SignalKind::METRICS));
        assert!(!SignalKind::TRACES_AND_METRICS.contains(SignalKind::LOGS));
    }

    #[test]
    fn none_selects_nothing() {
        assert!(SignalKind::NONE.is_empty());
        assert_eq!(SignalKind::NONE.iter().count(), 0);
    }

    #[test]
    fn iter_yields_traces_metrics_logs() {
        let kinds: Vec<SignalKind> = SignalKind::TRACES_AND_LOGS_AND_METRICS.iter().collect();

        assert_eq!(
            kinds,
            vec![SignalKind::TRACES, SignalKind::METRICS, SignalKind::LOGS]
        );
    }

    #[test]
    fn parses_named_values_case_insensitively() {
        assert_eq!("TracesAndLogs".parse::<SignalKind>().unwrap(), SignalKind::TRACES_AND_LOGS);
        assert_eq!("metrics".parse::<SignalKind>().unwrap(), SignalKind::METRICS);
        assert_eq!("None".parse::<SignalKind>().unwrap(), SignalKind::NONE);
    }

    #[test]
    fn parses_flag_lists_and_numbers() {
        assert_eq!(
            "Traces, Metrics".parse::<SignalKind>().unwrap(),
            SignalKind::TRACES_AND_METRICS
        );
        assert_eq!("6".parse::<SignalKind>().unwrap(), SignalKind::LOGS_AND_METRICS);
    }

    #[test]
    fn rejects_unknown_names_and_bits() {
        assert!(matches!(
            "Spans".parse::<SignalKind>(),
            Err(TelemetryError::InvalidValue { .. })
        ));
        assert!("8".parse::<SignalKind>().is_err());
    }

    #[test]
    fn display_uses_canonical_names() {
        assert_eq!(SignalKind::TRACES_AND_LOGS.to_string(), "TracesAndLogs");
        assert_eq!(SignalKind::METRICS.to_string(), "Metrics");
    }
}
