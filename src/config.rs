//! Alert thresholds, attendance source selection and the per-request context.

use std::fmt;

use chrono::{DateTime, Utc};
use clap::ValueEnum;

use crate::error::{DashboardError, Result};

pub const DEFAULT_INACTIVITY_DAYS: i64 = 7;
pub const DEFAULT_COMPLETION_THRESHOLD: i64 = 50;
pub const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

const MAX_INACTIVITY_DAYS: i64 = 3650;

/// Validated alert thresholds. Built once at startup; every computation
/// downstream trusts the values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    inactivity_days: u32,
    completion_pct: u8,
}

impl Thresholds {
    pub fn new(inactivity_days: i64, completion_pct: i64) -> Result<Self> {
        if !(1..=MAX_INACTIVITY_DAYS).contains(&inactivity_days) {
            return Err(DashboardError::InvalidThreshold(format!(
                "inactivity days must be between 1 and {MAX_INACTIVITY_DAYS}, got {inactivity_days}"
            )));
        }
        if !(0..=100).contains(&completion_pct) {
            return Err(DashboardError::InvalidThreshold(format!(
                "completion threshold must be between 0 and 100, got {completion_pct}"
            )));
        }

        Ok(Self {
            inactivity_days: inactivity_days as u32,
            completion_pct: completion_pct as u8,
        })
    }

    pub fn inactivity_days(&self) -> u32 {
        self.inactivity_days
    }

    pub fn inactivity_seconds(&self) -> i64 {
        i64::from(self.inactivity_days) * SECONDS_PER_DAY
    }

    pub fn completion_pct(&self) -> u8 {
        self.completion_pct
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            inactivity_days: DEFAULT_INACTIVITY_DAYS as u32,
            completion_pct: DEFAULT_COMPLETION_THRESHOLD as u8,
        }
    }
}

/// Where attendance is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AttendanceSourceKind {
    /// External meeting platform participant logs
    Meeting,
    /// Dedicated attendance register module
    Register,
    /// No attendance source; every lookup is absent
    None,
}

impl AttendanceSourceKind {
    /// Name of the integration row that must be enabled for this source.
    pub fn integration(&self) -> Option<&'static str> {
        match self {
            Self::Meeting => Some("meeting"),
            Self::Register => Some("register"),
            Self::None => None,
        }
    }
}

impl fmt::Display for AttendanceSourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Meeting => write!(f, "meeting"),
            Self::Register => write!(f, "register"),
            Self::None => write!(f, "none"),
        }
    }
}

/// Explicit request state handed to every operation.
#[derive(Debug, Clone, Copy)]
pub struct RequestContext {
    pub now: DateTime<Utc>,
    pub actor_id: Option<i64>,
}

impl RequestContext {
    pub fn new(actor_id: Option<i64>) -> Self {
        Self {
            now: Utc::now(),
            actor_id,
        }
    }

    #[cfg(test)]
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now,
            actor_id: None,
        }
    }

    pub fn timestamp(&self) -> i64 {
        self.now.timestamp()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_site_settings() {
        let thresholds = Thresholds::default();
        assert_eq!(thresholds.inactivity_days(), 7);
        assert_eq!(thresholds.completion_pct(), 50);
        assert_eq!(thresholds.inactivity_seconds(), 7 * 86_400);
    }

    #[test]
    fn rejects_out_of_range_values() {
        assert!(matches!(
            Thresholds::new(-1, 50),
            Err(DashboardError::InvalidThreshold(_))
        ));
        assert!(matches!(
            Thresholds::new(0, 50),
            Err(DashboardError::InvalidThreshold(_))
        ));
        assert!(matches!(
            Thresholds::new(7, 101),
            Err(DashboardError::InvalidThreshold(_))
        ));
        assert!(matches!(
            Thresholds::new(7, -5),
            Err(DashboardError::InvalidThreshold(_))
        ));
    }

    #[test]
    fn accepts_boundary_values() {
        assert!(Thresholds::new(1, 0).is_ok());
        assert!(Thresholds::new(3650, 100).is_ok());
    }

    #[test]
    fn none_source_has_no_integration() {
        assert_eq!(AttendanceSourceKind::None.integration(), None);
        assert_eq!(AttendanceSourceKind::Meeting.integration(), Some("meeting"));
        assert_eq!(AttendanceSourceKind::Register.to_string(), "register");
    }
}
