use std::fmt;

use serde::{Deserialize, Serialize};

/// Plugin return codes, ordered by increasing badness.
///
/// The discriminant is the process exit code read by the poller.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum Severity {
    Ok = 0,
    Warning = 1,
    Critical = 2,
    Unknown = 3,
}

impl Severity {
    pub fn exit_code(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            Severity::Ok => "OK",
            Severity::Warning => "WARNING",
            Severity::Critical => "CRITICAL",
            Severity::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One quantitative side-measurement attached to a check response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetric {
    pub label: String,
    pub value: f64,
    pub unit: String,
    pub warn_threshold: Option<f64>,
    pub crit_threshold: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl PerformanceMetric {
    pub fn new(label: impl Into<String>, value: f64, unit: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value,
            unit: unit.into(),
            warn_threshold: None,
            crit_threshold: None,
            min: None,
            max: None,
        }
    }

    pub fn with_thresholds(mut self, warn: Option<f64>, crit: Option<f64>) -> Self {
        self.warn_threshold = warn;
        self.crit_threshold = crit;
        self
    }

    pub fn with_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    /// `'label'=value[unit];[warn];[crit];[min];[max]`
    pub fn to_ncpa_string(&self) -> String {
        let slot = |v: Option<f64>| v.map(|v| v.to_string()).unwrap_or_default();
        format!(
            "'{}'={}{};{};{};{};{}",
            self.label,
            self.value,
            self.unit,
            slot(self.warn_threshold),
            slot(self.crit_threshold),
            slot(self.min),
            slot(self.max)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_fixed() {
        assert_eq!(Severity::Ok.exit_code(), 0);
        assert_eq!(Severity::Warning.exit_code(), 1);
        assert_eq!(Severity::Critical.exit_code(), 2);
        assert_eq!(Severity::Unknown.exit_code(), 3);
    }

    #[test]
    fn severities_order_by_badness() {
        assert!(Severity::Ok < Severity::Warning);
        assert!(Severity::Critical < Severity::Unknown);
        assert_eq!(
            [Severity::Warning, Severity::Unknown, Severity::Ok]
                .into_iter()
                .max(),
            Some(Severity::Unknown)
        );
    }

    #[test]
    fn metric_fills_only_set_slots() {
        let m = PerformanceMetric::new("time", 0.5, "s")
            .with_thresholds(None, Some(5.0))
            .with_range(Some(0.0), None);
        assert_eq!(m.to_ncpa_string(), "'time'=0.5s;;5;0;");
    }

    #[test]
    fn unitless_metric_renders_integral_value_plainly() {
        let m = PerformanceMetric::new("connected", 1.0, "").with_range(Some(0.0), Some(1.0));
        assert_eq!(m.to_ncpa_string(), "'connected'=1;;;0;1");
    }
}
