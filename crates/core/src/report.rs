use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{PerformanceMetric, Severity};

pub const NOT_APPLICABLE: &str = "N/A";

/// The single artifact every check hands back to its caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResponse {
    pub name: String,
    pub host: String,
    pub timestamp: DateTime<Utc>,
    pub severity: Severity,
    pub message: String,
    pub verbose: Option<String>,
    pub performance: Option<Vec<PerformanceMetric>>,
}

impl CheckResponse {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            host: NOT_APPLICABLE.to_string(),
            timestamp: Utc::now(),
            severity: Severity::Ok,
            message: NOT_APPLICABLE.to_string(),
            verbose: None,
            performance: None,
        }
    }

    /// Severity and message always move together.
    pub fn resolve(&mut self, severity: Severity, message: impl Into<String>) {
        self.severity = severity;
        self.message = message.into();
    }

    pub fn push_metric(&mut self, metric: PerformanceMetric) {
        self.performance.get_or_insert_with(Vec::new).push(metric);
    }

    pub fn exit_code(&self) -> u8 {
        self.severity.exit_code()
    }

    /// Plugin output: `SEVERITY: message[|perf,perf][\nverbose]`.
    pub fn render(&self) -> String {
        let mut s = format!("{}: {}", self.severity.name(), self.message);

        if let Some(perf) = self.performance.as_ref().filter(|p| !p.is_empty()) {
            s.push('|');
            let parts: Vec<String> = perf.iter().map(|p| p.to_ncpa_string()).collect();
            s.push_str(&parts.join(","));
        }

        if let Some(v) = &self.verbose {
            s.push('\n');
            s.push_str(v);
        }

        s
    }
}

impl fmt::Display for CheckResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}
