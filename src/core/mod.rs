use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Stable identifier for the unguarded-value-access rule.
pub const RULE_ID: &str = "RG0001";

/// Fixed finding message; formatting and severity policy live in the output
/// layer, not the engine.
pub const RULE_MESSAGE: &str =
    "value accessor used without a prior success or failure check can panic";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Warning,
    Error,
}

/// One unguarded value access.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Finding {
    pub rule: String,
    pub file: PathBuf,
    pub line: usize,
    pub column: usize,
    /// Name of the enclosing function.
    pub function: String,
    /// Source text of the flagged access expression.
    pub access: String,
    pub message: String,
    pub severity: Severity,
}

impl Finding {
    pub fn new(
        file: PathBuf,
        line: usize,
        column: usize,
        function: String,
        access: String,
        severity: Severity,
    ) -> Self {
        Self {
            rule: RULE_ID.to_string(),
            file,
            line,
            column,
            function,
            access,
            message: RULE_MESSAGE.to_string(),
            severity,
        }
    }
}

/// A guard shape the engine refused to judge (not a finding: a gap that
/// needs reporting).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AnalysisFailure {
    pub file: PathBuf,
    pub line: usize,
    pub message: String,
}

/// Per-file analysis outcome.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct FileReport {
    pub file: PathBuf,
    pub findings: Vec<Finding>,
    pub errors: Vec<AnalysisFailure>,
}

impl FileReport {
    pub fn new(file: PathBuf) -> Self {
        Self {
            file,
            findings: Vec::new(),
            errors: Vec::new(),
        }
    }
}

/// Aggregated result of one run over a file tree.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub root: PathBuf,
    pub timestamp: DateTime<Utc>,
    pub files_scanned: usize,
    pub findings: Vec<Finding>,
    pub errors: Vec<AnalysisFailure>,
}

impl AnalysisReport {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            timestamp: Utc::now(),
            files_scanned: 0,
            findings: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn merge_file(&mut self, report: FileReport) {
        self.files_scanned += 1;
        self.findings.extend(report.findings);
        self.errors.extend(report.errors);
    }

    /// Deterministic ordering for output, independent of scan order.
    pub fn sort(&mut self) {
        self.findings
            .sort_by(|a, b| (&a.file, a.line, a.column).cmp(&(&b.file, b.line, b.column)));
        self.errors
            .sort_by(|a, b| (&a.file, a.line).cmp(&(&b.file, b.line)));
    }

    pub fn has_findings(&self) -> bool {
        !self.findings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_accumulates_and_sort_orders_by_location() {
        let mut report = AnalysisReport::new(PathBuf::from("."));
        let mut b = FileReport::new(PathBuf::from("b.rs"));
        b.findings.push(Finding::new(
            PathBuf::from("b.rs"),
            3,
            5,
            "f".into(),
            "r.value".into(),
            Severity::Warning,
        ));
        let mut a = FileReport::new(PathBuf::from("a.rs"));
        a.findings.push(Finding::new(
            PathBuf::from("a.rs"),
            10,
            1,
            "g".into(),
            "r.value".into(),
            Severity::Warning,
        ));
        report.merge_file(b);
        report.merge_file(a);
        report.sort();

        assert_eq!(report.files_scanned, 2);
        assert_eq!(report.findings[0].file, PathBuf::from("a.rs"));
        assert!(report.has_findings());
    }
}
