//! Test utilities for wacc-diag.
//!
//! Provides the parser and runner for `tests/diagnostics/*.test`, the
//! fixture format pairing WACC source (and optionally canned analyzer output)
//! with the diagnostics a pass must produce. See [`fixture`].

pub mod fixture;

use std::fmt;

/// The result of running a single test case.
#[derive(Debug, Clone)]
pub enum TestResult {
    /// Test passed.
    Pass,
    /// Test failed with expected vs actual mismatch.
    Fail { expected: String, actual: String },
}

impl TestResult {
    pub fn is_pass(&self) -> bool {
        matches!(self, TestResult::Pass)
    }
}

/// Summary of running multiple test cases.
#[derive(Debug, Default)]
pub struct TestSummary {
    pub passed: usize,
    pub failed: usize,
    pub failures: Vec<TestFailure>,
}

/// A single test failure with context.
#[derive(Debug, Clone)]
pub struct TestFailure {
    pub name: String,
    pub line: usize,
    pub result: TestResult,
}

impl TestSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, name: impl Into<String>, line: usize, result: TestResult) {
        match &result {
            TestResult::Pass => {
                self.passed += 1;
                return;
            }
            TestResult::Fail { .. } => self.failed += 1,
        }
        self.failures.push(TestFailure {
            name: name.into(),
            line,
            result,
        });
    }

    pub fn total(&self) -> usize {
        self.passed + self.failed
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

impl fmt::Display for TestSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\n{}", "═".repeat(60))?;
        writeln!(f, "Fixture Summary: {} total", self.total())?;
        writeln!(f, "  ✓ {} passed  ✗ {} failed", self.passed, self.failed)?;

        for failure in &self.failures {
            writeln!(f, "\n  {} (line {})", failure.name, failure.line)?;
            if let TestResult::Fail { expected, actual } = &failure.result {
                writeln!(f, "    expected:\n{}", indent(expected))?;
                writeln!(f, "    actual:\n{}", indent(actual))?;
            }
        }
        writeln!(f, "{}", "═".repeat(60))
    }
}

fn indent(block: &str) -> String {
    if block.is_empty() {
        return "      (none)".to_string();
    }
    block
        .lines()
        .map(|line| format!("      {line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_counts() {
        let mut summary = TestSummary::new();
        summary.record("a", 1, TestResult::Pass);
        summary.record(
            "b",
            5,
            TestResult::Fail {
                expected: "x".into(),
                actual: String::new(),
            },
        );
        assert_eq!(summary.total(), 2);
        assert!(!summary.all_passed());
        assert_eq!(summary.failures.len(), 1);
        let text = summary.to_string();
        assert!(text.contains("b (line 5)"));
        assert!(text.contains("(none)"));
        assert!(text.contains("1 passed"));
    }
}
