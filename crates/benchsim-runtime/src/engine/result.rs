//! Test results.

use std::fmt;

use serde::Serialize;
use serde_json::Value as JsonValue;
use smol_str::SmolStr;

use crate::error::BenchError;

/// Outcome of one test run. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestResult {
    passed: bool,
    errored: bool,
    message: SmolStr,
    details: JsonValue,
}

impl TestResult {
    /// Passing result.
    pub fn pass(message: impl Into<SmolStr>, details: JsonValue) -> Self {
        Self {
            passed: true,
            errored: false,
            message: message.into(),
            details,
        }
    }

    /// Failing result (assertion failure, not a fault).
    pub fn fail(message: impl Into<SmolStr>, details: JsonValue) -> Self {
        Self {
            passed: false,
            errored: false,
            message: message.into(),
            details,
        }
    }

    /// Pass if `condition` holds, otherwise fail; both carry `message`.
    pub fn check(condition: bool, message: impl Into<SmolStr>, details: JsonValue) -> Self {
        if condition {
            Self::pass(message, details)
        } else {
            Self::fail(message, details)
        }
    }

    /// Failing result produced by a fault in the case or its hooks.
    #[must_use]
    pub fn errored(err: &BenchError) -> Self {
        Self {
            passed: false,
            errored: true,
            message: err.to_string().into(),
            details: JsonValue::Null,
        }
    }

    /// Whether the case passed.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.passed
    }

    /// Whether the run ended in a fault rather than a verdict.
    #[must_use]
    pub fn is_errored(&self) -> bool {
        self.errored
    }

    /// Human-readable verdict.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Case-specific observations, as JSON.
    #[must_use]
    pub fn details(&self) -> &JsonValue {
        &self.details
    }
}

impl fmt::Display for TestResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = if self.passed {
            "PASS"
        } else if self.errored {
            "ERROR"
        } else {
            "FAIL"
        };
        write!(f, "{label}: {}", self.message)
    }
}
