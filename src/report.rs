//! Analysis diagnostics and the final report.
//!
//! Every assertion yields exactly one diagnostic line; warnings are
//! best-effort extra lines and never affect the verdict. The report renders
//! in program order and is fully deterministic.

use std::fmt;

use crate::ast::RelOp;
use crate::interval::Interval;
use crate::store::IntervalStore;

/// Outcome of a single assertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssertionStatus {
    /// The comparison holds for every concrete state in the abstraction.
    Verified,
    /// The assertion sits at an unreachable program point; vacuously verified.
    Unreachable,
    /// The comparison fails for every concrete state in the abstraction.
    Falsified,
    /// The abstraction cannot decide the comparison.
    Unknown,
}

/// Non-fatal findings reported alongside assertion outcomes.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum WarningKind {
    /// A divisor interval contained 0; the quotient was widened to ⊤.
    DivisionByZero,
    /// A bound overflowed the machine range and saturated to an infinity.
    OverflowSaturation,
    /// A variable was read without any declaration, assumption or prior
    /// assignment; it reads as ⊤.
    UndeclaredVariable(String),
    /// A pre-condition clause was not a variable-versus-literal comparison
    /// and was skipped.
    UnsupportedCondition,
    /// A pre-condition block after the first ordinary statement was skipped.
    LatePrecondition,
    /// A branch (or loop body) can never be entered.
    UnreachableBranch,
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WarningKind::DivisionByZero => write!(f, "possible division by zero"),
            WarningKind::OverflowSaturation => write!(f, "arithmetic overflow, result saturated to infinity"),
            WarningKind::UndeclaredVariable(var) => write!(f, "read of undeclared variable `{}`", var),
            WarningKind::UnsupportedCondition => write!(f, "unsupported condition, clause ignored"),
            WarningKind::LatePrecondition => write!(f, "pre-condition after ordinary statements, ignored"),
            WarningKind::UnreachableBranch => write!(f, "unreachable branch"),
        }
    }
}

/// One diagnostic line, tagged with its 1-based source line.
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    Assertion {
        line: u32,
        status: AssertionStatus,
        op: RelOp,
        lhs: Interval,
        rhs: Interval,
    },
    Warning {
        line: u32,
        kind: WarningKind,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::Assertion { line, status, op, lhs, rhs } => match status {
                AssertionStatus::Verified => write!(f, "OK {}", line),
                AssertionStatus::Unreachable => write!(f, "OK {} (unreachable)", line),
                AssertionStatus::Falsified => write!(f, "FAIL {}: {} {} {}", line, lhs, op, rhs),
                AssertionStatus::Unknown => write!(f, "UNKNOWN {}: {} {} {}", line, lhs, op, rhs),
            },
            Diagnostic::Warning { line, kind } => write!(f, "WARN {}: {}", line, kind),
        }
    }
}

/// Result of analyzing one program: the diagnostics in program order plus
/// the abstract store at program exit.
#[derive(Debug, Clone)]
pub struct Report {
    pub diagnostics: Vec<Diagnostic>,
    pub store: IntervalStore,
}

impl Report {
    /// True iff every assertion is verified (vacuously or not). Warnings do
    /// not count against the verdict.
    pub fn all_verified(&self) -> bool {
        !self.diagnostics.iter().any(|d| {
            matches!(
                d,
                Diagnostic::Assertion {
                    status: AssertionStatus::Falsified | AssertionStatus::Unknown,
                    ..
                }
            )
        })
    }

    /// The assertion outcomes, in program order.
    pub fn assertions(&self) -> impl Iterator<Item = (u32, AssertionStatus)> + '_ {
        self.diagnostics.iter().filter_map(|d| match d {
            Diagnostic::Assertion { line, status, .. } => Some((*line, *status)),
            Diagnostic::Warning { .. } => None,
        })
    }

    /// The warnings, in program order.
    pub fn warnings(&self) -> impl Iterator<Item = (u32, &WarningKind)> + '_ {
        self.diagnostics.iter().filter_map(|d| match d {
            Diagnostic::Warning { line, kind } => Some((*line, kind)),
            Diagnostic::Assertion { .. } => None,
        })
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for diagnostic in &self.diagnostics {
            writeln!(f, "{}", diagnostic)?;
        }
        Ok(())
    }
}
