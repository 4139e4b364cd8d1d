//! The fixpoint evaluator: propagates an abstract store through the AST.
//!
//! One depth-first traversal with a single working store threaded through
//! it. Branches are evaluated on independently cloned stores and folded
//! back with join; loops iterate to a post-fixpoint, switching to widening
//! after [`AnalyzerConfig::widening_threshold`] plain iterations so that
//! infinite ascending chains terminate, then run a bounded narrowing phase
//! to win back precision.
//!
//! Everything the analysis finds (assertion outcomes, possible division by
//! zero, overflow saturation, unreachable branches, undeclared reads) is a
//! [`Diagnostic`]; nothing here is fatal and nothing retries. Loop bodies
//! are re-evaluated many times during fixpoint iteration, so diagnostics
//! are muted while iterating and reported in one audited pass over the body
//! once the invariant is stable.

use std::collections::BTreeSet;

use crate::ast::{BinOp, Cond, Expr, RelOp, Stmt};
use crate::domain::Lattice;
use crate::interval::{Bound, Interval};
use crate::report::{AssertionStatus, Diagnostic, Report, WarningKind};
use crate::store::IntervalStore;

/// Tuning knobs for the fixpoint evaluator.
#[derive(Debug, Clone, Copy)]
pub struct AnalyzerConfig {
    /// Plain loop iterations before widening kicks in.
    pub widening_threshold: usize,
    /// Standard (non-widened) iterations after the loop stabilizes.
    pub narrowing_iterations: usize,
    /// Safety cap on loop iterations; never reached when widening is on.
    pub max_iterations: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            widening_threshold: 5,
            narrowing_iterations: 2,
            max_iterations: 1000,
        }
    }
}

/// Analyze a program with the default configuration.
pub fn analyze(program: &Stmt) -> Report {
    Analyzer::new(AnalyzerConfig::default()).run(program)
}

/// The abstract interpreter.
pub struct Analyzer {
    config: AnalyzerConfig,
    diagnostics: Vec<Diagnostic>,
    /// Variables introduced by a declaration, a precondition, or an
    /// assignment; reads of anything else warn once per variable.
    defined: BTreeSet<String>,
    warned: BTreeSet<(u32, WarningKind)>,
    warned_undeclared: BTreeSet<String>,
    /// Set once the first ordinary statement is reached; the precondition
    /// map is read-only from then on.
    sealed: bool,
    /// Diagnostics are suppressed while > 0 (loop fixpoint iteration).
    mute: usize,
}

impl Analyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self {
            config,
            diagnostics: Vec::new(),
            defined: BTreeSet::new(),
            warned: BTreeSet::new(),
            warned_undeclared: BTreeSet::new(),
            sealed: false,
            mute: 0,
        }
    }

    /// Run the analysis and produce the report together with the abstract
    /// store at program exit.
    pub fn run(mut self, program: &Stmt) -> Report {
        let store = self.eval_stmt(IntervalStore::new(), program);
        log::debug!("store at program exit:\n{}", store);
        Report {
            diagnostics: self.diagnostics,
            store,
        }
    }

    fn warn(&mut self, line: u32, kind: WarningKind) {
        if self.mute == 0 && self.warned.insert((line, kind.clone())) {
            self.diagnostics.push(Diagnostic::Warning { line, kind });
        }
    }

    /// Statement transfer function: `(store, stmt) -> store'`.
    fn eval_stmt(&mut self, store: IntervalStore, stmt: &Stmt) -> IntervalStore {
        if store.is_bottom() {
            // Unreachable code: nothing is evaluated and nothing is
            // reported, except that assertions are vacuously verified.
            self.record_unreachable(stmt);
            return store;
        }
        match stmt {
            Stmt::Seq(stmts) => stmts.iter().fold(store, |s, stmt| self.eval_stmt(s, stmt)),

            Stmt::Decl { var, .. } => {
                self.defined.insert(var.clone());
                let mut out = store;
                if !out.is_set(var) && out.precondition(var).is_none() {
                    out.set(var, Interval::TOP);
                }
                out
            }

            Stmt::Assign { var, expr, line } => {
                self.sealed = true;
                let value = self.eval_expr(&store, expr, *line);
                log::trace!("line {}: {} = {}", line, var, value);
                self.defined.insert(var.clone());
                let mut out = store;
                out.set(var, value);
                out
            }

            Stmt::Assume { conds, line } => {
                if self.sealed {
                    self.warn(*line, WarningKind::LatePrecondition);
                    return store;
                }
                let mut out = store;
                for cond in conds {
                    if out.is_bottom() {
                        break;
                    }
                    self.apply_precondition(&mut out, cond, *line);
                }
                out
            }

            Stmt::Assert { cond, line } => {
                self.sealed = true;
                self.check_assertion(&store, cond, *line);
                store
            }

            Stmt::If {
                cond,
                then_body,
                else_body,
                line,
            } => {
                self.sealed = true;
                let then_in = self.refine(&store, cond, true, *line);
                let else_in = self.refine(&store, cond, false, *line);
                if then_in.is_bottom() {
                    self.warn(*line, WarningKind::UnreachableBranch);
                }
                let then_out = self.eval_stmt(then_in, then_body);
                let else_out = match else_body {
                    Some(body) => {
                        if else_in.is_bottom() {
                            self.warn(*line, WarningKind::UnreachableBranch);
                        }
                        self.eval_stmt(else_in, body)
                    }
                    // No else arm: the negated condition flows through
                    None => else_in,
                };
                then_out.join(&else_out)
            }

            Stmt::While { cond, body, line } => {
                self.sealed = true;
                self.eval_while(store, cond, body, *line)
            }
        }
    }

    /// Iterate the loop to a post-fixpoint, then narrow, then report the
    /// body's diagnostics once from the stabilized entry store. The output
    /// is the invariant refined by the negated condition.
    fn eval_while(&mut self, store: IntervalStore, cond: &Cond, body: &Stmt, line: u32) -> IntervalStore {
        let mut state = store.clone();
        let mut iterations = 0usize;

        self.mute += 1;
        loop {
            let entry = self.refine(&state, cond, true, line);
            if entry.is_bottom() {
                break;
            }
            let body_out = self.eval_stmt(entry, body);
            let mut next = state.join(&body_out);
            if iterations >= self.config.widening_threshold {
                next = state.widen(&next);
            }
            if next == state {
                break;
            }
            state = next;
            iterations += 1;
            if iterations >= self.config.max_iterations {
                log::warn!(
                    "line {}: loop did not stabilize after {} iterations, giving up",
                    line,
                    iterations
                );
                break;
            }
        }
        log::debug!("line {}: loop stabilized after {} iterations", line, iterations);

        // Narrowing phase: standard decreasing steps, bounded by config.
        for _ in 0..self.config.narrowing_iterations {
            let entry = self.refine(&state, cond, true, line);
            if entry.is_bottom() {
                break;
            }
            let body_out = self.eval_stmt(entry, body);
            let next = state.narrow(&store.join(&body_out));
            if state.le(&next) {
                break;
            }
            state = next;
        }
        self.mute -= 1;

        // Audited pass over the body, exactly once.
        let entry = self.refine(&state, cond, true, line);
        if entry.is_bottom() {
            self.warn(line, WarningKind::UnreachableBranch);
            self.record_unreachable(body);
        } else {
            let _ = self.eval_stmt(entry, body);
        }

        self.refine(&state, cond, false, line)
    }

    /// Refine `store` by assuming `cond` holds (`assume = true`) or fails
    /// (`assume = false`).
    fn refine(&mut self, store: &IntervalStore, cond: &Cond, assume: bool, line: u32) -> IntervalStore {
        if store.is_bottom() {
            return store.clone();
        }
        let op = if assume { cond.op } else { cond.op.negate() };
        let lhs = self.eval_expr(store, &cond.lhs, line);
        let rhs = self.eval_expr(store, &cond.rhs, line);
        let mut out = store.clone();
        match (cond.lhs.as_var(), cond.rhs.as_var()) {
            // Two variables: narrow both sides against each other
            (Some(v), Some(w)) => {
                out.set(v, refine_var(lhs, op, &rhs));
                out.set(w, refine_var(rhs, op.flip(), &lhs));
            }
            (Some(v), None) => {
                out.set(v, refine_var(lhs, op, &rhs));
            }
            (None, Some(w)) => {
                out.set(w, refine_var(rhs, op.flip(), &lhs));
            }
            // No variable to narrow: decide the comparison abstractly
            (None, None) => match compare(op, &lhs, &rhs) {
                Truth::False => out.mark_unreachable(),
                Truth::True | Truth::Unknown => {}
            },
        }
        out
    }

    /// One pre-condition clause: must compare a variable with an integer
    /// literal (either order; a literal on the left flips the operator so
    /// the variable reads on the left). Anything else is skipped.
    fn apply_precondition(&mut self, store: &mut IntervalStore, cond: &Cond, line: u32) {
        let (var, op, value) = if let (Some(var), Some(value)) = (cond.lhs.as_var(), cond.rhs.as_int()) {
            (var, cond.op, value)
        } else if let (Some(value), Some(var)) = (cond.lhs.as_int(), cond.rhs.as_var()) {
            (var, cond.op.flip(), value)
        } else {
            self.warn(line, WarningKind::UnsupportedCondition);
            return;
        };
        self.defined.insert(var.to_string());
        let current = store.precondition(var).unwrap_or(Interval::TOP);
        let narrowed = refine_var(current, op, &Interval::singleton(value));
        log::debug!("precondition: {} in {}", var, narrowed);
        store.constrain(var, narrowed);
    }

    fn check_assertion(&mut self, store: &IntervalStore, cond: &Cond, line: u32) {
        let lhs = self.eval_expr(store, &cond.lhs, line);
        let rhs = self.eval_expr(store, &cond.rhs, line);
        let status = match compare(cond.op, &lhs, &rhs) {
            Truth::True => AssertionStatus::Verified,
            Truth::False => AssertionStatus::Falsified,
            Truth::Unknown => AssertionStatus::Unknown,
        };
        log::debug!("line {}: assert {} {} {} -> {:?}", line, lhs, cond.op, rhs, status);
        if self.mute == 0 {
            self.diagnostics.push(Diagnostic::Assertion {
                line,
                status,
                op: cond.op,
                lhs,
                rhs,
            });
        }
    }

    /// Record every assertion below `stmt` as vacuously verified. Nothing
    /// else in unreachable code is evaluated or reported.
    fn record_unreachable(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Seq(stmts) => {
                for stmt in stmts {
                    self.record_unreachable(stmt);
                }
            }
            Stmt::Assert { cond, line } => {
                if self.mute == 0 {
                    self.diagnostics.push(Diagnostic::Assertion {
                        line: *line,
                        status: AssertionStatus::Unreachable,
                        op: cond.op,
                        lhs: Interval::EMPTY,
                        rhs: Interval::EMPTY,
                    });
                }
            }
            Stmt::If {
                then_body, else_body, ..
            } => {
                self.record_unreachable(then_body);
                if let Some(body) = else_body {
                    self.record_unreachable(body);
                }
            }
            Stmt::While { body, .. } => self.record_unreachable(body),
            Stmt::Decl { .. } | Stmt::Assign { .. } | Stmt::Assume { .. } => {}
        }
    }

    /// Expression evaluation. Never mutates the store.
    fn eval_expr(&mut self, store: &IntervalStore, expr: &Expr, line: u32) -> Interval {
        match expr {
            Expr::Int(n) => Interval::singleton(*n),
            Expr::Var(name) => {
                if !self.defined.contains(name)
                    && self.mute == 0
                    && self.warned_undeclared.insert(name.clone())
                {
                    self.diagnostics.push(Diagnostic::Warning {
                        line,
                        kind: WarningKind::UndeclaredVariable(name.clone()),
                    });
                }
                store.get(name)
            }
            Expr::Binary { op, lhs, rhs } => {
                let l = self.eval_expr(store, lhs, line);
                let r = self.eval_expr(store, rhs, line);
                let result = match op {
                    BinOp::Add => l.add(&r),
                    BinOp::Sub => l.sub(&r),
                    BinOp::Mul => l.mul(&r),
                    BinOp::Div => l.div(&r),
                };
                if result.div_by_zero {
                    self.warn(line, WarningKind::DivisionByZero);
                }
                if result.saturated {
                    self.warn(line, WarningKind::OverflowSaturation);
                }
                result.value
            }
        }
    }
}

/// Three-valued outcome of an abstract comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Truth {
    True,
    False,
    Unknown,
}

/// Decide `lhs op rhs` abstractly: `True`/`False` only when the comparison
/// holds/fails for every pair of concrete values.
fn compare(op: RelOp, lhs: &Interval, rhs: &Interval) -> Truth {
    if lhs.is_empty() || rhs.is_empty() {
        return Truth::Unknown;
    }
    match op {
        RelOp::Le => {
            if lhs.high() <= rhs.low() {
                Truth::True
            } else if lhs.low() > rhs.high() {
                Truth::False
            } else {
                Truth::Unknown
            }
        }
        RelOp::Lt => {
            if lhs.high() < rhs.low() {
                Truth::True
            } else if lhs.low() >= rhs.high() {
                Truth::False
            } else {
                Truth::Unknown
            }
        }
        RelOp::Ge => {
            if lhs.low() >= rhs.high() {
                Truth::True
            } else if lhs.high() < rhs.low() {
                Truth::False
            } else {
                Truth::Unknown
            }
        }
        RelOp::Gt => {
            if lhs.low() > rhs.high() {
                Truth::True
            } else if lhs.high() <= rhs.low() {
                Truth::False
            } else {
                Truth::Unknown
            }
        }
        RelOp::Eq => match (lhs.as_singleton(), rhs.as_singleton()) {
            (Some(a), Some(b)) if a == b => Truth::True,
            _ if lhs.meet(rhs).is_empty() => Truth::False,
            _ => Truth::Unknown,
        },
        RelOp::Ne => match (lhs.as_singleton(), rhs.as_singleton()) {
            (Some(a), Some(b)) if a == b => Truth::False,
            _ if lhs.meet(rhs).is_empty() => Truth::True,
            _ => Truth::Unknown,
        },
    }
}

/// Narrow `current`, the interval of a variable `v`, by assuming `v op e`
/// where `e` evaluates to `bound`.
fn refine_var(current: Interval, op: RelOp, bound: &Interval) -> Interval {
    match constraint_interval(op, bound) {
        Some(constraint) => current.meet(&constraint),
        None => ne_refine(current, bound),
    }
}

/// Interval of values admissible for `v` under `v op e`, given `e ∈ bound`.
/// `None` for `!=`, whose complement is not a single interval.
fn constraint_interval(op: RelOp, bound: &Interval) -> Option<Interval> {
    match op {
        RelOp::Lt => Some(Interval::new(Bound::NegInf, bound.high().pred())),
        RelOp::Le => Some(Interval::new(Bound::NegInf, bound.high())),
        RelOp::Gt => Some(Interval::new(bound.low().succ(), Bound::PosInf)),
        RelOp::Ge => Some(Interval::new(bound.low(), Bound::PosInf)),
        RelOp::Eq => Some(*bound),
        RelOp::Ne => None,
    }
}

/// `v != e`: exact against a singleton that is `v`'s whole interval (⊥) or
/// one of its endpoints (trimmed); any other complement would need a
/// disjunction of intervals, so the refinement is skipped.
fn ne_refine(current: Interval, bound: &Interval) -> Interval {
    let Some(c) = bound.as_singleton() else {
        return current;
    };
    if current.as_singleton() == Some(c) {
        Interval::EMPTY
    } else if current.low() == Bound::Finite(c) {
        Interval::new(current.low().succ(), current.high())
    } else if current.high() == Bound::Finite(c) {
        Interval::new(current.low(), current.high().pred())
    } else {
        current
    }
}
