//! # absint-rs: Interval Abstract Interpretation in Rust
//!
//! **`absint-rs`** is a static analyzer for a small imperative language. Given a program's source
//! text, it computes at each program point a sound over-approximation of the integer values each
//! variable may hold, and uses that information to discharge the assertions stated in the source.
//!
//! ## Core Concept
//!
//! Unlike testing (which checks one execution path), **abstract interpretation checks all possible
//! execution paths simultaneously.** Instead of executing the program with concrete values
//! (`let x = 5`), the analyzer executes it with **abstract values**: integer intervals like
//! `x ∈ [0, 10]`.
//!
//! | Code | Concrete Execution | Interval Domain |
//! |------|--------------------|-----------------|
//! | `x = 5;` | `x = 5` | `x ∈ [5, 5]` |
//! | `y = x - 10;` | `y = -5` | `y ∈ [-5, -5]` |
//! | `if (y >= 0)` | branch not taken | `[-5, -5] >= 0` is **false**: branch unreachable |
//!
//! ## Theoretical Foundations
//!
//! The analysis is built on **lattice theory**. The [`Lattice`] trait captures the structure
//! `⟨D, ⊑, ⊥, ⊤, ⊔, ⊓⟩` shared by abstract values ([`Interval`]) and abstract stores
//! ([`IntervalStore`]):
//!
//! * **`⊑` (partial order)**: the precision relation; `x ⊑ y` means `x` admits fewer concrete
//!   behaviors than `y`.
//! * **`⊥` (bottom)**: the empty state (unreachable code); **`⊤` (top)**: the unknown state.
//! * **`⊔` (join)**: the least upper bound, used to merge control-flow paths.
//! * **`⊓` (meet)**: the greatest lower bound, used to refine states at conditionals.
//!
//! ### Fixpoint Computation
//!
//! Loops are the hard part: the analyzer looks for an **invariant**, a state that holds before and
//! after the loop body regardless of how many times the loop runs. The interval lattice has
//! infinite ascending chains (`[0, 1], [0, 2], [0, 3], …`), so plain iteration need not converge:
//!
//! 1. **Widening (∇)** accelerates convergence by extrapolating: when a bound keeps growing, it
//!    jumps to ±∞. Applied after a configurable number of plain iterations
//!    ([`AnalyzerConfig::widening_threshold`]).
//! 2. **Narrowing (∆)** then runs a bounded number of standard iterations to win back precision
//!    lost to the jump, e.g. turning `[0, +∞]` back into `[0, 100]` under the loop condition
//!    `x < 100`.
//!
//! ## Example: Analyzing a Simple Program
//!
//! ```rust
//! use absint_rs::{analyze, parse};
//!
//! let source = r#"
//!     int a, b;
//!     assume(a >= 0, a <= 10);
//!     b = a + 1;
//!     assert(b <= 11);
//! "#;
//!
//! let program = parse(source).expect("syntax error");
//! let report = analyze(&program);
//!
//! assert!(report.all_verified());
//! println!("{}", report); // OK 5
//! ```
//!
//! ## Core Components
//!
//! - **[`interval`]**: the abstract value: integer intervals with lattice operations, widening,
//!   and sound (saturating) arithmetic.
//! - **[`store`]**: the abstract store mapping variables to intervals, with a read-only
//!   precondition slot.
//! - **[`ast`] / [`parser`]**: the analyzed language and its recursive-descent parser.
//! - **[`analyzer`]**: the fixpoint evaluator: condition refinement, branch joins, loop
//!   widening/narrowing, assertion checking.
//! - **[`report`]**: diagnostics (`OK` / `FAIL` / `UNKNOWN` plus warnings) in program order.

pub mod analyzer;
pub mod ast;
pub mod domain;
pub mod interval;
pub mod parser;
pub mod report;
pub mod store;

// Re-exports for convenience
pub use analyzer::{analyze, Analyzer, AnalyzerConfig};
pub use ast::{BinOp, Cond, Expr, RelOp, Stmt};
pub use domain::Lattice;
pub use interval::{ArithResult, Bound, Interval};
pub use parser::{parse, ParseError};
pub use report::{AssertionStatus, Diagnostic, Report, WarningKind};
pub use store::IntervalStore;
