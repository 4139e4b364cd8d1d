//! AST for the analyzed language.
//!
//! Nodes are built by the parser and read-only from the analyzer's point of
//! view. Statements carry their 1-based source line for diagnostics.

use std::fmt;

/// Arithmetic operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
        };
        write!(f, "{}", s)
    }
}

/// Comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RelOp {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl RelOp {
    /// The operator obtained by swapping the operands: `a < b` ⇔ `b > a`.
    pub fn flip(self) -> Self {
        match self {
            RelOp::Lt => RelOp::Gt,
            RelOp::Le => RelOp::Ge,
            RelOp::Gt => RelOp::Lt,
            RelOp::Ge => RelOp::Le,
            RelOp::Eq => RelOp::Eq,
            RelOp::Ne => RelOp::Ne,
        }
    }

    /// The logical negation: `¬(a < b)` ⇔ `a >= b`.
    pub fn negate(self) -> Self {
        match self {
            RelOp::Lt => RelOp::Ge,
            RelOp::Le => RelOp::Gt,
            RelOp::Gt => RelOp::Le,
            RelOp::Ge => RelOp::Lt,
            RelOp::Eq => RelOp::Ne,
            RelOp::Ne => RelOp::Eq,
        }
    }
}

impl fmt::Display for RelOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RelOp::Lt => "<",
            RelOp::Le => "<=",
            RelOp::Gt => ">",
            RelOp::Ge => ">=",
            RelOp::Eq => "==",
            RelOp::Ne => "!=",
        };
        write!(f, "{}", s)
    }
}

/// Arithmetic expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expr {
    /// Integer literal
    Int(i64),
    /// Variable reference
    Var(String),
    /// Binary operation: lhs op rhs
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

impl Expr {
    pub fn int(n: i64) -> Self {
        Expr::Int(n)
    }

    pub fn var(name: impl Into<String>) -> Self {
        Expr::Var(name.into())
    }

    pub fn add(self, other: Self) -> Self {
        Self::binary(BinOp::Add, self, other)
    }

    pub fn sub(self, other: Self) -> Self {
        Self::binary(BinOp::Sub, self, other)
    }

    pub fn mul(self, other: Self) -> Self {
        Self::binary(BinOp::Mul, self, other)
    }

    pub fn div(self, other: Self) -> Self {
        Self::binary(BinOp::Div, self, other)
    }

    fn binary(op: BinOp, lhs: Self, rhs: Self) -> Self {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    /// `Some(name)` iff this expression is a plain variable reference.
    pub fn as_var(&self) -> Option<&str> {
        match self {
            Expr::Var(name) => Some(name),
            _ => None,
        }
    }

    /// `Some(n)` iff this expression is a plain integer literal.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Expr::Int(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Int(n) => write!(f, "{}", n),
            Expr::Var(name) => write!(f, "{}", name),
            Expr::Binary { op, lhs, rhs } => write!(f, "({} {} {})", lhs, op, rhs),
        }
    }
}

/// Comparison of two expressions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Cond {
    pub op: RelOp,
    pub lhs: Expr,
    pub rhs: Expr,
}

impl Cond {
    pub fn new(op: RelOp, lhs: Expr, rhs: Expr) -> Self {
        Self { op, lhs, rhs }
    }

    pub fn lt(lhs: Expr, rhs: Expr) -> Self {
        Self::new(RelOp::Lt, lhs, rhs)
    }

    pub fn le(lhs: Expr, rhs: Expr) -> Self {
        Self::new(RelOp::Le, lhs, rhs)
    }

    pub fn gt(lhs: Expr, rhs: Expr) -> Self {
        Self::new(RelOp::Gt, lhs, rhs)
    }

    pub fn ge(lhs: Expr, rhs: Expr) -> Self {
        Self::new(RelOp::Ge, lhs, rhs)
    }

    pub fn eq(lhs: Expr, rhs: Expr) -> Self {
        Self::new(RelOp::Eq, lhs, rhs)
    }

    pub fn ne(lhs: Expr, rhs: Expr) -> Self {
        Self::new(RelOp::Ne, lhs, rhs)
    }
}

impl fmt::Display for Cond {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.lhs, self.op, self.rhs)
    }
}

/// Program statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// Ordered sequence of statements (also the root of every program)
    Seq(Vec<Stmt>),
    /// Declaration: introduces `var` bound to ⊤
    Decl { var: String, line: u32 },
    /// Assignment: var := expr
    Assign { var: String, expr: Expr, line: u32 },
    /// Conditional with an optional else arm
    If {
        cond: Cond,
        then_body: Box<Stmt>,
        else_body: Option<Box<Stmt>>,
        line: u32,
    },
    /// While loop
    While { cond: Cond, body: Box<Stmt>, line: u32 },
    /// Pre-condition block: comparisons constraining free variables
    Assume { conds: Vec<Cond>, line: u32 },
    /// Post-condition to verify
    Assert { cond: Cond, line: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relop_flip_and_negate() {
        assert_eq!(RelOp::Lt.flip(), RelOp::Gt);
        assert_eq!(RelOp::Le.flip(), RelOp::Ge);
        assert_eq!(RelOp::Eq.flip(), RelOp::Eq);
        assert_eq!(RelOp::Lt.negate(), RelOp::Ge);
        assert_eq!(RelOp::Eq.negate(), RelOp::Ne);
        for op in [RelOp::Lt, RelOp::Le, RelOp::Gt, RelOp::Ge, RelOp::Eq, RelOp::Ne] {
            assert_eq!(op.flip().flip(), op);
            assert_eq!(op.negate().negate(), op);
        }
    }

    #[test]
    fn builders_and_display() {
        let e = Expr::var("x").add(Expr::int(1)).mul(Expr::int(2));
        assert_eq!(e.to_string(), "((x + 1) * 2)");
        let c = Cond::le(Expr::var("b"), Expr::int(11));
        assert_eq!(c.to_string(), "b <= 11");
        assert_eq!(Expr::var("x").as_var(), Some("x"));
        assert_eq!(Expr::int(3).as_int(), Some(3));
        assert_eq!(Expr::var("x").as_int(), None);
    }
}
