//! Compiled predicate trees for theme matching.

use std::collections::HashMap;
use std::fmt;

use super::eval::evaluate;

/// Ordered comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Lt, // <
    Le, // <=
    Gt, // >
    Ge, // >=
}

impl fmt::Display for CmpOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CmpOp::Lt => write!(f, "<"),
            CmpOp::Le => write!(f, "<="),
            CmpOp::Gt => write!(f, ">"),
            CmpOp::Ge => write!(f, ">="),
        }
    }
}

/// A compiled tag predicate.
///
/// Trees are immutable once built: composition always produces new nodes
/// and never rewrites an operand.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Both sides must match.
    And(Box<Expr>, Box<Expr>),
    /// Either side may match.
    Or(Box<Expr>, Box<Expr>),
    /// Key present with exactly this value.
    Eq { key: String, value: String },
    /// Key absent, or present with a different value.
    NotEq { key: String, value: String },
    /// Key present and lexicographically ordered against the literal.
    Cmp {
        key: String,
        op: CmpOp,
        value: String,
    },
    /// Key present with one of the listed values.
    In { key: String, values: Vec<String> },
    /// Key present, any value.
    NotNull { key: String },
    /// Matches nothing; the identity element for `union`.
    Null,
}

impl Expr {
    /// Predicate matching any element carrying `key`.
    pub fn any(key: impl Into<String>) -> Expr {
        Expr::NotNull { key: key.into() }
    }

    /// The empty predicate: matches nothing.
    pub fn null() -> Expr {
        Expr::Null
    }

    /// OR-composition with `Null` as two-sided identity, so predicates can
    /// be accumulated in a loop without special-casing the first clause.
    pub fn union(self, other: Expr) -> Expr {
        match (self, other) {
            (Expr::Null, e) => e,
            (e, Expr::Null) => e,
            (a, b) => Expr::Or(Box::new(a), Box::new(b)),
        }
    }

    /// True if the predicate holds for `tags`.
    pub fn matches(&self, tags: &HashMap<String, String>) -> bool {
        evaluate(self, tags)
    }

    /// Every column name mentioned in the tree, in reading order.
    /// Duplicates are kept; callers union into a set as needed.
    pub fn column_names(&self) -> Vec<String> {
        fn walk(expr: &Expr, out: &mut Vec<String>) {
            match expr {
                Expr::And(l, r) | Expr::Or(l, r) => {
                    walk(l, out);
                    walk(r, out);
                }
                Expr::Eq { key, .. }
                | Expr::NotEq { key, .. }
                | Expr::Cmp { key, .. }
                | Expr::In { key, .. }
                | Expr::NotNull { key } => out.push(key.clone()),
                Expr::Null => {}
            }
        }

        let mut out = Vec::new();
        walk(self, &mut out);
        out
    }

    /// Render the canonical SQL text for this predicate.
    ///
    /// For display and debugging. Equality and membership operands are
    /// single-quoted; ordered comparisons render their literal bare, the
    /// way the grammar accepts them (`height > 20`). `Null` renders empty;
    /// it never survives into a compiled theme matcher.
    pub fn to_sql(&self) -> String {
        match self {
            Expr::And(l, r) => format!("{} AND {}", l.to_sql(), r.to_sql()),
            Expr::Or(l, r) => format!("{} OR {}", l.to_sql(), r.to_sql()),
            Expr::Eq { key, value } => format!("{} = '{}'", key, value),
            Expr::NotEq { key, value } => format!("{} != '{}'", key, value),
            Expr::Cmp { key, op, value } => format!("{} {} {}", key, op, value),
            Expr::In { key, values } => {
                let parts: Vec<String> = values.iter().map(|v| format!("'{}'", v)).collect();
                format!("{} IN ({})", key, parts.join(","))
            }
            Expr::NotNull { key } => format!("{} IS NOT NULL", key),
            Expr::Null => String::new(),
        }
    }
}
