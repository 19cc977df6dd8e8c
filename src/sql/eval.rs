//! Evaluator for compiled tag predicates.

use super::ast::{CmpOp, Expr};
use std::collections::HashMap;

/// Evaluate a predicate against one element's tags.
///
/// Pure and total: trees are finite and acyclic by construction, and
/// anything reaching here came out of the parser or the theme compiler.
pub fn evaluate(expr: &Expr, tags: &HashMap<String, String>) -> bool {
    match expr {
        Expr::And(l, r) => evaluate(l, tags) && evaluate(r, tags),

        Expr::Or(l, r) => evaluate(l, tags) || evaluate(r, tags),

        Expr::Eq { key, value } => match tags.get(key) {
            None => false,
            Some(actual) => actual == value,
        },

        // An absent key counts as "not equal"
        Expr::NotEq { key, value } => match tags.get(key) {
            None => true,
            Some(actual) => actual != value,
        },

        Expr::Cmp { key, op, value } => match tags.get(key) {
            None => false,
            Some(actual) => compare(*op, actual, value),
        },

        Expr::In { key, values } => match tags.get(key) {
            None => false,
            Some(actual) => values.iter().any(|v| v == actual),
        },

        Expr::NotNull { key } => tags.contains_key(key),

        Expr::Null => false,
    }
}

/// Lexicographic comparison of the raw strings. OSM tag values are
/// untyped, so ordered comparisons are NOT numeric: "3" > "20" holds.
fn compare(op: CmpOp, actual: &str, value: &str) -> bool {
    match op {
        CmpOp::Lt => actual < value,
        CmpOp::Le => actual <= value,
        CmpOp::Gt => actual > value,
        CmpOp::Ge => actual >= value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::parse_where;

    fn tags(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_matcher_binop() {
        let m = parse_where("building = 'yes'").unwrap();
        assert!(m.matches(&tags(&[("building", "yes")])));
        assert!(!m.matches(&tags(&[("building", "no")])));

        let m = parse_where("building != 'yes'").unwrap();
        assert!(!m.matches(&tags(&[("building", "yes")])));
        assert!(m.matches(&tags(&[("building", "no")])));
    }

    #[test]
    fn test_not_eq_matches_absent_key() {
        let m = parse_where("building != 'yes'").unwrap();
        assert!(m.matches(&tags(&[])));
    }

    #[test]
    fn test_matcher_colon() {
        let m = parse_where("addr:housenumber = 1").unwrap();
        assert!(m.matches(&tags(&[("addr:housenumber", "1")])));
    }

    #[test]
    fn test_matcher_doublequote() {
        let m = parse_where("\"addr:housenumber\" = 1").unwrap();
        assert!(m.matches(&tags(&[("addr:housenumber", "1")])));

        let m = parse_where("\"addr:housenumber\" IN ('foo')").unwrap();
        assert!(m.matches(&tags(&[("addr:housenumber", "foo")])));

        let m = parse_where("\"addr:housenumber\" IS NOT NULL").unwrap();
        assert!(m.matches(&tags(&[("addr:housenumber", "foo")])));
    }

    #[test]
    fn test_matcher_or() {
        let m = parse_where("building = 'yes' OR amenity = 'bank'").unwrap();
        assert!(m.matches(&tags(&[("building", "yes")])));
        assert!(m.matches(&tags(&[("amenity", "bank")])));
        assert!(!m.matches(&tags(&[])));
    }

    #[test]
    fn test_matcher_and() {
        let m = parse_where("building = 'yes' AND amenity = 'bank'").unwrap();
        assert!(!m.matches(&tags(&[("building", "yes")])));
        assert!(!m.matches(&tags(&[("amenity", "bank")])));
        assert!(m.matches(&tags(&[("building", "yes"), ("amenity", "bank")])));
    }

    #[test]
    fn test_matcher_is_not_null() {
        let m = parse_where("building IS NOT NULL").unwrap();
        assert!(m.matches(&tags(&[("building", "one")])));
        assert!(m.matches(&tags(&[("building", "two")])));
        assert!(!m.matches(&tags(&[])));
    }

    #[test]
    fn test_in() {
        let m = parse_where("building IN ('one','two')").unwrap();
        assert!(m.matches(&tags(&[("building", "one")])));
        assert!(m.matches(&tags(&[("building", "two")])));
        assert!(!m.matches(&tags(&[])));
        assert!(!m.matches(&tags(&[("building", "three")])));
    }

    #[test]
    fn test_comparison_is_lexicographic() {
        let m = parse_where("height > 20").unwrap();
        assert!(m.matches(&tags(&[("height", "21")])));
        // boundary is exclusive
        assert!(!m.matches(&tags(&[("height", "20")])));
        // string ordering, not numeric
        assert!(m.matches(&tags(&[("height", "3")])));
        assert!(!m.matches(&tags(&[])));
    }

    #[test]
    fn test_comparison_inclusive_bounds() {
        let m = parse_where("height >= 20").unwrap();
        assert!(m.matches(&tags(&[("height", "20")])));

        let m = parse_where("height <= 20").unwrap();
        assert!(m.matches(&tags(&[("height", "20")])));
        assert!(m.matches(&tags(&[("height", "1")])));
        assert!(!m.matches(&tags(&[("height", "21")])));
    }

    #[test]
    fn test_any_and_union() {
        let m = Expr::any("building");
        assert!(m.matches(&tags(&[("building", "one")])));
        assert!(!m.matches(&tags(&[])));

        let m = Expr::any("building").union(Expr::any("parking"));
        assert!(m.matches(&tags(&[("building", "one")])));
        assert!(m.matches(&tags(&[("parking", "one")])));
    }

    #[test]
    fn test_null_matches_nothing() {
        let m = Expr::null();
        assert!(!m.matches(&tags(&[("building", "one")])));
        assert!(!m.matches(&tags(&[])));
    }
}
