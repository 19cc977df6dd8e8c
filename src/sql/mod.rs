//! Restricted SQL `WHERE` subset for theme predicates.
//!
//! Syntax:
//!   building = 'yes'               - exact match
//!   building != 'yes'              - negated match (also true when absent)
//!   height > 20                    - lexicographic string comparison
//!   natural IN ('water','cliff')   - membership
//!   building IS NOT NULL           - key presence
//!   a AND b, a OR b, (a OR b)      - boolean combination
//!   "addr housenumber" = 1         - quoted column names
//!
//! Keywords are case-insensitive. Boolean chains carry no operator
//! precedence and nest rightward: `a AND b OR c` groups as
//! `a AND (b OR c)`; parenthesize to group explicitly.
//!
//! Ordered comparisons compare the raw tag strings, never numbers: OSM
//! tag values are untyped, so `height > 20` matches "21" but also "3".
//!
//! This parser is a security boundary. Mapping documents come from end
//! users, so anything outside the grammar (statement separators, DDL or
//! DML keywords, trailing garbage) fails the whole fragment, and nothing
//! in the input is ever executed.

mod ast;
mod lexer;
mod parser;
mod eval;

pub use ast::{CmpOp, Expr};
pub use eval::evaluate;
pub use parser::{PARSE_ERROR, parse_where};
