//! Parser for the SQL filter subset.
//!
//! Grammar (in rough EBNF):
//!
//! expression = condition (("and" | "or") expression)?
//! condition  = column binop rval
//!            | column "in" "(" rval ("," rval)* ")"
//!            | column "is" "not" "null"
//!            | "(" expression ")"
//! column     = IDENT | QUOTED
//! binop      = "=" | "!=" | "<" | "<=" | ">" | ">="
//! rval       = INT | QUOTED
//!
//! Keywords are case-insensitive. The chain rule is right-recursive and
//! applies no operator precedence: `a AND b OR c` groups as
//! `a AND (b OR c)`. Parenthesize to group explicitly.

use super::ast::{CmpOp, Expr};
use super::lexer::{Token, tokenize};

/// The one error message mapping authors see for any malformed fragment.
pub const PARSE_ERROR: &str = "SQL could not be parsed.";

/// Parser state.
struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Parser { tokens, pos: 0 }
    }

    fn peek(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&Token::Eof)
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens.get(self.pos).cloned().unwrap_or(Token::Eof);
        self.pos += 1;
        tok
    }

    fn expect(&mut self, expected: Token) -> Result<(), String> {
        let tok = self.advance();
        if tok == expected {
            Ok(())
        } else {
            Err(format!("Expected {:?}, got {:?}", expected, tok))
        }
    }

    /// True if the next token is a bare identifier spelling `word`,
    /// compared case-insensitively.
    fn at_keyword(&self, word: &str) -> bool {
        matches!(self.peek(), Token::Ident(w) if w.eq_ignore_ascii_case(word))
    }

    fn expect_keyword(&mut self, word: &str) -> Result<(), String> {
        if self.at_keyword(word) {
            self.advance();
            Ok(())
        } else {
            Err(format!("Expected keyword {:?}, got {:?}", word, self.peek()))
        }
    }

    /// Parse expression: condition (("and" | "or") expression)?
    ///
    /// The recursion is on the right, so chains nest rightward and the
    /// operator at each link is taken as written, with no precedence.
    fn parse_expression(&mut self) -> Result<Expr, String> {
        let cond = self.parse_condition()?;

        if self.at_keyword("and") {
            self.advance();
            let rest = self.parse_expression()?;
            Ok(Expr::And(Box::new(cond), Box::new(rest)))
        } else if self.at_keyword("or") {
            self.advance();
            let rest = self.parse_expression()?;
            Ok(Expr::Or(Box::new(cond), Box::new(rest)))
        } else {
            Ok(cond)
        }
    }

    fn parse_condition(&mut self) -> Result<Expr, String> {
        if matches!(self.peek(), Token::LParen) {
            self.advance();
            let inner = self.parse_expression()?;
            self.expect(Token::RParen)?;
            return Ok(inner);
        }

        let key = self.parse_column()?;

        match self.peek().clone() {
            Token::Eq => {
                self.advance();
                let value = self.parse_rval()?;
                Ok(Expr::Eq { key, value })
            }
            Token::Ne => {
                self.advance();
                let value = self.parse_rval()?;
                Ok(Expr::NotEq { key, value })
            }
            Token::Lt => self.parse_cmp(key, CmpOp::Lt),
            Token::Le => self.parse_cmp(key, CmpOp::Le),
            Token::Gt => self.parse_cmp(key, CmpOp::Gt),
            Token::Ge => self.parse_cmp(key, CmpOp::Ge),
            Token::Ident(word) if word.eq_ignore_ascii_case("in") => {
                self.advance();
                self.expect(Token::LParen)?;
                let mut values = vec![self.parse_rval()?];
                while matches!(self.peek(), Token::Comma) {
                    self.advance();
                    values.push(self.parse_rval()?);
                }
                self.expect(Token::RParen)?;
                Ok(Expr::In { key, values })
            }
            Token::Ident(word) if word.eq_ignore_ascii_case("is") => {
                self.advance();
                self.expect_keyword("not")?;
                self.expect_keyword("null")?;
                Ok(Expr::NotNull { key })
            }
            other => Err(format!("Expected operator after column, got {:?}", other)),
        }
    }

    fn parse_cmp(&mut self, key: String, op: CmpOp) -> Result<Expr, String> {
        self.advance();
        let value = self.parse_rval()?;
        Ok(Expr::Cmp { key, op, value })
    }

    fn parse_column(&mut self) -> Result<String, String> {
        match self.advance() {
            Token::Ident(name) | Token::Quoted(name) => Ok(name),
            other => Err(format!("Expected column name, got {:?}", other)),
        }
    }

    fn parse_rval(&mut self) -> Result<String, String> {
        match self.advance() {
            Token::Int(value) | Token::Quoted(value) => Ok(value),
            other => Err(format!("Expected value, got {:?}", other)),
        }
    }
}

/// Parse a SQL filter fragment into a compiled predicate.
///
/// The whole input must form one expression; statement separators, DDL
/// keywords, and trailing tokens are all rejected. Any failure surfaces
/// as the single fixed [`PARSE_ERROR`] message; the underlying reason is
/// logged at debug level for mapping authors chasing a rejection.
pub fn parse_where(input: &str) -> Result<Expr, String> {
    match try_parse(input) {
        Ok(expr) => Ok(expr),
        Err(reason) => {
            tracing::debug!("rejected SQL fragment {:?}: {}", input, reason);
            Err(PARSE_ERROR.to_string())
        }
    }
}

fn try_parse(input: &str) -> Result<Expr, String> {
    let tokens = tokenize(input)?;
    let mut parser = Parser::new(tokens);
    let expr = parser.parse_expression()?;

    // Ensure we consumed all tokens
    if !matches!(parser.peek(), Token::Eof) {
        return Err(format!(
            "Unexpected token after expression: {:?}",
            parser.peek()
        ));
    }

    Ok(expr)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic() {
        let expr = parse_where("name = 'a name'").unwrap();
        assert_eq!(
            expr,
            Expr::Eq {
                key: "name".into(),
                value: "a name".into(),
            }
        );
    }

    #[test]
    fn test_identifier_list() {
        let expr = parse_where("natural in ('water','cliff')").unwrap();
        assert_eq!(
            expr,
            Expr::In {
                key: "natural".into(),
                values: vec!["water".into(), "cliff".into()],
            }
        );
    }

    #[test]
    fn test_int_value() {
        let expr = parse_where("height > 20").unwrap();
        assert_eq!(
            expr,
            Expr::Cmp {
                key: "height".into(),
                op: CmpOp::Gt,
                value: "20".into(),
            }
        );
    }

    #[test]
    fn test_not_null() {
        let expr = parse_where("height IS NOT NULL").unwrap();
        assert_eq!(
            expr,
            Expr::NotNull {
                key: "height".into()
            }
        );
    }

    #[test]
    fn test_and_or() {
        assert!(parse_where("height IS NOT NULL and height > 20").is_ok());
        assert!(parse_where("height IS NOT NULL or height > 20").is_ok());
        assert!(parse_where("height IS NOT NULL or height > 20 and height < 30").is_ok());
    }

    #[test]
    fn test_chain_nests_rightward() {
        let expr = parse_where("a = '1' AND b = '2' OR c = '3'").unwrap();
        match expr {
            Expr::And(left, right) => {
                assert!(matches!(*left, Expr::Eq { .. }));
                assert!(matches!(*right, Expr::Or(_, _)));
            }
            other => panic!("expected And at the root, got {:?}", other),
        }
    }

    #[test]
    fn test_parens() {
        assert!(parse_where("(admin IS NOT NULL and level > 4)").is_ok());
        let expr = parse_where("(admin IS NOT NULL and level > 4) AND height is not null").unwrap();
        assert!(matches!(expr, Expr::And(_, _)));
    }

    #[test]
    fn test_parens_group_explicitly() {
        let expr = parse_where("(a = '1' AND b = '2') OR c = '3'").unwrap();
        match expr {
            Expr::Or(left, right) => {
                assert!(matches!(*left, Expr::And(_, _)));
                assert!(matches!(*right, Expr::Eq { .. }));
            }
            other => panic!("expected Or at the root, got {:?}", other),
        }
    }

    #[test]
    fn test_colons_etc() {
        assert!(parse_where("addr:housenumber IS NOT NULL").is_ok());
        assert!(parse_where("admin_level IS NOT NULL").is_ok());
    }

    #[test]
    fn test_quoted_column() {
        let expr = parse_where("\"addr:housenumber\" = 1").unwrap();
        assert_eq!(
            expr,
            Expr::Eq {
                key: "addr:housenumber".into(),
                value: "1".into(),
            }
        );
    }

    #[test]
    fn test_case_insensitive_keywords() {
        assert_eq!(
            parse_where("building is not null").unwrap(),
            parse_where("building IS NOT NULL").unwrap()
        );
        assert_eq!(
            parse_where("a = '1' and b = '2'").unwrap(),
            parse_where("a = '1' AND b = '2'").unwrap()
        );
    }

    #[test]
    fn test_invalid_sql() {
        for bad in [
            "drop table planet_osm_polygon",
            "(drop table planet_osm_polygon)",
            "",
            "name = 'a name'; blah",
            "name = 'a name' extra",
            "building in ()",
        ] {
            assert_eq!(parse_where(bad), Err(PARSE_ERROR.to_string()), "{:?}", bad);
        }
    }
}
