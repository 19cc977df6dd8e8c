//! Lexer/tokenizer for the SQL filter subset.

use winnow::ascii::multispace0;
use winnow::combinator::alt;
use winnow::prelude::*;
use winnow::token::{one_of, take_till, take_while};

/// Token types for the SQL subset.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Bare column name, or a keyword (AND/OR/IN/IS/NOT/NULL); keywords
    /// are only given meaning by the parser, case-insensitively.
    Ident(String),
    /// Quoted column name or value, surrounding quotes stripped.
    /// Embedded spaces are preserved as-is.
    Quoted(String),
    /// Integer literal, kept as text: tag values are untyped strings.
    Int(String),

    // Comparison operators
    Eq, // =
    Ne, // !=
    Lt, // <
    Le, // <=
    Gt, // >
    Ge, // >=

    // Punctuation
    LParen, // (
    RParen, // )
    Comma,  // ,

    // End of input
    Eof,
}

// Manually define PResult for resilience against winnow version changes
type PResult<T> = Result<T, winnow::error::ErrMode<winnow::error::ContextError>>;

/// Lex a bare identifier: a letter followed by letters, digits, `_` or `:`.
fn lex_ident(input: &mut &str) -> PResult<Token> {
    let first: char = one_of(|c: char| c.is_alphabetic()).parse_next(input)?;
    let rest = take_while(0.., |c: char| c.is_alphanumeric() || c == '_' || c == ':')
        .parse_next(input)?;
    Ok(Token::Ident(format!("{}{}", first, rest)))
}

/// Lex a single- or double-quoted string. No escape sequences; the quote
/// character simply terminates the literal.
fn lex_quoted(input: &mut &str) -> PResult<Token> {
    let quote: char = one_of(['\'', '"']).parse_next(input)?;
    let body = take_till(0.., quote).parse_next(input)?;
    let _: char = one_of(quote).parse_next(input)?;
    Ok(Token::Quoted(body.to_string()))
}

/// Lex an unsigned integer literal.
fn lex_int(input: &mut &str) -> PResult<Token> {
    let digits = take_while(1.., |c: char| c.is_ascii_digit()).parse_next(input)?;
    Ok(Token::Int(digits.to_string()))
}

/// Lex a single token.
fn lex_token(input: &mut &str) -> PResult<Token> {
    multispace0.parse_next(input)?;

    if input.is_empty() {
        return Ok(Token::Eof);
    }

    alt((
        // Multi-char operators first
        "!=".value(Token::Ne),
        "<=".value(Token::Le),
        ">=".value(Token::Ge),
        // Single-char operators
        "=".value(Token::Eq),
        "<".value(Token::Lt),
        ">".value(Token::Gt),
        "(".value(Token::LParen),
        ")".value(Token::RParen),
        ",".value(Token::Comma),
        lex_quoted,
        lex_int,
        lex_ident,
    ))
    .parse_next(input)
}

/// Tokenize the entire input. Anything outside the token inventory, such
/// as statement separators, fails the whole fragment.
pub fn tokenize(input: &str) -> Result<Vec<Token>, String> {
    let mut remaining = input;
    let mut tokens = Vec::new();

    loop {
        match lex_token(&mut remaining) {
            Ok(Token::Eof) => break,
            Ok(tok) => tokens.push(tok),
            Err(e) => return Err(format!("Lexer error at '{}': {:?}", remaining, e)),
        }
    }

    tokens.push(Token::Eof);
    Ok(tokens)
}
