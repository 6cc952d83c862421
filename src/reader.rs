//! Source text to expressions.
//!
//! The reader accepts decimal and `#x` hexadecimal integers, `#t`/`#f`, symbols,
//! parenthesised lists, the `'x` shorthand for `(quote x)` and `;` line comments.
//! A text may hold any number of top-level expressions. String literals and
//! dotted pairs are valid Racket but rejected here as unsupported.

use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_while1},
    character::complete::{char, multispace1, not_line_ending, one_of, satisfy},
    combinator::{cut, not, opt, recognize, value},
    error::ErrorKind,
    multi::many0,
    sequence::{pair, terminated},
};

use crate::ast::{IntegerType, Value, is_symbol_char, is_valid_symbol, sym, val};
use crate::{Error, MAX_PARSE_DEPTH, ParseError, ParseErrorKind};

type NomError<'a> = nom::Err<nom::error::Error<&'a str>>;

fn failure(input: &str, kind: ErrorKind) -> NomError<'_> {
    nom::Err::Failure(nom::error::Error::new(input, kind))
}

/// The token starting at `input`, for error reports
fn next_token(input: &str) -> Option<String> {
    let token: String = input
        .chars()
        .take_while(|c| !c.is_whitespace() && *c != '(' && *c != ')')
        .take(20)
        .collect();
    if token.is_empty() {
        input.chars().next().map(String::from)
    } else {
        Some(token)
    }
}

/// Convert nom parsing errors to structured parse errors
fn to_parse_error(input: &str, error: NomError<'_>) -> ParseError {
    match error {
        nom::Err::Error(e) | nom::Err::Failure(e) => {
            let offset = input.len().saturating_sub(e.input.len());
            let found = next_token(e.input);
            let (kind, message) = match e.code {
                ErrorKind::TooLarge => (
                    ParseErrorKind::TooDeeplyNested,
                    format!("Expression too deeply nested (max depth: {MAX_PARSE_DEPTH})"),
                ),
                ErrorKind::Digit => (
                    ParseErrorKind::ImplementationLimit,
                    format!(
                        "Integer literal out of range ({} to {})",
                        IntegerType::MIN,
                        IntegerType::MAX
                    ),
                ),
                ErrorKind::Verify => (
                    ParseErrorKind::Unsupported,
                    "Strings and dotted pairs are not supported".to_owned(),
                ),
                _ if e.input.is_empty() => (
                    ParseErrorKind::Incomplete,
                    "Unexpected end of input".to_owned(),
                ),
                _ => {
                    let near: String = e.input.chars().take(10).collect();
                    (
                        ParseErrorKind::InvalidSyntax,
                        format!("Invalid syntax near '{near}'"),
                    )
                }
            };
            ParseError::with_context_and_found(kind, message, input, offset, found)
        }
        nom::Err::Incomplete(_) => {
            ParseError::from_message(ParseErrorKind::Incomplete, "Incomplete input")
        }
    }
}

/// Skip whitespace and `;` comments
fn skip_atmosphere(input: &str) -> IResult<&str, ()> {
    value(
        (),
        many0(alt((
            multispace1,
            recognize(pair(char(';'), not_line_ending)),
        ))),
    )
    .parse(input)
}

/// An atom must not run straight into another atom (`123abc`, `#tx`)
fn atom_end(input: &str) -> IResult<&str, ()> {
    not(satisfy(|c| is_symbol_char(c) || matches!(c, '#' | '"' | '.'))).parse(input)
}

/// Parse an integer (decimal or hexadecimal)
fn parse_integer(input: &str) -> IResult<&str, Value> {
    alt((parse_hexadecimal, parse_decimal)).parse(input)
}

/// Parse a decimal integer with optional sign
fn parse_decimal(input: &str) -> IResult<&str, Value> {
    let (remaining, number_str) = recognize(pair(
        opt(one_of("+-")),
        take_while1(|c: char| c.is_ascii_digit()),
    ))
    .parse(input)?;

    match number_str.parse::<IntegerType>() {
        Ok(n) => Ok((remaining, Value::Integer(n))),
        // Only overflow can fail here; report it against the literal
        Err(_) => Err(failure(input, ErrorKind::Digit)),
    }
}

/// Parse a hexadecimal integer (#x or #X prefix)
fn parse_hexadecimal(input: &str) -> IResult<&str, Value> {
    let (remaining, _) = char('#').parse(input)?;
    let (remaining, _) = alt((char('x'), char('X'))).parse(remaining)?;
    let (remaining, hex_digits) = take_while1(|c: char| c.is_ascii_hexdigit()).parse(remaining)?;

    match IntegerType::from_str_radix(hex_digits, 16) {
        Ok(n) => Ok((remaining, Value::Integer(n))),
        Err(_) => Err(failure(input, ErrorKind::Digit)),
    }
}

/// Parse a boolean (#t or #f)
fn parse_bool(input: &str) -> IResult<&str, Value> {
    alt((
        value(Value::Bool(true), tag("#t")),
        value(Value::Bool(false), tag("#f")),
    ))
    .parse(input)
}

/// Parse a symbol (identifier)
fn parse_symbol(input: &str) -> IResult<&str, Value> {
    let (remaining, candidate) = take_while1(is_symbol_char).parse(input)?;

    if is_valid_symbol(candidate) {
        Ok((remaining, sym(candidate)))
    } else {
        Err(nom::Err::Error(nom::error::Error::new(
            input,
            ErrorKind::Alpha,
        )))
    }
}

/// Reject string literals and dotted pairs outright
fn parse_unsupported(input: &str) -> IResult<&str, Value> {
    alt((char('"'), char('.'))).parse(input)?;
    Err(failure(input, ErrorKind::Verify))
}

/// Parse a parenthesised list of expressions
fn parse_list(input: &str, depth: usize) -> IResult<&str, Value> {
    let (mut input, _) = char('(').parse(input)?;
    let mut elements = Vec::new();

    loop {
        let (remaining, _) = skip_atmosphere(input)?;
        if let Some(rest) = remaining.strip_prefix(')') {
            return Ok((rest, val(elements)));
        }
        if remaining.is_empty() {
            return Err(failure(remaining, ErrorKind::Eof));
        }
        // Inside a list every failure is final
        let (remaining, element) = cut(|input| parse_sexpr(input, depth + 1)).parse(remaining)?;
        elements.push(element);
        input = remaining;
    }
}

/// Parse quoted expression ('expr -> (quote expr))
fn parse_quote(input: &str, depth: usize) -> IResult<&str, Value> {
    let (input, _) = char('\'').parse(input)?;
    let (input, expr) = cut(|input| parse_sexpr(input, depth + 1)).parse(input)?;
    Ok((input, val(vec![sym("quote"), expr])))
}

/// Parse one S-expression, skipping leading whitespace and comments
fn parse_sexpr(input: &str, depth: usize) -> IResult<&str, Value> {
    if depth >= MAX_PARSE_DEPTH {
        return Err(failure(input, ErrorKind::TooLarge));
    }
    let (input, _) = skip_atmosphere(input)?;
    alt((
        |input| parse_quote(input, depth),
        |input| parse_list(input, depth),
        parse_unsupported,
        terminated(alt((parse_integer, parse_bool, parse_symbol)), atom_end),
    ))
    .parse(input)
}

/// Parse every top-level expression in `input`.
///
/// Parsing is all or nothing: a syntax error anywhere yields no expressions.
pub fn parse(input: &str) -> Result<Vec<Value>, Error> {
    let mut expressions = Vec::new();
    let mut remaining = input;

    loop {
        let (rest, _) = skip_atmosphere(remaining).map_err(|e| to_parse_error(input, e))?;
        if rest.is_empty() {
            return Ok(expressions);
        }
        if rest.starts_with(')') {
            let offset = input.len() - rest.len();
            return Err(ParseError::with_context_and_found(
                ParseErrorKind::InvalidSyntax,
                "Unexpected ')'",
                input,
                offset,
                Some(")".to_owned()),
            )
            .into());
        }
        let (rest, expression) = parse_sexpr(rest, 0).map_err(|e| to_parse_error(input, e))?;
        expressions.push(expression);
        remaining = rest;
    }
}

/// Parse text that must hold exactly one expression
pub fn parse_expression(input: &str) -> Result<Value, Error> {
    let mut expressions = parse(input)?;
    if expressions.len() == 1
        && let Some(expression) = expressions.pop()
    {
        return Ok(expression);
    }
    Err(ParseError::from_message(
        ParseErrorKind::InvalidSyntax,
        format!(
            "Expected exactly one expression, found {}",
            expressions.len()
        ),
    )
    .into())
}

/// True when `input` is a valid prefix that only lacks more text
/// (an unclosed list or a dangling quote).
pub fn is_incomplete(input: &str) -> bool {
    matches!(
        parse(input),
        Err(Error::Syntax(ParseError {
            kind: ParseErrorKind::Incomplete,
            ..
        }))
    )
}
