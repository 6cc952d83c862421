//! Racklet - a tree-walking evaluator for a small functional subset of Racket
//!
//! The language covers integer and boolean literals, symbols, proper lists and
//! the special forms `quote`, `define`, `lambda` and `if`, plus a catalog of
//! primitive operations:
//!
//! ```scheme
//! (define len (lambda (l) (if (null? l) 0 (+ 1 (len (cdr l))))))
//! (len '(1 2 3))        ; => 3
//! (if 0 'yes 'no)       ; => no, only #t selects the consequent
//! ```
//!
//! ## Strict Semantics
//!
//! - The only true value is the literal `#t`; every other value is false for `if`
//! - Pairs must be lists: `(cons 1 2)` is a type error
//! - Closures capture their defining frame, never the caller's
//! - Strict arity checking for closures and primitives
//! - Arithmetic overflow is reported, never wrapped
//!
//! ## Modules
//!
//! - `ast`: expression model shared by code and data
//! - `frame`: lexical environment chain
//! - `closure`: user-defined functions
//! - `primitives`: built-in operations seeded into the global frame
//! - `evaluator`: the `eval` procedure and function application
//! - `reader`: text to expressions (feature `reader`)
//! - `session`: global frame plus derived-function prelude (feature `reader`)

use std::fmt;

use crate::primitives::Arity;

/// Maximum parsing depth to prevent stack overflow attacks
/// This limits deeply nested structures in the reader
pub const MAX_PARSE_DEPTH: usize = 64;

/// Maximum number of nested closure applications in one evaluation
/// There is no tail-call elimination, so deep user recursion hits this limit.
/// The evaluator grows its stack on demand, so the limit holds on any thread.
pub const MAX_EVAL_DEPTH: usize = 10_000;

/// Categorizes the different kinds of parsing errors.
#[derive(Debug, PartialEq, Clone)]
pub enum ParseErrorKind {
    /// Invalid or unexpected syntax (bad tokens, stray closing parentheses)
    InvalidSyntax,
    /// Input ended before the expression was complete (unclosed parens, dangling quote)
    Incomplete,
    /// Expression nesting exceeded the maximum parse depth
    TooDeeplyNested,
    /// Valid Racket syntax that is intentionally not supported (strings, dotted pairs)
    Unsupported,
    /// Implementation-imposed limit exceeded (integer literal out of range)
    ImplementationLimit,
}

/// A structured error providing detailed information about a parsing failure.
#[derive(Debug, PartialEq, Clone)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub message: String,
    /// Context snippet from the input showing where the error occurred (max 100 chars)
    pub context: Option<String>,
    /// The problematic token or character encountered, if identifiable
    pub found: Option<String>,
}

impl ParseError {
    /// Create a ParseError with all fields
    pub fn new(
        kind: ParseErrorKind,
        message: impl Into<String>,
        context: Option<String>,
        found: Option<String>,
    ) -> Self {
        ParseError {
            kind,
            message: message.into(),
            context,
            found,
        }
    }

    /// Create a simple ParseError with a kind and message but no context
    pub fn from_message(kind: ParseErrorKind, message: impl Into<String>) -> Self {
        Self::new(kind, message, None, None)
    }

    /// Create a ParseError with context and found token extracted from input at a given offset
    pub fn with_context_and_found(
        kind: ParseErrorKind,
        message: impl Into<String>,
        input: &str,
        error_offset: usize,
        found: Option<String>,
    ) -> Self {
        const MAX_CONTEXT: usize = 100;

        // Offsets are byte offsets, context is extracted in chars
        let error_char = input[..error_offset.min(input.len())].chars().count();
        let context_start = error_char.saturating_sub(20);

        let context_str: String = input
            .chars()
            .skip(context_start)
            .take(MAX_CONTEXT)
            .collect();

        let mut display_context = String::new();
        if context_start > 0 {
            display_context.push_str("[...]");
        }
        display_context.push_str(&context_str);
        if context_start + context_str.chars().count() < input.chars().count() {
            display_context.push_str("[...]");
        }

        let display_context = display_context.replace('\n', "\\n").replace('\r', "");

        Self::new(kind, message, Some(display_context), found)
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(found) = &self.found {
            write!(f, "\nFound: {found}")?;
        }
        if let Some(context) = &self.context {
            write!(f, "\nContext: {context}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseError {}

/// Error types for the interpreter
///
/// Every variant aborts the evaluation of the current top-level expression only.
/// Definitions made before the failure stay in the global frame.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// Malformed source text, reported by the reader
    #[error("SyntaxError: {0}")]
    Syntax(#[from] ParseError),
    /// Lookup miss at the top of the frame chain
    #[error("Unbound variable: {0}")]
    UnboundVariable(String),
    /// Attempt to evaluate `()` as code
    #[error("Cannot evaluate the empty list")]
    EmptyListEvaluation,
    /// Wrong arity or shape for a special form
    #[error("Malformed {form}: {message}")]
    MalformedForm { form: &'static str, message: String },
    /// Call-position value is neither a primitive nor a closure
    #[error("Cannot call {0} as a function")]
    NotAFunction(String),
    /// Argument count disagrees with the function's arity
    #[error("ArityMismatch: {function} expects {expected}, got {got}")]
    ArityMismatch {
        function: String,
        expected: Arity,
        got: usize,
    },
    /// A primitive received an argument of the wrong kind
    #[error("Type mismatch: {0}")]
    TypeMismatch(String),
    /// Integer overflow or division by zero
    #[error("Arithmetic error: {0}")]
    Arithmetic(String),
    /// Nested closure applications exceeded `MAX_EVAL_DEPTH`
    #[error("Evaluation depth limit exceeded (max: {max})", max = MAX_EVAL_DEPTH)]
    DepthLimitExceeded,
}

impl Error {
    /// Create an ArityMismatch for the named function
    pub fn arity_mismatch(function: impl Into<String>, expected: Arity, got: usize) -> Self {
        Error::ArityMismatch {
            function: function.into(),
            expected,
            got,
        }
    }

    /// Create a MalformedForm error for a special form keyword
    pub fn malformed(form: &'static str, message: impl Into<String>) -> Self {
        Error::MalformedForm {
            form,
            message: message.into(),
        }
    }

    /// True for errors raised by the reader rather than the evaluator
    pub fn is_syntax_error(&self) -> bool {
        matches!(self, Error::Syntax(_))
    }
}

pub mod ast;
pub mod closure;
pub mod evaluator;
pub mod frame;
pub mod primitives;

#[cfg(feature = "reader")]
pub mod reader;

#[cfg(feature = "reader")]
pub mod session;
