//! A global frame plus the source-text entry point used by front ends.

use crate::Error;
use crate::ast::Value;
use crate::evaluator::{eval, new_global_frame};
use crate::frame::Frame;
use crate::reader::parse;

/// Derived functions written in the language itself, loaded by [`Session::with_prelude`]
pub const PRELUDE: &[&str] = &[
    "(define map (lambda (f l) (if (null? l) (quote ()) (cons (f (car l)) (map f (cdr l))))))",
    "(define filter (lambda (keep? l) (if (null? l) (quote ()) \
       (if (keep? (car l)) (cons (car l) (filter keep? (cdr l))) (filter keep? (cdr l))))))",
    "(define foldl (lambda (f acc l) (if (null? l) acc (foldl f (f (car l) acc) (cdr l)))))",
    "(define reverse (lambda (l) (foldl cons (quote ()) l)))",
];

/// One interpreter session: a global frame that persists across inputs
pub struct Session {
    global: Frame,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// A session whose global frame holds only the primitives
    pub fn new() -> Self {
        Session {
            global: new_global_frame(),
        }
    }

    /// A session that also has the derived functions of [`PRELUDE`] defined
    pub fn with_prelude() -> Result<Self, Error> {
        let session = Self::new();
        for source in PRELUDE {
            session.eval_source(source)?;
        }
        log::info!("Loaded {} prelude definitions", PRELUDE.len());
        Ok(session)
    }

    pub fn global_frame(&self) -> &Frame {
        &self.global
    }

    /// Evaluate one expression against the global frame
    pub fn eval(&self, expr: &Value) -> Result<Value, Error> {
        eval(expr, &self.global)
    }

    /// Parse `source` and evaluate each expression in order, returning all results.
    ///
    /// Stops at the first error. Definitions made by earlier expressions stay in
    /// the global frame; a syntax error evaluates nothing.
    pub fn eval_source(&self, source: &str) -> Result<Vec<Value>, Error> {
        parse(source)?
            .iter()
            .map(|expr| self.eval(expr))
            .collect()
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used)] // test code OK
mod tests {
    use super::*;
    use crate::ast::{Symbol, nil, sym, val};

    fn last(session: &Session, source: &str) -> Value {
        session.eval_source(source).unwrap().pop().unwrap()
    }

    #[test]
    fn test_eval_source_returns_every_result() {
        let session = Session::new();
        assert_eq!(
            session.eval_source("(define x 2) (* x 21) 'done").unwrap(),
            vec![val(2), val(42), sym("done")]
        );
        assert_eq!(session.eval_source("").unwrap(), vec![]);
        assert_eq!(
            session.global_frame().lookup(&Symbol::new("x")),
            Ok(val(2))
        );
    }

    #[test]
    fn test_errors_stop_evaluation_but_keep_definitions() {
        let session = Session::new();

        let err = session
            .eval_source("(define a 1) (car '()) (define b 2)")
            .unwrap_err();
        assert!(matches!(err, Error::TypeMismatch(_)));
        assert_eq!(last(&session, "a"), val(1));
        assert!(session.eval_source("b").is_err());

        // Syntax errors evaluate nothing
        let err = session.eval_source("(define c 3) (").unwrap_err();
        assert!(err.is_syntax_error());
        assert!(session.eval_source("c").is_err());
    }

    #[test]
    fn test_sessions_are_independent() {
        let first = Session::new();
        let second = Session::default();
        first.eval_source("(define only-first 1)").unwrap();
        assert!(matches!(
            second.eval_source("only-first"),
            Err(Error::UnboundVariable(name)) if name == "only-first"
        ));
    }

    #[test]
    fn test_prelude_functions() {
        let session = Session::with_prelude().unwrap();

        let test_cases = vec![
            ("(map (lambda (x) (* x x)) '(1 2 3))", val([1, 4, 9])),
            ("(map car '((1 2) (3 4)))", val([1, 3])),
            ("(map (lambda (x) x) '())", nil()),
            ("(filter (lambda (x) (> x 2)) '(1 5 2 7))", val([5, 7])),
            ("(filter symbol? '(a 1 b #t))", val([sym("a"), sym("b")])),
            ("(foldl + 0 '(1 2 3 4))", val(10)),
            ("(foldl cons '() '(1 2 3))", val([3, 2, 1])),
            ("(reverse '(1 2 3))", val([3, 2, 1])),
            ("(reverse '())", nil()),
        ];

        for (source, expected) in test_cases {
            assert_eq!(last(&session, source), expected, "{source}");
        }
        assert_eq!(last(&session, "map").to_string(), "#<function:map>");

        // Prelude functions are ordinary bindings and can be replaced
        session.eval_source("(define map 5)").unwrap();
        assert_eq!(last(&session, "map"), val(5));
        assert!(Session::new().eval_source("(map car '())").is_err());
    }
}
