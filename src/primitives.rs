//! Built-in operations seeded into every global frame.
//!
//! The catalog is a single static table of [`Primitive`] entries for ease of
//! auditing. Every entry has a fixed name (its binding key in the global frame),
//! an [`Arity`] that is checked before the native function runs, and a native
//! implementation over already-evaluated arguments.
//!
//! ## Strictness
//!
//! - **Type Safety**: arithmetic and comparison reject non-integers (`(+ 1 #t)` errors)
//! - **Only `#t` is true**: `not`, `and` and `or` follow the same rule as `if`
//! - **Proper lists only**: `cons` requires a list as its second argument
//! - **Overflow Detection**: arithmetic reports overflow and division by zero
//!
//! The special forms (`quote`, `define`, `lambda`, `if`) are syntax handled by the
//! evaluator and are not part of this catalog.
//!
//! ## Adding New Operations
//!
//! 1. Implement `fn(&[Value]) -> Result<Value, Error>`; the arity is already checked
//! 2. Add a [`Primitive`] entry to `PRIMITIVES`
//! 3. Add test cases to `test_primitive_implementations`

use std::fmt;
use std::rc::Rc;

use crate::Error;
use crate::ast::{Cons, IntegerType, List, Value};

/// Number of arguments a function accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    AtLeast(usize),
    Any,
}

impl Arity {
    pub fn accepts(&self, arg_count: usize) -> bool {
        match *self {
            Arity::Exact(n) => arg_count == n,
            Arity::AtLeast(n) => arg_count >= n,
            Arity::Any => true,
        }
    }

    /// Check an argument count on behalf of the named function
    pub fn validate(&self, function: &str, arg_count: usize) -> Result<(), Error> {
        if self.accepts(arg_count) {
            Ok(())
        } else {
            Err(Error::arity_mismatch(function, *self, arg_count))
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let plural = |n: usize| if n == 1 { "" } else { "s" };
        match *self {
            Arity::Exact(n) => write!(f, "exactly {n} argument{}", plural(n)),
            Arity::AtLeast(n) => write!(f, "at least {n} argument{}", plural(n)),
            Arity::Any => write!(f, "any number of arguments"),
        }
    }
}

/// Native implementation of a primitive over evaluated arguments
pub type PrimitiveFn = fn(&[Value]) -> Result<Value, Error>;

/// Definition of a built-in function
pub struct Primitive {
    /// Name the primitive is bound to in the global frame
    pub name: &'static str,
    /// Expected number of arguments
    pub arity: Arity,
    func: PrimitiveFn,
}

impl Primitive {
    /// Check the argument count, then run the native implementation
    pub fn apply(&self, args: &[Value]) -> Result<Value, Error> {
        self.arity.validate(self.name, args.len())?;
        (self.func)(args)
    }
}

impl fmt::Debug for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Primitive({}, {:?})", self.name, self.arity)
    }
}

//
// Argument helpers
//

fn integer_arg(function: &str, value: &Value) -> Result<IntegerType, Error> {
    match value {
        Value::Integer(n) => Ok(*n),
        other => Err(Error::TypeMismatch(format!(
            "{function} requires integers, got {other}"
        ))),
    }
}

fn integer_args(function: &str, args: &[Value]) -> Result<Vec<IntegerType>, Error> {
    args.iter().map(|arg| integer_arg(function, arg)).collect()
}

fn list_arg<'a>(function: &str, value: &'a Value) -> Result<&'a List, Error> {
    match value {
        Value::List(list) => Ok(list),
        other => Err(Error::TypeMismatch(format!(
            "{function} requires a list, got {other}"
        ))),
    }
}

fn non_empty_list_arg<'a>(function: &str, value: &'a Value) -> Result<&'a Rc<Cons>, Error> {
    match list_arg(function, value)? {
        List::Cons(cell) => Ok(cell),
        List::Empty => Err(Error::TypeMismatch(format!(
            "{function} requires a non-empty list, got ()"
        ))),
    }
}

fn overflow(operation: &str) -> Error {
    Error::Arithmetic(format!("integer overflow in {operation}"))
}

//
// Primitive Implementations
//

// Macro to generate chained integer comparison functions
macro_rules! integer_comparison {
    ($name:ident, $op:tt, $op_str:expr) => {
        fn $name(args: &[Value]) -> Result<Value, Error> {
            let numbers = integer_args($op_str, args)?;
            // All adjacent pairs must satisfy the comparison
            Ok(Value::Bool(numbers.windows(2).all(|pair| pair[0] $op pair[1])))
        }
    };
}

integer_comparison!(primitive_eq, ==, "=");
integer_comparison!(primitive_lt, <, "<");
integer_comparison!(primitive_gt, >, ">");
integer_comparison!(primitive_le, <=, "<=");
integer_comparison!(primitive_ge, >=, ">=");

fn primitive_ne(args: &[Value]) -> Result<Value, Error> {
    let numbers = integer_args("!=", args)?;
    Ok(Value::Bool(numbers[0] != numbers[1]))
}

fn primitive_add(args: &[Value]) -> Result<Value, Error> {
    let mut sum: IntegerType = 0;
    for n in integer_args("+", args)? {
        sum = sum.checked_add(n).ok_or_else(|| overflow("addition"))?;
    }
    Ok(Value::Integer(sum))
}

fn primitive_sub(args: &[Value]) -> Result<Value, Error> {
    let numbers = integer_args("-", args)?;
    match numbers.as_slice() {
        [only] => only
            .checked_neg()
            .map(Value::Integer)
            .ok_or_else(|| overflow("negation")),
        [first, rest @ ..] => {
            let mut result = *first;
            for n in rest {
                result = result
                    .checked_sub(*n)
                    .ok_or_else(|| overflow("subtraction"))?;
            }
            Ok(Value::Integer(result))
        }
        [] => Err(Error::arity_mismatch("-", Arity::AtLeast(1), 0)),
    }
}

fn primitive_mul(args: &[Value]) -> Result<Value, Error> {
    let mut product: IntegerType = 1;
    for n in integer_args("*", args)? {
        product = product
            .checked_mul(n)
            .ok_or_else(|| overflow("multiplication"))?;
    }
    Ok(Value::Integer(product))
}

fn checked_div(dividend: IntegerType, divisor: IntegerType) -> Result<IntegerType, Error> {
    if divisor == 0 {
        return Err(Error::Arithmetic("division by zero".to_owned()));
    }
    dividend
        .checked_div(divisor)
        .ok_or_else(|| overflow("division"))
}

// Integer division truncating toward zero; (/ x) is (/ 1 x)
fn primitive_div(args: &[Value]) -> Result<Value, Error> {
    let numbers = integer_args("/", args)?;
    match numbers.as_slice() {
        [only] => checked_div(1, *only).map(Value::Integer),
        [first, rest @ ..] => {
            let mut result = *first;
            for n in rest {
                result = checked_div(result, *n)?;
            }
            Ok(Value::Integer(result))
        }
        [] => Err(Error::arity_mismatch("/", Arity::AtLeast(1), 0)),
    }
}

fn primitive_quotient(args: &[Value]) -> Result<Value, Error> {
    let numbers = integer_args("quotient", args)?;
    checked_div(numbers[0], numbers[1]).map(Value::Integer)
}

fn primitive_remainder(args: &[Value]) -> Result<Value, Error> {
    let numbers = integer_args("remainder", args)?;
    if numbers[1] == 0 {
        return Err(Error::Arithmetic("division by zero".to_owned()));
    }
    numbers[0]
        .checked_rem(numbers[1])
        .map(Value::Integer)
        .ok_or_else(|| overflow("remainder"))
}

// Result takes the sign of the divisor
fn primitive_modulo(args: &[Value]) -> Result<Value, Error> {
    let numbers = integer_args("modulo", args)?;
    let (dividend, divisor) = (numbers[0], numbers[1]);
    if divisor == 0 {
        return Err(Error::Arithmetic("division by zero".to_owned()));
    }
    let rem = dividend
        .checked_rem(divisor)
        .ok_or_else(|| overflow("modulo"))?;
    if rem != 0 && (rem < 0) != (divisor < 0) {
        Ok(Value::Integer(rem + divisor))
    } else {
        Ok(Value::Integer(rem))
    }
}

fn primitive_abs(args: &[Value]) -> Result<Value, Error> {
    integer_arg("abs", &args[0])?
        .checked_abs()
        .map(Value::Integer)
        .ok_or_else(|| overflow("abs"))
}

fn primitive_max(args: &[Value]) -> Result<Value, Error> {
    let numbers = integer_args("max", args)?;
    numbers
        .into_iter()
        .max()
        .map(Value::Integer)
        .ok_or_else(|| Error::arity_mismatch("max", Arity::AtLeast(1), 0))
}

fn primitive_min(args: &[Value]) -> Result<Value, Error> {
    let numbers = integer_args("min", args)?;
    numbers
        .into_iter()
        .min()
        .map(Value::Integer)
        .ok_or_else(|| Error::arity_mismatch("min", Arity::AtLeast(1), 0))
}

fn primitive_not(args: &[Value]) -> Result<Value, Error> {
    Ok(Value::Bool(!args[0].is_true()))
}

fn primitive_and(args: &[Value]) -> Result<Value, Error> {
    Ok(Value::Bool(args.iter().all(Value::is_true)))
}

fn primitive_or(args: &[Value]) -> Result<Value, Error> {
    Ok(Value::Bool(args.iter().any(Value::is_true)))
}

fn primitive_cons(args: &[Value]) -> Result<Value, Error> {
    match &args[1] {
        Value::List(tail) => Ok(Value::List(List::cons(args[0].clone(), tail.clone()))),
        // Pairs must be lists: (cons 1 2) has no representation
        other => Err(Error::TypeMismatch(format!(
            "cons requires a list as second argument, got {other}"
        ))),
    }
}

fn primitive_car(args: &[Value]) -> Result<Value, Error> {
    Ok(non_empty_list_arg("car", &args[0])?.car.clone())
}

fn primitive_cdr(args: &[Value]) -> Result<Value, Error> {
    Ok(Value::List(non_empty_list_arg("cdr", &args[0])?.cdr.clone()))
}

fn primitive_list(args: &[Value]) -> Result<Value, Error> {
    Ok(Value::List(args.iter().cloned().collect()))
}

fn primitive_null(args: &[Value]) -> Result<Value, Error> {
    Ok(Value::Bool(args[0].is_nil()))
}

fn primitive_length(args: &[Value]) -> Result<Value, Error> {
    let length = list_arg("length", &args[0])?.len();
    IntegerType::try_from(length)
        .map(Value::Integer)
        .map_err(|_| overflow("length"))
}

fn primitive_append(args: &[Value]) -> Result<Value, Error> {
    let mut items = Vec::new();
    for arg in args {
        items.extend(list_arg("append", arg)?.iter().cloned());
    }
    Ok(Value::List(items.into_iter().collect()))
}

fn primitive_equal(args: &[Value]) -> Result<Value, Error> {
    Ok(Value::Bool(args[0] == args[1]))
}

macro_rules! type_predicate {
    ($name:ident, $pattern:pat) => {
        fn $name(args: &[Value]) -> Result<Value, Error> {
            Ok(Value::Bool(matches!(args[0], $pattern)))
        }
    };
}

type_predicate!(primitive_is_list, Value::List(_));
type_predicate!(primitive_is_integer, Value::Integer(_));
type_predicate!(primitive_is_boolean, Value::Bool(_));
type_predicate!(primitive_is_symbol, Value::Symbol(_));
type_predicate!(primitive_is_procedure, Value::Primitive(_) | Value::Closure(_));

macro_rules! primitive {
    ($name:expr, $arity:expr, $func:expr) => {
        Primitive {
            name: $name,
            arity: $arity,
            func: $func,
        }
    };
}

/// Catalog of all primitive functions.
static PRIMITIVES: &[Primitive] = &[
    // Arithmetic
    primitive!("+", Arity::Any, primitive_add),
    primitive!("-", Arity::AtLeast(1), primitive_sub),
    primitive!("*", Arity::Any, primitive_mul),
    primitive!("/", Arity::AtLeast(1), primitive_div),
    primitive!("quotient", Arity::Exact(2), primitive_quotient),
    primitive!("remainder", Arity::Exact(2), primitive_remainder),
    primitive!("modulo", Arity::Exact(2), primitive_modulo),
    primitive!("abs", Arity::Exact(1), primitive_abs),
    primitive!("max", Arity::AtLeast(1), primitive_max),
    primitive!("min", Arity::AtLeast(1), primitive_min),
    // Comparison
    primitive!("=", Arity::AtLeast(2), primitive_eq),
    primitive!("<", Arity::AtLeast(2), primitive_lt),
    primitive!(">", Arity::AtLeast(2), primitive_gt),
    primitive!("<=", Arity::AtLeast(2), primitive_le),
    primitive!(">=", Arity::AtLeast(2), primitive_ge),
    primitive!("!=", Arity::Exact(2), primitive_ne),
    // Logic (arguments are evaluated before the call, so no short-circuit)
    primitive!("not", Arity::Exact(1), primitive_not),
    primitive!("and", Arity::Any, primitive_and),
    primitive!("or", Arity::Any, primitive_or),
    // Lists
    primitive!("cons", Arity::Exact(2), primitive_cons),
    primitive!("car", Arity::Exact(1), primitive_car),
    primitive!("cdr", Arity::Exact(1), primitive_cdr),
    primitive!("list", Arity::Any, primitive_list),
    primitive!("null?", Arity::Exact(1), primitive_null),
    primitive!("length", Arity::Exact(1), primitive_length),
    primitive!("append", Arity::Any, primitive_append),
    // Predicates
    primitive!("equal?", Arity::Exact(2), primitive_equal),
    primitive!("list?", Arity::Exact(1), primitive_is_list),
    primitive!("integer?", Arity::Exact(1), primitive_is_integer),
    primitive!("boolean?", Arity::Exact(1), primitive_is_boolean),
    primitive!("symbol?", Arity::Exact(1), primitive_is_symbol),
    primitive!("procedure?", Arity::Exact(1), primitive_is_procedure),
];

/// Get all primitives (for seeding global frames)
pub fn all_primitives() -> &'static [Primitive] {
    PRIMITIVES
}

/// Find a primitive by name
pub fn find_primitive(name: &str) -> Option<&'static Primitive> {
    PRIMITIVES.iter().find(|primitive| primitive.name == name)
}

#[cfg(test)]
#[expect(clippy::unwrap_used)] // test code OK
mod tests {
    use super::*;
    use crate::ast::{nil, sym, val};

    /// Micro-helper for success cases
    fn success<T: Into<Value>>(value: T) -> Option<Value> {
        Some(val(value))
    }

    fn call_primitive(name: &str, args: &[Value]) -> Result<Value, Error> {
        find_primitive(name)
            .unwrap_or_else(|| panic!("primitive not found: {name}"))
            .apply(args)
    }

    /// Macro to create test cases, invoking primitives via the catalog
    macro_rules! test {
        ($name:expr, $args:expr, $expected:expr) => {
            ($name, call_primitive($name, $args), $expected)
        };
    }

    #[test]
    fn test_catalog() {
        let names: Vec<_> = all_primitives().iter().map(|p| p.name).collect();
        for required in ["+", "-", "*", "<", "=", "cons", "car", "cdr", "null?"] {
            assert!(names.contains(&required), "missing primitive {required}");
        }
        for derived in ["not", "and", "or", ">"] {
            assert!(names.contains(&derived), "missing primitive {derived}");
        }

        // Names are unique binding keys
        let mut sorted = names.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), names.len());

        assert_eq!(find_primitive("car").unwrap().arity, Arity::Exact(1));
        assert_eq!(find_primitive("+").unwrap().arity, Arity::Any);
        assert!(find_primitive("quote").is_none());
        assert!(find_primitive("unknown").is_none());
    }

    #[test]
    fn test_arity_display_and_validation() {
        assert_eq!(Arity::Exact(1).to_string(), "exactly 1 argument");
        assert_eq!(Arity::Exact(2).to_string(), "exactly 2 arguments");
        assert_eq!(Arity::AtLeast(1).to_string(), "at least 1 argument");
        assert_eq!(Arity::Any.to_string(), "any number of arguments");

        assert!(Arity::AtLeast(2).accepts(5));
        assert!(!Arity::AtLeast(2).accepts(1));
        assert_eq!(
            Arity::Exact(2).validate("cons", 3),
            Err(Error::arity_mismatch("cons", Arity::Exact(2), 3))
        );
    }

    #[test]
    #[expect(clippy::too_many_lines)] // Comprehensive test coverage is intentionally thorough
    fn test_primitive_implementations() {
        type TestCase = (&'static str, Result<Value, Error>, Option<Value>);

        let int_list = val([1, 2, 3]);
        let nested = val([val([1]), val([2, 3])]);

        let test_cases: Vec<TestCase> = vec![
            // Arithmetic
            test!("+", &[], success(0)),
            test!("+", &[val(1), val(2), val(3)], success(6)),
            test!("+", &[val(i64::MAX), val(1)], None),
            test!("+", &[val(1), val(true)], None),
            test!("-", &[val(10), val(3), val(2)], success(5)),
            test!("-", &[val(10)], success(-10)),
            test!("-", &[val(i64::MIN)], None),
            test!("-", &[], None),
            test!("*", &[], success(1)),
            test!("*", &[val(2), val(3), val(4)], success(24)),
            test!("*", &[val(i64::MAX), val(2)], None),
            test!("/", &[val(7), val(2)], success(3)),
            test!("/", &[val(-7), val(2)], success(-3)),
            test!("/", &[val(100), val(5), val(2)], success(10)),
            test!("/", &[val(1), val(0)], None),
            test!("/", &[val(i64::MIN), val(-1)], None),
            test!("quotient", &[val(17), val(5)], success(3)),
            test!("remainder", &[val(-17), val(5)], success(-2)),
            test!("modulo", &[val(-17), val(5)], success(3)),
            test!("modulo", &[val(17), val(-5)], success(-3)),
            test!("modulo", &[val(17), val(0)], None),
            test!("abs", &[val(-4)], success(4)),
            test!("max", &[val(3), val(9), val(1)], success(9)),
            test!("min", &[val(3), val(9), val(1)], success(1)),
            // Comparison
            test!("=", &[val(5), val(5)], success(true)),
            test!("=", &[val(5), val(5), val(6)], success(false)),
            test!("<", &[val(1), val(2), val(3)], success(true)),
            test!("<", &[val(1), val(3), val(2)], success(false)),
            test!(">", &[val(3), val(2)], success(true)),
            test!("<=", &[val(2), val(2)], success(true)),
            test!(">=", &[val(1), val(2)], success(false)),
            test!("!=", &[val(1), val(2)], success(true)),
            test!("<", &[val(1)], None),
            test!("=", &[val(true), val(true)], None),
            // Logic: only #t counts as true
            test!("not", &[val(true)], success(false)),
            test!("not", &[val(false)], success(true)),
            test!("not", &[val(0)], success(true)),
            test!("and", &[val(true), val(true)], success(true)),
            test!("and", &[val(true), val(1)], success(false)),
            test!("and", &[], success(true)),
            test!("or", &[val(false), val(true)], success(true)),
            test!("or", &[nil(), val(1)], success(false)),
            test!("or", &[], success(false)),
            // Lists
            test!("cons", &[val(1), val([2, 3])], success([1, 2, 3])),
            test!("cons", &[val(1), nil()], success([1])),
            test!("cons", &[val(1), val(2)], None),
            test!("car", &[int_list.clone()], success(1)),
            test!("car", &[nested.clone()], success([1])),
            test!("car", &[nil()], None),
            test!("car", &[val(5)], None),
            test!("cdr", &[int_list.clone()], success([2, 3])),
            test!("cdr", &[val([1])], Some(nil())),
            test!("cdr", &[nil()], None),
            test!("list", &[], Some(nil())),
            test!("list", &[val(1), sym("a")], Some(val(vec![val(1), sym("a")]))),
            test!("null?", &[nil()], success(true)),
            test!("null?", &[int_list.clone()], success(false)),
            test!("null?", &[val(0)], success(false)),
            test!("length", &[int_list.clone()], success(3)),
            test!("length", &[nil()], success(0)),
            test!("length", &[val(3)], None),
            test!("append", &[val([1]), nil(), val([2, 3])], success([1, 2, 3])),
            test!("append", &[], Some(nil())),
            test!("append", &[val([1]), val(2)], None),
            // Predicates
            test!("equal?", &[nested.clone(), val([val([1]), val([2, 3])])], success(true)),
            test!("equal?", &[sym("a"), sym("a")], success(true)),
            test!("equal?", &[val(1), val(true)], success(false)),
            test!("list?", &[nil()], success(true)),
            test!("list?", &[val(1)], success(false)),
            test!("integer?", &[val(1)], success(true)),
            test!("boolean?", &[val(false)], success(true)),
            test!("symbol?", &[sym("x")], success(true)),
            test!("symbol?", &[val([1])], success(false)),
            test!(
                "procedure?",
                &[Value::Primitive(find_primitive("car").unwrap())],
                success(true)
            ),
            test!("procedure?", &[sym("car")], success(false)),
            // Arity is checked before the native function runs
            test!("car", &[int_list.clone(), int_list.clone()], None),
            test!("cons", &[val(1)], None),
            test!("not", &[], None),
        ];

        for (i, (name, result, expected)) in test_cases.into_iter().enumerate() {
            match (result, expected) {
                (Ok(actual), Some(expected)) => assert_eq!(
                    actual,
                    expected,
                    "Test #{} ({name}) returned the wrong value",
                    i + 1
                ),
                (Err(_), None) => {}
                (Ok(actual), None) => {
                    panic!("Test #{} ({name}): expected error, got {actual}", i + 1)
                }
                (Err(err), Some(expected)) => {
                    panic!("Test #{} ({name}): expected {expected}, got error {err}", i + 1)
                }
            }
        }
    }

    #[test]
    fn test_error_kinds() {
        assert!(matches!(
            call_primitive("+", &[val(1), sym("x")]),
            Err(Error::TypeMismatch(_))
        ));
        assert!(matches!(
            call_primitive("/", &[val(1), val(0)]),
            Err(Error::Arithmetic(_))
        ));
        assert_eq!(
            call_primitive("car", &[]),
            Err(Error::arity_mismatch("car", Arity::Exact(1), 0))
        );
        assert_eq!(
            call_primitive("cons", &[val(1), val(2)]).unwrap_err().to_string(),
            "Type mismatch: cons requires a list as second argument, got 2"
        );
    }
}
