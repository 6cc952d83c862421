//! This module defines the expression model shared by code and data. The main enum,
//! [`Value`], covers every Racket value the interpreter knows about: symbols, proper
//! lists, booleans, integers, primitive functions and closures. Lists are built from
//! cons cells ending in the canonical [`List::Empty`], and a cell's tail is always
//! another [`List`], so improper pairs cannot be represented. Ergonomic helpers such
//! as [`val`], [`sym`] and [`nil`] build ASTs in code and tests. `Display` renders the
//! user-facing form; `Debug` renders the verbose diagnostic form used when debugging.

use std::fmt;
use std::rc::Rc;

use crate::Error;
use crate::closure::Closure;
use crate::primitives::Primitive;

/// Type alias for integer values in the interpreter
pub(crate) type IntegerType = i64;

/// Allowed non-alphanumeric characters in symbol names
pub(crate) const SYMBOL_SPECIAL_CHARS: &str = "+-*/<>=!?_$%&:^~";

/// Check if a string is a valid symbol name
/// Valid: non-empty, no leading digit, no "-digit" prefix, alphanumeric + SYMBOL_SPECIAL_CHARS
pub(crate) fn is_valid_symbol(name: &str) -> bool {
    let mut chars = name.chars();

    match chars.next() {
        None => false,
        Some(first_char) => {
            if first_char.is_ascii_digit() {
                return false;
            }

            if first_char == '-'
                && let Some(second_char) = chars.next()
                && second_char.is_ascii_digit()
            {
                return false;
            }

            name.chars().all(is_symbol_char)
        }
    }
}

/// Check if a character may appear inside a symbol
pub(crate) fn is_symbol_char(c: char) -> bool {
    c.is_alphanumeric() || SYMBOL_SPECIAL_CHARS.contains(c)
}

/// A symbol, compared and hashed by name.
///
/// Cloning shares the name, so symbols are cheap to use as frame keys.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(Rc<str>);

impl Symbol {
    pub fn new(name: &str) -> Self {
        Symbol(Rc::from(name))
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Symbol {
    fn from(name: &str) -> Self {
        Symbol::new(name)
    }
}

impl PartialEq<str> for Symbol {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

impl PartialEq<&str> for Symbol {
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[SYM {}]", self.0)
    }
}

/// A cons cell: the head of a list and the rest of it.
#[derive(Clone, PartialEq)]
pub struct Cons {
    pub car: Value,
    pub cdr: List,
}

/// A proper list: either the canonical empty list or a shared cons cell.
///
/// Dropping and comparing walk the spine in a loop, so list length is not
/// bounded by the host stack.
#[derive(Clone, Default)]
pub enum List {
    #[default]
    Empty,
    Cons(Rc<Cons>),
}

impl Drop for List {
    fn drop(&mut self) {
        let mut current = std::mem::take(self);
        // Unlink cells while we hold the only reference; a shared tail is left alone
        loop {
            let List::Cons(cell) = &mut current else {
                break;
            };
            let Some(cons) = Rc::get_mut(cell) else {
                break;
            };
            let rest = std::mem::take(&mut cons.cdr);
            current = rest;
        }
    }
}

impl PartialEq for List {
    fn eq(&self, other: &Self) -> bool {
        self.iter().eq(other.iter())
    }
}

impl List {
    /// Build a new list with `car` in front of `cdr`
    pub fn cons(car: Value, cdr: List) -> List {
        List::Cons(Rc::new(Cons { car, cdr }))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, List::Empty)
    }

    pub fn car(&self) -> Option<&Value> {
        match self {
            List::Empty => None,
            List::Cons(cell) => Some(&cell.car),
        }
    }

    pub fn cdr(&self) -> Option<&List> {
        match self {
            List::Empty => None,
            List::Cons(cell) => Some(&cell.cdr),
        }
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn iter(&self) -> ListIter<'_> {
        ListIter { current: self }
    }

    /// Copy the elements into a vector, left to right
    pub fn to_vec(&self) -> Vec<Value> {
        self.iter().cloned().collect()
    }
}

/// Borrowing iterator over the elements of a [`List`]
pub struct ListIter<'a> {
    current: &'a List,
}

impl<'a> Iterator for ListIter<'a> {
    type Item = &'a Value;

    fn next(&mut self) -> Option<Self::Item> {
        match self.current {
            List::Empty => None,
            List::Cons(cell) => {
                self.current = &cell.cdr;
                Some(&cell.car)
            }
        }
    }
}

impl<'a> IntoIterator for &'a List {
    type Item = &'a Value;
    type IntoIter = ListIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl FromIterator<Value> for List {
    /// Lists are built bottom-up from the empty list, so the items are
    /// buffered and consed on in reverse.
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        let items: Vec<Value> = iter.into_iter().collect();
        items
            .into_iter()
            .rev()
            .fold(List::Empty, |tail, item| List::cons(item, tail))
    }
}

/// Core expression type in the interpreter
///
/// Racket is homoiconic: the reader produces `Value`s and evaluation returns them.
///
/// To build an AST, use the ergonomic helper functions:
/// - `val(42)` for values, `sym("name")` for symbols, `nil()` for the empty list
/// - `val([1, 2, 3])` for homogeneous lists
/// - `val(vec![sym("op"), val(42)])` for mixed lists
#[derive(Clone)]
pub enum Value {
    /// Symbols (identifiers)
    Symbol(Symbol),
    /// Proper lists, including the empty list
    List(List),
    /// Boolean values
    Bool(bool),
    /// Integers
    Integer(IntegerType),
    /// Built-in functions from the static catalog
    Primitive(&'static Primitive),
    /// User-defined functions created by `lambda`
    Closure(Rc<Closure>),
}

impl Value {
    /// Check if a value represents the empty list
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::List(List::Empty))
    }

    /// Check if a value is the literal `#t`, the only value `if` treats as true
    pub fn is_true(&self) -> bool {
        matches!(self, Value::Bool(true))
    }

    /// Check if a value can be applied
    pub fn is_function(&self) -> bool {
        matches!(self, Value::Primitive(_) | Value::Closure(_))
    }

    /// Short kind name used in type errors
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Symbol(_) => "symbol",
            Value::List(List::Empty) => "empty list",
            Value::List(_) => "list",
            Value::Bool(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Primitive(_) | Value::Closure(_) => "function",
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

macro_rules! impl_from_integer {
    ($int_type:ty) => {
        impl From<$int_type> for Value {
            fn from(n: $int_type) -> Self {
                Value::Integer(n as IntegerType)
            }
        }
    };
}

impl_from_integer!(i8);
impl_from_integer!(i16);
impl_from_integer!(i32);
impl_from_integer!(IntegerType); // Special case - no casting
impl_from_integer!(u8);
impl_from_integer!(u16);
impl_from_integer!(u32);

impl From<Symbol> for Value {
    fn from(s: Symbol) -> Self {
        Value::Symbol(s)
    }
}

impl From<List> for Value {
    fn from(list: List) -> Self {
        Value::List(list)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for Value {
    fn from(arr: [T; N]) -> Self {
        Value::List(arr.into_iter().map(Into::into).collect())
    }
}

// Fallible conversions from `Value` back into primitive Rust types.

impl TryFrom<Value> for IntegerType {
    type Error = Error;

    fn try_from(value: Value) -> Result<IntegerType, Error> {
        match value {
            Value::Integer(n) => Ok(n),
            other => Err(Error::TypeMismatch(format!(
                "expected integer, got {}",
                other.type_name()
            ))),
        }
    }
}

impl TryFrom<Value> for bool {
    type Error = Error;

    fn try_from(value: Value) -> Result<bool, Error> {
        match value {
            Value::Bool(b) => Ok(b),
            other => Err(Error::TypeMismatch(format!(
                "expected boolean, got {}",
                other.type_name()
            ))),
        }
    }
}

/// Helper function for creating symbols - works great in mixed lists!
pub fn sym<S: AsRef<str>>(name: S) -> Value {
    Value::Symbol(Symbol::new(name.as_ref()))
}

/// Helper function for creating Values - works great in mixed lists!
pub fn val<T: Into<Value>>(value: T) -> Value {
    value.into()
}

/// Helper function for creating the empty list
pub fn nil() -> Value {
    Value::List(List::Empty)
}

impl fmt::Display for List {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, elem) in self.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{elem}")?;
        }
        write!(f, ")")
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Symbol(s) => write!(f, "{s}"),
            Value::List(list) => write!(f, "{list}"),
            Value::Bool(b) => write!(f, "{}", if *b { "#t" } else { "#f" }),
            Value::Integer(n) => write!(f, "{n}"),
            Value::Primitive(p) => write!(f, "#<function:{}>", p.name),
            Value::Closure(c) => write!(f, "#<function:{}>", c.name()),
        }
    }
}

impl fmt::Debug for List {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[List")?;
        for elem in self {
            write!(f, " {elem:?}")?;
        }
        write!(f, "]")
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Symbol(s) => write!(f, "{s:?}"),
            Value::List(list) => write!(f, "{list:?}"),
            Value::Bool(b) => write!(f, "[BOOL {}]", if *b { "#t" } else { "#f" }),
            Value::Integer(n) => write!(f, "[INT {n}]"),
            Value::Primitive(p) => write!(f, "[Prim:{}]", p.name),
            Value::Closure(c) => write!(f, "{c:?}"),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            // Compare primitives by name, not function pointer
            (Value::Primitive(a), Value::Primitive(b)) => a.name == b.name,
            // Closures are equal only to themselves; comparing captured frames
            // structurally could recurse through the closure stored in them
            (Value::Closure(a), Value::Closure(b)) => Rc::ptr_eq(a, b),
            _ => false, // Different variants are never equal
        }
    }
}
