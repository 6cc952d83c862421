use std::rc::Rc;

use crate::Error;
use crate::MAX_EVAL_DEPTH;
use crate::ast::{Cons, List, Symbol, Value};
use crate::closure::Closure;
use crate::frame::Frame;
use crate::primitives::{Arity, all_primitives};

/// Stack growth parameters for deep recursion
const STACK_RED_ZONE: usize = 128 * 1024; // 128KB remaining triggers growth
const STACK_GROW_SIZE: usize = 4 * 1024 * 1024; // Grow by 4MB each time

/// Signature shared by all special forms: unevaluated operands, current frame, depth
type SpecialFormFn = fn(&[Value], &Frame, usize) -> Result<Value, Error>;

/// Syntax recognised in head position before any function call is attempted
struct SpecialForm {
    keyword: &'static str,
    /// Number of operands after the keyword
    arity: Arity,
    eval: SpecialFormFn,
}

static SPECIAL_FORMS: &[SpecialForm] = &[
    SpecialForm {
        keyword: "quote",
        arity: Arity::Exact(1),
        eval: eval_quote,
    },
    SpecialForm {
        keyword: "define",
        arity: Arity::AtLeast(2),
        eval: eval_define,
    },
    SpecialForm {
        keyword: "lambda",
        arity: Arity::Exact(2),
        eval: eval_lambda,
    },
    SpecialForm {
        keyword: "if",
        arity: Arity::Exact(3),
        eval: eval_if,
    },
];

fn find_special_form(keyword: &Symbol) -> Option<&'static SpecialForm> {
    SPECIAL_FORMS.iter().find(|form| *keyword == form.keyword)
}

/// Check whether a symbol names a special form
pub fn is_special_form(name: &str) -> bool {
    SPECIAL_FORMS.iter().any(|form| form.keyword == name)
}

/// Evaluate an expression in the given frame.
///
/// Errors abort this evaluation only; bindings made by `define` before the
/// failure remain in their frames.
pub fn eval(expr: &Value, frame: &Frame) -> Result<Value, Error> {
    eval_with_depth_tracking(expr, frame, 0)
}

/// Evaluate an expression with automatic stack growth.
///
/// `depth` counts the closure applications in progress; sub-expressions of one
/// body share their caller's depth.
fn eval_with_depth_tracking(expr: &Value, frame: &Frame, depth: usize) -> Result<Value, Error> {
    if depth >= MAX_EVAL_DEPTH {
        return Err(Error::DepthLimitExceeded);
    }
    stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || {
        eval_inner(expr, frame, depth)
    })
}

fn eval_inner(expr: &Value, frame: &Frame, depth: usize) -> Result<Value, Error> {
    match expr {
        // Self-evaluating forms (the empty list is NOT self-evaluating)
        Value::Integer(_) | Value::Bool(_) | Value::Primitive(_) | Value::Closure(_) => {
            Ok(expr.clone())
        }

        // Variable lookup
        Value::Symbol(name) => frame.lookup(name),

        Value::List(List::Empty) => Err(Error::EmptyListEvaluation),

        // Special form or function application
        Value::List(List::Cons(cell)) => {
            log::trace!("Evaluating: {expr:?}");
            eval_list(cell, frame, depth)
        }
    }
}

fn eval_list(cell: &Cons, frame: &Frame, depth: usize) -> Result<Value, Error> {
    let operands = cell.cdr.to_vec();

    // Keywords are recognised by name only, so rebinding `if` does not change the form
    if let Value::Symbol(keyword) = &cell.car
        && let Some(form) = find_special_form(keyword)
    {
        if !form.arity.accepts(operands.len()) {
            return Err(Error::malformed(
                form.keyword,
                format!(
                    "expects {} after the keyword, got {}",
                    form.arity,
                    operands.len()
                ),
            ));
        }
        return (form.eval)(&operands, frame, depth);
    }

    let func = eval_with_depth_tracking(&cell.car, frame, depth)?;
    if !func.is_function() {
        return Err(Error::NotAFunction(func.to_string()));
    }

    // Arguments are evaluated left to right in the caller's frame
    let args = operands
        .iter()
        .map(|operand| eval_with_depth_tracking(operand, frame, depth))
        .collect::<Result<Vec<_>, _>>()?;

    apply_with_depth(&func, args, depth)
}

/// Apply a function value to already-evaluated arguments.
pub fn apply(func: &Value, args: Vec<Value>) -> Result<Value, Error> {
    apply_with_depth(func, args, 0)
}

fn apply_with_depth(func: &Value, args: Vec<Value>, depth: usize) -> Result<Value, Error> {
    match func {
        Value::Primitive(primitive) => primitive.apply(&args),
        Value::Closure(closure) => {
            let params = closure.params();
            if args.len() != params.len() {
                return Err(Error::arity_mismatch(
                    closure.name(),
                    Arity::Exact(params.len()),
                    args.len(),
                ));
            }
            log::debug!("Applying: {closure:?}");

            // One fresh frame per application, chained to the captured frame
            let call_frame = Frame::with_parent(closure.env());
            for (param, arg) in params.iter().zip(args) {
                call_frame.define(param.clone(), arg);
            }
            eval_with_depth_tracking(closure.body(), &call_frame, depth + 1)
        }
        other => Err(Error::NotAFunction(other.to_string())),
    }
}

/// Special form: (quote expr)
fn eval_quote(operands: &[Value], _frame: &Frame, _depth: usize) -> Result<Value, Error> {
    Ok(operands[0].clone())
}

/// Special form: (define name expr)
///
/// The value is bound in the current frame and also returned. Operands after
/// `expr` are ignored.
fn eval_define(operands: &[Value], frame: &Frame, depth: usize) -> Result<Value, Error> {
    let Value::Symbol(name) = &operands[0] else {
        return Err(Error::malformed(
            "define",
            format!("expected a symbol to define, got {}", operands[0]),
        ));
    };
    let value = eval_with_depth_tracking(&operands[1], frame, depth)?;
    frame.define(name.clone(), value.clone());
    Ok(value)
}

/// Special form: (lambda (params...) body)
fn eval_lambda(operands: &[Value], frame: &Frame, _depth: usize) -> Result<Value, Error> {
    let Value::List(param_list) = &operands[0] else {
        return Err(Error::malformed(
            "lambda",
            format!("expected a parameter list, got {}", operands[0]),
        ));
    };

    let params = param_list
        .iter()
        .map(|param| match param {
            Value::Symbol(name) => Ok(name.clone()),
            other => Err(Error::malformed(
                "lambda",
                format!("parameters must be symbols, got {other}"),
            )),
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Value::Closure(Rc::new(Closure::new(
        params,
        operands[1].clone(),
        frame.clone(),
    ))))
}

/// Special form: (if test then else)
fn eval_if(operands: &[Value], frame: &Frame, depth: usize) -> Result<Value, Error> {
    let test = eval_with_depth_tracking(&operands[0], frame, depth)?;
    // Only the literal #t selects the consequent
    let branch = if test.is_true() {
        &operands[1]
    } else {
        &operands[2]
    };
    eval_with_depth_tracking(branch, frame, depth)
}

/// Create a global frame with all primitives bound by name
pub fn new_global_frame() -> Frame {
    let frame = Frame::new();
    for primitive in all_primitives() {
        frame.define(Symbol::new(primitive.name), Value::Primitive(primitive));
    }
    frame
}
