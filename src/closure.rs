use std::fmt;
use std::rc::Rc;

use crate::Error;
use crate::ast::{Symbol, Value};
use crate::evaluator;
use crate::frame::Frame;

/// Display name of a closure that is not bound anywhere in its defining frame chain
pub const ANONYMOUS: &str = "anonymous";

/// A user-defined function: parameter names, a body and the frame the `lambda`
/// was evaluated in.
///
/// The captured frame is held strongly so closures can outlive the call that
/// made them. A closure bound into the frame it captures forms an `Rc` cycle;
/// at top level that frame is the session's global frame, while a `define`
/// inside a closure body leaves each such call frame alive after it returns.
pub struct Closure {
    params: Vec<Symbol>,
    body: Value,
    env: Frame,
}

impl Closure {
    pub fn new(params: Vec<Symbol>, body: Value, env: Frame) -> Self {
        Closure { params, body, env }
    }

    pub fn params(&self) -> &[Symbol] {
        &self.params
    }

    pub fn body(&self) -> &Value {
        &self.body
    }

    /// The frame captured when the closure was created
    pub fn env(&self) -> &Frame {
        &self.env
    }

    /// Name under which this closure is bound in its defining frame chain,
    /// or [`ANONYMOUS`].
    pub fn name(&self) -> String {
        self.env
            .reverse_lookup_by(
                |value| matches!(value, Value::Closure(c) if std::ptr::eq(&**c, self)),
            )
            .map_or_else(|| ANONYMOUS.to_owned(), |name| name.to_string())
    }

    /// Apply the closure to already-evaluated arguments.
    pub fn apply(self: &Rc<Self>, args: Vec<Value>) -> Result<Value, Error> {
        evaluator::apply(&Value::Closure(Rc::clone(self)), args)
    }
}

impl fmt::Debug for Closure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[Func:{} (", self.name())?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{param}")?;
        }
        write!(f, ") {} {:?}]", self.body, self.env)
    }
}
