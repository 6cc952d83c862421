//! Lexical environments.
//!
//! A [`Frame`] is a shared handle to a mutable table of bindings plus an optional
//! parent frame. Closures and in-flight calls hold clones of the handle, so one frame
//! can be reachable from many closures and lives as long as its longest holder.
//! The parent is fixed when the frame is created and always refers to a frame that
//! already existed, which keeps every chain acyclic.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::Error;
use crate::ast::{Symbol, Value};

struct FrameData {
    bindings: RefCell<HashMap<Symbol, Value>>,
    parent: Option<Frame>,
}

/// Environment for variable bindings
#[derive(Clone)]
pub struct Frame(Rc<FrameData>);

impl Default for Frame {
    fn default() -> Self {
        Self::new()
    }
}

impl Frame {
    /// Create a frame without a parent (a global frame)
    pub fn new() -> Self {
        Frame(Rc::new(FrameData {
            bindings: RefCell::new(HashMap::new()),
            parent: None,
        }))
    }

    /// Create an empty frame whose lookups fall back to `parent`
    pub fn with_parent(parent: &Frame) -> Self {
        Frame(Rc::new(FrameData {
            bindings: RefCell::new(HashMap::new()),
            parent: Some(parent.clone()),
        }))
    }

    pub fn parent(&self) -> Option<&Frame> {
        self.0.parent.as_ref()
    }

    /// Check if two handles refer to the same frame
    pub fn ptr_eq(&self, other: &Frame) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Iterate over this frame and its ancestors, innermost first
    fn chain(&self) -> impl Iterator<Item = &Frame> {
        std::iter::successors(Some(self), |frame| frame.parent())
    }

    /// Look up the value of a variable, searching parent frames on a miss.
    pub fn lookup(&self, name: &Symbol) -> Result<Value, Error> {
        self.chain()
            .find_map(|frame| frame.0.bindings.borrow().get(name).cloned())
            .ok_or_else(|| Error::UnboundVariable(name.to_string()))
    }

    /// Bind a variable in this frame only, replacing any previous binding here.
    pub fn define(&self, name: Symbol, value: Value) {
        self.0.bindings.borrow_mut().insert(name, value);
    }

    /// Mutate the nearest existing binding of `name` in the chain.
    pub fn set(&self, name: &Symbol, value: Value) -> Result<(), Error> {
        for frame in self.chain() {
            let mut bindings = frame.0.bindings.borrow_mut();
            if let Some(slot) = bindings.get_mut(name) {
                *slot = value;
                return Ok(());
            }
        }
        Err(Error::UnboundVariable(name.to_string()))
    }

    /// Find a variable bound to `value`, searching parent frames on a miss.
    ///
    /// Only used to name closures for display. When several names are bound
    /// to the same value in one frame, which one is returned is unspecified.
    pub fn reverse_lookup(&self, value: &Value) -> Option<Symbol> {
        self.reverse_lookup_by(|bound| bound == value)
    }

    /// Find a variable whose value satisfies `matches`, searching parent frames on a miss.
    pub fn reverse_lookup_by(&self, mut matches: impl FnMut(&Value) -> bool) -> Option<Symbol> {
        self.chain().find_map(|frame| {
            frame
                .0
                .bindings
                .borrow()
                .iter()
                .find(|(_, bound)| matches(bound))
                .map(|(name, _)| name.clone())
        })
    }

    /// Get all bindings visible from this frame
    /// Returns a Vec of (name, value) pairs sorted by name; inner bindings shadow outer ones
    pub fn bindings(&self) -> Vec<(Symbol, Value)> {
        let mut visible = HashMap::new();

        for frame in self.chain() {
            for (name, value) in frame.0.bindings.borrow().iter() {
                visible
                    .entry(name.clone())
                    .or_insert_with(|| value.clone());
            }
        }

        let mut result: Vec<_> = visible.into_iter().collect();
        result.sort_by(|a, b| a.0.cmp(&b.0));
        result
    }
}

impl fmt::Debug for Frame {
    /// Lists this frame's own bindings, leaving out primitives
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bindings = self.0.bindings.borrow();
        let mut entries: Vec<_> = bindings
            .iter()
            .filter(|(_, value)| !matches!(value, Value::Primitive(_)))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));

        write!(f, "Frame:{{")?;
        for (i, (name, value)) in entries.into_iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{name}={value}")?;
        }
        write!(f, "}}")
    }
}
