//! Expression evaluator

use super::access;
use super::error::{InterpResult, RuntimeError};
use super::scope::Environment;
use super::value::{Number, Object, Primitive, Value};
use crate::ast::{BinOp, Expr, Identifier, Program, Span, Spanned};
use crate::builtins;

/// Default bound on nested evaluation
pub const MAX_RECURSION_DEPTH: usize = 10_000;

/// Stack growth parameters for deep nesting
const STACK_RED_ZONE: usize = 128 * 1024; // 128KB remaining triggers growth
const STACK_GROW_SIZE: usize = 4 * 1024 * 1024; // Grow by 4MB each time

/// An evaluated address segment and where it came from
type Key = (Value, Span);

/// A storage location: the frame owning the first key, then the keys walked
/// from it
#[derive(Debug, Clone, PartialEq)]
struct Location {
    frame: usize,
    keys: Vec<Value>,
}

impl Location {
    /// Writing `self` replaces the value at `other` or one of its containers
    fn covers(&self, other: &Location) -> bool {
        self.frame == other.frame && other.keys.starts_with(&self.keys)
    }
}

/// The runtime: owns the variable store for one session
pub struct Runtime {
    env: Environment,
    /// Current nesting of `evaluate` calls
    depth: usize,
    max_depth: usize,
    /// Locations written during the current top-level statement
    writes: Vec<Location>,
}

impl Runtime {
    pub fn new() -> Self {
        Self::with_max_depth(MAX_RECURSION_DEPTH)
    }

    /// Create a runtime that fails with StackOverflow past `max_depth` nested nodes
    pub fn with_max_depth(max_depth: usize) -> Self {
        let mut runtime = Runtime {
            env: Environment::new(),
            depth: 0,
            max_depth,
            writes: Vec::new(),
        };
        runtime.register_builtins();
        runtime
    }

    /// Bind the built-in namespace in the global scope
    fn register_builtins(&mut self) {
        let namespace: Object = builtins::REGISTERED
            .iter()
            .map(|name| (Primitive::from(*name), Value::string(*name)))
            .collect();
        self.env
            .global_scope_mut()
            .insert(Primitive::from(builtins::ROOT), Value::Object(namespace));
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    pub fn env_mut(&mut self) -> &mut Environment {
        &mut self.env
    }

    /// Forget every user binding. Host bindings and built-ins survive.
    pub fn reset(&mut self) {
        self.env.reset();
        self.depth = 0;
        self.writes.clear();
        self.register_builtins();
    }

    /// Evaluate each statement in order, stopping at the first error
    pub fn run(&mut self, program: &Program) -> InterpResult<Vec<Value>> {
        program
            .statements
            .iter()
            .map(|stmt| self.evaluate(stmt))
            .collect()
    }

    /// Evaluate one node. Errors carry the span of the innermost failing node.
    pub fn evaluate(&mut self, expr: &Spanned<Expr>) -> InterpResult<Value> {
        if self.depth >= self.max_depth {
            return Err(RuntimeError::stack_overflow(self.max_depth).at(expr.span));
        }
        if self.depth == 0 {
            self.writes.clear();
        }
        self.depth += 1;
        let result = stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || self.eval_inner(expr));
        self.depth -= 1;
        result.map_err(|e| e.at(expr.span))
    }

    fn eval_inner(&mut self, expr: &Spanned<Expr>) -> InterpResult<Value> {
        tracing::trace!(kind = expr.node.kind_name(), span = %expr.span, "evaluate");
        match &expr.node {
            Expr::IntLit(n) => Ok(Value::int(*n)),
            Expr::DoubleLit(d) => Ok(Value::double(*d)),
            Expr::StringLit(s) => Ok(Value::string(s.as_str())),

            Expr::Ident(ident) => self.resolve(ident),

            Expr::Assign {
                target,
                value,
                return_before_assignment,
            } => self.assign(target, value, *return_before_assignment),

            Expr::Binary { op, left, right } => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;
                binary(*op, left, right)
            }

            Expr::List(elements) => elements
                .iter()
                .map(|e| self.evaluate(e))
                .collect::<InterpResult<Vec<_>>>()
                .map(Value::List),

            Expr::Object(properties) => {
                let mut object = Object::new();
                for (key, value) in properties {
                    let k = self.evaluate(key)?.into_key().map_err(|e| e.at(key.span))?;
                    let v = self.evaluate(value)?;
                    object.insert(k, v);
                }
                Ok(Value::Object(object))
            }

            Expr::Call { .. } => Err(RuntimeError::unsupported_node_kind(expr.node.kind_name())),
        }
    }

    /// Read the value an address names. The empty address is the current scope.
    fn resolve(&mut self, ident: &Identifier) -> InterpResult<Value> {
        if ident.is_empty() {
            return Ok(Value::Object(self.env.current_scope().clone()));
        }
        let keys = self.eval_keys(&ident.address)?;
        let Some((head, rest)) = keys.split_first() else {
            return Err(RuntimeError::invalid_state("empty address"));
        };
        let root = head
            .0
            .as_primitive()
            .and_then(|k| self.env.lookup(k))
            .ok_or_else(|| unknown_identifier(head))?;
        walk(root, rest).cloned()
    }

    /// Write through an address.
    ///
    /// The container and key are resolved and checked before the right-hand
    /// side runs, so a bad target leaves the store untouched. The write goes
    /// to that same container; if the right-hand side replaced it, the write
    /// is dropped.
    fn assign(
        &mut self,
        target: &Identifier,
        value: &Spanned<Expr>,
        return_before_assignment: bool,
    ) -> InterpResult<Value> {
        let Some((last, prefix)) = target.split_last() else {
            return Err(RuntimeError::invalid_state("assignment to an empty address"));
        };
        let path = self.eval_keys(prefix)?;
        let key = self.evaluate(last)?;
        match path.split_first() {
            None => self.assign_name(key, last.span, value, return_before_assignment),
            Some((head, rest)) => {
                self.assign_member(head, rest, key, last.span, value, return_before_assignment)
            }
        }
    }

    /// `name = value`: binds in the current frame
    fn assign_name(
        &mut self,
        key: Value,
        key_span: Span,
        value: &Spanned<Expr>,
        return_before_assignment: bool,
    ) -> InterpResult<Value> {
        let previous = if return_before_assignment {
            let old = access::read_object(self.env.current_scope(), &key).map_err(|e| e.at(key_span))?;
            Some(old.clone())
        } else {
            None
        };
        let name = key.into_key().map_err(|e| e.at(key_span))?;

        let new_value = self.evaluate(value)?;
        tracing::debug!(key = %name, value = %new_value, depth = self.env.depth(), "assign");

        self.writes.push(Location {
            frame: self.env.depth() - 1,
            keys: vec![Value::Primitive(name.clone())],
        });
        self.env.define(name, new_value.clone());
        Ok(previous.unwrap_or(new_value))
    }

    /// `head.rest[key] = value`: writes into an existing container
    fn assign_member(
        &mut self,
        head: &Key,
        rest: &[Key],
        key: Value,
        key_span: Span,
        value: &Spanned<Expr>,
        return_before_assignment: bool,
    ) -> InterpResult<Value> {
        let root_key = head.0.as_primitive().ok_or_else(|| unknown_identifier(head))?;
        let frame = self.env.find(root_key).ok_or_else(|| unknown_identifier(head))?;
        let root = self
            .env
            .binding(frame, root_key)
            .ok_or_else(|| unknown_identifier(head))?;
        let container = walk(root, rest)?;

        let previous = if return_before_assignment {
            let old = access::read_member(container, &key).map_err(|e| e.at(key_span))?;
            Some(old.clone())
        } else {
            None
        };
        access::check_write(container, &key).map_err(|e| e.at(key_span))?;

        let home = Location {
            frame,
            keys: std::iter::once(head).chain(rest).map(|(k, _)| k.clone()).collect(),
        };
        let mark = self.writes.len();
        let new_value = self.evaluate(value)?;

        if self.writes[mark..].iter().any(|w| w.covers(&home)) {
            tracing::debug!(key = %key, "assignment target replaced by its right-hand side");
            return Ok(previous.unwrap_or(new_value));
        }
        tracing::debug!(key = %key, value = %new_value, depth = self.env.depth(), "assign");

        let root = self
            .env
            .binding_mut(frame, root_key)
            .ok_or_else(|| unknown_identifier(head))?;
        let container = walk_mut(root, rest)?;
        let mut written = home;
        written.keys.push(key.clone());
        access::write_member(container, key, new_value.clone()).map_err(|e| e.at(key_span))?;
        self.writes.push(written);

        Ok(previous.unwrap_or(new_value))
    }

    fn eval_keys(&mut self, segments: &[Spanned<Expr>]) -> InterpResult<Vec<Key>> {
        segments
            .iter()
            .map(|segment| -> InterpResult<Key> { Ok((self.evaluate(segment)?, segment.span)) })
            .collect()
    }
}

fn unknown_identifier((head, span): &Key) -> RuntimeError {
    RuntimeError::unknown_identifier(&head.to_string()).at(*span)
}

/// Member reads along `keys`, starting from `current`
fn walk<'a>(mut current: &'a Value, keys: &[Key]) -> InterpResult<&'a Value> {
    for (key, span) in keys {
        current = access::read_member(current, key).map_err(|e| e.at(*span))?;
    }
    Ok(current)
}

fn walk_mut<'a>(mut current: &'a mut Value, keys: &[Key]) -> InterpResult<&'a mut Value> {
    for (key, span) in keys {
        current = access::read_member_mut(current, key).map_err(|e| e.at(*span))?;
    }
    Ok(current)
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

/// Apply an arithmetic operator with numeric promotion
fn binary(op: BinOp, left: Value, right: Value) -> InterpResult<Value> {
    let apply: fn(Number, Number) -> InterpResult<Number> = match op {
        BinOp::Add => |a, b| Ok(a + b),
        BinOp::Sub => |a, b| Ok(a - b),
        BinOp::Mul => |a, b| Ok(a * b),
        BinOp::Div => Number::checked_div,
        BinOp::Mod => Number::checked_rem,
        BinOp::Pow => |a, b| Ok(a.pow(b)),
        BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Gt | BinOp::Le | BinOp::Ge => {
            return Err(RuntimeError::unsupported_operator(&op.to_string()));
        }
    };
    match (left.as_number(), right.as_number()) {
        (Some(a), Some(b)) => apply(a, b).map(Value::from),
        _ => Err(RuntimeError::type_mismatch(
            "number",
            &format!("{} {op} {}", left.type_name(), right.type_name()),
        )),
    }
}
