//! Scope environment
//!
//! A stack of object-shaped frames. Frame 0 holds host bindings and is never
//! searched by name lookup, frame 1 is the global scope, and every frame
//! above it is a nested scope. Dropping a frame on `ascend` frees its
//! bindings immediately.

use super::error::{InterpResult, RuntimeError};
use super::value::{Object, Primitive, Value};

/// Index of the reserved host frame
const ENV_FRAME: usize = 0;
/// Index of the global frame
const GLOBAL_FRAME: usize = 1;

#[derive(Debug)]
pub struct Environment {
    /// Frames, oldest first. Always at least env + global.
    frames: Vec<Object>,
}

impl Environment {
    /// Create an environment holding only the env and global frames
    pub fn new() -> Self {
        Environment {
            frames: vec![Object::new(), Object::new()],
        }
    }

    /// Newest frame
    pub fn current_scope(&self) -> &Object {
        &self.frames[self.frames.len() - 1]
    }

    pub fn current_scope_mut(&mut self) -> &mut Object {
        let top = self.frames.len() - 1;
        &mut self.frames[top]
    }

    /// Push an empty frame and return the new depth
    pub fn descend(&mut self) -> usize {
        self.frames.push(Object::new());
        tracing::debug!(depth = self.frames.len(), "descend");
        self.frames.len()
    }

    /// Pop the newest frame. The env and global frames cannot be popped.
    pub fn ascend(&mut self) -> InterpResult<()> {
        if self.frames.len() <= GLOBAL_FRAME + 1 {
            return Err(RuntimeError::invalid_state(
                "cannot ascend past the global scope",
            ));
        }
        self.frames.pop();
        tracing::debug!(depth = self.frames.len(), "ascend");
        Ok(())
    }

    /// Number of frames, env frame included
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Search newest to global; the env frame is skipped
    pub fn lookup(&self, key: &Primitive) -> Option<&Value> {
        self.find(key).and_then(|frame| self.binding(frame, key))
    }

    /// Index of the frame that binds `key`, searched like [`lookup`](Self::lookup)
    pub fn find(&self, key: &Primitive) -> Option<usize> {
        (GLOBAL_FRAME..self.frames.len())
            .rev()
            .find(|&frame| self.frames[frame].contains_key(key))
    }

    /// Binding of `key` in one frame
    pub fn binding(&self, frame: usize, key: &Primitive) -> Option<&Value> {
        self.frames.get(frame).and_then(|f| f.get(key))
    }

    pub fn binding_mut(&mut self, frame: usize, key: &Primitive) -> Option<&mut Value> {
        self.frames.get_mut(frame).and_then(|f| f.get_mut(key))
    }

    /// Bind in the newest frame, replacing any binding there
    pub fn define(&mut self, key: Primitive, value: Value) {
        self.current_scope_mut().insert(key, value);
    }

    pub fn env_scope(&self) -> &Object {
        &self.frames[ENV_FRAME]
    }

    pub fn env_scope_mut(&mut self) -> &mut Object {
        &mut self.frames[ENV_FRAME]
    }

    pub fn global_scope_mut(&mut self) -> &mut Object {
        &mut self.frames[GLOBAL_FRAME]
    }

    /// Drop nested frames and clear the global frame. Host bindings survive.
    pub fn reset(&mut self) {
        self.frames.truncate(GLOBAL_FRAME + 1);
        self.frames[GLOBAL_FRAME].clear();
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interp::ErrorKind;

    fn key(name: &str) -> Primitive {
        Primitive::from(name)
    }

    #[test]
    fn test_basic_define_lookup() {
        let mut env = Environment::new();
        env.define(key("x"), Value::int(42));
        assert_eq!(env.lookup(&key("x")), Some(&Value::int(42)));
        assert_eq!(env.lookup(&key("y")), None);
    }

    #[test]
    fn test_descend_ascend() {
        let mut env = Environment::new();
        assert_eq!(env.depth(), 2);
        env.define(key("x"), Value::int(1));

        assert_eq!(env.descend(), 3);
        env.define(key("y"), Value::int(2));
        assert_eq!(env.lookup(&key("x")), Some(&Value::int(1)));
        assert_eq!(env.lookup(&key("y")), Some(&Value::int(2)));

        env.ascend().unwrap();
        assert_eq!(env.depth(), 2);
        assert_eq!(env.lookup(&key("y")), None);
    }

    #[test]
    fn test_shadowing() {
        let mut env = Environment::new();
        env.define(key("x"), Value::int(1));
        env.descend();
        env.define(key("x"), Value::int(2));
        assert_eq!(env.lookup(&key("x")), Some(&Value::int(2)));
        env.ascend().unwrap();
        assert_eq!(env.lookup(&key("x")), Some(&Value::int(1)));
    }

    #[test]
    fn test_ascend_floor() {
        let mut env = Environment::new();
        let err = env.ascend().unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidState);
        assert_eq!(env.depth(), 2);
    }

    #[test]
    fn test_env_frame_is_not_searched() {
        let mut env = Environment::new();
        env.env_scope_mut().insert(key("host"), Value::int(1));
        assert_eq!(env.lookup(&key("host")), None);
        assert_eq!(env.env_scope().get(&key("host")), Some(&Value::int(1)));
    }

    #[test]
    fn test_find_returns_owning_frame() {
        let mut env = Environment::new();
        env.define(key("x"), Value::int(1));
        env.descend();
        env.descend();
        env.define(key("y"), Value::int(2));
        assert_eq!(env.find(&key("x")), Some(1));
        assert_eq!(env.find(&key("y")), Some(3));
        assert_eq!(env.find(&key("z")), None);

        if let Some(v) = env.binding_mut(1, &key("x")) {
            *v = Value::int(5);
        }
        assert!(env.binding(3, &key("x")).is_none());
        assert_eq!(env.lookup(&key("x")), Some(&Value::int(5)));
    }

    #[test]
    fn test_find_skips_env_frame() {
        let mut env = Environment::new();
        env.env_scope_mut().insert(key("host"), Value::int(1));
        assert_eq!(env.find(&key("host")), None);
        assert_eq!(env.binding(0, &key("host")), Some(&Value::int(1)));
    }

    #[test]
    fn test_global_scope_mut() {
        let mut env = Environment::new();
        env.descend();
        env.global_scope_mut().insert(key("g"), Value::int(7));
        assert!(env.current_scope().is_empty());
        assert_eq!(env.lookup(&key("g")), Some(&Value::int(7)));
    }

    #[test]
    fn test_reset_keeps_env_frame() {
        let mut env = Environment::new();
        env.env_scope_mut().insert(key("host"), Value::int(1));
        env.define(key("x"), Value::int(1));
        env.descend();
        env.descend();
        env.reset();
        assert_eq!(env.depth(), 2);
        assert_eq!(env.lookup(&key("x")), None);
        assert_eq!(env.env_scope().len(), 1);
    }
}
