//! Member read and write per container kind
//!
//! Objects are keyed by primitives, lists by in-range ints. Primitives have
//! no members.

use super::error::{InterpResult, RuntimeError};
use super::value::{Object, Primitive, Value};

/// Read `container[key]`
pub fn read_member<'a>(container: &'a Value, key: &Value) -> InterpResult<&'a Value> {
    match container {
        Value::Object(properties) => read_object(properties, key),
        Value::List(elements) => Ok(&elements[list_index(elements.len(), key)?]),
        Value::Primitive(p) => Err(RuntimeError::unsupported_member_access(p.type_name())),
    }
}

pub fn read_member_mut<'a>(container: &'a mut Value, key: &Value) -> InterpResult<&'a mut Value> {
    match container {
        Value::Object(properties) => match key.as_primitive() {
            Some(k) => properties
                .get_mut(k)
                .ok_or_else(|| RuntimeError::key_not_found(&key.to_string())),
            None => Err(RuntimeError::key_not_found(&key.to_string())),
        },
        Value::List(elements) => {
            let index = list_index(elements.len(), key)?;
            Ok(&mut elements[index])
        }
        Value::Primitive(p) => Err(RuntimeError::unsupported_member_access(p.type_name())),
    }
}

/// Fails exactly when `write_member(container, key, _)` would
pub fn check_write(container: &Value, key: &Value) -> InterpResult<()> {
    match container {
        Value::Object(_) => key
            .as_primitive()
            .map(|_| ())
            .ok_or_else(|| RuntimeError::type_mismatch("primitive object key", key.type_name())),
        Value::List(elements) => list_index(elements.len(), key).map(|_| ()),
        Value::Primitive(p) => Err(RuntimeError::unsupported_member_access(p.type_name())),
    }
}

/// Write `container[key] = value`.
///
/// Objects insert or overwrite. Lists only replace an existing element.
pub fn write_member(container: &mut Value, key: Value, value: Value) -> InterpResult<()> {
    match container {
        Value::Object(properties) => write_object(properties, key, value),
        Value::List(elements) => {
            let index = list_index(elements.len(), &key)?;
            elements[index] = value;
            Ok(())
        }
        Value::Primitive(p) => Err(RuntimeError::unsupported_member_access(p.type_name())),
    }
}

/// Read a property; a non-primitive key can never be present
pub fn read_object<'a>(properties: &'a Object, key: &Value) -> InterpResult<&'a Value> {
    key.as_primitive()
        .and_then(|k| properties.get(k))
        .ok_or_else(|| RuntimeError::key_not_found(&key.to_string()))
}

pub fn write_object(properties: &mut Object, key: Value, value: Value) -> InterpResult<()> {
    let key: Primitive = key.into_key()?;
    properties.insert(key, value);
    Ok(())
}

/// Validate `key` as an index into a list of `len` elements
fn list_index(len: usize, key: &Value) -> InterpResult<usize> {
    match key {
        Value::Primitive(Primitive::Int(i)) if *i >= 0 && (*i as usize) < len => Ok(*i as usize),
        _ => Err(RuntimeError::index_out_of_range(&key.to_string(), len)),
    }
}
