//! Runtime values for the interpreter

use super::error::{InterpResult, RuntimeError};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Object storage. Scope frames use the same representation.
pub type Object = HashMap<Primitive, Value>;

/// Runtime value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Primitive(Primitive),
    List(Vec<Value>),
    Object(Object),
}

/// Scalar value. The only kind allowed as an object key.
///
/// Equality is per variant: `Int(1)` and `Double(1.0)` are different keys.
/// Doubles compare with `0.0 == -0.0` and `NaN == NaN` so that equal keys
/// always hash alike.
#[derive(Debug, Clone)]
pub enum Primitive {
    Int(i32),
    Double(f64),
    Str(String),
}

/// Numeric view of a primitive, used for arithmetic
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i32),
    Double(f64),
}

impl Value {
    pub fn int(n: i32) -> Self {
        Value::Primitive(Primitive::Int(n))
    }

    pub fn double(d: f64) -> Self {
        Value::Primitive(Primitive::Double(d))
    }

    pub fn string(s: impl Into<String>) -> Self {
        Value::Primitive(Primitive::Str(s.into()))
    }

    /// Get type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Primitive(p) => p.type_name(),
            Value::List(_) => "list",
            Value::Object(_) => "object",
        }
    }

    pub fn as_primitive(&self) -> Option<&Primitive> {
        match self {
            Value::Primitive(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<Number> {
        self.as_primitive().and_then(Primitive::as_number)
    }

    /// Convert into an object key; only primitives qualify
    pub fn into_key(self) -> InterpResult<Primitive> {
        match self {
            Value::Primitive(p) => Ok(p),
            other => Err(RuntimeError::type_mismatch(
                "primitive object key",
                other.type_name(),
            )),
        }
    }
}

impl From<Primitive> for Value {
    fn from(p: Primitive) -> Self {
        Value::Primitive(p)
    }
}

impl From<Number> for Value {
    fn from(n: Number) -> Self {
        Value::Primitive(n.into())
    }
}

impl Primitive {
    pub fn type_name(&self) -> &'static str {
        match self {
            Primitive::Int(_) => "int",
            Primitive::Double(_) => "double",
            Primitive::Str(_) => "string",
        }
    }

    pub fn as_number(&self) -> Option<Number> {
        match self {
            Primitive::Int(n) => Some(Number::Int(*n)),
            Primitive::Double(d) => Some(Number::Double(*d)),
            Primitive::Str(_) => None,
        }
    }

    /// Overwrite the wrapped value. The kind of a primitive is fixed at
    /// construction, so replacing it with a different kind fails.
    pub fn replace(&mut self, value: Primitive) -> InterpResult<()> {
        if std::mem::discriminant(self) != std::mem::discriminant(&value) {
            return Err(RuntimeError::type_mismatch(self.type_name(), value.type_name()));
        }
        *self = value;
        Ok(())
    }

    /// Deterministic ordering used when rendering objects
    fn render_order(&self, other: &Primitive) -> Ordering {
        fn rank(p: &Primitive) -> u8 {
            match p {
                Primitive::Int(_) => 0,
                Primitive::Double(_) => 1,
                Primitive::Str(_) => 2,
            }
        }
        match (self, other) {
            (Primitive::Int(a), Primitive::Int(b)) => a.cmp(b),
            (Primitive::Double(a), Primitive::Double(b)) => a.total_cmp(b),
            (Primitive::Str(a), Primitive::Str(b)) => a.cmp(b),
            _ => rank(self).cmp(&rank(other)),
        }
    }
}

impl From<&str> for Primitive {
    fn from(s: &str) -> Self {
        Primitive::Str(s.to_string())
    }
}

impl PartialEq for Primitive {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Primitive::Int(a), Primitive::Int(b)) => a == b,
            (Primitive::Double(a), Primitive::Double(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Primitive::Str(a), Primitive::Str(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Primitive {}

impl Hash for Primitive {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Primitive::Int(n) => n.hash(state),
            Primitive::Double(d) => {
                let bits = if *d == 0.0 {
                    0.0f64.to_bits()
                } else if d.is_nan() {
                    f64::NAN.to_bits()
                } else {
                    d.to_bits()
                };
                bits.hash(state);
            }
            Primitive::Str(s) => s.hash(state),
        }
    }
}

impl Number {
    pub fn as_f64(self) -> f64 {
        match self {
            Number::Int(n) => n as f64,
            Number::Double(d) => d,
        }
    }

    fn is_zero(self) -> bool {
        self.as_f64() == 0.0
    }

    /// Apply `int_op` when both sides are ints, `double_op` otherwise
    fn promote(self, rhs: Number, int_op: fn(i32, i32) -> i32, double_op: fn(f64, f64) -> f64) -> Number {
        match (self, rhs) {
            (Number::Int(a), Number::Int(b)) => Number::Int(int_op(a, b)),
            (a, b) => Number::Double(double_op(a.as_f64(), b.as_f64())),
        }
    }

    /// Division; a zero divisor of either kind is an error
    pub fn checked_div(self, rhs: Number) -> InterpResult<Number> {
        if rhs.is_zero() {
            return Err(RuntimeError::division_by_zero());
        }
        Ok(self.promote(rhs, i32::wrapping_div, |a, b| a / b))
    }

    /// Remainder; a zero divisor of either kind is an error
    pub fn checked_rem(self, rhs: Number) -> InterpResult<Number> {
        if rhs.is_zero() {
            return Err(RuntimeError::division_by_zero());
        }
        Ok(self.promote(rhs, i32::wrapping_rem, |a, b| a % b))
    }

    /// Exponentiation. Stays an int only for int ** non-negative int.
    pub fn pow(self, exponent: Number) -> Number {
        match (self, exponent) {
            (Number::Int(base), Number::Int(exp)) if exp >= 0 => {
                Number::Int(base.wrapping_pow(exp as u32))
            }
            (base, exp) => Number::Double(base.as_f64().powf(exp.as_f64())),
        }
    }
}

impl std::ops::Add for Number {
    type Output = Number;

    fn add(self, rhs: Number) -> Number {
        self.promote(rhs, i32::wrapping_add, |a, b| a + b)
    }
}

impl std::ops::Sub for Number {
    type Output = Number;

    fn sub(self, rhs: Number) -> Number {
        self.promote(rhs, i32::wrapping_sub, |a, b| a - b)
    }
}

impl std::ops::Mul for Number {
    type Output = Number;

    fn mul(self, rhs: Number) -> Number {
        self.promote(rhs, i32::wrapping_mul, |a, b| a * b)
    }
}

impl From<Number> for Primitive {
    fn from(n: Number) -> Self {
        match n {
            Number::Int(n) => Primitive::Int(n),
            Number::Double(d) => Primitive::Double(d),
        }
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Primitive::Int(n) => write!(f, "{n}"),
            Primitive::Double(d) => write!(f, "{d}"),
            Primitive::Str(s) => write!(f, "'{s}'"),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Primitive(p) => write!(f, "{p}"),
            Value::List(elements) => {
                write!(f, "[ ")?;
                for (i, v) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, " ]")
            }
            Value::Object(properties) => {
                let mut entries: Vec<_> = properties.iter().collect();
                entries.sort_by(|(a, _), (b, _)| a.render_order(b));
                write!(f, "{{ ")?;
                for (i, (k, v)) in entries.into_iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, " }}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interp::ErrorKind;

    fn object(entries: Vec<(Primitive, Value)>) -> Value {
        Value::Object(entries.into_iter().collect())
    }

    #[test]
    fn test_value_display() {
        assert_eq!(format!("{}", Value::int(42)), "42");
        assert_eq!(format!("{}", Value::double(3.25)), "3.25");
        assert_eq!(format!("{}", Value::double(4.0)), "4");
        assert_eq!(format!("{}", Value::string("hi")), "'hi'");
    }

    #[test]
    fn test_list_display() {
        let list = Value::List(vec![Value::int(1), Value::string("a"), Value::List(vec![])]);
        assert_eq!(list.to_string(), "[ 1, 'a', [  ] ]");
    }

    #[test]
    fn test_object_display_is_ordered() {
        let obj = object(vec![
            (Primitive::from("b"), Value::int(2)),
            (Primitive::Int(10), Value::string("ten")),
            (Primitive::from("a"), Value::int(1)),
            (Primitive::Double(0.5), Value::List(vec![])),
        ]);
        assert_eq!(obj.to_string(), "{ 10: 'ten', 0.5: [  ], 'a': 1, 'b': 2 }");
    }

    #[test]
    fn test_type_names() {
        assert_eq!(Value::int(1).type_name(), "int");
        assert_eq!(Value::double(1.0).type_name(), "double");
        assert_eq!(Value::string("").type_name(), "string");
        assert_eq!(Value::List(vec![]).type_name(), "list");
        assert_eq!(Value::Object(Object::new()).type_name(), "object");
    }

    #[test]
    fn test_primitive_equality_is_per_variant() {
        assert_eq!(Primitive::Int(1), Primitive::Int(1));
        assert_ne!(Primitive::Int(1), Primitive::Double(1.0));
        assert_ne!(Primitive::Int(1), Primitive::from("1"));
        assert_eq!(Primitive::Double(0.0), Primitive::Double(-0.0));
        assert_eq!(Primitive::Double(f64::NAN), Primitive::Double(f64::NAN));
    }

    #[test]
    fn test_primitive_as_object_key() {
        let mut obj = Object::new();
        obj.insert(Primitive::Int(1), Value::string("int"));
        obj.insert(Primitive::Double(1.0), Value::string("double"));
        obj.insert(Primitive::Double(-0.0), Value::string("zero"));
        assert_eq!(obj.len(), 3);
        assert_eq!(obj.get(&Primitive::Int(1)), Some(&Value::string("int")));
        assert_eq!(obj.get(&Primitive::Double(0.0)), Some(&Value::string("zero")));
    }

    #[test]
    fn test_replace_same_kind() {
        let mut p = Primitive::Int(1);
        p.replace(Primitive::Int(7)).unwrap();
        assert_eq!(p, Primitive::Int(7));
    }

    #[test]
    fn test_replace_different_kind_fails() {
        let mut p = Primitive::Int(1);
        let err = p.replace(Primitive::from("seven")).unwrap_err();
        assert_eq!(err.kind, ErrorKind::TypeMismatch);
        assert_eq!(p, Primitive::Int(1));
    }

    #[test]
    fn test_into_key() {
        assert_eq!(Value::int(3).into_key().unwrap(), Primitive::Int(3));
        let err = Value::List(vec![]).into_key().unwrap_err();
        assert_eq!(err.kind, ErrorKind::TypeMismatch);
    }

    #[test]
    fn test_int_arithmetic_stays_int() {
        assert_eq!(Number::Int(2) + Number::Int(3), Number::Int(5));
        assert_eq!(Number::Int(2) - Number::Int(3), Number::Int(-1));
        assert_eq!(Number::Int(4) * Number::Int(3), Number::Int(12));
        assert_eq!(Number::Int(7).checked_div(Number::Int(2)).unwrap(), Number::Int(3));
        assert_eq!(Number::Int(7).checked_rem(Number::Int(4)).unwrap(), Number::Int(3));
    }

    #[test]
    fn test_double_promotes() {
        assert_eq!(Number::Int(1) + Number::Double(0.5), Number::Double(1.5));
        assert_eq!(Number::Double(2.0) * Number::Int(3), Number::Double(6.0));
        assert_eq!(Number::Int(7).checked_div(Number::Double(2.0)).unwrap(), Number::Double(3.5));
        assert_eq!(Number::Double(7.5).checked_rem(Number::Int(2)).unwrap(), Number::Double(1.5));
    }

    #[test]
    fn test_int_overflow_wraps() {
        assert_eq!(Number::Int(i32::MAX) + Number::Int(1), Number::Int(i32::MIN));
        assert_eq!(Number::Int(i32::MIN).checked_div(Number::Int(-1)).unwrap(), Number::Int(i32::MIN));
    }

    #[test]
    fn test_division_by_zero_any_kind() {
        for (l, r) in [
            (Number::Int(1), Number::Int(0)),
            (Number::Double(1.0), Number::Int(0)),
            (Number::Int(1), Number::Double(0.0)),
            (Number::Int(1), Number::Double(-0.0)),
        ] {
            assert_eq!(l.checked_div(r).unwrap_err().kind, ErrorKind::DivisionByZero);
            assert_eq!(l.checked_rem(r).unwrap_err().kind, ErrorKind::DivisionByZero);
        }
    }

    #[test]
    fn test_pow_promotion() {
        assert_eq!(Number::Int(2).pow(Number::Int(3)), Number::Int(8));
        assert_eq!(Number::Int(2).pow(Number::Int(0)), Number::Int(1));
        assert_eq!(Number::Int(2).pow(Number::Int(-1)), Number::Double(0.5));
        assert_eq!(Number::Double(2.0).pow(Number::Int(2)), Number::Double(4.0));
        assert_eq!(Number::Int(9).pow(Number::Double(0.5)), Number::Double(3.0));
    }

    #[test]
    fn test_number_into_value() {
        assert_eq!(Value::from(Number::Int(3)), Value::int(3));
        assert_eq!(Value::from(Number::Double(0.5)), Value::double(0.5));
    }
}
