//! Runtime values
//!
//! A value is the tagged union the expression evaluator works on.
//! Strings are descriptors pointing into the heap, the token stream or
//! the per-statement temporary pool; the bytes themselves stay inside
//! the interpreter.

use crate::error::{BasicError, BasicResult};

/// Where a string descriptor's bytes live
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrSrc {
    /// Offset into the arena (a heap string object's data)
    Heap,
    /// Offset into the active token stream (a string literal payload)
    Code,
    /// Offset into the per-statement temporary pool
    Temp,
}

/// String descriptor: source, byte offset, length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrRef {
    pub src: StrSrc,
    pub off: usize,
    pub len: usize,
}

/// Tagged runtime value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Int(i32),
    Float(f64),
    Str(StrRef),
}

impl Value {
    pub fn is_str(&self) -> bool {
        matches!(self, Value::Str(_))
    }

    /// Integer view; floats truncate toward zero, strings are a type error
    pub fn to_int(&self) -> BasicResult<i32> {
        match self {
            Value::Int(n) => Ok(*n),
            Value::Float(f) => Ok(*f as i32),
            Value::Str(_) => Err(BasicError::TypeMismatch),
        }
    }

    /// Floating-point view
    pub fn to_f64(&self) -> BasicResult<f64> {
        match self {
            Value::Int(n) => Ok(*n as f64),
            Value::Float(f) => Ok(*f),
            Value::Str(_) => Err(BasicError::TypeMismatch),
        }
    }

    /// BASIC truth: any nonzero number
    pub fn truthy(&self) -> BasicResult<bool> {
        match self {
            Value::Int(n) => Ok(*n != 0),
            Value::Float(f) => Ok(*f != 0.0),
            Value::Str(_) => Err(BasicError::TypeMismatch),
        }
    }

    /// Sign of the value as an integer (-1, 0, 1)
    pub fn signum(&self) -> BasicResult<i32> {
        match self {
            Value::Int(n) => Ok(n.signum()),
            Value::Float(f) => Ok(if *f > 0.0 {
                1
            } else if *f < 0.0 {
                -1
            } else {
                0
            }),
            Value::Str(_) => Err(BasicError::TypeMismatch),
        }
    }
}

/// A numeric pair promoted to a common representation
pub enum NumPair {
    Ints(i32, i32),
    Floats(f64, f64),
}

/// Promote two numeric values; mixed int/float widens to float
pub fn promote(a: &Value, b: &Value) -> BasicResult<NumPair> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Ok(NumPair::Ints(*x, *y)),
        _ => Ok(NumPair::Floats(a.to_f64()?, b.to_f64()?)),
    }
}

/// Format a number the way PRINT and LIST emit it. Integral floats keep
/// one decimal so a listed program re-tokenizes to identical bytes.
pub fn format_number(v: &Value) -> String {
    match v {
        Value::Int(n) => n.to_string(),
        Value::Float(f) => {
            if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 {
                format!("{:.1}", f)
            } else {
                format!("{}", f)
            }
        }
        Value::Str(_) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_truncates_toward_zero() {
        assert_eq!(Value::Float(-2.7).to_int().unwrap(), -2);
        assert_eq!(Value::Float(2.7).to_int().unwrap(), 2);
    }

    #[test]
    fn integral_float_keeps_decimal() {
        assert_eq!(format_number(&Value::Float(8.0)), "8.0");
        assert_eq!(format_number(&Value::Float(2.5)), "2.5");
        assert_eq!(format_number(&Value::Int(-3)), "-3");
    }
}
