//! Expression evaluator
//!
//! Precedence-driven descent over the token stream, lowest level
//! first: OR, AND, NOT, relational, additive, multiplicative, shifts,
//! power, unary, primary. Each level consumes its operators and
//! returns a [`Value`].

use crate::engine;
use crate::error::{BasicError, BasicResult};
use crate::host::Host;
use crate::state::{Features, Machine, RunMode, MAX_EXPR_DEPTH};
use crate::tokens::{ext, func, lit, op, st, word, Name};
use crate::value::{format_number, promote, NumPair, StrRef, Value};

/// Evaluate one expression at the cursor
pub fn expression(m: &mut Machine, host: &mut dyn Host) -> BasicResult<Value> {
    if m.expr_depth >= MAX_EXPR_DEPTH {
        return Err(BasicError::StackError);
    }
    m.expr_depth += 1;
    let r = or_expr(m, host);
    m.expr_depth -= 1;
    r
}

/// Evaluate and require a number, returned as an integer
pub fn int_expr(m: &mut Machine, host: &mut dyn Host) -> BasicResult<i32> {
    expression(m, host)?.to_int()
}

/// Evaluate and require a string descriptor
pub fn str_expr(m: &mut Machine, host: &mut dyn Host) -> BasicResult<StrRef> {
    match expression(m, host)? {
        Value::Str(r) => Ok(r),
        _ => Err(BasicError::TypeMismatch),
    }
}

fn logic_int(v: &Value) -> BasicResult<i32> {
    v.to_int()
}

fn or_expr(m: &mut Machine, host: &mut dyn Host) -> BasicResult<Value> {
    let mut a = and_expr(m, host)?;
    while m.accept(word::OR) {
        let b = and_expr(m, host)?;
        a = Value::Int(logic_int(&a)? | logic_int(&b)?);
    }
    Ok(a)
}

fn and_expr(m: &mut Machine, host: &mut dyn Host) -> BasicResult<Value> {
    let mut a = not_expr(m, host)?;
    while m.accept(word::AND) {
        let b = not_expr(m, host)?;
        a = Value::Int(logic_int(&a)? & logic_int(&b)?);
    }
    Ok(a)
}

fn not_expr(m: &mut Machine, host: &mut dyn Host) -> BasicResult<Value> {
    if m.accept(word::NOT) {
        let v = not_expr(m, host)?;
        let n = logic_int(&v)?;
        return Ok(if m.settings.bool_mode < 0 {
            Value::Int(!n)
        } else {
            Value::Int((n == 0) as i32)
        });
    }
    rel_expr(m, host)
}

fn rel_expr(m: &mut Machine, host: &mut dyn Host) -> BasicResult<Value> {
    let mut a = add_expr(m, host)?;
    loop {
        let t = m.peek();
        let is_rel = matches!(t, b'=' | b'<' | b'>' | op::LE | op::GE | op::NE);
        if !is_rel {
            return Ok(a);
        }
        m.skip(1);
        let b = add_expr(m, host)?;
        let ord = compare(m, &a, &b)?;
        let res = match t {
            b'=' => ord == core::cmp::Ordering::Equal,
            op::NE => ord != core::cmp::Ordering::Equal,
            b'<' => ord == core::cmp::Ordering::Less,
            b'>' => ord == core::cmp::Ordering::Greater,
            op::LE => ord != core::cmp::Ordering::Greater,
            _ => ord != core::cmp::Ordering::Less,
        };
        a = m.bool_value(res);
    }
}

pub(crate) fn compare(m: &Machine, a: &Value, b: &Value) -> BasicResult<core::cmp::Ordering> {
    match (a, b) {
        (Value::Str(x), Value::Str(y)) => Ok(m.str_bytes(x).cmp(&m.str_bytes(y))),
        (Value::Str(_), _) | (_, Value::Str(_)) => Err(BasicError::TypeMismatch),
        _ => match promote(a, b)? {
            NumPair::Ints(x, y) => Ok(x.cmp(&y)),
            NumPair::Floats(x, y) => Ok(x.partial_cmp(&y).unwrap_or(core::cmp::Ordering::Equal)),
        },
    }
}

fn add_expr(m: &mut Machine, host: &mut dyn Host) -> BasicResult<Value> {
    let mut a = mul_expr(m, host)?;
    loop {
        let t = m.peek();
        if t != b'+' && t != b'-' {
            return Ok(a);
        }
        m.skip(1);
        let b = mul_expr(m, host)?;
        a = if t == b'+' {
            match (&a, &b) {
                (Value::Str(x), Value::Str(y)) => {
                    if !m.features.contains(Features::MSSTRINGS) {
                        return Err(BasicError::TypeMismatch);
                    }
                    let mut cat = m.str_bytes(x);
                    cat.extend_from_slice(&m.str_bytes(y));
                    Value::Str(m.temp_str(&cat))
                }
                _ => match promote(&a, &b)? {
                    NumPair::Ints(x, y) => Value::Int(x.wrapping_add(y)),
                    NumPair::Floats(x, y) => Value::Float(x + y),
                },
            }
        } else {
            match promote(&a, &b)? {
                NumPair::Ints(x, y) => Value::Int(x.wrapping_sub(y)),
                NumPair::Floats(x, y) => Value::Float(x - y),
            }
        };
    }
}

fn mul_expr(m: &mut Machine, host: &mut dyn Host) -> BasicResult<Value> {
    let mut a = shift_expr(m, host)?;
    loop {
        let t = m.peek();
        if t != b'*' && t != b'/' && t != word::MOD {
            return Ok(a);
        }
        m.skip(1);
        let b = shift_expr(m, host)?;
        a = match promote(&a, &b)? {
            NumPair::Ints(x, y) => match t {
                b'*' => Value::Int(x.wrapping_mul(y)),
                b'/' => {
                    if y == 0 {
                        return Err(BasicError::DivByZero);
                    }
                    Value::Int(x.wrapping_div(y))
                }
                _ => {
                    if y == 0 {
                        return Err(BasicError::DivByZero);
                    }
                    Value::Int(x.wrapping_rem(y))
                }
            },
            NumPair::Floats(x, y) => match t {
                b'*' => Value::Float(x * y),
                // float division by zero is non-fatal infinity
                b'/' => Value::Float(x / y),
                _ => Value::Float(x % y),
            },
        };
    }
}

fn shift_expr(m: &mut Machine, host: &mut dyn Host) -> BasicResult<Value> {
    let mut a = pow_expr(m, host)?;
    loop {
        let t = m.peek();
        if t != op::SHL && t != op::SHR {
            return Ok(a);
        }
        m.skip(1);
        let b = pow_expr(m, host)?;
        let x = a.to_int()?;
        let n = b.to_int()?;
        a = Value::Int(match (t, n) {
            (_, n) if !(0..32).contains(&n) => 0,
            (op::SHL, n) => x.wrapping_shl(n as u32),
            (_, n) => x >> n,
        });
    }
}

fn pow_expr(m: &mut Machine, host: &mut dyn Host) -> BasicResult<Value> {
    let a = unary_expr(m, host)?;
    if m.peek() != b'^' {
        return Ok(a);
    }
    if m.settings.power_right {
        m.skip(1);
        let b = pow_expr(m, host)?;
        power(m, &a, &b)
    } else {
        let mut acc = a;
        while m.accept(b'^') {
            let b = unary_expr(m, host)?;
            acc = power(m, &acc, &b)?;
        }
        Ok(acc)
    }
}

fn power(m: &Machine, a: &Value, b: &Value) -> BasicResult<Value> {
    match promote(a, b)? {
        NumPair::Ints(x, y) => {
            if y >= 0 {
                let mut acc: i32 = 1;
                for _ in 0..y {
                    acc = acc.wrapping_mul(x);
                }
                Ok(Value::Int(acc))
            } else if m.features.contains(Features::FLOAT) {
                Ok(Value::Float((x as f64).powf(y as f64)))
            } else {
                Ok(Value::Int(0))
            }
        }
        NumPair::Floats(x, y) => Ok(Value::Float(x.powf(y))),
    }
}

fn unary_expr(m: &mut Machine, host: &mut dyn Host) -> BasicResult<Value> {
    match m.peek() {
        b'-' => {
            m.skip(1);
            match unary_expr(m, host)? {
                Value::Int(n) => Ok(Value::Int(n.wrapping_neg())),
                Value::Float(f) => Ok(Value::Float(-f)),
                Value::Str(_) => Err(BasicError::TypeMismatch),
            }
        }
        b'+' => {
            m.skip(1);
            unary_expr(m, host)
        }
        _ => primary(m, host),
    }
}

fn primary(m: &mut Machine, host: &mut dyn Host) -> BasicResult<Value> {
    let t = m.getb();
    match t {
        lit::NUM => Ok(Value::Int(m.get_i16() as i32)),
        lit::LNUM => Ok(Value::Int(m.get_i32())),
        lit::FNUM => Ok(Value::Float(m.get_f64())),
        lit::STR => Ok(Value::Str(m.get_str_ref())),
        lit::VAR => {
            let name = m.get_name();
            m.arena.get_var(&name)
        }
        lit::STRVAR => {
            let name = m.get_name();
            string_value(m, host, &name)
        }
        lit::ARRVAR => {
            let name = m.get_name();
            let (i, j) = array_indices(m, host)?;
            let cell = m.arena.array_cell(&name, i, j, m.settings.array_origin)?;
            Ok(m.arena.read_cell(cell))
        }
        b'(' => {
            let v = expression(m, host)?;
            m.expect(b')')?;
            Ok(v)
        }
        st::FN => call_fn(m, host),
        ext::PAGE => {
            let t2 = m.getb();
            match t2 {
                ext::DREAD => {
                    let pin = pin_arg(m, host)?;
                    Ok(Value::Int(host.digital_read(pin)? as i32))
                }
                ext::AREAD => {
                    let pin = pin_arg(m, host)?;
                    Ok(Value::Int(host.analog_read(pin)?))
                }
                _ => Err(BasicError::Syntax(0)),
            }
        }
        func::ERR => Ok(Value::Int(m.err)),
        func::MILLIS => Ok(Value::Int(host.millis() as i32)),
        t if (func::ABS..=func::MIDS).contains(&t) => builtin(m, host, t),
        _ => Err(BasicError::Syntax(0)),
    }
}

/// Parse `(i)` or `(i,j)` after an array name
pub fn array_indices(m: &mut Machine, host: &mut dyn Host) -> BasicResult<(i32, Option<i32>)> {
    m.expect(b'(')?;
    let i = int_expr(m, host)?;
    let j = if m.accept(b',') {
        Some(int_expr(m, host)?)
    } else {
        None
    };
    m.expect(b')')?;
    Ok((i, j))
}

fn pin_arg(m: &mut Machine, host: &mut dyn Host) -> BasicResult<u8> {
    m.expect(b'(')?;
    let pin = int_expr(m, host)?;
    m.expect(b')')?;
    u8::try_from(pin).map_err(|_| BasicError::Range)
}

/// String variable reference, with substring access when enabled
fn string_value(m: &mut Machine, host: &mut dyn Host, name: &Name) -> BasicResult<Value> {
    let obj = m.arena.string_obj(name, true)?;
    let len = m.arena.str_len(&obj);
    let data = m.arena.str_data(&obj);
    if m.peek() == b'(' {
        if !m.settings.substrings {
            return Err(BasicError::Syntax(0));
        }
        let (i, j) = array_indices(m, host)?;
        let (off, n) = substring(len, i, j)?;
        return Ok(Value::Str(StrRef {
            src: crate::value::StrSrc::Heap,
            off: data + off,
            len: n,
        }));
    }
    Ok(Value::Str(StrRef {
        src: crate::value::StrSrc::Heap,
        off: data,
        len,
    }))
}

/// Resolve 1-based substring bounds `(i)` = i..end, `(i,j)` = i..=j,
/// clamped to the current length
pub fn substring(len: usize, i: i32, j: Option<i32>) -> BasicResult<(usize, usize)> {
    if i < 1 {
        return Err(BasicError::Range);
    }
    let start = (i - 1) as usize;
    if start >= len {
        return Ok((0, 0));
    }
    let end = match j {
        Some(j) if j < i - 1 => return Err(BasicError::Range),
        Some(j) => (j as usize).min(len),
        None => len,
    };
    Ok((start, end.saturating_sub(start)))
}

// ============================================================================
// Builtin functions
// ============================================================================

fn paren_value(m: &mut Machine, host: &mut dyn Host) -> BasicResult<Value> {
    m.expect(b'(')?;
    let v = expression(m, host)?;
    m.expect(b')')?;
    Ok(v)
}

fn paren_str(m: &mut Machine, host: &mut dyn Host) -> BasicResult<Vec<u8>> {
    m.expect(b'(')?;
    let r = str_expr(m, host)?;
    m.expect(b')')?;
    Ok(m.str_bytes(&r))
}

fn builtin(m: &mut Machine, host: &mut dyn Host, t: u8) -> BasicResult<Value> {
    match t {
        func::ABS => match paren_value(m, host)? {
            Value::Int(n) => Ok(Value::Int(n.wrapping_abs())),
            Value::Float(f) => Ok(Value::Float(f.abs())),
            Value::Str(_) => Err(BasicError::TypeMismatch),
        },
        func::SGN => {
            let v = paren_value(m, host)?;
            Ok(Value::Int(v.signum()?))
        }
        func::INT => match paren_value(m, host)? {
            Value::Int(n) => Ok(Value::Int(n)),
            Value::Float(f) => Ok(Value::Float(f.floor())),
            Value::Str(_) => Err(BasicError::TypeMismatch),
        },
        func::SQR => {
            let v = paren_value(m, host)?;
            match v {
                Value::Int(n) if !m.features.contains(Features::FLOAT) => {
                    if n < 0 {
                        return Err(BasicError::Range);
                    }
                    // integer square root for the no-float build
                    let mut r = 0i32;
                    while (r + 1).saturating_mul(r + 1) <= n {
                        r += 1;
                    }
                    Ok(Value::Int(r))
                }
                _ => Ok(Value::Float(v.to_f64()?.sqrt())),
            }
        }
        func::POW => {
            m.expect(b'(')?;
            let a = expression(m, host)?;
            m.expect(b',')?;
            let b = expression(m, host)?;
            m.expect(b')')?;
            power(m, &a, &b)
        }
        func::RND => {
            let n = paren_value(m, host)?.to_int()?;
            if n <= 0 {
                return Ok(Value::Int(0));
            }
            Ok(Value::Int((host.rand() % n as u32) as i32))
        }
        func::LEN => {
            let s = paren_str(m, host)?;
            Ok(Value::Int(s.len() as i32))
        }
        func::VAL => {
            let s = paren_str(m, host)?;
            Ok(parse_val(m, &s))
        }
        func::ASC => {
            let s = paren_str(m, host)?;
            Ok(Value::Int(s.first().copied().unwrap_or(0) as i32))
        }
        func::INSTR => {
            m.expect(b'(')?;
            let hay = str_expr(m, host)?;
            let hay = m.str_bytes(&hay);
            m.expect(b',')?;
            let needle = str_expr(m, host)?;
            let needle = m.str_bytes(&needle);
            m.expect(b')')?;
            if !m.features.contains(Features::FULLINSTR) && needle.len() != 1 {
                return Err(BasicError::Range);
            }
            if needle.is_empty() {
                return Ok(Value::Int(0));
            }
            let pos = hay
                .windows(needle.len())
                .position(|w| w == needle.as_slice())
                .map(|p| p as i32 + 1)
                .unwrap_or(0);
            Ok(Value::Int(pos))
        }
        func::STRS => {
            let v = paren_value(m, host)?;
            if v.is_str() {
                return Err(BasicError::TypeMismatch);
            }
            let s = format_number(&v);
            Ok(Value::Str(m.temp_str(s.as_bytes())))
        }
        func::CHRS => {
            let n = paren_value(m, host)?.to_int()?;
            let b = u8::try_from(n).map_err(|_| BasicError::Range)?;
            Ok(Value::Str(m.temp_str(&[b])))
        }
        func::LEFTS => {
            m.expect(b'(')?;
            let s = str_expr(m, host)?;
            let s = m.str_bytes(&s);
            m.expect(b',')?;
            let n = int_expr(m, host)?;
            m.expect(b')')?;
            if n < 0 {
                return Err(BasicError::Range);
            }
            let n = (n as usize).min(s.len());
            Ok(Value::Str(m.temp_str(&s[..n])))
        }
        func::RIGHTS => {
            m.expect(b'(')?;
            let s = str_expr(m, host)?;
            let s = m.str_bytes(&s);
            m.expect(b',')?;
            let n = int_expr(m, host)?;
            m.expect(b')')?;
            if n < 0 {
                return Err(BasicError::Range);
            }
            let n = (n as usize).min(s.len());
            Ok(Value::Str(m.temp_str(&s[s.len() - n..])))
        }
        func::MIDS => {
            m.expect(b'(')?;
            let s = str_expr(m, host)?;
            let s = m.str_bytes(&s);
            m.expect(b',')?;
            let i = int_expr(m, host)?;
            let n = if m.accept(b',') {
                Some(int_expr(m, host)?)
            } else {
                None
            };
            m.expect(b')')?;
            if i < 1 || n.is_some_and(|n| n < 0) {
                return Err(BasicError::Range);
            }
            let start = ((i - 1) as usize).min(s.len());
            let end = match n {
                Some(n) => (start + n as usize).min(s.len()),
                None => s.len(),
            };
            Ok(Value::Str(m.temp_str(&s[start..end])))
        }
        _ => Err(BasicError::Syntax(0)),
    }
}

/// VAL: leading number of a string, 0 when none parses
pub(crate) fn parse_val(m: &Machine, s: &[u8]) -> Value {
    let text = String::from_utf8_lossy(s);
    let t = text.trim();
    if m.features.contains(Features::NUMSYSTEM) {
        if let Some(rest) = t.strip_prefix('$') {
            if let Ok(n) = i64::from_str_radix(rest, 16) {
                return Value::Int(n as i32);
            }
        }
        if let Some(rest) = t.strip_prefix('&') {
            if let Ok(n) = i64::from_str_radix(rest, 8) {
                return Value::Int(n as i32);
            }
        }
        if let Some(rest) = t.strip_prefix('%') {
            if let Ok(n) = i64::from_str_radix(rest, 2) {
                return Value::Int(n as i32);
            }
        }
    }
    // longest numeric prefix
    let bytes = t.as_bytes();
    let mut end = 0;
    let mut seen_dot = false;
    while end < bytes.len() {
        let c = bytes[end];
        let ok = c.is_ascii_digit()
            || (end == 0 && (c == b'+' || c == b'-'))
            || (c == b'.' && !seen_dot);
        if !ok {
            break;
        }
        if c == b'.' {
            seen_dot = true;
        }
        end += 1;
    }
    let span = &t[..end];
    if let Ok(n) = span.parse::<i32>() {
        return Value::Int(n);
    }
    if m.features.contains(Features::FLOAT) {
        if let Ok(f) = span.parse::<f64>() {
            return Value::Float(f);
        }
    }
    Value::Int(0)
}

// ============================================================================
// User functions
// ============================================================================

/// `FN NAME(args)`: bind parameters, evaluate the stored body, restore
fn call_fn(m: &mut Machine, host: &mut dyn Host) -> BasicResult<Value> {
    let tag = m.getb();
    if !matches!(tag, lit::VAR | lit::ARRVAR) {
        return Err(BasicError::Syntax(0));
    }
    let name = m.get_name();
    let def = m.arena.find_fn(&name).ok_or(BasicError::Undefined)?;

    let mut args = Vec::new();
    if m.peek() == b'(' {
        m.skip(1);
        if m.peek() != b')' {
            loop {
                args.push(expression(m, host)?);
                if !m.accept(b',') {
                    break;
                }
            }
        }
        m.expect(b')')?;
    }
    if args.len() != def.params.len() {
        return Err(BasicError::Syntax(0));
    }

    // fresh bindings: remember what the parameter names held before
    let mut saved: Vec<(Name, Option<Value>)> = Vec::with_capacity(args.len());
    for (p, v) in def.params.iter().zip(&args) {
        let old = m
            .arena
            .find_object(p, crate::heap::ObjKind::Scalar)
            .map(|o| m.arena.read_cell(o.payload));
        saved.push((*p, old));
        m.arena.set_var(p, v)?;
    }

    let (oh, om, ol) = (m.here, m.mode, m.line);
    m.mode = RunMode::Run;
    m.here = def.body;
    m.line = def.line;
    let result = if def.multiline {
        run_fn_body(m, host, &name)
    } else {
        expression(m, host)
    };
    m.here = oh;
    m.mode = om;
    m.line = ol;

    for (p, old) in saved {
        let v = old.unwrap_or(Value::Int(0));
        m.arena.set_var(&p, &v)?;
    }
    result
}

/// Multiline body: run statements until FEND; the result is whatever
/// the body left in a scalar named like the function
fn run_fn_body(m: &mut Machine, host: &mut dyn Host, name: &Name) -> BasicResult<Value> {
    m.fn_depth += 1;
    let mut r = Ok(());
    while !m.fn_returning && !m.halted {
        if let Err(e) = engine::step(m, host) {
            r = Err(e);
            break;
        }
    }
    m.fn_depth -= 1;
    m.fn_returning = false;
    r?;
    m.arena.get_var(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substring_bounds() {
        assert_eq!(substring(5, 2, Some(4)).unwrap(), (1, 3));
        assert_eq!(substring(5, 2, None).unwrap(), (1, 4));
        assert_eq!(substring(5, 6, None).unwrap(), (0, 0));
        assert_eq!(substring(5, 3, Some(9)).unwrap(), (2, 3));
        assert!(substring(5, 0, None).is_err());
    }
}
