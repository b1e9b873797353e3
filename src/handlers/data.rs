//! DATA/READ/RESTORE and user functions
//!
//! DATA items are skipped by normal execution; READ walks them through
//! a cursor in line order. DEF FN stores a parameter list and a token
//! offset into the program; invocation happens in the evaluator.

use crate::error::{BasicError, BasicResult};
use crate::eval::{array_indices, int_expr};
use crate::host::Host;
use crate::program::LINE_HDR;
use crate::state::Machine;
use crate::tokens::{lit, st, Name, EOL};
use crate::value::Value;

/// DATA executes as a no-op: its payload is consumed by READ only
pub fn cmd_data(m: &mut Machine) -> BasicResult<()> {
    m.skip_statement();
    Ok(())
}

/// Fetch the next datum from the stored program. Reading past the last
/// DATA item is undefined-name territory.
fn next_datum(m: &mut Machine) -> BasicResult<Value> {
    let top = m.arena.top;
    let mut pos = m.data.pos;
    let mut inside = m.data.inside;
    if pos == 0 && !inside {
        if top == 0 {
            return Err(BasicError::Undefined);
        }
        pos = LINE_HDR;
    }

    let value = loop {
        if !inside {
            // scan forward for the next DATA token
            loop {
                if pos >= top {
                    return Err(BasicError::Undefined);
                }
                let t = m.arena.read_u8(pos);
                if t == EOL {
                    pos += 1 + LINE_HDR;
                    if pos > top {
                        return Err(BasicError::Undefined);
                    }
                    continue;
                }
                if t == st::DATA {
                    pos += 1;
                    inside = true;
                    break;
                }
                pos += crate::tokens::token_len(m.arena.prog(), pos);
            }
        }

        // one datum: optional sign, then a literal
        let mut neg = false;
        loop {
            match m.arena.read_u8(pos) {
                b'-' => {
                    neg = !neg;
                    pos += 1;
                }
                b'+' => pos += 1,
                _ => break,
            }
        }
        let t = m.arena.read_u8(pos);
        let v = match t {
            lit::NUM => {
                let v = i16::from_le_bytes([m.arena.read_u8(pos + 1), m.arena.read_u8(pos + 2)]);
                pos += 3;
                Value::Int(v as i32)
            }
            lit::LNUM => {
                let v = m.arena.read_i32(pos + 1);
                pos += 5;
                Value::Int(v)
            }
            lit::FNUM => {
                let v = m.arena.read_f64(pos + 1);
                pos += 9;
                Value::Float(v)
            }
            lit::STR => {
                let len = m.arena.read_u8(pos + 1) as usize;
                let bytes = m.arena.bytes(pos + 2, len).to_vec();
                pos += 2 + len;
                Value::Str(m.temp_str(&bytes))
            }
            _ => return Err(BasicError::Syntax(0)),
        };
        let v = if neg {
            match v {
                Value::Int(n) => Value::Int(n.wrapping_neg()),
                Value::Float(f) => Value::Float(-f),
                Value::Str(_) => return Err(BasicError::TypeMismatch),
            }
        } else {
            v
        };
        if m.arena.read_u8(pos) == b',' {
            pos += 1;
        } else {
            inside = false;
        }
        break v;
    };

    m.data.pos = pos;
    m.data.inside = inside;
    Ok(value)
}

pub fn cmd_read(m: &mut Machine, host: &mut dyn Host) -> BasicResult<()> {
    loop {
        let tag = m.getb();
        match tag {
            lit::VAR => {
                let name = m.get_name();
                let v = next_datum(m)?;
                if v.is_str() {
                    return Err(BasicError::TypeMismatch);
                }
                m.arena.set_var(&name, &v)?;
            }
            lit::STRVAR => {
                let name = m.get_name();
                let v = next_datum(m)?;
                let Value::Str(r) = v else {
                    return Err(BasicError::TypeMismatch);
                };
                let bytes = m.str_bytes(&r);
                let obj = m.arena.string_obj(&name, true)?;
                m.arena.set_string(&obj, &bytes)?;
            }
            lit::ARRVAR => {
                let name = m.get_name();
                let (i, j) = array_indices(m, host)?;
                let v = next_datum(m)?;
                if v.is_str() {
                    return Err(BasicError::TypeMismatch);
                }
                let cell = m.arena.array_cell(&name, i, j, m.settings.array_origin)?;
                m.arena.write_cell(cell, &v)?;
            }
            _ => return Err(BasicError::Syntax(0)),
        }
        if !m.accept(b',') {
            return Ok(());
        }
    }
}

/// RESTORE [n]: rewind the cursor to the program start or to a line
pub fn cmd_restore(m: &mut Machine, host: &mut dyn Host) -> BasicResult<()> {
    if matches!(m.peek(), EOL | b':') {
        m.data = Default::default();
        return Ok(());
    }
    let n = int_expr(m, host)?;
    let line = u16::try_from(n).map_err(|_| BasicError::Range)?;
    let off =
        crate::program::find_line(&m.arena, line).ok_or(BasicError::Undefined)?;
    m.data.pos = off + LINE_HDR;
    m.data.inside = false;
    Ok(())
}

/// DEF FN NAME(args) = expr, or a multiline body closed by FEND
pub fn cmd_def(m: &mut Machine) -> BasicResult<()> {
    m.expect(st::FN)?;
    let tag = m.getb();
    if !matches!(tag, lit::VAR | lit::ARRVAR) {
        return Err(BasicError::Syntax(0));
    }
    let name = m.get_name();

    let mut params: Vec<Name> = Vec::new();
    if m.accept(b'(') {
        if m.peek() != b')' {
            loop {
                if m.getb() != lit::VAR {
                    return Err(BasicError::Syntax(0));
                }
                params.push(m.get_name());
                if !m.accept(b',') {
                    break;
                }
            }
        }
        m.expect(b')')?;
    }

    // the body has to live in the stored program
    if m.mode != crate::state::RunMode::Run {
        return Err(BasicError::Syntax(0));
    }

    if m.accept(b'=') {
        m.arena.def_fn(&name, &params, false, m.here, m.line)?;
        m.skip_statement();
        return Ok(());
    }

    // multiline: body starts on the next line, definition skips to FEND
    if m.peek() != EOL {
        return Err(BasicError::Syntax(0));
    }
    let hdr = m.here + 1;
    if hdr + LINE_HDR > m.arena.top {
        return Err(BasicError::Syntax(0));
    }
    let body_line = m.arena.read_u16(hdr);
    m.arena
        .def_fn(&name, &params, true, hdr + LINE_HDR, body_line)?;
    m.scan_match(&[], st::FEND)
}

/// FEND outside a running function body is a stray terminator
pub fn cmd_fend(m: &mut Machine) -> BasicResult<()> {
    if m.fn_depth == 0 {
        return Err(BasicError::Syntax(0));
    }
    m.fn_returning = true;
    Ok(())
}
