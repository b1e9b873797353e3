//! Assignment and allocation
//!
//! LET (explicit and implicit), DIM, CLR and the in-place string
//! assignments (substring targets, MID$/LEFT$/RIGHT$ on the left side)

use crate::error::{BasicError, BasicResult};
use crate::eval::{array_indices, int_expr, str_expr, substring};
use crate::host::Host;
use crate::state::Machine;
use crate::tokens::{func, lit};

/// Explicit LET just re-dispatches on the target name token
pub fn cmd_let(m: &mut Machine, host: &mut dyn Host) -> BasicResult<()> {
    let tag = m.getb();
    if !matches!(tag, lit::VAR | lit::STRVAR | lit::ARRVAR) {
        return Err(BasicError::Syntax(0));
    }
    cmd_assign(m, host, tag)
}

/// Assignment with the target tag already consumed
pub fn cmd_assign(m: &mut Machine, host: &mut dyn Host, tag: u8) -> BasicResult<()> {
    match tag {
        lit::VAR => {
            let name = m.get_name();
            m.expect(b'=')?;
            let v = crate::eval::expression(m, host)?;
            if v.is_str() {
                return Err(BasicError::TypeMismatch);
            }
            m.arena.set_var(&name, &v)
        }
        lit::ARRVAR => {
            let name = m.get_name();
            let (i, j) = array_indices(m, host)?;
            m.expect(b'=')?;
            let v = crate::eval::expression(m, host)?;
            if v.is_str() {
                return Err(BasicError::TypeMismatch);
            }
            let cell = m.arena.array_cell(&name, i, j, m.settings.array_origin)?;
            m.arena.write_cell(cell, &v)
        }
        lit::STRVAR => {
            let name = m.get_name();
            if m.peek() == b'(' {
                if !m.settings.substrings {
                    return Err(BasicError::Syntax(0));
                }
                let (i, j) = array_indices(m, host)?;
                m.expect(b'=')?;
                let src = str_expr(m, host)?;
                let src = m.str_bytes(&src);
                return substring_store(m, &name, i, j, &src);
            }
            m.expect(b'=')?;
            let src = str_expr(m, host)?;
            let src = m.str_bytes(&src);
            let obj = m.arena.string_obj(&name, true)?;
            m.arena.set_string(&obj, &src)
        }
        _ => Err(BasicError::Syntax(0)),
    }
}

/// `A$(i)=...` / `A$(i,j)=...`: write into the string, extending the
/// length up to capacity
fn substring_store(
    m: &mut Machine,
    name: &crate::tokens::Name,
    i: i32,
    j: Option<i32>,
    src: &[u8],
) -> BasicResult<()> {
    if i < 1 {
        return Err(BasicError::Range);
    }
    let obj = m.arena.string_obj(name, true)?;
    let len = m.arena.str_len(&obj);
    let cap = m.arena.str_cap(&obj);
    let start = (i - 1) as usize;
    let mut count = src.len();
    if let Some(j) = j {
        if j < i {
            return Err(BasicError::Range);
        }
        count = count.min((j - i + 1) as usize);
    }
    if start + count > cap {
        return Err(BasicError::Range);
    }
    let data = m.arena.str_data(&obj);
    m.arena.write_bytes(data + start, &src[..count]);
    if start + count > len {
        m.arena.write_u16(obj.payload, (start + count) as u16);
    }
    Ok(())
}

/// `MID$(A$,i[,n]) = s$` and friends replace characters in place; the
/// string's length never changes
pub fn cmd_str_inplace(m: &mut Machine, host: &mut dyn Host, which: u8) -> BasicResult<()> {
    m.expect(b'(')?;
    if m.getb() != lit::STRVAR {
        return Err(BasicError::Syntax(0));
    }
    let name = m.get_name();
    m.expect(b',')?;
    let a = int_expr(m, host)?;
    let b = if m.accept(b',') {
        Some(int_expr(m, host)?)
    } else {
        None
    };
    m.expect(b')')?;
    m.expect(b'=')?;
    let src = str_expr(m, host)?;
    let src = m.str_bytes(&src);

    let obj = m.arena.string_obj(&name, false)?;
    let len = m.arena.str_len(&obj);
    let data = m.arena.str_data(&obj);

    let (start, mut count) = match which {
        func::MIDS => substring(len, a, b.map(|n| a.saturating_add(n).saturating_sub(1)))?,
        func::LEFTS => {
            if a < 0 || b.is_some() {
                return Err(BasicError::Range);
            }
            (0, (a as usize).min(len))
        }
        _ => {
            if a < 0 || b.is_some() {
                return Err(BasicError::Range);
            }
            let n = (a as usize).min(len);
            (len - n, n)
        }
    };
    count = count.min(src.len());
    m.arena.write_bytes(data + start, &src[..count]);
    Ok(())
}

/// DIM list: numeric arrays `A(n[,m])` and string capacities `A$(n)`
pub fn cmd_dim(m: &mut Machine, host: &mut dyn Host) -> BasicResult<()> {
    loop {
        match m.getb() {
            lit::ARRVAR => {
                let name = m.get_name();
                m.expect(b'(')?;
                let n1 = int_expr(m, host)?;
                let n2 = if m.accept(b',') {
                    int_expr(m, host)?
                } else {
                    0
                };
                m.expect(b')')?;
                if n1 < 1 || n2 < 0 || n1 > u16::MAX as i32 || n2 > u16::MAX as i32 {
                    return Err(BasicError::Range);
                }
                m.arena.dim_array(&name, n1 as u16, n2 as u16)?;
            }
            lit::STRVAR => {
                let name = m.get_name();
                m.expect(b'(')?;
                let cap = int_expr(m, host)?;
                m.expect(b')')?;
                if cap < 1 || cap > u16::MAX as i32 {
                    return Err(BasicError::Range);
                }
                m.arena.dim_string(&name, cap as usize)?;
            }
            _ => return Err(BasicError::Syntax(0)),
        }
        if !m.accept(b',') {
            return Ok(());
        }
    }
}

/// CLR drops every variable and resets the run-time stacks
pub fn cmd_clr(m: &mut Machine) -> BasicResult<()> {
    m.arena.heap_clear();
    m.reset_run();
    Ok(())
}
