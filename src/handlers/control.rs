//! Control flow
//!
//! GOTO, GOSUB/RETURN, IF/THEN/ELSE (+ DO/DEND), FOR/NEXT, WHILE/WEND,
//! REPEAT/UNTIL, SWITCH/CASE/SWEND, ON, END, STOP

use crate::engine::jump_line;
use crate::error::{BasicError, BasicResult};
use crate::eval::{self, expression, int_expr};
use crate::host::Host;
use crate::state::{LoopFrame, Machine, ReturnFrame};
use crate::tokens::{lit, st, EOL};
use crate::value::{promote, NumPair, Value};

fn line_target(n: i32) -> BasicResult<u16> {
    u16::try_from(n).map_err(|_| BasicError::Range)
}

pub fn cmd_goto(m: &mut Machine, host: &mut dyn Host) -> BasicResult<()> {
    let n = line_target(int_expr(m, host)?)?;
    jump_line(m, n)
}

pub fn cmd_gosub(m: &mut Machine, host: &mut dyn Host) -> BasicResult<()> {
    let n = line_target(int_expr(m, host)?)?;
    m.push_gosub(ReturnFrame {
        mode: m.mode,
        here: m.here,
        line: m.line,
    })?;
    jump_line(m, n)
}

pub fn cmd_return(m: &mut Machine) -> BasicResult<()> {
    let f = m.pop_gosub()?;
    if m.in_handler && m.gosub.len() < m.handler_base {
        m.in_handler = false;
    }
    m.mode = f.mode;
    m.here = f.here;
    m.line = f.line;
    Ok(())
}

pub fn cmd_end(m: &mut Machine) -> BasicResult<()> {
    m.halted = true;
    Ok(())
}

/// IF expr [THEN] statement [ELSE statement], or THEN DO ... DEND with
/// an optional ELSE DO block
pub fn cmd_if(m: &mut Machine, host: &mut dyn Host) -> BasicResult<()> {
    let cond = expression(m, host)?.truthy()?;
    m.accept(st::THEN);
    if cond {
        // numbered THEN is a GOTO
        match m.peek() {
            lit::NUM => {
                m.skip(1);
                let n = m.get_i16();
                return jump_line(m, line_target(n as i32)?);
            }
            lit::LNUM => {
                m.skip(1);
                let n = m.get_i32();
                return jump_line(m, line_target(n)?);
            }
            _ => return Ok(()),
        }
    }
    // false: skip a DO block, or scan this line for an ELSE branch
    if m.peek() == st::DO {
        m.skip(1);
        m.scan_match(&[st::DO], st::DEND)?;
        if m.accept(st::ELSE) {
            m.accept(st::DO);
        }
        return Ok(());
    }
    loop {
        match m.peek() {
            EOL => return Ok(()),
            st::ELSE => {
                m.skip(1);
                m.accept(st::DO);
                return Ok(());
            }
            _ => m.advance_over_token(),
        }
    }
}

/// ELSE reached after an executed THEN branch: the rest of the line
/// belongs to the other arm
pub fn cmd_else(m: &mut Machine) -> BasicResult<()> {
    if m.peek() == st::DO {
        m.skip(1);
        return m.scan_match(&[st::DO], st::DEND);
    }
    while m.peek() != EOL {
        m.advance_over_token();
    }
    Ok(())
}

/// DEND after an executed DO block; a trailing ELSE block is skipped
pub fn cmd_dend(m: &mut Machine) -> BasicResult<()> {
    if m.accept(st::ELSE) {
        if m.accept(st::DO) {
            return m.scan_match(&[st::DO], st::DEND);
        }
        while m.peek() != EOL {
            m.advance_over_token();
        }
    }
    Ok(())
}

pub fn cmd_for(m: &mut Machine, host: &mut dyn Host) -> BasicResult<()> {
    if m.getb() != lit::VAR {
        return Err(BasicError::Syntax(0));
    }
    let var = m.get_name();
    m.expect(b'=')?;
    let from = expression(m, host)?;
    m.expect(st::TO)?;
    let limit = expression(m, host)?;
    let step = if m.accept(st::STEP) {
        expression(m, host)?
    } else {
        Value::Int(1)
    };
    let sign = step.signum()?;
    if sign == 0 {
        return Err(BasicError::Range);
    }

    let cell = m.arena.var_cell(&var)?;
    m.arena.write_cell(cell, &from)?;

    // zero iterations: jump straight behind the matching NEXT
    let ord = eval::compare(m, &from, &limit)?;
    let skip = (sign > 0 && ord == core::cmp::Ordering::Greater)
        || (sign < 0 && ord == core::cmp::Ordering::Less);
    if skip {
        m.scan_match(&[st::FOR], st::NEXT)?;
        if m.peek() == lit::VAR {
            m.advance_over_token();
        }
        return Ok(());
    }

    m.push_loop(LoopFrame::For {
        var,
        cell,
        limit,
        step,
        mode: m.mode,
        here: m.here,
        line: m.line,
    })
}

pub fn cmd_next(m: &mut Machine) -> BasicResult<()> {
    let wanted = if m.peek() == lit::VAR {
        m.skip(1);
        Some(m.get_name())
    } else {
        None
    };

    // a named NEXT unwinds unfinished inner loops
    let frame = loop {
        let Some(top) = m.loops.last().copied() else {
            return Err(BasicError::NextWithoutFor);
        };
        match top {
            LoopFrame::For { var, .. } => {
                if wanted.map_or(true, |w| w == var) {
                    break top;
                }
                m.loops.pop();
            }
            _ => return Err(BasicError::NextWithoutFor),
        }
    };
    let LoopFrame::For {
        cell,
        limit,
        step,
        mode,
        here,
        line,
        ..
    } = frame
    else {
        return Err(BasicError::NextWithoutFor);
    };

    let v = m.arena.read_cell(cell);
    let v = match promote(&v, &step)? {
        NumPair::Ints(a, b) => Value::Int(a.wrapping_add(b)),
        NumPair::Floats(a, b) => Value::Float(a + b),
    };
    m.arena.write_cell(cell, &v)?;

    let sign = step.signum()?;
    let ord = eval::compare(m, &v, &limit)?;
    let done = (sign > 0 && ord == core::cmp::Ordering::Greater)
        || (sign < 0 && ord == core::cmp::Ordering::Less);
    if done {
        m.loops.pop();
    } else {
        m.mode = mode;
        m.here = here;
        m.line = line;
    }
    Ok(())
}

pub fn cmd_while(m: &mut Machine, host: &mut dyn Host) -> BasicResult<()> {
    let head = (m.mode, m.stmt_start, m.line);
    let cond = expression(m, host)?.truthy()?;
    if cond {
        m.push_loop(LoopFrame::While {
            mode: head.0,
            here: head.1,
            line: head.2,
        })
    } else {
        m.scan_match(&[st::WHILE], st::WEND)
    }
}

pub fn cmd_wend(m: &mut Machine) -> BasicResult<()> {
    match m.loops.pop() {
        Some(LoopFrame::While { mode, here, line }) => {
            m.mode = mode;
            m.here = here;
            m.line = line;
            Ok(())
        }
        Some(other) => {
            m.loops.push(other);
            Err(BasicError::Syntax(0))
        }
        None => Err(BasicError::Syntax(0)),
    }
}

pub fn cmd_repeat(m: &mut Machine) -> BasicResult<()> {
    m.push_loop(LoopFrame::Repeat {
        mode: m.mode,
        here: m.here,
        line: m.line,
    })
}

pub fn cmd_until(m: &mut Machine, host: &mut dyn Host) -> BasicResult<()> {
    let cond = expression(m, host)?.truthy()?;
    match m.loops.last().copied() {
        Some(LoopFrame::Repeat { mode, here, line }) => {
            if cond {
                m.loops.pop();
            } else {
                m.mode = mode;
                m.here = here;
                m.line = line;
            }
            Ok(())
        }
        _ => Err(BasicError::Syntax(0)),
    }
}

/// SWITCH: evaluate the selector, then enter the first CASE whose value
/// list matches; no match falls out behind SWEND
pub fn cmd_switch(m: &mut Machine, host: &mut dyn Host) -> BasicResult<()> {
    let sel = expression(m, host)?;
    m.push_loop(LoopFrame::Switch)?;
    let mut depth = 0usize;
    loop {
        match m.peek() {
            EOL => {
                if !m.cross_eol() {
                    return Err(BasicError::Syntax(0));
                }
            }
            st::SWITCH => {
                depth += 1;
                m.skip(1);
            }
            st::SWEND => {
                m.skip(1);
                if depth == 0 {
                    m.loops.pop();
                    return Ok(());
                }
                depth -= 1;
            }
            st::CASE if depth == 0 => {
                m.skip(1);
                let mut hit = false;
                loop {
                    let v = expression(m, host)?;
                    if eval::compare(m, &sel, &v)? == core::cmp::Ordering::Equal {
                        hit = true;
                    }
                    if !m.accept(b',') {
                        break;
                    }
                }
                if hit {
                    return Ok(());
                }
            }
            _ => m.advance_over_token(),
        }
    }
}

/// CASE reached at the end of an executed arm: leave the switch
pub fn cmd_case(m: &mut Machine) -> BasicResult<()> {
    m.scan_match(&[st::SWITCH], st::SWEND)?;
    if matches!(m.loops.last(), Some(LoopFrame::Switch)) {
        m.loops.pop();
        Ok(())
    } else {
        Err(BasicError::Syntax(0))
    }
}

pub fn cmd_swend(m: &mut Machine) -> BasicResult<()> {
    if matches!(m.loops.last(), Some(LoopFrame::Switch)) {
        m.loops.pop();
        Ok(())
    } else {
        Err(BasicError::Syntax(0))
    }
}

/// ON expr GOTO/GOSUB n1,n2,...: 1-based selector, out of range falls
/// through
pub fn cmd_on(m: &mut Machine, host: &mut dyn Host) -> BasicResult<()> {
    let sel = int_expr(m, host)?;
    let is_gosub = match m.getb() {
        st::GOTO => false,
        st::GOSUB => true,
        _ => return Err(BasicError::Syntax(0)),
    };
    let mut targets = Vec::new();
    loop {
        targets.push(line_target(int_expr(m, host)?)?);
        if !m.accept(b',') {
            break;
        }
    }
    if sel < 1 || sel as usize > targets.len() {
        return Ok(());
    }
    let n = targets[sel as usize - 1];
    if is_gosub {
        m.push_gosub(ReturnFrame {
            mode: m.mode,
            here: m.here,
            line: m.line,
        })?;
    }
    jump_line(m, n)
}
