//! Execution engine
//!
//! Fetch/dispatch loop over the token stream, the between-statement
//! event poll, and the top-level checkpoint that turns propagated
//! errors into an ERROR GOTO transfer or a console message.

use crate::error::{BasicError, BasicResult};
use crate::handlers;
use crate::host::{write_str, Host};
use crate::program::{self, LINE_HDR};
use crate::state::{EdgeMode, Features, Machine, ReturnFrame, RunMode};
use crate::tokenizer::tokenize;
use crate::tokens::{ext, func, lit, st, EOL};

/// Transfer control to a stored line
pub fn jump_line(m: &mut Machine, line: u16) -> BasicResult<()> {
    let off = program::find_line_cached(&m.arena, &mut m.cache, line)
        .ok_or(BasicError::Undefined)?;
    m.mode = RunMode::Run;
    m.line = line;
    m.here = off + LINE_HDR;
    Ok(())
}

/// Execute one statement (or line transition) at the cursor
pub fn step(m: &mut Machine, host: &mut dyn Host) -> BasicResult<()> {
    if m.mode == RunMode::Run {
        poll(m, host)?;
    }
    // temporaries live for one top-level statement
    if m.expr_depth == 0 {
        m.temps.clear();
    }
    m.stmt_start = m.here;
    let t = m.getb();
    match t {
        EOL => {
            m.here -= 1;
            if !m.cross_eol() {
                m.halted = true;
            }
            Ok(())
        }
        b':' => Ok(()),
        _ => dispatch(m, host, t),
    }
}

fn gate(m: &Machine, f: Features) -> BasicResult<()> {
    if m.features.contains(f) {
        Ok(())
    } else {
        Err(BasicError::UnknownStatement)
    }
}

/// Dispatch one statement on its leading token
fn dispatch(m: &mut Machine, host: &mut dyn Host, t: u8) -> BasicResult<()> {
    match t {
        // ========== Assignment ==========
        st::LET => handlers::cmd_let(m, host),
        lit::VAR | lit::STRVAR | lit::ARRVAR => handlers::cmd_assign(m, host, t),
        func::MIDS | func::LEFTS | func::RIGHTS => {
            gate(m, Features::MSSTRINGS)?;
            handlers::cmd_str_inplace(m, host, t)
        }
        st::DIM => handlers::cmd_dim(m, host),
        st::CLR => handlers::cmd_clr(m),

        // ========== Console ==========
        st::PRINT => handlers::cmd_print(m, host),
        st::INPUT => handlers::cmd_input(m, host),
        st::GET => handlers::cmd_get(m, host),
        st::PUT => handlers::cmd_put(m, host),
        st::DELAY => handlers::cmd_delay(m, host),

        // ========== Control Flow ==========
        st::GOTO => handlers::cmd_goto(m, host),
        st::GOSUB => handlers::cmd_gosub(m, host),
        st::RETURN => handlers::cmd_return(m),
        st::IF => handlers::cmd_if(m, host),
        st::ELSE => handlers::cmd_else(m),
        st::FOR => handlers::cmd_for(m, host),
        st::NEXT => handlers::cmd_next(m),
        st::END | st::STOP => handlers::cmd_end(m),
        st::REM => {
            let len = m.peek() as usize;
            m.skip(1 + len);
            Ok(())
        }

        // ========== Structured set ==========
        st::WHILE => {
            gate(m, Features::STRUCT)?;
            handlers::cmd_while(m, host)
        }
        st::WEND => {
            gate(m, Features::STRUCT)?;
            handlers::cmd_wend(m)
        }
        st::REPEAT => {
            gate(m, Features::STRUCT)?;
            handlers::cmd_repeat(m)
        }
        st::UNTIL => {
            gate(m, Features::STRUCT)?;
            handlers::cmd_until(m, host)
        }
        st::SWITCH => {
            gate(m, Features::STRUCT)?;
            handlers::cmd_switch(m, host)
        }
        st::CASE => {
            gate(m, Features::STRUCT)?;
            handlers::cmd_case(m)
        }
        st::SWEND => {
            gate(m, Features::STRUCT)?;
            handlers::cmd_swend(m)
        }
        st::DO => gate(m, Features::STRUCT),
        st::DEND => {
            gate(m, Features::STRUCT)?;
            handlers::cmd_dend(m)
        }

        // ========== Dartmouth set ==========
        st::DATA => {
            gate(m, Features::DARTMOUTH)?;
            handlers::cmd_data(m)
        }
        st::READ => {
            gate(m, Features::DARTMOUTH)?;
            handlers::cmd_read(m, host)
        }
        st::RESTORE => {
            gate(m, Features::DARTMOUTH)?;
            handlers::cmd_restore(m, host)
        }
        st::DEF => {
            gate(m, Features::DARTMOUTH)?;
            handlers::cmd_def(m)
        }
        st::FEND => {
            gate(m, Features::DARTMOUTH)?;
            handlers::cmd_fend(m)
        }
        st::ON => {
            gate(m, Features::DARTMOUTH)?;
            handlers::cmd_on(m, host)
        }

        // ========== Errors, timers, events ==========
        st::ERROR => {
            gate(m, Features::ERRORHANDLING)?;
            handlers::cmd_error(m, host)
        }
        st::EVERY => {
            gate(m, Features::TIMERS)?;
            handlers::cmd_every(m, host)
        }
        st::AFTER => {
            gate(m, Features::TIMERS)?;
            handlers::cmd_after(m, host)
        }
        st::EVENT => {
            gate(m, Features::EVENTS)?;
            handlers::cmd_event(m, host)
        }

        // ========== Shell ==========
        st::SET => handlers::cmd_set(m, host),
        st::LIST => handlers::cmd_list(m, host),
        st::RUN => handlers::cmd_run(m, host),
        st::NEW => handlers::cmd_new(m),
        st::SAVE => {
            gate(m, Features::FILEIO)?;
            handlers::cmd_save(m, host)
        }
        st::LOAD => {
            gate(m, Features::FILEIO)?;
            handlers::cmd_load(m, host)
        }
        st::DIR => {
            gate(m, Features::FILEIO)?;
            handlers::cmd_dir(m, host)
        }

        // ========== Long-token page ==========
        ext::PAGE => {
            let t2 = m.getb();
            gate(m, Features::PINS)?;
            match t2 {
                ext::PINM => handlers::cmd_pinm(m, host),
                ext::DWRITE => handlers::cmd_dwrite(m, host),
                ext::AWRITE => handlers::cmd_awrite(m, host),
                _ => Err(BasicError::UnknownStatement),
            }
        }

        t if t >= 0x80 => Err(BasicError::UnknownStatement),
        _ => Err(BasicError::Syntax(0)),
    }
}

/// Between-statement poll: break, clock, timers, pin edges, then at
/// most one implicit GOSUB when no handler is active
fn poll(m: &mut Machine, host: &mut dyn Host) -> BasicResult<()> {
    if host.break_requested() {
        return Err(BasicError::Break);
    }
    let now = host.millis();

    if m.features.contains(Features::TIMERS) {
        if m.after.armed && now.wrapping_sub(m.after.next) as i32 >= 0 {
            m.after.armed = false;
            m.after.pending = true;
        }
        if m.every.armed && now.wrapping_sub(m.every.next) as i32 >= 0 {
            m.every.pending = true;
            m.every.next = now.wrapping_add(m.every.interval);
        }
    }

    if m.features.contains(Features::EVENTS) {
        for k in 0..m.events.len() {
            let ev = m.events[k];
            if let Ok(cur) = host.digital_read(ev.pin) {
                let fire = match ev.mode {
                    EdgeMode::Rising => ev.last == 0 && cur != 0,
                    EdgeMode::Falling => ev.last != 0 && cur == 0,
                    EdgeMode::Change => cur != ev.last,
                };
                m.events[k].last = cur;
                if fire {
                    m.events[k].pending = true;
                }
            }
        }
    }

    if !m.in_handler {
        let target = if m.after.pending {
            m.after.pending = false;
            Some(m.after.line)
        } else if m.every.pending {
            m.every.pending = false;
            Some(m.every.line)
        } else {
            m.events.iter_mut().find(|e| e.pending).map(|e| {
                e.pending = false;
                e.line
            })
        };
        if let Some(line) = target {
            m.push_gosub(ReturnFrame {
                mode: m.mode,
                here: m.here,
                line: m.line,
            })?;
            m.in_handler = true;
            m.handler_base = m.gosub.len();
            jump_line(m, line)?;
        }
    }
    Ok(())
}

/// Run statements until the machine halts; the single checkpoint all
/// errors unwind to
pub fn exec(m: &mut Machine, host: &mut dyn Host) -> BasicResult<()> {
    loop {
        if m.halted {
            return Ok(());
        }
        if let Err(e) = step(m, host) {
            let armed = m.err_handler;
            if e.is_catchable()
                && armed != 0
                && m.mode == RunMode::Run
                && m.features.contains(Features::ERRORHANDLING)
            {
                m.err = e.code() as i32;
                m.gosub.clear();
                m.loops.clear();
                m.in_handler = false;
                m.expr_depth = 0;
                m.fn_depth = 0;
                m.fn_returning = false;
                // disarm so a failing handler cannot loop; it may re-arm
                m.err_handler = 0;
                if jump_line(m, armed).is_ok() {
                    continue;
                }
            }
            return Err(e);
        }
    }
}

/// Feed one source line from the prompt: numbered lines edit the
/// program, unnumbered lines execute immediately. Errors are reported
/// on the console and also returned.
pub fn enter(m: &mut Machine, host: &mut dyn Host, src: &str) -> BasicResult<()> {
    let (line, payload) = match tokenize(src, m.features) {
        Ok(x) => x,
        Err(e) => {
            report(m, host, &e);
            return Err(e);
        }
    };
    match line {
        Some(n) => {
            // a bare line number deletes
            let r = if payload.len() <= 1 {
                program::delete_line(&mut m.arena, &mut m.cache, n);
                Ok(())
            } else {
                program::store_line(&mut m.arena, &mut m.cache, n, &payload)
            };
            if let Err(e) = r {
                report(m, host, &e);
                return Err(e);
            }
            Ok(())
        }
        None => {
            if payload.len() <= 1 {
                return Ok(());
            }
            m.ibuf = payload;
            m.mode = RunMode::Int;
            m.here = 0;
            m.line = 0;
            m.halted = false;
            m.expr_depth = 0;
            m.fn_depth = 0;
            m.fn_returning = false;
            m.temps.clear();
            if let Err(e) = exec(m, host) {
                report(m, host, &e);
                return Err(e);
            }
            Ok(())
        }
    }
}

/// Console error message; running programs name the offending line
fn report(m: &Machine, host: &mut dyn Host, e: &BasicError) {
    let msg = if m.mode == RunMode::Run && m.line > 0 {
        format!("{} in line {}\n", e, m.line)
    } else {
        format!("{}\n", e)
    };
    let _ = write_str(host, &msg);
    host.flush();
}
