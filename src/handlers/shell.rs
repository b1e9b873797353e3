//! Interactive surface
//!
//! LIST, RUN, NEW, SAVE/LOAD, DIR and the SET knob table

use crate::error::{BasicError, BasicResult};
use crate::eval::{expression, int_expr};
use crate::host::{write_str, FileMode, Host};
use crate::program::{self, LINE_HDR};
use crate::state::{Machine, RunMode};
use crate::tokenizer::tokenize;
use crate::tokens::EOL;
use crate::value::Value;

/// LIST [a[,b]] in ascending line order
pub fn cmd_list(m: &mut Machine, host: &mut dyn Host) -> BasicResult<()> {
    let (from, to) = if matches!(m.peek(), EOL | b':') {
        (0u16, u16::MAX)
    } else {
        let a = u16::try_from(int_expr(m, host)?).map_err(|_| BasicError::Range)?;
        if m.accept(b',') {
            let b = u16::try_from(int_expr(m, host)?).map_err(|_| BasicError::Range)?;
            (a, b)
        } else {
            (a, a)
        }
    };
    let mut out = String::new();
    for (line, off, len) in program::lines(&m.arena) {
        if line >= from && line <= to {
            out.push_str(&program::list_line(&m.arena, line, off, len));
            out.push('\n');
        }
    }
    write_str(host, &out)?;
    host.flush();
    Ok(())
}

/// RUN [line]: clear variables, rewind state, start executing
pub fn cmd_run(m: &mut Machine, host: &mut dyn Host) -> BasicResult<()> {
    let start = if matches!(m.peek(), EOL | b':') {
        None
    } else {
        Some(u16::try_from(int_expr(m, host)?).map_err(|_| BasicError::Range)?)
    };
    m.arena.heap_clear();
    m.reset_run();
    match start {
        Some(n) => crate::engine::jump_line(m, n),
        None => {
            if m.arena.top == 0 {
                m.halted = true;
                return Ok(());
            }
            m.mode = RunMode::Run;
            m.line = m.arena.read_u16(0);
            m.here = LINE_HDR;
            Ok(())
        }
    }
}

pub fn cmd_new(m: &mut Machine) -> BasicResult<()> {
    let was_running = m.mode == RunMode::Run;
    m.arena.prog_clear();
    m.arena.heap_clear();
    m.cache.clear();
    m.reset_run();
    if was_running {
        m.halted = true;
        m.mode = RunMode::Int;
    }
    Ok(())
}

fn file_name(m: &mut Machine, host: &mut dyn Host) -> BasicResult<String> {
    if matches!(m.peek(), EOL | b':') {
        return Ok("file.bas".to_string());
    }
    match expression(m, host)? {
        Value::Str(r) => Ok(String::from_utf8_lossy(&m.str_bytes(&r)).into_owned()),
        _ => Err(BasicError::TypeMismatch),
    }
}

/// SAVE ["name"]: detokenized source, one line per record
pub fn cmd_save(m: &mut Machine, host: &mut dyn Host) -> BasicResult<()> {
    let name = file_name(m, host)?;
    let handle = host.open(&name, FileMode::Write)?;
    let mut r = Ok(());
    'lines: for (line, off, len) in program::lines(&m.arena) {
        let text = program::list_line(&m.arena, line, off, len);
        for &b in text.as_bytes() {
            if let Err(e) = host.file_write(handle, b) {
                r = Err(e);
                break 'lines;
            }
        }
        if let Err(e) = host.file_write(handle, b'\n') {
            r = Err(e);
            break;
        }
    }
    host.close(handle);
    r
}

/// LOAD ["name"]: NEW, then re-tokenize and store every numbered line
pub fn cmd_load(m: &mut Machine, host: &mut dyn Host) -> BasicResult<()> {
    let name = file_name(m, host)?;
    let handle = host.open(&name, FileMode::Read)?;
    cmd_new(m)?;
    let mut buf: Vec<u8> = Vec::new();
    let mut result = Ok(());
    loop {
        let b = match host.file_read(handle) {
            Ok(b) => b,
            Err(e) => {
                result = Err(e);
                break;
            }
        };
        match b {
            Some(b'\r') => {}
            Some(b'\n') | None => {
                let text = String::from_utf8_lossy(&buf).into_owned();
                buf.clear();
                if !text.trim().is_empty() {
                    match tokenize(&text, m.features) {
                        Ok((Some(n), payload)) => {
                            if let Err(e) =
                                program::store_line(&mut m.arena, &mut m.cache, n, &payload)
                            {
                                result = Err(e);
                                break;
                            }
                        }
                        // unnumbered records in a file are ignored
                        Ok((None, _)) => {}
                        Err(e) => {
                            result = Err(e);
                            break;
                        }
                    }
                }
                if b.is_none() {
                    break;
                }
            }
            Some(other) => buf.push(other),
        }
    }
    host.close(handle);
    result
}

/// DIR: host directory listing
pub fn cmd_dir(_m: &mut Machine, host: &mut dyn Host) -> BasicResult<()> {
    let entries = host.dir()?;
    let mut out = String::new();
    for (name, size) in entries {
        out.push_str(&name);
        out.push(' ');
        out.push_str(&size.to_string());
        out.push('\n');
    }
    write_str(host, &out)?;
    host.flush();
    Ok(())
}

/// SET n, v writes one runtime knob; unknown indices are ignored
pub fn cmd_set(m: &mut Machine, host: &mut dyn Host) -> BasicResult<()> {
    let n = int_expr(m, host)?;
    m.expect(b',')?;
    let v = int_expr(m, host)?;
    match n {
        0 => m.settings.debug = v.clamp(0, 255) as u8,
        19 => m.settings.bool_mode = if v < 0 { -1 } else { 1 },
        20 => m.settings.substrings = v != 0,
        21 => {
            if v == 0 || v == 1 {
                m.settings.array_origin = v as u8;
            }
        }
        22 => m.settings.power_right = v != 0,
        _ => {}
    }
    Ok(())
}
