//! Console statements
//!
//! PRINT, INPUT, GET, PUT, DELAY

use crate::error::{BasicError, BasicResult};
use crate::eval::{self, expression, int_expr};
use crate::host::{read_line, write_str, Host};
use crate::state::Machine;
use crate::tokens::{lit, EOL};
use crate::value::{format_number, Value};

pub fn cmd_print(m: &mut Machine, host: &mut dyn Host) -> BasicResult<()> {
    let mut newline = true;
    loop {
        match m.peek() {
            EOL | b':' => break,
            b';' => {
                m.skip(1);
                newline = false;
            }
            b',' => {
                m.skip(1);
                host.write_byte(b' ')?;
                newline = false;
            }
            _ => {
                let v = expression(m, host)?;
                match v {
                    Value::Str(r) => {
                        let bytes = m.str_bytes(&r);
                        for b in bytes {
                            host.write_byte(b)?;
                        }
                    }
                    _ => write_str(host, &format_number(&v))?,
                }
                newline = true;
            }
        }
    }
    if newline {
        host.write_byte(b'\n')?;
    }
    host.flush();
    Ok(())
}

/// INPUT ["prompt",] var[,var...]
pub fn cmd_input(m: &mut Machine, host: &mut dyn Host) -> BasicResult<()> {
    let mut prompt: Option<Vec<u8>> = None;
    if m.peek() == lit::STR {
        m.skip(1);
        let r = m.get_str_ref();
        prompt = Some(m.str_bytes(&r));
        if !m.accept(b',') {
            m.accept(b';');
        }
    }
    let mut first = true;
    loop {
        match (&prompt, first) {
            (Some(p), true) => {
                for &b in p {
                    host.write_byte(b)?;
                }
            }
            _ => write_str(host, "? ")?,
        }
        host.flush();
        first = false;

        let tag = m.getb();
        match tag {
            lit::VAR => {
                let name = m.get_name();
                let text = read_line(host)?;
                let v = eval::parse_val(m, text.as_bytes());
                m.arena.set_var(&name, &v)?;
            }
            lit::STRVAR => {
                let name = m.get_name();
                let text = read_line(host)?;
                let obj = m.arena.string_obj(&name, true)?;
                m.arena.set_string(&obj, text.as_bytes())?;
            }
            lit::ARRVAR => {
                let name = m.get_name();
                let (i, j) = eval::array_indices(m, host)?;
                let text = read_line(host)?;
                let v = eval::parse_val(m, text.as_bytes());
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

/// GET var: one console byte without blocking, 0 when none is ready
pub fn cmd_get(m: &mut Machine, host: &mut dyn Host) -> BasicResult<()> {
    let b = if host.available() > 0 {
        host.read_byte()?
    } else {
        0
    };
    match m.getb() {
        lit::VAR => {
            let name = m.get_name();
            m.arena.set_var(&name, &Value::Int(b as i32))
        }
        lit::STRVAR => {
            let name = m.get_name();
            let obj = m.arena.string_obj(&name, true)?;
            if b == 0 {
                m.arena.set_string(&obj, b"")
            } else {
                m.arena.set_string(&obj, &[b])
            }
        }
        _ => Err(BasicError::Syntax(0)),
    }
}

/// PUT expr[,expr...]: raw console bytes
pub fn cmd_put(m: &mut Machine, host: &mut dyn Host) -> BasicResult<()> {
    loop {
        let n = int_expr(m, host)?;
        let b = u8::try_from(n).map_err(|_| BasicError::Range)?;
        host.write_byte(b)?;
        if !m.accept(b',') {
            host.flush();
            return Ok(());
        }
    }
}

pub fn cmd_delay(m: &mut Machine, host: &mut dyn Host) -> BasicResult<()> {
    let ms = int_expr(m, host)?;
    if ms > 0 {
        host.delay(ms as u32);
    }
    Ok(())
}
