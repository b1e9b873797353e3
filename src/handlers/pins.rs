//! Pin statements from the long-token page
//!
//! Thin wrappers over the host pin callbacks; DREAD/AREAD live in the
//! evaluator as functions.

use crate::error::{BasicError, BasicResult};
use crate::eval::int_expr;
use crate::host::Host;
use crate::state::Machine;

fn pin_and_value(m: &mut Machine, host: &mut dyn Host) -> BasicResult<(u8, i32)> {
    let pin = int_expr(m, host)?;
    let pin = u8::try_from(pin).map_err(|_| BasicError::Range)?;
    m.expect(b',')?;
    let v = int_expr(m, host)?;
    Ok((pin, v))
}

/// PINM pin, mode (0 input, anything else output)
pub fn cmd_pinm(m: &mut Machine, host: &mut dyn Host) -> BasicResult<()> {
    let (pin, mode) = pin_and_value(m, host)?;
    host.pin_mode(pin, mode != 0)
}

pub fn cmd_dwrite(m: &mut Machine, host: &mut dyn Host) -> BasicResult<()> {
    let (pin, v) = pin_and_value(m, host)?;
    host.digital_write(pin, (v != 0) as u8)
}

pub fn cmd_awrite(m: &mut Machine, host: &mut dyn Host) -> BasicResult<()> {
    let (pin, v) = pin_and_value(m, host)?;
    host.analog_write(pin, v)
}
