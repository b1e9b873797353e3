//! Error handler, timers and pin events
//!
//! ERROR GOTO arms the handler line; EVERY/AFTER arm the two timer
//! slots; EVENT subscribes a pin edge. All of them fire between
//! statements through the engine's poll.

use crate::error::{BasicError, BasicResult};
use crate::eval::int_expr;
use crate::host::Host;
use crate::state::{EdgeMode, Machine, PinEvent, Timer, MAX_EVENTS};
use crate::tokens::st;

/// ERROR GOTO n arms the handler; ERROR GOTO 0 disarms it
pub fn cmd_error(m: &mut Machine, host: &mut dyn Host) -> BasicResult<()> {
    m.expect(st::GOTO)?;
    let n = int_expr(m, host)?;
    m.err_handler = u16::try_from(n).map_err(|_| BasicError::Range)?;
    Ok(())
}

fn timer_args(m: &mut Machine, host: &mut dyn Host) -> BasicResult<(i32, u16)> {
    let ms = int_expr(m, host)?;
    m.expect(st::GOSUB)?;
    let n = int_expr(m, host)?;
    Ok((ms, u16::try_from(n).map_err(|_| BasicError::Range)?))
}

/// EVERY ms GOSUB n: periodic; a non-positive interval disarms
pub fn cmd_every(m: &mut Machine, host: &mut dyn Host) -> BasicResult<()> {
    let (ms, line) = timer_args(m, host)?;
    if ms <= 0 {
        m.every = Timer::default();
        return Ok(());
    }
    m.every = Timer {
        armed: true,
        interval: ms as u32,
        next: host.millis().wrapping_add(ms as u32),
        line,
        pending: false,
    };
    Ok(())
}

/// AFTER ms GOSUB n: one shot
pub fn cmd_after(m: &mut Machine, host: &mut dyn Host) -> BasicResult<()> {
    let (ms, line) = timer_args(m, host)?;
    if ms <= 0 {
        m.after = Timer::default();
        return Ok(());
    }
    m.after = Timer {
        armed: true,
        interval: ms as u32,
        next: host.millis().wrapping_add(ms as u32),
        line,
        pending: false,
    };
    Ok(())
}

/// EVENT pin, mode GOSUB n: subscribe a pin edge; re-arming a pin
/// replaces its subscription
pub fn cmd_event(m: &mut Machine, host: &mut dyn Host) -> BasicResult<()> {
    let pin = int_expr(m, host)?;
    let pin = u8::try_from(pin).map_err(|_| BasicError::Range)?;
    m.expect(b',')?;
    let mode = int_expr(m, host)?;
    let mode = u8::try_from(mode)
        .ok()
        .and_then(|v| EdgeMode::try_from(v).ok())
        .ok_or(BasicError::Range)?;
    m.expect(st::GOSUB)?;
    let n = int_expr(m, host)?;
    let line = u16::try_from(n).map_err(|_| BasicError::Range)?;

    let last = host.digital_read(pin)?;
    let ev = PinEvent {
        pin,
        mode,
        line,
        pending: false,
        last,
    };
    if let Some(slot) = m.events.iter_mut().find(|e| e.pin == pin) {
        *slot = ev;
        return Ok(());
    }
    if m.events.len() >= MAX_EVENTS {
        return Err(BasicError::Range);
    }
    m.events.push(ev);
    Ok(())
}
