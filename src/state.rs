//! Interpreter state
//!
//! [`Machine`] owns the arena, the control stacks, the runtime
//! settings and the event tables, and exposes the token-stream readers
//! the evaluator and the statement handlers consume.

use bitflags::bitflags;
use num_enum::TryFromPrimitive;

use crate::arena::{Arena, DEFAULT_MEMSIZE};
use crate::error::{BasicError, BasicResult};
use crate::program::LINE_HDR;
use crate::tokens::{self, token_len, Name, NAME_LEN};
use crate::value::{StrRef, StrSrc, Value};

/// GOSUB nesting limit
pub const MAX_GOSUB_DEPTH: usize = 16;
/// Loop/switch nesting limit
pub const MAX_LOOP_DEPTH: usize = 16;
/// Expression recursion limit
pub const MAX_EXPR_DEPTH: usize = 64;
/// Pin-event subscription limit
pub const MAX_EVENTS: usize = 4;

bitflags! {
    /// Language subsets, checked once per dispatch. The maximal set is
    /// the default; a host may strip subsets and the engine then
    /// rejects their syntax cleanly.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Features: u32 {
        const FLOAT         = 1 << 0;
        const STRUCT        = 1 << 1;
        const MSSTRINGS     = 1 << 2;
        const FULLINSTR     = 1 << 3;
        const DARTMOUTH     = 1 << 4;
        const TIMERS        = 1 << 5;
        const EVENTS        = 1 << 6;
        const ERRORHANDLING = 1 << 7;
        const FILEIO        = 1 << 8;
        const NUMSYSTEM     = 1 << 9;
        const PINS          = 1 << 10;
    }
}

impl Default for Features {
    fn default() -> Self {
        Features::all()
    }
}

/// Runtime knobs written by SET; index numbers are part of the surface
#[derive(Debug, Clone)]
pub struct Settings {
    /// SET 0: debug level
    pub debug: u8,
    /// SET 19: -1 bitwise booleans, 1 C-style booleans
    pub bool_mode: i8,
    /// SET 20: substring access `A$(i,j)`
    pub substrings: bool,
    /// SET 21: array origin, 1 or 0
    pub array_origin: u8,
    /// SET 22: `^` associates right-to-left
    pub power_right: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: 0,
            bool_mode: -1,
            substrings: true,
            array_origin: 1,
            power_right: false,
        }
    }
}

/// Whether the token cursor walks the immediate buffer or the stored
/// program
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Int,
    Run,
}

/// GOSUB return point
#[derive(Debug, Clone, Copy)]
pub struct ReturnFrame {
    pub mode: RunMode,
    pub here: usize,
    pub line: u16,
}

/// One frame of the loop/switch stack
#[derive(Debug, Clone, Copy)]
pub enum LoopFrame {
    For {
        var: Name,
        /// Cached heap cell of the loop variable
        cell: usize,
        limit: Value,
        step: Value,
        mode: RunMode,
        here: usize,
        line: u16,
    },
    While {
        mode: RunMode,
        /// Position of the WHILE token itself, re-evaluated by WEND
        here: usize,
        line: u16,
    },
    Repeat {
        mode: RunMode,
        /// First statement of the body
        here: usize,
        line: u16,
    },
    Switch,
}

/// One EVERY or AFTER slot
#[derive(Debug, Clone, Copy, Default)]
pub struct Timer {
    pub armed: bool,
    pub interval: u32,
    pub next: u32,
    pub line: u16,
    pub pending: bool,
}

/// Pin edge selector for EVENT
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u8)]
pub enum EdgeMode {
    Falling = 0,
    Rising = 1,
    Change = 2,
}

/// One EVENT subscription
#[derive(Debug, Clone, Copy)]
pub struct PinEvent {
    pub pin: u8,
    pub mode: EdgeMode,
    pub line: u16,
    pub pending: bool,
    pub last: u8,
}

/// DATA read cursor
#[derive(Debug, Clone, Copy, Default)]
pub struct DataCursor {
    /// Program offset to resume from
    pub pos: usize,
    /// Inside a DATA statement, positioned at the next datum
    pub inside: bool,
}

/// Complete interpreter state
pub struct Machine {
    pub arena: Arena,
    pub cache: crate::program::LineCache,
    pub features: Features,
    pub settings: Settings,

    /// Tokenized immediate line
    pub ibuf: Vec<u8>,
    pub mode: RunMode,
    /// Token cursor into the active code
    pub here: usize,
    /// Start of the statement being dispatched
    pub stmt_start: usize,
    /// Current line number, 0 in immediate mode
    pub line: u16,
    pub halted: bool,

    pub gosub: Vec<ReturnFrame>,
    pub loops: Vec<LoopFrame>,
    pub data: DataCursor,
    pub expr_depth: usize,

    /// ERROR GOTO target, 0 disarmed
    pub err_handler: u16,
    /// Last caught error code, read through ERR
    pub err: i32,

    pub every: Timer,
    pub after: Timer,
    pub events: Vec<PinEvent>,
    /// An event handler is on the GOSUB stack
    pub in_handler: bool,
    /// GOSUB depth right after handler dispatch
    pub handler_base: usize,

    /// Per-statement temporary string pool
    pub temps: Vec<u8>,
    /// Nesting depth of multiline function bodies
    pub fn_depth: usize,
    /// FEND reached, unwind to the function call
    pub fn_returning: bool,
}

impl Default for Machine {
    fn default() -> Self {
        Self::new(DEFAULT_MEMSIZE)
    }
}

impl Machine {
    pub fn new(memsize: usize) -> Self {
        Self {
            arena: Arena::new(memsize),
            cache: crate::program::LineCache::new(),
            features: Features::default(),
            settings: Settings::default(),
            ibuf: Vec::new(),
            mode: RunMode::Int,
            here: 0,
            stmt_start: 0,
            line: 0,
            halted: false,
            gosub: Vec::new(),
            loops: Vec::new(),
            data: DataCursor::default(),
            expr_depth: 0,
            err_handler: 0,
            err: 0,
            every: Timer::default(),
            after: Timer::default(),
            events: Vec::new(),
            in_handler: false,
            handler_base: 0,
            temps: Vec::new(),
            fn_depth: 0,
            fn_returning: false,
        }
    }

    /// Reset the run-time state for a fresh RUN
    pub fn reset_run(&mut self) {
        self.gosub.clear();
        self.loops.clear();
        self.data = DataCursor::default();
        self.expr_depth = 0;
        self.err_handler = 0;
        self.err = 0;
        self.every = Timer::default();
        self.after = Timer::default();
        self.events.clear();
        self.in_handler = false;
        self.handler_base = 0;
        self.temps.clear();
        self.fn_depth = 0;
        self.fn_returning = false;
        self.halted = false;
    }

    // ========== Token stream ==========

    /// The active code: immediate buffer or stored program
    #[inline]
    pub fn code(&self) -> &[u8] {
        match self.mode {
            RunMode::Int => &self.ibuf,
            RunMode::Run => self.arena.prog(),
        }
    }

    #[inline]
    pub fn peek(&self) -> u8 {
        self.peek_at(self.here)
    }

    #[inline]
    pub fn peek_at(&self, pos: usize) -> u8 {
        self.code().get(pos).copied().unwrap_or(tokens::EOL)
    }

    /// Read one byte and advance
    #[inline]
    pub fn getb(&mut self) -> u8 {
        let b = self.peek();
        self.here += 1;
        b
    }

    #[inline]
    pub fn skip(&mut self, n: usize) {
        self.here += n;
    }

    /// Consume `tok` or fail with a syntax error
    pub fn expect(&mut self, tok: u8) -> BasicResult<()> {
        if self.peek() == tok {
            self.here += 1;
            Ok(())
        } else {
            Err(BasicError::Syntax(0))
        }
    }

    /// Consume `tok` if present
    pub fn accept(&mut self, tok: u8) -> bool {
        if self.peek() == tok {
            self.here += 1;
            true
        } else {
            false
        }
    }

    /// i16 literal payload (tag already consumed)
    pub fn get_i16(&mut self) -> i16 {
        let v = i16::from_le_bytes([self.peek_at(self.here), self.peek_at(self.here + 1)]);
        self.here += 2;
        v
    }

    /// i32 literal payload (tag already consumed)
    pub fn get_i32(&mut self) -> i32 {
        let mut b = [0u8; 4];
        for (k, slot) in b.iter_mut().enumerate() {
            *slot = self.peek_at(self.here + k);
        }
        self.here += 4;
        i32::from_le_bytes(b)
    }

    /// f64 literal payload (tag already consumed)
    pub fn get_f64(&mut self) -> f64 {
        let mut b = [0u8; 8];
        for (k, slot) in b.iter_mut().enumerate() {
            *slot = self.peek_at(self.here + k);
        }
        self.here += 8;
        f64::from_le_bytes(b)
    }

    /// Name record (tag already consumed)
    pub fn get_name(&mut self) -> Name {
        let mut n: Name = [0; NAME_LEN];
        for (k, slot) in n.iter_mut().enumerate() {
            *slot = self.peek_at(self.here + k);
        }
        self.here += NAME_LEN;
        n
    }

    /// String literal payload (tag already consumed); the descriptor
    /// points into the active code
    pub fn get_str_ref(&mut self) -> StrRef {
        let len = self.peek_at(self.here) as usize;
        let r = StrRef {
            src: StrSrc::Code,
            off: self.here + 1,
            len,
        };
        self.here += 1 + len;
        r
    }

    /// Length of the token at `pos`, payload included
    #[inline]
    pub fn token_len_at(&self, pos: usize) -> usize {
        token_len(self.code(), pos)
    }

    /// Step over the token at the cursor
    #[inline]
    pub fn advance_over_token(&mut self) {
        self.here += self.token_len_at(self.here);
    }

    /// Cursor sits on an end-of-line token: step into the next stored
    /// line, updating the current line number. Returns false at end of
    /// program or in immediate mode.
    pub fn cross_eol(&mut self) -> bool {
        if self.mode == RunMode::Int {
            return false;
        }
        let hdr = self.here + 1;
        if hdr + LINE_HDR > self.arena.top {
            return false;
        }
        self.line = self.arena.read_u16(hdr);
        self.here = hdr + LINE_HDR;
        true
    }

    /// Skip tokens up to, not over, the next `:` or end of line
    pub fn skip_statement(&mut self) {
        loop {
            match self.peek() {
                tokens::EOL | b':' => return,
                _ => self.advance_over_token(),
            }
        }
    }

    /// Scan forward for `close` at nesting depth zero, where any token
    /// in `open` deepens the nesting. Crosses line boundaries in Run
    /// mode. Leaves the cursor just past the closing token.
    pub fn scan_match(&mut self, open: &[u8], close: u8) -> BasicResult<()> {
        let mut depth = 0usize;
        loop {
            let t = self.peek();
            if t == tokens::EOL {
                if !self.cross_eol() {
                    return Err(BasicError::Syntax(0));
                }
                continue;
            }
            if open.contains(&t) {
                depth += 1;
            } else if t == close {
                if depth == 0 {
                    self.advance_over_token();
                    return Ok(());
                }
                depth -= 1;
            }
            self.advance_over_token();
        }
    }

    // ========== Control stacks ==========

    pub fn push_gosub(&mut self, frame: ReturnFrame) -> BasicResult<()> {
        if self.gosub.len() >= MAX_GOSUB_DEPTH {
            return Err(BasicError::StackError);
        }
        self.gosub.push(frame);
        Ok(())
    }

    pub fn pop_gosub(&mut self) -> BasicResult<ReturnFrame> {
        self.gosub.pop().ok_or(BasicError::ReturnWithoutGosub)
    }

    pub fn push_loop(&mut self, frame: LoopFrame) -> BasicResult<()> {
        if self.loops.len() >= MAX_LOOP_DEPTH {
            return Err(BasicError::StackError);
        }
        self.loops.push(frame);
        Ok(())
    }

    // ========== Strings ==========

    /// Copy a descriptor's bytes out of wherever they live
    pub fn str_bytes(&self, r: &StrRef) -> Vec<u8> {
        let take = |s: &[u8]| -> Vec<u8> {
            s.get(r.off..r.off + r.len).map(<[u8]>::to_vec).unwrap_or_default()
        };
        match r.src {
            StrSrc::Heap => self.arena.bytes(r.off, r.len).to_vec(),
            StrSrc::Code => take(self.code()),
            StrSrc::Temp => take(&self.temps),
        }
    }

    /// Park bytes in the per-statement temporary pool
    pub fn temp_str(&mut self, bytes: &[u8]) -> StrRef {
        let off = self.temps.len();
        self.temps.extend_from_slice(bytes);
        StrRef {
            src: StrSrc::Temp,
            off,
            len: bytes.len(),
        }
    }

    /// Comparison results and logical ops honor the boolean mode
    pub fn bool_value(&self, b: bool) -> Value {
        if b {
            Value::Int(if self.settings.bool_mode < 0 { -1 } else { 1 })
        } else {
            Value::Int(0)
        }
    }
}
