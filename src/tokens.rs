//! Token definitions for the engine
//!
//! Encoding:
//! - 0x00 terminates a line
//! - 0x01..0x0F tag literals and names, payload follows inline
//! - printable ASCII tokenizes as itself (`: ( ) , ; + - * / ^ = < >`)
//! - 0x11..0x15 are the two-character operators
//! - 0x80..0xFE are one-byte keywords
//! - 0xFF escapes to a second code byte for the long-token page
//!
//! Token values are fixed: a program tokenized on one host must load
//! byte-identical on every other.

/// End-of-line token
pub const EOL: u8 = 0x00;

/// Inline literals and name records
pub mod lit {
    /// 16-bit signed integer literal
    /// Format: NUM <i16 little-endian>
    pub const NUM: u8 = 0x01;

    /// 32-bit signed integer literal
    /// Format: LNUM <i32 little-endian>
    pub const LNUM: u8 = 0x02;

    /// IEEE-754 double literal
    /// Format: FNUM <f64 little-endian>
    pub const FNUM: u8 = 0x03;

    /// String literal, at most 255 bytes, no escapes
    /// Format: STR <len u8> <bytes>
    pub const STR: u8 = 0x04;

    /// Numeric scalar name
    /// Format: VAR <NAME_LEN bytes, zero padded, uppercased>
    pub const VAR: u8 = 0x05;

    /// String name (source spelling ends in `$`)
    /// Format: STRVAR <NAME_LEN bytes>
    pub const STRVAR: u8 = 0x06;

    /// Array name (identifier followed by `(`)
    /// Format: ARRVAR <NAME_LEN bytes>
    pub const ARRVAR: u8 = 0x07;
}

/// Two-character operators
pub mod op {
    /// `<=`
    pub const LE: u8 = 0x11;
    /// `>=`
    pub const GE: u8 = 0x12;
    /// `<>`
    pub const NE: u8 = 0x13;
    /// `<<`
    pub const SHL: u8 = 0x14;
    /// `>>`
    pub const SHR: u8 = 0x15;
}

/// Statement keywords
pub mod st {
    pub const PRINT: u8 = 0x80;
    pub const LET: u8 = 0x81;
    pub const INPUT: u8 = 0x82;
    pub const GOTO: u8 = 0x83;
    pub const GOSUB: u8 = 0x84;
    pub const RETURN: u8 = 0x85;
    pub const IF: u8 = 0x86;
    pub const THEN: u8 = 0x87;
    pub const ELSE: u8 = 0x88;
    pub const FOR: u8 = 0x89;
    pub const TO: u8 = 0x8A;
    pub const STEP: u8 = 0x8B;
    pub const NEXT: u8 = 0x8C;
    pub const STOP: u8 = 0x8D;
    pub const END: u8 = 0x8E;
    /// REM keeps the rest of the line as an inline payload
    /// Format: REM <len u8> <bytes>
    pub const REM: u8 = 0x8F;
    pub const LIST: u8 = 0x90;
    pub const NEW: u8 = 0x91;
    pub const RUN: u8 = 0x92;
    pub const CLR: u8 = 0x93;
    pub const SAVE: u8 = 0x94;
    pub const LOAD: u8 = 0x95;
    pub const DIR: u8 = 0x96;
    pub const DIM: u8 = 0x97;
    pub const DATA: u8 = 0x98;
    pub const READ: u8 = 0x99;
    pub const RESTORE: u8 = 0x9A;
    pub const DEF: u8 = 0x9B;
    pub const FN: u8 = 0x9C;
    pub const FEND: u8 = 0x9D;
    pub const ON: u8 = 0x9E;
    pub const ERROR: u8 = 0x9F;
    pub const EVERY: u8 = 0xA0;
    pub const AFTER: u8 = 0xA1;
    pub const EVENT: u8 = 0xA2;
    pub const WHILE: u8 = 0xA3;
    pub const WEND: u8 = 0xA4;
    pub const REPEAT: u8 = 0xA5;
    pub const UNTIL: u8 = 0xA6;
    pub const SWITCH: u8 = 0xA7;
    pub const CASE: u8 = 0xA8;
    pub const SWEND: u8 = 0xA9;
    pub const DO: u8 = 0xAA;
    pub const DEND: u8 = 0xAB;
    pub const SET: u8 = 0xAC;
    pub const GET: u8 = 0xAD;
    pub const PUT: u8 = 0xAE;
    pub const DELAY: u8 = 0xAF;
}

/// Word operators
pub mod word {
    pub const AND: u8 = 0xB0;
    pub const OR: u8 = 0xB1;
    pub const NOT: u8 = 0xB2;
    pub const MOD: u8 = 0xB3;
}

/// Builtin functions
pub mod func {
    pub const ABS: u8 = 0xC0;
    pub const SGN: u8 = 0xC1;
    pub const INT: u8 = 0xC2;
    pub const SQR: u8 = 0xC3;
    pub const POW: u8 = 0xC4;
    pub const RND: u8 = 0xC5;
    pub const MILLIS: u8 = 0xC6;
    pub const LEN: u8 = 0xC7;
    pub const VAL: u8 = 0xC8;
    pub const ASC: u8 = 0xC9;
    pub const INSTR: u8 = 0xCA;
    /// Pseudo-variable holding the last caught error code
    pub const ERR: u8 = 0xCB;
    pub const STRS: u8 = 0xCC;
    pub const CHRS: u8 = 0xCD;
    pub const LEFTS: u8 = 0xCE;
    pub const RIGHTS: u8 = 0xCF;
    pub const MIDS: u8 = 0xD0;
}

/// Long-token page, reached through the 0xFF escape byte.
/// The pin statements live here, outside the one-byte keyword range.
pub mod ext {
    /// Escape byte introducing a second code byte
    pub const PAGE: u8 = 0xFF;

    pub const PINM: u8 = 0x01;
    pub const DWRITE: u8 = 0x02;
    pub const AWRITE: u8 = 0x03;
    pub const DREAD: u8 = 0x04;
    pub const AREAD: u8 = 0x05;
}

/// Fixed width of a tokenized name record
pub const NAME_LEN: usize = 16;

/// A zero-padded, uppercased name record
pub type Name = [u8; NAME_LEN];

/// Build a name record from raw identifier bytes (already uppercased);
/// bytes beyond [`NAME_LEN`] are dropped silently
pub fn make_name(bytes: &[u8]) -> Name {
    let mut n: Name = [0; NAME_LEN];
    for (i, &b) in bytes.iter().take(NAME_LEN).enumerate() {
        n[i] = b;
    }
    n
}

/// Printable form of a name record
pub fn name_text(n: &Name) -> &str {
    let end = n.iter().position(|&b| b == 0).unwrap_or(NAME_LEN);
    core::str::from_utf8(&n[..end]).unwrap_or("?")
}

/// Keyword code: one byte for the main page, `0xFF00 | code` for the
/// long-token page
pub type Code = u16;

const fn page(code: u8) -> Code {
    0xFF00 | code as Code
}

/// Keyword spelling table, scanned for the longest match. Two-character
/// operators are included so `<=` beats `<`.
pub static KEYWORDS: &[(&str, Code)] = &[
    ("PRINT", st::PRINT as Code),
    ("LET", st::LET as Code),
    ("INPUT", st::INPUT as Code),
    ("GOTO", st::GOTO as Code),
    ("GOSUB", st::GOSUB as Code),
    ("RETURN", st::RETURN as Code),
    ("IF", st::IF as Code),
    ("THEN", st::THEN as Code),
    ("ELSE", st::ELSE as Code),
    ("FOR", st::FOR as Code),
    ("TO", st::TO as Code),
    ("STEP", st::STEP as Code),
    ("NEXT", st::NEXT as Code),
    ("STOP", st::STOP as Code),
    ("END", st::END as Code),
    ("REM", st::REM as Code),
    ("LIST", st::LIST as Code),
    ("NEW", st::NEW as Code),
    ("RUN", st::RUN as Code),
    ("CLR", st::CLR as Code),
    ("SAVE", st::SAVE as Code),
    ("LOAD", st::LOAD as Code),
    ("DIR", st::DIR as Code),
    ("DIM", st::DIM as Code),
    ("DATA", st::DATA as Code),
    ("READ", st::READ as Code),
    ("RESTORE", st::RESTORE as Code),
    ("DEF", st::DEF as Code),
    ("FN", st::FN as Code),
    ("FEND", st::FEND as Code),
    ("ON", st::ON as Code),
    ("ERROR", st::ERROR as Code),
    ("EVERY", st::EVERY as Code),
    ("AFTER", st::AFTER as Code),
    ("EVENT", st::EVENT as Code),
    ("WHILE", st::WHILE as Code),
    ("WEND", st::WEND as Code),
    ("REPEAT", st::REPEAT as Code),
    ("UNTIL", st::UNTIL as Code),
    ("SWITCH", st::SWITCH as Code),
    ("CASE", st::CASE as Code),
    ("SWEND", st::SWEND as Code),
    ("DO", st::DO as Code),
    ("DEND", st::DEND as Code),
    ("SET", st::SET as Code),
    ("GET", st::GET as Code),
    ("PUT", st::PUT as Code),
    ("DELAY", st::DELAY as Code),
    ("AND", word::AND as Code),
    ("OR", word::OR as Code),
    ("NOT", word::NOT as Code),
    ("MOD", word::MOD as Code),
    ("ABS", func::ABS as Code),
    ("SGN", func::SGN as Code),
    ("INT", func::INT as Code),
    ("SQR", func::SQR as Code),
    ("POW", func::POW as Code),
    ("RND", func::RND as Code),
    ("MILLIS", func::MILLIS as Code),
    ("LEN", func::LEN as Code),
    ("VAL", func::VAL as Code),
    ("ASC", func::ASC as Code),
    ("INSTR", func::INSTR as Code),
    ("ERR", func::ERR as Code),
    ("STR$", func::STRS as Code),
    ("CHR$", func::CHRS as Code),
    ("LEFT$", func::LEFTS as Code),
    ("RIGHT$", func::RIGHTS as Code),
    ("MID$", func::MIDS as Code),
    ("PINM", page(ext::PINM)),
    ("DWRITE", page(ext::DWRITE)),
    ("AWRITE", page(ext::AWRITE)),
    ("DREAD", page(ext::DREAD)),
    ("AREAD", page(ext::AREAD)),
    ("<=", op::LE as Code),
    (">=", op::GE as Code),
    ("<>", op::NE as Code),
    ("<<", op::SHL as Code),
    (">>", op::SHR as Code),
];

/// Reverse lookup for the detokenizer
pub fn keyword_text(code: Code) -> Option<&'static str> {
    KEYWORDS.iter().find(|(_, c)| *c == code).map(|(t, _)| *t)
}

/// Total byte length of the token starting at `pos`, payload included.
/// Returns 1 for a position past the end of `code`.
pub fn token_len(code: &[u8], pos: usize) -> usize {
    let Some(&t) = code.get(pos) else { return 1 };
    match t {
        lit::NUM => 3,
        lit::LNUM => 5,
        lit::FNUM => 9,
        lit::STR | st::REM => 2 + code.get(pos + 1).copied().unwrap_or(0) as usize,
        lit::VAR | lit::STRVAR | lit::ARRVAR => 1 + NAME_LEN,
        ext::PAGE => 2,
        _ => 1,
    }
}
