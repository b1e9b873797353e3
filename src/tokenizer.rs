//! Tokenizer and detokenizer
//!
//! A source line becomes a compact token buffer: keywords shrink to one
//! byte (two on the long-token page), literals carry their value
//! inline, names become fixed-width uppercased records. The
//! detokenizer renders a buffer back to canonical source; re-tokenizing
//! that output yields byte-identical tokens.

use crate::error::{BasicError, BasicResult};
use crate::state::Features;
use crate::tokens::{self, ext, lit, make_name, op, st, token_len, Code, KEYWORDS};
use crate::value::{format_number, Value};

/// Longest token payload a stored line may carry
pub const MAX_PAYLOAD: usize = 255;

/// Tokenize one source line. Returns the leading line number, if any,
/// and the token bytes (always terminated by [`tokens::EOL`]). A line
/// number of zero counts as immediate input, per the stored-line model.
pub fn tokenize(src: &str, features: Features) -> BasicResult<(Option<u16>, Vec<u8>)> {
    let s = src.trim_end_matches(['\r', '\n']).as_bytes();
    let mut out = Vec::with_capacity(s.len() + 1);
    let mut i = 0usize;

    skip_blank(s, &mut i);

    // optional leading line number
    let mut line = None;
    if i < s.len() && s[i].is_ascii_digit() {
        let start = i;
        let mut n: u32 = 0;
        while i < s.len() && s[i].is_ascii_digit() {
            n = n * 10 + (s[i] - b'0') as u32;
            if n > u16::MAX as u32 {
                return Err(BasicError::Syntax(col(start)));
            }
            i += 1;
        }
        if n > 0 {
            line = Some(n as u16);
        }
    }

    loop {
        skip_blank(s, &mut i);
        if i >= s.len() {
            break;
        }
        let c = s[i];
        match c {
            b'"' => scan_string(s, &mut i, &mut out)?,
            b'\'' => {
                i += 1;
                scan_comment(s, &mut i, &mut out)?;
            }
            b'$' | b'&' | b'%' if features.contains(Features::NUMSYSTEM) => {
                scan_radix(s, &mut i, &mut out, features)?
            }
            b'<' | b'>' => {
                let two = match (c, s.get(i + 1)) {
                    (b'<', Some(b'=')) => Some(op::LE),
                    (b'<', Some(b'>')) => Some(op::NE),
                    (b'<', Some(b'<')) => Some(op::SHL),
                    (b'>', Some(b'=')) => Some(op::GE),
                    (b'>', Some(b'>')) => Some(op::SHR),
                    _ => None,
                };
                if let Some(t) = two {
                    out.push(t);
                    i += 2;
                } else {
                    out.push(c);
                    i += 1;
                }
            }
            b':' | b';' | b',' | b'(' | b')' | b'+' | b'-' | b'*' | b'/' | b'^' | b'=' | b'#' => {
                out.push(c);
                i += 1;
            }
            _ if c.is_ascii_digit() || c == b'.' => scan_number(s, &mut i, &mut out, features)?,
            _ if c.is_ascii_alphabetic() => scan_word(s, &mut i, &mut out)?,
            _ => return Err(BasicError::Syntax(col(i))),
        }
        if out.len() > MAX_PAYLOAD {
            return Err(BasicError::Syntax(col(i)));
        }
    }

    out.push(tokens::EOL);
    if out.len() > MAX_PAYLOAD {
        return Err(BasicError::Syntax(0));
    }
    Ok((line, out))
}

#[inline]
fn col(i: usize) -> u16 {
    (i + 1).min(u16::MAX as usize) as u16
}

fn skip_blank(s: &[u8], i: &mut usize) {
    while *i < s.len() && (s[*i] == b' ' || s[*i] == b'\t') {
        *i += 1;
    }
}

fn scan_string(s: &[u8], i: &mut usize, out: &mut Vec<u8>) -> BasicResult<()> {
    let open = *i;
    *i += 1;
    let start = *i;
    while *i < s.len() && s[*i] != b'"' {
        *i += 1;
    }
    if *i >= s.len() {
        return Err(BasicError::Syntax(col(open)));
    }
    let body = &s[start..*i];
    *i += 1;
    if body.len() > 255 {
        return Err(BasicError::Syntax(col(open)));
    }
    out.push(lit::STR);
    out.push(body.len() as u8);
    out.extend_from_slice(body);
    Ok(())
}

/// REM and `'` keep the rest of the line, case preserved
fn scan_comment(s: &[u8], i: &mut usize, out: &mut Vec<u8>) -> BasicResult<()> {
    if *i < s.len() && s[*i] == b' ' {
        *i += 1;
    }
    let body = &s[*i..];
    *i = s.len();
    if body.len() > 255 {
        return Err(BasicError::Syntax(0));
    }
    out.push(st::REM);
    out.push(body.len() as u8);
    out.extend_from_slice(body);
    Ok(())
}

fn push_int(out: &mut Vec<u8>, n: i64, features: Features, at: usize) -> BasicResult<()> {
    if let Ok(v) = i16::try_from(n) {
        out.push(lit::NUM);
        out.extend_from_slice(&v.to_le_bytes());
    } else if let Ok(v) = i32::try_from(n) {
        out.push(lit::LNUM);
        out.extend_from_slice(&v.to_le_bytes());
    } else if features.contains(Features::FLOAT) {
        out.push(lit::FNUM);
        out.extend_from_slice(&(n as f64).to_le_bytes());
    } else {
        return Err(BasicError::Syntax(col(at)));
    }
    Ok(())
}

/// `$` hex, `&` octal, `%` binary
fn scan_radix(s: &[u8], i: &mut usize, out: &mut Vec<u8>, features: Features) -> BasicResult<()> {
    let at = *i;
    let radix = match s[*i] {
        b'$' => 16,
        b'&' => 8,
        _ => 2,
    };
    *i += 1;
    let start = *i;
    let mut n: i64 = 0;
    while *i < s.len() {
        let Some(d) = (s[*i] as char).to_digit(radix) else {
            break;
        };
        n = n * radix as i64 + d as i64;
        if n > u32::MAX as i64 {
            return Err(BasicError::Syntax(col(at)));
        }
        *i += 1;
    }
    if *i == start {
        return Err(BasicError::Syntax(col(at)));
    }
    push_int(out, n as i32 as i64, features, at)
}

fn scan_number(s: &[u8], i: &mut usize, out: &mut Vec<u8>, features: Features) -> BasicResult<()> {
    let start = *i;
    while *i < s.len() && s[*i].is_ascii_digit() {
        *i += 1;
    }
    let mut float = false;
    if *i < s.len() && s[*i] == b'.' {
        float = true;
        *i += 1;
        while *i < s.len() && s[*i].is_ascii_digit() {
            *i += 1;
        }
    }
    // exponent only when a digit actually follows
    if *i < s.len() && (s[*i] == b'E' || s[*i] == b'e') {
        let mut j = *i + 1;
        if j < s.len() && (s[j] == b'+' || s[j] == b'-') {
            j += 1;
        }
        if j < s.len() && s[j].is_ascii_digit() {
            float = true;
            *i = j;
            while *i < s.len() && s[*i].is_ascii_digit() {
                *i += 1;
            }
        }
    }
    let span = core::str::from_utf8(&s[start..*i]).map_err(|_| BasicError::Syntax(col(start)))?;
    if float {
        if !features.contains(Features::FLOAT) {
            return Err(BasicError::Syntax(col(start)));
        }
        let v: f64 = span.parse().map_err(|_| BasicError::Syntax(col(start)))?;
        out.push(lit::FNUM);
        out.extend_from_slice(&v.to_le_bytes());
        Ok(())
    } else {
        match span.parse::<i64>() {
            Ok(n) => push_int(out, n, features, start),
            Err(_) if features.contains(Features::FLOAT) => {
                let v: f64 = span.parse().map_err(|_| BasicError::Syntax(col(start)))?;
                out.push(lit::FNUM);
                out.extend_from_slice(&v.to_le_bytes());
                Ok(())
            }
            Err(_) => Err(BasicError::Syntax(col(start))),
        }
    }
}

/// Keyword (longest match wins) or identifier
fn scan_word(s: &[u8], i: &mut usize, out: &mut Vec<u8>) -> BasicResult<()> {
    let mut best: Option<(usize, Code)> = None;
    for (text, code) in KEYWORDS {
        let t = text.as_bytes();
        if s.len() - *i >= t.len()
            && s[*i..*i + t.len()].eq_ignore_ascii_case(t)
            && best.map_or(true, |(l, _)| t.len() > l)
        {
            best = Some((t.len(), *code));
        }
    }
    if let Some((len, code)) = best {
        *i += len;
        if code == st::REM as Code {
            return scan_comment(s, i, out);
        }
        if code > 0xFF {
            out.push(ext::PAGE);
            out.push((code & 0xFF) as u8);
        } else {
            out.push(code as u8);
        }
        return Ok(());
    }

    let start = *i;
    while *i < s.len() && (s[*i].is_ascii_alphanumeric() || s[*i] == b'_') {
        *i += 1;
    }
    let mut ident: Vec<u8> = s[start..*i].to_ascii_uppercase();
    let is_str = *i < s.len() && s[*i] == b'$';
    if is_str {
        *i += 1;
    }
    // arrays are detected here so the evaluator never needs lookahead
    let mut j = *i;
    skip_blank(s, &mut j);
    let paren = j < s.len() && s[j] == b'(';
    let tag = if is_str {
        lit::STRVAR
    } else if paren {
        lit::ARRVAR
    } else {
        lit::VAR
    };
    ident.truncate(tokens::NAME_LEN);
    out.push(tag);
    out.extend_from_slice(&make_name(&ident));
    Ok(())
}

// ============================================================================
// Detokenizer
// ============================================================================

/// Render a token buffer back to canonical source text
pub fn detokenize(code: &[u8]) -> String {
    let mut pieces: Vec<String> = Vec::new();
    let mut p = 0;
    while p < code.len() && code[p] != tokens::EOL {
        let t = code[p];
        let piece = match t {
            lit::NUM => i16::from_le_bytes([code[p + 1], code[p + 2]]).to_string(),
            lit::LNUM => {
                let mut b = [0u8; 4];
                b.copy_from_slice(&code[p + 1..p + 5]);
                i32::from_le_bytes(b).to_string()
            }
            lit::FNUM => {
                let mut b = [0u8; 8];
                b.copy_from_slice(&code[p + 1..p + 9]);
                format_number(&Value::Float(f64::from_le_bytes(b)))
            }
            lit::STR => {
                let len = code[p + 1] as usize;
                let body = String::from_utf8_lossy(&code[p + 2..p + 2 + len]);
                format!("\"{}\"", body)
            }
            lit::VAR | lit::ARRVAR => {
                let mut n = [0u8; tokens::NAME_LEN];
                n.copy_from_slice(&code[p + 1..p + 1 + tokens::NAME_LEN]);
                tokens::name_text(&n).to_string()
            }
            lit::STRVAR => {
                let mut n = [0u8; tokens::NAME_LEN];
                n.copy_from_slice(&code[p + 1..p + 1 + tokens::NAME_LEN]);
                format!("{}$", tokens::name_text(&n))
            }
            st::REM => {
                let len = code[p + 1] as usize;
                let body = String::from_utf8_lossy(&code[p + 2..p + 2 + len]);
                if body.is_empty() {
                    "REM".to_string()
                } else {
                    format!("REM {}", body)
                }
            }
            ext::PAGE => tokens::keyword_text(0xFF00 | code[p + 1] as Code)
                .unwrap_or("?")
                .to_string(),
            t if t >= 0x80 => tokens::keyword_text(t as Code).unwrap_or("?").to_string(),
            t if (op::LE..=op::SHR).contains(&t) => {
                tokens::keyword_text(t as Code).unwrap_or("?").to_string()
            }
            t => (t as char).to_string(),
        };
        pieces.push(piece);
        p += token_len(code, p);
    }

    let mut s = String::new();
    for piece in pieces {
        if needs_space(&s, &piece) {
            s.push(' ');
        }
        s.push_str(&piece);
    }
    s
}

/// A space keeps word-like neighbors from fusing into one identifier
fn needs_space(prev: &str, next: &str) -> bool {
    let Some(a) = prev.chars().last() else {
        return false;
    };
    let Some(b) = next.chars().next() else {
        return false;
    };
    (a.is_ascii_alphanumeric() || a == '_' || a == '$' || a == '"')
        && (b.is_ascii_alphanumeric() || b == '_' || b == '.' || b == '"')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_is_stable() {
        let src = "for i=1 to 3 step 2:print \"Hi\";i:next i";
        let (_, toks) = tokenize(src, Features::default()).unwrap();
        let listed = detokenize(&toks);
        let (_, again) = tokenize(&listed, Features::default()).unwrap();
        assert_eq!(toks, again);
        assert_eq!(listed, detokenize(&again));
    }
}
