//! Named-object heap
//!
//! Heap entries grow down inside the arena and sit back-to-back between
//! `himem` and the end of memory, newest first. Each entry is a header
//! (fixed-width name, kind byte, payload length) followed by the
//! payload. Lookup walks from `himem` upward, so a re-created name
//! shadows an older entry.
//!
//! Payload layouts:
//! ```text
//! scalar:   one 9-byte value cell (tag + 8 bytes, little-endian)
//! array:    n1 (u16), n2 (u16, 0 = one-dimensional), value cells
//! string:   current length (u16), then capacity bytes
//! function: argc (u8), multiline (u8), body offset (u32),
//!           definition line (u16), argc name records
//! ```

use crate::arena::Arena;
use crate::error::{BasicError, BasicResult};
use crate::tokens::{Name, NAME_LEN};
use crate::value::Value;

/// Header bytes in front of every payload
pub const HDR_LEN: usize = NAME_LEN + 3;

/// Bytes per value cell: tag plus payload
pub const CELL: usize = 9;

/// Capacity a string gets when auto-created by assignment
pub const STR_DEFAULT_CAP: usize = 32;

const TAG_INT: u8 = 0;
const TAG_FLOAT: u8 = 1;

/// Heap object kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ObjKind {
    Scalar = 0,
    Array = 1,
    Str = 2,
    Func = 3,
}

/// Resolved heap object
#[derive(Debug, Clone, Copy)]
pub struct ObjRef {
    /// Offset of the entry header
    pub base: usize,
    /// Offset of the payload
    pub payload: usize,
    /// Payload length in bytes
    pub plen: usize,
}

/// A user function definition read back out of the heap
#[derive(Debug, Clone)]
pub struct FnDef {
    pub params: Vec<Name>,
    pub multiline: bool,
    /// Token offset of the body inside the program area
    pub body: usize,
    pub line: u16,
}

impl Arena {
    // ========== Object directory ==========

    pub fn find_object(&self, name: &Name, kind: ObjKind) -> Option<ObjRef> {
        let mut p = self.himem;
        while p + HDR_LEN <= self.size() {
            let plen = self.read_u16(p + NAME_LEN + 1) as usize;
            if self.bytes(p, NAME_LEN) == name && self.read_u8(p + NAME_LEN) == kind as u8 {
                return Some(ObjRef {
                    base: p,
                    payload: p + HDR_LEN,
                    plen,
                });
            }
            p += HDR_LEN + plen;
        }
        None
    }

    /// Allocate a zeroed object; an existing entry of the same name and
    /// kind is shadowed, not replaced
    pub fn create_object(&mut self, name: &Name, kind: ObjKind, plen: usize) -> BasicResult<ObjRef> {
        // the header length field is 16 bits
        if plen > u16::MAX as usize {
            return Err(BasicError::OutOfMemory);
        }
        let base = self.heap_alloc(HDR_LEN + plen)?;
        self.write_bytes(base, name);
        self.write_u8(base + NAME_LEN, kind as u8);
        self.write_u16(base + NAME_LEN + 1, plen as u16);
        Ok(ObjRef {
            base,
            payload: base + HDR_LEN,
            plen,
        })
    }

    // ========== Value cells ==========

    pub fn read_cell(&self, at: usize) -> Value {
        if self.read_u8(at) == TAG_FLOAT {
            Value::Float(self.read_f64(at + 1))
        } else {
            Value::Int(self.read_i32(at + 1))
        }
    }

    pub fn write_cell(&mut self, at: usize, v: &Value) -> BasicResult<()> {
        match v {
            Value::Int(n) => {
                self.write_u8(at, TAG_INT);
                self.write_i32(at + 1, *n);
                self.write_i32(at + 5, 0);
            }
            Value::Float(f) => {
                self.write_u8(at, TAG_FLOAT);
                self.write_f64(at + 1, *f);
            }
            Value::Str(_) => return Err(BasicError::TypeMismatch),
        }
        Ok(())
    }

    // ========== Scalars ==========

    /// Cell address of a scalar, created as zero on first reference
    pub fn var_cell(&mut self, name: &Name) -> BasicResult<usize> {
        if let Some(obj) = self.find_object(name, ObjKind::Scalar) {
            return Ok(obj.payload);
        }
        Ok(self.create_object(name, ObjKind::Scalar, CELL)?.payload)
    }

    pub fn get_var(&mut self, name: &Name) -> BasicResult<Value> {
        let at = self.var_cell(name)?;
        Ok(self.read_cell(at))
    }

    pub fn set_var(&mut self, name: &Name, v: &Value) -> BasicResult<()> {
        let at = self.var_cell(name)?;
        self.write_cell(at, v)
    }

    // ========== Arrays ==========

    /// Allocate an array. Cells for indices 0..=n are always present so
    /// the origin knob can move between 0 and 1 without reallocation.
    pub fn dim_array(&mut self, name: &Name, n1: u16, n2: u16) -> BasicResult<()> {
        let cells = (n1 as usize + 1) * (n2 as usize + 1);
        let obj = self.create_object(name, ObjKind::Array, 4 + cells * CELL)?;
        self.write_u16(obj.payload, n1);
        self.write_u16(obj.payload + 2, n2);
        Ok(())
    }

    /// Cell address of `A(i)` or `A(i,j)` with bounds checks against the
    /// current origin
    pub fn array_cell(&self, name: &Name, i: i32, j: Option<i32>, origin: u8) -> BasicResult<usize> {
        let obj = self
            .find_object(name, ObjKind::Array)
            .ok_or(BasicError::Undefined)?;
        let n1 = self.read_u16(obj.payload) as i32;
        let n2 = self.read_u16(obj.payload + 2) as i32;
        let org = origin as i32;
        if i < org || i > n1 {
            return Err(BasicError::Range);
        }
        let col = match j {
            Some(j) => {
                if n2 == 0 || j < org || j > n2 {
                    return Err(BasicError::Range);
                }
                j
            }
            None => {
                if n2 != 0 {
                    return Err(BasicError::Range);
                }
                0
            }
        };
        let idx = (col as usize) * (n1 as usize + 1) + i as usize;
        Ok(obj.payload + 4 + idx * CELL)
    }

    // ========== Strings ==========

    /// Allocate a string with the given capacity and zero length
    pub fn dim_string(&mut self, name: &Name, cap: usize) -> BasicResult<ObjRef> {
        let obj = self.create_object(name, ObjKind::Str, 2 + cap)?;
        self.write_u16(obj.payload, 0);
        Ok(obj)
    }

    /// Find a string object, auto-creating an empty one with the
    /// default capacity when `create` is set
    pub fn string_obj(&mut self, name: &Name, create: bool) -> BasicResult<ObjRef> {
        if let Some(obj) = self.find_object(name, ObjKind::Str) {
            return Ok(obj);
        }
        if create {
            self.dim_string(name, STR_DEFAULT_CAP)
        } else {
            Err(BasicError::Undefined)
        }
    }

    #[inline]
    pub fn str_len(&self, obj: &ObjRef) -> usize {
        self.read_u16(obj.payload) as usize
    }

    #[inline]
    pub fn str_cap(&self, obj: &ObjRef) -> usize {
        obj.plen - 2
    }

    /// Offset of the string's first data byte
    #[inline]
    pub fn str_data(&self, obj: &ObjRef) -> usize {
        obj.payload + 2
    }

    /// Replace the whole string; longer than capacity is a range error
    pub fn set_string(&mut self, obj: &ObjRef, bytes: &[u8]) -> BasicResult<()> {
        if bytes.len() > self.str_cap(obj) {
            return Err(BasicError::Range);
        }
        self.write_u16(obj.payload, bytes.len() as u16);
        self.write_bytes(obj.payload + 2, bytes);
        Ok(())
    }

    // ========== User functions ==========

    pub fn def_fn(
        &mut self,
        name: &Name,
        params: &[Name],
        multiline: bool,
        body: usize,
        line: u16,
    ) -> BasicResult<()> {
        let plen = 8 + params.len() * NAME_LEN;
        let obj = self.create_object(name, ObjKind::Func, plen)?;
        self.write_u8(obj.payload, params.len() as u8);
        self.write_u8(obj.payload + 1, multiline as u8);
        self.write_i32(obj.payload + 2, body as i32);
        self.write_u16(obj.payload + 6, line);
        for (k, p) in params.iter().enumerate() {
            self.write_bytes(obj.payload + 8 + k * NAME_LEN, p);
        }
        Ok(())
    }

    pub fn find_fn(&self, name: &Name) -> Option<FnDef> {
        let obj = self.find_object(name, ObjKind::Func)?;
        let argc = self.read_u8(obj.payload) as usize;
        let mut params = Vec::with_capacity(argc);
        for k in 0..argc {
            let mut n: Name = [0; NAME_LEN];
            n.copy_from_slice(self.bytes(obj.payload + 8 + k * NAME_LEN, NAME_LEN));
            params.push(n);
        }
        Some(FnDef {
            params,
            multiline: self.read_u8(obj.payload + 1) != 0,
            body: self.read_i32(obj.payload + 2) as usize,
            line: self.read_u16(obj.payload + 6),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::make_name;

    #[test]
    fn scalar_defaults_to_zero() {
        let mut a = Arena::new(1024);
        let v = a.get_var(&make_name(b"X")).unwrap();
        assert_eq!(v, Value::Int(0));
    }

    #[test]
    fn newer_entry_shadows_older() {
        let mut a = Arena::new(1024);
        let n = make_name(b"A");
        a.set_var(&n, &Value::Int(1)).unwrap();
        a.create_object(&n, ObjKind::Scalar, CELL).unwrap();
        assert_eq!(a.get_var(&n).unwrap(), Value::Int(0));
    }

    #[test]
    fn array_bounds_follow_origin() {
        let mut a = Arena::new(1024);
        let n = make_name(b"A");
        a.dim_array(&n, 3, 0).unwrap();
        assert!(a.array_cell(&n, 0, None, 1).is_err());
        assert!(a.array_cell(&n, 4, None, 1).is_err());
        assert!(a.array_cell(&n, 1, None, 1).is_ok());
        assert!(a.array_cell(&n, 3, None, 1).is_ok());
        // origin 0 admits index 0 without a new DIM
        assert!(a.array_cell(&n, 0, None, 0).is_ok());
    }

    #[test]
    fn string_capacity_is_enforced() {
        let mut a = Arena::new(1024);
        let n = make_name(b"S");
        let obj = a.dim_string(&n, 4).unwrap();
        assert!(a.set_string(&obj, b"ABCD").is_ok());
        assert_eq!(a.set_string(&obj, b"ABCDE"), Err(BasicError::Range));
    }
}
