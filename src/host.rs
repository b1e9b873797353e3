//! Host interface
//!
//! The engine talks to the outside world through this trait only:
//! console bytes, a monotonic millisecond clock, a random source, an
//! optional file system and optional pins. Callbacks are synchronous
//! and must not hold references into the arena across calls. Optional
//! surfaces default to an i/o error, which the engine turns into a
//! BASIC error.

use num_enum::TryFromPrimitive;

use crate::error::{BasicError, BasicResult};

/// File open mode for the host file surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u8)]
pub enum FileMode {
    Read = 0,
    Write = 1,
}

pub trait Host {
    // ========== Console ==========

    /// Blocking read of one console byte
    fn read_byte(&mut self) -> BasicResult<u8>;

    fn write_byte(&mut self, b: u8) -> BasicResult<()>;

    /// Bytes ready without blocking
    fn available(&mut self) -> usize;

    fn flush(&mut self) {}

    // ========== Clock ==========

    /// Monotonic, wrapping millisecond counter
    fn millis(&mut self) -> u32;

    fn delay(&mut self, _ms: u32) {}

    // ========== Random ==========

    fn seed(&mut self, seed: u32);

    /// Uniform integer over the full u32 range
    fn rand(&mut self) -> u32;

    // ========== Break ==========

    /// Break character, signal or pin observed since the last poll
    fn break_requested(&mut self) -> bool {
        false
    }

    // ========== Files (optional) ==========

    fn open(&mut self, _name: &str, _mode: FileMode) -> BasicResult<u8> {
        Err(BasicError::Io)
    }

    fn close(&mut self, _handle: u8) {}

    /// One byte, or None at end of file
    fn file_read(&mut self, _handle: u8) -> BasicResult<Option<u8>> {
        Err(BasicError::Io)
    }

    fn file_write(&mut self, _handle: u8, _b: u8) -> BasicResult<()> {
        Err(BasicError::Io)
    }

    fn remove(&mut self, _name: &str) -> BasicResult<()> {
        Err(BasicError::Io)
    }

    fn rename(&mut self, _old: &str, _new: &str) -> BasicResult<()> {
        Err(BasicError::Io)
    }

    /// Directory listing as (name, size) pairs
    fn dir(&mut self) -> BasicResult<Vec<(String, u64)>> {
        Err(BasicError::Io)
    }

    // ========== Pins (optional) ==========

    fn pin_mode(&mut self, _pin: u8, _output: bool) -> BasicResult<()> {
        Err(BasicError::Io)
    }

    fn digital_read(&mut self, _pin: u8) -> BasicResult<u8> {
        Err(BasicError::Io)
    }

    fn digital_write(&mut self, _pin: u8, _v: u8) -> BasicResult<()> {
        Err(BasicError::Io)
    }

    fn analog_read(&mut self, _pin: u8) -> BasicResult<i32> {
        Err(BasicError::Io)
    }

    fn analog_write(&mut self, _pin: u8, _v: i32) -> BasicResult<()> {
        Err(BasicError::Io)
    }
}

/// Write a whole string to the console
pub fn write_str(host: &mut dyn Host, s: &str) -> BasicResult<()> {
    for &b in s.as_bytes() {
        host.write_byte(b)?;
    }
    Ok(())
}

/// Read a console line up to and excluding the newline
pub fn read_line(host: &mut dyn Host) -> BasicResult<String> {
    let mut buf = Vec::new();
    loop {
        let b = host.read_byte()?;
        if b == b'\n' {
            break;
        }
        if b != b'\r' {
            buf.push(b);
        }
    }
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

// ============================================================================
// POSIX reference host
// ============================================================================

use std::fs::File;
use std::io::{Read, Write};
use std::time::Instant;

enum FsFile {
    Reader(File),
    Writer(File),
}

/// Reference host for hosted builds: stdin/stdout console, `Instant`
/// clock, `fastrand` random source, `std::fs` files. GPIO surfaces stay
/// at their defaults.
pub struct StdHost {
    start: Instant,
    rng: fastrand::Rng,
    files: Vec<Option<FsFile>>,
}

impl Default for StdHost {
    fn default() -> Self {
        Self::new()
    }
}

impl StdHost {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            rng: fastrand::Rng::new(),
            files: Vec::new(),
        }
    }
}

impl Host for StdHost {
    fn read_byte(&mut self) -> BasicResult<u8> {
        let mut b = [0u8; 1];
        match std::io::stdin().read(&mut b) {
            Ok(1) => Ok(b[0]),
            _ => Err(BasicError::Io),
        }
    }

    fn write_byte(&mut self, b: u8) -> BasicResult<()> {
        std::io::stdout()
            .write_all(&[b])
            .map_err(|_| BasicError::Io)
    }

    fn available(&mut self) -> usize {
        0
    }

    fn flush(&mut self) {
        let _ = std::io::stdout().flush();
    }

    fn millis(&mut self) -> u32 {
        self.start.elapsed().as_millis() as u32
    }

    fn delay(&mut self, ms: u32) {
        std::thread::sleep(std::time::Duration::from_millis(ms as u64));
    }

    fn seed(&mut self, seed: u32) {
        self.rng = fastrand::Rng::with_seed(seed as u64);
    }

    fn rand(&mut self) -> u32 {
        self.rng.u32(..)
    }

    fn open(&mut self, name: &str, mode: FileMode) -> BasicResult<u8> {
        let file = match mode {
            FileMode::Read => FsFile::Reader(File::open(name).map_err(|_| BasicError::Io)?),
            FileMode::Write => FsFile::Writer(File::create(name).map_err(|_| BasicError::Io)?),
        };
        if let Some(slot) = self.files.iter().position(Option::is_none) {
            self.files[slot] = Some(file);
            Ok(slot as u8)
        } else {
            self.files.push(Some(file));
            Ok((self.files.len() - 1) as u8)
        }
    }

    fn close(&mut self, handle: u8) {
        if let Some(slot) = self.files.get_mut(handle as usize) {
            *slot = None;
        }
    }

    fn file_read(&mut self, handle: u8) -> BasicResult<Option<u8>> {
        match self.files.get_mut(handle as usize) {
            Some(Some(FsFile::Reader(f))) => {
                let mut b = [0u8; 1];
                match f.read(&mut b) {
                    Ok(0) => Ok(None),
                    Ok(_) => Ok(Some(b[0])),
                    Err(_) => Err(BasicError::Io),
                }
            }
            _ => Err(BasicError::Io),
        }
    }

    fn file_write(&mut self, handle: u8, b: u8) -> BasicResult<()> {
        match self.files.get_mut(handle as usize) {
            Some(Some(FsFile::Writer(f))) => f.write_all(&[b]).map_err(|_| BasicError::Io),
            _ => Err(BasicError::Io),
        }
    }

    fn remove(&mut self, name: &str) -> BasicResult<()> {
        std::fs::remove_file(name).map_err(|_| BasicError::Io)
    }

    fn rename(&mut self, old: &str, new: &str) -> BasicResult<()> {
        std::fs::rename(old, new).map_err(|_| BasicError::Io)
    }

    fn dir(&mut self) -> BasicResult<Vec<(String, u64)>> {
        let mut out = Vec::new();
        for entry in std::fs::read_dir(".").map_err(|_| BasicError::Io)? {
            let entry = entry.map_err(|_| BasicError::Io)?;
            let meta = entry.metadata().map_err(|_| BasicError::Io)?;
            if meta.is_file() {
                out.push((entry.file_name().to_string_lossy().into_owned(), meta.len()));
            }
        }
        out.sort();
        Ok(out)
    }
}
