//! Shared test host: scripted console, manual clock, scripted pins and
//! an in-memory file system.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};

use minibasic::{engine, BasicError, BasicResult, FileMode, Host, Machine};

pub struct MockHost {
    pub output: Vec<u8>,
    pub input: VecDeque<u8>,
    /// Manual clock; `delay` advances it, `millis` adds `auto_tick`
    pub now: u32,
    pub auto_tick: u32,
    /// Polls until `break_requested` answers true once
    pub break_countdown: Option<u32>,
    /// Scripted digital_read results; the last value repeats
    pub pin_reads: VecDeque<u8>,
    pin_last: u8,
    pub pin_writes: Vec<(u8, u8)>,
    pub files: HashMap<String, Vec<u8>>,
    open_read: Option<(Vec<u8>, usize)>,
    open_write: Option<(String, Vec<u8>)>,
    rng: fastrand::Rng,
}

impl Default for MockHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MockHost {
    pub fn new() -> Self {
        Self {
            output: Vec::new(),
            input: VecDeque::new(),
            now: 0,
            auto_tick: 0,
            break_countdown: None,
            pin_reads: VecDeque::new(),
            pin_last: 0,
            pin_writes: Vec::new(),
            files: HashMap::new(),
            open_read: None,
            open_write: None,
            rng: fastrand::Rng::with_seed(0x5eed),
        }
    }

    pub fn with_input(text: &str) -> Self {
        let mut h = Self::new();
        h.input = text.bytes().collect();
        h
    }

    pub fn out(&self) -> String {
        String::from_utf8_lossy(&self.output).into_owned()
    }
}

impl Host for MockHost {
    fn read_byte(&mut self) -> BasicResult<u8> {
        self.input.pop_front().ok_or(BasicError::Io)
    }

    fn write_byte(&mut self, b: u8) -> BasicResult<()> {
        self.output.push(b);
        Ok(())
    }

    fn available(&mut self) -> usize {
        self.input.len()
    }

    fn millis(&mut self) -> u32 {
        self.now = self.now.wrapping_add(self.auto_tick);
        self.now
    }

    fn delay(&mut self, ms: u32) {
        self.now = self.now.wrapping_add(ms);
    }

    fn seed(&mut self, seed: u32) {
        self.rng = fastrand::Rng::with_seed(seed as u64);
    }

    fn rand(&mut self) -> u32 {
        self.rng.u32(..)
    }

    fn break_requested(&mut self) -> bool {
        match self.break_countdown {
            Some(0) => {
                self.break_countdown = None;
                true
            }
            Some(n) => {
                self.break_countdown = Some(n - 1);
                false
            }
            None => false,
        }
    }

    fn open(&mut self, name: &str, mode: FileMode) -> BasicResult<u8> {
        match mode {
            FileMode::Read => {
                let data = self.files.get(name).ok_or(BasicError::Io)?.clone();
                self.open_read = Some((data, 0));
                Ok(0)
            }
            FileMode::Write => {
                self.open_write = Some((name.to_string(), Vec::new()));
                Ok(1)
            }
        }
    }

    fn close(&mut self, handle: u8) {
        if handle == 0 {
            self.open_read = None;
        } else if let Some((name, data)) = self.open_write.take() {
            self.files.insert(name, data);
        }
    }

    fn file_read(&mut self, _handle: u8) -> BasicResult<Option<u8>> {
        let (data, pos) = self.open_read.as_mut().ok_or(BasicError::Io)?;
        if *pos >= data.len() {
            return Ok(None);
        }
        let b = data[*pos];
        *pos += 1;
        Ok(Some(b))
    }

    fn file_write(&mut self, _handle: u8, b: u8) -> BasicResult<()> {
        let (_, data) = self.open_write.as_mut().ok_or(BasicError::Io)?;
        data.push(b);
        Ok(())
    }

    fn remove(&mut self, name: &str) -> BasicResult<()> {
        self.files.remove(name).map(|_| ()).ok_or(BasicError::Io)
    }

    fn rename(&mut self, old: &str, new: &str) -> BasicResult<()> {
        let data = self.files.remove(old).ok_or(BasicError::Io)?;
        self.files.insert(new.to_string(), data);
        Ok(())
    }

    fn dir(&mut self) -> BasicResult<Vec<(String, u64)>> {
        let mut out: Vec<(String, u64)> = self
            .files
            .iter()
            .map(|(n, d)| (n.clone(), d.len() as u64))
            .collect();
        out.sort();
        Ok(out)
    }

    fn pin_mode(&mut self, _pin: u8, _output: bool) -> BasicResult<()> {
        Ok(())
    }

    fn digital_read(&mut self, _pin: u8) -> BasicResult<u8> {
        if let Some(v) = self.pin_reads.pop_front() {
            self.pin_last = v;
        }
        Ok(self.pin_last)
    }

    fn digital_write(&mut self, pin: u8, v: u8) -> BasicResult<()> {
        self.pin_writes.push((pin, v));
        Ok(())
    }

    fn analog_read(&mut self, _pin: u8) -> BasicResult<i32> {
        Ok(512)
    }

    fn analog_write(&mut self, pin: u8, v: i32) -> BasicResult<()> {
        self.pin_writes.push((pin, v as u8));
        Ok(())
    }
}

/// Feed lines through the prompt; errors end up on the mock console
/// like they would on a terminal
pub fn feed(m: &mut Machine, host: &mut MockHost, lines: &[&str]) {
    for line in lines {
        let _ = engine::enter(m, host, line);
    }
}

pub fn run_machine(lines: &[&str]) -> (Machine, MockHost) {
    let mut m = Machine::default();
    let mut host = MockHost::new();
    feed(&mut m, &mut host, lines);
    (m, host)
}

/// Console output of a program fed line by line
pub fn run_output(lines: &[&str]) -> String {
    run_machine(lines).1.out()
}
