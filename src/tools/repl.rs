//! Interactive prompt and file runner

use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use minibasic::{engine, Machine, StdHost};

/// Embeddable BASIC interpreter
#[derive(Clone, Debug, Parser)]
#[command(version)]
struct Args {
    /// program to load and run; the process exits when it finishes
    program: Option<PathBuf>,
    /// arena size in bytes
    #[arg(long, default_value_t = minibasic::arena::DEFAULT_MEMSIZE)]
    memory: usize,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let mut machine = Machine::new(args.memory);
    let mut host = StdHost::new();

    if let Some(path) = args.program {
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display()))?;
        for line in text.lines() {
            if line.trim().is_empty() {
                continue;
            }
            if engine::enter(&mut machine, &mut host, line).is_err() {
                std::process::exit(1);
            }
        }
        return match engine::enter(&mut machine, &mut host, "RUN") {
            Ok(()) => Ok(()),
            Err(_) => std::process::exit(1),
        };
    }

    println!(
        "minibasic {} [{} bytes free]",
        minibasic::VERSION,
        machine.arena.free()
    );
    let stdin = std::io::stdin();
    loop {
        print!("> ");
        std::io::stdout().flush().ok();
        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => return Ok(()),
            Ok(_) => {
                // errors were already reported on the console
                let _ = engine::enter(&mut machine, &mut host, &line);
            }
            Err(e) => return Err(e).context("reading stdin"),
        }
    }
}
