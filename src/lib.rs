//! # minibasic
//!
//! Embeddable BASIC interpreter core for constrained targets and
//! hosted POSIX builds.
//!
//! The engine is the language only: a tokenizer that turns source
//! lines into a compact byte stream, a line-addressed program store, a
//! precedence-descent evaluator and a statement dispatcher over a
//! single memory arena. Everything outward (console, clock, random,
//! files, pins) goes through the [`Host`] trait, so the same engine
//! runs against a terminal, a test mock or a board support layer.
//!
//! ## Example
//!
//! ```no_run
//! use minibasic::{engine, Machine, StdHost};
//!
//! let mut m = Machine::default();
//! let mut host = StdHost::new();
//!
//! engine::enter(&mut m, &mut host, "10 FOR I=1 TO 3").unwrap();
//! engine::enter(&mut m, &mut host, "20 PRINT I").unwrap();
//! engine::enter(&mut m, &mut host, "30 NEXT").unwrap();
//! engine::enter(&mut m, &mut host, "RUN").unwrap();
//! ```

pub mod arena;
pub mod engine;
pub mod error;
pub mod eval;
pub mod handlers;
pub mod heap;
pub mod host;
pub mod program;
pub mod state;
pub mod tokenizer;
pub mod tokens;
pub mod value;

// Re-exports
pub use arena::Arena;
pub use error::{BasicError, BasicResult};
pub use host::{FileMode, Host, StdHost};
pub use state::{Features, Machine, Settings};
pub use tokenizer::{detokenize, tokenize};
pub use value::Value;

/// Engine version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
