//! Interpreter state: grid, stacks, instruction pointer, and the one-shot
//! flags the movement commands communicate through.

use std::time::Instant;

use aceto_common::{Grid, Value};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::io::Io;
use crate::store::StackStore;

/// Interpreter options, filled in by the CLI.
#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Stderr trace level from repeated `-v` flags.
    pub verbosity: u8,
    /// Flush stdout after every printing command.
    pub flush: bool,
    /// Ignore catch cells and always die on an error.
    pub err_all: bool,
    /// PRNG seed; `None` means entropy seeding.
    pub seed: Option<u64>,
}

/// A one-shot deviation from Hilbert traversal, set by a movement, mirror
/// or jump handler and consumed when the instruction pointer advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Motion {
    /// Step one cell in a cardinal direction, wrapping toroidally.
    Step(isize, isize),
    /// Land exactly on a cell.
    Goto(usize, usize),
}

/// What the dispatcher does with the cell under the instruction pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mode {
    /// Execute the cell as a command.
    Command,
    /// Collect the cell into a string literal.
    Str,
    /// The cell follows a backslash inside a string literal.
    StrEscape,
    /// Push the cell as a one-character string.
    Char,
    /// The cell follows a backslash in a character literal.
    CharEscape,
}

/// The Aceto interpreter: a grid walked along a Hilbert curve, an
/// indexed family of stacks, and a handful of registers.
pub struct Interpreter<I: Io> {
    pub(crate) grid: Grid,
    pub(crate) store: StackStore,
    pub(crate) x: usize,
    pub(crate) y: usize,
    /// +1 walks the curve forward, −1 reversed.
    pub(crate) dir: i64,
    pub(crate) motion: Option<Motion>,
    pub(crate) skip: bool,
    pub(crate) catch: Option<(usize, usize)>,
    pub(crate) quick: Value,
    pub(crate) previous: char,
    pub(crate) mode: Mode,
    pub(crate) buf: String,
    pub(crate) clock: Instant,
    pub(crate) rng: StdRng,
    pub(crate) opts: Options,
    pub(crate) io: I,
    pub(crate) done: bool,
}

impl<I: Io> Interpreter<I> {
    pub fn new(grid: Grid, opts: Options, io: I) -> Self {
        let rng = match opts.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Interpreter {
            grid,
            store: StackStore::new(),
            x: 0,
            y: 0,
            dir: 1,
            motion: None,
            skip: false,
            catch: None,
            quick: Value::Str(String::new()),
            previous: ' ',
            mode: Mode::Command,
            buf: String::new(),
            clock: Instant::now(),
            rng,
            opts,
            io,
            done: false,
        }
    }

    /// Give the I/O adapter back, e.g. to inspect captured output.
    pub fn into_io(self) -> I {
        self.io
    }

    pub(crate) fn push(&mut self, value: Value) {
        self.store.push(value);
    }

    pub(crate) fn pop(&mut self) -> Value {
        self.store.pop()
    }

    /// Stderr trace, gated on the verbosity level.
    pub(crate) fn log(&self, level: u8, message: &str) {
        if level <= self.opts.verbosity {
            eprintln!("{message}");
        }
    }
}
