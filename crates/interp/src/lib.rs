//! The Aceto interpreter — executes character grids along a Hilbert curve.
//!
//! A program is a square grid of commands (see [`aceto_common::Grid`]).
//! The interpreter walks the grid in Hilbert-curve order, starting at the
//! bottom-left cell, dispatching each character to a handler: stack
//! manipulation, arithmetic, string operations, I/O, movement overrides
//! and error handling with a catch cell.
//!
//! # Usage
//!
//! ```
//! use aceto_interp::{run, MemIo, Options};
//!
//! let mut io = MemIo::new("");
//! run("32+p", Options::default(), &mut io).unwrap();
//! assert_eq!(io.output, "5");
//! ```

pub mod error;
pub mod execute;
pub mod io;
pub mod machine;
pub mod store;

pub use error::{ProgramError, RuntimeError};
pub use io::{Io, MemIo, StdIo};
pub use machine::{Interpreter, Options};
pub use store::StackStore;

use aceto_common::Grid;

/// Load a source text and run it to termination.
///
/// This is the primary entry point. It pads the source into a
/// power-of-two grid, seeds the interpreter state, and executes until the
/// walk leaves the curve, `X` is hit, or an error escapes the catch
/// mechanism.
///
/// # Errors
///
/// Returns [`ProgramError`] for uncaught runtime errors (exit code 1) and
/// unterminated literals (exit code 2).
pub fn run<I: Io>(source: &str, opts: Options, io: I) -> Result<(), ProgramError> {
    let grid = Grid::from_source(source);
    let mut interp = Interpreter::new(grid, opts, io);
    interp.run()
}
