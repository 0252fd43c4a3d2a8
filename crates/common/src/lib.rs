//! Aceto common types: the value model, the program grid and the Hilbert
//! curve mapping.
//!
//! This crate provides the foundational data structures shared by the
//! interpreter and the CLI:
//!
//! - [`Value`] — the dynamically-typed runtime value (big integers, floats,
//!   strings, booleans)
//! - [`Grid`] — a source program padded into a `2^p × 2^p` character field
//! - [`hilbert`] — the bijection between linear curve indices and grid
//!   coordinates
//!
//! # Dependencies
//!
//! `num-bigint`/`num-traits` back the arbitrary-precision integer case of
//! [`Value`]; there are no other dependencies.

pub mod grid;
pub mod hilbert;
pub mod value;

// Re-export commonly used types at the crate root.
pub use grid::Grid;
pub use value::Value;
