//! Common types used throughout blindchess.
//!
//! The blind-phase data model (squares, pieces, blind sequences, rule violations,
//! reconciliation artifacts and game phases) lives in [`blind`] and is re-exported
//! at the crate root.

pub mod blind;

pub use blind::*;
