//! Blind-phase domain types.
//!
//! Defines board coordinates, piece identities, blind sequences, validation results and the
//! reconciliation artifact shared by the execution layer and the table service.

mod codec;
mod config;
mod constants;
mod moves;
mod outcome;
mod phase;
mod sequence;
mod violation;

pub use codec::{read_string, string_encode_size, write_string};
pub use config::*;
pub use constants::*;
pub use moves::*;
pub use outcome::*;
pub use phase::*;
pub use sequence::*;
pub use violation::*;
