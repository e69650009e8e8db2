//! Shared types and pure-logic utilities for Gift Farm.
//! No async runtime or I/O dependency; usable from any host.

mod address;
mod error;

pub use address::{FriendlyFormat, ParsedAddress, TonAddress, normalize_address};
pub use error::AddressError;
