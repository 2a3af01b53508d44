//! # Organize Module
//!
//! Sorts an unsorted source tree into the destination layout.
//!
//! Per file: classify, convert (RAW/HEIC/TIFF), fingerprint and check for
//! duplicates (images), resolve the date and a collision-free path, copy.
//! Any failure sends the original to `Errors/`; the run always ends with
//! a [`RunReport`] and `organize_report.txt`.

mod executor;
mod report;
mod types;

pub use executor::{Organizer, OrganizerBuilder};
pub use report::write_report;
pub use types::*;
