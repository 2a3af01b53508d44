//! # media-sort CLI
//!
//! Command-line interface for the media sorter.
//!
//! ## Usage
//! ```bash
//! media-sort organize ~/Unsorted ~/Sorted --structure year-month
//! media-sort organize ~/Unsorted ~/Sorted --output json
//! ```

mod cli;

use media_sorter::Result;

fn main() -> Result<()> {
    cli::run()
}
