//! # Core Module
//!
//! The GUI-agnostic sorting engine.
//!
//! ## Modules
//! - `classifier` - Maps extensions to media kinds
//! - `scanner` - Walks the source tree
//! - `metadata` - Reads and carries over EXIF
//! - `dating` - Year/month sort key
//! - `normalizer` - Decodes and converts images for fingerprinting
//! - `hasher` - Average-hash fingerprints and the seen set
//! - `destination` - Folder layout and collision-free names
//! - `transfer` - Chunked copy with progress
//! - `organize` - Orchestrates a full run
//! - `cancel` - Cooperative cancellation

pub mod cancel;
pub mod classifier;
pub mod dating;
pub mod destination;
pub mod hasher;
pub mod metadata;
pub mod normalizer;
pub mod organize;
pub mod scanner;
pub mod transfer;

// Re-export commonly used types
pub use cancel::CancellationToken;
pub use classifier::{classify, ConvertibleFormat, MediaKind};
pub use destination::{DestinationLayout, FolderStructure};
pub use hasher::Fingerprint;
pub use organize::{OrganizeConfig, Organizer, RunReport, RunStatistics};
pub use scanner::{MediaFile, ScanConfig};
