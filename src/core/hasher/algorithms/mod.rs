//! Fingerprint algorithm implementations.

mod average;

pub use average::AverageHasher;
