//! Domain model for the style transfer job lifecycle.
//!
//! Provides the job state machine, input staging and validation,
//! cache-busting probe markers, fixed job timings, and the error
//! taxonomy shared by the client and CLI crates. No I/O lives here.

pub mod cachebust;
pub mod error;
pub mod job;
pub mod staging;
pub mod timings;
