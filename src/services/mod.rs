//! Controllers: everything that pairs a state change with I/O.
//!
//! Each function takes the store and its collaborators explicitly; nothing
//! here holds state of its own except the per-lead conversion claims.

pub mod backend;
pub mod leads;
pub mod opportunities;
pub mod preferences;
