//! Scan Redis for group-related keys and display their values.
//!
//! Collects keys matching a set of glob patterns, reads each one with the
//! accessor matching its storage type (string, hash, list, set, zset), and
//! renders everything as a terminal report, pretty-printing string values
//! that hold embedded JSON.

pub mod error;
pub mod query;
pub mod render;
