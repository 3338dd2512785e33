//! Incremental Response Parsing
//!
//! `partial` is the pure best-effort parser over a truncated buffer;
//! `stream` layers snapshot publication and strict finalization on top.

pub mod partial;
pub mod stream;

pub use partial::{parse_final, parse_partial};
pub use stream::{Snapshot, StreamParser, parse_payload};
