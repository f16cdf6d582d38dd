//! Library side of the `ringscope` CLI: ring-dump parsing and TOML
//! configuration. The binary in `main.rs` wires these to the engine.

pub mod config;
pub mod parser;
