//! # Centile Application Library
//!
//! The binary's modules, exposed as a library so integration tests can build
//! routers and sinks without spawning a process.

pub mod api;
pub mod cli;
pub mod config;
pub mod sink;
