//! vidcue - media source resolution and cache backend client
//!
//! The library crate exposes the config loader and the CLI reports for
//! integration testing.

pub mod config;
pub mod report;
