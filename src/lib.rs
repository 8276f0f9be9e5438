//! Agent Task Server Library
//!
//! This module exports the core components for testing and integration.

pub mod cli;
pub mod config;
pub mod error;
pub mod isolation;
pub mod lifecycle;
pub mod registry;
pub mod runner;
pub mod server;
pub mod types;
