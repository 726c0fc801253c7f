//! sealgate testing CLI
//!
//! Exposes the command modules for integration testing

pub mod cli;
