//! CLI module for the bgremove-studio library
//!
//! This module is only available when the "cli" feature is enabled.

mod config;
#[path = "main.rs"]
mod main_impl;
mod shell;

pub use main_impl::{main, Cli, CliBackend, CliOutputFormat};
