//! Infrastructure adapters for the clipboard, git, config, and the terminal host.

pub mod clipboard;
pub mod config;
pub mod git;
pub mod highlight;
pub mod workbench;
