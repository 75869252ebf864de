//! Application layer orchestrating domain logic and infrastructure.

pub mod aggregate;
pub mod command;
pub mod filter;
pub mod label;
pub mod scan;
pub mod selection;
pub mod tokens;
