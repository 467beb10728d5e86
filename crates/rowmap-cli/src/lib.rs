//! Library components of the rowmap command-line tool.

pub mod cli;
pub mod commands;
pub mod logging;
pub mod summary;
pub mod types;
